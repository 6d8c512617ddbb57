// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Error types for shotaku

use thiserror::Error;

/// Coarse classification of a [`SyncError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Query,
    Validation,
    Parse,
    Mutation,
    PartialReorder,
    Subscription,
    Config,
}

/// Errors surfaced by the content store, caches and admin mutators.
///
/// Variants carry rendered messages rather than source errors so that cache
/// snapshots can hand a copy of the last error to every observer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Query failed: {0}")]
    Query(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Could not parse stored content: {0}")]
    Parse(String),

    #[error("Write failed: {0}")]
    Mutation(String),

    #[error("Reorder partially applied: {0}")]
    PartialReorder(String),

    #[error("Change feed error: {0}")]
    Subscription(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl SyncError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Query(_) => ErrorKind::Query,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Parse(_) => ErrorKind::Parse,
            Self::Mutation(_) => ErrorKind::Mutation,
            Self::PartialReorder(_) => ErrorKind::PartialReorder,
            Self::Subscription(_) => ErrorKind::Subscription,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;
