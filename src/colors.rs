// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: AGPL-3.0-only
//! Terminal styling for `shotaku` output
//!
//! Status prefixes and text styles shared by every command.

use colored::{ColoredString, Colorize};

/// Status indicators with consistent colors
pub struct Status;

impl Status {
    /// Success indicator: `[OK]` in green
    pub fn ok() -> ColoredString {
        "[OK]".green()
    }

    /// Info indicator: `[i]` in cyan
    pub fn info() -> ColoredString {
        "[i]".cyan()
    }

    /// Warning indicator: `[!]` in yellow
    pub fn warn() -> ColoredString {
        "[!]".yellow()
    }

    /// Error indicator: `[X]` in red
    pub fn error() -> ColoredString {
        "[X]".red()
    }

    /// Live update indicator: `[~]` in blue
    pub fn update() -> ColoredString {
        "[~]".blue()
    }
}

/// Text styling helpers
pub trait StyledText {
    /// Headers and labels (magenta bold)
    fn header(&self) -> ColoredString;
    /// URLs and identifiers (cyan)
    fn path(&self) -> ColoredString;
    /// Numbers (yellow)
    fn count(&self) -> ColoredString;
    /// Dim secondary text
    fn separator(&self) -> ColoredString;
}

impl StyledText for str {
    fn header(&self) -> ColoredString {
        self.magenta().bold()
    }

    fn path(&self) -> ColoredString {
        self.cyan()
    }

    fn count(&self) -> ColoredString {
        self.yellow()
    }

    fn separator(&self) -> ColoredString {
        self.dimmed()
    }
}

/// Horizontal rule
pub fn line(width: usize) -> ColoredString {
    "=".repeat(width).dimmed()
}
