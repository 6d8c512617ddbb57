// Copyright (c) 2024-2026 Nervosys LLC
// SPDX-License-Identifier: Apache-2.0
//! Command implementations

mod config_cmds;
mod content;
mod links;
mod site;

pub use config_cmds::*;
pub use content::*;
pub use links::*;
pub use site::*;

use crate::admin::{MenuAdmin, Notice, NoticeLevel, Notifier};
use crate::colors::Status;
use crate::config::ShotakuConfig;
use crate::store::{ContentStore, RestStore};
use anyhow::Result;
use std::io::{self, Write};
use std::sync::Arc;

/// Open the configured backend
pub fn connect(config: &ShotakuConfig) -> Result<Arc<dyn ContentStore>> {
    let store = RestStore::new(config)?;
    log::debug!("Connected to {}", store.base_url());
    Ok(Arc::new(store))
}

/// Prints admin notices with status prefixes
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Success => println!("{} {}", Status::ok(), notice.message),
            NoticeLevel::Error => eprintln!("{} {}", Status::error(), notice.message),
        }
    }
}

/// Menu admin wired to the console, with the current list loaded
pub async fn menu_admin(store: Arc<dyn ContentStore>) -> Result<MenuAdmin> {
    let mut admin = MenuAdmin::with_notifier(store, Box::new(ConsoleNotifier));
    admin.refresh().await?;
    Ok(admin)
}

/// Ask a yes/no question on stdin; anything but "y" is no
pub fn confirm(message: &str) -> bool {
    print!("{} [y/N] ", message);
    if io::stdout().flush().is_err() {
        return false;
    }

    let mut input = String::new();
    if io::stdin().read_line(&mut input).is_err() {
        return false;
    }
    input.trim().eq_ignore_ascii_case("y")
}
