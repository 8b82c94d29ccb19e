//! `peerlink account`: local account management.

use crate::{table, ui};
use peerlink_kernel::AccountStore;
use peerlink_types::PeerRecord;
use std::path::PathBuf;

pub fn cmd_account_list(config: Option<PathBuf>) {
    let store = AccountStore::from_config(&super::load(config).peer);
    let accounts = store.list();
    if accounts.is_empty() {
        ui::warn(&format!("No accounts in {}", store.path().display()));
        ui::hint("peerlink account create <username> <host> <port>");
        return;
    }
    table::account_table(&accounts).print();
}

pub fn cmd_account_create(config: Option<PathBuf>, username: &str, host: &str, port: u16) {
    let store = AccountStore::from_config(&super::load(config).peer);
    if store.load(Some(username)).is_some() {
        ui::warn(&format!("Account {username} already exists, keeping it"));
        return;
    }
    match store.create(PeerRecord::new(username, host, port)) {
        Ok(account) => ui::success(&format!("Saved account {}", account.peer)),
        Err(e) => {
            ui::error_with_fix(
                &format!("Could not save account: {e}"),
                "usernames must be non-empty and ports at least 1024",
            );
            std::process::exit(1);
        }
    }
}
