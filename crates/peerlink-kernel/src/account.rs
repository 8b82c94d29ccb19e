//! Local account store: a JSON array of accounts on disk.
//!
//! Reads are forgiving; a missing, unreadable, or malformed file is treated
//! as holding no accounts.

use crate::config::default_accounts_path;
use peerlink_types::config::PeerConfig;
use peerlink_types::{Account, PeerLinkError, PeerLinkResult, PeerRecord};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `peer.accounts_file`, or `~/.peerlink/accounts.json`.
    pub fn from_config(config: &PeerConfig) -> Self {
        Self::new(
            config
                .accounts_file
                .clone()
                .unwrap_or_else(default_accounts_path),
        )
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All saved accounts, oldest first.
    pub fn list(&self) -> Vec<Account> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) => {
                debug!(path = %self.path.display(), "no accounts loaded: {e}");
                return Vec::new();
            }
        };
        match serde_json::from_str::<Vec<Account>>(&contents) {
            Ok(accounts) => accounts,
            Err(e) => {
                warn!(path = %self.path.display(), "ignoring malformed accounts file: {e}");
                Vec::new()
            }
        }
    }

    /// The named account, or the first one when `username` is `None`.
    pub fn load(&self, username: Option<&str>) -> Option<Account> {
        let accounts = self.list();
        match username {
            Some(name) => accounts.into_iter().find(|a| a.username() == name),
            None => accounts.into_iter().next(),
        }
    }

    /// Save a new account. If the username is already saved, the existing
    /// account is returned and the file is left alone.
    pub fn create(&self, record: PeerRecord) -> PeerLinkResult<Account> {
        record.validate()?;
        let mut accounts = self.list();
        if let Some(existing) = accounts.iter().find(|a| a.username() == record.username) {
            info!(username = %existing.username(), "account already exists");
            return Ok(existing.clone());
        }

        let account = Account::new(record);
        accounts.push(account.clone());
        self.write(&accounts)?;
        info!(username = %account.username(), path = %self.path.display(), "account created");
        Ok(account)
    }

    fn write(&self, accounts: &[Account]) -> PeerLinkResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(accounts)
            .map_err(|e| PeerLinkError::Storage(format!("serialize accounts: {e}")))?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}
