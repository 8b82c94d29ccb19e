//! Clap CLI definitions for PeerLink.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

pub const AFTER_HELP: &str = "\
\x1b[1;36mExamples:\x1b[0m
  peerlink registry                       Run the registry on 127.0.0.1:8000
  peerlink peer --username alice --port 9001
                                          Join as alice and chat interactively
  peerlink list                           Show registered peers
  peerlink send --from alice --to bob hi  Send one message and exit
  peerlink account create bob 127.0.0.1 9002";

/// PeerLink: direct peer-to-peer messaging with a registry relay.
#[derive(Parser)]
#[command(name = "peerlink", version, after_help = AFTER_HELP)]
pub struct Cli {
    /// Path to config file.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the registry service until Ctrl+C.
    Registry {
        /// Address to listen on (overrides `registry.listen_addr`).
        #[arg(long)]
        listen: Option<String>,
        /// SQLite database file (overrides `registry.db_path`).
        #[arg(long)]
        db: Option<PathBuf>,
    },
    /// Join as a peer and chat interactively.
    Peer {
        /// Account to use. Defaults to the first saved account.
        #[arg(long)]
        username: Option<String>,
        /// Host to advertise when creating a new account.
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on when creating a new account.
        #[arg(long)]
        port: Option<u16>,
    },
    /// List registered peers.
    List,
    /// Send a single message and print how it was delivered.
    Send {
        /// Sending account.
        #[arg(long)]
        from: String,
        /// Receiving peer.
        #[arg(long)]
        to: String,
        /// Message text.
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Remove a peer from the registry.
    Unregister { username: String },
    /// Manage locally saved accounts [*].
    #[command(subcommand)]
    Account(AccountCommands),
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// List saved accounts.
    List,
    /// Save a new account.
    Create {
        username: String,
        host: String,
        port: u16,
    },
}
