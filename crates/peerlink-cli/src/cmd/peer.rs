//! Peer-side commands: interactive session, list, send, unregister.

use crate::{table, ui};
use peerlink_kernel::{AccountStore, ClientError, Dispatcher, PeerNode, RegistryClient, RelayFallback};
use peerlink_types::{Message, PeerRecord};
use peerlink_wire::DirectMessenger;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

const USAGE: &str = "commands: list | send <user> <text> | quit";

/// One line typed at the interactive prompt.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    List,
    Send { to: &'a str, text: &'a str },
    Quit,
    Unknown,
}

fn parse_input(line: &str) -> Input<'_> {
    let line = line.trim();
    let (cmd, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    match cmd {
        "" => Input::Empty,
        "list" => Input::List,
        "quit" | "exit" => Input::Quit,
        "send" => {
            let (to, text) = rest
                .trim_start()
                .split_once(char::is_whitespace)
                .unwrap_or((rest.trim(), ""));
            let text = text.trim();
            if to.is_empty() || text.is_empty() {
                Input::Unknown
            } else {
                Input::Send { to, text }
            }
        }
        _ => Input::Unknown,
    }
}

/// Pick the identity for an interactive session.
///
/// A saved account wins; `host`/`port` override it for this session only.
/// A new username needs a port and is saved for next time.
fn resolve_identity(
    store: &AccountStore,
    bind_host: &str,
    username: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) -> Result<PeerRecord, String> {
    if let Some(account) = store.load(username.as_deref()) {
        let mut peer = account.peer;
        if let Some(h) = host {
            peer.host = h;
        }
        if let Some(p) = port {
            peer.port = p;
        }
        return Ok(peer);
    }

    let Some(username) = username else {
        return Err("no saved accounts".to_string());
    };
    let Some(port) = port else {
        return Err(format!("no saved account named {username}; --port is required"));
    };
    let host = host.unwrap_or_else(|| bind_host.to_string());
    store
        .create(PeerRecord::new(username, host, port))
        .map(|a| a.peer)
        .map_err(|e| e.to_string())
}

pub async fn cmd_peer(
    config: Option<PathBuf>,
    username: Option<String>,
    host: Option<String>,
    port: Option<u16>,
) {
    let config = super::load(config).peer;
    let store = AccountStore::from_config(&config);
    let identity = match resolve_identity(&store, &config.bind_host, username, host, port) {
        Ok(p) => p,
        Err(e) => {
            ui::error_with_fix(
                &format!("Cannot pick an account: {e}"),
                "peerlink peer --username alice --port 9001",
            );
            std::process::exit(1);
        }
    };

    let (tx, mut rx) = mpsc::channel::<Message>(64);
    let node = match PeerNode::boot(&config, identity, Arc::new(tx)).await {
        Ok(n) => n,
        Err(e) => {
            ui::error_with_fix(
                &format!("Could not start listener: {e}"),
                "the port may be in use; try another --port",
            );
            std::process::exit(1);
        }
    };

    let me = node.identity().username.clone();
    ui::section(&format!("PeerLink as {}", node.identity()));
    ui::kv("Listening", &node.local_addr().to_string());
    ui::kv("Registry", node.client().base_url());
    if let Some(e) = node.registration_error() {
        ui::warn(&format!("Not registered: {e}"));
    }
    ui::hint(USAGE);
    ui::blank();

    let printer = tokio::spawn(async move {
        while let Some(message) = rx.recv().await {
            ui::inbound(&message);
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        ui::prompt(&me);
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => break,
        };
        let line = match line {
            Ok(Some(l)) => l,
            Ok(None) => break,
            Err(e) => {
                ui::error(&format!("stdin: {e}"));
                break;
            }
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::List => {
                let peers = node.peers().await;
                if peers.is_empty() {
                    ui::warn("No other peers registered");
                } else {
                    table::peer_table(&peers).print();
                }
            }
            Input::Send { to, text } => match node.dispatch_to(to, text).await {
                Ok(outcome) => ui::outcome(to, &outcome),
                Err(e) => ui::error(&format!("{to}: {e}")),
            },
            Input::Quit => break,
            Input::Unknown => ui::warn(USAGE),
        }
    }

    node.shutdown().await;
    printer.abort();
    ui::success("Goodbye");
}

pub async fn cmd_list(config: Option<PathBuf>) {
    let client = RegistryClient::from_config(&super::load(config).peer);
    match client.list().await {
        Ok(peers) if peers.is_empty() => ui::warn("No peers registered"),
        Ok(peers) => table::peer_table(&peers).print(),
        Err(e) => {
            ui::error_with_fix(
                &format!("Cannot reach registry at {}: {e}", client.base_url()),
                "start one with `peerlink registry` or set PEERLINK_REGISTRY_URL",
            );
            std::process::exit(1);
        }
    }
}

pub async fn cmd_send(config: Option<PathBuf>, from: &str, to: &str, text: &str) {
    let config = super::load(config).peer;
    let client = RegistryClient::from_config(&config);

    let sender = match AccountStore::from_config(&config).load(Some(from)) {
        Some(account) => account.peer,
        None => match client.resolve(from).await {
            Ok(p) => p,
            Err(e) => {
                ui::error_with_fix(
                    &format!("Unknown sender {from}: {e}"),
                    &format!("peerlink account create {from} <host> <port>"),
                );
                std::process::exit(1);
            }
        },
    };

    let receiver = match client.resolve(to).await {
        Ok(p) => p,
        Err(ClientError::NotFound(_)) => {
            ui::error_with_fix(&format!("{to} is not registered"), "peerlink list");
            std::process::exit(1);
        }
        Err(e) => {
            ui::error(&format!("Cannot look up {to}: {e}"));
            std::process::exit(1);
        }
    };

    let dispatcher = Dispatcher::new(
        Arc::new(DirectMessenger::new(config.connect_timeout())),
        Arc::new(RelayFallback::new(client)),
    );
    let outcome = dispatcher
        .dispatch(&Message::new(sender, receiver, text))
        .await;
    ui::outcome(to, &outcome);
    if !outcome.is_delivered() {
        std::process::exit(1);
    }
}

pub async fn cmd_unregister(config: Option<PathBuf>, username: &str) {
    let client = RegistryClient::from_config(&super::load(config).peer);
    match client.unregister(username).await {
        Ok(()) => ui::success(&format!("Unregistered {username}")),
        Err(e) => {
            ui::error(&format!("Could not unregister {username}: {e}"));
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_input() {
        assert_eq!(parse_input("  "), Input::Empty);
        assert_eq!(parse_input("list"), Input::List);
        assert_eq!(parse_input("quit"), Input::Quit);
        assert_eq!(
            parse_input("send bob  hello there "),
            Input::Send {
                to: "bob",
                text: "hello there"
            }
        );
        assert_eq!(parse_input("send bob"), Input::Unknown);
        assert_eq!(parse_input("send"), Input::Unknown);
        assert_eq!(parse_input("dance"), Input::Unknown);
    }

    fn store() -> (tempfile::TempDir, AccountStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = AccountStore::new(dir.path().join("accounts.json"));
        (dir, store)
    }

    #[test]
    fn test_new_username_needs_port_and_is_saved() {
        let (_dir, store) = store();
        assert!(resolve_identity(&store, "127.0.0.1", Some("alice".into()), None, None).is_err());

        let peer =
            resolve_identity(&store, "127.0.0.1", Some("alice".into()), None, Some(9001)).unwrap();
        assert_eq!(peer, PeerRecord::new("alice", "127.0.0.1", 9001));
        assert!(store.load(Some("alice")).is_some());
    }

    #[test]
    fn test_saved_account_with_session_override() {
        let (_dir, store) = store();
        store
            .create(PeerRecord::new("alice", "127.0.0.1", 9001))
            .unwrap();

        let peer = resolve_identity(&store, "0.0.0.0", None, None, Some(9100)).unwrap();
        assert_eq!(peer, PeerRecord::new("alice", "127.0.0.1", 9100));
        // The saved account is untouched.
        assert_eq!(store.load(Some("alice")).unwrap().peer.port, 9001);
    }

    #[test]
    fn test_no_accounts_and_no_username_fails() {
        let (_dir, store) = store();
        assert!(resolve_identity(&store, "127.0.0.1", None, None, None).is_err());
    }
}
