//! `peerlink registry`: run the registry service.

use crate::ui;
use std::path::PathBuf;

pub async fn cmd_registry(config: Option<PathBuf>, listen: Option<String>, db: Option<PathBuf>) {
    let mut config = super::load(config).registry;
    if let Some(addr) = listen {
        config.listen_addr = addr;
    }
    if db.is_some() {
        config.db_path = db;
    }

    let server = match peerlink_api::start_server(&config).await {
        Ok(s) => s,
        Err(e) => {
            ui::error_with_fix(
                &format!("Registry failed to start: {e}"),
                "pick a free address with --listen",
            );
            std::process::exit(1);
        }
    };

    ui::section("PeerLink registry");
    ui::kv("Listening", &server.url());
    ui::kv(
        "Storage",
        &config
            .db_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "in-memory".to_string()),
    );
    ui::hint("Ctrl+C to stop");

    if let Err(e) = tokio::signal::ctrl_c().await {
        ui::error(&format!("Cannot listen for Ctrl+C: {e}"));
    }
    server.shutdown().await;
    ui::success("Registry stopped");
}
