//! Shared terminal output helpers, colored with `colored`.

use colored::Colorize;
use peerlink_types::{DeliveryOutcome, Message};

/// Print a success message.
pub fn success(msg: &str) {
    println!("  {} {}", "\u{2714}".bright_green(), msg);
}

/// Print an error message.
pub fn error(msg: &str) {
    println!("  {} {}", "\u{2718}".bright_red(), msg.bright_red());
}

/// Red error + yellow "fix:" suggestion.
pub fn error_with_fix(msg: &str, fix: &str) {
    error(msg);
    println!("    {} {}", "fix:".bright_yellow(), fix);
}

/// Yellow warning line.
pub fn warn(msg: &str) {
    println!("  {} {}", "-".bright_yellow(), msg.yellow());
}

/// Section header: ">> Title" in cyan.
pub fn section(title: &str) {
    println!("  {} {}", ">>".bright_cyan().bold(), title.bold());
}

/// Key-value display: "  Label:       value".
pub fn kv(label: &str, value: &str) {
    println!("  {:<13}{}", format!("{label}:"), value);
}

pub fn hint(msg: &str) {
    println!("  {} {}", "hint:".dimmed(), msg.dimmed());
}

pub fn blank() {
    println!();
}

/// An inbound message, shown as it arrives.
pub fn inbound(message: &Message) {
    let sender = message.sender();
    println!(
        "  {} {} {}",
        "<<".bright_magenta().bold(),
        format!("[{}:{}]", sender.host, sender.port).dimmed(),
        message.data()
    );
}

/// How a dispatch ended.
pub fn outcome(to: &str, outcome: &DeliveryOutcome) {
    match outcome {
        DeliveryOutcome::DeliveredDirect => success(&format!("{to}: {outcome}")),
        DeliveryOutcome::DeliveredRelay => {
            println!("  {} {to}: {outcome}", "\u{2714}".bright_yellow())
        }
        DeliveryOutcome::Failed(_) => error(&format!("{to}: {outcome}")),
    }
}

/// Interactive prompt marker, without a newline.
pub fn prompt(username: &str) {
    use std::io::Write;
    print!("{} ", format!("{username}>").bright_cyan().bold());
    let _ = std::io::stdout().flush();
}
