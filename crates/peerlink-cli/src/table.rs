//! Box-drawn tables for peer and account listings.

use colored::Colorize;
use peerlink_types::{Account, PeerRecord};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
}

/// Collects headers and rows, then renders with Unicode box-drawing borders.
pub struct Table {
    headers: Vec<String>,
    alignments: Vec<Align>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// All columns start left-aligned.
    pub fn new(headers: &[&str]) -> Self {
        Self {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            alignments: vec![Align::Left; headers.len()],
            rows: Vec::new(),
        }
    }

    /// Out-of-range columns are ignored.
    pub fn align(mut self, col: usize, alignment: Align) -> Self {
        if let Some(a) = self.alignments.get_mut(col) {
            *a = alignment;
        }
        self
    }

    /// Extra cells are dropped; missing cells render empty.
    pub fn add_row(&mut self, cells: &[String]) {
        let row = (0..self.headers.len())
            .map(|i| cells.get(i).cloned().unwrap_or_default())
            .collect();
        self.rows.push(row);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn widths(&self) -> Vec<usize> {
        let mut widths: Vec<usize> = self.headers.iter().map(|h| h.chars().count()).collect();
        for row in &self.rows {
            for (w, cell) in widths.iter_mut().zip(row) {
                *w = (*w).max(cell.chars().count());
            }
        }
        widths
    }

    fn pad(text: &str, width: usize, alignment: Align) -> String {
        let fill = " ".repeat(width.saturating_sub(text.chars().count()));
        match alignment {
            Align::Left => format!("{text}{fill}"),
            Align::Right => format!("{fill}{text}"),
        }
    }

    fn border(widths: &[usize], left: &str, mid: &str, right: &str) -> String {
        let segments: Vec<String> = widths.iter().map(|w| "\u{2500}".repeat(w + 2)).collect();
        format!("{left}{}{right}", segments.join(mid))
    }

    fn line(&self, cells: impl Iterator<Item = String>) -> String {
        let cells: Vec<String> = cells.map(|c| format!(" {c} ")).collect();
        format!("\u{2502}{}\u{2502}", cells.join("\u{2502}"))
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut lines = vec![Self::border(&widths, "\u{250c}", "\u{252c}", "\u{2510}")];

        lines.push(self.line(self.headers.iter().enumerate().map(|(i, h)| {
            Self::pad(h, widths[i], self.alignments[i])
                .bold()
                .to_string()
        })));
        lines.push(Self::border(&widths, "\u{251c}", "\u{253c}", "\u{2524}"));

        for row in &self.rows {
            lines.push(self.line(
                row.iter()
                    .enumerate()
                    .map(|(i, cell)| Self::pad(cell, widths[i], self.alignments[i])),
            ));
        }

        lines.push(Self::border(&widths, "\u{2514}", "\u{2534}", "\u{2518}"));
        lines.join("\n")
    }

    pub fn print(&self) {
        println!("{}", self.render());
    }
}

/// Registered peers: username, host, port.
pub fn peer_table(peers: &[PeerRecord]) -> Table {
    let mut table = Table::new(&["Username", "Host", "Port"]).align(2, Align::Right);
    for p in peers {
        table.add_row(&[p.username.clone(), p.host.clone(), p.port.to_string()]);
    }
    table
}

/// Saved accounts with their creation time.
pub fn account_table(accounts: &[Account]) -> Table {
    let mut table = Table::new(&["Username", "Host", "Port", "Created"]).align(2, Align::Right);
    for a in accounts {
        table.add_row(&[
            a.peer.username.clone(),
            a.peer.host.clone(),
            a.peer.port.to_string(),
            a.created_at.format("%Y-%m-%d %H:%M").to_string(),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peer_table_layout() {
        let rendered = peer_table(&[
            PeerRecord::new("alice", "127.0.0.1", 9001),
            PeerRecord::new("bob", "10.0.0.12", 12000),
        ])
        .render();
        let lines: Vec<&str> = rendered.lines().collect();

        // top, header, separator, two rows, bottom
        assert_eq!(lines.len(), 6);
        assert!(lines[0].starts_with("\u{250c}"));
        assert!(lines[5].ends_with("\u{2518}"));
        assert!(lines[1].contains("Username"));
        assert!(lines[3].contains("alice") && lines[3].contains(" 9001 "));
        assert!(lines[4].contains("10.0.0.12") && lines[4].contains("12000"));
    }

    #[test]
    fn test_port_column_right_aligned() {
        let rendered = peer_table(&[
            PeerRecord::new("alice", "127.0.0.1", 9001),
            PeerRecord::new("bob", "127.0.0.1", 12000),
        ])
        .render();
        let alice = rendered.lines().find(|l| l.contains("alice")).unwrap();
        assert!(alice.contains("  9001 \u{2502}"));
    }

    #[test]
    fn test_width_counts_chars_not_bytes() {
        let rendered = peer_table(&[PeerRecord::new("zoë", "h", 1024)]).render();
        let widths: Vec<usize> = rendered.lines().map(|l| l.chars().count()).collect();
        // Borders and rows line up once ANSI bold codes are ignored.
        assert_eq!(widths[0], widths[3]);
        assert_eq!(widths[0], widths[4]);
    }

    #[test]
    fn test_empty_and_short_rows() {
        let mut t = Table::new(&["A", "B", "C"]);
        assert!(t.is_empty());
        assert_eq!(t.render().lines().count(), 4);

        t.add_row(&["only".to_string()]);
        let row = t.render().lines().nth(3).unwrap().to_string();
        assert_eq!(row.matches('\u{2502}').count(), 4);
    }
}
