use std::collections::HashSet;

use owo_colors::OwoColorize;
use party_shared::{MediaEntry, Seat, SeatingUpdate, ServerMsg};

const FREE: char = '·';
const TAKEN: char = '●';
const YOURS: char = '◉';

/// Render the auditorium, screen on top. Rows are centred on the widest one.
pub fn format_seating_chart(update: &SeatingUpdate, row_seats: &[usize], color: bool) -> String {
    let taken: HashSet<Seat> = update.seats_not_free.iter().copied().collect();
    let widest = row_seats.iter().copied().max().unwrap_or(0);
    let width = widest * 2;

    let mut out = String::new();
    let screen = format!("{:^width$}", "[ screen ]", width = width.max(10));
    if color {
        out.push_str(&screen.bold().to_string());
    } else {
        out.push_str(&screen);
    }

    for (row, &count) in row_seats.iter().enumerate() {
        out.push('\n');
        let pad = widest.saturating_sub(count);
        out.push_str(&" ".repeat(pad));
        for column in 0..count {
            let seat = Seat::new(row, column);
            let cell = if update.your_seat == Some(seat) {
                paint(YOURS, color, Paint::Yours)
            } else if taken.contains(&seat) {
                paint(TAKEN, color, Paint::Taken)
            } else {
                paint(FREE, color, Paint::Free)
            };
            out.push_str(&cell);
            out.push(' ');
        }
        let line_end = out.trim_end_matches(' ').len();
        out.truncate(line_end);
    }
    out
}

enum Paint {
    Free,
    Taken,
    Yours,
}

fn paint(c: char, color: bool, kind: Paint) -> String {
    if !color {
        return c.to_string();
    }
    match kind {
        Paint::Free => c.dimmed().to_string(),
        Paint::Taken => c.cyan().to_string(),
        Paint::Yours => c.green().bold().to_string(),
    }
}

fn format_media(kind: &str, entries: &[MediaEntry]) -> String {
    let mut out = format!("{} ({}):", kind, entries.len());
    for e in entries {
        out.push_str(&format!("\n  {} [{}] thumb={}", e.title, e.file, e.thumbnail));
    }
    out
}

/// One-line (or short block) human rendering of a server frame.
pub fn format_server_msg(msg: &ServerMsg, color: bool) -> String {
    let line = match msg {
        ServerMsg::UpdateState(update) => {
            let you = update
                .your_seat
                .map(|s| s.to_string())
                .unwrap_or_else(|| "no seat".into());
            format!(
                "seating: {} taken, you are at {}",
                update.seats_not_free.len(),
                you
            )
        }
        ServerMsg::RequestPlay(p) => format!(
            "playback: {} at {:.1}s{}",
            if p.playing { "playing" } else { "paused" },
            p.progress,
            p.video
                .as_deref()
                .map(|v| format!(" ({v})"))
                .unwrap_or_default()
        ),
        ServerMsg::Resume => "everyone is ready".to_string(),
        ServerMsg::Chat(c) => format!("[{}:{}] {}", c.row, c.column, c.message),
        ServerMsg::Clap(c) => format!("[{}:{}] claps {}", c.row, c.column, c.sprite),
        ServerMsg::VideoList(v) => format_media("videos", v),
        ServerMsg::ImageList(v) => format_media("images", v),
        ServerMsg::Rejected { reason } => format!("rejected: {reason}"),
    };
    if !color {
        return line;
    }
    let tag = format!("{:>12}", msg.kind());
    match msg {
        ServerMsg::Rejected { .. } => format!("{} {}", tag.red().bold(), line),
        ServerMsg::Resume => format!("{} {}", tag.green().bold(), line),
        ServerMsg::Chat(_) | ServerMsg::Clap(_) => format!("{} {}", tag.yellow(), line),
        _ => format!("{} {}", tag.blue(), line),
    }
}
