use std::io::IsTerminal;

use party_shared::{SeatingUpdate, ServerMsg};

use native_party::pretty::{format_seating_chart, format_server_msg};

/// Default layout used to draw charts; the protocol does not carry row sizes.
const CHART_ROWS: [usize; 7] = [16, 16, 14, 12, 10, 8, 6];

#[derive(Clone, Copy)]
pub enum DisplayMode {
    /// One line per message.
    Everything,
    /// Like `Everything`, plus a drawn chart whenever the seating changes.
    Chart,
}

pub struct MessagePrinter {
    json: bool,
    mode: DisplayMode,
    last_seating: Option<SeatingUpdate>,
}

impl MessagePrinter {
    pub fn new(json: bool, mode: DisplayMode) -> Self {
        Self {
            json,
            mode,
            last_seating: None,
        }
    }

    pub fn handle(&mut self, msg: &ServerMsg) {
        if self.json {
            match serde_json::to_string_pretty(msg) {
                Ok(json_str) => println!("{}", json_str),
                Err(e) => eprintln!("Failed to serialize message to JSON: {}", e),
            }
            return;
        }

        let use_color = std::io::stdout().is_terminal();
        println!("{}", format_server_msg(msg, use_color));

        if let (DisplayMode::Chart, ServerMsg::UpdateState(update)) = (self.mode, msg) {
            if self.last_seating.as_ref() != Some(update) {
                println!("{}", format_seating_chart(update, &CHART_ROWS, use_color));
                self.last_seating = Some(update.clone());
            }
        }
    }
}
