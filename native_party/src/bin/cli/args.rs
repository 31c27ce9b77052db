use clap::{Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "party-cli", version, about = "Headless CLI for the watch party", long_about = None)]
pub struct Cli {
    /// Server address. Accepted forms:
    /// - ws:// or wss:// URL (e.g. --server 'ws://localhost:8080/ws')
    /// - http:// or https:// URL, converted to the websocket endpoint
    /// - bare host:port (e.g. --server localhost:8080)
    #[arg(long, default_value = "ws://localhost:8080/ws")]
    pub server: String,

    /// How long to wait for server messages after sending a command (ms)
    #[arg(long, default_value_t = 1200)]
    pub wait_ms: u64,

    /// Output JSON instead of human-readable text
    #[arg(long, default_value_t = false)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Join and print every message as it arrives
    Watch,
    /// Send a chat message from your seat
    Chat { message: String },
    /// Clap with the given sprite
    Clap { sprite: String },
    /// Request playback at a position
    Play {
        /// Request a pause instead of play
        #[arg(long, default_value_t = false)]
        pause: bool,
        /// Position in seconds
        #[arg(long, default_value_t = 0.0)]
        progress: f64,
        /// Switch to this video as part of the request
        #[arg(long)]
        video: Option<String>,
    },
    /// Select another video (paused at the start)
    ChangeVideo { video: String },
    /// Report buffering finished
    Ready,
    /// Print the seating chart and playback state
    State,
    /// List the video catalog
    Videos,
    /// List the image catalog
    Images,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn play_defaults_to_start() {
        let cli = Cli::parse_from(["party-cli", "play"]);
        match cli.command {
            Commands::Play {
                pause,
                progress,
                video,
            } => {
                assert!(!pause);
                assert_eq!(progress, 0.0);
                assert_eq!(video, None);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(cli.server, "ws://localhost:8080/ws");
    }

    #[test]
    fn chat_takes_message() {
        let cli = Cli::parse_from(["party-cli", "--server", "localhost:9000", "chat", "hello there"]);
        assert!(matches!(cli.command, Commands::Chat { ref message } if message == "hello there"));
        assert_eq!(cli.server, "localhost:9000");
    }
}
