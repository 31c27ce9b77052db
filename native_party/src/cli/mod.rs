use clap::Parser;
use std::path::PathBuf;

/// Server CLI for watch-party
#[derive(Parser, Debug, Clone)]
#[command(name = "watch-party", version, about = "Synchronized watch party server")]
pub struct ServerCli {
    /// Path to config file
    #[arg(long, default_value = "watch-party.toml")]
    pub config: PathBuf,

    /// Listen address (overrides config.address)
    #[arg(long)]
    pub address: Option<String>,

    /// Listen port (overrides config.port)
    #[arg(long)]
    pub port: Option<u16>,

    /// Video selected at startup (overrides config.default_video)
    #[arg(long)]
    pub default_video: Option<String>,

    /// Persist CLI overrides back to the config file
    #[arg(long, default_value_t = false)]
    pub persist: bool,

    /// Verbose logging with targets, thread ids and source locations
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

impl ServerCli {
    /// Apply overrides in memory. Returns whether anything changed.
    pub fn apply_overrides(&self, cfg: &mut crate::config::Config) -> bool {
        let mut changed = false;
        if let Some(address) = &self.address {
            cfg.address = address.clone();
            changed = true;
        }
        if let Some(port) = self.port {
            cfg.port = port;
            changed = true;
        }
        if let Some(video) = &self.default_video {
            cfg.default_video = video.clone();
            changed = true;
        }
        changed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn overrides_replace_config_values() {
        let cli = ServerCli::parse_from(["watch-party", "--port", "9100", "--default-video", "b.mp4"]);
        let mut cfg = Config::default();
        assert!(cli.apply_overrides(&mut cfg));
        assert_eq!(cfg.port, 9100);
        assert_eq!(cfg.default_video, "b.mp4");
        assert_eq!(cfg.address, Config::default().address);
    }

    #[test]
    fn no_flags_change_nothing() {
        let cli = ServerCli::parse_from(["watch-party"]);
        let mut cfg = Config::default();
        assert!(!cli.apply_overrides(&mut cfg));
        assert_eq!(cfg, Config::default());
    }
}
