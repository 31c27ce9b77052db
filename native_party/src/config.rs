use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::party::PartySettings;

/// Server configuration persisted as TOML.
///
/// Fields:
/// - address / port: where the HTTP + websocket server listens
/// - default_video: video selected when the server starts
/// - static_path: front-end bundle served at `/`
/// - videos_path / images_path / thumbnails_path: media mounts and catalog roots
/// - seating: auditorium layout
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Config {
    pub address: String,
    pub port: u16,
    pub default_video: String,
    pub static_path: PathBuf,
    pub videos_path: PathBuf,
    pub images_path: PathBuf,
    pub thumbnails_path: PathBuf,
    #[serde(default)]
    pub seating: SeatingConfig,
}

/// Row capacity table. The first `stage_rows` rows sit in front of the
/// screen and are never handed out automatically.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct SeatingConfig {
    pub row_seats: Vec<usize>,
    pub stage_rows: usize,
}

impl Default for SeatingConfig {
    fn default() -> Self {
        SeatingConfig {
            row_seats: vec![16, 16, 14, 12, 10, 8, 6],
            stage_rows: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            address: "0.0.0.0".to_string(),
            port: 8080,
            default_video: "intro.mp4".to_string(),
            static_path: PathBuf::from("dist"),
            videos_path: PathBuf::from("videos"),
            images_path: PathBuf::from("images"),
            thumbnails_path: PathBuf::from("thumbnails"),
            seating: SeatingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from `path`. If the file does not exist, create it
    /// with reasonable defaults and return the default config.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        let cfg = if path.exists() {
            let s = fs::read_to_string(path)
                .with_context(|| format!("reading config file '{}'", path.display()))?;
            toml::from_str::<Config>(&s)
                .with_context(|| format!("parsing TOML config '{}'", path.display()))?
        } else {
            let cfg = Config::default();
            cfg.save(path)?;
            tracing::info!(path = %path.display(), "wrote default config");
            cfg
        };
        cfg.validate()
            .with_context(|| format!("validating config '{}'", path.display()))?;
        Ok(cfg)
    }

    /// Save the current config state back to the provided path (overwrites).
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("creating config directory '{}'", parent.display()))?;
            }
        }
        let toml_text = toml::to_string_pretty(&self).with_context(|| "serializing config to TOML")?;
        fs::write(path, toml_text)
            .with_context(|| format!("writing config to '{}'", path.display()))?;
        Ok(())
    }

    /// The seating layout must leave at least one seat behind the stage rows.
    pub fn validate(&self) -> Result<()> {
        let seating = &self.seating;
        if seating.stage_rows >= seating.row_seats.len() {
            bail!(
                "seating.stage_rows ({}) must be smaller than the number of rows ({})",
                seating.stage_rows,
                seating.row_seats.len()
            );
        }
        if seating.row_seats[seating.stage_rows..].iter().all(|&n| n == 0) {
            bail!("no seats available behind the stage rows");
        }
        if self.default_video.trim().is_empty() {
            bail!("default_video must not be empty");
        }
        Ok(())
    }

    pub fn party_settings(&self) -> PartySettings {
        PartySettings {
            row_seats: self.seating.row_seats.clone(),
            stage_rows: self.seating.stage_rows,
            default_video: self.default_video.clone(),
        }
    }
}
