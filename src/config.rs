//! Player-facing configuration for the terminal client.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument, warn};

/// Display and identity preferences, persisted as TOML.
///
/// The in-game toggles write straight back to the file, so preferences
/// survive across runs.
#[derive(Debug, Clone, Default, Getters, Serialize, Deserialize)]
pub struct AppConfig {
    /// Display name offered at sign-in when the CLI gives none.
    #[serde(default)]
    player_name: Option<String>,

    /// Dark color scheme for the board.
    #[serde(default)]
    dark_mode: bool,

    /// Hollow piece glyphs instead of filled ones.
    #[serde(default)]
    outline_pieces: bool,
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;

        info!("Config loaded successfully");
        Ok(config)
    }

    /// Loads the file when it exists, falling back to defaults otherwise.
    /// Unreadable files also fall back, with a warning.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        if !path.as_ref().exists() {
            debug!("No config file; using defaults");
            return Self::default();
        }
        Self::from_file(path.as_ref()).unwrap_or_else(|e| {
            warn!(error = %e, "Falling back to default config");
            Self::default()
        })
    }

    /// Writes the configuration back as TOML.
    #[instrument(skip(self, path), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string(self)
            .map_err(|e| ConfigError::new(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path.as_ref(), content)
            .map_err(|e| ConfigError::new(format!("Failed to write config file: {}", e)))?;
        debug!("Config saved");
        Ok(())
    }

    /// Flips the dark-mode preference.
    pub fn toggle_dark_mode(&mut self) {
        self.dark_mode = !self.dark_mode;
    }

    /// Flips the glyph-style preference.
    pub fn toggle_outline_pieces(&mut self) {
        self.outline_pieces = !self.outline_pieces;
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_round_trips_through_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chess_rooms.toml");

        let mut config = AppConfig::default();
        config.toggle_dark_mode();
        config.save(&path).unwrap();

        let loaded = AppConfig::from_file(&path).unwrap();
        assert!(loaded.dark_mode());
        assert!(!loaded.outline_pieces());
        assert_eq!(*loaded.player_name(), None);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "player_name = \"Anand\"").unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.player_name().as_deref(), Some("Anand"));
        assert!(!config.dark_mode());
        assert!(!config.outline_pieces());
    }

    #[test]
    fn test_unreadable_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "this is not toml [").unwrap();

        let config = AppConfig::load_or_default(file.path());
        assert!(!config.dark_mode());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = AppConfig::load_or_default("/nonexistent/chess_rooms.toml");
        assert_eq!(*config.player_name(), None);
    }
}
