//! TOML configuration file support for the demo command.
//!
//! Writer settings can live in a file instead of flags; flags given on the
//! command line win over the file:
//!
//! ```toml
//! # varsink.toml
//! [writer]
//! buffer_size = 65536
//! create_md5 = true
//! async_io = false
//! options = ["index-on-the-fly", "write-full-format-field"]
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use varsink::options::WriterOption;

/// Root configuration structure for varsink.toml files.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Writer settings.
    #[serde(default)]
    pub writer: WriterConfig,
}

/// Settings applied to the writer builder.
#[derive(Debug, Default, Deserialize)]
pub struct WriterConfig {
    /// Buffer size in bytes; 0 disables buffering.
    pub buffer_size: Option<usize>,

    /// Write an .md5 sidecar next to file outputs.
    pub create_md5: Option<bool>,

    /// Serialize on a background thread.
    pub async_io: Option<bool>,

    /// Options added on top of the process-wide defaults.
    #[serde(default)]
    pub options: Vec<WriterOption>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config() {
        let toml = r#"
            [writer]
            buffer_size = 65536
            create_md5 = true
            async_io = false
            options = ["index-on-the-fly", "force-binary"]
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.writer.buffer_size, Some(65_536));
        assert_eq!(config.writer.create_md5, Some(true));
        assert_eq!(config.writer.async_io, Some(false));
        assert_eq!(
            config.writer.options,
            vec![WriterOption::IndexOnTheFly, WriterOption::ForceBinary]
        );
    }

    #[test]
    fn test_partial_config() {
        let toml = r#"
            [writer]
            buffer_size = 0
        "#;

        let config = Config::from_str(toml).unwrap();
        assert_eq!(config.writer.buffer_size, Some(0));
        assert_eq!(config.writer.create_md5, None);
        assert!(config.writer.options.is_empty());
    }

    #[test]
    fn test_empty_config() {
        let config = Config::from_str("").unwrap();
        assert_eq!(config.writer.buffer_size, None);
    }

    #[test]
    fn test_unknown_option_rejected() {
        let toml = r#"
            [writer]
            options = ["force-bcf"]
        "#;

        assert!(Config::from_str(toml).is_err());
    }
}
