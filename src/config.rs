use crate::parsers::ParserKind;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration loaded from benchlog.toml.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct BenchlogConfig {
    pub parse: ParseConfig,
    pub output: OutputConfig,
    pub display: DisplayConfig,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct ParseConfig {
    /// Family used when `--parser` is not given.
    pub parser: Option<ParserKind>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub enabled: bool,
    pub format: DisplayFormat,
}

/// How the summary is printed before it is persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DisplayFormat {
    #[default]
    Text,
    Json,
}

// --- Default implementations ---

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("output.csv"),
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            format: DisplayFormat::Text,
        }
    }
}

/// Load config from `path`, or defaults when the file is missing or invalid.
pub fn load_config(path: &Path) -> BenchlogConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => match toml::from_str(&contents) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::warn!("failed to parse {}: {e}", path.display());
                BenchlogConfig::default()
            }
        },
        Err(_) => BenchlogConfig::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn defaults() {
        let cfg = BenchlogConfig::default();
        assert_eq!(cfg.parse.parser, None);
        assert_eq!(cfg.output.path, PathBuf::from("output.csv"));
        assert!(cfg.display.enabled);
        assert_eq!(cfg.display.format, DisplayFormat::Text);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let cfg = load_config(&dir.path().join("benchlog.toml"));
        assert_eq!(cfg.output.path, PathBuf::from("output.csv"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchlog.toml");
        std::fs::write(
            &path,
            "[parse]\nparser = \"atomic-sum\"\n\n[display]\nformat = \"json\"\n",
        )
        .unwrap();
        let cfg = load_config(&path);
        assert_eq!(cfg.parse.parser, Some(ParserKind::AtomicSum));
        assert_eq!(cfg.display.format, DisplayFormat::Json);
        assert!(cfg.display.enabled);
        assert_eq!(cfg.output.path, PathBuf::from("output.csv"));
    }

    #[test]
    fn invalid_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("benchlog.toml");
        std::fs::write(&path, "[parse]\nparser = \"bogus\"\n").unwrap();
        let cfg = load_config(&path);
        assert_eq!(cfg.parse.parser, None);
    }
}
