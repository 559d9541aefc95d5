//! CLI settings file (`tomato.toml`).

use std::path::{Path, PathBuf};

use serde::Deserialize;
use tomato::ContextConfig;

/// Error type for settings loading
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Top-level settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub log: LogSettings,
    #[serde(default)]
    pub context: ContextConfig,
}

/// Logging settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LogSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_filter")]
    pub filter: String,
}

fn default_filter() -> String {
    "tomato=info".to_string()
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: default_filter(),
        }
    }
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self, SettingsError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };

        let content = std::fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, SettingsError> {
        Ok(toml::from_str(content)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use tomato::DebugOutput;

    #[test]
    fn test_defaults_without_path() {
        let settings = Settings::load(None).unwrap();
        assert_eq!(settings.log.filter, "tomato=info");
        assert_eq!(settings.context.script_name, "(dynamic)");
    }

    #[test]
    fn test_load_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tomato.toml");
        std::fs::write(
            &path,
            r#"
[log]
filter = "tomato=debug"

[context]
script_name = "repl"
debug_output = "stdout"
heap_max_mb = 128
"#,
        )
        .unwrap();

        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.log.filter, "tomato=debug");
        assert_eq!(settings.context.script_name, "repl");
        assert_eq!(settings.context.debug_output, DebugOutput::Stdout);
        assert_eq!(settings.context.heap_max_mb, Some(128));
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let err = Settings::load(Some(&dir.path().join("absent.toml"))).unwrap_err();
        assert!(matches!(err, SettingsError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml() {
        let err = Settings::parse("[context\n").unwrap_err();
        assert!(matches!(err, SettingsError::Parse(_)));
    }
}
