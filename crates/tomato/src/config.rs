//! Construction settings for a [`Context`](crate::Context).

use deno_core::v8;
use serde::Deserialize;

use crate::natives::DebugOutput;

/// Name given to scripts run without an explicit one.
pub const DYNAMIC_SCRIPT_NAME: &str = "(dynamic)";

const MB: usize = 1024 * 1024;

/// Per-context configuration. Every field has a default, so an empty TOML
/// table deserializes to [`ContextConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Diagnostic name used when `run` is not given one
    pub script_name: String,
    /// Where the `debug` native writes
    pub debug_output: DebugOutput,
    /// Initial V8 heap size in megabytes
    pub heap_initial_mb: Option<usize>,
    /// V8 heap limit in megabytes; unset means V8's default
    pub heap_max_mb: Option<usize>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            script_name: DYNAMIC_SCRIPT_NAME.to_string(),
            debug_output: DebugOutput::default(),
            heap_initial_mb: None,
            heap_max_mb: None,
        }
    }
}

impl ContextConfig {
    /// Isolate creation parameters, if any heap limit is configured.
    pub(crate) fn create_params(&self) -> Option<v8::CreateParams> {
        let (initial, max) = self.heap_limits()?;
        Some(v8::CreateParams::default().heap_limits(initial, max))
    }

    /// `(initial, max)` heap sizes in bytes. Oversized values saturate.
    fn heap_limits(&self) -> Option<(usize, usize)> {
        let max_mb = self.heap_max_mb?;
        let initial_mb = self.heap_initial_mb.unwrap_or(0).min(max_mb);
        Some((initial_mb.saturating_mul(MB), max_mb.saturating_mul(MB)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ContextConfig::default();
        assert_eq!(config.script_name, "(dynamic)");
        assert_eq!(config.debug_output, DebugOutput::Stderr);
        assert!(config.create_params().is_none());
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ContextConfig = toml::from_str(
            r#"
debug_output = "log"
heap_max_mb = 64
"#,
        )
        .unwrap();

        assert_eq!(config.script_name, "(dynamic)");
        assert_eq!(config.debug_output, DebugOutput::Log);
        assert_eq!(config.heap_max_mb, Some(64));
        assert!(config.create_params().is_some());
    }

    #[test]
    fn test_deserialize_empty() {
        let config: ContextConfig = toml::from_str("").unwrap();
        assert_eq!(config, ContextConfig::default());
    }

    #[test]
    fn test_heap_limits() {
        let config = ContextConfig {
            heap_initial_mb: Some(512),
            heap_max_mb: Some(64),
            ..Default::default()
        };
        assert_eq!(config.heap_limits(), Some((64 * MB, 64 * MB)));

        let config = ContextConfig {
            heap_initial_mb: Some(1),
            ..Default::default()
        };
        assert_eq!(config.heap_limits(), None);
    }

    #[test]
    fn test_huge_heap_limits_saturate() {
        let config: ContextConfig = toml::from_str(
            r#"
heap_initial_mb = 9223372036854775807
heap_max_mb = 9223372036854775807
"#,
        )
        .unwrap();

        assert_eq!(config.heap_limits(), Some((usize::MAX, usize::MAX)));
    }

    #[test]
    fn test_reject_unknown_output() {
        let result: Result<ContextConfig, _> = toml::from_str(r#"debug_output = "syslog""#);
        assert!(result.is_err());
    }
}
