//! Key builder configuration.
//!
//! Controls the encoder, the default scope and diagnostics via `callkey.toml`.

use std::str::FromStr;

use serde::Deserialize;

/// Built-in argument encoders selectable from configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncoderKind {
    /// [`DisplayEncoder`](super::DisplayEncoder).
    #[default]
    Display,
    /// [`DebugEncoder`](super::DebugEncoder).
    Debug,
}

impl FromStr for EncoderKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "display" => Ok(Self::Display),
            "debug" => Ok(Self::Debug),
            other => Err(format!("unknown encoder `{other}` (expected display|debug)")),
        }
    }
}

/// Key builder configuration from `callkey.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct KeyConfig {
    /// Encoder for argument values.
    pub encoder: EncoderKind,
    /// Scope used when no task-local scope is active.
    pub scope: Option<String>,
    /// Register the tracing listener for suspicious-parameter warnings.
    pub diagnostics: bool,
}

impl Default for KeyConfig {
    fn default() -> Self {
        Self {
            encoder: EncoderKind::Display,
            scope: None,
            diagnostics: true,
        }
    }
}

impl From<&crate::config::KeySettings> for KeyConfig {
    fn from(settings: &crate::config::KeySettings) -> Self {
        Self {
            encoder: settings.encoder,
            scope: settings.scope.clone(),
            diagnostics: settings.diagnostics,
        }
    }
}

impl KeyConfig {
    /// The configured default scope, ignoring blank values.
    pub fn default_scope(&self) -> Option<&str> {
        self.scope
            .as_deref()
            .map(str::trim)
            .filter(|scope| !scope.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = KeyConfig::default();
        assert_eq!(config.encoder, EncoderKind::Display);
        assert!(config.scope.is_none());
        assert!(config.diagnostics);
    }

    #[test]
    fn blank_scope_is_no_scope() {
        let config = KeyConfig {
            scope: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(config.default_scope().is_none());
    }

    #[test]
    fn scope_is_trimmed() {
        let config = KeyConfig {
            scope: Some(" tenant-a ".to_string()),
            ..Default::default()
        };
        assert_eq!(config.default_scope(), Some("tenant-a"));
    }

    #[test]
    fn encoder_kind_parses_case_insensitively() {
        assert_eq!("Debug".parse::<EncoderKind>(), Ok(EncoderKind::Debug));
        assert_eq!(" display ".parse::<EncoderKind>(), Ok(EncoderKind::Display));
        assert!("json".parse::<EncoderKind>().is_err());
    }
}
