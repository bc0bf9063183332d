//! Configuration layer: typed settings with layered precedence (file → env → CLI).

use std::str::FromStr;

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;

use crate::cache::EncoderKind;

mod cli;

pub use cli::{AncestorsArgs, CliArgs, Command, GlobalOverrides, KeyArgs, RemoveKeyArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "callkey";
const ENV_PREFIX: &str = "CALLKEY";
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::WARN;

/// Fully-resolved settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub keys: KeySettings,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct KeySettings {
    pub encoder: EncoderKind,
    pub scope: Option<String>,
    pub diagnostics: bool,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;
    raw.apply_overrides(&cli.overrides);

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    logging: RawLoggingSettings,
    keys: RawKeySettings,
}

impl RawSettings {
    fn apply_overrides(&mut self, overrides: &GlobalOverrides) {
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(encoder) = overrides.encoder.as_ref() {
            self.keys.encoder = Some(encoder.clone());
        }
        if let Some(scope) = overrides.default_scope.as_ref() {
            self.keys.scope = Some(scope.clone());
        }
        if let Some(diagnostics) = overrides.diagnostics {
            self.keys.diagnostics = Some(diagnostics);
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings { logging, keys } = raw;

        let logging = build_logging_settings(logging)?;
        let keys = build_key_settings(keys)?;

        Ok(Self { logging, keys })
    }
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => DEFAULT_LOG_LEVEL,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_key_settings(keys: RawKeySettings) -> Result<KeySettings, LoadError> {
    let encoder = match keys.encoder {
        Some(encoder) => EncoderKind::from_str(&encoder)
            .map_err(|reason| LoadError::invalid("keys.encoder", reason))?,
        None => EncoderKind::default(),
    };

    let scope = keys.scope.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });
    if scope.as_deref().is_some_and(|scope| scope.contains('|')) {
        return Err(LoadError::invalid(
            "keys.scope",
            "must not contain the key separator `|`",
        ));
    }

    Ok(KeySettings {
        encoder,
        scope,
        diagnostics: keys.diagnostics.unwrap_or(true),
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawKeySettings {
    encoder: Option<String>,
    scope: Option<String>,
    diagnostics: Option<bool>,
}
