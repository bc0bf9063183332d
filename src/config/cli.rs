use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the callkey binary.
#[derive(Debug, Parser)]
#[command(name = "callkey", version, about = "Inspect hierarchical cache keys")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "CALLKEY_CONFIG_FILE",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: GlobalOverrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Build the full key of a call and list its ancestors.
    Key(KeyArgs),
    /// Build a bulk-invalidation key for a type, component or method.
    #[command(name = "remove-key")]
    RemoveKey(RemoveKeyArgs),
    /// List the ancestor keys of an existing key.
    Ancestors(AncestorsArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct GlobalOverrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the argument encoder (display|debug).
    #[arg(long = "encoder", value_name = "ENCODER", global = true)]
    pub encoder: Option<String>,

    /// Override the scope used when none is given per call.
    #[arg(long = "default-scope", value_name = "SCOPE", global = true)]
    pub default_scope: Option<String>,

    /// Toggle suspicious-parameter warnings in the log.
    #[arg(
        long = "diagnostics",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub diagnostics: Option<bool>,
}

#[derive(Debug, Args, Clone)]
pub struct KeyArgs {
    /// Component type name.
    #[arg(long = "type", value_name = "TYPE")]
    pub component_type: String,

    /// Unique id of the component instance.
    #[arg(long = "component", value_name = "ID")]
    pub component: String,

    /// Method name.
    #[arg(long = "method", value_name = "NAME")]
    pub method: String,

    /// Declared parameter type, in declaration order. Repeat per parameter.
    #[arg(long = "param-type", value_name = "TYPE")]
    pub parameter_types: Vec<String>,

    /// Argument value, in call order. Repeat per argument.
    #[arg(long = "arg", value_name = "VALUE", allow_hyphen_values = true)]
    pub arguments: Vec<String>,

    /// Ambient scope for this call, e.g. a tenant id.
    #[arg(long = "scope", value_name = "SCOPE")]
    pub scope: Option<String>,

    /// Print the report as JSON.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct RemoveKeyArgs {
    /// Component type name.
    #[arg(long = "type", value_name = "TYPE")]
    pub component_type: String,

    /// Unique id of the component instance.
    #[arg(long = "component", value_name = "ID")]
    pub component: Option<String>,

    /// Method name; requires --component.
    #[arg(long = "method", value_name = "NAME", requires = "component")]
    pub method: Option<String>,

    /// Declared parameter type; requires --method.
    #[arg(long = "param-type", value_name = "TYPE", requires = "method")]
    pub parameter_types: Vec<String>,

    /// Print the report as JSON.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

#[derive(Debug, Args, Clone)]
pub struct AncestorsArgs {
    /// The key to decompose.
    #[arg(value_name = "KEY")]
    pub key: String,

    /// Print the report as JSON.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub json: bool,
}

impl Command {
    pub fn json_output(&self) -> bool {
        match self {
            Command::Key(args) => args.json,
            Command::RemoveKey(args) => args.json,
            Command::Ancestors(args) => args.json,
        }
    }
}
