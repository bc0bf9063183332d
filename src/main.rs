use std::{io, process};

use callkey::{
    application::{
        error::AppError,
        inspect::{KeyInspector, KeyReport, KeyRequest, RemoveKeyRequest},
    },
    cache::{KEY_SEPARATOR, KeyConfig, scope},
    config::{self, AncestorsArgs, Command, KeyArgs, RemoveKeyArgs},
    infra::telemetry,
};
use tracing::{Dispatch, Level, debug, dispatcher, error};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(1);
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_max_level(Level::ERROR)
        .with_writer(io::stderr)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let inspector = KeyInspector::new(&KeyConfig::from(&settings.keys));
    let json = cli_args.command.json_output();

    let report = match cli_args.command {
        Command::Key(args) => run_key(&inspector, args).await?,
        Command::RemoveKey(args) => run_remove_key(&inspector, args)?,
        Command::Ancestors(args) => run_ancestors(args),
    };

    let stdout = io::stdout();
    report.write_to(&mut stdout.lock(), json)
}

async fn run_key(inspector: &KeyInspector, args: KeyArgs) -> Result<KeyReport, AppError> {
    let KeyArgs {
        component_type,
        component,
        method,
        parameter_types,
        arguments,
        scope: call_scope,
        ..
    } = args;

    let request = KeyRequest {
        component_type,
        component,
        method,
        parameter_types,
        arguments,
    };

    match call_scope.filter(|value| !value.trim().is_empty()) {
        Some(call_scope) if call_scope.contains(KEY_SEPARATOR) => Err(AppError::validation(
            format!("scope `{call_scope}` must not contain the key separator `{KEY_SEPARATOR}`"),
        )),
        Some(call_scope) => {
            debug!(scope = %call_scope, "Building key inside ambient scope");
            scope::with_scope(call_scope, async { inspector.full_key(&request) }).await
        }
        None => inspector.full_key(&request),
    }
}

fn run_remove_key(inspector: &KeyInspector, args: RemoveKeyArgs) -> Result<KeyReport, AppError> {
    let RemoveKeyArgs {
        component_type,
        component,
        method,
        parameter_types,
        ..
    } = args;

    inspector.remove_key(&RemoveKeyRequest {
        component_type,
        component,
        method,
        parameter_types,
    })
}

fn run_ancestors(args: AncestorsArgs) -> KeyReport {
    KeyReport::for_existing_key(&args.key)
}
