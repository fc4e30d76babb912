use super::{commands, dispatch, telemetry};
use crate::error::CleanupError;
use anyhow::Result;
use clap::{ArgMatches, error::ErrorKind};

/// Main orchestrator - Pure orchestration with no business logic
///
/// Five-step data flow:
/// 1. Parse: Extract CLI arguments
/// 2. Extract Verbosity: `--debug` selects the default log level
/// 3. Initialize Telemetry: Set up structured logging/tracing
/// 4. Dispatch: Convert `ArgMatches` into typed Action enum
/// 5. Execute: Run the action's business logic
///
/// # Errors
///
/// Returns an error if any step in the flow fails
pub async fn start() -> Result<()> {
    // 1. Parse: Extract CLI arguments
    let Some(matches) = parse()? else {
        return Ok(());
    };

    // 2. Extract Verbosity
    let debug = matches.get_flag("debug");

    // 3. Initialize Telemetry
    telemetry::init(debug)?;

    // 4. Dispatch: Convert ArgMatches into typed Action enum
    let action = dispatch::dispatch(&matches)?;

    // 5. Execute: Run the action's business logic
    action.execute().await?;

    Ok(())
}

/// `None` when clap already answered (`--help`, `--version`)
///
/// Usage errors are configuration errors, they exit with 1 instead of clap's 2.
fn parse() -> Result<Option<ArgMatches>> {
    match commands::new().try_get_matches() {
        Ok(matches) => Ok(Some(matches)),
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.print()?;
            Ok(None)
        }
        Err(err) => Err(CleanupError::Config(err.to_string().trim_end().to_string()).into()),
    }
}
