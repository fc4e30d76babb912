use std::process::ExitCode;
use subclean::{cli::start, error::exit_code};

#[tokio::main]
async fn main() -> ExitCode {
    match start::start().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(exit_code(&err))
        }
    }
}
