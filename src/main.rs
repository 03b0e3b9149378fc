//! DejaText binary entry point.

use clap::Parser;

use dejatext::cli::Cli;
use dejatext::engine::EngineError;
use dejatext::error::{ExitCode, StructuredError};

fn main() {
    let cli = Cli::parse();
    let json_errors = cli.json_errors;

    match dejatext::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let code = if err.downcast_ref::<EngineError>().is_some() {
                ExitCode::Interrupted
            } else {
                ExitCode::GeneralError
            };
            if json_errors {
                let structured = StructuredError::new(&err, code);
                match serde_json::to_string(&structured) {
                    Ok(json) => eprintln!("{json}"),
                    Err(_) => eprintln!("{err:#}"),
                }
            } else {
                eprintln!("error: {err:#}");
            }
            std::process::exit(code.as_i32());
        }
    }
}
