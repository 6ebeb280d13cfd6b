//! spdedup - duplicate file and duplicate content remover
//!
//! Entry point for the spdedup CLI application.

use clap::error::ErrorKind;
use clap::Parser;
use spdedup::{cli::Cli, error::ExitCode};

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                e.exit();
            }
            // Usage errors (including no arguments at all) exit with 1.
            let _ = e.print();
            std::process::exit(ExitCode::GeneralError.as_i32());
        }
    };

    match spdedup::run_app(cli) {
        Ok(code) => std::process::exit(code.as_i32()),
        Err(err) => {
            let exit_code = ExitCode::GeneralError;
            eprintln!("[{}] Error: {:#}", exit_code.code_prefix(), err);
            std::process::exit(exit_code.as_i32());
        }
    }
}
