//! calgrid - Calendar task layout with overlap and conflict analysis

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = calgrid::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
