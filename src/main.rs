use std::process::ExitCode;

use mirror_backup::output as out;
use mirror_backup::{cli, MirrorError};

mod app;
mod logging;

/// Exit status for failures that carry no specific code.
const EXIT_FAILURE: u8 = 10;

fn main() -> ExitCode {
    let args = cli::parse();
    match app::run(args) {
        Ok(code) => code,
        Err(e) => {
            out::print_error(&format!("{e:#}"));
            let Some(err) = e.downcast_ref::<MirrorError>() else {
                return ExitCode::from(EXIT_FAILURE);
            };
            if err.is_precondition() {
                out::print_info("Run with --help for usage.");
            }
            ExitCode::from(u8::try_from(err.code()).unwrap_or(EXIT_FAILURE))
        }
    }
}
