//! Application orchestrator.
//! Loads and merges config, initializes logging, installs the Ctrl-C handler,
//! validates the roots and runs the reconciliation.

use anyhow::Result;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, error, info};

use mirror_backup::cli::Args;
use mirror_backup::config::{self, config_path, create_template_config, load_config, run_stamp};
use mirror_backup::output as out;
use mirror_backup::{run_mirror, ConsoleReporter, MirrorError, ShutdownToken};

use crate::logging::init_tracing;

const SHORT_LICENSE: &str = "This program comes with ABSOLUTELY NO WARRANTY; for details run `mirror_backup --license`.\n\
This is free software, and you are welcome to redistribute it under certain conditions.";

const LONG_LICENSE: &str = "This program is free software: you can redistribute it and/or modify it
under the terms of the GNU General Public License as published by
the Free Software Foundation, either version 3 of the License, or
(at your option) any later version.

This program is distributed in the hope that it will be useful,
but WITHOUT ANY WARRANTY; without even the implied warranty of
MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
GNU General Public License for more details.

You should have received a copy of the GNU General Public License
along with this program.  If not, see <http://www.gnu.org/licenses/>.";

/// Exit status when the run finished but some operations failed.
const EXIT_PARTIAL_FAILURE: u8 = 10;

fn banner() -> String {
    format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"))
}

/// `1m 05.300s` style, or `4.250s` under a minute.
pub(crate) fn format_elapsed(secs: f64) -> String {
    if secs < 60.0 {
        return format!("{secs:.3}s");
    }
    let mins = (secs / 60.0).floor();
    let rest = secs - mins * 60.0;
    if mins < 60.0 {
        return format!("{}m {rest:06.3}s", mins as u64);
    }
    let hours = (mins / 60.0).floor();
    format!("{}h {}m {rest:06.3}s", hours as u64, (mins - hours * 60.0) as u64)
}

fn print_config_location() {
    match config_path() {
        Some(p) => {
            let state = if p.exists() { "exists" } else { "not created yet; run with --init-config" };
            out::print_info(&format!("Config file: {} ({state})", p.display()));
            if std::env::var_os(config::CONFIG_ENV).is_some() {
                out::print_info(&format!("Location set by {}.", config::CONFIG_ENV));
            }
        }
        None => out::print_error("Could not determine a config file location on this platform."),
    }
}

fn init_config() -> Result<()> {
    let path = config_path().ok_or_else(|| MirrorError::Config("no config directory on this platform".into()))?;
    if path.exists() {
        out::print_info(&format!("A config file already exists at {}", path.display()));
        return Ok(());
    }
    create_template_config(&path).map_err(|e| MirrorError::Config(format!("{e:#}")))?;
    out::print_success(&format!("Template config written to {}", path.display()));
    Ok(())
}

/// Run the CLI application. Errors carry a `MirrorError` when they map to a
/// specific exit code.
pub fn run(args: Args) -> Result<ExitCode> {
    if args.license {
        out::print_user(&banner());
        out::print_user(LONG_LICENSE);
        return Ok(ExitCode::SUCCESS);
    }
    if args.print_config {
        print_config_location();
        return Ok(ExitCode::SUCCESS);
    }
    if args.init_config {
        init_config()?;
        return Ok(ExitCode::SUCCESS);
    }

    let (mut cfg, cfg_file) = load_config()?;
    args.apply_overrides(&mut cfg);

    let guard = init_tracing(cfg.log_level, cfg.log_file.as_deref(), args.json)
        .map_err(|e| MirrorError::Logging(format!("{e:#}")))?;
    let guard_slot = Arc::new(Mutex::new(guard));

    let cancel = ShutdownToken::new();
    {
        let cancel = cancel.clone();
        let guard_slot = Arc::clone(&guard_slot);
        let installed = ctrlc::set_handler(move || {
            if cancel.is_requested() {
                // Second Ctrl-C: flush what we have and stop waiting for workers.
                if let Ok(mut g) = guard_slot.lock() {
                    let _ = g.take();
                }
                std::process::exit(130);
            }
            cancel.request();
            out::print_warn("Interrupt received; finishing the current file then stopping...");
        });
        if let Err(e) = installed {
            out::print_warn(&format!("Ctrl-C handler not installed: {e}"));
        }
    }

    debug!(?args, config_file = ?cfg_file, "starting");
    out::print_user(&banner());
    out::print_user(SHORT_LICENSE);
    out::print_user("");

    let started = Instant::now();
    let result = (|| -> Result<ExitCode> {
        let options = config::validate(&cfg, &run_stamp()).inspect_err(|e| {
            error!(code = e.code(), kind = e.kind(), error = %e, "invalid configuration");
        })?;
        let report = run_mirror(options, &ConsoleReporter, cancel.clone());

        out::print_user("");
        out::print_user(&format!("Completed {}", format_elapsed(started.elapsed().as_secs_f64())));
        info!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            failures = report.stats.failures,
            interrupted = report.interrupted,
            "finished"
        );

        if report.interrupted {
            return Err(MirrorError::Interrupted.into());
        }
        if report.stats.failures > 0 {
            out::print_warn(&format!("{} operation(s) failed; see the errors above.", report.stats.failures));
            return Ok(ExitCode::from(EXIT_PARTIAL_FAILURE));
        }
        Ok(ExitCode::SUCCESS)
    })();

    // Flush file logs before exit.
    if let Ok(mut g) = guard_slot.lock() {
        let _ = g.take();
    }
    result
}
