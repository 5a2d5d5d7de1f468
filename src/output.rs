//! User-facing console lines.
//! Progress and results go to stdout, warnings and errors to stderr. Prefixes
//! are colored only when the stream they go to is a terminal.

use owo_colors::OwoColorize;
use std::fmt::Display;

fn stdout_tty() -> bool {
    atty::is(atty::Stream::Stdout)
}

fn stderr_tty() -> bool {
    atty::is(atty::Stream::Stderr)
}

fn prefixed<P: Display>(colored: P, plain: &str, tty: bool, msg: &str) -> String {
    if tty { format!("{colored} {msg}") } else { format!("{plain} {msg}") }
}

pub fn print_info(msg: &str) {
    println!("{}", prefixed("info:".cyan().bold(), "info:", stdout_tty(), msg));
}

pub fn print_success(msg: &str) {
    println!("{}", prefixed("ok:".green().bold(), "ok:", stdout_tty(), msg));
}

pub fn print_warn(msg: &str) {
    eprintln!("{}", prefixed("warn:".yellow().bold(), "warn:", stderr_tty(), msg));
}

/// Error lines are colored whole, not just prefixed.
pub fn print_error(msg: &str) {
    if stderr_tty() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{msg}");
    }
}

/// A plain line with no prefix. Progress lines that scripts may parse use this.
pub fn print_user(msg: &str) {
    println!("{msg}");
}
