//! Bentley - console logging for the docent workspace
//!
//! Every line goes to stderr with a short coloured level tag, so stdout stays
//! free for the answers a user actually asked for.
//!
//! Use the macros (`bentley::info!("loaded {n} chunks")`) rather than the
//! functions; they accept `format!` arguments directly.

use colored::*;
use std::sync::atomic::{AtomicBool, Ordering};

#[cfg(feature = "daemon-logs")]
pub mod daemon_logs;

static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Environment variable that switches verbose output on without a flag
pub const VERBOSE_ENV: &str = "DOCENT_VERBOSE";

/// Turn verbose output on or off for the rest of the process
pub fn set_verbose(enabled: bool) {
  VERBOSE.store(enabled, Ordering::Relaxed);
}

/// Whether `verbose!` lines are printed
pub fn verbose_enabled() -> bool {
  if VERBOSE.load(Ordering::Relaxed) {
    return true;
  }

  std::env::var(VERBOSE_ENV).map(|v| v == "1" || v.eq_ignore_ascii_case("true")).unwrap_or(false)
}

/// Write every line of `message` to stderr
pub fn log(message: &str) {
  for line in message.lines() {
    eprintln!("{line}");
  }
}

fn tagged(tag: ColoredString, message: &str) {
  let width = 7usize.saturating_sub(tag.chars().count() + 2);
  for line in message.lines() {
    log(&format!("[{tag}]{:width$} {line}", ""));
  }
}

/// A row of `length` copies of `fill`
pub fn banner_line(length: usize, fill: char) -> String {
  fill.to_string().repeat(length)
}

/// Print `message` framed above and below by a banner line
pub fn as_banner<F>(log_fn: F, message: &str, width: usize, fill: char)
where
  F: Fn(&str),
{
  let banner = banner_line(width, fill);

  log_fn(&banner);
  log_fn(message);
  log_fn(&banner);
}

pub fn verbose(message: &str) {
  if verbose_enabled() {
    tagged("verb".cyan().bold(), message);
  }
}

pub fn info(message: &str) {
  tagged("info".blue().bold(), message);
}

pub fn warn(message: &str) {
  tagged("warn".yellow().bold(), message);
}

pub fn error(message: &str) {
  tagged("error".red().bold(), message);
}

pub fn success(message: &str) {
  tagged("sccs".green().bold(), message);
}

/// Blue banner for start-of-run announcements
pub fn announce(message: &str) {
  as_banner(|msg| log(&msg.blue().bold().to_string()), message, 50, '=');
}

#[macro_export]
macro_rules! info {
  ($($arg:tt)*) => {
    $crate::info(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! warn {
  ($($arg:tt)*) => {
    $crate::warn(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! error {
  ($($arg:tt)*) => {
    $crate::error(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! verbose {
  ($($arg:tt)*) => {
    $crate::verbose(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! success {
  ($($arg:tt)*) => {
    $crate::success(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}

#[macro_export]
macro_rules! announce {
  ($($arg:tt)*) => {
    $crate::announce(&format!($($arg)*)) // LCOV_EXCL_LINE
  };
}
