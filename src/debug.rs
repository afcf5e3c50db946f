//! # Debugging and Logging Utilities
//!
//! Conditional logging for each compiler phase, gated by environment
//! variables or build profile, plus a small timer for measuring phase
//! durations. Nothing here is load-bearing: with no environment variables
//! set and a release build, every function in this module is a no-op.

use std::time::Instant;

/// Debug-level tracing is on if `NCC_DEBUG` is set, or in a debug build.
pub fn is_debug_enabled() -> bool {
    std::env::var("NCC_DEBUG").is_ok() || cfg!(debug_assertions)
}

/// Perf/verbose tracing is on only if `NCC_VERBOSE` is set explicitly.
pub fn is_perf_enabled() -> bool {
    std::env::var("NCC_VERBOSE").is_ok()
}

#[cfg(feature = "timestamps")]
fn timestamp() -> String {
    chrono::Local::now().format("%H:%M:%S%.3f").to_string()
}

#[cfg(feature = "timestamps")]
fn prefixed(line: &str) -> String {
    format!("[{}] {}", timestamp(), line)
}

#[cfg(not(feature = "timestamps"))]
fn prefixed(line: &str) -> String {
    line.to_string()
}

pub fn log_lexer(msg: &str) {
    if is_debug_enabled() {
        println!("{}", prefixed(&format!("LEXER: {}", msg)));
    }
}

pub fn log_parser(msg: &str) {
    if is_debug_enabled() {
        println!("{}", prefixed(&format!("PARSER: {}", msg)));
    }
}

pub fn log_codegen(msg: &str) {
    if is_debug_enabled() {
        println!("{}", prefixed(&format!("CODEGEN: {}", msg)));
    }
}

pub fn log_compiler(msg: &str) {
    if is_debug_enabled() {
        println!("{}", prefixed(&format!("COMPILER: {}", msg)));
    }
}

/// Times a single labeled operation; prints the elapsed duration on
/// `finish()` only when perf tracing is enabled.
pub struct PerfTimer {
    start: Instant,
    label: String,
}

impl PerfTimer {
    pub fn new(label: &str) -> Self {
        Self { start: Instant::now(), label: label.to_string() }
    }

    pub fn finish(self) {
        if is_perf_enabled() {
            let elapsed = self.start.elapsed();
            println!("{}", prefixed(&format!("{}: {:?}", self.label, elapsed)));
        }
    }
}
