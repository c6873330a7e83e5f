#![forbid(unsafe_code)]

use std::time::Instant;

/// Log level, ordered so `level >= threshold` gates a line. Hooks default to `Off`, since a
/// hook's stdout is a documented envelope and stderr noise would still be undesirable by
/// default; the operator CLI and the sandbox-driving REPL log at `Info` unconditionally.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Off,
    Error,
    Info,
    Debug,
}

impl Level {
    fn from_env_value(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "off" => Some(Level::Off),
            "error" => Some(Level::Error),
            "info" => Some(Level::Info),
            "debug" => Some(Level::Debug),
            _ => None,
        }
    }
}

/// A minimal structured logger writing `component operation key=value…` lines to stderr.
/// Mirrors the plain `eprintln!`-based diagnostics this codebase already uses for its
/// long-running operations, rather than pulling in a logging facade.
pub struct Logger {
    level: Level,
    component: &'static str,
}

impl Logger {
    /// `default_level` is the level used when `AGENTMEM_LOG` is unset; hook binaries pass
    /// `Level::Off`, the CLI and sandbox-driving paths pass `Level::Info`.
    pub fn new(component: &'static str, default_level: Level) -> Self {
        let level = std::env::var("AGENTMEM_LOG")
            .ok()
            .as_deref()
            .and_then(Level::from_env_value)
            .unwrap_or(default_level);
        Self { level, component }
    }

    pub fn info(&self, operation: &str, fields: &[(&str, &str)]) {
        self.log(Level::Info, operation, fields);
    }

    pub fn debug(&self, operation: &str, fields: &[(&str, &str)]) {
        self.log(Level::Debug, operation, fields);
    }

    pub fn error(&self, operation: &str, fields: &[(&str, &str)]) {
        self.log(Level::Error, operation, fields);
    }

    fn log(&self, level: Level, operation: &str, fields: &[(&str, &str)]) {
        if self.level < level || self.level == Level::Off {
            return;
        }
        let mut line = format!("{} {}", self.component, operation);
        for (key, value) in fields {
            line.push(' ');
            line.push_str(key);
            line.push('=');
            line.push_str(value);
        }
        eprintln!("{line}");
    }

    /// Logs `operation` with an `elapsed_ms` field computed from `start`, for index/REPL
    /// operations that report their own timing.
    pub fn info_timed(&self, operation: &str, start: Instant, fields: &[(&str, &str)]) {
        let elapsed = format!("{}", start.elapsed().as_millis());
        let mut all: Vec<(&str, &str)> = fields.to_vec();
        all.push(("elapsed_ms", &elapsed));
        self.info(operation, &all);
    }
}
