//! `tracing` subscriber setup.
//!
//! Logs always go to stderr; stdout carries command output only.

use anyhow::{anyhow, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "info";

/// Log line format on stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Terminal when stderr is a TTY, otherwise JSON lines.
    #[default]
    Auto,
    Terminal,
    Jsonl,
}

impl LogFormat {
    /// Resolve `Auto` against whether stderr is a terminal.
    pub fn resolve(self, stderr_is_tty: bool) -> LogFormat {
        match self {
            LogFormat::Auto if stderr_is_tty => LogFormat::Terminal,
            LogFormat::Auto => LogFormat::Jsonl,
            other => other,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct LogOptions {
    pub debug: bool,
    pub quiet: bool,
    pub format: LogFormat,
}

impl LogOptions {
    /// Level forced by the flags, if any. `--debug` wins over `--quiet`.
    pub fn forced_level(&self) -> Option<&'static str> {
        if self.debug {
            Some("debug")
        } else if self.quiet {
            Some("warn")
        } else {
            None
        }
    }

    fn env_filter(&self) -> EnvFilter {
        match self.forced_level() {
            Some(level) => EnvFilter::new(level),
            None => EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        }
    }
}

/// Install the global subscriber. Call once, before any command runs.
pub fn init_logging(options: LogOptions) -> Result<()> {
    let stderr_is_tty = atty::is(atty::Stream::Stderr);
    let format = options.format.resolve(stderr_is_tty);

    let layer = match format {
        LogFormat::Jsonl => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .boxed(),
        _ => tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(stderr_is_tty)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(options.env_filter())
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_follows_tty() {
        assert_eq!(LogFormat::Auto.resolve(true), LogFormat::Terminal);
        assert_eq!(LogFormat::Auto.resolve(false), LogFormat::Jsonl);
        assert_eq!(LogFormat::Jsonl.resolve(true), LogFormat::Jsonl);
        assert_eq!(LogFormat::Terminal.resolve(false), LogFormat::Terminal);
    }

    #[test]
    fn debug_beats_quiet() {
        let both = LogOptions {
            debug: true,
            quiet: true,
            ..LogOptions::default()
        };
        assert_eq!(both.forced_level(), Some("debug"));

        let quiet = LogOptions {
            quiet: true,
            ..LogOptions::default()
        };
        assert_eq!(quiet.forced_level(), Some("warn"));
        assert_eq!(LogOptions::default().forced_level(), None);
    }
}
