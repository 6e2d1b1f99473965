//! Logging façade.
//!
//! Every event goes to two sinks: an append-only log file that records DEBUG
//! and above, and the console, which records the configured level (INFO by
//! default, `RUST_LOG` wins when set). Both share one line format: local
//! timestamp, logger name (the tracing target), level, message.

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing::Subscriber;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::fmt::{self, time::ChronoLocal, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::LoggingConfig;

/// Target used by every [`BotLogger`] event.
pub const LOGGER_NAME: &str = "KalshiTradingBot";

const CRATE_TARGET: &str = "kalshi_bot";
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Accepts tracing level names plus the `WARNING`/`CRITICAL` spellings found
/// in older bot configs.
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    match level.trim().to_ascii_lowercase().as_str() {
        "warning" => Ok(LevelFilter::WARN),
        "critical" | "fatal" => Ok(LevelFilter::ERROR),
        other => other
            .parse()
            .with_context(|| format!("Unknown log level: {}", level)),
    }
}

pub fn open_log_file<P: AsRef<Path>>(path: P) -> Result<File> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create log directory {}", parent.display()))?;
    }

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

fn console_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = level.to_string().to_ascii_lowercase();
        EnvFilter::new(format!(
            "warn,{}={},{}={}",
            CRATE_TARGET, level, LOGGER_NAME, level
        ))
    })
}

fn file_filter() -> Targets {
    Targets::new()
        .with_default(LevelFilter::INFO)
        .with_target(CRATE_TARGET, LevelFilter::DEBUG)
        .with_target(LOGGER_NAME, LevelFilter::DEBUG)
}

/// Builds the two-sink subscriber over arbitrary writers.
pub fn build_subscriber<F, C>(
    file_writer: F,
    console_writer: C,
    console_filter: EnvFilter,
) -> impl Subscriber + Send + Sync
where
    F: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    C: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let file_layer = fmt::layer()
        .with_writer(file_writer)
        .with_ansi(false)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_filter(file_filter());

    let console_layer = fmt::layer()
        .with_writer(console_writer)
        .with_timer(ChronoLocal::new(TIMESTAMP_FORMAT.to_string()))
        .with_filter(console_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(console_layer)
}

/// Installs the process-wide subscriber. The log file stays open for the
/// lifetime of the process.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let level = parse_level(&config.level)?;
    let file = open_log_file(&config.file_path)?;

    build_subscriber(Mutex::new(file), std::io::stderr, console_filter(level))
        .try_init()
        .context("Failed to install log subscriber")
}

/// Named event sink used by the binary for bot-level events.
#[derive(Debug, Clone, Copy, Default)]
pub struct BotLogger;

impl BotLogger {
    /// Wires both sinks from `config` and returns the façade.
    pub fn init(config: &LoggingConfig) -> Result<Self> {
        init(config)?;
        Ok(Self)
    }

    /// Façade over whatever subscriber is already installed.
    pub fn new() -> Self {
        Self
    }

    pub fn debug(&self, message: &str) {
        tracing::debug!(target: LOGGER_NAME, "{}", message);
    }

    pub fn info(&self, message: &str) {
        tracing::info!(target: LOGGER_NAME, "{}", message);
    }

    pub fn warning(&self, message: &str) {
        tracing::warn!(target: LOGGER_NAME, "{}", message);
    }

    pub fn error(&self, message: &str) {
        tracing::error!(target: LOGGER_NAME, "{}", message);
    }

    // tracing tops out at ERROR
    pub fn critical(&self, message: &str) {
        tracing::error!(target: LOGGER_NAME, severity = "CRITICAL", "{}", message);
    }

    pub fn log_trade(&self, trade_info: impl std::fmt::Display) {
        tracing::info!(target: LOGGER_NAME, "Trade executed: {}", trade_info);
    }

    pub fn log_error(&self, error_info: impl std::fmt::Display) {
        tracing::error!(target: LOGGER_NAME, "Error occurred: {}", error_info);
    }
}


#[cfg(test)]
mod tests {
    use super::capture::SharedBuffer;
    use super::*;

    fn with_sinks(f: impl FnOnce(BotLogger)) -> (SharedBuffer, SharedBuffer) {
        let file = SharedBuffer::default();
        let console = SharedBuffer::default();
        let subscriber = build_subscriber(
            file.clone(),
            console.clone(),
            EnvFilter::new(format!("{}=info", LOGGER_NAME)),
        );

        tracing::subscriber::with_default(subscriber, || f(BotLogger::new()));
        (file, console)
    }

    #[test]
    fn test_info_reaches_both_sinks() {
        let (file, console) = with_sinks(|logger| logger.info("market scan finished"));

        assert_eq!(file.lines_containing("market scan finished"), 1);
        assert_eq!(console.lines_containing("market scan finished"), 1);
    }

    #[test]
    fn test_debug_reaches_only_file_sink() {
        let (file, console) = with_sinks(|logger| logger.debug("raw payload dump"));

        assert_eq!(file.lines_containing("raw payload dump"), 1);
        assert_eq!(console.lines_containing("raw payload dump"), 0);
    }

    #[test]
    fn test_line_format_has_name_and_level() {
        let (file, _) = with_sinks(|logger| logger.warning("spread widened"));

        let line = file.contents();
        assert!(line.contains(LOGGER_NAME));
        assert!(line.contains("WARN"));
        assert!(line.contains("spread widened"));
        assert!(!line.contains('\u{1b}'), "file sink must not contain ANSI codes");
    }

    #[test]
    fn test_log_trade_is_single_info_line() {
        let (file, _) = with_sinks(|logger| logger.log_trade("bought 10 YES on MKT1"));

        let lines: Vec<_> = file.contents().lines().map(str::to_owned).collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("INFO"));
        assert!(lines[0].contains("Trade executed: bought 10 YES on MKT1"));
    }

    #[test]
    fn test_log_error_is_single_error_line() {
        let (file, console) = with_sinks(|logger| logger.log_error("balance unavailable"));

        let lines: Vec<_> = file.contents().lines().map(str::to_owned).collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].contains("ERROR"));
        assert!(lines[0].contains("Error occurred: balance unavailable"));
        assert_eq!(console.lines_containing("Error occurred: balance unavailable"), 1);
    }

    #[test]
    fn test_critical_is_tagged() {
        let (file, _) = with_sinks(|logger| logger.critical("api key rejected"));

        let contents = file.contents();
        assert!(contents.contains("ERROR"));
        assert!(contents.contains("CRITICAL"));
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("INFO").unwrap(), LevelFilter::INFO);
        assert_eq!(parse_level("debug").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("WARNING").unwrap(), LevelFilter::WARN);
        assert_eq!(parse_level("CRITICAL").unwrap(), LevelFilter::ERROR);
        assert!(parse_level("loud").is_err());
    }

    #[test]
    fn test_open_log_file_appends() {
        let path = std::env::temp_dir()
            .join(format!("kalshi_bot_logs_{}", std::process::id()))
            .join("bot.log");

        {
            use std::io::Write;
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "first").unwrap();
            let mut file = open_log_file(&path).unwrap();
            writeln!(file, "second").unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_dir_all(path.parent().unwrap()).ok();
        assert_eq!(contents, "first\nsecond\n");
    }
}
