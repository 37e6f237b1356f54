use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Consulted when `--log-level` is not given.
pub const LOG_LEVEL_ENV: &str = "WM_DEBUG_LEVEL";

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Pick the filter directive: command line, then environment, then `info`.
///
/// Environment values may use the level names of other logging systems
/// (`WARNING`, `CRITICAL`); those are mapped onto tracing levels.
pub fn filter_directive(level: Option<LogLevel>, env: Option<&str>) -> String {
    if let Some(level) = level {
        return level.as_str().to_string();
    }
    match env.map(str::trim).filter(|value| !value.is_empty()) {
        Some(value) => match value.to_ascii_lowercase().as_str() {
            "warning" => "warn".to_string(),
            "critical" | "fatal" => "error".to_string(),
            other => other.to_string(),
        },
        None => "info".to_string(),
    }
}

/// Install the stderr subscriber. Stdout is reserved for command output.
pub fn init_logging(level: Option<LogLevel>) {
    let env = std::env::var(LOG_LEVEL_ENV).ok();
    let directive = filter_directive(level, env.as_deref());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}
