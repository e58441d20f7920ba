use crate::config::Config;
use log::{LevelFilter, SetLoggerError};
use simplelog::{ColorChoice, ConfigBuilder, TermLogger, TerminalMode};

/// Module prefixes of the bus and HTTP stack. Their records are only shown at Trace.
const DEPENDENCY_MODULES: &[&str] = &["async_nats", "rustls", "tokio", "mio", "hyper", "tower", "axum"];

pub struct Logger {}

impl Logger {
    /// Installs a terminal logger at the configured level with RFC3339 timestamps.
    pub fn init_logger(config: &Config) -> Result<(), SetLoggerError> {
        let level = config.log_level_filter;

        TermLogger::init(
            level,
            Self::log_config(level),
            TerminalMode::Mixed,
            ColorChoice::Auto,
        )
    }

    fn log_config(level: LevelFilter) -> simplelog::Config {
        let mut builder = ConfigBuilder::new();
        builder.set_time_format_rfc3339();
        for module in Self::ignored_modules(level) {
            builder.add_filter_ignore_str(module);
        }
        builder.build()
    }

    fn ignored_modules(level: LevelFilter) -> &'static [&'static str] {
        if level == LevelFilter::Trace {
            &[]
        } else {
            DEPENDENCY_MODULES
        }
    }
}
