use clap::builder::TypedValueParser as _;
use clap::Parser;
use dotenvy::dotenv;
use log::LevelFilter;
use sse::connection::{SlowConsumerPolicy, DEFAULT_CAPACITY};
use std::time::Duration;

#[derive(Clone, Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// A list of full CORS origin URLs that allowed to receive server responses.
    #[arg(
        long,
        env,
        value_delimiter = ',',
        use_value_delimiter = true,
        default_value = "http://localhost:3000,https://localhost:3000"
    )]
    pub allowed_origins: Vec<String>,

    /// Sets the NATS server URL to receive change notifications from
    #[arg(long, env, default_value = "nats://127.0.0.1:4222")]
    nats_url: String,

    /// The host interface to listen for incoming connections
    #[arg(short, long, env, default_value = "127.0.0.1")]
    pub interface: Option<String>,

    /// The host TCP port to listen for incoming connections
    #[arg(short, long, env, default_value_t = 4000)]
    pub port: u16,

    /// Seconds of silence after which a keep-alive comment is sent on a stream
    #[arg(long, env, default_value_t = 25, value_parser = clap::value_parser!(u64).range(1..))]
    pub keep_alive_secs: u64,

    /// Number of messages buffered per subscriber before the slow consumer policy applies
    #[arg(long, env, default_value_t = DEFAULT_CAPACITY, value_parser = clap::value_parser!(usize))]
    pub subscriber_buffer: usize,

    /// What to do with a subscriber whose buffer is full: disconnect it or drop the message
    #[arg(
        long,
        env,
        default_value_t = SlowConsumerPolicy::Disconnect,
        value_parser = clap::builder::PossibleValuesParser::new(["disconnect", "drop"])
            .try_map(|s| s.parse::<SlowConsumerPolicy>()),
    )]
    pub slow_consumer_policy: SlowConsumerPolicy,

    /// Set the log level verbosity threshold (level) to control what gets displayed on console output
    #[arg(
        short,
        long,
        env,
        default_value_t = LevelFilter::Info,
        value_parser = clap::builder::PossibleValuesParser::new(["OFF", "ERROR", "WARN", "INFO", "DEBUG", "TRACE"])
            .try_map(|s| s.parse::<LevelFilter>()),
        )]
    pub log_level_filter: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        // Load .env file first
        dotenv().ok();
        // Then parse the command line parameters and flags
        Config::parse()
    }

    pub fn set_nats_url(mut self, nats_url: String) -> Self {
        self.nats_url = nats_url;
        self
    }

    pub fn nats_url(&self) -> &str {
        &self.nats_url
    }

    pub fn keep_alive(&self) -> Duration {
        Duration::from_secs(self.keep_alive_secs)
    }

    /// The `interface:port` pair to bind the HTTP listener to.
    pub fn listen_address(&self) -> String {
        format!(
            "{}:{}",
            self.interface.as_deref().unwrap_or("127.0.0.1"),
            self.port
        )
    }
}
