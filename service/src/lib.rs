use config::Config;
use log::info;
use sse::Manager;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub mod config;
pub mod logging;

/// Builds the subscriber manager with the buffer size and slow consumer policy
/// from `config`.
pub fn init_sse_manager(config: &Config) -> Arc<Manager> {
    info!(
        "Subscriber config: buffer={}, slow_consumer_policy={}, keep_alive={}s",
        config.subscriber_buffer, config.slow_consumer_policy, config.keep_alive_secs,
    );

    Arc::new(Manager::with_options(
        config.subscriber_buffer,
        config.slow_consumer_policy,
    ))
}

// Service-level state shared by the bus wiring and every stream session.
// Needs to implement Clone to be able to be passed into Router as State
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub sse_manager: Arc<Manager>,
    /// Cancelled once on shutdown; ends every open stream and the bus consumers.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub fn new(app_config: Config, sse_manager: &Arc<Manager>) -> Self {
        Self {
            config: app_config,
            sse_manager: Arc::clone(sse_manager),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn with_shutdown(mut self, shutdown: CancellationToken) -> Self {
        self.shutdown = shutdown;
        self
    }
}
