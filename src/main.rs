use bus::BusAdapter;
use events::EventDispatcher;
use log::*;
use service::{config::Config, logging::Logger, AppState};
use sse::TopicRouter;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() {
    let config = Config::new();
    if let Err(e) = Logger::init_logger(&config) {
        eprintln!("Failed to initialize logger: {e}");
    }

    info!(
        "Starting up chat relay {}, listening on {}",
        clap::crate_version!(),
        config.listen_address()
    );

    let sse_manager = service::init_sse_manager(&config);
    let shutdown = CancellationToken::new();

    let client = match bus::connect(config.nats_url()).await {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to connect to the message bus: {e}");
            std::process::exit(1);
        }
    };

    let dispatcher =
        EventDispatcher::new().with_handler(Arc::new(TopicRouter::new(Arc::clone(&sse_manager))));
    let consumers = match BusAdapter::new(client)
        .start(dispatcher, shutdown.clone())
        .await
    {
        Ok(consumers) => consumers,
        Err(e) => {
            error!("Failed to subscribe to the message bus: {e}");
            std::process::exit(1);
        }
    };

    let app_state = AppState::new(config, &sse_manager).with_shutdown(shutdown.clone());

    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("Received Ctrl-C, shutting down");
                    shutdown.cancel();
                }
                Err(e) => error!("Failed to listen for Ctrl-C: {e}"),
            }
        }
    });

    if let Err(e) = web::init_server(app_state).await {
        error!("Server error: {e}");
        shutdown.cancel();
    }

    for consumer in consumers {
        if let Err(e) = consumer.await {
            warn!("Bus consumer ended abnormally: {e}");
        }
    }
    info!("Shutdown complete");
}
