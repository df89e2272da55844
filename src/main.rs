use color_eyre::{eyre::eyre, Result};
use luftdaten2mqtt::config::BridgeConfig;
use luftdaten2mqtt::http::{self, AppState};
use luftdaten2mqtt::mqtt::{MqttConfig, MqttHandler, MsgManager};
use luftdaten2mqtt::translator::Translator;
use std::net::SocketAddr;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Uploads queued for the publisher before new ones are dropped
const INTENT_QUEUE: usize = 256;
const CONFIG_EXIT_CODE: i32 = 7;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let config = match BridgeConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(CONFIG_EXIT_CODE);
        }
    };
    setup_logging(config.level().unwrap_or(Level::INFO));
    info!(
        "Starting {} {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION")
    );

    let mqtt_handler = match MqttHandler::connect(&MqttConfig::from_bridge(&config)).await {
        Ok(handler) => handler,
        Err(e) => {
            error!("Could not connect to MQTT broker: {}", e);
            std::process::exit(e.exit_code());
        }
    };

    let token = CancellationToken::new();
    let MsgManager { outgoing, pending } = MsgManager::new(INTENT_QUEUE);
    let mqtt_tasks = mqtt_handler.spawn(pending, token.clone());

    let state = AppState::new(Translator::from_config(&config), outgoing);
    let app = http::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.http_port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|e| eyre!("Failed to bind {}: {}", addr, e))?;
    info!("Listening on http://{}", addr);

    tokio::spawn(shutdown_signal(token.clone()));

    let shutdown = token.clone();
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(async move { shutdown.cancelled().await })
    .await
    .map_err(|e| eyre!("HTTP server failed: {}", e))?;

    token.cancel();
    mqtt_tasks.join().await;
    info!("Bye");
    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    Ok(())
}

fn setup_logging(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .init();
}

async fn shutdown_signal(token: CancellationToken) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutting down");
            token.cancel();
        }
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
