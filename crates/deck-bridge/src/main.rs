use deck_bridge::cli::Cli;
use deck_bridge::deck;
use deck_bridge::engine::{Engine, EngineEvent};
use deck_bridge::feed::FeedManager;
use deck_proto::config::Config;
use deck_proto::protocol::{HostMessage, Registration};
use tokio::sync::mpsc;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // The host swallows stdout/stderr, so everything goes to a log file
    let data_dir = deck_proto::platform::data_dir();
    std::fs::create_dir_all(&data_dir)?;
    let log_path = data_dir.join("plugin.log");

    let log_file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)?;

    let log_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "info,deck_bridge=debug,hyper_util=warn,reqwest=warn".to_string());
    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_env_filter(log_filter.as_str())
        .with_ansi(false)
        .init();

    std::panic::set_hook(Box::new(|panic| {
        error!("panic: {}", panic);
    }));

    info!("tidal-deck starting, log file: {:?}", log_path);

    let cli = match Cli::parse_host_args(std::env::args()) {
        Ok(cli) => cli,
        Err(e) => {
            error!("invalid launch arguments: {}", e);
            e.exit();
        }
    };

    let config = Config::load().unwrap_or_else(|e| {
        warn!("config: {} unreadable, using defaults: {}", Config::config_path().display(), e);
        Config::default()
    });
    info!("Config loaded from: {:?}", Config::config_path());

    // All external inputs funnel into the engine
    let (event_tx, event_rx) = mpsc::channel::<EngineEvent>(256);
    // Outbound host messages, drained by the host writer task
    let (host_tx, host_rx) = mpsc::channel::<HostMessage>(256);

    let engine = Engine::new(&config, host_tx, event_tx.clone())?;

    let registration = Registration {
        event: cli.register_event,
        uuid: cli.plugin_uuid,
    };
    let _host = match deck::connect(cli.port, registration, host_rx, event_tx.clone()).await {
        Ok(handles) => handles,
        Err(e) => {
            error!("host: connection on port {} failed: {}", cli.port, e);
            return Err(e.into());
        }
    };

    // The feed is only useful once buttons can be updated
    let _feed = FeedManager::new(&config.feed.url, config.reconnect_delay(), event_tx).spawn();

    engine.run(event_rx).await;
    info!("tidal-deck exiting");
    Ok(())
}
