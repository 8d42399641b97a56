use std::{net::SocketAddr, sync::Arc};

use {
    anyhow::Context,
    clap::Parser,
    tracing::{info, warn},
    tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt},
};

use {
    dropfarm_common::Readiness,
    dropfarm_discord::{DropListener, RestClient},
    dropfarm_drops::ReactionCoordinator,
    dropfarm_gateway::AppState,
    dropfarm_panels::{ActionOutbound, DropSink, PanelService, PanelStore},
};

#[derive(Parser)]
#[command(name = "dropfarm", about = "Multi-account Discord drop farm")]
struct Cli {
    /// Address to bind the control surface to (overrides env).
    #[arg(long)]
    bind: Option<String>,

    /// Port for the control surface (overrides env).
    #[arg(long)]
    port: Option<u16>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Output logs as JSON instead of human-readable.
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

fn init_telemetry(cli: &Cli) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if cli.json_logs {
        registry
            .with(fmt::layer().json().with_target(true).with_thread_ids(false))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_ansi(true),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_telemetry(&cli);

    info!(version = env!("CARGO_PKG_VERSION"), "dropfarm starting");

    let config = dropfarm_config::from_env()?;
    info!(
        accounts = config.accounts.len(),
        slot_count = config.rotation.slot_count,
        tick_secs = config.rotation.tick_interval().as_secs(),
        "configuration loaded"
    );

    let store: Arc<dyn PanelStore> = if config.store.is_remote() {
        let api_key = config
            .store
            .api_key
            .clone()
            .context("remote store selected without api key")?;
        let bin_id = config
            .store
            .bin_id
            .clone()
            .context("remote store selected without bin id")?;
        Arc::new(dropfarm_panels::store_remote::RemoteStore::new(
            api_key, bin_id,
        )?)
    } else {
        warn!("JSONBIN_API_KEY/JSONBIN_BIN_ID unset; panels will not survive restarts");
        Arc::new(dropfarm_panels::store_memory::MemoryStore::new())
    };

    let panels = PanelService::new(store, config.rotation.slot_count);
    panels.load().await;

    let outbound: Arc<dyn ActionOutbound> = Arc::new(RestClient::new()?);
    let coordinator = ReactionCoordinator::new(outbound.clone());
    let readiness = Readiness::new();

    let listener_token = config
        .listener_token()
        .context("no accounts configured; set TOKENS")?
        .to_string();
    let listener = Arc::new(DropListener::new(
        listener_token,
        config.listener.broadcaster_id,
        config.listener.drop_pattern.clone(),
        panels.clone(),
        Arc::clone(&coordinator) as Arc<dyn DropSink>,
        readiness.clone(),
    ));
    tokio::spawn(listener.run());

    let rotation = dropfarm_rotation::RotationService::new(
        panels.clone(),
        outbound.clone(),
        config.rotation.clone(),
        readiness.clone(),
    );
    rotation.start().await;

    let bind = cli.bind.unwrap_or(config.server.bind.clone());
    let port = cli.port.unwrap_or(config.server.port);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("invalid bind address {bind}:{port}"))?;

    let state = AppState {
        rotation: rotation.clone(),
        panels,
        outbound,
        accounts: Arc::new(config.accounts.clone()),
    };

    tokio::select! {
        result = dropfarm_gateway::serve(addr, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown signal received");
        },
    }

    rotation.stop().await;
    coordinator.shutdown().await;
    info!("dropfarm stopped");
    Ok(())
}
