use swapbroker::{
    api::{self, AppState},
    AppConfig, Database, EnrichmentClient, IdentityVerifier, ItemRegistry, SwapLedger, SwapPolicy,
};
use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "server")]
#[command(about = "Swap brokering service with a points-based reward ledger")]
struct Args {
    /// Path to a TOML configuration file; defaults apply when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the configured listen port.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => AppConfig::load_with_env_overrides(path)?,
        None => AppConfig::default(),
    };
    if let Some(port) = args.port {
        config.server.port = port;
    }
    config.validate()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.logging.level.clone())),
        )
        .init();

    let database = Database::new(&config.database.url).await?;

    let enrichment = EnrichmentClient::new(
        config.enrichment.endpoint.clone(),
        config.enrichment.timeout_seconds.unwrap_or(5),
    )?;
    let policy = SwapPolicy {
        default_points: config.swap.default_points,
        mark_item_swapped: config.swap.mark_item_swapped,
    };

    let state = AppState {
        ledger: SwapLedger::new(database.clone(), policy),
        registry: ItemRegistry::new(database.clone(), enrichment),
        db: database,
        verifier: IdentityVerifier::new(config.auth.jwt_secret.clone()),
    };

    let app = api::router(state);

    let address = config.get_server_address();
    let listener = TcpListener::bind(&address).await?;
    tracing::info!("Swap broker listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
