//! carelog-be - Care facility daily-record backend

use anyhow::Result;
use clap::Parser;
use tracing::info;

use carelog_be::{build_router, AppState};
use carelog_common::{db::init_database, Config};

#[derive(Parser, Debug)]
#[command(name = "carelog-be", about = "Care facility daily-record backend")]
struct Args {
    /// Data folder holding the database (overrides config and CARELOG_DATA)
    #[arg(long)]
    data_folder: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    info!("Starting carelog backend v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();
    let config = Config::load(args.data_folder.as_deref())?;
    config.ensure_data_folder()?;

    let db_path = config.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path).await?;

    let bind_addr = config.bind_addr.clone();
    let state = AppState::new(pool, config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("carelog-be listening on http://{}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
