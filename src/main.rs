use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use deptdocs::auth::jwt::JwtService;
use deptdocs::config::AppConfig;
use deptdocs::db;
use deptdocs::routes;
use deptdocs::state::AppState;
use deptdocs::storage::LocalStorage;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    tracing::info!(
        component = "server",
        database_url = %config.redacted_database_url(),
        pool_size = config.database_max_pool_size,
        server_host = %config.server_host,
        server_port = config.server_port,
        storage_root = %config.storage_root.display(),
        current_academic_year = %config.current_academic_year,
        "loaded configuration"
    );

    let pool = db::init_pool_with_size(&config.database_url, config.database_max_pool_size)?;
    let storage = Arc::new(LocalStorage::new(config.storage_root.clone()));
    let jwt = JwtService::from_config(&config)?;

    let state = AppState::new(pool, config, storage, jwt);
    let listen_addr: SocketAddr = {
        let config = state.config.clone();
        format!("{}:{}", config.server_host, config.server_port).parse()?
    };
    let router = routes::create_router(state);

    let listener = TcpListener::bind(listen_addr).await?;
    tracing::info!("listening on {}", listen_addr);

    axum::serve(listener, router).await?;
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}
