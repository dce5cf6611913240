use std::{fs::OpenOptions, sync::Arc, sync::Mutex};

use anyhow::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod models;
mod repositories;
mod routes;
mod state;

use auth::{AuthState, CookieSettings, JwtConfig, JwtService, TokenRepository, UserRepository};
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use tokio::net::TcpListener;

use crate::{config::ServerConfig, repositories::ShopRepository, state::AppState};

/// Install the global subscriber, writing to `log_path` when one is configured
fn init_tracing(log_path: Option<&str>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    match log_path {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            builder
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .try_init()
                .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {}", e))?;
        }
        None => {
            builder
                .try_init()
                .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {}", e))?;
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let server_config = ServerConfig::load()?;
    init_tracing(server_config.log_path.as_deref())?;

    info!("Starting marketplace API");

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    // Check database connectivity
    if health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?)?;

    let auth_state = AuthState::new(
        Arc::new(UserRepository::new(pool.clone())),
        Arc::new(TokenRepository::new(pool.clone())),
        jwt_service,
        CookieSettings::from_env(),
    );

    if let Err(e) = auth_state.tokens.purge_expired().await {
        warn!("Failed to purge expired tokens: {}", e);
    }

    let app_state = AppState {
        auth: auth_state,
        shops: Arc::new(ShopRepository::new(pool)),
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let address = server_config.bind_address();
    let listener = TcpListener::bind(&address).await?;
    info!("Marketplace API listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
