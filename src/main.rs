// src/main.rs

use std::time::Duration;

use quiz_service::{
    build_state,
    config::Config,
    db::{self, PoolSettings},
    routes,
    services::auth::seed_admin_user,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const CONNECT_RETRIES: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from environment (and .env, if present)
    let config = Config::from_env()?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::try_new(&config.rust_log).unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    let settings = PoolSettings {
        max_connections: config.db_max_connections,
        ..PoolSettings::default()
    };

    // Connect and migrate, with retry while the database comes up
    let mut retry_count = 0;
    let store = loop {
        match db::connect(&config.database_url, &settings).await {
            Ok(store) => break store,
            Err(e) => {
                retry_count += 1;
                if retry_count > CONNECT_RETRIES {
                    tracing::error!(
                        "Failed to connect to database after {} retries: {}",
                        CONNECT_RETRIES,
                        e
                    );
                    return Err(e.into());
                }
                tracing::warn!("Database not ready, retrying in 2s... (Attempt {})", retry_count);
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
        }
    };

    tracing::info!("Database connected and migrations applied.");

    if let Err(e) = seed_admin_user(store.as_ref(), &config).await {
        tracing::error!("Failed to seed admin user: {}", e);
    }

    let bind_addr = config.bind_addr;
    let state = build_state(config, store)?;
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
