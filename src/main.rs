use chirper_8m::{config::Config, errors::AppError, routes::create_router, startup::build_state};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn init_tracing(json_logs: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("chirper_8m=debug,tower_http=debug"));
    let registry = tracing_subscriber::registry().with(env_filter);

    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let config = Config::load()?;
    init_tracing(config.json_logs);
    tracing::info!(storage = ?config.storage, "Configuration loaded");

    let state = build_state(&config).await?;
    let app = create_router(state);

    tracing::info!("Server listening on http://{}", config.bind_address);
    let listener = tokio::net::TcpListener::bind(config.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
