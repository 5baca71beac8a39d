use signin_identity::{InMemoryUserStore, OAuthBinder, UserStore};
use signin_server::{
    app,
    auth::{AppState, GoogleStrategy},
    config::ServerConfig,
    db::{self, PgUserStore},
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env()?;
    config.validate()?;
    let cookie_key = config.session.signing_key()?;
    tracing::info!(?config, "Loaded configuration");

    let store: Arc<dyn UserStore> = match &config.database_url {
        Some(database_url) => Arc::new(PgUserStore::new(db::connect(database_url).await?)),
        None => {
            tracing::warn!("SIGNIN__DATABASE_URL is not set; users are kept in memory");
            Arc::new(InMemoryUserStore::new())
        }
    };

    let binder = Arc::new(OAuthBinder::new(store));
    let google = GoogleStrategy::new(&config.google, config.redirect_url(), binder.clone())?;
    tracing::info!(redirect_url = google.redirect_url(), "Configured Google sign-in");

    let state = AppState::new(
        binder,
        Arc::new(google),
        config.session.clone(),
        config.google.callback_path.clone(),
        cookie_key,
    );
    let router = app::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
    }
    tracing::info!("shutting down");
}
