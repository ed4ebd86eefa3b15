use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use remedia_billing::adapters::http::{webhook_routes, AppState};
use remedia_billing::adapters::notify::LogNotifier;
use remedia_billing::adapters::postgres::PgSubscriptionRepository;
use remedia_billing::adapters::stripe::StripeBillingClient;
use remedia_billing::config::AppConfig;
use remedia_billing::domain::webhook::{WebhookProcessor, WebhookVerifier};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    if config.server.is_production() {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    tracing::info!(
        environment = ?config.server.environment,
        test_mode = config.billing.is_test_mode(),
        "starting billing webhook service"
    );

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("database migrations applied");
    }

    let repository = Arc::new(PgSubscriptionRepository::new(pool));
    let provider = Arc::new(StripeBillingClient::new(&config.billing)?);
    let notifier = Arc::new(LogNotifier);

    let state = AppState {
        verifier: Arc::new(WebhookVerifier::new(config.billing.webhook_secret.clone())),
        processor: Arc::new(WebhookProcessor::new(repository, provider, notifier)),
    };

    let app = axum::Router::new()
        .nest("/webhooks", webhook_routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )));

    let addr = config.server.socket_addr()?;
    tracing::info!(%addr, "listening for webhook deliveries");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
