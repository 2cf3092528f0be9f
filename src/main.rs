//! Bookshelf backend entry point.
//!
//! Bootstraps configuration, logging, the database pool, the Stripe
//! adapter, and the axum server.

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderValue;
use axum::routing::get;
use axum::{middleware, Json, Router};
use sqlx::postgres::PgPoolOptions;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use bookshelf_backend::adapters::http::billing::{billing_routes, BillingAppState};
use bookshelf_backend::adapters::http::middleware::{auth_middleware, JwtAuth};
use bookshelf_backend::adapters::postgres::{
    PostgresSubscriptionRepository, PostgresUserRepository,
};
use bookshelf_backend::adapters::stripe::{StripeConfig, StripePaymentAdapter};
use bookshelf_backend::application::handlers::billing::CheckoutConfig;
use bookshelf_backend::config::AppConfig;
use bookshelf_backend::domain::billing::WebhookVerifier;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load()?;
    config.validate()?;

    init_tracing(&config);

    if config.billing.is_test_mode() {
        tracing::warn!("Stripe is in test mode");
    }

    let pool = PgPoolOptions::new()
        .min_connections(config.database.min_connections)
        .max_connections(config.database.max_connections)
        .acquire_timeout(config.database.acquire_timeout())
        .connect(&config.database.url)
        .await?;

    if config.database.run_migrations {
        tracing::info!("Running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    let state = BillingAppState {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        subscriptions: Arc::new(PostgresSubscriptionRepository::new(pool)),
        payment_provider: Arc::new(StripePaymentAdapter::new(StripeConfig::new(
            config.billing.stripe_api_key.clone(),
        ))),
        webhook_verifier: Arc::new(WebhookVerifier::new(
            config.billing.stripe_webhook_secret.clone(),
        )),
        checkout: CheckoutConfig {
            price_id: config.billing.stripe_price_id.clone(),
            success_url: config.billing.success_url(),
            cancel_url: config.billing.cancel_url(),
        },
    };

    let auth = Arc::new(JwtAuth::new(&config.auth.jwt_secret));

    let app = Router::new()
        .route("/up", get(health))
        .nest("/api/v1", billing_routes())
        .with_state(state)
        .layer(middleware::from_fn_with_state(auth, auth_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(cors_layer(&config));

    let addr = config.server.socket_addr();
    tracing::info!(%addr, "Bookshelf backend listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.server.log_level.clone()));

    if config.is_production() {
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
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .server
        .cors_origins_list()
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
