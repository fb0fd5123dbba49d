use axum::http::HeaderValue;
use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod constants;
mod error;
mod models;
mod services;
mod store;

use config::Config;
use store::{KeyLocks, MemoryStorage, RedisStorage, Storage};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "frostrun_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    config.validate()?;

    tracing::info!("Starting Frostrun sync server");
    tracing::info!("Environment: {}", config.environment);

    // Select the storage backend
    let store: Arc<dyn Storage> = match &config.redis_url {
        Some(url) => {
            let storage = RedisStorage::connect(url).await?;
            tracing::info!("Connected to Redis KV store");
            Arc::new(storage)
        }
        None => {
            tracing::warn!("No REDIS_URL configured; state will not survive a restart");
            Arc::new(MemoryStorage::new())
        }
    };

    let app_state = api::AppState {
        store,
        locks: KeyLocks::new(),
        config: config.clone(),
    };

    // Build router
    let app = build_router(app_state);

    // Start server
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {e}"))?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn build_router(state: api::AppState) -> Router {
    // CORS configuration
    let cors = cors_from_config(&state.config);

    Router::new()
        // Health + reset token
        .route("/status", get(api::health::status))
        // Profiles
        .route("/user/sync", post(api::profile::sync_user))
        .route("/user/{id}", get(api::profile::get_user))
        // Scores & leaderboards
        .route("/score/submit", post(api::score::submit_score))
        .route("/leaderboard/me", get(api::leaderboard::my_rank))
        .route("/leaderboard/{scope}", get(api::leaderboard::get_leaderboard))
        // Social graph
        .route(
            "/friends",
            get(api::social::list_friends).delete(api::social::remove_friend),
        )
        .route("/friends/request", post(api::social::request_friend))
        .route("/friends/respond", post(api::social::respond_request))
        // Challenges
        .route("/challenges", post(api::challenges::create))
        .route(
            "/challenges/user/{user_id}",
            get(api::challenges::list_for_user),
        )
        .route("/challenges/{id}/update", post(api::challenges::update))
        // Rewards
        .route("/rewards/pending", get(api::rewards::pending))
        .route("/rewards/claim", post(api::rewards::claim))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

fn cors_from_config(config: &Config) -> CorsLayer {
    let raw = config.cors_allowed_origins.trim();
    if raw.is_empty() || raw == "*" {
        return CorsLayer::very_permissive();
    }

    let allowed: Vec<HeaderValue> = raw
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .filter_map(|s| s.parse::<HeaderValue>().ok())
        .collect();

    if allowed.is_empty() {
        tracing::warn!("No valid CORS origins parsed; falling back to permissive");
        return CorsLayer::very_permissive();
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods(Any)
        .allow_headers(Any)
}
