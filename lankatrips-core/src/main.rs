use axum::{extract::State, http::Method, response::Json, routing::get, Router};
use dotenv::dotenv;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use lankatrips_core::config::Config;
use lankatrips_core::{db, handlers, AppState};

/// Health check endpoint.
///
/// Returns a simple JSON response indicating the server is running.
/// Useful for monitoring and load balancer health checks.
async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "success": true,
        "data": { "status": "ok", "version": env!("CARGO_PKG_VERSION") },
        "message": "API is healthy"
    }))
}

/// Database health check endpoint.
///
/// Verifies that the database connection is working by executing
/// a simple query.
async fn db_health_check(
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, axum::http::StatusCode> {
    sqlx::query("SELECT 1")
        .execute(&state.db)
        .await
        .map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            axum::http::StatusCode::SERVICE_UNAVAILABLE
        })?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": { "database": "connected" },
        "message": "Database is healthy"
    })))
}

/// Creates the main application router.
///
/// Mounts the public catalog routes, the authenticated booking/receipt
/// routes and the admin surface under `/api`, with CORS and request
/// tracing layered on top.
fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/health/db", get(db_health_check))
        .nest("/api/auth", handlers::auth::routes(state.clone()))
        .nest("/api/locations", handlers::locations::routes(state.clone()))
        .nest("/api/packages", handlers::packages::routes(state.clone()))
        .nest("/api/bookings", handlers::bookings::routes(state.clone()))
        .nest("/api/receipts", handlers::receipts::routes(state.clone()))
        .nest("/api/admin", handlers::admin::routes(state.clone()))
        .nest("/api/payments", handlers::payments::routes(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv().ok();

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("lankatrips_core=info,tower_http=info"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(filter)
        .init();

    info!("Starting LankaTrips API...");

    let config = Config::from_env()?;

    // Initialize database connection pool
    let pool = db::create_pool(&config.database_url).await?;
    db::run_migrations(&pool).await?;

    let addr = format!("{}:{}", config.host, config.port);

    // Create application state
    let app_state = AppState {
        db: pool,
        config: Arc::new(config),
    };

    let app = create_router(app_state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
