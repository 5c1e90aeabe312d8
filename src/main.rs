use std::sync::{Arc, Mutex};

use axum::routing::{delete, get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use lessonbook::config::AppConfig;
use lessonbook::db::{self, SqliteBookingRepository, SqliteProviderRepository};
use lessonbook::handlers;
use lessonbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = Arc::new(Mutex::new(db::init_db(&config.database_url)?));

    let state = Arc::new(AppState {
        providers: Box::new(SqliteProviderRepository::new(Arc::clone(&conn))),
        bookings: Box::new(SqliteBookingRepository::new(conn)),
        config: config.clone(),
    });

    let app = router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/schedule", get(handlers::schedule::get_schedule))
        .route("/api/schedule/validate", post(handlers::schedule::validate))
        .route("/api/checkout", post(handlers::checkout::checkout))
        .route("/api/admin/providers", get(handlers::admin::list_providers))
        .route("/api/admin/providers", post(handlers::admin::create_provider))
        .route("/api/admin/providers/:id", get(handlers::admin::get_provider))
        .route("/api/admin/providers/:id", put(handlers::admin::update_provider))
        .route(
            "/api/admin/providers/:id",
            delete(handlers::admin::delete_provider),
        )
        .route("/api/admin/bookings", get(handlers::admin::list_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::set_booking_status),
        )
        .route(
            "/api/admin/bookings/:id",
            put(handlers::admin::update_booking),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
