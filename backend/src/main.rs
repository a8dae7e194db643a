mod api;
mod auth;
mod config;
mod database;
mod error;
mod geocode;
mod itinerary;
mod llm;
mod models;
mod pilgrimage;
mod prompts;
mod sanitize;
mod speech;
mod state;
mod trips;
mod vision;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use anyhow::Context;
use axum::{
    extract::DefaultBodyLimit,
    http::Method,
    routing::{delete, get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::database::PgTripStore;
use crate::state::AppState;

async fn health_check() -> &'static str {
    "OK"
}

pub(crate) fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers(Any);

    // Generation routes backed by the LLM
    let planner_routes = Router::new()
        .route("/api/generate", post(api::generate_handler))
        .route("/api/weather", post(api::weather_handler))
        .route("/api/hotels", post(api::hotels_handler))
        .route("/api/railways", post(api::railways_handler))
        .route("/api/transport", post(api::transport_handler))
        .route("/api/itinerary", post(api::itinerary_handler))
        .route("/api/food-suggestions", post(api::food_handler))
        .route("/api/emergency-info", post(api::emergency_handler))
        .route("/api/crowd-prediction", post(api::crowd_handler))
        .route("/api/notifications", post(api::notifications_handler))
        .route("/api/trip-insights", post(api::trip_insights_handler))
        .route("/api/chat", post(api::chat_handler));

    // Voice, image and map lookups
    let lookup_routes = Router::new()
        .route("/api/speech-to-text", post(speech::speech_to_text_handler))
        .route("/api/voice-assistant", post(speech::voice_assistant_handler))
        .route("/api/voice-assistant/resolve", post(speech::resolve_handler))
        .route("/api/identify-location", post(vision::identify_location_handler))
        .route("/api/location-finder", post(vision::location_finder_handler))
        .route("/api/geocode/search", get(geocode::search_handler))
        .route("/api/geocode/reverse", get(geocode::reverse_handler))
        .route("/api/geocode/autocomplete", get(geocode::autocomplete_handler))
        .route("/api/pilgrimage", get(pilgrimage::list_handler));

    // Signed-in routes
    let account_routes = Router::new()
        .route("/api/users/sync", post(auth::sync_user_handler))
        .route("/api/trips", get(trips::list_trips_handler))
        .route("/api/trips/save", post(trips::save_trip_handler))
        .route("/api/trips/delete", delete(trips::delete_trip_handler));

    Router::new()
        .route("/health", get(health_check))
        .merge(planner_routes)
        .merge(lookup_routes)
        .merge(account_routes)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024)) // 50MB, photos and voice notes
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let pool = database::connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;
    database::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    if config.deepgram_api_key.is_none() {
        tracing::warn!("⚠️ DEEPGRAM_API_KEY not set, speech-to-text will fail");
    }
    if config.hf_token.is_none() {
        tracing::warn!("⚠️ HF_TOKEN not set, location finder is disabled");
    }
    if config.geoapify_api_key.is_none() {
        tracing::warn!("⚠️ GEOAPIFY_API_KEY not set, geocoding will fail");
    }

    let port = config.port;
    let state = AppState::new(config, Arc::new(PgTripStore::new(pool)));

    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;

    tracing::info!(port, "🚀 Server running on http://0.0.0.0:{port}");
    axum::serve(listener, app(state)).await?;
    Ok(())
}
