//! Image-based location recognition.
//!
//! Two pipelines share this module. `identify-location` asks a vision model
//! directly and tops up missing coordinates with a forward geocode.
//! `location-finder` captions the image first, asks a text model which place
//! the caption describes, then walks a geocoding cascade. Each stage of the
//! second pipeline reports its own failure so the client can tell a cold
//! model from an unrecognisable photo.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::Config;
use crate::error::{ApiError, Error};
use crate::models::{LocationResult, PlaceGuess};
use crate::prompts;
use crate::sanitize::{parse_json, JsonShape};
use crate::state::AppState;

const UNKNOWN: &str = "Unknown";

#[derive(Debug, Error)]
pub enum FinderError {
    #[error("HF_TOKEN is not configured")]
    NotConfigured,

    #[error("HF model is warming up (cold start). Please wait 20–30 seconds and try again.")]
    WarmingUp,

    #[error("Invalid HF token. Check HF_TOKEN in the server environment.")]
    InvalidToken,

    #[error("Caption model error {status}: {body}")]
    Caption { status: u16, body: String },

    #[error("Caption model returned an empty caption. Try a clearer photo with a visible landmark.")]
    EmptyCaption,

    #[error("Landmark model request failed: {0}")]
    Extraction(#[source] Error),

    #[error("Landmark model did not return valid JSON. Response was: \"{0}\"")]
    NoJson(String),

    #[error("Could not identify a recognisable location. The image was described as: \"{0}\". Try a clearer photo of a well-known landmark or monument.")]
    Unrecognised(String),

    #[error("Found the place \"{name}\" but could not get map coordinates for \"{landmark}\".")]
    NoCoordinates { name: String, landmark: String },

    #[error("Caption request failed: {0}")]
    Network(#[from] reqwest::Error),
}

impl FinderError {
    pub fn stage(&self) -> &'static str {
        match self {
            FinderError::NotConfigured
            | FinderError::WarmingUp
            | FinderError::InvalidToken
            | FinderError::Caption { .. }
            | FinderError::EmptyCaption
            | FinderError::Network(_) => "captioning",
            FinderError::Extraction(_) | FinderError::NoJson(_) | FinderError::Unrecognised(_) => "extracting",
            FinderError::NoCoordinates { .. } => "geocoding",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            FinderError::NotConfigured | FinderError::WarmingUp => StatusCode::SERVICE_UNAVAILABLE,
            FinderError::InvalidToken
            | FinderError::Caption { .. }
            | FinderError::Network(_)
            | FinderError::Extraction(_)
            | FinderError::NoJson(_) => StatusCode::BAD_GATEWAY,
            FinderError::EmptyCaption | FinderError::Unrecognised(_) | FinderError::NoCoordinates { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
        }
    }
}

impl IntoResponse for FinderError {
    fn into_response(self) -> Response {
        tracing::warn!(stage = self.stage(), error = %self, "⚠️ location finder stopped");
        let body = json!({ "success": false, "stage": self.stage(), "error": self.to_string() });
        (self.status(), Json(body)).into_response()
    }
}

/// Image captioning model on the inference host.
#[derive(Debug, Clone)]
pub struct CaptionClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl CaptionClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        CaptionClient {
            http,
            endpoint: format!(
                "{}/{}",
                config.hf_base_url.trim_end_matches('/'),
                config.caption_model
            ),
            token: config.hf_token.clone(),
        }
    }

    pub async fn caption(&self, image: Vec<u8>) -> Result<String, FinderError> {
        let token = self.token.as_deref().ok_or(FinderError::NotConfigured)?;

        let response = self
            .http
            .post(&self.endpoint)
            .bearer_auth(token)
            .header(reqwest::header::CONTENT_TYPE, "image/jpeg")
            .body(image)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::SERVICE_UNAVAILABLE => FinderError::WarmingUp,
                StatusCode::UNAUTHORIZED => FinderError::InvalidToken,
                _ => FinderError::Caption {
                    status: status.as_u16(),
                    body: body.chars().take(200).collect(),
                },
            });
        }

        let payload: Value = response.json().await?;
        let caption = payload
            .get(0)
            .and_then(|first| first.get("generated_text"))
            .or_else(|| payload.get("generated_text"))
            .and_then(Value::as_str)
            .map(str::trim)
            .unwrap_or_default();

        if caption.is_empty() {
            return Err(FinderError::EmptyCaption);
        }
        Ok(caption.to_string())
    }
}

struct Upload {
    bytes: Vec<u8>,
    mime: String,
}

async fn read_image(mut multipart: Multipart) -> Result<Upload, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid form data: {e}")))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let mime = field.content_type().unwrap_or("image/jpeg").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ApiError::BadRequest(format!("Invalid image upload: {e}")))?;
        if !bytes.is_empty() {
            return Ok(Upload { bytes: bytes.to_vec(), mime });
        }
    }
    Err(ApiError::BadRequest("No image provided".to_string()))
}

fn text_or(value: &Value, key: &str, default: &str) -> String {
    value
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Coerces whatever the vision model produced into a complete result.
pub fn normalize_location(value: &Value) -> LocationResult {
    let landmarks = value
        .get("landmarks")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();

    LocationResult {
        location: text_or(value, "location", UNKNOWN),
        city: text_or(value, "city", UNKNOWN),
        country: text_or(value, "country", UNKNOWN),
        confidence: text_or(value, "confidence", "Low"),
        reasoning: text_or(value, "reasoning", "Analysis completed"),
        landmarks,
        lat: value.get("lat").and_then(Value::as_f64),
        lng: value.get("lng").and_then(Value::as_f64),
        category: text_or(value, "category", UNKNOWN),
    }
}

fn geocode_query(result: &LocationResult) -> String {
    [&result.location, &result.city, &result.country]
        .into_iter()
        .filter(|part| !part.is_empty() && part.as_str() != UNKNOWN)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

pub async fn identify_location_handler(
    State(state): State<AppState>,
    multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let upload = read_image(multipart).await?;
    tracing::info!(
        bytes = upload.bytes.len(),
        mime = %upload.mime,
        model = state.vision.model(),
        "🖼️ identifying location from image"
    );

    let raw = state
        .vision
        .complete_with_image(&prompts::identify_location(), &upload.mime, &upload.bytes)
        .await?;

    let mut result = match parse_json::<Value>(&raw, JsonShape::Object) {
        Ok(value) => normalize_location(&value),
        Err(e) => {
            tracing::warn!(error = %e, "⚠️ vision reply unparseable, using unknown result");
            LocationResult::unknown()
        }
    };

    if result.location != UNKNOWN && (result.lat.is_none() || result.lng.is_none()) {
        let query = geocode_query(&result);
        match state.geocoder.search(&query).await {
            Ok(Some(hit)) => {
                result.lat = Some(hit.lat);
                result.lng = Some(hit.lng);
                tracing::info!(%query, lat = hit.lat, lng = hit.lng, "📍 coordinates filled in");
            }
            Ok(None) => tracing::debug!(%query, "no geocoding match for identified place"),
            Err(e) => tracing::warn!(%query, error = %e, "⚠️ geocoding failed, continuing without coordinates"),
        }
    }

    Ok(Json(json!({ "success": true, "result": result })))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FoundPlace {
    pub name: String,
    pub city: String,
    pub country: String,
    pub landmark: String,
    pub description: String,
    pub confidence: String,
    pub lat: f64,
    pub lng: f64,
    pub display_name: String,
}

fn is_recognised(guess: &PlaceGuess) -> bool {
    let name = guess.name.trim();
    !name.is_empty() && name != "Unknown Location" && !guess.landmark.trim().is_empty()
}

async fn find_location(state: &AppState, image: Vec<u8>) -> Result<(String, FoundPlace), FinderError> {
    let caption = state.captions.caption(image).await?;
    tracing::info!(%caption, "📝 image captioned");

    let landmark_model = state.landmark.as_ref().ok_or(FinderError::NotConfigured)?;
    let raw = landmark_model
        .complete(&prompts::caption_landmark(&caption))
        .await
        .map_err(FinderError::Extraction)?;

    let guess: PlaceGuess = parse_json(&raw, JsonShape::Object)
        .map_err(|_| FinderError::NoJson(raw.chars().take(300).collect()))?;

    if !is_recognised(&guess) {
        return Err(FinderError::Unrecognised(caption));
    }

    let coords = state
        .geocoder
        .nominatim_cascade(&guess.landmark, &guess.city, &guess.country)
        .await
        .ok_or_else(|| FinderError::NoCoordinates {
            name: guess.name.clone(),
            landmark: guess.landmark.clone(),
        })?;

    let place = FoundPlace {
        name: guess.name,
        city: guess.city,
        country: guess.country,
        landmark: guess.landmark,
        description: guess.description,
        confidence: guess.confidence,
        lat: coords.lat,
        lng: coords.lng,
        display_name: coords.display_name,
    };
    Ok((caption, place))
}

pub async fn location_finder_handler(State(state): State<AppState>, multipart: Multipart) -> Response {
    let upload = match read_image(multipart).await {
        Ok(upload) => upload,
        Err(e) => return e.into_response(),
    };

    match find_location(&state, upload.bytes).await {
        Ok((caption, place)) => {
            tracing::info!(name = %place.name, lat = place.lat, lng = place.lng, "✅ location found");
            Json(json!({ "success": true, "caption": caption, "result": place })).into_response()
        }
        Err(e) => e.into_response(),
    }
}
