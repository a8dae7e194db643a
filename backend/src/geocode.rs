//! Forward, reverse and autocomplete lookups against Geoapify, plus the
//! Nominatim search used by the image pipeline.

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::Config;
use crate::error::{ApiError, Error, Result};
use crate::models::{Coordinates, Location};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct GeoapifyResponse {
    #[serde(default)]
    results: Vec<GeoapifyPlace>,
}

#[derive(Debug, Deserialize)]
struct GeoapifyPlace {
    lat: f64,
    lon: f64,
    name: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    county: Option<String>,
    country: Option<String>,
    formatted: Option<String>,
}

impl GeoapifyPlace {
    fn into_location(self, prefer_settlement: bool) -> Location {
        let settlement = self.city.or(self.town).or(self.village);
        let name = if prefer_settlement {
            settlement.or(self.county).or(self.name)
        } else {
            settlement.or(self.name)
        };
        let display_name = self.formatted.unwrap_or_default();

        Location {
            name: name.unwrap_or_else(|| display_name.clone()),
            display_name,
            lat: self.lat,
            lng: self.lon,
            country: self.country.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
    display_name: String,
}

#[derive(Debug, Clone)]
pub struct Geocoder {
    http: reqwest::Client,
    geoapify_base: String,
    api_key: Option<String>,
    nominatim_base: String,
    user_agent: String,
}

impl Geocoder {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        Geocoder {
            http,
            geoapify_base: config.geoapify_base_url.trim_end_matches('/').to_string(),
            api_key: config.geoapify_api_key.clone(),
            nominatim_base: config.nominatim_base_url.trim_end_matches('/').to_string(),
            user_agent: config.user_agent.clone(),
        }
    }

    fn key(&self) -> Result<&str> {
        self.api_key
            .as_deref()
            .ok_or_else(|| Error::Geocoding("GEOAPIFY_API_KEY is not configured".to_string()))
    }

    async fn geoapify(&self, path: &str, params: &[(&str, String)]) -> Result<Vec<GeoapifyPlace>> {
        let response = self
            .http
            .get(format!("{}/geocode/{}", self.geoapify_base, path))
            .query(params)
            .query(&[("format", "json"), ("apiKey", self.key()?)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Geocoding(format!("{status}: {body}")));
        }

        let parsed: GeoapifyResponse = response.json().await?;
        Ok(parsed.results)
    }

    /// Best single match for free text.
    pub async fn search(&self, text: &str) -> Result<Option<Location>> {
        let places = self
            .geoapify("search", &[("text", text.to_string()), ("limit", "1".to_string())])
            .await?;
        Ok(places.into_iter().next().map(|p| p.into_location(false)))
    }

    pub async fn reverse(&self, lat: f64, lng: f64) -> Result<Option<Location>> {
        let places = self
            .geoapify("reverse", &[("lat", lat.to_string()), ("lon", lng.to_string())])
            .await?;
        Ok(places.into_iter().next().map(|p| p.into_location(true)))
    }

    /// Up to five cities matching a partial name.
    pub async fn autocomplete(&self, text: &str) -> Result<Vec<Location>> {
        let places = self
            .geoapify(
                "autocomplete",
                &[
                    ("text", text.to_string()),
                    ("type", "city".to_string()),
                    ("limit", "5".to_string()),
                ],
            )
            .await?;
        Ok(places.into_iter().map(|p| p.into_location(false)).collect())
    }

    pub async fn nominatim(&self, query: &str) -> Result<Option<Coordinates>> {
        let places: Vec<NominatimPlace> = self
            .http
            .get(format!("{}/search", self.nominatim_base))
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .query(&[("q", query), ("format", "json"), ("limit", "1"), ("addressdetails", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let Some(place) = places.into_iter().next() else {
            return Ok(None);
        };

        let lat = place.lat.trim().parse::<f64>();
        let lng = place.lon.trim().parse::<f64>();
        match (lat, lng) {
            (Ok(lat), Ok(lng)) => Ok(Some(Coordinates {
                lat,
                lng,
                display_name: place.display_name,
            })),
            _ => Err(Error::Geocoding(format!(
                "unparseable coordinates '{}', '{}'",
                place.lat, place.lon
            ))),
        }
    }

    /// Tries progressively broader queries; the first hit wins and failed
    /// lookups are skipped.
    pub async fn nominatim_cascade(&self, landmark: &str, city: &str, country: &str) -> Option<Coordinates> {
        for query in cascade_queries(landmark, city, country) {
            match self.nominatim(&query).await {
                Ok(Some(hit)) => {
                    tracing::info!(query = %query, lat = hit.lat, lng = hit.lng, "📍 geocoded");
                    return Some(hit);
                }
                Ok(None) => tracing::debug!(query = %query, "no geocoding match"),
                Err(e) => tracing::warn!(query = %query, error = %e, "⚠️ geocoding lookup failed"),
            }
        }
        None
    }
}

pub fn cascade_queries(landmark: &str, city: &str, country: &str) -> Vec<String> {
    [
        landmark.to_string(),
        format!("{landmark} {city} {country}"),
        format!("{city} {country}"),
        city.to_string(),
    ]
    .into_iter()
    .map(|q| q.trim().to_string())
    .filter(|q| q.chars().count() > 1)
    .collect()
}

// Proxy handlers

#[derive(Debug, Deserialize)]
pub struct TextQuery {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseQuery {
    pub lat: f64,
    pub lng: f64,
}

fn required_text(query: TextQuery) -> std::result::Result<String, ApiError> {
    query
        .text
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Query text required".to_string()))
}

fn upstream(err: Error) -> ApiError {
    tracing::error!(error = %err, "❌ geocoding proxy failed");
    ApiError::Upstream(err.to_string())
}

pub async fn search_handler(
    State(state): State<AppState>,
    Query(query): Query<TextQuery>,
) -> std::result::Result<Json<Value>, ApiError> {
    let text = required_text(query)?;
    let location = state.geocoder.search(&text).await.map_err(upstream)?;
    Ok(Json(json!({ "success": true, "location": location })))
}

pub async fn reverse_handler(
    State(state): State<AppState>,
    Query(query): Query<ReverseQuery>,
) -> std::result::Result<Json<Value>, ApiError> {
    let location = state
        .geocoder
        .reverse(query.lat, query.lng)
        .await
        .map_err(upstream)?;
    Ok(Json(json!({ "success": true, "location": location })))
}

pub async fn autocomplete_handler(
    State(state): State<AppState>,
    Query(query): Query<TextQuery>,
) -> std::result::Result<Json<Value>, ApiError> {
    let text = required_text(query)?;
    let locations = state.geocoder.autocomplete(&text).await.map_err(upstream)?;
    Ok(Json(json!({ "success": true, "locations": locations })))
}
