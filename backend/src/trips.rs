use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::models::{lenient_string, NewTrip};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveTripRequest {
    pub itinerary: Value,
    #[serde(default)]
    pub weather: Option<Value>,
    #[serde(default)]
    pub hotels: Option<Value>,
    #[serde(default)]
    pub railways: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct DeleteTripQuery {
    pub id: Option<String>,
}

// Only the columns we index by; the itinerary itself is stored as sent.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ItinerarySummary {
    #[serde(deserialize_with = "lenient_string")]
    start_location: String,
    #[serde(deserialize_with = "lenient_string")]
    destination: String,
    #[serde(default, deserialize_with = "lenient_string")]
    dates: String,
    #[serde(default, deserialize_with = "lenient_string")]
    travelers: String,
    #[serde(default, deserialize_with = "lenient_string")]
    budget: String,
    #[serde(default)]
    transport: TransportSummary,
}

#[derive(Debug, Default, Deserialize)]
struct TransportSummary {
    #[serde(default, deserialize_with = "lenient_string")]
    mode: String,
}

/// Splits `"<start> to <end>"`; a missing end stays `None`.
fn split_dates(dates: &str) -> (String, Option<String>) {
    let mut parts = dates.split(" to ");
    let start = parts.next().unwrap_or_default().trim().to_string();
    let end = parts
        .next()
        .map(|end| end.trim().to_string())
        .filter(|end| !end.is_empty());
    (start, end)
}

fn present(value: Option<Value>) -> Option<Value> {
    value.filter(|v| !v.is_null())
}

async fn owner_id(state: &AppState, user: &AuthUser) -> Result<Uuid, ApiError> {
    state
        .trips
        .find_user_id(&user.email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))
}

pub async fn list_trips_handler(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, ApiError> {
    let user_id = owner_id(&state, &user).await?;
    let trips = state.trips.list_trips(user_id).await?;

    tracing::debug!(%user_id, count = trips.len(), "📚 listed trips");
    Ok(Json(json!({ "success": true, "trips": trips })))
}

pub async fn save_trip_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<SaveTripRequest>,
) -> Result<Json<Value>, ApiError> {
    let user_id = owner_id(&state, &user).await?;

    let summary: ItinerarySummary = serde_json::from_value(request.itinerary.clone())
        .map_err(|e| ApiError::BadRequest(format!("Invalid itinerary: {e}")))?;
    let (start_date, end_date) = split_dates(&summary.dates);

    let trip = state
        .trips
        .insert_trip(NewTrip {
            user_id,
            start_location: summary.start_location,
            destination: summary.destination,
            start_date,
            end_date,
            travelers: summary.travelers,
            budget: summary.budget,
            transport: summary.transport.mode,
            itinerary: request.itinerary,
            weather: present(request.weather),
            hotels: present(request.hotels),
            railways: present(request.railways),
        })
        .await?;

    tracing::info!(trip_id = %trip.id, %user_id, destination = %trip.destination, "💾 trip saved");
    Ok(Json(json!({ "success": true, "trip": trip })))
}

pub async fn delete_trip_handler(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<DeleteTripQuery>,
) -> Result<Json<Value>, ApiError> {
    let trip_id = query
        .id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Trip ID required".to_string()))?;

    let user_id = owner_id(&state, &user).await?;
    let not_found = || ApiError::NotFound("Trip not found or unauthorized".to_string());

    // An id that is not a UUID cannot name any stored trip.
    let trip_id = Uuid::parse_str(&trip_id).map_err(|_| not_found())?;

    if !state.trips.delete_trip(trip_id, user_id).await? {
        tracing::warn!(%trip_id, %user_id, "🚫 delete refused, trip missing or owned by someone else");
        return Err(not_found());
    }

    tracing::info!(%trip_id, %user_id, "🗑️ trip deleted");
    Ok(Json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::TripStore;
    use crate::test_support::{app_with_store, authed, get, post_json, send};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};

    const NOWHERE: &str = "http://127.0.0.1:9";

    fn itinerary() -> Value {
        json!({
            "startLocation": "Delhi",
            "destination": "Jaipur",
            "dates": "2025-03-01 to 2025-03-03",
            "travelers": "Duo",
            "budget": "Moderate",
            "transport": {"mode": "Train", "duration": "4h 30m"},
            "days": []
        })
    }

    fn delete(uri: &str) -> Request<Body> {
        Request::builder().method("DELETE").uri(uri).body(Body::empty()).unwrap()
    }

    #[test]
    fn dates_split_on_separator() {
        assert_eq!(
            split_dates("2025-03-01 to 2025-03-03"),
            ("2025-03-01".to_string(), Some("2025-03-03".to_string()))
        );
        assert_eq!(split_dates("2025-03-01"), ("2025-03-01".to_string(), None));
    }

    #[tokio::test]
    async fn unknown_user_gets_404() {
        let (app, _) = app_with_store(NOWHERE);
        let (status, body) = send(app, authed(get("/api/trips"), "ghost@example.com")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "User not found");
    }

    #[tokio::test]
    async fn missing_token_gets_401() {
        let (app, _) = app_with_store(NOWHERE);
        let (status, body) = send(app, get("/api/trips")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Unauthorized");
    }

    #[tokio::test]
    async fn save_then_list() {
        let (app, store) = app_with_store(NOWHERE);
        store.upsert_user("asha@example.com", None, None).await.unwrap();

        let request = post_json(
            "/api/trips/save",
            json!({"itinerary": itinerary(), "weather": null, "hotels": [{"name": "Hotel"}]}),
        );
        let (status, saved) = send(app.clone(), authed(request, "asha@example.com")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(saved["trip"]["startDate"], "2025-03-01");
        assert_eq!(saved["trip"]["endDate"], "2025-03-03");
        assert_eq!(saved["trip"]["transport"], "Train");
        assert_eq!(saved["trip"]["weather"], Value::Null);
        assert_eq!(saved["trip"]["itinerary"], itinerary());

        let (_, listed) = send(app, authed(get("/api/trips"), "asha@example.com")).await;
        assert_eq!(listed["trips"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn save_rejects_itinerary_without_places() {
        let (app, store) = app_with_store(NOWHERE);
        store.upsert_user("asha@example.com", None, None).await.unwrap();

        let request = post_json("/api/trips/save", json!({"itinerary": {"dates": "x"}}));
        let (status, _) = send(app, authed(request, "asha@example.com")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_requires_id() {
        let (app, store) = app_with_store(NOWHERE);
        store.upsert_user("asha@example.com", None, None).await.unwrap();

        let (status, body) = send(app, authed(delete("/api/trips/delete"), "asha@example.com")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Trip ID required");
    }

    #[tokio::test]
    async fn cannot_delete_someone_elses_trip() {
        let (app, store) = app_with_store(NOWHERE);
        let owner = store.upsert_user("owner@example.com", None, None).await.unwrap();
        store.upsert_user("intruder@example.com", None, None).await.unwrap();
        let trip = store
            .insert_trip(NewTrip {
                user_id: owner.id,
                start_location: "Delhi".to_string(),
                destination: "Jaipur".to_string(),
                start_date: "2025-03-01".to_string(),
                end_date: None,
                travelers: "Solo".to_string(),
                budget: "Low".to_string(),
                transport: "Bus".to_string(),
                itinerary: itinerary(),
                weather: None,
                hotels: None,
                railways: None,
            })
            .await
            .unwrap();

        let uri = format!("/api/trips/delete?id={}", trip.id);
        let (status, body) = send(app.clone(), authed(delete(&uri), "intruder@example.com")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Trip not found or unauthorized");
        assert_eq!(store.trip_ids(), vec![trip.id]);

        let (status, _) = send(app, authed(delete(&uri), "owner@example.com")).await;
        assert_eq!(status, StatusCode::OK);
        assert!(store.trip_ids().is_empty());
    }

    #[tokio::test]
    async fn malformed_id_is_not_found() {
        let (app, store) = app_with_store(NOWHERE);
        store.upsert_user("asha@example.com", None, None).await.unwrap();

        let (status, _) = send(
            app,
            authed(delete("/api/trips/delete?id=not-a-uuid"), "asha@example.com"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
