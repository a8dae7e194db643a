use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use validator::Validate;

use crate::error::{ApiError, Error, Result};
use crate::itinerary::{
    ensure_forecast_len, fallback_weather, normalize_daily_plan, parse_trip_date, season, trip_days,
};
use crate::llm::LlmClient;
use crate::models::{
    Budget, CrowdPrediction, Day, EmergencyContacts, FoodSuggestion, Hotel, Itinerary, Notification,
    Railway, RawDay, Transport, TransportDetails, TransportMode, TripData, Weather,
};
use crate::prompts::{self, WeatherQuery};
use crate::sanitize::{clean_model_output, parse_json, parse_or, strip_code_fences, JsonShape};
use crate::state::AppState;

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

// 500 that still carries a usable payload under `key`.
fn failure_with<T: Serialize>(err: Error, key: &str, fallback: T) -> Response {
    tracing::error!(error = %err, key, "❌ generation failed, answering with fallback");
    let mut body = json!({ "success": false, "error": err.to_string() });
    body[key] = serde_json::to_value(fallback).unwrap_or(Value::Null);
    (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
}

// Generate

#[derive(Debug, Deserialize, Validate)]
pub struct GenerateRequest {
    #[validate(length(min = 1, message = "Prompt is required"))]
    pub prompt: String,
}

pub async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    request.validate()?;

    let raw = state.llm.complete(&prompts::generate(&request.prompt)).await?;
    let data = clean_model_output(&raw);
    tracing::info!(raw_len = raw.len(), clean_len = data.len(), "📦 generation cleaned");

    Ok(Json(json!({ "success": true, "data": data })))
}

// Weather

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct WeatherRequest {
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lng: Option<f64>,
    #[serde(default)]
    pub days: Option<u32>,
}

impl WeatherRequest {
    fn for_trip(trip: &TripData, days: u32) -> Self {
        WeatherRequest {
            destination: trip.destination.name.clone(),
            start_date: trip.start_date.clone(),
            end_date: trip.end_date.clone(),
            lat: Some(trip.destination.lat),
            lng: Some(trip.destination.lng),
            days: Some(days),
        }
    }
}

// Kept synchronous so the thread-local rng never lives across an await.
fn shape_forecast(parsed: Option<Weather>, destination: &str, start: NaiveDate, days: u32) -> Weather {
    let mut rng = rand::thread_rng();
    let mut weather = parsed.unwrap_or_else(|| fallback_weather(destination, start, days, &mut rng));
    ensure_forecast_len(&mut weather, days, start, &mut rng);
    weather
}

/// Never fails: anything the model gets wrong is replaced by generic
/// pleasant weather covering the whole trip.
async fn forecast(llm: &LlmClient, request: &WeatherRequest) -> Weather {
    let start = parse_trip_date(&request.start_date).unwrap_or_else(today);
    let end = parse_trip_date(&request.end_date).unwrap_or(start);
    let days = request
        .days
        .filter(|days| *days > 0)
        .unwrap_or_else(|| trip_days(start, end));

    let query = WeatherQuery {
        destination: &request.destination,
        start_date: &request.start_date,
        end_date: &request.end_date,
        lat: request.lat,
        lng: request.lng,
        days,
        start,
        season: season(start),
    };

    let parsed = match llm.complete(&prompts::weather(&query)).await {
        Ok(raw) => match parse_json::<Weather>(&raw, JsonShape::Object) {
            Ok(weather) => Some(weather),
            Err(e) => {
                tracing::warn!(error = %e, destination = %request.destination, "⚠️ weather reply unusable");
                None
            }
        },
        Err(e) => {
            tracing::warn!(error = %e, destination = %request.destination, "⚠️ weather generation failed");
            None
        }
    };

    shape_forecast(parsed, &request.destination, start, days)
}

pub async fn weather_handler(
    State(state): State<AppState>,
    Json(request): Json<WeatherRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    request.validate()?;
    tracing::info!(destination = %request.destination, "🌤️ generating weather forecast");

    let weather = forecast(&state.llm, &request).await;
    Ok(Json(json!({ "success": true, "weather": weather })))
}

// Hotels and trains

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct HotelsRequest {
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    #[serde(default)]
    pub check_in: String,
    #[serde(default)]
    pub check_out: String,
    pub budget: Budget,
}

async fn hotel_options(
    llm: &LlmClient,
    destination: &str,
    check_in: &str,
    check_out: &str,
    budget: Budget,
) -> Result<Vec<Hotel>> {
    let raw = llm
        .complete(&prompts::hotels(destination, check_in, check_out, budget))
        .await?;
    Ok(parse_or(&raw, JsonShape::Array, || vec![Hotel::fallback(destination, budget)]))
}

pub async fn hotels_handler(
    State(state): State<AppState>,
    Json(request): Json<HotelsRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    request.validate()?;
    tracing::info!(destination = %request.destination, budget = %request.budget, "🏨 generating hotels");

    let hotels = hotel_options(
        &state.llm,
        &request.destination,
        &request.check_in,
        &request.check_out,
        request.budget,
    )
    .await?;
    Ok(Json(json!({ "success": true, "hotels": hotels })))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RailwaysRequest {
    #[validate(length(min = 1, message = "Start location is required"))]
    pub start_location: String,
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    pub budget: Budget,
}

async fn train_options(llm: &LlmClient, from: &str, to: &str, budget: Budget) -> Result<Vec<Railway>> {
    let raw = llm.complete(&prompts::railways(from, to, budget)).await?;
    Ok(parse_or(&raw, JsonShape::Array, Vec::new))
}

pub async fn railways_handler(
    State(state): State<AppState>,
    Json(request): Json<RailwaysRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    request.validate()?;
    tracing::info!(from = %request.start_location, to = %request.destination, "🚆 generating trains");

    let railways = train_options(&state.llm, &request.start_location, &request.destination, request.budget).await?;
    Ok(Json(json!({ "success": true, "railways": railways })))
}

// Transport and full itinerary

async fn transport_details(llm: &LlmClient, trip: &TripData) -> Result<TransportDetails> {
    let raw = llm.complete(&prompts::transport(trip)).await?;
    Ok(parse_json(&raw, JsonShape::Object)?)
}

pub async fn transport_handler(
    State(state): State<AppState>,
    Json(trip): Json<TripData>,
) -> std::result::Result<Json<Value>, ApiError> {
    tracing::info!(
        from = %trip.start_location.name,
        to = %trip.destination.name,
        mode = %trip.transport,
        "🚌 generating transport details"
    );

    let details = transport_details(&state.llm, &trip).await?;
    let transport = Transport {
        mode: trip.transport,
        details,
    };
    Ok(Json(json!({ "success": true, "transport": transport })))
}

async fn daily_plan(llm: &LlmClient, trip: &TripData, days: u32, start: NaiveDate) -> Result<Vec<Day>> {
    let raw = llm.complete(&prompts::daily_itinerary(trip, days, start)).await?;
    let parsed: Vec<RawDay> = parse_json(&raw, JsonShape::Array)?;
    Ok(normalize_daily_plan(parsed, days, start, &trip.destination.name))
}

pub async fn itinerary_handler(
    State(state): State<AppState>,
    Json(trip): Json<TripData>,
) -> std::result::Result<Json<Value>, ApiError> {
    let start = parse_trip_date(&trip.start_date)
        .ok_or_else(|| ApiError::BadRequest("Invalid start date".to_string()))?;
    let end = parse_trip_date(&trip.end_date).unwrap_or(start);
    let days = trip_days(start, end);

    let llm = &state.llm;
    let from = trip.start_location.name.as_str();
    let to = trip.destination.name.as_str();
    tracing::info!(%from, %to, days, mode = %trip.transport, "🗺️ building itinerary");

    let weather_request = WeatherRequest::for_trip(&trip, days);
    let (weather, transport, railways, plan, hotels) = tokio::join!(
        forecast(llm, &weather_request),
        transport_details(llm, &trip),
        async {
            match trip.transport {
                TransportMode::Train => train_options(llm, from, to, trip.budget).await,
                TransportMode::Bus => Ok(Vec::new()),
            }
        },
        daily_plan(llm, &trip, days, start),
        hotel_options(llm, to, &trip.start_date, &trip.end_date, trip.budget),
    );

    let railways = railways.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "⚠️ train suggestions failed, continuing without them");
        Vec::new()
    });
    let hotels = hotels.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "⚠️ hotel suggestions failed, using fallback hotel");
        vec![Hotel::fallback(to, trip.budget)]
    });

    let itinerary = Itinerary {
        start_location: from.to_string(),
        destination: to.to_string(),
        dates: format!("{} to {}", trip.start_date, trip.end_date),
        travelers: trip.travelers,
        budget: trip.budget,
        transport: Transport {
            mode: trip.transport,
            details: transport?,
        },
        days: plan?,
    };

    tracing::info!(days = itinerary.days.len(), hotels = hotels.len(), "✅ itinerary ready");
    Ok(Json(json!({
        "success": true,
        "itinerary": itinerary,
        "weather": weather,
        "hotels": hotels,
        "railways": railways,
    })))
}

// Destination enrichment

#[derive(Debug, Deserialize, Validate)]
pub struct FoodRequest {
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    #[serde(default)]
    pub budget: Option<Budget>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct EmergencyRequest {
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CrowdRequest {
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct InsightsRequest {
    #[validate(length(min = 1, message = "Destination is required"))]
    pub destination: String,
    #[serde(default)]
    pub start_date: String,
    #[serde(default)]
    pub end_date: String,
    #[serde(default)]
    pub budget: Option<Budget>,
}

async fn food_for(llm: &LlmClient, destination: &str, budget: Budget) -> Result<Vec<FoodSuggestion>> {
    let raw = llm.complete(&prompts::food(destination, budget)).await?;
    Ok(parse_json(&raw, JsonShape::Array)?)
}

async fn emergency_for(llm: &LlmClient, destination: &str) -> Result<EmergencyContacts> {
    let raw = llm.complete(&prompts::emergency(destination)).await?;
    Ok(parse_json(&raw, JsonShape::Object)?)
}

async fn crowd_for(llm: &LlmClient, destination: &str, start: &str, end: &str) -> Result<CrowdPrediction> {
    let raw = llm.complete(&prompts::crowd(destination, start, end)).await?;
    Ok(parse_json(&raw, JsonShape::Object)?)
}

pub async fn food_handler(State(state): State<AppState>, Json(request): Json<FoodRequest>) -> Response {
    if let Err(e) = request.validate() {
        return ApiError::from(e).into_response();
    }
    let budget = request.budget.unwrap_or(Budget::Moderate);
    tracing::info!(destination = %request.destination, %budget, "🍛 suggesting local food");

    match food_for(&state.llm, &request.destination, budget).await {
        Ok(suggestions) => Json(json!({ "success": true, "suggestions": suggestions })).into_response(),
        Err(e) => failure_with(e, "suggestions", Vec::<FoodSuggestion>::new()),
    }
}

pub async fn emergency_handler(State(state): State<AppState>, Json(request): Json<EmergencyRequest>) -> Response {
    if let Err(e) = request.validate() {
        return ApiError::from(e).into_response();
    }
    tracing::info!(destination = %request.destination, "🚨 looking up emergency contacts");

    match emergency_for(&state.llm, &request.destination).await {
        Ok(contacts) => Json(json!({ "success": true, "contacts": contacts })).into_response(),
        Err(e) => failure_with(e, "contacts", EmergencyContacts::national()),
    }
}

pub async fn crowd_handler(State(state): State<AppState>, Json(request): Json<CrowdRequest>) -> Response {
    if let Err(e) = request.validate() {
        return ApiError::from(e).into_response();
    }
    tracing::info!(destination = %request.destination, "👥 predicting crowds");

    match crowd_for(&state.llm, &request.destination, &request.start_date, &request.end_date).await {
        Ok(prediction) => Json(json!({ "success": true, "prediction": prediction })).into_response(),
        Err(e) => failure_with(e, "prediction", CrowdPrediction::moderate()),
    }
}

pub async fn trip_insights_handler(
    State(state): State<AppState>,
    Json(request): Json<InsightsRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    request.validate()?;
    let llm = &state.llm;
    let destination = request.destination.as_str();
    tracing::info!(%destination, "🧭 gathering trip insights");

    let (contacts, prediction, suggestions) = tokio::join!(
        emergency_for(llm, destination),
        crowd_for(llm, destination, &request.start_date, &request.end_date),
        food_for(llm, destination, request.budget.unwrap_or(Budget::Moderate)),
    );

    let contacts = contacts.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "⚠️ emergency contacts unavailable, using national numbers");
        EmergencyContacts::national()
    });
    let prediction = prediction.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "⚠️ crowd prediction unavailable, assuming moderate");
        CrowdPrediction::moderate()
    });
    let suggestions = suggestions.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "⚠️ food suggestions unavailable");
        Vec::new()
    });

    Ok(Json(json!({
        "success": true,
        "contacts": contacts,
        "prediction": prediction,
        "suggestions": suggestions,
    })))
}

// Notifications

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationsRequest {
    #[serde(default)]
    pub user_location: Option<String>,
}

pub async fn notifications_handler(
    State(state): State<AppState>,
    Json(request): Json<NotificationsRequest>,
) -> Json<Value> {
    let today = today();
    let prompt = prompts::notifications(request.user_location.as_deref(), today);

    let notifications = match state.llm.complete(&prompt).await {
        Ok(raw) => parse_or(&raw, JsonShape::Array, || vec![Notification::fallback(today)]),
        Err(e) => {
            tracing::warn!(error = %e, "⚠️ notification generation failed");
            vec![Notification::fallback(today)]
        }
    };

    tracing::info!(count = notifications.len(), "🔔 notifications ready");
    Json(json!({ "success": true, "notifications": notifications }))
}

// Chat

#[derive(Debug, Deserialize, Validate)]
pub struct ChatRequest {
    #[validate(length(min = 1, message = "Message is required"))]
    pub message: String,
    #[serde(default)]
    pub itinerary: Option<Value>,
    #[serde(default)]
    pub weather: Option<Value>,
}

fn text_at(value: &Value, path: &[&str]) -> String {
    let mut node = value;
    for key in path {
        node = &node[*key];
    }
    match node {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn chat_context(itinerary: Option<&Value>, weather: Option<&Value>) -> String {
    let Some(trip) = itinerary.filter(|v| v.is_object()) else {
        return "No trip planned yet.".to_string();
    };

    let weather = match weather.filter(|v| v.is_object()) {
        Some(w) => format!(
            "{}°C, {}",
            text_at(w, &["current", "temp"]),
            text_at(w, &["current", "condition"])
        ),
        None => "Not loaded".to_string(),
    };

    format!(
        "Current trip: {} to {}, {}, Budget: {}\nWeather: {weather}",
        text_at(trip, &["startLocation"]),
        text_at(trip, &["destination"]),
        text_at(trip, &["dates"]),
        text_at(trip, &["budget"]),
    )
}

/// Models sometimes answer chat in JSON despite being told not to.
fn unwrap_chat_reply(raw: &str) -> String {
    let unfenced = strip_code_fences(raw);
    let text = unfenced.trim();

    let Ok(Value::Object(reply)) = serde_json::from_str::<Value>(text) else {
        return text.to_string();
    };

    let field = |key: &str| {
        reply
            .get(key)
            .and_then(Value::as_str)
            .filter(|s| !s.trim().is_empty())
    };

    match (field("message"), field("greeting")) {
        (Some(message), _) => message.to_string(),
        (None, Some(greeting)) => format!("{greeting}. How can I help you?"),
        (None, None) => text.to_string(),
    }
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> std::result::Result<Json<Value>, ApiError> {
    request.validate()?;

    let context = chat_context(request.itinerary.as_ref(), request.weather.as_ref());
    let raw = state.llm.complete(&prompts::chat(&request.message, &context)).await?;

    Ok(Json(json!({ "success": true, "reply": unwrap_chat_reply(&raw) })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{app, llm_reply, post_json, send};
    use httpmock::prelude::*;

    fn llm_down(server: &MockServer) {
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(500).body("upstream exploded");
        });
    }

    fn llm_says<'a>(server: &'a MockServer, content: &str) -> httpmock::Mock<'a> {
        server.mock(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(llm_reply(content));
        })
    }

    fn trip(mode: &str) -> Value {
        json!({
            "startLocation": {"name": "Delhi", "displayName": "Delhi, India", "lat": 28.61, "lng": 77.21, "country": "India"},
            "destination": {"name": "Jaipur", "displayName": "Jaipur, India", "lat": 26.91, "lng": 75.79, "country": "India"},
            "startDate": "2025-03-01",
            "endDate": "2025-03-03",
            "travelers": "Duo",
            "budget": "Moderate",
            "transport": mode
        })
    }

    #[test]
    fn chat_context_without_trip() {
        assert_eq!(chat_context(None, None), "No trip planned yet.");
    }

    #[test]
    fn chat_context_mentions_trip_and_weather() {
        let itinerary = json!({"startLocation": "Delhi", "destination": "Agra", "dates": "2025-03-01 to 2025-03-02", "budget": "Low"});
        let weather = json!({"current": {"temp": 31, "condition": "Sunny"}});
        let context = chat_context(Some(&itinerary), Some(&weather));
        assert_eq!(
            context,
            "Current trip: Delhi to Agra, 2025-03-01 to 2025-03-02, Budget: Low\nWeather: 31°C, Sunny"
        );
        assert!(chat_context(Some(&itinerary), None).ends_with("Weather: Not loaded"));
    }

    #[test]
    fn chat_reply_unwrapping() {
        assert_eq!(unwrap_chat_reply("Carry an umbrella."), "Carry an umbrella.");
        assert_eq!(unwrap_chat_reply("{\"message\": \"Visit Amber Fort\"}"), "Visit Amber Fort");
        assert_eq!(unwrap_chat_reply("```json\n{\"greeting\": \"Namaste\"}\n```"), "Namaste. How can I help you?");
        assert_eq!(unwrap_chat_reply("{\"tips\": []}"), "{\"tips\": []}");
    }

    #[tokio::test]
    async fn generate_returns_cleaned_json() {
        let server = MockServer::start();
        let mock = llm_says(&server, "Sure!\n```json\n{\"forts\": [\"Amber\"]}\n```");

        let (status, body) = send(app(&server.base_url()), post_json("/api/generate", json!({"prompt": "forts"}))).await;
        mock.assert();
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], "{\"forts\": [\"Amber\"]}");
    }

    #[tokio::test]
    async fn generate_surfaces_provider_failure() {
        let server = MockServer::start();
        llm_down(&server);

        let (status, body) = send(app(&server.base_url()), post_json("/api/generate", json!({"prompt": "forts"}))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().contains("500"));
    }

    #[tokio::test]
    async fn generate_rejects_empty_prompt() {
        let (status, _) = send(app("http://127.0.0.1:9"), post_json("/api/generate", json!({"prompt": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn weather_falls_back_when_model_is_down() {
        let server = MockServer::start();
        llm_down(&server);

        let request = post_json(
            "/api/weather",
            json!({"destination": "Goa", "startDate": "2025-03-01", "endDate": "2025-03-03"}),
        );
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["weather"]["current"]["description"], "Pleasant weather in Goa");
        let forecast = body["weather"]["forecast"].as_array().unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[2]["date"], "2025-03-03");
    }

    #[tokio::test]
    async fn weather_pads_short_forecast() {
        let server = MockServer::start();
        llm_says(
            &server,
            "{\"current\": {\"temp\": 31, \"feelsLike\": 33, \"condition\": \"Sunny\", \"humidity\": 50, \"windSpeed\": 9}, \
             \"forecast\": [{\"date\": \"2025-03-01\", \"temp\": 31, \"minTemp\": 24, \"maxTemp\": 34, \"condition\": \"Sunny\", \"humidity\": 50}]}",
        );

        let request = post_json(
            "/api/weather",
            json!({"destination": "Goa", "startDate": "2025-03-01", "endDate": "2025-03-01", "days": 3}),
        );
        let (_, body) = send(app(&server.base_url()), request).await;
        let forecast = body["weather"]["forecast"].as_array().unwrap();
        assert_eq!(forecast.len(), 3);
        assert_eq!(forecast[0]["description"], "");
        assert_eq!(forecast[2]["description"], "Continued conditions");
        assert_eq!(forecast[2]["date"], "2025-03-03");
        assert_eq!(body["weather"]["current"]["temp"], 31.0);
    }

    #[tokio::test]
    async fn hotels_fall_back_on_unparseable_reply() {
        let server = MockServer::start();
        llm_says(&server, "I recommend staying near the beach.");

        let request = post_json(
            "/api/hotels",
            json!({"destination": "Goa", "checkIn": "2025-03-01", "checkOut": "2025-03-03", "budget": "Low"}),
        );
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body["hotels"],
            json!([serde_json::to_value(Hotel::fallback("Goa", Budget::Low)).unwrap()])
        );
    }

    #[tokio::test]
    async fn hotels_survive_raw_newline_beside_nested_list() {
        let server = MockServer::start();
        llm_says(
            &server,
            "[{\"name\": \"Hotel\nRaj\", \"price\": \"₹1,000/night\", \"rating\": 4, \"address\": \"MI Road\", \"amenities\": [\"WiFi\"]}]",
        );

        let request = post_json("/api/hotels", json!({"destination": "Jaipur", "budget": "Low"}));
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::OK);
        let hotels = body["hotels"].as_array().unwrap();
        assert_eq!(hotels.len(), 1);
        assert_eq!(hotels[0]["name"], "HotelRaj");
        assert_eq!(hotels[0]["rating"], "4");
    }

    #[tokio::test]
    async fn hotels_fail_when_model_is_down() {
        let server = MockServer::start();
        llm_down(&server);

        let request = post_json("/api/hotels", json!({"destination": "Goa", "budget": "High"}));
        let (status, _) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn railways_non_array_becomes_empty() {
        let server = MockServer::start();
        llm_says(&server, "{\"trainName\": \"Shatabdi\"}");

        let request = post_json(
            "/api/railways",
            json!({"startLocation": "Delhi", "destination": "Jaipur", "budget": "Moderate"}),
        );
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["railways"], json!([]));
    }

    #[tokio::test]
    async fn transport_parse_failure_is_500() {
        let server = MockServer::start();
        llm_says(&server, "It takes about five hours.");

        let (status, body) = send(app(&server.base_url()), post_json("/api/transport", trip("Bus"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn transport_keeps_requested_mode() {
        let server = MockServer::start();
        llm_says(&server, "{\"duration\": \"5h\", \"cost\": 450, \"route\": \"Delhi → Jaipur\"}");

        let (status, body) = send(app(&server.base_url()), post_json("/api/transport", trip("Bus"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["transport"]["mode"], "Bus");
        assert_eq!(body["transport"]["cost"], "450");
    }

    #[tokio::test]
    async fn food_failure_returns_empty_suggestions() {
        let server = MockServer::start();
        llm_down(&server);

        let request = post_json("/api/food-suggestions", json!({"destination": "Lucknow", "budget": "Low"}));
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["suggestions"], json!([]));
    }

    #[tokio::test]
    async fn emergency_failure_returns_national_numbers() {
        let server = MockServer::start();
        llm_says(&server, "Call the police.");

        let request = post_json("/api/emergency-info", json!({"destination": "Shimla"}));
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["contacts"]["police"], "100");
        assert_eq!(body["contacts"]["ambulance"], "108");
        assert_eq!(body["contacts"]["tourist"], "1363");
    }

    #[tokio::test]
    async fn crowd_failure_predicts_moderate() {
        let server = MockServer::start();
        llm_down(&server);

        let request = post_json(
            "/api/crowd-prediction",
            json!({"destination": "Varanasi", "startDate": "2025-11-01", "endDate": "2025-11-05"}),
        );
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["prediction"]["level"], "🟡 Moderate");
    }

    #[tokio::test]
    async fn notifications_always_answer() {
        let server = MockServer::start();
        llm_down(&server);

        let (status, body) = send(app(&server.base_url()), post_json("/api/notifications", json!({}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        let notifications = body["notifications"].as_array().unwrap();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0]["title"], "Upcoming Festivals");
        assert_eq!(notifications[0]["date"], today().format("%Y-%m-%d").to_string());
    }

    #[tokio::test]
    async fn trip_insights_use_every_fallback() {
        let server = MockServer::start();
        llm_down(&server);

        let request = post_json(
            "/api/trip-insights",
            json!({"destination": "Udaipur", "startDate": "2025-12-20", "endDate": "2025-12-24"}),
        );
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["contacts"]["fire"], "101");
        assert_eq!(body["prediction"]["level"], "🟡 Moderate");
        assert_eq!(body["suggestions"], json!([]));
    }

    #[tokio::test]
    async fn chat_replies_in_plain_text() {
        let server = MockServer::start();
        llm_says(&server, "{\"message\": \"Try the pyaaz kachori.\"}");

        let request = post_json("/api/chat", json!({"message": "What should I eat in Jaipur?"}));
        let (status, body) = send(app(&server.base_url()), request).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["reply"], "Try the pyaaz kachori.");
    }

    // One reply that every sub-generation can read, so call counts show
    // which generations ran.
    const UNIVERSAL_REPLY: &str = "{\"current\": {\"temp\": 30, \"feelsLike\": 32, \"condition\": \"Sunny\", \"humidity\": 40, \"windSpeed\": 8}, \
        \"forecast\": [{\"date\": \"2025-03-01\", \"temp\": 30, \"minTemp\": 22, \"maxTemp\": 34, \"condition\": \"Sunny\", \"humidity\": 40}], \
        \"duration\": \"4h 30m\", \"cost\": \"₹600\", \"route\": \"Delhi → Jaipur\"}";

    #[tokio::test]
    async fn bus_itinerary_skips_trains() {
        let server = MockServer::start();
        let mock = llm_says(&server, UNIVERSAL_REPLY);

        let (status, body) = send(app(&server.base_url()), post_json("/api/itinerary", trip("Bus"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mock.calls(), 4);

        let itinerary = &body["itinerary"];
        assert_eq!(itinerary["dates"], "2025-03-01 to 2025-03-03");
        assert_eq!(itinerary["transport"]["mode"], "Bus");
        assert_eq!(itinerary["transport"]["duration"], "4h 30m");
        assert_eq!(itinerary["days"].as_array().unwrap().len(), 3);
        assert_eq!(itinerary["days"][2]["date"], "2025-03-03");
        assert_eq!(body["weather"]["forecast"].as_array().unwrap().len(), 3);
        assert_eq!(body["railways"], json!([]));
    }

    #[tokio::test]
    async fn train_itinerary_asks_for_trains() {
        let server = MockServer::start();
        let mock = llm_says(&server, UNIVERSAL_REPLY);

        let (status, _) = send(app(&server.base_url()), post_json("/api/itinerary", trip("Train"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mock.calls(), 5);
    }

    #[tokio::test]
    async fn itinerary_needs_a_start_date() {
        let mut body = trip("Bus");
        body["startDate"] = json!("soon");
        let (status, body) = send(app("http://127.0.0.1:9"), post_json("/api/itinerary", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid start date");
    }
}
