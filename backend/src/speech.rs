//! Voice pipeline: transcription, per-stage slot extraction in Hindi, and
//! resolution of the collected slots into a plannable trip.

use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use validator::Validate;

use crate::config::Config;
use crate::error::{ApiError, Error, Result};
use crate::itinerary::parse_trip_date;
use crate::models::{lenient_string, Budget, Location, TransportMode, Travelers};
use crate::prompts;
use crate::sanitize::{parse_json, JsonShape};
use crate::state::AppState;

pub const LAST_STAGE: u8 = 5;

const STAGE_QUESTIONS: [&str; 6] = [
    "कृपया मुझे बताएं कि आप कहाँ से यात्रा शुरू करना चाहते हैं?",
    "बहुत अच्छा! अब मुझे बताएं कि आप कहाँ जाना चाहते हैं?",
    "शानदार! अब मुझे यात्रा की तारीख बताएं। आप कब जाना चाहते हैं?",
    "अच्छा! कितने लोग यात्रा कर रहे हैं? अकेले, दो लोग, या समूह में?",
    "ठीक है! आपका बजट क्या है? कम, मध्यम, या उच्च?",
    "बढ़िया! आप किस परिवहन से यात्रा करना चाहते हैं? बस या ट्रेन?",
];

const CLOSING: &str = "धन्यवाद! अब मैं आपके लिए यात्रा योजना तैयार कर रहा हूँ...";

const APOLOGY: &str = "क्षमा करें, मुझे समझने में कुछ समस्या हुई। कृपया फिर से कोशिश करें।";

pub fn stage_question(stage: u8) -> Option<&'static str> {
    STAGE_QUESTIONS.get(usize::from(stage)).copied()
}

// Transcription

#[derive(Debug, Deserialize)]
struct DeepgramResponse {
    results: Option<DeepgramResults>,
}

#[derive(Debug, Deserialize)]
struct DeepgramResults {
    #[serde(default)]
    channels: Vec<DeepgramChannel>,
}

#[derive(Debug, Deserialize)]
struct DeepgramChannel {
    #[serde(default)]
    alternatives: Vec<DeepgramAlternative>,
}

#[derive(Debug, Deserialize)]
struct DeepgramAlternative {
    #[serde(default)]
    transcript: String,
}

#[derive(Debug, Deserialize)]
struct DeepgramError {
    err_msg: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SpeechClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

fn language_code(language: &str) -> &'static str {
    if language.trim().eq_ignore_ascii_case("hindi") {
        "hi"
    } else {
        "en"
    }
}

impl SpeechClient {
    pub fn new(http: reqwest::Client, config: &Config) -> Self {
        SpeechClient {
            http,
            base_url: config.deepgram_base_url.trim_end_matches('/').to_string(),
            api_key: config.deepgram_api_key.clone(),
        }
    }

    /// Transcribes one recording; an empty string when nothing was heard.
    pub async fn transcribe(&self, audio: Vec<u8>, content_type: &str, language: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or_else(|| Error::Speech("DEEPGRAM_API_KEY is not configured".to_string()))?;

        let response = self
            .http
            .post(format!("{}/listen", self.base_url))
            .query(&[
                ("language", language_code(language)),
                ("punctuate", "true"),
                ("model", "nova-2"),
            ])
            .header(reqwest::header::AUTHORIZATION, format!("Token {api_key}"))
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(audio)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<DeepgramError>(&body)
                .ok()
                .and_then(|e| e.err_msg)
                .unwrap_or_else(|| "Deepgram API error".to_string());
            return Err(Error::Speech(message));
        }

        let parsed: DeepgramResponse = serde_json::from_str(&body)?;
        let transcript = parsed
            .results
            .and_then(|r| r.channels.into_iter().next())
            .and_then(|c| c.alternatives.into_iter().next())
            .map(|a| a.transcript)
            .unwrap_or_default();

        Ok(transcript)
    }
}

pub async fn speech_to_text_handler(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> std::result::Result<Json<Value>, ApiError> {
    let mut audio: Option<(Vec<u8>, String)> = None;
    let mut language = "hindi".to_string();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Invalid form data: {e}")))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("audio") => {
                let content_type = field.content_type().unwrap_or("audio/webm").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid audio upload: {e}")))?;
                audio = Some((bytes.to_vec(), content_type));
            }
            Some("language") => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Invalid language field: {e}")))?;
                if !text.trim().is_empty() {
                    language = text;
                }
            }
            _ => {}
        }
    }

    let (audio, content_type) = audio
        .filter(|(bytes, _)| !bytes.is_empty())
        .ok_or_else(|| ApiError::BadRequest("No audio provided".to_string()))?;

    tracing::info!(bytes = audio.len(), %language, "🎙️ transcribing audio");
    let transcript = state.speech.transcribe(audio, &content_type, &language).await?;
    tracing::info!(chars = transcript.len(), "✅ transcription done");

    Ok(Json(json!({ "success": true, "transcript": transcript })))
}

// Slot filling

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoiceRequest {
    #[serde(default)]
    pub input: String,
    #[validate(range(min = 0, max = 5))]
    pub stage: u8,
    #[serde(default)]
    pub collected_data: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SlotExtraction {
    #[serde(default)]
    extracted_data: Option<Map<String, Value>>,
    #[serde(default, deserialize_with = "lenient_string")]
    response: String,
    #[serde(default)]
    next_stage: Option<u8>,
    #[serde(default)]
    complete: Option<bool>,
}

/// Overlays freshly extracted slots; nulls never erase a collected value.
pub fn merge_slots(collected: &mut Map<String, Value>, extracted: &Map<String, Value>) {
    for (key, value) in extracted {
        if !value.is_null() {
            collected.insert(key.clone(), value.clone());
        }
    }
}

pub fn compose_reply(reply: &str, next_stage: u8, complete: bool) -> String {
    let follow_up = if complete {
        Some(CLOSING)
    } else {
        stage_question(next_stage)
    };

    match follow_up {
        Some(text) if reply.trim().is_empty() => text.to_string(),
        Some(text) => format!("{} {}", reply.trim_end(), text),
        None => reply.to_string(),
    }
}

fn apology(error: impl std::fmt::Display) -> Response {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "success": false, "response": APOLOGY, "error": error.to_string() })),
    )
        .into_response()
}

pub async fn voice_assistant_handler(
    State(state): State<AppState>,
    Json(request): Json<VoiceRequest>,
) -> Response {
    if let Err(errors) = request.validate() {
        return ApiError::from(errors).into_response();
    }

    tracing::info!(stage = request.stage, input = %request.input, "🎤 voice input");

    let collected = Value::Object(request.collected_data.clone());
    let prompt = prompts::voice_extraction(&request.input, request.stage, &collected);

    let raw = match state.llm.complete(&prompt).await {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!(error = %e, "❌ voice extraction call failed");
            return apology(e);
        }
    };

    let extraction: SlotExtraction = match parse_json(&raw, JsonShape::Object) {
        Ok(extraction) => extraction,
        Err(e) => {
            tracing::error!(error = %e, raw = %raw, "❌ voice extraction unparseable");
            return apology(e);
        }
    };

    let next_stage = extraction.next_stage.unwrap_or(request.stage + 1);
    let complete = extraction.complete.unwrap_or(request.stage >= LAST_STAGE);
    let extracted = extraction.extracted_data.unwrap_or_default();

    let mut collected = request.collected_data;
    merge_slots(&mut collected, &extracted);

    Json(json!({
        "success": true,
        "response": compose_reply(&extraction.response, next_stage, complete),
        "extractedData": extracted,
        "nextStage": next_stage,
        "complete": complete,
        "collectedData": collected,
    }))
    .into_response()
}

// Resolution

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveRequest {
    #[serde(default)]
    pub collected_data: Map<String, Value>,
}

/// Whatever could be resolved from the spoken slots.
#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDraft {
    pub start_location: Option<Location>,
    pub destination: Option<Location>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub travelers: Option<Travelers>,
    pub budget: Option<Budget>,
    pub transport: Option<TransportMode>,
}

impl TripDraft {
    pub fn is_ready(&self) -> bool {
        self.start_location.is_some()
            && self.destination.is_some()
            && self.start_date.is_some()
            && self.end_date.is_some()
    }
}

fn slot_text<'a>(slots: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    slots
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn slot_choice<T: serde::de::DeserializeOwned>(
    slots: &Map<String, Value>,
    key: &str,
    warnings: &mut Vec<String>,
) -> Option<T> {
    let text = slot_text(slots, key)?;
    // Accept "moderate" as readily as "Moderate".
    let mut chars = text.chars();
    let normalized: String = chars
        .next()
        .map(|first| first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect())
        .unwrap_or_default();

    match serde_json::from_value(Value::String(normalized)) {
        Ok(choice) => Some(choice),
        Err(_) => {
            warnings.push(format!("Unrecognised {key}: {text}"));
            None
        }
    }
}

fn slot_date(slots: &Map<String, Value>, key: &str, warnings: &mut Vec<String>) -> Option<String> {
    let text = slot_text(slots, key)?;
    match parse_trip_date(text) {
        Some(date) => Some(date.format("%Y-%m-%d").to_string()),
        None => {
            warnings.push(format!("Unrecognised {key}: {text}"));
            None
        }
    }
}

async fn resolve_place(
    state: &AppState,
    slots: &Map<String, Value>,
    key: &str,
) -> (Option<Location>, Option<String>) {
    let Some(name) = slot_text(slots, key) else {
        return (None, Some(format!("Missing {key}")));
    };

    match state.geocoder.search(name).await {
        Ok(Some(location)) => (Some(location), None),
        Ok(None) => (None, Some(format!("Could not find {key}: {name}"))),
        Err(e) => {
            tracing::warn!(slot = key, %name, error = %e, "⚠️ slot geocoding failed");
            (None, Some(format!("Could not look up {key}: {name}")))
        }
    }
}

pub async fn resolve_handler(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Json<Value> {
    let slots = request.collected_data;

    let ((start_location, start_warning), (destination, destination_warning)) = tokio::join!(
        resolve_place(&state, &slots, "startLocation"),
        resolve_place(&state, &slots, "destination"),
    );

    let mut warnings: Vec<String> = [start_warning, destination_warning].into_iter().flatten().collect();

    let draft = TripDraft {
        start_location,
        destination,
        start_date: slot_date(&slots, "startDate", &mut warnings),
        end_date: slot_date(&slots, "endDate", &mut warnings),
        travelers: slot_choice(&slots, "travelers", &mut warnings),
        budget: slot_choice(&slots, "budget", &mut warnings),
        transport: slot_choice(&slots, "transport", &mut warnings),
    };

    let ready = draft.is_ready();
    tracing::info!(ready, warnings = warnings.len(), "🧭 voice slots resolved");

    Json(json!({
        "success": true,
        "tripData": draft,
        "warnings": warnings,
        "ready": ready,
    }))
}
