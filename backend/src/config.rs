use std::env;

use crate::error::{Error, Result};

/// Runtime settings, read once from the environment at boot.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,

    pub llm_api_key: String,
    pub llm_base_url: String,
    pub llm_model: String,
    pub vision_model: String,

    pub deepgram_api_key: Option<String>,
    pub deepgram_base_url: String,

    pub hf_token: Option<String>,
    pub hf_base_url: String,
    pub caption_model: String,
    pub landmark_model: String,

    pub geoapify_api_key: Option<String>,
    pub geoapify_base_url: String,
    pub nominatim_base_url: String,
    pub user_agent: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
        let port = port
            .parse::<u16>()
            .map_err(|e| Error::Config(format!("PORT '{port}' is not a valid port: {e}")))?;

        Ok(Config {
            database_url: required("DATABASE_URL")?,
            port,
            jwt_secret: env::var("JWT_SECRET")
                .or_else(|_| env::var("NEXTAUTH_SECRET"))
                .map_err(|_| Error::Config("JWT_SECRET environment variable must be set".to_string()))?,

            llm_api_key: required("GROQ_API_KEY")?,
            llm_base_url: or_default("LLM_BASE_URL", "https://api.groq.com/openai/v1"),
            llm_model: or_default("LLM_MODEL", "llama-3.3-70b-versatile"),
            vision_model: or_default("VISION_MODEL", "llama-3.2-11b-vision-preview"),

            deepgram_api_key: optional("DEEPGRAM_API_KEY"),
            deepgram_base_url: or_default("DEEPGRAM_BASE_URL", "https://api.deepgram.com/v1"),

            hf_token: optional("HF_TOKEN"),
            hf_base_url: or_default("HF_BASE_URL", "https://api-inference.huggingface.co/models"),
            caption_model: or_default("CAPTION_MODEL", "Salesforce/blip-image-captioning-large"),
            landmark_model: or_default("LANDMARK_MODEL", "Qwen/Qwen2.5-72B-Instruct"),

            geoapify_api_key: optional("GEOAPIFY_API_KEY"),
            geoapify_base_url: or_default("GEOAPIFY_BASE_URL", "https://api.geoapify.com/v1"),
            nominatim_base_url: or_default("NOMINATIM_BASE_URL", "https://nominatim.openstreetmap.org"),
            user_agent: or_default("HTTP_USER_AGENT", "SmartTripPlanner/1.0 contact@example.com"),
        })
    }
}

fn required(key: &str) -> Result<String> {
    env::var(key).map_err(|_| Error::Config(format!("{key} environment variable must be set")))
}

fn optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn or_default(key: &str, default: &str) -> String {
    optional(key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
impl Config {
    /// Points every collaborator at the same mock server.
    pub fn for_tests(base_url: &str) -> Self {
        Config {
            database_url: "postgres://localhost/test".to_string(),
            port: 0,
            jwt_secret: "test-secret".to_string(),
            llm_api_key: "test-llm-key".to_string(),
            llm_base_url: base_url.to_string(),
            llm_model: "test-model".to_string(),
            vision_model: "test-vision-model".to_string(),
            deepgram_api_key: Some("test-deepgram-key".to_string()),
            deepgram_base_url: base_url.to_string(),
            hf_token: Some("test-hf-token".to_string()),
            hf_base_url: format!("{base_url}/hf"),
            caption_model: "blip".to_string(),
            landmark_model: "qwen".to_string(),
            geoapify_api_key: Some("test-geo-key".to_string()),
            geoapify_base_url: base_url.to_string(),
            nominatim_base_url: format!("{base_url}/osm"),
            user_agent: "SmartTripPlanner/test".to_string(),
        }
    }
}
