use std::sync::Arc;

use crate::config::Config;
use crate::database::TripStore;
use crate::geocode::Geocoder;
use crate::llm::LlmClient;
use crate::speech::SpeechClient;
use crate::vision::CaptionClient;

/// Shared handles cloned into every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub llm: LlmClient,
    pub vision: LlmClient,
    /// Caption-to-landmark model on the inference host; absent without a token.
    pub landmark: Option<LlmClient>,
    pub captions: CaptionClient,
    pub speech: SpeechClient,
    pub geocoder: Geocoder,
    pub trips: Arc<dyn TripStore>,
}

impl AppState {
    pub fn new(config: Config, trips: Arc<dyn TripStore>) -> Self {
        let http = reqwest::Client::new();

        let llm = LlmClient::new(
            http.clone(),
            config.llm_base_url.clone(),
            config.llm_api_key.clone(),
            config.llm_model.clone(),
        );
        let vision = llm.with_model(config.vision_model.clone());
        let landmark = config.hf_token.as_ref().map(|token| {
            LlmClient::new(
                http.clone(),
                format!(
                    "{}/{}/v1",
                    config.hf_base_url.trim_end_matches('/'),
                    config.landmark_model
                ),
                token.clone(),
                config.landmark_model.clone(),
            )
        });

        AppState {
            captions: CaptionClient::new(http.clone(), &config),
            speech: SpeechClient::new(http.clone(), &config),
            geocoder: Geocoder::new(http, &config),
            config: Arc::new(config),
            llm,
            vision,
            landmark,
            trips,
        }
    }
}
