//! Chat-completion client for an OpenAI-compatible provider.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::prompts::{Prompt, Sampling};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: MessageContent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text { text: String },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageUrl {
    pub url: String,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

impl ChatMessage {
    fn system(text: &str) -> Self {
        ChatMessage {
            role: "system".to_string(),
            content: MessageContent::Text(text.to_string()),
        }
    }

    fn user(text: String) -> Self {
        ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Text(text),
        }
    }
}

/// Builds a `data:` URL the vision endpoint accepts inline.
pub fn image_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{};base64,{}", mime, STANDARD.encode(bytes))
}

#[derive(Debug, Clone)]
pub struct LlmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
}

impl LlmClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        LlmClient {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    /// Same provider and credentials, different model.
    pub fn with_model(&self, model: impl Into<String>) -> Self {
        LlmClient {
            model: model.into(),
            ..self.clone()
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn complete(&self, prompt: &Prompt) -> Result<String> {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = prompt.system {
            messages.push(ChatMessage::system(system));
        }
        messages.push(ChatMessage::user(prompt.user.clone()));

        self.send(messages, prompt.sampling).await
    }

    pub async fn complete_with_image(&self, prompt: &Prompt, mime: &str, image: &[u8]) -> Result<String> {
        let message = ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompt.user.clone(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image_data_url(mime, image),
                    },
                },
            ]),
        };

        self.send(vec![message], prompt.sampling).await
    }

    async fn send(&self, messages: Vec<ChatMessage>, sampling: Sampling) -> Result<String> {
        let request = ChatRequest {
            model: &self.model,
            messages,
            temperature: sampling.temperature,
            max_tokens: sampling.max_tokens,
        };

        tracing::debug!(model = %self.model, max_tokens = sampling.max_tokens, "🚀 calling LLM");

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("{status}: {error_text}")));
        }

        let parsed: ChatResponse = response.json().await?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| Error::Llm("No response from AI".to_string()))?
            .message
            .content
            .unwrap_or_default();

        tracing::debug!(model = %self.model, chars = content.len(), "📦 LLM reply received");
        Ok(content)
    }
}
