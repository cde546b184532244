//! OpenAI chat completions labeler.
//!
//! ```rust,ignore
//! use conclass_labeler::{Labeler, OpenAILabeler, OpenAILabelerConfig};
//!
//! let labeler = OpenAILabeler::new(OpenAILabelerConfig {
//!     api_key: "sk-xxx".to_string(),
//!     ..Default::default()
//! });
//! let label = labeler.label("thanks so much for the help!").await?;
//! ```

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::LabelerError;
use crate::labeler::{Labeler, normalize_label};
use crate::prompt::{DEFAULT_SYSTEM_PROMPT, user_prompt};
use crate::retry::RetryPolicy;

/// OpenAI labeler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAILabelerConfig {
    pub api_key: String,
    /// Base URL for the API (default: https://api.openai.com/v1)
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
    /// Omitted from the request when `None`; some models reject it.
    #[serde(default = "default_temperature")]
    pub temperature: Option<f32>,
    #[serde(default = "default_max_completion_tokens")]
    pub max_completion_tokens: u32,
    #[serde(default)]
    pub retry: RetryPolicy,
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_temperature() -> Option<f32> {
    Some(0.3)
}

fn default_max_completion_tokens() -> u32 {
    50
}

impl Default for OpenAILabelerConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            model: default_model(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_completion_tokens: default_max_completion_tokens(),
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    max_completion_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

/// [`Labeler`] backed by OpenAI chat completions (or any compatible
/// endpoint via `base_url`).
pub struct OpenAILabeler {
    client: Client,
    config: OpenAILabelerConfig,
}

impl OpenAILabeler {
    pub fn new(config: OpenAILabelerConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn config(&self) -> &OpenAILabelerConfig {
        &self.config
    }

    fn request<'a>(&'a self, user: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &self.config.system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: user,
                },
            ],
            temperature: self.config.temperature,
            max_completion_tokens: self.config.max_completion_tokens,
        }
    }

    async fn complete_once(&self, body: &ChatRequest<'_>) -> Result<String, LabelerError> {
        let url = format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'));
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .await
            .map_err(|e| LabelerError::Transport(e.to_string()))?;
        if !status.is_success() {
            return Err(LabelerError::Api {
                status: status.as_u16(),
                body: text,
            });
        }
        parse_completion(&text)
    }
}

/// Extracts and normalizes the first choice's content.
fn parse_completion(body: &str) -> Result<String, LabelerError> {
    let resp: ChatResponse =
        serde_json::from_str(body).map_err(|e| LabelerError::Decode(e.to_string()))?;
    let content = resp
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .ok_or(LabelerError::EmptyResponse)?;
    Ok(normalize_label(&content))
}

#[async_trait]
impl Labeler for OpenAILabeler {
    async fn label(&self, text: &str) -> Result<String, LabelerError> {
        let user = user_prompt(text);
        let body = self.request(&user);
        let body = &body;
        let label = self
            .config
            .retry
            .run("labeler", move || self.complete_once(body))
            .await?;
        debug!("labeler: {} -> {label:?}", self.config.model);
        Ok(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let cfg: OpenAILabelerConfig = serde_json::from_str(r#"{"api_key": "k"}"#).unwrap();
        assert_eq!(cfg.model, "gpt-4o-mini");
        assert_eq!(cfg.temperature, Some(0.3));
        assert_eq!(cfg.max_completion_tokens, 50);
        assert_eq!(cfg.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(cfg.retry.max_retries, 3);
    }

    #[test]
    fn request_shape() {
        let labeler = OpenAILabeler::new(OpenAILabelerConfig::default());
        let user = user_prompt("hello there");
        let v = serde_json::to_value(labeler.request(&user)).unwrap();
        assert_eq!(v["model"], "gpt-4o-mini");
        assert_eq!(v["messages"][0]["role"], "system");
        assert_eq!(v["messages"][1]["content"], "Text to classify: \"hello there\"");
        assert_eq!(v["max_completion_tokens"], 50);
        assert!(v.get("temperature").is_some());
    }

    #[test]
    fn temperature_is_omitted_when_unset() {
        let labeler = OpenAILabeler::new(OpenAILabelerConfig {
            temperature: None,
            ..Default::default()
        });
        let v = serde_json::to_value(labeler.request("x")).unwrap();
        assert!(v.get("temperature").is_none());
    }

    #[test]
    fn parse_normalizes_content() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"  Greeting\n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "greeting");
    }

    #[test]
    fn parse_without_choices_is_empty_response() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(LabelerError::EmptyResponse)
        ));
        assert!(matches!(
            parse_completion(r#"{"choices":[{"message":{"content":null}}]}"#),
            Err(LabelerError::EmptyResponse)
        ));
    }

    #[test]
    fn parse_garbage_is_decode_error() {
        assert!(matches!(parse_completion("<html>"), Err(LabelerError::Decode(_))));
    }
}
