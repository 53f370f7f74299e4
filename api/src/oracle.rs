//! The oracle is the external generative text/vision model. It is treated as
//! a black box: a structured conversation goes in, raw text comes out. The
//! trait seam exists so callers can swap in retry/backoff wrappers (or test
//! doubles) without touching the parsing or classification layers.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// An image already converted to its transport encoding, ready to be
/// attached to a request.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// MIME type of the underlying bytes (e.g. "image/jpeg")
    pub media_type: String,
    /// Base64 payload
    pub data: String,
}

impl EncodedImage {
    /// Render as a data URL, the form vision-capable chat APIs accept.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.media_type, self.data)
    }
}

/// One structured conversation turn sent to the oracle.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    pub system: String,
    pub user: String,
    pub image: Option<EncodedImage>,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("oracle transport failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("oracle returned status {0}")]
    Status(reqwest::StatusCode),
    #[error("oracle reply carried no content")]
    EmptyReply,
}

/// Boundary to the generative model. Synchronous request/response semantics;
/// the call may fail with a transport or timeout error, and may take the
/// bulk of a request's wall-clock time.
#[async_trait]
pub trait OracleClient: Send + Sync {
    async fn send(&self, request: OracleRequest) -> Result<String, OracleError>;
}

/// Settings for the production oracle, read from the environment in `main`.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

/// Production client speaking the OpenAI-compatible chat-completions
/// protocol (Groq and friends). The HTTP client carries a hard timeout so a
/// stuck oracle resolves to an error instead of hanging the caller.
pub struct ChatOracle {
    http: reqwest::Client,
    settings: OracleSettings,
}

impl ChatOracle {
    pub fn new(settings: OracleSettings) -> Self {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .expect("failed to build oracle HTTP client");
        ChatOracle { http, settings }
    }

    fn request_body(&self, request: &OracleRequest) -> serde_json::Value {
        // With an image attached the user content becomes a multi-part array
        // (text + image_url); plain text otherwise.
        let user_content = match &request.image {
            Some(image) => json!([
                { "type": "text", "text": request.user },
                { "type": "image_url", "image_url": { "url": image.to_data_url() } },
            ]),
            None => json!(request.user),
        };

        json!({
            "model": self.settings.model,
            "messages": [
                { "role": "system", "content": request.system },
                { "role": "user", "content": user_content },
            ],
        })
    }
}

#[async_trait]
impl OracleClient for ChatOracle {
    async fn send(&self, request: OracleRequest) -> Result<String, OracleError> {
        let url = format!("{}/chat/completions", self.settings.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.settings.api_key)
            .json(&self.request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(%status, "oracle returned non-success status");
            return Err(OracleError::Status(status));
        }

        let completion = response.json::<ChatCompletionResponse>().await?;
        reply_text(completion)
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Pull the reply text out of a completion, trimmed. An empty choice list or
/// blank content is an error; downstream parsing needs actual text.
fn reply_text(completion: ChatCompletionResponse) -> Result<String, OracleError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|content| content.trim().to_string())
        .filter(|content| !content.is_empty())
        .ok_or(OracleError::EmptyReply)
}

#[cfg(test)]
mod tests {
    use super::{ChatChoice, ChatCompletionResponse, ChatMessage, OracleError, reply_text};

    fn completion(contents: &[Option<&str>]) -> ChatCompletionResponse {
        ChatCompletionResponse {
            choices: contents
                .iter()
                .map(|content| ChatChoice {
                    message: ChatMessage {
                        content: content.map(str::to_string),
                    },
                })
                .collect(),
        }
    }

    #[test]
    fn reply_text_takes_first_choice_trimmed() {
        let text = reply_text(completion(&[Some("  {\"risk_score\": 0.2}\n")]))
            .expect("first choice should be used");
        assert_eq!(text, "{\"risk_score\": 0.2}");
    }

    #[test]
    fn reply_text_rejects_empty_choice_list() {
        let err = reply_text(completion(&[])).expect_err("no choices must be an error");
        assert!(matches!(err, OracleError::EmptyReply));
    }

    #[test]
    fn reply_text_rejects_missing_content() {
        let err = reply_text(completion(&[None])).expect_err("missing content must be an error");
        assert!(matches!(err, OracleError::EmptyReply));
    }

    #[test]
    fn reply_text_rejects_blank_content() {
        let err = reply_text(completion(&[Some("   \n")])).expect_err("blank content");
        assert!(matches!(err, OracleError::EmptyReply));
    }

    #[test]
    fn completion_response_deserializes_wire_shape() {
        let raw = r#"{
            "id": "chatcmpl-123",
            "choices": [
                { "index": 0, "message": { "role": "assistant", "content": "hello" } }
            ],
            "usage": { "total_tokens": 10 }
        }"#;
        let completion: ChatCompletionResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(reply_text(completion).unwrap(), "hello");
    }

    #[test]
    fn encoded_image_renders_data_url() {
        let image = super::EncodedImage {
            media_type: "image/png".to_string(),
            data: "AAAA".to_string(),
        };
        assert_eq!(image.to_data_url(), "data:image/png;base64,AAAA");
    }
}
