use super::provider::ProviderSettings;
use crate::error::InsightError;
use crate::util::sanitize_api_response;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Fail fast when nothing is listening; the overall limit is the caller's.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// One system + user exchange sent to a chat-completion backend.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatRequest {
    pub model: String,
    pub system: String,
    pub user: String,
    pub temperature: f32,
}

/// Reply content; `None` when the provider returned no message content.
pub type ProviderFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Option<String>, InsightError>> + Send + 'a>>;

/// A generative-text backend. Treated as untrusted: whatever comes back is
/// parsed and validated by the caller.
pub trait ChatProvider: Send + Sync {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> ProviderFuture<'a>;
}

#[derive(Serialize)]
struct WireRequest<'a> {
    model: &'a str,
    messages: Vec<Message<'a>>,
    temperature: f32,
    stream: bool,
}

#[derive(Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: MessageContent,
}

#[derive(Deserialize)]
struct MessageContent {
    /// Null when the model refused or produced nothing
    #[serde(default)]
    content: Option<String>,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiClient {
    http: reqwest::Client,
    url: Url,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(settings: &ProviderSettings) -> Result<Self, InsightError> {
        let base = settings.endpoint.trim_end_matches('/');
        let url = Url::parse(&format!("{}/chat/completions", base)).map_err(|e| {
            InsightError::ProviderUnavailable(format!(
                "invalid endpoint {:?}: {}",
                settings.endpoint, e
            ))
        })?;

        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| {
                InsightError::ProviderUnavailable(format!("failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            http,
            url,
            api_key: settings.api_key.clone(),
        })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    async fn send(&self, request: &ChatRequest) -> Result<Option<String>, InsightError> {
        let body = WireRequest {
            model: &request.model,
            messages: vec![
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            temperature: request.temperature,
            stream: false,
        };

        debug!(
            url = %self.url,
            model = %request.model,
            prompt_chars = request.user.len(),
            "sending insight request"
        );

        let response = self
            .http
            .post(self.url.clone())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                InsightError::ProviderUnavailable(format!("request to {} failed: {}", self.url, e))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            InsightError::ProviderUnavailable(format!("failed to read provider response: {}", e))
        })?;

        if !status.is_success() {
            let message = match status.as_u16() {
                401 | 403 => format!("provider rejected the credential (HTTP {})", status.as_u16()),
                500..=599 => format!(
                    "provider server error ({}). The service may be temporarily unavailable.",
                    status
                ),
                _ => format!("API error {}: {}", status, sanitize_api_response(&text)),
            };
            return Err(InsightError::ProviderUnavailable(message));
        }

        let parsed: ChatResponse = serde_json::from_str(&text).map_err(|e| {
            InsightError::ProviderUnavailable(format!(
                "unexpected provider response ({}): {}",
                e,
                sanitize_api_response(&text)
            ))
        })?;

        debug!(choices = parsed.choices.len(), "insight response received");

        Ok(parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content))
    }
}

impl ChatProvider for OpenAiClient {
    fn complete<'a>(&'a self, request: &'a ChatRequest) -> ProviderFuture<'a> {
        Box::pin(self.send(request))
    }
}
