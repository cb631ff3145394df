//! AI insight generation
//!
//! Sends the decision record to a chat-completion provider and turns the
//! reply into an `AiInsight`. The record is only ever read here; nothing the
//! model says can change a verdict.

mod client;
mod parse;
mod prompts;
pub mod provider;

pub use client::{ChatProvider, ChatRequest, OpenAiClient, ProviderFuture};
pub use parse::parse_insight;
pub use prompts::{insight_user_prompt, INSIGHT_SYSTEM};
pub use provider::{select_provider, ProviderKind, ProviderSettings};

use crate::error::InsightError;
use crate::model::{AiInsight, AnalysisOutput};
use tracing::debug;

/// Pinned for reproducible replies
const INSIGHT_TEMPERATURE: f32 = 0.0;

pub struct InsightGenerator<P> {
    provider: P,
    model: String,
}

impl InsightGenerator<OpenAiClient> {
    pub fn from_settings(settings: &ProviderSettings) -> Result<Self, InsightError> {
        Ok(Self::new(OpenAiClient::new(settings)?, settings.model.clone()))
    }
}

impl<P: ChatProvider> InsightGenerator<P> {
    pub fn new(provider: P, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_insight(
        &self,
        output: &AnalysisOutput,
    ) -> Result<AiInsight, InsightError> {
        let user = insight_user_prompt(output).map_err(|e| InsightError::Prompt(e.to_string()))?;
        let request = ChatRequest {
            model: self.model.clone(),
            system: INSIGHT_SYSTEM.to_string(),
            user,
            temperature: INSIGHT_TEMPERATURE,
        };

        let reply = self.provider.complete(&request).await?;
        debug!(
            reply_chars = reply.as_ref().map_or(0, String::len),
            "parsing insight reply"
        );
        parse_insight(reply.as_deref())
    }
}
