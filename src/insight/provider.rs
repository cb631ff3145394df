//! Provider selection
//!
//! Decides which OpenAI-compatible backend the insight step talks to. Built
//! once at startup from the environment and handed to the generator.

use std::fmt;

/// Credential for the hosted API.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";
/// Feature flag that opts into the hosted API.
pub const USE_REMOTE_VAR: &str = "QUALITY_GATE_USE_OPENAI";
/// Model override for the hosted API.
pub const MODEL_VAR: &str = "OPENAI_MODEL";

pub const REMOTE_ENDPOINT: &str = "https://api.openai.com/v1";
pub const DEFAULT_REMOTE_MODEL: &str = "gpt-4o-mini";

/// Ollama's OpenAI-compatible endpoint.
pub const LOCAL_ENDPOINT: &str = "http://localhost:11434/v1";
pub const LOCAL_MODEL: &str = "gpt-oss:20b";
/// Ollama ignores the key but the protocol requires one.
pub const LOCAL_API_KEY: &str = "ollama";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Remote,
    Local,
}

impl ProviderKind {
    pub fn label(&self) -> &'static str {
        match self {
            ProviderKind::Remote => "remote",
            ProviderKind::Local => "local",
        }
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct ProviderSettings {
    pub kind: ProviderKind,
    /// Base URL; `/chat/completions` is appended per request.
    pub endpoint: String,
    pub api_key: String,
    pub model: String,
}

impl fmt::Debug for ProviderSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderSettings")
            .field("kind", &self.kind)
            .field("endpoint", &self.endpoint)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderSettings {
    pub fn local() -> Self {
        Self {
            kind: ProviderKind::Local,
            endpoint: LOCAL_ENDPOINT.to_string(),
            api_key: LOCAL_API_KEY.to_string(),
            model: LOCAL_MODEL.to_string(),
        }
    }

    /// Read the process environment.
    pub fn from_env() -> Self {
        select_provider(|name| std::env::var(name).ok())
    }
}

/// Hosted API only when a credential is present and the flag is on;
/// anything else stays on the local endpoint.
pub fn select_provider<F>(env: F) -> ProviderSettings
where
    F: Fn(&str) -> Option<String>,
{
    let api_key = env(API_KEY_VAR)
        .map(|key| key.trim().to_string())
        .filter(|key| !key.is_empty());
    let remote_enabled = env(USE_REMOTE_VAR).is_some_and(|flag| is_truthy(&flag));

    match api_key {
        Some(api_key) if remote_enabled => ProviderSettings {
            kind: ProviderKind::Remote,
            endpoint: REMOTE_ENDPOINT.to_string(),
            api_key,
            model: env(MODEL_VAR)
                .map(|model| model.trim().to_string())
                .filter(|model| !model.is_empty())
                .unwrap_or_else(|| DEFAULT_REMOTE_MODEL.to_string()),
        },
        _ => ProviderSettings::local(),
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
