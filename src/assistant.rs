//! Chat assistant backend (feature `assistant`).
//!
//! Proxies dashboard questions to an Azure OpenAI chat deployment, grounding
//! the model with a rendered summary of the claims data and the recent event
//! log. Conversation history is bounded to the most recent
//! [`ChatService::MAX_HISTORY_TURNS`] turns; older turns are silently
//! dropped before the request is built.

use chrono::DateTime;
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{info, instrument, warn};

use crate::claims::ClaimsSummary;
use crate::log::LogEvent;

const DEFAULT_API_VERSION: &str = "2024-02-15-preview";

/// Errors from assistant configuration and transport.
#[derive(Debug, Error, Diagnostic)]
pub enum AssistantError {
    #[error("missing environment variable {var}")]
    #[diagnostic(
        code(claimsim::assistant::missing_env),
        help("Set AZURE_OPENAI_ENDPOINT, AZURE_OPENAI_KEY, and AZURE_OPENAI_DEPLOYMENT (a .env file works).")
    )]
    MissingEnv { var: &'static str },

    #[error("chat completion request failed")]
    #[diagnostic(code(claimsim::assistant::http))]
    Http(#[from] reqwest::Error),

    #[error("chat completion returned status {status}")]
    #[diagnostic(code(claimsim::assistant::status))]
    Status { status: u16, body: String },

    #[error("chat completion response had no choices")]
    #[diagnostic(code(claimsim::assistant::empty))]
    EmptyResponse,
}

/// One conversation turn.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: "assistant".to_string(),
            content: content.into(),
        }
    }
}

/// Which view the user is asking about; selects the system prompt.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextKind {
    #[default]
    General,
    Dashboard,
    Document,
}

/// A dashboard chat request with whatever context the view can supply.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub message: String,
    #[serde(default)]
    pub history: Vec<ChatMessage>,
    #[serde(default)]
    pub context: ContextKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claims: Option<ClaimsSummary>,
    #[serde(default)]
    pub events: Vec<LogEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Value>,
}

/// Wire response shape; failures are data, never a panic or a 500.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ChatResponse {
    fn ok(text: String) -> Self {
        Self {
            success: true,
            response: Some(text),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error),
        }
    }
}

/// Azure OpenAI connection settings.
#[derive(Clone, Debug)]
pub struct AssistantConfig {
    /// Base endpoint, e.g. `https://my-resource.openai.azure.com`.
    pub endpoint: String,
    pub api_key: String,
    pub deployment: String,
    pub api_version: String,
}

impl AssistantConfig {
    /// Read settings from the environment, loading `.env` first.
    pub fn from_env() -> Result<Self, AssistantError> {
        let _ = dotenvy::dotenv();
        let var = |name: &'static str| {
            std::env::var(name).map_err(|_| AssistantError::MissingEnv { var: name })
        };
        Ok(Self {
            endpoint: var("AZURE_OPENAI_ENDPOINT")?,
            api_key: var("AZURE_OPENAI_KEY")?,
            deployment: var("AZURE_OPENAI_DEPLOYMENT")?,
            api_version: std::env::var("AZURE_OPENAI_API_VERSION")
                .unwrap_or_else(|_| DEFAULT_API_VERSION.to_string()),
        })
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/openai/deployments/{}/chat/completions?api-version={}",
            self.endpoint.trim_end_matches('/'),
            self.deployment,
            self.api_version
        )
    }
}

/// The assistant client.
pub struct ChatService {
    config: AssistantConfig,
    client: reqwest::Client,
}

impl ChatService {
    /// Conversation turns kept when building a request.
    pub const MAX_HISTORY_TURNS: usize = 20;

    #[must_use]
    pub fn new(config: AssistantConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    /// Answer a dashboard question. Transport and upstream failures come
    /// back as an unsuccessful [`ChatResponse`], never as an error.
    pub async fn chat(&self, request: &ChatRequest) -> ChatResponse {
        match self.complete(request).await {
            Ok(text) => ChatResponse::ok(text),
            Err(e) => {
                warn!(error = %e, "assistant request failed");
                ChatResponse::failed(e.to_string())
            }
        }
    }

    #[instrument(skip_all, fields(context = ?request.context))]
    pub async fn complete(&self, request: &ChatRequest) -> Result<String, AssistantError> {
        let messages = build_messages(request);
        info!(turns = messages.len(), "sending chat completion");

        let response = self
            .client
            .post(self.config.completions_url())
            .header("api-key", &self.config.api_key)
            .json(&json!({
                "messages": messages,
                "max_tokens": 1000,
                "temperature": 0.7,
                "top_p": 0.9,
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AssistantError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: Value = response.json().await?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(AssistantError::EmptyResponse)
    }
}

fn build_messages(request: &ChatRequest) -> Vec<ChatMessage> {
    let mut messages = vec![ChatMessage {
        role: "system".to_string(),
        content: system_prompt(request),
    }];

    let history = &request.history;
    let start = history.len().saturating_sub(ChatService::MAX_HISTORY_TURNS);
    messages.extend(history[start..].iter().cloned());

    messages.push(ChatMessage::user(request.message.clone()));
    messages
}

fn system_prompt(request: &ChatRequest) -> String {
    let mut prompt = match request.context {
        ContextKind::Dashboard => {
            "You are an assistant for an insurance claims intake dashboard. Answer questions \
             about claim volumes, statuses, and the processing pipeline using only the data \
             provided below. Be concise and factual."
                .to_string()
        }
        ContextKind::Document => {
            "You are an assistant helping review an extracted insurance claim document. Answer \
             questions about the document fields provided below. Be concise and factual."
                .to_string()
        }
        ContextKind::General => {
            "You are an assistant for an insurance claims processing demo. Be concise and \
             helpful."
                .to_string()
        }
    };

    if let Some(summary) = &request.claims {
        prompt.push_str("\n\n");
        prompt.push_str(&format_claims_summary(summary));
    }
    if !request.events.is_empty() {
        prompt.push_str("\n\n");
        prompt.push_str(&format_event_log(&request.events));
    }
    if let Some(document) = &request.document {
        prompt.push_str("\n\nExtracted document:\n");
        prompt.push_str(&serde_json::to_string_pretty(document).unwrap_or_default());
    }
    prompt
}

fn format_claims_summary(summary: &ClaimsSummary) -> String {
    let s = &summary.statistics;
    let mut out = format!(
        "Claims data summary:\n\
         - Total claims: {} ({} accepted, {} pending, {} denied)\n\
         - Processed today: {}, this week: {}, this month: {}\n",
        s.total, s.accepted, s.pending, s.denied, s.processed_today, s.processed_week,
        s.processed_month
    );
    if !summary.city_data.is_empty() {
        out.push_str("By city:\n");
        for city in &summary.city_data {
            out.push_str(&format!(
                "- {}: {} total ({} accepted, {} pending, {} denied)\n",
                city.city, city.total, city.accepted, city.pending, city.denied
            ));
        }
    }
    if !summary.recent_claims.is_empty() {
        out.push_str("Recent claims:\n");
        for claim in &summary.recent_claims {
            out.push_str(&format!(
                "- {} / {} / {} / {:.2} {} / submitted {}\n",
                claim.claim_number,
                claim.patient_name,
                claim.city,
                claim.amount,
                claim.currency,
                claim.submitted_date
            ));
        }
    }
    out
}

fn format_event_log(events: &[LogEvent]) -> String {
    let mut out = String::from("Recent simulation events (oldest first):\n");
    for event in events {
        let time = DateTime::from_timestamp_millis(event.timestamp)
            .map(|t| t.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| "??:??:??".to_string());
        let line = match (&event.from_node, &event.reason) {
            (Some(from), Some(reason)) if from != &event.to_node => {
                format!("[{time}] {from} -> {}: {reason}", event.to_node)
            }
            (_, Some(reason)) => format!("[{time}] {}: {reason}", event.to_node),
            (_, None) => format!("[{time}] {}", event.to_node),
        };
        out.push_str(&line);
        out.push('\n');
    }
    out
}
