use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canonical `message_type` tag for structured analytics payloads.
pub const ANALYTICS_RESULT: &str = "analytics_result";

/// Raw backend payload for one conversational turn.
///
/// Every field is optional by contract: presence is the signal. The classifier
/// decides what the turn actually is; nothing here is trusted beyond its shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackendResponse {
    /// Human-readable answer text. Assumed present whenever the error and
    /// authorization checks pass.
    pub answer: Option<String>,
    /// Canonical tag; `"analytics_result"` signals structured data.
    pub message_type: Option<String>,
    /// Tabular payload in one of the known historical shapes.
    pub data: Option<Value>,
    pub narrative: Option<Narrative>,
    pub analysis: Option<Analysis>,
    /// Legacy pre-built chart configuration, passed through untouched.
    pub visualization: Option<Value>,
    /// Explicit backend opt-in for offering a chart. Independent of `data`.
    pub visualization_available: Option<bool>,
    pub conversation_id: Option<String>,
    pub turn_id: Option<String>,
    pub error: Option<String>,
    pub authorized: Option<bool>,
}

/// Insight-card content attached to an analytics turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Narrative {
    pub title: Option<String>,
    pub summary: Option<String>,
}

/// Key-facts block attached to an analytics turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Analysis {
    pub highest: Option<AnalysisFact>,
    pub lowest: Option<AnalysisFact>,
    pub top_concentration_percent: Option<f64>,
}

/// A single highest/lowest fact: `{category, value, percent}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisFact {
    pub category: Option<String>,
    pub value: Option<Value>,
    pub percent: Option<f64>,
}

/// Request body for `POST /ask`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub question: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_role: Option<String>,
}

/// Request body for `POST /speech/text-to-speech`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechRequest {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slow: Option<bool>,
}

/// Error response for the API.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub status_code: u16,
}
