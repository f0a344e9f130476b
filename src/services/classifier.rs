use log::warn;

use crate::error::GatewayError;
use crate::models::response::{BackendResponse, ANALYTICS_RESULT};
use crate::models::table::AnalyticsTable;
use crate::services::extractor;

/// Semantic kind of a backend response.
#[derive(Debug, Clone, PartialEq)]
pub enum Classification {
    /// Explicit `error` field in the payload, surfaced verbatim.
    Error(String),
    /// `authorized: false`.
    Unauthorized,
    /// Canonical analytics turn with a well-formed table.
    Analytics(AnalyticsTable),
    /// Everything else renders as a plain bubble with the answer text.
    Text(String),
}

/// Classify a raw backend response. First match wins, in this order:
/// error, unauthorized, canonical analytics, text.
///
/// The canonical `message_type` tag dominates: a response without
/// `message_type == "analytics_result"` is text no matter what else it
/// carries, so ordinary answers that happen to mention numbers can never
/// false-positive into a dashboard. Pure and total: malformed `data` degrades
/// to text with the original answer preserved.
pub fn classify(response: &BackendResponse) -> Classification {
    if let Some(error) = &response.error {
        if !error.trim().is_empty() {
            return Classification::Error(error.clone());
        }
    }

    if response.authorized == Some(false) {
        return Classification::Unauthorized;
    }

    if response.message_type.as_deref() == Some(ANALYTICS_RESULT) {
        match response.data.as_ref().and_then(extractor::extract) {
            Some(table) => return Classification::Analytics(table),
            None => {
                let error = GatewayError::MalformedData(
                    "no extractable table in analytics payload".to_string(),
                );
                warn!("{}, degrading to text", error);
            }
        }
    }

    Classification::Text(response.answer.clone().unwrap_or_default())
}
