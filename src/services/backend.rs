use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};
use reqwest::Client;
use serde_json::Value;

use crate::config::Config;
use crate::error::GatewayError;
use crate::models::response::{AskRequest, BackendResponse, SpeechRequest};

/// HTTP client for the analytics backend.
///
/// Every call carries its own deadline (45 s ask, 5 s health, 15 s speech);
/// a timeout surfaces as a timeout-specific error, never a silent hang. At
/// most one ask request may be in flight: concurrent sends are rejected
/// outright rather than queued.
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
    ask_timeout: Duration,
    health_timeout: Duration,
    speech_timeout: Duration,
    ask_pending: Arc<AtomicBool>,
}

impl BackendClient {
    pub fn new(config: &Config) -> Self {
        Self {
            client: Client::new(),
            base_url: config.backend_base_url.trim_end_matches('/').to_string(),
            ask_timeout: Duration::from_secs(config.ask_timeout_secs),
            health_timeout: Duration::from_secs(config.health_timeout_secs),
            speech_timeout: Duration::from_secs(config.speech_timeout_secs),
            ask_pending: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Send one question to the backend. Rejects immediately with
    /// `RequestPending` while another ask is in flight; the pending flag is
    /// cleared on every exit path, including timeouts.
    pub async fn ask(&self, request: &AskRequest) -> Result<BackendResponse, GatewayError> {
        let _guard = AskGuard::acquire(&self.ask_pending)?;
        info!("Forwarding question to backend: {}", request.question);

        let response = self
            .client
            .post(self.url("/ask"))
            .timeout(self.ask_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.ask_timeout))?;

        if !response.status().is_success() {
            warn!("Backend /ask returned status {}", response.status());
            return Err(GatewayError::Backend(format!(
                "backend returned status {}",
                response.status()
            )));
        }

        response
            .json::<BackendResponse>()
            .await
            .map_err(|e| GatewayError::Backend(format!("unreadable backend response: {}", e)))
    }

    /// Quick backend liveness probe.
    pub async fn health(&self) -> bool {
        match self
            .client
            .get(self.url("/health"))
            .timeout(self.health_timeout)
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                debug!("Backend health check failed: {}", e);
                false
            }
        }
    }

    /// `GET /user/role` passthrough.
    pub async fn user_role(&self) -> Result<Value, GatewayError> {
        let response = self
            .client
            .get(self.url("/user/role"))
            .timeout(self.health_timeout)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.health_timeout))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| GatewayError::Backend(format!("unreadable role response: {}", e)))
    }

    /// `POST /speech/text-to-speech` passthrough; returns raw audio bytes.
    pub async fn text_to_speech(&self, request: &SpeechRequest) -> Result<Vec<u8>, GatewayError> {
        let response = self
            .client
            .post(self.url("/speech/text-to-speech"))
            .timeout(self.speech_timeout)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport_error(e, self.speech_timeout))?;

        if !response.status().is_success() {
            return Err(GatewayError::Backend(format!(
                "speech synthesis failed with status {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Network(e.to_string()))?;
        Ok(bytes.to_vec())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn transport_error(&self, error: reqwest::Error, deadline: Duration) -> GatewayError {
        if error.is_timeout() {
            GatewayError::Timeout(deadline.as_secs())
        } else {
            GatewayError::Network(error.to_string())
        }
    }
}

/// RAII guard for the single-outstanding-ask invariant.
struct AskGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> AskGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Result<Self, GatewayError> {
        if flag.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::RequestPending);
        }
        Ok(Self { flag })
    }
}

impl Drop for AskGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_is_rejected_while_guard_lives() {
        let flag = AtomicBool::new(false);
        let guard = AskGuard::acquire(&flag).unwrap();
        assert!(matches!(
            AskGuard::acquire(&flag),
            Err(GatewayError::RequestPending)
        ));
        drop(guard);
        // Flag is cleared on drop, so a new send is permitted.
        assert!(AskGuard::acquire(&flag).is_ok());
    }

    #[test]
    fn guard_clears_flag_even_when_work_fails() {
        let flag = AtomicBool::new(false);
        let failing = || -> Result<(), GatewayError> {
            let _guard = AskGuard::acquire(&flag)?;
            Err(GatewayError::Timeout(45))
        };
        assert!(failing().is_err());
        assert!(!flag.load(Ordering::SeqCst));
    }
}
