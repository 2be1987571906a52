//! Notification Dispatcher
//!
//! Posts a run summary to the operator webhook and classifies the response
//! into a [`RetryDecision`]. One call is one attempt; the retry loop lives in
//! [`crate::retry`].

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use dag_core::{ChainSummary, NotifyRequest, NotifyResponse, RetryDecision};

use crate::config::WebhookConfig;
use crate::error::{VerifierError, VerifierResult};

/// Error codes that will fail again no matter how often they are retried
const PERMANENT_ERRORS: &[&str] = &[
    "invalid_payload",
    "invalid_json",
    "invalid_arguments",
    "invalid_auth",
    "invalid_token",
    "not_authed",
    "token_revoked",
    "account_inactive",
    "missing_scope",
    "channel_not_found",
    "channel_is_archived",
    "no_text",
    "no_service",
    "no_service_id",
    "no_team",
    "team_disabled",
    "action_prohibited",
    "posting_to_general_channel_denied",
    "user_not_found",
    "msg_too_long",
];

/// Error codes for conditions expected to clear up
const TRANSIENT_ERRORS: &[&str] = &[
    "rate_limited",
    "ratelimited",
    "service_unavailable",
    "temporarily_unavailable",
    "internal_error",
    "fatal_error",
    "request_timeout",
    "timeout",
];

/// What came back from one webhook call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseOutcome {
    /// Nothing came back (connect refused, DNS failure, timeout)
    NoResponse { reason: String },
    /// JSON response body
    Json { status: u16, body: NotifyResponse },
    /// Non-JSON response body
    Text { status: u16, text: String },
    /// The request could not be built
    Unsendable { reason: String },
}

impl ResponseOutcome {
    /// Short description for logs and error reports
    pub fn detail(&self) -> String {
        match self {
            Self::NoResponse { reason } => format!("no response: {}", reason),
            Self::Json { status, body } => match body.error() {
                Some(error) if body.response_metadata.messages.is_empty() => {
                    format!("HTTP {}: {}", status, error)
                }
                Some(error) => format!(
                    "HTTP {}: {} ({})",
                    status,
                    error,
                    body.response_metadata.messages.join("; ")
                ),
                None => format!("HTTP {}: ok={}", status, body.ok),
            },
            Self::Text { status, text } => format!("HTTP {}: {}", status, text.trim()),
            Self::Unsendable { reason } => format!("unsendable: {}", reason),
        }
    }
}

/// Map a webhook outcome to a retry decision
pub fn classify(outcome: &ResponseOutcome) -> RetryDecision {
    match outcome {
        ResponseOutcome::NoResponse { .. } => RetryDecision::RetryImmediate,
        ResponseOutcome::Unsendable { .. } => RetryDecision::NoRetryFailure,
        ResponseOutcome::Json { status, body } => {
            if body.ok {
                RetryDecision::NoRetrySuccess
            } else {
                classify_error(*status, body.error())
            }
        }
        ResponseOutcome::Text { status, text } => {
            let text = text.trim();
            let success = (200..300).contains(status);
            if success && (text.is_empty() || text.eq_ignore_ascii_case("ok")) {
                RetryDecision::NoRetrySuccess
            } else {
                classify_error(*status, (!text.is_empty()).then_some(text))
            }
        }
    }
}

fn classify_error(status: u16, error: Option<&str>) -> RetryDecision {
    let code = error.map(|e| e.to_ascii_lowercase());
    let code = code.as_deref();

    if code.is_some_and(|c| PERMANENT_ERRORS.contains(&c)) {
        return RetryDecision::NoRetryFailure;
    }
    if code.is_some_and(|c| TRANSIENT_ERRORS.contains(&c)) {
        return RetryDecision::RetryWithDelay;
    }

    let too_many_requests = status == StatusCode::TOO_MANY_REQUESTS.as_u16();
    if (400..500).contains(&status) && !too_many_requests {
        RetryDecision::NoRetryFailure
    } else {
        RetryDecision::RetryWithDelay
    }
}

/// Outcome of one delivery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub decision: RetryDecision,
    pub detail: String,
}

impl From<ResponseOutcome> for Attempt {
    fn from(outcome: ResponseOutcome) -> Self {
        Self {
            decision: classify(&outcome),
            detail: outcome.detail(),
        }
    }
}

/// A single-attempt summary sender
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, summary: &ChainSummary) -> Attempt;

    /// Notifier name (for logging)
    fn name(&self) -> &str;
}

/// Webhook notifier
pub struct NotificationDispatcher {
    /// HTTP client
    client: Client,
    /// Webhook URL
    url: String,
}

impl NotificationDispatcher {
    pub fn new(url: &str, timeout: Duration) -> VerifierResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| VerifierError::Network(e.to_string()))?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    /// Build from configuration, `None` when no webhook is set
    pub fn from_config(config: &WebhookConfig) -> VerifierResult<Option<Self>> {
        match config.url.as_deref().map(str::trim) {
            Some(url) if !url.is_empty() => Ok(Some(Self::new(url, config.timeout())?)),
            _ => Ok(None),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Post the summary once and report what came back
    pub async fn send(&self, summary: &ChainSummary) -> ResponseOutcome {
        let request = match NotifyRequest::from_summary(summary) {
            Ok(request) => request,
            Err(e) => {
                return ResponseOutcome::Unsendable {
                    reason: e.to_string(),
                }
            }
        };

        let response = match self.client.post(&self.url).json(&request).send().await {
            Ok(response) => response,
            Err(e) => {
                return ResponseOutcome::NoResponse {
                    reason: e.to_string(),
                }
            }
        };

        let status = response.status().as_u16();
        let text = match response.text().await {
            Ok(text) => text,
            Err(e) => {
                return ResponseOutcome::NoResponse {
                    reason: e.to_string(),
                }
            }
        };

        debug!(status, body = %text, "Webhook response");
        match serde_json::from_str::<NotifyResponse>(&text) {
            Ok(body) => ResponseOutcome::Json { status, body },
            Err(_) => ResponseOutcome::Text { status, text },
        }
    }

    /// Single delivery attempt
    pub async fn dispatch(&self, summary: &ChainSummary) -> RetryDecision {
        classify(&self.send(summary).await)
    }
}

#[async_trait]
impl Notifier for NotificationDispatcher {
    async fn notify(&self, summary: &ChainSummary) -> Attempt {
        self.send(summary).await.into()
    }

    fn name(&self) -> &str {
        "webhook"
    }
}
