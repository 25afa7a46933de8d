//! Audit logging for data modifications.
//!
//! Events are emitted on the `audit` tracing target so they can be routed
//! to a separate sink.
//!
//! # Example
//! ```ignore
//! use axum_helpers::audit::{AuditEvent, AuditOutcome};
//!
//! AuditEvent::new(&principal, "user.update", AuditOutcome::Success)
//!     .with_resource(format!("user:{}", id))
//!     .with_headers(&headers)
//!     .log();
//! ```

use crate::auth::Principal;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of an audited action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuditOutcome {
    Success,
    Failure,
}

/// Structured audit event.
///
/// Build with the `with_*` methods, then call [`AuditEvent::log`].
#[derive(Debug, Serialize)]
pub struct AuditEvent {
    /// JWT subject of the caller
    pub subject: String,
    /// Action identifier, e.g. "user.create"
    pub action: String,
    /// Affected resource, e.g. "user:42"
    pub resource: Option<String>,
    pub outcome: AuditOutcome,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub details: Option<serde_json::Value>,
}

impl AuditEvent {
    pub fn new(principal: &Principal, action: impl Into<String>, outcome: AuditOutcome) -> Self {
        Self {
            subject: principal.subject.clone(),
            action: action.into(),
            resource: None,
            outcome,
            ip_address: None,
            user_agent: None,
            timestamp: Utc::now(),
            details: None,
        }
    }

    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Fill client IP and user agent from request headers
    pub fn with_headers(mut self, headers: &HeaderMap) -> Self {
        self.ip_address = extract_ip_from_headers(headers);
        self.user_agent = extract_user_agent(headers);
        self
    }

    pub fn with_details(mut self, details: impl Serialize) -> Self {
        self.details = serde_json::to_value(details).ok();
        self
    }

    pub fn log(self) {
        tracing::info!(
            target: "audit",
            subject = %self.subject,
            action = %self.action,
            resource = self.resource,
            outcome = ?self.outcome,
            ip = self.ip_address,
            user_agent = self.user_agent,
            timestamp = %self.timestamp,
            details = ?self.details,
            "audit event"
        );
    }
}

/// Client IP from `X-Forwarded-For` (first hop) or `X-Real-IP`.
pub fn extract_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(|s| s.to_string())
        })
}

pub fn extract_user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(axum::http::header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}
