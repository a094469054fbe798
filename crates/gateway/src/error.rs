// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Gateway error type and the classification of raw transport failures into
//! [`forge_core::ErrorClass`].

use forge_core::ErrorClass;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("http transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("response decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("backend returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
        class: ErrorClass,
        retry_after_secs: Option<u64>,
    },

    #[error("token store error: {0}")]
    TokenStore(String),

    #[error("stream framing error: {0}")]
    Stream(String),

    #[error("all models exhausted: every circuit (primary and fallbacks) is open")]
    AllModelsExhausted,

    #[error("retry budget of {budget_secs}s exhausted for class {class:?}")]
    RetryBudgetExhausted { class: ErrorClass, budget_secs: u64 },

    #[error("stream aborted")]
    Aborted,
}

impl GatewayError {
    /// Best-effort error classification for this error, used to decide
    /// retry/fallback behavior at the call site.
    pub fn class(&self) -> ErrorClass {
        match self {
            GatewayError::Status { class, .. } => *class,
            GatewayError::Http(e) if e.is_connect() || e.is_timeout() => ErrorClass::Connection,
            GatewayError::Http(_) => ErrorClass::Server,
            GatewayError::Decode(_) => ErrorClass::Permanent,
            GatewayError::TokenStore(_) => ErrorClass::Permanent,
            GatewayError::Stream(_) => ErrorClass::Server,
            GatewayError::AllModelsExhausted => ErrorClass::Permanent,
            GatewayError::RetryBudgetExhausted { class, .. } => *class,
            GatewayError::Aborted => ErrorClass::Permanent,
        }
    }

    /// The `Retry-After` value observed on the response, when any.
    pub fn retry_after_secs(&self) -> Option<u64> {
        match self {
            GatewayError::Status { retry_after_secs, .. } => *retry_after_secs,
            _ => None,
        }
    }
}

/// Classify an HTTP status code and optional `Retry-After` header per the
/// retry policy table: 401/403 is auth, 429 is rate_limit, 5xx and read
/// timeouts are server, everything else 4xx is permanent.
pub fn classify_status(status: u16) -> ErrorClass {
    match status {
        401 | 403 => ErrorClass::Auth,
        429 => ErrorClass::RateLimit,
        500..=599 => ErrorClass::Server,
        _ => ErrorClass::Permanent,
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
