// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared error taxonomy primitives. Each crate still defines its own
//! `thiserror` enum for its own concerns; this module holds only the
//! classification shared across the gateway, tools, and engine crates so
//! error-class decisions (retry vs. not) stay consistent.

use serde::{Deserialize, Serialize};

/// How an error should be treated by a retrying caller, per the taxonomy in
/// the error handling design: transient errors are retried by the caller,
/// auth errors get one refresh-then-retry, permanent errors are raised
/// immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorClass {
    Connection,
    Server,
    RateLimit,
    Auth,
    Permanent,
}

impl ErrorClass {
    /// Connection and auth errors never trigger a fallback model attempt:
    /// same network reach / same credentials would fail identically
    /// against a fallback (testable property 7).
    pub fn breaks_fallback_chain(self) -> bool {
        matches!(self, ErrorClass::Connection | ErrorClass::Auth)
    }

    pub fn is_retryable_at_gateway(self) -> bool {
        matches!(
            self,
            ErrorClass::Connection | ErrorClass::Server | ErrorClass::RateLimit
        )
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
