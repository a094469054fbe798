// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! TokenData: the OAuth-style credential persisted (encrypted) per provider.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenData {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds since the Unix epoch.
    pub expires_at: u64,
    #[serde(default)]
    pub extra: BTreeMap<String, Value>,
}

impl TokenData {
    pub fn new(access_token: impl Into<String>, expires_at: u64) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: None,
            expires_at,
            extra: BTreeMap::new(),
        }
    }

    pub fn time_to_expiry_secs(&self, now_secs: u64) -> i64 {
        self.expires_at as i64 - now_secs as i64
    }

    /// Whether this token should be refreshed given the refresh margin.
    pub fn needs_refresh(&self, now_secs: u64, margin_secs: u64) -> bool {
        self.time_to_expiry_secs(now_secs) < margin_secs as i64
    }
}

#[cfg(test)]
#[path = "token_tests.rs"]
mod tests;
