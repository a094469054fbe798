// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn classifies_auth_status() {
    assert_eq!(classify_status(401), ErrorClass::Auth);
    assert_eq!(classify_status(403), ErrorClass::Auth);
}

#[test]
fn classifies_rate_limit_status() {
    assert_eq!(classify_status(429), ErrorClass::RateLimit);
}

#[test]
fn classifies_server_status() {
    assert_eq!(classify_status(500), ErrorClass::Server);
    assert_eq!(classify_status(503), ErrorClass::Server);
}

#[test]
fn classifies_other_4xx_as_permanent() {
    assert_eq!(classify_status(400), ErrorClass::Permanent);
    assert_eq!(classify_status(404), ErrorClass::Permanent);
}

#[test]
fn status_error_reports_its_own_class() {
    let err = GatewayError::Status {
        status: 429,
        body: String::new(),
        class: ErrorClass::RateLimit,
        retry_after_secs: Some(30),
    };
    assert_eq!(err.class(), ErrorClass::RateLimit);
    assert_eq!(err.retry_after_secs(), Some(30));
}
