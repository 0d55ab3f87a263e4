// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::Deserialize;
use std::fmt;

/// Failure classes call sites pattern-match on instead of sniffing response
/// bodies. Kinds map one-to-one onto the distinct user-facing behaviors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayErrorKind {
    /// No usable session. Treated as logged-out, not as a failure.
    AuthMissing,
    PermissionDenied,
    NotFound,
    /// Too many attempts; the user must wait before retrying.
    RateLimited,
    /// Transport-level failure: the service was never reached.
    Connection,
    /// Anything else the service reported.
    Service,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayError {
    pub kind: GatewayErrorKind,
    pub message: String,
}

impl GatewayError {
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn service(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Service, message)
    }

    pub fn connection(base_url: &str, error: &reqwest::Error) -> Self {
        Self::new(
            GatewayErrorKind::Connection,
            format!("cannot reach {base_url} -- check the network and [service].base_url ({error})"),
        )
    }

    /// Classifies a non-success HTTP response. The body is decoded for a
    /// server-provided message when one exists.
    pub fn from_response(status: u16, body: &str) -> Self {
        let message = extract_service_message(body);
        match status {
            401 => Self::new(
                GatewayErrorKind::AuthMissing,
                message.unwrap_or_else(|| "session missing or expired".to_owned()),
            ),
            403 => Self::new(
                GatewayErrorKind::PermissionDenied,
                message.unwrap_or_else(|| "operation not permitted".to_owned()),
            ),
            404 => Self::new(
                GatewayErrorKind::NotFound,
                message.unwrap_or_else(|| "record not found".to_owned()),
            ),
            429 => Self::new(
                GatewayErrorKind::RateLimited,
                message.unwrap_or_else(|| "too many requests".to_owned()),
            ),
            _ if body.contains("Too Many Requests") => Self::new(
                GatewayErrorKind::RateLimited,
                message.unwrap_or_else(|| "too many requests".to_owned()),
            ),
            _ => Self::new(
                GatewayErrorKind::Service,
                message.unwrap_or_else(|| format!("server returned {status}")),
            ),
        }
    }
}

impl fmt::Display for GatewayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for GatewayError {}

#[derive(Debug, Deserialize)]
struct RestErrorEnvelope {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthErrorEnvelope {
    error_description: Option<String>,
    msg: Option<String>,
}

fn extract_service_message(body: &str) -> Option<String> {
    if let Ok(parsed) = serde_json::from_str::<RestErrorEnvelope>(body)
        && let Some(message) = parsed.message
        && !message.is_empty()
    {
        return Some(message);
    }

    if let Ok(parsed) = serde_json::from_str::<AuthErrorEnvelope>(body) {
        if let Some(description) = parsed.error_description
            && !description.is_empty()
        {
            return Some(description);
        }
        if let Some(msg) = parsed.msg
            && !msg.is_empty()
        {
            return Some(msg);
        }
    }

    if body.len() < 100 && !body.trim().is_empty() && !body.contains('{') {
        return Some(body.trim().to_owned());
    }

    None
}

#[cfg(test)]
mod tests {
    use super::{GatewayError, GatewayErrorKind};

    #[test]
    fn status_codes_map_to_kinds() {
        assert_eq!(
            GatewayError::from_response(401, "").kind,
            GatewayErrorKind::AuthMissing
        );
        assert_eq!(
            GatewayError::from_response(403, "").kind,
            GatewayErrorKind::PermissionDenied
        );
        assert_eq!(
            GatewayError::from_response(404, "").kind,
            GatewayErrorKind::NotFound
        );
        assert_eq!(
            GatewayError::from_response(429, "").kind,
            GatewayErrorKind::RateLimited
        );
        assert_eq!(
            GatewayError::from_response(500, "").kind,
            GatewayErrorKind::Service
        );
    }

    #[test]
    fn rate_limit_detected_from_body_text() {
        let error = GatewayError::from_response(400, "Too Many Requests");
        assert_eq!(error.kind, GatewayErrorKind::RateLimited);
    }

    #[test]
    fn server_message_is_preferred_over_generic_text() {
        let error =
            GatewayError::from_response(403, r#"{"message":"new row violates row-level security"}"#);
        assert_eq!(error.kind, GatewayErrorKind::PermissionDenied);
        assert!(error.message.contains("row-level security"));
    }

    #[test]
    fn auth_error_description_is_extracted() {
        let error = GatewayError::from_response(
            400,
            r#"{"error":"invalid_grant","error_description":"Invalid login credentials"}"#,
        );
        assert_eq!(error.message, "Invalid login credentials");
    }

    #[test]
    fn short_plain_bodies_become_the_message() {
        let error = GatewayError::from_response(502, "bad gateway");
        assert_eq!(error.message, "bad gateway");
        assert_eq!(
            GatewayError::from_response(500, "").message,
            "server returned 500"
        );
    }
}
