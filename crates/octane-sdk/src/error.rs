// crates/octane-sdk/src/error.rs
// ============================================================================
// Module: Octane Errors
// Description: Error taxonomy shared by every Octane SDK operation.
// Purpose: Map transport, authentication, and server failures to one type.
// Dependencies: serde, thiserror
// ============================================================================

//! ## Overview
//! [`OctaneError`] is returned by every fallible SDK call. Server failures
//! carry the Octane error body fields when the server supplied them.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Error Types
// ============================================================================

/// Octane SDK errors.
///
/// # Invariants
/// - Variants are stable for caller error mapping and tests.
/// - String payloads may include untrusted server text.
#[derive(Debug, Error)]
pub enum OctaneError {
    /// Client configuration error.
    #[error("octane config error: {0}")]
    Config(String),
    /// Transport-level failure (connect, timeout, I/O).
    #[error("octane transport error: {0}")]
    Transport(String),
    /// Sign-in or sign-out failure.
    #[error("octane authentication error: {0}")]
    Authentication(String),
    /// Non-success response from the server.
    #[error("octane server error (http {status}): {description}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Octane error code, when the body carried one.
        code: Option<String>,
        /// Server-provided description or a body preview.
        description: String,
    },
    /// JSON serialization or parsing error.
    #[error("octane json error: {0}")]
    Json(String),
    /// Response size exceeds limits.
    #[error("octane response exceeds size limit ({actual} > {limit})")]
    ResponseTooLarge {
        /// Actual size in bytes.
        actual: usize,
        /// Maximum size in bytes.
        limit: usize,
    },
    /// Response did not match the expected REST shape.
    #[error("octane protocol error: {0}")]
    Protocol(String),
}

impl OctaneError {
    /// Builds a server error from a status code and a raw response body.
    ///
    /// Octane error bodies (`error_code`, `description`) are decoded when
    /// present; otherwise the trimmed body text becomes the description.
    #[must_use]
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        if let Ok(parsed) = serde_json::from_slice::<ServerErrorBody>(body)
            && let Some(description) = parsed.description
        {
            return Self::Server {
                status,
                code: parsed.error_code,
                description,
            };
        }
        let preview = String::from_utf8_lossy(body);
        let preview = preview.trim();
        let description = if preview.is_empty() {
            format!("http status {status}")
        } else {
            preview.chars().take(MAX_ERROR_PREVIEW_CHARS).collect()
        };
        Self::Server {
            status,
            code: None,
            description,
        }
    }

    /// Returns the HTTP status when this is a server error.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Server {
                status, ..
            } => Some(*status),
            _ => None,
        }
    }
}

/// Maximum characters of a non-JSON error body kept in the description.
const MAX_ERROR_PREVIEW_CHARS: usize = 512;

/// Octane REST error body.
#[derive(Debug, Deserialize)]
struct ServerErrorBody {
    /// Machine-readable error code.
    error_code: Option<String>,
    /// Human-readable description.
    description: Option<String>,
}

#[cfg(test)]
mod tests {
    #![allow(
        clippy::panic,
        clippy::unwrap_used,
        clippy::expect_used,
        reason = "Test-only panic-based assertions are permitted."
    )]

    use super::OctaneError;

    #[test]
    fn server_error_decodes_octane_body() {
        let body = br#"{"error_code":"platform.entity_not_found","description":"not found","correlation_id":"x"}"#;
        let err = OctaneError::from_response(404, body);
        match err {
            OctaneError::Server {
                status,
                code,
                description,
            } => {
                assert_eq!(status, 404);
                assert_eq!(code.as_deref(), Some("platform.entity_not_found"));
                assert_eq!(description, "not found");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn server_error_falls_back_to_body_preview() {
        let err = OctaneError::from_response(502, b"  bad gateway \n");
        assert_eq!(err.status(), Some(502));
        assert_eq!(err.to_string(), "octane server error (http 502): bad gateway");
    }

    #[test]
    fn server_error_with_empty_body_uses_status() {
        let err = OctaneError::from_response(500, b"");
        assert_eq!(err.to_string(), "octane server error (http 500): http status 500");
    }
}
