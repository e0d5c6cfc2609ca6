// crates/octane-sdk/src/auth.rs
// ============================================================================
// Module: Octane Authentication
// Description: Credentials used to sign in to an Octane server.
// Purpose: Produce sign-in payloads without leaking secrets to logs.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! Octane accepts either a user/password pair or an API access key
//! (`client_id`/`client_secret`). Both post a JSON body to
//! `authentication/sign_in`; the server answers with a session cookie.
//! `Debug` output never contains the secret half of a credential.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde_json::Value;
use serde_json::json;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Client type header name sent with every request when configured.
pub const CLIENT_TYPE_HEADER: &str = "HPECLIENTTYPE";
/// Default client type header value for REST API clients.
pub const DEFAULT_CLIENT_TYPE: &str = "HPE_REST_API_TECH_PREVIEW";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Credentials accepted by the sign-in endpoint.
#[derive(Clone, PartialEq, Eq)]
pub enum Credentials {
    /// Interactive user credentials.
    User {
        /// User name (usually an email address).
        user: String,
        /// User password.
        password: String,
    },
    /// API access key credentials.
    Client {
        /// API client identifier.
        client_id: String,
        /// API client secret.
        client_secret: String,
    },
}

/// Authentication settings for an Octane connection.
///
/// # Invariants
/// - `client_type`, when set, is sent as the [`CLIENT_TYPE_HEADER`] value.
#[derive(Clone, PartialEq, Eq)]
pub struct Authentication {
    /// Sign-in credentials.
    credentials: Credentials,
    /// Optional client type header value.
    client_type: Option<String>,
}

impl Authentication {
    /// Creates user/password authentication with the default client type.
    #[must_use]
    pub fn user(user: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::User {
                user: user.into(),
                password: password.into(),
            },
            client_type: Some(DEFAULT_CLIENT_TYPE.to_string()),
        }
    }

    /// Creates API access key authentication with the default client type.
    #[must_use]
    pub fn client(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::Client {
                client_id: client_id.into(),
                client_secret: client_secret.into(),
            },
            client_type: Some(DEFAULT_CLIENT_TYPE.to_string()),
        }
    }

    /// Overrides the client type header value; `None` omits the header.
    #[must_use]
    pub fn with_client_type(mut self, client_type: Option<String>) -> Self {
        self.client_type = client_type;
        self
    }

    /// Returns the credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the client type header value, if any.
    #[must_use]
    pub fn client_type(&self) -> Option<&str> {
        self.client_type.as_deref()
    }

    /// Returns the public half of the credentials for log lines.
    #[must_use]
    pub fn principal(&self) -> &str {
        match &self.credentials {
            Credentials::User {
                user, ..
            } => user,
            Credentials::Client {
                client_id, ..
            } => client_id,
        }
    }

    /// Builds the JSON body posted to `authentication/sign_in`.
    #[must_use]
    pub fn sign_in_payload(&self) -> Value {
        match &self.credentials {
            Credentials::User {
                user,
                password,
            } => json!({ "user": user, "password": password }),
            Credentials::Client {
                client_id,
                client_secret,
            } => json!({ "client_id": client_id, "client_secret": client_secret }),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User {
                user, ..
            } => f
                .debug_struct("User")
                .field("user", user)
                .field("password", &"<redacted>")
                .finish(),
            Self::Client {
                client_id, ..
            } => f
                .debug_struct("Client")
                .field("client_id", client_id)
                .field("client_secret", &"<redacted>")
                .finish(),
        }
    }
}

impl fmt::Debug for Authentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Authentication")
            .field("credentials", &self.credentials)
            .field("client_type", &self.client_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::use_debug, reason = "Debug output is the subject under test.")]

    use serde_json::json;

    use super::Authentication;
    use super::DEFAULT_CLIENT_TYPE;

    #[test]
    fn user_payload_uses_user_and_password_keys() {
        let auth = Authentication::user("sa@nga", "Welcome1");
        assert_eq!(auth.sign_in_payload(), json!({"user": "sa@nga", "password": "Welcome1"}));
        assert_eq!(auth.client_type(), Some(DEFAULT_CLIENT_TYPE));
    }

    #[test]
    fn client_payload_uses_client_keys() {
        let auth = Authentication::client("api_key_1", "s3cret");
        assert_eq!(
            auth.sign_in_payload(),
            json!({"client_id": "api_key_1", "client_secret": "s3cret"})
        );
        assert_eq!(auth.principal(), "api_key_1");
    }

    #[test]
    fn debug_redacts_secrets() {
        let auth = Authentication::client("api_key_1", "s3cret").with_client_type(None);
        let rendered = format!("{auth:?}");
        assert!(rendered.contains("api_key_1"));
        assert!(!rendered.contains("s3cret"));
        assert!(rendered.contains("<redacted>"));
    }
}
