// crates/octane-sdk/src/connection.rs
// ============================================================================
// Module: Octane Connection
// Description: Authenticated server connection that hands out context builders.
// Purpose: Own the transport and bind builders to the server URL.
// Dependencies: tracing
// ============================================================================

//! ## Overview
//! [`OctaneConnection`] is the entry point of the SDK. It owns the server URL
//! and a shared [`OctaneHttpClient`]; every [`OctaneBuilder`] it returns uses
//! the same transport, so all contexts share one session.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use crate::auth::Authentication;
use crate::context::OctaneBuilder;
use crate::error::OctaneError;
use crate::http::HttpClientConfig;
use crate::http::OctaneHttpClient;
use crate::http::ReqwestHttpClient;

// ============================================================================
// SECTION: Connection
// ============================================================================

/// Connection to one Octane server.
#[derive(Clone)]
pub struct OctaneConnection {
    /// Server URL without trailing slash.
    server: String,
    /// Shared transport.
    client: Arc<dyn OctaneHttpClient>,
}

impl OctaneConnection {
    /// Builds a reqwest transport for `server` and signs in.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the transport cannot be built or sign-in
    /// fails.
    pub fn connect(
        server: &str,
        authentication: Authentication,
        config: HttpClientConfig,
    ) -> Result<Self, OctaneError> {
        let client = ReqwestHttpClient::new(server, authentication, config)?;
        client.authenticate()?;
        Ok(Self::with_client(server, Arc::new(client)))
    }

    /// Wraps an existing transport; no sign-in is performed.
    #[must_use]
    pub fn with_client(server: &str, client: Arc<dyn OctaneHttpClient>) -> Self {
        Self {
            server: server.trim_end_matches('/').to_string(),
            client,
        }
    }

    /// Returns the server URL.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Returns the shared transport.
    #[must_use]
    pub fn client(&self) -> Arc<dyn OctaneHttpClient> {
        Arc::clone(&self.client)
    }

    /// Starts a context builder for this server.
    #[must_use]
    pub fn builder(&self) -> OctaneBuilder {
        OctaneBuilder::new(Arc::clone(&self.client), self.server.as_str())
    }

    /// Ends the server session.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the sign-out request fails.
    pub fn sign_out(&self) -> Result<(), OctaneError> {
        self.client.sign_out()
    }
}

impl fmt::Debug for OctaneConnection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OctaneConnection").field("server", &self.server).finish_non_exhaustive()
    }
}
