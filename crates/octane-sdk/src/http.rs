// crates/octane-sdk/src/http.rs
// ============================================================================
// Module: Octane HTTP Transport
// Description: Transport abstraction and the blocking reqwest implementation.
// Purpose: Send REST requests with session cookies and bounded responses.
// Dependencies: reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Every SDK context forwards its REST calls to an [`OctaneHttpClient`].
//! [`ReqwestHttpClient`] is the production implementation: it signs in with
//! the configured [`Authentication`], keeps the session cookie in a cookie
//! store, and signs in again once when a request is answered with `401`.
//! Invariants:
//! - Redirects are not followed.
//! - Response bodies are capped at [`HttpClientConfig::max_response_bytes`].
//! - `execute` returns non-success responses unchanged; callers decide how to
//!   surface them (see [`OctaneHttpResponse::into_success`]).

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::blocking::RequestBuilder;
use reqwest::blocking::Response;
use reqwest::blocking::multipart::Form;
use reqwest::blocking::multipart::Part;
use reqwest::header::ACCEPT;
use reqwest::header::CONTENT_TYPE;
use reqwest::redirect::Policy;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::auth::Authentication;
use crate::auth::CLIENT_TYPE_HEADER;
use crate::error::OctaneError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Sign-in path relative to the server URL.
pub const SIGN_IN_PATH: &str = "authentication/sign_in";
/// Sign-out path relative to the server URL.
pub const SIGN_OUT_PATH: &str = "authentication/sign_out";
/// JSON media type.
const APPLICATION_JSON: &str = "application/json";
/// Binary media type.
const APPLICATION_OCTET_STREAM: &str = "application/octet-stream";

// ============================================================================
// SECTION: Request and Response Types
// ============================================================================

/// HTTP methods used by the Octane REST API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `DELETE`
    Delete,
}

impl HttpMethod {
    /// Returns the wire name of the method.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Response media type requested through the `Accept` header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptType {
    /// `application/json`
    Json,
    /// `application/octet-stream`
    OctetStream,
}

impl AcceptType {
    /// Returns the header value.
    #[must_use]
    pub const fn as_header(self) -> &'static str {
        match self {
            Self::Json => APPLICATION_JSON,
            Self::OctetStream => APPLICATION_OCTET_STREAM,
        }
    }
}

/// One part of a multipart request body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MultipartPart {
    /// Form field name.
    pub name: String,
    /// Optional file name for file parts.
    pub file_name: Option<String>,
    /// Part media type.
    pub content_type: String,
    /// Part bytes.
    pub bytes: Vec<u8>,
}

/// Request body variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// Serialized JSON document.
    Json(Vec<u8>),
    /// Multipart form (attachment uploads).
    Multipart(Vec<MultipartPart>),
}

/// A single REST request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctaneHttpRequest {
    /// HTTP method.
    pub method: HttpMethod,
    /// Absolute request URL including query parameters.
    pub url: String,
    /// Optional request body.
    pub body: Option<RequestBody>,
    /// Requested response media type.
    pub accept: AcceptType,
}

impl OctaneHttpRequest {
    /// Creates a bodiless request accepting JSON.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            accept: AcceptType::Json,
        }
    }

    /// Creates a `GET` request accepting JSON.
    #[must_use]
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    /// Creates a `DELETE` request accepting JSON.
    #[must_use]
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Delete, url)
    }

    /// Creates a `POST` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Json`] when the body cannot be serialized.
    pub fn post_json<T: Serialize + ?Sized>(
        url: impl Into<String>,
        body: &T,
    ) -> Result<Self, OctaneError> {
        Self::new(HttpMethod::Post, url).with_json(body)
    }

    /// Creates a `PUT` request with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Json`] when the body cannot be serialized.
    pub fn put_json<T: Serialize + ?Sized>(
        url: impl Into<String>,
        body: &T,
    ) -> Result<Self, OctaneError> {
        Self::new(HttpMethod::Put, url).with_json(body)
    }

    /// Replaces the body with a serialized JSON document.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Json`] when the body cannot be serialized.
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, OctaneError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|err| OctaneError::Json(format!("request serialization failed: {err}")))?;
        self.body = Some(RequestBody::Json(bytes));
        Ok(self)
    }

    /// Replaces the body with a multipart form.
    #[must_use]
    pub fn with_multipart(mut self, parts: Vec<MultipartPart>) -> Self {
        self.body = Some(RequestBody::Multipart(parts));
        self
    }

    /// Sets the requested response media type.
    #[must_use]
    pub const fn with_accept(mut self, accept: AcceptType) -> Self {
        self.accept = accept;
        self
    }
}

/// A REST response with a fully buffered body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OctaneHttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response `Content-Type`, when present.
    pub content_type: Option<String>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl OctaneHttpResponse {
    /// Creates a JSON response (used by in-memory clients).
    #[must_use]
    pub fn json(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            content_type: Some(APPLICATION_JSON.to_string()),
            body: body.into(),
        }
    }

    /// Returns true for 2xx status codes.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    /// Returns the response unchanged when successful, else a server error.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Server`] for non-2xx responses.
    pub fn into_success(self) -> Result<Self, OctaneError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(OctaneError::from_response(self.status, &self.body))
        }
    }

    /// Decodes the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Json`] when the body does not match `T`.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, OctaneError> {
        serde_json::from_slice(&self.body)
            .map_err(|err| OctaneError::Json(format!("invalid response body: {err}")))
    }
}

// ============================================================================
// SECTION: Client Interface
// ============================================================================

/// Transport used by every Octane context.
///
/// Implementations must be shareable across threads; contexts hold them in an
/// `Arc` and clone freely.
pub trait OctaneHttpClient: Send + Sync {
    /// Signs in to the server and stores the session.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the server rejects the credentials or the
    /// request cannot be sent.
    fn authenticate(&self) -> Result<(), OctaneError>;

    /// Sends a request and returns the buffered response, whatever its status.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] on transport failures or oversized responses.
    fn execute(&self, request: &OctaneHttpRequest) -> Result<OctaneHttpResponse, OctaneError>;

    /// Ends the server session.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the sign-out request fails.
    fn sign_out(&self) -> Result<(), OctaneError>;
}

/// Executes a request and fails on non-success statuses.
pub(crate) fn send_checked(
    client: &dyn OctaneHttpClient,
    request: &OctaneHttpRequest,
) -> Result<OctaneHttpResponse, OctaneError> {
    client.execute(request)?.into_success()
}

// ============================================================================
// SECTION: Configuration
// ============================================================================

/// Transport configuration for [`ReqwestHttpClient`].
///
/// # Invariants
/// - `timeout_ms` applies to the full request lifecycle.
/// - `max_response_bytes` is a hard upper bound on response bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpClientConfig {
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum response size allowed, in bytes.
    pub max_response_bytes: usize,
    /// User agent string for outbound requests.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_response_bytes: 16 * 1024 * 1024,
            user_agent: format!("octane-sdk/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

// ============================================================================
// SECTION: Reqwest Implementation
// ============================================================================

/// Blocking reqwest transport with cookie-based sessions.
///
/// # Invariants
/// - `server` never ends with `/`.
/// - Only one re-authentication is attempted per request.
pub struct ReqwestHttpClient {
    /// Server URL used for sign-in and sign-out.
    server: String,
    /// Credentials used for sign-in.
    authentication: Authentication,
    /// Transport limits.
    config: HttpClientConfig,
    /// Underlying HTTP client (holds the cookie store).
    client: Client,
}

impl ReqwestHttpClient {
    /// Creates a transport for `server` without signing in.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Transport`] when the HTTP client cannot be built.
    pub fn new(
        server: &str,
        authentication: Authentication,
        config: HttpClientConfig,
    ) -> Result<Self, OctaneError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .map_err(|err| OctaneError::Transport(format!("http client build failed: {err}")))?;
        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            authentication,
            config,
            client,
        })
    }

    /// Returns the server URL.
    #[must_use]
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Posts to an authentication endpoint and checks the status.
    fn post_auth(&self, path: &str, payload: Option<Vec<u8>>) -> Result<(), OctaneError> {
        let url = format!("{}/{path}", self.server);
        let mut builder = self.with_common_headers(self.client.post(&url), AcceptType::Json);
        if let Some(bytes) = payload {
            builder = builder.header(CONTENT_TYPE, APPLICATION_JSON).body(bytes);
        }
        let mut response = builder
            .send()
            .map_err(|err| OctaneError::Authentication(format!("{path} request failed: {err}")))?;
        let status = response.status().as_u16();
        if response.status().is_success() {
            return Ok(());
        }
        let body = read_response_limited(&mut response, self.config.max_response_bytes)?;
        let detail = OctaneError::from_response(status, &body);
        Err(OctaneError::Authentication(format!("{path} rejected: {detail}")))
    }

    /// Adds the `Accept` and client type headers.
    fn with_common_headers(&self, builder: RequestBuilder, accept: AcceptType) -> RequestBuilder {
        let builder = builder.header(ACCEPT, accept.as_header());
        match self.authentication.client_type() {
            Some(client_type) => builder.header(CLIENT_TYPE_HEADER, client_type),
            None => builder,
        }
    }

    /// Sends a request once without re-authentication.
    fn send_once(&self, request: &OctaneHttpRequest) -> Result<OctaneHttpResponse, OctaneError> {
        let method = match request.method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        };
        let mut builder =
            self.with_common_headers(self.client.request(method, &request.url), request.accept);
        match &request.body {
            None => {}
            Some(RequestBody::Json(bytes)) => {
                builder = builder.header(CONTENT_TYPE, APPLICATION_JSON).body(bytes.clone());
            }
            Some(RequestBody::Multipart(parts)) => {
                builder = builder.multipart(build_form(parts)?);
            }
        }
        let mut response =
            builder.send().map_err(|err| OctaneError::Transport(err.to_string()))?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let body = read_response_limited(&mut response, self.config.max_response_bytes)?;
        Ok(OctaneHttpResponse {
            status,
            content_type,
            body,
        })
    }
}

impl OctaneHttpClient for ReqwestHttpClient {
    fn authenticate(&self) -> Result<(), OctaneError> {
        let payload = serde_json::to_vec(&self.authentication.sign_in_payload())
            .map_err(|err| OctaneError::Json(format!("sign-in payload failed: {err}")))?;
        self.post_auth(SIGN_IN_PATH, Some(payload))?;
        tracing::info!(
            server = %self.server,
            principal = %self.authentication.principal(),
            "signed in to octane"
        );
        Ok(())
    }

    fn execute(&self, request: &OctaneHttpRequest) -> Result<OctaneHttpResponse, OctaneError> {
        tracing::debug!(method = %request.method, url = %request.url, "octane request");
        let response = self.send_once(request)?;
        if response.status != 401 {
            return Ok(response);
        }
        tracing::warn!(url = %request.url, "octane session rejected; signing in again");
        self.authenticate()?;
        self.send_once(request)
    }

    fn sign_out(&self) -> Result<(), OctaneError> {
        self.post_auth(SIGN_OUT_PATH, None)?;
        tracing::info!(server = %self.server, "signed out of octane");
        Ok(())
    }
}

impl fmt::Debug for ReqwestHttpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReqwestHttpClient")
            .field("server", &self.server)
            .field("authentication", &self.authentication)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Converts multipart parts into a reqwest form.
fn build_form(parts: &[MultipartPart]) -> Result<Form, OctaneError> {
    let mut form = Form::new();
    for part in parts {
        let mut body = Part::bytes(part.bytes.clone())
            .mime_str(&part.content_type)
            .map_err(|_| OctaneError::Config(format!("invalid content type: {}", part.content_type)))?;
        if let Some(file_name) = &part.file_name {
            body = body.file_name(file_name.clone());
        }
        form = form.part(part.name.clone(), body);
    }
    Ok(form)
}

/// Reads the response body while enforcing a byte limit.
fn read_response_limited(response: &mut Response, max_bytes: usize) -> Result<Vec<u8>, OctaneError> {
    let expected_len = response.content_length();
    let max_bytes_u64 = u64::try_from(max_bytes)
        .map_err(|_| OctaneError::Config("response size limit exceeds u64".to_string()))?;
    if let Some(expected) = expected_len
        && expected > max_bytes_u64
    {
        return Err(OctaneError::ResponseTooLarge {
            actual: usize::try_from(expected).unwrap_or(usize::MAX),
            limit: max_bytes,
        });
    }
    let mut buf = Vec::new();
    let limit = max_bytes_u64.saturating_add(1);
    let mut handle = response.take(limit);
    if let Err(err) = handle.read_to_end(&mut buf) {
        let short = expected_len
            .is_some_and(|expected| u64::try_from(buf.len()).is_ok_and(|read| read < expected));
        if short {
            return Err(OctaneError::Protocol(format!("http response truncated: {err}")));
        }
        return Err(OctaneError::Transport(format!("failed to read response: {err}")));
    }
    if buf.len() > max_bytes {
        return Err(OctaneError::ResponseTooLarge {
            actual: buf.len(),
            limit: max_bytes,
        });
    }
    if let Some(expected) = expected_len {
        let expected = usize::try_from(expected)
            .map_err(|_| OctaneError::Protocol("invalid response length".to_string()))?;
        if buf.len() < expected {
            return Err(OctaneError::Protocol("http response truncated".to_string()));
        }
    }
    Ok(buf)
}
