// crates/octane-config/src/config.rs
// ============================================================================
// Module: Octane Configuration
// Description: Connection profile loading and validation.
// Purpose: Provide strict TOML parsing with hard limits and secret resolution.
// Dependencies: octane-sdk, serde, toml, url
// ============================================================================

//! ## Overview
//! A connection profile is a TOML file with three tables: `[server]` for the
//! Octane URL and transport limits, `[context]` for the shared space and
//! workspace, and `[auth]` for credentials. Secrets are given inline or by
//! naming an environment variable that holds them.
//! Invariants:
//! - Server URLs are `http` or `https` and never embed credentials.
//! - Each credential half comes from exactly one source.
//! - Invalid configuration fails closed with [`ConfigError::Invalid`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use octane_sdk::Authentication;
use octane_sdk::HttpClientConfig;
use octane_sdk::NO_WORKSPACE_ID;
use octane_sdk::OctaneBuilder;
use octane_sdk::SharedSpaceId;
use octane_sdk::WorkspaceScope;
use octane_sdk::compose_base_url;
use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;
use url::Url;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "octane.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "OCTANE_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 256 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Default request timeout in milliseconds.
const DEFAULT_TIMEOUT_MS: u64 = 30_000;
/// Largest accepted request timeout in milliseconds.
pub(crate) const MAX_TIMEOUT_MS: u64 = 600_000;
/// Default response size limit in bytes.
const DEFAULT_MAX_RESPONSE_BYTES: usize = 16 * 1024 * 1024;
/// Largest accepted response size limit in bytes.
pub(crate) const MAX_RESPONSE_BYTES_LIMIT: usize = 256 * 1024 * 1024;
/// Maximum length of the server URL.
pub(crate) const MAX_URL_LENGTH: usize = 2048;
/// Maximum length of identifiers, header values, and inline secrets.
pub(crate) const MAX_VALUE_LENGTH: usize = 512;
/// Maximum length of an environment variable name.
pub(crate) const MAX_ENV_NAME_LENGTH: usize = 128;

// ============================================================================
// SECTION: Configuration Types
// ============================================================================

/// Octane connection profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OctaneConfig {
    /// Server and transport settings.
    pub server: ServerConfig,
    /// REST scope settings.
    #[serde(default)]
    pub context: ContextConfig,
    /// Credentials.
    pub auth: AuthConfig,
}

impl OctaneConfig {
    /// Loads configuration from disk using the default resolution rules:
    /// the explicit `path`, else `OCTANE_CONFIG`, else `octane.toml`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved)
            .map_err(|err| ConfigError::Io(format!("{}: {err}", resolved.display())))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.context.validate()?;
        self.auth.validate()
    }

    /// Resolves credentials using the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a referenced variable is unset.
    pub fn authentication(&self) -> Result<Authentication, ConfigError> {
        self.authentication_with(|name| env::var(name).ok())
    }

    /// Resolves credentials, reading secret variables through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a referenced variable is unset or empty.
    pub fn authentication_with<F>(&self, lookup: F) -> Result<Authentication, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let authentication = self.auth.resolve(&lookup)?;
        Ok(authentication.with_client_type(self.server.client_type_header()))
    }

    /// Returns the transport settings.
    #[must_use]
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut config = HttpClientConfig {
            timeout_ms: self.server.timeout_ms,
            max_response_bytes: self.server.max_response_bytes,
            ..HttpClientConfig::default()
        };
        if let Some(user_agent) = &self.server.user_agent {
            config.user_agent.clone_from(user_agent);
        }
        config
    }

    /// Returns the server URL without trailing slash.
    #[must_use]
    pub fn server_url(&self) -> &str {
        self.server.url.trim_end_matches('/')
    }
}

/// Server and transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Octane server URL, e.g. `https://octane.example.com`.
    pub url: String,
    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Maximum response size in bytes.
    #[serde(default = "default_max_response_bytes")]
    pub max_response_bytes: usize,
    /// User agent override.
    #[serde(default)]
    pub user_agent: Option<String>,
    /// Client type header override; an empty string omits the header.
    #[serde(default)]
    pub client_type: Option<String>,
}

impl ServerConfig {
    /// Validates server settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.url.len() > MAX_URL_LENGTH {
            return Err(ConfigError::Invalid("server.url exceeds max length".to_string()));
        }
        let url = Url::parse(&self.url)
            .map_err(|err| ConfigError::Invalid(format!("server.url is invalid: {err}")))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Invalid("server.url must use http or https".to_string()));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(ConfigError::Invalid("server.url must include a host".to_string()));
        }
        if !url.username().is_empty() || url.password().is_some() {
            return Err(ConfigError::Invalid(
                "server.url must not embed credentials".to_string(),
            ));
        }
        if url.query().is_some() || url.fragment().is_some() {
            return Err(ConfigError::Invalid(
                "server.url must not carry a query or fragment".to_string(),
            ));
        }
        if self.timeout_ms == 0 || self.timeout_ms > MAX_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "server.timeout_ms must be between 1 and {MAX_TIMEOUT_MS}"
            )));
        }
        if self.max_response_bytes == 0 || self.max_response_bytes > MAX_RESPONSE_BYTES_LIMIT {
            return Err(ConfigError::Invalid(format!(
                "server.max_response_bytes must be between 1 and {MAX_RESPONSE_BYTES_LIMIT}"
            )));
        }
        if let Some(user_agent) = &self.user_agent {
            validate_value("server.user_agent", user_agent)?;
        }
        if let Some(client_type) = &self.client_type
            && client_type.len() > MAX_VALUE_LENGTH
        {
            return Err(ConfigError::Invalid("server.client_type exceeds max length".to_string()));
        }
        Ok(())
    }

    /// Returns the client type header value to send, if any.
    fn client_type_header(&self) -> Option<String> {
        match &self.client_type {
            None => Some(octane_sdk::auth::DEFAULT_CLIENT_TYPE.to_string()),
            Some(value) if value.trim().is_empty() => None,
            Some(value) => Some(value.trim().to_string()),
        }
    }
}

/// REST scope settings.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContextConfig {
    /// Shared space id (decimal or UUID).
    #[serde(default)]
    pub shared_space: Option<String>,
    /// Workspace id.
    #[serde(default)]
    pub workspace: Option<i64>,
    /// Targets the workspace list of the shared space.
    #[serde(default)]
    pub all_workspaces: bool,
}

impl ContextConfig {
    /// Validates scope settings.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(shared_space) = &self.shared_space {
            validate_value("context.shared_space", shared_space)?;
            if shared_space.contains('/') {
                return Err(ConfigError::Invalid(
                    "context.shared_space must not contain '/'".to_string(),
                ));
            }
        }
        let wants_workspace = self.workspace.is_some() || self.all_workspaces;
        if wants_workspace && self.shared_space.is_none() {
            return Err(ConfigError::Invalid(
                "context.workspace requires context.shared_space".to_string(),
            ));
        }
        if self.workspace.is_some() && self.all_workspaces {
            return Err(ConfigError::Invalid(
                "context.workspace and context.all_workspaces are mutually exclusive".to_string(),
            ));
        }
        if self.workspace == Some(NO_WORKSPACE_ID) {
            return Err(ConfigError::Invalid(
                "context.workspace must not be the sentinel id; use all_workspaces".to_string(),
            ));
        }
        Ok(())
    }

    /// Applies the scope to a context builder.
    #[must_use]
    pub fn apply(&self, builder: OctaneBuilder) -> OctaneBuilder {
        let Some(shared_space) = &self.shared_space else {
            return builder;
        };
        let builder = builder.shared_space(shared_space.as_str());
        match (self.all_workspaces, self.workspace) {
            (true, _) => builder.all_workspaces(),
            (false, Some(workspace)) => builder.workspace(workspace),
            (false, None) => builder,
        }
    }

    /// Composes the base URL this scope selects on `domain` without connecting.
    #[must_use]
    pub fn base_url(&self, domain: &str) -> String {
        let shared_space = self.shared_space.as_deref().map(SharedSpaceId::from);
        let workspace = match (self.all_workspaces, self.workspace) {
            (true, _) => WorkspaceScope::AllWorkspaces,
            (false, Some(workspace)) => WorkspaceScope::from_raw(workspace),
            (false, None) => WorkspaceScope::SharedSpaceOnly,
        };
        compose_base_url(domain, shared_space.as_ref(), workspace)
    }
}

/// Credential kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    /// User name and password.
    User,
    /// API access key.
    Client,
}

/// Credential settings; each half is given inline or by environment variable.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Credential kind.
    pub mode: AuthMode,
    /// User name.
    #[serde(default)]
    pub user: Option<String>,
    /// Environment variable holding the user name.
    #[serde(default)]
    pub user_env: Option<String>,
    /// Password.
    #[serde(default)]
    pub password: Option<String>,
    /// Environment variable holding the password.
    #[serde(default)]
    pub password_env: Option<String>,
    /// API client id.
    #[serde(default)]
    pub client_id: Option<String>,
    /// Environment variable holding the API client id.
    #[serde(default)]
    pub client_id_env: Option<String>,
    /// API client secret.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Environment variable holding the API client secret.
    #[serde(default)]
    pub client_secret_env: Option<String>,
}

impl AuthConfig {
    /// Returns the (inline, env) sources of the identity and secret halves.
    fn sources(&self) -> [Source<'_>; 2] {
        match self.mode {
            AuthMode::User => [
                Source::new("auth.user", &self.user, &self.user_env),
                Source::new("auth.password", &self.password, &self.password_env),
            ],
            AuthMode::Client => [
                Source::new("auth.client_id", &self.client_id, &self.client_id_env),
                Source::new("auth.client_secret", &self.client_secret, &self.client_secret_env),
            ],
        }
    }

    /// Returns the sources that do not belong to the configured mode.
    fn foreign_sources(&self) -> [Source<'_>; 2] {
        match self.mode {
            AuthMode::User => [
                Source::new("auth.client_id", &self.client_id, &self.client_id_env),
                Source::new("auth.client_secret", &self.client_secret, &self.client_secret_env),
            ],
            AuthMode::Client => [
                Source::new("auth.user", &self.user, &self.user_env),
                Source::new("auth.password", &self.password, &self.password_env),
            ],
        }
    }

    /// Validates credential sources.
    fn validate(&self) -> Result<(), ConfigError> {
        for source in self.sources() {
            source.validate()?;
        }
        for source in self.foreign_sources() {
            if source.inline.is_some() || source.env.is_some() {
                return Err(ConfigError::Invalid(format!(
                    "{} is not used with auth.mode = \"{}\"",
                    source.field,
                    self.mode.as_str()
                )));
            }
        }
        Ok(())
    }

    /// Resolves the credentials.
    fn resolve(&self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<Authentication, ConfigError> {
        let [identity, secret] = self.sources();
        let identity = identity.resolve(lookup)?;
        let secret = secret.resolve(lookup)?;
        Ok(match self.mode {
            AuthMode::User => Authentication::user(identity, secret),
            AuthMode::Client => Authentication::client(identity, secret),
        })
    }
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("AuthConfig")
            .field("mode", &self.mode)
            .field("user", &self.user)
            .field("user_env", &self.user_env)
            .field("password", &redacted(&self.password))
            .field("password_env", &self.password_env)
            .field("client_id", &self.client_id)
            .field("client_id_env", &self.client_id_env)
            .field("client_secret", &redacted(&self.client_secret))
            .field("client_secret_env", &self.client_secret_env)
            .finish()
    }
}

impl AuthMode {
    /// Returns the TOML spelling of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Client => "client",
        }
    }
}

/// One credential half and its two possible sources.
#[derive(Clone, Copy)]
struct Source<'a> {
    /// Field name used in error messages.
    field: &'static str,
    /// Inline value.
    inline: Option<&'a str>,
    /// Environment variable name.
    env: Option<&'a str>,
}

impl<'a> Source<'a> {
    /// Borrows the two optional sources.
    fn new(field: &'static str, inline: &'a Option<String>, env: &'a Option<String>) -> Self {
        Self {
            field,
            inline: inline.as_deref(),
            env: env.as_deref(),
        }
    }

    /// Checks that exactly one source is set and well formed.
    fn validate(self) -> Result<(), ConfigError> {
        match (self.inline, self.env) {
            (Some(_), Some(_)) => Err(ConfigError::Invalid(format!(
                "{field} and {field}_env are mutually exclusive",
                field = self.field
            ))),
            (None, None) => Err(ConfigError::Invalid(format!(
                "{field} or {field}_env is required",
                field = self.field
            ))),
            (Some(value), None) => validate_value(self.field, value),
            (None, Some(name)) => validate_env_name(&format!("{}_env", self.field), name),
        }
    }

    /// Returns the configured value, reading the environment when needed.
    fn resolve(self, lookup: &dyn Fn(&str) -> Option<String>) -> Result<String, ConfigError> {
        if let Some(value) = self.inline {
            return Ok(value.to_string());
        }
        let Some(name) = self.env else {
            return Err(ConfigError::Invalid(format!("{} is not configured", self.field)));
        };
        match lookup(name) {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(ConfigError::Invalid(format!(
                "environment variable {name} for {} is unset or empty",
                self.field
            ))),
        }
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Serde default for [`ServerConfig::timeout_ms`].
const fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Serde default for [`ServerConfig::max_response_bytes`].
const fn default_max_response_bytes() -> usize {
    DEFAULT_MAX_RESPONSE_BYTES
}

/// Resolves the config path from CLI or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a non-empty bounded string value.
fn validate_value(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_VALUE_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    Ok(())
}

/// Validates an environment variable name (`[A-Za-z_][A-Za-z0-9_]*`).
fn validate_env_name(field: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name.len() > MAX_ENV_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "{field} must be 1..={MAX_ENV_NAME_LENGTH} characters"
        )));
    }
    let mut chars = name.chars();
    let valid_start = chars.next().is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if !valid_start || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(ConfigError::Invalid(format!("{field} is not a valid variable name")));
    }
    Ok(())
}
