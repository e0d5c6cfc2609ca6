// crates/octane-sdk/src/context.rs
// ============================================================================
// Module: Octane Context
// Description: Shared-space/workspace scope selection and base URL composition.
// Purpose: Build immutable contexts that root every entity, metadata, and
//          attachment operation.
// Dependencies: serde, tracing, url, uuid
// ============================================================================

//! ## Overview
//! An [`Octane`] context is the REST scope selected by a server domain, an
//! optional shared space and an optional workspace. It resolves to one of four
//! base URLs:
//!
//! | Shared space | Workspace | Base URL |
//! |---|---|---|
//! | none | any | `{domain}/api/shared_spaces` |
//! | `S` | [`ONLY_SHARED_SPACE_WORKSPACE_ID`] | `{domain}/api/shared_spaces/S/` |
//! | `S` | [`NO_WORKSPACE_ID`] | `{domain}/api/shared_spaces/S/workspaces` |
//! | `S` | `W` | `{domain}/api/shared_spaces/S/workspaces/W` |
//!
//! Contexts are built with [`OctaneBuilder`] and are immutable afterwards; they
//! are cheap to clone and safe to share across threads.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use url::Url;
use uuid::Uuid;

use crate::attachments::AttachmentList;
use crate::entities::EntityList;
use crate::error::OctaneError;
use crate::http::OctaneHttpClient;
use crate::manual_tests::TestScriptContext;
use crate::metadata::Metadata;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Workspace id selecting the workspace list of a shared space.
pub const NO_WORKSPACE_ID: i64 = i64::MIN;
/// Workspace id selecting the shared space itself, without a workspace.
pub const ONLY_SHARED_SPACE_WORKSPACE_ID: i64 = 0;
/// Entity name that targets the context base URL itself.
pub const NO_ENTITY: &str = "";

// ============================================================================
// SECTION: Scope Types
// ============================================================================

/// Shared space identifier.
///
/// # Invariants
/// - Opaque string; integers render as decimal, UUIDs as lowercase hyphenated.
/// - An empty identifier selects no shared space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SharedSpaceId(String);

impl SharedSpaceId {
    /// Creates a shared space identifier from any string form.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true when the identifier is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SharedSpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<&str> for SharedSpaceId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for SharedSpaceId {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<i64> for SharedSpaceId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<Uuid> for SharedSpaceId {
    fn from(value: Uuid) -> Self {
        Self(value.hyphenated().to_string())
    }
}

/// Workspace selection within a shared space.
///
/// # Invariants
/// - [`WorkspaceScope::from_raw`] maps the sentinel ids onto the dedicated
///   variants, so `from_raw(x).raw() == x` for every `x`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WorkspaceScope {
    /// No workspace; the shared space itself is the context.
    #[default]
    SharedSpaceOnly,
    /// The workspace collection of the shared space.
    AllWorkspaces,
    /// A concrete workspace.
    Workspace(i64),
}

impl WorkspaceScope {
    /// Converts a raw workspace id, honoring the sentinel values.
    #[must_use]
    pub const fn from_raw(raw: i64) -> Self {
        match raw {
            NO_WORKSPACE_ID => Self::AllWorkspaces,
            ONLY_SHARED_SPACE_WORKSPACE_ID => Self::SharedSpaceOnly,
            id => Self::Workspace(id),
        }
    }

    /// Returns the raw workspace id, using the sentinel values where needed.
    #[must_use]
    pub const fn raw(self) -> i64 {
        match self {
            Self::SharedSpaceOnly => ONLY_SHARED_SPACE_WORKSPACE_ID,
            Self::AllWorkspaces => NO_WORKSPACE_ID,
            Self::Workspace(id) => id,
        }
    }
}

impl From<i64> for WorkspaceScope {
    fn from(value: i64) -> Self {
        Self::from_raw(value)
    }
}

impl fmt::Display for WorkspaceScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.raw().fmt(f)
    }
}

// ============================================================================
// SECTION: URL Composition
// ============================================================================

/// Composes the base URL for a domain, shared space and workspace.
///
/// A missing or empty shared space ignores the workspace entirely.
#[must_use]
pub fn compose_base_url(
    domain: &str,
    shared_space: Option<&SharedSpaceId>,
    workspace: WorkspaceScope,
) -> String {
    let base = format!("{domain}/api/shared_spaces");
    let Some(shared_space) = shared_space.filter(|id| !id.is_empty()) else {
        return base;
    };
    match workspace {
        WorkspaceScope::SharedSpaceOnly => format!("{base}/{shared_space}/"),
        WorkspaceScope::AllWorkspaces => format!("{base}/{shared_space}/workspaces"),
        WorkspaceScope::Workspace(id) => format!("{base}/{shared_space}/workspaces/{id}"),
    }
}

/// Appends a path segment to a URL with exactly one separating slash.
///
/// An empty segment returns the URL unchanged.
pub(crate) fn join_path(base: &str, segment: &str) -> String {
    let segment = segment.trim_start_matches('/');
    if segment.is_empty() {
        return base.to_string();
    }
    if base.ends_with('/') {
        format!("{base}{segment}")
    } else {
        format!("{base}/{segment}")
    }
}

/// Percent-encodes one path segment so `/`, `?` and `#` stay inside it.
pub(crate) fn encode_segment(segment: &str) -> String {
    url::form_urlencoded::byte_serialize(segment.as_bytes())
        .map(|chunk| if chunk == "+" { "%20" } else { chunk })
        .collect()
}

/// Appends URL-encoded query parameters; no parameters leaves the URL as is.
pub(crate) fn with_query_params(
    base: &str,
    params: &[(&str, String)],
) -> Result<String, OctaneError> {
    if params.is_empty() {
        return Ok(base.to_string());
    }
    let mut url = Url::parse(base)
        .map_err(|err| OctaneError::Config(format!("invalid request url {base}: {err}")))?;
    {
        let mut pairs = url.query_pairs_mut();
        for (name, value) in params {
            pairs.append_pair(name, value);
        }
    }
    Ok(url.into())
}

// ============================================================================
// SECTION: Context
// ============================================================================

/// Immutable Octane REST context.
///
/// # Invariants
/// - `base_url` is computed once at build time from the other coordinates.
#[derive(Clone)]
pub struct Octane {
    /// Transport shared by every derived context.
    client: Arc<dyn OctaneHttpClient>,
    /// Server domain (scheme, host and port).
    domain: String,
    /// Selected shared space, if any.
    shared_space: Option<SharedSpaceId>,
    /// Selected workspace scope.
    workspace: WorkspaceScope,
    /// Resolved base URL.
    base_url: String,
}

impl Octane {
    /// Returns the resolved base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the server domain.
    #[must_use]
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Returns the selected shared space.
    #[must_use]
    pub const fn shared_space(&self) -> Option<&SharedSpaceId> {
        self.shared_space.as_ref()
    }

    /// Returns the selected workspace scope.
    #[must_use]
    pub const fn workspace(&self) -> WorkspaceScope {
        self.workspace
    }

    /// Creates an entity list context for a collection name such as
    /// `defects` or `releases`.
    ///
    /// [`NO_ENTITY`] targets the base URL itself, which lists shared spaces or
    /// workspaces depending on the scope.
    #[must_use]
    pub fn entity_list(&self, entity_name: &str) -> EntityList {
        EntityList::new(Arc::clone(&self.client), join_path(&self.base_url, entity_name))
    }

    /// Creates a metadata context (`{base}/metadata`).
    #[must_use]
    pub fn metadata(&self) -> Metadata {
        Metadata::new(Arc::clone(&self.client), join_path(&self.base_url, "metadata"))
    }

    /// Creates an attachment list context (`{base}/attachments`).
    #[must_use]
    pub fn attachment_list(&self) -> AttachmentList {
        AttachmentList::new(Arc::clone(&self.client), join_path(&self.base_url, "attachments"))
    }

    /// Creates a manual-test script context (`{base}/tests/{id}/script`).
    #[must_use]
    pub fn test_script(&self, test_id: &str) -> TestScriptContext {
        let url =
            join_path(&self.base_url, &format!("tests/{}/script", encode_segment(test_id)));
        TestScriptContext::new(Arc::clone(&self.client), url)
    }

    /// Signs out of the server; session cookies are discarded by the server.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the sign-out request fails.
    pub fn sign_out(&self) -> Result<(), OctaneError> {
        self.client.sign_out()
    }
}

impl fmt::Debug for Octane {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Octane")
            .field("domain", &self.domain)
            .field("shared_space", &self.shared_space)
            .field("workspace", &self.workspace)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// SECTION: Builder
// ============================================================================

/// Builder for [`Octane`] contexts.
///
/// Without a shared space the context is the space admin
/// (`{domain}/api/shared_spaces`). With a shared space but no workspace the
/// context is the shared space itself.
#[derive(Clone)]
pub struct OctaneBuilder {
    /// Transport handed to the built context.
    client: Arc<dyn OctaneHttpClient>,
    /// Server domain.
    domain: String,
    /// Pending shared space.
    shared_space: Option<SharedSpaceId>,
    /// Pending workspace scope.
    workspace: WorkspaceScope,
}

impl OctaneBuilder {
    /// Creates a builder for `domain` using `client` as transport.
    #[must_use]
    pub fn new(client: Arc<dyn OctaneHttpClient>, domain: impl Into<String>) -> Self {
        Self {
            client,
            domain: domain.into(),
            shared_space: None,
            workspace: WorkspaceScope::SharedSpaceOnly,
        }
    }

    /// Sets the shared space (string, integer or UUID).
    #[must_use]
    pub fn shared_space(mut self, id: impl Into<SharedSpaceId>) -> Self {
        self.shared_space = Some(id.into());
        self
    }

    /// Sets the workspace id.
    ///
    /// [`NO_WORKSPACE_ID`] selects the workspace list and
    /// [`ONLY_SHARED_SPACE_WORKSPACE_ID`] selects the shared space only.
    #[must_use]
    pub const fn workspace(mut self, id: i64) -> Self {
        self.workspace = WorkspaceScope::from_raw(id);
        self
    }

    /// Selects the workspace list of the shared space.
    #[must_use]
    pub const fn all_workspaces(mut self) -> Self {
        self.workspace = WorkspaceScope::AllWorkspaces;
        self
    }

    /// Builds the immutable context.
    #[must_use]
    pub fn build(self) -> Octane {
        let shared_space = self.shared_space.filter(|id| !id.is_empty());
        let base_url = compose_base_url(&self.domain, shared_space.as_ref(), self.workspace);
        tracing::info!(
            domain = %self.domain,
            shared_space = shared_space.as_ref().map_or("none", SharedSpaceId::as_str),
            workspace = %self.workspace,
            base_url = %base_url,
            "setting octane context"
        );
        Octane {
            client: self.client,
            domain: self.domain,
            shared_space,
            workspace: self.workspace,
            base_url,
        }
    }
}

impl fmt::Display for OctaneBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shared_space = self.shared_space.as_ref().map_or("null", SharedSpaceId::as_str);
        write!(f, "Server: {} SharedSpace: {} Workspace: {}", self.domain, shared_space, self.workspace)
    }
}

impl fmt::Debug for OctaneBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OctaneBuilder")
            .field("domain", &self.domain)
            .field("shared_space", &self.shared_space)
            .field("workspace", &self.workspace)
            .finish_non_exhaustive()
    }
}
