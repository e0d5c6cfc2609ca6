// crates/octane-sdk/src/lib.rs
// ============================================================================
// Module: Octane SDK
// Description: Blocking REST client for the Octane project-management service.
// Purpose: Model Octane scopes and resources as typed client-side contexts.
// Dependencies: reqwest, serde, serde_json, thiserror, tracing, url, uuid
// ============================================================================

//! ## Overview
//! An [`OctaneConnection`] signs in to a server and hands out
//! [`OctaneBuilder`]s. A builder selects the REST scope (space admin, shared
//! space, workspace list, or one workspace) and produces an immutable
//! [`Octane`] context whose base URL roots every entity, metadata,
//! attachment, and manual-test request.
//! Invariants:
//! - Base URLs follow `{domain}/api/shared_spaces[/{id}[/workspaces[/{ws}]]]`.
//! - Contexts are immutable and share one transport through an `Arc`.
//! - All HTTP work goes through [`OctaneHttpClient`]; the SDK never panics on
//!   server input.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod attachments;
pub mod auth;
pub mod connection;
pub mod context;
pub mod entities;
pub mod error;
pub mod http;
pub mod metadata;
pub mod query;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use attachments::AttachmentById;
pub use attachments::AttachmentList;
pub use attachments::AttachmentOwner;
pub use attachments::NewAttachment;
pub use auth::Authentication;
pub use auth::Credentials;
pub use connection::OctaneConnection;
pub use context::NO_ENTITY;
pub use context::NO_WORKSPACE_ID;
pub use context::ONLY_SHARED_SPACE_WORKSPACE_ID;
pub use context::Octane;
pub use context::OctaneBuilder;
pub use context::SharedSpaceId;
pub use context::WorkspaceScope;
pub use context::compose_base_url;
pub use entities::DEFAULT_PAGE_SIZE;
pub use entities::EntityById;
pub use entities::EntityList;
pub use entities::EntityModel;
pub use entities::GetEntities;
pub use entities::OctaneCollection;
pub use error::OctaneError;
pub use http::HttpClientConfig;
pub use http::OctaneHttpClient;
pub use http::OctaneHttpRequest;
pub use http::OctaneHttpResponse;
pub use http::ReqwestHttpClient;
pub use manual_tests::TestScript;
pub use manual_tests::TestScriptContext;
pub use manual_tests::TestStep;
pub use manual_tests::TestStepKind;
pub use metadata::EntityMetadata;
pub use metadata::Feature;
pub use metadata::FieldMetadata;
pub use metadata::Metadata;
pub use query::Query;
pub use query::QueryMethod;
pub use query::QueryValue;
