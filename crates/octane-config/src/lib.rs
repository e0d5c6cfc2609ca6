// crates/octane-config/src/lib.rs
// ============================================================================
// Module: Octane Config Library
// Description: Connection profile model and validation.
// Purpose: Single source of truth for octane.toml semantics.
// Dependencies: octane-sdk, serde, toml, url
// ============================================================================

//! ## Overview
//! `octane-config` defines the TOML connection profile used by the CLI and by
//! applications that embed the SDK. Validation fails closed and converts a
//! profile into the SDK's [`octane_sdk::Authentication`],
//! [`octane_sdk::HttpClientConfig`], and builder coordinates.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::AuthConfig;
pub use config::AuthMode;
pub use config::CONFIG_ENV_VAR;
pub use config::ConfigError;
pub use config::ContextConfig;
pub use config::OctaneConfig;
pub use config::ServerConfig;
