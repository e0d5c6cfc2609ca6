// crates/octane-config/tests/common/mod.rs
// =============================================================================
// Module: Config Test Helpers
// Description: Shared helpers for config validation tests.
// Purpose: Reduce duplication across integration tests for octane-config.
// =============================================================================

#![allow(dead_code, reason = "Test helpers are selectively used across suites.")]

use octane_config::ConfigError;
use octane_config::OctaneConfig;

/// Minimal valid profile using user credentials.
pub const MINIMAL_TOML: &str = r#"
[server]
url = "https://octane.example.com"

[auth]
mode = "user"
user = "sa@nga"
password = "Welcome1"
"#;

/// Parses the minimal profile.
pub fn minimal_config() -> Result<OctaneConfig, ConfigError> {
    OctaneConfig::from_toml(MINIMAL_TOML)
}

/// Parses the minimal profile with `extra` appended to the `[server]` table.
pub fn config_with_server(extra: &str) -> Result<OctaneConfig, ConfigError> {
    OctaneConfig::from_toml(&MINIMAL_TOML.replace(
        "url = \"https://octane.example.com\"\n",
        &format!("url = \"https://octane.example.com\"\n{extra}\n"),
    ))
}

/// Asserts that `result` failed with a message containing `needle`.
pub fn assert_invalid<T>(result: Result<T, ConfigError>, needle: &str) -> Result<(), String> {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config".to_string()),
    }
}
