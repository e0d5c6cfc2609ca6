// crates/octane-sdk/src/metadata/features.rs
// ============================================================================
// Module: Entity Features
// Description: Feature descriptors attached to entity metadata.
// Purpose: Expose feature names while preserving feature-specific properties.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Entity metadata lists the features an entity supports (`auditing`,
//! `attachments`, `rest`, `subtypes`, ...). Every feature has a name; richer
//! feature payloads keep their extra properties in an opaque map.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Feature
// ============================================================================

/// An entity feature.
///
/// # Invariants
/// - `name` defaults to the empty string.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Feature {
    /// Feature name.
    #[serde(default)]
    name: String,
    /// Feature-specific properties.
    #[serde(flatten)]
    properties: Map<String, Value>,
}

impl Feature {
    /// Creates a feature with the given name and no properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            properties: Map::new(),
        }
    }

    /// Returns the feature name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sets the feature name.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Returns a feature-specific property.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&Value> {
        self.properties.get(key)
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

    use serde_json::json;

    use super::Feature;

    #[test]
    fn default_feature_has_empty_name() {
        let mut feature = Feature::default();
        assert_eq!(feature.name(), "");
        feature.set_name("auditing");
        assert_eq!(feature.name(), "auditing");
    }

    #[test]
    fn extra_properties_survive_round_trip() {
        let raw = json!({"name": "rest", "methods": ["GET", "POST"], "url": "defects"});
        let feature: Feature = serde_json::from_value(raw.clone()).unwrap();
        assert_eq!(feature.name(), "rest");
        assert_eq!(feature.property("url"), Some(&json!("defects")));
        assert_eq!(serde_json::to_value(&feature).unwrap(), raw);
    }
}
