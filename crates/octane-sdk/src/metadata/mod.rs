// crates/octane-sdk/src/metadata/mod.rs
// ============================================================================
// Module: Octane Metadata
// Description: Entity and field metadata contexts.
// Purpose: Read `metadata/entities` and `metadata/fields` for the current scope.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! [`Metadata`] is bound to `{base}/metadata`. Entity metadata describes
//! entity types and their [`Feature`]s; field metadata describes the fields of
//! one or more entity types. Both requests accept an optional name filter.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod features;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

pub use self::features::Feature;
use crate::context::join_path;
use crate::context::with_query_params;
use crate::entities::quoted;
use crate::error::OctaneError;
use crate::http::OctaneHttpClient;
use crate::http::OctaneHttpRequest;
use crate::http::send_checked;
use crate::query::Query;

// ============================================================================
// SECTION: Metadata Types
// ============================================================================

/// Metadata of one entity type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityMetadata {
    /// Entity type name, e.g. `defect`.
    pub name: String,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Whether the label can be changed.
    #[serde(default)]
    pub can_modify_label: bool,
    /// Supported features.
    #[serde(default)]
    pub features: Vec<Feature>,
}

impl EntityMetadata {
    /// Returns the feature with the given name.
    #[must_use]
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|feature| feature.name() == name)
    }
}

/// Metadata of one field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FieldMetadata {
    /// Field name.
    pub name: String,
    /// Owning entity type.
    #[serde(default)]
    pub entity_name: String,
    /// Display label.
    #[serde(default)]
    pub label: Option<String>,
    /// Field type, e.g. `string`, `reference`, `integer`.
    #[serde(default)]
    pub field_type: String,
    /// Whether a value is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Whether the field can be written.
    #[serde(default)]
    pub editable: bool,
    /// Whether the field can be used in queries.
    #[serde(default)]
    pub filterable: bool,
    /// Whether the field can be used for sorting.
    #[serde(default)]
    pub sortable: bool,
    /// Whether the field is immutable after creation.
    #[serde(default, rename = "final")]
    pub is_final: bool,
    /// Maximum string length.
    #[serde(default)]
    pub max_length: Option<u64>,
    /// Reference targets and other type-specific data.
    #[serde(default)]
    pub field_type_data: Option<Value>,
}

/// Metadata collection envelope.
#[derive(Deserialize)]
struct MetadataPage<T> {
    /// Metadata records.
    #[serde(default = "Vec::new")]
    data: Vec<T>,
}

// ============================================================================
// SECTION: Metadata Context
// ============================================================================

/// Metadata context.
#[derive(Clone)]
pub struct Metadata {
    /// Transport.
    client: Arc<dyn OctaneHttpClient>,
    /// Metadata URL.
    url: String,
}

impl Metadata {
    /// Creates a context bound to a metadata URL.
    pub(crate) fn new(client: Arc<dyn OctaneHttpClient>, url: String) -> Self {
        Self {
            client,
            url,
        }
    }

    /// Returns the metadata URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reads entity metadata; an empty `names` slice returns every entity.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn entities(&self, names: &[&str]) -> Result<Vec<EntityMetadata>, OctaneError> {
        self.fetch("entities", "name", names)
    }

    /// Reads field metadata; an empty `entity_names` slice returns every field.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn fields(&self, entity_names: &[&str]) -> Result<Vec<FieldMetadata>, OctaneError> {
        self.fetch("fields", "entity_name", entity_names)
    }

    /// Reads a metadata collection filtered on `filter_field IN names`.
    fn fetch<T: DeserializeOwned>(
        &self,
        collection: &str,
        filter_field: &str,
        names: &[&str],
    ) -> Result<Vec<T>, OctaneError> {
        let params = if names.is_empty() {
            Vec::new()
        } else {
            vec![("query", quoted(&Query::in_list(filter_field, names.iter().copied())))]
        };
        let url = with_query_params(&join_path(&self.url, collection), &params)?;
        let page: MetadataPage<T> =
            send_checked(self.client.as_ref(), &OctaneHttpRequest::get(url))?.decode()?;
        Ok(page.data)
    }
}
