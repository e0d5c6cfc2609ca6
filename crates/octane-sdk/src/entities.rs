// crates/octane-sdk/src/entities.rs
// ============================================================================
// Module: Octane Entities
// Description: Entity models, collections, and entity list contexts.
// Purpose: Translate entity CRUD calls into Octane collection requests.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! An [`EntityList`] is bound to one collection URL such as
//! `{base}/defects`. Reads go through the [`GetEntities`] request builder,
//! which renders the `fields`, `query`, `order_by`, `limit` and `offset`
//! parameters; single entities are addressed with [`EntityList::at`].
//! Collection bodies use the Octane envelope `{"data": [...], "total_count": N}`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;

use crate::context::encode_segment;
use crate::context::join_path;
use crate::context::with_query_params;
use crate::error::OctaneError;
use crate::http::OctaneHttpClient;
use crate::http::OctaneHttpRequest;
use crate::http::send_checked;
use crate::query::Query;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Page size used by [`GetEntities::execute_all`] callers that have no preference.
pub const DEFAULT_PAGE_SIZE: u32 = 1000;

// ============================================================================
// SECTION: Entity Model
// ============================================================================

/// A single Octane entity as a JSON object of field values.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityModel(Map<String, Value>);

impl EntityModel {
    /// Creates an empty entity.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an entity of the given type.
    #[must_use]
    pub fn of_type(entity_type: &str) -> Self {
        Self::new().with("type", entity_type)
    }

    /// Wraps an existing JSON object.
    #[must_use]
    pub const fn from_map(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Returns the entity id; numeric ids are rendered as decimal strings.
    #[must_use]
    pub fn id(&self) -> Option<String> {
        match self.0.get("id")? {
            Value::String(id) => Some(id.clone()),
            Value::Number(id) => Some(id.to_string()),
            _ => None,
        }
    }

    /// Returns the entity type.
    #[must_use]
    pub fn entity_type(&self) -> Option<&str> {
        self.get_str("type")
    }

    /// Returns a raw field value.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Returns a string field value.
    #[must_use]
    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.0.get(field).and_then(Value::as_str)
    }

    /// Returns the id of a single-reference field (`{"type": .., "id": ..}`).
    #[must_use]
    pub fn reference_id(&self, field: &str) -> Option<String> {
        let Value::Object(reference) = self.0.get(field)? else {
            return None;
        };
        Self::from_map(reference.clone()).id()
    }

    /// Sets a field value.
    pub fn set(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.0.insert(field.to_string(), value.into());
        self
    }

    /// Sets a single-reference field.
    pub fn set_reference(&mut self, field: &str, entity_type: &str, id: &str) -> &mut Self {
        self.set(field, json!({ "type": entity_type, "id": id }))
    }

    /// Returns the entity with a field set.
    #[must_use]
    pub fn with(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.set(field, value);
        self
    }

    /// Returns the field names present on the entity.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns the underlying JSON object.
    #[must_use]
    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }
}

/// One page of a collection response.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OctaneCollection {
    /// Total number of matching entities on the server, when reported.
    #[serde(default)]
    pub total_count: Option<u64>,
    /// True when the server capped `total_count`.
    #[serde(default)]
    pub exceeds_total_count: bool,
    /// Entities in this page.
    #[serde(default)]
    pub data: Vec<EntityModel>,
}

impl OctaneCollection {
    /// Returns the number of entities in this page.
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Returns true when the page is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Iterates over the entities in this page.
    pub fn iter(&self) -> impl Iterator<Item = &EntityModel> {
        self.data.iter()
    }
}

impl IntoIterator for OctaneCollection {
    type Item = EntityModel;
    type IntoIter = std::vec::IntoIter<EntityModel>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

/// Request envelope for collection writes.
#[derive(Serialize)]
struct DataEnvelope<'a> {
    /// Entities being written.
    data: &'a [EntityModel],
}

// ============================================================================
// SECTION: Entity List
// ============================================================================

/// Entity collection context.
#[derive(Clone)]
pub struct EntityList {
    /// Transport.
    client: Arc<dyn OctaneHttpClient>,
    /// Collection URL.
    url: String,
}

impl EntityList {
    /// Creates a context bound to a collection URL.
    pub(crate) fn new(client: Arc<dyn OctaneHttpClient>, url: String) -> Self {
        Self {
            client,
            url,
        }
    }

    /// Returns the collection URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Starts a collection read.
    #[must_use]
    pub fn get(&self) -> GetEntities<'_> {
        GetEntities {
            list: self,
            fields: Vec::new(),
            query: None,
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Addresses a single entity by id.
    #[must_use]
    pub fn at(&self, id: &str) -> EntityById {
        EntityById {
            client: Arc::clone(&self.client),
            url: join_path(&self.url, &encode_segment(id)),
        }
    }

    /// Creates entities and returns the server representation.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn create(&self, entities: &[EntityModel]) -> Result<OctaneCollection, OctaneError> {
        let request = OctaneHttpRequest::post_json(
            self.url.as_str(),
            &DataEnvelope {
                data: entities,
            },
        )?;
        send_checked(self.client.as_ref(), &request)?.decode()
    }

    /// Updates entities in bulk; every entity must carry its `id`.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn update(&self, entities: &[EntityModel]) -> Result<OctaneCollection, OctaneError> {
        let request = OctaneHttpRequest::put_json(
            self.url.as_str(),
            &DataEnvelope {
                data: entities,
            },
        )?;
        send_checked(self.client.as_ref(), &request)?.decode()
    }

    /// Deletes every entity matching `query`.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails.
    pub fn delete(&self, query: &Query) -> Result<(), OctaneError> {
        let url = with_query_params(&self.url, &[("query", quoted(query))])?;
        send_checked(self.client.as_ref(), &OctaneHttpRequest::delete(url))?;
        Ok(())
    }

    /// Sends a collection read to `url`.
    fn fetch(&self, url: String) -> Result<OctaneCollection, OctaneError> {
        send_checked(self.client.as_ref(), &OctaneHttpRequest::get(url))?.decode()
    }
}

/// Collection read request builder.
#[derive(Clone)]
pub struct GetEntities<'a> {
    /// Target collection.
    list: &'a EntityList,
    /// Fields to return.
    fields: Vec<String>,
    /// Optional filter.
    query: Option<Query>,
    /// Sort keys; descending keys carry a `-` prefix.
    order_by: Vec<String>,
    /// Maximum entities per page.
    limit: Option<u32>,
    /// Index of the first entity.
    offset: Option<u32>,
}

impl GetEntities<'_> {
    /// Adds fields to return.
    #[must_use]
    pub fn add_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields.extend(fields.into_iter().map(Into::into));
        self
    }

    /// Sets the filter.
    #[must_use]
    pub fn query(mut self, query: Query) -> Self {
        self.query = Some(query);
        self
    }

    /// Adds a sort key.
    #[must_use]
    pub fn add_order_by(mut self, field: &str, ascending: bool) -> Self {
        let key = if ascending { field.to_string() } else { format!("-{field}") };
        self.order_by.push(key);
        self
    }

    /// Sets the page size.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sets the index of the first entity.
    #[must_use]
    pub const fn offset(mut self, offset: u32) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Returns the request URL with all parameters applied.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Config`] when the collection URL is not a valid URL.
    pub fn url(&self) -> Result<String, OctaneError> {
        let mut params: Vec<(&str, String)> = Vec::new();
        if !self.fields.is_empty() {
            params.push(("fields", self.fields.join(",")));
        }
        if let Some(query) = &self.query {
            params.push(("query", quoted(query)));
        }
        if !self.order_by.is_empty() {
            params.push(("order_by", self.order_by.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(offset) = self.offset {
            params.push(("offset", offset.to_string()));
        }
        with_query_params(&self.list.url, &params)
    }

    /// Fetches one page.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn execute(&self) -> Result<OctaneCollection, OctaneError> {
        self.list.fetch(self.url()?)
    }

    /// Fetches every page starting at the configured offset.
    ///
    /// Paging stops once `total_count` entities have been read, or on an empty
    /// page, or on a short page when the server reports no total.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError::Config`] for a zero page size, or any error of
    /// [`GetEntities::execute`].
    pub fn execute_all(&self, page_size: u32) -> Result<Vec<EntityModel>, OctaneError> {
        if page_size == 0 {
            return Err(OctaneError::Config("page size must be greater than zero".to_string()));
        }
        let mut offset = self.offset.unwrap_or(0);
        let mut entities = Vec::new();
        loop {
            let page = self.clone().limit(page_size).offset(offset).execute()?;
            let received = page.data.len();
            let total = page.total_count;
            entities.extend(page.data);
            if received == 0 {
                break;
            }
            offset = offset.saturating_add(u32::try_from(received).unwrap_or(u32::MAX));
            let short_page = u32::try_from(received).is_ok_and(|count| count < page_size);
            match total {
                Some(total) if u64::from(offset) >= total => break,
                None if short_page => break,
                _ => {}
            }
            if offset == u32::MAX {
                break;
            }
        }
        Ok(entities)
    }
}

/// Single entity context.
#[derive(Clone)]
pub struct EntityById {
    /// Transport.
    client: Arc<dyn OctaneHttpClient>,
    /// Entity URL.
    url: String,
}

impl EntityById {
    /// Returns the entity URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Reads the entity, optionally restricted to `fields`.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn get(&self, fields: &[&str]) -> Result<EntityModel, OctaneError> {
        let params = if fields.is_empty() { Vec::new() } else { vec![("fields", fields.join(","))] };
        let url = with_query_params(&self.url, &params)?;
        send_checked(self.client.as_ref(), &OctaneHttpRequest::get(url))?.decode()
    }

    /// Updates the entity and returns the server representation.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn update(&self, entity: &EntityModel) -> Result<EntityModel, OctaneError> {
        let request = OctaneHttpRequest::put_json(self.url.as_str(), entity)?;
        send_checked(self.client.as_ref(), &request)?.decode()
    }

    /// Deletes the entity.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails.
    pub fn delete(&self) -> Result<(), OctaneError> {
        send_checked(self.client.as_ref(), &OctaneHttpRequest::delete(self.url.as_str()))?;
        Ok(())
    }
}

/// Wraps a query expression in the double quotes the `query` parameter expects.
pub(crate) fn quoted(query: &Query) -> String {
    format!("\"{query}\"")
}
