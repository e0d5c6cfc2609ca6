// crates/octane-sdk/src/attachments.rs
// ============================================================================
// Module: Octane Attachments
// Description: Attachment list and single-attachment contexts.
// Purpose: Upload, list, download, and delete attachments in the current scope.
// Dependencies: serde_json
// ============================================================================

//! ## Overview
//! [`AttachmentList`] is bound to `{base}/attachments`. Listing reuses the
//! entity read builder; uploads are multipart requests carrying an `entity`
//! JSON part (name and owner reference) and a binary `content` part. Binary
//! downloads request `application/octet-stream`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::entities::EntityById;
use crate::entities::EntityList;
use crate::entities::EntityModel;
use crate::entities::GetEntities;
use crate::entities::OctaneCollection;
use crate::error::OctaneError;
use crate::http::AcceptType;
use crate::http::HttpMethod;
use crate::http::MultipartPart;
use crate::http::OctaneHttpClient;
use crate::http::OctaneHttpRequest;
use crate::http::send_checked;

// ============================================================================
// SECTION: Upload Types
// ============================================================================

/// Entity that owns an attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentOwner {
    /// Owner reference field on the attachment, e.g. `owner_work_item`.
    pub field: String,
    /// Owner entity type, e.g. `work_item`.
    pub entity_type: String,
    /// Owner entity id.
    pub id: String,
}

impl AttachmentOwner {
    /// Creates an owner reference.
    #[must_use]
    pub fn new(field: &str, entity_type: &str, id: &str) -> Self {
        Self {
            field: field.to_string(),
            entity_type: entity_type.to_string(),
            id: id.to_string(),
        }
    }

    /// Owner reference for any work item (defect, story, feature, ...).
    #[must_use]
    pub fn work_item(id: &str) -> Self {
        Self::new("owner_work_item", "work_item", id)
    }

    /// Owner reference for a test.
    #[must_use]
    pub fn test(id: &str) -> Self {
        Self::new("owner_test", "test", id)
    }
}

/// Attachment upload request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAttachment {
    /// File name shown in Octane.
    pub name: String,
    /// Owning entity.
    pub owner: AttachmentOwner,
    /// Media type of `content`.
    pub content_type: String,
    /// File bytes.
    pub content: Vec<u8>,
}

impl NewAttachment {
    /// Builds the multipart parts for the upload.
    fn into_parts(self) -> Result<Vec<MultipartPart>, OctaneError> {
        let mut entity = EntityModel::new().with("name", self.name.as_str());
        entity.set_reference(&self.owner.field, &self.owner.entity_type, &self.owner.id);
        let entity_bytes = serde_json::to_vec(&entity)
            .map_err(|err| OctaneError::Json(format!("attachment entity failed: {err}")))?;
        Ok(vec![
            MultipartPart {
                name: "entity".to_string(),
                file_name: None,
                content_type: "application/json".to_string(),
                bytes: entity_bytes,
            },
            MultipartPart {
                name: "content".to_string(),
                file_name: Some(self.name),
                content_type: self.content_type,
                bytes: self.content,
            },
        ])
    }
}

// ============================================================================
// SECTION: Attachment Contexts
// ============================================================================

/// Attachment collection context.
#[derive(Clone)]
pub struct AttachmentList {
    /// Transport.
    client: Arc<dyn OctaneHttpClient>,
    /// Attachments as an entity collection.
    entities: EntityList,
}

impl AttachmentList {
    /// Creates a context bound to an attachments URL.
    pub(crate) fn new(client: Arc<dyn OctaneHttpClient>, url: String) -> Self {
        Self {
            entities: EntityList::new(Arc::clone(&client), url),
            client,
        }
    }

    /// Returns the attachments URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.entities.url()
    }

    /// Starts an attachment listing.
    #[must_use]
    pub fn get(&self) -> GetEntities<'_> {
        self.entities.get()
    }

    /// Uploads an attachment and returns the created attachment entities.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the upload fails or the response is invalid.
    pub fn create(&self, attachment: NewAttachment) -> Result<OctaneCollection, OctaneError> {
        let request = OctaneHttpRequest::new(HttpMethod::Post, self.url())
            .with_multipart(attachment.into_parts()?);
        send_checked(self.client.as_ref(), &request)?.decode()
    }

    /// Addresses a single attachment by id.
    #[must_use]
    pub fn at(&self, id: &str) -> AttachmentById {
        AttachmentById {
            client: Arc::clone(&self.client),
            entity: self.entities.at(id),
        }
    }
}

/// Single attachment context.
#[derive(Clone)]
pub struct AttachmentById {
    /// Transport.
    client: Arc<dyn OctaneHttpClient>,
    /// Attachment as an entity.
    entity: EntityById,
}

impl AttachmentById {
    /// Returns the attachment URL.
    #[must_use]
    pub fn url(&self) -> &str {
        self.entity.url()
    }

    /// Reads the attachment entity (name, size, owner, ...).
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails or the response is invalid.
    pub fn get(&self) -> Result<EntityModel, OctaneError> {
        self.entity.get(&[])
    }

    /// Downloads the attachment bytes.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails.
    pub fn content(&self) -> Result<Vec<u8>, OctaneError> {
        let request = OctaneHttpRequest::get(self.url()).with_accept(AcceptType::OctetStream);
        Ok(send_checked(self.client.as_ref(), &request)?.body)
    }

    /// Deletes the attachment.
    ///
    /// # Errors
    ///
    /// Returns [`OctaneError`] when the request fails.
    pub fn delete(&self) -> Result<(), OctaneError> {
        self.entity.delete()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, reason = "Test-only panic-based assertions are permitted.")]

    use serde_json::Value;
    use serde_json::json;

    use super::AttachmentOwner;
    use super::NewAttachment;

    #[test]
    fn upload_parts_carry_entity_and_content() {
        let parts = NewAttachment {
            name: "log.txt".to_string(),
            owner: AttachmentOwner::work_item("1001"),
            content_type: "text/plain".to_string(),
            content: b"boom".to_vec(),
        }
        .into_parts()
        .unwrap();
        assert_eq!(parts.len(), 2);
        let entity: Value = serde_json::from_slice(&parts[0].bytes).unwrap();
        assert_eq!(
            entity,
            json!({"name": "log.txt", "owner_work_item": {"type": "work_item", "id": "1001"}})
        );
        assert_eq!(parts[1].name, "content");
        assert_eq!(parts[1].file_name.as_deref(), Some("log.txt"));
        assert_eq!(parts[1].bytes, b"boom");
    }
}
