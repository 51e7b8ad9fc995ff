/*!
 * Local Content Storage
 * Immutable, independently tagged collections of content items
 */

use super::errors::{ContentError, ContentResult};
use super::item::ContentItem;
use super::transaction::ContentTransaction;
use crate::storage::{StorageError, StorageResult};
use crate::value::AttributeValue;
use std::sync::Arc;
use uuid::Uuid;

/// Named, tagged collection of content items
#[derive(Debug, Clone)]
pub struct LocalContent {
    id: String,
    tag: Option<Uuid>,
    items: ahash::HashMap<String, Arc<ContentItem>>,
}

impl LocalContent {
    pub fn new<I>(id: impl Into<String>, tag: Option<Uuid>, items: I) -> ContentResult<Self>
    where
        I: IntoIterator<Item = ContentItem>,
    {
        let id = id.into();
        let mut map = ahash::HashMap::default();
        for item in items {
            let item_id = item.id().to_string();
            if map.insert(item_id.clone(), Arc::new(item)).is_some() {
                return Err(ContentError::InvalidItem(format!(
                    "content {id:?} declares item {item_id:?} twice"
                )));
            }
        }
        Ok(Self { id, tag, items: map })
    }

    pub(super) fn from_parts(
        id: String,
        tag: Option<Uuid>,
        items: ahash::HashMap<String, Arc<ContentItem>>,
    ) -> Self {
        Self { id, tag, items }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn tag(&self) -> Option<Uuid> {
        self.tag
    }

    pub fn item(&self, id: &str) -> Option<&Arc<ContentItem>> {
        self.items.get(id)
    }

    pub(super) fn items(&self) -> &ahash::HashMap<String, Arc<ContentItem>> {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Snapshot of every loaded content
///
/// Replacing a content produces a new storage value; the previous one stays
/// valid for whoever still holds it.
#[derive(Debug, Clone, Default)]
pub struct LocalContentStorage {
    contents: ahash::HashMap<String, Arc<LocalContent>>,
}

impl LocalContentStorage {
    pub fn new<I>(contents: I) -> Self
    where
        I: IntoIterator<Item = LocalContent>,
    {
        Self {
            contents: contents
                .into_iter()
                .map(|content| (content.id.clone(), Arc::new(content)))
                .collect(),
        }
    }

    pub fn content(&self, id: &str) -> Option<&Arc<LocalContent>> {
        self.contents.get(id)
    }

    pub fn tag(&self, content_id: &str) -> Option<Uuid> {
        self.contents.get(content_id).and_then(|content| content.tag)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> + '_ {
        self.contents.keys().map(String::as_str)
    }

    /// Find a content item
    pub fn item(&self, content_id: &str, item_id: &str) -> ContentResult<&ContentItem> {
        let content = self
            .contents
            .get(content_id)
            .ok_or_else(|| ContentError::MissingContent(content_id.to_string()))?;
        content
            .items
            .get(item_id)
            .map(Arc::as_ref)
            .ok_or_else(|| ContentError::MissingItem {
                content: content_id.to_string(),
                item: item_id.to_string(),
            })
    }

    /// Look up a value, reporting why it is missing
    pub fn lookup(
        &self,
        content_id: &str,
        item_id: &str,
        path: &[AttributeValue],
    ) -> ContentResult<&AttributeValue> {
        self.item(content_id, item_id)?.get(path)
    }

    /// Look up a value, `None` if any part of the path is missing
    pub fn get(&self, content_id: &str, item_id: &str, path: &[AttributeValue]) -> Option<&AttributeValue> {
        self.lookup(content_id, item_id, path).ok()
    }

    /// Copy of the storage with a content added or replaced
    pub fn with_content(&self, content: LocalContent) -> Self {
        let mut contents = self.contents.clone();
        contents.insert(content.id.clone(), Arc::new(content));
        Self { contents }
    }

    /// Copy of the storage without a content
    pub fn without_content(&self, id: &str) -> Self {
        let mut contents = self.contents.clone();
        contents.remove(id);
        Self { contents }
    }

    /// Open a transaction against a content's current tag
    pub fn new_transaction(&self, content_id: &str, from_tag: Uuid) -> StorageResult<ContentTransaction> {
        let content = self
            .contents
            .get(content_id)
            .ok_or_else(|| StorageError::MissingContent(content_id.to_string()))?;

        let tag = content.tag.ok_or(StorageError::MissingStorageTag)?;
        if tag != from_tag {
            return Err(StorageError::TagMismatch {
                expected: from_tag,
                actual: tag,
            });
        }

        Ok(ContentTransaction::new(content.clone()))
    }

    pub fn len(&self) -> usize {
        self.contents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}
