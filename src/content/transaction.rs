/*!
 * Content Transactions
 * Incremental, tag-checked updates of a single content
 */

use super::errors::ContentError;
use super::item::{ContentItem, ContentNode};
use super::storage::{LocalContent, LocalContentStorage};
use crate::storage::{Command, StorageError, StorageResult, Update, UpdateOp};
use crate::value::AttributeValue;
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

/// Entity carried by a content `add` command
#[derive(Debug, Clone)]
pub enum ContentEntity {
    /// Complete item, added at path `[item]`
    Item(ContentItem),
    /// Subtree or value, added at path `[item, key...]`
    Node(ContentNode),
}

/// Content update: ordered commands from one tag to another
pub type ContentUpdate = Update<ContentEntity>;

/// Working copy of one content
///
/// Commands modify the copy only; the live storage is untouched until the
/// committed result is swapped in by the caller. After the first failed
/// command the transaction refuses any further work.
#[derive(Debug)]
pub struct ContentTransaction {
    content_id: String,
    tag: Uuid,
    items: ahash::HashMap<String, Arc<ContentItem>>,
    error: Option<StorageError>,
}

impl ContentTransaction {
    pub(super) fn new(content: Arc<LocalContent>) -> Self {
        Self {
            content_id: content.id().to_string(),
            tag: content.tag().unwrap_or_else(Uuid::nil),
            items: content.items().clone(),
            error: None,
        }
    }

    pub fn content_id(&self) -> &str {
        &self.content_id
    }

    /// Tag the content will carry once committed
    pub fn tag(&self) -> Uuid {
        self.tag
    }

    /// Apply an update whose `from_tag` must match the transaction's tag
    pub fn apply(&mut self, update: &ContentUpdate) -> StorageResult<()> {
        if let Some(err) = &self.error {
            return Err(StorageError::TransactionFailed(Box::new(err.clone())));
        }

        if update.from_tag != self.tag {
            return Err(self.fail(StorageError::TagMismatch {
                expected: update.from_tag,
                actual: self.tag,
            }));
        }

        for command in &update.commands {
            if let Err(err) = self.apply_command(command) {
                return Err(self.fail(err));
            }
        }

        debug!(
            "Applied {} commands to content {:?}: {} -> {}",
            update.len(),
            self.content_id,
            self.tag,
            update.to_tag
        );
        self.tag = update.to_tag;
        Ok(())
    }

    /// Produce a new storage holding the modified content
    pub fn commit(self, storage: &LocalContentStorage) -> StorageResult<LocalContentStorage> {
        if let Some(err) = self.error {
            return Err(StorageError::TransactionFailed(Box::new(err)));
        }
        let content = LocalContent::from_parts(self.content_id, Some(self.tag), self.items);
        Ok(storage.with_content(content))
    }

    fn fail(&mut self, err: StorageError) -> StorageError {
        self.error = Some(err.clone());
        err
    }

    fn apply_command(&mut self, command: &Command<ContentEntity>) -> StorageResult<()> {
        let (item_id, keys) = command.path.split_first().ok_or(StorageError::EmptyPath)?;
        if command.op == UpdateOp::Add && command.entity.is_none() {
            return Err(StorageError::MissingEntity(UpdateOp::Add.name()));
        }

        match (command.op, keys.is_empty()) {
            (UpdateOp::Add, true) => {
                let Some(ContentEntity::Item(item)) = &command.entity else {
                    return Err(StorageError::EntityMismatch {
                        entity: entity_name(command.entity.as_ref()),
                        parent: format!("content {:?}", self.content_id),
                    });
                };
                if item.id() != item_id {
                    return Err(StorageError::InvalidNode(format!(
                        "item {:?} added at path of {:?}",
                        item.id(),
                        item_id
                    )));
                }
                self.items.insert(item_id.clone(), Arc::new(item.clone()));
            }
            (UpdateOp::Add, false) => {
                let Some(ContentEntity::Node(node)) = &command.entity else {
                    return Err(StorageError::EntityMismatch {
                        entity: entity_name(command.entity.as_ref()),
                        parent: format!("item {item_id:?}"),
                    });
                };
                let item = self.existing(&command.path, item_id)?;
                let path = parse_keys(&item, &command.path, keys)?;
                let updated = item
                    .with_node(&path, node.clone())
                    .map_err(|err| content_error(&command.path, err))?;
                self.items.insert(item_id.clone(), Arc::new(updated));
            }
            (UpdateOp::Delete, true) => {
                if self.items.remove(item_id).is_none() {
                    return Err(StorageError::PathNotFound {
                        path: command.path.clone(),
                        reason: format!("no item {item_id:?}"),
                    });
                }
            }
            (UpdateOp::Delete, false) => {
                let item = self.existing(&command.path, item_id)?;
                let path = parse_keys(&item, &command.path, keys)?;
                let updated = item
                    .without(&path)
                    .map_err(|err| content_error(&command.path, err))?;
                self.items.insert(item_id.clone(), Arc::new(updated));
            }
        }
        Ok(())
    }

    fn existing(&self, path: &[String], item_id: &str) -> StorageResult<Arc<ContentItem>> {
        self.items
            .get(item_id)
            .cloned()
            .ok_or_else(|| StorageError::PathNotFound {
                path: path.to_vec(),
                reason: format!("no item {item_id:?}"),
            })
    }
}

fn entity_name(entity: Option<&ContentEntity>) -> &'static str {
    match entity {
        Some(ContentEntity::Item(_)) => "content item",
        Some(ContentEntity::Node(_)) | None => "content value",
    }
}

fn parse_keys(item: &ContentItem, path: &[String], keys: &[String]) -> StorageResult<Vec<AttributeValue>> {
    keys.iter()
        .enumerate()
        .map(|(depth, key)| {
            item.parse_key(depth, key).map_err(|err| StorageError::InvalidKey {
                path: path.to_vec(),
                key: key.clone(),
                reason: err.to_string(),
            })
        })
        .collect()
}

fn content_error(path: &[String], err: ContentError) -> StorageError {
    match err {
        ContentError::KeyNotFound(key) => StorageError::PathNotFound {
            path: path.to_vec(),
            reason: format!("no key {key}"),
        },
        other => StorageError::InvalidNode(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{Kind, ValueType};

    fn storage(tag: Uuid) -> LocalContentStorage {
        let mut map = ahash::HashMap::default();
        map.insert(
            "a".to_string(),
            Arc::new(ContentNode::Value(AttributeValue::String("x".into()))),
        );
        let item = ContentItem::new("i", ValueType::String, vec![Kind::String], ContentNode::Strings(map)).unwrap();
        LocalContentStorage::new([LocalContent::new("c", Some(tag), [item]).unwrap()])
    }

    fn key(s: &str) -> [AttributeValue; 1] {
        [AttributeValue::String(s.to_string())]
    }

    #[test]
    fn test_add_and_delete_keys() {
        let (t0, t1) = (Uuid::new_v4(), Uuid::new_v4());
        let live = storage(t0);

        let mut update = ContentUpdate::new(t0, t1);
        update.append(Command::add(
            vec!["i".into(), "b".into()],
            ContentEntity::Node(ContentNode::Value(AttributeValue::String("y".into()))),
        ));
        update.append(Command::delete(vec!["i".into(), "a".into()]));

        let mut tx = live.new_transaction("c", t0).unwrap();
        tx.apply(&update).unwrap();
        let committed = tx.commit(&live).unwrap();

        assert_eq!(committed.tag("c"), Some(t1));
        assert_eq!(
            committed.get("c", "i", &key("b")),
            Some(&AttributeValue::String("y".into()))
        );
        assert_eq!(committed.get("c", "i", &key("a")), None);

        // Live storage unchanged
        assert_eq!(live.tag("c"), Some(t0));
        assert!(live.get("c", "i", &key("a")).is_some());
    }

    #[test]
    fn test_failed_transaction_is_poisoned() {
        let (t0, t1) = (Uuid::new_v4(), Uuid::new_v4());
        let live = storage(t0);

        let mut bad = ContentUpdate::new(t0, t1);
        bad.append(Command::delete(vec!["missing".into()]));

        let mut tx = live.new_transaction("c", t0).unwrap();
        assert!(matches!(tx.apply(&bad), Err(StorageError::PathNotFound { .. })));

        let good = ContentUpdate::new(t0, t1);
        assert!(matches!(tx.apply(&good), Err(StorageError::TransactionFailed(_))));
        assert!(tx.commit(&live).is_err());
    }

    #[test]
    fn test_wrong_value_type_rejected() {
        let (t0, t1) = (Uuid::new_v4(), Uuid::new_v4());
        let live = storage(t0);

        let mut update = ContentUpdate::new(t0, t1);
        update.append(Command::add(
            vec!["i".into(), "b".into()],
            ContentEntity::Node(ContentNode::Value(AttributeValue::Integer(1))),
        ));

        let mut tx = live.new_transaction("c", t0).unwrap();
        assert!(matches!(tx.apply(&update), Err(StorageError::InvalidNode(_))));
    }
}
