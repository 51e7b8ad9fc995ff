/*!
 * Content Documents
 * Build local content and content updates from JSON
 */

use super::errors::{AtPath, DocumentError, DocumentResult};
use super::schema::{ContentDocument, RawCommand, RawItem};
use super::value::{shape, to_value};
use crate::content::{parse_key, ContentEntity, ContentItem, ContentNode, ContentUpdate, LocalContent};
use crate::storage::{Command, UpdateOp};
use crate::value::{Kind, ValueError, ValueType};
use serde_json::Value as Json;
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Parse a complete content document
///
/// `tag` overrides the tag written in the document.
pub fn parse_content(data: &[u8], tag: Option<Uuid>) -> DocumentResult<LocalContent> {
    let doc: ContentDocument = serde_json::from_slice(data)?;
    let items = doc
        .items
        .iter()
        .map(|(id, raw)| build_item(id, raw, &format!("items/{id}")))
        .collect::<DocumentResult<Vec<_>>>()?;

    debug!(content = %doc.id, items = items.len(), "Parsed content document");
    LocalContent::new(doc.id, tag.or(doc.tag), items).at("items")
}

/// Parse content update commands
///
/// Node entities are typed by their item, taken from `content` or from an
/// item added earlier in the same update.
pub fn parse_content_update(
    data: &[u8],
    from_tag: Uuid,
    to_tag: Uuid,
    content: &LocalContent,
) -> DocumentResult<ContentUpdate> {
    let commands: Vec<RawCommand<Json>> = serde_json::from_slice(data)?;
    let mut added: ahash::HashMap<String, (ValueType, Vec<Kind>)> = Default::default();

    let mut update = ContentUpdate::new(from_tag, to_tag);
    for (i, raw) in commands.into_iter().enumerate() {
        let path = format!("commands/{i}");
        let entity = match (&raw.entity, raw.path.split_first()) {
            (Some(json), Some((item_id, keys))) if raw.op == UpdateOp::Add => {
                if keys.is_empty() {
                    let item: RawItem = serde_json::from_value(json.clone())?;
                    let item = build_item(item_id, &item, &path)?;
                    added.insert(
                        item_id.clone(),
                        (item.value_type().clone(), item.keys().to_vec()),
                    );
                    Some(ContentEntity::Item(item))
                } else {
                    let (ty, item_keys) = match added.get(item_id.as_str()) {
                        Some((ty, item_keys)) => (ty.clone(), item_keys.clone()),
                        None => {
                            let item = content.item(item_id).ok_or_else(|| DocumentError::UnknownItem {
                                path: path.clone(),
                                item: item_id.clone(),
                            })?;
                            (item.value_type().clone(), item.keys().to_vec())
                        }
                    };
                    let rest = item_keys.get(keys.len()..).ok_or_else(|| DocumentError::Shape {
                        path: path.clone(),
                        expected: format!("at most {} keys", item_keys.len()),
                        found: "longer path",
                    })?;
                    Some(ContentEntity::Node(build_node(&ty, rest, json, &path)?))
                }
            }
            // Deletes carry no entity and empty paths are rejected by the transaction
            _ => None,
        };

        if raw.op == UpdateOp::Delete && raw.path.len() == 1 {
            added.remove(raw.path[0].as_str());
        }
        update.append(Command {
            op: raw.op,
            path: raw.path,
            entity,
        });
    }
    Ok(update)
}

fn build_item(id: &str, raw: &RawItem, path: &str) -> DocumentResult<ContentItem> {
    let ty = Kind::from_name(&raw.ty)
        .and_then(ValueType::builtin)
        .ok_or_else(|| ValueError::UnknownType(raw.ty.clone()))
        .at(path)?;
    let keys = raw
        .keys
        .iter()
        .map(|name| {
            Kind::from_name(name)
                .ok_or_else(|| ValueError::UnknownType(name.clone()))
                .at(path)
        })
        .collect::<DocumentResult<Vec<_>>>()?;

    let root = build_node(&ty, &keys, &raw.data, &format!("{path}/data"))?;
    ContentItem::new(id, ty, keys, root).at(path)
}

/// Build the subtree for the remaining `keys`, one JSON object per key
fn build_node(ty: &ValueType, keys: &[Kind], json: &Json, path: &str) -> DocumentResult<ContentNode> {
    let Some((kind, rest)) = keys.split_first() else {
        return to_value(ty, json, path).map(ContentNode::Value);
    };
    let Json::Object(map) = json else {
        return Err(shape(path, format!("an object keyed by {kind}"), json));
    };

    let mut node = ContentNode::map(*kind).at(path)?;
    for (key, child) in map {
        let child_path = format!("{path}/{key}");
        let key = parse_key(*kind, key).at(&child_path)?;
        let child = build_node(ty, rest, child, &child_path)?;
        node.insert(key, Arc::new(child)).at(&child_path)?;
    }
    Ok(node)
}
