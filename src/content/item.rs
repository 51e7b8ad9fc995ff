/*!
 * Content Items
 * Named lookup tables keyed by one or more typed keys
 */

use super::errors::{ContentError, ContentResult};
use crate::value::{canonical_network, parse_network, AttributeValue, Domain, Kind, ValueType};
use ipnetwork::IpNetwork;
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::sync::Arc;

/// Node of a content lookup tree
///
/// Inner nodes are maps keyed by one key kind; leaves hold the item's values.
/// Children are shared so a modified copy of a tree only clones the maps on
/// the modified path.
#[derive(Debug, Clone)]
pub enum ContentNode {
    Strings(ahash::HashMap<String, Arc<ContentNode>>),
    Addresses(ahash::HashMap<IpAddr, Arc<ContentNode>>),
    Networks(NetworkTable),
    Domains(ahash::HashMap<String, Arc<ContentNode>>),
    Value(AttributeValue),
}

impl ContentNode {
    /// Empty map for a key kind
    pub fn map(key: Kind) -> ContentResult<Self> {
        Ok(match key {
            Kind::String => ContentNode::Strings(Default::default()),
            Kind::Address => ContentNode::Addresses(Default::default()),
            Kind::Network => ContentNode::Networks(NetworkTable::default()),
            Kind::Domain => ContentNode::Domains(Default::default()),
            other => return Err(ContentError::UnsupportedKey(other)),
        })
    }

    /// Key kind of a map node, `None` for leaves
    pub fn key_kind(&self) -> Option<Kind> {
        match self {
            ContentNode::Strings(_) => Some(Kind::String),
            ContentNode::Addresses(_) => Some(Kind::Address),
            ContentNode::Networks(_) => Some(Kind::Network),
            ContentNode::Domains(_) => Some(Kind::Domain),
            ContentNode::Value(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ContentNode::Strings(map) => map.len(),
            ContentNode::Addresses(map) => map.len(),
            ContentNode::Networks(table) => table.len(),
            ContentNode::Domains(map) => map.len(),
            ContentNode::Value(_) => 1,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn children(&self) -> Box<dyn Iterator<Item = &Arc<ContentNode>> + '_> {
        match self {
            ContentNode::Strings(map) => Box::new(map.values()),
            ContentNode::Addresses(map) => Box::new(map.values()),
            ContentNode::Networks(table) => Box::new(table.values()),
            ContentNode::Domains(map) => Box::new(map.values()),
            ContentNode::Value(_) => Box::new(std::iter::empty()),
        }
    }

    /// Lookup with matching semantics
    ///
    /// Network maps match addresses by longest prefix; domain maps match the
    /// closest parent domain.
    fn lookup(&self, key: &AttributeValue) -> ContentResult<Option<&Arc<ContentNode>>> {
        match (self, key) {
            (ContentNode::Strings(map), AttributeValue::String(s)) => Ok(map.get(s.as_str())),
            (ContentNode::Addresses(map), AttributeValue::Address(a)) => Ok(map.get(a)),
            (ContentNode::Networks(table), AttributeValue::Address(a)) => Ok(table.longest_match(*a)),
            (ContentNode::Networks(table), AttributeValue::Network(n)) => Ok(table.get(n)),
            (ContentNode::Domains(map), AttributeValue::Domain(d)) => {
                Ok(d.suffixes().find_map(|suffix| map.get(suffix)))
            }
            (node, key) => Err(ContentError::InvalidKeyKind {
                expected: node.key_kind().unwrap_or(Kind::String),
                actual: key.kind(),
            }),
        }
    }

    /// Exact-key lookup used by modifications
    fn get_exact(&self, key: &AttributeValue) -> ContentResult<Option<&Arc<ContentNode>>> {
        match (self, key) {
            (ContentNode::Domains(map), AttributeValue::Domain(d)) => Ok(map.get(d.as_str())),
            (ContentNode::Networks(_), AttributeValue::Address(_)) => Err(ContentError::InvalidKeyKind {
                expected: Kind::Network,
                actual: Kind::Address,
            }),
            _ => self.lookup(key),
        }
    }

    /// Store `node` under `key`, replacing an existing entry
    pub fn insert(&mut self, key: AttributeValue, node: Arc<ContentNode>) -> ContentResult<()> {
        match (self, key) {
            (ContentNode::Strings(map), AttributeValue::String(s)) => {
                map.insert(s, node);
            }
            (ContentNode::Addresses(map), AttributeValue::Address(a)) => {
                map.insert(a, node);
            }
            (ContentNode::Networks(table), AttributeValue::Network(n)) => {
                table.insert(n, node);
            }
            (ContentNode::Domains(map), AttributeValue::Domain(d)) => {
                map.insert(d.as_str().to_string(), node);
            }
            (this, key) => {
                return Err(ContentError::InvalidKeyKind {
                    expected: this.key_kind().unwrap_or(Kind::String),
                    actual: key.kind(),
                })
            }
        }
        Ok(())
    }

    fn remove(&mut self, key: &AttributeValue) -> ContentResult<bool> {
        Ok(match (self, key) {
            (ContentNode::Strings(map), AttributeValue::String(s)) => map.remove(s.as_str()).is_some(),
            (ContentNode::Addresses(map), AttributeValue::Address(a)) => map.remove(a).is_some(),
            (ContentNode::Networks(table), AttributeValue::Network(n)) => table.remove(n).is_some(),
            (ContentNode::Domains(map), AttributeValue::Domain(d)) => map.remove(d.as_str()).is_some(),
            (this, key) => {
                return Err(ContentError::InvalidKeyKind {
                    expected: this.key_kind().unwrap_or(Kind::String),
                    actual: key.kind(),
                })
            }
        })
    }
}

/// Networks indexed by prefix length
///
/// An address lookup checks one map per distinct prefix length, longest
/// first. Exact-network lookups, inserts and removals are one hash lookup each.
#[derive(Debug, Clone, Default)]
pub struct NetworkTable {
    by_prefix: BTreeMap<u8, ahash::HashMap<IpNetwork, Arc<ContentNode>>>,
    len: usize,
}

impl NetworkTable {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, network: &IpNetwork) -> Option<&Arc<ContentNode>> {
        let network = canonical_network(*network);
        self.by_prefix.get(&network.prefix())?.get(&network)
    }

    /// Entry of the most specific network containing `address`
    pub fn longest_match(&self, address: IpAddr) -> Option<&Arc<ContentNode>> {
        self.by_prefix.iter().rev().find_map(|(&prefix, networks)| {
            // Prefixes longer than the address family allows don't apply
            let network = IpNetwork::new(address, prefix).ok()?;
            networks.get(&canonical_network(network))
        })
    }

    pub fn insert(&mut self, network: IpNetwork, node: Arc<ContentNode>) -> Option<Arc<ContentNode>> {
        let network = canonical_network(network);
        let previous = self
            .by_prefix
            .entry(network.prefix())
            .or_default()
            .insert(network, node);
        if previous.is_none() {
            self.len += 1;
        }
        previous
    }

    pub fn remove(&mut self, network: &IpNetwork) -> Option<Arc<ContentNode>> {
        let network = canonical_network(*network);
        let networks = self.by_prefix.get_mut(&network.prefix())?;
        let removed = networks.remove(&network)?;
        if networks.is_empty() {
            self.by_prefix.remove(&network.prefix());
        }
        self.len -= 1;
        Some(removed)
    }

    pub fn values(&self) -> impl Iterator<Item = &Arc<ContentNode>> + '_ {
        self.by_prefix.values().flat_map(|networks| networks.values())
    }
}

impl FromIterator<(IpNetwork, Arc<ContentNode>)> for NetworkTable {
    fn from_iter<I: IntoIterator<Item = (IpNetwork, Arc<ContentNode>)>>(entries: I) -> Self {
        let mut table = NetworkTable::default();
        for (network, node) in entries {
            table.insert(network, node);
        }
        table
    }
}

/// Parse key text for a key kind
pub fn parse_key(kind: Kind, text: &str) -> ContentResult<AttributeValue> {
    Ok(match kind {
        Kind::String => AttributeValue::String(text.to_string()),
        Kind::Address => AttributeValue::parse(&ValueType::Address, text)?,
        Kind::Network => AttributeValue::Network(parse_network(text)?),
        Kind::Domain => AttributeValue::Domain(Domain::parse(text)?),
        other => return Err(ContentError::UnsupportedKey(other)),
    })
}

/// Typed lookup table
#[derive(Debug, Clone)]
pub struct ContentItem {
    id: String,
    value_type: ValueType,
    keys: Vec<Kind>,
    root: Arc<ContentNode>,
}

impl ContentItem {
    /// Build an item, checking key kinds and the shape of the tree
    pub fn new(
        id: impl Into<String>,
        value_type: ValueType,
        keys: Vec<Kind>,
        root: ContentNode,
    ) -> ContentResult<Self> {
        let item = Self {
            id: id.into(),
            value_type,
            keys,
            root: Arc::new(root),
        };
        for key in &item.keys {
            ContentNode::map(*key)?;
        }
        item.validate(&item.root, 0)?;
        Ok(item)
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn keys(&self) -> &[Kind] {
        &self.keys
    }

    pub fn root(&self) -> &ContentNode {
        &self.root
    }

    /// Resolve a key path to a value
    pub fn get(&self, path: &[AttributeValue]) -> ContentResult<&AttributeValue> {
        if path.len() != self.keys.len() {
            return Err(ContentError::InvalidPathLength {
                expected: self.keys.len(),
                actual: path.len(),
            });
        }

        let mut node = &self.root;
        for key in path {
            node = node
                .lookup(key)?
                .ok_or_else(|| ContentError::KeyNotFound(key.describe()))?;
        }

        match node.as_ref() {
            ContentNode::Value(value) => Ok(value),
            _ => Err(ContentError::InvalidItem(format!(
                "item {:?} has a map where a value belongs",
                self.id
            ))),
        }
    }

    /// Parse the text of the key at `depth`
    pub fn parse_key(&self, depth: usize, text: &str) -> ContentResult<AttributeValue> {
        let kind = self.keys.get(depth).copied().ok_or(ContentError::InvalidPathLength {
            expected: self.keys.len(),
            actual: depth + 1,
        })?;
        parse_key(kind, text)
    }

    /// Copy of the item with `node` stored under the key path
    ///
    /// Missing intermediate maps are created. `node` must have the shape
    /// expected at the depth right after the path.
    pub fn with_node(&self, path: &[AttributeValue], node: ContentNode) -> ContentResult<Self> {
        if path.is_empty() || path.len() > self.keys.len() {
            return Err(ContentError::InvalidPathLength {
                expected: self.keys.len(),
                actual: path.len(),
            });
        }
        self.validate(&node, path.len())?;

        let root = put(&self.root, &self.keys, path, Arc::new(node))?;
        Ok(Self {
            root: Arc::new(root),
            ..self.clone()
        })
    }

    /// Copy of the item without the entry at the key path
    pub fn without(&self, path: &[AttributeValue]) -> ContentResult<Self> {
        if path.is_empty() || path.len() > self.keys.len() {
            return Err(ContentError::InvalidPathLength {
                expected: self.keys.len(),
                actual: path.len(),
            });
        }
        let root = delete(&self.root, path)?;
        Ok(Self {
            root: Arc::new(root),
            ..self.clone()
        })
    }

    fn validate(&self, node: &ContentNode, depth: usize) -> ContentResult<()> {
        match (self.keys.get(depth), node) {
            (None, ContentNode::Value(value)) => {
                if value.is_of(&self.value_type) {
                    Ok(())
                } else {
                    Err(ContentError::InvalidItem(format!(
                        "item {:?} expects {} values, got {}",
                        self.id,
                        self.value_type,
                        value.value_type()
                    )))
                }
            }
            (None, _) => Err(ContentError::InvalidItem(format!(
                "item {:?} has more map levels than its {} keys",
                self.id,
                self.keys.len()
            ))),
            (Some(expected), node) if node.key_kind() == Some(*expected) => node
                .children()
                .try_for_each(|child| self.validate(child, depth + 1)),
            (Some(expected), _) => Err(ContentError::InvalidItem(format!(
                "item {:?} expects a map by {} at depth {}",
                self.id, expected, depth
            ))),
        }
    }
}

fn put(
    node: &ContentNode,
    keys: &[Kind],
    path: &[AttributeValue],
    leaf: Arc<ContentNode>,
) -> ContentResult<ContentNode> {
    let mut copy = node.clone();
    let Some((first, rest)) = path.split_first() else {
        return Ok(copy);
    };

    if rest.is_empty() {
        copy.insert(first.clone(), leaf)?;
        return Ok(copy);
    }

    let child = match copy.get_exact(first)? {
        Some(existing) => put(existing, &keys[1..], rest, leaf)?,
        None => put(&ContentNode::map(keys[1])?, &keys[1..], rest, leaf)?,
    };
    copy.insert(first.clone(), Arc::new(child))?;
    Ok(copy)
}

fn delete(node: &ContentNode, path: &[AttributeValue]) -> ContentResult<ContentNode> {
    let mut copy = node.clone();
    let Some((first, rest)) = path.split_first() else {
        return Ok(copy);
    };

    if rest.is_empty() {
        if !copy.remove(first)? {
            return Err(ContentError::KeyNotFound(first.describe()));
        }
        return Ok(copy);
    }

    let child = match copy.get_exact(first)? {
        Some(existing) => delete(existing, rest)?,
        None => return Err(ContentError::KeyNotFound(first.describe())),
    };
    copy.insert(first.clone(), Arc::new(child))?;
    Ok(copy)
}
