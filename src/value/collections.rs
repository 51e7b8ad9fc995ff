/*!
 * Collection Values
 * Insertion-ordered sets of strings, networks and domains
 */

use super::domain::Domain;
use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// Set of strings preserving first-insertion order
#[derive(Debug, Clone, Default)]
pub struct StringSet {
    items: Vec<String>,
    lookup: ahash::HashSet<String>,
}

impl StringSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a string; returns false if it was already present
    pub fn insert(&mut self, item: impl Into<String>) -> bool {
        let item = item.into();
        if self.lookup.contains(&item) {
            return false;
        }
        self.lookup.insert(item.clone());
        self.items.push(item);
        true
    }

    pub fn contains(&self, item: &str) -> bool {
        self.lookup.contains(item)
    }

    /// Elements in insertion order
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.items.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for StringSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|item| other.contains(item))
    }
}

impl<S: Into<String>> FromIterator<S> for StringSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = StringSet::new();
        for item in iter {
            set.insert(item);
        }
        set
    }
}

/// Set of networks preserving first-insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NetworkSet {
    items: Vec<IpNetwork>,
}

impl NetworkSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, network: IpNetwork) -> bool {
        let network = canonical_network(network);
        if self.items.contains(&network) {
            return false;
        }
        self.items.push(network);
        true
    }

    /// True if any network in the set contains the address
    pub fn contains_address(&self, address: IpAddr) -> bool {
        self.items.iter().any(|network| network.contains(address))
    }

    /// True if the exact network is a member
    pub fn contains_network(&self, network: &IpNetwork) -> bool {
        self.items.contains(&canonical_network(*network))
    }

    pub fn iter(&self) -> impl Iterator<Item = &IpNetwork> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl FromIterator<IpNetwork> for NetworkSet {
    fn from_iter<I: IntoIterator<Item = IpNetwork>>(iter: I) -> Self {
        let mut set = NetworkSet::new();
        for network in iter {
            set.insert(network);
        }
        set
    }
}

/// Set of domains preserving first-insertion order
///
/// Membership is hierarchical: a domain is contained if it, or any of its
/// parent domains, is in the set.
#[derive(Debug, Clone, Default)]
pub struct DomainSet {
    items: Vec<Domain>,
    lookup: ahash::HashSet<String>,
}

impl DomainSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, domain: Domain) -> bool {
        if self.lookup.contains(domain.as_str()) {
            return false;
        }
        self.lookup.insert(domain.as_str().to_string());
        self.items.push(domain);
        true
    }

    /// True if the domain or one of its parents is a member
    pub fn contains(&self, domain: &Domain) -> bool {
        domain.suffixes().any(|suffix| self.lookup.contains(suffix))
    }

    /// True if the exact domain is a member
    pub fn contains_exact(&self, domain: &Domain) -> bool {
        self.lookup.contains(domain.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Domain> + '_ {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl PartialEq for DomainSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().all(|domain| other.contains_exact(domain))
    }
}

impl FromIterator<Domain> for DomainSet {
    fn from_iter<I: IntoIterator<Item = Domain>>(iter: I) -> Self {
        let mut set = DomainSet::new();
        for domain in iter {
            set.insert(domain);
        }
        set
    }
}

/// Network with host bits cleared, so 10.1.2.3/8 and 10.0.0.0/8 compare equal
pub fn canonical_network(network: IpNetwork) -> IpNetwork {
    IpNetwork::new(network.network(), network.prefix()).unwrap_or(network)
}
