//! Parent candidates and the map that keys them by origin

use crate::CapabilitySet;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Weight used when nothing more specific is configured
pub const DEFAULT_PARENT_WEIGHT: &str = "0.999";

/// Rank used when nothing more specific is configured
pub const DEFAULT_PARENT_RANK: i32 = 1;

/// An upstream cache (or origin) a cache miss can be forwarded to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentCandidate {
    pub host: String,
    #[serde(default)]
    pub domain: String,
    pub port: u16,
    #[serde(default)]
    pub ip: String,
    /// Informational weight, emitted verbatim
    #[serde(default = "default_weight")]
    pub weight: String,
    /// Ordering key, lower first
    #[serde(default = "default_rank")]
    pub rank: i32,
    /// Address the parent by IP instead of host name
    #[serde(default)]
    pub use_ip: bool,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub secondary: bool,
    #[serde(default)]
    pub capabilities: CapabilitySet,
}

fn default_weight() -> String {
    DEFAULT_PARENT_WEIGHT.to_string()
}

fn default_rank() -> i32 {
    DEFAULT_PARENT_RANK
}

impl ParentCandidate {
    /// Identity of a parent; rank and weight never take part
    pub fn identity(&self) -> (&str, &str, u16) {
        (&self.host, &self.domain, self.port)
    }
}

/// Key of a parent pool.
///
/// The catch-all pool is its own variant so it can never collide with a
/// real origin host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParentKey {
    /// Parents configured for one origin host
    Origin(String),
    /// Parents usable by every delivery service without an override
    AllDeliveryServices,
}

impl ParentKey {
    /// Key for an origin host
    pub fn origin(host: impl Into<String>) -> Self {
        Self::Origin(host.into())
    }

    /// Host names compare case-insensitively, origin keys are stored lowercase
    fn normalized(self) -> Self {
        match self {
            Self::Origin(host) => Self::Origin(host.to_ascii_lowercase()),
            other => other,
        }
    }
}

/// One keyed pool, the on-disk shape of [`ParentCandidateMap`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentPool {
    pub key: ParentKey,
    #[serde(default)]
    pub candidates: Vec<ParentCandidate>,
}

/// Parent candidates keyed by origin host or the catch-all key
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<ParentPool>", into = "Vec<ParentPool>")]
pub struct ParentCandidateMap {
    pools: HashMap<ParentKey, Vec<ParentCandidate>>,
}

impl ParentCandidateMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Append candidates to a pool
    pub fn insert(&mut self, key: ParentKey, candidates: Vec<ParentCandidate>) {
        self.pools.entry(key.normalized()).or_default().extend(candidates);
    }

    /// Candidates stored under a key
    pub fn get(&self, key: &ParentKey) -> Option<&[ParentCandidate]> {
        self.pools.get(&key.clone().normalized()).map(Vec::as_slice)
    }

    /// Candidates for an origin host, falling back to the catch-all pool
    pub fn for_origin(&self, host: &str) -> &[ParentCandidate] {
        self.pools
            .get(&ParentKey::origin(host.to_ascii_lowercase()))
            .or_else(|| self.pools.get(&ParentKey::AllDeliveryServices))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// The catch-all pool
    pub fn all_delivery_services(&self) -> &[ParentCandidate] {
        self.get(&ParentKey::AllDeliveryServices).unwrap_or(&[])
    }

    /// True when no pool is configured
    pub fn is_empty(&self) -> bool {
        self.pools.is_empty()
    }
}

impl From<Vec<ParentPool>> for ParentCandidateMap {
    fn from(pools: Vec<ParentPool>) -> Self {
        let mut map = Self::new();
        for pool in pools {
            map.insert(pool.key, pool.candidates);
        }
        map
    }
}

impl From<ParentCandidateMap> for Vec<ParentPool> {
    fn from(map: ParentCandidateMap) -> Self {
        let mut pools: Vec<ParentPool> = map
            .pools
            .into_iter()
            .map(|(key, candidates)| ParentPool { key, candidates })
            .collect();
        // catch-all last, origins by name
        pools.sort_by(|a, b| match (&a.key, &b.key) {
            (ParentKey::Origin(x), ParentKey::Origin(y)) => x.cmp(y),
            (ParentKey::Origin(_), ParentKey::AllDeliveryServices) => std::cmp::Ordering::Less,
            (ParentKey::AllDeliveryServices, ParentKey::Origin(_)) => std::cmp::Ordering::Greater,
            _ => std::cmp::Ordering::Equal,
        });
        pools
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(host: &str) -> ParentCandidate {
        ParentCandidate {
            host: host.into(),
            domain: format!("{}-domain", host),
            port: 80,
            ip: "192.168.2.2".into(),
            weight: "1".into(),
            rank: 1,
            use_ip: false,
            primary: true,
            secondary: true,
            capabilities: CapabilitySet::new(),
        }
    }

    #[test]
    fn test_origin_then_catch_all() {
        let mut map = ParentCandidateMap::new();
        map.insert(ParentKey::origin("ds1.example.net"), vec![candidate("specific")]);
        map.insert(ParentKey::AllDeliveryServices, vec![candidate("default")]);

        assert_eq!(map.for_origin("ds1.example.net")[0].host, "specific");
        assert_eq!(map.for_origin("ds0.example.net")[0].host, "default");
    }

    #[test]
    fn test_origin_keys_ignore_case() {
        let mut map = ParentCandidateMap::new();
        map.insert(ParentKey::origin("DS1.Example.net"), vec![candidate("mixed")]);
        map.insert(ParentKey::AllDeliveryServices, vec![candidate("default")]);

        assert_eq!(map.for_origin("ds1.example.net")[0].host, "mixed");
        assert_eq!(map.for_origin("DS1.EXAMPLE.NET")[0].host, "mixed");
        assert!(map.get(&ParentKey::origin("ds1.example.NET")).is_some());
    }

    #[test]
    fn test_missing_pools() {
        let mut map = ParentCandidateMap::new();
        assert!(map.is_empty());
        assert!(map.for_origin("ds0.example.net").is_empty());

        map.insert(ParentKey::origin("ds1.example.net"), vec![candidate("p")]);
        assert!(map.for_origin("ds0.example.net").is_empty());
        assert!(map.all_delivery_services().is_empty());
    }

    #[test]
    fn test_catch_all_never_matches_host() {
        let mut map = ParentCandidateMap::new();
        map.insert(ParentKey::origin("all_delivery_services"), vec![candidate("literal")]);
        assert!(map.all_delivery_services().is_empty());
    }

    #[test]
    fn test_serde_pools() {
        let json = r#"[
            {"key": {"origin": "ds1.example.net"}, "candidates": [{"host": "p0", "port": 80}]},
            {"key": "all_delivery_services", "candidates": []}
        ]"#;
        let map: ParentCandidateMap = serde_json::from_str(json).unwrap();
        let pool = map.get(&ParentKey::origin("ds1.example.net")).unwrap();
        assert_eq!(pool[0].weight, DEFAULT_PARENT_WEIGHT);
        assert_eq!(pool[0].rank, DEFAULT_PARENT_RANK);
        assert!(map.get(&ParentKey::AllDeliveryServices).is_some());

        let back = serde_json::to_value(&map).unwrap();
        assert_eq!(back.as_array().unwrap().len(), 2);
        assert_eq!(back[1]["key"], "all_delivery_services");
    }
}
