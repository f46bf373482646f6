//! Topologies and cache groups

use serde::{Deserialize, Serialize};

/// One tier location in a topology.
///
/// `parents` holds indices into the owning topology's `nodes`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopologyNode {
    pub cache_group: String,
    #[serde(default)]
    pub parents: Vec<usize>,
}

/// Named DAG of cache groups
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topology {
    pub name: String,
    #[serde(default)]
    pub nodes: Vec<TopologyNode>,
}

impl Topology {
    /// Index of the node for a cache group, if it participates
    pub fn node_index(&self, cache_group: &str) -> Option<usize> {
        self.nodes.iter().position(|n| n.cache_group == cache_group)
    }
}

/// Cache group location type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CacheGroupType {
    #[serde(rename = "EDGE_LOC")]
    EdgeLoc,
    #[serde(rename = "MID_LOC")]
    MidLoc,
    #[serde(rename = "ORG_LOC")]
    OrgLoc,
    #[serde(other)]
    Other,
}

impl CacheGroupType {
    /// Origin locations hold origins, not caches
    pub const fn is_origin(self) -> bool {
        matches!(self, Self::OrgLoc)
    }
}

/// A cache group from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheGroup {
    pub id: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub group_type: CacheGroupType,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub secondary_parent: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_index() {
        let topology = Topology {
            name: "t0".into(),
            nodes: vec![
                TopologyNode { cache_group: "edgeCG".into(), parents: vec![1] },
                TopologyNode { cache_group: "midCG".into(), parents: vec![] },
            ],
        };
        assert_eq!(topology.node_index("midCG"), Some(1));
        assert_eq!(topology.node_index("otherCG"), None);
    }

    #[test]
    fn test_unknown_group_type() {
        let cg: CacheGroup =
            serde_json::from_str(r#"{"id":1,"name":"tr","type":"TR_LOC"}"#).unwrap();
        assert_eq!(cg.group_type, CacheGroupType::Other);
        assert!(!cg.group_type.is_origin());
    }
}
