//! Topology resolution
//!
//! Answers two questions for a cache group: does it take part in a
//! topology, and which cache groups sit directly above it.

use parentcfg_common::Topology;
use std::collections::HashMap;

/// Outcome of resolving a cache group inside one topology
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyResolution {
    /// The cache group has a node in the topology
    pub participates: bool,
    /// Parent cache groups in node order, deduplicated
    pub parent_cache_groups: Vec<String>,
}

impl TopologyResolution {
    /// No upstream hop exists in the topology for this tier
    pub fn is_terminal(&self) -> bool {
        self.parent_cache_groups.is_empty()
    }
}

/// Resolve `cache_group` inside `topology`.
///
/// Out-of-range parent indices are skipped and logged.
pub fn resolve(topology: &Topology, cache_group: &str) -> TopologyResolution {
    let Some(index) = topology.node_index(cache_group) else {
        return TopologyResolution::default();
    };

    let mut parent_cache_groups: Vec<String> = Vec::new();
    for &parent in &topology.nodes[index].parents {
        match topology.nodes.get(parent) {
            Some(node) if parent == index => {
                tracing::warn!(
                    topology = %topology.name,
                    cache_group = %node.cache_group,
                    "Ignoring topology node listed as its own parent"
                );
            }
            Some(node) => {
                if !parent_cache_groups.contains(&node.cache_group) {
                    parent_cache_groups.push(node.cache_group.clone());
                }
            }
            None => {
                tracing::warn!(
                    topology = %topology.name,
                    cache_group,
                    parent,
                    "Ignoring out-of-range topology parent index"
                );
            }
        }
    }

    TopologyResolution {
        participates: true,
        parent_cache_groups,
    }
}

/// Topologies by name; the first of duplicate names wins
pub fn index(topologies: &[Topology]) -> HashMap<&str, &Topology> {
    let mut by_name = HashMap::with_capacity(topologies.len());
    for topology in topologies {
        by_name.entry(topology.name.as_str()).or_insert(topology);
    }
    by_name
}
