//! Cache servers and the generating server descriptor

use crate::CacheGroupType;
use serde::{Deserialize, Serialize};

/// Operational status of a server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    #[default]
    Online,
    Reported,
    Offline,
    AdminDown,
    PreProd,
}

impl ServerStatus {
    /// Statuses that may receive forwarded traffic
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Online | Self::Reported)
    }
}

/// A server from the fleet catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheServer {
    pub id: u32,
    pub host_name: String,
    pub domain_name: String,
    #[serde(default)]
    pub ip: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub profile: String,
    #[serde(default)]
    pub cdn: String,
    pub cache_group: String,
    #[serde(rename = "type")]
    pub server_type: String,
    #[serde(default)]
    pub status: ServerStatus,
}

fn default_port() -> u16 {
    80
}

impl CacheServer {
    /// Edge and mid servers cache content and can act as parents
    pub fn is_cache(&self) -> bool {
        self.server_type.starts_with("EDGE") || self.server_type.starts_with("MID")
    }
}

/// Reference from the generating server's cache group to a parent group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentGroupRef {
    pub id: u32,
    #[serde(rename = "type")]
    pub group_type: CacheGroupType,
}

impl ParentGroupRef {
    /// Parent groups made of origins do not count as a further cache tier
    pub fn is_cache_tier(&self) -> bool {
        !self.group_type.is_origin()
    }
}

/// The server a config is being generated for.
///
/// `None` parent references stand for "no parent cache group configured".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratingServer {
    #[serde(flatten)]
    pub server: CacheServer,
    #[serde(default)]
    pub parent_cache_group: Option<ParentGroupRef>,
    #[serde(default)]
    pub secondary_parent_cache_group: Option<ParentGroupRef>,
}

impl GeneratingServer {
    /// A top level cache has no cache tier above it and talks to origins
    pub fn is_top_level_cache(&self) -> bool {
        let no_cache_parent =
            |group: &Option<ParentGroupRef>| group.as_ref().map_or(true, |g| !g.is_cache_tier());
        no_cache_parent(&self.parent_cache_group) && no_cache_parent(&self.secondary_parent_cache_group)
    }
}
