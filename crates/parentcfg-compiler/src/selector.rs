//! Parent candidate selection
//!
//! Turns a keyed pool of candidates (or the server catalog, for topology
//! parents) into ordered primary and secondary parent lists.

use crate::capability;
use parentcfg_common::{
    CacheGroup, CacheServer, CapabilitySet, GeneratingServer, ParentCandidate,
    ParentCandidateMap, ParentServerParams, DEFAULT_PARENT_RANK, DEFAULT_PARENT_WEIGHT,
};
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Ordered parents for one directive
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectedParents {
    pub primary: Vec<ParentCandidate>,
    pub secondary: Vec<ParentCandidate>,
}

impl SelectedParents {
    /// No parent at all
    pub fn is_empty(&self) -> bool {
        self.primary.is_empty() && self.secondary.is_empty()
    }
}

/// Select parents for a delivery service from the keyed pools.
///
/// Looks up `origin_host` first, then the catch-all pool. Candidates
/// missing a required capability are dropped. With `split_secondary` the
/// survivors are split by their primary/secondary flags; otherwise they form
/// one list and the secondary flag is ignored.
pub fn select(
    origin_host: &str,
    required: &CapabilitySet,
    candidates: &ParentCandidateMap,
    split_secondary: bool,
) -> SelectedParents {
    let eligible: Vec<ParentCandidate> = candidates
        .for_origin(origin_host)
        .iter()
        .filter(|c| capability::satisfies(&c.capabilities, required))
        .cloned()
        .collect();

    if !split_secondary {
        return SelectedParents {
            primary: order(eligible),
            secondary: Vec::new(),
        };
    }

    let (primary, rest): (Vec<_>, Vec<_>) = eligible.into_iter().partition(|c| c.primary);
    let primary = order(primary);
    let secondary = exclude(order(rest.into_iter().filter(|c| c.secondary).collect()), &primary);

    SelectedParents { primary, secondary }
}

/// Every parent in the catch-all pool, ignoring capabilities.
///
/// With `split_secondary`, candidates flagged only as secondary go to the
/// secondary list and everything else stays primary, so each candidate
/// appears exactly once.
pub fn catch_all(candidates: &ParentCandidateMap, split_secondary: bool) -> SelectedParents {
    let pool = candidates.all_delivery_services().to_vec();

    if !split_secondary {
        return SelectedParents {
            primary: order(pool),
            secondary: Vec::new(),
        };
    }

    let (secondary, primary): (Vec<_>, Vec<_>) =
        pool.into_iter().partition(|c| c.secondary && !c.primary);
    let primary = order(primary);
    let secondary = exclude(order(secondary), &primary);

    SelectedParents { primary, secondary }
}

/// Sort by rank, then host, then the rest of the identity, and drop
/// duplicate identities keeping the first.
///
/// Every remaining field takes part in the sort so that conflicting
/// duplicates always resolve the same way.
pub fn order(mut candidates: Vec<ParentCandidate>) -> Vec<ParentCandidate> {
    candidates.sort_by(compare);

    let mut seen: HashSet<(String, String, u16)> = HashSet::with_capacity(candidates.len());
    candidates.retain(|c| seen.insert((c.host.clone(), c.domain.clone(), c.port)));
    candidates
}

fn compare(a: &ParentCandidate, b: &ParentCandidate) -> Ordering {
    a.rank
        .cmp(&b.rank)
        .then_with(|| a.host.cmp(&b.host))
        .then_with(|| a.domain.cmp(&b.domain))
        .then_with(|| a.port.cmp(&b.port))
        .then_with(|| b.primary.cmp(&a.primary))
        .then_with(|| b.secondary.cmp(&a.secondary))
        .then_with(|| a.weight.cmp(&b.weight))
        .then_with(|| a.use_ip.cmp(&b.use_ip))
        .then_with(|| a.ip.cmp(&b.ip))
        .then_with(|| a.capabilities.iter().cmp(b.capabilities.iter()))
}

fn exclude(candidates: Vec<ParentCandidate>, taken: &[ParentCandidate]) -> Vec<ParentCandidate> {
    candidates
        .into_iter()
        .filter(|c| !taken.iter().any(|t| t.identity() == c.identity()))
        .collect()
}

/// Builds topology parents from the server catalog
pub struct TopologyParents<'a> {
    pub server: &'a GeneratingServer,
    pub servers: &'a [CacheServer],
    pub cache_groups: &'a HashMap<&'a str, &'a CacheGroup>,
    pub server_capabilities: &'a HashMap<u32, CapabilitySet>,
    pub profile_params: &'a HashMap<String, ParentServerParams>,
}

impl<'a> TopologyParents<'a> {
    /// Parents for a topology-bound delivery service.
    ///
    /// Servers in the first usable parent cache group are primary, servers in
    /// the second are secondary. Origin-location groups are not usable.
    /// Returns `None` when no usable parent group remains, so the caller can
    /// fall back to the keyed pools.
    pub fn select(
        &self,
        parent_cache_groups: &[String],
        required: &CapabilitySet,
    ) -> Option<SelectedParents> {
        let usable: Vec<&str> = parent_cache_groups
            .iter()
            .map(String::as_str)
            .filter(|name| {
                self.cache_groups
                    .get(name)
                    .map_or(true, |cg| !cg.group_type.is_origin())
            })
            .collect();

        let primary_group = *usable.first()?;
        let secondary_group = usable.get(1).copied();

        let none = CapabilitySet::new();
        let mut primary = Vec::new();
        let mut secondary = Vec::new();

        for sv in self.servers {
            let is_primary = sv.cache_group == primary_group;
            let is_secondary = Some(sv.cache_group.as_str()) == secondary_group;
            if !is_primary && !is_secondary {
                continue;
            }
            if !self.is_parent_eligible(sv) {
                continue;
            }

            let params = self.profile_params.get(&sv.profile);
            if params.map_or(false, |p| p.not_a_parent) {
                continue;
            }

            let caps = self.server_capabilities.get(&sv.id).unwrap_or(&none);
            if !capability::satisfies(caps, required) {
                tracing::debug!(
                    parent = %sv.host_name,
                    "Parent lacks required capabilities"
                );
                continue;
            }

            let candidate = candidate_from_server(sv, params, caps, is_primary);
            if is_primary {
                primary.push(candidate);
            } else {
                secondary.push(candidate);
            }
        }

        let primary = order(primary);
        let secondary = exclude(order(secondary), &primary);
        Some(SelectedParents { primary, secondary })
    }

    fn is_parent_eligible(&self, sv: &CacheServer) -> bool {
        sv.id != self.server.server.id
            && sv.cdn == self.server.server.cdn
            && sv.is_cache()
            && sv.status.is_available()
    }
}

fn candidate_from_server(
    sv: &CacheServer,
    params: Option<&ParentServerParams>,
    caps: &CapabilitySet,
    primary: bool,
) -> ParentCandidate {
    ParentCandidate {
        host: sv.host_name.clone(),
        domain: sv.domain_name.clone(),
        port: params.and_then(|p| p.port).unwrap_or(sv.port),
        ip: sv.ip.clone(),
        weight: params
            .and_then(|p| p.weight.clone())
            .unwrap_or_else(|| DEFAULT_PARENT_WEIGHT.to_string()),
        rank: params.and_then(|p| p.rank).unwrap_or(DEFAULT_PARENT_RANK),
        use_ip: params.map_or(false, |p| p.use_ip),
        primary,
        secondary: !primary,
        capabilities: caps.clone(),
    }
}
