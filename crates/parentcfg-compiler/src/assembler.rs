//! Config assembly
//!
//! Walks the delivery-service catalog once, in catalog order, and turns
//! every service into either a directive or a recorded skip. The output is
//! the header comment, the per-service lines, then the catch-all line.

use crate::emitter::{
    Destination, LineEmitter, MsoRetry, ParentDirective, ParentRoute, Route,
};
use crate::selector::{self, SelectedParents, TopologyParents};
use crate::{capability, qstring, topology};
use parentcfg_common::{
    CacheGroup, CacheServer, CapabilitySet, DeliveryService, GeneratingServer, Origin,
    ParentAlgorithm, ParentCandidateMap, ParentConfigError, ParentSelectionParams,
    ParentServerParams, ProfileParameter, Result, Topology,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Everything one compilation reads. Nothing here is mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParentConfigInput {
    /// The server the config is generated for
    pub server: Option<GeneratingServer>,
    pub delivery_services: Vec<DeliveryService>,
    /// Full server catalog, parents for topology-bound services come from here
    pub servers: Vec<CacheServer>,
    pub topologies: Vec<Topology>,
    pub cache_groups: Vec<CacheGroup>,
    /// Capabilities by server id
    pub server_capabilities: HashMap<u32, CapabilitySet>,
    /// Extra required capabilities by delivery service name
    pub ds_required_capabilities: HashMap<String, CapabilitySet>,
    /// Raw profile parameters of the generating server
    pub server_params: HashMap<String, String>,
    /// `parent.config` parameters of the profiles parents use
    pub parent_config_params: Vec<ProfileParameter>,
    pub parents: ParentCandidateMap,
}

/// Output options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileOptions {
    /// Major version of the cache software, picks the directive syntax
    pub ats_major_version: u32,
    /// Name written into the header comment
    pub tool_name: String,
    /// Control-plane URL written into the header comment
    pub to_url: String,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            ats_major_version: 7,
            tool_name: "parentcfg".to_string(),
            to_url: String::new(),
        }
    }
}

/// Why a delivery service produced no line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// References a topology that is not in the catalog
    TopologyNotFound,
    /// Topology does not include the generating server's cache group
    NotInTopology,
    /// Generating server lacks a capability the service requires
    MissingCapabilities,
    /// Origin could not be parsed
    InvalidOrigin,
    /// Service type has no origin to route to
    NoOrigin,
}

impl SkipReason {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TopologyNotFound => "topology not found",
            Self::NotInTopology => "server not in topology",
            Self::MissingCapabilities => "server missing required capabilities",
            Self::InvalidOrigin => "invalid origin",
            Self::NoOrigin => "no origin",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedDeliveryService {
    pub name: String,
    pub reason: SkipReason,
}

/// Compiled parent.config
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentDotConfig {
    /// File contents, newline terminated
    pub text: String,
    /// Services left out, in catalog order
    pub skipped: Vec<SkippedDeliveryService>,
}

/// Compile parent.config for the generating server in `input`.
///
/// Fails only when the generating server is missing or unusable.
pub fn compile(input: &ParentConfigInput, options: &CompileOptions) -> Result<ParentDotConfig> {
    Ok(ConfigAssembler::new(input, options)?.assemble())
}

/// Per-compilation lookup tables over one input
pub struct ConfigAssembler<'a> {
    input: &'a ParentConfigInput,
    options: &'a CompileOptions,
    server: &'a GeneratingServer,
    emitter: LineEmitter,
    params: ParentSelectionParams,
    topologies: HashMap<&'a str, &'a Topology>,
    cache_groups: HashMap<&'a str, &'a CacheGroup>,
    profile_params: HashMap<String, ParentServerParams>,
    server_capabilities: CapabilitySet,
}

impl<'a> ConfigAssembler<'a> {
    pub fn new(input: &'a ParentConfigInput, options: &'a CompileOptions) -> Result<Self> {
        let server = input.server.as_ref().ok_or(ParentConfigError::MissingServer)?;
        if server.server.host_name.trim().is_empty() {
            return Err(ParentConfigError::InvalidServer(
                "host name is empty".to_string(),
            ));
        }

        let mut cache_groups = HashMap::with_capacity(input.cache_groups.len());
        for cg in &input.cache_groups {
            cache_groups.entry(cg.name.as_str()).or_insert(cg);
        }

        Ok(Self {
            input,
            options,
            server,
            emitter: LineEmitter::for_version(options.ats_major_version),
            params: ParentSelectionParams::from_params(&input.server_params),
            topologies: topology::index(&input.topologies),
            cache_groups,
            profile_params: ParentServerParams::by_profile(&input.parent_config_params),
            server_capabilities: input
                .server_capabilities
                .get(&server.server.id)
                .cloned()
                .unwrap_or_default(),
        })
    }

    /// Build the whole file
    pub fn assemble(&self) -> ParentDotConfig {
        let mut lines = Vec::with_capacity(self.input.delivery_services.len() + 2);
        let mut skipped = Vec::new();

        lines.push(self.header());

        for ds in &self.input.delivery_services {
            match self.directive_for(ds) {
                Ok(directive) => lines.push(self.emitter.emit(&directive)),
                Err(reason) => {
                    tracing::debug!(
                        server = %self.server.server.host_name,
                        delivery_service = %ds.name,
                        reason = %reason,
                        "Skipping delivery service"
                    );
                    skipped.push(SkippedDeliveryService {
                        name: ds.name.clone(),
                        reason,
                    });
                }
            }
        }

        lines.push(self.emitter.emit(&self.default_directive()));

        tracing::info!(
            server = %self.server.server.host_name,
            lines = lines.len() - 2,
            skipped = skipped.len(),
            syntax = ?self.emitter.syntax(),
            "Compiled parent.config"
        );

        let mut text = lines.join("\n");
        text.push('\n');
        ParentDotConfig { text, skipped }
    }

    fn header(&self) -> String {
        format!(
            "# DO NOT EDIT - Generated for {} by {} ({})",
            self.server.server.host_name, self.options.tool_name, self.options.to_url
        )
    }

    /// Directive for one delivery service, or why it has none
    pub fn directive_for(&self, ds: &DeliveryService) -> std::result::Result<ParentDirective, SkipReason> {
        if !ds.ds_type.uses_origin() {
            return Err(SkipReason::NoOrigin);
        }

        let Some(origin) = ds.origin() else {
            tracing::warn!(
                delivery_service = %ds.name,
                origin = %ds.origin_fqdn,
                "Unparseable origin"
            );
            return Err(SkipReason::InvalidOrigin);
        };

        let required = self.required_capabilities(ds);

        // MSO splitting applies only at the top of the hierarchy, where the
        // keyed pools hold origins. For topology services that is a terminal
        // node or one whose parents are all origin groups.
        let (parents, split) = match ds.topology_name() {
            Some(name) => match self.topology_parents(ds, name, &required)? {
                Some(parents) => (parents, false),
                None => {
                    let split = ds.multi_site_origin;
                    (self.keyed_parents(&origin, &required, split), split)
                }
            },
            None if ds.ds_type.bypasses_hierarchy() => {
                return Ok(ParentDirective {
                    destination: destination(origin),
                    route: Route::Direct,
                });
            }
            None => {
                let split = self.server.is_top_level_cache() && ds.multi_site_origin;
                (self.keyed_parents(&origin, &required, split), split)
            }
        };

        let (algorithm, mso) = if split {
            (
                ds.mso.algorithm.unwrap_or_default(),
                Some(MsoRetry::from_settings(&ds.mso)),
            )
        } else {
            (self.params.algorithm, None)
        };

        Ok(ParentDirective {
            destination: destination(origin),
            route: Route::Parents(ParentRoute {
                primary: parents.primary,
                secondary: parents.secondary,
                algorithm,
                qstring: qstring::resolve_qstring(ds, &self.params),
                mso,
            }),
        })
    }

    /// Catalog parents for a topology service. `Ok(None)` means the server
    /// sits at the top of the topology and the keyed pools apply.
    fn topology_parents(
        &self,
        ds: &DeliveryService,
        name: &str,
        required: &CapabilitySet,
    ) -> std::result::Result<Option<SelectedParents>, SkipReason> {
        let Some(topology) = self.topologies.get(name) else {
            tracing::warn!(
                delivery_service = %ds.name,
                topology = name,
                "Delivery service references unknown topology"
            );
            return Err(SkipReason::TopologyNotFound);
        };

        let resolution = topology::resolve(topology, &self.server.server.cache_group);
        if !resolution.participates {
            return Err(SkipReason::NotInTopology);
        }

        if !capability::satisfies(&self.server_capabilities, required) {
            tracing::debug!(
                delivery_service = %ds.name,
                missing = ?capability::missing(&self.server_capabilities, required),
                "Generating server lacks required capabilities"
            );
            return Err(SkipReason::MissingCapabilities);
        }

        if resolution.is_terminal() {
            return Ok(None);
        }

        Ok(TopologyParents {
            server: self.server,
            servers: &self.input.servers,
            cache_groups: &self.cache_groups,
            server_capabilities: &self.input.server_capabilities,
            profile_params: &self.profile_params,
        }
        .select(&resolution.parent_cache_groups, required))
    }

    fn keyed_parents(
        &self,
        origin: &Origin,
        required: &CapabilitySet,
        split: bool,
    ) -> SelectedParents {
        selector::select(&origin.host, required, &self.input.parents, split)
    }

    fn required_capabilities(&self, ds: &DeliveryService) -> CapabilitySet {
        match self.input.ds_required_capabilities.get(&ds.name) {
            Some(extra) => ds.required_capabilities.union(extra),
            None => ds.required_capabilities.clone(),
        }
    }

    /// Catch-all directive over every known parent, unfiltered
    pub fn default_directive(&self) -> ParentDirective {
        let algorithm = self.params.algorithm;
        let parents = selector::catch_all(
            &self.input.parents,
            algorithm == ParentAlgorithm::ConsistentHash,
        );

        ParentDirective {
            destination: Destination::Any,
            route: Route::Parents(ParentRoute {
                primary: parents.primary,
                secondary: parents.secondary,
                algorithm,
                qstring: self.params.server_qstring().to_string(),
                mso: None,
            }),
        }
    }
}

fn destination(origin: Origin) -> Destination {
    Destination::Origin {
        host: origin.host,
        port: origin.port,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parentcfg_common::{DeliveryServiceType, ParentCandidate, ParentKey, ServerStatus};

    fn generating() -> GeneratingServer {
        GeneratingServer {
            server: CacheServer {
                id: 44,
                host_name: "myserver".into(),
                domain_name: "serverdomain.example.net".into(),
                ip: "192.168.2.1".into(),
                port: 80,
                profile: "serverprofile".into(),
                cdn: "myCDN".into(),
                cache_group: "cg0".into(),
                server_type: "EDGE".into(),
                status: ServerStatus::Reported,
            },
            parent_cache_group: None,
            secondary_parent_cache_group: None,
        }
    }

    fn input() -> ParentConfigInput {
        let mut parents = ParentCandidateMap::new();
        parents.insert(
            ParentKey::AllDeliveryServices,
            vec![ParentCandidate {
                host: "my-parent".into(),
                domain: "my-parent-domain".into(),
                port: 80,
                ip: "192.168.2.2".into(),
                weight: "1".into(),
                rank: 1,
                use_ip: false,
                primary: true,
                secondary: true,
                capabilities: CapabilitySet::new(),
            }],
        );

        ParentConfigInput {
            server: Some(generating()),
            delivery_services: vec![DeliveryService::new(
                "ds0",
                "http://ds0.example.net",
                DeliveryServiceType::Http,
            )],
            parents,
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_server() {
        let input = ParentConfigInput::default();
        assert!(matches!(
            compile(&input, &CompileOptions::default()),
            Err(ParentConfigError::MissingServer)
        ));
    }

    #[test]
    fn test_empty_host_name() {
        let mut input = input();
        if let Some(server) = input.server.as_mut() {
            server.server.host_name = " ".into();
        }
        assert!(matches!(
            compile(&input, &CompileOptions::default()),
            Err(ParentConfigError::InvalidServer(_))
        ));
    }

    #[test]
    fn test_output_shape() {
        let options = CompileOptions {
            tool_name: "myToolName".into(),
            to_url: "https://myto.example.net".into(),
            ..Default::default()
        };
        let cfg = compile(&input(), &options).unwrap();
        let lines: Vec<&str> = cfg.text.split('\n').collect();

        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with('#'));
        assert!(lines[0].contains("myserver"));
        assert!(lines[0].contains("myToolName"));
        assert!(lines[0].contains("https://myto.example.net"));
        assert!(lines[1].starts_with("dest_domain=ds0.example.net port=80 parent=\"my-parent.my-parent-domain:80|1\""));
        assert!(lines[2].starts_with("dest_domain=. "));
        assert_eq!(lines[3], "");
        assert!(cfg.skipped.is_empty());
    }

    #[test]
    fn test_skip_reasons() {
        let mut input = input();
        let mut steering = DeliveryService::new("steer", "", DeliveryServiceType::Steering);
        steering.topology = Some("t0".into());
        let bad_origin = DeliveryService::new("bad", "http://", DeliveryServiceType::Http);
        let mut unknown = DeliveryService::new("unknown", "http://ds3.example.net", DeliveryServiceType::Http);
        unknown.topology = Some("missing".into());
        input.delivery_services.extend([steering, bad_origin, unknown]);

        let cfg = compile(&input, &CompileOptions::default()).unwrap();
        let reasons: Vec<(&str, SkipReason)> =
            cfg.skipped.iter().map(|s| (s.name.as_str(), s.reason)).collect();
        assert_eq!(
            reasons,
            vec![
                ("steer", SkipReason::NoOrigin),
                ("bad", SkipReason::InvalidOrigin),
                ("unknown", SkipReason::TopologyNotFound),
            ]
        );
    }

    #[test]
    fn test_ds_required_capability_map() {
        let mut input = input();
        input
            .ds_required_capabilities
            .insert("ds0".into(), ["FOO"].into_iter().collect());

        let cfg = compile(&input, &CompileOptions::default()).unwrap();
        let ds_line = cfg.text.lines().nth(1).unwrap();
        assert!(ds_line.contains("parent=\"\""));
        assert!(cfg.text.lines().nth(2).unwrap().contains("my-parent.my-parent-domain"));
    }
}
