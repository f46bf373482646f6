//! Profile parameters, turned into explicit configuration structs

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

/// Parent selection algorithm parameter
pub const PARAM_ALGORITHM: &str = "algorithm";
/// Server-level qstring handling parameter
pub const PARAM_QSTRING_HANDLING: &str = "psel.qstring_handling";
/// Server-level qstring parameter
pub const PARAM_QSTRING: &str = "qstring";

/// Config file that per-parent profile parameters belong to
pub const PARENT_CONFIG_FILE: &str = "parent.config";
/// Per-parent weight
pub const PARAM_WEIGHT: &str = "weight";
/// Per-parent rank
pub const PARAM_RANK: &str = "rank";
/// Per-parent port override
pub const PARAM_PORT: &str = "port";
/// Address a parent by IP
pub const PARAM_USE_IP: &str = "use_ip_address";
/// Exclude a server from acting as a parent
pub const PARAM_NOT_A_PARENT: &str = "not_a_parent";

/// qstring value used when neither the delivery service nor the profile sets one
pub const DEFAULT_QSTRING_HANDLING: &str = "ignore";

/// MSO retry defaults
pub const DEFAULT_MSO_PARENT_RETRY: &str = "both";
pub const DEFAULT_MSO_MAX_SIMPLE_RETRIES: &str = "1";
pub const DEFAULT_MSO_MAX_UNAVAILABLE_SERVER_RETRIES: &str = "1";

/// How a cache spreads requests over its parents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParentAlgorithm {
    /// Hash the URL onto a ring of parents
    #[default]
    #[serde(rename = "consistent_hash")]
    ConsistentHash,
    /// Strict rotation across parents
    #[serde(rename = "strict")]
    StrictRoundRobin,
    /// Rotation keyed on the client IP
    #[serde(rename = "true")]
    ClientIpRoundRobin,
    /// Always the first available parent
    #[serde(rename = "false")]
    FirstAvailable,
    /// Stick to a parent until it fails
    #[serde(rename = "latched")]
    Latched,
}

impl ParentAlgorithm {
    /// Token as written after `round_robin=`
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ConsistentHash => "consistent_hash",
            Self::StrictRoundRobin => "strict",
            Self::ClientIpRoundRobin => "true",
            Self::FirstAvailable => "false",
            Self::Latched => "latched",
        }
    }
}

impl fmt::Display for ParentAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ParentAlgorithm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "consistent_hash" => Ok(Self::ConsistentHash),
            "strict" => Ok(Self::StrictRoundRobin),
            "true" => Ok(Self::ClientIpRoundRobin),
            "false" => Ok(Self::FirstAvailable),
            "latched" => Ok(Self::Latched),
            other => Err(format!("unknown parent selection algorithm: {}", other)),
        }
    }
}

/// Server-profile settings that drive parent selection
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentSelectionParams {
    pub algorithm: ParentAlgorithm,
    pub qstring_handling: Option<String>,
    pub qstring: Option<String>,
}

impl ParentSelectionParams {
    /// Build from the generating server's raw profile parameters
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let non_empty = |name: &str| {
            params
                .get(name)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let algorithm = match non_empty(PARAM_ALGORITHM) {
            Some(raw) => raw.parse::<ParentAlgorithm>().unwrap_or_else(|e: String| {
                tracing::warn!(error = %e, "Falling back to consistent_hash");
                ParentAlgorithm::ConsistentHash
            }),
            None => ParentAlgorithm::default(),
        };

        Self {
            algorithm,
            qstring_handling: non_empty(PARAM_QSTRING_HANDLING),
            qstring: non_empty(PARAM_QSTRING),
        }
    }

    /// Server-level qstring policy: handling parameter, then qstring parameter, then the default
    pub fn server_qstring(&self) -> &str {
        self.qstring_handling
            .as_deref()
            .or(self.qstring.as_deref())
            .unwrap_or(DEFAULT_QSTRING_HANDLING)
    }
}

/// A parameter assigned to one or more profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileParameter {
    pub name: String,
    pub config_file: String,
    pub value: String,
    #[serde(default)]
    pub profiles: Vec<String>,
}

/// Per-profile tuning of servers acting as parents
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParentServerParams {
    pub weight: Option<String>,
    pub rank: Option<i32>,
    pub port: Option<u16>,
    pub use_ip: bool,
    pub not_a_parent: bool,
}

impl ParentServerParams {
    /// Group `parent.config` parameters by profile name
    pub fn by_profile(params: &[ProfileParameter]) -> HashMap<String, ParentServerParams> {
        let mut out: HashMap<String, ParentServerParams> = HashMap::new();

        for param in params.iter().filter(|p| p.config_file == PARENT_CONFIG_FILE) {
            for profile in &param.profiles {
                out.entry(profile.clone()).or_default().apply(param);
            }
        }

        out
    }

    fn apply(&mut self, param: &ProfileParameter) {
        let value = param.value.trim();
        match param.name.as_str() {
            PARAM_WEIGHT => self.weight = Some(value.to_string()),
            PARAM_RANK => match value.parse() {
                Ok(rank) => self.rank = Some(rank),
                Err(_) => tracing::warn!(value, "Ignoring non-integer parent rank"),
            },
            PARAM_PORT => match value.parse() {
                Ok(port) => self.port = Some(port),
                Err(_) => tracing::warn!(value, "Ignoring invalid parent port"),
            },
            PARAM_USE_IP => self.use_ip = parse_flag(value),
            PARAM_NOT_A_PARENT => self.not_a_parent = parse_flag(value),
            _ => {}
        }
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_algorithm_round_trip_tokens() {
        for alg in [
            ParentAlgorithm::ConsistentHash,
            ParentAlgorithm::StrictRoundRobin,
            ParentAlgorithm::ClientIpRoundRobin,
            ParentAlgorithm::FirstAvailable,
            ParentAlgorithm::Latched,
        ] {
            assert_eq!(alg.as_str().parse::<ParentAlgorithm>().unwrap(), alg);
        }
        assert!("urlhash".parse::<ParentAlgorithm>().is_err());
    }

    #[test]
    fn test_from_params() {
        let params = ParentSelectionParams::from_params(&raw(&[
            (PARAM_ALGORITHM, "strict"),
            (PARAM_QSTRING_HANDLING, "myQStringHandlingParam"),
            (PARAM_QSTRING, "myQstringParam"),
        ]));
        assert_eq!(params.algorithm, ParentAlgorithm::StrictRoundRobin);
        assert_eq!(params.server_qstring(), "myQStringHandlingParam");
    }

    #[test]
    fn test_from_params_fallbacks() {
        let params = ParentSelectionParams::from_params(&raw(&[
            (PARAM_ALGORITHM, "bogus"),
            (PARAM_QSTRING_HANDLING, "  "),
        ]));
        assert_eq!(params.algorithm, ParentAlgorithm::ConsistentHash);
        assert!(params.qstring_handling.is_none());
        assert_eq!(params.server_qstring(), DEFAULT_QSTRING_HANDLING);

        let params = ParentSelectionParams::from_params(&raw(&[(PARAM_QSTRING, "consider")]));
        assert_eq!(params.server_qstring(), "consider");
    }

    #[test]
    fn test_by_profile() {
        let param = |name: &str, file: &str, value: &str| ProfileParameter {
            name: name.into(),
            config_file: file.into(),
            value: value.into(),
            profiles: vec!["MID_PROFILE".into()],
        };
        let by_profile = ParentServerParams::by_profile(&[
            param(PARAM_WEIGHT, PARENT_CONFIG_FILE, "2.5"),
            param(PARAM_RANK, PARENT_CONFIG_FILE, "3"),
            param(PARAM_PORT, PARENT_CONFIG_FILE, "not-a-port"),
            param(PARAM_USE_IP, PARENT_CONFIG_FILE, "1"),
            param(PARAM_NOT_A_PARENT, "records.config", "true"),
        ]);

        let mid = &by_profile["MID_PROFILE"];
        assert_eq!(mid.weight.as_deref(), Some("2.5"));
        assert_eq!(mid.rank, Some(3));
        assert_eq!(mid.port, None);
        assert!(mid.use_ip);
        assert!(!mid.not_a_parent);
    }
}
