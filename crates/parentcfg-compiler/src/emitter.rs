//! parent.config line emitter
//!
//! One internal model (`ParentDirective`) rendered into either of the two
//! directive syntaxes. The syntax is chosen once per compilation from the
//! cache software's major version.

use parentcfg_common::{
    MsoSettings, ParentAlgorithm, ParentCandidate, DEFAULT_MSO_MAX_SIMPLE_RETRIES,
    DEFAULT_MSO_MAX_UNAVAILABLE_SERVER_RETRIES, DEFAULT_MSO_PARENT_RETRY,
};
use serde::Serialize;

/// First major version that understands `secondary_parent`
pub const MODERN_SYNTAX_MIN_VERSION: u32 = 6;

/// Directive syntax family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SyntaxFamily {
    /// Single parent list, no retry tuning
    Legacy,
    /// Separate secondary list and MSO retry tokens
    Modern,
}

impl SyntaxFamily {
    pub fn for_version(ats_major_version: u32) -> Self {
        if ats_major_version >= MODERN_SYNTAX_MIN_VERSION {
            Self::Modern
        } else {
            Self::Legacy
        }
    }

    /// `round_robin=` token for `algorithm`
    pub fn algorithm_token(self, algorithm: ParentAlgorithm) -> &'static str {
        match (self, algorithm) {
            (Self::Legacy, ParentAlgorithm::ConsistentHash) => ParentAlgorithm::ClientIpRoundRobin.as_str(),
            (Self::Legacy, ParentAlgorithm::Latched) => ParentAlgorithm::StrictRoundRobin.as_str(),
            (_, alg) => alg.as_str(),
        }
    }
}

/// What a directive matches on
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Origin { host: String, port: u16 },
    /// Catch-all, `dest_domain=.`
    Any,
}

/// Retry tuning for multi-site origins
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MsoRetry {
    pub parent_retry: String,
    pub unavailable_server_retry_responses: Option<String>,
    pub max_simple_retries: String,
    pub max_unavailable_server_retries: String,
}

impl MsoRetry {
    /// Fill unset values with the defaults
    pub fn from_settings(settings: &MsoSettings) -> Self {
        let or_default = |value: &Option<String>, default: &str| {
            value
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .unwrap_or(default)
                .to_string()
        };

        Self {
            parent_retry: or_default(&settings.parent_retry, DEFAULT_MSO_PARENT_RETRY),
            unavailable_server_retry_responses: settings
                .unavailable_server_retry_responses
                .as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string),
            max_simple_retries: or_default(&settings.max_simple_retries, DEFAULT_MSO_MAX_SIMPLE_RETRIES),
            max_unavailable_server_retries: or_default(
                &settings.max_unavailable_server_retries,
                DEFAULT_MSO_MAX_UNAVAILABLE_SERVER_RETRIES,
            ),
        }
    }
}

/// Parents and selection policy for a directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentRoute {
    pub primary: Vec<ParentCandidate>,
    pub secondary: Vec<ParentCandidate>,
    pub algorithm: ParentAlgorithm,
    pub qstring: String,
    /// Set when the parents are origins of a multi-site origin
    pub mso: Option<MsoRetry>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Fetch from the origin, bypassing every parent
    Direct,
    Parents(ParentRoute),
}

/// One line of parent.config
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParentDirective {
    pub destination: Destination,
    pub route: Route,
}

/// Renders directives in one syntax family
#[derive(Debug, Clone, Copy)]
pub struct LineEmitter {
    syntax: SyntaxFamily,
}

impl LineEmitter {
    pub fn new(syntax: SyntaxFamily) -> Self {
        Self { syntax }
    }

    pub fn for_version(ats_major_version: u32) -> Self {
        Self::new(SyntaxFamily::for_version(ats_major_version))
    }

    pub fn syntax(&self) -> SyntaxFamily {
        self.syntax
    }

    /// Render one directive, without the trailing newline
    pub fn emit(&self, directive: &ParentDirective) -> String {
        let mut line = match &directive.destination {
            Destination::Origin { host, port } => format!("dest_domain={} port={}", host, port),
            Destination::Any => "dest_domain=.".to_string(),
        };

        match &directive.route {
            Route::Direct => line.push_str(" go_direct=true"),
            Route::Parents(route) => self.push_parents(&mut line, route),
        }

        line
    }

    fn push_parents(&self, line: &mut String, route: &ParentRoute) {
        match self.syntax {
            SyntaxFamily::Modern => {
                line.push_str(&format!(" parent=\"{}\"", parent_list(&route.primary)));
                if !route.secondary.is_empty() {
                    line.push_str(&format!(" secondary_parent=\"{}\"", parent_list(&route.secondary)));
                }
            }
            SyntaxFamily::Legacy => {
                let all: Vec<ParentCandidate> =
                    route.primary.iter().chain(&route.secondary).cloned().collect();
                line.push_str(&format!(" parent=\"{}\"", parent_list(&all)));
            }
        }

        line.push_str(&format!(
            " round_robin={} qstring={} go_direct=false",
            self.syntax.algorithm_token(route.algorithm),
            route.qstring
        ));

        if let (SyntaxFamily::Modern, Some(mso)) = (self.syntax, &route.mso) {
            line.push_str(" parent_is_proxy=false");
            line.push_str(&format!(" parent_retry={}", mso.parent_retry));
            if let Some(responses) = &mso.unavailable_server_retry_responses {
                line.push_str(&format!(" unavailable_server_retry_responses={}", responses));
            }
            line.push_str(&format!(
                " max_simple_retries={} max_unavailable_server_retries={}",
                mso.max_simple_retries, mso.max_unavailable_server_retries
            ));
        }
    }
}

/// `host.domain:port|weight`, or the IP in place of the name when asked
pub fn parent_entry(candidate: &ParentCandidate) -> String {
    let address = if candidate.use_ip && !candidate.ip.is_empty() {
        candidate.ip.clone()
    } else if candidate.domain.is_empty() {
        candidate.host.clone()
    } else {
        format!("{}.{}", candidate.host, candidate.domain)
    };
    format!("{}:{}|{}", address, candidate.port, candidate.weight)
}

/// Semicolon-joined entries
pub fn parent_list(candidates: &[ParentCandidate]) -> String {
    candidates.iter().map(parent_entry).collect::<Vec<_>>().join(";")
}
