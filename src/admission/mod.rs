//! Classifies inbound git HTTP requests as read-only or mutating.
//!
//! The classification is consumed by the authorization layer: a request
//! classified as a write needs write privilege on the repository. Anything the
//! rule set does not recognise is a read, so every write-capable endpoint must
//! have a rule here.

use std::collections::HashMap;
use tracing::trace;

pub const URI_RECEIVE_PACK: &str = "git-receive-pack";
pub const URI_REF_INFO: &str = "/info/refs";
pub const PARAMETER_SERVICE: &str = "service";
pub const PARAMETER_VALUE_RECEIVE: &str = "git-receive-pack";
pub const METHOD_PUT: &str = "PUT";
/// Tail of an LFS object upload path, the object id is exactly 64 lowercase hex chars.
pub const LFS_OBJECT_PATTERN: &str = "info/lfs/objects/[a-z0-9]{64}";
pub const DEFAULT_REPO_BASE_PATH: &str = "/git";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    method: String,
    uri: String,
    context_path: String,
    query: HashMap<String, String>,
}

impl RequestDescriptor {
    pub fn new(
        method: impl Into<String>,
        uri: impl Into<String>,
        context_path: impl Into<String>,
        query: HashMap<String, String>,
    ) -> Self {
        Self {
            method: method.into(),
            uri: uri.into(),
            context_path: context_path.into(),
            query,
        }
    }

    /// Builds a descriptor from a raw request target such as
    /// `/git/repo.git/info/refs?service=git-receive-pack`.
    pub fn from_uri(method: &str, target: &str, context_path: &str) -> Self {
        let (path, query) = match target.split_once('?') {
            Some((path, query)) => (path, parse_query(query)),
            None => (target, HashMap::new()),
        };
        Self::new(method, path, context_path, query)
    }

    pub fn method(&self) -> &str {
        &self.method
    }
    /// The request path, without query string.
    pub fn path(&self) -> &str {
        &self.uri
    }
    pub fn context_path(&self) -> &str {
        &self.context_path
    }
    pub fn query_param(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(|value| value.as_str())
    }
}

/// First occurrence of a parameter wins, a bare `name` maps to an empty value.
pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&').filter(|pair| !pair.is_empty()) {
        let (name, value) = pair.split_once('=').unwrap_or((pair, ""));
        params
            .entry(name.to_string())
            .or_insert_with(|| value.to_string());
    }
    params
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<AdmissionRule>,
}

impl RuleSet {
    pub fn new(rules: Vec<AdmissionRule>) -> Self {
        Self { rules }
    }

    /// The git smart-HTTP rules, in evaluation order.
    pub fn git(repo_base_path: &str) -> Self {
        Self::new(vec![
            AdmissionRule::suffix(URI_RECEIVE_PACK),
            AdmissionRule::suffix_with_query(
                URI_REF_INFO,
                PARAMETER_SERVICE,
                PARAMETER_VALUE_RECEIVE,
            ),
            AdmissionRule::pattern_with_method(METHOD_PUT, repo_base_path, LFS_OBJECT_PATTERN),
        ])
    }

    pub fn rules(&self) -> &[AdmissionRule] {
        &self.rules
    }

    pub fn matching_rule(&self, request: &RequestDescriptor) -> Option<&AdmissionRule> {
        self.rules.iter().find(|rule| rule.matches(request))
    }

    pub fn is_write_request(&self, request: &RequestDescriptor) -> bool {
        match self.matching_rule(request) {
            Some(rule) => {
                trace!("{} {} is a write: {}", request.method(), request.path(), rule.describe());
                true
            }
            None => false,
        }
    }
}

impl Default for RuleSet {
    fn default() -> Self {
        Self::git(DEFAULT_REPO_BASE_PATH)
    }
}

pub mod client;
pub mod rule;

pub use rule::AdmissionRule;
