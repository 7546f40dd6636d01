use crate::admission::RequestDescriptor;
use dashmap::DashMap;
use regex::Regex;
use tracing::warn;

lazy_static::lazy_static! {
    /// Compiled admission patterns keyed by their source. A pattern that does
    /// not compile is cached as `None` so the failure is logged once.
    static ref PATTERNS: DashMap<String, Option<Regex>> = DashMap::new();
}

fn compiled(pattern: &str) -> Option<Regex> {
    if let Some(cached) = PATTERNS.get(pattern) {
        return cached.value().clone();
    }
    let regex = match Regex::new(pattern) {
        Ok(regex) => Some(regex),
        Err(err) => {
            warn!("admission pattern {} does not compile: {}", pattern, err);
            None
        }
    };
    PATTERNS
        .entry(pattern.to_string())
        .or_insert(regex)
        .value()
        .clone()
}

/// One entry of the ordered admission chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdmissionRule {
    /// Request path ends with `suffix`.
    Suffix { suffix: String },
    /// Request path ends with `suffix` and query parameter `param` equals `value`.
    SuffixWithQuery {
        suffix: String,
        param: String,
        value: String,
    },
    /// Request method equals `method` and the whole path matches
    /// `^<context_path><base_path>/.+(\.git)?/<tail>$`.
    PatternWithMethod {
        method: String,
        base_path: String,
        tail: String,
    },
}

impl AdmissionRule {
    pub fn suffix(suffix: impl Into<String>) -> Self {
        AdmissionRule::Suffix {
            suffix: suffix.into(),
        }
    }
    pub fn suffix_with_query(
        suffix: impl Into<String>,
        param: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        AdmissionRule::SuffixWithQuery {
            suffix: suffix.into(),
            param: param.into(),
            value: value.into(),
        }
    }
    pub fn pattern_with_method(
        method: impl Into<String>,
        base_path: impl Into<String>,
        tail: impl Into<String>,
    ) -> Self {
        AdmissionRule::PatternWithMethod {
            method: method.into(),
            base_path: base_path.into(),
            tail: tail.into(),
        }
    }

    pub fn matches(&self, request: &RequestDescriptor) -> bool {
        match self {
            AdmissionRule::Suffix { suffix } => request.path().ends_with(suffix.as_str()),
            AdmissionRule::SuffixWithQuery {
                suffix,
                param,
                value,
            } => {
                request.path().ends_with(suffix.as_str())
                    && request.query_param(param) == Some(value.as_str())
            }
            AdmissionRule::PatternWithMethod {
                method,
                base_path,
                tail,
            } => {
                if request.method() != method {
                    return false;
                }
                // Compiled once per distinct context path.
                let pattern = format!(
                    "^{}{}/.+(\\.git)?/{}$",
                    regex::escape(request.context_path()),
                    regex::escape(base_path),
                    tail
                );
                compiled(&pattern).is_some_and(|regex| regex.is_match(request.path()))
            }
        }
    }

    pub fn describe(&self) -> String {
        match self {
            AdmissionRule::Suffix { suffix } => format!("path ends with {}", suffix),
            AdmissionRule::SuffixWithQuery {
                suffix,
                param,
                value,
            } => format!("path ends with {} and {}={}", suffix, param, value),
            AdmissionRule::PatternWithMethod {
                method,
                base_path,
                tail,
            } => format!("{} {}/<repo>/{}", method, base_path, tail),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(method: &str, uri: &str) -> RequestDescriptor {
        RequestDescriptor::from_uri(method, uri, "")
    }

    #[test]
    fn test_suffix_ignores_method() {
        let rule = AdmissionRule::suffix("git-receive-pack");
        assert!(rule.matches(&request("POST", "/git/a.git/git-receive-pack")));
        assert!(rule.matches(&request("GET", "/git/a.git/git-receive-pack")));
        assert!(!rule.matches(&request("POST", "/git/a.git/git-upload-pack")));
    }

    #[test]
    fn test_suffix_checks_path_not_query() {
        let rule = AdmissionRule::suffix("git-receive-pack");
        assert!(!rule.matches(&request("GET", "/git/a.git/info/refs?x=git-receive-pack")));
    }

    #[test]
    fn test_suffix_with_query() {
        let rule = AdmissionRule::suffix_with_query("/info/refs", "service", "git-receive-pack");
        assert!(rule.matches(&request("GET", "/git/a.git/info/refs?service=git-receive-pack")));
        assert!(!rule.matches(&request("GET", "/git/a.git/info/refs?service=git-upload-pack")));
        assert!(!rule.matches(&request("GET", "/git/a.git/info/refs")));
    }

    #[test]
    fn test_pattern_escapes_context_path() {
        let rule = AdmissionRule::pattern_with_method("PUT", "/git", "objects/[a-z]+");
        let hit = RequestDescriptor::from_uri("PUT", "/scm.1/git/a/objects/abc", "/scm.1");
        let miss = RequestDescriptor::from_uri("PUT", "/scmx1/git/a/objects/abc", "/scm.1");
        assert!(rule.matches(&hit));
        assert!(!rule.matches(&miss));
    }

    #[test]
    fn test_pattern_requires_method() {
        let rule = AdmissionRule::pattern_with_method("PUT", "/git", "objects/[a-z]+");
        assert!(!rule.matches(&request("POST", "/git/a/objects/abc")));
    }

    #[test]
    fn test_pattern_compiled_once_per_context_path() {
        let rule = AdmissionRule::pattern_with_method("PUT", "/cache", "blobs/[0-9]+");
        let first = RequestDescriptor::from_uri("PUT", "/ctx-a/cache/r/blobs/1", "/ctx-a");
        let second = RequestDescriptor::from_uri("PUT", "/ctx-a/cache/r/blobs/2", "/ctx-a");
        let key = &format!("^{}/cache/.+(\\.git)?/blobs/[0-9]+$", regex::escape("/ctx-a"));
        assert!(rule.matches(&first));
        let cached = PATTERNS.get(key).and_then(|entry| entry.value().clone()).unwrap();
        assert!(rule.matches(&second));
        let reused = PATTERNS.get(key).and_then(|entry| entry.value().clone()).unwrap();
        assert_eq!(cached.as_str(), reused.as_str());
        assert!(PATTERNS.contains_key(key));
    }

    #[test]
    fn test_invalid_tail_never_matches() {
        let rule = AdmissionRule::pattern_with_method("PUT", "/git", "objects/[a-z");
        assert!(!rule.matches(&request("PUT", "/git/a/objects/[a-z")));
        assert!(!rule.matches(&request("PUT", "/git/a/objects/[a-z")));
        assert!(PATTERNS.contains_key("^/git/.+(\\.git)?/objects/[a-z$"));
    }
}
