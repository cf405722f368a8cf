use crate::platform::{IdRule, PlatformProfile};
use crate::{EngineError, Result};
use regex::Regex;
use url::Url;

/// Applies a platform's ordered id rules to a parsed URL.
#[derive(Debug, Clone)]
pub struct IdExtractor {
    rules: Vec<IdRule>,
    shape: Regex,
}

impl IdExtractor {
    pub fn new(rules: Vec<IdRule>, id_pattern: &str) -> Result<Self> {
        let shape = Regex::new(id_pattern)
            .map_err(|e| EngineError::Config(format!("invalid id pattern {id_pattern}: {e}")))?;
        Ok(Self { rules, shape })
    }

    pub fn from_profile(profile: &PlatformProfile) -> Result<Self> {
        Self::new(profile.id_rules.clone(), &profile.id_pattern)
    }

    /// First matching rule wins. `None` means "try the short-link redirect",
    /// not failure.
    pub fn extract(&self, url: &Url) -> Option<String> {
        self.rules.iter().find_map(|rule| self.apply(rule, url))
    }

    fn apply(&self, rule: &IdRule, url: &Url) -> Option<String> {
        match rule {
            IdRule::QueryParam(name) => url
                .query_pairs()
                .find(|(k, _)| k == name.as_str())
                .map(|(_, v)| v.into_owned())
                .filter(|v| !v.is_empty()),
            IdRule::ShareSegment(segment) => {
                let path = url.path();
                if !path.contains(segment.as_str()) {
                    return None;
                }
                let parts: Vec<&str> = path.split(segment.as_str()).collect();
                if parts.len() != 2 {
                    return None;
                }
                self.shaped(parts[1])
            }
            IdRule::PathPrefix(prefix) => url
                .path()
                .strip_prefix(prefix.as_str())
                .and_then(|rest| self.shaped(rest)),
        }
    }

    fn shaped(&self, raw: &str) -> Option<String> {
        let id = raw.trim_matches('/');
        if self.shape.is_match(id) {
            Some(id.to_string())
        } else {
            None
        }
    }
}
