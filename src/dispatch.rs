use crate::config::ResolverConfig;
use crate::record::Record;
use crate::resolver::{PlatformResolver, Resolve};
use crate::{EngineError, Result};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

/// Every `http(s)://` token in free text, in order of appearance.
pub fn extract_links(text: &str) -> Vec<String> {
    static LINK_RE: OnceLock<Regex> = OnceLock::new();
    let re = LINK_RE.get_or_init(|| Regex::new(r"https?://\S+").expect("valid link regex"));
    re.find_iter(text).map(|m| m.as_str().to_string()).collect()
}

/// Routes links to platform resolvers by host substring.
pub struct Dispatcher {
    resolvers: Vec<Box<dyn Resolve>>,
}

impl Dispatcher {
    pub fn new(resolvers: Vec<Box<dyn Resolve>>) -> Self {
        Self { resolvers }
    }

    /// One network-backed resolver per configured platform.
    pub fn from_config(config: &ResolverConfig) -> Result<Self> {
        config.validate()?;
        let mut resolvers: Vec<Box<dyn Resolve>> = Vec::new();
        for profile in config.platforms() {
            resolvers.push(Box::new(PlatformResolver::from_config(config, profile)?));
        }
        Ok(Self::new(resolvers))
    }

    pub fn platform_names(&self) -> Vec<&str> {
        self.resolvers.iter().map(|r| r.name()).collect()
    }

    /// Try every extracted link in order and return the first record. Links
    /// with no matching resolver are skipped; if every matched link failed,
    /// the last failure is returned.
    pub fn dispatch(&self, share_text: &str) -> Result<Record> {
        if share_text.trim().is_empty() {
            return Err(EngineError::EmptyInput);
        }
        let links = extract_links(share_text);
        if links.is_empty() {
            return Err(EngineError::NoLinkFound);
        }

        let mut last_err: Option<EngineError> = None;
        for link in &links {
            let Some(resolver) = self.resolvers.iter().find(|r| r.supports(link)) else {
                debug!("no resolver for link, skipping");
                continue;
            };
            match resolver.resolve(link) {
                Ok(record) if record.is_resolved() => return Ok(record),
                Ok(_) => last_err = Some(EngineError::Unresolved),
                Err(err) => {
                    warn!(platform = %resolver.name(), error = %err, "link failed to resolve");
                    last_err = Some(err);
                }
            }
        }

        Err(last_err.unwrap_or(EngineError::UnsupportedPlatform))
    }
}
