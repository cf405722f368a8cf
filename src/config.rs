use crate::platform::{HeaderPair, PlatformProfile};
use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 20;

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (iPhone; CPU iPhone OS 26_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/26.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Linux; Android 6.0; Nexus 5 Build/MRA58N) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/78.0.3904.108 Mobile Safari/537.36",
    "Mozilla/5.0 (Linux; Android 13; SM-S908B) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/112.0.0.0 Mobile Safari/537.36",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 16_0 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/16.0 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/127.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0.0.0 Safari/537.36",
];

/// Process-wide resolver settings. Built once at startup and handed to the
/// resolvers; nothing below reads the environment on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    pub timeout_secs: u64,
    /// Client identity pool, tried in order.
    pub user_agents: Vec<String>,
    /// Session cookie per platform name.
    pub cookies: BTreeMap<String, String>,
    /// Platform profiles. Empty means the built-in set.
    pub platforms: Vec<PlatformProfile>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            cookies: BTreeMap::new(),
            platforms: Vec::new(),
        }
    }
}

impl ResolverConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    pub fn platforms(&self) -> Vec<PlatformProfile> {
        if self.platforms.is_empty() {
            PlatformProfile::builtin()
        } else {
            self.platforms.clone()
        }
    }

    pub fn cookie_for(&self, platform: &str) -> Option<&str> {
        self.cookies
            .get(platform)
            .map(|c| c.trim())
            .filter(|c| !c.is_empty())
    }

    /// Fill `cookies` from each platform's cookie variable. Values already
    /// present (e.g. from the config file) win.
    pub fn apply_env_cookies(&mut self) {
        self.apply_cookies_from(|key| std::env::var(key).ok());
    }

    pub fn apply_cookies_from<F>(&mut self, mut lookup: F)
    where
        F: FnMut(&str) -> Option<String>,
    {
        for profile in self.platforms() {
            let Some(key) = profile.cookie_env.as_deref() else {
                continue;
            };
            if self.cookie_for(&profile.name).is_some() {
                continue;
            }
            if let Some(value) = lookup(key) {
                let trimmed = value.trim();
                if !trimmed.is_empty() {
                    self.cookies.insert(profile.name.clone(), trimmed.to_string());
                }
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.user_agents.iter().all(|ua| ua.trim().is_empty()) {
            return Err(EngineError::Config(
                "at least one user agent is required".to_string(),
            ));
        }
        for profile in self.platforms() {
            profile.validate()?;
        }
        Ok(())
    }

    /// One identity per configured user agent, carrying the platform's headers.
    pub fn identities_for(&self, profile: &PlatformProfile) -> Vec<ClientIdentity> {
        self.user_agents
            .iter()
            .map(|ua| ua.trim())
            .filter(|ua| !ua.is_empty())
            .map(|ua| ClientIdentity::new(ua, &profile.headers))
            .collect()
    }
}

pub fn load_resolver_config(path: &Path) -> Result<ResolverConfig> {
    if !path.exists() {
        return Ok(ResolverConfig::default());
    }
    let bytes = std::fs::read(path)?;
    let parsed: ResolverConfig = serde_json::from_slice(&bytes).map_err(|e| {
        EngineError::Config(format!(
            "failed to parse resolver config at {}: {e}",
            path.to_string_lossy()
        ))
    })?;
    parsed.validate()?;
    Ok(parsed)
}

pub fn save_resolver_config(path: &Path, config: &ResolverConfig) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, format!("{json}\n"))?;
    Ok(())
}

/// How a request presents itself to the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIdentity {
    pub user_agent: String,
    pub headers: Vec<HeaderPair>,
}

impl ClientIdentity {
    pub fn new(user_agent: &str, headers: &[HeaderPair]) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            headers: headers.to_vec(),
        }
    }

    /// Full header set for one request, with the optional session cookie.
    pub fn request_headers(&self, cookie: Option<&str>) -> Vec<HeaderPair> {
        let mut out = Vec::with_capacity(self.headers.len() + 2);
        out.push(HeaderPair::new("User-Agent", &self.user_agent));
        out.extend(self.headers.iter().cloned());
        if let Some(cookie) = cookie.map(str::trim).filter(|c| !c.is_empty()) {
            out.push(HeaderPair::new("Cookie", cookie));
        }
        out
    }
}
