use crate::platform::HeaderPair;
use crate::{EngineError, Result};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirects {
    Follow,
    /// Return the 3xx response itself so `Location` can be read.
    Stop,
}

#[derive(Debug, Clone)]
pub struct HttpReply {
    pub status: u16,
    pub location: Option<String>,
    /// Empty for `Redirects::Stop` requests; the body is never read there.
    pub body: String,
}

/// One cookie-isolated client. Each fetch attempt opens its own.
pub trait Session {
    fn get(&self, url: &str, headers: &[HeaderPair], redirects: Redirects) -> Result<HttpReply>;
}

pub trait Transport {
    type Session: Session;

    fn open_session(&self) -> Self::Session;
}

/// Blocking transport backed by `ureq`; every session gets a fresh agent and
/// with it a fresh cookie jar.
#[derive(Debug, Clone)]
pub struct UreqTransport {
    timeout: Duration,
}

impl UreqTransport {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Transport for UreqTransport {
    type Session = UreqSession;

    fn open_session(&self) -> UreqSession {
        UreqSession {
            agent: build_http_agent(self.timeout),
        }
    }
}

pub struct UreqSession {
    agent: ureq::Agent,
}

fn build_http_agent(timeout: Duration) -> ureq::Agent {
    let mut config = ureq::Agent::config_builder();
    config = config
        .http_status_as_error(false)
        .timeout_global(Some(timeout));
    config.build().into()
}

impl Session for UreqSession {
    fn get(&self, url: &str, headers: &[HeaderPair], redirects: Redirects) -> Result<HttpReply> {
        let mut request = self.agent.get(url);
        if redirects == Redirects::Stop {
            request = request
                .config()
                .max_redirects(0)
                .max_redirects_will_error(false)
                .build();
        }
        for header in headers {
            if header.name.eq_ignore_ascii_case("cookie") {
                // Merged into the jar so a single Cookie header goes out.
                self.seed_cookies(url, &header.value)?;
                continue;
            }
            request = request.header(header.name.as_str(), header.value.as_str());
        }

        let mut response = request.call().map_err(|e| {
            EngineError::Transport(format!("request failed for {}: {e}", redact_url_for_log(url)))
        })?;

        let status = response.status().as_u16();
        let location = header_string(&response, "location");
        let body = match redirects {
            Redirects::Stop => String::new(),
            Redirects::Follow => response.body_mut().read_to_string().map_err(|e| {
                EngineError::Transport(format!(
                    "failed to read body from {}: {e}",
                    redact_url_for_log(url)
                ))
            })?,
        };

        Ok(HttpReply {
            status,
            location,
            body,
        })
    }
}

impl UreqSession {
    /// Store `name=value` pairs from a configured Cookie header in the jar,
    /// scoped to the request host.
    fn seed_cookies(&self, url: &str, value: &str) -> Result<()> {
        let uri: ureq::http::Uri = url.parse().map_err(|e| {
            EngineError::Transport(format!("invalid request url {}: {e}", redact_url_for_log(url)))
        })?;
        let mut jar = self.agent.cookie_jar_lock();
        for pair in value.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            let parsed = ureq::Cookie::parse(format!("{pair}; Path=/"), &uri);
            let stored = parsed.and_then(|cookie| jar.insert(cookie, &uri));
            if let Err(e) = stored {
                debug!(error = %e, "configured cookie pair not stored");
            }
        }
        jar.release();
        Ok(())
    }
}

fn header_string(response: &ureq::http::Response<ureq::Body>, key: &str) -> Option<String> {
    response
        .headers()
        .get(key)
        .and_then(|v| v.to_str().ok())
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Keep only scheme and host; share URLs carry tracking tokens.
pub fn redact_url_for_log(value: &str) -> String {
    match url::Url::parse(value) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or("unknown-host");
            match parsed.port() {
                Some(port) => format!("{}://{host}:{port}/...", parsed.scheme()),
                None => format!("{}://{host}/...", parsed.scheme()),
            }
        }
        Err(_) => "[invalid-url]".to_string(),
    }
}
