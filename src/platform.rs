use crate::{EngineError, Result};
use serde::{Deserialize, Serialize};

const ID_PLACEHOLDER: &str = "{id}";
const URI_PLACEHOLDER: &str = "{uri}";

/// One way of reading a resource id out of a parsed share URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", content = "value", rename_all = "snake_case")]
pub enum IdRule {
    /// Query parameter carrying the id verbatim, e.g. `?modal_id=<id>`.
    QueryParam(String),
    /// Path segment followed by the id, e.g. `/share/video/<id>`.
    ShareSegment(String),
    /// Path prefix followed by the id, e.g. `/video/<id>`.
    PathPrefix(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderPair {
    pub name: String,
    pub value: String,
}

impl HeaderPair {
    pub fn new(name: &str, value: &str) -> Self {
        Self {
            name: name.to_string(),
            value: value.to_string(),
        }
    }
}

/// Everything platform-specific the generic resolver needs. Adding a platform
/// means adding one of these, not new control flow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlatformProfile {
    pub name: String,
    /// Substrings of a link that route it to this platform.
    pub host_fragments: Vec<String>,
    /// Hosts whose links must be expanded through one redirect hop.
    pub short_link_hosts: Vec<String>,
    pub id_rules: Vec<IdRule>,
    /// Regex a resource id must match in full.
    pub id_pattern: String,
    /// Candidate page URLs, most reliable first. `{id}` is substituted.
    pub page_templates: Vec<String>,
    /// Headers sent with every request besides `User-Agent` and `Cookie`.
    pub headers: Vec<HeaderPair>,
    /// Markers that only appear on verification/interstitial pages.
    pub block_markers: Vec<String>,
    /// Markers that mean "blocked" only when no payload could be found.
    pub interstitial_markers: Vec<String>,
    /// Global-variable names of the server-rendered state script.
    pub payload_markers: Vec<String>,
    /// JSON pointer to the video-page item list inside the payload.
    pub video_items_pointer: String,
    /// JSON pointer to the note-page item list inside the payload.
    pub note_items_pointer: String,
    /// Playback redirect endpoint. `{uri}` is substituted.
    #[serde(default)]
    pub playback_template: Option<String>,
    /// Environment variable holding an optional session cookie.
    #[serde(default)]
    pub cookie_env: Option<String>,
}

impl PlatformProfile {
    pub fn douyin() -> Self {
        Self {
            name: "douyin".to_string(),
            host_fragments: vec!["v.douyin.com".to_string(), "douyin.com".to_string()],
            short_link_hosts: vec!["v.douyin.com".to_string()],
            id_rules: vec![
                IdRule::QueryParam("modal_id".to_string()),
                IdRule::ShareSegment("/share/video/".to_string()),
                IdRule::PathPrefix("/video/".to_string()),
            ],
            id_pattern: r"^\d+$".to_string(),
            page_templates: vec![
                "https://m.douyin.com/share/video/{id}".to_string(),
                "https://www.iesdouyin.com/share/video/{id}/".to_string(),
            ],
            headers: vec![
                HeaderPair::new(
                    "Accept",
                    "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,image/apng,*/*;q=0.8",
                ),
                HeaderPair::new("Accept-Language", "zh-CN,zh;q=0.9,en;q=0.8"),
                HeaderPair::new("Cache-Control", "no-cache"),
                HeaderPair::new("Pragma", "no-cache"),
                HeaderPair::new("Upgrade-Insecure-Requests", "1"),
                HeaderPair::new("Referer", "https://www.douyin.com/"),
                HeaderPair::new("Origin", "https://www.douyin.com"),
            ],
            // Genuine pages may carry captcha scripts next to usable data, so
            // only the JS-challenge shells themselves count here.
            block_markers: vec![
                "window.byted_acrawler".to_string(),
                "._$jsvmprt".to_string(),
                "验证码中间页".to_string(),
            ],
            interstitial_markers: vec!["_wafchallengeid".to_string(), "验证码中间页".to_string()],
            payload_markers: vec![
                "window._ROUTER_DATA".to_string(),
                "window.__INITIAL_STATE__".to_string(),
            ],
            video_items_pointer: "/loaderData/video_(id)~1page/videoInfoRes/item_list".to_string(),
            note_items_pointer: "/loaderData/note_(id)~1page/videoInfoRes/item_list".to_string(),
            playback_template: Some(
                "https://aweme.snssdk.com/aweme/v1/play/?video_id={uri}&ratio=720p&line=0"
                    .to_string(),
            ),
            cookie_env: Some("DOUYIN_COOKIE".to_string()),
        }
    }

    pub fn builtin() -> Vec<Self> {
        vec![Self::douyin()]
    }

    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(EngineError::Config("platform name is empty".to_string()));
        }
        if self.host_fragments.iter().all(|f| f.trim().is_empty()) {
            return Err(EngineError::Config(format!(
                "{}: at least one host fragment is required",
                self.name
            )));
        }
        if self.page_templates.is_empty() {
            return Err(EngineError::Config(format!(
                "{}: at least one page template is required",
                self.name
            )));
        }
        if let Some(bad) = self
            .page_templates
            .iter()
            .find(|t| !t.contains(ID_PLACEHOLDER))
        {
            return Err(EngineError::Config(format!(
                "{}: page template {bad} lacks {ID_PLACEHOLDER}",
                self.name
            )));
        }
        if let Some(template) = &self.playback_template {
            if !template.contains(URI_PLACEHOLDER) {
                return Err(EngineError::Config(format!(
                    "{}: playback template lacks {URI_PLACEHOLDER}",
                    self.name
                )));
            }
        }
        if self.payload_markers.is_empty() {
            return Err(EngineError::Config(format!(
                "{}: at least one payload marker is required",
                self.name
            )));
        }
        Ok(())
    }

    /// Host-substring routing, as applied to the raw link text.
    pub fn matches_link(&self, link: &str) -> bool {
        self.host_fragments
            .iter()
            .any(|f| !f.is_empty() && link.contains(f.as_str()))
    }

    pub fn is_short_link_host(&self, host: &str) -> bool {
        self.short_link_hosts
            .iter()
            .any(|h| !h.is_empty() && host.contains(h.as_str()))
    }

    pub fn page_urls(&self, resource_id: &str) -> Vec<String> {
        self.page_templates
            .iter()
            .map(|t| t.replace(ID_PLACEHOLDER, resource_id))
            .collect()
    }

    pub fn playback_url(&self, play_uri: &str) -> Option<String> {
        let template = self.playback_template.as_ref()?;
        let encoded: String = url::form_urlencoded::byte_serialize(play_uri.as_bytes()).collect();
        Some(template.replace(URI_PLACEHOLDER, &encoded))
    }
}
