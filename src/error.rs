use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("share text is empty")]
    EmptyInput,

    #[error("no http(s) link found in share text")]
    NoLinkFound,

    #[error("no resolver supports the links in this share text")]
    UnsupportedPlatform,

    #[error("{platform}: no resource id found in {link}")]
    IdentificationFailed { platform: String, link: String },

    #[error("short link did not yield a redirect: {link}")]
    ShortLinkUnresolved { link: String },

    #[error(
        "{platform}: every page for resource {resource_id} was blocked by anti-automation checks; \
         try the app's short share link or configure a session cookie"
    )]
    Blocked {
        platform: String,
        resource_id: String,
    },

    #[error("{platform}: no usable data extracted for resource {resource_id} (page layout may have changed)")]
    ExtractionFailed {
        platform: String,
        resource_id: String,
    },

    #[error("resolution produced no resource; the link type may be unsupported")]
    Unresolved,

    #[error("invalid attempt transition: {from} -> {to}")]
    InvalidTransition { from: String, to: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for failures caused by the platform refusing automated clients.
    pub fn is_blocked(&self) -> bool {
        matches!(self, EngineError::Blocked { .. })
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
