use crate::config::{ClientIdentity, ResolverConfig};
use crate::http::{redact_url_for_log, Transport, UreqTransport};
use crate::identify::IdExtractor;
use crate::normalize::normalize_link;
use crate::platform::PlatformProfile;
use crate::record::Record;
use crate::redirect::resolve_short_link;
use crate::scrape::{FetchEngine, SearchReport};
use crate::{EngineError, Result};
use tracing::{debug, info};
use url::Url;

/// What the dispatcher needs from a platform.
pub trait Resolve {
    fn name(&self) -> &str;

    fn supports(&self, link: &str) -> bool;

    fn resolve(&self, link: &str) -> Result<Record>;
}

/// The generic per-platform pipeline: normalize, identify (through the short
/// link redirect if needed), search candidate pages, classify.
pub struct PlatformResolver<T: Transport> {
    profile: PlatformProfile,
    ids: IdExtractor,
    identities: Vec<ClientIdentity>,
    cookie: Option<String>,
    transport: T,
}

impl PlatformResolver<UreqTransport> {
    pub fn from_config(config: &ResolverConfig, profile: PlatformProfile) -> Result<Self> {
        let transport = UreqTransport::new(config.timeout());
        Self::with_transport(config, profile, transport)
    }
}

impl<T: Transport> PlatformResolver<T> {
    pub fn with_transport(
        config: &ResolverConfig,
        profile: PlatformProfile,
        transport: T,
    ) -> Result<Self> {
        profile.validate()?;
        let identities = config.identities_for(&profile);
        if identities.is_empty() {
            return Err(EngineError::Config(
                "at least one user agent is required".to_string(),
            ));
        }
        Ok(Self {
            ids: IdExtractor::from_profile(&profile)?,
            cookie: config.cookie_for(&profile.name).map(str::to_string),
            identities,
            profile,
            transport,
        })
    }

    /// Resource id for a link, expanding short links through one redirect.
    pub fn identify(&self, link: &str) -> Result<String> {
        let link = normalize_link(link);
        if link.is_empty() {
            return Err(EngineError::EmptyInput);
        }
        let not_found = || EngineError::IdentificationFailed {
            platform: self.profile.name.clone(),
            link: redact_url_for_log(&link),
        };

        let parsed = Url::parse(&link).map_err(|_| not_found())?;
        if let Some(id) = self.ids.extract(&parsed) {
            return Ok(id);
        }

        let host = parsed.host_str().unwrap_or_default();
        if !self.profile.is_short_link_host(host) {
            return Err(not_found());
        }
        match resolve_short_link(
            &self.transport,
            &self.identities,
            self.cookie.as_deref(),
            &parsed,
        ) {
            Ok(target) => {
                debug!(target = %redact_url_for_log(target.as_str()), "short link expanded");
                self.ids.extract(&target).ok_or_else(not_found)
            }
            Err(err) => {
                debug!(error = %err, "short link expansion failed");
                Err(not_found())
            }
        }
    }

    /// Run the candidate search for a known id and keep the attempt ledger.
    pub fn search(&self, resource_id: &str) -> Result<SearchReport> {
        FetchEngine::new(
            &self.transport,
            &self.profile,
            &self.identities,
            self.cookie.as_deref(),
        )
        .search(resource_id)
    }
}

impl<T: Transport> Resolve for PlatformResolver<T> {
    fn name(&self) -> &str {
        &self.profile.name
    }

    fn supports(&self, link: &str) -> bool {
        self.profile.matches_link(link)
    }

    fn resolve(&self, link: &str) -> Result<Record> {
        let resource_id = self.identify(link)?;
        info!(platform = %self.profile.name, resource_id = %resource_id, "resolving resource");
        let report = self.search(&resource_id)?;
        if let Some(winner) = report.accepted() {
            debug!(
                page = %redact_url_for_log(&winner.page_url),
                identity = winner.identity,
                "payload accepted"
            );
        }
        let record = report.into_result(&self.profile.name, &resource_id)?;
        if !record.is_resolved() {
            return Err(EngineError::Unresolved);
        }
        Ok(record)
    }
}
