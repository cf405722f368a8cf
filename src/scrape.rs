use crate::classify::{classify, Classification};
use crate::config::ClientIdentity;
use crate::http::{redact_url_for_log, Redirects, Session, Transport};
use crate::payload::{json_blob, payload_from_value, ScrapedPayload};
use crate::platform::{HeaderPair, PlatformProfile};
use crate::playback::resolve_video_location;
use crate::record::Record;
use crate::{EngineError, Result};
use scraper::{Html, Selector};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Request failed or the body could not be read.
    Transport,
    /// No script carried a payload marker with a JSON body.
    NoPayload,
    /// The candidate blob was not valid JSON.
    InvalidJson,
    /// Valid JSON, but the item lists did not have the expected shape.
    MalformedItems,
    /// Both item lists were empty.
    NoItems,
}

/// Lifecycle of one (page URL, identity) attempt.
///
/// `Pending` moves to exactly one of `Blocked`, `Empty` or `Accepted`; an
/// `Accepted` payload may still become `RejectedPostHoc` when it cannot be
/// turned into a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Pending,
    Blocked,
    Empty(SkipReason),
    Accepted,
    RejectedPostHoc,
}

impl AttemptState {
    pub fn can_advance_to(self, next: AttemptState) -> bool {
        matches!(
            (self, next),
            (
                AttemptState::Pending,
                AttemptState::Blocked | AttemptState::Empty(_) | AttemptState::Accepted
            ) | (AttemptState::Accepted, AttemptState::RejectedPostHoc)
        )
    }
}

impl fmt::Display for AttemptState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttemptState::Pending => write!(f, "pending"),
            AttemptState::Blocked => write!(f, "blocked"),
            AttemptState::Empty(reason) => write!(f, "empty({reason:?})"),
            AttemptState::Accepted => write!(f, "accepted"),
            AttemptState::RejectedPostHoc => write!(f, "rejected-post-hoc"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub page_url: String,
    /// Index into the identity pool.
    pub identity: usize,
    pub state: AttemptState,
}

impl Attempt {
    pub fn new(page_url: &str, identity: usize) -> Self {
        Self {
            page_url: page_url.to_string(),
            identity,
            state: AttemptState::Pending,
        }
    }

    pub fn advance(&mut self, next: AttemptState) -> Result<()> {
        if !self.state.can_advance_to(next) {
            return Err(EngineError::InvalidTransition {
                from: self.state.to_string(),
                to: next.to_string(),
            });
        }
        debug!(
            page = %redact_url_for_log(&self.page_url),
            identity = self.identity,
            state = %next,
            "attempt advanced"
        );
        self.state = next;
        Ok(())
    }
}

/// Outcome of a full candidate search: every attempt made, and the record if
/// one was produced.
#[derive(Debug, Clone, Default)]
pub struct SearchReport {
    pub attempts: Vec<Attempt>,
    pub record: Option<Record>,
}

impl SearchReport {
    pub fn blocked_seen(&self) -> bool {
        self.attempts
            .iter()
            .any(|a| a.state == AttemptState::Blocked)
    }

    /// The winning attempt, if any.
    pub fn accepted(&self) -> Option<&Attempt> {
        self.attempts
            .iter()
            .find(|a| a.state == AttemptState::Accepted)
    }

    /// Blocked outranks not-found when nothing was accepted.
    pub fn into_result(self, platform: &str, resource_id: &str) -> Result<Record> {
        if let Some(record) = self.record {
            return Ok(record);
        }
        if self.blocked_seen() {
            Err(EngineError::Blocked {
                platform: platform.to_string(),
                resource_id: resource_id.to_string(),
            })
        } else {
            Err(EngineError::ExtractionFailed {
                platform: platform.to_string(),
                resource_id: resource_id.to_string(),
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageScan {
    /// A block marker matched before any parsing.
    Blocked,
    /// No payload script; `interstitial` when the body looks like a challenge.
    Missing { interstitial: bool },
    Blob(String),
}

fn contains_any(body: &str, markers: &[String]) -> bool {
    markers
        .iter()
        .any(|m| !m.is_empty() && body.contains(m.as_str()))
}

/// Classify a fetched body and pull the embedded state blob out of the first
/// inline script that carries a payload marker.
pub fn scan_page(body: &str, profile: &PlatformProfile) -> PageScan {
    if contains_any(body, &profile.block_markers) {
        return PageScan::Blocked;
    }

    let document = Html::parse_document(body);
    let selector = Selector::parse("script").expect("valid script selector");
    for script in document.select(&selector) {
        let text: String = script.text().collect();
        if !contains_any(&text, &profile.payload_markers) {
            continue;
        }
        if let Some(blob) = json_blob(&text) {
            return PageScan::Blob(blob.to_string());
        }
    }

    PageScan::Missing {
        interstitial: contains_any(body, &profile.interstitial_markers),
    }
}

/// Walks candidate page URLs (outer) × identities (inner), one fresh session
/// per attempt, until a record comes out.
pub struct FetchEngine<'a, T: Transport> {
    transport: &'a T,
    profile: &'a PlatformProfile,
    identities: &'a [ClientIdentity],
    cookie: Option<&'a str>,
}

impl<'a, T: Transport> FetchEngine<'a, T> {
    pub fn new(
        transport: &'a T,
        profile: &'a PlatformProfile,
        identities: &'a [ClientIdentity],
        cookie: Option<&'a str>,
    ) -> Self {
        Self {
            transport,
            profile,
            identities,
            cookie,
        }
    }

    pub fn search(&self, resource_id: &str) -> Result<SearchReport> {
        let mut report = SearchReport::default();
        for page_url in self.profile.page_urls(resource_id) {
            for (index, identity) in self.identities.iter().enumerate() {
                let mut attempt = Attempt::new(&page_url, index);
                let session = self.transport.open_session();
                let headers = identity.request_headers(self.cookie);
                let record = self.run_attempt(&session, &headers, &mut attempt)?;
                report.attempts.push(attempt);
                if let Some(record) = record {
                    info!(
                        platform = %self.profile.name,
                        page = %redact_url_for_log(&page_url),
                        identity = index,
                        attempts = report.attempts.len(),
                        "resource resolved"
                    );
                    report.record = Some(record);
                    return Ok(report);
                }
            }
        }
        warn!(
            platform = %self.profile.name,
            attempts = report.attempts.len(),
            blocked = report.blocked_seen(),
            "candidate pages exhausted"
        );
        Ok(report)
    }

    fn run_attempt(
        &self,
        session: &T::Session,
        headers: &[HeaderPair],
        attempt: &mut Attempt,
    ) -> Result<Option<Record>> {
        let reply = match session.get(&attempt.page_url, headers, Redirects::Follow) {
            Ok(reply) => reply,
            Err(err) => {
                debug!(error = %err, "page fetch failed");
                attempt.advance(AttemptState::Empty(SkipReason::Transport))?;
                return Ok(None);
            }
        };

        let blob = match scan_page(&reply.body, self.profile) {
            PageScan::Blob(blob) => blob,
            PageScan::Blocked | PageScan::Missing { interstitial: true } => {
                attempt.advance(AttemptState::Blocked)?;
                return Ok(None);
            }
            PageScan::Missing {
                interstitial: false,
            } => {
                attempt.advance(AttemptState::Empty(SkipReason::NoPayload))?;
                return Ok(None);
            }
        };

        let Ok(value) = serde_json::from_str::<Value>(&blob) else {
            attempt.advance(AttemptState::Empty(SkipReason::InvalidJson))?;
            return Ok(None);
        };
        let payload: ScrapedPayload = match payload_from_value(
            &value,
            &self.profile.video_items_pointer,
            &self.profile.note_items_pointer,
        ) {
            Ok(payload) => payload,
            Err(err) => {
                debug!(error = %err, "payload items have an unexpected shape");
                attempt.advance(AttemptState::Empty(SkipReason::MalformedItems))?;
                return Ok(None);
            }
        };
        if payload.is_empty() {
            attempt.advance(AttemptState::Empty(SkipReason::NoItems))?;
            return Ok(None);
        }

        attempt.advance(AttemptState::Accepted)?;
        let record = match classify(&payload) {
            Classification::Gallery(record) => Some(record),
            Classification::Video(candidate) => {
                resolve_video_location(session, headers, self.profile, &candidate)
            }
            Classification::Unmatched => None,
        };
        if record.is_none() {
            attempt.advance(AttemptState::RejectedPostHoc)?;
        }
        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_documented_transitions_are_allowed() {
        use AttemptState::*;
        assert!(Pending.can_advance_to(Blocked));
        assert!(Pending.can_advance_to(Empty(SkipReason::NoItems)));
        assert!(Pending.can_advance_to(Accepted));
        assert!(Accepted.can_advance_to(RejectedPostHoc));

        assert!(!Pending.can_advance_to(RejectedPostHoc));
        assert!(!Blocked.can_advance_to(Accepted));
        assert!(!Empty(SkipReason::NoPayload).can_advance_to(Accepted));
        assert!(!RejectedPostHoc.can_advance_to(Accepted));
        assert!(!Accepted.can_advance_to(Blocked));
    }

    #[test]
    fn advance_rejects_invalid_transition() {
        let mut attempt = Attempt::new("https://m.douyin.com/share/video/1", 0);
        attempt.advance(AttemptState::Blocked).expect("pending -> blocked");
        let err = attempt.advance(AttemptState::Accepted).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition { .. }));
        assert_eq!(attempt.state, AttemptState::Blocked);
    }

    #[test]
    fn block_marker_short_circuits_parsing() {
        let body = r#"<html><script>window.byted_acrawler.init()</script>
            <script>window._ROUTER_DATA = {"loaderData":{}}</script></html>"#;
        assert_eq!(scan_page(body, &PlatformProfile::douyin()), PageScan::Blocked);
    }

    #[test]
    fn first_marked_script_with_braces_wins() {
        let body = r#"<html><head>
            <script>var other = {"x": 1};</script>
            <script>window._ROUTER_DATA = undefined;</script>
            <script>window._ROUTER_DATA = {"first": true};</script>
            <script>window.__INITIAL_STATE__ = {"second": true};</script>
        </head></html>"#;
        assert_eq!(
            scan_page(body, &PlatformProfile::douyin()),
            PageScan::Blob(r#"{"first": true}"#.to_string())
        );
    }

    #[test]
    fn initial_state_marker_is_recognized() {
        let body = r#"<script>window.__INITIAL_STATE__={"a":[1,2]}</script>"#;
        assert_eq!(
            scan_page(body, &PlatformProfile::douyin()),
            PageScan::Blob(r#"{"a":[1,2]}"#.to_string())
        );
    }

    #[test]
    fn missing_payload_reports_interstitial_marker() {
        let profile = PlatformProfile::douyin();
        assert_eq!(
            scan_page("<html><body>plain page</body></html>", &profile),
            PageScan::Missing {
                interstitial: false
            }
        );
        assert_eq!(
            scan_page(
                r#"<html><input name="_wafchallengeid" value="1"></html>"#,
                &profile
            ),
            PageScan::Missing { interstitial: true }
        );
    }

    #[test]
    fn captcha_script_next_to_payload_is_not_blocked() {
        // Real pages can embed captcha helpers and still be usable.
        let body = r#"<html>
            <script src="https://example.com/captcha/secsdk.js"></script>
            <script>window.captchaConfig = {"mode": "lazy"};</script>
            <script>window._ROUTER_DATA = {"loaderData":{}}</script>
        </html>"#;
        assert_eq!(
            scan_page(body, &PlatformProfile::douyin()),
            PageScan::Blob(r#"{"loaderData":{}}"#.to_string())
        );
    }

    #[test]
    fn blocked_outranks_extraction_failure() {
        let mut blocked = Attempt::new("https://a", 0);
        blocked.advance(AttemptState::Blocked).unwrap();
        let mut empty = Attempt::new("https://a", 1);
        empty.advance(AttemptState::Empty(SkipReason::NoItems)).unwrap();

        let report = SearchReport {
            attempts: vec![empty.clone(), blocked],
            record: None,
        };
        assert!(report.into_result("douyin", "1").unwrap_err().is_blocked());

        let report = SearchReport {
            attempts: vec![empty],
            record: None,
        };
        assert!(matches!(
            report.into_result("douyin", "1"),
            Err(EngineError::ExtractionFailed { .. })
        ));
    }
}
