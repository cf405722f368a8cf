use crate::classify::VideoCandidate;
use crate::http::{Redirects, Session};
use crate::platform::{HeaderPair, PlatformProfile};
use crate::record::Record;
use tracing::debug;

/// Turn a video candidate into a record by probing the playback redirect
/// endpoint in the session that produced the payload. `None` rejects the
/// candidate and the search moves on.
pub fn resolve_video_location<S: Session>(
    session: &S,
    headers: &[HeaderPair],
    profile: &PlatformProfile,
    candidate: &VideoCandidate,
) -> Option<Record> {
    if candidate.play_uri.is_empty() {
        debug!("video payload carries no playback uri");
        return None;
    }

    let fallback = candidate.fallback_urls.first().map(String::as_str);
    let Some(endpoint) = profile.playback_url(&candidate.play_uri) else {
        let resource = fallback?;
        return Some(Record::video(
            &candidate.title,
            &candidate.cover,
            resource,
            resource,
        ));
    };

    let reply = match session.get(&endpoint, headers, Redirects::Stop) {
        Ok(reply) => reply,
        Err(err) => {
            debug!(error = %err, "playback probe failed");
            return None;
        }
    };

    let resource = match reply.location.as_deref() {
        Some(location) => location,
        None => {
            debug!(status = reply.status, "playback probe returned no Location");
            fallback?
        }
    };

    Some(Record::video(
        &candidate.title,
        &candidate.cover,
        &endpoint,
        resource,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpReply;
    use crate::record::{MediaKind, ResourcePath};
    use crate::{EngineError, Result};
    use std::cell::RefCell;

    struct ProbeSession {
        reply: Result<Option<String>>,
        requested: RefCell<Vec<String>>,
    }

    impl ProbeSession {
        fn new(reply: Result<Option<String>>) -> Self {
            Self {
                reply,
                requested: RefCell::new(Vec::new()),
            }
        }
    }

    impl Session for ProbeSession {
        fn get(&self, url: &str, _headers: &[HeaderPair], redirects: Redirects) -> Result<HttpReply> {
            assert_eq!(redirects, Redirects::Stop);
            self.requested.borrow_mut().push(url.to_string());
            match &self.reply {
                Ok(location) => Ok(HttpReply {
                    status: if location.is_some() { 302 } else { 200 },
                    location: location.clone(),
                    body: String::new(),
                }),
                Err(_) => Err(EngineError::Transport("connection reset".to_string())),
            }
        }
    }

    fn candidate(uri: &str, fallbacks: &[&str]) -> VideoCandidate {
        VideoCandidate {
            title: "clip".to_string(),
            cover: "https://cdn/cover.jpg".to_string(),
            play_uri: uri.to_string(),
            fallback_urls: fallbacks.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn location_header_becomes_resource_path() {
        let session = ProbeSession::new(Ok(Some("https://v3.cdn/video.mp4".to_string())));
        let record = resolve_video_location(
            &session,
            &[],
            &PlatformProfile::douyin(),
            &candidate("v0200", &["https://cdn/fallback.mp4"]),
        )
        .expect("record");
        assert_eq!(record.kind, MediaKind::Video);
        assert_eq!(
            record.resource_path,
            ResourcePath::Video("https://v3.cdn/video.mp4".to_string())
        );
        assert_eq!(
            record.video.as_deref(),
            Some("https://aweme.snssdk.com/aweme/v1/play/?video_id=v0200&ratio=720p&line=0")
        );
        assert_eq!(session.requested.borrow().len(), 1);
    }

    #[test]
    fn missing_location_falls_back_to_first_payload_url() {
        let session = ProbeSession::new(Ok(None));
        let record = resolve_video_location(
            &session,
            &[],
            &PlatformProfile::douyin(),
            &candidate("v0200", &["https://cdn/first.mp4", "https://cdn/second.mp4"]),
        )
        .expect("record");
        assert_eq!(
            record.resource_path,
            ResourcePath::Video("https://cdn/first.mp4".to_string())
        );
    }

    #[test]
    fn no_location_and_no_fallback_rejects() {
        let session = ProbeSession::new(Ok(None));
        let out = resolve_video_location(
            &session,
            &[],
            &PlatformProfile::douyin(),
            &candidate("v0200", &[]),
        );
        assert!(out.is_none());
    }

    #[test]
    fn missing_uri_rejects_without_probing() {
        let session = ProbeSession::new(Ok(Some("https://v3.cdn/video.mp4".to_string())));
        let out = resolve_video_location(
            &session,
            &[],
            &PlatformProfile::douyin(),
            &candidate("", &["https://cdn/first.mp4"]),
        );
        assert!(out.is_none());
        assert!(session.requested.borrow().is_empty());
    }

    #[test]
    fn probe_transport_error_rejects() {
        let session = ProbeSession::new(Err(EngineError::Transport("boom".to_string())));
        let out = resolve_video_location(
            &session,
            &[],
            &PlatformProfile::douyin(),
            &candidate("v0200", &["https://cdn/first.mp4"]),
        );
        assert!(out.is_none());
    }
}
