use crate::config::ClientIdentity;
use crate::http::{redact_url_for_log, Redirects, Session, Transport};
use crate::{EngineError, Result};
use tracing::debug;
use url::Url;

/// Expand a short share link by reading one `Location` header, trying each
/// identity in order with no delay in between.
pub fn resolve_short_link<T: Transport>(
    transport: &T,
    identities: &[ClientIdentity],
    cookie: Option<&str>,
    short_url: &Url,
) -> Result<Url> {
    for (index, identity) in identities.iter().enumerate() {
        let session = transport.open_session();
        let reply = match session.get(
            short_url.as_str(),
            &identity.request_headers(cookie),
            Redirects::Stop,
        ) {
            Ok(reply) => reply,
            Err(err) => {
                debug!(identity = index, error = %err, "short link request failed");
                continue;
            }
        };
        let Some(location) = reply.location else {
            debug!(identity = index, status = reply.status, "short link returned no Location");
            continue;
        };
        // Relative locations resolve against the request URL; absolute ones
        // replace it.
        match short_url.join(&location) {
            Ok(resolved) => return Ok(resolved),
            Err(err) => {
                debug!(identity = index, error = %err, "short link Location is not a URL");
            }
        }
    }
    Err(EngineError::ShortLinkUnresolved {
        link: redact_url_for_log(short_url.as_str()),
    })
}
