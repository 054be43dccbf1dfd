//! Deciding whether a host runs a given self-hosted service,
//! before trusting URLs that only look like that service's.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{info, warn};
use url::Url;

use crate::ExtractionContext;

/// A self-hosted service, for which instances can be recognized.
#[async_trait]
pub trait InstanceProtocol: Sync + Send {
    /// Name of the service, like `peertube`
    fn service_name(&self) -> &'static str;

    /// Whether the (normalized) host is on the built-in list of instances.
    fn is_known_instance(&self, hostname: &str) -> bool;

    /// Asks the host whether it runs the service.
    /// `Ok(false)` and errors both mean it doesn't (or at least, we can't tell).
    async fn probe(&self, ctx: &ExtractionContext, hostname: &str) -> Result<bool>;
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum TrustVerdict {
    /// On the built-in or configured list of instances
    AllowListed,
    /// Passed the probe before
    Cached,
    /// The URL explicitly said which service it is
    Asserted,
    /// Passed the probe just now
    Probed,
    /// Unknown, and probing is disabled
    Skipped,
    /// Failed the probe
    Rejected,
}

impl TrustVerdict {
    pub fn is_trusted(&self) -> bool {
        !matches!(self, TrustVerdict::Skipped | TrustVerdict::Rejected)
    }
}

/// Puts the hostname into the ASCII-compatible form (punycode, lowercase),
/// so that one host never gets two different cache keys. The port is kept.
pub fn normalize_hostname(hostname: &str) -> Option<String> {
    let url = Url::parse(&format!("http://{}/", hostname.trim())).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}:{}", host, port),
        None => host.to_string(),
    })
}

/// Goes through: allow-list, cache, asserted service, probing.
/// Only successful probes get cached, so a flaky host gets another chance next time.
pub async fn check_instance(
    ctx: &ExtractionContext,
    protocol: &dyn InstanceProtocol,
    hostname: &str,
    asserted: bool,
) -> TrustVerdict {
    let hostname = match normalize_hostname(hostname) {
        Some(h) => h,
        None => return TrustVerdict::Rejected,
    };

    if protocol.is_known_instance(&hostname)
        || ctx
            .config
            .known_instances
            .iter()
            .filter_map(|h| normalize_hostname(h))
            .any(|h| h == hostname)
    {
        return TrustVerdict::AllowListed;
    }

    let pool = format!("{}_instances", protocol.service_name());
    match ctx.cache.get::<bool>(&pool, &hostname).await {
        Ok(Some(true)) => return TrustVerdict::Cached,
        Ok(_) => {}
        Err(e) => warn!("unable to read instance cache: {:#}", e),
    }

    if asserted {
        return TrustVerdict::Asserted;
    }
    if !ctx.config.check_instances {
        return TrustVerdict::Skipped;
    }

    warn!(
        "testing if {} is a {} instance, as it is not a known one",
        hostname,
        protocol.service_name()
    );
    match protocol.probe(ctx, &hostname).await {
        Ok(true) => {
            info!("{} looks like a {} instance", hostname, protocol.service_name());
            if let Err(e) = ctx.cache.set(&pool, &hostname, &true).await {
                warn!("unable to cache instance {}: {:#}", hostname, e);
            }
            TrustVerdict::Probed
        }
        Ok(false) => TrustVerdict::Rejected,
        Err(e) => {
            warn!("probing {} failed: {:#}", hostname, e);
            TrustVerdict::Rejected
        }
    }
}
