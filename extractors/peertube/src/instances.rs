use std::collections::HashSet;

use once_cell::sync::Lazy;

/// A hand-picked subset of the large, long-running instances from joinpeertube.org,
/// the-federation.info and fediverse.observer. These are trusted without probing,
/// other hosts go through the instance check.
pub static KNOWN_INSTANCES: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "framatube.org",
        "peertube2.cpy.re",
        "peertube3.cpy.re",
        "peertube.cpy.re",
        "peertube.debian.social",
        "video.blender.org",
        "tilvids.com",
        "spacepub.space",
        "peertube.tux.ovh",
        "vod.ksite.de",
        "peertube.tv",
        "diode.zone",
        "kolektiva.media",
        "videos.lukesmith.xyz",
        "peertube.social",
        "peertube.linuxrocks.online",
        "tube.tchncs.de",
        "video.ploud.fr",
        "peertube.fr",
        "makertube.net",
        "tube.kockatoo.org",
        "peertube.uno",
        "videos.pair2jeux.tube",
        "peertube.mastodon.host",
        "video.antopie.org",
        "fediverse.tv",
        "peervideo.club",
        "tube.network.europa.eu",
        "video.hardlimit.com",
        "tube.privacytools.io",
    ]
    .into_iter()
    .collect()
});

#[cfg(test)]
mod tests {
    use super::KNOWN_INSTANCES;
    use dragnet_extractor_api::instance::normalize_hostname;

    #[test]
    fn listed_in_lookup_form() {
        assert!(KNOWN_INSTANCES.contains("framatube.org"));
        for host in KNOWN_INSTANCES.iter() {
            assert_eq!(normalize_hostname(host).as_deref(), Some(*host));
        }
    }
}
