use dragnet_extractor_api::anyhow::Result;
use dragnet_extractor_api::instance::{check_instance, InstanceProtocol};
use dragnet_extractor_api::traverse::first_str;
use dragnet_extractor_api::url::Url;
use dragnet_extractor_api::{async_trait, ExtractionContext};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

use crate::instances::KNOWN_INSTANCES;

const UUID_RE: &str = r"[\da-zA-Z]{22}|[\da-fA-F]{8}-[\da-fA-F]{4}-[\da-fA-F]{4}-[\da-fA-F]{4}-[\da-fA-F]{12}";

static VIDEO_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^(?:peertube:(?P<host>[^:/]+):|(?P<prefix>peertube:)?https?://(?P<host_2>[^/?#]+)/(?:videos/(?:watch|embed)|api/v\d+/videos|w)/)(?P<id>{})(?:[/?#]|$)",
        UUID_RE
    ))
    .unwrap()
});

static LIST_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<prefix>peertube:)?https?://(?P<host>[^/?#]+)/(?P<type>a|c|w/p)/(?P<id>[^/?#]+)")
        .unwrap()
});

static EMBED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r#"<iframe[^>]+\bsrc=["'](?P<url>(?:https?:)?//[^/]+?/videos/embed/(?:{}))"#,
        UUID_RE
    ))
    .unwrap()
});

static PAGE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"^https?://(?P<host>[^/]+)/(?:videos/(?:watch|embed)|w)/(?P<id>{})",
        UUID_RE
    ))
    .unwrap()
});

/// Bits of the PeerTube web client, in case the page is on an instance nobody knows.
const PAGE_MARKERS: [&str; 4] = [
    r#"meta property="og:platform" content="PeerTube""#,
    "<title>PeerTube<",
    "There will be other non JS-based clients to access PeerTube",
    ">We are sorry but it seems that PeerTube is not compatible with your web browser.<",
];

/// Where a PeerTube URL points to.
#[derive(PartialEq, Clone, Debug)]
pub struct PeertubeRef {
    pub host: String,
    pub id: String,
    /// The URL had the `peertube:` prefix, so the host doesn't need checking
    pub asserted: bool,
}

pub fn parse_video_url(url: &Url) -> Option<PeertubeRef> {
    let captures = VIDEO_URL_RE.captures(url.as_str())?;
    let host = captures.name("host").or_else(|| captures.name("host_2"))?;
    Some(PeertubeRef {
        host: host.as_str().to_string(),
        id: captures.name("id")?.as_str().to_string(),
        // the short form can only be written on purpose
        asserted: captures.name("prefix").is_some() || captures.name("host").is_some(),
    })
}

/// Kind of list: `a` (account), `c` (channel) or `w/p` (playlist).
pub fn parse_list_url(url: &Url) -> Option<(PeertubeRef, String)> {
    let captures = LIST_URL_RE.captures(url.as_str())?;
    Some((
        PeertubeRef {
            host: captures.name("host")?.as_str().to_string(),
            id: captures.name("id")?.as_str().to_string(),
            asserted: captures.name("prefix").is_some(),
        },
        captures.name("type")?.as_str().to_string(),
    ))
}

/// PeerTube videos on a web page: embedded players, or the page itself being a PeerTube video page.
/// The latter comes back in the `peertube:host:id` form, as the page already proved the host.
pub fn extract_embed_urls(webpage: &str, source_url: &Url) -> Vec<Url> {
    let embeds: Vec<Url> = EMBED_RE
        .captures_iter(webpage)
        .filter_map(|c| c.name("url"))
        .filter_map(|m| source_url.join(m.as_str()).ok())
        .collect();
    if !embeds.is_empty() {
        return embeds;
    }

    let captures = match PAGE_URL_RE.captures(source_url.as_str()) {
        Some(captures) => captures,
        None => return vec![],
    };
    if !PAGE_MARKERS.iter().any(|marker| webpage.contains(marker)) {
        return vec![];
    }
    let short = match (captures.name("host"), captures.name("id")) {
        (Some(host), Some(id)) => format!("peertube:{}:{}", host.as_str(), id.as_str()),
        _ => return vec![],
    };
    Url::parse(&short).into_iter().collect()
}

pub fn api_url(ctx: &ExtractionContext, host: &str, path: &str) -> Result<Url> {
    ctx.instance_url(host, &format!("/api/v1/{}", path))
}

pub struct PeertubeInstances;

#[async_trait]
impl InstanceProtocol for PeertubeInstances {
    fn service_name(&self) -> &'static str {
        "peertube"
    }

    fn is_known_instance(&self, hostname: &str) -> bool {
        KNOWN_INSTANCES.contains(hostname)
    }

    async fn probe(&self, ctx: &ExtractionContext, hostname: &str) -> Result<bool> {
        let config: Value = ctx
            .get_json(
                "PeerTube API /api/v1/config",
                ctx.http.get(api_url(ctx, hostname, "config")?),
            )
            .await?;
        if first_str(&config, &["/instance/name"]).is_none() {
            return Ok(false);
        }

        let videos: Value = ctx
            .get_json(
                "PeerTube API /api/v1/videos",
                ctx.http.get(api_url(ctx, hostname, "videos")?),
            )
            .await?;
        Ok(videos.get("data").map_or(false, Value::is_array))
    }
}

pub async fn is_peertube_instance(ctx: &ExtractionContext, place: &PeertubeRef) -> bool {
    check_instance(ctx, &PeertubeInstances, &place.host, place.asserted)
        .await
        .is_trusted()
}

#[cfg(test)]
mod tests {
    use super::{extract_embed_urls, parse_list_url, parse_video_url, PeertubeRef};
    use dragnet_extractor_api::url::Url;

    fn video(url: &str) -> Option<PeertubeRef> {
        parse_video_url(&Url::parse(url).unwrap())
    }

    #[test]
    fn video_urls() {
        assert_eq!(
            video("https://framatube.org/videos/watch/9c9de5e8-0a1e-484a-b099-e80766180a6d"),
            Some(PeertubeRef {
                host: "framatube.org".to_string(),
                id: "9c9de5e8-0a1e-484a-b099-e80766180a6d".to_string(),
                asserted: false,
            })
        );
        assert_eq!(
            video("https://peertube2.cpy.re/api/v1/videos/3fbif9S3WmtTP8gGsC5HBd")
                .unwrap()
                .id,
            "3fbif9S3WmtTP8gGsC5HBd"
        );
        assert_eq!(
            video("https://peertube.debian.social/w/0b176a2f-9e4c-4a5a-9bd5-f3c5bb4b1b4b?start=10")
                .unwrap()
                .host,
            "peertube.debian.social"
        );
        assert_eq!(
            video("peertube:video.blender.org:9c9de5e8-0a1e-484a-b099-e80766180a6d"),
            Some(PeertubeRef {
                host: "video.blender.org".to_string(),
                id: "9c9de5e8-0a1e-484a-b099-e80766180a6d".to_string(),
                asserted: true,
            })
        );
        assert!(video("peertube:https://tube.example.net/w/3fbif9S3WmtTP8gGsC5HBd")
            .unwrap()
            .asserted);
        assert_eq!(video("https://framatube.org/videos/watch/short"), None);
        assert_eq!(video("https://framatube.org/w/p/3fbif9S3WmtTP8gGsC5HBd"), None);
    }

    #[test]
    fn list_urls() {
        let (place, kind) =
            parse_list_url(&Url::parse("https://peertube2.cpy.re/a/chocobozzz/videos").unwrap())
                .unwrap();
        assert_eq!(place.id, "chocobozzz");
        assert_eq!(kind, "a");

        let (place, kind) = parse_list_url(
            &Url::parse("https://peertube.tux.ovh/w/p/wkyqcQBnsvFxtUB2pkYc1e").unwrap(),
        )
        .unwrap();
        assert_eq!(place.id, "wkyqcQBnsvFxtUB2pkYc1e");
        assert_eq!(kind, "w/p");
        assert!(!place.asserted);

        let (place, kind) = parse_list_url(
            &Url::parse("https://peertube2.cpy.re/c/blender_open_movies@video.blender.org/videos")
                .unwrap(),
        )
        .unwrap();
        assert_eq!(place.id, "blender_open_movies@video.blender.org");
        assert_eq!(kind, "c");

        assert!(parse_list_url(
            &Url::parse("https://framatube.org/w/9c9de5e8-0a1e-484a-b099-e80766180a6d").unwrap()
        )
        .is_none());
    }

    #[test]
    fn embedded_players() {
        let source = Url::parse("https://blog.example.com/2022/peertube-post").unwrap();
        let webpage = r#"<p>Watch this:</p>
            <iframe width="560" height="315" sandbox="allow-same-origin allow-scripts" src="//framatube.org/videos/embed/9c9de5e8-0a1e-484a-b099-e80766180a6d" frameborder="0" allowfullscreen></iframe>
            <iframe src='https://peertube2.cpy.re/videos/embed/3fbif9S3WmtTP8gGsC5HBd?start=10'></iframe>
            <iframe src="https://www.youtube.com/embed/dQw4w9WgXcQ"></iframe>"#;

        let urls = extract_embed_urls(webpage, &source);
        assert_eq!(
            urls.iter().map(Url::as_str).collect::<Vec<_>>(),
            vec![
                "https://framatube.org/videos/embed/9c9de5e8-0a1e-484a-b099-e80766180a6d",
                "https://peertube2.cpy.re/videos/embed/3fbif9S3WmtTP8gGsC5HBd",
            ]
        );
        assert_eq!(parse_video_url(&urls[0]).unwrap().host, "framatube.org");
        assert!(!parse_video_url(&urls[0]).unwrap().asserted);
    }

    #[test]
    fn page_of_unknown_instance() {
        let source = Url::parse("https://tube.example.net/w/3fbif9S3WmtTP8gGsC5HBd").unwrap();
        let webpage = r#"<html><head><meta property="og:platform" content="PeerTube" /></head></html>"#;

        let urls = extract_embed_urls(webpage, &source);
        assert_eq!(urls.len(), 1);
        assert_eq!(urls[0].as_str(), "peertube:tube.example.net:3fbif9S3WmtTP8gGsC5HBd");
        let place = parse_video_url(&urls[0]).unwrap();
        assert_eq!(place.host, "tube.example.net");
        assert!(place.asserted);

        assert!(extract_embed_urls("<title>Some blog</title>", &source).is_empty());
        assert!(extract_embed_urls(
            webpage,
            &Url::parse("https://tube.example.net/about").unwrap()
        )
        .is_empty());
    }
}
