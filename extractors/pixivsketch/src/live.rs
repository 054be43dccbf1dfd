use dragnet_extractor_api::anyhow::Result;
use dragnet_extractor_api::formats::FormatBreed;
use dragnet_extractor_api::reqwest::header;
use dragnet_extractor_api::traverse::{first_str, first_string_or_number};
use dragnet_extractor_api::url::Url;
use dragnet_extractor_api::{
    async_trait, ExtractLevel, Extractable, Extraction, ExtractionContext, ExtractorError,
    LiveStatus, MediaFormat, MediaFormatURL, MediaMetadata, NewExtractor, RecordingExtractor,
    URLMatcher, Uploader,
};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

static LIVE_URL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^https?://sketch\.pixiv\.net/(?P<username>@[a-zA-Z0-9_-]+)/lives/(?P<id>\d+)")
        .unwrap()
});

const API_BASE: &str = "https://sketch.pixiv.net/api/";

#[derive(Deserialize)]
struct LiveResponse {
    data: Option<Value>,
}

pub struct PixivSketchRE {
    api_base: Url,
    /// The user can be on the live itself or on its owner, depending on the API mood
    pub uploader_name_paths: Vec<&'static str>,
    pub uploader_id_paths: Vec<&'static str>,
    pub uploader_pixiv_id_paths: Vec<&'static str>,
}

impl NewExtractor for PixivSketchRE {
    fn new() -> Self {
        PixivSketchRE {
            api_base: Url::parse(API_BASE).unwrap(),
            uploader_name_paths: vec!["/user/name", "/owner/user/name"],
            uploader_id_paths: vec!["/user/id", "/owner/user/id"],
            uploader_pixiv_id_paths: vec!["/user/pixiv_user_id", "/owner/user/pixiv_user_id"],
        }
    }
}

impl PixivSketchRE {
    /// Talks to another API server, like a mock.
    pub fn with_api_base(api_base: Url) -> Self {
        PixivSketchRE {
            api_base,
            ..Self::new()
        }
    }
}

fn flag(data: &Value, name: &'static str) -> bool {
    data.get(name).and_then(Value::as_bool).unwrap_or(false)
}

#[async_trait]
impl URLMatcher for PixivSketchRE {
    fn extractor_key(&self) -> &'static str {
        "pixiv:sketch"
    }

    fn match_extractor(&self, url: &Url) -> bool {
        LIVE_URL_RE.is_match(url.as_str())
    }
}

#[async_trait]
impl RecordingExtractor for PixivSketchRE {
    async fn extract_recording(
        &self,
        ctx: &ExtractionContext,
        url: &Url,
        wanted: &Extractable,
    ) -> Result<Extraction> {
        let id = LIVE_URL_RE
            .captures(url.as_str())
            .and_then(|c| c.name("id"))
            .map(|m| m.as_str().to_string())
            .ok_or_else(|| ExtractorError::UnsupportedUrl(url.to_string()))?;

        let response: LiveResponse = ctx
            .get_json(
                "live JSON",
                ctx.http
                    .get(self.api_base.join(&format!("lives/{}.json", id))?)
                    .header(header::REFERER, url.as_str())
                    .header("X-Requested-With", url.as_str()),
            )
            .await?;
        let data = response
            .data
            .ok_or_else(|| ExtractorError::missing_field("live JSON", "data"))?;

        match data.get("is_broadcasting").and_then(Value::as_bool) {
            Some(true) => {}
            Some(false) => {
                debug!("live {} is not broadcasting", id);
                return Err(ExtractorError::expected("This live is offline.").into());
            }
            None => {
                return Err(ExtractorError::missing_field("live JSON", "is_broadcasting").into())
            }
        }

        let mut extraction = Extraction::default();

        if wanted.metadata != ExtractLevel::None {
            let title = first_str(&data, &["/name"])
                .ok_or_else(|| ExtractorError::missing_field("live JSON", "name"))?;
            extraction.metadata = Some(MediaMetadata {
                id: id.clone(),
                title: title.to_string(),
                live_status: Some(LiveStatus::IsLive),
                age_limit: Some(if flag(&data, "is_r18") {
                    18
                } else if flag(&data, "is_r15") {
                    15
                } else {
                    0
                }),
                uploader: Some(Uploader {
                    name: first_str(&data, &self.uploader_name_paths).map(str::to_string),
                    id: first_string_or_number(&data, &self.uploader_id_paths),
                    url: None,
                    alt_id: first_string_or_number(&data, &self.uploader_pixiv_id_paths),
                }),
                webpage_url: Some(url.clone()),
                ..Default::default()
            });
        }

        if wanted.playback != ExtractLevel::None {
            let hls_url = first_str(&data, &["/owner/hls_movie/url"])
                .ok_or_else(|| ExtractorError::missing_field("live JSON", "owner.hls_movie.url"))?;
            extraction.formats = Some(vec![MediaFormat {
                id: Some("hls".to_string()),
                breed: FormatBreed::AudioVideo,
                url: MediaFormatURL::HLS(Url::parse(hls_url)?),
                video_details: None,
                filesize: None,
                video_codec: None,
            }]);
        }

        Ok(extraction)
    }
}
