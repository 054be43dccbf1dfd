use std::time::Duration;

use dragnet_extractor_api::anyhow::Result;
use dragnet_extractor_api::chrono::{DateTime, Utc};
use dragnet_extractor_api::formats::normalize_formats;
use dragnet_extractor_api::subtitles::aggregate_subtitles;
use dragnet_extractor_api::url::Url;
use dragnet_extractor_api::{
    async_trait, ExtractLevel, Extractable, Extraction, ExtractionContext, ExtractorError,
    LiveStatus, MediaMetadata, NewExtractor, RawFormat, RecordingExtractor, SubtitleMap,
    URLMatcher,
};
use serde_json::Value;
use tracing::debug;

use crate::common::{api_url, is_peertube_instance, parse_video_url, PeertubeRef};
use crate::types::{Description, File, Video};

/// Descriptions in the video JSON are cut at this length.
const SHORT_DESCRIPTION_LENGTH: usize = 250;

pub struct PeertubeRE {}

impl NewExtractor for PeertubeRE {
    fn new() -> Self {
        PeertubeRE {}
    }
}

impl PeertubeRE {
    fn place(&self, url: &Url) -> Result<PeertubeRef> {
        parse_video_url(url).ok_or_else(|| ExtractorError::UnsupportedUrl(url.to_string()).into())
    }

    async fn get_subtitles(
        &self,
        ctx: &ExtractionContext,
        base: &Url,
        place: &PeertubeRef,
    ) -> Result<SubtitleMap> {
        let captions: Option<Value> = ctx
            .get_json_optional(
                "captions JSON",
                ctx.http
                    .get(api_url(ctx, &place.host, &format!("videos/{}/captions", place.id))?),
            )
            .await;
        Ok(aggregate_subtitles(
            captions.as_ref().and_then(|c| c.get("data")),
            base,
            "/language/id",
            "/captionPath",
        ))
    }

    async fn get_full_description(
        &self,
        ctx: &ExtractionContext,
        place: &PeertubeRef,
    ) -> Result<Option<String>> {
        let description: Option<Description> = ctx
            .get_json_optional(
                "description JSON",
                ctx.http.get(api_url(
                    ctx,
                    &place.host,
                    &format!("videos/{}/description", place.id),
                )?),
            )
            .await;
        Ok(description
            .and_then(|d| d.description)
            .filter(|d| !d.is_empty()))
    }
}

fn file_to_format(base: &Url, file: &File) -> RawFormat {
    let label = file.resolution.as_ref().and_then(|r| r.label.clone());
    RawFormat {
        url: file
            .file_url
            .as_deref()
            .and_then(|u| base.join(u).ok())
            .map(String::from),
        format_id: label.clone(),
        label,
        filesize: file.size,
        fps: file.fps.filter(|fps| *fps > 0.0),
    }
}

fn video_metadata(
    video: &Video,
    place: &PeertubeRef,
    base: &Url,
    title: String,
) -> Result<MediaMetadata> {
    let webpage_url = base.join(&format!("/videos/watch/{}", place.id))?;
    Ok(MediaMetadata {
        id: place.id.clone(),
        title,
        description: video.description.clone().filter(|d| !d.is_empty()),
        duration: video.duration.map(Duration::from_secs),
        view_count: video.views,
        like_count: video.likes,
        dislike_count: video.dislikes,
        live_status: Some(if video.is_live == Some(true) {
            LiveStatus::IsLive
        } else {
            LiveStatus::NotLive
        }),
        age_limit: Some(if video.nsfw == Some(true) { 18 } else { 0 }),
        published_time: video
            .published_at
            .as_deref()
            .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
            .map(|t| t.with_timezone(&Utc)),
        thumbnail: video
            .thumbnail_path
            .as_deref()
            .and_then(|p| base.join(p).ok()),
        uploader: video.account.as_ref().map(Into::into),
        channel: video.channel.as_ref().map(Into::into),
        language: video
            .language
            .as_ref()
            .and_then(|l| l.id.as_ref())
            .and_then(Value::as_str)
            .map(str::to_string),
        license: video.licence.as_ref().and_then(|l| l.label.clone()),
        tags: video.tags.clone().unwrap_or_default(),
        categories: video
            .category
            .as_ref()
            .and_then(|c| c.label.clone())
            .into_iter()
            .collect(),
        webpage_url: Some(webpage_url),
    })
}

#[async_trait]
impl URLMatcher for PeertubeRE {
    fn extractor_key(&self) -> &'static str {
        "PeerTube"
    }

    fn match_extractor(&self, url: &Url) -> bool {
        parse_video_url(url).is_some()
    }

    async fn confirm_match(&self, ctx: &ExtractionContext, url: &Url) -> bool {
        match parse_video_url(url) {
            Some(place) => is_peertube_instance(ctx, &place).await,
            None => false,
        }
    }
}

#[async_trait]
impl RecordingExtractor for PeertubeRE {
    async fn extract_recording(
        &self,
        ctx: &ExtractionContext,
        url: &Url,
        wanted: &Extractable,
    ) -> Result<Extraction> {
        let place = self.place(url)?;
        let base = ctx.instance_url(&place.host, "/")?;

        let video: Video = ctx
            .get_json(
                "video JSON",
                ctx.http
                    .get(api_url(ctx, &place.host, &format!("videos/{}", place.id))?),
            )
            .await?;
        let title = video
            .name
            .clone()
            .ok_or_else(|| ExtractorError::missing_field("video JSON", "name"))?;

        let mut extraction = Extraction::default();

        if wanted.metadata != ExtractLevel::None {
            let mut metadata = video_metadata(&video, &place, &base, title)?;
            if wanted.metadata == ExtractLevel::Extended
                && metadata
                    .description
                    .as_ref()
                    .map_or(false, |d| d.chars().count() >= SHORT_DESCRIPTION_LENGTH)
            {
                debug!("description is shortened, getting the full one");
                if let Some(full) = self.get_full_description(ctx, &place).await? {
                    metadata.description = Some(full);
                }
            }
            extraction.metadata = Some(metadata);
        }

        if wanted.playback != ExtractLevel::None {
            extraction.formats = Some(normalize_formats(
                video.all_files().map(|f| file_to_format(&base, f)),
            ));
            extraction.subtitles = Some(self.get_subtitles(ctx, &base, &place).await?);
        }

        Ok(extraction)
    }

    async fn list_subtitles(&self, ctx: &ExtractionContext, url: &Url) -> Result<SubtitleMap> {
        let place = self.place(url)?;
        let base = ctx.instance_url(&place.host, "/")?;
        self.get_subtitles(ctx, &base, &place).await
    }
}
