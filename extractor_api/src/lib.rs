#[macro_use]
extern crate smart_default;

mod config;
mod context;
mod error;

pub use config::ExtractorConfig;
pub use context::{build_http, ExtractionContext};
pub use error::{user_message, ExtractorError};

pub mod cache;
pub mod formats;
pub mod instance;
pub mod paged;
pub mod subtitles;
pub mod traverse;

pub use anyhow;
pub use async_trait::async_trait;
pub use chrono::{self, DateTime, Utc};
pub use futures;
pub use reqwest;
pub use url;

pub use formats::{MediaFormat, MediaFormatURL, RawFormat};
pub use paged::OnDemandPagedList;
pub use subtitles::{SubtitleExt, SubtitleMap, SubtitleTrack};

use anyhow::Result;
use serde::Serialize;
use std::time::Duration;
use url::Url;

pub trait NewExtractor {
    fn new() -> Self;
}

#[async_trait]
pub trait URLMatcher: Sync + Send {
    /// Stable name of the extractor, used in playlist entries and logs.
    fn extractor_key(&self) -> &'static str;

    fn match_extractor(&self, url: &Url) -> bool;

    /// Called after `match_extractor` succeeded, before the extractor is picked.
    /// Self-hosted services use it to check that the host actually runs the service.
    async fn confirm_match(&self, _ctx: &ExtractionContext, _url: &Url) -> bool {
        true
    }
}

#[async_trait]
pub trait RecordingExtractor: URLMatcher {
    async fn extract_recording(
        &self,
        ctx: &ExtractionContext,
        url: &Url,
        wanted: &Extractable,
    ) -> Result<Extraction>;

    /// Lists the subtitles without doing the whole extraction.
    async fn list_subtitles(&self, _ctx: &ExtractionContext, _url: &Url) -> Result<SubtitleMap> {
        Ok(SubtitleMap::new())
    }
}

/// What should be extracted from the service.
/// This is to limit the amount of requests made, based on what is needed.
/// Extractors may fail just some parts and return the others in some cases, possible situations include:
/// * rate limiting
/// * region locks
/// * age gate
#[derive(Default)]
pub struct Extractable {
    pub metadata: ExtractLevel,
    pub playback: ExtractLevel,
}

impl Extractable {
    pub fn everything() -> Self {
        Extractable {
            metadata: ExtractLevel::Extended,
            playback: ExtractLevel::Extended,
        }
    }
}

#[derive(Serialize, SmartDefault, PartialEq, Debug)]
pub enum ExtractLevel {
    #[default]
    None,
    Basic,
    Extended,
}

#[derive(Serialize, Default, Debug)]
pub struct Extraction {
    pub metadata: Option<MediaMetadata>,
    pub formats: Option<Vec<MediaFormat>>,
    pub subtitles: Option<SubtitleMap>,
}

#[derive(Serialize, Default, PartialEq, Clone, Debug)]
pub struct MediaMetadata {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub duration: Option<Duration>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub dislike_count: Option<u64>,
    pub live_status: Option<LiveStatus>,
    pub age_limit: Option<u8>,
    pub published_time: Option<DateTime<Utc>>,
    pub thumbnail: Option<Url>,
    pub webpage_url: Option<Url>,
    pub uploader: Option<Uploader>,
    pub channel: Option<Uploader>,
    pub language: Option<String>,
    pub license: Option<String>,
    pub tags: Vec<String>,
    pub categories: Vec<String>,
}

/// Account or channel that published the media.
#[derive(Serialize, Default, PartialEq, Clone, Debug)]
pub struct Uploader {
    pub name: Option<String>,
    pub id: Option<String>,
    pub url: Option<Url>,
    /// Service-specific secondary id, like the pixiv account behind a sketch user
    pub alt_id: Option<String>,
}

#[derive(Serialize, PartialEq, Clone, Debug)]
pub enum LiveStatus {
    /// Never meant as a live stream
    NotLive,
    /// Is a live stream that is currently ongoing
    IsLive,
    /// A recording of a live stream
    WasLive,
}

#[derive(Serialize, SmartDefault, PartialEq, Clone, Debug)]
pub enum ListBreed {
    /// User-defined set of videos
    #[default]
    Playlist,
    /// Anything uploaded by a channel/user account
    Channel,
}

/// Reference to a single item of a list, to be extracted separately.
#[derive(Serialize, PartialEq, Clone, Debug)]
pub struct PlaylistEntry {
    pub url: Url,
    pub id: Option<String>,
    pub title: Option<String>,
    /// Key of the extractor that should handle `url`, if known
    pub extractor_key: Option<&'static str>,
}

/// Used as a result of the extraction.
pub enum AnyExtraction {
    Recording(Extraction),
    List(ListExtraction),
}

/// What the list extractor spits out at you.
/// The entries are only fetched when consumed, see [`OnDemandPagedList::entries`].
pub struct ListExtraction {
    pub id: String,
    pub breed: ListBreed,
    pub title: Option<String>,
    pub description: Option<String>,
    pub published_time: Option<DateTime<Utc>>,
    pub channel: Option<Uploader>,
    pub thumbnail: Option<Url>,
    pub entries: OnDemandPagedList<PlaylistEntry>,
}

#[async_trait]
pub trait ListExtractor: URLMatcher {
    /// Extracts something that is a list from the service.
    async fn extract_list(&self, ctx: &ExtractionContext, url: &Url) -> Result<ListExtraction>;
}

pub enum AnyExtractor {
    Recording(Box<dyn RecordingExtractor>),
    List(Box<dyn ListExtractor>),
}

impl AnyExtractor {
    pub async fn extract_info(
        &self,
        ctx: &ExtractionContext,
        url: &Url,
        wanted: &Extractable,
    ) -> Result<AnyExtraction> {
        match self {
            AnyExtractor::Recording(re) => re
                .extract_recording(ctx, url, wanted)
                .await
                .map(AnyExtraction::Recording),
            AnyExtractor::List(le) => le.extract_list(ctx, url).await.map(AnyExtraction::List),
        }
    }

    pub fn extractor_key(&self) -> &'static str {
        match self {
            AnyExtractor::Recording(re) => re.extractor_key(),
            AnyExtractor::List(le) => le.extractor_key(),
        }
    }

    pub fn match_extractor(&self, url: &Url) -> bool {
        match self {
            AnyExtractor::Recording(re) => re.match_extractor(url),
            AnyExtractor::List(le) => le.match_extractor(url),
        }
    }

    pub async fn confirm_match(&self, ctx: &ExtractionContext, url: &Url) -> bool {
        match self {
            AnyExtractor::Recording(re) => re.confirm_match(ctx, url).await,
            AnyExtractor::List(le) => le.confirm_match(ctx, url).await,
        }
    }
}
