use dragnet_extractor_api::anyhow::Result;
use dragnet_extractor_api::chrono::{DateTime, Utc};
use dragnet_extractor_api::futures::FutureExt;
use dragnet_extractor_api::traverse::{first_str, first_string_or_number};
use dragnet_extractor_api::url::Url;
use dragnet_extractor_api::{
    async_trait, ExtractionContext, ExtractorError, ListBreed, ListExtraction, ListExtractor,
    NewExtractor, OnDemandPagedList, PlaylistEntry, URLMatcher, Uploader,
};
use serde_json::Value;
use tracing::warn;

use crate::common::{api_url, is_peertube_instance, parse_list_url, PeertubeRef};
use crate::types::{id_string, ListInfo};
use crate::video::PeertubeRE;

pub const PAGE_SIZE: usize = 30;

pub struct PeertubePlaylistLE {
    /// Where the video id is in a list item.
    /// Playlists wrap each video in an element object, the other lists don't.
    entry_id_paths: Vec<&'static str>,
    entry_title_paths: Vec<&'static str>,
}

impl NewExtractor for PeertubePlaylistLE {
    fn new() -> Self {
        PeertubePlaylistLE {
            entry_id_paths: vec!["/shortUUID", "/video/shortUUID", "/uuid", "/video/uuid"],
            entry_title_paths: vec!["/name", "/video/name"],
        }
    }
}

fn endpoint(kind: &str) -> Option<(&'static str, ListBreed)> {
    match kind {
        "a" => Some(("accounts", ListBreed::Channel)),
        "c" => Some(("video-channels", ListBreed::Channel)),
        "w/p" => Some(("video-playlists", ListBreed::Playlist)),
        _ => None,
    }
}

/// What is needed to get the pages, without borrowing the extractor.
#[derive(Clone)]
struct PageSource {
    ctx: ExtractionContext,
    place: PeertubeRef,
    endpoint: &'static str,
    entry_id_paths: Vec<&'static str>,
    entry_title_paths: Vec<&'static str>,
}

impl PageSource {
    /// Deleted or private videos come as items without a video, these are `None`.
    async fn fetch_page(self, page: u32) -> Result<Vec<Option<PlaylistEntry>>> {
        let start = page as usize * PAGE_SIZE;
        let response: Value = self
            .ctx
            .get_json(
                &format!("page {}", page + 1),
                self.ctx
                    .http
                    .get(api_url(
                        &self.ctx,
                        &self.place.host,
                        &format!("{}/{}/videos", self.endpoint, self.place.id),
                    )?)
                    .query(&[
                        ("sort", "-createdAt".to_string()),
                        ("start", start.to_string()),
                        ("count", PAGE_SIZE.to_string()),
                        ("nsfw", "both".to_string()),
                    ]),
            )
            .await?;

        let items = match response.get("data") {
            Some(Value::Array(items)) => items,
            _ => return Ok(vec![]),
        };
        let mut entries = Vec::with_capacity(items.len());
        for item in items {
            let id = match first_string_or_number(item, &self.entry_id_paths) {
                Some(id) => id,
                None => {
                    warn!("skipping a list item without a video id");
                    entries.push(None);
                    continue;
                }
            };
            entries.push(Some(PlaylistEntry {
                url: self
                    .ctx
                    .instance_url(&self.place.host, &format!("/w/{}", id))?,
                title: first_str(item, &self.entry_title_paths).map(str::to_string),
                id: Some(id),
                extractor_key: Some(PeertubeRE::new().extractor_key()),
            }));
        }
        Ok(entries)
    }
}

#[async_trait]
impl URLMatcher for PeertubePlaylistLE {
    fn extractor_key(&self) -> &'static str {
        "PeerTube:Playlist"
    }

    fn match_extractor(&self, url: &Url) -> bool {
        parse_list_url(url).is_some()
    }

    async fn confirm_match(&self, ctx: &ExtractionContext, url: &Url) -> bool {
        match parse_list_url(url) {
            Some((place, _)) => is_peertube_instance(ctx, &place).await,
            None => false,
        }
    }
}

#[async_trait]
impl ListExtractor for PeertubePlaylistLE {
    async fn extract_list(&self, ctx: &ExtractionContext, url: &Url) -> Result<ListExtraction> {
        let (place, kind) =
            parse_list_url(url).ok_or_else(|| ExtractorError::UnsupportedUrl(url.to_string()))?;
        let (endpoint, breed) =
            endpoint(&kind).ok_or_else(|| ExtractorError::UnsupportedUrl(url.to_string()))?;
        let base = ctx.instance_url(&place.host, "/")?;

        let info: Option<ListInfo> = ctx
            .get_json_optional(
                "list information",
                ctx.http
                    .get(api_url(ctx, &place.host, &format!("{}/{}", endpoint, place.id))?),
            )
            .await;

        let source = PageSource {
            ctx: ctx.clone(),
            place: place.clone(),
            endpoint,
            entry_id_paths: self.entry_id_paths.clone(),
            entry_title_paths: self.entry_title_paths.clone(),
        };
        let entries = OnDemandPagedList::with_gaps(PAGE_SIZE, move |page| {
            source.clone().fetch_page(page).boxed()
        });

        let info = match info {
            Some(info) => info,
            None => {
                return Ok(ListExtraction {
                    id: place.id,
                    breed,
                    title: None,
                    description: None,
                    published_time: None,
                    channel: None,
                    thumbnail: None,
                    entries,
                })
            }
        };

        let owner = info.owner_account.as_ref();
        Ok(ListExtraction {
            id: place.id,
            breed,
            title: info.display_name.clone(),
            description: info.description.clone().filter(|d| !d.is_empty()),
            published_time: info
                .created_at
                .as_deref()
                .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                .map(|t| t.with_timezone(&Utc)),
            channel: Some(Uploader {
                name: owner
                    .and_then(|o| o.name.clone())
                    .or_else(|| info.display_name.clone()),
                id: owner
                    .and_then(|o| o.id.as_ref())
                    .or(info.id.as_ref())
                    .and_then(id_string),
                url: owner.and_then(|o| o.url.as_deref()).and_then(|u| Url::parse(u).ok()),
                alt_id: None,
            }),
            thumbnail: info
                .thumbnail_path
                .as_deref()
                .and_then(|p| base.join(p).ok()),
            entries,
        })
    }
}
