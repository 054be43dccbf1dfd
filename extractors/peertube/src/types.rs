use dragnet_extractor_api::url::Url;
use dragnet_extractor_api::Uploader;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use serde_json::Value;

/// Ids are numbers for local objects, but let's not count on it.
pub fn id_string(id: &Value) -> Option<String> {
    match id {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Off-shape optional values count as missing, instead of failing the whole object.
fn or_none<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    Ok(serde_json::from_value(Value::deserialize(deserializer)?).ok())
}

/// Counters, sometimes as strings.
fn count_or_none<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Keeps the strings, drops anything else in the list.
fn strings_or_none<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => Some(
            items
                .into_iter()
                .filter_map(|item| match item {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        ),
        _ => None,
    })
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Owner {
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "or_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub url: Option<String>,
}

impl From<&Owner> for Uploader {
    fn from(owner: &Owner) -> Self {
        Uploader {
            name: owner.display_name.clone().or_else(|| owner.name.clone()),
            id: owner.id.as_ref().and_then(id_string),
            url: owner.url.as_deref().and_then(|u| Url::parse(u).ok()),
            alt_id: owner.name.clone(),
        }
    }
}

/// Things like category, language, licence: `{"id": ..., "label": "..."}`
#[derive(Deserialize, Clone, Debug)]
pub struct Labeled {
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "or_none")]
    pub label: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    pub size: Option<u64>,
    pub fps: Option<f64>,
    pub resolution: Option<Labeled>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
/// Files that don't look like files are skipped, instead of failing the whole video
pub enum MaybeFile {
    File(File),
    Junk(Value),
}

impl MaybeFile {
    pub fn file(&self) -> Option<&File> {
        match self {
            MaybeFile::File(file) => Some(file),
            MaybeFile::Junk(_) => None,
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct StreamingPlaylist {
    #[serde(default)]
    pub files: Vec<MaybeFile>,
}

#[derive(Deserialize, Clone, Debug)]
#[serde(untagged)]
pub enum MaybeStreamingPlaylist {
    Playlist(StreamingPlaylist),
    Junk(Value),
}

#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(default, deserialize_with = "or_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub published_at: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub thumbnail_path: Option<String>,
    #[serde(default, deserialize_with = "count_or_none")]
    pub duration: Option<u64>,
    #[serde(default, deserialize_with = "count_or_none")]
    pub views: Option<u64>,
    #[serde(default, deserialize_with = "count_or_none")]
    pub likes: Option<u64>,
    #[serde(default, deserialize_with = "count_or_none")]
    pub dislikes: Option<u64>,
    #[serde(default, deserialize_with = "or_none")]
    pub nsfw: Option<bool>,
    #[serde(default, deserialize_with = "or_none")]
    pub is_live: Option<bool>,
    #[serde(default, deserialize_with = "or_none")]
    pub account: Option<Owner>,
    #[serde(default, deserialize_with = "or_none")]
    pub channel: Option<Owner>,
    #[serde(default, deserialize_with = "or_none")]
    pub category: Option<Labeled>,
    #[serde(default, deserialize_with = "or_none")]
    pub language: Option<Labeled>,
    #[serde(default, deserialize_with = "or_none")]
    pub licence: Option<Labeled>,
    #[serde(default, deserialize_with = "strings_or_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "or_none")]
    pub files: Option<Vec<MaybeFile>>,
    #[serde(default, deserialize_with = "or_none")]
    pub streaming_playlists: Option<Vec<MaybeStreamingPlaylist>>,
}

impl Video {
    /// Web video files and the ones from HLS playlists, together.
    pub fn all_files(&self) -> impl Iterator<Item = &File> {
        self.files.iter().flatten().chain(
            self.streaming_playlists
                .iter()
                .flatten()
                .filter_map(|p| match p {
                    MaybeStreamingPlaylist::Playlist(p) => Some(p),
                    MaybeStreamingPlaylist::Junk(_) => None,
                })
                .flat_map(|p| p.files.iter()),
        )
        .filter_map(MaybeFile::file)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct Description {
    #[serde(default, deserialize_with = "or_none")]
    pub description: Option<String>,
}

/// Account, channel or playlist details.
#[derive(Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListInfo {
    pub id: Option<Value>,
    #[serde(default, deserialize_with = "or_none")]
    pub display_name: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub created_at: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub thumbnail_path: Option<String>,
    #[serde(default, deserialize_with = "or_none")]
    pub owner_account: Option<Owner>,
}
