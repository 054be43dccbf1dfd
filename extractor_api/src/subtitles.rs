use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;
use url::Url;

/// Language assumed when the service doesn't say.
pub const DEFAULT_SUBTITLE_LANG: &str = "en";

#[derive(Serialize, PartialEq, Clone, Debug)]
pub enum SubtitleExt {
    /// WebVTT - https://www.w3.org/TR/webvtt1/
    VTT,
    /// SubRip Text - https://www.matroska.org/technical/subtitles.html#srt-subtitles
    SRT,
    /// Timed Text Markup Language - https://www.w3.org/TR/ttml1/
    TTML,
    /// Advanced SubStation Alpha (if extended from SSA) - https://en.wikipedia.org/wiki/SubStation_Alpha#Advanced_SubStation_Alpha
    ASS,
    /// SubStation Alpha (if not extended to ASS) - https://en.wikipedia.org/wiki/SubStation_Alpha
    SSA,
    /// service-specific format that is not following any industry standards
    NonStandard(String),
}

impl SubtitleExt {
    /// Guesses the format from the file extension in the URL path.
    pub fn from_url(url: &Url) -> Option<SubtitleExt> {
        let (_, ext) = url.path().rsplit_once('.')?;
        Some(match ext.to_ascii_lowercase().as_str() {
            "vtt" => SubtitleExt::VTT,
            "srt" => SubtitleExt::SRT,
            "ttml" | "dfxp" => SubtitleExt::TTML,
            "ass" => SubtitleExt::ASS,
            "ssa" => SubtitleExt::SSA,
            "" => return None,
            other if other.contains('/') => return None,
            other => SubtitleExt::NonStandard(other.to_string()),
        })
    }
}

#[derive(Serialize, PartialEq, Clone, Debug)]
pub struct SubtitleTrack {
    pub lang: String,
    pub ext: Option<SubtitleExt>,
    pub url: Url,
}

/// Language code to tracks, in the order the service listed them.
pub type SubtitleMap = BTreeMap<String, Vec<SubtitleTrack>>;

/// Builds the subtitle map out of a caption list returned by a service.
///
/// `lang_pointer` and `path_pointer` are JSON pointers into each record
/// (like `/language/id` and `/captionPath`), paths get resolved against `base`.
/// Anything that doesn't look like a list of records gives an empty map,
/// as subtitles are never worth failing the extraction for.
pub fn aggregate_subtitles(
    records: Option<&Value>,
    base: &Url,
    lang_pointer: &str,
    path_pointer: &str,
) -> SubtitleMap {
    let mut subtitles = SubtitleMap::new();
    let records = match records {
        Some(Value::Array(records)) => records,
        _ => return subtitles,
    };
    for record in records.iter().filter(|r| r.is_object()) {
        let url = match record
            .pointer(path_pointer)
            .and_then(Value::as_str)
            .and_then(|p| base.join(p).ok())
        {
            Some(url) => url,
            None => continue,
        };
        let lang = record
            .pointer(lang_pointer)
            .and_then(Value::as_str)
            .filter(|l| !l.is_empty())
            .unwrap_or(DEFAULT_SUBTITLE_LANG)
            .to_string();
        subtitles.entry(lang.clone()).or_default().push(SubtitleTrack {
            lang,
            ext: SubtitleExt::from_url(&url),
            url,
        });
    }
    subtitles
}
