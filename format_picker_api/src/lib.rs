mod preference;

pub use dragnet_extractor_api::{
    anyhow, async_trait, Extraction, MediaFormat, MediaMetadata, SubtitleTrack,
};
pub use preference::PreferencePicker;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

/// Helper enum for choosing the formats to be downloaded/merged/played.
/// The value points at the format, see [`DownloadSelection`].
///
/// Oversimplified, but should suit typical use cases.
#[derive(Deserialize, Serialize, PartialEq, Debug)]
pub enum FormatSelection<T> {
    Full(T),
    ExtractVideo(T),
    ExtractAudio(T),
}

impl<T> FormatSelection<T> {
    pub fn inner(&self) -> &T {
        match self {
            FormatSelection::Full(x)
            | FormatSelection::ExtractVideo(x)
            | FormatSelection::ExtractAudio(x) => x,
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> FormatSelection<U> {
        match self {
            FormatSelection::Full(x) => FormatSelection::Full(f(x)),
            FormatSelection::ExtractVideo(x) => FormatSelection::ExtractVideo(f(x)),
            FormatSelection::ExtractAudio(x) => FormatSelection::ExtractAudio(f(x)),
        }
    }

    pub fn map_ref<U, F: FnOnce(&T) -> U>(&self, f: F) -> FormatSelection<U> {
        match self {
            FormatSelection::Full(x) => FormatSelection::Full(f(x)),
            FormatSelection::ExtractVideo(x) => FormatSelection::ExtractVideo(f(x)),
            FormatSelection::ExtractAudio(x) => FormatSelection::ExtractAudio(f(x)),
        }
    }
}

#[derive(Deserialize, Serialize, Default, PartialEq, Debug)]
#[serde(default)]
/// A helper type to be outputted by the format pickers.
/// Formats are referenced by their position in [`Extraction::formats`],
/// subtitles by their language.
/// For actual stuff to use for download, see [`DownloadList`].
pub struct DownloadSelection {
    pub formats: Option<Vec<FormatSelection<usize>>>,
    pub subtitles: Option<Vec<String>>,
}

#[derive(Serialize, Debug)]
pub struct DownloadList<'a> {
    pub formats: Vec<FormatSelection<&'a MediaFormat>>,
    pub subtitles: Vec<&'a SubtitleTrack>,
}

impl<'a> DownloadList<'a> {
    /// Fails if the selection points at something that isn't in the extraction.
    pub fn from(
        selection: &DownloadSelection,
        extraction: &'a Extraction,
    ) -> anyhow::Result<DownloadList<'a>> {
        let available = extraction.formats.as_deref().unwrap_or_default();
        let formats: Vec<FormatSelection<&MediaFormat>> = selection
            .formats
            .iter()
            .flatten()
            .map(|fs| {
                available
                    .get(*fs.inner())
                    .map(|format| fs.map_ref(|_| format))
                    .ok_or_else(|| anyhow!("no format #{} in the extraction", fs.inner()))
            })
            .collect::<anyhow::Result<_>>()?;

        let subtitles: Vec<&SubtitleTrack> = selection
            .subtitles
            .iter()
            .flatten()
            .map(|lang| {
                extraction
                    .subtitles
                    .as_ref()
                    .and_then(|s| s.get(lang))
                    .and_then(|tracks| tracks.first())
                    .ok_or_else(|| anyhow!("no {} subtitles in the extraction", lang))
            })
            .collect::<anyhow::Result<_>>()?;

        Ok(DownloadList { formats, subtitles })
    }
}

#[async_trait]
pub trait FormatPicker {
    async fn pick_formats(
        &self,
        selector: &str,
        extraction: &Extraction,
    ) -> anyhow::Result<DownloadSelection>;
}

#[cfg(test)]
mod tests {
    use super::{DownloadList, DownloadSelection, FormatSelection};
    use dragnet_extractor_api::formats::normalize_formats;
    use dragnet_extractor_api::url::Url;
    use dragnet_extractor_api::{Extraction, RawFormat, SubtitleMap, SubtitleTrack};

    fn extraction() -> Extraction {
        let mut subtitles = SubtitleMap::new();
        subtitles.insert(
            "fr".to_string(),
            vec![SubtitleTrack {
                lang: "fr".to_string(),
                ext: None,
                url: Url::parse("https://framatube.org/fr.vtt").unwrap(),
            }],
        );
        Extraction {
            metadata: None,
            formats: Some(normalize_formats(["720p", "0p"].iter().map(|l| RawFormat {
                url: Some(format!("https://framatube.org/{}.mp4", l)),
                label: Some(l.to_string()),
                ..Default::default()
            }))),
            subtitles: Some(subtitles),
        }
    }

    #[test]
    fn resolves_selection() {
        let extraction = extraction();
        let list = DownloadList::from(
            &DownloadSelection {
                formats: Some(vec![
                    FormatSelection::ExtractVideo(0),
                    FormatSelection::ExtractAudio(1),
                ]),
                subtitles: Some(vec!["fr".to_string()]),
            },
            &extraction,
        )
        .unwrap();
        assert_eq!(list.formats.len(), 2);
        assert_eq!(list.formats[0].inner().height(), Some(720));
        assert!(list.formats[1].inner().is_audio_only());
        assert_eq!(list.subtitles[0].lang, "fr");

        let empty = DownloadList::from(&DownloadSelection::default(), &extraction).unwrap();
        assert!(empty.formats.is_empty());
        assert!(empty.subtitles.is_empty());
    }

    #[test]
    fn dangling_references_are_errors() {
        let extraction = extraction();
        assert!(DownloadList::from(
            &DownloadSelection {
                formats: Some(vec![FormatSelection::Full(7)]),
                subtitles: None,
            },
            &extraction,
        )
        .is_err());
        assert!(DownloadList::from(
            &DownloadSelection {
                formats: None,
                subtitles: Some(vec!["pl".to_string()]),
            },
            &extraction,
        )
        .is_err());
    }
}
