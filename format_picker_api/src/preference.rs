use dragnet_extractor_api::anyhow::{bail, Result};
use dragnet_extractor_api::formats::FormatBreed;
use dragnet_extractor_api::{async_trait, Extraction, MediaFormat};
use tracing::debug;

use crate::{DownloadSelection, FormatPicker, FormatSelection};

/// Picks formats with selectors like `bestvideo/best`.
///
/// Alternatives are separated with `/`, the first one that matches anything wins.
/// Each alternative is one of `best`, `worst`, `bestvideo`, `bestaudio` or a format id.
/// There are no video-only formats, so `bestvideo` takes the video out of the best muxed one.
/// Relies on the formats being sorted best first, as extractors return them.
#[derive(Default)]
pub struct PreferencePicker {
    /// Subtitle languages to pick, if available
    pub subtitle_langs: Vec<String>,
}

impl PreferencePicker {
    pub fn new() -> Self {
        PreferencePicker::default()
    }

    pub fn with_subtitles(subtitle_langs: Vec<String>) -> Self {
        PreferencePicker { subtitle_langs }
    }

    fn select(&self, selector: &str, formats: &[MediaFormat]) -> Option<FormatSelection<usize>> {
        match selector {
            "best" => first(formats, has_both).map(FormatSelection::Full),
            "worst" => formats.iter().rposition(has_both).map(FormatSelection::Full),
            "bestvideo" => first(formats, has_both).map(FormatSelection::ExtractVideo),
            "bestaudio" => first(formats, |f| f.breed == FormatBreed::Audio)
                .or_else(|| first(formats, has_both))
                .map(FormatSelection::ExtractAudio),
            id => first(formats, |f| f.id.as_deref() == Some(id)).map(FormatSelection::Full),
        }
    }
}

fn has_both(format: &MediaFormat) -> bool {
    format.breed == FormatBreed::AudioVideo && !format.is_audio_only()
}

fn first<F: Fn(&MediaFormat) -> bool>(formats: &[MediaFormat], wanted: F) -> Option<usize> {
    formats.iter().position(wanted)
}

#[async_trait]
impl FormatPicker for PreferencePicker {
    async fn pick_formats(
        &self,
        selector: &str,
        extraction: &Extraction,
    ) -> Result<DownloadSelection> {
        let formats = extraction.formats.as_deref().unwrap_or_default();

        let mut picked = None;
        for alternative in selector.split('/').map(str::trim).filter(|a| !a.is_empty()) {
            if let Some(selection) = self.select(alternative, formats) {
                debug!("format selector {} matched format #{}", alternative, selection.inner());
                picked = Some(selection);
                break;
            }
        }
        let picked = match picked {
            Some(picked) => picked,
            None => bail!("requested format is not available: {}", selector),
        };

        let subtitles: Vec<String> = extraction
            .subtitles
            .as_ref()
            .map(|available| {
                self.subtitle_langs
                    .iter()
                    .filter(|lang| available.contains_key(*lang))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        Ok(DownloadSelection {
            formats: Some(vec![picked]),
            subtitles: Some(subtitles),
        })
    }
}
