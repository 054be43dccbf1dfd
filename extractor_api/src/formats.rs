//! Turning whatever the services say about their files into [`MediaFormat`]s,
//! and ordering them by preference.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use url::Url;

/// Label used by services for audio-only files.
pub const AUDIO_ONLY_LABEL: &str = "0p";

#[derive(Serialize, PartialEq, Clone, Debug)]
pub enum MediaFormatURL {
    HTTP(Url),
    HLS(Url),
}

impl MediaFormatURL {
    pub fn url(&self) -> &Url {
        match self {
            MediaFormatURL::HTTP(u) | MediaFormatURL::HLS(u) => u,
        }
    }
}

/// Format type. Services here serve muxed files, with audio-only ones on the side.
#[derive(Serialize, SmartDefault, PartialEq, Clone, Debug)]
pub enum FormatBreed {
    #[default]
    AudioVideo,
    Audio,
}

#[derive(Serialize, SmartDefault, PartialEq, Clone, Debug)]
pub struct VideoDetails {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
}

#[derive(Serialize, PartialEq, Clone, Debug)]
pub struct MediaFormat {
    pub id: Option<String>,
    pub breed: FormatBreed,
    pub url: MediaFormatURL,
    pub video_details: Option<VideoDetails>,
    pub filesize: Option<u64>,
    /// `"none"` for audio-only formats
    pub video_codec: Option<String>,
}

impl MediaFormat {
    pub fn height(&self) -> Option<u32> {
        self.video_details.as_ref().and_then(|v| v.height)
    }

    pub fn width(&self) -> Option<u32> {
        self.video_details.as_ref().and_then(|v| v.width)
    }

    pub fn fps(&self) -> Option<f64> {
        self.video_details.as_ref().and_then(|v| v.fps)
    }

    pub fn is_audio_only(&self) -> bool {
        self.video_codec.as_deref() == Some("none")
    }
}

/// File description as given by a service, before normalization.
#[derive(Default, Clone, Debug)]
pub struct RawFormat {
    pub url: Option<String>,
    pub format_id: Option<String>,
    /// Resolution label, like `720p`, `1920x1080` or `0p`
    pub label: Option<String>,
    pub filesize: Option<u64>,
    pub fps: Option<f64>,
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct Resolution {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

static RESOLUTION_WXH_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d+)\s*[xX×]\s*(\d+)\b").unwrap());

static RESOLUTION_HEIGHT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(\d+)[pPiI]\b").unwrap());

static RESOLUTION_K_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b([48])[kK]\b").unwrap());

/// 16:9 widths of the common heights
const WIDTH_BY_HEIGHT: [(u32, u32); 9] = [
    (144, 256),
    (240, 426),
    (360, 640),
    (480, 854),
    (720, 1280),
    (1080, 1920),
    (1440, 2560),
    (2160, 3840),
    (4320, 7680),
];

fn width_for_height(height: u32) -> Option<u32> {
    WIDTH_BY_HEIGHT
        .iter()
        .find(|(h, _)| *h == height)
        .map(|(_, w)| *w)
}

/// Reads the resolution out of a label. Returns `None` for `0p` and unknown labels.
pub fn parse_resolution(label: &str) -> Option<Resolution> {
    if let Some(c) = RESOLUTION_WXH_RE.captures(label) {
        return Some(Resolution {
            width: c[1].parse().ok(),
            height: c[2].parse().ok(),
        });
    }
    if let Some(c) = RESOLUTION_HEIGHT_RE.captures(label) {
        let height: u32 = c[1].parse().ok()?;
        if height == 0 {
            return None;
        }
        return Some(Resolution {
            width: width_for_height(height),
            height: Some(height),
        });
    }
    if let Some(c) = RESOLUTION_K_RE.captures(label) {
        let height = if &c[1] == "4" { 2160 } else { 4320 };
        return Some(Resolution {
            width: width_for_height(height),
            height: Some(height),
        });
    }
    None
}

fn parse_format_url(url: &str) -> Option<MediaFormatURL> {
    let url = Url::parse(url).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    Some(if url.path().ends_with(".m3u8") {
        MediaFormatURL::HLS(url)
    } else {
        MediaFormatURL::HTTP(url)
    })
}

impl RawFormat {
    /// `None` if there is no usable URL.
    pub fn normalize(self) -> Option<MediaFormat> {
        let url = parse_format_url(self.url.as_deref()?)?;
        let audio_only = self.label.as_deref() == Some(AUDIO_ONLY_LABEL);
        let resolution = self.label.as_deref().and_then(parse_resolution);

        let video_details = if audio_only {
            None
        } else if resolution.is_some() || self.fps.is_some() {
            Some(VideoDetails {
                width: resolution.and_then(|r| r.width),
                height: resolution.and_then(|r| r.height),
                fps: self.fps,
            })
        } else {
            None
        };

        Some(MediaFormat {
            id: self.format_id.or(self.label),
            breed: if audio_only {
                FormatBreed::Audio
            } else {
                FormatBreed::AudioVideo
            },
            url,
            video_details,
            filesize: self.filesize,
            video_codec: audio_only.then(|| "none".to_string()),
        })
    }
}

/// Normalizes the formats and sorts them, best first.
/// Formats without a usable URL are dropped.
pub fn normalize_formats<I>(raw: I) -> Vec<MediaFormat>
where
    I: IntoIterator<Item = RawFormat>,
{
    let mut formats: Vec<MediaFormat> = raw.into_iter().filter_map(RawFormat::normalize).collect();
    sort_formats(&mut formats);
    formats
}

fn cmp_fps(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}

/// Ascending preference: the "greater" format is the better one.
/// Formats with video beat audio-only ones, known values beat unknown ones,
/// then height, fps and file size decide.
pub fn cmp_preference(a: &MediaFormat, b: &MediaFormat) -> Ordering {
    b.is_audio_only()
        .cmp(&a.is_audio_only())
        .then_with(|| a.height().cmp(&b.height()))
        .then_with(|| cmp_fps(a.fps(), b.fps()))
        .then_with(|| a.filesize.cmp(&b.filesize))
        // only to make the order total
        .then_with(|| b.id.cmp(&a.id))
        .then_with(|| b.url.url().as_str().cmp(a.url.url().as_str()))
}

/// Sorts best first.
pub fn sort_formats(formats: &mut [MediaFormat]) {
    formats.sort_by(|a, b| cmp_preference(b, a));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(label: &str, url: &str) -> RawFormat {
        RawFormat {
            url: Some(url.to_string()),
            label: Some(label.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn height_labels() {
        for n in [1u32, 144, 240, 360, 480, 720, 1080, 1440, 2160, 4320, 1234] {
            let resolution = parse_resolution(&format!("{n}p")).unwrap();
            assert_eq!(resolution.height, Some(n));
        }
        assert_eq!(parse_resolution("720p").unwrap().width, Some(1280));
        assert_eq!(parse_resolution("1234p").unwrap().width, None);
        assert_eq!(
            parse_resolution("1920x1080"),
            Some(Resolution {
                width: Some(1920),
                height: Some(1080)
            })
        );
        assert_eq!(parse_resolution("4k").unwrap().height, Some(2160));
        assert_eq!(parse_resolution("0p"), None);
        assert_eq!(parse_resolution("audio"), None);
    }

    #[test]
    fn audio_only_label() {
        let mut r = raw("0p", "https://example.org/audio.mp4");
        r.fps = Some(30.0);
        let f = r.normalize().unwrap();
        assert_eq!(f.video_codec.as_deref(), Some("none"));
        assert_eq!(f.breed, FormatBreed::Audio);
        assert_eq!(f.fps(), None);
        assert_eq!(f.height(), None);
        assert!(f.is_audio_only());
    }

    #[test]
    fn unknown_resolution_stays_unknown() {
        let f = raw("source", "https://example.org/video.mp4")
            .normalize()
            .unwrap();
        assert_eq!(f.video_details, None);
        assert_eq!(f.id.as_deref(), Some("source"));
        assert_eq!(f.video_codec, None);
    }

    #[test]
    fn unusable_urls_are_dropped() {
        let formats = normalize_formats(vec![
            RawFormat::default(),
            raw("720p", "not a url"),
            raw("720p", "ftp://example.org/video.mp4"),
            raw("480p", "https://example.org/480.mp4"),
        ]);
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].height(), Some(480));
    }

    #[test]
    fn hls_manifests_are_recognized() {
        let f = raw("720p", "https://example.org/master.m3u8?token=1")
            .normalize()
            .unwrap();
        assert!(matches!(f.url, MediaFormatURL::HLS(_)));
    }

    #[test]
    fn best_first() {
        let mut small = raw("720p", "https://example.org/a.mp4");
        small.filesize = Some(10);
        let mut big = raw("720p", "https://example.org/b.mp4");
        big.filesize = Some(20);
        let mut smooth = raw("720p", "https://example.org/c.mp4");
        smooth.fps = Some(60.0);
        smooth.filesize = Some(5);

        let formats = normalize_formats(vec![
            raw("0p", "https://example.org/audio.mp4"),
            raw("unknown", "https://example.org/unknown.mp4"),
            small,
            raw("1080p", "https://example.org/d.mp4"),
            big,
            smooth,
        ]);
        let urls: Vec<_> = formats.iter().map(|f| f.url.url().path()).collect();
        assert_eq!(
            urls,
            vec![
                "/d.mp4",
                "/c.mp4",
                "/b.mp4",
                "/a.mp4",
                "/unknown.mp4",
                "/audio.mp4"
            ]
        );
    }

    #[test]
    fn sorting_is_idempotent_and_order_independent() {
        let make = || {
            vec![
                raw("360p", "https://example.org/1.mp4"),
                raw("720p", "https://example.org/2.mp4"),
                raw("720p", "https://example.org/3.mp4"),
                raw("0p", "https://example.org/4.mp4"),
                raw("x", "https://example.org/5.mp4"),
            ]
        };
        let once = normalize_formats(make());
        let mut twice = once.clone();
        sort_formats(&mut twice);
        assert_eq!(once, twice);

        let reversed = normalize_formats(make().into_iter().rev());
        assert_eq!(once, reversed);
    }
}
