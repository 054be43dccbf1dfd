use dragnet_extractor_api::anyhow::Result;
use dragnet_extractor_api::url::Url;
pub use dragnet_extractor_api::*;
pub use dragnet_format_picker_api as format_picker;
use once_cell::sync::Lazy;
use tracing::debug;

pub static DEFAULT_EXTRACTOR_LIST: Lazy<Vec<&AnyExtractor>> = Lazy::new(|| {
    let l = vec![].into_iter();

    #[cfg(feature = "peertube")]
    let l = l.chain(dragnet_extractor_peertube::EXTRACTORS.iter());

    #[cfg(feature = "pixivsketch")]
    let l = l.chain(dragnet_extractor_pixivsketch::EXTRACTORS.iter());

    l.collect()
});

pub struct CoreClient<'a> {
    extractors: Vec<&'a AnyExtractor>,
    context: ExtractionContext,
}

impl CoreClient<'static> {
    /// Client with all the built-in extractors,
    /// configured from the file in `$DRAGNET_CONFIG` if there is one.
    pub fn new() -> Result<Self> {
        Ok(CoreClient {
            extractors: DEFAULT_EXTRACTOR_LIST.to_vec(),
            context: ExtractionContext::with_config(ExtractorConfig::load()?)?,
        })
    }
}

impl<'a> CoreClient<'a> {
    pub fn with_context(extractors: Vec<&'a AnyExtractor>, context: ExtractionContext) -> Self {
        CoreClient {
            extractors,
            context,
        }
    }

    pub fn context(&self) -> &ExtractionContext {
        &self.context
    }

    /// First extractor, in the list order, that takes the URL.
    pub async fn find_extractor(&self, url: &Url) -> Option<&'a AnyExtractor> {
        for extractor in &self.extractors {
            if !extractor.match_extractor(url) {
                continue;
            }
            if extractor.confirm_match(&self.context, url).await {
                debug!("{} will handle {}", extractor.extractor_key(), url);
                return Some(*extractor);
            }
            debug!(
                "{} matched {}, but the host is not trusted",
                extractor.extractor_key(),
                url
            );
        }
        None
    }

    pub async fn extract_url(
        &self,
        url: &Url,
        wanted: &Extractable,
    ) -> Result<Option<AnyExtraction>> {
        match self.find_extractor(url).await {
            Some(extractor) => extractor
                .extract_info(&self.context, url, wanted)
                .await
                .map(Option::Some),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::format_picker::{DownloadList, FormatPicker, PreferencePicker};
    use super::{CoreClient, DEFAULT_EXTRACTOR_LIST};
    use dragnet_extractor_api::url::Url;
    use dragnet_extractor_api::{
        AnyExtraction, Extractable, ExtractionContext, ExtractorConfig,
    };
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VIDEO_ID: &str = "9c9de5e8-0a1e-484a-b099-e80766180a6d";

    fn client(config: ExtractorConfig) -> CoreClient<'static> {
        CoreClient::with_context(
            DEFAULT_EXTRACTOR_LIST.to_vec(),
            ExtractionContext::with_config(ExtractorConfig {
                locales: vec!["en-US".to_string()],
                ..config
            })
            .unwrap(),
        )
    }

    async fn key_for(client: &CoreClient<'_>, url: &str) -> Option<&'static str> {
        client
            .find_extractor(&Url::parse(url).unwrap())
            .await
            .map(|e| e.extractor_key())
    }

    #[tokio::test]
    async fn dispatches_by_url() {
        let client = client(ExtractorConfig::default());
        assert_eq!(
            key_for(&client, &format!("https://framatube.org/w/{}", VIDEO_ID)).await,
            Some("PeerTube")
        );
        assert_eq!(
            key_for(&client, "https://peertube2.cpy.re/a/chocobozzz/videos").await,
            Some("PeerTube:Playlist")
        );
        assert_eq!(
            key_for(
                &client,
                "https://sketch.pixiv.net/@kotaru_taruto/lives/3404565243464976376"
            )
            .await,
            Some("pixiv:sketch")
        );
        assert_eq!(key_for(&client, "https://example.com/watch?v=1").await, None);
    }

    #[tokio::test]
    async fn unknown_instances_need_trust() {
        let client = client(ExtractorConfig::default());
        let url = format!("https://tube.example.net/w/{}", VIDEO_ID);
        assert_eq!(key_for(&client, &url).await, None);
        assert_eq!(
            key_for(&client, &format!("peertube:{}", url)).await,
            Some("PeerTube")
        );

        let client = self::client(ExtractorConfig {
            known_instances: vec!["tube.example.net".to_string()],
            ..Default::default()
        });
        assert_eq!(key_for(&client, &url).await, Some("PeerTube"));
    }

    #[tokio::test]
    async fn extracts_from_configured_instance() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path(format!("/api/v1/videos/{}", VIDEO_ID)))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "name": "What is PeerTube?",
                "nsfw": true,
                "files": [
                    {"resolution": {"label": "720p"}, "fileUrl": "a"},
                    {"resolution": {"label": "0p"}, "fileUrl": "b"},
                ],
            })))
            .mount(&server)
            .await;

        let client = client(ExtractorConfig {
            instance_scheme: "http".to_string(),
            known_instances: vec![server.address().to_string()],
            ..Default::default()
        });
        let url = Url::parse(&format!("http://{}/w/{}", server.address(), VIDEO_ID)).unwrap();
        let extraction = match client
            .extract_url(&url, &Extractable::everything())
            .await
            .unwrap()
        {
            Some(AnyExtraction::Recording(extraction)) => extraction,
            _ => panic!("expected a recording"),
        };
        assert_eq!(extraction.metadata.as_ref().unwrap().age_limit, Some(18));
        let formats = extraction.formats.as_ref().unwrap();
        assert_eq!(formats.len(), 2);
        assert_eq!(formats[1].video_codec.as_deref(), Some("none"));

        let selection = PreferencePicker::new()
            .pick_formats("bestaudio", &extraction)
            .await
            .unwrap();
        let list = DownloadList::from(&selection, &extraction).unwrap();
        assert_eq!(
            list.formats[0].inner().url.url().as_str(),
            format!("http://{}/b", server.address())
        );

        let nothing = client
            .extract_url(
                &Url::parse("https://example.com/").unwrap(),
                &Extractable::everything(),
            )
            .await
            .unwrap();
        assert!(nothing.is_none());
    }
}
