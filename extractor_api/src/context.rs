use std::time::Duration;

use anyhow::Result;
use reqwest::{header, Client, ClientBuilder, RequestBuilder, Response};
use serde::Deserialize;
use sys_locale::get_locale;
use tracing::{debug, warn};
use url::Url;

use crate::cache::api::{CacheAPI, MapAPI};
use crate::cache::memory::MemoryCache;
use crate::config::ExtractorConfig;
use crate::error::ExtractorError;

#[derive(Clone)]
pub struct ExtractionContext {
    pub http: Client,
    pub locales: Vec<String>,
    pub cache: CacheAPI,
    pub config: ExtractorConfig,
}

fn system_locales() -> Vec<String> {
    let locale = get_locale()
        .filter(|l| l != "c" && l != "C")
        .unwrap_or_else(|| "en-US".to_string());

    if locale.len() > 2 {
        vec![locale.clone(), locale[0..2].to_string()]
    } else {
        vec![locale]
    }
}

impl ExtractionContext {
    pub fn new() -> Result<ExtractionContext> {
        Self::with_config(ExtractorConfig::default())
    }

    pub fn with_config(config: ExtractorConfig) -> Result<ExtractionContext> {
        Self::with_config_and_cache(config, CacheAPI::new(MemoryCache::new()))
    }

    /// The cache is shared by all clones of the context,
    /// pass a separate one to get an isolated context.
    pub fn with_config_and_cache(
        config: ExtractorConfig,
        cache: CacheAPI,
    ) -> Result<ExtractionContext> {
        let locales = if config.locales.is_empty() {
            system_locales()
        } else {
            config.locales.clone()
        };

        Ok(ExtractionContext {
            http: build_http(&locales, &config)?,
            locales,
            cache,
            config,
        })
    }

    /// Base URL of a self-hosted instance, like `https://framatube.org`.
    pub fn instance_url(&self, hostname: &str, path: &str) -> Result<Url> {
        Ok(Url::parse(&format!(
            "{}://{}{}",
            self.config.instance_scheme, hostname, path
        ))?)
    }

    pub async fn send_request(
        &self,
        resource_name: &str,
        request: RequestBuilder,
    ) -> Result<Response> {
        debug!("downloading {}", resource_name);
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ExtractorError::HttpStatus {
                resource: resource_name.to_string(),
                status: status.as_u16(),
            }
            .into());
        }
        Ok(response)
    }

    pub async fn get_json<A>(&self, resource_name: &str, request: RequestBuilder) -> Result<A>
    where
        A: for<'a> Deserialize<'a>,
    {
        Ok(self
            .send_request(resource_name, request)
            .await?
            .json()
            .await?)
    }

    /// Like [`get_json`](Self::get_json), for requests that the extraction can do without.
    pub async fn get_json_optional<A>(
        &self,
        resource_name: &str,
        request: RequestBuilder,
    ) -> Option<A>
    where
        A: for<'a> Deserialize<'a>,
    {
        match self.get_json(resource_name, request).await {
            Ok(a) => Some(a),
            Err(e) => {
                warn!("unable to download {}: {:#}", resource_name, e);
                None
            }
        }
    }
}

fn accept_language(locales: &[String]) -> String {
    locales
        .iter()
        .enumerate()
        .map(|(i, l)| {
            if i != 0 {
                format!("{l};q={}", 1.0 - (i as f32 / 10.0))
            } else {
                l.clone()
            }
        })
        .collect::<Vec<_>>()
        .join(",")
}

pub fn build_http(locales: &[String], config: &ExtractorConfig) -> Result<Client> {
    let mut headers = header::HeaderMap::new();
    headers.append(header::ACCEPT_LANGUAGE, accept_language(locales).parse()?);
    Ok(ClientBuilder::new()
        .user_agent(config.user_agent.as_str())
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()?)
}

#[cfg(test)]
mod tests {
    use super::{accept_language, ExtractionContext};
    use crate::{ExtractorConfig, ExtractorError};
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn ctx() -> ExtractionContext {
        ExtractionContext::with_config(ExtractorConfig {
            locales: vec!["pl-PL".to_string()],
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn weighted_accept_language() {
        let locales = vec!["pl-PL".to_string(), "pl".to_string(), "en".to_string()];
        assert_eq!(accept_language(&locales), "pl-PL,pl;q=0.9,en;q=0.8");
    }

    #[test]
    fn instance_url_uses_configured_scheme() {
        let ctx = ExtractionContext::with_config(ExtractorConfig {
            instance_scheme: "http".to_string(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            ctx.instance_url("127.0.0.1:8080", "/api/v1/config")
                .unwrap()
                .as_str(),
            "http://127.0.0.1:8080/api/v1/config"
        );
    }

    #[tokio::test]
    async fn sends_locales_and_user_agent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .and(header("accept-language", "pl-PL"))
            .and(header("user-agent", "okhttp/4.9.3"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"a\": 1}"))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = ctx();
        let value: serde_json::Value = ctx
            .get_json("thing", ctx.http.get(format!("{}/thing", server.uri())))
            .await
            .unwrap();
        assert_eq!(value["a"], 1);
    }

    #[tokio::test]
    async fn non_success_status_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let ctx = ctx();
        let err = ctx
            .get_json::<serde_json::Value>("thing", ctx.http.get(server.uri()))
            .await
            .unwrap_err();
        match err.downcast_ref::<ExtractorError>() {
            Some(ExtractorError::HttpStatus { status, .. }) => assert_eq!(*status, 404),
            other => panic!("unexpected error: {:?}", other),
        }

        let optional: Option<serde_json::Value> = ctx
            .get_json_optional("thing", ctx.http.get(server.uri()))
            .await;
        assert!(optional.is_none());
    }
}
