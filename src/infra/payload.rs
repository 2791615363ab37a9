//! HTTP adapter for the Payload-style content API.

use async_trait::async_trait;
use pressroom_api_types::{DocsEnvelope, DocumentPayload};
use reqwest::{Client, Url};
use tracing::{info, instrument};

use crate::{
    application::repos::{ContentQuery, ContentSource, FetchError},
    config::ContentSettings,
    domain::{entities::ContentDocument, types::ResourceKind},
};

use super::error::InfraError;

const SLUG_FILTER: &str = "where[slug][equals]";

/// Queries `/api/<collection>` on the content host.
#[derive(Clone, Debug)]
pub struct PayloadClient {
    client: Client,
    pages_url: Url,
    blog_url: Url,
}

impl PayloadClient {
    pub fn new(settings: &ContentSettings) -> Result<Self, InfraError> {
        let client = Client::builder()
            .user_agent(Self::user_agent())
            .timeout(settings.request_timeout)
            .build()
            .map_err(|err| InfraError::http_client(err.to_string()))?;

        Ok(Self {
            client,
            pages_url: collection_url(&settings.api_base, ResourceKind::Page)?,
            blog_url: collection_url(&settings.api_base, ResourceKind::BlogPost)?,
        })
    }

    pub fn user_agent() -> &'static str {
        concat!("pressroom/", env!("CARGO_PKG_VERSION"))
    }

    /// Fully resolved request URL for `query`.
    pub fn url_for(&self, query: &ContentQuery) -> Url {
        let mut url = match query.kind() {
            ResourceKind::Page => self.pages_url.clone(),
            ResourceKind::BlogPost => self.blog_url.clone(),
        };
        {
            let mut pairs = url.query_pairs_mut();
            match query {
                ContentQuery::BySlug { slug, .. } => {
                    pairs.append_pair(SLUG_FILTER, slug);
                }
                ContentQuery::Listing { kind, limit } => {
                    pairs.append_pair("limit", &limit.to_string());
                    if *kind == ResourceKind::BlogPost {
                        pairs.append_pair("sort", "-publishedAt");
                    }
                }
            }
        }
        url
    }
}

#[async_trait]
impl ContentSource for PayloadClient {
    #[instrument(skip_all, fields(kind = %query.kind()))]
    async fn query(&self, query: &ContentQuery) -> Result<Vec<ContentDocument>, FetchError> {
        let url = self.url_for(query);
        let display_url = url.to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error(&display_url, &err))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: display_url,
                status: status.as_u16(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|err| transport_error(&display_url, &err))?;
        let envelope: DocsEnvelope<DocumentPayload> =
            serde_json::from_slice(&bytes).map_err(|err| FetchError::Decode {
                url: display_url.clone(),
                message: err.to_string(),
            })?;

        info!(
            url = %display_url,
            status = status.as_u16(),
            docs = envelope.docs.len(),
            "content API request completed"
        );
        Ok(envelope.docs.into_iter().map(ContentDocument::from).collect())
    }
}

fn collection_url(base: &Url, kind: ResourceKind) -> Result<Url, InfraError> {
    let mut url = base.clone();
    url.set_query(None);
    url.set_fragment(None);
    url.path_segments_mut()
        .map_err(|()| {
            InfraError::configuration(format!("content API base `{base}` cannot carry a path"))
        })?
        .pop_if_empty()
        .extend(["api", kind.collection()]);
    Ok(url)
}

fn transport_error(url: &str, err: &reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use super::*;

    fn client(base: &str) -> PayloadClient {
        PayloadClient::new(&ContentSettings {
            api_base: Url::parse(base).expect("url"),
            request_timeout: Duration::from_secs(1),
        })
        .expect("client")
    }

    #[test]
    fn slug_lookup_url_filters_by_slug() {
        let url = client("http://cms.local:3001").url_for(&ContentQuery::by_slug(
            ResourceKind::BlogPost,
            "first-aid-tips",
        ));
        assert_eq!(url.path(), "/api/blog");
        let pairs: Vec<_> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            [(SLUG_FILTER.to_string(), "first-aid-tips".to_string())]
        );
    }

    #[test]
    fn blog_listing_is_sorted_upstream() {
        let url =
            client("http://cms.local").url_for(&ContentQuery::listing(ResourceKind::BlogPost));
        assert_eq!(url.path(), "/api/blog");
        assert_eq!(url.query(), Some("limit=100&sort=-publishedAt"));
    }

    #[test]
    fn page_listing_has_no_sort() {
        let url = client("http://cms.local").url_for(&ContentQuery::listing(ResourceKind::Page));
        assert_eq!(url.path(), "/api/pages");
        assert_eq!(url.query(), Some("limit=100"));
    }

    #[test]
    fn base_path_prefix_is_kept() {
        let url =
            client("https://example.com/cms/").url_for(&ContentQuery::listing(ResourceKind::Page));
        assert_eq!(url.path(), "/cms/api/pages");
    }

    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl io::Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn completed_requests_are_logged_at_info() {
        let server = httpmock::MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method("GET").path("/api/pages");
                then.status(200)
                    .json_body(serde_json::json!({"docs": [{"id": 1, "slug": "home"}]}));
            })
            .await;

        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let docs = client(&server.base_url())
            .query(&ContentQuery::listing(ResourceKind::Page))
            .await
            .expect("listing loads");
        assert_eq!(docs.len(), 1);

        let output = String::from_utf8(captured.0.lock().unwrap().clone()).expect("utf-8");
        assert!(output.contains("content API request completed"), "{output}");
        assert!(output.contains("status=200"), "{output}");
        assert!(output.contains("/api/pages?limit=100"), "{output}");
    }
}
