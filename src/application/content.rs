//! Content fetch layer: cached lookups of pages and blog posts.

use std::sync::Arc;

use metrics::counter;
use tracing::{debug, error, instrument};

use crate::{
    application::repos::{ContentQuery, ContentSource, FetchError, LISTING_LIMIT},
    cache::{CacheKey, CachedDocs, ContentCache, deps},
    domain::{entities::ContentDocument, types::ResourceKind},
};

/// Fetches documents through the cache and records their tags as request
/// dependencies.
#[derive(Clone)]
pub struct ContentService {
    source: Arc<dyn ContentSource>,
    cache: Option<Arc<dyn ContentCache>>,
}

impl ContentService {
    pub fn new(source: Arc<dyn ContentSource>, cache: Option<Arc<dyn ContentCache>>) -> Self {
        Self { source, cache }
    }

    /// The document of `kind` whose slug equals `slug` exactly.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn fetch_one(
        &self,
        kind: ResourceKind,
        slug: &str,
    ) -> Result<Option<ContentDocument>, FetchError> {
        if slug.trim().is_empty() {
            return Ok(None);
        }

        let docs = self
            .load(CacheKey::slug(kind, slug), ContentQuery::by_slug(kind, slug))
            .await?;
        Ok(docs.iter().find(|doc| doc.slug == slug).cloned())
    }

    /// Every document of `kind`, at most [`LISTING_LIMIT`]. Blog posts come
    /// newest first with undated posts last.
    #[instrument(skip(self), fields(kind = %kind))]
    pub async fn fetch_all(&self, kind: ResourceKind) -> Result<Vec<ContentDocument>, FetchError> {
        let docs = self
            .load(CacheKey::all(kind), ContentQuery::listing(kind))
            .await?;
        Ok(docs.as_ref().clone())
    }

    pub async fn get_page_by_slug(&self, slug: &str) -> Option<ContentDocument> {
        self.fetch_one(ResourceKind::Page, slug)
            .await
            .unwrap_or_default()
    }

    pub async fn get_all_pages(&self) -> Vec<ContentDocument> {
        self.fetch_all(ResourceKind::Page).await.unwrap_or_default()
    }

    pub async fn get_blog_by_slug(&self, slug: &str) -> Option<ContentDocument> {
        self.fetch_one(ResourceKind::BlogPost, slug)
            .await
            .unwrap_or_default()
    }

    pub async fn get_all_blogs(&self) -> Vec<ContentDocument> {
        self.fetch_all(ResourceKind::BlogPost)
            .await
            .unwrap_or_default()
    }

    async fn load(&self, key: CacheKey, query: ContentQuery) -> Result<CachedDocs, FetchError> {
        let tags = key.tags();
        deps::record_all(&tags);

        if let Some(cached) = self.cache.as_ref().and_then(|cache| cache.get(&key)) {
            debug!(%key, outcome = "hit", "document cache");
            return Ok(cached);
        }

        let kind = query.kind();
        counter!("pressroom_content_fetch_total", "collection" => kind.collection()).increment(1);

        let docs = match self.source.query(&query).await {
            Ok(docs) => docs,
            Err(err) => {
                error!(
                    url = %err.url(),
                    status = ?err.status(),
                    reason = err.kind(),
                    error = %err,
                    "content fetch failed"
                );
                counter!(
                    "pressroom_content_fetch_failure_total",
                    "collection" => kind.collection(),
                    "reason" => err.kind()
                )
                .increment(1);
                return Err(err);
            }
        };

        let docs: CachedDocs = Arc::new(match query {
            ContentQuery::Listing { kind, limit } => order_listing(kind, docs, limit),
            ContentQuery::BySlug { .. } => docs,
        });

        if let Some(cache) = self.cache.as_ref() {
            cache.put(key, Arc::clone(&docs), &tags);
        }
        Ok(docs)
    }
}

/// Blog listings are re-sorted by publish date descending regardless of what
/// upstream did. Undated posts go last; `sort_by` is stable so ties keep
/// upstream order.
fn order_listing(
    kind: ResourceKind,
    mut docs: Vec<ContentDocument>,
    limit: usize,
) -> Vec<ContentDocument> {
    if kind == ResourceKind::BlogPost {
        docs.sort_by(|a, b| b.published_at.cmp(&a.published_at));
    }
    docs.truncate(limit.min(LISTING_LIMIT));
    docs
}
