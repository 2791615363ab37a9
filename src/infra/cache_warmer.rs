use std::time::Instant;

use futures::{StreamExt, stream};
use metrics::histogram;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    application::{content::ContentService, repos::FetchError},
    domain::types::ResourceKind,
};

const WARM_CONCURRENCY: usize = 4;

#[derive(Debug, Error)]
pub enum CacheWarmError {
    #[error("failed to load {kind} listing: {source}")]
    Listing {
        kind: ResourceKind,
        #[source]
        source: FetchError,
    },
}

/// Documents loaded by one warm-up pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WarmReport {
    pub listings: usize,
    pub documents: usize,
    pub failures: usize,
}

/// Pre-populates the document cache: every listing, then every listed
/// document by slug.
pub struct CacheWarmer {
    content: ContentService,
    by_slug: bool,
}

impl CacheWarmer {
    pub fn new(content: ContentService) -> Self {
        Self {
            content,
            by_slug: true,
        }
    }

    /// Also fetch each listed document individually. On by default.
    pub fn by_slug(mut self, enabled: bool) -> Self {
        self.by_slug = enabled;
        self
    }

    /// A failed listing aborts the pass; a failed single lookup is logged
    /// and counted.
    pub async fn warm_initial(&self) -> Result<WarmReport, CacheWarmError> {
        info!(target = "pressroom::cache_warmer", "warming document cache");
        let started = Instant::now();
        let mut report = WarmReport::default();

        for kind in [ResourceKind::Page, ResourceKind::BlogPost] {
            self.warm_kind(kind, &mut report).await?;
        }

        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
        histogram!("pressroom_cache_warm_ms").record(elapsed_ms);
        info!(
            target = "pressroom::cache_warmer",
            listings = report.listings,
            documents = report.documents,
            failures = report.failures,
            elapsed_ms,
            "document cache warmed"
        );
        Ok(report)
    }

    async fn warm_kind(
        &self,
        kind: ResourceKind,
        report: &mut WarmReport,
    ) -> Result<(), CacheWarmError> {
        let listing = self
            .content
            .fetch_all(kind)
            .await
            .map_err(|source| CacheWarmError::Listing { kind, source })?;
        report.listings += 1;

        if !self.by_slug {
            return Ok(());
        }

        let slugs: Vec<String> = listing.into_iter().map(|document| document.slug).collect();
        let outcomes: Vec<_> = stream::iter(slugs)
            .map(|slug| {
                let content = self.content.clone();
                async move {
                    let outcome = content.fetch_one(kind, &slug).await;
                    (slug, outcome)
                }
            })
            .buffer_unordered(WARM_CONCURRENCY)
            .collect()
            .await;

        for (slug, outcome) in outcomes {
            match outcome {
                Ok(Some(_)) => report.documents += 1,
                Ok(None) => {
                    warn!(
                        target = "pressroom::cache_warmer",
                        kind = %kind,
                        slug = %slug,
                        "listed document not found by slug"
                    );
                }
                Err(err) => {
                    report.failures += 1;
                    warn!(
                        target = "pressroom::cache_warmer",
                        kind = %kind,
                        slug = %slug,
                        error = %err,
                        "skipping document warm-up"
                    );
                }
            }
        }
        Ok(())
    }
}
