//! On-demand revalidation triggered by the CMS webhook.
//!
//! A request names the collection that changed and optionally the slug of
//! the changed document. It is turned into a [`RevalidationPlan`] of cache
//! tags and public paths, which a [`Revalidator`] then drops.

use std::sync::Arc;

use metrics::counter;
use pressroom_api_types::{ALL_COLLECTIONS, RevalidateRequest, RevalidateResponse};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

use crate::{cache::CacheTag, domain::types::ResourceKind};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RevalidateError {
    #[error("malformed revalidation payload: {0}")]
    Malformed(String),
    #[error("failed to invalidate `{target}`: {message}")]
    Invalidation { target: String, message: String },
}

impl RevalidateError {
    pub fn invalidation(target: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalidation {
            target: target.into(),
            message: message.into(),
        }
    }
}

/// Drops cache entries. Both operations are idempotent; dropping something
/// that is not cached succeeds and reports zero.
pub trait Revalidator: Send + Sync {
    fn revalidate_tag(&self, tag: &CacheTag) -> Result<usize, RevalidateError>;
    fn revalidate_path(&self, path: &str) -> Result<usize, RevalidateError>;
}

/// Tags and paths to drop for one webhook call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevalidationPlan {
    /// Collection name echoed back to the caller.
    pub collection: String,
    pub tags: Vec<CacheTag>,
    pub paths: Vec<String>,
}

impl RevalidationPlan {
    pub fn for_request(request: &RevalidateRequest) -> Self {
        let collection = request.collection_name().to_string();
        let slug = request.slug().map(str::trim).filter(|slug| !slug.is_empty());

        let kind = match collection.as_str() {
            "blog" => Some(ResourceKind::BlogPost),
            "pages" => Some(ResourceKind::Page),
            _ => None,
        };

        match kind {
            Some(kind) => {
                let mut tags = vec![CacheTag::Collection(kind)];
                let mut paths = vec![kind.index_path().to_string()];
                if let Some(slug) = slug {
                    tags.push(CacheTag::item(kind, slug));
                    paths.push(kind.item_path(slug));
                }
                Self {
                    collection,
                    tags,
                    paths,
                }
            }
            None => Self {
                collection,
                tags: vec![
                    CacheTag::Collection(ResourceKind::BlogPost),
                    CacheTag::Collection(ResourceKind::Page),
                ],
                paths: vec![
                    ResourceKind::BlogPost.index_path().to_string(),
                    ResourceKind::Page.index_path().to_string(),
                ],
            },
        }
    }
}

#[derive(Clone)]
pub struct RevalidationService {
    secret_digest: Option<[u8; 32]>,
    revalidator: Arc<dyn Revalidator>,
}

impl RevalidationService {
    /// `secret` of `None` makes [`authenticate`](Self::authenticate) reject
    /// every caller.
    pub fn new(secret: Option<&str>, revalidator: Arc<dyn Revalidator>) -> Self {
        if secret.is_none() {
            warn!("revalidation secret is not configured; webhook calls will be rejected");
        }
        Self {
            secret_digest: secret.map(digest),
            revalidator,
        }
    }

    /// Constant-time comparison of the supplied secret with the configured one.
    pub fn authenticate(&self, supplied: Option<&str>) -> bool {
        let (Some(expected), Some(supplied)) = (self.secret_digest.as_ref(), supplied) else {
            return false;
        };
        bool::from(expected.ct_eq(&digest(supplied)))
    }

    /// Parse `body`, drop every tag and path it maps to and build the reply.
    pub fn revalidate(&self, body: &[u8]) -> Result<RevalidateResponse, RevalidateError> {
        let request: RevalidateRequest = serde_json::from_slice(body)
            .map_err(|err| RevalidateError::Malformed(err.to_string()))?;
        let plan = RevalidationPlan::for_request(&request);
        self.apply(&plan)?;

        Ok(RevalidateResponse {
            revalidated: true,
            collection: plan.collection,
            timestamp: now_millis(),
        })
    }

    pub fn apply(&self, plan: &RevalidationPlan) -> Result<(), RevalidateError> {
        let mut dropped = 0;
        for tag in &plan.tags {
            dropped += self.revalidator.revalidate_tag(tag)?;
        }
        for path in &plan.paths {
            dropped += self.revalidator.revalidate_path(path)?;
        }

        counter!("pressroom_revalidation_total", "collection" => collection_label(&plan.collection))
            .increment(1);
        info!(
            collection = %plan.collection,
            tags = ?plan.tags.iter().map(ToString::to_string).collect::<Vec<_>>(),
            paths = ?plan.paths,
            dropped,
            "revalidation completed"
        );
        Ok(())
    }
}

fn digest(value: &str) -> [u8; 32] {
    let mut out = [0u8; 32];
    out.copy_from_slice(&Sha256::digest(value.as_bytes()));
    out
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

// Bounded label set for metrics.
fn collection_label(collection: &str) -> &'static str {
    match collection {
        "blog" => "blog",
        "pages" => "pages",
        _ => ALL_COLLECTIONS,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    struct RecordingRevalidator {
        calls: Mutex<Vec<String>>,
    }

    impl Revalidator for RecordingRevalidator {
        fn revalidate_tag(&self, tag: &CacheTag) -> Result<usize, RevalidateError> {
            self.calls.lock().unwrap().push(format!("tag:{tag}"));
            Ok(0)
        }

        fn revalidate_path(&self, path: &str) -> Result<usize, RevalidateError> {
            self.calls.lock().unwrap().push(format!("path:{path}"));
            Ok(0)
        }
    }

    fn request(json: &str) -> RevalidateRequest {
        serde_json::from_str(json).expect("valid request")
    }

    fn tag_names(plan: &RevalidationPlan) -> Vec<String> {
        plan.tags.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn blog_with_slug_targets_listing_and_item() {
        let plan = RevalidationPlan::for_request(&request(
            r#"{"collection":"blog","doc":{"slug":"first-aid-tips"}}"#,
        ));

        assert_eq!(tag_names(&plan), ["blogs", "blog-first-aid-tips"]);
        assert_eq!(plan.paths, ["/blog", "/blog/first-aid-tips"]);
        assert_eq!(plan.collection, "blog");
    }

    #[test]
    fn pages_without_slug_targets_home() {
        let plan = RevalidationPlan::for_request(&request(r#"{"collection":"pages"}"#));

        assert_eq!(tag_names(&plan), ["pages"]);
        assert_eq!(plan.paths, ["/"]);
    }

    #[test]
    fn pages_with_slug_targets_page_path() {
        let plan = RevalidationPlan::for_request(&request(
            r#"{"collection":"pages","doc":{"slug":"about"}}"#,
        ));

        assert_eq!(tag_names(&plan), ["pages", "page-about"]);
        assert_eq!(plan.paths, ["/", "/about"]);
    }

    #[test]
    fn unknown_or_missing_collection_invalidates_everything() {
        let missing = RevalidationPlan::for_request(&request("{}"));
        assert_eq!(missing.collection, "all");
        assert_eq!(tag_names(&missing), ["blogs", "pages"]);
        assert_eq!(missing.paths, ["/blog", "/"]);

        let media = RevalidationPlan::for_request(&request(
            r#"{"collection":"media","doc":{"slug":"x"}}"#,
        ));
        assert_eq!(media.collection, "media");
        assert_eq!(tag_names(&media), ["blogs", "pages"]);
    }

    #[test]
    fn blank_slug_is_ignored() {
        let plan = RevalidationPlan::for_request(&request(
            r#"{"collection":"blog","doc":{"slug":"  "}}"#,
        ));
        assert_eq!(tag_names(&plan), ["blogs"]);
    }

    #[test]
    fn authentication_requires_matching_secret() {
        let service = RevalidationService::new(
            Some("s3cret"),
            Arc::new(RecordingRevalidator::default()),
        );

        assert!(service.authenticate(Some("s3cret")));
        assert!(!service.authenticate(Some("s3cret ")));
        assert!(!service.authenticate(Some("")));
        assert!(!service.authenticate(None));
    }

    #[test]
    fn unconfigured_secret_rejects_everyone() {
        let service = RevalidationService::new(None, Arc::new(RecordingRevalidator::default()));
        assert!(!service.authenticate(Some("anything")));
        assert!(!service.authenticate(None));
    }

    #[test]
    fn revalidate_applies_tags_before_paths() {
        let revalidator = Arc::new(RecordingRevalidator::default());
        let service = RevalidationService::new(Some("s"), revalidator.clone());

        let response = service
            .revalidate(br#"{"collection":"blog","doc":{"slug":"cpr"}}"#)
            .expect("revalidation succeeds");

        assert!(response.revalidated);
        assert_eq!(response.collection, "blog");
        assert!(response.timestamp > 0);
        assert_eq!(
            *revalidator.calls.lock().unwrap(),
            ["tag:blogs", "tag:blog-cpr", "path:/blog", "path:/blog/cpr"]
        );
    }

    #[test]
    fn malformed_body_is_reported() {
        let service =
            RevalidationService::new(Some("s"), Arc::new(RecordingRevalidator::default()));
        let err = service.revalidate(b"not json").expect_err("malformed body");
        assert!(matches!(err, RevalidateError::Malformed(_)));
    }
}
