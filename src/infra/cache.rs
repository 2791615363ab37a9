//! Revalidation backed by the in-process cache stores.

use std::sync::Arc;

use tracing::debug;

use crate::{
    application::revalidation::{RevalidateError, Revalidator},
    cache::{CacheTag, ContentCache, DocumentStore, ResponseStore},
};

/// Drops document and response entries. Either store may be disabled.
#[derive(Clone, Default)]
pub struct CacheRevalidator {
    documents: Option<Arc<DocumentStore>>,
    responses: Option<Arc<ResponseStore>>,
}

impl CacheRevalidator {
    pub fn new(
        documents: Option<Arc<DocumentStore>>,
        responses: Option<Arc<ResponseStore>>,
    ) -> Self {
        Self {
            documents,
            responses,
        }
    }
}

impl Revalidator for CacheRevalidator {
    fn revalidate_tag(&self, tag: &CacheTag) -> Result<usize, RevalidateError> {
        let documents = self
            .documents
            .as_ref()
            .map_or(0, |store| store.invalidate(tag));
        let responses = self
            .responses
            .as_ref()
            .map_or(0, |store| store.invalidate_tag(tag));

        debug!(
            target = "pressroom::cache::revalidate",
            tag = %tag,
            documents,
            responses,
            "tag revalidated"
        );
        Ok(documents + responses)
    }

    fn revalidate_path(&self, path: &str) -> Result<usize, RevalidateError> {
        let responses = self
            .responses
            .as_ref()
            .map_or(0, |store| store.invalidate_path(path));

        debug!(
            target = "pressroom::cache::revalidate",
            path,
            responses,
            "path revalidated"
        );
        Ok(responses)
    }
}
