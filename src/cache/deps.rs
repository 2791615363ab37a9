//! Dependency collector for response-cache invalidation.
//!
//! The content service records the tag of every document it touches while a
//! request is being handled. `response_cache_layer` collects them at request
//! end so the cached response is dropped whenever one of its documents is.

use std::collections::HashSet;
use std::future::Future;
use std::sync::{Arc, Mutex};

use super::keys::CacheTag;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::deps";

type Collector = Arc<Mutex<HashSet<String>>>;

tokio::task_local! {
    static DEPS: Collector;
}

/// Record a tag dependency. No-op outside a collector scope.
pub fn record(tag: &CacheTag) {
    let _ = DEPS.try_with(|deps| {
        mutex_lock(deps, SOURCE, "record").insert(tag.to_string());
    });
}

/// Record every tag in `tags`.
pub fn record_all(tags: &[CacheTag]) {
    for tag in tags {
        record(tag);
    }
}

/// Run `f` with a fresh collector and return its output with the tags it
/// recorded.
pub async fn with_collector<F, R>(f: F) -> (R, HashSet<String>)
where
    F: Future<Output = R>,
{
    let collector: Collector = Arc::default();
    let result = DEPS.scope(Arc::clone(&collector), f).await;
    let collected = std::mem::take(&mut *mutex_lock(&collector, SOURCE, "with_collector"));
    (result, collected)
}
