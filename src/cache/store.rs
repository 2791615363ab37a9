//! Cache storage implementations.
//!
//! `DocumentStore`: fetched documents and listings, keyed by `CacheKey`.
//! `ResponseStore`: rendered public responses, keyed by path and query.

use std::collections::HashSet;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

use bytes::Bytes;
use lru::LruCache;
use metrics::counter;

use crate::domain::entities::ContentDocument;

use super::config::CacheConfig;
use super::keys::{CacheKey, CacheTag, ResponseKey, normalize_path};
use super::lock::{rw_read, rw_write};
use super::registry::TagRegistry;

const SOURCE: &str = "cache::store";

/// Documents returned by one fetch, shared between cache and callers.
pub type CachedDocs = Arc<Vec<ContentDocument>>;

/// Cache seam injected into the content service.
///
/// Invalidation only marks entries stale by dropping them; it never computes
/// values, so overlapping invalidations commute and repeats are no-ops.
pub trait ContentCache: Send + Sync {
    /// Fresh entry for `key`, if any.
    fn get(&self, key: &CacheKey) -> Option<CachedDocs>;

    /// Store `value` under `key`, labelled with `tags`.
    fn put(&self, key: CacheKey, value: CachedDocs, tags: &[CacheTag]);

    /// Drop every entry labelled with `tag`. Returns how many were dropped.
    fn invalidate(&self, tag: &CacheTag) -> usize;
}

struct Timed<T> {
    value: T,
    stored_at: Instant,
}

impl<T> Timed<T> {
    fn new(value: T) -> Self {
        Self {
            value,
            stored_at: Instant::now(),
        }
    }

    fn is_fresh(&self, window: Duration) -> bool {
        self.stored_at.elapsed() < window
    }
}

// ============================================================================
// Document store
// ============================================================================

/// In-memory LRU document cache with a fixed freshness window.
///
/// Stale entries stay in place until a successful fetch replaces them or
/// a matching tag is invalidated.
pub struct DocumentStore {
    entries: RwLock<LruCache<CacheKey, Timed<CachedDocs>>>,
    registry: TagRegistry<CacheKey>,
    freshness: Duration,
}

impl DocumentStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            entries: RwLock::new(LruCache::new(config.document_limit_non_zero())),
            registry: TagRegistry::new(),
            freshness: config.freshness(),
        }
    }

    /// Whether an entry exists for `key`, fresh or not.
    pub fn contains(&self, key: &CacheKey) -> bool {
        rw_read(&self.entries, SOURCE, "documents.contains").contains(key)
    }

    pub fn len(&self) -> usize {
        rw_read(&self.entries, SOURCE, "documents.len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentCache for DocumentStore {
    fn get(&self, key: &CacheKey) -> Option<CachedDocs> {
        let mut entries = rw_write(&self.entries, SOURCE, "documents.get");
        match entries.get(key) {
            Some(entry) if entry.is_fresh(self.freshness) => {
                counter!("pressroom_cache_hit_total", "layer" => "document").increment(1);
                Some(Arc::clone(&entry.value))
            }
            _ => {
                counter!("pressroom_cache_miss_total", "layer" => "document").increment(1);
                None
            }
        }
    }

    fn put(&self, key: CacheKey, value: CachedDocs, tags: &[CacheTag]) {
        let labels: HashSet<String> = tags.iter().map(ToString::to_string).collect();
        let evicted = rw_write(&self.entries, SOURCE, "documents.put")
            .push(key.clone(), Timed::new(value))
            .filter(|(evicted_key, _)| *evicted_key != key);

        if let Some((evicted_key, _)) = evicted {
            counter!("pressroom_cache_evict_total", "layer" => "document").increment(1);
            self.registry.unregister(&evicted_key);
        }
        self.registry.register(key, labels);
    }

    fn invalidate(&self, tag: &CacheTag) -> usize {
        let keys = self.registry.take_tag(&tag.to_string());
        if keys.is_empty() {
            return 0;
        }

        let mut entries = rw_write(&self.entries, SOURCE, "documents.invalidate");
        let dropped = keys
            .iter()
            .filter(|key| entries.pop(*key).is_some())
            .count();
        counter!("pressroom_cache_invalidate_total", "layer" => "document")
            .increment(dropped as u64);
        dropped
    }
}

// ============================================================================
// Response store
// ============================================================================

/// Cached HTTP response.
#[derive(Debug, Clone)]
pub struct CachedResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

/// Rendered-response cache for public pages.
pub struct ResponseStore {
    responses: RwLock<LruCache<ResponseKey, Timed<CachedResponse>>>,
    registry: TagRegistry<ResponseKey>,
    freshness: Duration,
}

impl ResponseStore {
    pub fn new(config: &CacheConfig) -> Self {
        Self {
            responses: RwLock::new(LruCache::new(config.response_limit_non_zero())),
            registry: TagRegistry::new(),
            freshness: config.freshness(),
        }
    }

    pub fn get(&self, key: &ResponseKey) -> Option<CachedResponse> {
        let mut responses = rw_write(&self.responses, SOURCE, "responses.get");
        match responses.get(key) {
            Some(entry) if entry.is_fresh(self.freshness) => {
                counter!("pressroom_cache_hit_total", "layer" => "response").increment(1);
                Some(entry.value.clone())
            }
            _ => {
                counter!("pressroom_cache_miss_total", "layer" => "response").increment(1);
                None
            }
        }
    }

    /// Store a response along with the document tags it was built from.
    pub fn set(&self, key: ResponseKey, response: CachedResponse, tags: HashSet<String>) {
        let evicted = rw_write(&self.responses, SOURCE, "responses.set")
            .push(key.clone(), Timed::new(response))
            .filter(|(evicted_key, _)| *evicted_key != key);

        if let Some((evicted_key, _)) = evicted {
            counter!("pressroom_cache_evict_total", "layer" => "response").increment(1);
            self.registry.unregister(&evicted_key);
        }
        self.registry.register(key, tags);
    }

    /// Drop every cached variant (any query string) of `path`.
    pub fn invalidate_path(&self, path: &str) -> usize {
        let path = normalize_path(path);
        let mut responses = rw_write(&self.responses, SOURCE, "responses.invalidate_path");
        let matching: Vec<ResponseKey> = responses
            .iter()
            .filter(|(key, _)| key.path == path)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &matching {
            responses.pop(key);
            self.registry.unregister(key);
        }
        counter!("pressroom_cache_invalidate_total", "layer" => "response")
            .increment(matching.len() as u64);
        matching.len()
    }

    /// Drop every response built from a document carrying `tag`.
    pub fn invalidate_tag(&self, tag: &CacheTag) -> usize {
        let keys = self.registry.take_tag(&tag.to_string());
        if keys.is_empty() {
            return 0;
        }

        let mut responses = rw_write(&self.responses, SOURCE, "responses.invalidate_tag");
        let dropped = keys
            .iter()
            .filter(|key| responses.pop(*key).is_some())
            .count();
        counter!("pressroom_cache_invalidate_total", "layer" => "response")
            .increment(dropped as u64);
        dropped
    }

    /// Get the number of cached responses.
    pub fn len(&self) -> usize {
        rw_read(&self.responses, SOURCE, "responses.len").len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{AssertUnwindSafe, catch_unwind};

    use super::*;
    use crate::domain::entities::fixtures::document;
    use crate::domain::types::ResourceKind;

    fn docs(slugs: &[&str]) -> CachedDocs {
        Arc::new(slugs.iter().map(|slug| document(slug)).collect())
    }

    fn response(body: &'static str) -> CachedResponse {
        CachedResponse {
            status: 200,
            headers: vec![("content-type".to_string(), "text/html".to_string())],
            body: Bytes::from(body),
        }
    }

    #[test]
    fn document_roundtrip_and_tag_invalidation() {
        let store = DocumentStore::new(&CacheConfig::default());
        let key = CacheKey::slug(ResourceKind::BlogPost, "cpr");

        assert!(store.get(&key).is_none());
        store.put(key.clone(), docs(&["cpr"]), &key.tags());

        let cached = store.get(&key).expect("fresh entry");
        assert_eq!(cached[0].slug, "cpr");

        assert_eq!(
            store.invalidate(&CacheTag::item(ResourceKind::BlogPost, "cpr")),
            1
        );
        assert!(store.get(&key).is_none());
        assert!(!store.contains(&key));
    }

    #[test]
    fn collection_tag_drops_listing_and_items() {
        let store = DocumentStore::new(&CacheConfig::default());
        let listing = CacheKey::all(ResourceKind::BlogPost);
        let item = CacheKey::slug(ResourceKind::BlogPost, "burns");
        let page = CacheKey::slug(ResourceKind::Page, "about");

        store.put(listing.clone(), docs(&["burns"]), &listing.tags());
        store.put(item.clone(), docs(&["burns"]), &item.tags());
        store.put(page.clone(), docs(&["about"]), &page.tags());

        let dropped = store.invalidate(&CacheTag::Collection(ResourceKind::BlogPost));
        assert_eq!(dropped, 2);
        assert!(store.get(&page).is_some());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalidation_is_idempotent() {
        let store = DocumentStore::new(&CacheConfig::default());
        let tag = CacheTag::Collection(ResourceKind::Page);
        assert_eq!(store.invalidate(&tag), 0);
        assert_eq!(store.invalidate(&tag), 0);
    }

    #[test]
    fn stale_entries_are_not_served_but_kept() {
        let config = CacheConfig {
            revalidate_after_secs: 0,
            ..Default::default()
        };
        let store = DocumentStore::new(&config);
        let key = CacheKey::all(ResourceKind::Page);
        store.put(key.clone(), docs(&["about"]), &key.tags());

        assert!(store.get(&key).is_none());
        assert!(store.contains(&key));
    }

    #[test]
    fn lru_eviction_unregisters_tags() {
        let config = CacheConfig {
            document_limit: 1,
            ..Default::default()
        };
        let store = DocumentStore::new(&config);
        let first = CacheKey::slug(ResourceKind::Page, "first");
        let second = CacheKey::slug(ResourceKind::Page, "second");

        store.put(first.clone(), docs(&["first"]), &first.tags());
        store.put(second.clone(), docs(&["second"]), &second.tags());

        assert!(!store.contains(&first));
        assert_eq!(
            store.invalidate(&CacheTag::item(ResourceKind::Page, "first")),
            0
        );
        assert_eq!(store.invalidate(&CacheTag::Collection(ResourceKind::Page)), 1);
    }

    #[test]
    fn response_invalidate_path_covers_all_queries() {
        let store = ResponseStore::new(&CacheConfig::default());
        store.set(ResponseKey::new("/blog", ""), response("a"), HashSet::new());
        store.set(ResponseKey::new("/blog", "show=24"), response("b"), HashSet::new());
        store.set(ResponseKey::new("/blog/cpr", ""), response("c"), HashSet::new());

        assert_eq!(store.invalidate_path("/blog/"), 2);
        assert_eq!(store.len(), 1);
        assert!(store.get(&ResponseKey::new("/blog/cpr", "")).is_some());
    }

    #[test]
    fn response_invalidate_by_recorded_tag() {
        let store = ResponseStore::new(&CacheConfig::default());
        let key = ResponseKey::new("/about", "");
        store.set(
            key.clone(),
            response("about"),
            HashSet::from(["pages".to_string(), "page-about".to_string()]),
        );

        assert_eq!(
            store.invalidate_tag(&CacheTag::item(ResourceKind::Page, "about")),
            1
        );
        assert!(store.get(&key).is_none());
    }

    #[test]
    fn document_store_recovers_from_poisoned_lock() {
        let store = DocumentStore::new(&CacheConfig::default());

        let _ = catch_unwind(AssertUnwindSafe(|| {
            let _guard = store
                .entries
                .write()
                .expect("entries lock should be acquired");
            panic!("poison entries lock");
        }));

        let key = CacheKey::all(ResourceKind::Page);
        store.put(key.clone(), docs(&["about"]), &key.tags());
        assert!(store.get(&key).is_some());
    }
}
