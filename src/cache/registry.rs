//! Bidirectional tag registry.
//!
//! Tracks which cache keys carry which tags so that invalidating a tag can
//! find every affected entry, and evicting an entry can clean up its tags.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::RwLock;

use super::lock::{rw_read, rw_write};

const SOURCE: &str = "cache::registry";

/// Maps tag → keys and key → tags.
pub struct TagRegistry<K> {
    tag_to_keys: RwLock<HashMap<String, HashSet<K>>>,
    key_to_tags: RwLock<HashMap<K, HashSet<String>>>,
}

impl<K> TagRegistry<K>
where
    K: Clone + Eq + Hash,
{
    pub fn new() -> Self {
        Self {
            tag_to_keys: RwLock::new(HashMap::new()),
            key_to_tags: RwLock::new(HashMap::new()),
        }
    }

    /// Register a key with its tags, replacing whatever it carried before.
    pub fn register(&self, key: K, tags: HashSet<String>) {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "register.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "register.key_to_tags");

        if let Some(previous) = k2t.remove(&key) {
            detach(&mut t2k, &key, previous);
        }
        for tag in &tags {
            t2k.entry(tag.clone()).or_default().insert(key.clone());
        }
        k2t.insert(key, tags);
    }

    /// Keys currently carrying `tag`.
    pub fn keys_for_tag(&self, tag: &str) -> HashSet<K> {
        rw_read(&self.tag_to_keys, SOURCE, "keys_for_tag")
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }

    pub fn tags_for_key(&self, key: &K) -> HashSet<String> {
        rw_read(&self.key_to_tags, SOURCE, "tags_for_key")
            .get(key)
            .cloned()
            .unwrap_or_default()
    }

    /// Forget a key. Called when its entry is evicted or invalidated.
    pub fn unregister(&self, key: &K) {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "unregister.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "unregister.key_to_tags");

        if let Some(tags) = k2t.remove(key) {
            detach(&mut t2k, key, tags);
        }
    }

    /// Remove a tag and every key carrying it. Returns the removed keys.
    pub fn take_tag(&self, tag: &str) -> HashSet<K> {
        let mut t2k = rw_write(&self.tag_to_keys, SOURCE, "take_tag.tag_to_keys");
        let mut k2t = rw_write(&self.key_to_tags, SOURCE, "take_tag.key_to_tags");

        let keys = t2k.remove(tag).unwrap_or_default();
        for key in &keys {
            if let Some(tags) = k2t.remove(key) {
                detach(&mut t2k, key, tags);
            }
        }
        keys
    }

    pub fn tag_count(&self) -> usize {
        rw_read(&self.tag_to_keys, SOURCE, "tag_count").len()
    }

    pub fn key_count(&self) -> usize {
        rw_read(&self.key_to_tags, SOURCE, "key_count").len()
    }
}

impl<K> Default for TagRegistry<K>
where
    K: Clone + Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

fn detach<K: Eq + Hash>(
    t2k: &mut HashMap<String, HashSet<K>>,
    key: &K,
    tags: HashSet<String>,
) {
    for tag in tags {
        if let Some(keys) = t2k.get_mut(&tag) {
            keys.remove(key);
            if keys.is_empty() {
                t2k.remove(&tag);
            }
        }
    }
}
