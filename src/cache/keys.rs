//! Cache key and tag definitions.
//!
//! `CacheKey` identifies one fetched result; `CacheTag` is the label used to
//! invalidate every entry that carries it.

use std::fmt;

use crate::domain::types::ResourceKind;

/// Whether a key addresses one document or the whole collection listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyScope {
    Slug(String),
    All,
}

/// Composite key `(resource-kind, slug | all)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub kind: ResourceKind,
    pub scope: KeyScope,
}

impl CacheKey {
    pub fn slug(kind: ResourceKind, slug: impl Into<String>) -> Self {
        Self {
            kind,
            scope: KeyScope::Slug(slug.into()),
        }
    }

    pub fn all(kind: ResourceKind) -> Self {
        Self {
            kind,
            scope: KeyScope::All,
        }
    }

    /// Tags every entry stored under this key must carry.
    pub fn tags(&self) -> Vec<CacheTag> {
        match &self.scope {
            KeyScope::All => vec![CacheTag::Collection(self.kind)],
            KeyScope::Slug(slug) => vec![
                CacheTag::Collection(self.kind),
                CacheTag::Item(self.kind, slug.clone()),
            ],
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.scope {
            KeyScope::Slug(slug) => write!(f, "{}:{slug}", self.kind),
            KeyScope::All => write!(f, "{}:all", self.kind),
        }
    }
}

/// Invalidation label.
///
/// Renders as `pages` / `blogs` for collections and `page-<slug>` /
/// `blog-<slug>` for single documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheTag {
    Collection(ResourceKind),
    Item(ResourceKind, String),
}

impl CacheTag {
    pub fn item(kind: ResourceKind, slug: impl Into<String>) -> Self {
        Self::Item(kind, slug.into())
    }
}

impl fmt::Display for CacheTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheTag::Collection(kind) => f.write_str(kind.collection_tag()),
            CacheTag::Item(kind, slug) => write!(f, "{}{slug}", kind.item_tag_prefix()),
        }
    }
}

/// Response cache key: request path plus raw query string.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResponseKey {
    pub path: String,
    pub query: String,
}

impl ResponseKey {
    pub fn new(path: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            path: normalize_path(&path.into()),
            query: query.into(),
        }
    }
}

/// Strip trailing slashes so `/blog/` and `/blog` share an entry.
pub fn normalize_path(path: &str) -> String {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/".to_string()
    } else if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{trimmed}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tags_render_like_cms_labels() {
        assert_eq!(
            CacheTag::Collection(ResourceKind::BlogPost).to_string(),
            "blogs"
        );
        assert_eq!(
            CacheTag::item(ResourceKind::BlogPost, "first-aid-tips").to_string(),
            "blog-first-aid-tips"
        );
        assert_eq!(
            CacheTag::item(ResourceKind::Page, "about").to_string(),
            "page-about"
        );
    }

    #[test]
    fn slug_key_carries_collection_and_item_tags() {
        let key = CacheKey::slug(ResourceKind::Page, "about");
        assert_eq!(
            key.tags(),
            vec![
                CacheTag::Collection(ResourceKind::Page),
                CacheTag::item(ResourceKind::Page, "about"),
            ]
        );
    }

    #[test]
    fn listing_key_carries_only_collection_tag() {
        let key = CacheKey::all(ResourceKind::BlogPost);
        assert_eq!(key.tags(), vec![CacheTag::Collection(ResourceKind::BlogPost)]);
        assert_eq!(key.to_string(), "blogpost:all");
    }

    #[test]
    fn paths_are_normalized() {
        assert_eq!(normalize_path("/blog/"), "/blog");
        assert_eq!(normalize_path("/"), "/");
        assert_eq!(normalize_path(""), "/");
        assert_eq!(normalize_path("about"), "/about");
    }
}
