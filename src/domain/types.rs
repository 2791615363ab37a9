//! Shared domain enumerations aligned with the CMS collections.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The two document collections the site reads from the CMS.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Page,
    BlogPost,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 2] = [ResourceKind::Page, ResourceKind::BlogPost];

    /// Collection segment of the content API (`/api/<collection>`).
    pub fn collection(self) -> &'static str {
        match self {
            ResourceKind::Page => "pages",
            ResourceKind::BlogPost => "blog",
        }
    }

    /// Cache tag shared by every entry of the collection.
    pub fn collection_tag(self) -> &'static str {
        match self {
            ResourceKind::Page => "pages",
            ResourceKind::BlogPost => "blogs",
        }
    }

    /// Prefix of the per-document cache tag (`page-<slug>` / `blog-<slug>`).
    pub fn item_tag_prefix(self) -> &'static str {
        match self {
            ResourceKind::Page => "page-",
            ResourceKind::BlogPost => "blog-",
        }
    }

    /// Public path of the collection index.
    pub fn index_path(self) -> &'static str {
        match self {
            ResourceKind::Page => "/",
            ResourceKind::BlogPost => "/blog",
        }
    }

    /// Public path of a single document.
    pub fn item_path(self, slug: &str) -> String {
        match self {
            ResourceKind::Page => format!("/{slug}"),
            ResourceKind::BlogPost => format!("/blog/{slug}"),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ResourceKind::Page => "page",
            ResourceKind::BlogPost => "blogpost",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blog_paths_nest_under_blog() {
        assert_eq!(ResourceKind::BlogPost.index_path(), "/blog");
        assert_eq!(
            ResourceKind::BlogPost.item_path("first-aid-tips"),
            "/blog/first-aid-tips"
        );
    }

    #[test]
    fn page_paths_sit_at_root() {
        assert_eq!(ResourceKind::Page.index_path(), "/");
        assert_eq!(ResourceKind::Page.item_path("about"), "/about");
    }

    #[test]
    fn collection_and_tag_names_differ_for_blog() {
        assert_eq!(ResourceKind::BlogPost.collection(), "blog");
        assert_eq!(ResourceKind::BlogPost.collection_tag(), "blogs");
    }
}
