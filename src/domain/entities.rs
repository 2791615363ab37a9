//! Domain entities mirrored from the content API.

use pressroom_api_types::{DocumentPayload, MediaPayload};
use serde::Serialize;
use time::OffsetDateTime;

/// A page or blog post. The local copy only lives as long as its cache entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContentDocument {
    pub id: String,
    pub slug: String,
    pub title: Option<String>,
    pub excerpt: Option<String>,
    pub image: Option<MediaRef>,
    /// Serialized rich-text tree, rendered on demand.
    pub content: Option<serde_json::Value>,
    pub published_at: Option<OffsetDateTime>,
    pub created_at: Option<OffsetDateTime>,
    pub updated_at: Option<OffsetDateTime>,
}

impl ContentDocument {
    /// Trimmed title, if the document has a non-blank one.
    pub fn display_title(&self) -> Option<&str> {
        self.title
            .as_deref()
            .map(str::trim)
            .filter(|title| !title.is_empty())
    }

    /// Date shown on listing cards: publish date, then creation date.
    pub fn listing_date(&self) -> Option<OffsetDateTime> {
        self.published_at.or(self.created_at)
    }
}

impl From<DocumentPayload> for ContentDocument {
    fn from(payload: DocumentPayload) -> Self {
        Self {
            id: payload.id,
            slug: payload.slug,
            title: payload.title,
            excerpt: payload.excerpt,
            image: payload.image.map(MediaRef::from),
            content: payload.content,
            published_at: payload.published_at,
            created_at: payload.created_at,
            updated_at: payload.updated_at,
        }
    }
}

/// Bare media filename plus optional alt text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MediaRef {
    pub filename: String,
    pub alt: Option<String>,
}

impl From<MediaPayload> for MediaRef {
    fn from(payload: MediaPayload) -> Self {
        Self {
            filename: payload.filename,
            alt: payload.alt,
        }
    }
}
