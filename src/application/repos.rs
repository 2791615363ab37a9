//! Source traits describing content adapters.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{entities::ContentDocument, types::ResourceKind};

/// Upper bound on documents returned by a listing.
pub const LISTING_LIMIT: usize = 100;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to `{url}` failed: {message}")]
    Transport { url: String, message: String },
    #[error("request to `{url}` timed out")]
    Timeout { url: String },
    #[error("content API answered `{url}` with status {status}")]
    Status { url: String, status: u16 },
    #[error("response from `{url}` could not be decoded: {message}")]
    Decode { url: String, message: String },
}

impl FetchError {
    /// URL of the failed request, for logging.
    pub fn url(&self) -> &str {
        match self {
            FetchError::Transport { url, .. }
            | FetchError::Timeout { url }
            | FetchError::Status { url, .. }
            | FetchError::Decode { url, .. } => url,
        }
    }

    /// Upstream status, when the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Short label used as a metrics dimension.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport { .. } => "transport",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Status { .. } => "status",
            FetchError::Decode { .. } => "decode",
        }
    }
}

/// One request against the content API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentQuery {
    /// Documents whose slug equals `slug`.
    BySlug { kind: ResourceKind, slug: String },
    /// The collection listing, newest first for blog posts.
    Listing { kind: ResourceKind, limit: usize },
}

impl ContentQuery {
    pub fn by_slug(kind: ResourceKind, slug: impl Into<String>) -> Self {
        Self::BySlug {
            kind,
            slug: slug.into(),
        }
    }

    pub fn listing(kind: ResourceKind) -> Self {
        Self::Listing {
            kind,
            limit: LISTING_LIMIT,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        match self {
            ContentQuery::BySlug { kind, .. } | ContentQuery::Listing { kind, .. } => *kind,
        }
    }
}

#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Run `query` and return the raw `docs` of the response, in upstream order.
    async fn query(&self, query: &ContentQuery) -> Result<Vec<ContentDocument>, FetchError>;
}
