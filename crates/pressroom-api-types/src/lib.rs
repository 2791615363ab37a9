//! Wire types exchanged with the headless CMS.
//!
//! Two surfaces live here: the query envelope returned by the content API
//! (`{docs: [...]}`) and the revalidation webhook the CMS calls on change.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Collection name echoed back when a webhook omits `collection`.
pub const ALL_COLLECTIONS: &str = "all";

/// Response envelope of a collection query.
///
/// A missing `docs` field deserializes to an empty list: the API reports
/// "no results" that way and it is not treated as an error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocsEnvelope<T> {
    #[serde(default = "Vec::new")]
    pub docs: Vec<T>,
}

impl<T> Default for DocsEnvelope<T> {
    fn default() -> Self {
        Self { docs: Vec::new() }
    }
}

/// Media reference attached to a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPayload {
    pub filename: String,
    #[serde(default)]
    pub alt: Option<String>,
}

/// A page or blog post as delivered by the content API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentPayload {
    #[serde(deserialize_with = "id_as_string")]
    pub id: String,
    pub slug: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "media_or_none")]
    pub image: Option<MediaPayload>,
    #[serde(default)]
    pub content: Option<serde_json::Value>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub published_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub created_at: Option<OffsetDateTime>,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub updated_at: Option<OffsetDateTime>,
}

/// Document ids are strings on document databases and integers on SQL ones.
fn id_as_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(id) => Ok(id),
        serde_json::Value::Number(id) => Ok(id.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or integer id, got {other}"
        ))),
    }
}

/// An unpopulated upload relation arrives as a bare id string; only a
/// populated object carries a filename.
fn media_or_none<'de, D>(deserializer: D) -> Result<Option<MediaPayload>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

/// Body of a revalidation webhook delivery.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidateRequest {
    pub collection: Option<String>,
    pub doc: Option<RevalidateDoc>,
}

impl RevalidateRequest {
    pub fn collection_name(&self) -> &str {
        self.collection
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(ALL_COLLECTIONS)
    }

    pub fn slug(&self) -> Option<&str> {
        self.doc
            .as_ref()
            .and_then(|doc| doc.slug.as_deref())
            .filter(|slug| !slug.is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RevalidateDoc {
    pub slug: Option<String>,
}

/// Confirmation returned after a successful revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidateResponse {
    pub revalidated: bool,
    pub collection: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

/// Body of a rejected or failed revalidation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RevalidateErrorBody {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
