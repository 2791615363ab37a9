//! Pressroom cache system.
//!
//! Two layers share one freshness window and one tag vocabulary:
//!
//! - **Document cache**: fetched documents and listings from the content API
//! - **Response cache**: rendered public HTTP responses
//!
//! ## Configuration
//!
//! ```toml
//! [cache]
//! enable_document_cache = true
//! enable_response_cache = true
//! revalidate_after_seconds = 60
//! ```

mod config;
pub mod deps;
mod keys;
mod lock;
mod middleware;
mod registry;
mod store;

pub use config::CacheConfig;
pub use keys::{CacheKey, CacheTag, KeyScope, ResponseKey, normalize_path};
pub use middleware::{CacheState, response_cache_layer};
pub use registry::TagRegistry;
pub use store::{CachedDocs, CachedResponse, ContentCache, DocumentStore, ResponseStore};
