//! Cache configuration.
//!
//! Controls the document cache and the rendered-response cache.

use std::num::NonZeroUsize;
use std::time::Duration;

use serde::Deserialize;

const DEFAULT_REVALIDATE_AFTER_SECS: u64 = 60;
const DEFAULT_DOCUMENT_LIMIT: usize = 500;
const DEFAULT_RESPONSE_LIMIT: usize = 200;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache fetched documents and listings.
    pub enable_document_cache: bool,
    /// Cache rendered public responses.
    pub enable_response_cache: bool,
    /// Freshness window of every entry, in seconds.
    pub revalidate_after_secs: u64,
    /// Maximum cached fetch results.
    pub document_limit: usize,
    /// Maximum cached responses.
    pub response_limit: usize,
    /// Prefetch every page and post before serving.
    pub warm_on_startup: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enable_document_cache: true,
            enable_response_cache: true,
            revalidate_after_secs: DEFAULT_REVALIDATE_AFTER_SECS,
            document_limit: DEFAULT_DOCUMENT_LIMIT,
            response_limit: DEFAULT_RESPONSE_LIMIT,
            warm_on_startup: true,
        }
    }
}

impl From<&crate::config::CacheSettings> for CacheConfig {
    fn from(settings: &crate::config::CacheSettings) -> Self {
        Self {
            enable_document_cache: settings.enable_document_cache,
            enable_response_cache: settings.enable_response_cache,
            revalidate_after_secs: settings.revalidate_after.as_secs(),
            document_limit: settings.document_limit,
            response_limit: settings.response_limit,
            warm_on_startup: settings.warm_on_startup,
        }
    }
}

impl CacheConfig {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.revalidate_after_secs)
    }

    /// Returns the document limit as NonZeroUsize, clamping to 1 if zero.
    pub fn document_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.document_limit).unwrap_or(NonZeroUsize::MIN)
    }

    /// Returns the response limit as NonZeroUsize, clamping to 1 if zero.
    pub fn response_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.response_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_values() {
        let config = CacheConfig::default();
        assert!(config.enable_document_cache);
        assert!(config.enable_response_cache);
        assert_eq!(config.freshness(), Duration::from_secs(60));
        assert_eq!(config.document_limit, 500);
        assert_eq!(config.response_limit, 200);
    }

    #[test]
    fn non_zero_clamps_to_min() {
        let config = CacheConfig {
            document_limit: 0,
            response_limit: 0,
            ..Default::default()
        };
        assert_eq!(config.document_limit_non_zero().get(), 1);
        assert_eq!(config.response_limit_non_zero().get(), 1);
    }
}
