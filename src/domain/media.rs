//! Resolution of bare media filenames into loadable URLs.

use url::Url;

use super::entities::MediaRef;

/// Path under which the CMS serves uploaded files.
pub const MEDIA_PATH_PREFIX: &str = "/api/media/file/";

/// Resolves media filenames against the media-serving host.
#[derive(Debug, Clone)]
pub struct MediaResolver {
    base: Url,
}

impl MediaResolver {
    pub fn new(base: Url) -> Self {
        Self { base }
    }

    /// Loadable URL for a filename. The filename is percent-encoded as a
    /// single path segment so it cannot escape the media prefix.
    pub fn url_for(&self, filename: &str) -> String {
        let mut url = self.base.clone();
        let prefix = MEDIA_PATH_PREFIX.trim_matches('/');
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.pop_if_empty();
                segments.extend(prefix.split('/'));
                segments.push(filename);
            }
            Err(()) => return format!("{MEDIA_PATH_PREFIX}{filename}"),
        }
        url.to_string()
    }

    /// URL and alt text for a media reference, falling back to `fallback_alt`.
    pub fn resolve(&self, media: &MediaRef, fallback_alt: &str) -> ResolvedMedia {
        let alt = media
            .alt
            .as_deref()
            .map(str::trim)
            .filter(|alt| !alt.is_empty())
            .unwrap_or(fallback_alt)
            .to_string();
        ResolvedMedia {
            src: self.url_for(&media.filename),
            alt,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub src: String,
    pub alt: String,
}
