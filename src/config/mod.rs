//! Configuration layer: typed settings with layered precedence (file → env → CLI).

mod cli;

use std::{fmt, net::SocketAddr, num::NonZeroU32, str::FromStr, time::Duration};

use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

use crate::application::render::UnknownNodePolicy;

pub use cli::{CliArgs, Command, ServeArgs, ServeOverrides, SourceOverrides, WarmArgs};

const DEFAULT_CONFIG_BASENAME: &str = "config/default";
const LOCAL_CONFIG_BASENAME: &str = "pressroom";
const ENV_PREFIX: &str = "PRESSROOM";
const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_GRACEFUL_SHUTDOWN_SECS: u64 = 30;
const DEFAULT_CONTENT_API_BASE: &str = "http://localhost:3001";
const DEFAULT_CONTENT_REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_REVALIDATE_AFTER_SECS: u64 = 60;
const DEFAULT_CACHE_DOCUMENT_LIMIT: u64 = 500;
const DEFAULT_CACHE_RESPONSE_LIMIT: u64 = 200;
const DEFAULT_HOME_SLUG: &str = "home";
const DEFAULT_SITE_NAME: &str = "Pressroom";
const DEFAULT_BLOG_PAGE_SIZE: u64 = 12;

/// Fully-resolved deployment settings after precedence resolution and validation.
#[derive(Debug, Clone)]
pub struct Settings {
    pub server: ServerSettings,
    pub logging: LoggingSettings,
    pub content: ContentSettings,
    pub revalidation: RevalidationSettings,
    pub cache: CacheSettings,
    pub render: RenderSettings,
    pub media: MediaSettings,
    pub site: SiteSettings,
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    pub graceful_shutdown: Duration,
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy)]
pub enum LogFormat {
    Json,
    Compact,
}

#[derive(Debug, Clone)]
pub struct ContentSettings {
    pub api_base: Url,
    pub request_timeout: Duration,
}

#[derive(Clone, Default)]
pub struct RevalidationSettings {
    /// Shared webhook secret. `None` rejects every webhook call.
    pub secret: Option<String>,
}

impl fmt::Debug for RevalidationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RevalidationSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct CacheSettings {
    pub enable_document_cache: bool,
    pub enable_response_cache: bool,
    pub revalidate_after: Duration,
    pub document_limit: usize,
    pub response_limit: usize,
    pub warm_on_startup: bool,
}

#[derive(Debug, Clone)]
pub struct RenderSettings {
    pub unknown_nodes: UnknownNodePolicy,
}

#[derive(Debug, Clone)]
pub struct MediaSettings {
    pub base_url: Url,
}

#[derive(Debug, Clone)]
pub struct SiteSettings {
    pub name: String,
    pub home_slug: String,
    pub blog_page_size: NonZeroU32,
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to build configuration: {0}")]
    Build(#[from] config::ConfigError),
    #[error("invalid configuration for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl LoadError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// Load settings using the configured precedence (file → environment → CLI).
pub fn load(cli: &CliArgs) -> Result<Settings, LoadError> {
    let mut builder = Config::builder()
        .add_source(File::with_name(DEFAULT_CONFIG_BASENAME).required(false))
        .add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));

    if let Some(path) = cli.config_file.as_ref() {
        builder = builder.add_source(File::from(path.as_path()).required(true));
    }

    builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).separator("__"));

    let mut raw: RawSettings = builder.build()?.try_deserialize()?;

    raw.apply_source_overrides(&cli.source);
    match cli.command.as_ref() {
        Some(Command::Serve(args)) => raw.apply_serve_overrides(&args.overrides),
        Some(Command::Warm(_)) | None => {}
    }

    Settings::from_raw(raw)
}

/// Resolve configuration using the supplied CLI arguments, returning both for downstream use.
pub fn load_with_cli() -> Result<(CliArgs, Settings), LoadError> {
    let args = CliArgs::parse();
    let settings = load(&args)?;
    Ok((args, settings))
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSettings {
    server: RawServerSettings,
    logging: RawLoggingSettings,
    content: RawContentSettings,
    revalidation: RawRevalidationSettings,
    cache: RawCacheSettings,
    render: RawRenderSettings,
    media: RawMediaSettings,
    site: RawSiteSettings,
}

impl RawSettings {
    fn apply_source_overrides(&mut self, overrides: &SourceOverrides) {
        if let Some(base) = overrides.content_api_base.as_ref() {
            self.content.api_base_url = Some(base.clone());
        }
        if let Some(secret) = overrides.revalidation_secret.as_ref() {
            self.revalidation.secret = Some(secret.clone());
        }
    }

    fn apply_serve_overrides(&mut self, overrides: &ServeOverrides) {
        if let Some(host) = overrides.server_host.as_ref() {
            self.server.host = Some(host.clone());
        }
        if let Some(port) = overrides.server_port {
            self.server.port = Some(port);
        }
        if let Some(seconds) = overrides.server_graceful_shutdown_seconds {
            self.server.graceful_shutdown_seconds = Some(seconds);
        }
        if let Some(level) = overrides.log_level.as_ref() {
            self.logging.level = Some(level.clone());
        }
        if let Some(json) = overrides.log_json {
            self.logging.json = Some(json);
        }
        if let Some(seconds) = overrides.content_request_timeout_seconds {
            self.content.request_timeout_seconds = Some(seconds);
        }
        if let Some(base) = overrides.media_base_url.as_ref() {
            self.media.base_url = Some(base.clone());
        }
        if let Some(seconds) = overrides.cache_revalidate_after_seconds {
            self.cache.revalidate_after_seconds = Some(seconds);
        }
        if let Some(warm) = overrides.cache_warm_on_startup {
            self.cache.warm_on_startup = Some(warm);
        }
        if let Some(policy) = overrides.render_unknown_nodes.as_ref() {
            self.render.unknown_nodes = Some(policy.clone());
        }
        if let Some(slug) = overrides.site_home_slug.as_ref() {
            self.site.home_slug = Some(slug.clone());
        }
    }
}

impl Settings {
    fn from_raw(raw: RawSettings) -> Result<Self, LoadError> {
        let RawSettings {
            server,
            logging,
            content,
            revalidation,
            cache,
            render,
            media,
            site,
        } = raw;

        let server = build_server_settings(server)?;
        let logging = build_logging_settings(logging)?;
        let content = build_content_settings(content)?;
        let revalidation = build_revalidation_settings(revalidation);
        let cache = build_cache_settings(cache)?;
        let render = build_render_settings(render)?;
        let media = build_media_settings(media, &content)?;
        let site = build_site_settings(site)?;

        Ok(Self {
            server,
            logging,
            content,
            revalidation,
            cache,
            render,
            media,
            site,
        })
    }
}

fn build_server_settings(server: RawServerSettings) -> Result<ServerSettings, LoadError> {
    let host = server.host.unwrap_or_else(|| DEFAULT_HOST.to_string());
    let port = server.port.unwrap_or(DEFAULT_PORT);
    if port == 0 {
        return Err(LoadError::invalid(
            "server.port",
            "port must be greater than zero",
        ));
    }

    let addr = parse_socket_addr(&host, port)
        .map_err(|reason| LoadError::invalid("server.addr", reason))?;

    let graceful_secs = server
        .graceful_shutdown_seconds
        .unwrap_or(DEFAULT_GRACEFUL_SHUTDOWN_SECS);
    if graceful_secs == 0 {
        return Err(LoadError::invalid(
            "server.graceful_shutdown_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ServerSettings {
        addr,
        graceful_shutdown: Duration::from_secs(graceful_secs),
    })
}

fn build_logging_settings(logging: RawLoggingSettings) -> Result<LoggingSettings, LoadError> {
    let level = match logging.level {
        Some(level) => LevelFilter::from_str(level.as_str()).map_err(|err| {
            LoadError::invalid("logging.level", format!("failed to parse: {err}"))
        })?,
        None => LevelFilter::INFO,
    };

    let format = if logging.json.unwrap_or(false) {
        LogFormat::Json
    } else {
        LogFormat::Compact
    };

    Ok(LoggingSettings { level, format })
}

fn build_content_settings(content: RawContentSettings) -> Result<ContentSettings, LoadError> {
    let raw_base = content
        .api_base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_API_BASE.to_string());
    let api_base = parse_http_url(&raw_base, "content.api_base_url")?;

    let timeout_secs = content
        .request_timeout_seconds
        .unwrap_or(DEFAULT_CONTENT_REQUEST_TIMEOUT_SECS);
    if timeout_secs == 0 {
        return Err(LoadError::invalid(
            "content.request_timeout_seconds",
            "must be greater than zero",
        ));
    }

    Ok(ContentSettings {
        api_base,
        request_timeout: Duration::from_secs(timeout_secs),
    })
}

fn build_revalidation_settings(revalidation: RawRevalidationSettings) -> RevalidationSettings {
    let secret = revalidation.secret.and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    });
    RevalidationSettings { secret }
}

fn build_cache_settings(cache: RawCacheSettings) -> Result<CacheSettings, LoadError> {
    let revalidate_after_secs = cache
        .revalidate_after_seconds
        .unwrap_or(DEFAULT_CACHE_REVALIDATE_AFTER_SECS);
    if revalidate_after_secs == 0 {
        return Err(LoadError::invalid(
            "cache.revalidate_after_seconds",
            "must be greater than zero",
        ));
    }

    let document_limit = non_zero_usize(
        cache.document_limit.unwrap_or(DEFAULT_CACHE_DOCUMENT_LIMIT),
        "cache.document_limit",
    )?;
    let response_limit = non_zero_usize(
        cache.response_limit.unwrap_or(DEFAULT_CACHE_RESPONSE_LIMIT),
        "cache.response_limit",
    )?;

    Ok(CacheSettings {
        enable_document_cache: cache.enable_document_cache.unwrap_or(true),
        enable_response_cache: cache.enable_response_cache.unwrap_or(true),
        revalidate_after: Duration::from_secs(revalidate_after_secs),
        document_limit,
        response_limit,
        warm_on_startup: cache.warm_on_startup.unwrap_or(true),
    })
}

fn build_render_settings(render: RawRenderSettings) -> Result<RenderSettings, LoadError> {
    let unknown_nodes = match render.unknown_nodes.as_deref().map(str::trim) {
        None | Some("") => UnknownNodePolicy::default(),
        Some(value) => UnknownNodePolicy::from_str(value)
            .map_err(|reason| LoadError::invalid("render.unknown_nodes", reason))?,
    };
    Ok(RenderSettings { unknown_nodes })
}

fn build_media_settings(
    media: RawMediaSettings,
    content: &ContentSettings,
) -> Result<MediaSettings, LoadError> {
    let base_url = match media
        .base_url
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
    {
        Some(value) => parse_http_url(&value, "media.base_url")?,
        None => content.api_base.clone(),
    };
    Ok(MediaSettings { base_url })
}

fn build_site_settings(site: RawSiteSettings) -> Result<SiteSettings, LoadError> {
    let home_slug = site
        .home_slug
        .map(|value| value.trim().trim_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_HOME_SLUG.to_string());
    if home_slug.is_empty() {
        return Err(LoadError::invalid("site.home_slug", "must not be empty"));
    }

    let name = site
        .name
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_SITE_NAME.to_string());

    let blog_page_size = non_zero_u32(
        site.blog_page_size.unwrap_or(DEFAULT_BLOG_PAGE_SIZE),
        "site.blog_page_size",
    )?;

    Ok(SiteSettings {
        name,
        home_slug,
        blog_page_size,
    })
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawServerSettings {
    host: Option<String>,
    port: Option<u16>,
    graceful_shutdown_seconds: Option<u64>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawLoggingSettings {
    level: Option<String>,
    json: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawContentSettings {
    api_base_url: Option<String>,
    request_timeout_seconds: Option<u64>,
}

#[derive(Clone, Deserialize, Default)]
#[serde(default)]
struct RawRevalidationSettings {
    secret: Option<String>,
}

impl fmt::Debug for RawRevalidationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawRevalidationSettings")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawCacheSettings {
    enable_document_cache: Option<bool>,
    enable_response_cache: Option<bool>,
    revalidate_after_seconds: Option<u64>,
    document_limit: Option<u64>,
    response_limit: Option<u64>,
    warm_on_startup: Option<bool>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawRenderSettings {
    unknown_nodes: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawMediaSettings {
    base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
struct RawSiteSettings {
    name: Option<String>,
    home_slug: Option<String>,
    blog_page_size: Option<u64>,
}

fn parse_socket_addr(host: &str, port: u16) -> Result<SocketAddr, String> {
    let candidate = format!("{host}:{port}");
    candidate
        .parse()
        .map_err(|err| format!("invalid address `{candidate}`: {err}"))
}

fn parse_http_url(value: &str, key: &'static str) -> Result<Url, LoadError> {
    let url = Url::parse(value)
        .map_err(|err| LoadError::invalid(key, format!("invalid URL `{value}`: {err}")))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(LoadError::invalid(
            key,
            format!("unsupported scheme `{other}`, expected http or https"),
        )),
    }
}

fn non_zero_u32(value: u64, key: &'static str) -> Result<NonZeroU32, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }

    let value_u32: u32 = value
        .try_into()
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for u32"))?;

    NonZeroU32::new(value_u32).ok_or_else(|| LoadError::invalid(key, "must be greater than zero"))
}

fn non_zero_usize(value: u64, key: &'static str) -> Result<usize, LoadError> {
    if value == 0 {
        return Err(LoadError::invalid(key, "must be greater than zero"));
    }
    usize::try_from(value)
        .map_err(|_| LoadError::invalid(key, "value exceeds supported range for usize"))
}

#[cfg(test)]
mod tests;
