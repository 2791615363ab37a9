use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, builder::BoolishValueParser};

/// Command-line arguments for the Pressroom binary.
#[derive(Debug, Parser)]
#[command(name = "pressroom", version, about = "Pressroom site server")]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(long = "config-file", env = "PRESSROOM_CONFIG_FILE", value_name = "PATH")]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub source: SourceOverrides,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Run the public site and the revalidation webhook.
    Serve(Box<ServeArgs>),
    /// Fetch every page and blog post once and report what the content API returned.
    Warm(WarmArgs),
}

/// Content-source settings accepted by every command.
///
/// Both read the same environment variables the CMS deployment already sets.
#[derive(Debug, Args, Default, Clone)]
pub struct SourceOverrides {
    /// Override the content API base URL.
    #[arg(
        long = "content-api-base",
        env = "CONTENT_API_BASE",
        value_name = "URL",
        global = true
    )]
    pub content_api_base: Option<String>,

    /// Override the shared secret expected by the revalidation webhook.
    #[arg(
        long = "revalidation-secret",
        env = "REVALIDATION_SECRET",
        value_name = "SECRET",
        hide_env_values = true,
        global = true
    )]
    pub revalidation_secret: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub overrides: ServeOverrides,
}

#[derive(Debug, Args, Default, Clone)]
pub struct ServeOverrides {
    /// Override the listener host.
    #[arg(long = "server-host", value_name = "HOST")]
    pub server_host: Option<String>,

    /// Override the listener port.
    #[arg(long = "server-port", value_name = "PORT")]
    pub server_port: Option<u16>,

    /// Override the graceful shutdown timeout.
    #[arg(long = "server-graceful-shutdown-seconds", value_name = "SECONDS")]
    pub server_graceful_shutdown_seconds: Option<u64>,

    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub log_json: Option<bool>,

    /// Override the content API request timeout.
    #[arg(long = "content-request-timeout-seconds", value_name = "SECONDS")]
    pub content_request_timeout_seconds: Option<u64>,

    /// Override the base URL media files are served from.
    #[arg(long = "media-base-url", value_name = "URL")]
    pub media_base_url: Option<String>,

    /// Override the cache freshness window.
    #[arg(long = "cache-revalidate-after-seconds", value_name = "SECONDS")]
    pub cache_revalidate_after_seconds: Option<u64>,

    /// Toggle the startup warm-up fetch.
    #[arg(
        long = "cache-warm-on-startup",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new()
    )]
    pub cache_warm_on_startup: Option<bool>,

    /// How unknown rich-text nodes are rendered (text|skip).
    #[arg(long = "render-unknown-nodes", value_name = "POLICY")]
    pub render_unknown_nodes: Option<String>,

    /// Override the slug of the page served at `/`.
    #[arg(long = "site-home-slug", value_name = "SLUG")]
    pub site_home_slug: Option<String>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct WarmArgs {
    /// Also fetch each document by slug after the listings.
    #[arg(long, action = clap::ArgAction::SetTrue)]
    pub by_slug: bool,
}
