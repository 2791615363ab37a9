use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter, fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Install a global tracing subscriber using the provided logging settings.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let env_filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_target(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().with_target(true).boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| {
            InfraError::telemetry(format!("failed to install tracing subscriber: {err}"))
        })
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "pressroom_cache_hit_total",
            Unit::Count,
            "Total number of cache hits, labelled by layer (document or response)."
        );
        describe_counter!(
            "pressroom_cache_miss_total",
            Unit::Count,
            "Total number of cache misses, labelled by layer."
        );
        describe_counter!(
            "pressroom_cache_evict_total",
            Unit::Count,
            "Total number of cache evictions due to capacity, labelled by layer."
        );
        describe_counter!(
            "pressroom_cache_invalidate_total",
            Unit::Count,
            "Total number of cache entries dropped by revalidation, labelled by layer."
        );
        describe_counter!(
            "pressroom_content_fetch_total",
            Unit::Count,
            "Total number of content API requests, labelled by collection."
        );
        describe_counter!(
            "pressroom_content_fetch_failure_total",
            Unit::Count,
            "Total number of failed content API requests, labelled by collection and reason."
        );
        describe_counter!(
            "pressroom_revalidation_total",
            Unit::Count,
            "Total number of accepted revalidation webhook calls, labelled by collection."
        );
        describe_counter!(
            "pressroom_revalidation_rejected_total",
            Unit::Count,
            "Total number of revalidation webhook calls rejected for a bad secret."
        );
        describe_counter!(
            "pressroom_render_failure_total",
            Unit::Count,
            "Total number of rich-text documents that failed to render."
        );
        describe_histogram!(
            "pressroom_cache_warm_ms",
            Unit::Milliseconds,
            "Startup cache warm-up latency in milliseconds."
        );
    });
}
