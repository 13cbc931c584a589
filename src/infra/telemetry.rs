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

pub fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        describe_counter!(
            "gazette_snapshot_hit_total",
            Unit::Count,
            "Post requests answered from a fresh snapshot."
        );
        describe_counter!(
            "gazette_snapshot_stale_total",
            Unit::Count,
            "Post requests answered from a stale snapshot."
        );
        describe_counter!(
            "gazette_snapshot_miss_total",
            Unit::Count,
            "Post requests that had to wait for a first generation."
        );
        describe_counter!(
            "gazette_snapshot_regenerate_total",
            Unit::Count,
            "Background snapshot regenerations by outcome."
        );
        describe_histogram!(
            "gazette_snapshot_generate_ms",
            Unit::Milliseconds,
            "Snapshot generation latency in milliseconds."
        );
        describe_counter!(
            "gazette_comments_added_total",
            Unit::Count,
            "Comments accepted by the ingestion endpoint."
        );
        describe_counter!(
            "gazette_http_failed_total",
            Unit::Count,
            "HTTP responses with a 4xx or 5xx status, by site area."
        );
    });
}
