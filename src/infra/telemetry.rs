use std::sync::Once;

use metrics::{Unit, describe_counter, describe_histogram};
use tracing_error::ErrorLayer;
use tracing_subscriber::{
    EnvFilter,
    filter::Directive,
    fmt,
    layer::{Layer, SubscriberExt},
    util::SubscriberInitExt,
};

use crate::config::{LogFormat, LoggingSettings};

use super::error::InfraError;

static METRIC_DESCRIPTIONS: Once = Once::new();

/// Dependencies that log every query or connection at `info`.
const QUIET_TARGETS: [&str; 2] = ["sqlx::query=warn", "hyper_util=warn"];

const UPLOAD_COUNTERS: [(&str, &str); 2] = [
    (
        "noticeboard_image_upload_total",
        "Image upload attempts sent to the image host.",
    ),
    (
        "noticeboard_image_upload_failed_total",
        "Image uploads the image host did not accept.",
    ),
];

/// Install the global subscriber: `RUST_LOG` wins over the configured level.
pub fn init(logging: &LoggingSettings) -> Result<(), InfraError> {
    describe_metrics();

    let fmt_layer = match logging.format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .boxed(),
        LogFormat::Compact => fmt::layer().compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(board_filter(logging))
        .with(ErrorLayer::default())
        .with(fmt_layer)
        .try_init()
        .map_err(|err| InfraError::Telemetry(err.to_string()))
}

fn board_filter(logging: &LoggingSettings) -> EnvFilter {
    let filter = EnvFilter::builder()
        .with_default_directive(logging.level.into())
        .from_env_lossy();

    QUIET_TARGETS
        .iter()
        .filter_map(|directive| directive.parse::<Directive>().ok())
        .fold(filter, EnvFilter::add_directive)
}

fn describe_metrics() {
    METRIC_DESCRIPTIONS.call_once(|| {
        for (name, description) in UPLOAD_COUNTERS {
            describe_counter!(name, Unit::Count, description);
        }
        describe_histogram!(
            "noticeboard_image_upload_ms",
            Unit::Milliseconds,
            "Image host round-trip latency in milliseconds."
        );
    });
}
