use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounter, IntCounterVec, IntGauge, Registry, opts,
    register_histogram_vec_with_registry, register_int_counter_vec_with_registry,
    register_int_counter_with_registry, register_int_gauge_with_registry,
};
use std::{path::Path, sync::LazyLock};

pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

trait ResultExt<T> {
    fn or_exit(self, context: &str) -> T;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
    E: std::fmt::Display,
{
    fn or_exit(self, context: &str) -> T {
        match self {
            Ok(value) => value,
            Err(err) => {
                eprintln!("failed to initialize metric ({context}): {err}");
                std::process::exit(1);
            }
        }
    }
}

pub static SUBSCRIBERS_FETCHED: LazyLock<IntCounter> = LazyLock::new(|| {
    register_int_counter_with_registry!(
        "subclean_subscribers_fetched_total",
        "Subscribers returned by the selection query",
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static SUBSCRIBERS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    register_int_counter_vec_with_registry!(
        opts!(
            "subclean_subscribers_total",
            "Subscribers by pipeline outcome"
        ),
        &["outcome"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static OPERATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram_vec_with_registry!(
        HistogramOpts::new(
            "subclean_operation_duration_seconds",
            "Duration of connect, find, count and delete operations in seconds"
        ),
        &["operation"],
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static LAST_RUN_TIMESTAMP: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge_with_registry!(
        "subclean_last_run_timestamp_seconds",
        "Unix timestamp of the end of the last run",
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static LAST_RUNTIME_MS: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge_with_registry!(
        "subclean_last_runtime_ms",
        "Duration of the last run in milliseconds",
        &REGISTRY
    )
    .or_exit("metric can be created")
});

pub static LAST_RUN_SUCCESS: LazyLock<IntGauge> = LazyLock::new(|| {
    register_int_gauge_with_registry!(
        "subclean_last_run_success",
        "1 if the last run completed, 0 if it stopped on a connect or query error",
        &REGISTRY
    )
    .or_exit("metric can be created")
});

/// Encode all metrics in the prometheus text format
///
/// # Errors
///
/// Returns an error if the metrics cannot be encoded
pub fn encode_metrics() -> Result<Vec<u8>, String> {
    let mut buffer = Vec::new();
    let encoder = prometheus::TextEncoder::new();

    encoder
        .encode(&REGISTRY.gather(), &mut buffer)
        .map_err(|e| format!("could not encode custom metrics: {e}"))?;

    Ok(buffer)
}

/// Write the metrics for a node-exporter textfile collector
///
/// The file is written next to its destination and renamed into place so a
/// scrape never sees a partial file.
///
/// # Errors
///
/// Returns an error if the metrics cannot be encoded or the file written
pub async fn write_textfile(path: &Path) -> anyhow::Result<()> {
    let buffer = encode_metrics().map_err(anyhow::Error::msg)?;

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");

    tokio::fs::write(&tmp, buffer).await?;
    tokio::fs::rename(&tmp, path).await?;

    Ok(())
}
