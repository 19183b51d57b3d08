//! Prometheus metrics registry and metric definitions.

use once_cell::sync::Lazy;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

/// Global registry under crate namespace
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    Registry::new_custom(Some("rss_topic_ingestor".into()), None)
        .expect("failed to create Prometheus registry")
});

/// Total fetch attempts
pub static FETCH_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new("feeds_fetched_total", "Total number of feed fetch attempts");
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Histogram of fetch+parse durations
pub static FETCH_HISTOGRAM: Lazy<Histogram> = Lazy::new(|| {
    let opts = HistogramOpts::new(
        "fetch_duration_seconds",
        "Duration of feed fetch+parse in seconds",
    );
    let h = Histogram::with_opts(opts).expect("histogram opts");
    REGISTRY.register(Box::new(h.clone())).unwrap();
    h
});

/// Feed-fetch errors, one per source, which the tick logs but does not abort on.
pub static FETCH_ERROR_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new(
        "feed_fetch_errors_total",
        "Total number of feed fetch/parse failures",
    );
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Articles written per ingestion batch, split by outcome.
pub static INGEST_RESULT_COUNTER: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "articles_ingested_total",
        "Articles accepted by upsert_article_with_cluster, by cluster outcome",
    );
    let c = IntCounterVec::new(opts, &["outcome"]).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Ingestion batches that rolled back due to a per-row failure.
pub static INGEST_BATCH_FAILURE_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new(
        "ingest_batch_failures_total",
        "Ingestion batches rolled back due to a per-row failure",
    );
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Classifier invocations, split by which recovery-ladder step produced the result.
pub static CLASSIFIER_RESULT_COUNTER: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "classifier_results_total",
        "Topic classifier invocations, by recovery-ladder outcome",
    );
    let c = IntCounterVec::new(opts, &["path"]).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Bus reconnect attempts.
pub static BUS_RECONNECT_COUNTER: Lazy<IntCounter> = Lazy::new(|| {
    let opts = Opts::new(
        "bus_reconnects_total",
        "Number of times the command bus subscriber reconnected",
    );
    let c = IntCounter::with_opts(opts).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Commands dispatched by the reactor, split by outcome status.
pub static REACTOR_STATUS_COUNTER: Lazy<IntCounterVec> = Lazy::new(|| {
    let opts = Opts::new(
        "reactor_commands_total",
        "Fetch commands handled by the reactor, by published status",
    );
    let c = IntCounterVec::new(opts, &["status"]).expect("counter opts");
    REGISTRY.register(Box::new(c.clone())).unwrap();
    c
});

/// Encode all metrics as text
pub fn gather_metrics() -> String {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let mf = REGISTRY.gather();
    encoder.encode(&mf, &mut buffer).expect("failed to encode");
    String::from_utf8(buffer).expect("invalid utf8")
}
