//! Entrypoint: set up tracing, start the HTTP metrics & health server, and
//! spawn the three concurrent workers from spec §5 — the poller (W1), the
//! bus subscriber (W3) and the command reactor (W2) that consumes it.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hyper::service::{make_service_fn, service_fn};
use hyper::{Body, Method, Request, Response, Server};
use prometheus::{Encoder, TextEncoder};
use sqlx::postgres::PgPoolOptions;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use rss_topic_ingestor::bus::{self, BusPublisher, ReconnectBackoff};
use rss_topic_ingestor::classifier::{HttpLlmClient, LlmClient};
use rss_topic_ingestor::config::{resolve_llm_model_path, BusSettings, Settings};
use rss_topic_ingestor::errors::IngestError;
use rss_topic_ingestor::ingestor::Ingestor;
use rss_topic_ingestor::metrics;
use rss_topic_ingestor::reactor;

const CONFIG_PATH: &str = "res/config.json";

#[tokio::main]
async fn main() -> Result<(), IngestError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    info!("Starting RSS topic ingestor…");

    let settings = Settings::load(CONFIG_PATH)?;
    let bus_settings = BusSettings::from_env();
    info!(lazy_time = settings.lazy_time, "Loaded configuration");

    // W1 (poller) and W2 (reactor) each own a distinct DB connection, per
    // spec §5's "two connections" note — a pool per worker keeps that
    // boundary even though sqlx pools are themselves safely shareable.
    let poller_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url())
        .await?;
    let reactor_pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&settings.database_url())
        .await?;
    info!("Connected to Postgres");

    let model_path = resolve_llm_model_path(None);
    let llm: Arc<dyn LlmClient> = Arc::new(HttpLlmClient::new(model_path));

    spawn_metrics_server(&settings.server_bind);

    let mut poller = Ingestor::new(poller_pool, llm.clone()).await?;
    poller.start(&settings);

    let mut reactor_ingestor = Ingestor::new(reactor_pool, llm).await?;
    let mut publisher = BusPublisher::connect(&bus_settings.redis_url, bus_settings.out_channel.clone())
        .await
        .map_err(|e| {
            error!(error = %e, "reactor failed to initialize bus publisher");
            e
        })?;

    let running = Arc::new(AtomicBool::new(true));
    let (tx, mut rx) = mpsc::channel(256);

    // W3: blocking subscriber loop forwarding to this task, which plays W2.
    let _subscriber_handle = bus::spawn_subscriber(
        bus_settings.redis_url.clone(),
        bus_settings.in_channel.clone(),
        running.clone(),
        ReconnectBackoff::default(),
        tx,
    );

    let shutdown_running = running.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutdown signal received");
        shutdown_running.store(false, Ordering::SeqCst);
    });

    while let Some(msg) = rx.recv().await {
        reactor::on_message(&mut reactor_ingestor, &mut publisher, &msg.payload).await;
    }

    poller.stop().await;
    info!("shutting down");
    Ok(())
}

fn spawn_metrics_server(bind: &str) {
    let addr: SocketAddr = bind.parse().expect("invalid `server_bind` in configuration");

    let make_svc = make_service_fn(move |_conn| async move {
        Ok::<_, IngestError>(service_fn(move |req: Request<Body>| async move {
            match (req.method(), req.uri().path()) {
                (&Method::GET, "/metrics") => {
                    let metrics_text = metrics::gather_metrics();
                    let encoder = TextEncoder::new();
                    let resp = Response::builder()
                        .header("Content-Type", encoder.format_type())
                        .body(Body::from(metrics_text))
                        .expect("failed to build /metrics response");
                    Ok::<Response<Body>, IngestError>(resp)
                }
                (&Method::GET, "/healthz") => {
                    Ok::<Response<Body>, IngestError>(Response::new(Body::from("OK")))
                }
                _ => {
                    let not_found = Response::builder().status(404).body(Body::empty()).unwrap();
                    Ok::<Response<Body>, IngestError>(not_found)
                }
            }
        }))
    });

    tokio::spawn(async move {
        info!(%addr, "starting metrics & health server");
        if let Err(e) = Server::bind(&addr).serve(make_svc).await {
            error!(error = %e, "metrics server failed");
        }
    });
}
