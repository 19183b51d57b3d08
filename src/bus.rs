//! Redis command bus: URL parsing, a blocking subscriber worker with
//! reconnect backoff (W3, spec §5), and an async publisher (used by the
//! reactor to emit status replies).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use redis::{Client, ConnectionLike};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::errors::IngestError;
use crate::metrics::BUS_RECONNECT_COUNTER;

const BUS_SOCKET_TIMEOUT: Duration = Duration::from_secs(2);
const RECONNECT_POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy)]
pub struct ReconnectBackoff {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self {
            min_ms: 500,
            max_ms: 5000,
        }
    }
}

/// A parsed `scheme://[password@]host[:port][/db]` bus URL, per spec §6.
/// TLS is accepted syntactically (`rediss`) but not otherwise supported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BusUrl {
    pub host: String,
    pub port: u16,
    pub db: i64,
    pub password: Option<String>,
}

impl Default for BusUrl {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 6379,
            db: 0,
            password: None,
        }
    }
}

pub fn parse_bus_url(raw: &str) -> BusUrl {
    let url = match url::Url::parse(raw) {
        Ok(u) if matches!(u.scheme(), "redis" | "rediss") => u,
        _ => return BusUrl::default(),
    };

    let host = url.host_str().unwrap_or("127.0.0.1").to_string();
    let port = url.port().unwrap_or(6379);
    let password = {
        let pw = url.password().unwrap_or("");
        if pw.is_empty() {
            None
        } else {
            Some(pw.to_string())
        }
    };
    let db = url
        .path()
        .trim_start_matches('/')
        .parse::<i64>()
        .unwrap_or(0);

    BusUrl {
        host,
        port,
        db,
        password,
    }
}

/// A parsed command from the input channel, handed to the reactor.
pub struct BusMessage {
    pub payload: Vec<u8>,
}

/// Runs the blocking subscribe/consume loop for `channel` on its own
/// blocking thread, forwarding each message to `tx`. Reconnects with
/// bounded random backoff on any connection error; a 2s socket timeout
/// lets the loop observe `running` between messages, per spec §5/§9.
pub fn spawn_subscriber(
    redis_url: String,
    channel: String,
    running: Arc<AtomicBool>,
    backoff: ReconnectBackoff,
    tx: mpsc::Sender<BusMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        let mut rng = rand::thread_rng();

        while running.load(Ordering::SeqCst) {
            match run_subscribe_once(&redis_url, &channel, &running, &tx) {
                Ok(()) => {}
                Err(e) => {
                    warn!(error = %e, "bus subscriber disconnected; backing off before reconnect");
                    BUS_RECONNECT_COUNTER.inc();
                    let delay_ms = rng.gen_range(backoff.min_ms..=backoff.max_ms);
                    sleep_while_running(delay_ms, &running);
                }
            }
        }
    })
}

fn sleep_while_running(total_ms: u64, running: &AtomicBool) {
    let mut slept = 0u64;
    while running.load(Ordering::SeqCst) && slept < total_ms {
        std::thread::sleep(RECONNECT_POLL_INTERVAL.min(Duration::from_millis(total_ms - slept)));
        slept += RECONNECT_POLL_INTERVAL.as_millis() as u64;
    }
}

fn run_subscribe_once(
    redis_url: &str,
    channel: &str,
    running: &AtomicBool,
    tx: &mpsc::Sender<BusMessage>,
) -> Result<(), IngestError> {
    let client = Client::open(redis_url)?;
    let mut conn = client.get_connection()?;
    conn.set_read_timeout(Some(BUS_SOCKET_TIMEOUT))
        .map_err(IngestError::Bus)?;

    let mut pubsub = conn.as_pubsub();
    pubsub.subscribe(channel)?;
    info!(channel, "bus subscriber connected");

    while running.load(Ordering::SeqCst) {
        match pubsub.get_message() {
            Ok(msg) => {
                let payload: Vec<u8> = msg.get_payload_bytes().to_vec();
                if tx.blocking_send(BusMessage { payload }).is_err() {
                    return Ok(());
                }
            }
            Err(e) if is_timeout(&e) => continue,
            Err(e) => return Err(IngestError::Bus(e)),
        }
    }

    Ok(())
}

fn is_timeout(e: &redis::RedisError) -> bool {
    e.is_timeout()
}

/// Publishes a status reply on the output channel using an async
/// connection manager, reused across calls.
pub struct BusPublisher {
    manager: redis::aio::ConnectionManager,
    channel: String,
}

impl BusPublisher {
    pub async fn connect(redis_url: &str, channel: String) -> Result<Self, IngestError> {
        let client = Client::open(redis_url)?;
        let manager = client.get_connection_manager().await?;
        Ok(Self { manager, channel })
    }

    pub async fn publish(&mut self, payload: &str) -> Result<(), IngestError> {
        use redis::AsyncCommands;
        let _: () = self.manager.publish(&self.channel, payload).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_url() {
        let url = parse_bus_url("redis://:secret@example.com:6380/3");
        assert_eq!(url.host, "example.com");
        assert_eq!(url.port, 6380);
        assert_eq!(url.db, 3);
        assert_eq!(url.password.as_deref(), Some("secret"));
    }

    #[test]
    fn falls_back_to_defaults_on_bad_scheme() {
        let url = parse_bus_url("not-a-url");
        assert_eq!(url, BusUrl::default());
    }

    #[test]
    fn defaults_missing_port_and_db() {
        let url = parse_bus_url("redis://myhost");
        assert_eq!(url.host, "myhost");
        assert_eq!(url.port, 6379);
        assert_eq!(url.db, 0);
    }
}
