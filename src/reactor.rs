//! Command Reactor: dispatches bus commands to the Ingestor's single-source
//! parse path and publishes status replies, per spec §4.5.

use serde::Serialize;
use tracing::{error, info, warn};

use crate::bus::BusPublisher;
use crate::errors::IngestError;
use crate::ingestor::Ingestor;
use crate::metrics::REACTOR_STATUS_COUNTER;
use crate::model::SourceStatus;

/// Output status schema, published unconditionally once `source_id`/
/// `user_id` are extractable (even when invalid, per spec §7).
#[derive(Debug, Serialize)]
struct StatusReply<'a> {
    source_id: i64,
    user_id: i64,
    status: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

/// Reads `key` off `value` as an `i64`, defaulting to `-1` if it's absent
/// or not a number — matching `original_source/parser/src/react_service.cpp`'s
/// `obj.value(key).toInt(-1)`, so a payload missing one field still
/// surfaces the other field's real value instead of discarding it.
fn extract_i64(value: &serde_json::Value, key: &str) -> i64 {
    value.get(key).and_then(serde_json::Value::as_i64).unwrap_or(-1)
}

/// Reacts to one raw payload from the input channel: parses it, dispatches
/// to `ingestor`, updates source status, and publishes the outcome.
pub async fn on_message(ingestor: &mut Ingestor, publisher: &mut BusPublisher, payload: &[u8]) {
    let parsed: Result<serde_json::Value, _> = serde_json::from_slice(payload);
    let value = match parsed {
        Ok(v) if v.is_object() => v,
        _ => {
            let reason = "bad_payload";
            warn!(error = %IngestError::Payload(reason), "bad payload (not a JSON object)");
            publish_status(publisher, -1, -1, "error", Some(reason.to_string())).await;
            return;
        }
    };

    let source_id = extract_i64(&value, "source_id");
    let user_id = extract_i64(&value, "user_id");

    if source_id <= 0 || user_id <= 0 {
        let reason = "bad_payload_fields";
        warn!(source_id, user_id, error = %IngestError::Payload(reason), "bad fields in payload");
        publish_status(publisher, source_id, user_id, "error", Some(reason.to_string())).await;
        return;
    }

    let source_id_i32 = source_id as i32;
    let (ok, err_text) = ingestor.parse_one_source_by_id(source_id_i32).await;

    if ok {
        ingestor.set_source_status(source_id_i32, SourceStatus::Active).await;
        info!(source_id, user_id, "source parsed ok");
        publish_status(publisher, source_id, user_id, "active", None).await;
    } else {
        ingestor.set_source_status(source_id_i32, SourceStatus::Error).await;
        error!(source_id, error = ?err_text, "source parse failed");
        publish_status(publisher, source_id, user_id, "error", err_text).await;
    }
}

async fn publish_status(
    publisher: &mut BusPublisher,
    source_id: i64,
    user_id: i64,
    status: &str,
    error_text: Option<String>,
) {
    REACTOR_STATUS_COUNTER.with_label_values(&[status]).inc();
    let reply = StatusReply {
        source_id,
        user_id,
        status,
        error: error_text,
    };
    let Ok(body) = serde_json::to_string(&reply) else {
        error!("failed to serialize status reply");
        return;
    };
    if let Err(e) = publisher.publish(&body).await {
        error!(error = %e, "failed to publish status reply");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_reply_omits_error_field_on_success() {
        let reply = StatusReply {
            source_id: 10,
            user_id: 42,
            status: "active",
            error: None,
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(json, r#"{"source_id":10,"user_id":42,"status":"active"}"#);
    }

    #[test]
    fn status_reply_includes_error_field_on_failure() {
        let reply = StatusReply {
            source_id: 10,
            user_id: 42,
            status: "error",
            error: Some("boom".to_string()),
        };
        let json = serde_json::to_string(&reply).unwrap();
        assert_eq!(
            json,
            r#"{"source_id":10,"user_id":42,"status":"error","error":"boom"}"#
        );
    }

    #[test]
    fn extract_i64_defaults_missing_field_to_minus_one() {
        let value = serde_json::json!({ "source_id": 10 });
        assert_eq!(extract_i64(&value, "source_id"), 10);
        assert_eq!(extract_i64(&value, "user_id"), -1);
    }

    #[test]
    fn extract_i64_defaults_wrong_typed_field_to_minus_one() {
        let value = serde_json::json!({ "source_id": "abc", "user_id": 42 });
        assert_eq!(extract_i64(&value, "source_id"), -1);
        assert_eq!(extract_i64(&value, "user_id"), 42);
    }
}
