// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Inbound/outbound JSON codec for trace messages.
//!
//! Wire frames are JSON objects with a `logType` discriminator
//! (`"structure"` / `"emission"`). Timestamps arrive as wall-clock
//! milliseconds (possibly fractional) and are converted to whole
//! microseconds at this boundary. Opaque payloads (`settings`, notification
//! values) are kept as raw JSON bytes; the core never interprets them.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rill_core::{
    Emit, EmitKind, EmissionMessage, Notification, NotificationKind, StructureMessage, TraceId,
    TraceInstant, TraceMessage, TracePath,
};

use crate::error::ProtocolError;

const LOG_TYPE_STRUCTURE: &str = "structure";
const LOG_TYPE_EMISSION: &str = "emission";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStructure {
    id: u64,
    combinator_name: String,
    component_name: String,
    is_container_component: bool,
    path: Vec<u32>,
    when: f64,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireEmission {
    id: u64,
    combinator_name: String,
    component_name: String,
    path: Vec<u32>,
    when: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    settings: Option<Value>,
    emits: WireEmit,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireEmit {
    identifier: String,
    #[serde(rename = "type")]
    kind: String,
    notification: WireNotification,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireNotification {
    kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    value: Option<Value>,
}

/// Decodes one wire frame into a typed trace message.
///
/// # Errors
///
/// Returns [`ProtocolError`] if the frame is not valid JSON, the `logType`
/// discriminator is missing or unknown, an emit/notification kind is
/// unknown, or the timestamp is unrepresentable.
pub fn decode_trace_message(frame: &str) -> Result<TraceMessage, ProtocolError> {
    let value: Value = serde_json::from_str(frame)?;
    let log_type = value
        .get("logType")
        .and_then(Value::as_str)
        .ok_or(ProtocolError::MissingLogType)?;

    match log_type {
        LOG_TYPE_STRUCTURE => {
            let wire: WireStructure = serde_json::from_value(value)?;
            Ok(TraceMessage::Structure(StructureMessage {
                id: TraceId::from_raw(wire.id),
                combinator_name: wire.combinator_name,
                component_name: wire.component_name,
                is_container_component: wire.is_container_component,
                path: TracePath::new(wire.path),
                when: instant_from_millis(wire.when)?,
            }))
        }
        LOG_TYPE_EMISSION => {
            let wire: WireEmission = serde_json::from_value(value)?;
            Ok(TraceMessage::Emission(EmissionMessage {
                id: TraceId::from_raw(wire.id),
                combinator_name: wire.combinator_name,
                component_name: wire.component_name,
                path: TracePath::new(wire.path),
                when: instant_from_millis(wire.when)?,
                settings: opaque_bytes(wire.settings)?,
                emits: Emit {
                    identifier: wire.emits.identifier,
                    kind: emit_kind(&wire.emits.kind)?,
                    notification: Notification {
                        kind: notification_kind(&wire.emits.notification.kind)?,
                        value: opaque_bytes(wire.emits.notification.value)?,
                    },
                },
            }))
        }
        other => Err(ProtocolError::UnknownLogType(other.to_owned())),
    }
}

/// Encodes a typed trace message back into its wire frame.
///
/// # Errors
///
/// Returns [`ProtocolError::Json`] if an opaque payload does not hold valid
/// JSON bytes (which indicates the message was not built by the decoder).
pub fn encode_trace_message(message: &TraceMessage) -> Result<String, ProtocolError> {
    let mut value = match message {
        TraceMessage::Structure(m) => serde_json::to_value(WireStructure {
            id: m.id.value(),
            combinator_name: m.combinator_name.clone(),
            component_name: m.component_name.clone(),
            is_container_component: m.is_container_component,
            path: m.path.segments().to_vec(),
            when: millis_from_instant(m.when),
        })?,
        TraceMessage::Emission(m) => serde_json::to_value(WireEmission {
            id: m.id.value(),
            combinator_name: m.combinator_name.clone(),
            component_name: m.component_name.clone(),
            path: m.path.segments().to_vec(),
            when: millis_from_instant(m.when),
            settings: opaque_value(m.settings.as_deref())?,
            emits: WireEmit {
                identifier: m.emits.identifier.clone(),
                kind: emit_kind_str(m.emits.kind).to_owned(),
                notification: WireNotification {
                    kind: notification_kind_str(m.emits.notification.kind).to_owned(),
                    value: opaque_value(m.emits.notification.value.as_deref())?,
                },
            },
        })?,
    };

    let log_type = match message {
        TraceMessage::Structure(_) => LOG_TYPE_STRUCTURE,
        TraceMessage::Emission(_) => LOG_TYPE_EMISSION,
    };
    if let Value::Object(map) = &mut value {
        map.insert("logType".to_owned(), Value::String(log_type.to_owned()));
    }
    Ok(serde_json::to_string(&value)?)
}

fn emit_kind(raw: &str) -> Result<EmitKind, ProtocolError> {
    match raw {
        "SOURCE" => Ok(EmitKind::Source),
        "SINK" => Ok(EmitKind::Sink),
        other => Err(ProtocolError::UnknownEmitKind(other.to_owned())),
    }
}

const fn emit_kind_str(kind: EmitKind) -> &'static str {
    match kind {
        EmitKind::Source => "SOURCE",
        EmitKind::Sink => "SINK",
    }
}

fn notification_kind(raw: &str) -> Result<NotificationKind, ProtocolError> {
    match raw {
        "NEXT" => Ok(NotificationKind::Next),
        "ERROR" => Ok(NotificationKind::Error),
        "COMPLETE" => Ok(NotificationKind::Complete),
        other => Err(ProtocolError::UnknownNotificationKind(other.to_owned())),
    }
}

const fn notification_kind_str(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Next => "NEXT",
        NotificationKind::Error => "ERROR",
        NotificationKind::Complete => "COMPLETE",
    }
}

/// Re-serializes an opaque JSON payload to raw bytes, mapping null to none.
fn opaque_bytes(value: Option<Value>) -> Result<Option<Vec<u8>>, ProtocolError> {
    value.map(|v| serde_json::to_vec(&v)).transpose().map_err(ProtocolError::Json)
}

/// Parses raw payload bytes back into a JSON value for the wire frame.
fn opaque_value(bytes: Option<&[u8]>) -> Result<Option<Value>, ProtocolError> {
    bytes
        .map(serde_json::from_slice)
        .transpose()
        .map_err(ProtocolError::Json)
}

/// Converts a wall-clock milliseconds timestamp to whole microseconds.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
fn instant_from_millis(when: f64) -> Result<TraceInstant, ProtocolError> {
    let micros = when * 1_000.0;
    if micros.is_nan() || micros < 0.0 || micros >= u64::MAX as f64 {
        return Err(ProtocolError::InvalidTimestamp(when));
    }
    Ok(TraceInstant::from_micros(micros.round() as u64))
}

#[allow(clippy::cast_precision_loss)]
fn millis_from_instant(when: TraceInstant) -> f64 {
    when.as_micros() as f64 / 1_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_structure_frame() {
        let frame = r#"{
            "logType": "structure",
            "id": 0,
            "combinatorName": "isolate",
            "componentName": "App",
            "isContainerComponent": true,
            "path": [0, 1],
            "when": 1500.25
        }"#;
        let TraceMessage::Structure(m) = decode_trace_message(frame).unwrap() else {
            panic!("expected a structure message");
        };
        assert_eq!(m.id, TraceId::from_raw(0));
        assert_eq!(m.path.segments(), &[0, 1]);
        assert_eq!(m.when, TraceInstant::from_micros(1_500_250));
    }

    #[test]
    fn decodes_an_emission_frame() {
        let frame = r#"{
            "logType": "emission",
            "id": 4,
            "combinatorName": "map",
            "componentName": "List",
            "path": [0],
            "when": 2.0,
            "settings": {"depth": 3},
            "emits": {
                "identifier": "DOM",
                "type": "SINK",
                "notification": {"kind": "NEXT", "value": [1, 2]}
            }
        }"#;
        let TraceMessage::Emission(m) = decode_trace_message(frame).unwrap() else {
            panic!("expected an emission message");
        };
        assert_eq!(m.emits.kind, EmitKind::Sink);
        assert_eq!(m.emits.notification.kind, NotificationKind::Next);
        assert_eq!(m.emits.notification.value.as_deref(), Some(&b"[1,2]"[..]));
        assert_eq!(m.settings.as_deref(), Some(&br#"{"depth":3}"#[..]));
    }

    #[test]
    fn null_notification_value_maps_to_none() {
        let frame = r#"{
            "logType": "emission",
            "id": 1,
            "combinatorName": "map",
            "componentName": "App",
            "path": [0],
            "when": 0,
            "emits": {
                "identifier": "DOM",
                "type": "SOURCE",
                "notification": {"kind": "COMPLETE", "value": null}
            }
        }"#;
        let TraceMessage::Emission(m) = decode_trace_message(frame).unwrap() else {
            panic!("expected an emission message");
        };
        assert_eq!(m.emits.notification.value, None);
    }

    #[test]
    fn unknown_log_type_is_a_typed_error() {
        let err = decode_trace_message(r#"{"logType": "zap"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownLogType(t) if t == "zap"));
    }

    #[test]
    fn missing_log_type_is_a_typed_error() {
        let err = decode_trace_message(r#"{"id": 0}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::MissingLogType));
    }

    #[test]
    fn unknown_emit_type_is_fatal_for_the_message() {
        let frame = r#"{
            "logType": "emission",
            "id": 1,
            "combinatorName": "map",
            "componentName": "App",
            "path": [0],
            "when": 0,
            "emits": {
                "identifier": "DOM",
                "type": "DUPLEX",
                "notification": {"kind": "NEXT", "value": 1}
            }
        }"#;
        let err = decode_trace_message(frame).unwrap_err();
        assert!(matches!(err, ProtocolError::UnknownEmitKind(t) if t == "DUPLEX"));
    }

    #[test]
    fn negative_and_non_finite_timestamps_are_rejected() {
        let frame = |when: &str| {
            format!(
                r#"{{"logType":"structure","id":0,"combinatorName":"x","componentName":"y",
                     "isContainerComponent":false,"path":[0],"when":{when}}}"#
            )
        };
        assert!(matches!(
            decode_trace_message(&frame("-1")).unwrap_err(),
            ProtocolError::InvalidTimestamp(_)
        ));
        // JSON has no NaN literal; an out-of-range float exercises the guard.
        assert!(matches!(
            decode_trace_message(&frame("1e300")).unwrap_err(),
            ProtocolError::InvalidTimestamp(_)
        ));
    }

    #[test]
    fn encode_restores_the_wire_shape() {
        let frame = r#"{"logType":"structure","id":7,"combinatorName":"isolate","componentName":"App","isContainerComponent":false,"path":[0,2],"when":10.5}"#;
        let message = decode_trace_message(frame).unwrap();
        let encoded = encode_trace_message(&message).unwrap();
        let reparsed: Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(reparsed["logType"], "structure");
        assert_eq!(reparsed["id"], 7);
        assert_eq!(reparsed["path"], serde_json::json!([0, 2]));
        assert_eq!(reparsed["when"], 10.5);
    }
}
