// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Decode errors at the wire boundary.

use thiserror::Error;

/// Errors produced while decoding or encoding wire frames.
///
/// Every variant is fatal for the message that produced it; the caller
/// decides whether to drop the message or abort the stream.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON, or a field has the wrong shape.
    #[error("malformed frame: {0}")]
    Json(#[from] serde_json::Error),

    /// The frame has no `logType` discriminator field.
    #[error("frame is missing the logType discriminator")]
    MissingLogType,

    /// The `logType` discriminator names no known message kind.
    #[error("unknown logType {0:?}")]
    UnknownLogType(String),

    /// An emission's `emits.type` is neither `SOURCE` nor `SINK`.
    #[error("unknown emit type {0:?}")]
    UnknownEmitKind(String),

    /// A notification's `kind` is not `NEXT`, `ERROR`, or `COMPLETE`.
    #[error("unknown notification kind {0:?}")]
    UnknownNotificationKind(String),

    /// The `when` timestamp is negative, non-finite, or out of range.
    #[error("timestamp {0} is not representable")]
    InvalidTimestamp(f64),
}
