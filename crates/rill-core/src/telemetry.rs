// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

// Telemetry helpers for JSONL logging when the `telemetry` feature is enabled.
// Manually formats JSON to keep serde_json out of the core library.

#![allow(clippy::print_stdout)]

#[cfg(feature = "telemetry")]
use crate::ident::{RushIndex, TraceId};

#[cfg(feature = "telemetry")]
fn ts_micros() -> u128 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_micros()
}

/// Emits a rush-opened telemetry event.
///
/// Logs the new rush index and the structure message id that opened it as a
/// JSON line to stdout when the `telemetry` feature is enabled. Best-effort:
/// I/O errors are ignored and timestamps fall back to 0 on clock errors.
#[cfg(feature = "telemetry")]
pub fn rush_opened(rush: RushIndex, id: TraceId) {
    use std::io::Write as _;
    let mut out = std::io::stdout().lock();
    let _ = write!(
        out,
        r#"{{"timestamp_micros":{},"event":"rush_opened","rush":{},"trace_id":{}}}"#,
        ts_micros(),
        rush,
        id.value()
    );
    let _ = out.write_all(b"\n");
}

/// Emits a rush-closed telemetry event after a snapshot rebuild.
///
/// Logs the rush index and the rebuilt snapshot's node count as a JSON line
/// to stdout when the `telemetry` feature is enabled. Best-effort: I/O
/// errors are ignored and timestamps fall back to 0 on clock errors.
#[cfg(feature = "telemetry")]
pub fn rush_closed(rush: RushIndex, nodes: usize) {
    use std::io::Write as _;
    let mut out = std::io::stdout().lock();
    let _ = write!(
        out,
        r#"{{"timestamp_micros":{},"event":"rush_closed","rush":{},"nodes":{}}}"#,
        ts_micros(),
        rush,
        nodes
    );
    let _ = out.write_all(b"\n");
}
