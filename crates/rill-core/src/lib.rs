// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! rill-core: incremental trace-ingestion and history navigation for
//! reactive component tree debugging.
//!
//! A running reactive component tree emits an ordered stream of trace
//! messages: structural records (tree shape) and emission records (data
//! events at tree positions). This crate folds that stream into a derived
//! debugging aggregate — per-rush tree snapshots, an emission log, and
//! navigation indices — that rendering and selection consumers read
//! point-in-time. Transport and rendering live elsewhere; everything here
//! is synchronous, single-threaded, and I/O-free.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro,
    clippy::print_stdout,
    clippy::print_stderr
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::redundant_pub_crate,
    clippy::module_name_repetitions,
    clippy::use_self
)]

mod ident;
mod machine;
mod message;
mod navigate;
mod patch;
mod path;
mod snapshot;
mod store;
#[cfg(feature = "telemetry")]
pub(crate) mod telemetry;

// Re-exports for stable public API
/// Identifier types: producer-assigned trace ids and rush indices.
pub use ident::{RushIndex, TraceId, TraceInstant};
/// Trace-ingestion state machine (control state and the fold function).
pub use machine::{ControlState, TraceStateMachine};
/// Trace message model and the structure/emission classifier.
pub use message::{
    Emit, EmitKind, EmissionMessage, MessageKind, Notification, NotificationKind,
    StructureMessage, TraceMessage,
};
/// Pure selection navigation over ingested history.
pub use navigate::{
    next_by_id, next_similar, previous_by_id, previous_similar, select, NavOutcome,
    SelectionFields,
};
/// Patch operations: the sole mutation channel into the derived state.
pub use patch::{PatchKind, PatchOp, PatchTarget};
/// Tree positions and their canonical key form.
pub use path::{PathKey, TracePath, PATH_DELIMITER};
/// Per-rush component tree snapshots.
pub use snapshot::ComponentTreeSnapshot;
/// The derived state aggregate and its owning store.
pub use store::{DevtoolState, DevtoolStore, PatchApplyError};
