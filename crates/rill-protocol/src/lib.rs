// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Wire codec for rill trace messages and patch interop.
//!
//! The producer side of a debugging session delivers trace messages as JSON
//! objects with a `logType` discriminator; this crate decodes them into the
//! typed [`rill_core::TraceMessage`] model and renders the core's patch ops
//! in the `{op, path, value}` interop form for logging and test fixtures.
//!
//! Malformed input is rejected at this boundary with a typed
//! [`ProtocolError`]; once a message decodes, ingestion downstream is total
//! and cannot fail on message content.
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

mod error;
mod patch;
mod wire;

pub use error::ProtocolError;
pub use patch::WirePatchOp;
pub use wire::{decode_trace_message, encode_trace_message};
