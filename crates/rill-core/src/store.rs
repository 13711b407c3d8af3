// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! The derived state aggregate and the store that owns it.
//!
//! [`DevtoolState`] is everything the debugging consumers read: historical
//! tree snapshots, the emission log, the per-rush indices, and the current
//! selection. [`DevtoolStore`] owns the aggregate and is its single write
//! funnel: all mutation arrives as a patch list and is applied atomically —
//! either every op in the list lands or none do. Readers only ever observe
//! a fully applied state.
//!
//! # Invariants
//!
//! - Id-keyed maps are append-only; an id, once written, is immutable (a
//!   `replace` at an id path may only restate the identical message).
//! - Per-rush id lists are append-only per rush.
//! - Snapshots are only ever written whole, by rebuild; emission folding
//!   never touches them.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::ident::{RushIndex, TraceId};
use crate::message::{EmissionMessage, StructureMessage};
use crate::patch::{PatchKind, PatchOp, PatchTarget};
use crate::path::PathKey;
use crate::snapshot::ComponentTreeSnapshot;

/// Errors that can occur when applying a patch list to the aggregate.
///
/// These indicate a handler bug (an op produced against a state it did not
/// read), never a recoverable runtime condition. On error, the aggregate is
/// left exactly as it was before the list was applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchApplyError {
    /// An `add` op targeted a path that is already set.
    #[error("add target already set at {pointer}")]
    PathAlreadySet {
        /// Interop pointer of the offending op.
        pointer: String,
    },

    /// A `replace` op targeted a path that is not set.
    #[error("replace target unset at {pointer}")]
    PathUnset {
        /// Interop pointer of the offending op.
        pointer: String,
    },
}

/// The derived debugging state read by rendering and selection consumers.
///
/// All fields start empty/zeroed at session start. Mutation happens only
/// through [`DevtoolStore::apply`].
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DevtoolState {
    /// Emission id currently highlighted for inspection, if any.
    pub primary_selection: Option<TraceId>,
    /// Second highlighted emission id (e.g. for comparison), if any.
    pub secondary_selection: Option<TraceId>,
    /// Rush the primary selection belongs to.
    pub selection_rush_index: RushIndex,
    /// Rush currently being folded into.
    pub current_rush_index: RushIndex,
    /// Emission id → message, append-only.
    pub emission_traces_by_id: BTreeMap<TraceId, EmissionMessage>,
    /// Structure id → message, append-only.
    pub tree_structure_traces_by_id: BTreeMap<TraceId, StructureMessage>,
    /// Rush → ordered emission ids recorded in that rush.
    pub emission_traces: BTreeMap<RushIndex, Vec<TraceId>>,
    /// Rush → ordered structure ids recorded in that rush.
    pub tree_structure_traces: BTreeMap<RushIndex, Vec<TraceId>>,
    /// Rush → tree snapshot for that rush.
    pub component_trees: BTreeMap<RushIndex, ComponentTreeSnapshot>,
    /// Rush → tree position → latest source emission there (latest wins).
    pub sources_for_selected_trace: BTreeMap<RushIndex, BTreeMap<PathKey, EmissionMessage>>,
    /// Rush → tree position → latest sink emission there (latest wins).
    pub sinks_for_selected_trace: BTreeMap<RushIndex, BTreeMap<PathKey, EmissionMessage>>,
}

impl DevtoolState {
    /// Resolves the structure messages recorded for a rush, in order.
    ///
    /// Rushes with no structural phase (e.g. an emission arriving first at
    /// session start) yield an empty iterator.
    pub fn structure_messages_for_rush(
        &self,
        rush: RushIndex,
    ) -> impl Iterator<Item = &StructureMessage> {
        self.tree_structure_traces
            .get(&rush)
            .into_iter()
            .flatten()
            .filter_map(|id| self.tree_structure_traces_by_id.get(id))
    }

    /// Returns the rush an emission id was recorded in, if any.
    #[must_use]
    pub fn rush_of_emission(&self, id: TraceId) -> Option<RushIndex> {
        self.emission_traces
            .iter()
            .find(|(_, ids)| ids.contains(&id))
            .map(|(rush, _)| *rush)
    }
}

/// Owner of the derived state aggregate.
///
/// The store is the single write funnel: the ingestion state machine
/// produces patch lists, the store applies them, and every other component
/// (navigation, rendering consumers) reads through [`DevtoolStore::state`].
#[derive(Debug, Clone, Default)]
pub struct DevtoolStore {
    state: DevtoolState,
}

impl DevtoolStore {
    /// Creates a store with an empty aggregate.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read access to the current aggregate.
    #[must_use]
    pub fn state(&self) -> &DevtoolState {
        &self.state
    }

    /// Applies a patch list atomically.
    ///
    /// Ops are applied in list order against a scratch copy; the copy is
    /// committed only if every op succeeds, so a failing list leaves the
    /// aggregate untouched.
    ///
    /// # Errors
    ///
    /// Returns [`PatchApplyError`] if an `add` finds its path already set or
    /// a `replace` finds its path unset. Either means the patch list was not
    /// produced against the current state.
    pub fn apply(&mut self, ops: &[PatchOp]) -> Result<(), PatchApplyError> {
        let mut scratch = self.state.clone();
        for op in ops {
            apply_op(&mut scratch, op)?;
        }
        self.state = scratch;
        Ok(())
    }

    /// Moves the primary selection to an emission in a known rush.
    ///
    /// This is the write half of the navigation contract: navigation
    /// computes new selection fields as a pure function, and the result is
    /// folded back in through the patch channel like every other mutation.
    ///
    /// # Errors
    ///
    /// Returns [`PatchApplyError`] if the underlying patch application
    /// fails (which would indicate a store bug; scalar paths always exist).
    pub fn apply_selection(
        &mut self,
        selection: TraceId,
        rush: RushIndex,
    ) -> Result<(), PatchApplyError> {
        self.apply(&[
            PatchOp::replace(PatchTarget::PrimarySelection(Some(selection))),
            PatchOp::replace(PatchTarget::SelectionRushIndex(rush)),
        ])
    }

    /// Sets or clears the secondary selection.
    ///
    /// # Errors
    ///
    /// Returns [`PatchApplyError`] if the underlying patch application fails.
    pub fn set_secondary_selection(
        &mut self,
        selection: Option<TraceId>,
    ) -> Result<(), PatchApplyError> {
        self.apply(&[PatchOp::replace(PatchTarget::SecondarySelection(
            selection,
        ))])
    }
}

/// Applies one op to the aggregate, enforcing add/replace occupancy.
fn apply_op(state: &mut DevtoolState, op: &PatchOp) -> Result<(), PatchApplyError> {
    let kind = op.kind;
    match &op.target {
        PatchTarget::CurrentRushIndex(value) => {
            check_scalar(kind, op)?;
            state.current_rush_index = *value;
        }
        PatchTarget::PrimarySelection(value) => {
            check_scalar(kind, op)?;
            state.primary_selection = *value;
        }
        PatchTarget::SecondarySelection(value) => {
            check_scalar(kind, op)?;
            state.secondary_selection = *value;
        }
        PatchTarget::SelectionRushIndex(value) => {
            check_scalar(kind, op)?;
            state.selection_rush_index = *value;
        }
        PatchTarget::StructureTraceById(message) => {
            let occupied = state.tree_structure_traces_by_id.contains_key(&message.id);
            check_occupancy(kind, occupied, op)?;
            state
                .tree_structure_traces_by_id
                .insert(message.id, message.clone());
        }
        PatchTarget::EmissionTraceById(message) => {
            let occupied = state.emission_traces_by_id.contains_key(&message.id);
            check_occupancy(kind, occupied, op)?;
            state
                .emission_traces_by_id
                .insert(message.id, message.clone());
        }
        PatchTarget::StructureTraceList { rush, ids } => {
            let occupied = state.tree_structure_traces.contains_key(rush);
            check_occupancy(kind, occupied, op)?;
            state.tree_structure_traces.insert(*rush, ids.clone());
        }
        PatchTarget::EmissionTraceList { rush, ids } => {
            let occupied = state.emission_traces.contains_key(rush);
            check_occupancy(kind, occupied, op)?;
            state.emission_traces.insert(*rush, ids.clone());
        }
        PatchTarget::ComponentTree { rush, snapshot } => {
            let occupied = state.component_trees.contains_key(rush);
            check_occupancy(kind, occupied, op)?;
            state.component_trees.insert(*rush, snapshot.clone());
        }
        PatchTarget::SourceForSelectedTrace {
            rush,
            path,
            message,
        } => {
            let by_path = state.sources_for_selected_trace.entry(*rush).or_default();
            let occupied = by_path.contains_key(path);
            check_occupancy(kind, occupied, op)?;
            by_path.insert(path.clone(), message.clone());
        }
        PatchTarget::SinkForSelectedTrace {
            rush,
            path,
            message,
        } => {
            let by_path = state.sinks_for_selected_trace.entry(*rush).or_default();
            let occupied = by_path.contains_key(path);
            check_occupancy(kind, occupied, op)?;
            by_path.insert(path.clone(), message.clone());
        }
    }
    Ok(())
}

/// Scalar aggregate fields always exist; only `replace` may target them.
fn check_scalar(kind: PatchKind, op: &PatchOp) -> Result<(), PatchApplyError> {
    match kind {
        PatchKind::Replace => Ok(()),
        PatchKind::Add => Err(PatchApplyError::PathAlreadySet {
            pointer: op.pointer(),
        }),
    }
}

/// Enforces `add` on unset paths and `replace` on set ones.
fn check_occupancy(kind: PatchKind, occupied: bool, op: &PatchOp) -> Result<(), PatchApplyError> {
    match (kind, occupied) {
        (PatchKind::Add, false) | (PatchKind::Replace, true) => Ok(()),
        (PatchKind::Add, true) => Err(PatchApplyError::PathAlreadySet {
            pointer: op.pointer(),
        }),
        (PatchKind::Replace, false) => Err(PatchApplyError::PathUnset {
            pointer: op.pointer(),
        }),
    }
}
