// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! The trace-ingestion state machine.
//!
//! Messages are folded one at a time, strictly in arrival order. The machine
//! holds exactly one piece of control state — whether the current rush is in
//! its structural or its emission phase — and dispatches each message
//! through the four-transition table:
//!
//! | message kind | control state   | handler                     | next state      |
//! |--------------|-----------------|-----------------------------|-----------------|
//! | structure    | `StructureMode` | append structure to rush    | `StructureMode` |
//! | structure    | `EmissionMode`  | open new rush               | `StructureMode` |
//! | emission     | `StructureMode` | close rush, rebuild snapshot| `EmissionMode`  |
//! | emission     | `EmissionMode`  | append emission to rush     | `EmissionMode`  |
//!
//! Each handler reads the current aggregate and produces an ordered patch
//! list; the store applies it before the next message is considered. The
//! rush index advances only on the emission-to-structure transition.
//!
//! # Invariants
//!
//! - A rush's snapshot is rebuilt exactly once, when its structural phase
//!   closes (first emission of the rush).
//! - Re-delivery of an already-recorded id restates the id-keyed entry but
//!   never duplicates a per-rush list entry.
//! - Control state is a total two-variant enum; there is no "unknown state"
//!   at runtime.

use crate::ident::RushIndex;
use crate::message::{EmissionMessage, EmitKind, StructureMessage, TraceMessage};
use crate::patch::{PatchOp, PatchTarget};
use crate::snapshot::ComponentTreeSnapshot;
use crate::store::DevtoolState;

/// Phase of the current rush.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ControlState {
    /// The rush's structural phase: tree-shape messages are accumulating.
    #[default]
    StructureMode,
    /// The rush's emission phase: data events are being recorded.
    EmissionMode,
}

/// Folds trace messages into patch lists against the derived state.
///
/// The machine owns only its control state; the aggregate lives in the
/// store. `fold` is the explicit `(state, message) -> patches` function —
/// there is no hidden mutable capture anywhere in the ingestion path.
#[derive(Debug, Clone, Copy, Default)]
pub struct TraceStateMachine {
    control: ControlState,
}

impl TraceStateMachine {
    /// Creates a machine in the initial control state (`StructureMode`).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current control state.
    #[must_use]
    pub fn control(&self) -> ControlState {
        self.control
    }

    /// Folds one message, returning the ordered patch list to apply.
    ///
    /// The caller must apply the returned list to the same aggregate that
    /// was passed in before folding the next message; handlers read the
    /// aggregate to build their patches.
    pub fn fold(&mut self, state: &DevtoolState, message: &TraceMessage) -> Vec<PatchOp> {
        match (message, self.control) {
            (TraceMessage::Structure(m), ControlState::StructureMode) => {
                append_structure(state, m)
            }
            (TraceMessage::Structure(m), ControlState::EmissionMode) => {
                self.control = ControlState::StructureMode;
                open_new_rush(state, m)
            }
            (TraceMessage::Emission(m), ControlState::StructureMode) => {
                self.control = ControlState::EmissionMode;
                close_rush(state, m)
            }
            (TraceMessage::Emission(m), ControlState::EmissionMode) => {
                append_emission(state, m)
            }
        }
    }
}

/// structure × `StructureMode`: record the message into the current rush's
/// structural phase. No snapshot work yet — the phase may span many
/// messages before the first emission closes it.
fn append_structure(state: &DevtoolState, message: &StructureMessage) -> Vec<PatchOp> {
    let rush = state.current_rush_index;

    if state.tree_structure_traces_by_id.contains_key(&message.id) {
        // Re-delivery: restate the record, leave the rush list alone.
        return vec![PatchOp::replace(PatchTarget::StructureTraceById(
            message.clone(),
        ))];
    }

    let mut ids = state
        .tree_structure_traces
        .get(&rush)
        .cloned()
        .unwrap_or_default();
    let list_exists = !ids.is_empty() || state.tree_structure_traces.contains_key(&rush);
    ids.push(message.id);

    let list_target = PatchTarget::StructureTraceList { rush, ids };
    vec![
        PatchOp::add(PatchTarget::StructureTraceById(message.clone())),
        if list_exists {
            PatchOp::replace(list_target)
        } else {
            PatchOp::add(list_target)
        },
    ]
}

/// structure × `EmissionMode`: the previous rush's emission phase is over.
/// Advance the rush index, seed the new rush's snapshot as a copy of the
/// previous one (to be corrected when the new structural phase closes), and
/// start the new rush's structure list with this message.
fn open_new_rush(state: &DevtoolState, message: &StructureMessage) -> Vec<PatchOp> {
    let new_rush = state.current_rush_index + 1;
    let seed = state
        .component_trees
        .get(&state.current_rush_index)
        .cloned()
        .unwrap_or_else(ComponentTreeSnapshot::empty);

    #[cfg(feature = "telemetry")]
    crate::telemetry::rush_opened(new_rush, message.id);

    vec![
        PatchOp::replace(PatchTarget::CurrentRushIndex(new_rush)),
        PatchOp::add(PatchTarget::ComponentTree {
            rush: new_rush,
            snapshot: seed,
        }),
        PatchOp::add(PatchTarget::StructureTraceById(message.clone())),
        PatchOp::add(PatchTarget::StructureTraceList {
            rush: new_rush,
            ids: vec![message.id],
        }),
    ]
}

/// emission × `StructureMode`: first emission after a structural phase.
/// Finalize the rush's snapshot, then record the emission.
fn close_rush(state: &DevtoolState, message: &EmissionMessage) -> Vec<PatchOp> {
    let rush = state.current_rush_index;

    let prev = if rush == 0 {
        ComponentTreeSnapshot::empty()
    } else {
        state
            .component_trees
            .get(&(rush - 1))
            .cloned()
            .unwrap_or_else(ComponentTreeSnapshot::empty)
    };

    let snapshot = ComponentTreeSnapshot::rebuild(&prev, state.structure_messages_for_rush(rush));

    #[cfg(feature = "telemetry")]
    crate::telemetry::rush_closed(rush, snapshot.hash.len());

    // Rush 0 has no seeded snapshot; later rushes were seeded at open.
    let tree_target = PatchTarget::ComponentTree { rush, snapshot };
    let tree_op = if state.component_trees.contains_key(&rush) {
        PatchOp::replace(tree_target)
    } else {
        PatchOp::add(tree_target)
    };

    let mut ops = vec![
        tree_op,
        PatchOp::add(PatchTarget::EmissionTraceById(message.clone())),
        PatchOp::add(PatchTarget::EmissionTraceList {
            rush,
            ids: vec![message.id],
        }),
    ];
    ops.push(selected_trace_index_op(state, rush, message));
    ops
}

/// emission × `EmissionMode`: append the emission to the current rush and
/// refresh the latest-wins source/sink index at its tree position.
fn append_emission(state: &DevtoolState, message: &EmissionMessage) -> Vec<PatchOp> {
    let rush = state.current_rush_index;

    if state.emission_traces_by_id.contains_key(&message.id) {
        return vec![PatchOp::replace(PatchTarget::EmissionTraceById(
            message.clone(),
        ))];
    }

    let mut ids = state.emission_traces.get(&rush).cloned().unwrap_or_default();
    let list_exists = !ids.is_empty() || state.emission_traces.contains_key(&rush);
    ids.push(message.id);

    let list_target = PatchTarget::EmissionTraceList { rush, ids };
    vec![
        PatchOp::add(PatchTarget::EmissionTraceById(message.clone())),
        if list_exists {
            PatchOp::replace(list_target)
        } else {
            PatchOp::add(list_target)
        },
        selected_trace_index_op(state, rush, message),
    ]
}

/// Builds the latest-wins source/sink index op for an emission.
///
/// Earlier emissions at the same position stay in the id-keyed log; only the
/// per-position index entry is overwritten.
fn selected_trace_index_op(
    state: &DevtoolState,
    rush: RushIndex,
    message: &EmissionMessage,
) -> PatchOp {
    let path = message.path.key();
    match message.emits.kind {
        EmitKind::Source => {
            let occupied = state
                .sources_for_selected_trace
                .get(&rush)
                .is_some_and(|m| m.contains_key(&path));
            let target = PatchTarget::SourceForSelectedTrace {
                rush,
                path,
                message: message.clone(),
            };
            if occupied {
                PatchOp::replace(target)
            } else {
                PatchOp::add(target)
            }
        }
        EmitKind::Sink => {
            let occupied = state
                .sinks_for_selected_trace
                .get(&rush)
                .is_some_and(|m| m.contains_key(&path));
            let target = PatchTarget::SinkForSelectedTrace {
                rush,
                path,
                message: message.clone(),
            };
            if occupied {
                PatchOp::replace(target)
            } else {
                PatchOp::add(target)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{TraceId, TraceInstant};
    use crate::message::{Emit, Notification, NotificationKind};
    use crate::path::TracePath;
    use crate::store::DevtoolStore;

    fn structure(id: u64, path: &[u32]) -> TraceMessage {
        TraceMessage::Structure(StructureMessage {
            id: TraceId::from_raw(id),
            combinator_name: "isolate".into(),
            component_name: "App".into(),
            is_container_component: true,
            path: TracePath::from(path),
            when: TraceInstant::from_micros(id),
        })
    }

    fn emission(id: u64, path: &[u32], kind: EmitKind) -> TraceMessage {
        TraceMessage::Emission(EmissionMessage {
            id: TraceId::from_raw(id),
            combinator_name: "map".into(),
            component_name: "App".into(),
            path: TracePath::from(path),
            when: TraceInstant::from_micros(id),
            settings: None,
            emits: Emit {
                identifier: "DOM".into(),
                kind,
                notification: Notification {
                    kind: NotificationKind::Next,
                    value: Some(b"{}".to_vec()),
                },
            },
        })
    }

    fn fold_all(messages: &[TraceMessage]) -> (TraceStateMachine, DevtoolStore) {
        let mut machine = TraceStateMachine::new();
        let mut store = DevtoolStore::new();
        for message in messages {
            let ops = machine.fold(store.state(), message);
            store.apply(&ops).unwrap();
        }
        (machine, store)
    }

    #[test]
    fn initial_control_state_is_structure_mode() {
        assert_eq!(TraceStateMachine::new().control(), ControlState::StructureMode);
    }

    #[test]
    fn structure_then_emission_closes_rush_zero() {
        let (machine, store) = fold_all(&[
            structure(0, &[0]),
            emission(1, &[0, 0], EmitKind::Source),
        ]);
        let state = store.state();

        assert_eq!(machine.control(), ControlState::EmissionMode);
        assert_eq!(state.current_rush_index, 0);
        assert!(state.component_trees[&0]
            .hash
            .contains_key(&TracePath::from(&[0u32][..]).key()));
        assert_eq!(state.emission_traces[&0], vec![TraceId::from_raw(1)]);
        assert!(state.sources_for_selected_trace[&0]
            .contains_key(&TracePath::from(&[0u32, 0][..]).key()));
    }

    #[test]
    fn emission_to_structure_transition_opens_new_rush() {
        let (machine, store) = fold_all(&[
            structure(0, &[0]),
            emission(1, &[0, 0], EmitKind::Source),
            structure(2, &[0, 0]),
        ]);
        let state = store.state();

        assert_eq!(machine.control(), ControlState::StructureMode);
        assert_eq!(state.current_rush_index, 1);
        // Rush 1's snapshot is seeded from rush 0 until an emission closes it.
        assert_eq!(state.component_trees[&1], state.component_trees[&0]);
        assert_eq!(
            state.tree_structure_traces[&1],
            vec![TraceId::from_raw(2)]
        );
    }

    #[test]
    fn closing_a_later_rush_replaces_the_seeded_snapshot() {
        let (_, store) = fold_all(&[
            structure(0, &[0]),
            emission(1, &[0, 0], EmitKind::Source),
            structure(2, &[0, 0]),
            emission(3, &[0, 0], EmitKind::Sink),
        ]);
        let state = store.state();

        assert_eq!(state.current_rush_index, 1);
        let tree = &state.component_trees[&1];
        // [0] carries over, [0,0] was superseded by structure id 2.
        assert_eq!(
            tree.hash[&TracePath::from(&[0u32, 0][..]).key()].id,
            TraceId::from_raw(2)
        );
        assert!(tree.hash.contains_key(&TracePath::from(&[0u32][..]).key()));
        assert!(state.sinks_for_selected_trace[&1]
            .contains_key(&TracePath::from(&[0u32, 0][..]).key()));
    }

    #[test]
    fn emission_without_structure_closes_an_empty_rush() {
        let (_, store) = fold_all(&[emission(0, &[0], EmitKind::Sink)]);
        let state = store.state();
        assert_eq!(state.current_rush_index, 0);
        assert!(state.component_trees[&0].hash.is_empty());
        assert_eq!(state.emission_traces[&0], vec![TraceId::from_raw(0)]);
    }

    #[test]
    fn latest_emission_wins_the_selected_trace_index() {
        let (_, store) = fold_all(&[
            structure(0, &[0]),
            emission(1, &[0], EmitKind::Source),
            emission(2, &[0], EmitKind::Source),
        ]);
        let state = store.state();

        let key = TracePath::from(&[0u32][..]).key();
        assert_eq!(
            state.sources_for_selected_trace[&0][&key].id,
            TraceId::from_raw(2)
        );
        // Both emissions stay in the id-keyed log.
        assert_eq!(state.emission_traces_by_id.len(), 2);
    }

    #[test]
    fn redelivered_structure_id_does_not_duplicate_the_rush_list() {
        let (_, store) = fold_all(&[structure(0, &[0]), structure(0, &[0])]);
        let state = store.state();
        assert_eq!(state.tree_structure_traces[&0], vec![TraceId::from_raw(0)]);
        assert_eq!(state.tree_structure_traces_by_id.len(), 1);
    }

    #[test]
    fn redelivered_emission_id_does_not_duplicate_the_rush_list() {
        let (_, store) = fold_all(&[
            structure(0, &[0]),
            emission(1, &[0], EmitKind::Source),
            emission(1, &[0], EmitKind::Source),
        ]);
        let state = store.state();
        assert_eq!(state.emission_traces[&0], vec![TraceId::from_raw(1)]);
    }
}
