// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared helpers for rill-core integration tests.

#![allow(missing_docs, dead_code)]

use rill_core::{
    DevtoolStore, Emit, EmitKind, EmissionMessage, Notification, NotificationKind,
    StructureMessage, TraceId, TraceInstant, TraceMessage, TracePath, TraceStateMachine,
};

/// Builds a structure message at a path.
pub fn structure(id: u64, path: &[u32], component: &str) -> TraceMessage {
    TraceMessage::Structure(StructureMessage {
        id: TraceId::from_raw(id),
        combinator_name: "isolate".into(),
        component_name: component.into(),
        is_container_component: true,
        path: TracePath::from(path),
        when: TraceInstant::from_micros(id),
    })
}

/// Builds a source emission at a path.
pub fn source_emission(id: u64, path: &[u32], component: &str) -> TraceMessage {
    emission(id, path, component, EmitKind::Source)
}

/// Builds a sink emission at a path.
pub fn sink_emission(id: u64, path: &[u32], component: &str) -> TraceMessage {
    emission(id, path, component, EmitKind::Sink)
}

/// Builds an emission with an explicit kind.
pub fn emission(id: u64, path: &[u32], component: &str, kind: EmitKind) -> TraceMessage {
    TraceMessage::Emission(EmissionMessage {
        id: TraceId::from_raw(id),
        combinator_name: "map".into(),
        component_name: component.into(),
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

/// Folds a message sequence into a fresh store.
pub fn ingest(messages: &[TraceMessage]) -> (TraceStateMachine, DevtoolStore) {
    let mut machine = TraceStateMachine::new();
    let mut store = DevtoolStore::new();
    for message in messages {
        let ops = machine.fold(store.state(), message);
        store.apply(&ops).expect("fold produced a valid patch list");
    }
    (machine, store)
}

/// Path key helper.
pub fn key(path: &[u32]) -> rill_core::PathKey {
    TracePath::from(path).key()
}
