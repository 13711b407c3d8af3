// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Patch operations: the sole mutation channel into the derived state.
//!
//! Every state transition produces an ordered list of [`PatchOp`]s; the
//! store applies the list atomically. The ops are a typed counterpart of
//! the JSON-patch-shaped interop format: `op` is `add` (create a yet-unset
//! path) or `replace` (overwrite an existing path), and the path/value pair
//! is expressed as a [`PatchTarget`] variant so application is a total
//! function over the aggregate, checked at compile time. There is no
//! `remove` — obsolescence is expressed by omission during snapshot rebuild.
//!
//! [`PatchOp::pointer`] renders the slash-delimited path string used by the
//! wire interop form and by tests.

use crate::ident::{RushIndex, TraceId};
use crate::message::{EmissionMessage, StructureMessage};
use crate::path::PathKey;
use crate::snapshot::ComponentTreeSnapshot;

/// Whether an op creates an unset path or overwrites a set one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PatchKind {
    /// Create: the target path must currently be unset.
    Add,
    /// Overwrite: the target path must currently be set.
    Replace,
}

impl PatchKind {
    /// Returns the interop name of this op kind (`"add"` / `"replace"`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
        }
    }
}

/// A typed path/value pair into the aggregate.
///
/// Each variant names one mutable location of the derived state and carries
/// the full replacement value for it. Scalar aggregate fields (rush index,
/// selections) always exist and are only ever targets of `replace`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PatchTarget {
    /// `/currentRushIndex`
    CurrentRushIndex(RushIndex),
    /// `/primarySelection`
    PrimarySelection(Option<TraceId>),
    /// `/secondarySelection`
    SecondarySelection(Option<TraceId>),
    /// `/selectionRushIndex`
    SelectionRushIndex(RushIndex),
    /// `/treeStructureTracesById/{id}`
    StructureTraceById(StructureMessage),
    /// `/emissionTracesById/{id}`
    EmissionTraceById(EmissionMessage),
    /// `/treeStructureTraces/{rush}` — the rush's full ordered id list.
    StructureTraceList {
        /// Rush the list belongs to.
        rush: RushIndex,
        /// Ordered structure ids recorded for the rush.
        ids: Vec<TraceId>,
    },
    /// `/emissionTraces/{rush}` — the rush's full ordered id list.
    EmissionTraceList {
        /// Rush the list belongs to.
        rush: RushIndex,
        /// Ordered emission ids recorded for the rush.
        ids: Vec<TraceId>,
    },
    /// `/componentTrees/{rush}`
    ComponentTree {
        /// Rush the snapshot belongs to.
        rush: RushIndex,
        /// The full snapshot value.
        snapshot: ComponentTreeSnapshot,
    },
    /// `/sourcesForSelectedTrace/{rush}/{path}` — latest source emission at
    /// a tree position within a rush.
    SourceForSelectedTrace {
        /// Rush the index entry belongs to.
        rush: RushIndex,
        /// Tree position key.
        path: PathKey,
        /// The emission now indexed at this position.
        message: EmissionMessage,
    },
    /// `/sinksForSelectedTrace/{rush}/{path}` — latest sink emission at a
    /// tree position within a rush.
    SinkForSelectedTrace {
        /// Rush the index entry belongs to.
        rush: RushIndex,
        /// Tree position key.
        path: PathKey,
        /// The emission now indexed at this position.
        message: EmissionMessage,
    },
}

/// One mutation against the derived state.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PatchOp {
    /// Add or replace.
    pub kind: PatchKind,
    /// The typed path/value pair.
    pub target: PatchTarget,
}

impl PatchOp {
    /// Constructs an `add` op.
    #[must_use]
    pub fn add(target: PatchTarget) -> Self {
        Self {
            kind: PatchKind::Add,
            target,
        }
    }

    /// Constructs a `replace` op.
    #[must_use]
    pub fn replace(target: PatchTarget) -> Self {
        Self {
            kind: PatchKind::Replace,
            target,
        }
    }

    /// Renders the slash-delimited interop path of this op's target.
    #[must_use]
    pub fn pointer(&self) -> String {
        match &self.target {
            PatchTarget::CurrentRushIndex(_) => "/currentRushIndex".to_string(),
            PatchTarget::PrimarySelection(_) => "/primarySelection".to_string(),
            PatchTarget::SecondarySelection(_) => "/secondarySelection".to_string(),
            PatchTarget::SelectionRushIndex(_) => "/selectionRushIndex".to_string(),
            PatchTarget::StructureTraceById(m) => {
                format!("/treeStructureTracesById/{}", m.id)
            }
            PatchTarget::EmissionTraceById(m) => format!("/emissionTracesById/{}", m.id),
            PatchTarget::StructureTraceList { rush, .. } => {
                format!("/treeStructureTraces/{rush}")
            }
            PatchTarget::EmissionTraceList { rush, .. } => format!("/emissionTraces/{rush}"),
            PatchTarget::ComponentTree { rush, .. } => format!("/componentTrees/{rush}"),
            PatchTarget::SourceForSelectedTrace { rush, path, .. } => {
                format!("/sourcesForSelectedTrace/{rush}/{path}")
            }
            PatchTarget::SinkForSelectedTrace { rush, path, .. } => {
                format!("/sinksForSelectedTrace/{rush}/{path}")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::{TraceId, TraceInstant};
    use crate::path::TracePath;

    fn structure(id: u64, path: &[u32]) -> StructureMessage {
        StructureMessage {
            id: TraceId::from_raw(id),
            combinator_name: "map".into(),
            component_name: "App".into(),
            is_container_component: false,
            path: TracePath::from(path),
            when: TraceInstant::from_micros(0),
        }
    }

    #[test]
    fn pointer_renders_scalar_paths() {
        let op = PatchOp::replace(PatchTarget::CurrentRushIndex(3));
        assert_eq!(op.pointer(), "/currentRushIndex");
        assert_eq!(op.kind.as_str(), "replace");
    }

    #[test]
    fn pointer_renders_id_keyed_paths() {
        let op = PatchOp::add(PatchTarget::StructureTraceById(structure(7, &[0])));
        assert_eq!(op.pointer(), "/treeStructureTracesById/7");
        assert_eq!(op.kind.as_str(), "add");
    }

    #[test]
    fn pointer_renders_rush_and_path_keyed_paths() {
        let op = PatchOp::add(PatchTarget::ComponentTree {
            rush: 2,
            snapshot: ComponentTreeSnapshot::empty(),
        });
        assert_eq!(op.pointer(), "/componentTrees/2");

        let list = PatchOp::add(PatchTarget::EmissionTraceList {
            rush: 5,
            ids: vec![TraceId::from_raw(9)],
        });
        assert_eq!(list.pointer(), "/emissionTraces/5");
    }
}
