// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Interop form of the core's patch operations.
//!
//! The core applies patches as a typed, total function; this module renders
//! the same ops in the `{op, path, value}` shape used for logging, test
//! fixtures, and cross-process consumers.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use rill_core::{PatchOp, PatchTarget};

use crate::error::ProtocolError;

/// One patch op in the slash-delimited interop form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WirePatchOp {
    /// `"add"` or `"replace"`.
    pub op: String,
    /// Slash-delimited path into the aggregate.
    pub path: String,
    /// Full replacement value at that path.
    pub value: Value,
}

impl WirePatchOp {
    /// Renders a typed patch op into the interop form.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Json`] if the carried value fails to
    /// serialize, which only happens on pathological payloads.
    pub fn from_patch(op: &PatchOp) -> Result<Self, ProtocolError> {
        let value = match &op.target {
            PatchTarget::CurrentRushIndex(v) | PatchTarget::SelectionRushIndex(v) => {
                serde_json::to_value(v)?
            }
            PatchTarget::PrimarySelection(v) | PatchTarget::SecondarySelection(v) => {
                serde_json::to_value(v)?
            }
            PatchTarget::StructureTraceById(m) => serde_json::to_value(m)?,
            PatchTarget::EmissionTraceById(m)
            | PatchTarget::SourceForSelectedTrace { message: m, .. }
            | PatchTarget::SinkForSelectedTrace { message: m, .. } => serde_json::to_value(m)?,
            PatchTarget::StructureTraceList { ids, .. }
            | PatchTarget::EmissionTraceList { ids, .. } => serde_json::to_value(ids)?,
            PatchTarget::ComponentTree { snapshot, .. } => serde_json::to_value(snapshot)?,
        };
        Ok(Self {
            op: op.kind.as_str().to_owned(),
            path: op.pointer(),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill_core::{ComponentTreeSnapshot, TraceId};

    #[test]
    fn scalar_ops_render_bare_values() {
        let wire = WirePatchOp::from_patch(&PatchOp::replace(PatchTarget::CurrentRushIndex(3)))
            .unwrap();
        assert_eq!(wire.op, "replace");
        assert_eq!(wire.path, "/currentRushIndex");
        assert_eq!(wire.value, serde_json::json!(3));
    }

    #[test]
    fn list_ops_render_id_arrays() {
        let wire = WirePatchOp::from_patch(&PatchOp::add(PatchTarget::EmissionTraceList {
            rush: 1,
            ids: vec![TraceId::from_raw(4), TraceId::from_raw(5)],
        }))
        .unwrap();
        assert_eq!(wire.path, "/emissionTraces/1");
        assert_eq!(wire.value, serde_json::json!([4, 5]));
    }

    #[test]
    fn tree_ops_carry_the_whole_snapshot() {
        let wire = WirePatchOp::from_patch(&PatchOp::add(PatchTarget::ComponentTree {
            rush: 0,
            snapshot: ComponentTreeSnapshot::empty(),
        }))
        .unwrap();
        assert_eq!(wire.path, "/componentTrees/0");
        assert!(wire.value.get("hash").is_some_and(Value::is_object));
    }
}
