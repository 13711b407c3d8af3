// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Trace message model and the structure/emission classifier.
//!
//! Two message kinds arrive from the producer, strictly in order:
//!
//! - **Structure** messages describe one node's position and identity in the
//!   component tree as it is rebuilt during a rush's structural phase.
//! - **Emission** messages describe one data event flowing through a source
//!   or sink at a tree position during a rush's emission phase.
//!
//! Opaque payload bytes (`settings`, notification values) carry the raw JSON
//! as delivered; the core never interprets them.

use crate::ident::{TraceId, TraceInstant};
use crate::path::TracePath;

/// Kind of a trace message, as seen by the ingestion state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MessageKind {
    /// Tree-shape information for the current rush's structural phase.
    Structure,
    /// A source/sink data event against the current rush's tree shape.
    Emission,
}

/// Whether an emission flowed through a source or a sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum EmitKind {
    /// Data entering the component (e.g. DOM events, responses).
    Source,
    /// Data leaving the component (e.g. virtual DOM, requests).
    Sink,
}

/// Kind of reactive notification carried by an emission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "UPPERCASE"))]
pub enum NotificationKind {
    /// A value was delivered.
    Next,
    /// The stream terminated with an error.
    Error,
    /// The stream completed.
    Complete,
}

/// A single reactive notification observed at a source or sink.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Notification {
    /// What happened on the stream.
    pub kind: NotificationKind,
    /// Raw JSON bytes of the delivered value, if any.
    ///
    /// `Error`/`Complete` notifications may carry no value. The core treats
    /// the bytes as opaque; consumers decode them for display.
    pub value: Option<Vec<u8>>,
}

/// The source/sink event payload of an emission message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Emit {
    /// Name of the source or sink this event flowed through (e.g. `"DOM"`).
    pub identifier: String,
    /// Source or sink.
    pub kind: EmitKind,
    /// The observed notification.
    pub notification: Notification,
}

/// One node's position and identity in the component tree.
///
/// A rush's structural phase delivers zero or more of these before the
/// first emission arrives; together with the previous rush's snapshot they
/// determine the rush's tree snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct StructureMessage {
    /// Producer-assigned id (process-wide strictly increasing).
    pub id: TraceId,
    /// Name of the combinator that produced this node.
    pub combinator_name: String,
    /// Name of the component the node belongs to.
    pub component_name: String,
    /// Whether the node is a container component (holds children).
    pub is_container_component: bool,
    /// Position of the node in the tree.
    pub path: TracePath,
    /// Producer timestamp.
    pub when: TraceInstant,
}

/// One data event flowing through a source or sink at a tree position.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct EmissionMessage {
    /// Producer-assigned id (process-wide strictly increasing).
    pub id: TraceId,
    /// Name of the combinator at this tree position.
    pub combinator_name: String,
    /// Name of the component at this tree position.
    pub component_name: String,
    /// Tree position the event was observed at.
    pub path: TracePath,
    /// Producer timestamp.
    pub when: TraceInstant,
    /// Raw JSON bytes of the node's render settings, if any. Opaque.
    pub settings: Option<Vec<u8>>,
    /// The observed source/sink event.
    pub emits: Emit,
}

/// A trace message delivered by the producer.
///
/// The two variants share the id space; [`TraceMessage::kind`] is the
/// classifier the state machine dispatches on.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TraceMessage {
    /// Tree-shape record.
    Structure(StructureMessage),
    /// Data-event record.
    Emission(EmissionMessage),
}

impl TraceMessage {
    /// Classifies this message for the ingestion state machine.
    #[must_use]
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Structure(_) => MessageKind::Structure,
            Self::Emission(_) => MessageKind::Emission,
        }
    }

    /// Returns the producer-assigned id.
    #[must_use]
    pub fn id(&self) -> TraceId {
        match self {
            Self::Structure(m) => m.id,
            Self::Emission(m) => m.id,
        }
    }

    /// Returns the tree position this message refers to.
    #[must_use]
    pub fn path(&self) -> &TracePath {
        match self {
            Self::Structure(m) => &m.path,
            Self::Emission(m) => &m.path,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(id: u64) -> TraceMessage {
        TraceMessage::Structure(StructureMessage {
            id: TraceId::from_raw(id),
            combinator_name: "map".into(),
            component_name: "List".into(),
            is_container_component: false,
            path: TracePath::new(vec![0]),
            when: TraceInstant::from_micros(0),
        })
    }

    fn emission(id: u64) -> TraceMessage {
        TraceMessage::Emission(EmissionMessage {
            id: TraceId::from_raw(id),
            combinator_name: "map".into(),
            component_name: "List".into(),
            path: TracePath::new(vec![0]),
            when: TraceInstant::from_micros(0),
            settings: None,
            emits: Emit {
                identifier: "DOM".into(),
                kind: EmitKind::Source,
                notification: Notification {
                    kind: NotificationKind::Next,
                    value: Some(b"1".to_vec()),
                },
            },
        })
    }

    #[test]
    fn classifier_distinguishes_kinds() {
        assert_eq!(structure(0).kind(), MessageKind::Structure);
        assert_eq!(emission(1).kind(), MessageKind::Emission);
    }

    #[test]
    fn shared_accessors_cover_both_variants() {
        assert_eq!(structure(3).id(), TraceId::from_raw(3));
        assert_eq!(emission(4).id(), TraceId::from_raw(4));
        assert_eq!(structure(0).path().segments(), &[0]);
    }
}
