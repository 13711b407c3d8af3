// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Per-rush component tree snapshots and the rebuild algorithm.
//!
//! A snapshot is the path→node mapping representing the tree's known shape
//! as of a given rush. Snapshots are derived, never edited in place: rush
//! `r`'s snapshot is a pure function of rush `r-1`'s snapshot and the
//! structure messages recorded during rush `r`'s structural phase.
//!
//! # Rebuild rules
//!
//! 1. Start from the previous rush's mapping (empty for rush zero).
//! 2. Drop every carried entry whose path is equal to, or descended from,
//!    any path in the fresh structural set — those subtrees were rebuilt
//!    and the old entries are superseded.
//! 3. Merge the fresh structure messages keyed by their own path key, in
//!    recorded order, overwriting on a same-path conflict (later wins).
//! 4. Reset the cursor to the canonical root key.

use std::collections::BTreeMap;

use crate::message::StructureMessage;
use crate::path::PathKey;

/// The component tree's known shape as of one rush.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ComponentTreeSnapshot {
    /// Consumer cursor into the snapshot (reset to the root key on rebuild).
    pub cursor: PathKey,
    /// Path key → most recent structural record for that position.
    pub hash: BTreeMap<PathKey, StructureMessage>,
}

impl ComponentTreeSnapshot {
    /// An empty snapshot: no known nodes, cursor at the root key.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Rebuilds the snapshot for a rush from its predecessor and the rush's
    /// recorded structure messages.
    ///
    /// `fresh` must be in recorded order; when two messages in the same
    /// structural phase share a path, the later one wins.
    #[must_use]
    pub fn rebuild<'a, I>(prev: &Self, fresh: I) -> Self
    where
        I: IntoIterator<Item = &'a StructureMessage>,
    {
        let fresh: Vec<&StructureMessage> = fresh.into_iter().collect();

        let mut hash: BTreeMap<PathKey, StructureMessage> = prev
            .hash
            .iter()
            .filter(|(_, entry)| {
                !fresh
                    .iter()
                    .any(|m| m.path.is_ancestor_or_equal(&entry.path))
            })
            .map(|(key, entry)| (key.clone(), entry.clone()))
            .collect();

        for message in fresh {
            hash.insert(message.path.key(), message.clone());
        }

        Self {
            cursor: PathKey::root(),
            hash,
        }
    }
}
