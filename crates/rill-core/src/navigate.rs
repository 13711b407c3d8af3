// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

//! Selection navigation over already-ingested history.
//!
//! Every function here is a pure read of the aggregate: it computes new
//! selection fields and reports them as a [`NavOutcome`]. Writing the result
//! back goes through the store's patch channel
//! ([`crate::store::DevtoolStore::apply_selection`]); navigation itself
//! never mutates structural or emission history.
//!
//! Two navigation families exist:
//!
//! - **By id**: ±1 on the raw emission id, restricted to the selection's
//!   rush and its adjacent rush.
//! - **Similar**: the nearest emission before/after the selection observed
//!   at the same tree position with the same combinator and component
//!   identity. The search walks rush by rush; a rush-boundary crossing
//!   whose structural phase rebuilt the selected node's subtree
//!   (ancestor-or-equal path match) invalidates the notion of "same node"
//!   beyond that point, and the search fails.
//!
//! "Not found" is a value ([`NavOutcome::Unchanged`]), never an error.

use crate::ident::{RushIndex, TraceId};
use crate::message::EmissionMessage;
use crate::path::TracePath;
use crate::store::DevtoolState;

/// New values for the selection fields after a successful move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SelectionFields {
    /// The emission id now selected.
    pub primary_selection: TraceId,
    /// The rush that emission belongs to.
    pub selection_rush_index: RushIndex,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NavOutcome {
    /// The selection moved; apply these fields through the store.
    Moved(SelectionFields),
    /// No valid target was found; the selection stands as it was.
    Unchanged,
}

/// Selects an emission by id, resolving the rush it was recorded in.
///
/// This is the entry point for consumers establishing an initial selection
/// (e.g. a click on a log row). Unknown ids leave the selection unchanged.
#[must_use]
pub fn select(state: &DevtoolState, id: TraceId) -> NavOutcome {
    state
        .rush_of_emission(id)
        .map_or(NavOutcome::Unchanged, |rush| {
            NavOutcome::Moved(SelectionFields {
                primary_selection: id,
                selection_rush_index: rush,
            })
        })
}

/// Moves the selection to the emission with the next raw id.
///
/// The candidate id is looked up in the selection rush's emission list
/// first, then in the next rush's; anywhere else it is a no-op.
#[must_use]
pub fn next_by_id(state: &DevtoolState) -> NavOutcome {
    let Some(selected) = state.primary_selection else {
        return NavOutcome::Unchanged;
    };
    let Some(candidate) = selected.successor() else {
        return NavOutcome::Unchanged;
    };
    by_id_in_adjacent_rushes(state, candidate, state.selection_rush_index.checked_add(1))
}

/// Moves the selection to the emission with the previous raw id.
///
/// A selection at id zero has no predecessor and the call is a no-op.
#[must_use]
pub fn previous_by_id(state: &DevtoolState) -> NavOutcome {
    let Some(selected) = state.primary_selection else {
        return NavOutcome::Unchanged;
    };
    let Some(candidate) = selected.predecessor() else {
        return NavOutcome::Unchanged;
    };
    by_id_in_adjacent_rushes(state, candidate, state.selection_rush_index.checked_sub(1))
}

/// Looks a candidate id up in the selection rush, then one adjacent rush.
fn by_id_in_adjacent_rushes(
    state: &DevtoolState,
    candidate: TraceId,
    adjacent: Option<RushIndex>,
) -> NavOutcome {
    let current = state.selection_rush_index;
    if rush_contains(state, current, candidate) {
        return NavOutcome::Moved(SelectionFields {
            primary_selection: candidate,
            selection_rush_index: current,
        });
    }
    if let Some(rush) = adjacent {
        if rush_contains(state, rush, candidate) {
            return NavOutcome::Moved(SelectionFields {
                primary_selection: candidate,
                selection_rush_index: rush,
            });
        }
    }
    NavOutcome::Unchanged
}

fn rush_contains(state: &DevtoolState, rush: RushIndex, id: TraceId) -> bool {
    state
        .emission_traces
        .get(&rush)
        .is_some_and(|ids| ids.contains(&id))
}

/// Moves the selection forward to the nearest similar emission.
///
/// Scans emission ids strictly after the selection, rush by rush. Crossing
/// into rush `r` consults rush `r`'s structural phase: if it rebuilt the
/// selected node's subtree, the search fails and the selection stands.
#[must_use]
pub fn next_similar(state: &DevtoolState) -> NavOutcome {
    let Some((selected_id, selected)) = current_selection(state) else {
        return NavOutcome::Unchanged;
    };
    let start = state.selection_rush_index;

    for rush in start..=state.current_rush_index {
        if rush > start && boundary_invalidates(state, rush, &selected.path) {
            return NavOutcome::Unchanged;
        }
        let Some(ids) = state.emission_traces.get(&rush) else {
            continue;
        };
        for id in ids {
            if rush == start && *id <= selected_id {
                continue;
            }
            if is_similar(state, *id, selected) {
                return NavOutcome::Moved(SelectionFields {
                    primary_selection: *id,
                    selection_rush_index: rush,
                });
            }
        }
    }
    NavOutcome::Unchanged
}

/// Moves the selection backward to the nearest similar emission.
///
/// Mirror image of [`next_similar`]: the boundary between rush `r` and rush
/// `r-1` carries rush `r`'s structural phase, so stepping back across it
/// consults rush `r`'s structure messages.
#[must_use]
pub fn previous_similar(state: &DevtoolState) -> NavOutcome {
    let Some((selected_id, selected)) = current_selection(state) else {
        return NavOutcome::Unchanged;
    };
    let start = state.selection_rush_index;

    for rush in (0..=start).rev() {
        if rush < start && boundary_invalidates(state, rush + 1, &selected.path) {
            return NavOutcome::Unchanged;
        }
        let Some(ids) = state.emission_traces.get(&rush) else {
            continue;
        };
        for id in ids.iter().rev() {
            if rush == start && *id >= selected_id {
                continue;
            }
            if is_similar(state, *id, selected) {
                return NavOutcome::Moved(SelectionFields {
                    primary_selection: *id,
                    selection_rush_index: rush,
                });
            }
        }
    }
    NavOutcome::Unchanged
}

/// Resolves the selected emission, if there is one.
fn current_selection(state: &DevtoolState) -> Option<(TraceId, &EmissionMessage)> {
    let id = state.primary_selection?;
    state.emission_traces_by_id.get(&id).map(|m| (id, m))
}

/// True if the rush's structural phase touched the selected subtree.
fn boundary_invalidates(state: &DevtoolState, rush: RushIndex, selected_path: &TracePath) -> bool {
    state
        .structure_messages_for_rush(rush)
        .any(|m| m.path.is_ancestor_or_equal(selected_path))
}

/// Same tree position, combinator identity, and component identity.
fn is_similar(state: &DevtoolState, candidate: TraceId, selected: &EmissionMessage) -> bool {
    state.emission_traces_by_id.get(&candidate).is_some_and(|c| {
        c.path == selected.path
            && c.combinator_name == selected.combinator_name
            && c.component_name == selected.component_name
    })
}
