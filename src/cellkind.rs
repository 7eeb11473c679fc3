// SPDX-License-Identifier: Apache-2.0
//! Cell-kind registry collaborator.
//!
//! Maps a [`CellKindId`] to its update callback and opaque payload. The
//! registry that owns cell-kind authoring (adding new kinds, assigning
//! behavior, persistence of kind metadata) is out of scope here; this module
//! only models the lookup contract the subtick runner dispatches through,
//! plus a small in-memory reference implementation.

use std::any::Any;
use std::sync::{Arc, RwLock};

use rustc_hash::FxHashMap;

use crate::cell::CellKindId;
use crate::grid::Grid;

/// Opaque per-kind payload handed back to the update callback untouched.
/// Using `Arc<dyn Any>` rather than a closure keeps callbacks plain function
/// pointers, which is what determinism across builds and platforms wants:
/// no captured environment that could vary run to run.
pub type Payload = Arc<dyn Any + Send + Sync>;

/// An update callback: invoked with the grid, the dispatching cell kind, the
/// source coordinate `(sx, sy)`, the anchor coordinate `(ax, ay)` (equal to
/// `(sx, sy)` for every mode except neighbour), and the kind's payload.
///
/// A plain function pointer, not a closure, so callbacks cannot smuggle
/// per-call captured state into the hot path.
pub type UpdateFn = fn(&dyn Grid, CellKindId, i32, i32, i32, i32, Option<&Payload>);

/// The dispatch record for one cell kind.
#[derive(Clone)]
pub struct CellKindTable {
    /// The kind this table dispatches for.
    pub id: CellKindId,
    /// The function invoked when a cell of this kind is visited.
    pub update: UpdateFn,
    /// Opaque payload passed through to `update` untouched.
    pub payload: Option<Payload>,
}

/// The cell-kind registry collaborator.
pub trait CellKindRegistry: Send + Sync {
    /// Idempotently ensures a dispatch record exists for `id`, setting its
    /// callback and payload. Calling this again for the same `id` replaces
    /// the previous record.
    fn register(&self, id: CellKindId, update: UpdateFn, payload: Option<Payload>);

    /// Looks up the dispatch record for `id`, if any kind was registered.
    fn table(&self, id: CellKindId) -> Option<CellKindTable>;
}

/// Reference [`CellKindRegistry`]: an `FxHashMap` behind a `RwLock`.
#[derive(Default)]
pub struct DefaultCellKindRegistry {
    tables: RwLock<FxHashMap<CellKindId, CellKindTable>>,
}

impl DefaultCellKindRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl CellKindRegistry for DefaultCellKindRegistry {
    fn register(&self, id: CellKindId, update: UpdateFn, payload: Option<Payload>) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables.insert(id, CellKindTable { id, update, payload });
    }

    fn table(&self, id: CellKindId) -> Option<CellKindTable> {
        self.tables
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&id)
            .cloned()
    }
}
