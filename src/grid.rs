// SPDX-License-Identifier: Apache-2.0
//! The grid collaborator.
//!
//! The grid's storage layout and performance characteristics are explicitly
//! out of scope for this crate — a host engine supplies its own. [`Grid`]
//! captures exactly the operations the traversal engine and built-in
//! callbacks need; [`VecGrid`] is a small reference implementation used by
//! this crate's own tests and the scenarios in `tests/scenarios.rs`.
//!
//! Every [`Grid`] method takes `&self`, not `&mut self`: parallel subtick
//! tasks hold a shared reference to the grid and rely on the scheduler's
//! scheduler's spacing invariant to keep concurrent writes to disjoint cells.
//! Implementations are responsible for their own interior mutability;
//! [`VecGrid`] uses one `Mutex` per cell, which is simple and safe at the
//! cost of some lock overhead a production grid would avoid.

use std::sync::Mutex;

use crate::cell::{CellKindId, CellState, Rotation};
use crate::constants::{DEFAULT_GRID_CHUNK_SIZE, GENERATOR_OPT_BITS};

/// Reserved cell-kind id denoting an empty cell. Every in-bounds coordinate
/// has *some* cell; "nothing there" is represented as this kind, not as the
/// absence of a cell.
pub const EMPTY_KIND: CellKindId = CellKindId(0);

/// Direction argument to [`Grid::chunk_off`], mirroring the original
/// engine's `dir` parameter (`0` or `+1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChunkDir {
    /// Coordinate of the lower edge of `v`'s chunk.
    Lower,
    /// Coordinate one past the upper edge of `v`'s chunk.
    UpperExclusive,
}

/// The grid collaborator consumed by the subtick runner.
///
/// All coordinate-taking methods treat out-of-bounds `(x, y)` as an absent
/// cell (`None`/no-op/`0`), never a panic — every edge case is a silent
/// no-op.
pub trait Grid: Sync {
    /// Grid width in cells.
    fn width(&self) -> i32;
    /// Grid height in cells.
    fn height(&self) -> i32;

    /// Returns the cell kind at `(x, y)`, or `None` if out of bounds.
    fn cell_kind(&self, x: i32, y: i32) -> Option<CellKindId>;
    /// Returns the rotation at `(x, y)`, or `None` if out of bounds.
    fn rotation(&self, x: i32, y: i32) -> Option<Rotation>;
    /// Rotates the cell at `(x, y)` by `steps` quarter turns. No-op if out
    /// of bounds or the cell is [`EMPTY_KIND`].
    fn rotate(&self, x: i32, y: i32, steps: i32);

    /// Whether the cell at `(x, y)` has already been updated this tick.
    fn updated(&self, x: i32, y: i32) -> bool;
    /// Marks the cell at `(x, y)` as updated for this tick.
    fn mark_updated(&self, x: i32, y: i32);
    /// Resets the per-tick ephemeral state at `(x, y)`. No-op if out of
    /// bounds.
    fn reset_cell(&self, x: i32, y: i32);

    /// Fast "is this chunk worth visiting?" hint. `true` is always a safe
    /// (if slower) answer; `false` must only be returned for chunks with no
    /// non-empty cell.
    fn check_chunk(&self, x: i32, y: i32) -> bool;
    /// Fast "does this row contain any non-empty cell?" hint.
    fn check_row(&self, y: i32) -> bool;
    /// Fast "does this column contain any non-empty cell?" hint.
    fn check_column(&self, x: i32) -> bool;
    /// Chunk edge coordinate for `v`, per [`ChunkDir`].
    fn chunk_off(&self, v: i32, dir: ChunkDir) -> i32;

    /// Attempts to push the chain of cells starting at `(x, y)` one step in
    /// direction `rot`. `force` is a collaborator-defined push-strength
    /// hint (the reference implementation does not distinguish strengths).
    /// `pusher`, when `Some`, is the kind and rotation used to backfill the
    /// vacated origin cell — a copy of the fuel cell, not just its kind
    /// (used by the generator to emit new cells); `None` leaves the origin
    /// empty (used by plain movers).
    ///
    /// Returns the number of cells displaced; `0` means the push was
    /// blocked and the grid was not mutated.
    fn push(&self, x: i32, y: i32, rot: Rotation, force: i32, pusher: Option<(CellKindId, Rotation)>) -> i32;

    /// The coordinate one step in front of `(x, y)` along `rot`.
    fn front(&self, x: i32, y: i32, rot: Rotation) -> (i32, i32) {
        let (dx, dy) = rot.unit_offset();
        (x + dx, y + dy)
    }

    /// The coordinate `delta` steps along `rot` from `(x, y)` (negative
    /// `delta` moves backward, i.e. toward `shift(x, y, rot, -1)` for "the
    /// cell behind").
    fn shift(&self, x: i32, y: i32, rot: Rotation, delta: i32) -> (i32, i32) {
        let (dx, dy) = rot.unit_offset();
        (x + dx * delta, y + dy * delta)
    }

    /// Reads optimization bit `bit` at `(x, y)`. `false` if out of bounds
    /// or `bit >= opt_size()`.
    fn get_optimization(&self, x: i32, y: i32, bit: u8) -> bool;
    /// Writes optimization bit `bit` at `(x, y)`. No-op if out of bounds.
    fn set_optimization(&self, x: i32, y: i32, bit: u8, value: bool);
    /// Number of optimization bytes reserved per cell.
    fn opt_size(&self) -> usize;

    /// Whether a generator whose "fuel" cell is `back_kind` may generate a
    /// new cell in front of itself. The reference policy forbids
    /// generating from an empty back cell; hosts may layer richer recipe
    /// rules on top.
    fn can_generate(
        &self,
        back_kind: CellKindId,
        _back_x: i32,
        _back_y: i32,
        _generator_kind: CellKindId,
        _x: i32,
        _y: i32,
        _rot: Rotation,
    ) -> bool {
        back_kind != EMPTY_KIND
    }
}

struct Slot {
    kind: CellKindId,
    rotation: Rotation,
    state: CellState,
}

/// Minimal reference [`Grid`] implementation: a flat row-major buffer of
/// cells, each behind its own `Mutex` so concurrent subtick tasks can write
/// disjoint cells through a shared reference. Intended for this crate's own
/// tests and small demos, not as a production-grade grid.
pub struct VecGrid {
    width: i32,
    height: i32,
    chunk_size: i32,
    opt_size: usize,
    cells: Vec<Mutex<Slot>>,
}

impl VecGrid {
    /// Creates a `width x height` grid, every cell initialized to
    /// [`EMPTY_KIND`] facing [`Rotation::Right`], with `opt_size` bytes of
    /// optimization scratch per cell (use at least
    /// [`crate::constants::GENERATOR_OPT_BITS`] if the built-in generator
    /// will run on this grid).
    #[must_use]
    pub fn new(width: i32, height: i32, opt_size: usize) -> Self {
        let count = (width.max(0) as usize) * (height.max(0) as usize);
        let cells = (0..count)
            .map(|_| {
                Mutex::new(Slot {
                    kind: EMPTY_KIND,
                    rotation: Rotation::Right,
                    state: CellState::new(0, 0, Rotation::Right, opt_size),
                })
            })
            .collect();
        Self {
            width,
            height,
            chunk_size: DEFAULT_GRID_CHUNK_SIZE,
            opt_size,
            cells,
        }
    }

    /// Overrides the chunk size used by the activity hints (default
    /// [`DEFAULT_GRID_CHUNK_SIZE`]).
    #[must_use]
    pub fn with_chunk_size(mut self, chunk_size: i32) -> Self {
        assert!(chunk_size > 0, "chunk_size must be positive");
        self.chunk_size = chunk_size;
        self
    }

    /// Places a cell of `kind` facing `rotation` at `(x, y)`. Panics if out
    /// of bounds — this is a test/setup helper, not a hot-path method.
    pub fn set(&self, x: i32, y: i32, kind: CellKindId, rotation: Rotation) {
        let idx = self.index(x, y).expect("set: coordinate out of bounds");
        let mut slot = self.cells[idx].lock().unwrap_or_else(|e| e.into_inner());
        slot.kind = kind;
        slot.rotation = rotation;
        slot.state = CellState::new(x, y, rotation, self.opt_size);
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width || y >= self.height {
            return None;
        }
        Some((y * self.width + x) as usize)
    }

    fn chunk_bounds(&self, origin: i32, len: i32) -> (i32, i32) {
        let lo = (origin.div_euclid(self.chunk_size)) * self.chunk_size;
        let hi = (lo + self.chunk_size).min(len);
        (lo.max(0), hi)
    }

    fn chain_walk(&self, x: i32, y: i32, rot: Rotation) -> Option<(Vec<(i32, i32)>, (i32, i32))> {
        let (dx, dy) = rot.unit_offset();
        let mut chain = Vec::new();
        let (mut cx, mut cy) = (x, y);
        loop {
            let idx = self.index(cx, cy)?;
            let kind = self.cells[idx].lock().unwrap_or_else(|e| e.into_inner()).kind;
            if kind == EMPTY_KIND {
                return Some((chain, (cx, cy)));
            }
            chain.push((cx, cy));
            cx += dx;
            cy += dy;
            if chain.len() as i64 > i64::from(self.width.max(self.height)) + 1 {
                // Defensive bound; a well-formed grid never reaches this.
                return None;
            }
        }
    }
}

impl Grid for VecGrid {
    fn width(&self) -> i32 {
        self.width
    }

    fn height(&self) -> i32 {
        self.height
    }

    fn cell_kind(&self, x: i32, y: i32) -> Option<CellKindId> {
        let idx = self.index(x, y)?;
        Some(self.cells[idx].lock().unwrap_or_else(|e| e.into_inner()).kind)
    }

    fn rotation(&self, x: i32, y: i32) -> Option<Rotation> {
        let idx = self.index(x, y)?;
        Some(self.cells[idx].lock().unwrap_or_else(|e| e.into_inner()).rotation)
    }

    fn rotate(&self, x: i32, y: i32, steps: i32) {
        let Some(idx) = self.index(x, y) else { return };
        let mut slot = self.cells[idx].lock().unwrap_or_else(|e| e.into_inner());
        if slot.kind == EMPTY_KIND {
            return;
        }
        slot.rotation = slot.rotation.rotate(steps);
    }

    fn updated(&self, x: i32, y: i32) -> bool {
        let Some(idx) = self.index(x, y) else { return false };
        self.cells[idx].lock().unwrap_or_else(|e| e.into_inner()).state.updated
    }

    fn mark_updated(&self, x: i32, y: i32) {
        let Some(idx) = self.index(x, y) else { return };
        self.cells[idx].lock().unwrap_or_else(|e| e.into_inner()).state.updated = true;
    }

    fn reset_cell(&self, x: i32, y: i32) {
        let Some(idx) = self.index(x, y) else { return };
        let mut slot = self.cells[idx].lock().unwrap_or_else(|e| e.into_inner());
        let rotation = slot.rotation;
        slot.state.reset(x, y, rotation);
    }

    fn check_chunk(&self, x: i32, y: i32) -> bool {
        let (x0, x1) = self.chunk_bounds(x, self.width);
        let (y0, y1) = self.chunk_bounds(y, self.height);
        for cy in y0..y1 {
            for cx in x0..x1 {
                if self.cell_kind(cx, cy).is_some_and(|k| k != EMPTY_KIND) {
                    return true;
                }
            }
        }
        false
    }

    fn check_row(&self, y: i32) -> bool {
        (0..self.width).any(|x| self.cell_kind(x, y).is_some_and(|k| k != EMPTY_KIND))
    }

    fn check_column(&self, x: i32) -> bool {
        (0..self.height).any(|y| self.cell_kind(x, y).is_some_and(|k| k != EMPTY_KIND))
    }

    fn chunk_off(&self, v: i32, dir: ChunkDir) -> i32 {
        let lo = v.div_euclid(self.chunk_size) * self.chunk_size;
        match dir {
            ChunkDir::Lower => lo,
            ChunkDir::UpperExclusive => lo + self.chunk_size,
        }
    }

    fn push(&self, x: i32, y: i32, rot: Rotation, _force: i32, pusher: Option<(CellKindId, Rotation)>) -> i32 {
        // Starting cell empty: only meaningful for a pusher backfill (the
        // generator emitting directly into open space in front of it).
        if self.cell_kind(x, y) == Some(EMPTY_KIND) {
            return match pusher {
                Some((kind, rotation)) if self.index(x, y).is_some() => {
                    self.set(x, y, kind, rotation);
                    1
                }
                _ => 0,
            };
        }

        let Some((chain, empty_at)) = self.chain_walk(x, y, rot) else {
            return 0; // ran off the grid edge before finding room: blocked
        };
        if chain.is_empty() {
            return 0;
        }

        // Shift every cell in the chain one step forward, last first, then
        // backfill the origin.
        let mut prev = empty_at;
        for &(cx, cy) in chain.iter().rev() {
            let (kind, rotation) = {
                let idx = self.index(cx, cy).expect("chain coordinate is in bounds");
                let slot = self.cells[idx].lock().unwrap_or_else(|e| e.into_inner());
                (slot.kind, slot.rotation)
            };
            self.set(prev.0, prev.1, kind, rotation);
            prev = (cx, cy);
        }
        match pusher {
            Some((kind, rotation)) => self.set(x, y, kind, rotation),
            None => self.set(x, y, EMPTY_KIND, Rotation::Right),
        }
        chain.len() as i32
    }

    fn get_optimization(&self, x: i32, y: i32, bit: u8) -> bool {
        let Some(idx) = self.index(x, y) else { return false };
        let slot = self.cells[idx].lock().unwrap_or_else(|e| e.into_inner());
        slot.state
            .optimization
            .get(bit as usize)
            .is_some_and(|&b| b != 0)
    }

    fn set_optimization(&self, x: i32, y: i32, bit: u8, value: bool) {
        let Some(idx) = self.index(x, y) else { return };
        let mut slot = self.cells[idx].lock().unwrap_or_else(|e| e.into_inner());
        if let Some(slot_bit) = slot.state.optimization.get_mut(bit as usize) {
            *slot_bit = u8::from(value);
        }
    }

    fn opt_size(&self) -> usize {
        self.opt_size
    }
}

/// Convenience constructor for a grid large enough to host the built-in
/// generator's optimization bits.
#[must_use]
pub fn new_grid(width: i32, height: i32) -> VecGrid {
    VecGrid::new(width, height, GENERATOR_OPT_BITS)
}
