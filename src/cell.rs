// SPDX-License-Identifier: Apache-2.0
//! Cell-level types: rotation, cell-kind identity, and the per-cell
//! ephemeral state the runner resets each tick.

/// A cell's facing direction. The numeric convention (0=right, 1=down,
/// 2=left, 3=up) matches the original engine's `tsc_cell_getRotation`
/// values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Rotation {
    /// Facing right (+x).
    Right = 0,
    /// Facing down (+y).
    Down = 1,
    /// Facing left (-x).
    Left = 2,
    /// Facing up (-y).
    Up = 3,
}

impl Rotation {
    /// All four rotations in the tracked-mode scan order `{0, 2, 3, 1}`
    /// (right, left, up, down) — the order that makes push-based movers
    /// deterministic.
    pub const TRACKED_ORDER: [Rotation; 4] =
        [Rotation::Right, Rotation::Left, Rotation::Up, Rotation::Down];

    /// Converts a raw `0..=3` rotation byte, as stored on a cell, into a
    /// [`Rotation`]. Returns `None` for out-of-range values.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Right),
            1 => Some(Self::Down),
            2 => Some(Self::Left),
            3 => Some(Self::Up),
            _ => None,
        }
    }

    /// Raw `0..=3` byte representation.
    #[must_use]
    pub const fn raw(self) -> u8 {
        self as i8 as u8
    }

    /// Rotates clockwise by one quarter turn (right -> down -> left -> up -> right).
    #[must_use]
    pub const fn clockwise(self) -> Self {
        match self {
            Self::Right => Self::Down,
            Self::Down => Self::Left,
            Self::Left => Self::Up,
            Self::Up => Self::Right,
        }
    }

    /// Rotates counter-clockwise by one quarter turn.
    #[must_use]
    pub const fn counter_clockwise(self) -> Self {
        match self {
            Self::Right => Self::Up,
            Self::Up => Self::Left,
            Self::Left => Self::Down,
            Self::Down => Self::Right,
        }
    }

    /// Rotates by `steps` quarter turns; `steps` may be negative.
    #[must_use]
    pub fn rotate(self, steps: i32) -> Self {
        let current = i32::from(self.raw());
        let next = (current + steps).rem_euclid(4);
        Self::from_raw(next as u8).unwrap_or(self)
    }

    /// The `(dx, dy)` unit offset this rotation points toward.
    #[must_use]
    pub const fn unit_offset(self) -> (i32, i32) {
        match self {
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
            Self::Up => (0, -1),
        }
    }
}

/// Opaque identifier for a registered cell kind. Equality is by identity;
/// the registry that allocates these is an external collaborator
/// (`CellKindRegistry`), so `tickgrid` only needs a small `Copy` handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellKindId(pub u32);

/// Per-cell ephemeral state the scheduler owns and resets every tick.
///
/// The persistent parts of a cell (its kind, its rotation, any payload) are
/// owned by the external [`crate::grid::Grid`] implementation; `CellState`
/// is only the bookkeeping the scheduler itself needs.
#[derive(Debug, Clone)]
pub struct CellState {
    /// Set once this cell's update callback has fired during the current
    /// `run()`. Cleared by the per-tick reset. Ignored entirely in turbo
    /// builds (see [`crate::runner::SchedulerConfig::turbo`]).
    pub updated: bool,
    /// Interpolation anchor: x at the start of the tick.
    pub lx: i32,
    /// Interpolation anchor: y at the start of the tick.
    pub ly: i32,
    /// Interpolation anchor: rotation at the start of the tick.
    pub rot_data: Rotation,
    /// Per-cell optimization scratch bits (generator "blocked" propagation
    /// and any bits a host engine's own cell kinds choose to use).
    pub optimization: Vec<u8>,
}

impl CellState {
    /// Creates a fresh `CellState` at `(x, y)` facing `rotation`, with
    /// `opt_size` optimization bytes.
    #[must_use]
    pub fn new(x: i32, y: i32, rotation: Rotation, opt_size: usize) -> Self {
        Self {
            updated: false,
            lx: x,
            ly: y,
            rot_data: rotation,
            optimization: vec![0; opt_size],
        }
    }

    /// Resets the ephemeral fields at the start of a tick.
    pub fn reset(&mut self, x: i32, y: i32, rotation: Rotation) {
        self.updated = false;
        self.lx = x;
        self.ly = y;
        self.rot_data = rotation;
        self.optimization.iter_mut().for_each(|b| *b = 0);
    }
}
