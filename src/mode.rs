// SPDX-License-Identifier: Apache-2.0
//! Traversal mode: the sum type a subtick descriptor carries instead of a
//! mode flag plus loosely-related per-mode fields.

use crate::cell::Rotation;

/// One of the closed set of built-in traversal strategies a
/// [`crate::mode::Mode::Custom`] order record can name. The set is
/// orthogonal to the built-in modes by construction: a custom order reuses
/// a traversal shape without re-deriving the mode dispatch around it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrderTag {
    /// Column-major, ascending-row traversal (the ticked-mode shape).
    Ticked,
    /// Rotation-facing traversal for a single rotation (the tracked-mode
    /// per-rotation shape).
    Tracked,
    /// Four-orthogonal-neighbour traversal (the neighbour-mode shape).
    Neighbour,
}

/// One step of a custom subtick's traversal: a shape plus the rotations it
/// is restricted to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderRecord {
    /// Which traversal shape this step applies.
    pub order: OrderTag,
    /// Rotations this step dispatches; a cell whose rotation is not listed
    /// is skipped during this step. Must not repeat a rotation — that would
    /// dispatch the same cell twice within one subtick.
    pub rotations: Vec<Rotation>,
}

/// Traversal mode and its mode-specific data, modeled as a sum type rather
/// than a mode tag plus an always-present (but usually unused) field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Column-major single traversal.
    Ticked,
    /// Four rotation-ordered sub-traversals in fixed order
    /// `{right, left, up, down}`.
    Tracked,
    /// Four-orthogonal-neighbour traversal.
    Neighbour,
    /// Caller-supplied ordered sequence of traversal steps.
    Custom {
        /// The ordered steps to run, in order.
        orders: Vec<OrderRecord>,
    },
}

impl Mode {
    /// Short, stable name used in telemetry and error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Ticked => "ticked",
            Self::Tracked => "tracked",
            Self::Neighbour => "neighbour",
            Self::Custom { .. } => "custom",
        }
    }
}
