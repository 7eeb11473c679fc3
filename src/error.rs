// SPDX-License-Identifier: Apache-2.0
//! Configuration-time errors.
//!
//! The scheduler's hot path (`SubtickRunner::run`) never fails — every edge
//! case encountered while visiting cells is a silent no-op. The errors below
//! are raised only while *building* a [`crate::registry::SubtickRegistry`],
//! i.e. programmer mistakes caught at setup time, not simulation-time
//! conditions.

use thiserror::Error;

/// Errors raised while registering subticks or attaching cell kinds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// `addCustom` was called with an empty order list; a custom subtick
    /// with no traversal steps can never dispatch a cell, which is almost
    /// always a configuration mistake.
    #[error("custom subtick {name:?} was registered with an empty order list")]
    EmptyCustomOrder {
        /// The (unpadded) name the caller passed to `addCustom`.
        name: String,
    },

    /// `addCell` referenced a handle that was never returned by this
    /// registry (e.g. one from a different `SubtickRegistry` instance).
    #[error("subtick handle {0:?} is not known to this registry")]
    UnknownHandle(crate::registry::SubtickHandle),

    /// A custom order record listed the same rotation more than once,
    /// which would cause the order's cells to be visited twice within a
    /// single subtick, violating the single-update-per-tick invariant.
    #[error("custom order listed rotation {0:?} more than once")]
    DuplicateRotationInOrder(crate::cell::Rotation),
}
