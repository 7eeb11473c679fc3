// SPDX-License-Identifier: Apache-2.0
//! tickgrid: deterministic, rotation-sensitive subtick scheduler for 2-D
//! cellular-automaton grids.
//!
//! A *tick* advances the simulation by running an ordered sequence of
//! *subticks* (see [`registry::SubtickRegistry`]). Each subtick updates a
//! subset of cell kinds using one of four traversal strategies
//! ([`mode::Mode`]), optionally decomposed into spacing-safe parallel tasks
//! (`parallel`) dispatched through a [`worker_pool::WorkerPool`].
//!
//! The grid, the cell-kind catalog, and the worker pool are external
//! collaborators: this crate defines the traits they satisfy
//! ([`grid::Grid`], [`cellkind::CellKindRegistry`], [`worker_pool::WorkerPool`])
//! plus a minimal reference implementation of each, and ships the traversal
//! engine and the three built-in cell behaviors
//! ([`builtins::bootstrap`]) that make the scheduler runnable on its own.
#![forbid(unsafe_code)]
#![deny(missing_docs, rust_2018_idioms, unused_must_use)]
#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo,
    clippy::unimplemented,
    clippy::dbg_macro
)]
#![allow(
    clippy::must_use_candidate,
    clippy::return_self_not_must_use,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions,
    clippy::use_self,
    clippy::multiple_crate_versions
)]

/// Built-in cell behaviors: mover, generator, clockwise/counter-clockwise
/// rotator, and the bootstrap that wires them into a registry.
pub mod builtins;
/// Cell-level types: rotation, cell-kind identity, per-cell ephemeral state.
pub mod cell;
/// Cell-kind registry collaborator.
pub mod cellkind;
mod constants;
/// Configuration-time errors.
pub mod error;
/// Grid collaborator.
pub mod grid;
/// String interning for subtick names.
pub mod ident;
/// Traversal mode sum type.
pub mod mode;
/// Parallel decomposition over the traversal primitives.
pub mod parallel;
/// Subtick registry: descriptors, handles, priority ordering.
pub mod registry;
/// Subtick runner: ties the registry, collaborators, and config together.
pub mod runner;
/// Telemetry hooks for the subtick runner.
pub mod telemetry;
/// Single-axis traversal primitives.
pub mod traversal;
/// Worker pool collaborator.
pub mod worker_pool;

pub use builtins::{bootstrap, BuiltinKinds, BuiltinSubticks};
pub use cell::{CellKindId, CellState, Rotation};
pub use cellkind::{CellKindRegistry, CellKindTable, DefaultCellKindRegistry, Payload, UpdateFn};
pub use constants::{DEFAULT_GRID_CHUNK_SIZE, GENERATOR_OPT_BITS, PARALLEL_MIN_CELLS};
pub use error::SchedulerError;
pub use grid::{new_grid, ChunkDir, Grid, VecGrid, EMPTY_KIND};
pub use ident::{pad_with_mod_id, DefaultInterner, Interner, Symbol};
pub use mode::{Mode, OrderRecord, OrderTag};
pub use registry::{SubtickDescriptor, SubtickHandle, SubtickRegistry};
pub use runner::{SchedulerConfig, SubtickRunner};
pub use telemetry::{null_sink, NullTelemetrySink, StdoutJsonlSink, TelemetrySink};
pub use worker_pool::{InlinePool, RayonPool, WorkerPool};
