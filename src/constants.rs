// SPDX-License-Identifier: Apache-2.0
//! Tunable constants shared across the scheduler.

/// Default chunk edge length used by [`crate::grid::VecGrid`]'s activity
/// hints (`tsc_gridChunkSize` in the original engine).
pub const DEFAULT_GRID_CHUNK_SIZE: i32 = 16;

/// Below this many total cells, parallel dispatch is disabled: the fan-out
/// overhead dominates any gain.
pub const PARALLEL_MIN_CELLS: i64 = 10_000;

/// Number of generator optimization bits reserved per cell (one per
/// rotation), matching `builtin.optimizations.gens[rot]` in the original.
pub const GENERATOR_OPT_BITS: usize = 4;
