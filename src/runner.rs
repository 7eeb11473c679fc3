// SPDX-License-Identifier: Apache-2.0
//! Subtick runner: owns the subtick registry and drives one `run()` per
//! engine tick against an externally-owned grid.

use std::sync::Arc;

use crate::cellkind::CellKindRegistry;
use crate::constants::PARALLEL_MIN_CELLS;
use crate::grid::{ChunkDir, Grid};
use crate::parallel::dispatch_subtick;
use crate::registry::SubtickRegistry;
use crate::telemetry::{null_sink, TelemetrySink};
use crate::worker_pool::{InlinePool, WorkerPool};

/// Tunable knobs for a [`SubtickRunner`], built in-process with chained
/// setters — there is no CLI or config-file layer for this crate, only a
/// plain value the embedding engine constructs however it likes.
#[derive(Clone)]
pub struct SchedulerConfig {
    turbo: bool,
    parallel_min_cells: i64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            turbo: false,
            parallel_min_cells: PARALLEL_MIN_CELLS,
        }
    }
}

impl SchedulerConfig {
    /// Starts from the safer default: `turbo` off, standard parallel
    /// threshold.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the turbo flag. Turbo drops the single-update-per-tick
    /// guarantee and the per-tick reset in exchange for speed; default is
    /// off (the safer behavior).
    #[must_use]
    pub const fn with_turbo(mut self, turbo: bool) -> Self {
        self.turbo = turbo;
        self
    }

    /// Overrides the grid-size threshold below which parallel dispatch is
    /// skipped even when a subtick requests it.
    #[must_use]
    pub const fn with_parallel_min_cells(mut self, parallel_min_cells: i64) -> Self {
        self.parallel_min_cells = parallel_min_cells;
        self
    }

    /// Whether turbo mode is enabled.
    #[must_use]
    pub const fn turbo(&self) -> bool {
        self.turbo
    }
}

/// Drives subtick dispatch for one engine. Owns the subtick registry and
/// the handful of collaborators a tick needs (cell-kind lookup, worker
/// pool, telemetry sink); the grid itself is supplied fresh to every
/// `run()` call, since its lifetime is the embedding engine's, not the
/// runner's.
pub struct SubtickRunner {
    registry: SubtickRegistry,
    cell_kinds: Arc<dyn CellKindRegistry>,
    pool: Arc<dyn WorkerPool>,
    telemetry: Arc<dyn TelemetrySink>,
    config: SchedulerConfig,
    tick: u64,
}

impl SubtickRunner {
    /// Creates a runner over `registry` and `cell_kinds`, defaulting to the
    /// sequential [`InlinePool`] and a silent telemetry sink.
    #[must_use]
    pub fn new(registry: SubtickRegistry, cell_kinds: Arc<dyn CellKindRegistry>, config: SchedulerConfig) -> Self {
        Self {
            registry,
            cell_kinds,
            pool: Arc::new(InlinePool),
            telemetry: null_sink(),
            config,
            tick: 0,
        }
    }

    /// Replaces the worker pool (e.g. with [`crate::worker_pool::RayonPool`]
    /// to enable real fan-out).
    #[must_use]
    pub fn with_pool(mut self, pool: Arc<dyn WorkerPool>) -> Self {
        self.pool = pool;
        self
    }

    /// Replaces the telemetry sink.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: Arc<dyn TelemetrySink>) -> Self {
        self.telemetry = telemetry;
        self
    }

    /// Read-only access to the subtick registry, e.g. for `find`/`add_cell`
    /// calls after construction.
    pub fn registry(&self) -> &SubtickRegistry {
        &self.registry
    }

    /// Mutable access to the subtick registry.
    pub fn registry_mut(&mut self) -> &mut SubtickRegistry {
        &mut self.registry
    }

    /// How many ticks this runner has completed.
    #[must_use]
    pub const fn tick(&self) -> u64 {
        self.tick
    }

    /// Advances the simulation by one tick: resets per-cell ephemeral state
    /// (skipped entirely in turbo builds), then dispatches every subtick in
    /// priority order. Never fails — every edge case encountered while
    /// visiting cells is a silent no-op.
    pub fn run(&mut self, grid: &dyn Grid) {
        self.telemetry.on_run_start(self.tick);

        if !self.config.turbo {
            reset_all(grid, self.pool.as_ref());
        }

        for (handle, descriptor) in self.registry.iter_in_priority_order() {
            self.telemetry.on_subtick_start(self.tick, handle, &descriptor.display_name);
            dispatch_subtick(
                grid,
                self.cell_kinds.as_ref(),
                descriptor,
                self.pool.as_ref(),
                self.config.turbo,
                self.telemetry.as_ref(),
                self.tick,
                handle,
                self.config.parallel_min_cells,
            );
            self.telemetry.on_subtick_end(self.tick, handle, 0);
        }

        self.telemetry.on_run_end(self.tick);
        self.tick += 1;
    }
}

fn reset_column(grid: &dyn Grid, x: i32) {
    let height = grid.height();
    let mut y = 0;
    while y < height {
        if !grid.check_chunk(x, y) {
            y = grid.chunk_off(y, ChunkDir::UpperExclusive) - 1;
        } else {
            grid.reset_cell(x, y);
        }
        y += 1;
    }
}

/// Resets per-cell ephemeral state for the whole grid, one task per active
/// column — the same decomposition shape as ticked mode with `spacing=0`.
fn reset_all(grid: &dyn Grid, pool: &dyn WorkerPool) {
    let width = grid.width();
    let columns: Vec<i32> = (0..width).filter(|&x| grid.check_column(x)).collect();
    pool.run_flat(columns.len(), &|i| reset_column(grid, columns[i]));
}
