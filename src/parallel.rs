// SPDX-License-Identifier: Apache-2.0
//! Parallel decomposition: turns one subtick's traversal into a sequence of
//! phases, each a batch of spacing-disjoint tasks submitted to the worker
//! pool — or falls back to the single-threaded traversal when parallel
//! dispatch is not worthwhile.

use crate::cellkind::CellKindRegistry;
use crate::grid::Grid;
use crate::mode::Mode;
use crate::registry::{SubtickDescriptor, SubtickHandle};
use crate::telemetry::TelemetrySink;
use crate::traversal::{
    sweep_neighbour_full, sweep_neighbour_row, sweep_ticked_column, sweep_ticked_full,
    sweep_tracked_column_both, sweep_tracked_full, sweep_tracked_row_both,
};
use crate::worker_pool::WorkerPool;

/// Whether a subtick with `descriptor.parallel` set should actually fan out,
/// given the grid size and pool availability. Below the cell-count
/// threshold the fan-out overhead dominates any gain; a disabled pool means
/// there is nothing to fan out to.
fn parallel_eligible(descriptor: &SubtickDescriptor, grid: &dyn Grid, pool: &dyn WorkerPool, min_cells: i64) -> bool {
    if !descriptor.parallel || pool.is_disabled() {
        return false;
    }
    let cells = i64::from(grid.width()) * i64::from(grid.height());
    cells >= min_cells
}

/// Collects the active axis indices for one strided offset phase: every
/// `offset, offset + stride, offset + 2*stride, ...` index below `total`
/// for which `is_active` holds.
fn strided_phase(total: i32, stride: i32, offset: i32, is_active: &dyn Fn(i32) -> bool) -> Vec<i32> {
    let mut indices = Vec::new();
    let mut i = offset;
    while i < total {
        if is_active(i) {
            indices.push(i);
        }
        i += stride;
    }
    indices
}

fn run_phase(
    pool: &dyn WorkerPool,
    telemetry: &dyn TelemetrySink,
    tick: u64,
    handle: SubtickHandle,
    phase_index: usize,
    indices: &[i32],
    task: &(dyn Fn(i32) + Send + Sync),
) {
    telemetry.on_phase(tick, handle, phase_index, indices.len());
    pool.run_flat(indices.len(), &|i| task(indices[i]));
}

/// Dispatches one subtick: picks parallel decomposition when eligible,
/// otherwise runs the mode's canonical single-threaded traversal.
#[allow(clippy::too_many_arguments)]
pub fn dispatch_subtick(
    grid: &dyn Grid,
    cell_kinds: &dyn CellKindRegistry,
    descriptor: &SubtickDescriptor,
    pool: &dyn WorkerPool,
    turbo: bool,
    telemetry: &dyn TelemetrySink,
    tick: u64,
    handle: SubtickHandle,
    min_parallel_cells: i64,
) {
    if !parallel_eligible(descriptor, grid, pool, min_parallel_cells) {
        match &descriptor.mode {
            Mode::Ticked => sweep_ticked_full(grid, cell_kinds, descriptor, turbo),
            Mode::Tracked => sweep_tracked_full(grid, cell_kinds, descriptor, turbo),
            Mode::Neighbour => sweep_neighbour_full(grid, cell_kinds, descriptor, turbo),
            Mode::Custom { orders } => dispatch_custom_serial(grid, cell_kinds, descriptor, orders, turbo),
        }
        return;
    }

    let stride = i32::try_from(descriptor.spacing).unwrap_or(0) + 1;
    match &descriptor.mode {
        Mode::Ticked => {
            for offset in 0..stride {
                let xs = strided_phase(grid.width(), stride, offset, &|x| grid.check_column(x));
                run_phase(pool, telemetry, tick, handle, offset as usize, &xs, &|x| {
                    sweep_ticked_column(grid, cell_kinds, descriptor, x, turbo);
                });
            }
        }
        Mode::Tracked => {
            for offset in 0..stride {
                let ys = strided_phase(grid.height(), stride, offset, &|y| grid.check_row(y));
                run_phase(pool, telemetry, tick, handle, offset as usize, &ys, &|y| {
                    sweep_tracked_row_both(grid, cell_kinds, descriptor, y, turbo);
                });
            }
            for offset in 0..stride {
                let xs = strided_phase(grid.width(), stride, offset, &|x| grid.check_column(x));
                run_phase(pool, telemetry, tick, handle, (stride + offset) as usize, &xs, &|x| {
                    sweep_tracked_column_both(grid, cell_kinds, descriptor, x, turbo);
                });
            }
        }
        Mode::Neighbour => {
            for offset in 0..stride {
                let ys = strided_phase(grid.height(), stride, offset, &|y| grid.check_row(y));
                run_phase(pool, telemetry, tick, handle, offset as usize, &ys, &|y| {
                    sweep_neighbour_row(grid, cell_kinds, descriptor, y, turbo);
                });
            }
        }
        Mode::Custom { orders } => {
            // Custom orders are caller-defined shapes; this crate only
            // guarantees the serial semantics for them (spec leaves the
            // closed set of order tags implementation-defined).
            dispatch_custom_serial(grid, cell_kinds, descriptor, orders, turbo);
        }
    }
}

fn dispatch_custom_serial(
    grid: &dyn Grid,
    cell_kinds: &dyn CellKindRegistry,
    descriptor: &SubtickDescriptor,
    orders: &[crate::mode::OrderRecord],
    turbo: bool,
) {
    use crate::mode::OrderTag;

    for order in orders {
        // Tracked steps already filter by rotation at the per-cell level, so
        // `order.rotations` only meaningfully restricts them; a ticked or
        // neighbour step runs its full sweep once regardless of
        // `order.rotations` (neither traversal filters by rotation) — a
        // caller that wants rotation-restricted custom steps should use a
        // tracked shape.
        match order.order {
            OrderTag::Ticked => sweep_ticked_full(grid, cell_kinds, descriptor, turbo),
            OrderTag::Tracked => sweep_tracked_full(grid, cell_kinds, descriptor, turbo),
            OrderTag::Neighbour => sweep_neighbour_full(grid, cell_kinds, descriptor, turbo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::{CellKindId, Rotation};
    use crate::cellkind::DefaultCellKindRegistry;
    use crate::grid::new_grid;
    use crate::ident::DefaultInterner;
    use crate::registry::SubtickRegistry;
    use crate::telemetry::NullTelemetrySink;
    use crate::worker_pool::{InlinePool, RayonPool};

    fn rotator_cb(grid: &dyn Grid, _kind: CellKindId, _sx: i32, _sy: i32, ax: i32, ay: i32, _payload: Option<&crate::cellkind::Payload>) {
        grid.rotate(ax, ay, 1);
    }

    #[test]
    fn parallel_and_serial_rotator_produce_identical_grids() {
        let size = 100;
        let rotator = CellKindId(1);
        let mover = CellKindId(2);
        let interner = DefaultInterner::new();

        let run = |pool: &dyn WorkerPool| {
            let grid = new_grid(size, size);
            for y in 0..size {
                for x in 0..size {
                    if (x + y) % 2 == 0 {
                        grid.set(x, y, rotator, Rotation::Right);
                    } else {
                        grid.set(x, y, mover, Rotation::Right);
                    }
                }
            }
            let cell_kinds = DefaultCellKindRegistry::new();
            cell_kinds.register(rotator, rotator_cb, None);
            let mut registry = SubtickRegistry::new();
            let handle = registry.add_neighbour(&interner, "core", "rotators", 1.0, 0, true);
            registry.add_cell(handle, rotator).expect("known handle");
            let descriptor = registry.descriptor(handle).expect("just inserted");

            dispatch_subtick(
                &grid,
                &cell_kinds,
                descriptor,
                pool,
                false,
                &NullTelemetrySink,
                0,
                handle,
                crate::constants::PARALLEL_MIN_CELLS,
            );

            let mut snapshot = Vec::with_capacity((size * size) as usize);
            for y in 0..size {
                for x in 0..size {
                    snapshot.push((grid.cell_kind(x, y), grid.rotation(x, y)));
                }
            }
            snapshot
        };

        let serial = run(&InlinePool);
        let parallel = run(&RayonPool);
        assert_eq!(serial, parallel);
    }

    #[test]
    fn below_threshold_grid_runs_serially_even_when_parallel_is_set() {
        let grid = new_grid(3, 3);
        let interner = DefaultInterner::new();
        let mut registry = SubtickRegistry::new();
        let handle = registry.add_ticked(&interner, "core", "t", 1.0, 0, true);
        let descriptor = registry.descriptor(handle).expect("just inserted");
        assert!(!parallel_eligible(
            descriptor,
            &grid,
            &RayonPool,
            crate::constants::PARALLEL_MIN_CELLS
        ));
    }

    proptest::proptest! {
        /// Spacing correctness (spec §8): within one strided phase, any two
        /// active task indices differ by a multiple of `spacing + 1`.
        #[test]
        fn strided_phase_indices_are_spacing_disjoint(
            total in 1i32..500,
            spacing in 0u32..12,
            offset_seed in 0u32..12,
        ) {
            let stride = i32::try_from(spacing).unwrap_or(0) + 1;
            let offset = offset_seed as i32 % stride;
            let indices = strided_phase(total, stride, offset, &|_| true);

            for &i in &indices {
                proptest::prop_assert!(i >= offset && i < total);
                proptest::prop_assert_eq!((i - offset) % stride, 0);
            }
            for window in indices.windows(2) {
                proptest::prop_assert_eq!(window[1] - window[0], stride);
            }
        }

        /// Same property, but with a sparse `is_active` predicate: the
        /// *distance* between any two surviving indices must still be a
        /// multiple of the stride, even though some strided slots are
        /// filtered out (inactive rows/columns per `checkRow`/`checkColumn`).
        #[test]
        fn strided_phase_stays_spacing_disjoint_when_sparse(
            total in 1i32..300,
            spacing in 0u32..8,
            offset_seed in 0u32..8,
            keep_every in 1i32..5,
        ) {
            let stride = i32::try_from(spacing).unwrap_or(0) + 1;
            let offset = offset_seed as i32 % stride;
            let indices = strided_phase(total, stride, offset, &|i| (i / stride.max(1)) % keep_every == 0);

            for pair in indices.iter().enumerate().flat_map(|(idx, &a)| {
                indices[idx + 1..].iter().map(move |&b| (a, b))
            }) {
                let (a, b) = pair;
                proptest::prop_assert_eq!((b - a) % stride, 0);
            }
        }
    }
}
