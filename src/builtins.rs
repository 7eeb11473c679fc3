// SPDX-License-Identifier: Apache-2.0
//! Built-in update callbacks: mover, generator, and the two rotators.
//!
//! These are the only cell behaviors this crate ships — the full cell-kind
//! catalog is a host concern. [`bootstrap`] wires the four callbacks into a
//! [`crate::cellkind::CellKindRegistry`] and registers the three subticks
//! (`generators`, `rotators`, `movers`) that dispatch them, in the priority
//! order that makes "generate, then rotate, then move" the effective per-tick
//! sequence.

use crate::cell::CellKindId;
use crate::cellkind::{CellKindRegistry, Payload, UpdateFn};
use crate::constants::GENERATOR_OPT_BITS;
use crate::error::SchedulerError;
use crate::grid::Grid;
use crate::ident::Interner;
use crate::registry::{SubtickHandle, SubtickRegistry};

/// Priority assigned to the built-in `generators` subtick.
pub const GENERATORS_PRIORITY: f64 = 1.0;
/// Priority assigned to the built-in `rotators` subtick.
pub const ROTATORS_PRIORITY: f64 = 2.0;
/// Priority assigned to the built-in `movers` subtick.
pub const MOVERS_PRIORITY: f64 = 3.0;

/// Cell-kind identifiers a host assigns to the four built-in behaviors.
/// Kind allocation itself is an external collaborator concern; this crate
/// only needs to know which ids to dispatch its callbacks for.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinKinds {
    /// Kind id driven by the mover callback.
    pub mover: CellKindId,
    /// Kind id driven by the generator callback.
    pub generator: CellKindId,
    /// Kind id driven by the clockwise rotator callback.
    pub rotator_cw: CellKindId,
    /// Kind id driven by the counter-clockwise rotator callback.
    pub rotator_ccw: CellKindId,
}

/// Handles for the three bootstrap subticks, in dispatch (priority) order.
#[derive(Debug, Clone, Copy)]
pub struct BuiltinSubticks {
    /// `"generators"`, priority 1.0, tracked, parallel.
    pub generators: SubtickHandle,
    /// `"rotators"`, priority 2.0, neighbour, parallel.
    pub rotators: SubtickHandle,
    /// `"movers"`, priority 3.0, tracked, parallel.
    pub movers: SubtickHandle,
}

/// Plain push, no pusher cell, force 0. Ignores the push result: a blocked
/// mover simply stays put.
fn mover_update(grid: &dyn Grid, _kind: CellKindId, sx: i32, sy: i32, _ax: i32, _ay: i32, _payload: Option<&Payload>) {
    let Some(rotation) = grid.rotation(sx, sy) else { return };
    let _ = grid.push(sx, sy, rotation, 0, None);
}

fn generator_update(grid: &dyn Grid, kind: CellKindId, sx: i32, sy: i32, _ax: i32, _ay: i32, _payload: Option<&Payload>) {
    let Some(rotation) = grid.rotation(sx, sy) else { return };
    let bit = rotation.raw();
    let (bx, by) = grid.shift(sx, sy, rotation, -1);
    let (fx, fy) = grid.front(sx, sy, rotation);

    let Some(front_kind) = grid.cell_kind(fx, fy) else { return };
    if front_kind != crate::grid::EMPTY_KIND && grid.get_optimization(fx, fy, bit) {
        grid.set_optimization(sx, sy, bit, true);
        return;
    }

    let Some(back_kind) = grid.cell_kind(bx, by) else { return };
    if !grid.can_generate(back_kind, bx, by, kind, sx, sy, rotation) {
        return;
    }

    // Copy the whole back cell, kind and rotation, into the front: the
    // emitted cell faces the way the fuel cell did, not the way the
    // (empty) front cell did.
    let back_rotation = grid.rotation(bx, by).unwrap_or(rotation);
    if grid.push(fx, fy, rotation, 1, Some((back_kind, back_rotation))) == 0 {
        grid.set_optimization(sx, sy, bit, true);
    }
}

fn rotator_cw_update(grid: &dyn Grid, _kind: CellKindId, _sx: i32, _sy: i32, ax: i32, ay: i32, _payload: Option<&Payload>) {
    grid.rotate(ax, ay, 1);
}

fn rotator_ccw_update(grid: &dyn Grid, _kind: CellKindId, _sx: i32, _sy: i32, ax: i32, ay: i32, _payload: Option<&Payload>) {
    grid.rotate(ax, ay, -1);
}

const MOVER_UPDATE: UpdateFn = mover_update;
const GENERATOR_UPDATE: UpdateFn = generator_update;
const ROTATOR_CW_UPDATE: UpdateFn = rotator_cw_update;
const ROTATOR_CCW_UPDATE: UpdateFn = rotator_ccw_update;

/// Registers the four built-in callbacks into `cell_kinds` and the three
/// built-in subticks (`generators` at priority 1.0 tracked, `rotators` at
/// priority 2.0 neighbour, `movers` at priority 3.0 tracked — all parallel)
/// into `subticks`, attaching `kinds` to the appropriate subtick.
///
/// # Errors
/// Propagates [`SchedulerError::UnknownHandle`] should an internal handle
/// somehow not resolve; this only happens if `subticks` is shared with
/// another caller that removed descriptors, which this registry never does.
pub fn bootstrap(
    subticks: &mut SubtickRegistry,
    cell_kinds: &dyn CellKindRegistry,
    interner: &dyn Interner,
    mod_id: &str,
    kinds: BuiltinKinds,
) -> Result<BuiltinSubticks, SchedulerError> {
    cell_kinds.register(kinds.generator, GENERATOR_UPDATE, None);
    cell_kinds.register(kinds.rotator_cw, ROTATOR_CW_UPDATE, None);
    cell_kinds.register(kinds.rotator_ccw, ROTATOR_CCW_UPDATE, None);
    cell_kinds.register(kinds.mover, MOVER_UPDATE, None);

    let generators = subticks.add_tracked(interner, mod_id, "generators", GENERATORS_PRIORITY, 0, true);
    subticks.add_cell(generators, kinds.generator)?;

    let rotators = subticks.add_neighbour(interner, mod_id, "rotators", ROTATORS_PRIORITY, 0, true);
    subticks.add_cell(rotators, kinds.rotator_cw)?;
    subticks.add_cell(rotators, kinds.rotator_ccw)?;

    let movers = subticks.add_tracked(interner, mod_id, "movers", MOVERS_PRIORITY, 0, true);
    subticks.add_cell(movers, kinds.mover)?;

    Ok(BuiltinSubticks { generators, rotators, movers })
}

/// Number of optimization bits the generator callback needs reserved on
/// every grid that will host it (one per rotation).
#[must_use]
pub const fn generator_opt_bits() -> usize {
    GENERATOR_OPT_BITS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Rotation;
    use crate::cellkind::DefaultCellKindRegistry;
    use crate::grid::new_grid;
    use crate::ident::DefaultInterner;

    fn sample_kinds() -> BuiltinKinds {
        BuiltinKinds {
            mover: CellKindId(10),
            generator: CellKindId(11),
            rotator_cw: CellKindId(12),
            rotator_ccw: CellKindId(13),
        }
    }

    #[test]
    fn bootstrap_orders_subticks_generate_rotate_move() {
        let mut subticks = SubtickRegistry::new();
        let cell_kinds = DefaultCellKindRegistry::new();
        let interner = DefaultInterner::new();
        bootstrap(&mut subticks, &cell_kinds, &interner, "core", sample_kinds()).expect("bootstrap succeeds");

        let names: Vec<&str> = subticks
            .iter_in_priority_order()
            .map(|(_, d)| d.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["generators", "rotators", "movers"]);
    }

    #[test]
    fn mover_pushes_forward_into_empty_lane() {
        let grid = new_grid(3, 1);
        let kinds = sample_kinds();
        grid.set(0, 0, kinds.mover, Rotation::Right);
        mover_update(&grid, kinds.mover, 0, 0, 0, 0, None);
        assert_eq!(grid.cell_kind(1, 0), Some(kinds.mover));
        assert_eq!(grid.cell_kind(0, 0), Some(crate::grid::EMPTY_KIND));
    }

    #[test]
    fn generator_emits_copy_of_back_cell_into_empty_front() {
        let grid = new_grid(4, 1);
        let kinds = sample_kinds();
        grid.set(0, 0, kinds.mover, Rotation::Right);
        grid.set(1, 0, kinds.generator, Rotation::Right);
        generator_update(&grid, kinds.generator, 1, 0, 0, 0, None);
        assert_eq!(grid.cell_kind(2, 0), Some(kinds.mover), "copy emitted in front");
        assert_eq!(grid.cell_kind(0, 0), Some(kinds.mover), "back cell untouched");
    }

    #[test]
    fn generator_sets_optimization_bit_when_blocked() {
        let grid = new_grid(3, 1);
        let kinds = sample_kinds();
        let wall = CellKindId(99);
        grid.set(0, 0, kinds.mover, Rotation::Right);
        grid.set(1, 0, kinds.generator, Rotation::Right);
        grid.set(2, 0, wall, Rotation::Right);
        generator_update(&grid, kinds.generator, 1, 0, 0, 0, None);
        assert!(grid.get_optimization(1, 0, Rotation::Right.raw()));
    }

    #[test]
    fn rotator_cw_rotates_anchor_not_source() {
        let grid = new_grid(3, 3);
        let kinds = sample_kinds();
        grid.set(1, 1, kinds.mover, Rotation::Right);
        rotator_cw_update(&grid, kinds.rotator_cw, 0, 1, 1, 1, None);
        assert_eq!(grid.rotation(1, 1), Some(Rotation::Down));
    }

    #[test]
    fn rotator_on_empty_anchor_is_a_no_op() {
        let grid = new_grid(3, 3);
        let kinds = sample_kinds();
        rotator_cw_update(&grid, kinds.rotator_cw, 0, 1, 1, 1, None);
        assert_eq!(grid.rotation(1, 1), Some(Rotation::Right));
    }
}
