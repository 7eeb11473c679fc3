// SPDX-License-Identifier: Apache-2.0
//! Worker pool collaborator.
//!
//! Only the task-submission contract is specified: a pool runs `count`
//! homogeneous, independent tasks and blocks until they all complete. As the
//! design notes call for, task identity is a plain `usize` index rather than
//! a base/stride pair smuggled through as an integer-cast pointer — the
//! index-to-work mapping lives in the caller's closure.

use rayon::prelude::*;

/// The worker pool collaborator consumed by the parallel decomposition
/// layer.
pub trait WorkerPool: Send + Sync {
    /// Whether this pool is disabled (single-threaded build, or no workers
    /// configured). When `true`, callers should not bother constructing a
    /// parallel decomposition; `run_flat` still behaves correctly if called
    /// anyway (it just runs tasks on the calling thread).
    fn is_disabled(&self) -> bool;

    /// Runs `task(i)` for every `i` in `[0, count)`, blocking until all
    /// complete. `count == 0` is a no-op: no worker is invoked.
    fn run_flat(&self, count: usize, task: &(dyn Fn(usize) + Send + Sync));
}

/// Sequential fallback pool: runs every task on the calling thread, in
/// order. This is both the default pool (adequate for small grids, which
/// stay under the parallel cell-count threshold anyway) and what a
/// disabled build falls back to.
#[derive(Debug, Clone, Copy, Default)]
pub struct InlinePool;

impl WorkerPool for InlinePool {
    fn is_disabled(&self) -> bool {
        true
    }

    fn run_flat(&self, count: usize, task: &(dyn Fn(usize) + Send + Sync)) {
        for i in 0..count {
            task(i);
        }
    }
}

/// Fork-join pool backed by the global `rayon` thread pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct RayonPool;

impl WorkerPool for RayonPool {
    fn is_disabled(&self) -> bool {
        false
    }

    fn run_flat(&self, count: usize, task: &(dyn Fn(usize) + Send + Sync)) {
        (0..count).into_par_iter().for_each(|i| task(i));
    }
}
