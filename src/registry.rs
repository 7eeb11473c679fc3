// SPDX-License-Identifier: Apache-2.0
//! Subtick registry: an ordered sequence of subtick descriptors, kept sorted
//! by priority, that the runner dispatches in order every tick.
//!
//! Descriptors are never removed or moved once added — see
//! [`SubtickHandle`] — so a handle returned by `add_*`/`find` stays valid for
//! the registry's lifetime. Priority order is maintained as a separate,
//! recomputed permutation over descriptor storage rather than by physically
//! reordering the storage vector, which is what lets handles stay stable
//! across insertions.

use crate::cell::{CellKindId, Rotation};
use crate::error::SchedulerError;
use crate::ident::{pad_with_mod_id, Interner, Symbol};
use crate::mode::{Mode, OrderRecord};

/// Stable handle into a [`SubtickRegistry`]. Valid for the registry's
/// lifetime; never invalidated by later insertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubtickHandle(u32);

impl SubtickHandle {
    /// Wraps a raw index. Exposed for telemetry call sites that need a
    /// plain integer; constructing one that was not returned by a
    /// [`SubtickRegistry`] and using it to look up a descriptor is a logic
    /// error, not a memory-safety one.
    #[must_use]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw index backing this handle.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// A registered subtick: priority, traversal mode, spacing/parallel policy,
/// and the set of cell kinds it dispatches.
#[derive(Debug, Clone)]
pub struct SubtickDescriptor {
    /// Interned, mod-padded name.
    pub name: Symbol,
    /// Display name, kept alongside the symbol for telemetry/error messages.
    pub display_name: String,
    /// Total-ordering priority; ties broken by insertion order.
    pub priority: f64,
    /// Stride minus one for parallel decomposition.
    pub spacing: u32,
    /// Hint that this subtick may be parallelized.
    pub parallel: bool,
    /// Traversal strategy.
    pub mode: Mode,
    /// Cell kinds this subtick dispatches. Expected to stay small (a few
    /// entries), so linear `contains` is the right membership test.
    pub ids: Vec<CellKindId>,
    /// Insertion order, used only to break priority ties deterministically.
    pub(crate) sequence: u32,
}

impl SubtickDescriptor {
    /// Whether `kind` is one this subtick dispatches.
    #[must_use]
    pub fn handles(&self, kind: CellKindId) -> bool {
        self.ids.contains(&kind)
    }
}

/// Ordered collection of subtick descriptors, re-sorted by priority after
/// every addition.
pub struct SubtickRegistry {
    descriptors: Vec<SubtickDescriptor>,
    /// Indices into `descriptors`, kept sorted by `(priority, sequence)`.
    order: Vec<usize>,
    next_sequence: u32,
}

impl Default for SubtickRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl SubtickRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            descriptors: Vec::new(),
            order: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Registers a ticked-mode subtick, returning its handle.
    pub fn add_ticked(
        &mut self,
        interner: &dyn Interner,
        mod_id: &str,
        name: &str,
        priority: f64,
        spacing: u32,
        parallel: bool,
    ) -> SubtickHandle {
        self.push(interner, mod_id, name, priority, spacing, parallel, Mode::Ticked)
    }

    /// Registers a tracked-mode subtick, returning its handle.
    pub fn add_tracked(
        &mut self,
        interner: &dyn Interner,
        mod_id: &str,
        name: &str,
        priority: f64,
        spacing: u32,
        parallel: bool,
    ) -> SubtickHandle {
        self.push(interner, mod_id, name, priority, spacing, parallel, Mode::Tracked)
    }

    /// Registers a neighbour-mode subtick, returning its handle.
    pub fn add_neighbour(
        &mut self,
        interner: &dyn Interner,
        mod_id: &str,
        name: &str,
        priority: f64,
        spacing: u32,
        parallel: bool,
    ) -> SubtickHandle {
        self.push(interner, mod_id, name, priority, spacing, parallel, Mode::Neighbour)
    }

    /// Registers a custom-mode subtick, returning its handle.
    ///
    /// # Errors
    /// Returns [`SchedulerError::EmptyCustomOrder`] if `orders` is empty, and
    /// [`SchedulerError::DuplicateRotationInOrder`] if any single order
    /// record lists the same rotation twice (it would dispatch the affected
    /// cells twice within one subtick).
    pub fn add_custom(
        &mut self,
        interner: &dyn Interner,
        mod_id: &str,
        name: &str,
        priority: f64,
        spacing: u32,
        parallel: bool,
        orders: Vec<OrderRecord>,
    ) -> Result<SubtickHandle, SchedulerError> {
        if orders.is_empty() {
            return Err(SchedulerError::EmptyCustomOrder { name: name.to_owned() });
        }
        for order in &orders {
            let mut seen: Vec<Rotation> = Vec::with_capacity(order.rotations.len());
            for &rot in &order.rotations {
                if seen.contains(&rot) {
                    return Err(SchedulerError::DuplicateRotationInOrder(rot));
                }
                seen.push(rot);
            }
        }
        Ok(self.push(interner, mod_id, name, priority, spacing, parallel, Mode::Custom { orders }))
    }

    /// Attaches `kind` to the subtick behind `handle`.
    ///
    /// # Errors
    /// Returns [`SchedulerError::UnknownHandle`] if `handle` was not
    /// returned by this registry.
    pub fn add_cell(&mut self, handle: SubtickHandle, kind: CellKindId) -> Result<(), SchedulerError> {
        let descriptor = self
            .descriptors
            .get_mut(handle.raw() as usize)
            .ok_or(SchedulerError::UnknownHandle(handle))?;
        if !descriptor.ids.contains(&kind) {
            descriptor.ids.push(kind);
        }
        Ok(())
    }

    /// Looks up a subtick by its mod-padded name. Interning-based: two
    /// calls with text that interns to the same symbol return the same
    /// handle regardless of character-level differences upstream.
    #[must_use]
    pub fn find(&self, interner: &dyn Interner, mod_id: &str, name: &str) -> Option<SubtickHandle> {
        let symbol = interner.intern(&pad_with_mod_id(mod_id, name));
        self.descriptors
            .iter()
            .position(|d| d.name == symbol)
            .map(|idx| SubtickHandle(idx as u32))
    }

    /// The descriptor behind `handle`, if valid for this registry.
    #[must_use]
    pub fn descriptor(&self, handle: SubtickHandle) -> Option<&SubtickDescriptor> {
        self.descriptors.get(handle.raw() as usize)
    }

    /// Iterates descriptors in ascending priority order, ties broken by
    /// insertion order — the order `run()` dispatches subticks in.
    pub fn iter_in_priority_order(&self) -> impl Iterator<Item = (SubtickHandle, &SubtickDescriptor)> {
        self.order
            .iter()
            .map(|&idx| (SubtickHandle(idx as u32), &self.descriptors[idx]))
    }

    fn push(
        &mut self,
        interner: &dyn Interner,
        mod_id: &str,
        name: &str,
        priority: f64,
        spacing: u32,
        parallel: bool,
        mode: Mode,
    ) -> SubtickHandle {
        let symbol = interner.intern(&pad_with_mod_id(mod_id, name));
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let index = self.descriptors.len();
        self.descriptors.push(SubtickDescriptor {
            name: symbol,
            display_name: name.to_owned(),
            priority,
            spacing,
            parallel,
            mode,
            ids: Vec::new(),
            sequence,
        });
        self.resort();
        SubtickHandle(index as u32)
    }

    fn resort(&mut self) {
        self.order = (0..self.descriptors.len()).collect();
        self.order.sort_by(|&a, &b| {
            let da = &self.descriptors[a];
            let db = &self.descriptors[b];
            da.priority
                .partial_cmp(&db.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| da.sequence.cmp(&db.sequence))
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ident::DefaultInterner;

    #[test]
    fn priority_order_is_stable_on_ties() {
        let interner = DefaultInterner::new();
        let mut registry = SubtickRegistry::new();
        registry.add_ticked(&interner, "core", "p5", 5.0, 0, false);
        registry.add_ticked(&interner, "core", "p1", 1.0, 0, false);
        registry.add_ticked(&interner, "core", "p3a", 3.0, 0, false);
        registry.add_ticked(&interner, "core", "p3b", 3.0, 0, false);

        let names: Vec<&str> = registry
            .iter_in_priority_order()
            .map(|(_, d)| d.display_name.as_str())
            .collect();
        assert_eq!(names, vec!["p1", "p3a", "p3b", "p5"]);
    }

    #[test]
    fn find_resolves_by_mod_padded_identity() {
        let interner = DefaultInterner::new();
        let mut registry = SubtickRegistry::new();
        let handle = registry.add_ticked(&interner, "core", "movers", 1.0, 0, false);
        assert_eq!(registry.find(&interner, "core", "movers"), Some(handle));
        assert_eq!(registry.find(&interner, "addon", "movers"), None);
    }

    #[test]
    fn add_cell_rejects_unknown_handle() {
        let mut registry = SubtickRegistry::new();
        let bogus = SubtickHandle::from_raw(99);
        assert_eq!(
            registry.add_cell(bogus, CellKindId(1)),
            Err(SchedulerError::UnknownHandle(bogus))
        );
    }

    #[test]
    fn add_cell_is_idempotent() {
        let interner = DefaultInterner::new();
        let mut registry = SubtickRegistry::new();
        let handle = registry.add_ticked(&interner, "core", "movers", 1.0, 0, false);
        registry.add_cell(handle, CellKindId(1)).expect("known handle");
        registry.add_cell(handle, CellKindId(1)).expect("known handle");
        assert_eq!(registry.descriptor(handle).expect("exists").ids, vec![CellKindId(1)]);
    }

    #[test]
    fn add_custom_rejects_empty_orders() {
        let interner = DefaultInterner::new();
        let mut registry = SubtickRegistry::new();
        let err = registry
            .add_custom(&interner, "core", "weird", 1.0, 0, false, vec![])
            .unwrap_err();
        assert_eq!(err, SchedulerError::EmptyCustomOrder { name: "weird".to_owned() });
    }

    #[test]
    fn add_custom_rejects_duplicate_rotation_in_one_order() {
        use crate::mode::OrderTag;
        let interner = DefaultInterner::new();
        let mut registry = SubtickRegistry::new();
        let err = registry
            .add_custom(
                &interner,
                "core",
                "weird",
                1.0,
                0,
                false,
                vec![OrderRecord {
                    order: OrderTag::Ticked,
                    rotations: vec![Rotation::Right, Rotation::Right],
                }],
            )
            .unwrap_err();
        assert_eq!(err, SchedulerError::DuplicateRotationInOrder(Rotation::Right));
    }

    #[test]
    fn handles_stay_valid_across_further_insertions() {
        let interner = DefaultInterner::new();
        let mut registry = SubtickRegistry::new();
        let first = registry.add_ticked(&interner, "core", "first", 1.0, 0, false);
        for i in 0..50 {
            registry.add_ticked(&interner, "core", &format!("filler{i}"), 2.0, 0, false);
        }
        assert_eq!(registry.descriptor(first).expect("still valid").display_name, "first");
    }

    proptest::proptest! {
        /// Ordering (spec §8): for any sequence of `addTicked` priorities,
        /// registry iteration equals ascending priority, ties broken by
        /// insertion order. Priorities are drawn from a small discrete set
        /// so ties are common, which is the case the tie-break rule exists
        /// for.
        #[test]
        fn priority_order_matches_ascending_priority_with_stable_ties(
            priorities in proptest::collection::vec(0i32..6, 1..30)
        ) {
            let interner = DefaultInterner::new();
            let mut registry = SubtickRegistry::new();
            for (i, p) in priorities.iter().enumerate() {
                registry.add_ticked(&interner, "core", &format!("s{i}"), f64::from(*p), 0, false);
            }

            let observed: Vec<(f64, u32)> = registry
                .iter_in_priority_order()
                .map(|(_, d)| (d.priority, d.sequence))
                .collect();

            // Ascending by priority.
            for window in observed.windows(2) {
                proptest::prop_assert!(window[0].0 <= window[1].0);
            }
            // Ties broken by insertion order: within a run of equal
            // priorities, sequence numbers are strictly increasing.
            for window in observed.windows(2) {
                if (window[0].0 - window[1].0).abs() < f64::EPSILON {
                    proptest::prop_assert!(window[0].1 < window[1].1);
                }
            }
            // Same multiset of priorities as inserted.
            let mut expected: Vec<f64> = priorities.iter().map(|&p| f64::from(p)).collect();
            expected.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            let mut got: Vec<f64> = observed.iter().map(|&(p, _)| p).collect();
            got.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
            proptest::prop_assert_eq!(expected, got);
        }
    }
}
