// SPDX-License-Identifier: Apache-2.0
//! Identifier interning for subtick names.
//!
//! Subtick names must compare by identity, not by character comparison: two
//! names are equal iff they were interned to the same [`Symbol`]. Names are
//! padded with the registering module's identifier before interning so two
//! different modules can each register a subtick called e.g. `"movers"`
//! without colliding — equality holds only between identical `(mod_id, name)`
//! pairs.

use std::sync::RwLock;

use rustc_hash::FxHashMap;

/// Opaque handle for an interned string. Equality and hashing are by
/// identity (the assigned index), never by re-comparing characters.
#[repr(transparent)]
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub struct Symbol(u32);

impl Symbol {
    /// Returns the raw interning index. Stable for the lifetime of the
    /// interner that produced it; not meaningful across interners.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// String interner used by the subtick registry. Modeled as a trait because
/// string interning is an external collaborator: a host engine may already
/// run a global interner and want subtick names to share it.
pub trait Interner: Send + Sync {
    /// Interns `text`, returning a stable [`Symbol`]. Interning the same
    /// string twice returns the same symbol.
    fn intern(&self, text: &str) -> Symbol;

    /// Resolves a previously interned symbol back to its string, if the
    /// interner retains a reverse mapping. Reference implementations do;
    /// this is not guaranteed by the trait contract.
    fn resolve(&self, symbol: Symbol) -> Option<String>;
}

/// Default interner: a simple `FxHashMap`-backed string table behind a
/// `RwLock`, adequate for the handful of subtick names a typical engine
/// registers at bootstrap.
#[derive(Debug, Default)]
pub struct DefaultInterner {
    inner: RwLock<InternerTable>,
}

#[derive(Debug, Default)]
struct InternerTable {
    by_text: FxHashMap<String, Symbol>,
    by_symbol: Vec<String>,
}

impl DefaultInterner {
    /// Creates an empty interner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Interner for DefaultInterner {
    fn intern(&self, text: &str) -> Symbol {
        if let Some(sym) = self.inner.read().unwrap_or_else(|e| e.into_inner()).by_text.get(text) {
            return *sym;
        }
        let mut table = self.inner.write().unwrap_or_else(|e| e.into_inner());
        // Re-check: another writer may have interned `text` while we waited.
        if let Some(sym) = table.by_text.get(text) {
            return *sym;
        }
        let sym = Symbol(table.by_symbol.len() as u32);
        table.by_symbol.push(text.to_owned());
        table.by_text.insert(text.to_owned(), sym);
        sym
    }

    fn resolve(&self, symbol: Symbol) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .by_symbol
            .get(symbol.0 as usize)
            .cloned()
    }
}

/// Pads a subtick name with its registering module's identifier, matching
/// the original engine's `tsc_padWithModID` convention. Two modules
/// registering the same bare `name` produce distinct padded strings, and
/// thus distinct symbols once interned.
#[must_use]
pub fn pad_with_mod_id(mod_id: &str, name: &str) -> String {
    format!("{mod_id}:{name}")
}
