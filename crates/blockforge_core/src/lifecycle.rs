//! Single-slot lifecycle container.
//!
//! # Responsibility
//! - Hold "the currently active X" (adapter, published registries) as an
//!   explicit value passed by reference instead of process-wide state.
//! - Let any number of readers observe the slot while one writer replaces or
//!   clears it.
//!
//! # Invariants
//! - A reader sees either no value or a fully constructed value.
//! - Transitions replace the whole value; the held value is never mutated.
//! - No operation blocks and no operation fails.

use arc_swap::ArcSwapOption;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;

/// Lifecycle-managed single value.
///
/// Created invalid. `set` makes it valid, `invalidate` makes it invalid again.
pub struct Lifecycled<T> {
    slot: ArcSwapOption<T>,
}

impl<T> Lifecycled<T> {
    /// Creates an invalid container.
    pub fn invalid() -> Self {
        Self {
            slot: ArcSwapOption::empty(),
        }
    }

    /// Creates a container that is already valid.
    pub fn valid(value: T) -> Self {
        let container = Self::invalid();
        container.set(value);
        container
    }

    /// Installs a new value, replacing any previous one.
    pub fn set(&self, value: T) {
        self.slot.store(Some(Arc::new(value)));
    }

    /// Clears the held value.
    ///
    /// Readers that already hold an `Arc` keep their snapshot alive.
    pub fn invalidate(&self) {
        self.slot.store(None);
    }

    /// Returns the current value, if any.
    pub fn read(&self) -> Option<Arc<T>> {
        self.slot.load_full()
    }

    pub fn is_valid(&self) -> bool {
        self.slot.load().is_some()
    }
}

impl<T> Default for Lifecycled<T> {
    fn default() -> Self {
        Self::invalid()
    }
}

impl<T> Debug for Lifecycled<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Lifecycled")
            .field("valid", &self.is_valid())
            .finish()
    }
}
