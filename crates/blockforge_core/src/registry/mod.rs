//! Namespaced type registries.
//!
//! # Responsibility
//! - Represent the host's open-ended vocabulary (blocks, items, biomes, ...)
//!   as runtime-populated, string-keyed registries.
//! - Offer registry browsing over the same data without a separate index.
//!
//! # Invariants
//! - Keys entering a registry are always fully qualified.
//! - Keys arriving from user input are completed with the default namespace.

pub mod keyed;
pub mod namespaced;
pub mod search;
pub mod types;
