//! String-keyed registry for server-defined vocabularies.
//!
//! # Responsibility
//! - Map fully qualified `namespace:name` keys to typed values.
//! - Track every namespace seen through `register`.
//! - Complete unqualified lookups with the configured default namespace.
//!
//! # Invariants
//! - Every stored key has a non-empty namespace segment.
//! - A key is assigned once; re-registration is rejected and leaves the
//!   stored value untouched.
//! - Iteration follows insertion order and is stable between writes.
//! - Population happens through `&mut self` before the registry is shared,
//!   so concurrent registration cannot compile.

use crate::registry::keyed::{qualify, Keyed, NamespacedKey};
use indexmap::IndexMap;
use log::warn;
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::atomic::{AtomicBool, Ordering};

/// Registry write errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    MalformedKey(String),
    DuplicateKey { registry: String, key: String },
}

impl Display for RegistryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MalformedKey(key) => write!(f, "key is not namespaced: `{key}`"),
            Self::DuplicateKey { registry, key } => {
                write!(f, "key `{key}` already has an associated {registry}")
            }
        }
    }
}

impl Error for RegistryError {}

/// Namespaced mapping from key to value.
pub struct NamespacedRegistry<V> {
    name: String,
    id: String,
    default_namespace: String,
    entries: IndexMap<String, V>,
    known_namespaces: BTreeSet<String>,
    check_initialized: bool,
    initialized: AtomicBool,
    early_read_reported: AtomicBool,
}

impl<V> NamespacedRegistry<V> {
    /// Creates an empty registry.
    ///
    /// `name` is human readable (`"block type"`), `id` is machine readable
    /// (`"block_type"`).
    pub fn new(
        name: impl Into<String>,
        id: impl Into<String>,
        default_namespace: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            id: id.into(),
            default_namespace: default_namespace.into(),
            entries: IndexMap::new(),
            known_namespaces: BTreeSet::new(),
            check_initialized: false,
            initialized: AtomicBool::new(false),
            early_read_reported: AtomicBool::new(false),
        }
    }

    /// Enables a warning for reads that happen before `mark_initialized`.
    pub fn with_initialization_check(mut self) -> Self {
        self.check_initialized = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn default_namespace(&self) -> &str {
        &self.default_namespace
    }

    /// Registers `value` under a fully qualified `key`.
    ///
    /// # Errors
    /// - `MalformedKey` when `key` has no separator or starts with one.
    /// - `DuplicateKey` when `key` is already registered.
    pub fn register(&mut self, key: &str, value: V) -> Result<&V, RegistryError> {
        let parsed =
            NamespacedKey::parse(key).ok_or_else(|| RegistryError::MalformedKey(key.to_string()))?;
        if self.entries.contains_key(key) {
            return Err(RegistryError::DuplicateKey {
                registry: self.name.clone(),
                key: key.to_string(),
            });
        }

        if !self.known_namespaces.contains(parsed.namespace()) {
            self.known_namespaces.insert(parsed.namespace().to_string());
        }
        let (index, _) = self.entries.insert_full(key.to_string(), value);
        Ok(&self.entries[index])
    }

    /// Resolves `key`, completing bare names with the default namespace.
    ///
    /// Malformed lookup keys never fail; they simply do not resolve.
    pub fn get(&self, key: &str) -> Option<&V> {
        self.report_early_read();
        self.entries.get(qualify(key, &self.default_namespace).as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Snapshot of every namespace seen through `register`.
    pub fn known_namespaces(&self) -> BTreeSet<String> {
        self.known_namespaces.clone()
    }

    /// Registered keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries.keys().map(String::as_str)
    }

    /// Registered values in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &V> + '_ {
        self.report_early_read();
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks population as finished for the initialization check.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::Release);
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    fn report_early_read(&self) {
        if !self.check_initialized || self.is_initialized() {
            return;
        }
        if !self.early_read_reported.swap(true, Ordering::AcqRel) {
            warn!(
                "event=registry_read_before_init module=registry status=error registry={}",
                self.id
            );
        }
    }
}

impl<V: Keyed> NamespacedRegistry<V> {
    /// Registers a keyed value under its own id.
    pub fn register_keyed(&mut self, value: V) -> Result<&V, RegistryError> {
        let key = value.id().to_string();
        self.register(&key, value)
    }
}

impl<'a, V> IntoIterator for &'a NamespacedRegistry<V> {
    type Item = &'a V;
    type IntoIter = indexmap::map::Values<'a, String, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.values()
    }
}

impl<V> Debug for NamespacedRegistry<V> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespacedRegistry")
            .field("id", &self.id)
            .field("default_namespace", &self.default_namespace)
            .field("len", &self.entries.len())
            .field("known_namespaces", &self.known_namespaces)
            .finish()
    }
}
