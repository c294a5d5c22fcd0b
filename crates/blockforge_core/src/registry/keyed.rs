//! Keyed values and namespaced key parsing.

/// Separator between namespace and name in a registry key.
pub const NAMESPACE_SEPARATOR: char = ':';

/// A value identified by a stable, globally unique `namespace:name` key.
pub trait Keyed {
    fn id(&self) -> &str;
}

/// Borrowed view of a `namespace:name` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamespacedKey<'a> {
    namespace: &'a str,
    name: &'a str,
}

impl<'a> NamespacedKey<'a> {
    /// Splits `key` at its first separator.
    ///
    /// Returns `None` when there is no separator or the separator is the
    /// first character (empty namespace).
    pub fn parse(key: &'a str) -> Option<Self> {
        match key.find(NAMESPACE_SEPARATOR) {
            Some(index) if index > 0 => Some(Self {
                namespace: &key[..index],
                name: &key[index + NAMESPACE_SEPARATOR.len_utf8()..],
            }),
            _ => None,
        }
    }

    pub fn namespace(&self) -> &'a str {
        self.namespace
    }

    pub fn name(&self) -> &'a str {
        self.name
    }
}

/// Qualifies a bare name with `default_namespace`.
///
/// Keys that already contain a separator, even at position 0, pass through
/// unchanged.
pub fn qualify(key: &str, default_namespace: &str) -> String {
    if key.contains(NAMESPACE_SEPARATOR) {
        key.to_string()
    } else {
        format!("{default_namespace}{NAMESPACE_SEPARATOR}{key}")
    }
}
