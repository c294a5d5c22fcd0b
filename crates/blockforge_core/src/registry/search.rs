//! Registry browsing and item search.
//!
//! # Responsibility
//! - Turn user-typed glob queries into matchers over registry ids.
//! - Produce sorted, paginated listings for command collaborators.
//!
//! # Invariants
//! - Results are sorted by id, independent of registration order.
//! - Requested pages are clamped into `1..=total_pages`.

use crate::registry::keyed::Keyed;
use crate::registry::namespaced::NamespacedRegistry;
use crate::registry::types::{ItemType, TypeRegistries};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};

static ALLOWED_QUERY: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-z0-9_:?*/]+$").expect("registry query pattern is valid"));

const MIN_ITEM_QUERY_CHARS: usize = 3;

/// Search input errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    InvalidQuery(String),
    QueryTooShort(String),
    UnknownRegistry {
        requested: String,
        available: Vec<String>,
    },
}

impl Display for SearchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidQuery(value) => write!(
                f,
                "invalid registry query `{value}`; allowed characters are a-z 0-9 _ : ? * /"
            ),
            Self::QueryTooShort(value) => {
                write!(f, "search query `{value}` is too short; enter at least 3 characters")
            }
            Self::UnknownRegistry {
                requested,
                available,
            } => write!(
                f,
                "unknown registry `{requested}`; expected one of {}",
                available.join(", ")
            ),
        }
    }
}

impl Error for SearchError {}

/// Parsed registry query.
#[derive(Debug, Clone)]
pub struct RegistryQuery {
    raw: String,
    matcher: Regex,
}

impl RegistryQuery {
    /// Parses space-separated words into a glob query.
    ///
    /// Words are joined with `_`. A query without `*` or `?` matches ids
    /// containing it anywhere.
    pub fn parse(raw: &str) -> Result<Self, SearchError> {
        let joined = raw.split_whitespace().collect::<Vec<_>>().join("_");
        let raw = if joined.is_empty() {
            "*".to_string()
        } else {
            joined
        };
        if !ALLOWED_QUERY.is_match(&raw) {
            return Err(SearchError::InvalidQuery(raw));
        }

        let glob = if raw.contains('*') || raw.contains('?') {
            raw.clone()
        } else {
            format!("*{raw}*")
        };
        let matcher =
            Regex::new(&glob_to_regex(&glob)).map_err(|_| SearchError::InvalidQuery(raw.clone()))?;
        Ok(Self { raw, matcher })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Whether this query lists the whole registry.
    pub fn is_everything(&self) -> bool {
        self.raw == "*"
    }

    pub fn matches(&self, id: &str) -> bool {
        self.matcher.is_match(id)
    }
}

/// Filter applied by item search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemFilter {
    Any,
    BlocksOnly,
    ItemsOnly,
}

/// One page of sorted search results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPage {
    pub title: String,
    pub items: Vec<String>,
    /// 1-based page actually returned.
    pub page: usize,
    pub total_pages: usize,
    pub total_results: usize,
}

/// Lists ids in `registry` matching `query`.
pub fn search_registry<V: Keyed>(
    registry: &NamespacedRegistry<V>,
    query: &RegistryQuery,
    page: usize,
    page_size: usize,
) -> SearchPage {
    listing(registry.iter().map(Keyed::id), query, page, page_size)
}

/// Like `search_registry`, resolving the registry by machine id
/// (`block_type`, `item_category`, ...).
///
/// # Errors
/// - `UnknownRegistry` when `registry_id` names none of `registries`.
pub fn search_registry_by_id(
    registries: &TypeRegistries,
    registry_id: &str,
    query: &RegistryQuery,
    page: usize,
    page_size: usize,
) -> Result<SearchPage, SearchError> {
    let keys = registries
        .keys_of(registry_id.trim())
        .ok_or_else(|| SearchError::UnknownRegistry {
            requested: registry_id.trim().to_string(),
            available: registries
                .registry_ids()
                .iter()
                .map(|id| id.to_string())
                .collect(),
        })?;
    Ok(listing(keys.into_iter(), query, page, page_size))
}

/// Searches item ids containing `text` (spaces become `_`).
///
/// `text` is taken as typed; surrounding whitespace counts toward the
/// length and becomes `_` like any other space.
///
/// # Errors
/// - `QueryTooShort` when `text` has fewer than 3 characters.
pub fn search_items(
    items: &NamespacedRegistry<ItemType>,
    text: &str,
    filter: ItemFilter,
    page: usize,
    page_size: usize,
) -> Result<SearchPage, SearchError> {
    if text.chars().count() < MIN_ITEM_QUERY_CHARS {
        return Err(SearchError::QueryTooShort(text.to_string()));
    }
    let needle = text.replace(' ', "_");
    let ids: Vec<String> = items
        .iter()
        .filter(|item| match filter {
            ItemFilter::Any => true,
            ItemFilter::BlocksOnly => item.has_block_type(),
            ItemFilter::ItemsOnly => !item.has_block_type(),
        })
        .map(Keyed::id)
        .filter(|id| id.contains(needle.as_str()))
        .map(str::to_string)
        .collect();
    Ok(paginate(
        format!("Search results for '{text}'"),
        ids,
        page,
        page_size,
    ))
}

fn listing<'a>(
    ids: impl Iterator<Item = &'a str>,
    query: &RegistryQuery,
    page: usize,
    page_size: usize,
) -> SearchPage {
    let ids = ids
        .filter(|id| query.matches(id))
        .map(str::to_string)
        .collect();
    let title = if query.is_everything() {
        "Registry contents".to_string()
    } else {
        format!("Search results for '{}'", query.as_str())
    };
    paginate(title, ids, page, page_size)
}

fn paginate(title: String, mut ids: Vec<String>, page: usize, page_size: usize) -> SearchPage {
    ids.sort();
    let page_size = page_size.max(1);
    let total_results = ids.len();
    let total_pages = total_results.div_ceil(page_size).max(1);
    let page = page.clamp(1, total_pages);
    let items = ids
        .into_iter()
        .skip((page - 1) * page_size)
        .take(page_size)
        .collect();
    SearchPage {
        title,
        items,
        page,
        total_pages,
        total_results,
    }
}

fn glob_to_regex(glob: &str) -> String {
    let mut pattern = String::with_capacity(glob.len() + 8);
    pattern.push('^');
    for c in glob.chars() {
        match c {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    pattern
}
