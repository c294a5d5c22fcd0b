//! Host vocabulary types and their per-category registries.
//!
//! # Responsibility
//! - Model block/item/biome/entity/fluid/tag identifiers as runtime keys.
//! - Bundle one registry per category so callers pass a single handle.
//!
//! # Invariants
//! - Every type is identified only by its full `namespace:name` id.
//! - All registries in one bundle share the same default namespace.

use crate::registry::keyed::Keyed;
use crate::registry::namespaced::NamespacedRegistry;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

macro_rules! keyed_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name {
            id: String,
        }

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self { id: id.into() }
            }
        }

        impl Keyed for $name {
            fn id(&self) -> &str {
                &self.id
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.id)
            }
        }
    };
}

keyed_type!(
    /// A placeable block kind.
    BlockType
);
keyed_type!(
    /// A biome.
    BiomeType
);
keyed_type!(
    /// A spawnable entity kind.
    EntityType
);
keyed_type!(
    /// A fluid. Only reachable through a low-level adapter.
    FluidType
);
keyed_type!(
    /// A block tag (`#minecraft:logs`), populated once world data exists.
    BlockCategory
);
keyed_type!(
    /// An item tag, populated once world data exists.
    ItemCategory
);

/// An item kind, optionally backed by a block of the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ItemType {
    id: String,
    has_block_type: bool,
}

impl ItemType {
    pub fn new(id: impl Into<String>, has_block_type: bool) -> Self {
        Self {
            id: id.into(),
            has_block_type,
        }
    }

    /// Whether a block with the same id exists.
    pub fn has_block_type(&self) -> bool {
        self.has_block_type
    }
}

impl Keyed for ItemType {
    fn id(&self) -> &str {
        &self.id
    }
}

impl Display for ItemType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.id)
    }
}

/// One registry per host vocabulary category.
#[derive(Debug)]
pub struct TypeRegistries {
    pub blocks: NamespacedRegistry<BlockType>,
    pub items: NamespacedRegistry<ItemType>,
    pub biomes: NamespacedRegistry<BiomeType>,
    pub entities: NamespacedRegistry<EntityType>,
    pub fluids: NamespacedRegistry<FluidType>,
    pub block_categories: NamespacedRegistry<BlockCategory>,
    pub item_categories: NamespacedRegistry<ItemCategory>,
}

impl TypeRegistries {
    /// Creates empty registries sharing `default_namespace`.
    ///
    /// Block, item, biome and entity registries warn when read before
    /// `mark_initialized`; fluids and tags are optional data and do not.
    pub fn new(default_namespace: &str) -> Self {
        Self {
            blocks: NamespacedRegistry::new("block type", "block_type", default_namespace)
                .with_initialization_check(),
            items: NamespacedRegistry::new("item type", "item_type", default_namespace)
                .with_initialization_check(),
            biomes: NamespacedRegistry::new("biome type", "biome_type", default_namespace)
                .with_initialization_check(),
            entities: NamespacedRegistry::new("entity type", "entity_type", default_namespace)
                .with_initialization_check(),
            fluids: NamespacedRegistry::new("fluid type", "fluid_type", default_namespace),
            block_categories: NamespacedRegistry::new(
                "block tag",
                "block_category",
                default_namespace,
            ),
            item_categories: NamespacedRegistry::new(
                "item tag",
                "item_category",
                default_namespace,
            ),
        }
    }

    /// Marks every registry as populated.
    pub fn mark_initialized(&self) {
        self.blocks.mark_initialized();
        self.items.mark_initialized();
        self.biomes.mark_initialized();
        self.entities.mark_initialized();
        self.fluids.mark_initialized();
        self.block_categories.mark_initialized();
        self.item_categories.mark_initialized();
    }

    /// Registry ids in a fixed order, for registry browsers.
    pub fn registry_ids(&self) -> [&str; 7] {
        [
            self.blocks.id(),
            self.items.id(),
            self.biomes.id(),
            self.entities.id(),
            self.fluids.id(),
            self.block_categories.id(),
            self.item_categories.id(),
        ]
    }

    /// Keys of the registry with machine id `registry_id`, in insertion order.
    pub fn keys_of(&self, registry_id: &str) -> Option<Vec<&str>> {
        let keys: Vec<&str> = match registry_id {
            id if id == self.blocks.id() => self.blocks.keys().collect(),
            id if id == self.items.id() => self.items.keys().collect(),
            id if id == self.biomes.id() => self.biomes.keys().collect(),
            id if id == self.entities.id() => self.entities.keys().collect(),
            id if id == self.fluids.id() => self.fluids.keys().collect(),
            id if id == self.block_categories.id() => self.block_categories.keys().collect(),
            id if id == self.item_categories.id() => self.item_categories.keys().collect(),
            _ => return None,
        };
        Some(keys)
    }
}
