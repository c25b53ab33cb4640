use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_newtype!(PlayerUuid);
string_newtype!(PlayerName);

/// Location of a chiseled bookshelf. Field order is the sort order of the
/// shelf table: world, then x, then y, then z.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShelfKey {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl ShelfKey {
    pub fn new(world: impl Into<String>, x: i32, y: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for ShelfKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}, {}, {})", self.world, self.x, self.y, self.z)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerIdentity {
    pub player_name: PlayerName,
    pub player_uuid: PlayerUuid,
}

/// Which of a player's containers a book list belongs to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InventoryKind {
    /// Primary storage.
    #[default]
    Inventory,
    /// Off-hand/secondary storage.
    Enderchest,
}

impl InventoryKind {
    pub const ALL: [InventoryKind; 2] = [InventoryKind::Inventory, InventoryKind::Enderchest];

    pub fn as_query_value(self) -> &'static str {
        match self {
            InventoryKind::Inventory => "INVENTORY",
            InventoryKind::Enderchest => "ENDERCHEST",
        }
    }
}

impl fmt::Display for InventoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_query_value())
    }
}
