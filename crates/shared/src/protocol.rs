use serde::{Deserialize, Serialize};

use crate::domain::{InventoryKind, PlayerIdentity, PlayerName, PlayerUuid, ShelfKey};

/// Path of the push channel, relative to the dashboard origin.
pub const LIVE_UPDATES_PATH: &str = "/api/live-updates";
pub const PLAYERS_PATH: &str = "/api/players";
pub const BOOKSHELVES_PATH: &str = "/api/bookshelves";
pub const BOOKSHELF_PATH: &str = "/api/bookshelf";
pub const PLAYER_BOOKS_PATH: &str = "/api/player/books";

/// Outer `{type, data}` wrapper of every pushed notification, before the
/// payload has been interpreted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEnvelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    BookshelfAdded,
    BookshelfRemoved,
    BookshelfUpdated,
    PlayerStatusUpdated,
    PlayerListUpdated,
    PlayerBookUpdated,
}

impl EventKind {
    pub fn from_wire(kind: &str) -> Option<Self> {
        match kind {
            "bookshelf-added" => Some(Self::BookshelfAdded),
            "bookshelf-removed" => Some(Self::BookshelfRemoved),
            "bookshelf-updated" => Some(Self::BookshelfUpdated),
            "player-status-updated" => Some(Self::PlayerStatusUpdated),
            "player-list-updated" => Some(Self::PlayerListUpdated),
            "player-book-updated" => Some(Self::PlayerBookUpdated),
            _ => None,
        }
    }

    pub fn as_wire(self) -> &'static str {
        match self {
            Self::BookshelfAdded => "bookshelf-added",
            Self::BookshelfRemoved => "bookshelf-removed",
            Self::BookshelfUpdated => "bookshelf-updated",
            Self::PlayerStatusUpdated => "player-status-updated",
            Self::PlayerListUpdated => "player-list-updated",
            Self::PlayerBookUpdated => "player-book-updated",
        }
    }
}

/// A decoded push notification. The variant fixes the payload schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "kebab-case")]
pub enum LiveEvent {
    BookshelfAdded(ShelfKey),
    BookshelfRemoved(ShelfKey),
    BookshelfUpdated(ShelfKey),
    PlayerStatusUpdated(PlayerStatus),
    PlayerListUpdated(Vec<PlayerSummary>),
    PlayerBookUpdated(PlayerIdentity),
}

impl LiveEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            LiveEvent::BookshelfAdded(_) => EventKind::BookshelfAdded,
            LiveEvent::BookshelfRemoved(_) => EventKind::BookshelfRemoved,
            LiveEvent::BookshelfUpdated(_) => EventKind::BookshelfUpdated,
            LiveEvent::PlayerStatusUpdated(_) => EventKind::PlayerStatusUpdated,
            LiveEvent::PlayerListUpdated(_) => EventKind::PlayerListUpdated,
            LiveEvent::PlayerBookUpdated(_) => EventKind::PlayerBookUpdated,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStatus {
    pub player_name: PlayerName,
    pub player_uuid: PlayerUuid,
    pub online: bool,
}

/// One entry of the player roster (`/api/players` and `player-list-updated`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSummary {
    pub uuid: PlayerUuid,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub online: bool,
    /// Epoch milliseconds of the last login, or of the roster build for
    /// online players.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<i64>,
}

/// A book held in one slot of a chiseled bookshelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookInfo {
    pub slot: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub pages: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub book_type: Option<String>,
}

/// A book held in a player's inventory or ender chest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerBookInfo {
    pub slot: u32,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub pages: Vec<String>,
    pub player_name: PlayerName,
    pub player_uuid: PlayerUuid,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub inventory_type: InventoryKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfQuery {
    pub world: String,
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl From<&ShelfKey> for ShelfQuery {
    fn from(key: &ShelfKey) -> Self {
        Self {
            world: key.world.clone(),
            x: key.x,
            y: key.y,
            z: key.z,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerBooksQuery {
    pub player: String,
    #[serde(rename = "type")]
    pub kind: InventoryKind,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_event_uses_type_and_data_on_the_wire() {
        let event = LiveEvent::BookshelfAdded(ShelfKey::new("w", 1, 2, 3));
        let value = serde_json::to_value(&event).expect("serialize");
        assert_eq!(
            value,
            serde_json::json!({
                "type": "bookshelf-added",
                "data": {"world": "w", "x": 1, "y": 2, "z": 3}
            })
        );
    }

    #[test]
    fn every_kind_round_trips_its_wire_name() {
        for kind in [
            EventKind::BookshelfAdded,
            EventKind::BookshelfRemoved,
            EventKind::BookshelfUpdated,
            EventKind::PlayerStatusUpdated,
            EventKind::PlayerListUpdated,
            EventKind::PlayerBookUpdated,
        ] {
            assert_eq!(EventKind::from_wire(kind.as_wire()), Some(kind));
        }
        assert_eq!(EventKind::from_wire("bookshelf-renamed"), None);
    }

    #[test]
    fn player_book_info_reads_server_field_names() {
        let raw = r#"{
            "slot": 4,
            "title": "Diary",
            "author": "Steve",
            "pages": ["p1"],
            "playerName": "Steve",
            "playerUuid": "069a79f4-44e9-4726-a5be-fca90e38aaf5",
            "isOnline": true,
            "inventoryType": "ENDERCHEST"
        }"#;
        let book: PlayerBookInfo = serde_json::from_str(raw).expect("decode");
        assert_eq!(book.slot, 4);
        assert!(book.is_online);
        assert_eq!(book.inventory_type, InventoryKind::Enderchest);
    }

    #[test]
    fn player_summary_tolerates_missing_optional_fields() {
        let summary: PlayerSummary = serde_json::from_str(r#"{"uuid":"a"}"#).expect("decode");
        assert_eq!(summary.uuid, PlayerUuid::new("a"));
        assert!(!summary.online);
        assert_eq!(summary.last_seen, None);
    }
}
