use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Local, TimeZone, Utc};
use shared::{
    domain::{InventoryKind, PlayerName, PlayerUuid, ShelfKey},
    protocol::{BookInfo, PlayerBookInfo, PlayerSummary},
};

pub const LAST_SEEN_NOW: &str = "Now";
const LAST_SEEN_UNKNOWN: &str = "Unknown";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfRow {
    pub key: ShelfKey,
    /// Number of `bookshelf-updated` events seen since the row was created.
    pub update_count: u32,
    pub last_updated: Option<DateTime<Utc>>,
}

impl ShelfRow {
    fn new(key: ShelfKey) -> Self {
        Self {
            key,
            update_count: 0,
            last_updated: None,
        }
    }

    pub fn recently_updated(&self) -> bool {
        self.update_count > 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerRow {
    pub uuid: PlayerUuid,
    pub name: String,
    pub online: bool,
    pub last_seen: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShelfDetail {
    pub key: ShelfKey,
    /// `None` until the first fetch for this detail has been rendered.
    pub books: Option<Vec<BookInfo>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerDetail {
    pub uuid: PlayerUuid,
    pub name: PlayerName,
    pub tabs: BTreeMap<InventoryKind, Vec<PlayerBookInfo>>,
}

/// Something a renderer has to redraw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewChange {
    ShelfRowInserted(ShelfKey),
    ShelfRowRemoved(ShelfKey),
    ShelfRowUpdated(ShelfKey),
    ShelfTableReplaced { rows: usize },
    PlayerRowUpdated(PlayerUuid),
    PlayerTableReplaced { rows: usize },
    ShelfDetailOpened(ShelfKey),
    ShelfDetailRendered { key: ShelfKey, books: usize },
    ShelfDetailClosed(ShelfKey),
    PlayerDetailOpened(PlayerUuid),
    InventoryRendered {
        player: PlayerUuid,
        kind: InventoryKind,
        books: usize,
    },
    PlayerDetailClosed(PlayerUuid),
}

/// Client-side model of the dashboard: both tables plus whichever details are
/// open. Rows are addressed by entity key, never by position.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    shelves: BTreeMap<ShelfKey, ShelfRow>,
    players: Vec<PlayerRow>,
    player_index: HashMap<PlayerUuid, usize>,
    player_status: String,
    open_shelf: Option<ShelfDetail>,
    viewed_player: Option<PlayerDetail>,
}

impl ViewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shelf rows in table order.
    pub fn shelves(&self) -> impl Iterator<Item = &ShelfRow> {
        self.shelves.values()
    }

    pub fn shelf(&self, key: &ShelfKey) -> Option<&ShelfRow> {
        self.shelves.get(key)
    }

    pub fn shelf_count(&self) -> usize {
        self.shelves.len()
    }

    /// Player rows in the order the server listed them.
    pub fn players(&self) -> &[PlayerRow] {
        &self.players
    }

    pub fn player(&self, uuid: &PlayerUuid) -> Option<&PlayerRow> {
        self.player_index.get(uuid).map(|&idx| &self.players[idx])
    }

    pub fn player_status(&self) -> &str {
        &self.player_status
    }

    pub fn open_shelf(&self) -> Option<&ShelfDetail> {
        self.open_shelf.as_ref()
    }

    pub fn is_shelf_detail_open(&self, key: &ShelfKey) -> bool {
        self.open_shelf.as_ref().is_some_and(|detail| &detail.key == key)
    }

    pub fn viewed_player(&self) -> Option<&PlayerDetail> {
        self.viewed_player.as_ref()
    }

    pub fn is_viewing_player(&self, uuid: &PlayerUuid) -> bool {
        self.viewed_player
            .as_ref()
            .is_some_and(|detail| &detail.uuid == uuid)
    }

    pub fn insert_shelf(&mut self, key: ShelfKey) -> Option<ViewChange> {
        if self.shelves.contains_key(&key) {
            return None;
        }
        self.shelves.insert(key.clone(), ShelfRow::new(key.clone()));
        Some(ViewChange::ShelfRowInserted(key))
    }

    pub fn remove_shelf(&mut self, key: &ShelfKey) -> Option<ViewChange> {
        self.shelves
            .remove(key)
            .map(|row| ViewChange::ShelfRowRemoved(row.key))
    }

    pub fn mark_shelf_updated(&mut self, key: &ShelfKey, at: DateTime<Utc>) -> Option<ViewChange> {
        let row = self.shelves.get_mut(key)?;
        row.update_count = row.update_count.saturating_add(1);
        row.last_updated = Some(at);
        Some(ViewChange::ShelfRowUpdated(key.clone()))
    }

    pub fn replace_shelves(&mut self, keys: Vec<ShelfKey>) -> ViewChange {
        self.shelves = keys
            .into_iter()
            .map(|key| (key.clone(), ShelfRow::new(key)))
            .collect();
        ViewChange::ShelfTableReplaced {
            rows: self.shelves.len(),
        }
    }

    /// Rebuilds the player table from a roster. Later duplicates of a uuid
    /// are dropped.
    pub fn replace_players(&mut self, roster: Vec<PlayerSummary>, format: &str) -> ViewChange {
        self.players.clear();
        self.player_index.clear();
        let listed = roster.len();
        for summary in roster {
            if self.player_index.contains_key(&summary.uuid) {
                continue;
            }
            let last_seen = roster_last_seen(&summary, format);
            self.player_index
                .insert(summary.uuid.clone(), self.players.len());
            self.players.push(PlayerRow {
                uuid: summary.uuid,
                name: summary.name,
                online: summary.online,
                last_seen,
            });
        }
        self.player_status = format!("Loaded {listed} players");
        ViewChange::PlayerTableReplaced {
            rows: self.players.len(),
        }
    }

    pub fn set_player_online(
        &mut self,
        uuid: &PlayerUuid,
        online: bool,
        last_seen: String,
    ) -> Option<ViewChange> {
        let idx = *self.player_index.get(uuid)?;
        let row = &mut self.players[idx];
        row.online = online;
        row.last_seen = last_seen;
        Some(ViewChange::PlayerRowUpdated(uuid.clone()))
    }

    pub fn open_shelf_detail(&mut self, key: ShelfKey) -> ViewChange {
        self.open_shelf = Some(ShelfDetail {
            key: key.clone(),
            books: None,
        });
        ViewChange::ShelfDetailOpened(key)
    }

    pub fn close_shelf_detail(&mut self) -> Option<ViewChange> {
        self.open_shelf
            .take()
            .map(|detail| ViewChange::ShelfDetailClosed(detail.key))
    }

    /// Renders a fetched book list into the shelf detail. Dropped when that
    /// shelf's detail is no longer the open one.
    pub fn render_shelf_detail(
        &mut self,
        key: &ShelfKey,
        books: Vec<BookInfo>,
    ) -> Option<ViewChange> {
        let detail = self.open_shelf.as_mut().filter(|detail| &detail.key == key)?;
        let count = books.len();
        detail.books = Some(books);
        Some(ViewChange::ShelfDetailRendered {
            key: key.clone(),
            books: count,
        })
    }

    pub fn open_player_detail(&mut self, uuid: PlayerUuid, name: PlayerName) -> ViewChange {
        self.viewed_player = Some(PlayerDetail {
            uuid: uuid.clone(),
            name,
            tabs: BTreeMap::new(),
        });
        ViewChange::PlayerDetailOpened(uuid)
    }

    pub fn close_player_detail(&mut self) -> Option<ViewChange> {
        self.viewed_player
            .take()
            .map(|detail| ViewChange::PlayerDetailClosed(detail.uuid))
    }

    pub fn render_inventory(
        &mut self,
        uuid: &PlayerUuid,
        kind: InventoryKind,
        books: Vec<PlayerBookInfo>,
    ) -> Option<ViewChange> {
        let detail = self
            .viewed_player
            .as_mut()
            .filter(|detail| &detail.uuid == uuid)?;
        let count = books.len();
        detail.tabs.insert(kind, books);
        Some(ViewChange::InventoryRendered {
            player: uuid.clone(),
            kind,
            books: count,
        })
    }
}

/// "Now" for online players, otherwise `at` in local time.
pub fn format_last_seen(online: bool, at: DateTime<Utc>, format: &str) -> String {
    if online {
        return LAST_SEEN_NOW.to_string();
    }
    at.with_timezone(&Local).format(format).to_string()
}

fn roster_last_seen(summary: &PlayerSummary, format: &str) -> String {
    if summary.online {
        return LAST_SEEN_NOW.to_string();
    }
    // 0 means the server never saw the player log in.
    match summary
        .last_seen
        .filter(|&millis| millis > 0)
        .and_then(|millis| Utc.timestamp_millis_opt(millis).single())
    {
        Some(at) => format_last_seen(false, at, format),
        None => LAST_SEEN_UNKNOWN.to_string(),
    }
}
