//! One handler per push-event kind.
//!
//! Each handler applies its row action to the [`ViewState`] immediately and
//! reports whether an open detail needs refetching. The fetch itself is the
//! caller's job, so handlers never suspend and always run in delivery order.

use chrono::{DateTime, Utc};
use shared::{
    domain::{InventoryKind, PlayerIdentity, PlayerName, PlayerUuid, ShelfKey},
    protocol::{PlayerStatus, PlayerSummary},
};
use tracing::debug;

use crate::view::{format_last_seen, ViewChange, ViewState};

/// Detail refresh a handler asks for after updating rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FollowUp {
    RefreshShelfDetail(ShelfKey),
    ReloadInventories {
        player_uuid: PlayerUuid,
        player_name: PlayerName,
        kinds: Vec<InventoryKind>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reconciled {
    pub changes: Vec<ViewChange>,
    pub follow_up: Option<FollowUp>,
}

impl Reconciled {
    fn from_change(change: Option<ViewChange>) -> Self {
        Self {
            changes: change.into_iter().collect(),
            follow_up: None,
        }
    }
}

pub fn on_shelf_added(view: &mut ViewState, key: ShelfKey) -> Reconciled {
    Reconciled::from_change(view.insert_shelf(key))
}

pub fn on_shelf_removed(view: &mut ViewState, key: ShelfKey) -> Reconciled {
    let mut changes: Vec<ViewChange> = view.remove_shelf(&key).into_iter().collect();
    if view.is_shelf_detail_open(&key) {
        changes.extend(view.close_shelf_detail());
    }
    Reconciled {
        changes,
        follow_up: None,
    }
}

pub fn on_shelf_updated(view: &mut ViewState, key: ShelfKey, now: DateTime<Utc>) -> Reconciled {
    let change = view.mark_shelf_updated(&key, now);
    if change.is_none() {
        debug!(shelf = %key, "bookshelf-updated for a shelf not in view");
    }
    let follow_up = view
        .is_shelf_detail_open(&key)
        .then_some(FollowUp::RefreshShelfDetail(key));
    Reconciled {
        changes: change.into_iter().collect(),
        follow_up,
    }
}

pub fn on_player_status(
    view: &mut ViewState,
    status: PlayerStatus,
    now: DateTime<Utc>,
    last_seen_format: &str,
) -> Reconciled {
    if view.player(&status.player_uuid).is_none() {
        debug!(
            player = %status.player_name,
            uuid = %status.player_uuid,
            "player-status-updated for a player not in view"
        );
        return Reconciled::default();
    }
    let last_seen = format_last_seen(status.online, now, last_seen_format);
    Reconciled::from_change(view.set_player_online(
        &status.player_uuid,
        status.online,
        last_seen,
    ))
}

pub fn on_player_list(
    view: &mut ViewState,
    roster: Vec<PlayerSummary>,
    last_seen_format: &str,
) -> Reconciled {
    Reconciled::from_change(Some(view.replace_players(roster, last_seen_format)))
}

pub fn on_player_books(view: &ViewState, player: PlayerIdentity) -> Reconciled {
    if !view.is_viewing_player(&player.player_uuid) {
        return Reconciled::default();
    }
    Reconciled {
        changes: Vec::new(),
        follow_up: Some(FollowUp::ReloadInventories {
            player_uuid: player.player_uuid,
            player_name: player.player_name,
            kinds: InventoryKind::ALL.to_vec(),
        }),
    }
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
