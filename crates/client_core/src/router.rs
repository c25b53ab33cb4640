use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use shared::protocol::{EventKind, LiveEvent, RawEnvelope};
use tracing::debug;

use crate::{
    error::LiveUpdateError,
    reconcile::{self, Reconciled},
    view::ViewState,
};

/// Decodes a pushed text frame. `Ok(None)` means the envelope was well formed
/// but names a kind this client does not know.
pub fn decode_envelope(raw: &str) -> Result<Option<LiveEvent>, LiveUpdateError> {
    let envelope: RawEnvelope =
        serde_json::from_str(raw).map_err(LiveUpdateError::MalformedEnvelope)?;
    let Some(kind) = EventKind::from_wire(&envelope.kind) else {
        debug!(kind = %envelope.kind, "ignoring unknown live-update kind");
        return Ok(None);
    };

    let data = envelope.data;
    let event = match kind {
        EventKind::BookshelfAdded => LiveEvent::BookshelfAdded(payload(kind, data)?),
        EventKind::BookshelfRemoved => LiveEvent::BookshelfRemoved(payload(kind, data)?),
        EventKind::BookshelfUpdated => LiveEvent::BookshelfUpdated(payload(kind, data)?),
        EventKind::PlayerStatusUpdated => LiveEvent::PlayerStatusUpdated(payload(kind, data)?),
        EventKind::PlayerListUpdated => LiveEvent::PlayerListUpdated(payload(kind, data)?),
        EventKind::PlayerBookUpdated => LiveEvent::PlayerBookUpdated(payload(kind, data)?),
    };
    Ok(Some(event))
}

fn payload<T: DeserializeOwned>(
    kind: EventKind,
    data: serde_json::Value,
) -> Result<T, LiveUpdateError> {
    serde_json::from_value(data).map_err(|source| LiveUpdateError::InvalidPayload {
        kind: kind.as_wire(),
        source,
    })
}

#[derive(Debug, Clone)]
pub struct EventRouter {
    last_seen_format: String,
}

impl EventRouter {
    pub fn new(last_seen_format: impl Into<String>) -> Self {
        Self {
            last_seen_format: last_seen_format.into(),
        }
    }

    pub fn dispatch(
        &self,
        view: &mut ViewState,
        event: LiveEvent,
        now: DateTime<Utc>,
    ) -> Reconciled {
        debug!(kind = event.kind().as_wire(), "dispatching live update");
        match event {
            LiveEvent::BookshelfAdded(key) => reconcile::on_shelf_added(view, key),
            LiveEvent::BookshelfRemoved(key) => reconcile::on_shelf_removed(view, key),
            LiveEvent::BookshelfUpdated(key) => reconcile::on_shelf_updated(view, key, now),
            LiveEvent::PlayerStatusUpdated(status) => {
                reconcile::on_player_status(view, status, now, &self.last_seen_format)
            }
            LiveEvent::PlayerListUpdated(roster) => {
                reconcile::on_player_list(view, roster, &self.last_seen_format)
            }
            LiveEvent::PlayerBookUpdated(player) => reconcile::on_player_books(view, player),
        }
    }

    /// Decode and dispatch in one step; unknown kinds reconcile to nothing.
    pub fn route(
        &self,
        view: &mut ViewState,
        raw: &str,
        now: DateTime<Utc>,
    ) -> Result<Reconciled, LiveUpdateError> {
        match decode_envelope(raw)? {
            Some(event) => Ok(self.dispatch(view, event, now)),
            None => Ok(Reconciled::default()),
        }
    }
}
