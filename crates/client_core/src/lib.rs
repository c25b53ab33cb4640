use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use futures::future::join_all;
use shared::domain::{InventoryKind, PlayerName, PlayerUuid, ShelfKey};
use tokio::{
    sync::{broadcast, mpsc, Mutex},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

pub mod bootstrap;
pub mod config;
pub mod error;
pub mod gateway;
pub mod reconcile;
pub mod router;
pub mod transport;
pub mod view;

pub use config::{load_settings, Settings};
pub use error::LiveUpdateError;
pub use gateway::{DashboardGateway, HttpGateway};
pub use reconcile::FollowUp;
pub use transport::ChannelEvent;
pub use view::{ViewChange, ViewState};

use router::EventRouter;
use transport::{connect_live_channel, live_updates_url};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    Connected,
    Disconnected,
    View(ViewChange),
    /// A pushed message that could not be decoded. The session carries on.
    Error(String),
}

/// One dashboard session: owns the view, applies pushed events in arrival
/// order and runs detail refreshes as separate tasks.
pub struct LiveClient {
    gateway: Arc<dyn DashboardGateway>,
    router: EventRouter,
    server_url: String,
    last_seen_format: String,
    channel_capacity: usize,
    view: Mutex<ViewState>,
    events: broadcast::Sender<ClientEvent>,
}

impl LiveClient {
    pub fn new(settings: &Settings) -> Arc<Self> {
        Self::with_gateway(settings, Arc::new(HttpGateway::new(&settings.server_url)))
    }

    pub fn with_gateway(settings: &Settings, gateway: Arc<dyn DashboardGateway>) -> Arc<Self> {
        let capacity = settings.event_capacity.max(1);
        let (events, _) = broadcast::channel(capacity);
        Arc::new(Self {
            gateway,
            router: EventRouter::new(settings.last_seen_format.clone()),
            server_url: settings.server_url.clone(),
            last_seen_format: settings.last_seen_format.clone(),
            channel_capacity: capacity,
            view: Mutex::new(ViewState::new()),
            events,
        })
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> ViewState {
        self.view.lock().await.clone()
    }

    /// Connects the push channel and drives the session on a background task
    /// until the server closes it.
    pub async fn connect(self: &Arc<Self>) -> Result<JoinHandle<()>> {
        let url = live_updates_url(&self.server_url)?;
        let channel = connect_live_channel(&url, self.channel_capacity)
            .await
            .with_context(|| format!("failed to open live updates for {}", self.server_url))?;
        let client = Arc::clone(self);
        Ok(tokio::spawn(async move { client.run(channel).await }))
    }

    pub async fn run(self: &Arc<Self>, mut channel: mpsc::Receiver<ChannelEvent>) {
        while let Some(event) = channel.recv().await {
            match event {
                ChannelEvent::Opened => {
                    let _ = self.events.send(ClientEvent::Connected);
                    let client = Arc::clone(self);
                    tokio::spawn(async move { client.bootstrap().await });
                }
                ChannelEvent::Message(text) => match self.handle_message(&text).await {
                    Ok(Some(follow_up)) => {
                        let client = Arc::clone(self);
                        tokio::spawn(async move { client.perform_follow_up(follow_up).await });
                    }
                    Ok(None) => {}
                    Err(err) => {
                        warn!(error = %err, "dropping live-update message");
                        let _ = self.events.send(ClientEvent::Error(err.to_string()));
                    }
                },
                ChannelEvent::Closed => break,
            }
        }
        info!(server_url = %self.server_url, "live session ended");
        let _ = self.events.send(ClientEvent::Disconnected);
    }

    /// Applies one pushed message to the view and returns the detail refresh
    /// it calls for, without performing it.
    pub async fn handle_message(&self, raw: &str) -> Result<Option<FollowUp>, LiveUpdateError> {
        let reconciled = {
            let mut view = self.view.lock().await;
            self.router.route(&mut view, raw, Utc::now())?
        };
        self.emit_changes(reconciled.changes);
        Ok(reconciled.follow_up)
    }

    pub async fn bootstrap(&self) {
        bootstrap::bootstrap(
            self.gateway.as_ref(),
            &self.view,
            &self.last_seen_format,
            |change| self.emit_changes([change]),
        )
        .await;
    }

    /// Fetch-then-render for a handler's follow-up. Failures are logged and
    /// leave the detail as it was.
    pub async fn perform_follow_up(&self, follow_up: FollowUp) {
        let result = match &follow_up {
            FollowUp::RefreshShelfDetail(key) => self.refresh_shelf_detail(key).await,
            FollowUp::ReloadInventories {
                player_uuid,
                player_name,
                kinds,
            } => self.reload_inventories(player_uuid, player_name, kinds).await,
        };
        if let Err(err) = result {
            warn!(?follow_up, "detail refresh failed: {err:#}");
        }
    }

    pub async fn open_shelf(&self, key: ShelfKey) -> Result<()> {
        let change = self.view.lock().await.open_shelf_detail(key.clone());
        self.emit_changes([change]);
        self.refresh_shelf_detail(&key).await
    }

    pub async fn close_shelf(&self) {
        let change = self.view.lock().await.close_shelf_detail();
        self.emit_changes(change);
    }

    pub async fn view_player(&self, uuid: PlayerUuid, name: PlayerName) -> Result<()> {
        let change = self
            .view
            .lock()
            .await
            .open_player_detail(uuid.clone(), name.clone());
        self.emit_changes([change]);
        self.reload_inventories(&uuid, &name, &InventoryKind::ALL).await
    }

    pub async fn close_player(&self) {
        let change = self.view.lock().await.close_player_detail();
        self.emit_changes(change);
    }

    async fn refresh_shelf_detail(&self, key: &ShelfKey) -> Result<()> {
        let books = self.gateway.fetch_shelf_books(key).await?;
        let change = self.view.lock().await.render_shelf_detail(key, books);
        if change.is_none() {
            debug!(shelf = %key, "shelf detail closed before its books arrived");
        }
        self.emit_changes(change);
        Ok(())
    }

    /// Fetches every requested tab concurrently and renders each one that
    /// arrives; reports the first failure after the others are applied.
    async fn reload_inventories(
        &self,
        uuid: &PlayerUuid,
        name: &PlayerName,
        kinds: &[InventoryKind],
    ) -> Result<()> {
        let fetches = kinds.iter().map(|&kind| async move {
            (kind, self.gateway.fetch_player_books(name, kind).await)
        });
        let results = join_all(fetches).await;

        let mut first_error = None;
        for (kind, result) in results {
            match result {
                Ok(books) => {
                    let change = self.view.lock().await.render_inventory(uuid, kind, books);
                    self.emit_changes(change);
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    fn emit_changes(&self, changes: impl IntoIterator<Item = ViewChange>) {
        for change in changes {
            let _ = self.events.send(ClientEvent::View(change));
        }
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
