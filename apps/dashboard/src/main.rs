use anyhow::Result;
use clap::Parser;
use client_core::{load_settings, ClientEvent, LiveClient, ViewChange};
use shared::domain::{PlayerName, PlayerUuid, ShelfKey};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Follows a bookshelf dashboard server and logs every change to its view.
#[derive(Parser, Debug)]
struct Args {
    /// Overrides `server_url` from dashboard.toml and the environment.
    #[arg(long)]
    server_url: Option<String>,
    /// Keep this shelf's book list open, as `world,x,y,z`.
    #[arg(long, value_parser = parse_shelf)]
    shelf: Option<ShelfKey>,
    /// Keep this player's inventory tabs open.
    #[arg(long, requires = "player_name")]
    player_uuid: Option<String>,
    #[arg(long, requires = "player_uuid")]
    player_name: Option<String>,
}

fn parse_shelf(raw: &str) -> Result<ShelfKey, String> {
    let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
    let [world, x, y, z] = parts.as_slice() else {
        return Err(format!("expected world,x,y,z but got '{raw}'"));
    };
    let coord = |v: &str| {
        v.parse::<i32>()
            .map_err(|err| format!("invalid coordinate '{v}': {err}"))
    };
    Ok(ShelfKey::new(*world, coord(*x)?, coord(*y)?, coord(*z)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url.trim_end_matches('/').to_string();
    }
    info!(server_url = %settings.server_url, "connecting to dashboard");

    let client = LiveClient::new(&settings);
    let mut events = client.subscribe_events();
    let session = client.connect().await?;

    if let Some(key) = args.shelf {
        if let Err(err) = client.open_shelf(key).await {
            warn!("failed to load shelf books: {err:#}");
        }
    }
    if let (Some(uuid), Some(name)) = (args.player_uuid, args.player_name) {
        if let Err(err) = client
            .view_player(PlayerUuid::new(uuid), PlayerName::new(name))
            .await
        {
            warn!("failed to load player inventories: {err:#}");
        }
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                session.abort();
                break;
            }
            event = events.recv() => match event {
                Ok(ClientEvent::Disconnected) => {
                    info!("server closed the live channel");
                    break;
                }
                Ok(ClientEvent::View(change)) => log_change(&client, change).await,
                Ok(other) => info!(?other, "session event"),
                Err(RecvError::Lagged(skipped)) => warn!(skipped, "view log fell behind"),
                Err(RecvError::Closed) => break,
            }
        }
    }

    Ok(())
}

async fn log_change(client: &LiveClient, change: ViewChange) {
    let view = client.snapshot().await;
    match &change {
        ViewChange::PlayerTableReplaced { .. } => {
            info!(status = view.player_status(), "player table replaced");
            for row in view.players() {
                info!(
                    uuid = %row.uuid,
                    name = %row.name,
                    online = row.online,
                    last_seen = %row.last_seen,
                    "player"
                );
            }
        }
        ViewChange::PlayerRowUpdated(uuid) => {
            if let Some(row) = view.player(uuid) {
                info!(%uuid, online = row.online, last_seen = %row.last_seen, "player status");
            }
        }
        ViewChange::ShelfDetailRendered { key, .. } => {
            let books = view
                .open_shelf()
                .and_then(|detail| detail.books.as_deref())
                .unwrap_or_default();
            info!(shelf = %key, books = books.len(), "shelf detail");
            for book in books {
                info!(slot = book.slot, title = %book.title, author = %book.author, "book");
            }
        }
        other => info!(change = ?other, shelves = view.shelf_count(), "view changed"),
    }
}
