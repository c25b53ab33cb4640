use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::{
    gateway::DashboardGateway,
    view::{ViewChange, ViewState},
};

/// Fetches the player roster and the shelf list concurrently. Each half
/// replaces its table and is handed to `emit` as soon as its own fetch
/// succeeds; a failed half is logged and leaves its table as it was.
///
/// Push events may be applied while the fetches are in flight; the snapshot
/// simply overwrites whatever they did to the same table.
pub async fn bootstrap<F>(
    gateway: &dyn DashboardGateway,
    view: &Mutex<ViewState>,
    last_seen_format: &str,
    emit: F,
) where
    F: Fn(ViewChange) + Sync,
{
    let emit = &emit;
    let players = async {
        match gateway.fetch_players().await {
            Ok(roster) => {
                let change = view.lock().await.replace_players(roster, last_seen_format);
                emit(change);
            }
            Err(error) => warn!("bootstrap: player roster fetch failed: {error:#}"),
        }
    };
    let shelves = async {
        match gateway.fetch_shelves().await {
            Ok(keys) => {
                let change = view.lock().await.replace_shelves(keys);
                emit(change);
            }
            Err(error) => warn!("bootstrap: shelf list fetch failed: {error:#}"),
        }
    };
    futures::join!(players, shelves);

    let guard = view.lock().await;
    info!(
        players = guard.players().len(),
        shelves = guard.shelf_count(),
        "bootstrap finished"
    );
}
