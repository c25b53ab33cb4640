//! Websocket adapter for the dashboard's push channel.
//!
//! The rest of the crate only sees [`ChannelEvent`]s on an mpsc queue, so a
//! test (or another transport) can drive a session without a socket.

use futures::StreamExt;
use shared::protocol::LIVE_UPDATES_PATH;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::error::LiveUpdateError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelEvent {
    Opened,
    Message(String),
    Closed,
}

/// Maps the dashboard origin onto its websocket endpoint.
pub fn live_updates_url(server_url: &str) -> Result<Url, LiveUpdateError> {
    let server_url = server_url.trim_end_matches('/');
    let ws_url = if let Some(rest) = server_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = server_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else {
        return Err(LiveUpdateError::InvalidServerUrl(server_url.to_string()));
    };
    Url::parse(&format!("{ws_url}{LIVE_UPDATES_PATH}"))
        .map_err(|_| LiveUpdateError::InvalidServerUrl(server_url.to_string()))
}

/// Opens the push channel. `Opened` is queued once the handshake succeeds,
/// followed by every text frame, then a single `Closed`.
pub async fn connect_live_channel(
    url: &Url,
    capacity: usize,
) -> Result<mpsc::Receiver<ChannelEvent>, LiveUpdateError> {
    let (ws_stream, _) = connect_async(url.as_str())
        .await
        .map_err(|source| LiveUpdateError::Connect {
            url: url.to_string(),
            source: Box::new(source),
        })?;
    info!(%url, "live channel connected");

    let (tx, rx) = mpsc::channel(capacity.max(1));
    let (_ws_writer, mut ws_reader) = ws_stream.split();
    let url = url.clone();
    tokio::spawn(async move {
        if tx.send(ChannelEvent::Opened).await.is_err() {
            return;
        }
        while let Some(msg) = ws_reader.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if tx.send(ChannelEvent::Message(text)).await.is_err() {
                        debug!(%url, "live channel consumer dropped");
                        return;
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(error) => {
                    warn!(%url, %error, "live channel receive failed");
                    break;
                }
            }
        }
        info!(%url, "live channel closed");
        let _ = tx.send(ChannelEvent::Closed).await;
    });

    Ok(rx)
}
