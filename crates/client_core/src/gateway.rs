use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{de::DeserializeOwned, Serialize};
use shared::{
    domain::{InventoryKind, PlayerName, ShelfKey},
    error::ApiError,
    protocol::{
        BookInfo, PlayerBookInfo, PlayerBooksQuery, PlayerSummary, ShelfQuery, BOOKSHELF_PATH,
        BOOKSHELVES_PATH, PLAYERS_PATH, PLAYER_BOOKS_PATH,
    },
};
use tracing::debug;

use crate::error::LiveUpdateError;

/// Read side of the dashboard REST API: the two snapshot lists used by
/// bootstrap and the two detail reads used to refresh open details.
#[async_trait]
pub trait DashboardGateway: Send + Sync {
    async fn fetch_players(&self) -> Result<Vec<PlayerSummary>>;
    async fn fetch_shelves(&self) -> Result<Vec<ShelfKey>>;
    async fn fetch_shelf_books(&self, key: &ShelfKey) -> Result<Vec<BookInfo>>;
    async fn fetch_player_books(
        &self,
        player: &PlayerName,
        kind: InventoryKind,
    ) -> Result<Vec<PlayerBookInfo>>;
}

pub struct HttpGateway {
    http: Client,
    server_url: String,
}

impl HttpGateway {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), server_url)
    }

    pub fn with_client(http: Client, server_url: impl Into<String>) -> Self {
        let server_url: String = server_url.into();
        Self {
            http,
            server_url: server_url.trim_end_matches('/').to_string(),
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &'static str) -> Result<T> {
        let url = format!("{}{path}", self.server_url);
        self.send_json(path, self.http.get(url)).await
    }

    async fn get_json_with<Q, T>(&self, path: &'static str, query: &Q) -> Result<T>
    where
        Q: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = format!("{}{path}", self.server_url);
        self.send_json(path, self.http.get(url).query(query)).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        path: &'static str,
        request: RequestBuilder,
    ) -> Result<T> {
        let res = request
            .send()
            .await
            .with_context(|| format!("GET {path} failed"))?;
        let res = ensure_success(path, res).await?;
        let body = res
            .json::<T>()
            .await
            .with_context(|| format!("invalid response body from GET {path}"))?;
        Ok(body)
    }
}

/// Turns a non-2xx response into [`LiveUpdateError::Status`], using the
/// server's `{"error": ...}` body as the message when there is one.
async fn ensure_success(path: &'static str, res: Response) -> Result<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ApiError>(&body)
        .map(|err| err.error)
        .unwrap_or(body);
    Err(LiveUpdateError::Status {
        path,
        status,
        message,
    }
    .into())
}

#[async_trait]
impl DashboardGateway for HttpGateway {
    async fn fetch_players(&self) -> Result<Vec<PlayerSummary>> {
        let players: Vec<PlayerSummary> = self.get_json(PLAYERS_PATH).await?;
        debug!(count = players.len(), "fetched player roster");
        Ok(players)
    }

    async fn fetch_shelves(&self) -> Result<Vec<ShelfKey>> {
        let shelves: Vec<ShelfKey> = self.get_json(BOOKSHELVES_PATH).await?;
        debug!(count = shelves.len(), "fetched bookshelf list");
        Ok(shelves)
    }

    async fn fetch_shelf_books(&self, key: &ShelfKey) -> Result<Vec<BookInfo>> {
        let books: Vec<BookInfo> = self
            .get_json_with(BOOKSHELF_PATH, &ShelfQuery::from(key))
            .await
            .with_context(|| format!("failed to fetch books for shelf {key}"))?;
        debug!(shelf = %key, count = books.len(), "fetched shelf books");
        Ok(books)
    }

    async fn fetch_player_books(
        &self,
        player: &PlayerName,
        kind: InventoryKind,
    ) -> Result<Vec<PlayerBookInfo>> {
        let query = PlayerBooksQuery {
            player: player.to_string(),
            kind,
        };
        let books: Vec<PlayerBookInfo> = self
            .get_json_with(PLAYER_BOOKS_PATH, &query)
            .await
            .with_context(|| format!("failed to fetch {kind} books for player {player}"))?;
        debug!(%player, %kind, count = books.len(), "fetched player books");
        Ok(books)
    }
}
