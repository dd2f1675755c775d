use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use uuid::Uuid;

use crate::{
    game::MoveTransition,
    models::{Game, User},
};

pub mod memory;
pub mod postgres;
pub mod queries;

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub async fn create_pool(database_url: &str, max_connections: u32) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("username already exists")]
    DuplicateUsername,
    #[error("unknown user {0}")]
    UnknownUser(Uuid),
}

/// Result of a write conditioned on the caller's view of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Commit {
    Applied,
    /// The game changed since it was read; nothing was written
    Stale,
}

impl From<bool> for Commit {
    fn from(applied: bool) -> Self {
        if applied {
            Commit::Applied
        } else {
            Commit::Stale
        }
    }
}

/// Persistent storage for users, games and moves.
///
/// Joins and moves are compare-and-swap writes keyed on the game's version, which
/// is what serializes racing requests against the same game.
#[async_trait]
pub trait GameStore: Send + Sync {
    async fn ping(&self) -> Result<(), StoreError>;

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError>;

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError>;

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    /// Create a waiting game with an empty board and `player_x_id` as X
    async fn create_game(&self, player_x_id: Uuid) -> Result<Game, StoreError>;

    /// Game snapshot including players and the most recent move
    async fn get_game(&self, game_id: Uuid) -> Result<Option<Game>, StoreError>;

    async fn join_game(
        &self,
        game_id: Uuid,
        player_o_id: Uuid,
        expected_version: i32,
    ) -> Result<Commit, StoreError>;

    /// Atomically apply the board/status/winner update and record the move
    async fn commit_move(&self, transition: &MoveTransition) -> Result<Commit, StoreError>;

    async fn list_available_games(&self, user_id: Uuid) -> Result<Vec<Game>, StoreError>;

    async fn list_finished_games(&self, user_id: Uuid) -> Result<Vec<Game>, StoreError>;
}
