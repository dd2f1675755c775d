use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{queries, Commit, GameStore, StoreError};
use crate::{
    game::MoveTransition,
    models::{Game, User},
};

/// PostgreSQL-backed store
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl GameStore for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(queries::ping(&self.pool).await?)
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        queries::create_user(&self.pool, username, password_hash)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                    StoreError::DuplicateUsername
                }
                e => StoreError::Database(e),
            })
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(queries::get_user(&self.pool, user_id).await?)
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        Ok(queries::get_user_by_username(&self.pool, username).await?)
    }

    async fn create_game(&self, player_x_id: Uuid) -> Result<Game, StoreError> {
        let game_id = queries::create_game(&self.pool, player_x_id)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(ref db) if db.is_foreign_key_violation() => {
                    StoreError::UnknownUser(player_x_id)
                }
                e => StoreError::Database(e),
            })?;

        queries::get_game(&self.pool, game_id)
            .await?
            .ok_or(StoreError::Database(sqlx::Error::RowNotFound))
    }

    async fn get_game(&self, game_id: Uuid) -> Result<Option<Game>, StoreError> {
        Ok(queries::get_game(&self.pool, game_id).await?)
    }

    async fn join_game(
        &self,
        game_id: Uuid,
        player_o_id: Uuid,
        expected_version: i32,
    ) -> Result<Commit, StoreError> {
        let applied =
            queries::join_game(&self.pool, game_id, player_o_id, expected_version).await?;
        Ok(applied.into())
    }

    async fn commit_move(&self, transition: &MoveTransition) -> Result<Commit, StoreError> {
        Ok(queries::commit_move(&self.pool, transition).await?.into())
    }

    async fn list_available_games(&self, user_id: Uuid) -> Result<Vec<Game>, StoreError> {
        Ok(queries::list_available_games(&self.pool, user_id).await?)
    }

    async fn list_finished_games(&self, user_id: Uuid) -> Result<Vec<Game>, StoreError> {
        Ok(queries::list_finished_games(&self.pool, user_id).await?)
    }
}
