use async_trait::async_trait;
use chrono::Utc;
use dashmap::{mapref::entry::Entry, DashMap};
use uuid::Uuid;

use super::{Commit, GameStore, StoreError};
use crate::{
    game::{Board, MoveTransition},
    models::{Game, GameMove, GameStatus, User},
};

/// In-process store backed by concurrent maps.
///
/// Conditional writes run while holding the game's map entry, which gives the same
/// per-game serialization the Postgres store gets from its version check.
#[derive(Default)]
pub struct MemoryStore {
    users: DashMap<Uuid, User>,
    /// Index from username to user id, also used to reserve usernames atomically
    username_index: DashMap<String, Uuid>,
    games: DashMap<Uuid, Game>,
    moves: DashMap<Uuid, Vec<GameMove>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded moves for a game, oldest first
    #[cfg(test)]
    pub fn moves_for(&self, game_id: Uuid) -> Vec<GameMove> {
        self.moves
            .get(&game_id)
            .map(|moves| moves.value().clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl GameStore for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn create_user(&self, username: &str, password_hash: &str) -> Result<User, StoreError> {
        match self.username_index.entry(username.to_string()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateUsername),
            Entry::Vacant(slot) => {
                let now = Utc::now();
                let user = User {
                    id: Uuid::new_v4(),
                    username: username.to_string(),
                    password_hash: password_hash.to_string(),
                    is_admin: false,
                    created_at: now,
                    updated_at: now,
                };
                self.users.insert(user.id, user.clone());
                slot.insert(user.id);
                Ok(user)
            }
        }
    }

    async fn get_user(&self, user_id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.get(&user_id).map(|u| u.value().clone()))
    }

    async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        let user_id = match self.username_index.get(username) {
            Some(id) => *id,
            None => return Ok(None),
        };
        self.get_user(user_id).await
    }

    async fn create_game(&self, player_x_id: Uuid) -> Result<Game, StoreError> {
        let player_x = self
            .users
            .get(&player_x_id)
            .map(|u| u.as_player())
            .ok_or(StoreError::UnknownUser(player_x_id))?;

        let now = Utc::now();
        let game = Game {
            id: Uuid::new_v4(),
            player_x,
            player_o: None,
            status: GameStatus::Waiting,
            board: Board::empty(),
            winner_id: None,
            version: 0,
            last_move: None,
            created_at: now,
            updated_at: now,
        };

        self.games.insert(game.id, game.clone());
        Ok(game)
    }

    async fn get_game(&self, game_id: Uuid) -> Result<Option<Game>, StoreError> {
        Ok(self.games.get(&game_id).map(|g| g.value().clone()))
    }

    async fn join_game(
        &self,
        game_id: Uuid,
        player_o_id: Uuid,
        expected_version: i32,
    ) -> Result<Commit, StoreError> {
        let player_o = self
            .users
            .get(&player_o_id)
            .map(|u| u.as_player())
            .ok_or(StoreError::UnknownUser(player_o_id))?;

        let Some(mut game) = self.games.get_mut(&game_id) else {
            return Ok(Commit::Stale);
        };

        if game.version != expected_version
            || game.status != GameStatus::Waiting
            || game.player_o.is_some()
            || game.player_x.id == player_o_id
        {
            return Ok(Commit::Stale);
        }

        game.player_o = Some(player_o);
        game.status = GameStatus::InProgress;
        game.version += 1;
        game.updated_at = Utc::now();

        Ok(Commit::Applied)
    }

    async fn commit_move(&self, transition: &MoveTransition) -> Result<Commit, StoreError> {
        let Some(mut game) = self.games.get_mut(&transition.game_id) else {
            return Ok(Commit::Stale);
        };

        if game.version != transition.expected_version || game.status != GameStatus::InProgress
        {
            return Ok(Commit::Stale);
        }

        let now = Utc::now();
        let record = GameMove {
            id: Uuid::new_v4(),
            game_id: transition.game_id,
            player_id: transition.player_id,
            position: transition.position as i32,
            seq: transition.seq,
            created_at: now,
        };

        // Board and move history change together while the game entry is held
        game.board = transition.board;
        game.status = transition.status;
        game.winner_id = transition.winner_id;
        game.version += 1;
        game.updated_at = now;
        game.last_move = Some(record.clone());
        self.moves.entry(transition.game_id).or_default().push(record);

        Ok(Commit::Applied)
    }

    async fn list_available_games(&self, user_id: Uuid) -> Result<Vec<Game>, StoreError> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|g| g.status == GameStatus::Waiting && g.player_x.id != user_id)
            .map(|g| g.value().clone())
            .collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(games)
    }

    async fn list_finished_games(&self, user_id: Uuid) -> Result<Vec<Game>, StoreError> {
        let mut games: Vec<Game> = self
            .games
            .iter()
            .filter(|g| g.status == GameStatus::Finished && g.is_player(user_id))
            .map(|g| g.value().clone())
            .collect();
        games.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(games)
    }
}
