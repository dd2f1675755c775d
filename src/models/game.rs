use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use uuid::Uuid;

use crate::game::{Board, Mark};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GameStatus {
    /// Created, waiting for a second player
    Waiting,
    InProgress,
    /// Won or drawn; the game and its moves are immutable from here on
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub id: Uuid,
    pub username: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct GameMove {
    pub id: Uuid,
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub position: i32,
    /// Number of marks on the board after this move (1-9)
    pub seq: i32,
    pub created_at: DateTime<Utc>,
}

/// A game together with its players and most recent move, read as one snapshot
#[derive(Debug, Clone)]
pub struct Game {
    pub id: Uuid,
    pub player_x: PlayerRef,
    pub player_o: Option<PlayerRef>,
    pub status: GameStatus,
    pub board: Board,
    pub winner_id: Option<Uuid>,
    /// Optimistic concurrency token, bumped on every join or move
    pub version: i32,
    pub last_move: Option<GameMove>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Game {
    /// Mark held by `user_id` in this game, if they are a player
    pub fn mark_of(&self, user_id: Uuid) -> Option<Mark> {
        if self.player_x.id == user_id {
            Some(Mark::X)
        } else if self.player_o.as_ref().is_some_and(|o| o.id == user_id) {
            Some(Mark::O)
        } else {
            None
        }
    }

    pub fn player_for(&self, mark: Mark) -> Option<&PlayerRef> {
        match mark {
            Mark::X => Some(&self.player_x),
            Mark::O => self.player_o.as_ref(),
        }
    }

    pub fn is_player(&self, user_id: Uuid) -> bool {
        self.mark_of(user_id).is_some()
    }

    pub fn winner_mark(&self) -> Option<Mark> {
        self.winner_id.and_then(|id| self.mark_of(id))
    }

    pub fn winner(&self) -> Option<&PlayerRef> {
        self.winner_mark().and_then(|mark| self.player_for(mark))
    }

    /// A finished game with no winner
    pub fn is_draw(&self) -> bool {
        self.status == GameStatus::Finished && self.winner_id.is_none()
    }

    /// Mark of whoever made the most recent move
    pub fn last_mover(&self) -> Option<Mark> {
        self.last_move
            .as_ref()
            .and_then(|last| self.mark_of(last.player_id))
    }
}

/// Flat row returned by the game snapshot query (game + players + latest move)
#[derive(Debug, FromRow)]
pub struct GameRow {
    pub id: Uuid,
    pub player_x_id: Uuid,
    pub player_x_username: String,
    pub player_o_id: Option<Uuid>,
    pub player_o_username: Option<String>,
    pub status: GameStatus,
    pub board: Json<Board>,
    pub winner_id: Option<Uuid>,
    pub version: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_move_id: Option<Uuid>,
    pub last_move_player_id: Option<Uuid>,
    pub last_move_position: Option<i32>,
    pub last_move_seq: Option<i32>,
    pub last_move_at: Option<DateTime<Utc>>,
}

impl From<GameRow> for Game {
    fn from(row: GameRow) -> Self {
        let player_o = match (row.player_o_id, row.player_o_username) {
            (Some(id), Some(username)) => Some(PlayerRef { id, username }),
            _ => None,
        };

        let last_move = match (
            row.last_move_id,
            row.last_move_player_id,
            row.last_move_position,
            row.last_move_seq,
            row.last_move_at,
        ) {
            (Some(id), Some(player_id), Some(position), Some(seq), Some(created_at)) => {
                Some(GameMove {
                    id,
                    game_id: row.id,
                    player_id,
                    position,
                    seq,
                    created_at,
                })
            }
            _ => None,
        };

        Game {
            id: row.id,
            player_x: PlayerRef {
                id: row.player_x_id,
                username: row.player_x_username,
            },
            player_o,
            status: row.status,
            board: row.board.0,
            winner_id: row.winner_id,
            version: row.version,
            last_move,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}
