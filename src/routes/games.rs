use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::JsonBody;
use crate::{
    auth::AuthenticatedUser,
    error::AppError,
    game::{actions, Board, Mark},
    models::{Game, GameStatus, PlayerRef},
    AppState,
};

/// Client-facing view of a game
#[derive(Debug, Serialize)]
pub struct GameView {
    pub id: Uuid,
    pub status: GameStatus,
    pub board: Board,
    pub player_x: PlayerRef,
    pub player_o: Option<PlayerRef>,
    pub winner: Option<Mark>,
    pub is_draw: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_move: Option<LastMoveView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct LastMoveView {
    pub position: i32,
    pub player: Mark,
}

impl From<&Game> for GameView {
    fn from(game: &Game) -> Self {
        let last_move = game.last_move.as_ref().and_then(|mv| {
            game.mark_of(mv.player_id).map(|player| LastMoveView {
                position: mv.position,
                player,
            })
        });

        GameView {
            id: game.id,
            status: game.status,
            board: game.board,
            player_x: game.player_x.clone(),
            player_o: game.player_o.clone(),
            winner: game.winner_mark(),
            is_draw: game.is_draw(),
            last_move,
            created_at: game.created_at,
            updated_at: game.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
    pub game: GameView,
}

impl GameResponse {
    fn new(message: &'static str, game: &Game) -> Self {
        GameResponse {
            message: Some(message),
            game: GameView::from(game),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct AvailableGame {
    pub id: Uuid,
    pub player_x: PlayerRef,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub player_x: PlayerRef,
    pub player_o: Option<PlayerRef>,
    pub winner: Option<PlayerRef>,
    pub status: GameStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub is_winner: bool,
    pub is_draw: bool,
}

impl HistoryItem {
    fn for_viewer(game: &Game, viewer_id: Uuid) -> Self {
        HistoryItem {
            id: game.id,
            player_x: game.player_x.clone(),
            player_o: game.player_o.clone(),
            winner: game.winner().cloned(),
            status: game.status,
            created_at: game.created_at,
            updated_at: game.updated_at,
            is_winner: game.winner_id == Some(viewer_id),
            is_draw: game.is_draw(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GameList<T> {
    pub games: Vec<T>,
}

#[derive(Debug, Deserialize)]
pub struct JoinRequest {
    pub game_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub game_id: Option<String>,
    pub position: Option<i64>,
}

fn parse_game_id(raw: &str) -> Result<Uuid, AppError> {
    raw.trim()
        .parse::<Uuid>()
        .map_err(|_| AppError::Validation("Invalid game ID".to_string()))
}

/// Create a new game with the caller as X
pub async fn create_game(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GameResponse>, AppError> {
    let game = actions::create_game(state.store.as_ref(), user.user_id).await?;
    Ok(Json(GameResponse::new("Game created successfully", &game)))
}

/// Join a waiting game as O
pub async fn join_game(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<JoinRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let game_id = payload
        .game_id
        .ok_or_else(|| AppError::Validation("Game ID is required".to_string()))?;
    let game_id = parse_game_id(&game_id)?;

    let game = actions::join_game(state.store.as_ref(), game_id, user.user_id).await?;
    Ok(Json(GameResponse::new("Joined game successfully", &game)))
}

pub async fn make_move(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    JsonBody(payload): JsonBody<MoveRequest>,
) -> Result<Json<GameResponse>, AppError> {
    let (Some(game_id), Some(position)) = (payload.game_id, payload.position) else {
        return Err(AppError::Validation(
            "Game ID and position are required".to_string(),
        ));
    };
    let game_id = parse_game_id(&game_id)?;

    let game = actions::submit_move(state.store.as_ref(), game_id, user.user_id, position).await?;
    Ok(Json(GameResponse::new("Move made successfully", &game)))
}

/// Fetch a single game. Only its players may see it.
pub async fn get_game(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<GameResponse>, AppError> {
    // A malformed id can't name any game
    let game_id = id
        .parse::<Uuid>()
        .map_err(|_| AppError::NotFound("Game not found".to_string()))?;

    let game = actions::get_game_for_player(state.store.as_ref(), game_id, user.user_id).await?;
    Ok(Json(GameResponse {
        message: None,
        game: GameView::from(&game),
    }))
}

pub async fn list_available_games(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GameList<AvailableGame>>, AppError> {
    let games = actions::list_available_games(state.store.as_ref(), user.user_id).await?;

    tracing::debug!("{} games available to {}", games.len(), user.username);

    Ok(Json(GameList {
        games: games
            .into_iter()
            .map(|game| AvailableGame {
                id: game.id,
                player_x: game.player_x,
                created_at: game.created_at,
            })
            .collect(),
    }))
}

pub async fn get_history(
    user: AuthenticatedUser,
    State(state): State<Arc<AppState>>,
) -> Result<Json<GameList<HistoryItem>>, AppError> {
    let games = actions::list_history(state.store.as_ref(), user.user_id).await?;

    Ok(Json(GameList {
        games: games
            .iter()
            .map(|game| HistoryItem::for_viewer(game, user.user_id))
            .collect(),
    }))
}
