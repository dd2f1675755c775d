use thiserror::Error;
use uuid::Uuid;

use super::validator::{JoinRejection, MoveRejection, MoveValidator};
use crate::{
    db::{Commit, GameStore, StoreError},
    models::Game,
};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Move(#[from] MoveRejection),
    #[error(transparent)]
    Join(#[from] JoinRejection),
    #[error("Game not found")]
    NotFound,
    #[error("You are not a player in this game")]
    NotAPlayer,
    /// A concurrent request changed the game between our read and our write
    #[error("Game was updated by another request, refresh and try again")]
    Conflict,
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Create a waiting game with `player_id` as X
pub async fn create_game(store: &dyn GameStore, player_id: Uuid) -> Result<Game, GameError> {
    let game = store.create_game(player_id).await?;
    tracing::info!("Game {} created by {}", game.id, player_id);
    Ok(game)
}

/// Join a waiting game as O. Only the first of several racing joins succeeds.
pub async fn join_game(
    store: &dyn GameStore,
    game_id: Uuid,
    player_id: Uuid,
) -> Result<Game, GameError> {
    let game = store.get_game(game_id).await?;
    MoveValidator::validate_join(game.as_ref(), player_id)?;
    let expected_version = game.map(|g| g.version).ok_or(JoinRejection::NotFound)?;

    match store.join_game(game_id, player_id, expected_version).await? {
        Commit::Applied => {
            tracing::info!("Player {} joined game {}", player_id, game_id);
            reload(store, game_id).await
        }
        Commit::Stale => {
            tracing::info!(
                "Join of game {} by {} lost a race with another request",
                game_id,
                player_id
            );
            Err(JoinRejection::NotAvailable.into())
        }
    }
}

/// Validate and apply a move. The write is conditioned on the version the move was
/// validated against, so two racing moves never both succeed.
pub async fn submit_move(
    store: &dyn GameStore,
    game_id: Uuid,
    player_id: Uuid,
    position: i64,
) -> Result<Game, GameError> {
    let game = store.get_game(game_id).await?;

    let transition = MoveValidator::apply_move(game.as_ref(), player_id, position).map_err(|e| {
        tracing::debug!(
            "Move by {} at {} in game {} rejected: {}",
            player_id,
            position,
            game_id,
            e.code()
        );
        e
    })?;

    match store.commit_move(&transition).await? {
        Commit::Applied => {
            tracing::info!(
                "Player {} placed {} at {} in game {} ({:?})",
                player_id,
                transition.mark,
                transition.position,
                game_id,
                transition.outcome
            );
            if transition.outcome.is_finished() {
                tracing::info!("Game {} finished", game_id);
            }
            reload(store, game_id).await
        }
        Commit::Stale => {
            tracing::warn!(
                "Move by {} in game {} conflicted with a concurrent update",
                player_id,
                game_id
            );
            Err(GameError::Conflict)
        }
    }
}

/// Fetch a game that `viewer_id` plays in
pub async fn get_game_for_player(
    store: &dyn GameStore,
    game_id: Uuid,
    viewer_id: Uuid,
) -> Result<Game, GameError> {
    let game = store.get_game(game_id).await?.ok_or(GameError::NotFound)?;

    if !game.is_player(viewer_id) {
        return Err(GameError::NotAPlayer);
    }

    Ok(game)
}

pub async fn list_available_games(
    store: &dyn GameStore,
    user_id: Uuid,
) -> Result<Vec<Game>, GameError> {
    Ok(store.list_available_games(user_id).await?)
}

pub async fn list_history(store: &dyn GameStore, user_id: Uuid) -> Result<Vec<Game>, GameError> {
    Ok(store.list_finished_games(user_id).await?)
}

async fn reload(store: &dyn GameStore, game_id: Uuid) -> Result<Game, GameError> {
    store.get_game(game_id).await?.ok_or(GameError::NotFound)
}
