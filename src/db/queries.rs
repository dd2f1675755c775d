use sqlx::{types::Json, PgPool, Result};
use uuid::Uuid;

use crate::{
    game::{Board, MoveTransition},
    models::{Game, GameRow, GameStatus, User},
};

/// Game columns plus both players' usernames and the most recent move.
/// Read in a single statement so the board, version and last mover always agree.
const GAME_SNAPSHOT_SELECT: &str = r#"
    SELECT
        g.id,
        g.player_x_id,
        ux.username AS player_x_username,
        g.player_o_id,
        uo.username AS player_o_username,
        g.status,
        g.board,
        g.winner_id,
        g.version,
        g.created_at,
        g.updated_at,
        lm.id AS last_move_id,
        lm.player_id AS last_move_player_id,
        lm.position AS last_move_position,
        lm.seq AS last_move_seq,
        lm.created_at AS last_move_at
    FROM games g
    JOIN users ux ON ux.id = g.player_x_id
    LEFT JOIN users uo ON uo.id = g.player_o_id
    LEFT JOIN LATERAL (
        SELECT m.id, m.player_id, m.position, m.seq, m.created_at
        FROM moves m
        WHERE m.game_id = g.id
        ORDER BY m.seq DESC
        LIMIT 1
    ) lm ON TRUE
"#;

pub async fn ping(pool: &PgPool) -> Result<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

// User queries
pub async fn create_user(pool: &PgPool, username: &str, password_hash: &str) -> Result<User> {
    sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, username, password_hash)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(username)
    .bind(password_hash)
    .fetch_one(pool)
    .await
}

pub async fn get_user(pool: &PgPool, user_id: Uuid) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_username(pool: &PgPool, username: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await
}

// Game queries
pub async fn create_game(pool: &PgPool, player_x_id: Uuid) -> Result<Uuid> {
    let game_id = Uuid::new_v4();

    sqlx::query(
        r#"
        INSERT INTO games (id, player_x_id, status, board, version)
        VALUES ($1, $2, $3, $4, 0)
        "#,
    )
    .bind(game_id)
    .bind(player_x_id)
    .bind(GameStatus::Waiting)
    .bind(Json(Board::empty()))
    .execute(pool)
    .await?;

    Ok(game_id)
}

pub async fn get_game(pool: &PgPool, game_id: Uuid) -> Result<Option<Game>> {
    let query = format!("{GAME_SNAPSHOT_SELECT} WHERE g.id = $1");

    let row = sqlx::query_as::<_, GameRow>(&query)
        .bind(game_id)
        .fetch_optional(pool)
        .await?;

    Ok(row.map(Game::from))
}

/// Assign player O, conditional on the game still waiting at `expected_version`.
///
/// Returns false when another join (or anything else) got there first.
pub async fn join_game(
    pool: &PgPool,
    game_id: Uuid,
    player_o_id: Uuid,
    expected_version: i32,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE games
        SET player_o_id = $1,
            status = $2,
            version = version + 1,
            updated_at = NOW()
        WHERE id = $3
          AND status = $4
          AND player_o_id IS NULL
          AND player_x_id <> $1
          AND version = $5
        "#,
    )
    .bind(player_o_id)
    .bind(GameStatus::InProgress)
    .bind(game_id)
    .bind(GameStatus::Waiting)
    .bind(expected_version)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Write the new board/status/winner and append the move row in one transaction.
///
/// The update is conditioned on the version the move was validated against, so a
/// concurrent move that committed first makes this one return false and roll back.
pub async fn commit_move(pool: &PgPool, transition: &MoveTransition) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let result = sqlx::query(
        r#"
        UPDATE games
        SET board = $1,
            status = $2,
            winner_id = $3,
            version = version + 1,
            updated_at = NOW()
        WHERE id = $4
          AND status = $5
          AND version = $6
        "#,
    )
    .bind(Json(transition.board))
    .bind(transition.status)
    .bind(transition.winner_id)
    .bind(transition.game_id)
    .bind(GameStatus::InProgress)
    .bind(transition.expected_version)
    .execute(&mut *tx)
    .await?;

    if result.rows_affected() != 1 {
        tx.rollback().await?;
        return Ok(false);
    }

    let inserted = sqlx::query(
        r#"
        INSERT INTO moves (id, game_id, player_id, position, seq)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(transition.game_id)
    .bind(transition.player_id)
    .bind(transition.position as i32)
    .bind(transition.seq)
    .execute(&mut *tx)
    .await;

    match inserted {
        Ok(_) => {}
        // (game_id, position) or (game_id, seq) already taken
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            tx.rollback().await?;
            return Ok(false);
        }
        Err(e) => return Err(e),
    }

    tx.commit().await?;
    Ok(true)
}

/// Waiting games not created by `user_id`, newest first
pub async fn list_available_games(pool: &PgPool, user_id: Uuid) -> Result<Vec<Game>> {
    let query = format!(
        "{GAME_SNAPSHOT_SELECT} WHERE g.status = $1 AND g.player_x_id <> $2 ORDER BY g.created_at DESC"
    );

    let rows = sqlx::query_as::<_, GameRow>(&query)
        .bind(GameStatus::Waiting)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Game::from).collect())
}

/// Finished games `user_id` played in, most recently updated first
pub async fn list_finished_games(pool: &PgPool, user_id: Uuid) -> Result<Vec<Game>> {
    let query = format!(
        "{GAME_SNAPSHOT_SELECT} WHERE g.status = $1 AND (g.player_x_id = $2 OR g.player_o_id = $2) ORDER BY g.updated_at DESC"
    );

    let rows = sqlx::query_as::<_, GameRow>(&query)
        .bind(GameStatus::Finished)
        .bind(user_id)
        .fetch_all(pool)
        .await?;

    Ok(rows.into_iter().map(Game::from).collect())
}
