use thiserror::Error;
use uuid::Uuid;

use super::{
    board::{Board, Mark, BOARD_SIZE},
    evaluator::{Evaluator, Outcome},
};
use crate::models::{Game, GameStatus};

/// Why a move was refused. No state is mutated for any of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MoveRejection {
    #[error("Game not found")]
    NotFound,
    #[error("Game is not in progress")]
    NotInProgress,
    #[error("You are not a player in this game")]
    NotAPlayer,
    #[error("Position must be between 0 and 8")]
    OutOfRange,
    #[error("Position is already occupied")]
    Occupied,
    #[error("Not your turn")]
    WrongTurn,
}

impl MoveRejection {
    /// Stable machine-readable reason code
    pub fn code(self) -> &'static str {
        match self {
            MoveRejection::NotFound => "not_found",
            MoveRejection::NotInProgress => "not_in_progress",
            MoveRejection::NotAPlayer => "not_a_player",
            MoveRejection::OutOfRange => "out_of_range",
            MoveRejection::Occupied => "occupied",
            MoveRejection::WrongTurn => "wrong_turn",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum JoinRejection {
    #[error("Game not found")]
    NotFound,
    #[error("Game is not available to join")]
    NotAvailable,
    #[error("Cannot join your own game")]
    OwnGame,
}

impl JoinRejection {
    pub fn code(self) -> &'static str {
        match self {
            JoinRejection::NotFound => "not_found",
            JoinRejection::NotAvailable => "not_available",
            JoinRejection::OwnGame => "own_game",
        }
    }
}

/// Everything the store needs to commit an accepted move
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveTransition {
    pub game_id: Uuid,
    pub player_id: Uuid,
    pub mark: Mark,
    pub position: usize,
    /// Number of marks on the board after this move
    pub seq: i32,
    pub board: Board,
    pub status: GameStatus,
    pub winner_id: Option<Uuid>,
    pub outcome: Outcome,
    /// The commit only succeeds if the stored game is still at this version
    pub expected_version: i32,
}

/// Whose turn it is, given the mark of the most recent mover
pub fn next_to_move(last_mover: Option<Mark>) -> Mark {
    match last_mover {
        None => Mark::X,
        Some(mark) => mark.opponent(),
    }
}

pub struct MoveValidator;

impl MoveValidator {
    /// Check a proposed move against a game snapshot, returning the acting
    /// player's mark and the board index on success.
    pub fn validate_move(
        game: Option<&Game>,
        player_id: Uuid,
        position: i64,
    ) -> Result<(Mark, usize), MoveRejection> {
        let game = game.ok_or(MoveRejection::NotFound)?;

        if game.status != GameStatus::InProgress {
            return Err(MoveRejection::NotInProgress);
        }

        let mark = game.mark_of(player_id).ok_or(MoveRejection::NotAPlayer)?;

        let position = usize::try_from(position)
            .ok()
            .filter(|p| *p < BOARD_SIZE)
            .ok_or(MoveRejection::OutOfRange)?;

        if !game.board.is_empty_at(position) {
            return Err(MoveRejection::Occupied);
        }

        if next_to_move(game.last_mover()) != mark {
            return Err(MoveRejection::WrongTurn);
        }

        Ok((mark, position))
    }

    /// Validate a move and compute the resulting game state without mutating anything
    pub fn apply_move(
        game: Option<&Game>,
        player_id: Uuid,
        position: i64,
    ) -> Result<MoveTransition, MoveRejection> {
        let (mark, position) = Self::validate_move(game, player_id, position)?;
        // validate_move already rejected a missing game
        let game = game.ok_or(MoveRejection::NotFound)?;

        let mut board = game.board;
        board.place(position, mark);

        let outcome = Evaluator::evaluate(&board);
        let (status, winner_id) = match outcome {
            Outcome::InProgress => (GameStatus::InProgress, None),
            Outcome::Draw => (GameStatus::Finished, None),
            Outcome::Won(winning_mark) => (
                GameStatus::Finished,
                game.player_for(winning_mark).map(|p| p.id),
            ),
        };

        Ok(MoveTransition {
            game_id: game.id,
            player_id,
            mark,
            position,
            seq: board.marks_placed() as i32,
            board,
            status,
            winner_id,
            outcome,
            expected_version: game.version,
        })
    }

    /// Check that `player_id` may join `game` as player O
    pub fn validate_join(game: Option<&Game>, player_id: Uuid) -> Result<(), JoinRejection> {
        let game = game.ok_or(JoinRejection::NotFound)?;

        if game.status != GameStatus::Waiting || game.player_o.is_some() {
            return Err(JoinRejection::NotAvailable);
        }

        if game.player_x.id == player_id {
            return Err(JoinRejection::OwnGame);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{game::fixtures::in_progress_game, GameMove};
    use chrono::Utc;

    /// Commit a transition onto an in-memory snapshot the way a store would
    fn commit(game: &mut Game, transition: &MoveTransition) {
        game.board = transition.board;
        game.status = transition.status;
        game.winner_id = transition.winner_id;
        game.version += 1;
        game.last_move = Some(GameMove {
            id: Uuid::new_v4(),
            game_id: game.id,
            player_id: transition.player_id,
            position: transition.position as i32,
            seq: transition.seq,
            created_at: Utc::now(),
        });
    }

    fn player_o_id(game: &Game) -> Uuid {
        game.player_o.as_ref().unwrap().id
    }

    /// Play positions alternately starting with X, asserting every move is accepted
    fn play(game: &mut Game, positions: &[i64]) -> MoveTransition {
        let mut last = None;
        for (i, &position) in positions.iter().enumerate() {
            let player = if i % 2 == 0 {
                game.player_x.id
            } else {
                player_o_id(game)
            };
            let transition = MoveValidator::apply_move(Some(game), player, position)
                .unwrap_or_else(|e| panic!("Move {} at {} rejected: {}", i, position, e));
            commit(game, &transition);
            last = Some(transition);
        }
        last.expect("at least one move")
    }

    #[test]
    fn test_next_to_move() {
        assert_eq!(next_to_move(None), Mark::X);
        assert_eq!(next_to_move(Some(Mark::X)), Mark::O);
        assert_eq!(next_to_move(Some(Mark::O)), Mark::X);
    }

    #[test]
    fn test_turn_alternates_through_full_game() {
        let mut game = in_progress_game();
        let x = game.player_x.id;
        let o = player_o_id(&game);

        for (i, position) in [0_i64, 1, 2, 4, 3, 5, 7, 6, 8].into_iter().enumerate() {
            let (expected, other) = if i % 2 == 0 { (x, o) } else { (o, x) };

            assert_eq!(
                MoveValidator::validate_move(Some(&game), other, position),
                Err(MoveRejection::WrongTurn),
                "Move {} should not belong to the previous mover",
                i
            );

            let transition = MoveValidator::apply_move(Some(&game), expected, position).unwrap();
            commit(&mut game, &transition);
        }
    }

    #[test]
    fn test_first_move_belongs_to_x() {
        let game = in_progress_game();
        assert_eq!(
            MoveValidator::validate_move(Some(&game), player_o_id(&game), 4),
            Err(MoveRejection::WrongTurn)
        );
        assert_eq!(
            MoveValidator::validate_move(Some(&game), game.player_x.id, 4),
            Ok((Mark::X, 4))
        );
    }

    #[test]
    fn test_missing_game() {
        assert_eq!(
            MoveValidator::validate_move(None, Uuid::new_v4(), 0),
            Err(MoveRejection::NotFound)
        );
    }

    #[test]
    fn test_rejected_unless_in_progress() {
        let mut game = in_progress_game();
        let x = game.player_x.id;

        game.status = GameStatus::Waiting;
        assert_eq!(
            MoveValidator::validate_move(Some(&game), x, 0),
            Err(MoveRejection::NotInProgress)
        );

        game.status = GameStatus::Finished;
        assert_eq!(
            MoveValidator::validate_move(Some(&game), x, 0),
            Err(MoveRejection::NotInProgress)
        );
    }

    #[test]
    fn test_outsider_rejected() {
        let game = in_progress_game();
        assert_eq!(
            MoveValidator::validate_move(Some(&game), Uuid::new_v4(), 0),
            Err(MoveRejection::NotAPlayer)
        );
    }

    #[test]
    fn test_out_of_range_positions() {
        let game = in_progress_game();
        for position in [-1_i64, 9, 100, i64::MIN, i64::MAX] {
            assert_eq!(
                MoveValidator::validate_move(Some(&game), game.player_x.id, position),
                Err(MoveRejection::OutOfRange),
                "Position {} should be out of range",
                position
            );
        }
    }

    #[test]
    fn test_occupied_rejected_regardless_of_turn() {
        let mut game = in_progress_game();
        play(&mut game, &[4]);

        // O's turn: occupied
        assert_eq!(
            MoveValidator::validate_move(Some(&game), player_o_id(&game), 4),
            Err(MoveRejection::Occupied)
        );
        // X out of turn: still reported as occupied
        assert_eq!(
            MoveValidator::validate_move(Some(&game), game.player_x.id, 4),
            Err(MoveRejection::Occupied)
        );
    }

    #[test]
    fn test_top_row_win_transition() {
        let mut game = in_progress_game();
        let transition = play(&mut game, &[0, 4, 1, 5, 2]);

        assert_eq!(transition.outcome, Outcome::Won(Mark::X));
        assert_eq!(transition.status, GameStatus::Finished);
        assert_eq!(transition.winner_id, Some(game.player_x.id));
        assert_eq!(transition.seq, 5);
        assert_eq!(game.winner_mark(), Some(Mark::X));
    }

    #[test]
    fn test_draw_transition() {
        let mut game = in_progress_game();
        let transition = play(&mut game, &[0, 1, 2, 4, 3, 5, 7, 6, 8]);

        assert_eq!(transition.outcome, Outcome::Draw);
        assert_eq!(transition.status, GameStatus::Finished);
        assert!(transition.winner_id.is_none());
        assert!(game.is_draw());
    }

    #[test]
    fn test_no_moves_after_finish() {
        let mut game = in_progress_game();
        play(&mut game, &[0, 4, 1, 5, 2]);

        assert_eq!(
            MoveValidator::validate_move(Some(&game), player_o_id(&game), 8),
            Err(MoveRejection::NotInProgress)
        );
    }

    #[test]
    fn test_apply_carries_expected_version() {
        let mut game = in_progress_game();
        game.version = 7;
        let transition = MoveValidator::apply_move(Some(&game), game.player_x.id, 0).unwrap();
        assert_eq!(transition.expected_version, 7);
        assert_eq!(transition.status, GameStatus::InProgress);
        // The snapshot itself is untouched
        assert!(game.board.is_empty_at(0));
    }

    #[test]
    fn test_winner_only_with_completed_triple() {
        let mut game = in_progress_game();
        let moves = [4_i64, 0, 8, 2, 1, 7, 3, 5, 6];
        let x = game.player_x.id;
        let o = player_o_id(&game);

        for (i, &position) in moves.iter().enumerate() {
            let player = if i % 2 == 0 { x } else { o };
            let transition = MoveValidator::apply_move(Some(&game), player, position).unwrap();
            match transition.outcome {
                Outcome::Won(mark) => {
                    assert_eq!(transition.board.winning_mark(), Some(mark));
                    assert!(transition.seq >= 5);
                }
                Outcome::Draw => assert!(transition.board.is_full()),
                Outcome::InProgress => assert!(transition.winner_id.is_none()),
            }
            commit(&mut game, &transition);
            if transition.status == GameStatus::Finished {
                break;
            }
        }
    }

    #[test]
    fn test_join_rules() {
        let mut game = in_progress_game();
        let creator = game.player_x.id;

        assert_eq!(
            MoveValidator::validate_join(None, creator),
            Err(JoinRejection::NotFound)
        );
        assert_eq!(
            MoveValidator::validate_join(Some(&game), Uuid::new_v4()),
            Err(JoinRejection::NotAvailable)
        );

        game.status = GameStatus::Waiting;
        game.player_o = None;
        assert_eq!(
            MoveValidator::validate_join(Some(&game), creator),
            Err(JoinRejection::OwnGame)
        );
        assert_eq!(MoveValidator::validate_join(Some(&game), Uuid::new_v4()), Ok(()));
    }

    #[test]
    fn test_rejection_codes() {
        assert_eq!(MoveRejection::WrongTurn.code(), "wrong_turn");
        assert_eq!(MoveRejection::Occupied.to_string(), "Position is already occupied");
        assert_eq!(JoinRejection::NotAvailable.code(), "not_available");
        assert_eq!(
            JoinRejection::NotAvailable.to_string(),
            "Game is not available to join"
        );
    }
}
