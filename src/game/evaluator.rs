use super::board::{Board, Mark};

/// Result of evaluating a board after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    InProgress,
    Won(Mark),
    Draw,
}

impl Outcome {
    pub fn is_finished(self) -> bool {
        !matches!(self, Outcome::InProgress)
    }
}

pub struct Evaluator;

impl Evaluator {
    /// Evaluate a post-move board.
    ///
    /// A completed triple wins. With no completed triple, a full board is a draw.
    /// Since exactly one mark is placed per move and turns alternate, at most one
    /// mark can own a completed triple.
    pub fn evaluate(board: &Board) -> Outcome {
        if let Some(mark) = board.winning_mark() {
            Outcome::Won(mark)
        } else if board.is_full() {
            Outcome::Draw
        } else {
            Outcome::InProgress
        }
    }
}
