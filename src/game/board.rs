use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of cells on the board
pub const BOARD_SIZE: usize = 9;

/// The 8 fixed position triples that win the game when uniformly marked
pub const TRIPLES: [[usize; 3]; 8] = [
    // Rows
    [0, 1, 2],
    [3, 4, 5],
    [6, 7, 8],
    // Columns
    [0, 3, 6],
    [1, 4, 7],
    [2, 5, 8],
    // Diagonals
    [0, 4, 8],
    [2, 4, 6],
];

/// A player's mark. X always belongs to the game creator and moves first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mark {
    X,
    O,
}

impl Mark {
    pub fn opponent(self) -> Mark {
        match self {
            Mark::X => Mark::O,
            Mark::O => Mark::X,
        }
    }
}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mark::X => write!(f, "X"),
            Mark::O => write!(f, "O"),
        }
    }
}

/// 3x3 board, row-major, serialized as an array of 9 nullable marks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board([Option<Mark>; BOARD_SIZE]);

impl Board {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns the mark at `position`, or `None` for an empty or out-of-range cell
    pub fn get(&self, position: usize) -> Option<Mark> {
        self.0.get(position).copied().flatten()
    }

    pub fn is_empty_at(&self, position: usize) -> bool {
        position < BOARD_SIZE && self.0[position].is_none()
    }

    /// Place a mark. Callers validate the position first.
    pub fn place(&mut self, position: usize, mark: Mark) {
        self.0[position] = Some(mark);
    }

    pub fn is_full(&self) -> bool {
        self.0.iter().all(Option::is_some)
    }

    /// Number of marks on the board (equals the number of moves played)
    pub fn marks_placed(&self) -> usize {
        self.0.iter().filter(|cell| cell.is_some()).count()
    }

    /// Mark of the first uniformly marked triple, if any
    pub fn winning_mark(&self) -> Option<Mark> {
        TRIPLES.iter().find_map(|[a, b, c]| match self.0[*a] {
            Some(mark) if self.0[*b] == Some(mark) && self.0[*c] == Some(mark) => Some(mark),
            _ => None,
        })
    }
}

impl From<[Option<Mark>; BOARD_SIZE]> for Board {
    fn from(cells: [Option<Mark>; BOARD_SIZE]) -> Self {
        Self(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board_from(marks: &[(usize, Mark)]) -> Board {
        let mut board = Board::empty();
        for (position, mark) in marks {
            board.place(*position, *mark);
        }
        board
    }

    #[test]
    fn test_empty_board() {
        let board = Board::empty();
        assert_eq!(board.marks_placed(), 0);
        assert!(!board.is_full());
        assert!(board.winning_mark().is_none());
        assert!((0..BOARD_SIZE).all(|p| board.is_empty_at(p)));
    }

    #[test]
    fn test_is_empty_at_out_of_range() {
        let board = Board::empty();
        assert!(!board.is_empty_at(9));
        assert_eq!(board.get(42), None);
    }

    #[test]
    fn test_every_triple_wins() {
        for triple in TRIPLES {
            let board = board_from(&triple.map(|p| (p, Mark::O)));
            assert_eq!(
                board.winning_mark(),
                Some(Mark::O),
                "Triple {:?} should be a win",
                triple
            );
        }
    }

    #[test]
    fn test_mixed_triple_is_not_a_win() {
        let board = board_from(&[(0, Mark::X), (1, Mark::O), (2, Mark::X)]);
        assert!(board.winning_mark().is_none());
    }

    #[test]
    fn test_full_board_without_winner() {
        // X O X / O O X / X X O
        let board = board_from(&[
            (0, Mark::X),
            (1, Mark::O),
            (2, Mark::X),
            (3, Mark::O),
            (4, Mark::O),
            (5, Mark::X),
            (6, Mark::X),
            (7, Mark::X),
            (8, Mark::O),
        ]);
        assert!(board.is_full());
        assert!(board.winning_mark().is_none());
    }

    #[test]
    fn test_serializes_as_nullable_array() {
        let board = board_from(&[(0, Mark::X), (4, Mark::O)]);
        let json = serde_json::to_string(&board).unwrap();
        assert_eq!(json, r#"["X",null,null,null,"O",null,null,null,null]"#);

        let parsed: Board = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, board);
    }

    #[test]
    fn test_rejects_wrong_length() {
        let result = serde_json::from_str::<Board>(r#"["X",null]"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_opponent() {
        assert_eq!(Mark::X.opponent(), Mark::O);
        assert_eq!(Mark::O.opponent(), Mark::X);
    }
}
