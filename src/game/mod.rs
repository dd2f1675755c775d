// Game engine modules

pub mod actions;
pub mod board;
pub mod evaluator;
pub mod validator;

pub use actions::GameError;
pub use board::{Board, Mark};
pub use validator::{JoinRejection, MoveRejection, MoveTransition};
