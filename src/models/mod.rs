pub mod game;
pub mod user;

pub use game::{Game, GameMove, GameRow, GameStatus, PlayerRef};
pub use user::User;
