pub mod bubble;
pub mod death_zone;
pub mod grid;
pub mod highscore;
pub mod session;
pub mod shooter;
