pub mod hud;
pub mod panels;
