pub mod clustering;
pub mod rapier;
