pub mod cluster_pop;
pub mod input;
pub mod session;
