// Per-member cart: pure snapshot transitions plus sqlx persistence
pub mod models;
pub mod state;

pub use models::*;
pub use state::*;
