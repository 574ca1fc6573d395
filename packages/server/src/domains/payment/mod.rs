// Payment orders and gateway verification
pub mod models;
pub mod verify;

pub use models::*;
pub use verify::*;
