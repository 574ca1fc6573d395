// Kriya tech-fest backend - API core
//
// Event/workshop catalog, per-member carts, combo packages and the hosted
// checkout payment flow. The server owns every business rule; clients render
// whatever snapshot it returns and never mutate state locally.

pub mod common;
pub mod config;
pub mod domains;
pub mod server;

pub use config::*;
