// Fest attendees, synced from the identity provider
pub mod models;

pub use models::*;
