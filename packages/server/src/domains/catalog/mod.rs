// Browsable event/workshop catalog with admin CRUD
pub mod models;

pub use models::*;
