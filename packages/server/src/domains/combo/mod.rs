// Combo packages: static catalog, selection rules, active selection per member
pub mod catalog;
pub mod models;

pub use catalog::*;
pub use models::*;
