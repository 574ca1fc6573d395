pub mod active_combo;

pub use active_combo::*;
