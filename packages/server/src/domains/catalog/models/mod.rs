pub mod event;
pub mod workshop;

pub use event::*;
pub use workshop::*;
