// HTTP routes
pub mod cart;
pub mod catalog;
pub mod combo;
pub mod health;
pub mod member;
pub mod payment;

pub use cart::*;
pub use catalog::*;
pub use combo::*;
pub use health::*;
pub use member::*;
pub use payment::*;
