// Identity-provider token handling
pub mod jwt;

pub use jwt::*;
