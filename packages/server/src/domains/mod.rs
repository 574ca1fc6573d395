// Domain layer: models own their sqlx queries, pure rules live beside them

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod combo;
pub mod member;
pub mod payment;
