//! Request handlers, one module per route group

pub mod addresses;
pub mod auth;
pub mod books;
pub mod carts;
pub mod chatbot;
pub mod health;
pub mod manage;
pub mod orders;
pub mod payments;
pub mod users;
