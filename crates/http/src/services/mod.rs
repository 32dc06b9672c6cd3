//! Multi-step operations behind the controllers

pub mod accounts;
pub mod cart;
pub mod checkout;
pub mod ipn;
pub mod orders;
