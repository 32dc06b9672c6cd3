//! Row types mapped from the bookstore schema.

pub mod address;
pub mod book;
pub mod cart;
pub mod order;
pub mod payment;
pub mod user;

pub use address::{Address, AddressChanges, AddressInput};
pub use book::{Book, BookChanges, NewBook};
pub use cart::{Cart, CartLine};
pub use order::{NewOrder, Order, OrderLine};
pub use payment::{NewPayment, Payment};
pub use user::{NewUser, User, UserChanges, UserWithRoles};
