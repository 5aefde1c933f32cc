pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod payments;
pub mod products;
pub mod users;
