//! Repositories for database operations

#[cfg(test)]
pub mod memory;
pub mod shop;

pub use shop::{ShopRepository, ShopStore};
