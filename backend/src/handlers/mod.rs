//! HTTP handlers for the PrismaTech backend

mod auth;
mod categories;
mod customers;
mod health;
mod inventory;
mod products;
mod reports;
mod sales;

pub use auth::*;
pub use categories::*;
pub use customers::*;
pub use health::*;
pub use inventory::*;
pub use products::*;
pub use reports::*;
pub use sales::*;
