//! Business logic services for the PrismaTech backend

pub mod auth;
pub mod categories;
pub mod customers;
pub mod inventory;
pub mod products;
pub mod reports;
pub mod sales;

pub use auth::AuthService;
pub use categories::CategoryService;
pub use customers::CustomerService;
pub use inventory::InventoryService;
pub use products::ProductService;
pub use reports::ReportingService;
pub use sales::SaleService;
