//! Request middleware for the PrismaTech backend

pub mod auth;
pub mod rate_limit;

pub use auth::{auth_middleware, require_role, AuthUser, CurrentUser};
pub use rate_limit::{rate_limit_middleware, RateLimiter};
