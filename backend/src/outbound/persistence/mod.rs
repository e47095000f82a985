//! Persistence adapters implementing the domain's outbound ports.

mod diesel_user_repository;
mod models;
pub mod pool;
pub mod schema;

pub use diesel_user_repository::DieselUserRepository;
pub use pool::{DbPool, OwnedPgConnection, PoolConfig, PoolError};
