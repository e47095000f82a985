//! User management service: a transactional CRUD HTTP API over PostgreSQL.
//!
//! Layered hexagonally: `domain` holds the aggregate, validation, and
//! business operations behind a storage port; `outbound::persistence` is the
//! Diesel adapter; `api` is the actix handler surface; `middleware` scopes
//! one database transaction to each request.

pub mod api;
pub mod domain;
pub mod middleware;
pub mod outbound;

pub use middleware::{Transaction, TransactionScope};
