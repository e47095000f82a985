//! Actix middleware.

pub mod transaction;

pub use transaction::{Transaction, TransactionScope};
