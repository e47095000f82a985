//! Inbound HTTP surface: handlers, error envelope, payload hooks.

pub mod error;
pub mod health;
pub mod users;

pub use error::{json_error_handler, ApiError, ApiResult, ErrorBody};
