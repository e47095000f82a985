//! Transport- and storage-agnostic core: the user aggregate, validation
//! rules, business operations, and the persistence port they depend on.

mod error;
mod password;
pub mod ports;
mod user;
mod user_service;
pub mod validation;

pub use error::{Error, ErrorCode};
pub use password::hash_password;
pub use user::{CreateUserResponse, DeleteUserResponse, Sex, User, UserProfile};
pub use user_service::UserService;
pub use validation::{CreateUserRequest, FieldViolation, UpdateUserRequest, ValidationError};
