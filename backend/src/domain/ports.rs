//! Outbound port for user persistence.
//!
//! The domain only sees this trait; the Diesel adapter lives in
//! `outbound::persistence`. The associated `Tx` type carries whatever
//! transaction handle the adapter needs, keeping the domain free of any
//! storage types.

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use super::user::User;

/// Failures surfaced by a [`UserRepository`] implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UserPersistenceError {
    /// The backing store could not be reached.
    #[error("storage connection failure: {message}")]
    Connection { message: String },
    /// A statement failed for a reason other than the ones modelled below.
    #[error("storage query failure: {message}")]
    Query { message: String },
    /// An insert collided with the unique login constraint.
    #[error("login is already taken")]
    DuplicateLogin,
    /// An update was requested with no fields to persist.
    #[error("no fields to update")]
    EmptyUpdate,
}

impl UserPersistenceError {
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }
}

/// Storage gateway for the user aggregate.
///
/// Every call runs inside the transaction handle passed as `tx`; commit and
/// rollback are owned by the caller's scope, never by the gateway.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Transaction handle threaded through each call.
    type Tx: Send;

    /// Persist a new user and return the server-assigned identifier.
    ///
    /// The unique-login constraint is authoritative: a concurrent insert of
    /// the same login surfaces as [`UserPersistenceError::DuplicateLogin`].
    async fn create_user(
        &self,
        tx: &mut Self::Tx,
        user: &User,
        password_hash: &str,
    ) -> Result<Uuid, UserPersistenceError>;

    /// Look a user up by identifier. Absence is a value, not an error.
    async fn find_by_id(
        &self,
        tx: &mut Self::Tx,
        id: Uuid,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Look a user up by login. Absence is a value, not an error.
    async fn find_by_login(
        &self,
        tx: &mut Self::Tx,
        login: &str,
    ) -> Result<Option<User>, UserPersistenceError>;

    /// Fetch every user. An empty store yields an empty list.
    async fn list_users(&self, tx: &mut Self::Tx) -> Result<Vec<User>, UserPersistenceError>;

    /// Persist the updatable profile fields of `user` and return the row as
    /// stored. Fields that are zero-valued on `user` are left untouched;
    /// if none remain, [`UserPersistenceError::EmptyUpdate`] is returned
    /// without touching the store.
    async fn update_user(
        &self,
        tx: &mut Self::Tx,
        user: &User,
    ) -> Result<User, UserPersistenceError>;

    /// Delete a user by identifier and return the identifier of the deleted
    /// row.
    async fn delete_user(&self, tx: &mut Self::Tx, id: Uuid)
        -> Result<Uuid, UserPersistenceError>;
}
