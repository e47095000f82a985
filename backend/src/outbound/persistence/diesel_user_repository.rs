//! PostgreSQL-backed `UserRepository` implementation using Diesel ORM.
//!
//! Every operation runs on the request's transaction handle; this adapter
//! never begins, commits, or rolls back. The unique constraint on `login` is
//! the authoritative duplicate check and is mapped to a dedicated error.

use async_trait::async_trait;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{UserPersistenceError, UserRepository};
use crate::domain::User;
use crate::middleware::TransactionScope;

use super::models::{NewUserRow, UserChangeset, UserRow};
use super::schema::users;

/// Diesel-backed implementation of the `UserRepository` port.
#[derive(Debug, Clone, Copy, Default)]
pub struct DieselUserRepository;

impl DieselUserRepository {
    pub fn new() -> Self {
        Self
    }
}

/// Map Diesel errors to domain persistence errors.
fn map_diesel_error(error: diesel::result::Error) -> UserPersistenceError {
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(
            error_type = %std::any::type_name_of_val(&error),
            "diesel operation failed"
        ),
    }

    match error {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            UserPersistenceError::DuplicateLogin
        }
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _) => {
            UserPersistenceError::connection("database connection error")
        }
        DieselError::QueryBuilderError(_) => UserPersistenceError::query("database query error"),
        _ => UserPersistenceError::query("database error"),
    }
}

#[async_trait]
impl UserRepository for DieselUserRepository {
    type Tx = TransactionScope;

    async fn create_user(
        &self,
        tx: &mut TransactionScope,
        user: &User,
        password_hash: &str,
    ) -> Result<Uuid, UserPersistenceError> {
        let new_row = NewUserRow::from_user(user, password_hash);
        let mut conn = tx.lock().await;

        diesel::insert_into(users::table)
            .values(&new_row)
            .returning(users::id)
            .get_result(&mut *conn)
            .await
            .map_err(map_diesel_error)
    }

    async fn find_by_id(
        &self,
        tx: &mut TransactionScope,
        id: Uuid,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = tx.lock().await;

        let row: Option<UserRow> = users::table
            .filter(users::id.eq(id))
            .select(UserRow::as_select())
            .first(&mut *conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(UserRow::into_user))
    }

    async fn find_by_login(
        &self,
        tx: &mut TransactionScope,
        login: &str,
    ) -> Result<Option<User>, UserPersistenceError> {
        let mut conn = tx.lock().await;

        let row: Option<UserRow> = users::table
            .filter(users::login.eq(login))
            .select(UserRow::as_select())
            .first(&mut *conn)
            .await
            .optional()
            .map_err(map_diesel_error)?;

        Ok(row.map(UserRow::into_user))
    }

    async fn list_users(
        &self,
        tx: &mut TransactionScope,
    ) -> Result<Vec<User>, UserPersistenceError> {
        let mut conn = tx.lock().await;

        let rows: Vec<UserRow> = users::table
            .order(users::created_at.asc())
            .select(UserRow::as_select())
            .load(&mut *conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(rows.into_iter().map(UserRow::into_user).collect())
    }

    async fn update_user(
        &self,
        tx: &mut TransactionScope,
        user: &User,
    ) -> Result<User, UserPersistenceError> {
        let changeset = UserChangeset::from_user(user);
        if changeset.is_empty() {
            return Err(UserPersistenceError::EmptyUpdate);
        }
        let mut conn = tx.lock().await;

        let row: UserRow = diesel::update(users::table.filter(users::id.eq(user.id)))
            .set(&changeset)
            .returning(UserRow::as_returning())
            .get_result(&mut *conn)
            .await
            .map_err(map_diesel_error)?;

        Ok(row.into_user())
    }

    async fn delete_user(
        &self,
        tx: &mut TransactionScope,
        id: Uuid,
    ) -> Result<Uuid, UserPersistenceError> {
        let mut conn = tx.lock().await;

        diesel::delete(users::table.filter(users::id.eq(id)))
            .returning(users::id)
            .get_result(&mut *conn)
            .await
            .map_err(map_diesel_error)
    }
}
