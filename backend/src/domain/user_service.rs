//! Business operations over the user aggregate.
//!
//! Each operation validates its input, talks to the storage gateway through
//! the transaction handle it is given, and maps every failure to a domain
//! [`Error`]. Infrastructure causes are logged here and replaced with a bare
//! internal error before they can reach a client.

use tracing::error;
use uuid::Uuid;

use super::error::Error;
use super::password::hash_password;
use super::ports::{UserPersistenceError, UserRepository};
use super::user::{CreateUserResponse, DeleteUserResponse, User, UserProfile};
use super::validation::{CreateUserRequest, UpdateUserRequest, ValidationError};

/// Application service implementing the user CRUD operations.
pub struct UserService<R> {
    repository: R,
}

impl<R> UserService<R>
where
    R: UserRepository,
{
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Register a new user.
    ///
    /// The login is checked for availability up front for a friendly error,
    /// but the unique constraint remains authoritative: a concurrent insert
    /// that slips past the check still reports the login as taken.
    pub async fn create_user(
        &self,
        tx: &mut R::Tx,
        payload: &CreateUserRequest,
    ) -> Result<CreateUserResponse, Error> {
        payload.validate().map_err(map_validation_error)?;

        let existing = self
            .repository
            .find_by_login(tx, &payload.login)
            .await
            .map_err(|err| internal(&err, "create user: lookup by login"))?;
        if existing.is_some() {
            return Err(Error::login_taken());
        }

        let user = payload.to_user();
        let password_hash = hash_password(&payload.password)?;
        let id = self
            .repository
            .create_user(tx, &user, &password_hash)
            .await
            .map_err(|err| match err {
                UserPersistenceError::DuplicateLogin => Error::login_taken(),
                other => internal(&other, "create user: insert"),
            })?;

        Ok(CreateUserResponse {
            created: id.to_string(),
        })
    }

    /// Fetch a single user by the identifier from the request path.
    pub async fn get_user(&self, tx: &mut R::Tx, id: &str) -> Result<UserProfile, Error> {
        let id = parse_user_id(id)?;
        let user = self
            .repository
            .find_by_id(tx, id)
            .await
            .map_err(|err| internal(&err, "get user: lookup by id"))?
            .ok_or_else(|| Error::not_found("User not found."))?;
        Ok(user.into())
    }

    /// List every user. An empty store is a successful empty list.
    pub async fn list_users(&self, tx: &mut R::Tx) -> Result<Vec<UserProfile>, Error> {
        let users = self
            .repository
            .list_users(tx)
            .await
            .map_err(|err| internal(&err, "list users"))?;
        Ok(users.into_iter().map(UserProfile::from).collect())
    }

    /// Apply a partial profile update and return the stored result.
    pub async fn update_user(
        &self,
        tx: &mut R::Tx,
        id: &str,
        payload: &UpdateUserRequest,
    ) -> Result<UserProfile, Error> {
        let id = parse_user_id(id)?;
        payload.validate().map_err(map_validation_error)?;

        self.repository
            .find_by_id(tx, id)
            .await
            .map_err(|err| internal(&err, "update user: lookup by id"))?
            .ok_or_else(|| Error::not_found("User not found."))?;

        // Only the fields present in the payload travel to the gateway; the
        // row as stored after the update comes back merged.
        let mut patch = User {
            id,
            ..User::default()
        };
        patch.apply(payload);

        let updated = self
            .repository
            .update_user(tx, &patch)
            .await
            .map_err(|err| match err {
                UserPersistenceError::EmptyUpdate => {
                    Error::invalid_request("No fields to update.")
                }
                other => internal(&other, "update user: persist"),
            })?;
        Ok(updated.into())
    }

    /// Delete a user by the identifier from the request path.
    pub async fn delete_user(
        &self,
        tx: &mut R::Tx,
        id: &str,
    ) -> Result<DeleteUserResponse, Error> {
        let id = parse_user_id(id)?;
        self.repository
            .find_by_id(tx, id)
            .await
            .map_err(|err| internal(&err, "delete user: lookup by id"))?
            .ok_or_else(|| Error::not_found("User not found."))?;

        let deleted = self
            .repository
            .delete_user(tx, id)
            .await
            .map_err(|err| internal(&err, "delete user: delete"))?;
        Ok(DeleteUserResponse {
            deleted: deleted.to_string(),
        })
    }
}

fn parse_user_id(id: &str) -> Result<Uuid, Error> {
    Uuid::parse_str(id).map_err(|_| Error::invalid_request("Invalid user id."))
}

fn map_validation_error(err: ValidationError) -> Error {
    match err {
        ValidationError::Invalid(_) => Error::invalid_request(err.to_string()),
        ValidationError::Engine(cause) => {
            error!(error = %cause, "validation engine failure");
            Error::internal()
        }
    }
}

fn internal(err: &UserPersistenceError, operation: &str) -> Error {
    error!(error = %err, operation, "user persistence failure");
    Error::internal()
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::Utc;
    use rstest::rstest;

    use super::*;
    use crate::domain::error::ErrorCode;

    #[derive(Default)]
    struct StubState {
        users: Vec<(User, String)>,
        fail_lookups: bool,
        // Pretend a concurrent insert wins between the pre-check and the
        // insert: lookups see nothing, the insert hits the constraint.
        race_duplicate: bool,
    }

    #[derive(Default)]
    struct StubUserRepository {
        state: Mutex<StubState>,
    }

    impl StubUserRepository {
        fn failing_lookups() -> Self {
            Self {
                state: Mutex::new(StubState {
                    fail_lookups: true,
                    ..StubState::default()
                }),
            }
        }

        fn racing_duplicate() -> Self {
            Self {
                state: Mutex::new(StubState {
                    race_duplicate: true,
                    ..StubState::default()
                }),
            }
        }

        fn stored(&self, id: Uuid) -> Option<User> {
            let state = self.state.lock().expect("state lock");
            state
                .users
                .iter()
                .find(|(user, _)| user.id == id)
                .map(|(user, _)| user.clone())
        }
    }

    #[async_trait::async_trait]
    impl UserRepository for StubUserRepository {
        type Tx = ();

        async fn create_user(
            &self,
            _tx: &mut (),
            user: &User,
            password_hash: &str,
        ) -> Result<Uuid, UserPersistenceError> {
            let mut state = self.state.lock().expect("state lock");
            if state.race_duplicate {
                return Err(UserPersistenceError::DuplicateLogin);
            }
            if state.users.iter().any(|(u, _)| u.login == user.login) {
                return Err(UserPersistenceError::DuplicateLogin);
            }
            let mut stored = user.clone();
            stored.id = Uuid::new_v4();
            stored.is_active = true;
            stored.created_at = Utc::now();
            stored.updated_at = stored.created_at;
            let id = stored.id;
            state.users.push((stored, password_hash.to_owned()));
            Ok(id)
        }

        async fn find_by_id(
            &self,
            _tx: &mut (),
            id: Uuid,
        ) -> Result<Option<User>, UserPersistenceError> {
            let state = self.state.lock().expect("state lock");
            if state.fail_lookups {
                return Err(UserPersistenceError::connection("connection refused"));
            }
            Ok(state
                .users
                .iter()
                .find(|(user, _)| user.id == id)
                .map(|(user, _)| user.clone()))
        }

        async fn find_by_login(
            &self,
            _tx: &mut (),
            login: &str,
        ) -> Result<Option<User>, UserPersistenceError> {
            let state = self.state.lock().expect("state lock");
            if state.fail_lookups {
                return Err(UserPersistenceError::connection("connection refused"));
            }
            Ok(state
                .users
                .iter()
                .find(|(user, _)| user.login == login)
                .map(|(user, _)| user.clone()))
        }

        async fn list_users(&self, _tx: &mut ()) -> Result<Vec<User>, UserPersistenceError> {
            let state = self.state.lock().expect("state lock");
            Ok(state.users.iter().map(|(user, _)| user.clone()).collect())
        }

        async fn update_user(
            &self,
            _tx: &mut (),
            user: &User,
        ) -> Result<User, UserPersistenceError> {
            let present = [
                &user.email,
                &user.first_name,
                &user.last_name,
                &user.middle_name,
                &user.avatar_url,
            ]
            .iter()
            .any(|field| !field.is_empty());
            if !present {
                return Err(UserPersistenceError::EmptyUpdate);
            }
            let mut state = self.state.lock().expect("state lock");
            let slot = state
                .users
                .iter_mut()
                .find(|(stored, _)| stored.id == user.id)
                .ok_or_else(|| UserPersistenceError::query("row vanished"))?;
            // Sparse merge, like the SQL UPDATE with only present columns.
            if !user.email.is_empty() {
                slot.0.email = user.email.clone();
            }
            if !user.first_name.is_empty() {
                slot.0.first_name = user.first_name.clone();
            }
            if !user.last_name.is_empty() {
                slot.0.last_name = user.last_name.clone();
            }
            if !user.middle_name.is_empty() {
                slot.0.middle_name = user.middle_name.clone();
            }
            if !user.avatar_url.is_empty() {
                slot.0.avatar_url = user.avatar_url.clone();
            }
            slot.0.updated_at = Utc::now();
            Ok(slot.0.clone())
        }

        async fn delete_user(&self, _tx: &mut (), id: Uuid) -> Result<Uuid, UserPersistenceError> {
            let mut state = self.state.lock().expect("state lock");
            let before = state.users.len();
            state.users.retain(|(user, _)| user.id != id);
            if state.users.len() == before {
                return Err(UserPersistenceError::query("row vanished"));
            }
            Ok(id)
        }
    }

    fn service() -> UserService<StubUserRepository> {
        UserService::new(StubUserRepository::default())
    }

    fn valid_payload() -> CreateUserRequest {
        CreateUserRequest {
            login: "ada1815".into(),
            password: "s3cret!pass".into(),
            first_name: "Ada".into(),
            email: "ada@example.com".into(),
            sex: "female".into(),
            age: 36,
            ..CreateUserRequest::default()
        }
    }

    #[tokio::test]
    async fn created_user_round_trips_through_get() {
        let service = service();
        let mut tx = ();

        let created = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("creation succeeds");
        let profile = service
            .get_user(&mut tx, &created.created)
            .await
            .expect("lookup succeeds");

        assert_eq!(profile.id, created.created);
        assert_eq!(profile.login, "ada1815");
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.sex, "female");
        assert_eq!(profile.age, 36);
    }

    #[tokio::test]
    async fn stored_password_is_a_hash_not_the_plaintext() {
        let service = service();
        let mut tx = ();

        let created = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("creation succeeds");
        let id = Uuid::parse_str(&created.created).expect("well-formed id");
        let state = service.repository.state.lock().expect("state lock");
        let (_, hash) = state
            .users
            .iter()
            .find(|(user, _)| user.id == id)
            .expect("user stored");

        assert!(hash.starts_with("$argon2"));
        assert!(!hash.contains("s3cret!pass"));
    }

    #[tokio::test]
    async fn second_create_with_same_login_is_rejected() {
        let service = service();
        let mut tx = ();

        service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("first creation succeeds");
        let err = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect_err("second creation fails");

        assert_eq!(err.code(), ErrorCode::LoginTaken);
        assert_eq!(err.message(), None);
    }

    #[tokio::test]
    async fn duplicate_insert_from_a_losing_race_maps_to_login_taken() {
        let service = UserService::new(StubUserRepository::racing_duplicate());
        let mut tx = ();

        let err = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect_err("insert collides");
        assert_eq!(err.code(), ErrorCode::LoginTaken);
        assert_eq!(err.message(), None);
    }

    #[tokio::test]
    async fn invalid_payload_reports_every_violation() {
        let service = service();
        let mut tx = ();

        let err = service
            .create_user(
                &mut tx,
                &CreateUserRequest {
                    login: "ab".into(),
                    password: "short".into(),
                    ..CreateUserRequest::default()
                },
            )
            .await
            .expect_err("payload rejected");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let message = err.message().expect("violations are reported");
        assert!(message.contains("invalid login"));
        assert!(message.contains("invalid password"));
    }

    #[rstest]
    #[case("not-a-uuid")]
    #[case("123")]
    #[case("")]
    #[tokio::test]
    async fn malformed_id_is_a_bad_request(#[case] id: &str) {
        let service = service();
        let mut tx = ();

        let err = service.get_user(&mut tx, id).await.expect_err("rejected");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), Some("Invalid user id."));
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let service = service();
        let mut tx = ();
        let id = Uuid::new_v4().to_string();

        let err = service.get_user(&mut tx, &id).await.expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), Some("User not found."));
    }

    #[tokio::test]
    async fn list_of_an_empty_store_is_an_empty_list() {
        let service = service();
        let mut tx = ();

        let users = service.list_users(&mut tx).await.expect("list succeeds");
        assert!(users.is_empty());
    }

    #[tokio::test]
    async fn partial_update_touches_only_present_fields() {
        let service = service();
        let mut tx = ();
        let created = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("creation succeeds");

        let profile = service
            .update_user(
                &mut tx,
                &created.created,
                &UpdateUserRequest {
                    first_name: "Augusta".into(),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect("update succeeds");

        assert_eq!(profile.first_name, "Augusta");
        assert_eq!(profile.email, "ada@example.com");
        assert_eq!(profile.login, "ada1815");
    }

    #[tokio::test]
    async fn repeating_an_update_changes_nothing_further() {
        let service = service();
        let mut tx = ();
        let created = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("creation succeeds");
        let payload = UpdateUserRequest {
            email: "countess@example.com".into(),
            ..UpdateUserRequest::default()
        };

        let once = service
            .update_user(&mut tx, &created.created, &payload)
            .await
            .expect("first update succeeds");
        let twice = service
            .update_user(&mut tx, &created.created, &payload)
            .await
            .expect("second update succeeds");

        assert_eq!(once.email, twice.email);
        assert_eq!(once.first_name, twice.first_name);
    }

    #[tokio::test]
    async fn update_with_invalid_fields_is_rejected_before_storage() {
        let service = service();
        let mut tx = ();
        let created = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("creation succeeds");
        let id = Uuid::parse_str(&created.created).expect("well-formed id");

        let err = service
            .update_user(
                &mut tx,
                &created.created,
                &UpdateUserRequest {
                    email: "not-an-email".into(),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect_err("update rejected");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let stored = service.repository.stored(id).expect("user kept");
        assert_eq!(stored.email, "ada@example.com");
    }

    #[tokio::test]
    async fn update_with_no_fields_is_a_bad_request() {
        let service = service();
        let mut tx = ();
        let created = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("creation succeeds");

        let err = service
            .update_user(&mut tx, &created.created, &UpdateUserRequest::default())
            .await
            .expect_err("empty update rejected");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), Some("No fields to update."));
    }

    #[tokio::test]
    async fn update_of_a_missing_user_is_not_found() {
        let service = service();
        let mut tx = ();

        let err = service
            .update_user(
                &mut tx,
                &Uuid::new_v4().to_string(),
                &UpdateUserRequest {
                    first_name: "Augusta".into(),
                    ..UpdateUserRequest::default()
                },
            )
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn delete_removes_the_user_and_reports_its_id() {
        let service = service();
        let mut tx = ();
        let created = service
            .create_user(&mut tx, &valid_payload())
            .await
            .expect("creation succeeds");

        let deleted = service
            .delete_user(&mut tx, &created.created)
            .await
            .expect("delete succeeds");
        assert_eq!(deleted.deleted, created.created);

        let err = service
            .get_user(&mut tx, &created.created)
            .await
            .expect_err("user gone");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn delete_of_a_missing_user_is_not_found() {
        let service = service();
        let mut tx = ();

        let err = service
            .delete_user(&mut tx, &Uuid::new_v4().to_string())
            .await
            .expect_err("missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.message(), Some("User not found."));
    }

    #[tokio::test]
    async fn infrastructure_failures_surface_as_bare_internal_errors() {
        let service = UserService::new(StubUserRepository::failing_lookups());
        let mut tx = ();

        let err = service
            .get_user(&mut tx, &Uuid::new_v4().to_string())
            .await
            .expect_err("lookup fails");
        assert_eq!(err.code(), ErrorCode::Internal);
        assert_eq!(err.message(), None);
    }
}
