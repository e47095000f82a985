//! Row types bridging the `users` table and the domain aggregate.
//!
//! The table stores absent profile fields as NULL; the domain uses zero
//! values. The conversions in this module own that translation, and the
//! password hash column is deliberately absent from [`UserRow`] so reads can
//! never leak it.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use uuid::Uuid;

use crate::domain::{Sex, User};

use super::schema::users;

/// A `users` row as read back from the database.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: Uuid,
    pub login: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub middle_name: Option<String>,
    pub sex: Option<String>,
    pub age: Option<i16>,
    pub avatar_url: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    /// Collapse NULL columns to the domain's zero values.
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            login: self.login,
            first_name: self.first_name.unwrap_or_default(),
            last_name: self.last_name.unwrap_or_default(),
            middle_name: self.middle_name.unwrap_or_default(),
            sex: Sex::from_wire(self.sex.as_deref().unwrap_or("")),
            age: self.age.map(clamp_age).unwrap_or_default(),
            email: self.email.unwrap_or_default(),
            avatar_url: self.avatar_url.unwrap_or_default(),
            is_active: self.is_active,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

// The column is SMALLINT for storage economy; validated values fit in u8 and
// anything out of range can only come from manual edits, so it degrades to
// "unspecified" rather than failing the read.
fn clamp_age(age: i16) -> u8 {
    u8::try_from(age).unwrap_or(0)
}

/// Insert projection for a new user. Zero-valued profile fields are omitted
/// so the columns stay NULL.
#[derive(Debug, Insertable)]
#[diesel(table_name = users)]
pub struct NewUserRow<'a> {
    pub login: &'a str,
    pub password: &'a str,
    pub email: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub middle_name: Option<&'a str>,
    pub sex: Option<&'a str>,
    pub age: Option<i16>,
    pub avatar_url: Option<&'a str>,
    pub is_active: bool,
}

impl<'a> NewUserRow<'a> {
    pub fn from_user(user: &'a User, password_hash: &'a str) -> Self {
        Self {
            login: &user.login,
            password: password_hash,
            email: present(&user.email),
            first_name: present(&user.first_name),
            last_name: present(&user.last_name),
            middle_name: present(&user.middle_name),
            sex: present(user.sex.as_str()),
            age: (user.age != 0).then(|| i16::from(user.age)),
            avatar_url: present(&user.avatar_url),
            is_active: true,
        }
    }
}

fn present(value: &str) -> Option<&str> {
    (!value.is_empty()).then_some(value)
}

/// Sparse update projection: `None` fields are left out of the generated
/// `SET` clause entirely.
#[derive(Debug, AsChangeset)]
#[diesel(table_name = users)]
pub struct UserChangeset<'a> {
    pub email: Option<&'a str>,
    pub first_name: Option<&'a str>,
    pub last_name: Option<&'a str>,
    pub middle_name: Option<&'a str>,
    pub avatar_url: Option<&'a str>,
}

impl<'a> UserChangeset<'a> {
    pub fn from_user(user: &'a User) -> Self {
        Self {
            email: present(&user.email),
            first_name: present(&user.first_name),
            last_name: present(&user.last_name),
            middle_name: present(&user.middle_name),
            avatar_url: present(&user.avatar_url),
        }
    }

    /// True when no field would make it into the `SET` clause. Diesel
    /// rejects an empty changeset, so callers check this first.
    pub fn is_empty(&self) -> bool {
        self.email.is_none()
            && self.first_name.is_none()
            && self.last_name.is_none()
            && self.middle_name.is_none()
            && self.avatar_url.is_none()
    }
}
