//! User aggregate and its HTTP-facing projections.
//!
//! Zero values ("" / 0 / [`Sex::Unspecified`]) mean "absent" at the domain
//! level; the persistence layer translates them to and from nullable columns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::validation::UpdateUserRequest;

/// Sex recorded on the profile, if the user supplied one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sex {
    /// The user did not state a sex.
    #[default]
    Unspecified,
    Male,
    Female,
}

impl Sex {
    /// Wire representation; [`Sex::Unspecified`] serialises to the empty
    /// string and is omitted from responses.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "",
            Self::Male => "male",
            Self::Female => "female",
        }
    }

    /// Parse the wire representation, treating anything unrecognised as
    /// unspecified. Validation rejects bad values before they reach here.
    pub fn from_wire(value: &str) -> Self {
        match value {
            "male" => Self::Male,
            "female" => Self::Female,
            _ => Self::Unspecified,
        }
    }
}

/// Application user.
///
/// ## Invariants
/// - `id` is nil only before the storage gateway assigns one.
/// - `login` is unique across all users and immutable after creation.
/// - `created_at` / `updated_at` are server-assigned.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub sex: Sex,
    pub age: u8,
    pub email: String,
    pub avatar_url: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Merge an update payload into the aggregate: present (non-empty)
    /// fields overwrite, absent fields are no-ops.
    pub fn apply(&mut self, payload: &UpdateUserRequest) {
        if !payload.first_name.is_empty() {
            self.first_name = payload.first_name.clone();
        }
        if !payload.last_name.is_empty() {
            self.last_name = payload.last_name.clone();
        }
        if !payload.middle_name.is_empty() {
            self.middle_name = payload.middle_name.clone();
        }
        if !payload.email.is_empty() {
            self.email = payload.email.clone();
        }
        if !payload.avatar_url.is_empty() {
            self.avatar_url = payload.avatar_url.clone();
        }
    }
}

fn is_zero(age: &u8) -> bool {
    *age == 0
}

/// Response projection of a [`User`]. The password hash is structurally
/// unrepresentable here.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    pub id: String,
    pub login: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub first_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub last_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub middle_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub sex: String,
    #[serde(skip_serializing_if = "is_zero")]
    pub age: u8,
    #[serde(rename = "avatarURL", skip_serializing_if = "String::is_empty")]
    pub avatar_url: String,
    /// Creation timestamp truncated to a date-only string, e.g.
    /// "2024-01-15". Clients depend on the absence of a time component.
    pub register_date: String,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            login: user.login,
            first_name: user.first_name,
            last_name: user.last_name,
            middle_name: user.middle_name,
            email: user.email,
            sex: user.sex.as_str().to_owned(),
            age: user.age,
            avatar_url: user.avatar_url,
            register_date: user.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

/// Body of a successful `POST /api/user`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateUserResponse {
    pub created: String,
}

/// Body of a successful `DELETE /api/user/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteUserResponse {
    pub deleted: String,
}
