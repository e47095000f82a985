//! Pure request-payload validation.
//!
//! Violations are collected, never short-circuited: a payload can report
//! every broken field in one pass. A failure of the pattern engine itself
//! (a regex that does not compile) is an infrastructure error and is kept
//! distinct from a failed match.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;

use super::user::{Sex, User};

const LOGIN_PATTERN: &str = "^[a-zA-Z0-9]{5,20}$";
const PASSWORD_PATTERN: &str = r"^[a-zA-Z0-9!&*.,#@$]{8,20}$";
const EMAIL_PATTERN: &str = r"^[\w\-\.]+@([\w\-]+\.)+[\w\-]{2,4}$";

/// Maximum byte length accepted for each name field.
const NAME_MAX_BYTES: usize = 20;
/// Ages above this are rejected as implausible.
const AGE_MAX: u8 = 150;

static LOGIN_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(LOGIN_PATTERN));
static PASSWORD_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(PASSWORD_PATTERN));
static EMAIL_RE: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(EMAIL_PATTERN));

fn compiled(
    pattern: &'static LazyLock<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, ValidationError> {
    pattern
        .as_ref()
        .map_err(|err| ValidationError::Engine(err.to_string()))
}

/// A single named field violation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    pub field: &'static str,
    pub message: &'static str,
}

fn joined(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|violation| violation.message)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Outcome of validating a payload.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// The payload violates one or more field rules; all of them are listed.
    #[error("{}", joined(.0))]
    Invalid(Vec<FieldViolation>),
    /// The validation engine itself failed.
    #[error("validation engine failure: {0}")]
    Engine(String),
}

impl ValidationError {
    /// The collected violations, if this is a field-rule failure.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::Invalid(violations) => violations,
            Self::Engine(_) => &[],
        }
    }
}

fn finish(violations: Vec<FieldViolation>) -> Result<(), ValidationError> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Invalid(violations))
    }
}

fn check_name(
    violations: &mut Vec<FieldViolation>,
    field: &'static str,
    value: &str,
) {
    if value.len() > NAME_MAX_BYTES {
        violations.push(FieldViolation {
            field,
            message: "too long name",
        });
    }
}

fn check_email(violations: &mut Vec<FieldViolation>, email: &str) -> Result<(), ValidationError> {
    if !email.is_empty() && !compiled(&EMAIL_RE)?.is_match(email) {
        violations.push(FieldViolation {
            field: "email",
            message: "invalid email",
        });
    }
    Ok(())
}

fn check_avatar_url(violations: &mut Vec<FieldViolation>, avatar_url: &str) {
    if avatar_url.is_empty() {
        return;
    }
    let parsed = Url::parse(avatar_url);
    if !parsed.map(|url| url.has_host()).unwrap_or(false) {
        violations.push(FieldViolation {
            field: "avatarURL",
            message: "invalid avatar URL",
        });
    }
}

/// Payload of `POST /api/user`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CreateUserRequest {
    pub login: String,
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub email: String,
    pub sex: String,
    pub age: u8,
    pub password: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

impl CreateUserRequest {
    /// Check every field rule, collecting all violations.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        if !compiled(&LOGIN_RE)?.is_match(&self.login) {
            violations.push(FieldViolation {
                field: "login",
                message: "invalid login",
            });
        }
        if !compiled(&PASSWORD_RE)?.is_match(&self.password) {
            violations.push(FieldViolation {
                field: "password",
                message: "invalid password",
            });
        }
        check_email(&mut violations, &self.email)?;
        if !self.sex.is_empty() && self.sex != "male" && self.sex != "female" {
            violations.push(FieldViolation {
                field: "sex",
                message: "invalid sex",
            });
        }
        if self.age > AGE_MAX {
            violations.push(FieldViolation {
                field: "age",
                message: "age may be exaggerated a little bit",
            });
        }
        check_name(&mut violations, "firstName", &self.first_name);
        check_name(&mut violations, "lastName", &self.last_name);
        check_name(&mut violations, "middleName", &self.middle_name);
        check_avatar_url(&mut violations, &self.avatar_url);

        finish(violations)
    }

    /// Build the aggregate to persist. The password travels separately as a
    /// hash; timestamps and the identifier are server-assigned later.
    pub fn to_user(&self) -> User {
        User {
            login: self.login.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            middle_name: self.middle_name.clone(),
            sex: Sex::from_wire(&self.sex),
            age: self.age,
            email: self.email.clone(),
            avatar_url: self.avatar_url.clone(),
            ..User::default()
        }
    }
}

/// Payload of `PATCH /api/user/{id}`. Login and password are immutable
/// after creation and are absent here; empty fields are no-ops.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateUserRequest {
    pub first_name: String,
    pub last_name: String,
    pub middle_name: String,
    pub email: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

impl UpdateUserRequest {
    /// Check the profile fields against the same rules as creation. An
    /// entirely empty payload is valid; the gateway reports "no fields to
    /// update" if nothing remains to persist.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut violations = Vec::new();

        check_name(&mut violations, "firstName", &self.first_name);
        check_name(&mut violations, "lastName", &self.last_name);
        check_name(&mut violations, "middleName", &self.middle_name);
        check_email(&mut violations, &self.email)?;
        check_avatar_url(&mut violations, &self.avatar_url);

        finish(violations)
    }
}
