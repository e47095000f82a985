//! Domain-level error type.
//!
//! Transport agnostic: the API layer maps [`Error`] onto HTTP status codes
//! and the wire envelope. Internal failures never carry a message here; the
//! component that observed the failure logs the real cause and constructs a
//! bare [`Error::internal`].

/// Stable category describing the failure class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The request is malformed or violates a field-level rule.
    InvalidRequest,
    /// The requested login is already registered.
    LoginTaken,
    /// The requested user does not exist.
    NotFound,
    /// An infrastructure failure occurred; details stay server-side.
    Internal,
}

impl ErrorCode {
    /// Small stable integer carried in the wire envelope.
    pub fn as_u16(self) -> u16 {
        match self {
            Self::InvalidRequest => 1,
            Self::LoginTaken => 2,
            Self::NotFound => 3,
            Self::Internal => 4,
        }
    }

    /// Human-readable category text from the closed set the clients rely on.
    ///
    /// Not-found responses reuse the "Bad request." category; the 404 status
    /// carries the distinction.
    pub fn category(self) -> &'static str {
        match self {
            Self::InvalidRequest | Self::NotFound => "Bad request.",
            Self::LoginTaken => "Login is already taken.",
            Self::Internal => "Internal error.",
        }
    }
}

/// Domain error payload: a category plus an optional elaboration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    code: ErrorCode,
    message: Option<String>,
}

impl Error {
    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::InvalidRequest,
            message: Some(message.into()),
        }
    }

    /// Convenience constructor for [`ErrorCode::LoginTaken`].
    ///
    /// The category text is the whole story; no message is attached.
    pub fn login_taken() -> Self {
        Self {
            code: ErrorCode::LoginTaken,
            message: None,
        }
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            code: ErrorCode::NotFound,
            message: Some(message.into()),
        }
    }

    /// Convenience constructor for [`ErrorCode::Internal`].
    ///
    /// Deliberately takes no message: the real cause is logged where it was
    /// observed and must not reach the client.
    pub fn internal() -> Self {
        Self {
            code: ErrorCode::Internal,
            message: None,
        }
    }

    /// Stable machine-readable error category.
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Optional elaboration shown to the client.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(message) => write!(f, "{} {message}", self.code.category()),
            None => f.write_str(self.code.category()),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(ErrorCode::InvalidRequest, "Bad request.")]
    #[case(ErrorCode::NotFound, "Bad request.")]
    #[case(ErrorCode::LoginTaken, "Login is already taken.")]
    #[case(ErrorCode::Internal, "Internal error.")]
    fn category_texts_form_a_closed_set(#[case] code: ErrorCode, #[case] expected: &str) {
        assert_eq!(code.category(), expected);
    }

    #[rstest]
    fn internal_errors_never_carry_a_message() {
        assert_eq!(Error::internal().message(), None);
    }

    #[rstest]
    fn invalid_request_preserves_the_elaboration() {
        let err = Error::invalid_request("Invalid user id.");
        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        assert_eq!(err.message(), Some("Invalid user id."));
    }
}
