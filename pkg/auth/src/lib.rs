use std::fmt;

use thiserror::Error;

const BEARER_SCHEME_PREFIX: &str = "Bearer ";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("bearer secret must not be empty")]
    EmptySecret,
}

/// Process-wide shared secret gating the read path.
///
/// Construction rejects the empty string so that `"Bearer "` can never
/// authorize a request.
#[derive(Clone, PartialEq, Eq)]
pub struct BearerSecret {
    secret: String,
}

impl BearerSecret {
    pub fn new(secret: impl Into<String>) -> Result<Self, AuthError> {
        let secret = secret.into();
        if secret.is_empty() {
            return Err(AuthError::EmptySecret);
        }
        Ok(Self { secret })
    }

    /// Exact header value a caller must present: `Bearer <secret>`.
    pub fn expected_header_value(&self) -> String {
        format!("{BEARER_SCHEME_PREFIX}{}", self.secret)
    }
}

impl fmt::Debug for BearerSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerSecret")
            .field("secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allowed,
    Unauthorized(&'static str),
}

/// Checks a raw `Authorization` header value against the configured secret.
///
/// The whole header must equal `Bearer <secret>` byte for byte; no scheme
/// case folding and no inner whitespace tolerance.
pub fn authorize_bearer_header(header: Option<&str>, secret: &BearerSecret) -> AuthDecision {
    let Some(header) = header else {
        return AuthDecision::Unauthorized("missing authorization header");
    };
    if !header.starts_with(BEARER_SCHEME_PREFIX) {
        return AuthDecision::Unauthorized("unsupported authorization scheme");
    }
    let expected = secret.expected_header_value();
    if constant_time_eq(header.as_bytes(), expected.as_bytes()) {
        AuthDecision::Allowed
    } else {
        AuthDecision::Unauthorized("bearer credential mismatch")
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (left, right) in a.iter().zip(b) {
        diff |= left ^ right;
    }
    diff == 0
}
