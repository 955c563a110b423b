//! Wire DTOs for the remote authentication service.
//!
//! DESIGN
//! ======
//! The service owns the user schema. Only `id` and `username` are typed here;
//! every other profile field rides along in `extra` so unknown fields survive a
//! deserialize/serialize pass untouched.

#[cfg(test)]
#[path = "types_test.rs"]
mod types_test;

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

// =============================================================================
// TOKEN
// =============================================================================

/// Opaque bearer credential issued by the authentication service.
///
/// `Debug` is redacted so tokens never end up in log output.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    #[must_use]
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

// =============================================================================
// USER
// =============================================================================

/// User identifier. The service may hand out numeric or string ids.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Int(i64),
    Text(String),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(id) => write!(f, "{id}"),
            Self::Text(id) => f.write_str(id),
        }
    }
}

/// Identity record returned by `GET /user/me`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    /// Remaining profile fields, passed through opaquely.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

// =============================================================================
// REQUEST / RESPONSE BODIES
// =============================================================================

/// Body of `POST /login`.
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Successful `POST /login` body. Extra fields are ignored.
#[derive(Debug, Deserialize)]
pub struct LoginGrant {
    pub token: Token,
}

/// Successful `GET /user/me` body.
#[derive(Debug, Deserialize)]
pub(crate) struct MeResponse {
    pub user: User,
}

/// Non-2xx body. `message` is optional because not every failure carries one.
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}
