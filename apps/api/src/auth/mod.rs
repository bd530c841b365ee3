//! Identity and route authorization.
//!
//! Every `/api` request resolves to an explicit `Session` through an
//! `IdentityProvider`, then is checked against a static table mapping path
//! prefixes to the roles allowed under them. Handlers read the session from
//! request extensions.

pub mod jwt;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::StoreError;

pub use jwt::SupabaseIdentityProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Employer,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Employer => "employer",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "student" => Ok(Role::Student),
            "employer" => Ok(Role::Employer),
            "admin" => Ok(Role::Admin),
            other => Err(AuthError::InvalidRole(other.to_string())),
        }
    }
}

/// The authenticated caller of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid token: {0}")]
    InvalidToken(String),

    #[error("no profile for user {0}")]
    UnknownProfile(Uuid),

    #[error("unknown role '{0}'")]
    InvalidRole(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Turns a bearer token into a session.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn authenticate(&self, token: &str) -> Result<Session, AuthError>;
}

/// Path prefix → roles allowed under it. Paths under `/api` that match no
/// prefix are denied.
const ROUTE_POLICY: &[(&str, &[Role])] = &[
    ("/api/v1/admin", &[Role::Admin]),
    ("/api/v1/employer", &[Role::Employer, Role::Admin]),
    ("/api/v1/student", &[Role::Student]),
    ("/api/v1/score", &[Role::Student, Role::Employer, Role::Admin]),
];

/// Roles allowed to call `path`. Prefixes match whole segments only.
pub fn allowed_roles(path: &str) -> Option<&'static [Role]> {
    ROUTE_POLICY
        .iter()
        .find(|(prefix, _)| {
            path.strip_prefix(*prefix)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
        })
        .map(|(_, roles)| *roles)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

/// Route layer: authenticates the caller, enforces the route policy and
/// attaches the `Session` to the request.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = request.uri().path().to_string();
    let allowed = allowed_roles(&path).ok_or(AppError::Forbidden)?;

    let token = bearer_token(request.headers())
        .ok_or(AppError::Unauthorized)?
        .to_string();
    let session = state.identity.authenticate(&token).await?;

    if !allowed.contains(&session.role) {
        warn!(
            "Denied {} ({}) access to {path}",
            session.user_id, session.role
        );
        return Err(AppError::Forbidden);
    }

    request.extensions_mut().insert(session);
    Ok(next.run(request).await)
}
