use async_trait::async_trait;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::{AuthError, IdentityProvider, Role, Session};
use crate::store::StoreError;

/// Audience the hosted auth service stamps on signed-in users' tokens.
const AUTHENTICATED_AUDIENCE: &str = "authenticated";

/// The claims this service reads. Audience and expiry are checked by `Validation`.
#[derive(Debug, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
}

/// Verifies HS256 access tokens from the hosted auth service and reads the
/// caller's role from `profiles`.
pub struct SupabaseIdentityProvider {
    key: DecodingKey,
    validation: Validation,
    pool: PgPool,
}

impl SupabaseIdentityProvider {
    pub fn new(jwt_secret: &str, pool: PgPool) -> Self {
        Self {
            key: DecodingKey::from_secret(jwt_secret.as_bytes()),
            validation: token_validation(),
            pool,
        }
    }
}

fn token_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_audience(&[AUTHENTICATED_AUDIENCE]);
    validation
}

/// Checks signature, expiry and audience; returns the user id.
pub fn verify_token(token: &str, key: &DecodingKey, validation: &Validation) -> Result<Uuid, AuthError> {
    decode::<Claims>(token, key, validation)
        .map(|data| data.claims.sub)
        .map_err(|e| AuthError::InvalidToken(e.to_string()))
}

#[async_trait]
impl IdentityProvider for SupabaseIdentityProvider {
    async fn authenticate(&self, token: &str) -> Result<Session, AuthError> {
        let user_id = verify_token(token, &self.key, &self.validation)?;

        let role: Option<String> = sqlx::query_scalar("SELECT role FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StoreError::from)?;

        let role: Role = role.ok_or(AuthError::UnknownProfile(user_id))?.parse()?;
        Ok(Session { user_id, role })
    }
}
