//! Access-token authorization against the stored donation row.
//!
//! Built per request with whatever token the notification carried; checks
//! it against the token issued when the donation was created. Any lookup
//! problem denies access rather than erroring out of the use case.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::DonationId;
use crate::ports::AuthorizationChecker;

pub struct TokenAuthorizationChecker {
    pool: PgPool,
    presented_token: Option<String>,
}

impl TokenAuthorizationChecker {
    pub fn new(pool: PgPool, presented_token: Option<String>) -> Self {
        Self {
            pool,
            presented_token,
        }
    }
}

#[async_trait]
impl AuthorizationChecker for TokenAuthorizationChecker {
    async fn system_can_modify_donation(&self, id: DonationId) -> bool {
        let Some(presented) = self.presented_token.as_deref() else {
            return false;
        };

        let stored: Option<Option<String>> =
            match sqlx::query_scalar("SELECT access_token FROM donations WHERE id = $1")
                .bind(id.0)
                .fetch_optional(&self.pool)
                .await
            {
                Ok(row) => row,
                Err(e) => {
                    tracing::warn!(donation_id = %id, error = %e, "access token lookup failed");
                    return false;
                }
            };

        match stored.flatten() {
            Some(token) => constant_time_eq(token.as_bytes(), presented.as_bytes()),
            None => false,
        }
    }
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
