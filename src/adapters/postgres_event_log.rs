//! Append-only donation event log backed by Postgres.

use async_trait::async_trait;
use sqlx::PgPool;

use crate::domain::DonationId;
use crate::ports::{EventLogError, EventLogger};

#[derive(Clone)]
pub struct PostgresEventLog {
    pool: PgPool,
}

impl PostgresEventLog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EventLogger for PostgresEventLog {
    async fn log(&self, donation_id: DonationId, message: &str) -> Result<(), EventLogError> {
        sqlx::query("INSERT INTO donation_events (donation_id, message) VALUES ($1, $2)")
            .bind(donation_id.0)
            .bind(message)
            .execute(&self.pool)
            .await
            .map_err(|e| EventLogError(e.to_string()))?;
        Ok(())
    }
}
