//! Postgres implementation of DonationRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::{
    Donation, DonationComment, DonationId, DonationSnapshot, DonationStatus, Donor, PaymentId,
    PaymentReference, TrackingInfo,
};
use crate::ports::{
    DonationIdGenerator, DonationRepository, IdGeneratorError, RepositoryError, RepositoryResult,
};

/// Postgres-backed donation repository.
///
/// Store serializability per donation id comes from the row-level lock the
/// upsert takes; concurrent stores of the same id queue on that lock.
#[derive(Clone)]
pub struct PostgresDonationRepository {
    pool: PgPool,
}

impl PostgresDonationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationRepository for PostgresDonationRepository {
    async fn get_by_id(&self, id: DonationId) -> RepositoryResult<Option<Donation>> {
        let row = sqlx::query_as::<_, DonationRow>(
            r#"
            SELECT id, status, payment_id, is_booked, donor, tracking,
                comment_text, comment_is_public, comment_author,
                cancelled, moderation, exported_at, scrubbed,
                newsletter, receipt, confirmed_at, created_at
            FROM donations WHERE id = $1
            "#,
        )
        .bind(id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)?;

        row.map(DonationRow::into_domain).transpose()
    }

    async fn store(&self, donation: &mut Donation) -> RepositoryResult<()> {
        let snapshot = donation.to_snapshot();
        let donor = serde_json::to_value(&snapshot.donor).map_err(storage_error)?;
        let tracking = serde_json::to_value(&snapshot.tracking).map_err(storage_error)?;
        let comment = snapshot.comment.as_ref();

        match snapshot.id {
            None => {
                let id: i64 = sqlx::query_scalar(
                    r#"
                    INSERT INTO donations (
                        status, payment_id, is_booked, donor, tracking,
                        comment_text, comment_is_public, comment_author,
                        cancelled, moderation, exported_at, scrubbed,
                        newsletter, receipt, confirmed_at, created_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
                    RETURNING id
                    "#,
                )
                .bind(snapshot.status.as_str())
                .bind(snapshot.payment.payment_id.0)
                .bind(snapshot.payment.is_booked)
                .bind(&donor)
                .bind(&tracking)
                .bind(comment.map(|c| c.text.as_str()))
                .bind(comment.map(|c| c.is_public))
                .bind(comment.map(|c| c.author_display_name.as_str()))
                .bind(snapshot.cancelled)
                .bind(snapshot.marked_for_moderation)
                .bind(snapshot.exported_at)
                .bind(snapshot.is_scrubbed)
                .bind(snapshot.newsletter)
                .bind(snapshot.receipt)
                .bind(snapshot.confirmed_at)
                .bind(snapshot.created_at)
                .fetch_one(&self.pool)
                .await
                .map_err(storage_error)?;

                donation
                    .assign_id(DonationId(id))
                    .map_err(storage_error)?;
            }
            Some(id) => {
                sqlx::query(
                    r#"
                    INSERT INTO donations (
                        id, status, payment_id, is_booked, donor, tracking,
                        comment_text, comment_is_public, comment_author,
                        cancelled, moderation, exported_at, scrubbed,
                        newsletter, receipt, confirmed_at, created_at
                    ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
                    ON CONFLICT (id) DO UPDATE SET
                        status = EXCLUDED.status,
                        is_booked = EXCLUDED.is_booked,
                        donor = EXCLUDED.donor,
                        comment_text = EXCLUDED.comment_text,
                        comment_is_public = EXCLUDED.comment_is_public,
                        comment_author = EXCLUDED.comment_author,
                        cancelled = EXCLUDED.cancelled,
                        moderation = EXCLUDED.moderation,
                        exported_at = EXCLUDED.exported_at,
                        scrubbed = EXCLUDED.scrubbed,
                        newsletter = EXCLUDED.newsletter,
                        receipt = EXCLUDED.receipt,
                        confirmed_at = EXCLUDED.confirmed_at
                    "#,
                )
                .bind(id.0)
                .bind(snapshot.status.as_str())
                .bind(snapshot.payment.payment_id.0)
                .bind(snapshot.payment.is_booked)
                .bind(&donor)
                .bind(&tracking)
                .bind(comment.map(|c| c.text.as_str()))
                .bind(comment.map(|c| c.is_public))
                .bind(comment.map(|c| c.author_display_name.as_str()))
                .bind(snapshot.cancelled)
                .bind(snapshot.marked_for_moderation)
                .bind(snapshot.exported_at)
                .bind(snapshot.is_scrubbed)
                .bind(snapshot.newsletter)
                .bind(snapshot.receipt)
                .bind(snapshot.confirmed_at)
                .bind(snapshot.created_at)
                .execute(&self.pool)
                .await
                .map_err(storage_error)?;
            }
        }

        Ok(())
    }
}

/// Sequence-backed id generator, sharing the donations id sequence so
/// generated ids never collide with repository-assigned ones.
#[derive(Clone)]
pub struct PostgresDonationIdGenerator {
    pool: PgPool,
}

impl PostgresDonationIdGenerator {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DonationIdGenerator for PostgresDonationIdGenerator {
    async fn next_id(&self) -> Result<DonationId, IdGeneratorError> {
        let id: i64 =
            sqlx::query_scalar("SELECT nextval(pg_get_serial_sequence('donations', 'id'))")
                .fetch_one(&self.pool)
                .await
                .map_err(|e| IdGeneratorError(e.to_string()))?;
        Ok(DonationId(id))
    }
}

fn storage_error(e: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Storage(e.to_string())
}

/// Internal row type for SQLx. Not exposed outside the adapter.
#[derive(Debug, sqlx::FromRow)]
struct DonationRow {
    id: i64,
    status: String,
    payment_id: i64,
    is_booked: bool,
    donor: serde_json::Value,
    tracking: serde_json::Value,
    comment_text: Option<String>,
    comment_is_public: Option<bool>,
    comment_author: Option<String>,
    cancelled: bool,
    moderation: bool,
    exported_at: Option<DateTime<Utc>>,
    scrubbed: bool,
    newsletter: bool,
    receipt: bool,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl DonationRow {
    fn into_domain(self) -> RepositoryResult<Donation> {
        let status = parse_status(&self.status)?;
        let donor: Donor = serde_json::from_value(self.donor).map_err(storage_error)?;
        let tracking: TrackingInfo =
            serde_json::from_value(self.tracking).map_err(storage_error)?;

        let comment = match (self.comment_text, self.comment_is_public, self.comment_author) {
            (Some(text), Some(is_public), Some(author)) => {
                Some(DonationComment::new(text, is_public, author))
            }
            _ => None,
        };

        Ok(Donation::from_snapshot(DonationSnapshot {
            id: Some(DonationId(self.id)),
            status,
            payment: PaymentReference {
                payment_id: PaymentId(self.payment_id),
                is_booked: self.is_booked,
            },
            donor,
            tracking,
            comment,
            cancelled: self.cancelled,
            marked_for_moderation: self.moderation,
            exported_at: self.exported_at,
            is_scrubbed: self.scrubbed,
            newsletter: self.newsletter,
            receipt: self.receipt,
            confirmed_at: self.confirmed_at,
            created_at: self.created_at,
        }))
    }
}

fn parse_status(raw: &str) -> RepositoryResult<DonationStatus> {
    match raw {
        "new" => Ok(DonationStatus::New),
        "promise" => Ok(DonationStatus::Promise),
        "external-incomplete" => Ok(DonationStatus::ExternalIncomplete),
        "external-booked" => Ok(DonationStatus::ExternalBooked),
        other => Err(RepositoryError::Storage(format!(
            "unknown donation status in storage: {other}"
        ))),
    }
}
