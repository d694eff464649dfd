//! Collaborator interfaces consumed by the donation use cases.
//!
//! The core owns these traits; adapters (Postgres, HTTP clients) and test
//! doubles supply the implementations.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Donation, DonationId, PaymentId};

/// Opaque provider payload. The core forwards it to the payment bounded
/// context without interpreting individual keys.
pub type TransactionData = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("donation {0} not found")]
    NotFound(DonationId),
    #[error("storage failure: {0}")]
    Storage(String),
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Load/store boundary for donations.
///
/// Implementations must make `store` after `get_by_id` atomic per donation
/// id with respect to concurrent stores of the same id (row lock or
/// equivalent); the use cases do not serialize writers themselves.
#[async_trait]
pub trait DonationRepository: Send + Sync {
    async fn get_by_id(&self, id: DonationId) -> RepositoryResult<Option<Donation>>;

    /// Persists the aggregate. Assigns an id to donations that do not have
    /// one yet.
    async fn store(&self, donation: &mut Donation) -> RepositoryResult<()>;
}

/// Decides whether the calling system context may mutate a donation, e.g.
/// whether a notification carried the correct provider-issued credentials.
#[async_trait]
pub trait AuthorizationChecker: Send + Sync {
    async fn system_can_modify_donation(&self, id: DonationId) -> bool;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingFailure {
    pub message: String,
    /// The payment was already settled by an earlier notification. Replays
    /// are normal provider behavior, not errors.
    pub already_completed: bool,
}

/// Outcome of reconciling a provider transaction against a payment record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingResult {
    Booked,
    /// The transaction is a new charge of a recurring payment. The payment
    /// context created a child payment; the donation side must follow.
    FollowUp { child_payment_id: PaymentId },
    Failure(BookingFailure),
}

#[derive(Debug, Error)]
#[error("payment service failure: {0}")]
pub struct PaymentServiceError(pub String);

/// Boundary into the payment bounded context. The payment aggregate is the
/// sole owner of "have I seen this transaction before"; the donation side
/// never compares transaction ids itself.
#[async_trait]
pub trait PaymentBookingService: Send + Sync {
    async fn book_payment(
        &self,
        payment_id: PaymentId,
        data: &TransactionData,
    ) -> Result<BookingResult, PaymentServiceError>;

    /// Creates an incomplete payment record from a provider payload, for
    /// notifications that reference no existing donation.
    async fn create_incomplete_payment(
        &self,
        data: &TransactionData,
    ) -> Result<PaymentId, PaymentServiceError>;

    async fn cancel_payment(&self, payment_id: PaymentId) -> Result<(), PaymentServiceError>;

    async fn restore_payment(&self, payment_id: PaymentId) -> Result<(), PaymentServiceError>;
}

#[derive(Debug, Error)]
#[error("event log failure: {0}")]
pub struct EventLogError(pub String);

/// Append-only audit trail keyed by donation id.
#[async_trait]
pub trait EventLogger: Send + Sync {
    async fn log(&self, donation_id: DonationId, message: &str) -> Result<(), EventLogError>;
}

#[derive(Debug, Error)]
#[error("notifier failure: {0}")]
pub struct NotifierError(pub String);

/// Best-effort confirmation messaging. Callers swallow failures; delivery
/// is not part of the booking contract.
#[async_trait]
pub trait DonationNotifier: Send + Sync {
    async fn send_confirmation_for(&self, donation: &Donation) -> Result<(), NotifierError>;
}

#[derive(Debug, Error)]
#[error("id generator failure: {0}")]
pub struct IdGeneratorError(pub String);

/// Issues new donation ids, used when a notification spawns a follow-up
/// donation.
#[async_trait]
pub trait DonationIdGenerator: Send + Sync {
    async fn next_id(&self) -> Result<DonationId, IdGeneratorError>;
}

/// Human-review gate applied to a donation's first charge. Policy content
/// (amount thresholds, word lists) lives behind this trait.
pub trait ModerationPolicy: Send + Sync {
    fn needs_moderation(&self, donation: &Donation, data: &TransactionData) -> bool;
}
