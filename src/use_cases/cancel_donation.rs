//! Cancellation is all-or-nothing across the payment and donation sides:
//! the payment must accept cancellation before the donation flag changes,
//! so a payment-side failure leaves both aggregates untouched.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::domain::{DonationError, DonationId};
use crate::ports::{DonationRepository, EventLogger, PaymentBookingService};
use crate::use_cases::DEFAULT_COLLABORATOR_TIMEOUT;

pub const LOG_MESSAGE_CANCELLED: &str = "canceled";

#[derive(Debug, Error)]
pub enum CancelDonationError {
    #[error("donation {0} not found")]
    NotFound(DonationId),
    #[error(transparent)]
    InvalidState(#[from] DonationError),
    #[error("payment could not be cancelled: {0}")]
    PaymentFailed(String),
    #[error("storage failure: {0}")]
    StorageFailed(String),
    #[error("{0} timed out")]
    TimedOut(&'static str),
}

pub struct CancelDonationUseCase {
    repository: Arc<dyn DonationRepository>,
    payments: Arc<dyn PaymentBookingService>,
    event_log: Arc<dyn EventLogger>,
    call_timeout: Duration,
}

impl CancelDonationUseCase {
    pub fn new(
        repository: Arc<dyn DonationRepository>,
        payments: Arc<dyn PaymentBookingService>,
        event_log: Arc<dyn EventLogger>,
    ) -> Self {
        Self {
            repository,
            payments,
            event_log,
            call_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub async fn execute(&self, donation_id: DonationId) -> Result<(), CancelDonationError> {
        let mut donation = timeout(self.call_timeout, self.repository.get_by_id(donation_id))
            .await
            .map_err(|_| CancelDonationError::TimedOut("donation lookup"))?
            .map_err(|e| CancelDonationError::StorageFailed(e.to_string()))?
            .ok_or(CancelDonationError::NotFound(donation_id))?;

        if donation.is_cancelled() {
            return Err(DonationError::AlreadyCancelled.into());
        }

        timeout(
            self.call_timeout,
            self.payments.cancel_payment(donation.payment_id()),
        )
        .await
        .map_err(|_| CancelDonationError::TimedOut("payment cancellation"))?
        .map_err(|e| CancelDonationError::PaymentFailed(e.to_string()))?;

        donation.cancel()?;

        timeout(self.call_timeout, self.repository.store(&mut donation))
            .await
            .map_err(|_| CancelDonationError::TimedOut("donation store"))?
            .map_err(|e| CancelDonationError::StorageFailed(e.to_string()))?;

        if let Err(e) = self.event_log.log(donation_id, LOG_MESSAGE_CANCELLED).await {
            tracing::warn!(donation_id = %donation_id, error = %e, "event log write failed");
        }

        tracing::info!(donation_id = %donation_id, "donation cancelled");
        Ok(())
    }
}
