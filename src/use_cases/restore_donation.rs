//! Inverse of cancellation. The payment must accept being un-cancelled
//! before the donation flag clears; failure of either leaves state
//! unchanged.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::time::timeout;

use crate::domain::{DonationError, DonationId};
use crate::ports::{DonationRepository, EventLogger, PaymentBookingService};
use crate::use_cases::DEFAULT_COLLABORATOR_TIMEOUT;

pub const LOG_MESSAGE_RESTORED: &str = "restored";

#[derive(Debug, Error)]
pub enum RestoreDonationError {
    #[error("donation {0} not found")]
    NotFound(DonationId),
    #[error(transparent)]
    InvalidState(#[from] DonationError),
    #[error("payment could not be restored: {0}")]
    PaymentFailed(String),
    #[error("storage failure: {0}")]
    StorageFailed(String),
    #[error("{0} timed out")]
    TimedOut(&'static str),
}

pub struct RestoreDonationUseCase {
    repository: Arc<dyn DonationRepository>,
    payments: Arc<dyn PaymentBookingService>,
    event_log: Arc<dyn EventLogger>,
    call_timeout: Duration,
}

impl RestoreDonationUseCase {
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

    pub async fn execute(&self, donation_id: DonationId) -> Result<(), RestoreDonationError> {
        let mut donation = timeout(self.call_timeout, self.repository.get_by_id(donation_id))
            .await
            .map_err(|_| RestoreDonationError::TimedOut("donation lookup"))?
            .map_err(|e| RestoreDonationError::StorageFailed(e.to_string()))?
            .ok_or(RestoreDonationError::NotFound(donation_id))?;

        if !donation.is_cancelled() {
            return Err(DonationError::NotCancelled.into());
        }

        timeout(
            self.call_timeout,
            self.payments.restore_payment(donation.payment_id()),
        )
        .await
        .map_err(|_| RestoreDonationError::TimedOut("payment restore"))?
        .map_err(|e| RestoreDonationError::PaymentFailed(e.to_string()))?;

        donation.revert_cancellation()?;

        timeout(self.call_timeout, self.repository.store(&mut donation))
            .await
            .map_err(|_| RestoreDonationError::TimedOut("donation store"))?
            .map_err(|e| RestoreDonationError::StorageFailed(e.to_string()))?;

        if let Err(e) = self.event_log.log(donation_id, LOG_MESSAGE_RESTORED).await {
            tracing::warn!(donation_id = %donation_id, error = %e, "event log write failed");
        }

        tracing::info!(donation_id = %donation_id, "donation restored");
        Ok(())
    }
}
