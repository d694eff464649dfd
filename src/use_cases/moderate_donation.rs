//! Mark-for-moderation / approve toggles on a donation.

use std::sync::Arc;

use thiserror::Error;

use crate::domain::{DonationError, DonationId};
use crate::ports::{DonationRepository, EventLogger};

pub const LOG_MESSAGE_MARKED: &str = "marked for moderation";
pub const LOG_MESSAGE_APPROVED: &str = "approved";

#[derive(Debug, Error)]
pub enum ModerateDonationError {
    #[error("donation {0} not found")]
    NotFound(DonationId),
    #[error(transparent)]
    InvalidState(#[from] DonationError),
    #[error("storage failure: {0}")]
    StorageFailed(String),
}

pub struct ModerateDonationUseCase {
    repository: Arc<dyn DonationRepository>,
    event_log: Arc<dyn EventLogger>,
}

impl ModerateDonationUseCase {
    pub fn new(repository: Arc<dyn DonationRepository>, event_log: Arc<dyn EventLogger>) -> Self {
        Self {
            repository,
            event_log,
        }
    }

    pub async fn mark_for_moderation(
        &self,
        donation_id: DonationId,
    ) -> Result<(), ModerateDonationError> {
        self.toggle(donation_id, true).await
    }

    pub async fn approve(&self, donation_id: DonationId) -> Result<(), ModerateDonationError> {
        self.toggle(donation_id, false).await
    }

    async fn toggle(
        &self,
        donation_id: DonationId,
        mark: bool,
    ) -> Result<(), ModerateDonationError> {
        let mut donation = self
            .repository
            .get_by_id(donation_id)
            .await
            .map_err(|e| ModerateDonationError::StorageFailed(e.to_string()))?
            .ok_or(ModerateDonationError::NotFound(donation_id))?;

        if mark {
            donation.mark_for_moderation()?;
        } else {
            donation.approve()?;
        }

        self.repository
            .store(&mut donation)
            .await
            .map_err(|e| ModerateDonationError::StorageFailed(e.to_string()))?;

        let message = if mark {
            LOG_MESSAGE_MARKED
        } else {
            LOG_MESSAGE_APPROVED
        };
        if let Err(e) = self.event_log.log(donation_id, message).await {
            tracing::warn!(donation_id = %donation_id, error = %e, "event log write failed");
        }

        Ok(())
    }
}
