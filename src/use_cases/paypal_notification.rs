//! PayPal notification flow.
//!
//! PayPal is the one provider family whose notifications may arrive for a
//! donation that does not exist yet (e.g. a donation made directly through
//! the PayPal site). Instead of rejecting those, the use case synthesizes a
//! donation with an anonymous donor and blank tracking, then runs the same
//! booking core as every other provider.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::{Donation, Donor, TrackingInfo};
use crate::ports::{DonationRepository, PaymentBookingService, RepositoryError};
use crate::use_cases::book_donation::{
    BookDonationUseCase, NotificationProvider, NotificationRequest,
};
use crate::use_cases::{Collaborators, NotificationResponse};

pub struct PayPalNotificationUseCase {
    booking: BookDonationUseCase,
    repository: Arc<dyn DonationRepository>,
    payments: Arc<dyn PaymentBookingService>,
}

impl PayPalNotificationUseCase {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            repository: collaborators.repository.clone(),
            payments: collaborators.payments.clone(),
            booking: BookDonationUseCase::new(NotificationProvider::PayPal, collaborators),
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.booking = self.booking.with_timeout(call_timeout);
        self
    }

    pub async fn handle_notification(&self, request: NotificationRequest) -> NotificationResponse {
        match self.repository.get_by_id(request.donation_id).await {
            Ok(Some(donation)) => {
                self.booking
                    .book_existing(donation, request.transaction_data)
                    .await
            }
            Ok(None) | Err(RepositoryError::NotFound(_)) => {
                self.bootstrap_and_book(request).await
            }
            Err(e) => NotificationResponse::failure(e.to_string()),
        }
    }

    /// Creates donation and payment records for a notification that
    /// references nothing we know, then books against them. No
    /// authorization gate: the aggregate was created by this system a
    /// moment ago, so there is no pre-issued credential to verify.
    async fn bootstrap_and_book(&self, request: NotificationRequest) -> NotificationResponse {
        tracing::info!(
            donation_id = %request.donation_id,
            "PayPal notification for unknown donation, creating one"
        );

        let payment_id = match self
            .payments
            .create_incomplete_payment(&request.transaction_data)
            .await
        {
            Ok(id) => id,
            Err(e) => return NotificationResponse::failure(e.to_string()),
        };

        let mut donation = Donation::new(Donor::Anonymous, TrackingInfo::none(), payment_id);
        if let Err(response) = self.booking.store(&mut donation).await {
            return response;
        }

        self.booking
            .book_authorized(donation, request.transaction_data)
            .await
    }
}
