//! Booking core shared by all provider notification flows.
//!
//! One parameterized use case handles the providers whose notifications
//! always reference an existing donation (credit card, Sofort, bank
//! transfer reconciliation); the PayPal flow composes the same core with a
//! bootstrap step for unknown donations.

use std::time::Duration;

use tokio::time::timeout;

use crate::domain::{Donation, DonationId, PaymentId};
use crate::ports::{BookingResult, RepositoryError, TransactionData};
use crate::use_cases::{Collaborators, NotificationResponse, DEFAULT_COLLABORATOR_TIMEOUT};

pub const MSG_WRONG_ACCESS_CODE: &str = "Wrong access code for donation";
pub const MSG_DONATION_NOT_FOUND: &str = "Donation not found";

pub const LOG_MESSAGE_BOOKED: &str = "booked";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationProvider {
    CreditCard,
    Sofort,
    BankTransfer,
    PayPal,
}

impl NotificationProvider {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationProvider::CreditCard => "credit-card",
            NotificationProvider::Sofort => "sofort",
            NotificationProvider::BankTransfer => "bank-transfer",
            NotificationProvider::PayPal => "paypal",
        }
    }
}

/// Logical shape of an inbound notification, any provider. Adapter code has
/// already flattened provider specifics into `transaction_data`.
#[derive(Debug, Clone)]
pub struct NotificationRequest {
    pub donation_id: DonationId,
    pub transaction_data: TransactionData,
}

pub struct BookDonationUseCase {
    provider: NotificationProvider,
    collaborators: Collaborators,
    call_timeout: Duration,
}

impl BookDonationUseCase {
    pub fn new(provider: NotificationProvider, collaborators: Collaborators) -> Self {
        Self {
            provider,
            collaborators,
            call_timeout: DEFAULT_COLLABORATOR_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn provider(&self) -> NotificationProvider {
        self.provider
    }

    /// Handles a notification that must reference an existing donation.
    pub async fn handle_notification(&self, request: NotificationRequest) -> NotificationResponse {
        let donation = match self.load(request.donation_id).await {
            Ok(Some(donation)) => donation,
            Ok(None) => {
                tracing::info!(
                    donation_id = %request.donation_id,
                    provider = self.provider.as_str(),
                    "notification for unknown donation rejected"
                );
                return NotificationResponse::failure(MSG_DONATION_NOT_FOUND);
            }
            Err(response) => return response,
        };

        self.book_existing(donation, request.transaction_data).await
    }

    /// Authorization gate plus booking. The payment service is never
    /// invoked when the authorization check fails.
    pub async fn book_existing(
        &self,
        donation: Donation,
        data: TransactionData,
    ) -> NotificationResponse {
        let Some(donation_id) = donation.id() else {
            return NotificationResponse::failure("donation has no identity");
        };

        match timeout(
            self.call_timeout,
            self.collaborators
                .authorizer
                .system_can_modify_donation(donation_id),
        )
        .await
        {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    donation_id = %donation_id,
                    provider = self.provider.as_str(),
                    "notification carried wrong access code"
                );
                return NotificationResponse::failure(MSG_WRONG_ACCESS_CODE);
            }
            Err(_) => return NotificationResponse::failure("authorization check timed out"),
        }

        self.book_authorized(donation, data).await
    }

    /// Booking without the authorization gate, for donations the system
    /// itself just created (PayPal bootstrap). There is no pre-issued
    /// credential to check on those.
    pub(crate) async fn book_authorized(
        &self,
        donation: Donation,
        data: TransactionData,
    ) -> NotificationResponse {
        let booking = match timeout(
            self.call_timeout,
            self.collaborators
                .payments
                .book_payment(donation.payment_id(), &data),
        )
        .await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => return NotificationResponse::failure(e.to_string()),
            Err(_) => return NotificationResponse::failure("payment booking timed out"),
        };

        match booking {
            BookingResult::Failure(failure) if failure.already_completed => {
                tracing::info!(
                    donation_id = ?donation.id(),
                    provider = self.provider.as_str(),
                    "replayed notification for settled payment ignored"
                );
                NotificationResponse::duplicate()
            }
            BookingResult::Failure(failure) => NotificationResponse::failure(failure.message),
            BookingResult::FollowUp { child_payment_id } => {
                self.create_follow_up(&donation, child_payment_id).await
            }
            BookingResult::Booked => self.complete_booking(donation, &data).await,
        }
    }

    async fn complete_booking(
        &self,
        mut donation: Donation,
        data: &TransactionData,
    ) -> NotificationResponse {
        // Moderation is evaluated on the pre-booking state; the decision is
        // applied after the transition succeeds.
        let needs_moderation = self
            .collaborators
            .moderation
            .needs_moderation(&donation, data);

        if let Err(e) = donation.confirm_booked() {
            return NotificationResponse::failure(e.to_string());
        }
        if needs_moderation {
            if let Err(e) = donation.mark_for_moderation() {
                return NotificationResponse::failure(e.to_string());
            }
        }

        if let Err(response) = self.store(&mut donation).await {
            return response;
        }

        let Some(donation_id) = donation.id() else {
            return NotificationResponse::failure("stored donation has no identity");
        };
        self.log(donation_id, LOG_MESSAGE_BOOKED).await;
        self.notify(&donation).await;

        NotificationResponse::success().with_context("donation_id", donation_id.0)
    }

    /// Spawns the donation record for a repeated charge of a recurring
    /// payment. The parent itself is not mutated; linkage lives in the
    /// payment context and in the two cross-referencing log entries.
    async fn create_follow_up(
        &self,
        parent: &Donation,
        child_payment_id: PaymentId,
    ) -> NotificationResponse {
        let Some(parent_id) = parent.id() else {
            return NotificationResponse::failure(
                "cannot create a follow-up for an unsaved donation",
            );
        };

        let child_id = match timeout(self.call_timeout, self.collaborators.id_generator.next_id())
            .await
        {
            Ok(Ok(id)) => id,
            Ok(Err(e)) => return NotificationResponse::failure(e.to_string()),
            Err(_) => return NotificationResponse::failure("id generation timed out"),
        };

        let mut child = Donation::follow_up(parent, child_id, child_payment_id);
        if let Err(response) = self.store(&mut child).await {
            return response;
        }

        if parent_id != child_id {
            self.log(
                parent_id,
                &format!("follow-up donation {} created", child_id),
            )
            .await;
            self.log(
                child_id,
                &format!("created as follow-up of donation {}", parent_id),
            )
            .await;
        }

        tracing::info!(
            parent_id = %parent_id,
            child_id = %child_id,
            child_payment_id = %child_payment_id,
            provider = self.provider.as_str(),
            "follow-up donation created"
        );

        NotificationResponse::success().with_context("follow_up_donation_id", child_id.0)
    }

    async fn load(&self, id: DonationId) -> Result<Option<Donation>, NotificationResponse> {
        match timeout(self.call_timeout, self.collaborators.repository.get_by_id(id)).await {
            Ok(Ok(found)) => Ok(found),
            Ok(Err(RepositoryError::NotFound(_))) => Ok(None),
            Ok(Err(e)) => Err(NotificationResponse::failure(e.to_string())),
            Err(_) => Err(NotificationResponse::failure("donation lookup timed out")),
        }
    }

    pub(crate) async fn store(
        &self,
        donation: &mut Donation,
    ) -> Result<(), NotificationResponse> {
        match timeout(
            self.call_timeout,
            self.collaborators.repository.store(donation),
        )
        .await
        {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(NotificationResponse::failure(e.to_string())),
            Err(_) => Err(NotificationResponse::failure("donation store timed out")),
        }
    }

    /// Event-log failures are swallowed; the booking already happened.
    async fn log(&self, donation_id: DonationId, message: &str) {
        match timeout(
            self.call_timeout,
            self.collaborators.event_log.log(donation_id, message),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(donation_id = %donation_id, error = %e, "event log write failed")
            }
            Err(_) => {
                tracing::warn!(donation_id = %donation_id, "event log write timed out")
            }
        }
    }

    /// Confirmation delivery is best-effort and explicitly allowed to fail.
    async fn notify(&self, donation: &Donation) {
        match timeout(
            self.call_timeout,
            self.collaborators.notifier.send_confirmation_for(donation),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(donation_id = ?donation.id(), error = %e, "confirmation not sent")
            }
            Err(_) => {
                tracing::warn!(donation_id = ?donation.id(), "confirmation send timed out")
            }
        }
    }
}
