pub mod book_donation;
pub mod cancel_donation;
pub mod moderate_donation;
pub mod paypal_notification;
pub mod response;
pub mod restore_donation;

use std::sync::Arc;
use std::time::Duration;

use crate::ports::{
    AuthorizationChecker, DonationIdGenerator, DonationNotifier, DonationRepository, EventLogger,
    ModerationPolicy, PaymentBookingService,
};

pub use book_donation::{BookDonationUseCase, NotificationProvider, NotificationRequest};
pub use cancel_donation::{CancelDonationError, CancelDonationUseCase};
pub use moderate_donation::{ModerateDonationError, ModerateDonationUseCase};
pub use paypal_notification::PayPalNotificationUseCase;
pub use response::NotificationResponse;
pub use restore_donation::{RestoreDonationError, RestoreDonationUseCase};

/// Default upper bound on any single collaborator call. A hung payment
/// service or database must surface as a failure response, not block the
/// worker.
pub const DEFAULT_COLLABORATOR_TIMEOUT: Duration = Duration::from_secs(10);

/// Collaborator bundle shared by the notification use cases.
#[derive(Clone)]
pub struct Collaborators {
    pub repository: Arc<dyn DonationRepository>,
    pub authorizer: Arc<dyn AuthorizationChecker>,
    pub payments: Arc<dyn PaymentBookingService>,
    pub event_log: Arc<dyn EventLogger>,
    pub notifier: Arc<dyn DonationNotifier>,
    pub id_generator: Arc<dyn DonationIdGenerator>,
    pub moderation: Arc<dyn ModerationPolicy>,
}
