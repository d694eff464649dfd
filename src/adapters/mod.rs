pub mod amount_policy;
pub mod mailer;
pub mod payment_client;
pub mod postgres_donation_repository;
pub mod postgres_event_log;
pub mod token_authorization;

pub use amount_policy::AmountThresholdPolicy;
pub use mailer::MailerClient;
pub use payment_client::PaymentServiceClient;
pub use postgres_donation_repository::{PostgresDonationIdGenerator, PostgresDonationRepository};
pub use postgres_event_log::PostgresEventLog;
pub use token_authorization::TokenAuthorizationChecker;
