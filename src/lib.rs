pub mod adapters;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod use_cases;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};

use adapters::{
    AmountThresholdPolicy, MailerClient, PaymentServiceClient, PostgresDonationIdGenerator,
    PostgresDonationRepository, PostgresEventLog, TokenAuthorizationChecker,
};
use use_cases::Collaborators;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub config: config::Config,
    pub payments: PaymentServiceClient,
    pub mailer: MailerClient,
}

impl AppState {
    pub fn new(db: sqlx::PgPool, config: config::Config) -> Self {
        let payments = PaymentServiceClient::new(config.payment_service_url.clone());
        let mailer = MailerClient::new(config.mailer_url.clone());
        Self {
            db,
            config,
            payments,
            mailer,
        }
    }

    /// Collaborator bundle for one notification, bound to the access token
    /// that notification presented.
    pub fn collaborators(&self, presented_token: Option<String>) -> Collaborators {
        Collaborators {
            repository: Arc::new(PostgresDonationRepository::new(self.db.clone())),
            authorizer: Arc::new(TokenAuthorizationChecker::new(
                self.db.clone(),
                presented_token,
            )),
            payments: Arc::new(self.payments.clone()),
            event_log: Arc::new(PostgresEventLog::new(self.db.clone())),
            notifier: Arc::new(self.mailer.clone()),
            id_generator: Arc::new(PostgresDonationIdGenerator::new(self.db.clone())),
            moderation: Arc::new(AmountThresholdPolicy::new(
                self.config.moderation_amount_limit.clone(),
            )),
        }
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.config.collaborator_timeout_secs)
    }
}

pub fn create_app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/donations/:id", get(handlers::webhook::get_donation))
        .route("/notifications/paypal", post(handlers::webhook::paypal))
        .route("/notifications/sofort", post(handlers::webhook::sofort))
        .route(
            "/notifications/credit-card",
            post(handlers::webhook::credit_card),
        )
        .route(
            "/notifications/bank-transfer",
            post(handlers::webhook::bank_transfer),
        )
        .layer(axum_middleware::from_fn(
            middleware::request_logger::request_logger_middleware,
        ))
        .with_state(state)
}
