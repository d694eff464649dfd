//! HTTP client for the payment bounded context.
//!
//! The payment service owns payment records and transaction-id history;
//! this client maps its booking verdicts onto [`BookingResult`]. Transport
//! problems go through a circuit breaker so a dead payment service fails
//! fast instead of tying up webhook workers.

use async_trait::async_trait;
use failsafe::futures::CircuitBreaker as FuturesCircuitBreaker;
use failsafe::{backoff, failure_policy, Config, Error as FailsafeError, StateMachine};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

use crate::domain::PaymentId;
use crate::ports::{
    BookingFailure, BookingResult, PaymentBookingService, PaymentServiceError, TransactionData,
};

#[derive(Debug, Deserialize)]
struct BookPaymentResponse {
    status: String,
    #[serde(default)]
    child_payment_id: Option<i64>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    already_completed: bool,
}

#[derive(Debug, Deserialize)]
struct CreatePaymentResponse {
    payment_id: i64,
}

#[derive(Clone)]
pub struct PaymentServiceClient {
    client: Client,
    base_url: String,
    circuit_breaker: StateMachine<failure_policy::ConsecutiveFailures<backoff::EqualJittered>, ()>,
}

impl PaymentServiceClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        let backoff = backoff::equal_jittered(Duration::from_secs(60), Duration::from_secs(120));
        let policy = failure_policy::consecutive_failures(3, backoff);
        let circuit_breaker = Config::new().failure_policy(policy).build();

        Self {
            client,
            base_url,
            circuit_breaker,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response, PaymentServiceError> {
        let request = self.client.post(self.url(path)).json(body);

        let result = self
            .circuit_breaker
            .call(async move {
                let response = request
                    .send()
                    .await
                    .map_err(|e| PaymentServiceError(e.to_string()))?;
                if !response.status().is_success() {
                    return Err(PaymentServiceError(format!(
                        "payment service returned status {}",
                        response.status()
                    )));
                }
                Ok(response)
            })
            .await;

        match result {
            Ok(response) => Ok(response),
            Err(FailsafeError::Rejected) => Err(PaymentServiceError(
                "payment service circuit breaker is open".to_string(),
            )),
            Err(FailsafeError::Inner(e)) => Err(e),
        }
    }
}

#[async_trait]
impl PaymentBookingService for PaymentServiceClient {
    async fn book_payment(
        &self,
        payment_id: PaymentId,
        data: &TransactionData,
    ) -> Result<BookingResult, PaymentServiceError> {
        let response = self
            .post(
                &format!("/payments/{}/book", payment_id),
                &serde_json::Value::Object(data.clone()),
            )
            .await?;

        let verdict: BookPaymentResponse = response
            .json()
            .await
            .map_err(|e| PaymentServiceError(format!("invalid booking response: {e}")))?;

        match verdict.status.as_str() {
            "booked" => Ok(BookingResult::Booked),
            "follow-up" => {
                let child = verdict.child_payment_id.ok_or_else(|| {
                    PaymentServiceError("follow-up response without child payment id".to_string())
                })?;
                Ok(BookingResult::FollowUp {
                    child_payment_id: PaymentId(child),
                })
            }
            "failed" => Ok(BookingResult::Failure(BookingFailure {
                message: verdict
                    .message
                    .unwrap_or_else(|| "payment booking failed".to_string()),
                already_completed: verdict.already_completed,
            })),
            other => Err(PaymentServiceError(format!(
                "unknown booking status: {other}"
            ))),
        }
    }

    async fn create_incomplete_payment(
        &self,
        data: &TransactionData,
    ) -> Result<PaymentId, PaymentServiceError> {
        let response = self
            .post("/payments", &serde_json::Value::Object(data.clone()))
            .await?;

        let created: CreatePaymentResponse = response
            .json()
            .await
            .map_err(|e| PaymentServiceError(format!("invalid create response: {e}")))?;

        Ok(PaymentId(created.payment_id))
    }

    async fn cancel_payment(&self, payment_id: PaymentId) -> Result<(), PaymentServiceError> {
        self.post(
            &format!("/payments/{}/cancel", payment_id),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    async fn restore_payment(&self, payment_id: PaymentId) -> Result<(), PaymentServiceError> {
        self.post(
            &format!("/payments/{}/restore", payment_id),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }
}
