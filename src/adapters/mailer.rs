//! Confirmation messaging through the mail relay service.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;

use crate::domain::Donation;
use crate::ports::{DonationNotifier, NotifierError};

#[derive(Debug, Serialize)]
struct ConfirmationMessage<'a> {
    donation_id: i64,
    recipient: &'a str,
    recipient_name: String,
}

#[derive(Clone)]
pub struct MailerClient {
    client: Client,
    base_url: String,
}

impl MailerClient {
    pub fn new(base_url: String) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self { client, base_url }
    }
}

#[async_trait]
impl DonationNotifier for MailerClient {
    async fn send_confirmation_for(&self, donation: &Donation) -> Result<(), NotifierError> {
        // Nothing to send for anonymous or scrubbed donors.
        let Some(recipient) = donation.donor().email() else {
            return Ok(());
        };
        let Some(donation_id) = donation.id() else {
            return Ok(());
        };

        let message = ConfirmationMessage {
            donation_id: donation_id.0,
            recipient,
            recipient_name: donation.donor().display_name(),
        };

        let response = self
            .client
            .post(format!(
                "{}/donation-confirmations",
                self.base_url.trim_end_matches('/')
            ))
            .json(&message)
            .send()
            .await
            .map_err(|e| NotifierError(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifierError(format!(
                "mail relay returned status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DonationId, Donor, PaymentId, TrackingInfo};

    fn donation_with_email() -> Donation {
        let mut donation = Donation::new(
            Donor::Email {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
            },
            TrackingInfo::none(),
            PaymentId(5),
        );
        donation.assign_id(DonationId(1)).unwrap();
        donation
    }

    #[tokio::test]
    async fn sends_confirmation_to_mail_relay() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/donation-confirmations")
            .with_status(202)
            .create_async()
            .await;

        let mailer = MailerClient::new(server.url());
        mailer
            .send_confirmation_for(&donation_with_email())
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn skips_donors_without_email() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/donation-confirmations")
            .expect(0)
            .create_async()
            .await;

        let donation = Donation::new(Donor::Anonymous, TrackingInfo::none(), PaymentId(5));
        let mailer = MailerClient::new(server.url());
        mailer.send_confirmation_for(&donation).await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn relay_error_is_reported() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/donation-confirmations")
            .with_status(503)
            .create_async()
            .await;

        let mailer = MailerClient::new(server.url());
        let result = mailer.send_confirmation_for(&donation_with_email()).await;

        assert!(result.is_err());
    }
}
