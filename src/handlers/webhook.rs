//! Provider notification endpoints.
//!
//! Each handler verifies the gateway signature over the raw body, translates
//! the provider payload into the internal notification shape and dispatches
//! to the matching use case. The presented donation access token feeds the
//! per-request authorization checker.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::Value;
use sha2::Sha256;

use crate::adapters::PostgresDonationRepository;
use crate::domain::DonationId;
use crate::error::AppError;
use crate::ports::{DonationRepository, TransactionData};
use crate::use_cases::book_donation::{MSG_DONATION_NOT_FOUND, MSG_WRONG_ACCESS_CODE};
use crate::use_cases::{
    BookDonationUseCase, NotificationProvider, NotificationRequest, NotificationResponse,
    PayPalNotificationUseCase,
};
use crate::AppState;

type HmacSha256 = Hmac<Sha256>;

const SIGNATURE_HEADER: &str = "x-webhook-signature";

#[derive(Debug, Deserialize)]
pub struct PayPalNotificationPayload {
    pub donation_id: i64,
    pub token: Option<String>,
    pub transaction_id: String,
    pub transaction_type: Option<String>,
    pub amount: BigDecimal,
    pub currency: Option<String>,
    pub fee: Option<BigDecimal>,
    pub payer_id: Option<String>,
    pub payer_email: Option<String>,
    pub payer_first_name: Option<String>,
    pub payer_last_name: Option<String>,
    pub payment_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SofortNotificationPayload {
    pub donation_id: i64,
    pub token: Option<String>,
    pub transaction_id: String,
    pub amount: BigDecimal,
    pub currency: Option<String>,
    pub time: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct BankTransferNotificationPayload {
    pub donation_id: i64,
    pub token: Option<String>,
    /// Bank-side booking reference for this transfer.
    pub transaction_id: String,
    pub amount: BigDecimal,
    pub currency: Option<String>,
    pub booking_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CreditCardNotificationPayload {
    pub donation_id: i64,
    pub token: Option<String>,
    pub transaction_id: String,
    pub amount: BigDecimal,
    pub currency: Option<String>,
    pub customer_id: Option<String>,
    pub session_id: Option<String>,
}

pub async fn paypal(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    verify_gateway_signature(&state, &headers, &body)?;
    let payload: PayPalNotificationPayload = parse_body(&body)?;

    let request = NotificationRequest {
        donation_id: DonationId(payload.donation_id),
        transaction_data: paypal_transaction_data(&payload),
    };
    let use_case = PayPalNotificationUseCase::new(state.collaborators(payload.token.clone()))
        .with_timeout(state.call_timeout());

    Ok(notification_reply(use_case.handle_notification(request).await))
}

pub async fn sofort(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    verify_gateway_signature(&state, &headers, &body)?;
    let payload: SofortNotificationPayload = parse_body(&body)?;

    let request = NotificationRequest {
        donation_id: DonationId(payload.donation_id),
        transaction_data: sofort_transaction_data(&payload),
    };
    let use_case = BookDonationUseCase::new(
        NotificationProvider::Sofort,
        state.collaborators(payload.token.clone()),
    )
    .with_timeout(state.call_timeout());

    Ok(notification_reply(use_case.handle_notification(request).await))
}

pub async fn credit_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    verify_gateway_signature(&state, &headers, &body)?;
    let payload: CreditCardNotificationPayload = parse_body(&body)?;

    let request = NotificationRequest {
        donation_id: DonationId(payload.donation_id),
        transaction_data: credit_card_transaction_data(&payload),
    };
    let use_case = BookDonationUseCase::new(
        NotificationProvider::CreditCard,
        state.collaborators(payload.token.clone()),
    )
    .with_timeout(state.call_timeout());

    Ok(notification_reply(use_case.handle_notification(request).await))
}

pub async fn bank_transfer(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    verify_gateway_signature(&state, &headers, &body)?;
    let payload: BankTransferNotificationPayload = parse_body(&body)?;

    let request = NotificationRequest {
        donation_id: DonationId(payload.donation_id),
        transaction_data: bank_transfer_transaction_data(&payload),
    };
    let use_case = BookDonationUseCase::new(
        NotificationProvider::BankTransfer,
        state.collaborators(payload.token.clone()),
    )
    .with_timeout(state.call_timeout());

    Ok(notification_reply(use_case.handle_notification(request).await))
}

pub async fn get_donation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let repository = PostgresDonationRepository::new(state.db.clone());
    let donation = repository
        .get_by_id(DonationId(id))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .ok_or_else(|| AppError::NotFound(format!("Donation {} not found", id)))?;

    Ok(Json(donation.to_snapshot()))
}

fn verify_gateway_signature(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<(), AppError> {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::BadRequest("Missing webhook signature".to_string()))?;

    if !signature_matches(&state.config.webhook_secret, body, signature) {
        return Err(AppError::Unauthorized("Invalid webhook signature".to_string()));
    }
    Ok(())
}

fn signature_matches(secret: &str, payload: &[u8], signature_hex: &str) -> bool {
    let Ok(mut mac) = HmacSha256::new_from_slice(secret.as_bytes()) else {
        return false;
    };
    mac.update(payload);
    match hex::decode(signature_hex) {
        Ok(signature) => mac.verify_slice(&signature).is_ok(),
        Err(_) => false,
    }
}

fn parse_body<'a, T: Deserialize<'a>>(body: &'a [u8]) -> Result<T, AppError> {
    serde_json::from_slice(body).map_err(|e| AppError::BadRequest(format!("Invalid payload: {e}")))
}

/// Map the use-case response onto HTTP in a way that stops provider retries
/// for permanent failures and encourages them for transient ones.
fn notification_reply(response: NotificationResponse) -> impl IntoResponse {
    let status = if response.handled || response.is_duplicate() {
        StatusCode::OK
    } else if response.message == MSG_WRONG_ACCESS_CODE {
        StatusCode::FORBIDDEN
    } else if response.message == MSG_DONATION_NOT_FOUND {
        StatusCode::NOT_FOUND
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (status, Json(response))
}

fn paypal_transaction_data(payload: &PayPalNotificationPayload) -> TransactionData {
    let mut data = TransactionData::new();
    data.insert(
        "transaction_id".to_string(),
        Value::String(payload.transaction_id.clone()),
    );
    data.insert(
        "amount".to_string(),
        Value::String(payload.amount.to_string()),
    );
    insert_opt(&mut data, "transaction_type", payload.transaction_type.as_deref());
    insert_opt(&mut data, "currency", payload.currency.as_deref());
    if let Some(fee) = &payload.fee {
        data.insert("fee".to_string(), Value::String(fee.to_string()));
    }
    insert_opt(&mut data, "payer_id", payload.payer_id.as_deref());
    insert_opt(&mut data, "payer_email", payload.payer_email.as_deref());
    insert_opt(
        &mut data,
        "payer_first_name",
        payload.payer_first_name.as_deref(),
    );
    insert_opt(
        &mut data,
        "payer_last_name",
        payload.payer_last_name.as_deref(),
    );
    insert_opt(&mut data, "payment_date", payload.payment_date.as_deref());
    data
}

fn sofort_transaction_data(payload: &SofortNotificationPayload) -> TransactionData {
    let mut data = TransactionData::new();
    data.insert(
        "transaction_id".to_string(),
        Value::String(payload.transaction_id.clone()),
    );
    data.insert(
        "amount".to_string(),
        Value::String(payload.amount.to_string()),
    );
    insert_opt(&mut data, "currency", payload.currency.as_deref());
    insert_opt(&mut data, "time", payload.time.as_deref());
    data
}

fn bank_transfer_transaction_data(payload: &BankTransferNotificationPayload) -> TransactionData {
    let mut data = TransactionData::new();
    data.insert(
        "transaction_id".to_string(),
        Value::String(payload.transaction_id.clone()),
    );
    data.insert(
        "amount".to_string(),
        Value::String(payload.amount.to_string()),
    );
    insert_opt(&mut data, "currency", payload.currency.as_deref());
    insert_opt(&mut data, "booking_date", payload.booking_date.as_deref());
    data
}

fn credit_card_transaction_data(payload: &CreditCardNotificationPayload) -> TransactionData {
    let mut data = TransactionData::new();
    data.insert(
        "transaction_id".to_string(),
        Value::String(payload.transaction_id.clone()),
    );
    data.insert(
        "amount".to_string(),
        Value::String(payload.amount.to_string()),
    );
    insert_opt(&mut data, "currency", payload.currency.as_deref());
    insert_opt(&mut data, "customer_id", payload.customer_id.as_deref());
    insert_opt(&mut data, "session_id", payload.session_id.as_deref());
    data
}

fn insert_opt(data: &mut TransactionData, key: &str, value: Option<&str>) {
    if let Some(value) = value {
        data.insert(key.to_string(), Value::String(value.to_string()));
    }
}
