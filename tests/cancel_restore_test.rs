mod common;

use common::*;

use donation_core::domain::{DonationId, DonationStatus};
use donation_core::ports::BookingResult;
use donation_core::use_cases::{
    CancelDonationError, CancelDonationUseCase, RestoreDonationError, RestoreDonationUseCase,
};

fn cancel_use_case(ctx: &TestContext) -> CancelDonationUseCase {
    CancelDonationUseCase::new(
        ctx.repository.clone(),
        ctx.payments.clone(),
        ctx.event_log.clone(),
    )
}

fn restore_use_case(ctx: &TestContext) -> RestoreDonationUseCase {
    RestoreDonationUseCase::new(
        ctx.repository.clone(),
        ctx.payments.clone(),
        ctx.event_log.clone(),
    )
}

#[tokio::test]
async fn cancel_succeeds_when_payment_accepts() {
    let ctx = TestContext::with_payments(ScriptedPaymentService::booking(BookingResult::Booked));
    ctx.repository
        .seed(snapshot(1, DonationStatus::ExternalBooked, 42))
        .await;

    cancel_use_case(&ctx).execute(DonationId(1)).await.unwrap();

    let stored = ctx.repository.get(1).await.unwrap();
    assert!(stored.cancelled);
    assert_eq!(
        ctx.event_log.entries_for(1).await,
        vec!["canceled".to_string()]
    );
}

#[tokio::test]
async fn cancel_is_all_or_nothing_on_payment_failure() {
    let ctx = TestContext::with_payments(ScriptedPaymentService::rejecting_cancellation());
    ctx.repository
        .seed(snapshot(1, DonationStatus::ExternalBooked, 42))
        .await;

    let result = cancel_use_case(&ctx).execute(DonationId(1)).await;

    assert!(matches!(result, Err(CancelDonationError::PaymentFailed(_))));
    let stored = ctx.repository.get(1).await.unwrap();
    assert!(!stored.cancelled);
    assert_eq!(ctx.repository.store_calls(), 0);
}

#[tokio::test]
async fn cancel_of_unknown_donation_fails() {
    let ctx = TestContext::with_payments(ScriptedPaymentService::booking(BookingResult::Booked));

    let result = cancel_use_case(&ctx).execute(DonationId(4711)).await;

    assert!(matches!(
        result,
        Err(CancelDonationError::NotFound(DonationId(4711)))
    ));
}

#[tokio::test]
async fn cancel_of_cancelled_donation_fails_without_payment_call() {
    let ctx = TestContext::with_payments(ScriptedPaymentService::booking(BookingResult::Booked));
    let mut cancelled = snapshot(1, DonationStatus::ExternalBooked, 42);
    cancelled.cancelled = true;
    ctx.repository.seed(cancelled).await;

    let result = cancel_use_case(&ctx).execute(DonationId(1)).await;

    assert!(matches!(result, Err(CancelDonationError::InvalidState(_))));
    assert_eq!(
        ctx.payments
            .cancel_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}

#[tokio::test]
async fn restore_clears_the_cancellation() {
    let ctx = TestContext::with_payments(ScriptedPaymentService::booking(BookingResult::Booked));
    let mut cancelled = snapshot(1, DonationStatus::ExternalBooked, 42);
    cancelled.cancelled = true;
    ctx.repository.seed(cancelled).await;

    restore_use_case(&ctx).execute(DonationId(1)).await.unwrap();

    let stored = ctx.repository.get(1).await.unwrap();
    assert!(!stored.cancelled);
    // Back to the pre-cancellation state.
    assert_eq!(stored.status, DonationStatus::ExternalBooked);
    assert_eq!(
        ctx.event_log.entries_for(1).await,
        vec!["restored".to_string()]
    );
}

#[tokio::test]
async fn restore_is_all_or_nothing_on_payment_failure() {
    let ctx = TestContext::with_payments(ScriptedPaymentService::rejecting_restore());
    let mut cancelled = snapshot(1, DonationStatus::ExternalBooked, 42);
    cancelled.cancelled = true;
    ctx.repository.seed(cancelled).await;

    let result = restore_use_case(&ctx).execute(DonationId(1)).await;

    assert!(matches!(
        result,
        Err(RestoreDonationError::PaymentFailed(_))
    ));
    let stored = ctx.repository.get(1).await.unwrap();
    assert!(stored.cancelled);
    assert_eq!(ctx.repository.store_calls(), 0);
}

#[tokio::test]
async fn restore_of_uncancelled_donation_fails() {
    let ctx = TestContext::with_payments(ScriptedPaymentService::booking(BookingResult::Booked));
    ctx.repository
        .seed(snapshot(1, DonationStatus::ExternalBooked, 42))
        .await;

    let result = restore_use_case(&ctx).execute(DonationId(1)).await;

    assert!(matches!(
        result,
        Err(RestoreDonationError::InvalidState(_))
    ));
    assert_eq!(
        ctx.payments
            .restore_calls
            .load(std::sync::atomic::Ordering::SeqCst),
        0
    );
}
