//! In-memory collaborator doubles for the use-case tests.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

use donation_core::domain::{
    Donation, DonationId, DonationSnapshot, DonationStatus, Donor, PaymentId, PaymentReference,
    TrackingInfo,
};
use donation_core::ports::{
    AuthorizationChecker, BookingResult, DonationIdGenerator, DonationNotifier,
    DonationRepository, EventLogError, EventLogger, IdGeneratorError, ModerationPolicy,
    NotifierError, PaymentBookingService, PaymentServiceError, RepositoryError, RepositoryResult,
    TransactionData,
};
use donation_core::use_cases::Collaborators;

pub struct InMemoryDonationRepository {
    donations: RwLock<HashMap<i64, DonationSnapshot>>,
    next_id: AtomicI64,
    store_calls: AtomicU32,
    fail_store: bool,
}

impl InMemoryDonationRepository {
    pub fn new() -> Self {
        Self {
            donations: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
            store_calls: AtomicU32::new(0),
            fail_store: false,
        }
    }

    pub fn failing_store() -> Self {
        Self {
            fail_store: true,
            ..Self::new()
        }
    }

    pub async fn seed(&self, snapshot: DonationSnapshot) {
        let id = snapshot.id.expect("seeded donations need an id").0;
        self.donations.write().await.insert(id, snapshot);
    }

    pub async fn get(&self, id: i64) -> Option<DonationSnapshot> {
        self.donations.read().await.get(&id).cloned()
    }

    pub fn store_calls(&self) -> u32 {
        self.store_calls.load(Ordering::SeqCst)
    }

    pub async fn len(&self) -> usize {
        self.donations.read().await.len()
    }
}

#[async_trait]
impl DonationRepository for InMemoryDonationRepository {
    async fn get_by_id(&self, id: DonationId) -> RepositoryResult<Option<Donation>> {
        Ok(self
            .donations
            .read()
            .await
            .get(&id.0)
            .cloned()
            .map(Donation::from_snapshot))
    }

    async fn store(&self, donation: &mut Donation) -> RepositoryResult<()> {
        self.store_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_store {
            return Err(RepositoryError::Storage(
                "simulated storage failure".to_string(),
            ));
        }
        if donation.id().is_none() {
            let id = DonationId(self.next_id.fetch_add(1, Ordering::SeqCst));
            donation
                .assign_id(id)
                .map_err(|e| RepositoryError::Storage(e.to_string()))?;
        }
        let snapshot = donation.to_snapshot();
        let id = snapshot.id.expect("just assigned").0;
        self.donations.write().await.insert(id, snapshot);
        Ok(())
    }
}

pub struct StaticAuthorizer {
    allow: bool,
}

impl StaticAuthorizer {
    pub fn new(allow: bool) -> Self {
        Self { allow }
    }
}

#[async_trait]
impl AuthorizationChecker for StaticAuthorizer {
    async fn system_can_modify_donation(&self, _id: DonationId) -> bool {
        self.allow
    }
}

pub struct ScriptedPaymentService {
    book_result: BookingResult,
    cancel_ok: bool,
    restore_ok: bool,
    created_payment_id: i64,
    pub book_calls: AtomicU32,
    pub cancel_calls: AtomicU32,
    pub restore_calls: AtomicU32,
    pub create_calls: AtomicU32,
}

impl ScriptedPaymentService {
    pub fn booking(result: BookingResult) -> Self {
        Self {
            book_result: result,
            cancel_ok: true,
            restore_ok: true,
            created_payment_id: 900,
            book_calls: AtomicU32::new(0),
            cancel_calls: AtomicU32::new(0),
            restore_calls: AtomicU32::new(0),
            create_calls: AtomicU32::new(0),
        }
    }

    pub fn rejecting_cancellation() -> Self {
        Self {
            cancel_ok: false,
            ..Self::booking(BookingResult::Booked)
        }
    }

    pub fn rejecting_restore() -> Self {
        Self {
            restore_ok: false,
            ..Self::booking(BookingResult::Booked)
        }
    }

    pub fn book_calls(&self) -> u32 {
        self.book_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentBookingService for ScriptedPaymentService {
    async fn book_payment(
        &self,
        _payment_id: PaymentId,
        _data: &TransactionData,
    ) -> Result<BookingResult, PaymentServiceError> {
        self.book_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.book_result.clone())
    }

    async fn create_incomplete_payment(
        &self,
        _data: &TransactionData,
    ) -> Result<PaymentId, PaymentServiceError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        Ok(PaymentId(self.created_payment_id))
    }

    async fn cancel_payment(&self, _payment_id: PaymentId) -> Result<(), PaymentServiceError> {
        self.cancel_calls.fetch_add(1, Ordering::SeqCst);
        if self.cancel_ok {
            Ok(())
        } else {
            Err(PaymentServiceError("cancellation rejected".to_string()))
        }
    }

    async fn restore_payment(&self, _payment_id: PaymentId) -> Result<(), PaymentServiceError> {
        self.restore_calls.fetch_add(1, Ordering::SeqCst);
        if self.restore_ok {
            Ok(())
        } else {
            Err(PaymentServiceError("restore rejected".to_string()))
        }
    }
}

pub struct RecordingEventLog {
    entries: RwLock<Vec<(i64, String)>>,
}

impl RecordingEventLog {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    pub async fn entries_for(&self, donation_id: i64) -> Vec<String> {
        self.entries
            .read()
            .await
            .iter()
            .filter(|(id, _)| *id == donation_id)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub async fn total(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl EventLogger for RecordingEventLog {
    async fn log(&self, donation_id: DonationId, message: &str) -> Result<(), EventLogError> {
        self.entries
            .write()
            .await
            .push((donation_id.0, message.to_string()));
        Ok(())
    }
}

pub struct RecordingNotifier {
    pub sent: AtomicU32,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self {
            sent: AtomicU32::new(0),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            sent: AtomicU32::new(0),
            fail: true,
        }
    }

    pub fn sent_count(&self) -> u32 {
        self.sent.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DonationNotifier for RecordingNotifier {
    async fn send_confirmation_for(&self, _donation: &Donation) -> Result<(), NotifierError> {
        self.sent.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(NotifierError("simulated delivery failure".to_string()))
        } else {
            Ok(())
        }
    }
}

pub struct SequenceIdGenerator {
    next: AtomicI64,
}

impl SequenceIdGenerator {
    pub fn starting_at(first: i64) -> Self {
        Self {
            next: AtomicI64::new(first),
        }
    }
}

#[async_trait]
impl DonationIdGenerator for SequenceIdGenerator {
    async fn next_id(&self) -> Result<DonationId, IdGeneratorError> {
        Ok(DonationId(self.next.fetch_add(1, Ordering::SeqCst)))
    }
}

pub struct NoModeration;

impl ModerationPolicy for NoModeration {
    fn needs_moderation(&self, _donation: &Donation, _data: &TransactionData) -> bool {
        false
    }
}

pub struct AlwaysModerate;

impl ModerationPolicy for AlwaysModerate {
    fn needs_moderation(&self, _donation: &Donation, _data: &TransactionData) -> bool {
        true
    }
}

/// A donation snapshot in the given raw status, with a donor that has an
/// email address and non-blank tracking.
pub fn snapshot(id: i64, status: DonationStatus, payment_id: i64) -> DonationSnapshot {
    let is_booked = status == DonationStatus::ExternalBooked;
    DonationSnapshot {
        id: Some(DonationId(id)),
        status,
        payment: PaymentReference {
            payment_id: PaymentId(payment_id),
            is_booked,
        },
        donor: Donor::Email {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@example.com".to_string(),
        },
        tracking: TrackingInfo::builder()
            .campaign("year-end")
            .keyword("banner-top")
            .total_impression_count(5)
            .build(),
        comment: None,
        cancelled: false,
        marked_for_moderation: false,
        exported_at: None,
        is_scrubbed: false,
        newsletter: true,
        receipt: true,
        confirmed_at: if is_booked { Some(Utc::now()) } else { None },
        created_at: Utc::now(),
    }
}

pub fn transaction_data(transaction_id: &str) -> TransactionData {
    let mut data = TransactionData::new();
    data.insert(
        "transaction_id".to_string(),
        serde_json::Value::String(transaction_id.to_string()),
    );
    data.insert(
        "amount".to_string(),
        serde_json::Value::String("25.00".to_string()),
    );
    data
}

/// Wires the mock collaborators together. Defaults: authorization allowed,
/// no moderation.
pub struct TestContext {
    pub repository: Arc<InMemoryDonationRepository>,
    pub authorizer: Arc<StaticAuthorizer>,
    pub payments: Arc<ScriptedPaymentService>,
    pub event_log: Arc<RecordingEventLog>,
    pub notifier: Arc<RecordingNotifier>,
    pub id_generator: Arc<SequenceIdGenerator>,
    pub moderation: Arc<dyn ModerationPolicy>,
}

impl TestContext {
    pub fn with_payments(payments: ScriptedPaymentService) -> Self {
        Self {
            repository: Arc::new(InMemoryDonationRepository::new()),
            authorizer: Arc::new(StaticAuthorizer::new(true)),
            payments: Arc::new(payments),
            event_log: Arc::new(RecordingEventLog::new()),
            notifier: Arc::new(RecordingNotifier::new()),
            id_generator: Arc::new(SequenceIdGenerator::starting_at(1000)),
            moderation: Arc::new(NoModeration),
        }
    }

    pub fn deny_authorization(mut self) -> Self {
        self.authorizer = Arc::new(StaticAuthorizer::new(false));
        self
    }

    pub fn moderated(mut self) -> Self {
        self.moderation = Arc::new(AlwaysModerate);
        self
    }

    pub fn collaborators(&self) -> Collaborators {
        Collaborators {
            repository: self.repository.clone(),
            authorizer: self.authorizer.clone(),
            payments: self.payments.clone(),
            event_log: self.event_log.clone(),
            notifier: self.notifier.clone(),
            id_generator: self.id_generator.clone(),
            moderation: self.moderation.clone(),
        }
    }
}
