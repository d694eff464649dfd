//! Donation aggregate and its status state machine.
//!
//! A donation moves `New → {Promise | ExternalIncomplete} → ExternalBooked`.
//! Cancellation and moderation are overlay markers on top of that raw
//! lifecycle: they are set and cleared independently, and
//! [`Donation::status`] resolves them in priority order (cancellation
//! dominates moderation). Keeping them as markers makes restore a flag
//! clear instead of a remembered pre-cancellation state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::domain::comment::DonationComment;
use crate::domain::donor::Donor;
use crate::domain::tracking::TrackingInfo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DonationId(pub i64);

impl fmt::Display for DonationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub i64);

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DonationStatus {
    New,
    Promise,
    ExternalIncomplete,
    ExternalBooked,
    Cancelled,
    Moderation,
    Exported,
}

impl DonationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DonationStatus::New => "new",
            DonationStatus::Promise => "promise",
            DonationStatus::ExternalIncomplete => "external-incomplete",
            DonationStatus::ExternalBooked => "external-booked",
            DonationStatus::Cancelled => "cancelled",
            DonationStatus::Moderation => "moderation",
            DonationStatus::Exported => "exported",
        }
    }
}

/// Reference into the payment bounded context. Amount, interval and payment
/// method live on the payment record and are reachable only through the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReference {
    pub payment_id: PaymentId,
    pub is_booked: bool,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DonationError {
    #[error("donation is already booked")]
    AlreadyBooked,
    #[error("donation cannot be booked in status {0}")]
    NotBookable(&'static str),
    #[error("donation is already cancelled")]
    AlreadyCancelled,
    #[error("donation is not cancelled")]
    NotCancelled,
    #[error("exported donations cannot be cancelled")]
    NotCancellable,
    #[error("donation is already marked for moderation")]
    AlreadyMarkedForModeration,
    #[error("donation is not marked for moderation")]
    NotMarkedForModeration,
    #[error("only booked donations can be exported")]
    NotExportable,
    #[error("donation is already exported")]
    AlreadyExported,
    #[error("donation already has a comment")]
    CommentAlreadySet,
    #[error("donation is already scrubbed")]
    AlreadyScrubbed,
    #[error("donation id is already assigned")]
    IdAlreadyAssigned,
}

/// Plain data form of a [`Donation`]. Used by the persistence adapter to
/// hydrate aggregates and by callers that need to seed a specific state.
/// `status` holds the raw lifecycle position (one of the four pre-overlay
/// values); the overlay markers are separate fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DonationSnapshot {
    pub id: Option<DonationId>,
    pub status: DonationStatus,
    pub payment: PaymentReference,
    pub donor: Donor,
    pub tracking: TrackingInfo,
    pub comment: Option<DonationComment>,
    pub cancelled: bool,
    pub marked_for_moderation: bool,
    pub exported_at: Option<DateTime<Utc>>,
    pub is_scrubbed: bool,
    pub newsletter: bool,
    pub receipt: bool,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct Donation {
    id: Option<DonationId>,
    status: DonationStatus,
    payment: PaymentReference,
    donor: Donor,
    tracking: TrackingInfo,
    comment: Option<DonationComment>,
    cancelled: bool,
    marked_for_moderation: bool,
    exported_at: Option<DateTime<Utc>>,
    is_scrubbed: bool,
    newsletter: bool,
    receipt: bool,
    confirmed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl Donation {
    /// A donation awaiting confirmation from an external payment provider.
    pub fn new(donor: Donor, tracking: TrackingInfo, payment_id: PaymentId) -> Self {
        Self {
            id: None,
            status: DonationStatus::ExternalIncomplete,
            payment: PaymentReference {
                payment_id,
                is_booked: false,
            },
            donor,
            tracking,
            comment: None,
            cancelled: false,
            marked_for_moderation: false,
            exported_at: None,
            is_scrubbed: false,
            newsletter: false,
            receipt: true,
            confirmed_at: None,
            created_at: Utc::now(),
        }
    }

    /// A follow-up donation for the Nth charge of a recurring payment.
    ///
    /// Copies the parent's donor, tracking and preferences, points at the
    /// child payment and starts out booked. Moderation gates the first
    /// charge only, so no re-evaluation happens here.
    pub fn follow_up(parent: &Donation, id: DonationId, child_payment_id: PaymentId) -> Self {
        Self {
            id: Some(id),
            status: DonationStatus::ExternalBooked,
            payment: PaymentReference {
                payment_id: child_payment_id,
                is_booked: true,
            },
            donor: parent.donor.clone(),
            tracking: parent.tracking.clone(),
            comment: None,
            cancelled: false,
            marked_for_moderation: false,
            exported_at: None,
            is_scrubbed: false,
            newsletter: parent.newsletter,
            receipt: parent.receipt,
            confirmed_at: Some(Utc::now()),
            created_at: Utc::now(),
        }
    }

    pub fn from_snapshot(snapshot: DonationSnapshot) -> Self {
        Self {
            id: snapshot.id,
            status: snapshot.status,
            payment: snapshot.payment,
            donor: snapshot.donor,
            tracking: snapshot.tracking,
            comment: snapshot.comment,
            cancelled: snapshot.cancelled,
            marked_for_moderation: snapshot.marked_for_moderation,
            exported_at: snapshot.exported_at,
            is_scrubbed: snapshot.is_scrubbed,
            newsletter: snapshot.newsletter,
            receipt: snapshot.receipt,
            confirmed_at: snapshot.confirmed_at,
            created_at: snapshot.created_at,
        }
    }

    pub fn to_snapshot(&self) -> DonationSnapshot {
        DonationSnapshot {
            id: self.id,
            status: self.status,
            payment: self.payment,
            donor: self.donor.clone(),
            tracking: self.tracking.clone(),
            comment: self.comment.clone(),
            cancelled: self.cancelled,
            marked_for_moderation: self.marked_for_moderation,
            exported_at: self.exported_at,
            is_scrubbed: self.is_scrubbed,
            newsletter: self.newsletter,
            receipt: self.receipt,
            confirmed_at: self.confirmed_at,
            created_at: self.created_at,
        }
    }

    pub fn id(&self) -> Option<DonationId> {
        self.id
    }

    /// Assigns the persistent identity. Legal exactly once; repositories
    /// call this when storing a new aggregate.
    pub fn assign_id(&mut self, id: DonationId) -> Result<(), DonationError> {
        if self.id.is_some() {
            return Err(DonationError::IdAlreadyAssigned);
        }
        self.id = Some(id);
        Ok(())
    }

    /// Effective status. Overlay markers win over the raw lifecycle
    /// position; cancellation is checked before moderation.
    pub fn status(&self) -> DonationStatus {
        if self.cancelled {
            DonationStatus::Cancelled
        } else if self.marked_for_moderation {
            DonationStatus::Moderation
        } else if self.exported_at.is_some() {
            DonationStatus::Exported
        } else {
            self.status
        }
    }

    pub fn payment_id(&self) -> PaymentId {
        self.payment.payment_id
    }

    pub fn payment(&self) -> &PaymentReference {
        &self.payment
    }

    pub fn donor(&self) -> &Donor {
        &self.donor
    }

    pub fn tracking(&self) -> &TrackingInfo {
        &self.tracking
    }

    pub fn comment(&self) -> Option<&DonationComment> {
        self.comment.as_ref()
    }

    pub fn is_booked(&self) -> bool {
        self.payment.is_booked
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled
    }

    pub fn needs_moderation(&self) -> bool {
        self.marked_for_moderation
    }

    pub fn is_exported(&self) -> bool {
        self.exported_at.is_some()
    }

    pub fn is_scrubbed(&self) -> bool {
        self.is_scrubbed
    }

    pub fn wants_newsletter(&self) -> bool {
        self.newsletter
    }

    pub fn wants_receipt(&self) -> bool {
        self.receipt
    }

    pub fn confirmed_at(&self) -> Option<DateTime<Utc>> {
        self.confirmed_at
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn set_preferences(&mut self, newsletter: bool, receipt: bool) {
        self.newsletter = newsletter;
        self.receipt = receipt;
    }

    /// Confirms that the payment provider settled funds for this donation.
    pub fn confirm_booked(&mut self) -> Result<(), DonationError> {
        if self.payment.is_booked || self.status == DonationStatus::ExternalBooked {
            return Err(DonationError::AlreadyBooked);
        }
        if self.cancelled {
            return Err(DonationError::NotBookable("cancelled"));
        }
        match self.status {
            DonationStatus::New | DonationStatus::Promise | DonationStatus::ExternalIncomplete => {
                self.status = DonationStatus::ExternalBooked;
                self.payment.is_booked = true;
                self.confirmed_at = Some(Utc::now());
                Ok(())
            }
            other => Err(DonationError::NotBookable(other.as_str())),
        }
    }

    /// Marks the donation cancelled. The caller is responsible for having
    /// cancelled the payment side first; this only mutates the aggregate.
    pub fn cancel(&mut self) -> Result<(), DonationError> {
        if self.cancelled {
            return Err(DonationError::AlreadyCancelled);
        }
        if self.exported_at.is_some() {
            return Err(DonationError::NotCancellable);
        }
        self.cancelled = true;
        Ok(())
    }

    /// Reverses a cancellation, returning to the pre-cancellation state.
    pub fn revert_cancellation(&mut self) -> Result<(), DonationError> {
        if !self.cancelled {
            return Err(DonationError::NotCancelled);
        }
        self.cancelled = false;
        Ok(())
    }

    pub fn mark_for_moderation(&mut self) -> Result<(), DonationError> {
        if self.marked_for_moderation {
            return Err(DonationError::AlreadyMarkedForModeration);
        }
        self.marked_for_moderation = true;
        Ok(())
    }

    pub fn approve(&mut self) -> Result<(), DonationError> {
        if !self.marked_for_moderation {
            return Err(DonationError::NotMarkedForModeration);
        }
        self.marked_for_moderation = false;
        Ok(())
    }

    /// Records the hand-over to the back office. Settable once, and only
    /// for a donation whose effective status is booked.
    pub fn mark_exported(&mut self, at: DateTime<Utc>) -> Result<(), DonationError> {
        if self.exported_at.is_some() {
            return Err(DonationError::AlreadyExported);
        }
        if self.status() != DonationStatus::ExternalBooked {
            return Err(DonationError::NotExportable);
        }
        self.exported_at = Some(at);
        Ok(())
    }

    pub fn add_comment(&mut self, comment: DonationComment) -> Result<(), DonationError> {
        if self.comment.is_some() {
            return Err(DonationError::CommentAlreadySet);
        }
        self.comment = Some(comment);
        Ok(())
    }

    /// Removes personal data. The row stays; the donor becomes a
    /// placeholder.
    pub fn scrub(&mut self) -> Result<(), DonationError> {
        if self.is_scrubbed {
            return Err(DonationError::AlreadyScrubbed);
        }
        self.donor = Donor::Scrubbed;
        self.comment = None;
        self.is_scrubbed = true;
        Ok(())
    }
}
