pub mod comment;
pub mod donation;
pub mod donor;
pub mod tracking;

pub use comment::DonationComment;
pub use donation::{
    Donation, DonationError, DonationId, DonationSnapshot, DonationStatus, PaymentId,
    PaymentReference,
};
pub use donor::{Donor, PostalAddress};
pub use tracking::{TrackingInfo, TrackingInfoBuilder};
