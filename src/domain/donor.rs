//! Donor variants attached to a donation.
//!
//! A donor is one of a closed set of shapes; consumers match exhaustively
//! instead of going through virtual dispatch.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostalAddress {
    pub street_address: String,
    pub postal_code: String,
    pub city: String,
    pub country_code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Donor {
    Person {
        first_name: String,
        last_name: String,
        salutation: Option<String>,
        title: Option<String>,
        address: PostalAddress,
        email: String,
    },
    Company {
        company_name: String,
        address: PostalAddress,
        email: String,
    },
    /// Donor who only left an email address, no postal data.
    Email {
        first_name: String,
        last_name: String,
        email: String,
    },
    Anonymous,
    /// Placeholder left behind after personal data removal.
    Scrubbed,
}

impl Donor {
    pub fn display_name(&self) -> String {
        match self {
            Donor::Person {
                first_name,
                last_name,
                ..
            }
            | Donor::Email {
                first_name,
                last_name,
                ..
            } => format!("{} {}", first_name, last_name),
            Donor::Company { company_name, .. } => company_name.clone(),
            Donor::Anonymous => "Anonymous".to_string(),
            Donor::Scrubbed => "Scrubbed".to_string(),
        }
    }

    pub fn email(&self) -> Option<&str> {
        match self {
            Donor::Person { email, .. }
            | Donor::Company { email, .. }
            | Donor::Email { email, .. } => Some(email),
            Donor::Anonymous | Donor::Scrubbed => None,
        }
    }

    pub fn postal_address(&self) -> Option<&PostalAddress> {
        match self {
            Donor::Person { address, .. } | Donor::Company { address, .. } => Some(address),
            Donor::Email { .. } | Donor::Anonymous | Donor::Scrubbed => None,
        }
    }

    /// Whether this donor can appear in a back-office export. Requires a
    /// postal address on file.
    pub fn is_exportable(&self) -> bool {
        self.postal_address().is_some()
    }

    pub fn is_anonymous(&self) -> bool {
        matches!(self, Donor::Anonymous)
    }
}
