use serde::{Deserialize, Serialize};

/// A donor comment. A donation holds at most one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationComment {
    pub text: String,
    pub is_public: bool,
    pub author_display_name: String,
}

impl DonationComment {
    pub fn new(
        text: impl Into<String>,
        is_public: bool,
        author_display_name: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            is_public,
            author_display_name: author_display_name.into(),
        }
    }
}
