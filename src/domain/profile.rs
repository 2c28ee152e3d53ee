use serde::{Deserialize, Serialize};

/// Billing address attached to a user, one per user.
/// Pure association data; the ledger logic never reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub user: String,
    pub billing_address: String,
}

impl UserProfile {
    pub fn new(user: String, billing_address: String) -> Self {
        Self {
            user,
            billing_address,
        }
    }
}
