use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type ServiceId = Uuid;

/// A priced catalog item referenced by bill lines.
/// Services are immutable once created; repricing means creating a new entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: ServiceId,
    /// Short unique code used on the CLI and in exports (e.g. "WEB01")
    pub reference: String,
    pub name: String,
    pub description: String,
    /// Unit price in cents (never negative)
    pub price_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Service {
    pub fn new(reference: String, name: String, price_cents: Cents) -> Self {
        assert!(price_cents >= 0, "Service price must not be negative");
        Self {
            id: Uuid::new_v4(),
            reference,
            name,
            description: String::new(),
            price_cents,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}
