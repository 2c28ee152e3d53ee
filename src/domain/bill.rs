use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, ServiceId};

pub type BillId = Uuid;
pub type LineId = Uuid;

/// A billing record owned by a user. The number and the amount are derived:
/// the number is assigned once on first persistence and never changes, the
/// amount is recomputed from the bill's lines after every line mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bill {
    pub id: BillId,
    /// Monotonically increasing sequence number for recency ordering
    pub sequence: i64,
    /// Human-readable number ("F" + YYYYMM + 3-digit suffix), unique,
    /// None until first persistence
    pub number: Option<String>,
    /// Owner identifier
    pub user: String,
    pub is_paid: bool,
    pub billing_date: NaiveDate,
    /// Sum of the bill's line totals, in cents
    pub amount_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Bill {
    /// Create a new bill. Sequence and number are assigned at persistence time.
    pub fn new(user: String, billing_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            sequence: 0, // Will be set by repository
            number: None,
            user,
            is_paid: false,
            billing_date,
            amount_cents: 0,
            created_at: Utc::now(),
        }
    }

    pub fn is_numbered(&self) -> bool {
        self.number.is_some()
    }
}

/// One priced item on a bill: a service times a quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillLine {
    pub id: LineId,
    pub bill_id: BillId,
    pub service_id: ServiceId,
    /// Always at least 1
    pub quantity: i64,
    /// Derived total in cents; 0 means "not yet computed"
    pub total_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl BillLine {
    pub fn new(bill_id: BillId, service_id: ServiceId, quantity: i64) -> Self {
        assert!(quantity > 0, "Line quantity must be positive");
        Self {
            id: Uuid::new_v4(),
            bill_id,
            service_id,
            quantity,
            total_cents: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_total(mut self, total_cents: Cents) -> Self {
        self.total_cents = total_cents;
        self
    }

    /// Fill in the derived total before the line is persisted.
    /// A zero total is computed from the service price and the quantity;
    /// a nonzero total is a manual override and is left untouched.
    pub fn assign_total(&mut self, price_cents: Cents) {
        if self.total_cents == 0 {
            self.total_cents = price_cents * self.quantity;
        }
    }
}

/// Sum the totals of a bill's current line set, starting from zero.
/// This is the full recomputation behind the bill amount invariant.
pub fn sum_line_totals(lines: &[BillLine]) -> Cents {
    lines.iter().map(|line| line.total_cents).sum()
}
