use super::{format_cents, sum_line_totals, Bill, BillLine};

/// Result of a full consistency pass over the stored ledger.
#[derive(Debug, Clone)]
pub struct IntegrityReport {
    pub bill_count: i64,
    pub line_count: i64,
    pub issues: Vec<String>,
}

impl IntegrityReport {
    pub fn is_consistent(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Build an integrity report from the full set of bills and their lines.
/// Checks the derived-amount invariant per bill, plus number uniqueness
/// and assignment, plus line counts against orphaned rows.
pub fn build_integrity_report(
    bills: &[(Bill, Vec<BillLine>)],
    total_line_count: i64,
    orphan_line_count: i64,
) -> IntegrityReport {
    let mut issues = Vec::new();

    for (bill, lines) in bills {
        let expected = sum_line_totals(lines);
        if bill.amount_cents != expected {
            issues.push(format!(
                "bill {} amount is {} but its lines sum to {}",
                bill.number.as_deref().unwrap_or("(unnumbered)"),
                format_cents(bill.amount_cents),
                format_cents(expected),
            ));
        }
        if bill.number.is_none() {
            issues.push(format!("bill {} has no number assigned", bill.id));
        }
    }

    let mut seen = std::collections::HashSet::new();
    for (bill, _) in bills {
        if let Some(number) = &bill.number {
            if !seen.insert(number.as_str()) {
                issues.push(format!("bill number {} is assigned more than once", number));
            }
        }
    }

    if orphan_line_count > 0 {
        issues.push(format!(
            "{} line(s) reference a bill that no longer exists",
            orphan_line_count
        ));
    }

    IntegrityReport {
        bill_count: bills.len() as i64,
        line_count: total_line_count,
        issues,
    }
}
