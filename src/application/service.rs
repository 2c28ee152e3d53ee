use chrono::{NaiveDate, Utc};

use crate::domain::{
    build_integrity_report, next_bill_number, sum_line_totals, Bill, BillId, BillLine, Cents,
    IntegrityReport, LineId, Service, UserProfile,
};
use crate::storage::Repository;

use super::AppError;

/// Application service providing high-level operations for the billing ledger.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
///
/// All derived state flows through here: a line gets its total before it is
/// written, a bill gets its number before it is first written, and a bill's
/// amount is recomputed from scratch after every line mutation.
pub struct BillingService {
    repo: Repository,
}

/// Result of adding or updating a bill line
pub struct LineResult {
    pub line: BillLine,
    /// The owning bill with its freshly recomputed amount
    pub bill: Bill,
    pub service: Service,
}

/// One line of a bill, resolved for display
pub struct LineDetail {
    pub line: BillLine,
    pub service_reference: String,
    pub service_name: String,
}

/// A bill together with its resolved lines
pub struct BillDetail {
    pub bill: Bill,
    pub lines: Vec<LineDetail>,
}

impl BillingService {
    /// Create a new billing service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Catalog operations
    // ========================

    /// Create a new catalog service.
    pub async fn create_service(
        &self,
        reference: String,
        name: String,
        description: Option<String>,
        price_cents: Cents,
    ) -> Result<Service, AppError> {
        if price_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Service price must not be negative".to_string(),
            ));
        }

        if self.repo.get_service_by_reference(&reference).await?.is_some() {
            return Err(AppError::ServiceAlreadyExists(reference));
        }

        let mut service = Service::new(reference, name, price_cents);
        if let Some(desc) = description {
            service = service.with_description(desc);
        }

        self.repo.save_service(&service).await?;
        Ok(service)
    }

    /// Get a catalog service by reference code.
    pub async fn get_service(&self, reference: &str) -> Result<Service, AppError> {
        self.repo
            .get_service_by_reference(reference)
            .await?
            .ok_or_else(|| AppError::ServiceNotFound(reference.to_string()))
    }

    /// List all catalog services.
    pub async fn list_services(&self) -> Result<Vec<Service>, AppError> {
        Ok(self.repo.list_services().await?)
    }

    // ========================
    // Bill operations
    // ========================

    /// Create a new bill for a user. The number is assigned here, before the
    /// first persistence, and never changes afterwards.
    pub async fn create_bill(
        &self,
        user: String,
        billing_date: NaiveDate,
    ) -> Result<Bill, AppError> {
        let mut bill = Bill::new(user, billing_date);
        self.assign_number(&mut bill).await?;
        self.repo.save_bill(&mut bill).await?;
        Ok(bill)
    }

    /// Assign a number to a bill that does not have one yet.
    /// A bill that is already numbered is left untouched.
    async fn assign_number(&self, bill: &mut Bill) -> Result<(), AppError> {
        if bill.is_numbered() {
            return Ok(());
        }

        let last = self.repo.latest_bill_number().await?;
        let number = next_bill_number(last.as_deref(), Utc::now().date_naive())?;
        bill.number = Some(number);
        Ok(())
    }

    /// Get a bill by number, with its lines resolved for display.
    pub async fn get_bill(&self, number: &str) -> Result<BillDetail, AppError> {
        let bill = self.get_bill_record(number).await?;
        let lines = self.repo.list_lines_for_bill(bill.id).await?;

        let mut details = Vec::with_capacity(lines.len());
        for line in lines {
            let service = self
                .repo
                .get_service(line.service_id)
                .await?
                .ok_or_else(|| AppError::ServiceNotFound(line.service_id.to_string()))?;
            details.push(LineDetail {
                line,
                service_reference: service.reference,
                service_name: service.name,
            });
        }

        Ok(BillDetail {
            bill,
            lines: details,
        })
    }

    /// List bills, optionally restricted to one owner and/or unpaid bills.
    pub async fn list_bills(
        &self,
        user: Option<&str>,
        unpaid_only: bool,
    ) -> Result<Vec<Bill>, AppError> {
        Ok(self.repo.list_bills(user, unpaid_only).await?)
    }

    /// Mark a bill as paid or unpaid. The number is never touched on re-save.
    pub async fn set_paid(&self, number: &str, paid: bool) -> Result<Bill, AppError> {
        let mut bill = self.get_bill_record(number).await?;
        self.repo.set_bill_paid(bill.id, paid).await?;
        bill.is_paid = paid;
        Ok(bill)
    }

    /// Delete a bill and all of its lines.
    /// No amount recomputation happens for a bill that is going away.
    pub async fn delete_bill(&self, number: &str) -> Result<Bill, AppError> {
        let bill = self.get_bill_record(number).await?;
        self.repo.delete_bill(bill.id).await?;
        Ok(bill)
    }

    async fn get_bill_record(&self, number: &str) -> Result<Bill, AppError> {
        self.repo
            .get_bill_by_number(number)
            .await?
            .ok_or_else(|| AppError::BillNotFound(number.to_string()))
    }

    // ========================
    // Line operations
    // ========================

    /// Add a line to a bill. The total is derived from the service price and
    /// the quantity unless a nonzero total is supplied explicitly; the bill
    /// amount is recomputed afterwards.
    pub async fn add_line(
        &self,
        bill_number: &str,
        service_reference: &str,
        quantity: i64,
        total_cents: Option<Cents>,
    ) -> Result<LineResult, AppError> {
        if quantity < 1 {
            return Err(AppError::InvalidQuantity(quantity));
        }

        let bill = self.get_bill_record(bill_number).await?;
        let service = self.get_service(service_reference).await?;

        let mut line = BillLine::new(bill.id, service.id, quantity);
        if let Some(total) = total_cents {
            line.total_cents = total;
        }
        line.assign_total(service.price_cents);

        self.repo.save_line(&line).await?;
        let bill = self.recompute_amount(bill.id).await?;

        Ok(LineResult {
            line,
            bill,
            service,
        })
    }

    /// Update a line's quantity and/or total, then recompute the bill amount.
    /// A total of 0 clears a manual override: the total is derived again from
    /// the service price and the (possibly new) quantity. A nonzero stored
    /// total is kept as-is when only the quantity changes.
    pub async fn update_line(
        &self,
        line_id: LineId,
        quantity: Option<i64>,
        total_cents: Option<Cents>,
    ) -> Result<LineResult, AppError> {
        let mut line = self
            .repo
            .get_line(line_id)
            .await?
            .ok_or_else(|| AppError::LineNotFound(line_id.to_string()))?;

        if let Some(q) = quantity {
            if q < 1 {
                return Err(AppError::InvalidQuantity(q));
            }
            line.quantity = q;
        }
        if let Some(total) = total_cents {
            line.total_cents = total;
        }

        let service = self
            .repo
            .get_service(line.service_id)
            .await?
            .ok_or_else(|| AppError::ServiceNotFound(line.service_id.to_string()))?;
        line.assign_total(service.price_cents);

        self.repo.update_line(&line).await?;
        let bill = self.recompute_amount(line.bill_id).await?;

        Ok(LineResult {
            line,
            bill,
            service,
        })
    }

    /// Remove a line from its bill and recompute the bill amount.
    pub async fn remove_line(&self, line_id: LineId) -> Result<Bill, AppError> {
        let line = self
            .repo
            .get_line(line_id)
            .await?
            .ok_or_else(|| AppError::LineNotFound(line_id.to_string()))?;

        self.repo.delete_line(line_id).await?;
        self.recompute_amount(line.bill_id).await
    }

    /// Recompute a bill's amount from its current line set.
    /// Full recomputation from zero, not an incremental delta.
    pub async fn recompute_amount(&self, bill_id: BillId) -> Result<Bill, AppError> {
        let mut bill = self
            .repo
            .get_bill(bill_id)
            .await?
            .ok_or_else(|| AppError::BillNotFound(bill_id.to_string()))?;

        let lines = self.repo.list_lines_for_bill(bill_id).await?;
        bill.amount_cents = sum_line_totals(&lines);
        self.repo
            .update_bill_amount(bill_id, bill.amount_cents)
            .await?;

        Ok(bill)
    }

    // ========================
    // Profile operations
    // ========================

    /// Set (or replace) the billing address for a user.
    pub async fn set_billing_address(
        &self,
        user: String,
        billing_address: String,
    ) -> Result<UserProfile, AppError> {
        let profile = UserProfile::new(user, billing_address);
        self.repo.save_profile(&profile).await?;
        Ok(profile)
    }

    /// Get the billing profile for a user.
    pub async fn get_profile(&self, user: &str) -> Result<UserProfile, AppError> {
        self.repo
            .get_profile(user)
            .await?
            .ok_or_else(|| AppError::ProfileNotFound(user.to_string()))
    }

    // ========================
    // Integrity operations
    // ========================

    /// Check ledger consistency and return a report.
    pub async fn check_integrity(&self) -> Result<IntegrityReport, AppError> {
        let bills = self.repo.list_bills(None, false).await?;

        let mut pairs = Vec::with_capacity(bills.len());
        for bill in bills {
            let lines = self.repo.list_lines_for_bill(bill.id).await?;
            pairs.push((bill, lines));
        }

        let line_count = self.repo.count_lines().await?;
        let orphan_count = self.repo.count_orphan_lines().await?;

        Ok(build_integrity_report(&pairs, line_count, orphan_count))
    }
}
