use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{Bill, BillId, BillLine, Cents, LineId, Service, ServiceId, UserProfile};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_PROFILES};

/// Repository for persisting and querying services, bills and bill lines.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_PROFILES)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Service operations
    // ========================

    /// Save a new catalog service to the database.
    pub async fn save_service(&self, service: &Service) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO services (id, reference, name, description, price_cents, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(service.id.to_string())
        .bind(&service.reference)
        .bind(&service.name)
        .bind(&service.description)
        .bind(service.price_cents)
        .bind(service.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save service")?;
        Ok(())
    }

    /// Get a service by ID.
    pub async fn get_service(&self, id: ServiceId) -> Result<Option<Service>> {
        let row = sqlx::query(
            r#"
            SELECT id, reference, name, description, price_cents, created_at
            FROM services
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch service")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_service(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a service by its reference code.
    pub async fn get_service_by_reference(&self, reference: &str) -> Result<Option<Service>> {
        let row = sqlx::query(
            r#"
            SELECT id, reference, name, description, price_cents, created_at
            FROM services
            WHERE reference = ?
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch service by reference")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_service(&row)?)),
            None => Ok(None),
        }
    }

    /// List all services, ordered by reference code.
    pub async fn list_services(&self) -> Result<Vec<Service>> {
        let rows = sqlx::query(
            r#"
            SELECT id, reference, name, description, price_cents, created_at
            FROM services
            ORDER BY reference
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list services")?;

        rows.iter().map(Self::row_to_service).collect()
    }

    fn row_to_service(row: &sqlx::sqlite::SqliteRow) -> Result<Service> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Service {
            id: Uuid::parse_str(&id_str).context("Invalid service ID")?,
            reference: row.get("reference"),
            name: row.get("name"),
            description: row.get("description"),
            price_cents: row.get("price_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Bill operations
    // ========================

    /// Save a new bill to the database.
    /// Automatically assigns the next sequence number. The bill must already
    /// carry its number.
    pub async fn save_bill(&self, bill: &mut Bill) -> Result<()> {
        let number = bill
            .number
            .as_deref()
            .context("Bill has no number assigned")?;

        // Get and increment sequence number atomically
        let sequence = self.next_sequence().await?;
        bill.sequence = sequence;

        sqlx::query(
            r#"
            INSERT INTO bills (id, sequence, number, user, is_paid, billing_date, amount_cents, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(bill.id.to_string())
        .bind(bill.sequence)
        .bind(number)
        .bind(&bill.user)
        .bind(bill.is_paid)
        .bind(bill.billing_date.to_string())
        .bind(bill.amount_cents)
        .bind(bill.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save bill")?;

        Ok(())
    }

    /// Get the next sequence number and increment the counter.
    async fn next_sequence(&self) -> Result<i64> {
        let row = sqlx::query(
            r#"
            UPDATE sequence_counters
            SET value = value + 1
            WHERE name = 'bill_sequence'
            RETURNING value
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to get next sequence number")?;

        Ok(row.get("value"))
    }

    /// Get a bill by ID.
    pub async fn get_bill(&self, id: BillId) -> Result<Option<Bill>> {
        let row = sqlx::query(
            r#"
            SELECT id, sequence, number, user, is_paid, billing_date, amount_cents, created_at
            FROM bills
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch bill")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_bill(&row)?)),
            None => Ok(None),
        }
    }

    /// Get a bill by its number.
    pub async fn get_bill_by_number(&self, number: &str) -> Result<Option<Bill>> {
        let row = sqlx::query(
            r#"
            SELECT id, sequence, number, user, is_paid, billing_date, amount_cents, created_at
            FROM bills
            WHERE number = ?
            "#,
        )
        .bind(number)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch bill by number")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_bill(&row)?)),
            None => Ok(None),
        }
    }

    /// Get the number of the most recently created bill, by sequence.
    pub async fn latest_bill_number(&self) -> Result<Option<String>> {
        let row = sqlx::query(
            r#"
            SELECT number
            FROM bills
            ORDER BY sequence DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch latest bill number")?;

        Ok(row.map(|r| r.get("number")))
    }

    /// List bills, optionally filtered by owner and/or payment status.
    /// Ordered by sequence.
    pub async fn list_bills(&self, user: Option<&str>, unpaid_only: bool) -> Result<Vec<Bill>> {
        let mut query = String::from(
            "SELECT id, sequence, number, user, is_paid, billing_date, amount_cents, created_at FROM bills WHERE 1=1",
        );

        if user.is_some() {
            query.push_str(" AND user = ?");
        }
        if unpaid_only {
            query.push_str(" AND is_paid = 0");
        }
        query.push_str(" ORDER BY sequence");

        let mut sql_query = sqlx::query(&query);
        if let Some(user) = user {
            sql_query = sql_query.bind(user);
        }

        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .context("Failed to list bills")?;

        rows.iter().map(Self::row_to_bill).collect()
    }

    /// Update a bill's payment status.
    pub async fn set_bill_paid(&self, id: BillId, paid: bool) -> Result<()> {
        sqlx::query("UPDATE bills SET is_paid = ? WHERE id = ?")
            .bind(paid)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update bill payment status")?;
        Ok(())
    }

    /// Persist a recomputed bill amount.
    pub async fn update_bill_amount(&self, id: BillId, amount_cents: Cents) -> Result<()> {
        sqlx::query("UPDATE bills SET amount_cents = ? WHERE id = ?")
            .bind(amount_cents)
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update bill amount")?;
        Ok(())
    }

    /// Delete a bill and all of its lines.
    pub async fn delete_bill(&self, id: BillId) -> Result<()> {
        sqlx::query("DELETE FROM bill_lines WHERE bill_id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete bill lines")?;

        sqlx::query("DELETE FROM bills WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete bill")?;

        Ok(())
    }

    fn row_to_bill(row: &sqlx::sqlite::SqliteRow) -> Result<Bill> {
        let id_str: String = row.get("id");
        let billing_date_str: String = row.get("billing_date");
        let created_at_str: String = row.get("created_at");

        Ok(Bill {
            id: Uuid::parse_str(&id_str).context("Invalid bill ID")?,
            sequence: row.get("sequence"),
            number: Some(row.get("number")),
            user: row.get("user"),
            is_paid: row.get::<i32, _>("is_paid") != 0,
            billing_date: NaiveDate::parse_from_str(&billing_date_str, "%Y-%m-%d")
                .context("Invalid billing date")?,
            amount_cents: row.get("amount_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Line operations
    // ========================

    /// Save a new bill line to the database.
    pub async fn save_line(&self, line: &BillLine) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO bill_lines (id, bill_id, service_id, quantity, total_cents, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(line.id.to_string())
        .bind(line.bill_id.to_string())
        .bind(line.service_id.to_string())
        .bind(line.quantity)
        .bind(line.total_cents)
        .bind(line.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save bill line")?;
        Ok(())
    }

    /// Get a bill line by ID.
    pub async fn get_line(&self, id: LineId) -> Result<Option<BillLine>> {
        let row = sqlx::query(
            r#"
            SELECT id, bill_id, service_id, quantity, total_cents, created_at
            FROM bill_lines
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch bill line")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_line(&row)?)),
            None => Ok(None),
        }
    }

    /// Update a bill line's quantity and total.
    pub async fn update_line(&self, line: &BillLine) -> Result<()> {
        sqlx::query("UPDATE bill_lines SET quantity = ?, total_cents = ? WHERE id = ?")
            .bind(line.quantity)
            .bind(line.total_cents)
            .bind(line.id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to update bill line")?;
        Ok(())
    }

    /// Delete a bill line.
    pub async fn delete_line(&self, id: LineId) -> Result<()> {
        sqlx::query("DELETE FROM bill_lines WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete bill line")?;
        Ok(())
    }

    /// List all lines currently attached to a bill, in insertion order.
    pub async fn list_lines_for_bill(&self, bill_id: BillId) -> Result<Vec<BillLine>> {
        let rows = sqlx::query(
            r#"
            SELECT id, bill_id, service_id, quantity, total_cents, created_at
            FROM bill_lines
            WHERE bill_id = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(bill_id.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to list lines for bill")?;

        rows.iter().map(Self::row_to_line).collect()
    }

    /// Count all bill lines.
    pub async fn count_lines(&self) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM bill_lines")
            .fetch_one(&self.pool)
            .await
            .context("Failed to count bill lines")?;
        Ok(row.get("count"))
    }

    /// Count lines whose bill no longer exists.
    pub async fn count_orphan_lines(&self) -> Result<i64> {
        let row = sqlx::query(
            r#"
            SELECT COUNT(*) as count
            FROM bill_lines l
            WHERE NOT EXISTS (SELECT 1 FROM bills b WHERE b.id = l.bill_id)
            "#,
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to count orphan lines")?;
        Ok(row.get("count"))
    }

    fn row_to_line(row: &sqlx::sqlite::SqliteRow) -> Result<BillLine> {
        let id_str: String = row.get("id");
        let bill_id_str: String = row.get("bill_id");
        let service_id_str: String = row.get("service_id");
        let created_at_str: String = row.get("created_at");

        Ok(BillLine {
            id: Uuid::parse_str(&id_str).context("Invalid line ID")?,
            bill_id: Uuid::parse_str(&bill_id_str).context("Invalid bill ID")?,
            service_id: Uuid::parse_str(&service_id_str).context("Invalid service ID")?,
            quantity: row.get("quantity"),
            total_cents: row.get("total_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Profile operations
    // ========================

    /// Save or replace a user's billing profile.
    pub async fn save_profile(&self, profile: &UserProfile) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_profiles (user, billing_address)
            VALUES (?, ?)
            ON CONFLICT(user) DO UPDATE SET billing_address = excluded.billing_address
            "#,
        )
        .bind(&profile.user)
        .bind(&profile.billing_address)
        .execute(&self.pool)
        .await
        .context("Failed to save user profile")?;
        Ok(())
    }

    /// Get a user's billing profile.
    pub async fn get_profile(&self, user: &str) -> Result<Option<UserProfile>> {
        let row = sqlx::query(
            r#"
            SELECT user, billing_address
            FROM user_profiles
            WHERE user = ?
            "#,
        )
        .bind(user)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch user profile")?;

        Ok(row.map(|row| UserProfile {
            user: row.get("user"),
            billing_address: row.get("billing_address"),
        }))
    }
}
