use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::BillingService;
use crate::domain::{Bill, BillLine, Service, UserProfile};

/// Database snapshot for full export
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub services: Vec<Service>,
    pub bills: Vec<Bill>,
    pub lines: Vec<BillLine>,
    pub profiles: Vec<UserProfile>,
}

/// Exporter for converting ledger data to various formats
pub struct Exporter<'a> {
    service: &'a BillingService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BillingService) -> Self {
        Self { service }
    }

    /// Export catalog services to CSV format
    pub async fn export_services_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let services = self.service.list_services().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["reference", "name", "description", "price_cents"])?;

        let mut count = 0;
        for service in &services {
            csv_writer.write_record([
                service.reference.clone(),
                service.name.clone(),
                service.description.clone(),
                service.price_cents.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export bills to CSV format
    pub async fn export_bills_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let bills = self.service.list_bills(None, false).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "number",
            "user",
            "billing_date",
            "amount_cents",
            "is_paid",
            "created_at",
        ])?;

        let mut count = 0;
        for bill in &bills {
            csv_writer.write_record([
                bill.number.clone().unwrap_or_default(),
                bill.user.clone(),
                bill.billing_date.to_string(),
                bill.amount_cents.to_string(),
                bill.is_paid.to_string(),
                bill.created_at.to_rfc3339(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export bill lines to CSV format, one row per line with its bill number
    /// and service reference resolved
    pub async fn export_lines_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let bills = self.service.list_bills(None, false).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "bill_number",
            "service_reference",
            "service_name",
            "quantity",
            "total_cents",
        ])?;

        let mut count = 0;
        for bill in &bills {
            let Some(number) = &bill.number else { continue };
            let detail = self.service.get_bill(number).await?;

            for line in &detail.lines {
                csv_writer.write_record([
                    number.clone(),
                    line.service_reference.clone(),
                    line.service_name.clone(),
                    line.line.quantity.to_string(),
                    line.line.total_cents.to_string(),
                ])?;
                count += 1;
            }
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export full database as JSON snapshot
    pub async fn export_full_json<W: Write>(&self, mut writer: W) -> Result<DatabaseSnapshot> {
        let services = self.service.list_services().await?;
        let bills = self.service.list_bills(None, false).await?;

        let mut lines = Vec::new();
        let mut profiles = Vec::new();
        let mut seen_users = std::collections::HashSet::new();

        for bill in &bills {
            if let Some(number) = &bill.number {
                let detail = self.service.get_bill(number).await?;
                lines.extend(detail.lines.into_iter().map(|l| l.line));
            }
            if seen_users.insert(bill.user.clone()) {
                match self.service.get_profile(&bill.user).await {
                    Ok(profile) => profiles.push(profile),
                    Err(crate::application::AppError::ProfileNotFound(_)) => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let snapshot = DatabaseSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            services,
            bills,
            lines,
            profiles,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
