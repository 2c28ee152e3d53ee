// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use chrono::NaiveDate;
use factura::application::BillingService;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(BillingService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = BillingService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Helper to parse a date string into NaiveDate
pub fn parse_date(date_str: &str) -> NaiveDate {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d").unwrap()
}

/// Test fixture: standard catalog setup
pub struct StandardCatalog;

impl StandardCatalog {
    /// Create a basic service set: hosting at 19.99, support at 10.00
    pub async fn create_basic(service: &BillingService) -> Result<()> {
        service
            .create_service("WEB01".into(), "Web hosting".into(), None, 1999)
            .await?;
        service
            .create_service(
                "SUP01".into(),
                "Support hour".into(),
                Some("One hour of technical support".into()),
                1000,
            )
            .await?;
        Ok(())
    }

    /// Create a bill for the given user and return its number
    pub async fn create_bill(service: &BillingService, user: &str, date: &str) -> Result<String> {
        let bill = service.create_bill(user.into(), parse_date(date)).await?;
        Ok(bill.number.expect("created bill must be numbered"))
    }
}
