mod common;

use anyhow::Result;
use common::{test_service, StandardCatalog};

#[tokio::test]
async fn test_fresh_ledger_is_consistent() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let report = service.check_integrity().await?;
    assert!(report.is_consistent());
    assert_eq!(report.bill_count, 0);
    assert_eq!(report.line_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_ledger_stays_consistent_through_line_churn() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCatalog::create_basic(&service).await?;

    let first = StandardCatalog::create_bill(&service, "alice", "2024-05-01").await?;
    let second = StandardCatalog::create_bill(&service, "bob", "2024-05-02").await?;

    let hosting = service.add_line(&first, "WEB01", 2, None).await?;
    service.add_line(&first, "SUP01", 3, None).await?;
    service.add_line(&second, "SUP01", 1, Some(1500)).await?;

    service.update_line(hosting.line.id, Some(1), Some(0)).await?;
    service.remove_line(hosting.line.id).await?;

    let report = service.check_integrity().await?;
    assert!(
        report.is_consistent(),
        "unexpected issues: {:?}",
        report.issues
    );
    assert_eq!(report.bill_count, 2);
    assert_eq!(report.line_count, 2);

    Ok(())
}

#[tokio::test]
async fn test_report_counts_bills_and_lines() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCatalog::create_basic(&service).await?;

    let number = StandardCatalog::create_bill(&service, "alice", "2024-05-01").await?;
    service.add_line(&number, "WEB01", 1, None).await?;
    service.add_line(&number, "SUP01", 2, None).await?;

    let report = service.check_integrity().await?;
    assert_eq!(report.bill_count, 1);
    assert_eq!(report.line_count, 2);

    Ok(())
}
