mod common;

use anyhow::Result;
use common::{test_service, StandardCatalog};
use factura::io::Exporter;

#[tokio::test]
async fn test_export_bills_csv() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCatalog::create_basic(&service).await?;

    let number = StandardCatalog::create_bill(&service, "alice", "2024-05-01").await?;
    service.add_line(&number, "WEB01", 2, None).await?;
    StandardCatalog::create_bill(&service, "bob", "2024-05-02").await?;

    let exporter = Exporter::new(&service);
    let mut buf = Vec::new();
    let count = exporter.export_bills_csv(&mut buf).await?;

    assert_eq!(count, 2);
    let csv = String::from_utf8(buf)?;
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("number,user,billing_date,amount_cents,is_paid,created_at")
    );
    assert!(csv.contains(&number));
    assert!(csv.contains("3998"));

    Ok(())
}

#[tokio::test]
async fn test_export_lines_csv_resolves_services() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCatalog::create_basic(&service).await?;

    let number = StandardCatalog::create_bill(&service, "alice", "2024-05-01").await?;
    service.add_line(&number, "WEB01", 2, None).await?;
    service.add_line(&number, "SUP01", 1, None).await?;

    let exporter = Exporter::new(&service);
    let mut buf = Vec::new();
    let count = exporter.export_lines_csv(&mut buf).await?;

    assert_eq!(count, 2);
    let csv = String::from_utf8(buf)?;
    assert!(csv.contains("WEB01"));
    assert!(csv.contains("Web hosting"));
    assert!(csv.contains("SUP01"));

    Ok(())
}

#[tokio::test]
async fn test_export_full_json_snapshot() -> Result<()> {
    let (service, _temp) = test_service().await?;
    StandardCatalog::create_basic(&service).await?;

    let number = StandardCatalog::create_bill(&service, "alice", "2024-05-01").await?;
    service.add_line(&number, "WEB01", 1, None).await?;
    service
        .set_billing_address("alice".into(), "1 Main Street".into())
        .await?;

    let exporter = Exporter::new(&service);
    let mut buf = Vec::new();
    let snapshot = exporter.export_full_json(&mut buf).await?;

    assert_eq!(snapshot.services.len(), 2);
    assert_eq!(snapshot.bills.len(), 1);
    assert_eq!(snapshot.lines.len(), 1);
    assert_eq!(snapshot.profiles.len(), 1);

    // The written JSON parses back into the same shape
    let parsed: factura::io::DatabaseSnapshot = serde_json::from_slice(&buf)?;
    assert_eq!(parsed.bills.len(), 1);
    assert_eq!(parsed.lines[0].total_cents, 1999);

    Ok(())
}
