mod common;

use anyhow::Result;
use common::{test_service, StandardCatalog};
use factura::application::AppError;

#[tokio::test]
async fn test_create_and_fetch_service() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_service(
            "WEB01".into(),
            "Web hosting".into(),
            Some("Monthly plan".into()),
            1999,
        )
        .await?;

    let fetched = service.get_service("WEB01").await?;
    assert_eq!(fetched.name, "Web hosting");
    assert_eq!(fetched.description, "Monthly plan");
    assert_eq!(fetched.price_cents, 1999);

    Ok(())
}

#[tokio::test]
async fn test_duplicate_reference_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service
        .create_service("WEB01".into(), "Web hosting".into(), None, 1999)
        .await?;

    let result = service
        .create_service("WEB01".into(), "Another".into(), None, 500)
        .await;

    assert!(matches!(result, Err(AppError::ServiceAlreadyExists(_))));

    Ok(())
}

#[tokio::test]
async fn test_negative_price_is_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service
        .create_service("BAD".into(), "Negative".into(), None, -100)
        .await;

    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    Ok(())
}

#[tokio::test]
async fn test_unknown_service_reports_not_found() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.get_service("NOPE").await;
    assert!(matches!(result, Err(AppError::ServiceNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_list_services_ordered_by_reference() -> Result<()> {
    let (service, _temp) = test_service().await?;

    StandardCatalog::create_basic(&service).await?;
    service
        .create_service("AAA".into(), "First by reference".into(), None, 100)
        .await?;

    let services = service.list_services().await?;
    let references: Vec<&str> = services.iter().map(|s| s.reference.as_str()).collect();
    assert_eq!(references, vec!["AAA", "SUP01", "WEB01"]);

    Ok(())
}
