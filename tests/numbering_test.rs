mod common;

use anyhow::Result;
use chrono::Utc;
use common::{parse_date, test_service};

#[tokio::test]
async fn test_first_bill_gets_suffix_001() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let bill = service
        .create_bill("alice".into(), parse_date("2024-05-01"))
        .await?;

    let number = bill.number.expect("bill must be numbered after creation");
    let expected_prefix = format!("F{}", Utc::now().format("%Y%m"));
    assert_eq!(number, format!("{}001", expected_prefix));

    Ok(())
}

#[tokio::test]
async fn test_numbers_increment_across_bills() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let first = service
        .create_bill("alice".into(), parse_date("2024-05-01"))
        .await?;
    let second = service
        .create_bill("bob".into(), parse_date("2024-05-02"))
        .await?;
    let third = service
        .create_bill("alice".into(), parse_date("2024-05-03"))
        .await?;

    assert!(first.number.unwrap().ends_with("001"));
    assert!(second.number.unwrap().ends_with("002"));
    assert!(third.number.unwrap().ends_with("003"));

    Ok(())
}

#[tokio::test]
async fn test_numbers_are_unique() -> Result<()> {
    let (service, _temp) = test_service().await?;

    for i in 0..5 {
        service
            .create_bill(format!("user{}", i), parse_date("2024-05-01"))
            .await?;
    }

    let bills = service.list_bills(None, false).await?;
    let mut numbers: Vec<String> = bills.into_iter().filter_map(|b| b.number).collect();
    assert_eq!(numbers.len(), 5);

    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), 5, "Bill numbers must be unique");

    Ok(())
}

#[tokio::test]
async fn test_resaving_a_bill_does_not_renumber_it() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let bill = service
        .create_bill("alice".into(), parse_date("2024-05-01"))
        .await?;
    let number = bill.number.unwrap();

    // Updates that re-persist the bill must leave the number alone
    service.set_paid(&number, true).await?;
    service.set_paid(&number, false).await?;

    let detail = service.get_bill(&number).await?;
    assert_eq!(detail.bill.number.as_deref(), Some(number.as_str()));

    // And the next bill still continues the sequence from it
    let next = service
        .create_bill("bob".into(), parse_date("2024-05-02"))
        .await?;
    assert!(next.number.unwrap().ends_with("002"));

    Ok(())
}

#[tokio::test]
async fn test_number_embeds_creation_month_not_billing_date() -> Result<()> {
    let (service, _temp) = test_service().await?;

    // A backdated billing date does not change the embedded month
    let bill = service
        .create_bill("alice".into(), parse_date("2020-01-15"))
        .await?;

    let number = bill.number.unwrap();
    let expected_prefix = format!("F{}", Utc::now().format("%Y%m"));
    assert!(number.starts_with(&expected_prefix));

    Ok(())
}
