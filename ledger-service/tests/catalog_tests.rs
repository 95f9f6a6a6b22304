use common::decimal::dec;
use common::error::Error;
use common::model::{FundType, RiskLevel};
use ledger_service::FundCatalog;

#[test]
fn test_embedded_catalog() {
    let catalog = FundCatalog::embedded().unwrap();
    assert_eq!(catalog.len(), 5);

    let ids: Vec<&str> = catalog.definitions().iter().map(|f| f.fund_id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);

    let ecopetrol = &catalog.definitions()[1];
    assert_eq!(ecopetrol.name, "FPV_EL CLIENTE_ECOPETROL");
    assert_eq!(ecopetrol.fund_type, FundType::FPV);
    assert_eq!(ecopetrol.min_amount, dec!(125000));
    assert_eq!(ecopetrol.max_amount, dec!(10000000));
    assert_eq!(ecopetrol.risk_level, RiskLevel::Medium);

    let equities = &catalog.definitions()[3];
    assert_eq!(equities.fund_type, FundType::FIC);
    assert_eq!(equities.risk_level, RiskLevel::High);

    let fund = equities.to_fund();
    assert_eq!(fund.subscription_amount(), dec!(250000));
}

#[test]
fn test_catalog_accepts_numeric_amounts() {
    let catalog = FundCatalog::from_json(
        r#"[{"fund_id": "9", "name": "TEST", "type": "FIC", "min_amount": 1000,
             "max_amount": 2000, "risk_level": "BAJO"}]"#,
    )
    .unwrap();

    assert_eq!(catalog.definitions()[0].min_amount, dec!(1000));
    assert_eq!(catalog.definitions()[0].description, None);
}

#[test]
fn test_invalid_catalogs_rejected() {
    let cases = [
        "[]",
        "not json",
        r#"[{"fund_id": "1", "name": "A", "type": "FIC", "min_amount": "1", "max_amount": "2", "risk_level": "BAJO"},
            {"fund_id": "1", "name": "B", "type": "FPV", "min_amount": "1", "max_amount": "2", "risk_level": "ALTO"}]"#,
        r#"[{"fund_id": "1", "name": "A", "type": "FIC", "min_amount": "5", "max_amount": "2", "risk_level": "BAJO"}]"#,
        r#"[{"fund_id": "1", "name": "A", "type": "FIC", "min_amount": "0", "max_amount": "2", "risk_level": "BAJO"}]"#,
        r#"[{"fund_id": "1", "name": "A", "type": "XYZ", "min_amount": "1", "max_amount": "2", "risk_level": "BAJO"}]"#,
    ];

    for json in cases {
        let err = FundCatalog::from_json(json).unwrap_err();
        assert!(matches!(err, Error::ConfigurationError(_)), "accepted: {}", json);
    }
}

#[test]
fn test_missing_catalog_file() {
    let err = FundCatalog::from_path("/nonexistent/funds.json").unwrap_err();
    assert!(matches!(err, Error::ConfigurationError(_)));

    assert_eq!(FundCatalog::load(None).unwrap().len(), 5);
}
