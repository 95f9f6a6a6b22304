use common::decimal::precision::MAX_AMOUNT;
use common::decimal::{dec, Amount, Decimal};
use common::error::Error;
use common::model::TransactionType;
use ledger_service::repository::BalanceRepository;
use ledger_service::{LedgerService, NewClient, INITIAL_BALANCE};

async fn seeded_service() -> LedgerService {
    let service = LedgerService::new().unwrap();
    service.initialize().await.unwrap();
    service
}

fn new_client(client_id: &str) -> NewClient {
    NewClient {
        client_id: client_id.to_string(),
        name: "Ana".to_string(),
        surname: "Gomez".to_string(),
        city: "Bogota".to_string(),
        email: Some("ana@example.com".to_string()),
        phone: None,
    }
}

async fn balance_of(service: &LedgerService, client_id: &str) -> Amount {
    service.get_balance(client_id).await.unwrap().balance
}

#[tokio::test]
async fn test_initialize_loads_catalog() {
    let service = LedgerService::new().unwrap();

    let report = service.initialize().await.unwrap();
    assert!(report.table_created);
    assert_eq!(report.funds_loaded, 5);

    // Second run is a no-op for the table and rewrites the same funds
    let report = service.initialize().await.unwrap();
    assert!(!report.table_created);

    let funds = service.list_funds().await.unwrap();
    assert_eq!(funds.len(), 5);
    assert_eq!(funds[0].fund_id, "1");
    assert_eq!(funds[0].min_amount, dec!(75000));
    assert_eq!(funds[3].name, "FDO-ACCIONES");
    assert_eq!(funds[3].min_amount, dec!(250000));
}

#[tokio::test]
async fn test_create_client_sets_initial_balance() {
    let service = seeded_service().await;

    let created = service.create_client(new_client("C1")).await.unwrap();
    assert_eq!(created.client.client_id, "C1");
    assert_eq!(created.balance.balance, INITIAL_BALANCE);
    assert_eq!(created.transaction.transaction_type, TransactionType::InitialBalance);
    assert_eq!(created.transaction.amount, dec!(500000));
    assert_eq!(created.transaction.fund_id, "INITIAL_BALANCE");

    assert_eq!(balance_of(&service, "C1").await, dec!(500000));

    let transactions = service.list_transactions("C1").await.unwrap();
    assert_eq!(transactions.len(), 1);
    assert_eq!(transactions[0].transaction_type, TransactionType::InitialBalance);

    let client = service.get_client("C1").await.unwrap().unwrap();
    assert_eq!(client.name, "Ana");
    assert_eq!(client.email.as_deref(), Some("ana@example.com"));
    assert_eq!(client.phone, None);
}

#[tokio::test]
async fn test_create_duplicate_client_fails() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    let err = service.create_client(new_client("C1")).await.unwrap_err();
    assert!(matches!(err, Error::AlreadyExists { .. }));

    // Still a single initial balance entry
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 1);
    assert_eq!(balance_of(&service, "C1").await, dec!(500000));
}

#[tokio::test]
async fn test_create_client_overwrites_preexisting_balance() {
    let service = seeded_service().await;

    // Balance reads create an empty balance even for unknown clients
    assert_eq!(balance_of(&service, "C9").await, Amount::ZERO);

    let created = service.create_client(new_client("C9")).await.unwrap();
    assert_eq!(created.balance.balance, dec!(500000));
    assert_eq!(balance_of(&service, "C9").await, dec!(500000));
}

#[tokio::test]
async fn test_deposit_credits_balance() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    let receipt = service.deposit("C1", dec!(100000)).await.unwrap();
    assert_eq!(receipt.new_balance, dec!(600000));
    assert_eq!(receipt.transaction.transaction_type, TransactionType::Deposit);
    assert_eq!(receipt.transaction.fund_id, "DEPOSIT");
    assert_eq!(receipt.transaction.amount, dec!(100000));

    let receipt = service.deposit("C1", dec!(0.50)).await.unwrap();
    assert_eq!(receipt.new_balance, dec!(600000.50));
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 3);
}

#[tokio::test]
async fn test_deposit_rejects_non_positive_amounts() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    for amount in [Amount::ZERO, dec!(-100)] {
        let err = service.deposit("C1", amount).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
    }

    assert_eq!(balance_of(&service, "C1").await, dec!(500000));
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deposit_rejects_oversized_amounts() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    for amount in [Decimal::MAX, MAX_AMOUNT + dec!(0.01)] {
        let err = service.deposit("C1", amount).await.unwrap_err();
        assert!(matches!(err, Error::InvalidAmount(_)));
    }

    assert_eq!(balance_of(&service, "C1").await, dec!(500000));
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deposit_overflowing_balance_is_rejected() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    let balances = &service.repositories().balances;
    let mut balance = balances.get("C1").await.unwrap().unwrap();
    balance.reset(Decimal::MAX - dec!(1));
    balances.save(&balance).await.unwrap();

    let err = service.deposit("C1", MAX_AMOUNT).await.unwrap_err();
    assert!(matches!(err, Error::InvalidAmount(_)));

    assert_eq!(balance_of(&service, "C1").await, Decimal::MAX - dec!(1));
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deposit_unknown_client_fails() {
    let service = seeded_service().await;

    let err = service.deposit("nobody", dec!(100)).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    // Client check comes before the amount check
    let err = service.deposit("nobody", dec!(-1)).await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));
}

#[tokio::test]
async fn test_subscribe_debits_minimum_amount() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    let receipt = service.subscribe("C1", "2").await.unwrap();
    assert_eq!(receipt.subscription.amount, dec!(125000));
    assert_eq!(receipt.new_balance, dec!(375000));
    assert_eq!(receipt.transaction.transaction_type, TransactionType::Subscription);
    assert_eq!(receipt.transaction.fund_id, "2");

    let subscriptions = service.list_subscriptions("C1").await.unwrap();
    assert_eq!(subscriptions.len(), 1);
    assert_eq!(subscriptions[0].fund_id, "2");
}

#[tokio::test]
async fn test_subscribe_twice_fails_and_debits_once() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();
    service.subscribe("C1", "1").await.unwrap();

    let err = service.subscribe("C1", "1").await.unwrap_err();
    match err {
        Error::AlreadyExists { context, .. } => {
            let context = context.expect("duplicate subscription carries context");
            assert_eq!(context.fund_info.unwrap().fund_id, "1");
            assert_eq!(context.existing_subscription.unwrap().amount, dec!(75000));
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(balance_of(&service, "C1").await, dec!(425000));
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_subscribe_with_insufficient_funds_changes_nothing() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    service.subscribe("C1", "4").await.unwrap();
    service.subscribe("C1", "2").await.unwrap();
    service.subscribe("C1", "5").await.unwrap();
    assert_eq!(balance_of(&service, "C1").await, dec!(25000));

    let err = service.subscribe("C1", "3").await.unwrap_err();
    match &err {
        Error::InsufficientFunds { context, .. } => {
            assert_eq!(context.required_amount, Some(dec!(50000)));
            assert_eq!(context.current_balance, Some(dec!(25000)));
            assert_eq!(context.missing_amount, Some(dec!(25000)));
            assert_eq!(context.fund_info.as_ref().unwrap().name, "DEUDAPRIVADA");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    assert_eq!(balance_of(&service, "C1").await, dec!(25000));
    assert!(service.repositories().subscriptions.get("C1", "3").await.unwrap().is_none());
    assert_eq!(service.list_subscriptions("C1").await.unwrap().len(), 3);
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 4);
}

#[tokio::test]
async fn test_subscribe_unknown_client_or_fund_fails() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    let err = service.subscribe("nobody", "1").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = service.subscribe("C1", "99").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert!(service.list_subscriptions("C1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_subscribe_then_cancel_restores_balance() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();
    service.deposit("C1", dec!(12345.67)).await.unwrap();
    let before = balance_of(&service, "C1").await;

    service.subscribe("C1", "4").await.unwrap();
    let receipt = service.cancel("C1", "4").await.unwrap();

    assert_eq!(receipt.refunded_amount, dec!(250000));
    assert_eq!(receipt.new_balance, before);
    assert_eq!(receipt.transaction.transaction_type, TransactionType::Cancellation);
    assert_eq!(balance_of(&service, "C1").await, before);
    assert!(service.list_subscriptions("C1").await.unwrap().is_empty());

    // Subscribing again is allowed after a cancel
    service.subscribe("C1", "4").await.unwrap();
}

#[tokio::test]
async fn test_cancel_without_subscription_fails() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();

    let err = service.cancel("C1", "1").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    let err = service.cancel("C1", "99").await.unwrap_err();
    assert!(matches!(err, Error::NotFound(_)));

    assert_eq!(balance_of(&service, "C1").await, dec!(500000));
    assert_eq!(service.list_transactions("C1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_balance_overview_joins_funds() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();
    service.subscribe("C1", "1").await.unwrap();
    service.subscribe("C1", "3").await.unwrap();

    let overview = service.get_balance_overview("C1").await.unwrap();
    assert_eq!(overview.available_balance, dec!(375000));
    assert_eq!(overview.total_subscribed_funds, 2);

    let names: Vec<&str> = overview
        .subscribed_funds
        .iter()
        .map(|f| f.fund_name.as_str())
        .collect();
    assert_eq!(names, vec!["FPV_EL CLIENTE_RECAUDADORA", "DEUDAPRIVADA"]);
    assert_eq!(overview.subscribed_funds[1].fund_type, "FIC");
}

#[tokio::test]
async fn test_audit_matches_ledger() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();
    service.deposit("C1", dec!(100000)).await.unwrap();
    service.subscribe("C1", "1").await.unwrap();
    service.subscribe("C1", "2").await.unwrap();
    service.cancel("C1", "1").await.unwrap();

    let audit = service.audit_balance("C1").await.unwrap();
    assert!(audit.consistent);
    assert_eq!(audit.stored_balance, dec!(475000));
    assert_eq!(audit.ledger_balance, dec!(475000));
    assert_eq!(audit.transaction_count, 5);
}

#[tokio::test]
async fn test_list_clients() {
    let service = seeded_service().await;
    service.create_client(new_client("C1")).await.unwrap();
    service.create_client(new_client("C2")).await.unwrap();

    let clients = service.list_clients().await.unwrap();
    let mut ids: Vec<String> = clients.into_iter().map(|c| c.client_id).collect();
    ids.sort();
    assert_eq!(ids, vec!["C1".to_string(), "C2".to_string()]);
}

#[tokio::test]
async fn test_scenario_from_creation_to_cancel() {
    let service = seeded_service().await;

    let created = service.create_client(new_client("C1")).await.unwrap();
    assert_eq!(created.balance.balance, dec!(500000));

    let deposit = service.deposit("C1", dec!(100000)).await.unwrap();
    assert_eq!(deposit.new_balance, dec!(600000));

    let subscription = service.subscribe("C1", "1").await.unwrap();
    assert_eq!(subscription.new_balance, dec!(525000));
    assert_eq!(service.list_subscriptions("C1").await.unwrap().len(), 1);

    let cancellation = service.cancel("C1", "1").await.unwrap();
    assert_eq!(cancellation.new_balance, dec!(600000));
    assert_eq!(cancellation.transaction.amount, dec!(75000));
    assert!(service.list_subscriptions("C1").await.unwrap().is_empty());

    let transactions = service.list_transactions("C1").await.unwrap();
    assert_eq!(transactions.len(), 4);
    let count = |kind: TransactionType| {
        transactions
            .iter()
            .filter(|t| t.transaction_type == kind)
            .count()
    };
    assert_eq!(count(TransactionType::InitialBalance), 1);
    assert_eq!(count(TransactionType::Deposit), 1);
    assert_eq!(count(TransactionType::Subscription), 1);
    assert_eq!(count(TransactionType::Cancellation), 1);
}
