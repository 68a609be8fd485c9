//! End-to-end paper lifecycle through the contract service.

use copnet_paper_contract::prelude::*;
use serde_json::Value;

// =============================================================================
// TEST HELPERS
// =============================================================================

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn org1() -> ClientIdentity {
    ClientIdentity::new("adminOrg1", "Org1MSP")
}

fn org2() -> ClientIdentity {
    ClientIdentity::new("adminOrg2", "Org2MSP")
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|s| (*s).to_string()).collect()
}

fn create_args(issuer: &str, number: &str) -> Vec<String> {
    args(&[
        issuer,
        number,
        "2020-05-01T10:00:00Z",
        "NID-1",
        "VH-1",
        "Jane Roe",
        "NAS-1",
        "[]",
        "dochash",
    ])
}

async fn submit(
    service: &PaperContractService<InMemoryLedger>,
    who: &ClientIdentity,
    function: &str,
    values: &[&str],
) -> Result<Value, ContractError> {
    let result = service.submit_transaction(who, function, &args(values)).await?;
    Ok(serde_json::from_slice(&result.payload).expect("payload is JSON"))
}

async fn evaluate(
    service: &PaperContractService<InMemoryLedger>,
    function: &str,
    values: &[&str],
) -> Result<Value, ContractError> {
    let payload = service
        .evaluate_transaction(&org1(), function, &args(values))
        .await?;
    Ok(serde_json::from_slice(&payload).expect("payload is JSON"))
}

async fn stored(
    service: &PaperContractService<InMemoryLedger>,
    issuer: &str,
    number: &str,
) -> VdxPaper {
    let key = CompositeKey::new(copnet_paper_contract::PAPER_NAMESPACE, &[issuer, number]).unwrap();
    let bytes = service.ledger().get_committed(key.as_str()).expect("paper stored");
    VdxPaper::from_bytes(&bytes).unwrap()
}

// =============================================================================
// SCENARIO
// =============================================================================

#[tokio::test]
async fn test_full_lifecycle() {
    init_tracing();
    let service = create_test_service();

    let created = service
        .submit_transaction(&org1(), "create", &create_args("Org1", "0001"))
        .await
        .unwrap();
    let created: Value = serde_json::from_slice(&created.payload).unwrap();
    assert_eq!(created["currentState"], 1);
    assert_eq!(created["operator"], "Org1");
    assert_eq!(created["mspid"], "Org1MSP");

    let issued = submit(
        &service,
        &org1(),
        "issue",
        &["Org1", "0001", "2020-05-02", "Org1", "Org1"],
    )
    .await
    .unwrap();
    assert_eq!(issued["currentState"], 2);
    assert_eq!(issued["issueDateTime"], "2020-05-02");

    let before = stored(&service, "Org1", "0001").await;
    let err = submit(&service, &org2(), "check", &["Org1", "0001", "Org2", "Org2"])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnauthorizedTransition);
    assert_eq!(stored(&service, "Org1", "0001").await, before);

    let checked = submit(
        &service,
        &org1(),
        "check",
        &["Org1", "0001", "Org1", "Org2", "2020-05-03", "looks fine"],
    )
    .await
    .unwrap();
    assert_eq!(checked["currentState"], 3);
    assert_eq!(checked["operator"], "Org2");

    let treated = submit(
        &service,
        &org2(),
        "treat",
        &["Org1", "0001", "Org2", "Org2", "2020-05-04", "hash", "1500"],
    )
    .await
    .unwrap();
    assert_eq!(treated["currentState"], 4);
    assert_eq!(treated["vat"], 1500.0);
    assert_eq!(treated["opMspid"], "Org2MSP");

    let err = submit(&service, &org2(), "pay", &["Org1", "0001", "Org2", "Org2"])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UnauthorizedTransition);

    let paid = submit(
        &service,
        &org1(),
        "pay",
        &["Org1", "0001", "Org2", "Org2", "2020-05-05", "receipt", "REF-1"],
    )
    .await
    .unwrap();
    assert_eq!(paid["currentState"], 5);

    let received = submit(&service, &org2(), "receive", &["Org1", "0001", "Org2", "Org2"])
        .await
        .unwrap();
    assert_eq!(received["currentState"], 6);

    let delivered = submit(
        &service,
        &org2(),
        "deliver",
        &["Org1", "0001", "Org2", "Org1", "2020-05-07", "FILE-9", "imma-hash"],
    )
    .await
    .unwrap();
    assert_eq!(delivered["currentState"], 7);
    assert_eq!(delivered["fileNumber"], "FILE-9");
    assert_eq!(delivered["deliverDateTime"], "2020-05-07");
    assert_eq!(delivered["docImma"], "imma-hash");
    assert_eq!(delivered["operator"], "Org1");

    // terminal
    let final_state = stored(&service, "Org1", "0001").await;
    let err = submit(
        &service,
        &org1(),
        "deliver",
        &["Org1", "0001", "Org1", "Org1", "2020-05-08", "FILE-10", "x"],
    )
    .await
    .unwrap_err();
    assert_eq!(err.code(), ErrorCode::AlreadyDelivered);

    let err = submit(&service, &org1(), "receive", &["Org1", "0001", "Org1", "Org1"])
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    assert!(err.to_string().ends_with("Current state = DELIVERED"));
    assert_eq!(stored(&service, "Org1", "0001").await, final_state);

    let history = evaluate(&service, "queryHistory", &["Org1", "0001"]).await.unwrap();
    let states: Vec<&str> = history
        .as_array()
        .unwrap()
        .iter()
        .map(|h| h["Value"]["currentState"].as_str().unwrap())
        .collect();
    assert_eq!(
        states,
        vec!["DELIVERED", "RECEIVED", "PAID", "TREATED", "CHECKED", "ISSUED", "CREATED"]
    );
}

#[tokio::test]
async fn test_skipping_a_step_is_rejected() {
    let service = create_test_service();
    submit(
        &service,
        &org1(),
        "create",
        &["PC", "0001", "t", "n", "v", "f", "a", "l"],
    )
    .await
    .unwrap();

    let err = submit(
        &service,
        &org1(),
        "treat",
        &["PC", "0001", "PC", "PC", "t", "h", "10"],
    )
    .await
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Paper PC0001 is not treated. Current state = CREATED"
    );
    assert!(err.is_rejection());
}

// =============================================================================
// QUERIES
// =============================================================================

#[tokio::test]
async fn test_named_and_partial_queries() {
    let service = create_test_service();
    for (issuer, number) in [("PC", "0001"), ("PC", "0002"), ("PCX", "0001")] {
        service
            .submit_transaction(&org1(), "create", &create_args(issuer, number))
            .await
            .unwrap();
    }
    submit(&service, &org1(), "issue", &["PC", "0002", "t", "PC", "RQ"])
        .await
        .unwrap();
    submit(&service, &org1(), "check", &["PC", "0002", "RQ", "RQ"])
        .await
        .unwrap();
    submit(&service, &org1(), "treat", &["PC", "0002", "RQ", "PC", "t", "h", "2500.75"])
        .await
        .unwrap();

    let by_issuer = evaluate(&service, "queryPartial", &["PC"]).await.unwrap();
    let keys: Vec<&str> = by_issuer
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, vec!["PC:0001", "PC:0002"]);

    let treated = evaluate(&service, "queryNamed", &["treated"]).await.unwrap();
    assert_eq!(treated.as_array().unwrap().len(), 1);
    assert_eq!(treated[0]["Record"]["paperNumber"], "0002");

    let valuable = evaluate(&service, "queryNamed", &["value"]).await.unwrap();
    assert_eq!(valuable.as_array().unwrap().len(), 1);

    let delivered = evaluate(&service, "queryNamed", &["delivered"]).await.unwrap();
    assert!(delivered.as_array().unwrap().is_empty());

    let err = evaluate(&service, "queryNamed", &["bogus"]).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::InvalidQueryName);

    let held_by_pc = evaluate(&service, "queryOperator", &["PC"]).await.unwrap();
    assert_eq!(held_by_pc.as_array().unwrap().len(), 2);
    let held_by_pcx = evaluate(&service, "queryOperator", &["PCX"]).await.unwrap();
    assert_eq!(held_by_pcx[0]["Key"], "PCX:0001");
}

#[tokio::test]
async fn test_history_of_unknown_paper_is_empty() {
    let service = create_test_service();
    let history = evaluate(&service, "queryHistory", &["PC", "nope"]).await.unwrap();
    assert_eq!(history, serde_json::json!([]));
}

/// Run the workflow on `PC:<number>` up to and including `last`, with PC as
/// operator throughout.
async fn drive_to(service: &PaperContractService<InMemoryLedger>, number: &str, last: Transition) {
    service
        .submit_transaction(&org1(), "create", &create_args("PC", number))
        .await
        .unwrap();
    for transition in Transition::ALL {
        let values: Vec<&str> = match transition {
            Transition::Issue => vec!["PC", number, "t", "PC", "PC"],
            Transition::Treat => vec!["PC", number, "PC", "PC", "t", "h", "10"],
            Transition::Deliver => vec!["PC", number, "PC", "PC", "t", "F-1", "imma"],
            _ => vec!["PC", number, "PC", "PC"],
        };
        submit(service, &org1(), transition.name(), &values)
            .await
            .unwrap();
        if transition == last {
            break;
        }
    }
}

fn paper_numbers(records: &Value) -> Vec<&str> {
    records
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["Record"]["paperNumber"].as_str().unwrap())
        .collect()
}

#[tokio::test]
async fn test_named_queries_select_exact_state() {
    let service = create_test_service();
    drive_to(&service, "0001", Transition::Deliver).await;
    drive_to(&service, "0002", Transition::Receive).await;
    drive_to(&service, "0003", Transition::Treat).await;

    let delivered = evaluate(&service, "queryNamed", &["delivered"]).await.unwrap();
    assert_eq!(paper_numbers(&delivered), vec!["0001"]);
    assert_eq!(delivered[0]["Record"]["currentState"], 7);

    let received = evaluate(&service, "queryNamed", &["received"]).await.unwrap();
    assert_eq!(paper_numbers(&received), vec!["0002"]);

    let treated = evaluate(&service, "queryNamed", &["treated"]).await.unwrap();
    assert_eq!(paper_numbers(&treated), vec!["0003"]);

    let paid = evaluate(&service, "queryNamed", &["paid"]).await.unwrap();
    assert!(paid.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_operator_scan_keeps_papers_with_same_display_key() {
    let service = create_test_service();
    for (issuer, number) in [("A:B", "C"), ("A", "B:C")] {
        service
            .submit_transaction(&org1(), "create", &create_args(issuer, number))
            .await
            .unwrap();
        submit(&service, &org1(), "issue", &[issuer, number, "t", issuer, "OP"])
            .await
            .unwrap();
    }

    let adhoc = evaluate(&service, "queryAdhoc", &[r#"{"selector":{"operator":"OP"}}"#])
        .await
        .unwrap();
    assert_eq!(adhoc.as_array().unwrap().len(), 2);

    let held = evaluate(&service, "queryOperator", &["OP"]).await.unwrap();
    let held = held.as_array().unwrap();
    assert_eq!(held.len(), 2);
    assert!(held.iter().all(|r| r["Key"] == "A:B:C"));
    let issuers: Vec<&str> = held
        .iter()
        .map(|r| r["Record"]["issuer"].as_str().unwrap())
        .collect();
    assert!(issuers.contains(&"A") && issuers.contains(&"A:B"));
}

// =============================================================================
// CONCURRENCY
// =============================================================================

#[tokio::test]
async fn test_conflicting_transactions_one_wins() {
    let ledger = InMemoryLedger::new();
    let contract = VdxPaperContract::default();
    let setup = ledger.begin(TxId::generate(), org1());
    {
        let ctx = TransactionContext::new(&setup, org1(), setup.tx_id().clone(), setup.timestamp());
        invoke(&contract, &ctx, "create", &create_args("PC", "0001")).await.unwrap();
    }
    ledger.commit(setup).unwrap();

    let first = ledger.begin(TxId::generate(), org1());
    let second = ledger.begin(TxId::generate(), org1());
    for tx in [&first, &second] {
        let ctx = TransactionContext::new(tx, org1(), tx.tx_id().clone(), tx.timestamp());
        invoke(&contract, &ctx, "issue", &args(&["PC", "0001", "t", "PC", "PC"]))
            .await
            .unwrap();
    }

    ledger.commit(first).unwrap();
    let err = ledger.commit(second).unwrap_err();
    assert!(matches!(err, StateError::MvccReadConflict { .. }));
    assert_eq!(ledger.height(), 2);
}
