//! JSON-RPC connection behavior against a mock HTTP node.

mod common;

use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::method;
use wiremock::{Match, Mock, MockServer, Request, ResponseTemplate};

use common::{counter_interface, fast_settings, payer};
use tx_harness::config::RpcConfig;
use tx_harness::ledger::types::{Hash, LedgerError};
use tx_harness::ledger::{CommitmentLevel, Connection, RpcConnection, Signature};
use tx_harness::program::CallDescriptor;
use tx_harness::{SubmissionResult, TransactionHarness};

/// Matches a JSON-RPC request by its `method` field.
struct RpcMethod(&'static str);

impl Match for RpcMethod {
    fn matches(&self, request: &Request) -> bool {
        serde_json::from_slice::<Value>(&request.body)
            .ok()
            .and_then(|body| body.get("method").and_then(Value::as_str).map(|m| m == self.0))
            .unwrap_or(false)
    }
}

fn rpc_result(result: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
}

fn rpc_error(error: Value) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({"jsonrpc": "2.0", "id": 1, "error": error}))
}

fn connection(primary: &MockServer, failovers: &[&MockServer]) -> RpcConnection {
    RpcConnection::new(&RpcConfig {
        url: primary.uri(),
        failover_urls: failovers.iter().map(|s| s.uri()).collect(),
        request_timeout_secs: 2,
        skip_preflight: false,
    })
    .unwrap()
}

fn blockhash() -> Hash {
    Hash::new([3; 32])
}

async fn mount_blockhash(server: &MockServer) {
    Mock::given(method("POST"))
        .and(RpcMethod("getLatestBlockhash"))
        .respond_with(rpc_result(json!({
            "context": {"slot": 41},
            "value": {"blockhash": blockhash().to_string(), "lastValidBlockHeight": 300}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_send_transaction_returns_signature() {
    let server = MockServer::start().await;
    let signature = Signature::new([5; 64]);
    Mock::given(method("POST"))
        .and(RpcMethod("sendTransaction"))
        .respond_with(rpc_result(json!(signature.to_string())))
        .expect(1)
        .mount(&server)
        .await;

    let result = connection(&server, &[]).send_transaction("AQID").await.unwrap();
    assert_eq!(result, signature);
}

#[tokio::test]
async fn test_simulation_failure_carries_logs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(RpcMethod("sendTransaction"))
        .respond_with(rpc_error(json!({
            "code": -32002,
            "message": "Transaction simulation failed: Error processing Instruction 0: custom program error: 0x0",
            "data": {
                "err": {"InstructionError": [0, {"Custom": 0}]},
                "logs": ["Program log: Instruction: Initialize", "Program failed: custom program error: 0x0"]
            }
        })))
        .mount(&server)
        .await;

    let err = connection(&server, &[]).send_transaction("AQID").await.unwrap_err();
    match err {
        LedgerError::Simulation { err, logs, .. } => {
            assert!(err.unwrap().get("InstructionError").is_some());
            assert_eq!(logs.len(), 2);
        }
        other => panic!("expected Simulation, got {:?}", other),
    }
}

#[tokio::test]
async fn test_signature_status_parsing() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(RpcMethod("getSignatureStatuses"))
        .respond_with(rpc_result(json!({
            "context": {"slot": 90},
            "value": [{"slot": 88, "confirmations": null, "err": null, "confirmationStatus": "finalized"}]
        })))
        .mount(&server)
        .await;

    let status = connection(&server, &[])
        .get_signature_status(&Signature::new([1; 64]))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(status.slot, 88);
    assert_eq!(status.confirmation_status, Some(CommitmentLevel::Finalized));
    assert!(status.err.is_none());
    assert!(status.reached(CommitmentLevel::Confirmed));
}

#[tokio::test]
async fn test_unknown_signature_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(RpcMethod("getSignatureStatuses"))
        .respond_with(rpc_result(json!({"context": {"slot": 90}, "value": [null]})))
        .mount(&server)
        .await;

    let status = connection(&server, &[])
        .get_signature_status(&Signature::new([1; 64]))
        .await
        .unwrap();
    assert!(status.is_none());
}

#[tokio::test]
async fn test_transaction_logs() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(RpcMethod("getTransaction"))
        .respond_with(rpc_result(json!({
            "slot": 88,
            "meta": {"err": null, "logMessages": ["Program log: Instruction: Increment"]}
        })))
        .mount(&server)
        .await;

    let logs = connection(&server, &[])
        .get_transaction_logs(&Signature::new([1; 64]))
        .await
        .unwrap();
    assert_eq!(logs, vec!["Program log: Instruction: Increment".to_string()]);
}

#[tokio::test]
async fn test_reads_fail_over() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&primary)
        .await;
    mount_blockhash(&secondary).await;

    let hash = connection(&primary, &[&secondary])
        .get_latest_blockhash()
        .await
        .unwrap();
    assert_eq!(hash, blockhash());
}

#[tokio::test]
async fn test_all_endpoints_down() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    for server in [&primary, &secondary] {
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(server)
            .await;
    }

    let err = connection(&primary, &[&secondary])
        .get_latest_blockhash()
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotAvailable(_)));
}

#[tokio::test]
async fn test_send_never_fails_over() {
    let primary = MockServer::start().await;
    let secondary = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&primary)
        .await;
    Mock::given(method("POST"))
        .and(RpcMethod("sendTransaction"))
        .respond_with(rpc_result(json!(Signature::new([5; 64]).to_string())))
        .expect(0)
        .mount(&secondary)
        .await;

    let err = connection(&primary, &[&secondary])
        .send_transaction("AQID")
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Transport(_)));
}

#[tokio::test]
async fn test_request_timeout() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(rpc_result(json!(null)).set_delay(Duration::from_secs(5)))
        .mount(&server)
        .await;

    let err = connection(&server, &[])
        .get_signature_status(&Signature::new([1; 64]))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Timeout(_)));
}

#[tokio::test]
async fn test_harness_over_rpc() {
    let server = MockServer::start().await;
    mount_blockhash(&server).await;
    Mock::given(method("POST"))
        .and(RpcMethod("sendTransaction"))
        .respond_with(rpc_result(json!(Signature::new([5; 64]).to_string())))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(RpcMethod("getSignatureStatuses"))
        .respond_with(rpc_result(json!({
            "context": {"slot": 43},
            "value": [{"slot": 42, "err": null, "confirmationStatus": "confirmed"}]
        })))
        .mount(&server)
        .await;

    let harness = TransactionHarness::new(
        Arc::new(connection(&server, &[])),
        Arc::new(counter_interface()),
        fast_settings(),
    );
    let result = harness
        .submit(
            CallDescriptor::new("initialize").signer(payer()),
            CommitmentLevel::Confirmed,
        )
        .await;

    match result {
        SubmissionResult::Confirmed { slot, .. } => assert_eq!(slot, 42),
        other => panic!("expected Confirmed, got {:?}", other),
    }
}
