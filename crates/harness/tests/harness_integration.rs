//! End-to-end scenarios for the benchmark harness.

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use common::{Pattern, Recovery};
use gateway::{
    FaultCategory, FaultSetting, FaultToggle, HttpGatewayClient, InMemoryGateway,
    PlaceOrderResponse, Scripted,
};
use harness::{
    BatchRunner, DEFAULT_BATCH_SIZE, Harness, HarnessStatus, OrderProfile, ProtocolInvoker,
    RequestBuilder, RunMode, aggregate,
};
use serde_json::json;

fn ok_response() -> PlaceOrderResponse {
    PlaceOrderResponse {
        success: true,
        order_latency: Some(10),
        payment_latency: Some(20),
        shipping_latency: Some(30),
        abort_latency: Some(0),
        ..PlaceOrderResponse::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_compare_reports_each_pattern_unmodified() {
    let gateway = InMemoryGateway::new();
    gateway.script(
        Pattern::Saga,
        Scripted::respond_after(ok_response(), Duration::from_millis(120)),
    );
    gateway.script(
        Pattern::TwoPhaseCommit,
        Scripted::respond_after(ok_response(), Duration::from_millis(300)),
    );
    let mut h = Harness::new(gateway, RequestBuilder::default());

    let report = h.run_compare().await;

    assert_eq!(report.saga.total_latency, 120);
    assert_eq!(report.tpc.total_latency, 300);
    assert!(report.saga.success && report.tpc.success);
    assert_eq!(report.saga.order_latency, Some(10));
    assert_eq!(h.snapshot().comparison.as_ref(), Some(&report));
}

#[tokio::test]
async fn test_network_error_mid_batch_keeps_batch_length() {
    let gateway = InMemoryGateway::new();
    for _ in 0..7 {
        gateway.script(Pattern::Saga, Scripted::respond(ok_response()));
    }
    gateway.script(Pattern::Saga, Scripted::unreachable("connection reset by peer"));
    let invoker = ProtocolInvoker::new(gateway.clone());
    let builder = RequestBuilder::default();

    let batch = BatchRunner::new(&invoker, &builder)
        .run(Pattern::Saga, DEFAULT_BATCH_SIZE)
        .await
        .unwrap();

    assert_eq!(batch.len(), 20);
    let failed = &batch.entries()[7];
    assert_eq!(failed.run_index, 8);
    assert!(!failed.result.success);
    assert_eq!(failed.result.total_latency, 0);
    assert!(failed.result.message.is_some());
    assert_eq!(gateway.call_count(Pattern::Saga), 20);
    assert_eq!(batch.successes(), 19);
}

#[tokio::test(start_paused = true)]
async fn test_ten_saga_runs_with_three_failures() {
    let gateway = InMemoryGateway::new();
    let plan: [Option<u64>; 10] = [
        Some(100),
        None,
        Some(110),
        Some(90),
        None,
        Some(120),
        Some(95),
        Some(105),
        None,
        Some(115),
    ];
    for step in plan {
        let reaction = match step {
            Some(ms) => Scripted::respond_after(ok_response(), Duration::from_millis(ms)),
            None => Scripted::unreachable("connection refused"),
        };
        gateway.script(Pattern::Saga, reaction);
    }
    let invoker = ProtocolInvoker::new(gateway);
    let builder = RequestBuilder::default();

    let batch = BatchRunner::new(&invoker, &builder)
        .run(Pattern::Saga, 10)
        .await
        .unwrap();
    let metrics = aggregate(&batch);

    assert_eq!(metrics.success_rate, 70);
    assert_eq!(metrics.total_batch_time, 735);
    assert_eq!(metrics.total_latency.mean, 73.5);
    assert_eq!(metrics.failures, 3);
}

#[tokio::test]
async fn test_batch_against_simulated_faults() {
    let gateway = InMemoryGateway::new();
    let mut h = Harness::new(gateway.clone(), RequestBuilder::default());
    let toggle = FaultToggle::new(FaultCategory::Carrier, FaultSetting::Availability).unwrap();
    h.set_fault(toggle, false).await.unwrap();

    let paired = h.run_batch(4).await.unwrap();

    let saga = aggregate(&paired.saga);
    let tpc = aggregate(&paired.tpc);
    assert_eq!(saga.success_rate, 0);
    assert_eq!(saga.avg_compensations, 2.0);
    assert_eq!(tpc.rollbacks, 4);
    assert!(
        paired
            .tpc
            .results()
            .all(|r| r.recovery == Recovery::GlobalRollback(true))
    );
    assert_eq!(h.snapshot().status, HarnessStatus::Completed(RunMode::Batch));
}

#[tokio::test]
async fn test_identical_profiles_send_identical_payloads() {
    let gateway = InMemoryGateway::new();
    let builder = || RequestBuilder::new(OrderProfile::default()).unwrap();
    let mut first = Harness::new(gateway.clone(), builder());
    let mut second = Harness::new(gateway.clone(), builder());

    first.run_single(Pattern::Saga).await;
    second.run_single(Pattern::Saga).await;

    let requests = gateway.requests();
    assert_eq!(
        serde_json::to_vec(&requests[0].1).unwrap(),
        serde_json::to_vec(&requests[1].1).unwrap()
    );
}

#[derive(Clone, Default)]
struct FlakyGateway {
    calls: Arc<AtomicUsize>,
}

async fn flaky_place_order(State(gateway): State<FlakyGateway>) -> Response {
    let call = gateway.calls.fetch_add(1, Ordering::SeqCst) + 1;
    match call % 3 {
        0 => (StatusCode::BAD_GATEWAY, "upstream unavailable").into_response(),
        1 => (
            StatusCode::CREATED,
            axum::Json(json!({
                "success": true,
                "orderId": call,
                "orderLatency": 5,
                "paymentLatency": 6,
                "shippingLatency": 7,
                "prepareLatency": 11,
                "commitLatency": 3,
                "totalLatency": 100000
            })),
        )
            .into_response(),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            axum::Json(json!({
                "success": false,
                "message": "Payment failed",
                "compensations": 1,
                "abortLatency": 4
            })),
        )
            .into_response(),
    }
}

async fn spawn_flaky_gateway() -> (SocketAddr, FlakyGateway) {
    let state = FlakyGateway::default();
    let app = Router::new()
        .route("/api/gateway/place-order-saga", post(flaky_place_order))
        .route("/api/gateway/place-order-2pc", post(flaky_place_order))
        .with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, state)
}

#[tokio::test]
async fn test_http_batch_normalizes_mixed_responses() {
    let (addr, state) = spawn_flaky_gateway().await;
    let client = HttpGatewayClient::new(format!("http://{addr}")).unwrap();
    let mut h = Harness::new(client, RequestBuilder::default());

    let paired = h.run_batch(3).await.unwrap();

    assert_eq!(state.calls.load(Ordering::SeqCst), 6);
    let saga = paired.saga.entries();
    assert!(saga[0].result.success);
    assert!(saga[0].result.total_latency < 100000);
    assert!(saga[0].result.prepare_latency.is_none());
    assert!(!saga[1].result.success);
    assert_eq!(saga[1].result.recovery, Recovery::Compensations(1));
    assert!(!saga[2].result.success);
    assert_eq!(saga[2].result.total_latency, 0);
    assert!(
        saga[2]
            .result
            .message
            .as_deref()
            .is_some_and(|m| m.starts_with("Error: HTTP 502"))
    );

    let tpc = paired.tpc.entries();
    assert_eq!(tpc[0].result.prepare_latency, Some(11));
    assert_eq!(tpc[1].result.recovery, Recovery::GlobalRollback(true));

    let metrics = aggregate(&paired.saga);
    assert_eq!(metrics.success_rate, 33);
    assert_eq!(metrics.runs, 3);
}
