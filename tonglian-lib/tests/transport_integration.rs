//! Integration tests for the reqwest transport against a mock HTTP server.
//!
//! ```bash
//! cargo test -p tonglian-lib --features http-transport --test transport_integration
//! ```

#![cfg(feature = "http-transport")]

mod common;

use common::*;
use serde_json::json;
use tonglian_lib::operations::{QueryBalanceRequest, QueryOrderRequest};
use tonglian_lib::{
    GatewayClient, GatewayConfig, GatewayErrorCode, HttpTransport, ReqwestTransport, SignType,
};
use wiremock::{
    matchers::{body_partial_json, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

fn config_for(server: &MockServer) -> GatewayConfig {
    GatewayConfig::new(format!("{}/pay/api", server.uri()), MERCHANT_ID, SignType::Md5)
        .with_app_id(APP_ID)
        .with_merchant_key(SECRET)
        .with_timeout(5)
}

#[tokio::test]
async fn test_transport_posts_json() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/echo"))
        .and(header("Content-Type", "application/json"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("X-Trace", "t1")
                .set_body_string(r#"{"code":0}"#),
        )
        .mount(&mock_server)
        .await;

    let transport = ReqwestTransport::new(5, true).unwrap();
    let headers = [("Content-Type".to_string(), "application/json".to_string())];
    let response = transport
        .post(&format!("{}/echo", mock_server.uri()), "{}".to_string(), &headers)
        .await;

    assert!(response.is_success());
    assert_eq!(response.status, 200);
    assert_eq!(response.body, r#"{"code":0}"#);
    assert_eq!(response.header("x-trace"), Some("t1"));
}

#[tokio::test]
async fn test_transport_reports_network_errors() {
    // nothing listens on the discard port
    let transport = ReqwestTransport::new(2, true).unwrap();
    let response = transport
        .post("http://127.0.0.1:9/pay/query", "{}".to_string(), &[])
        .await;

    assert!(!response.is_success());
    assert_eq!(response.status, 0);
    assert!(response.transport_error.is_some());
}

#[tokio::test]
async fn test_client_query_order_over_http() {
    let mock_server = MockServer::start().await;
    let signer = config_for(&mock_server).build_signer().unwrap();

    let data = json!({"payOrderId": "P1", "mchOrderNo": "O1", "amount": 100, "state": 2});
    let sign = signer
        .sign(&tonglian_lib::ParameterSet::from_value(data.clone()).unwrap())
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/pay/api/pay/query"))
        .and(body_partial_json(json!({
            "mchNo": MERCHANT_ID,
            "appId": APP_ID,
            "mchOrderNo": "O1",
            "busiType": "1",
            "version": "1.0",
            "signType": "MD5"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "code": 0,
            "msg": "success",
            "data": data,
            "sign": sign
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = GatewayClient::from_config(config_for(&mock_server)).unwrap();
    let order = client
        .query_order(&QueryOrderRequest::by_mch_order_no("O1"))
        .await
        .unwrap();

    assert_eq!(order.pay_order_id.as_deref(), Some("P1"));
    assert_eq!(order.amount, Some(100));
}

#[tokio::test]
async fn test_client_maps_server_errors() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/pay/api/balance/query"))
        .respond_with(ResponseTemplate::new(503).set_body_string("maintenance"))
        .mount(&mock_server)
        .await;

    let client = GatewayClient::from_config(config_for(&mock_server)).unwrap();
    let err = client
        .query_balance(&QueryBalanceRequest::new("allinpay"))
        .await
        .unwrap_err();

    assert_eq!(err.code(), GatewayErrorCode::Transport);
    assert!(err.is_retryable());
    assert!(err.to_string().contains("503"));
}
