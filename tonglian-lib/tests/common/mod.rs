//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs8::{EncodePrivateKey, EncodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use serde_json::{json, Value};
use tonglian_lib::{
    FixedClock, GatewayClient, GatewayConfig, HttpTransport, ParameterSet, SignType, Signer,
    TransportResponse,
};

pub const BASE_URL: &str = "https://gw.test/pay/api";
pub const MERCHANT_ID: &str = "M1";
pub const APP_ID: &str = "A1";
pub const SECRET: &str = "k";

/// One request seen by [`MockTransport`].
#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub url: String,
    pub body: Value,
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn params(&self) -> ParameterSet {
        ParameterSet::from_value(self.body.clone()).expect("request body is an object")
    }
}

/// Transport that replays queued responses and records every request.
#[derive(Clone, Default)]
pub struct MockTransport {
    responses: Arc<Mutex<VecDeque<TransportResponse>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, response: TransportResponse) -> &Self {
        self.responses.lock().unwrap().push_back(response);
        self
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn post(
        &self,
        url: &str,
        body: String,
        headers: &[(String, String)],
    ) -> TransportResponse {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            body: serde_json::from_str(&body).unwrap_or(Value::String(body)),
            headers: headers.to_vec(),
        });
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| TransportResponse::failed("no response queued"))
    }
}

pub fn md5_config() -> GatewayConfig {
    GatewayConfig::new(BASE_URL, MERCHANT_ID, SignType::Md5)
        .with_app_id(APP_ID)
        .with_org_id("ORG1")
        .with_merchant_key(SECRET)
        .with_channel_extra("cusid", "C1")
}

/// 2024-03-02 12:00 at +08:00.
pub fn fixed_clock() -> FixedClock {
    FixedClock::parse("2024-03-02T12:00:00+08:00").unwrap()
}

pub fn client(transport: MockTransport) -> GatewayClient<MockTransport, FixedClock> {
    GatewayClient::with_clock(md5_config(), transport, fixed_clock()).unwrap()
}

pub fn md5_signer() -> Signer {
    md5_config().build_signer().unwrap()
}

/// Successful response carrying `data` and a signature over it.
pub fn signed_ok(signer: &Signer, data: Value) -> TransportResponse {
    let params = ParameterSet::from_value(data.clone()).unwrap();
    let sign = signer.sign(&params).unwrap();
    TransportResponse::ok(json!({"code": 0, "msg": "success", "data": data, "sign": sign}).to_string())
}

/// Successful response without a signature.
pub fn unsigned_ok(data: Value) -> TransportResponse {
    TransportResponse::ok(json!({"code": 0, "msg": "success", "data": data}).to_string())
}

/// Signed JSON notification body for `fields`.
pub fn signed_notification(signer: &Signer, fields: Value) -> String {
    let params = ParameterSet::from_value(fields).unwrap();
    signer.seal(params).unwrap().into_value().to_string()
}

/// Base64 DER PKCS#8 private key and SPKI public key.
pub fn rsa_keys() -> (String, String) {
    let mut rng = rand::thread_rng();
    let private_key = RsaPrivateKey::new(&mut rng, 1024).unwrap();
    let public_key = RsaPublicKey::from(&private_key);
    (
        STANDARD.encode(private_key.to_pkcs8_der().unwrap().as_bytes()),
        STANDARD.encode(public_key.to_public_key_der().unwrap().as_bytes()),
    )
}
