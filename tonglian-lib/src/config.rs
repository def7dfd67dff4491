//! Client configuration.
//!
//! Loaded once and then treated as read-only for the lifetime of the client.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::signing::{SignType, SignatureContext, Signer};
use crate::{GatewayError, Result};

/// Gateway connection and merchant settings.
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Base URL that operation paths are appended to.
    pub api_base_url: String,

    /// Merchant number, sent as `mchNo`.
    pub merchant_id: String,

    /// Application id, sent as `appId`.
    #[serde(default)]
    pub app_id: String,

    /// Service-provider (organisation) id, sent as `orgId`.
    #[serde(default, alias = "orgId")]
    pub org_id: String,

    /// Shared secret for MD5 signing.
    #[serde(default)]
    pub merchant_key: Option<String>,

    /// Signature algorithm. Required in configuration documents.
    pub sign_type: SignType,

    /// Merchant private key for asymmetric signing.
    #[serde(default)]
    pub private_key: Option<String>,

    /// Gateway public key for asymmetric verification.
    #[serde(default)]
    pub public_key: Option<String>,

    /// Certificate id, reserved for SM2.
    #[serde(default)]
    pub cert_id: Option<String>,

    /// Client-level channel extras merged into every call.
    #[serde(default, alias = "channelExtra")]
    pub channel_extra: Map<String, Value>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout", alias = "timeout")]
    pub timeout_secs: u64,

    /// Verify the gateway's TLS certificate.
    #[serde(default = "default_verify_ssl")]
    pub verify_ssl: bool,
}

fn default_timeout() -> u64 {
    30
}

fn default_verify_ssl() -> bool {
    true
}

impl GatewayConfig {
    /// Create a configuration with the required settings.
    pub fn new(
        api_base_url: impl Into<String>,
        merchant_id: impl Into<String>,
        sign_type: SignType,
    ) -> Self {
        Self {
            api_base_url: api_base_url.into(),
            merchant_id: merchant_id.into(),
            app_id: String::new(),
            org_id: String::new(),
            merchant_key: None,
            sign_type,
            private_key: None,
            public_key: None,
            cert_id: None,
            channel_extra: Map::new(),
            timeout_secs: default_timeout(),
            verify_ssl: default_verify_ssl(),
        }
    }

    /// Set the application id.
    pub fn with_app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = app_id.into();
        self
    }

    /// Set the organisation id.
    pub fn with_org_id(mut self, org_id: impl Into<String>) -> Self {
        self.org_id = org_id.into();
        self
    }

    /// Set the MD5 shared secret.
    pub fn with_merchant_key(mut self, key: impl Into<String>) -> Self {
        self.merchant_key = Some(key.into());
        self
    }

    /// Set the RSA key pair.
    pub fn with_keys(mut self, private_key: impl Into<String>, public_key: impl Into<String>) -> Self {
        self.private_key = Some(private_key.into());
        self.public_key = Some(public_key.into());
        self
    }

    /// Set the certificate id.
    pub fn with_cert_id(mut self, cert_id: impl Into<String>) -> Self {
        self.cert_id = Some(cert_id.into());
        self
    }

    /// Add a client-level channel extra.
    pub fn with_channel_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.channel_extra.insert(key.into(), value.into());
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Enable or disable TLS verification.
    pub fn with_verify_ssl(mut self, verify: bool) -> Self {
        self.verify_ssl = verify;
        self
    }

    /// Algorithm and key material for the signer.
    pub fn signature_context(&self) -> SignatureContext {
        SignatureContext {
            sign_type: self.sign_type,
            secret: self.merchant_key.clone(),
            private_key: self.private_key.clone(),
            public_key: self.public_key.clone(),
            cert_id: self.cert_id.clone(),
        }
    }

    /// Validate the settings and build the signer they describe.
    pub fn build_signer(&self) -> Result<Signer> {
        if self.api_base_url.trim().is_empty() {
            return Err(GatewayError::configuration("api_base_url", "must not be empty"));
        }
        url::Url::parse(&self.api_base_url)
            .map_err(|e| GatewayError::configuration("api_base_url", e.to_string()))?;
        if self.merchant_id.trim().is_empty() {
            return Err(GatewayError::configuration("merchant_id", "must not be empty"));
        }
        if self.timeout_secs == 0 {
            return Err(GatewayError::configuration("timeout_secs", "must be greater than 0"));
        }
        Signer::from_context(&self.signature_context())
    }

    /// Check that the configuration can build a client.
    pub fn validate(&self) -> Result<()> {
        self.build_signer().map(|_| ())
    }

    /// Full URL for an operation path.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// Parse a JSON configuration document.
    ///
    /// `api_base_url`, `merchant_id` and `sign_type` must be present; a
    /// missing or malformed field is a configuration error.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| GatewayError::configuration("config", format!("invalid configuration document: {e}")))
    }

    /// Load configuration from `TONGLIAN_*` environment variables.
    ///
    /// ```bash
    /// export TONGLIAN_API_BASE_URL=https://tp.allinpay.com/pay/api
    /// export TONGLIAN_MERCHANT_ID=E2000000073
    /// export TONGLIAN_APP_ID=68000000036
    /// export TONGLIAN_MERCHANT_KEY=secret
    /// export TONGLIAN_SIGN_TYPE=MD5
    /// ```
    ///
    /// `TONGLIAN_CHANNEL_EXTRA` may hold a JSON object of channel defaults.
    /// `TONGLIAN_SIGN_TYPE` defaults to `MD5` when unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let required = |name: &str| {
            lookup(name)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| GatewayError::configuration(name, "environment variable not set"))
        };

        let sign_type = match lookup("TONGLIAN_SIGN_TYPE") {
            Some(value) => value.parse()?,
            None => SignType::default(),
        };

        let mut config = Self::new(
            required("TONGLIAN_API_BASE_URL")?,
            required("TONGLIAN_MERCHANT_ID")?,
            sign_type,
        );

        if let Some(app_id) = lookup("TONGLIAN_APP_ID") {
            config.app_id = app_id;
        }
        if let Some(org_id) = lookup("TONGLIAN_ORG_ID") {
            config.org_id = org_id;
        }
        config.merchant_key = lookup("TONGLIAN_MERCHANT_KEY");
        config.private_key = lookup("TONGLIAN_PRIVATE_KEY");
        config.public_key = lookup("TONGLIAN_PUBLIC_KEY");
        config.cert_id = lookup("TONGLIAN_CERT_ID");

        if let Some(timeout) = lookup("TONGLIAN_TIMEOUT_SECS") {
            config.timeout_secs = timeout.parse().map_err(|_| {
                GatewayError::configuration("TONGLIAN_TIMEOUT_SECS", "must be a positive integer")
            })?;
        }
        if let Some(verify) = lookup("TONGLIAN_VERIFY_SSL") {
            config.verify_ssl = !matches!(verify.to_ascii_lowercase().as_str(), "0" | "false" | "no");
        }
        if let Some(extra) = lookup("TONGLIAN_CHANNEL_EXTRA") {
            config.channel_extra = serde_json::from_str(&extra).map_err(|e| {
                GatewayError::configuration("TONGLIAN_CHANNEL_EXTRA", e.to_string())
            })?;
        }

        Ok(config)
    }
}

impl fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "<redacted>");
        f.debug_struct("GatewayConfig")
            .field("api_base_url", &self.api_base_url)
            .field("merchant_id", &self.merchant_id)
            .field("app_id", &self.app_id)
            .field("org_id", &self.org_id)
            .field("merchant_key", &redacted(&self.merchant_key))
            .field("sign_type", &self.sign_type)
            .field("private_key", &redacted(&self.private_key))
            .field("public_key", &self.public_key.is_some())
            .field("cert_id", &self.cert_id)
            .field("channel_extra", &self.channel_extra)
            .field("timeout_secs", &self.timeout_secs)
            .field("verify_ssl", &self.verify_ssl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayErrorCode;
    use std::collections::HashMap;

    fn md5_config() -> GatewayConfig {
        GatewayConfig::new("https://gw.example/pay/api", "M1", SignType::Md5)
            .with_app_id("A1")
            .with_merchant_key("k")
    }

    #[test]
    fn test_defaults_from_json() {
        let config = GatewayConfig::from_json(
            r#"{
                "api_base_url": "https://gw.example/pay/api",
                "merchant_id": "M1",
                "app_id": "A1",
                "merchant_key": "k",
                "sign_type": "MD5",
                "channelExtra": {"cusid": "C1"}
            }"#,
        )
        .unwrap();
        assert_eq!(config.timeout_secs, 30);
        assert!(config.verify_ssl);
        assert_eq!(config.sign_type, SignType::Md5);
        assert_eq!(config.channel_extra.get("cusid"), Some(&Value::from("C1")));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_sign_type_required_in_json() {
        let err = GatewayConfig::from_json(
            r#"{
                "api_base_url": "https://gw.example/pay/api",
                "merchant_id": "M1",
                "merchant_key": "k"
            }"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Configuration);
        assert!(err.to_string().contains("sign_type"));

        let err = GatewayConfig::from_json(
            r#"{"api_base_url": "https://gw.example", "merchant_id": "M1", "sign_type": "DES"}"#,
        )
        .unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Configuration);
    }

    #[test]
    fn test_endpoint_joins_paths() {
        let config = md5_config();
        assert_eq!(
            config.endpoint("/pay/query"),
            "https://gw.example/pay/api/pay/query"
        );
        let config = GatewayConfig {
            api_base_url: "https://gw.example/".into(),
            ..config
        };
        assert_eq!(config.endpoint("pay/query"), "https://gw.example/pay/query");
    }

    #[test]
    fn test_validation_failures() {
        let err = GatewayConfig::new("not a url", "M1", SignType::Md5)
            .with_merchant_key("k")
            .validate()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { ref field, .. } if field == "api_base_url"));

        let err = GatewayConfig::new("https://gw.example", "", SignType::Md5)
            .with_merchant_key("k")
            .validate()
            .unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { ref field, .. } if field == "merchant_id"));

        let err = GatewayConfig::new("https://gw.example", "M1", SignType::Md5)
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Configuration);

        let err = GatewayConfig::new("https://gw.example", "M1", SignType::Rsa)
            .with_merchant_key("k")
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Configuration);

        let err = GatewayConfig::new("https://gw.example", "M1", SignType::Sm2)
            .with_keys("a", "b")
            .with_cert_id("c")
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Unimplemented);
    }

    #[test]
    fn test_from_lookup() {
        let vars: HashMap<&str, &str> = [
            ("TONGLIAN_API_BASE_URL", "https://gw.example/pay/api"),
            ("TONGLIAN_MERCHANT_ID", "M1"),
            ("TONGLIAN_APP_ID", "A1"),
            ("TONGLIAN_MERCHANT_KEY", "k"),
            ("TONGLIAN_SIGN_TYPE", "md5"),
            ("TONGLIAN_TIMEOUT_SECS", "5"),
            ("TONGLIAN_CHANNEL_EXTRA", r#"{"cusid":"C1"}"#),
        ]
        .into_iter()
        .collect();

        let config = GatewayConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string())).unwrap();
        assert_eq!(config.merchant_id, "M1");
        assert_eq!(config.app_id, "A1");
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.channel_extra.len(), 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let err = GatewayConfig::from_lookup(|_| None).unwrap_err();
        assert!(
            matches!(err, GatewayError::Configuration { ref field, .. } if field == "TONGLIAN_API_BASE_URL")
        );
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = md5_config().with_merchant_key("super-secret");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
