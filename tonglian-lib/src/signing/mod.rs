//! Signature generation and verification.
//!
//! The algorithm is a closed set chosen once, when the client is built.
//! [`Signer::from_context`] rejects missing key material and the declared but
//! unimplemented SM2 scheme up front, so no call can fail halfway through a
//! transaction because of the algorithm choice.
//!
//! ```
//! use tonglian_lib::signing::{SignType, SignatureContext, Signer};
//! use tonglian_lib::ParameterSet;
//!
//! let signer = Signer::from_context(&SignatureContext::shared_secret("k")).unwrap();
//! let params = ParameterSet::new().with("mchNo", "M1").with("amount", "100");
//!
//! assert_eq!(signer.canonicalize(&params), "amount=100&mchNo=M1&key=k");
//! let sign = signer.sign(&params).unwrap();
//! assert!(signer.verify(&params, &sign).unwrap());
//! assert_eq!(signer.sign_type(), SignType::Md5);
//! ```

mod asymmetric;
mod shared_secret;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub use asymmetric::{wrap_pem, RsaSigner};
pub use shared_secret::SharedSecretSigner;

use crate::canonical::{canonicalize, CanonicalForm};
use crate::params::{ParameterSet, SIGN_FIELD};
use crate::{GatewayError, Result};

/// Signature algorithms the gateway declares.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SignType {
    /// Shared-secret MD5 digest.
    #[default]
    #[serde(rename = "MD5", alias = "md5")]
    Md5,
    /// RSA with SHA-256.
    #[serde(rename = "RSA", alias = "rsa")]
    Rsa,
    /// National-standard SM2. Declared by the gateway, not implemented.
    #[serde(rename = "SM2", alias = "sm2")]
    Sm2,
}

impl SignType {
    /// Wire identifier sent in `signType`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Md5 => "MD5",
            Self::Rsa => "RSA",
            Self::Sm2 => "SM2",
        }
    }

    /// Returns true for algorithms keyed by a private/public key pair.
    pub fn is_asymmetric(&self) -> bool {
        matches!(self, Self::Rsa | Self::Sm2)
    }
}

impl fmt::Display for SignType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SignType {
    type Err = GatewayError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "MD5" => Ok(Self::Md5),
            "RSA" => Ok(Self::Rsa),
            "SM2" => Ok(Self::Sm2),
            other => Err(GatewayError::configuration(
                "sign_type",
                format!("unsupported signature type: {other}"),
            )),
        }
    }
}

/// Algorithm plus the key material it needs.
#[derive(Clone, Default)]
pub struct SignatureContext {
    /// Selected algorithm.
    pub sign_type: SignType,
    /// Shared secret for [`SignType::Md5`].
    pub secret: Option<String>,
    /// Merchant private key (base64 DER or PEM) for asymmetric signing.
    pub private_key: Option<String>,
    /// Gateway public key (base64 DER or PEM) for asymmetric verification.
    pub public_key: Option<String>,
    /// Certificate identifier, reserved for SM2.
    pub cert_id: Option<String>,
}

impl SignatureContext {
    /// Context for shared-secret signing.
    pub fn shared_secret(secret: impl Into<String>) -> Self {
        Self {
            sign_type: SignType::Md5,
            secret: Some(secret.into()),
            ..Self::default()
        }
    }

    /// Context for RSA signing.
    pub fn rsa(private_key: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            sign_type: SignType::Rsa,
            private_key: Some(private_key.into()),
            public_key: Some(public_key.into()),
            ..Self::default()
        }
    }
}

impl fmt::Debug for SignatureContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignatureContext")
            .field("sign_type", &self.sign_type)
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field("public_key", &self.public_key.is_some())
            .field("cert_id", &self.cert_id)
            .finish()
    }
}

/// A ready-to-use signing backend.
pub enum Signer {
    /// Shared-secret digest.
    SharedSecret(SharedSecretSigner),
    /// RSA signature.
    Rsa(RsaSigner),
}

impl Signer {
    /// Build the backend for `context`, validating its key material.
    pub fn from_context(context: &SignatureContext) -> Result<Self> {
        match context.sign_type {
            SignType::Md5 => {
                let secret = required(context.secret.as_deref(), "merchant_key")?;
                Ok(Self::SharedSecret(SharedSecretSigner::new(secret)))
            }
            SignType::Rsa => {
                let private_key = required(context.private_key.as_deref(), "private_key")?;
                let public_key = required(context.public_key.as_deref(), "public_key")?;
                Ok(Self::Rsa(RsaSigner::from_material(private_key, public_key)?))
            }
            SignType::Sm2 => Err(GatewayError::Unimplemented("SM2 signatures")),
        }
    }

    /// Algorithm of this backend.
    pub fn sign_type(&self) -> SignType {
        match self {
            Self::SharedSecret(_) => SignType::Md5,
            Self::Rsa(_) => SignType::Rsa,
        }
    }

    /// Canonical string for `params` under this backend's form.
    pub fn canonicalize(&self, params: &ParameterSet) -> String {
        match self {
            Self::SharedSecret(signer) => canonicalize(params, CanonicalForm::Keyed(signer.secret())),
            Self::Rsa(_) => canonicalize(params, CanonicalForm::Trimmed),
        }
    }

    /// Sign an already canonicalized string.
    pub fn sign_canonical(&self, canonical: &str) -> Result<String> {
        match self {
            Self::SharedSecret(signer) => Ok(signer.sign(canonical)),
            Self::Rsa(signer) => signer.sign(canonical),
        }
    }

    /// Verify a signature over an already canonicalized string.
    pub fn verify_canonical(&self, canonical: &str, signature: &str) -> bool {
        match self {
            Self::SharedSecret(signer) => signer.verify(canonical, signature),
            Self::Rsa(signer) => signer.verify(canonical, signature),
        }
    }

    /// Sign a parameter set. Any `sign` entry in `params` is ignored.
    pub fn sign(&self, params: &ParameterSet) -> Result<String> {
        let canonical = self.canonicalize(&without_sign(params));
        self.sign_canonical(&canonical)
    }

    /// Verify `signature` over a parameter set. Any `sign` entry in `params` is ignored.
    pub fn verify(&self, params: &ParameterSet, signature: &str) -> Result<bool> {
        let canonical = self.canonicalize(&without_sign(params));
        Ok(self.verify_canonical(&canonical, signature))
    }

    /// Add a `sign` field computed over the rest of the set.
    pub fn seal(&self, mut params: ParameterSet) -> Result<ParameterSet> {
        params.remove(SIGN_FIELD);
        let sign = self.sign(&params)?;
        params.insert(SIGN_FIELD, sign);
        Ok(params)
    }

    /// Verify a set carrying its own `sign` field and strip it.
    ///
    /// A missing or non-matching signature is a signature error.
    pub fn open(&self, envelope: ParameterSet, context: &str) -> Result<ParameterSet> {
        let (params, sign) = envelope.split_signature();
        let Some(sign) = sign else {
            return Err(GatewayError::signature(format!("{context}: missing sign")));
        };
        if self.verify(&params, &sign)? {
            Ok(params)
        } else {
            Err(GatewayError::signature(context))
        }
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer")
            .field("sign_type", &self.sign_type())
            .finish_non_exhaustive()
    }
}

fn required<'a>(value: Option<&'a str>, field: &str) -> Result<&'a str> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(GatewayError::configuration(
            field,
            "required by the selected signature type",
        )),
    }
}

fn without_sign(params: &ParameterSet) -> ParameterSet {
    if params.contains_key(SIGN_FIELD) {
        let mut params = params.clone();
        params.remove(SIGN_FIELD);
        params
    } else {
        params.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GatewayErrorCode;

    fn md5_signer() -> Signer {
        Signer::from_context(&SignatureContext::shared_secret("k")).unwrap()
    }

    #[test]
    fn test_sign_type_parse() {
        assert_eq!("MD5".parse::<SignType>().unwrap(), SignType::Md5);
        assert_eq!("rsa".parse::<SignType>().unwrap(), SignType::Rsa);
        assert_eq!("SM2".parse::<SignType>().unwrap(), SignType::Sm2);
        let err = "HMAC".parse::<SignType>().unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Configuration);
    }

    #[test]
    fn test_sign_type_serde() {
        let json = serde_json::to_string(&SignType::Rsa).unwrap();
        assert_eq!(json, "\"RSA\"");
        let parsed: SignType = serde_json::from_str("\"md5\"").unwrap();
        assert_eq!(parsed, SignType::Md5);
    }

    #[test]
    fn test_sm2_is_unimplemented() {
        let context = SignatureContext {
            sign_type: SignType::Sm2,
            private_key: Some("x".into()),
            public_key: Some("y".into()),
            cert_id: Some("cert".into()),
            ..SignatureContext::default()
        };
        let err = Signer::from_context(&context).unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Unimplemented);
    }

    #[test]
    fn test_missing_key_material() {
        let err = Signer::from_context(&SignatureContext::default()).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { ref field, .. } if field == "merchant_key"));

        let context = SignatureContext {
            sign_type: SignType::Rsa,
            private_key: Some("abc".into()),
            ..SignatureContext::default()
        };
        let err = Signer::from_context(&context).unwrap_err();
        assert!(matches!(err, GatewayError::Configuration { ref field, .. } if field == "public_key"));
    }

    #[test]
    fn test_reference_example() {
        let signer = md5_signer();
        let params = ParameterSet::new().with("mchNo", "M1").with("amount", "100");
        assert_eq!(signer.canonicalize(&params), "amount=100&mchNo=M1&key=k");

        let expected = format!("{:X}", md5::compute(b"amount=100&mchNo=M1&key=k"));
        assert_eq!(signer.sign(&params).unwrap(), expected);
    }

    #[test]
    fn test_sign_ignores_existing_sign_field() {
        let signer = md5_signer();
        let params = ParameterSet::new().with("a", "1");
        let with_sign = params.clone().with("sign", "STALE");
        assert_eq!(signer.sign(&params).unwrap(), signer.sign(&with_sign).unwrap());
    }

    #[test]
    fn test_seal_and_open() {
        let signer = md5_signer();
        let sealed = signer
            .seal(ParameterSet::new().with("a", "1").with("b", 2))
            .unwrap();
        assert!(sealed.contains_key("sign"));

        let opened = signer.open(sealed.clone(), "test").unwrap();
        assert!(!opened.contains_key("sign"));

        let mut tampered = sealed;
        tampered.insert("b", 3);
        let err = signer.open(tampered, "test").unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Signature);

        let err = signer
            .open(ParameterSet::new().with("a", "1"), "test")
            .unwrap_err();
        assert_eq!(err.code(), GatewayErrorCode::Signature);
    }

    #[test]
    fn test_debug_redacts_secret() {
        let context = SignatureContext::shared_secret("super-secret");
        assert!(!format!("{context:?}").contains("super-secret"));
        assert_eq!(format!("{:?}", md5_signer()), "Signer { sign_type: Md5, .. }");
    }
}
