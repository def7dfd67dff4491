//! Asymmetric backend: RSA PKCS#1 v1.5 with SHA-256, base64 on the wire.
//!
//! Keys are usually distributed as bare base64 DER. Bare material is wrapped
//! in PEM armor (64-column lines) before parsing; material that already
//! carries armor is used as-is.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey};
use rsa::pkcs1v15::{Signature, SigningKey, VerifyingKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::signature::{SignatureEncoding, Signer as _, Verifier as _};
use rsa::{RsaPrivateKey, RsaPublicKey};
use sha2::Sha256;

use crate::{GatewayError, Result};

const PRIVATE_KEY_LABEL: &str = "PRIVATE KEY";
const PUBLIC_KEY_LABEL: &str = "PUBLIC KEY";

/// RSA signer holding the merchant private key and the gateway public key.
pub struct RsaSigner {
    signing_key: SigningKey<Sha256>,
    verifying_key: VerifyingKey<Sha256>,
}

impl std::fmt::Debug for RsaSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RsaSigner").finish_non_exhaustive()
    }
}

impl RsaSigner {
    /// Parse both keys. Failures are configuration errors.
    pub(crate) fn from_material(private_key: &str, public_key: &str) -> Result<Self> {
        let private_key = parse_private_key(private_key)?;
        let public_key = parse_public_key(public_key)?;
        Ok(Self {
            signing_key: SigningKey::<Sha256>::new(private_key),
            verifying_key: VerifyingKey::<Sha256>::new(public_key),
        })
    }

    /// Sign the canonical string, returning the base64 signature.
    pub fn sign(&self, canonical: &str) -> Result<String> {
        let signature = self
            .signing_key
            .try_sign(canonical.as_bytes())
            .map_err(|e| GatewayError::signature(format!("RSA signing: {e}")))?;
        Ok(STANDARD.encode(signature.to_bytes()))
    }

    /// Verify a base64 signature. Undecodable signatures simply fail.
    pub fn verify(&self, canonical: &str, signature: &str) -> bool {
        // form decoding turns an unescaped '+' into a space
        let normalized: String = signature
            .trim()
            .chars()
            .map(|c| if c == ' ' { '+' } else { c })
            .collect();

        let Ok(bytes) = STANDARD.decode(normalized.as_bytes()) else {
            return false;
        };
        let Ok(signature) = Signature::try_from(bytes.as_slice()) else {
            return false;
        };
        self.verifying_key
            .verify(canonical.as_bytes(), &signature)
            .is_ok()
    }
}

/// Wrap bare base64 key material in PEM armor.
pub fn wrap_pem(material: &str, label: &str) -> String {
    let trimmed = material.trim();
    if trimmed.starts_with("-----BEGIN") {
        return trimmed.to_string();
    }

    let mut pem = format!("-----BEGIN {label}-----\n");
    let body = trimmed.chars().filter(|c| !c.is_whitespace());
    for (i, c) in body.enumerate() {
        if i > 0 && i % 64 == 0 {
            pem.push('\n');
        }
        pem.push(c);
    }
    pem.push_str(&format!("\n-----END {label}-----\n"));
    pem
}

fn parse_private_key(material: &str) -> Result<RsaPrivateKey> {
    let pem = wrap_pem(material, PRIVATE_KEY_LABEL);
    let parsed = if pem.contains("BEGIN RSA PRIVATE KEY") {
        RsaPrivateKey::from_pkcs1_pem(&pem).map_err(|e| e.to_string())
    } else {
        RsaPrivateKey::from_pkcs8_pem(&pem).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| {
        GatewayError::configuration("private_key", format!("invalid RSA private key: {reason}"))
    })
}

fn parse_public_key(material: &str) -> Result<RsaPublicKey> {
    let pem = wrap_pem(material, PUBLIC_KEY_LABEL);
    let parsed = if pem.contains("BEGIN RSA PUBLIC KEY") {
        RsaPublicKey::from_pkcs1_pem(&pem).map_err(|e| e.to_string())
    } else {
        RsaPublicKey::from_public_key_pem(&pem).map_err(|e| e.to_string())
    };
    parsed.map_err(|reason| {
        GatewayError::configuration("public_key", format!("invalid RSA public key: {reason}"))
    })
}
