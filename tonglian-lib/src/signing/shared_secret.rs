//! Shared-secret backend: upper-case hex MD5 over the keyed canonical string.

use subtle::ConstantTimeEq;

/// Shared-secret signer. The secret is appended by the canonicalizer.
#[derive(Clone)]
pub struct SharedSecretSigner {
    secret: String,
}

impl SharedSecretSigner {
    pub(crate) fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub(crate) fn secret(&self) -> &str {
        &self.secret
    }

    /// Digest of the canonical string, upper-case hex.
    pub fn sign(&self, canonical: &str) -> String {
        format!("{:X}", md5::compute(canonical.as_bytes()))
    }

    /// Case-insensitive, constant-time comparison against a fresh digest.
    pub fn verify(&self, canonical: &str, signature: &str) -> bool {
        let expected = self.sign(canonical);
        let given = signature.trim().to_ascii_uppercase();
        expected.as_bytes().ct_eq(given.as_bytes()).into()
    }
}
