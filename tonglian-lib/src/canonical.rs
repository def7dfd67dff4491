//! Canonical serialization of parameter sets.
//!
//! The canonical string is `k1=v1&k2=v2&...` over the non-empty entries in
//! byte order of their keys. What happens at the tail depends on the
//! algorithm, and is part of the wire contract:
//!
//! - shared-secret signing keeps the trailing `&` and appends `key=<secret>`;
//! - asymmetric signing strips the trailing `&` and appends nothing.

use crate::params::ParameterSet;

/// How the canonical string is terminated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CanonicalForm<'a> {
    /// Append `key=<secret>` after the final `&`.
    Keyed(&'a str),
    /// Strip the final `&`.
    Trimmed,
}

/// Serialize `params` into the string that gets signed.
///
/// The `sign` field is not treated specially; callers strip it first.
pub fn canonicalize(params: &ParameterSet, form: CanonicalForm<'_>) -> String {
    let mut out = String::new();
    for (key, value) in params.signable() {
        out.push_str(key);
        out.push('=');
        out.push_str(&value);
        out.push('&');
    }

    match form {
        CanonicalForm::Keyed(secret) => {
            out.push_str("key=");
            out.push_str(secret);
        }
        CanonicalForm::Trimmed => {
            if out.ends_with('&') {
                out.pop();
            }
        }
    }
    out
}
