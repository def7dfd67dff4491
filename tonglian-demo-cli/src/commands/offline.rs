//! Offline signing commands - sign and verify parameter objects without a gateway

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;
use tonglian_lib::canonical::{canonicalize, CanonicalForm};
use tonglian_lib::{ParameterSet, SignType, Signer};

use super::{load_config, read_params, Output};
use crate::ui;

#[derive(Debug, Serialize)]
struct Signed {
    sign_type: SignType,
    /// Canonical string with any shared secret masked
    canonical: String,
    sign: String,
    params: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct Verified {
    sign_type: SignType,
    canonical: String,
    valid: bool,
}

fn signer(config: &Path) -> Result<Signer> {
    let config = load_config(config)?;
    config
        .build_signer()
        .context("Configuration cannot produce a signer")
}

/// Canonical string safe to print.
fn masked_canonical(signer: &Signer, params: &ParameterSet) -> String {
    let mut params = params.clone();
    params.remove("sign");
    let form = match signer.sign_type() {
        SignType::Md5 => CanonicalForm::Keyed("***"),
        _ => CanonicalForm::Trimmed,
    };
    canonicalize(&params, form)
}

#[tracing::instrument(skip(config, input, output))]
pub fn sign(config: &Path, input: &str, output: Output) -> Result<()> {
    let signer = signer(config)?;
    let params = read_params(input)?;

    let canonical = masked_canonical(&signer, &params);
    let sealed = signer.seal(params).context("Signing failed")?;
    let signed = Signed {
        sign_type: signer.sign_type(),
        canonical,
        sign: sealed.get_str("sign").unwrap_or_default(),
        params: sealed.into_value(),
    };

    output.emit(&signed, |signed: &Signed| {
        ui::header("Signed Parameters");
        ui::key_value("Sign type", signed.sign_type.as_str());
        if output.verbose {
            ui::key_value("Canonical", &signed.canonical);
        }
        ui::key_value("Sign", &signed.sign);
        ui::separator();
        ui::json(&signed.params);
    })
}

#[tracing::instrument(skip(config, input, output))]
pub fn verify(config: &Path, input: &str, output: Output) -> Result<()> {
    let signer = signer(config)?;
    let envelope = read_params(input)?;

    let canonical = masked_canonical(&signer, &envelope);
    let valid = signer.open(envelope, "offline verify").is_ok();
    let verified = Verified {
        sign_type: signer.sign_type(),
        canonical,
        valid,
    };

    output.emit(&verified, |verified: &Verified| {
        if output.verbose {
            ui::key_value("Canonical", &verified.canonical);
        }
        if verified.valid {
            ui::success("Signature is valid");
        } else {
            ui::error("Signature is missing or does not match");
        }
    })?;

    if !valid {
        bail!("Signature verification failed");
    }
    Ok(())
}
