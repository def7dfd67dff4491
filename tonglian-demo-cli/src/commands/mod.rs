//! Command implementations

pub mod balance;
pub mod bill;
pub mod offline;
pub mod order;
pub mod refund;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;
use tonglian_lib::{GatewayClient, GatewayConfig, ParameterSet, ReqwestTransport};

use crate::ui;

/// Global output switches.
#[derive(Clone, Copy, Debug, Default)]
pub struct Output {
    pub json: bool,
    pub verbose: bool,
}

impl Output {
    /// Print a result as JSON when requested, otherwise run the human renderer.
    pub fn emit<T: Serialize>(&self, value: &T, human: impl FnOnce(&T)) -> Result<()> {
        if self.json {
            ui::json(&serde_json::to_value(value)?);
        } else {
            human(value);
        }
        Ok(())
    }
}

/// Load the gateway configuration from `path`, or from the environment when
/// the file does not exist.
pub fn load_config(path: &Path) -> Result<GatewayConfig> {
    if path.exists() {
        tracing::debug!("Loading configuration from {}", path.display());
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        GatewayConfig::from_json(&raw)
            .with_context(|| format!("Invalid configuration in {}", path.display()))
    } else {
        tracing::debug!("{} not found, reading TONGLIAN_* environment", path.display());
        GatewayConfig::from_env().context(format!(
            "No configuration file at {} and environment is incomplete",
            path.display()
        ))
    }
}

/// Build a live client for the configuration at `path`.
pub fn connect(path: &Path) -> Result<GatewayClient<ReqwestTransport>> {
    let config = load_config(path)?;
    tracing::info!(
        merchant = %config.merchant_id,
        sign_type = %config.sign_type,
        "Connecting to {}",
        config.api_base_url
    );
    Ok(GatewayClient::from_config(config)?)
}

/// Parse `key=value` pairs into a channel-extra map.
pub fn parse_extra(pairs: &[String]) -> Result<Map<String, Value>> {
    let mut extra = Map::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Channel extra '{}' must be KEY=VALUE", pair);
        };
        extra.insert(key.trim().to_string(), Value::String(value.to_string()));
    }
    Ok(extra)
}

/// Read a JSON parameter object given inline or as `@path`.
pub fn read_params(input: &str) -> Result<ParameterSet> {
    let raw = match input.strip_prefix('@') {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path))?
        }
        None => input.to_string(),
    };
    let value: Value = serde_json::from_str(&raw).context("Parameters must be valid JSON")?;
    if !value.is_object() {
        bail!("Parameters must be a JSON object");
    }
    Ok(ParameterSet::from_value(value)?)
}
