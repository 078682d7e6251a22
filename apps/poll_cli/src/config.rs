use std::{fs, io::ErrorKind, path::Path};

use anyhow::{Context, Result};
use poll_client::RpcLedgerConfig;
use serde::Deserialize;
use shared::domain::Address;
use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub rpc_url: String,
    pub contract_address: String,
    pub chain_id: u64,
    pub account: Option<String>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            rpc_url: "https://sepolia.base.org".into(),
            contract_address: "0xdAaf05Ab90F233c51Bc9F8caEA0886DD7d60040e".into(),
            chain_id: 84532,
            account: None,
            log_filter: "info".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    rpc_url: Option<String>,
    contract_address: Option<String>,
    chain_id: Option<u64>,
    account: Option<String>,
    log_filter: Option<String>,
}

impl Settings {
    pub fn ledger_config(&self) -> Result<RpcLedgerConfig> {
        let rpc_url = Url::parse(self.rpc_url.trim())
            .with_context(|| format!("invalid rpc url '{}'", self.rpc_url))?;
        let contract = self
            .contract_address
            .parse::<Address>()
            .context("invalid contract address")?;
        let account = self
            .account
            .as_deref()
            .filter(|raw| !raw.trim().is_empty())
            .map(str::parse::<Address>)
            .transpose()
            .context("invalid account address")?;

        Ok(RpcLedgerConfig {
            rpc_url,
            contract,
            chain_id: Some(self.chain_id),
            account,
        })
    }
}

/// Defaults, then `path` if it exists, then environment overrides.
pub fn load_settings(path: &Path) -> Result<Settings> {
    let mut settings = Settings::default();

    if let Some(file_cfg) = read_file_settings(path)? {
        apply_file_settings(&mut settings, file_cfg);
    }

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

/// A missing file is no file; any other read failure is an error.
fn read_file_settings(path: &Path) -> Result<Option<FileSettings>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(None),
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read config file '{}'", path.display()))
        }
    };
    let file_cfg = toml::from_str(&raw)
        .with_context(|| format!("failed to parse config file '{}'", path.display()))?;
    Ok(Some(file_cfg))
}

fn apply_file_settings(settings: &mut Settings, file_cfg: FileSettings) {
    if let Some(v) = file_cfg.rpc_url {
        settings.rpc_url = v;
    }
    if let Some(v) = file_cfg.contract_address {
        settings.contract_address = v;
    }
    if let Some(v) = file_cfg.chain_id {
        settings.chain_id = v;
    }
    if file_cfg.account.is_some() {
        settings.account = file_cfg.account;
    }
    if let Some(v) = file_cfg.log_filter {
        settings.log_filter = v;
    }
}

fn apply_env_overrides(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("POLL_RPC_URL") {
        settings.rpc_url = v;
    }
    if let Some(v) = var("APP__RPC_URL") {
        settings.rpc_url = v;
    }

    if let Some(v) = var("POLL_CONTRACT_ADDRESS") {
        settings.contract_address = v;
    }
    if let Some(v) = var("APP__CONTRACT_ADDRESS") {
        settings.contract_address = v;
    }

    if let Some(v) = var("POLL_CHAIN_ID").or_else(|| var("APP__CHAIN_ID")) {
        if let Ok(parsed) = v.trim().parse::<u64>() {
            settings.chain_id = parsed;
        }
    }

    if let Some(v) = var("POLL_ACCOUNT") {
        settings.account = Some(v);
    }
    if let Some(v) = var("APP__ACCOUNT") {
        settings.account = Some(v);
    }

    if let Some(v) = var("RUST_LOG") {
        settings.log_filter = v;
    }
    if let Some(v) = var("APP__LOG_FILTER") {
        settings.log_filter = v;
    }
}
