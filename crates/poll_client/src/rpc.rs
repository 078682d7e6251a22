//! Poll ledger backed by an Ethereum JSON-RPC endpoint.
//!
//! Reads go through `eth_call`; writes go through `eth_sendTransaction`, so
//! signing stays with whatever wallet or node sits behind the endpoint.

use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use shared::{
    domain::{Address, CurrentPoll, PollStatus, TxHash},
    error::LedgerError,
    protocol::{LedgerCall, LedgerRead},
};
use tracing::{debug, info, warn};
use url::Url;

use crate::{abi, PollLedger, WalletSession};

/// EIP-1193 code for a request the user declined.
const USER_REJECTED_CODE: i64 = 4001;
const EXECUTION_REVERTED_CODE: i64 = 3;

#[derive(Debug, Clone)]
pub struct RpcLedgerConfig {
    pub rpc_url: Url,
    pub contract: Address,
    /// Checked against `eth_chainId` when set.
    pub chain_id: Option<u64>,
    /// Sender for transactions; falls back to the first `eth_accounts` entry.
    pub account: Option<Address>,
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
    #[serde(default)]
    data: Option<Value>,
}

impl RpcErrorObject {
    fn revert_data(&self) -> Option<Vec<u8>> {
        let raw = match self.data.as_ref()? {
            Value::String(raw) => raw.as_str(),
            Value::Object(map) => map.get("data")?.as_str()?,
            _ => return None,
        };
        decode_hex(raw).ok()
    }

    fn into_ledger_error(self) -> LedgerError {
        if self.code == USER_REJECTED_CODE {
            return LedgerError::Rejected(self.message);
        }
        if let Some(reason) = self
            .revert_data()
            .and_then(|data| abi::decode_revert_reason(&data))
        {
            return LedgerError::Reverted { reason };
        }
        if self.code == EXECUTION_REVERTED_CODE {
            return LedgerError::Reverted {
                reason: self.message,
            };
        }
        LedgerError::Rpc {
            code: self.code,
            message: self.message,
        }
    }
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, LedgerError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|err| LedgerError::Decode(format!("invalid hex '{raw}': {err}")))
}

fn encode_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

fn parse_quantity(raw: &str) -> Result<u64, LedgerError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    u64::from_str_radix(digits, 16)
        .map_err(|err| LedgerError::Decode(format!("invalid quantity '{raw}': {err}")))
}

pub struct JsonRpcLedger {
    http: Client,
    rpc_url: Url,
    contract: Address,
    sender: Option<Address>,
    next_id: AtomicU64,
}

impl JsonRpcLedger {
    /// Verifies the chain and resolves the sending account.
    pub async fn connect(config: RpcLedgerConfig) -> Result<Self> {
        let mut ledger = Self {
            http: Client::new(),
            rpc_url: config.rpc_url,
            contract: config.contract,
            sender: None,
            next_id: AtomicU64::new(1),
        };

        if let Some(expected) = config.chain_id {
            let actual = ledger
                .chain_id()
                .await
                .with_context(|| format!("failed to query chain id from {}", ledger.rpc_url))?;
            if actual != expected {
                bail!("rpc endpoint is on chain {actual}, expected chain {expected}");
            }
        }

        ledger.sender = match config.account {
            Some(account) => Some(account),
            None => match ledger.accounts().await {
                Ok(accounts) => accounts.into_iter().next(),
                Err(err) => {
                    warn!("rpc: eth_accounts failed, continuing read-only: {err}");
                    None
                }
            },
        };

        match ledger.sender {
            Some(sender) => info!(
                "rpc: connected url={} contract={} sender={sender}",
                ledger.rpc_url, ledger.contract
            ),
            None => info!(
                "rpc: connected read-only url={} contract={}",
                ledger.rpc_url, ledger.contract
            ),
        }

        Ok(ledger)
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub async fn chain_id(&self) -> Result<u64, LedgerError> {
        let raw: String = self.request("eth_chainId", json!([])).await?;
        parse_quantity(&raw)
    }

    pub async fn accounts(&self) -> Result<Vec<Address>, LedgerError> {
        let raw: Vec<String> = self.request("eth_accounts", json!([])).await?;
        raw.iter().map(|account| account.parse()).collect()
    }

    async fn request<T: DeserializeOwned>(
        &self,
        method: &str,
        params: Value,
    ) -> Result<T, LedgerError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!("rpc: -> {method} id={id}");
        let response = self
            .http
            .post(self.rpc_url.clone())
            .json(&RpcRequest {
                jsonrpc: "2.0",
                id,
                method,
                params,
            })
            .send()
            .await
            .map_err(|err| LedgerError::Transport(err.to_string()))?;
        let status = response.status();
        let raw = response
            .bytes()
            .await
            .map_err(|err| LedgerError::Transport(err.to_string()))?;

        // Nodes may attach a JSON-RPC error to a non-2xx reply; only an
        // unparseable body falls back to the HTTP status.
        let body: RpcResponse<T> = match serde_json::from_slice(&raw) {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(LedgerError::Transport(format!(
                    "{method}: http status {status}"
                )))
            }
            Err(err) => return Err(LedgerError::Decode(format!("{method}: {err}"))),
        };

        if let Some(error) = body.error {
            debug!("rpc: <- {method} id={id} error code={}", error.code);
            return Err(error.into_ledger_error());
        }
        body.result
            .ok_or_else(|| LedgerError::Decode(format!("{method}: response has no result")))
    }

    async fn call(&self, read: LedgerRead) -> Result<Vec<u8>, LedgerError> {
        let data = encode_hex(&abi::encode_read(&read));
        let raw: String = self
            .request(
                "eth_call",
                json!([{ "to": self.contract, "data": data }, "latest"]),
            )
            .await?;
        decode_hex(&raw)
    }
}

#[async_trait]
impl PollLedger for JsonRpcLedger {
    async fn poll_status(&self) -> Result<PollStatus> {
        Ok(abi::decode_status(&self.call(LedgerRead::PollStatus).await?)?)
    }

    async fn remaining_time(&self) -> Result<u64> {
        Ok(abi::decode_u64(&self.call(LedgerRead::RemainingTime).await?)?)
    }

    async fn movies(&self) -> Result<Vec<String>> {
        Ok(abi::decode_string_array(
            &self.call(LedgerRead::Movies).await?,
        )?)
    }

    async fn votes(&self, movie: &str) -> Result<u64> {
        let data = self
            .call(LedgerRead::Votes {
                movie: movie.to_string(),
            })
            .await?;
        Ok(abi::decode_u64(&data)?)
    }

    async fn winner(&self) -> Result<String> {
        Ok(abi::decode_string(&self.call(LedgerRead::Winner).await?)?)
    }

    async fn has_voted(&self, voter: Address) -> Result<bool> {
        Ok(abi::decode_bool(
            &self.call(LedgerRead::HasVoted { voter }).await?,
        )?)
    }

    async fn owner(&self) -> Result<Address> {
        Ok(abi::decode_address(&self.call(LedgerRead::Owner).await?)?)
    }

    async fn current_poll(&self) -> Result<CurrentPoll> {
        Ok(abi::decode_current_poll(
            &self.call(LedgerRead::CurrentPoll).await?,
        )?)
    }
}

#[async_trait]
impl WalletSession for JsonRpcLedger {
    fn is_connected(&self) -> bool {
        self.sender.is_some()
    }

    fn address(&self) -> Option<Address> {
        self.sender
    }

    async fn submit(&self, call: LedgerCall) -> Result<TxHash> {
        let Some(sender) = self.sender else {
            bail!(LedgerError::unavailable(format!(
                "no account available to submit {}",
                call.function_name()
            )));
        };
        let data = encode_hex(&abi::encode_call(&call));
        let hash: String = self
            .request(
                "eth_sendTransaction",
                json!([{ "from": sender, "to": self.contract, "data": data }]),
            )
            .await?;
        Ok(TxHash(hash))
    }
}

#[cfg(test)]
#[path = "tests/rpc_tests.rs"]
mod tests;
