//! Balance oracle - on-chain $BOOK balance lookups
//!
//! One ERC-20 `balanceOf` read per query, via JSON-RPC `eth_call`. The
//! oracle never fails a caller: an RPC outage or malformed response reads
//! as zero balance. Callers must tolerate that false negative (an agent
//! can be spuriously under-threshold while the RPC is down).

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error, warn};

use crate::config::ChainConfig;
use crate::policy::{is_valid_address, EligibilityPolicy};

/// ERC-20 balanceOf(address) function selector
const BALANCE_OF_SELECTOR: &str = "0x70a08231";

/// Sentinel returned when the address fails format validation,
/// distinguishable from a legitimate zero balance.
pub const INVALID_ADDRESS_BALANCE: i64 = -1;

/// Source of agent token balances. Seam for substituting the chain
/// oracle in tests.
#[async_trait]
pub trait BalanceSource: Send + Sync {
    /// Whole-token balance for a wallet, `INVALID_ADDRESS_BALANCE` on
    /// format mismatch, zero when nothing can be confirmed.
    async fn get_balance(&self, wallet: &str) -> i64;
}

/// JSON-RPC backed oracle with administrative bypass
pub struct ChainOracle {
    client: reqwest::Client,
    config: ChainConfig,
    policy: EligibilityPolicy,
}

impl ChainOracle {
    pub fn new(config: ChainConfig, policy: EligibilityPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
            policy,
        }
    }

    async fn eth_call_balance(&self, wallet: &str) -> Result<i64, String> {
        // Pad the wallet address to 32 bytes for the calldata
        let padded = format!(
            "{:0>64}",
            wallet.to_lowercase().trim_start_matches("0x")
        );
        let data = format!("{}{}", BALANCE_OF_SELECTOR, padded);

        let body = json!({
            "jsonrpc": "2.0",
            "method": "eth_call",
            "params": [
                { "to": self.config.token_contract, "data": data },
                "latest",
            ],
            "id": 1,
        });

        let res = self
            .client
            .post(&self.config.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| format!("RPC request failed: {}", e))?;

        let json: Value = res
            .json()
            .await
            .map_err(|e| format!("RPC response parse failed: {}", e))?;

        if let Some(err) = json.get("error") {
            return Err(format!("RPC error payload: {}", err));
        }

        let result = json
            .get("result")
            .and_then(|r| r.as_str())
            .unwrap_or("0x0");

        scale_hex_balance(result, self.config.token_decimals)
    }
}

/// Parse a hex balance result and floor-divide by 10^decimals to get a
/// whole-token count. Truncation, not rounding.
///
/// Raw values above u128::MAX (half the 32-byte `eth_call` result range)
/// fail to parse; at 18 decimals that is over 3.4e20 whole tokens, so
/// such a read is treated like any other malformed response and degrades
/// to zero at the call site.
pub fn scale_hex_balance(hex: &str, decimals: u32) -> Result<i64, String> {
    let raw = u128::from_str_radix(hex.trim_start_matches("0x"), 16)
        .map_err(|e| format!("Bad hex balance '{}': {}", hex, e))?;
    let scaled = raw / 10u128.pow(decimals);
    i64::try_from(scaled).map_err(|_| format!("Balance overflow: {}", scaled))
}

#[async_trait]
impl BalanceSource for ChainOracle {
    async fn get_balance(&self, wallet: &str) -> i64 {
        // Admin bypass never touches the external call path
        if self.policy.is_admin_wallet(wallet) {
            debug!(wallet, "Admin bypass balance");
            return self.policy.threshold() * 10;
        }

        if !is_valid_address(wallet) {
            debug!(wallet, "Invalid address format");
            return INVALID_ADDRESS_BALANCE;
        }

        // No contract configured: mock mode, nothing to confirm
        if self.config.token_contract.is_empty() {
            warn!(wallet, "No token contract configured, mock mode");
            return 0;
        }

        match self.eth_call_balance(wallet).await {
            Ok(balance) => {
                debug!(wallet, balance, "On-chain balance");
                balance
            }
            Err(e) => {
                // Degrade to zero rather than blocking the caller
                error!(wallet, error = %e, "Balance check failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;

    fn oracle(contract: &str) -> ChainOracle {
        let config = ChainConfig {
            token_contract: contract.to_string(),
            ..ChainConfig::default()
        };
        let policy = EligibilityPolicy::new(10_000, vec!["0xadmin".to_string()]);
        ChainOracle::new(config, policy)
    }

    #[test]
    fn test_scale_hex_balance() {
        // 12000 tokens at 18 decimals
        let raw = 12_000u128 * 10u128.pow(18);
        let hex = format!("0x{:x}", raw);
        assert_eq!(scale_hex_balance(&hex, 18).unwrap(), 12_000);
    }

    #[test]
    fn test_scale_truncates() {
        // 1.9 tokens floors to 1
        let raw = 19u128 * 10u128.pow(17);
        let hex = format!("0x{:x}", raw);
        assert_eq!(scale_hex_balance(&hex, 18).unwrap(), 1);
    }

    #[test]
    fn test_scale_zero_and_garbage() {
        assert_eq!(scale_hex_balance("0x0", 18).unwrap(), 0);
        assert!(scale_hex_balance("0xnothex", 18).is_err());
        // Full 32-byte result exceeds the u128 parse bound
        let oversized = format!("0x{}", "f".repeat(64));
        assert!(scale_hex_balance(&oversized, 18).is_err());
    }

    #[tokio::test]
    async fn test_admin_bypass_skips_lookup() {
        // Bogus RPC URL: if the call path were hit, this would degrade
        // to zero instead of the synthetic balance.
        let o = oracle("0x00000000000000000000000000000000000000aa");
        assert_eq!(o.get_balance("0xADMIN").await, 100_000);
    }

    #[tokio::test]
    async fn test_invalid_address_sentinel() {
        let o = oracle("");
        assert_eq!(o.get_balance("not-an-address").await, INVALID_ADDRESS_BALANCE);
        assert_eq!(o.get_balance("0x1234").await, INVALID_ADDRESS_BALANCE);
    }

    #[tokio::test]
    async fn test_mock_mode_reads_zero() {
        let o = oracle("");
        assert_eq!(
            o.get_balance("0x1234567890abcdef1234567890abcdef12345678")
                .await,
            0
        );
    }
}
