//! Eligibility policy - pure decisions over balances and addresses
//!
//! No I/O here. The chain oracle produces balances; this module decides
//! what they mean for agent status.

use crate::config::PolicyConfig;

/// Lifecycle status of a registered agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentStatus {
    Pending,
    Active,
}

impl AgentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentStatus::Pending => "pending",
            AgentStatus::Active => "active",
        }
    }
}

/// Validate the EVM address format: `0x` + exactly 40 hex characters.
///
/// Admin bypass wallets are exempted elsewhere; this is the lexical check
/// applied before any balance lookup is attempted.
pub fn is_valid_address(address: &str) -> bool {
    let Some(hex) = address.strip_prefix("0x") else {
        return false;
    };
    hex.len() == 40 && hex.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Balance-gated eligibility decisions
#[derive(Debug, Clone)]
pub struct EligibilityPolicy {
    threshold: i64,
    admin_wallets: Vec<String>,
}

impl EligibilityPolicy {
    pub fn new(threshold: i64, admin_wallets: Vec<String>) -> Self {
        // Stored lowercased so membership checks stay case-insensitive
        let admin_wallets = admin_wallets
            .into_iter()
            .map(|w| w.to_lowercase())
            .collect();
        Self {
            threshold,
            admin_wallets,
        }
    }

    pub fn from_config(policy: &PolicyConfig, admin_wallets: &[String]) -> Self {
        Self::new(policy.balance_threshold, admin_wallets.to_vec())
    }

    pub fn threshold(&self) -> i64 {
        self.threshold
    }

    /// True iff the wallet is on the administrative bypass list.
    pub fn is_admin_wallet(&self, wallet: &str) -> bool {
        self.admin_wallets
            .iter()
            .any(|w| w == &wallet.to_lowercase())
    }

    /// True iff the balance clears the activation threshold.
    pub fn meets_threshold(&self, balance: i64) -> bool {
        balance >= self.threshold
    }

    /// Status an agent with this effective balance should carry.
    pub fn status_for(&self, balance: i64) -> AgentStatus {
        if self.meets_threshold(balance) {
            AgentStatus::Active
        } else {
            AgentStatus::Pending
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> EligibilityPolicy {
        EligibilityPolicy::new(10_000, vec!["0xAdmin".to_string()])
    }

    #[test]
    fn test_valid_addresses() {
        assert!(is_valid_address(
            "0x1234567890abcdef1234567890abcdef12345678"
        ));
        assert!(is_valid_address(
            "0x1234567890ABCDEF1234567890ABCDEF12345678"
        ));
    }

    #[test]
    fn test_invalid_addresses() {
        // Missing prefix
        assert!(!is_valid_address(
            "1234567890abcdef1234567890abcdef12345678"
        ));
        // Too short / too long
        assert!(!is_valid_address("0x1234567890abcdef"));
        assert!(!is_valid_address(
            "0x1234567890abcdef1234567890abcdef123456789"
        ));
        // Correct length, non-hex
        assert!(!is_valid_address(
            "0xzzzz567890abcdef1234567890abcdef12345678"
        ));
        assert!(!is_valid_address(""));
        assert!(!is_valid_address("0x"));
    }

    #[test]
    fn test_threshold_boundary() {
        let p = policy();
        assert!(!p.meets_threshold(9_999));
        assert!(p.meets_threshold(10_000));
        assert!(p.meets_threshold(10_001));
        assert_eq!(p.status_for(9_999), AgentStatus::Pending);
        assert_eq!(p.status_for(10_000), AgentStatus::Active);
    }

    #[test]
    fn test_admin_wallet_case_insensitive() {
        let p = policy();
        assert!(p.is_admin_wallet("0xadmin"));
        assert!(p.is_admin_wallet("0xADMIN"));
        assert!(p.is_admin_wallet("0xAdmin"));
        assert!(!p.is_admin_wallet("0xother"));
    }
}
