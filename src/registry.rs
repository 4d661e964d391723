//! Agent registry - registration, verification, removal
//!
//! Registration and verification both funnel balance decisions through
//! the eligibility policy; the demotion transition lives here so the
//! vote path and the verify path share one implementation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::activity::ActivityRecorder;
use crate::chain::{BalanceSource, INVALID_ADDRESS_BALANCE};
use crate::db::activity::ActivityEntry;
use crate::db::agents::{self, AgentRow, NewAgent};
use crate::db::projects;
use crate::db::Db;
use crate::error::ApiError;
use crate::policy::{is_valid_address, AgentStatus, EligibilityPolicy};

/// Registration request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterAgentRequest {
    pub name: Option<String>,
    pub wallet: Option<String>,
    pub creator_wallet: Option<String>,
    pub description: Option<String>,
    pub endpoint: Option<String>,
    pub tx_hash: Option<String>,
    /// Self-reported balance, used only when no on-chain balance confirms
    pub nbook_balance: Option<i64>,
}

/// Outcome of a successful registration
#[derive(Debug, Clone, Serialize)]
pub struct RegistrationOutcome {
    pub status: String,
    pub balance: i64,
    pub threshold: i64,
    pub verified: &'static str,
}

/// Result of an idempotent balance verification
#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub wallet: String,
    pub agent_name: String,
    pub on_chain_balance: i64,
    pub effective_balance: i64,
    pub threshold: i64,
    pub eligible: bool,
    pub status: String,
    pub verification: &'static str,
}

#[derive(Clone)]
pub struct AgentRegistry {
    db: Arc<Db>,
    oracle: Arc<dyn BalanceSource>,
    policy: EligibilityPolicy,
    activity: ActivityRecorder,
}

impl AgentRegistry {
    pub fn new(
        db: Arc<Db>,
        oracle: Arc<dyn BalanceSource>,
        policy: EligibilityPolicy,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            db,
            oracle,
            policy,
            activity,
        }
    }

    pub fn list(&self) -> Result<Vec<AgentRow>, ApiError> {
        self.db.with_conn(agents::list)
    }

    pub fn find_by_wallet(&self, wallet: &str) -> Result<Option<AgentRow>, ApiError> {
        self.db.with_conn(|conn| agents::get_by_wallet(conn, wallet))
    }

    /// Register a new agent. Eligibility comes from the effective balance:
    /// a positive on-chain read, else the self-reported figure.
    pub async fn register(
        &self,
        req: RegisterAgentRequest,
    ) -> Result<RegistrationOutcome, ApiError> {
        let (name, wallet, creator_wallet, tx_hash) = match (
            req.name.as_deref(),
            req.wallet.as_deref(),
            req.creator_wallet.as_deref(),
            req.tx_hash.as_deref(),
        ) {
            (Some(n), Some(w), Some(c), Some(t))
                if !n.is_empty() && !w.is_empty() && !c.is_empty() && !t.is_empty() =>
            {
                (n, w, c, t)
            }
            _ => {
                return Err(ApiError::Validation(
                    "name, wallet, creator_wallet, and tx_hash are required".to_string(),
                ))
            }
        };

        if !self.policy.is_admin_wallet(wallet) && !is_valid_address(wallet) {
            return Err(ApiError::InvalidAddress(
                "Invalid wallet address. Must be a valid Monad address (0x + 40 hex characters)"
                    .to_string(),
            ));
        }
        if !self.policy.is_admin_wallet(creator_wallet) && !is_valid_address(creator_wallet) {
            return Err(ApiError::InvalidAddress(
                "Invalid creator_wallet address. Must be a valid Monad address (0x + 40 hex characters)"
                    .to_string(),
            ));
        }

        // Fast-path duplicate check; the wallet unique index remains the
        // authoritative conflict signal under concurrency.
        let exists = self
            .db
            .with_conn(|conn| agents::wallet_exists(conn, wallet))?;
        if exists {
            return Err(ApiError::Conflict("Wallet already registered".to_string()));
        }

        let on_chain_balance = self.oracle.get_balance(wallet).await;
        if on_chain_balance == INVALID_ADDRESS_BALANCE {
            return Err(ApiError::InvalidAddress(
                "Invalid wallet address format".to_string(),
            ));
        }

        let verified = on_chain_balance > 0;
        let effective_balance = if verified {
            on_chain_balance
        } else {
            req.nbook_balance.unwrap_or(0)
        };
        let status = self.policy.status_for(effective_balance);

        let new_agent = NewAgent {
            name,
            wallet,
            creator_wallet,
            description: req.description.as_deref(),
            endpoint: req.endpoint.as_deref(),
            tx_hash,
            nbook_balance: effective_balance,
            status,
        };
        self.db.with_conn(|conn| agents::insert(conn, &new_agent))?;

        info!(wallet, status = status.as_str(), effective_balance, "Agent registered");

        let verified_label = if verified { "on-chain" } else { "self-reported" };
        self.activity.log(ActivityEntry {
            action: "Agent Registered".to_string(),
            method: "POST".to_string(),
            endpoint: "/api/agents".to_string(),
            wallet: Some(wallet.to_string()),
            agent_name: Some(name.to_string()),
            status_code: 200,
            detail: Some(format!(
                "Status: {}, Balance: {}, Verified: {}",
                status.as_str(),
                effective_balance,
                verified_label
            )),
            ..Default::default()
        });

        Ok(RegistrationOutcome {
            status: status.as_str().to_string(),
            balance: effective_balance,
            threshold: self.policy.threshold(),
            verified: verified_label,
        })
    }

    /// Re-check a registered agent against the chain. A positive on-chain
    /// read is ground truth and overwrites the stored balance; otherwise
    /// the stored balance stands. Safe to call repeatedly.
    pub async fn verify(&self, wallet: &str) -> Result<VerificationReport, ApiError> {
        let agent = self
            .find_by_wallet(wallet)?
            .ok_or_else(|| ApiError::NotFound("Agent not found".to_string()))?;

        let on_chain_balance = self.oracle.get_balance(wallet).await;
        let verified = on_chain_balance > 0;
        let effective_balance = if verified {
            on_chain_balance
        } else {
            agent.nbook_balance
        };

        let eligible = self.policy.meets_threshold(effective_balance);
        let status = self.apply_effective_balance(agent.id, effective_balance)?;

        Ok(VerificationReport {
            wallet: wallet.to_string(),
            agent_name: agent.name,
            on_chain_balance,
            effective_balance,
            threshold: self.policy.threshold(),
            eligible,
            status: status.as_str().to_string(),
            verification: if verified {
                "on-chain"
            } else {
                "mock (no contract configured)"
            },
        })
    }

    /// Named demotion transition shared by the verify and vote paths.
    /// Persists `pending` plus the refreshed balance when the effective
    /// balance is under threshold. Returns true if a demotion happened.
    pub fn demote_if_under_threshold(
        &self,
        agent_id: i64,
        effective_balance: i64,
    ) -> Result<bool, ApiError> {
        if self.policy.meets_threshold(effective_balance) {
            return Ok(false);
        }
        self.db.with_conn(|conn| {
            agents::set_balance_and_status(conn, agent_id, effective_balance, AgentStatus::Pending)
        })?;
        info!(agent_id, effective_balance, "Agent demoted to pending");
        Ok(true)
    }

    /// Persist the refreshed balance and whichever status it implies
    fn apply_effective_balance(
        &self,
        agent_id: i64,
        effective_balance: i64,
    ) -> Result<AgentStatus, ApiError> {
        if self.demote_if_under_threshold(agent_id, effective_balance)? {
            return Ok(AgentStatus::Pending);
        }
        self.db.with_conn(|conn| {
            agents::set_balance_and_status(conn, agent_id, effective_balance, AgentStatus::Active)
        })?;
        Ok(AgentStatus::Active)
    }

    /// Administrative removal. Votes go first, then the agent row, then the
    /// affected projects' vote aggregates are recomputed from the remaining
    /// rows, all in one transaction. Irreversible.
    pub fn remove(&self, agent_id: i64) -> Result<(), ApiError> {
        let name = self.db.with_conn_mut(|conn| {
            let name = agents::get_name(conn, agent_id)?;
            let tx = conn.transaction()?;
            let voted_projects: Vec<i64> = {
                let mut stmt =
                    tx.prepare("SELECT DISTINCT project_id FROM votes WHERE agent_id = ?")?;
                let ids = stmt
                    .query_map([agent_id], |row| row.get(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                ids
            };
            tx.execute("DELETE FROM votes WHERE agent_id = ?", [agent_id])?;
            tx.execute("DELETE FROM agents WHERE id = ?", [agent_id])?;
            for project_id in voted_projects {
                projects::refresh_vote_stats(&tx, project_id)?;
            }
            tx.commit()?;
            Ok(name)
        })?;

        self.activity.log(ActivityEntry {
            action: "Agent Deleted (Admin)".to_string(),
            method: "DELETE".to_string(),
            endpoint: format!("/api/agents/{}", agent_id),
            agent_name: Some(name.unwrap_or_else(|| format!("#{}", agent_id))),
            status_code: 200,
            ..Default::default()
        });

        Ok(())
    }
}
