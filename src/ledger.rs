//! Vote ledger - balance-gated vote writes
//!
//! The write path re-checks the chain before anything else: a fresh
//! positive read is ground truth, and falling under threshold demotes the
//! agent as part of the rejection. Order matters - the balance check (and
//! possible demotion) happens before the stored-status check, so an agent
//! that just dropped below threshold is rejected for balance, not status.

use std::sync::Arc;

use serde::Deserialize;
use tracing::info;

use crate::activity::ActivityRecorder;
use crate::chain::BalanceSource;
use crate::db::activity::ActivityEntry;
use crate::db::votes::{self, NewVote, VoteFilter, VoteRow};
use crate::db::{agents, projects, Db};
use crate::error::ApiError;
use crate::policy::{is_valid_address, EligibilityPolicy};
use crate::registry::AgentRegistry;

/// Vote submission body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CastVoteRequest {
    pub agent_wallet: Option<String>,
    pub project_id: Option<i64>,
    pub score: Option<f64>,
    pub reasoning: Option<String>,
    pub tech_score: Option<f64>,
    pub market_score: Option<f64>,
    pub tokenomics_score: Option<f64>,
    pub community_score: Option<f64>,
    pub risk_score: Option<f64>,
    pub tx_hash: Option<String>,
}

#[derive(Clone)]
pub struct VoteLedger {
    db: Arc<Db>,
    oracle: Arc<dyn BalanceSource>,
    policy: EligibilityPolicy,
    registry: AgentRegistry,
    activity: ActivityRecorder,
}

impl VoteLedger {
    pub fn new(
        db: Arc<Db>,
        oracle: Arc<dyn BalanceSource>,
        policy: EligibilityPolicy,
        registry: AgentRegistry,
        activity: ActivityRecorder,
    ) -> Self {
        Self {
            db,
            oracle,
            policy,
            registry,
            activity,
        }
    }

    pub fn list(&self, filter: VoteFilter) -> Result<Vec<VoteRow>, ApiError> {
        self.db.with_conn(|conn| votes::list(conn, filter))
    }

    /// Record one vote for (agent, project). See the module doc for the
    /// check ordering contract.
    pub async fn cast_vote(&self, req: CastVoteRequest) -> Result<(), ApiError> {
        let (agent_wallet, project_id, score, tx_hash) = match (
            req.agent_wallet.as_deref(),
            req.project_id,
            req.score,
            req.tx_hash.as_deref(),
        ) {
            (Some(w), Some(p), Some(s), Some(t)) if !w.is_empty() && !t.is_empty() => {
                (w, p, s, t)
            }
            _ => {
                return Err(ApiError::Validation(
                    "agent_wallet, project_id, score, and tx_hash are required".to_string(),
                ))
            }
        };

        if !self.policy.is_admin_wallet(agent_wallet) && !is_valid_address(agent_wallet) {
            return Err(ApiError::InvalidAddress(
                "Invalid agent_wallet. Must be a valid Monad address (0x + 40 hex characters)"
                    .to_string(),
            ));
        }

        let agent = self
            .db
            .with_conn(|conn| agents::get_by_wallet(conn, agent_wallet))?
            .ok_or_else(|| {
                ApiError::NotFound(
                    "Agent not found. Register first at POST /api/agents".to_string(),
                )
            })?;

        // Ground-truth refresh, same policy as verify
        let on_chain_balance = self.oracle.get_balance(&agent.wallet).await;
        if on_chain_balance > 0 {
            self.db
                .with_conn(|conn| agents::set_balance(conn, agent.id, on_chain_balance))?;
        }
        let effective_balance = if on_chain_balance > 0 {
            on_chain_balance
        } else {
            agent.nbook_balance
        };

        // The rejection itself mutates state: failing the balance check
        // demotes the agent before the error goes back.
        if self
            .registry
            .demote_if_under_threshold(agent.id, effective_balance)?
        {
            return Err(ApiError::InsufficientBalance {
                wallet: agent.wallet,
                balance: effective_balance,
                required: self.policy.threshold(),
            });
        }

        // Status check uses the stored, pre-refresh status field
        if agent.status != "active" {
            return Err(ApiError::WrongStatus(agent.status));
        }

        // Fast-path duplicate check; the unique index is authoritative
        let duplicate = self
            .db
            .with_conn(|conn| votes::exists(conn, agent.id, project_id))?;
        if duplicate {
            return Err(ApiError::Conflict(
                "Agent already voted on this project".to_string(),
            ));
        }

        let project_exists = self
            .db
            .with_conn(|conn| projects::exists(conn, project_id))?;
        if !project_exists {
            return Err(ApiError::NotFound("Project not found".to_string()));
        }

        // Vote row, agent counter, and project aggregates commit together
        let project_name = self.db.with_conn_mut(|conn| {
            let tx = conn.transaction()?;
            let vote = NewVote {
                agent_id: agent.id,
                project_id,
                score,
                reasoning: req.reasoning.as_deref(),
                tech_score: req.tech_score,
                market_score: req.market_score,
                tokenomics_score: req.tokenomics_score,
                community_score: req.community_score,
                risk_score: req.risk_score,
                tx_hash,
            };
            votes::insert(&tx, &vote)?;
            agents::increment_votes_cast(&tx, agent.id)?;
            projects::refresh_vote_stats(&tx, project_id)?;
            let name = projects::get_name(&tx, project_id)?;
            tx.commit()?;
            Ok(name)
        })?;

        info!(
            wallet = %agent.wallet,
            project_id,
            score,
            "Vote recorded"
        );

        self.activity.log(ActivityEntry {
            action: "Vote Cast".to_string(),
            method: "POST".to_string(),
            endpoint: "/api/votes".to_string(),
            wallet: Some(agent.wallet),
            agent_name: Some(agent.name),
            project_name: Some(project_name.unwrap_or_else(|| format!("Project #{}", project_id))),
            status_code: 200,
            detail: Some(vote_detail(&req, score)),
            ..Default::default()
        });

        Ok(())
    }
}

/// Sub-score summary for the activity trail, "-" for absent values
fn vote_detail(req: &CastVoteRequest, score: f64) -> String {
    fn fmt(v: Option<f64>) -> String {
        v.map(|s| s.to_string()).unwrap_or_else(|| "-".to_string())
    }

    let mut detail = format!(
        "Score: {} | Tech: {}, Market: {}, Tokenomics: {}, Community: {}, Risk: {}",
        score,
        fmt(req.tech_score),
        fmt(req.market_score),
        fmt(req.tokenomics_score),
        fmt(req.community_score),
        fmt(req.risk_score),
    );
    if let Some(reasoning) = &req.reasoning {
        detail.push_str(&format!(" | Reason: {}", reasoning));
    }
    detail
}
