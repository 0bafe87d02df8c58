//! Contribution-rewards and reputation ledger for the mesh network.
//!
//! Participants earn quality-weighted token rewards for typed
//! contributions; every contribution feeds a running reputation score with
//! tiers, peers validate each other's work for bonus/penalty side effects,
//! and balances are transferable. [`RewardsEngine`] is the single entry
//! point: it serializes all mutating operations and commits each one to
//! storage before returning.

pub mod calculator;
pub mod journal;
pub mod ledger;
pub mod reputation;
pub mod stats;
pub mod storage;
pub mod types;
pub mod validation;

pub use journal::{ContributionJournal, DEFAULT_QUALITY_SCORE};
pub use ledger::LedgerManager;
pub use mesh_types::{ContributionType, NodeId, Result, RewardTier, RewardsError};
pub use reputation::ReputationTracker;
pub use stats::StatsManager;
pub use storage::{JsonFileStorage, MemoryStorage, RewardsStorage};
pub use types::{
    Account, Contribution, ContributionReceipt, LeaderboardEntry, NetworkStats, ReputationRecord,
    RewardTransaction, TokenAmount,
};
pub use validation::ValidationEngine;

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;

/// Owns the component managers over one shared storage handle and
/// serializes every operation on a single write lock, so the combined
/// read-modify-write of balances, journal ids and reputation averages is
/// never interleaved. Each mutating call runs inside one storage
/// transaction: committed before the call returns, rolled back on error.
pub struct RewardsEngine {
    pub ledger: Arc<LedgerManager>,
    pub journal: Arc<ContributionJournal>,
    pub reputation: Arc<ReputationTracker>,
    pub validation: Arc<ValidationEngine>,
    pub stats: Arc<StatsManager>,
    storage: Arc<dyn RewardsStorage>,
    write_lock: Mutex<()>,
}

impl RewardsEngine {
    pub fn new(storage: Arc<dyn RewardsStorage>) -> Self {
        let ledger = Arc::new(LedgerManager::new(storage.clone()));
        let reputation = Arc::new(ReputationTracker::new(storage.clone()));
        let journal = Arc::new(ContributionJournal::new(
            storage.clone(),
            ledger.clone(),
            reputation.clone(),
        ));
        let validation = Arc::new(ValidationEngine::new(
            storage.clone(),
            ledger.clone(),
            journal.clone(),
        ));
        let stats = Arc::new(StatsManager::new(storage.clone()));

        Self {
            ledger,
            journal,
            reputation,
            validation,
            stats,
            storage,
            write_lock: Mutex::new(()),
        }
    }

    /// Records a contribution and returns its receipt. Raises on invalid
    /// input; repeated identical calls mint new rewards every time.
    pub async fn record_contribution(
        &self,
        node_id: &NodeId,
        kind: ContributionType,
        content_hash: &str,
        quality_score: f64,
        signature: Option<String>,
    ) -> Result<ContributionReceipt> {
        let _guard = self.write_lock.lock().await;
        self.storage.begin_transaction().await?;
        match self
            .journal
            .record(node_id, kind, content_hash, quality_score, signature)
            .await
        {
            Ok(receipt) => {
                if let Err(e) = self.storage.commit_transaction().await {
                    self.storage.rollback_transaction().await?;
                    return Err(e);
                }
                Ok(receipt)
            }
            Err(e) => {
                self.storage.rollback_transaction().await?;
                Err(e)
            }
        }
    }

    pub async fn get_balance(&self, node_id: &NodeId) -> Result<TokenAmount> {
        let _guard = self.write_lock.lock().await;
        self.ledger.get_balance(node_id).await
    }

    pub async fn get_reputation(&self, node_id: &NodeId) -> Result<Option<ReputationRecord>> {
        let _guard = self.write_lock.lock().await;
        self.reputation.get(node_id).await
    }

    pub async fn get_leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let _guard = self.write_lock.lock().await;
        self.stats.leaderboard(limit).await
    }

    pub async fn get_contribution_history(
        &self,
        node_id: &NodeId,
        limit: usize,
    ) -> Result<Vec<Contribution>> {
        let _guard = self.write_lock.lock().await;
        self.journal.history(node_id, limit).await
    }

    pub async fn get_reward_history(
        &self,
        node_id: &NodeId,
        limit: usize,
    ) -> Result<Vec<RewardTransaction>> {
        let _guard = self.write_lock.lock().await;
        self.ledger.reward_history(node_id, limit).await
    }

    pub async fn get_network_stats(&self) -> Result<NetworkStats> {
        let _guard = self.write_lock.lock().await;
        self.stats.network_stats().await
    }

    /// Moves tokens between accounts. Unlike [`Self::record_contribution`],
    /// failures are reported as `false`, never raised.
    pub async fn transfer_tokens(&self, from: &NodeId, to: &NodeId, amount: TokenAmount) -> bool {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.storage.begin_transaction().await {
            warn!(from = %from, to = %to, error = %e, "Transfer aborted before start");
            return false;
        }
        match self.ledger.transfer(from, to, amount).await {
            Ok(()) => match self.storage.commit_transaction().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(from = %from, to = %to, error = %e, "Transfer commit failed");
                    let _ = self.storage.rollback_transaction().await;
                    false
                }
            },
            Err(e) => {
                warn!(from = %from, to = %to, error = %e, "❌ Transfer rolled back");
                let _ = self.storage.rollback_transaction().await;
                false
            }
        }
    }

    /// Peer review of an existing contribution. Failures are reported as
    /// `false`, never raised.
    pub async fn validate_contribution(
        &self,
        contribution_id: u64,
        validator: &NodeId,
        is_valid: bool,
        feedback: &str,
    ) -> bool {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.storage.begin_transaction().await {
            warn!(contribution_id, error = %e, "Validation aborted before start");
            return false;
        }
        match self
            .validation
            .validate(contribution_id, validator, is_valid, feedback)
            .await
        {
            Ok(()) => match self.storage.commit_transaction().await {
                Ok(()) => true,
                Err(e) => {
                    warn!(contribution_id, error = %e, "Validation commit failed");
                    let _ = self.storage.rollback_transaction().await;
                    false
                }
            },
            Err(e) => {
                warn!(
                    contribution_id,
                    validator = %validator,
                    error = %e,
                    "❌ Validation rolled back"
                );
                let _ = self.storage.rollback_transaction().await;
                false
            }
        }
    }
}
