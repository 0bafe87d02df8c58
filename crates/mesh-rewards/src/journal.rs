use crate::calculator;
use crate::ledger::LedgerManager;
use crate::reputation::ReputationTracker;
use crate::storage::RewardsStorage;
use crate::types::{Contribution, ContributionReceipt, RewardTransaction, TokenAmount};
use chrono::{DateTime, Utc};
use mesh_types::{ContributionType, NodeId, Result};
use std::sync::Arc;
use tracing::info;

/// Quality assumed when a caller supplies none.
pub const DEFAULT_QUALITY_SCORE: f64 = 0.5;

/// Append-only record of contributions. Recording orchestrates the reward
/// calculator, the account ledger and the reputation tracker.
pub struct ContributionJournal {
    storage: Arc<dyn RewardsStorage>,
    ledger: Arc<LedgerManager>,
    reputation: Arc<ReputationTracker>,
}

impl ContributionJournal {
    pub fn new(
        storage: Arc<dyn RewardsStorage>,
        ledger: Arc<LedgerManager>,
        reputation: Arc<ReputationTracker>,
    ) -> Self {
        Self {
            storage,
            ledger,
            reputation,
        }
    }

    /// Appends a contribution, credits its reward and updates reputation.
    ///
    /// At-least-once: repeated calls with identical arguments append new
    /// contributions and mint new rewards every time. Callers that need
    /// idempotency must deduplicate on `content_hash` themselves.
    pub(crate) async fn record(
        &self,
        node_id: &NodeId,
        kind: ContributionType,
        content_hash: &str,
        quality_score: f64,
        signature: Option<String>,
    ) -> Result<ContributionReceipt> {
        let reward = calculator::compute_reward(kind, quality_score);
        let id = self.storage.contribution_count().await? + 1;
        let now = Utc::now();

        self.storage
            .append_contribution(Contribution {
                id,
                node_id: node_id.clone(),
                kind,
                content_hash: content_hash.to_string(),
                timestamp: now,
                reward,
                quality_score,
                verified: false,
                signature,
            })
            .await?;

        let new_balance = self.ledger.credit(node_id, reward).await?;
        self.ledger.increment_contributions(node_id).await?;
        self.reputation.update(node_id, quality_score, kind).await?;

        let tx_hash = transaction_hash(node_id, reward, content_hash, now);
        self.storage
            .append_reward_transaction(RewardTransaction {
                node_id: node_id.clone(),
                amount: reward,
                kind,
                timestamp: now,
                tx_hash: tx_hash.clone(),
                status: "completed".to_string(),
            })
            .await?;

        info!(
            node_id = %node_id,
            kind = %kind,
            contribution_id = id,
            reward = reward.to_tokens(),
            "📒 Contribution recorded"
        );

        Ok(ContributionReceipt {
            contribution_id: id,
            reward_amount: reward,
            transaction_hash: tx_hash,
            new_balance,
        })
    }

    /// Newest-first contributions for one node.
    pub async fn history(&self, node_id: &NodeId, limit: usize) -> Result<Vec<Contribution>> {
        let mut items = self.storage.contributions_for(node_id).await?;
        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(limit);
        Ok(items)
    }

    pub async fn get(&self, contribution_id: u64) -> Result<Option<Contribution>> {
        self.storage.get_contribution(contribution_id).await
    }
}

fn transaction_hash(
    node_id: &NodeId,
    amount: TokenAmount,
    content_hash: &str,
    timestamp: DateTime<Utc>,
) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(node_id.as_str().as_bytes());
    hasher.update(&amount.to_base_units().to_le_bytes());
    hasher.update(content_hash.as_bytes());
    hasher.update(&timestamp.timestamp_millis().to_le_bytes());
    hex::encode(hasher.finalize().as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn journal() -> ContributionJournal {
        let storage: Arc<dyn RewardsStorage> = Arc::new(MemoryStorage::new());
        let ledger = Arc::new(LedgerManager::new(storage.clone()));
        let reputation = Arc::new(ReputationTracker::new(storage.clone()));
        ContributionJournal::new(storage, ledger, reputation)
    }

    #[tokio::test]
    async fn test_record_credits_reward_and_counts() {
        let journal = journal();
        let n1 = NodeId::new("n1");

        let receipt = journal
            .record(&n1, ContributionType::ModelTraining, "h1", 0.8, None)
            .await
            .unwrap();

        assert_eq!(receipt.contribution_id, 1);
        assert_eq!(receipt.reward_amount, TokenAmount::from_tokens(28.0));
        assert_eq!(receipt.new_balance, TokenAmount::from_tokens(28.0));

        let account = journal.ledger.get_account(&n1).await.unwrap().unwrap();
        assert_eq!(account.contribution_count, 1);
    }

    #[tokio::test]
    async fn test_sequential_ids() {
        let journal = journal();
        let n1 = NodeId::new("n1");

        for expected in 1..=3u64 {
            let receipt = journal
                .record(&n1, ContributionType::DataContribution, "h", 0.5, None)
                .await
                .unwrap();
            assert_eq!(receipt.contribution_id, expected);
        }
    }

    #[tokio::test]
    async fn test_no_deduplication_on_content_hash() {
        let journal = journal();
        let n1 = NodeId::new("n1");

        let first = journal
            .record(&n1, ContributionType::DataContribution, "same", 0.5, None)
            .await
            .unwrap();
        let second = journal
            .record(&n1, ContributionType::DataContribution, "same", 0.5, None)
            .await
            .unwrap();

        assert_ne!(first.contribution_id, second.contribution_id);
        assert_eq!(
            second.new_balance,
            first
                .reward_amount
                .checked_add(second.reward_amount)
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_every_contribution_has_a_reward_transaction() {
        let journal = journal();
        let n1 = NodeId::new("n1");

        journal
            .record(&n1, ContributionType::PeerReview, "h1", 0.9, None)
            .await
            .unwrap();
        journal
            .record(&n1, ContributionType::Validation, "h2", 0.4, None)
            .await
            .unwrap();

        let txs = journal.ledger.reward_history(&n1, 10).await.unwrap();
        assert_eq!(txs.len(), 2);
        assert!(txs.iter().all(|tx| tx.status == "completed"));
        assert!(txs.iter().all(|tx| !tx.tx_hash.is_empty()));
    }

    #[tokio::test]
    async fn test_signature_is_stored_opaque() {
        let journal = journal();
        let n1 = NodeId::new("n1");

        journal
            .record(
                &n1,
                ContributionType::KnowledgeExtraction,
                "h1",
                0.7,
                Some("sig_abc".to_string()),
            )
            .await
            .unwrap();

        let stored = journal.get(1).await.unwrap().unwrap();
        assert_eq!(stored.signature.as_deref(), Some("sig_abc"));
        assert!(!stored.verified);
    }

    #[tokio::test]
    async fn test_history_newest_first_with_limit() {
        let journal = journal();
        let n1 = NodeId::new("n1");
        let other = NodeId::new("other");

        for i in 0..5 {
            journal
                .record(&n1, ContributionType::DataContribution, &format!("h{i}"), 0.5, None)
                .await
                .unwrap();
        }
        journal
            .record(&other, ContributionType::DataContribution, "x", 0.5, None)
            .await
            .unwrap();

        let history = journal.history(&n1, 3).await.unwrap();
        assert_eq!(history.len(), 3);
        assert!(history.iter().all(|c| c.node_id == n1));
        assert!(history.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
    }
}
