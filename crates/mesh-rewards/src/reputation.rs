use crate::storage::RewardsStorage;
use crate::types::ReputationRecord;
use chrono::Utc;
use mesh_types::{ContributionType, NodeId, Result, RewardTier};
use std::sync::Arc;
use tracing::debug;

/// Highest tier whose threshold does not exceed the running average:
/// bronze below 0.6, silver below 0.8, gold below 0.95, platinum above.
pub fn tier_for_average(average: f64) -> RewardTier {
    if average >= 0.95 {
        RewardTier::Platinum
    } else if average >= 0.8 {
        RewardTier::Gold
    } else if average >= 0.6 {
        RewardTier::Silver
    } else {
        RewardTier::Bronze
    }
}

/// Composite trust score in [0, 1]. The base term divides the 0-1 quality
/// average by 100, so contribution volume and tier carry nearly all of the
/// weight.
pub fn trust_level(average: f64, contribution_count: u64, tier: RewardTier) -> f64 {
    let mut trust = (average / 100.0).min(1.0);

    trust += if contribution_count > 50 {
        0.1
    } else if contribution_count > 20 {
        0.05
    } else {
        0.0
    };

    trust += match tier {
        RewardTier::Bronze => 0.0,
        RewardTier::Silver => 0.1,
        RewardTier::Gold => 0.2,
        RewardTier::Platinum => 0.3,
    };

    trust.clamp(0.0, 1.0)
}

/// Running quality average, tier and trust level per participant.
pub struct ReputationTracker {
    storage: Arc<dyn RewardsStorage>,
}

impl ReputationTracker {
    pub fn new(storage: Arc<dyn RewardsStorage>) -> Self {
        Self { storage }
    }

    pub async fn get(&self, node_id: &NodeId) -> Result<Option<ReputationRecord>> {
        self.storage.get_reputation(node_id).await
    }

    pub(crate) async fn update(
        &self,
        node_id: &NodeId,
        quality_score: f64,
        kind: ContributionType,
    ) -> Result<ReputationRecord> {
        let mut record = self
            .storage
            .get_reputation(node_id)
            .await?
            .unwrap_or_else(|| ReputationRecord::new(node_id.clone()));

        let count = record.contribution_count;
        record.average_quality =
            (record.average_quality * count as f64 + quality_score) / (count + 1) as f64;
        record.contribution_count = count + 1;
        record.last_contribution = Utc::now();
        record.tier = tier_for_average(record.average_quality);
        record.trust_level = trust_level(
            record.average_quality,
            record.contribution_count,
            record.tier,
        );

        self.storage.put_reputation(record.clone()).await?;

        debug!(
            node_id = %node_id,
            kind = %kind,
            average = record.average_quality,
            tier = %record.tier,
            trust = record.trust_level,
            "Reputation updated"
        );
        Ok(record)
    }
}
