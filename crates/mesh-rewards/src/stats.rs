use crate::storage::RewardsStorage;
use crate::types::{LeaderboardEntry, NetworkStats, TokenAmount};
use chrono::Utc;
use mesh_types::{Result, RewardTier};
use std::collections::HashMap;
use std::sync::Arc;

const DAY_SECS: i64 = 24 * 3600;
const WEEK_SECS: i64 = 7 * DAY_SECS;

/// Read-only aggregations over the ledger, journal and reputation store.
pub struct StatsManager {
    storage: Arc<dyn RewardsStorage>,
}

impl StatsManager {
    pub fn new(storage: Arc<dyn RewardsStorage>) -> Self {
        Self { storage }
    }

    /// Accounts sorted by balance descending, annotated with reputation.
    /// Nodes without a reputation record show as bronze with zero trust.
    pub async fn leaderboard(&self, limit: usize) -> Result<Vec<LeaderboardEntry>> {
        let mut accounts = self.storage.all_accounts().await?;
        accounts.sort_by(|a, b| b.balance.cmp(&a.balance));
        accounts.truncate(limit);

        let mut entries = Vec::with_capacity(accounts.len());
        for (i, account) in accounts.into_iter().enumerate() {
            let reputation = self.storage.get_reputation(&account.node_id).await?;
            entries.push(LeaderboardEntry {
                rank: i + 1,
                node_id: account.node_id,
                balance: account.balance,
                contributions: account.contribution_count,
                tier: reputation
                    .as_ref()
                    .map(|r| r.tier)
                    .unwrap_or(RewardTier::Bronze),
                trust_level: reputation.map(|r| r.trust_level).unwrap_or(0.0),
            });
        }
        Ok(entries)
    }

    pub async fn network_stats(&self) -> Result<NetworkStats> {
        let accounts = self.storage.all_accounts().await?;
        let now = Utc::now().timestamp();

        let total_accounts = accounts.len();
        let mut total_balance = TokenAmount::ZERO;
        let mut total_contributions = 0u64;
        let mut active_nodes_24h = 0;
        let mut active_nodes_7d = 0;
        for account in &accounts {
            total_balance = total_balance.saturating_add(account.balance);
            total_contributions += account.contribution_count;
            let age = now - account.last_activity;
            if age < DAY_SECS {
                active_nodes_24h += 1;
            }
            if age < WEEK_SECS {
                active_nodes_7d += 1;
            }
        }

        let mut tier_distribution: HashMap<RewardTier, usize> = HashMap::new();
        for record in self.storage.all_reputation().await? {
            *tier_distribution.entry(record.tier).or_insert(0) += 1;
        }

        Ok(NetworkStats {
            total_accounts,
            total_balance,
            total_contributions,
            average_balance: if total_accounts > 0 {
                total_balance.to_tokens() / total_accounts as f64
            } else {
                0.0
            },
            tier_distribution,
            active_nodes_24h,
            active_nodes_7d,
        })
    }
}
