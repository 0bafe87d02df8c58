use chrono::{DateTime, Utc};
use mesh_types::{ContributionType, NodeId, RewardTier};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

pub const TOKEN_DECIMALS: u32 = 2;
pub const TOKEN_BASE_UNIT: i64 = 100; // 10^2

/// Fixed-point token quantity with two decimal digits. Signed: penalties
/// have no floor, so balances can go below zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenAmount(i64);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    /// Rounds to the nearest base unit, i.e. to two decimal places.
    pub fn from_tokens(tokens: f64) -> Self {
        Self((tokens * TOKEN_BASE_UNIT as f64).round() as i64)
    }

    pub const fn from_base_units(units: i64) -> Self {
        Self(units)
    }

    pub fn to_tokens(&self) -> f64 {
        self.0 as f64 / TOKEN_BASE_UNIT as f64
    }

    pub fn to_base_units(&self) -> i64 {
        self.0
    }

    pub fn checked_add(&self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn checked_sub(&self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    pub fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    pub fn saturating_sub(&self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn is_negative(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.to_tokens())
    }
}

/// Per-participant ledger entry. Created lazily on first credit or as a
/// transfer destination; never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub node_id: NodeId,
    pub balance: TokenAmount,
    pub contribution_count: u64,
    pub last_activity: i64,
}

impl Account {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            balance: TokenAmount::ZERO,
            contribution_count: 0,
            last_activity: Utc::now().timestamp(),
        }
    }
}

/// Journal entry. Immutable except the `verified` flag, which flips to true
/// at most once via a successful peer validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contribution {
    /// 1-based position in the journal. Never reused or renumbered.
    pub id: u64,
    pub node_id: NodeId,
    pub kind: ContributionType,
    pub content_hash: String,
    pub timestamp: DateTime<Utc>,
    pub reward: TokenAmount,
    pub quality_score: f64,
    pub verified: bool,
    pub signature: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardTransaction {
    pub node_id: NodeId,
    pub amount: TokenAmount,
    pub kind: ContributionType,
    pub timestamp: DateTime<Utc>,
    pub tx_hash: String,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReputationRecord {
    pub node_id: NodeId,
    /// Arithmetic mean of every quality score seen so far.
    pub average_quality: f64,
    pub contribution_count: u64,
    pub last_contribution: DateTime<Utc>,
    pub tier: RewardTier,
    pub trust_level: f64,
}

impl ReputationRecord {
    pub fn new(node_id: NodeId) -> Self {
        Self {
            node_id,
            average_quality: 0.0,
            contribution_count: 0,
            last_contribution: Utc::now(),
            tier: RewardTier::Bronze,
            trust_level: 0.0,
        }
    }
}

/// Result of a successful `record_contribution` call.
#[derive(Debug, Clone, Serialize)]
pub struct ContributionReceipt {
    pub contribution_id: u64,
    pub reward_amount: TokenAmount,
    pub transaction_hash: String,
    pub new_balance: TokenAmount,
}

#[derive(Debug, Clone, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub node_id: NodeId,
    pub balance: TokenAmount,
    pub contributions: u64,
    pub tier: RewardTier,
    pub trust_level: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkStats {
    pub total_accounts: usize,
    pub total_balance: TokenAmount,
    pub total_contributions: u64,
    /// Tokens per account; zero when no accounts exist.
    pub average_balance: f64,
    pub tier_distribution: HashMap<RewardTier, usize>,
    pub active_nodes_24h: usize,
    pub active_nodes_7d: usize,
}
