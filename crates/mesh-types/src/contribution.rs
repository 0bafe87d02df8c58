use crate::error::RewardsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Closed set of work kinds that earn rewards. Unknown strings are rejected
/// at the boundary before any ledger mutation happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContributionType {
    DataContribution,
    ModelTraining,
    KnowledgeExtraction,
    Validation,
    PeerReview,
    NetworkMaintenance,
}

impl ContributionType {
    pub const ALL: [ContributionType; 6] = [
        ContributionType::DataContribution,
        ContributionType::ModelTraining,
        ContributionType::KnowledgeExtraction,
        ContributionType::Validation,
        ContributionType::PeerReview,
        ContributionType::NetworkMaintenance,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionType::DataContribution => "data_contribution",
            ContributionType::ModelTraining => "model_training",
            ContributionType::KnowledgeExtraction => "knowledge_extraction",
            ContributionType::Validation => "validation",
            ContributionType::PeerReview => "peer_review",
            ContributionType::NetworkMaintenance => "network_maintenance",
        }
    }
}

impl fmt::Display for ContributionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ContributionType {
    type Err = RewardsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "data_contribution" => Ok(ContributionType::DataContribution),
            "model_training" => Ok(ContributionType::ModelTraining),
            "knowledge_extraction" => Ok(ContributionType::KnowledgeExtraction),
            "validation" => Ok(ContributionType::Validation),
            "peer_review" => Ok(ContributionType::PeerReview),
            "network_maintenance" => Ok(ContributionType::NetworkMaintenance),
            other => Err(RewardsError::InvalidContributionType(other.to_string())),
        }
    }
}

/// Reputation bracket derived from a participant's running quality average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl RewardTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            RewardTier::Bronze => "bronze",
            RewardTier::Silver => "silver",
            RewardTier::Gold => "gold",
            RewardTier::Platinum => "platinum",
        }
    }
}

impl fmt::Display for RewardTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
