use crate::types::TokenAmount;
use mesh_types::ContributionType;

pub fn base_reward(kind: ContributionType) -> f64 {
    match kind {
        ContributionType::DataContribution => 5.0,
        ContributionType::ModelTraining => 10.0,
        ContributionType::KnowledgeExtraction => 15.0,
        ContributionType::Validation => 7.5,
        ContributionType::PeerReview => 12.5,
        ContributionType::NetworkMaintenance => 5.0,
    }
}

pub fn multiplier(kind: ContributionType) -> f64 {
    match kind {
        ContributionType::DataContribution => 1.0,
        ContributionType::ModelTraining => 2.0,
        ContributionType::KnowledgeExtraction => 3.0,
        ContributionType::Validation => 1.5,
        ContributionType::PeerReview => 2.5,
        ContributionType::NetworkMaintenance => 1.0,
    }
}

/// Payout for one contribution. Quality adds up to 50% on top of the
/// per-kind base; the result is rounded to two decimal places.
pub fn compute_reward(kind: ContributionType, quality_score: f64) -> TokenAmount {
    let reward = base_reward(kind) * multiplier(kind) * (1.0 + quality_score * 0.5);
    TokenAmount::from_tokens(reward)
}
