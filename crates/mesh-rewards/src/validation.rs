use crate::journal::ContributionJournal;
use crate::ledger::LedgerManager;
use crate::storage::RewardsStorage;
use crate::types::TokenAmount;
use mesh_types::{ContributionType, NodeId, Result, RewardsError};
use std::sync::Arc;
use tracing::{info, warn};

/// Flat payout for performing a validation, on top of the validation
/// contribution it records.
pub const VALIDATOR_REWARD: TokenAmount = TokenAmount::from_base_units(200);

/// Share of the original reward returned to the contributor as a bonus.
pub const VERIFIED_BONUS_RATE: f64 = 0.10;

/// Share of the original reward clawed back on rejection.
pub const REJECTION_PENALTY_RATE: f64 = 0.50;

/// Peer-review workflow. A positive verdict flips the contribution to
/// `verified` and pays out bonuses; a negative one applies a balance
/// penalty and leaves the contribution unverified.
pub struct ValidationEngine {
    storage: Arc<dyn RewardsStorage>,
    ledger: Arc<LedgerManager>,
    journal: Arc<ContributionJournal>,
}

impl ValidationEngine {
    pub fn new(
        storage: Arc<dyn RewardsStorage>,
        ledger: Arc<LedgerManager>,
        journal: Arc<ContributionJournal>,
    ) -> Self {
        Self {
            storage,
            ledger,
            journal,
        }
    }

    pub(crate) async fn validate(
        &self,
        contribution_id: u64,
        validator: &NodeId,
        is_valid: bool,
        feedback: &str,
    ) -> Result<()> {
        let mut contribution = self
            .storage
            .get_contribution(contribution_id)
            .await?
            .ok_or(RewardsError::InvalidContributionId(contribution_id))?;

        if is_valid {
            contribution.verified = true;
            let contributor = contribution.node_id.clone();
            let bonus = TokenAmount::from_tokens(contribution.reward.to_tokens() * VERIFIED_BONUS_RATE);
            self.storage.put_contribution(contribution).await?;

            self.ledger.credit(&contributor, bonus).await?;

            // The validator is paid twice: a flat credit here, then the full
            // reward of the validation contribution recorded below.
            self.ledger.credit(validator, VALIDATOR_REWARD).await?;
            self.ledger.increment_contributions(validator).await?;
            self.journal
                .record(
                    validator,
                    ContributionType::Validation,
                    &format!("validation_{contribution_id}"),
                    0.8,
                    None,
                )
                .await?;

            info!(
                contribution_id,
                validator = %validator,
                contributor = %contributor,
                bonus = bonus.to_tokens(),
                feedback = feedback,
                "✅ Contribution verified"
            );
        } else {
            let penalty =
                TokenAmount::from_tokens(contribution.reward.to_tokens() * REJECTION_PENALTY_RATE);
            self.ledger.debit(&contribution.node_id, penalty).await?;

            warn!(
                contribution_id,
                validator = %validator,
                contributor = %contribution.node_id,
                penalty = penalty.to_tokens(),
                feedback = feedback,
                "❌ Contribution rejected, penalty applied"
            );
        }

        Ok(())
    }
}
