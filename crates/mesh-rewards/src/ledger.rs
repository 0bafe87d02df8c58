use crate::storage::RewardsStorage;
use crate::types::{Account, RewardTransaction, TokenAmount};
use chrono::Utc;
use mesh_types::{NodeId, Result, RewardsError};
use std::sync::Arc;
use tracing::info;

/// Token balances and activity timestamps per participant.
pub struct LedgerManager {
    storage: Arc<dyn RewardsStorage>,
}

impl LedgerManager {
    pub fn new(storage: Arc<dyn RewardsStorage>) -> Self {
        Self { storage }
    }

    /// Zero for accounts that do not exist yet.
    pub async fn get_balance(&self, node_id: &NodeId) -> Result<TokenAmount> {
        Ok(self
            .storage
            .get_account(node_id)
            .await?
            .map(|a| a.balance)
            .unwrap_or(TokenAmount::ZERO))
    }

    pub async fn get_account(&self, node_id: &NodeId) -> Result<Option<Account>> {
        self.storage.get_account(node_id).await
    }

    /// Newest-first reward transactions involving a node.
    pub async fn reward_history(
        &self,
        node_id: &NodeId,
        limit: usize,
    ) -> Result<Vec<RewardTransaction>> {
        let mut txs = self.storage.reward_transactions_for(node_id).await?;
        txs.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        txs.truncate(limit);
        Ok(txs)
    }

    async fn load_or_create(&self, node_id: &NodeId) -> Result<Account> {
        Ok(self
            .storage
            .get_account(node_id)
            .await?
            .unwrap_or_else(|| Account::new(node_id.clone())))
    }

    pub(crate) async fn credit(&self, node_id: &NodeId, amount: TokenAmount) -> Result<TokenAmount> {
        let mut account = self.load_or_create(node_id).await?;
        let before = account.balance;
        account.balance = account
            .balance
            .checked_add(amount)
            .ok_or_else(|| RewardsError::Storage(format!("balance overflow for {node_id}")))?;
        account.last_activity = Utc::now().timestamp();
        let after = account.balance;
        self.storage.put_account(account).await?;

        info!(
            node_id = %node_id,
            amount = amount.to_tokens(),
            balance_before = before.to_tokens(),
            balance_after = after.to_tokens(),
            "💰 Tokens credited"
        );
        Ok(after)
    }

    /// Unconditional adjustment with no floor: penalties may push a balance
    /// below zero.
    pub(crate) async fn debit(&self, node_id: &NodeId, amount: TokenAmount) -> Result<TokenAmount> {
        let mut account = self.load_or_create(node_id).await?;
        let before = account.balance;
        account.balance = account
            .balance
            .checked_sub(amount)
            .ok_or_else(|| RewardsError::Storage(format!("balance underflow for {node_id}")))?;
        account.last_activity = Utc::now().timestamp();
        let after = account.balance;
        self.storage.put_account(account).await?;

        info!(
            node_id = %node_id,
            amount = amount.to_tokens(),
            balance_before = before.to_tokens(),
            balance_after = after.to_tokens(),
            "💸 Tokens debited"
        );
        Ok(after)
    }

    pub(crate) async fn increment_contributions(&self, node_id: &NodeId) -> Result<()> {
        let mut account = self.load_or_create(node_id).await?;
        account.contribution_count += 1;
        account.last_activity = Utc::now().timestamp();
        self.storage.put_account(account).await?;
        Ok(())
    }

    /// Moves tokens between accounts. The source must exist and cover the
    /// amount; the destination is created if absent. Both activity
    /// timestamps are refreshed.
    pub(crate) async fn transfer(
        &self,
        from: &NodeId,
        to: &NodeId,
        amount: TokenAmount,
    ) -> Result<()> {
        let mut source = self
            .storage
            .get_account(from)
            .await?
            .ok_or_else(|| RewardsError::AccountNotFound(from.to_string()))?;

        if source.balance < amount {
            return Err(RewardsError::InsufficientBalance {
                node: from.to_string(),
                available: source.balance.to_tokens(),
                needed: amount.to_tokens(),
            });
        }

        let now = Utc::now().timestamp();

        if from == to {
            // Net zero; only the activity stamp moves.
            source.last_activity = now;
            self.storage.put_account(source).await?;
            return Ok(());
        }

        let mut dest = self.load_or_create(to).await?;
        source.balance = source
            .balance
            .checked_sub(amount)
            .ok_or_else(|| RewardsError::Storage(format!("balance underflow for {from}")))?;
        dest.balance = dest
            .balance
            .checked_add(amount)
            .ok_or_else(|| RewardsError::Storage(format!("balance overflow for {to}")))?;
        source.last_activity = now;
        dest.last_activity = now;

        self.storage.put_account(source).await?;
        self.storage.put_account(dest).await?;

        info!(
            from = %from,
            to = %to,
            amount = amount.to_tokens(),
            "✅ Transfer committed"
        );
        Ok(())
    }
}
