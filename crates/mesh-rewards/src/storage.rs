use crate::types::{Account, Contribution, ReputationRecord, RewardTransaction};
use async_trait::async_trait;
use mesh_types::{NodeId, Result, RewardsError};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Persistence seam for the four logical collections: accounts, the
/// contribution journal, reputation records and reward transactions.
///
/// Transaction contract: `begin_transaction` captures the current state,
/// `commit_transaction` makes every mutation since then durable before it
/// returns, `rollback_transaction` restores the captured state. Mutations
/// issued outside a transaction are made durable immediately.
#[async_trait]
pub trait RewardsStorage: Send + Sync {
    async fn get_account(&self, node_id: &NodeId) -> Result<Option<Account>>;
    async fn put_account(&self, account: Account) -> Result<()>;
    async fn all_accounts(&self) -> Result<Vec<Account>>;

    async fn contribution_count(&self) -> Result<u64>;
    async fn get_contribution(&self, id: u64) -> Result<Option<Contribution>>;
    /// Appends to the journal. The entry's id must be the next sequential
    /// position; anything else is rejected.
    async fn append_contribution(&self, contribution: Contribution) -> Result<()>;
    /// Rewrites an existing journal entry in place (used for the one-way
    /// `verified` flip).
    async fn put_contribution(&self, contribution: Contribution) -> Result<()>;
    async fn contributions_for(&self, node_id: &NodeId) -> Result<Vec<Contribution>>;

    async fn get_reputation(&self, node_id: &NodeId) -> Result<Option<ReputationRecord>>;
    async fn put_reputation(&self, record: ReputationRecord) -> Result<()>;
    async fn all_reputation(&self) -> Result<Vec<ReputationRecord>>;

    async fn append_reward_transaction(&self, tx: RewardTransaction) -> Result<()>;
    async fn reward_transactions_for(&self, node_id: &NodeId) -> Result<Vec<RewardTransaction>>;

    async fn begin_transaction(&self) -> Result<()>;
    async fn commit_transaction(&self) -> Result<()>;
    async fn rollback_transaction(&self) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StorageState {
    accounts: HashMap<NodeId, Account>,
    contributions: Vec<Contribution>,
    reputation: HashMap<NodeId, ReputationRecord>,
    reward_transactions: Vec<RewardTransaction>,
}

pub struct MemoryStorage {
    state: Arc<RwLock<StorageState>>,
    snapshot: Arc<RwLock<Option<StorageState>>>,
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::from_state(StorageState::default())
    }

    pub(crate) fn from_state(state: StorageState) -> Self {
        Self {
            state: Arc::new(RwLock::new(state)),
            snapshot: Arc::new(RwLock::new(None)),
        }
    }

    pub(crate) async fn export_state(&self) -> StorageState {
        self.state.read().await.clone()
    }

    pub(crate) async fn in_transaction(&self) -> bool {
        self.snapshot.read().await.is_some()
    }
}

#[async_trait]
impl RewardsStorage for MemoryStorage {
    async fn get_account(&self, node_id: &NodeId) -> Result<Option<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.get(node_id).cloned())
    }

    async fn put_account(&self, account: Account) -> Result<()> {
        let mut state = self.state.write().await;
        state.accounts.insert(account.node_id.clone(), account);
        Ok(())
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        let state = self.state.read().await;
        Ok(state.accounts.values().cloned().collect())
    }

    async fn contribution_count(&self) -> Result<u64> {
        let state = self.state.read().await;
        Ok(state.contributions.len() as u64)
    }

    async fn get_contribution(&self, id: u64) -> Result<Option<Contribution>> {
        let state = self.state.read().await;
        let idx = match id.checked_sub(1) {
            Some(idx) => idx as usize,
            None => return Ok(None),
        };
        Ok(state.contributions.get(idx).cloned())
    }

    async fn append_contribution(&self, contribution: Contribution) -> Result<()> {
        let mut state = self.state.write().await;
        let expected = state.contributions.len() as u64 + 1;
        if contribution.id != expected {
            return Err(RewardsError::Storage(format!(
                "journal out of sequence: expected id {}, got {}",
                expected, contribution.id
            )));
        }
        state.contributions.push(contribution);
        Ok(())
    }

    async fn put_contribution(&self, contribution: Contribution) -> Result<()> {
        let mut state = self.state.write().await;
        let idx = contribution
            .id
            .checked_sub(1)
            .map(|i| i as usize)
            .filter(|i| *i < state.contributions.len())
            .ok_or(RewardsError::InvalidContributionId(contribution.id))?;
        state.contributions[idx] = contribution;
        Ok(())
    }

    async fn contributions_for(&self, node_id: &NodeId) -> Result<Vec<Contribution>> {
        let state = self.state.read().await;
        Ok(state
            .contributions
            .iter()
            .filter(|c| &c.node_id == node_id)
            .cloned()
            .collect())
    }

    async fn get_reputation(&self, node_id: &NodeId) -> Result<Option<ReputationRecord>> {
        let state = self.state.read().await;
        Ok(state.reputation.get(node_id).cloned())
    }

    async fn put_reputation(&self, record: ReputationRecord) -> Result<()> {
        let mut state = self.state.write().await;
        state.reputation.insert(record.node_id.clone(), record);
        Ok(())
    }

    async fn all_reputation(&self) -> Result<Vec<ReputationRecord>> {
        let state = self.state.read().await;
        Ok(state.reputation.values().cloned().collect())
    }

    async fn append_reward_transaction(&self, tx: RewardTransaction) -> Result<()> {
        let mut state = self.state.write().await;
        state.reward_transactions.push(tx);
        Ok(())
    }

    async fn reward_transactions_for(&self, node_id: &NodeId) -> Result<Vec<RewardTransaction>> {
        let state = self.state.read().await;
        Ok(state
            .reward_transactions
            .iter()
            .filter(|tx| &tx.node_id == node_id)
            .cloned()
            .collect())
    }

    async fn begin_transaction(&self) -> Result<()> {
        let state = self.state.read().await;
        let mut snapshot = self.snapshot.write().await;
        *snapshot = Some(state.clone());
        debug!(
            accounts = state.accounts.len(),
            contributions = state.contributions.len(),
            "📝 Transaction began (snapshot created)"
        );
        Ok(())
    }

    async fn commit_transaction(&self) -> Result<()> {
        let mut snapshot = self.snapshot.write().await;
        *snapshot = None;
        Ok(())
    }

    async fn rollback_transaction(&self) -> Result<()> {
        let mut snapshot = self.snapshot.write().await;
        if let Some(saved) = snapshot.take() {
            let mut state = self.state.write().await;
            *state = saved;
            debug!("❌ Transaction rolled back (snapshot restored)");
        }
        Ok(())
    }
}

const LEDGER_FILE: &str = "ledger.json";
const CONTRIBUTIONS_FILE: &str = "contributions.json";
const REPUTATION_FILE: &str = "reputation.json";
const REWARDS_FILE: &str = "rewards.json";

/// Durable backend persisting each collection as a JSON document. Documents
/// are rewritten via a temp file and rename so a crash mid-write never
/// leaves a torn collection on disk.
pub struct JsonFileStorage {
    dir: PathBuf,
    inner: MemoryStorage,
}

impl JsonFileStorage {
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;

        let state = StorageState {
            accounts: load_document(&dir.join(LEDGER_FILE)).await?,
            contributions: load_document(&dir.join(CONTRIBUTIONS_FILE)).await?,
            reputation: load_document(&dir.join(REPUTATION_FILE)).await?,
            reward_transactions: load_document(&dir.join(REWARDS_FILE)).await?,
        };

        info!(
            dir = %dir.display(),
            accounts = state.accounts.len(),
            contributions = state.contributions.len(),
            "💾 Rewards storage opened"
        );

        Ok(Self {
            dir,
            inner: MemoryStorage::from_state(state),
        })
    }

    async fn flush(&self) -> Result<()> {
        let state = self.inner.export_state().await;
        write_document(&self.dir.join(LEDGER_FILE), &state.accounts).await?;
        write_document(&self.dir.join(CONTRIBUTIONS_FILE), &state.contributions).await?;
        write_document(&self.dir.join(REPUTATION_FILE), &state.reputation).await?;
        write_document(&self.dir.join(REWARDS_FILE), &state.reward_transactions).await?;
        Ok(())
    }

    async fn flush_if_autocommit(&self) -> Result<()> {
        if self.inner.in_transaction().await {
            return Ok(());
        }
        self.flush().await
    }
}

async fn load_document<T: DeserializeOwned + Default>(path: &Path) -> Result<T> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(T::default()),
        Err(e) => Err(e.into()),
    }
}

async fn write_document<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_vec_pretty(value)?;
    let tmp = path.with_extension("json.tmp");
    tokio::fs::write(&tmp, &json).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

#[async_trait]
impl RewardsStorage for JsonFileStorage {
    async fn get_account(&self, node_id: &NodeId) -> Result<Option<Account>> {
        self.inner.get_account(node_id).await
    }

    async fn put_account(&self, account: Account) -> Result<()> {
        self.inner.put_account(account).await?;
        self.flush_if_autocommit().await
    }

    async fn all_accounts(&self) -> Result<Vec<Account>> {
        self.inner.all_accounts().await
    }

    async fn contribution_count(&self) -> Result<u64> {
        self.inner.contribution_count().await
    }

    async fn get_contribution(&self, id: u64) -> Result<Option<Contribution>> {
        self.inner.get_contribution(id).await
    }

    async fn append_contribution(&self, contribution: Contribution) -> Result<()> {
        self.inner.append_contribution(contribution).await?;
        self.flush_if_autocommit().await
    }

    async fn put_contribution(&self, contribution: Contribution) -> Result<()> {
        self.inner.put_contribution(contribution).await?;
        self.flush_if_autocommit().await
    }

    async fn contributions_for(&self, node_id: &NodeId) -> Result<Vec<Contribution>> {
        self.inner.contributions_for(node_id).await
    }

    async fn get_reputation(&self, node_id: &NodeId) -> Result<Option<ReputationRecord>> {
        self.inner.get_reputation(node_id).await
    }

    async fn put_reputation(&self, record: ReputationRecord) -> Result<()> {
        self.inner.put_reputation(record).await?;
        self.flush_if_autocommit().await
    }

    async fn all_reputation(&self) -> Result<Vec<ReputationRecord>> {
        self.inner.all_reputation().await
    }

    async fn append_reward_transaction(&self, tx: RewardTransaction) -> Result<()> {
        self.inner.append_reward_transaction(tx).await?;
        self.flush_if_autocommit().await
    }

    async fn reward_transactions_for(&self, node_id: &NodeId) -> Result<Vec<RewardTransaction>> {
        self.inner.reward_transactions_for(node_id).await
    }

    async fn begin_transaction(&self) -> Result<()> {
        self.inner.begin_transaction().await
    }

    async fn commit_transaction(&self) -> Result<()> {
        self.flush().await?;
        self.inner.commit_transaction().await
    }

    async fn rollback_transaction(&self) -> Result<()> {
        self.inner.rollback_transaction().await
    }
}
