use thiserror::Error;

#[derive(Error, Debug)]
pub enum RewardsError {
    #[error("Invalid contribution type: {0}")]
    InvalidContributionType(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient balance for {node}: has {available:.2}, needs {needed:.2}")]
    InsufficientBalance {
        node: String,
        available: f64,
        needed: f64,
    },

    #[error("Invalid contribution id: {0}")]
    InvalidContributionId(u64),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for RewardsError {
    fn from(e: serde_json::Error) -> Self {
        Self::Serialization(e.to_string())
    }
}

impl From<std::io::Error> for RewardsError {
    fn from(e: std::io::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, RewardsError>;
