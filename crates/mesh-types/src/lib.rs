pub mod contribution;
pub mod error;
pub mod id;

pub use contribution::{ContributionType, RewardTier};
pub use error::{Result, RewardsError};
pub use id::NodeId;
