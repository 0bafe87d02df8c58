use std::collections::HashSet;
use std::sync::Arc;

use mesh_rewards::{
    ContributionType, JsonFileStorage, MemoryStorage, NodeId, RewardTier, RewardsEngine,
    TokenAmount,
};

fn engine() -> RewardsEngine {
    RewardsEngine::new(Arc::new(MemoryStorage::new()))
}

#[tokio::test]
async fn model_training_contribution_pays_28_and_reaches_gold() {
    let engine = engine();
    let n1 = NodeId::new("n1");

    let receipt = engine
        .record_contribution(&n1, ContributionType::ModelTraining, "h1", 0.8, None)
        .await
        .unwrap();

    assert_eq!(receipt.contribution_id, 1);
    assert_eq!(receipt.reward_amount, TokenAmount::from_tokens(28.0));
    assert_eq!(receipt.new_balance, TokenAmount::from_tokens(28.0));
    assert!(!receipt.transaction_hash.is_empty());

    assert_eq!(
        engine.get_balance(&n1).await.unwrap(),
        TokenAmount::from_tokens(28.0)
    );

    let reputation = engine.get_reputation(&n1).await.unwrap().unwrap();
    assert!((reputation.average_quality - 0.8).abs() < 1e-9);
    assert_eq!(reputation.contribution_count, 1);
    assert_eq!(reputation.tier, RewardTier::Gold);

    let history = engine.get_contribution_history(&n1, 20).await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].kind, ContributionType::ModelTraining);
}

#[tokio::test]
async fn two_contributions_average_to_silver() {
    let engine = engine();
    let n2 = NodeId::new("n2");

    engine
        .record_contribution(&n2, ContributionType::DataContribution, "a", 0.5, None)
        .await
        .unwrap();
    engine
        .record_contribution(&n2, ContributionType::DataContribution, "b", 0.9, None)
        .await
        .unwrap();

    let reputation = engine.get_reputation(&n2).await.unwrap().unwrap();
    assert!((reputation.average_quality - 0.7).abs() < 1e-9);
    assert_eq!(reputation.tier, RewardTier::Silver);
}

#[tokio::test]
async fn successful_validation_pays_both_sides() {
    let engine = engine();
    let n1 = NodeId::new("n1");
    let validator = NodeId::new("v1");

    let receipt = engine
        .record_contribution(&n1, ContributionType::ModelTraining, "h1", 0.8, None)
        .await
        .unwrap();

    assert!(
        engine
            .validate_contribution(receipt.contribution_id, &validator, true, "checks out")
            .await
    );

    // Contributor: 28.0 + 2.8 bonus.
    assert_eq!(
        engine.get_balance(&n1).await.unwrap(),
        TokenAmount::from_tokens(30.8)
    );
    // Validator: flat 2.0 + 15.75 for the recorded validation contribution.
    assert_eq!(
        engine.get_balance(&validator).await.unwrap(),
        TokenAmount::from_tokens(17.75)
    );

    let history = engine.get_contribution_history(&n1, 20).await.unwrap();
    assert!(history[0].verified);

    // The validator's side shows up as a first-class contribution.
    let validator_history = engine.get_contribution_history(&validator, 20).await.unwrap();
    assert_eq!(validator_history.len(), 1);
    assert_eq!(validator_history[0].kind, ContributionType::Validation);

    let validator_reputation = engine.get_reputation(&validator).await.unwrap().unwrap();
    assert!((validator_reputation.average_quality - 0.8).abs() < 1e-9);
}

#[tokio::test]
async fn rejected_validation_halves_the_reward() {
    let engine = engine();
    let n1 = NodeId::new("n1");

    let receipt = engine
        .record_contribution(&n1, ContributionType::ModelTraining, "h1", 0.8, None)
        .await
        .unwrap();

    assert!(
        engine
            .validate_contribution(receipt.contribution_id, &NodeId::new("v1"), false, "bogus")
            .await
    );

    assert_eq!(
        engine.get_balance(&n1).await.unwrap(),
        TokenAmount::from_tokens(14.0)
    );
    let history = engine.get_contribution_history(&n1, 20).await.unwrap();
    assert!(!history[0].verified);
}

#[tokio::test]
async fn validation_of_unknown_id_returns_false_without_side_effects() {
    let engine = engine();
    let validator = NodeId::new("v1");

    assert!(!engine.validate_contribution(42, &validator, true, "").await);
    assert_eq!(engine.get_balance(&validator).await.unwrap(), TokenAmount::ZERO);
    assert_eq!(engine.get_network_stats().await.unwrap().total_accounts, 0);
}

#[tokio::test]
async fn transfer_reports_boolean_outcome() {
    let engine = engine();
    let a = NodeId::new("a");
    let b = NodeId::new("b");

    engine
        .record_contribution(&a, ContributionType::KnowledgeExtraction, "h", 1.0, None)
        .await
        .unwrap(); // 67.5 tokens

    assert!(engine.transfer_tokens(&a, &b, TokenAmount::from_tokens(17.5)).await);
    assert_eq!(
        engine.get_balance(&a).await.unwrap(),
        TokenAmount::from_tokens(50.0)
    );
    assert_eq!(
        engine.get_balance(&b).await.unwrap(),
        TokenAmount::from_tokens(17.5)
    );

    // Insufficient balance: no mutation, just `false`.
    assert!(!engine.transfer_tokens(&a, &b, TokenAmount::from_tokens(50.01)).await);
    assert_eq!(
        engine.get_balance(&a).await.unwrap(),
        TokenAmount::from_tokens(50.0)
    );

    // Unknown source: same.
    assert!(
        !engine
            .transfer_tokens(&NodeId::new("ghost"), &b, TokenAmount::from_tokens(1.0))
            .await
    );
}

#[tokio::test]
async fn leaderboard_ranks_by_balance() {
    let engine = engine();

    for (node, quality) in [("low", 0.0), ("high", 1.0), ("mid", 0.5)] {
        engine
            .record_contribution(
                &NodeId::new(node),
                ContributionType::ModelTraining,
                "h",
                quality,
                None,
            )
            .await
            .unwrap();
    }

    let board = engine.get_leaderboard(2).await.unwrap();
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].node_id, NodeId::new("high"));
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].balance, TokenAmount::from_tokens(30.0));
    assert_eq!(board[1].node_id, NodeId::new("mid"));
}

#[tokio::test]
async fn network_stats_count_contributions_and_activity() {
    let engine = engine();

    for i in 0..3 {
        engine
            .record_contribution(
                &NodeId::new(format!("n{i}")),
                ContributionType::DataContribution,
                "h",
                0.5,
                None,
            )
            .await
            .unwrap();
    }

    let stats = engine.get_network_stats().await.unwrap();
    assert_eq!(stats.total_accounts, 3);
    assert_eq!(stats.total_contributions, 3);
    // 5.0 * 1.0 * 1.25 = 6.25 each
    assert_eq!(stats.total_balance, TokenAmount::from_tokens(18.75));
    assert!((stats.average_balance - 6.25).abs() < 1e-9);
    assert_eq!(stats.active_nodes_24h, 3);
    assert_eq!(stats.active_nodes_7d, 3);
    assert_eq!(stats.tier_distribution[&RewardTier::Bronze], 3);
}

#[tokio::test]
async fn state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let n1 = NodeId::new("n1");

    {
        let storage = JsonFileStorage::open(dir.path()).await.unwrap();
        let engine = RewardsEngine::new(Arc::new(storage));
        engine
            .record_contribution(&n1, ContributionType::ModelTraining, "h1", 0.8, None)
            .await
            .unwrap();
    }

    let storage = JsonFileStorage::open(dir.path()).await.unwrap();
    let engine = RewardsEngine::new(Arc::new(storage));

    assert_eq!(
        engine.get_balance(&n1).await.unwrap(),
        TokenAmount::from_tokens(28.0)
    );
    let reputation = engine.get_reputation(&n1).await.unwrap().unwrap();
    assert_eq!(reputation.tier, RewardTier::Gold);

    // The journal keeps numbering where it left off.
    let receipt = engine
        .record_contribution(&n1, ContributionType::DataContribution, "h2", 0.5, None)
        .await
        .unwrap();
    assert_eq!(receipt.contribution_id, 2);
}

#[tokio::test(flavor = "multi_thread")]
async fn concurrent_recording_loses_nothing() {
    let engine = Arc::new(engine());
    let mut handles = Vec::new();

    for i in 0..10 {
        let engine = engine.clone();
        handles.push(tokio::spawn(async move {
            engine
                .record_contribution(
                    &NodeId::new(format!("n{i}")),
                    ContributionType::DataContribution,
                    &format!("h{i}"),
                    0.5,
                    None,
                )
                .await
                .unwrap()
        }));
    }

    let mut ids = HashSet::new();
    for handle in handles {
        let receipt = handle.await.unwrap();
        ids.insert(receipt.contribution_id);
    }

    assert_eq!(ids.len(), 10);
    assert_eq!(*ids.iter().max().unwrap(), 10);

    let stats = engine.get_network_stats().await.unwrap();
    assert_eq!(stats.total_accounts, 10);
    assert_eq!(stats.total_contributions, 10);
}
