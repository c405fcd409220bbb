//! Self-play trial runner
//!
//! Runs many AI-vs-AI battles concurrently to tune personalities. The whole
//! batch lives under one wall-clock budget (near-linear in the trial count
//! with a small quadratic tail); trials still running when the budget
//! expires are cancelled and contribute no result.

use std::time::Duration;

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tokio::sync::broadcast;
use tokio::task::JoinSet;

use crate::battle::ai::{AiAgent, Instincts};
use crate::battle::protocol::Event;
use crate::battle::session::spawn_session;
use crate::battle::state::{BattleSetup, BattleSize, BattleState, PerSide};
use crate::catalog::{Catalog, Faction, ShipClassId};
use crate::core::config::EngineConfig;
use crate::core::types::{Player, Side};

/// Outcome tallies for one batch of trials
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrialReport {
    pub requested: usize,
    pub completed: usize,
    pub crimson_wins: usize,
    pub cobalt_wins: usize,
    pub draws: usize,
    pub cancelled: usize,
}

/// A random faction fleet worth roughly the battle budget
fn random_fleet(rng: &mut ChaCha8Rng, budget: i32) -> Vec<ShipClassId> {
    let catalog = Catalog::global();
    let faction = *Faction::ALL.as_slice().choose(rng).expect("factions exist");
    let pool: Vec<&crate::catalog::ShipClass> = catalog.classes_for(faction).collect();
    let mut fleet = Vec::new();
    let mut spent = 0;
    while spent < budget {
        let class = pool.choose(rng).expect("faction has classes");
        fleet.push(class.id);
        spent += class.point_cost();
    }
    fleet
}

/// Build a fresh random battle for one trial
pub fn random_battle(seed: u64) -> BattleState {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let size = BattleSize::Engagement;
    let budget = size.default_budget();
    let fleets = PerSide::new(
        random_fleet(&mut rng, budget),
        random_fleet(&mut rng, budget),
    );
    BattleState::new(
        BattleSetup::new(size, fleets),
        Player::new("Crimson Command", Side::Crimson),
        Player::new("Cobalt Command", Side::Cobalt),
    )
}

/// Run one AI-vs-AI battle to its terminal event
pub async fn run_one(config: EngineConfig, seed: u64) -> Option<Option<Side>> {
    let state = random_battle(seed);
    let handle = spawn_session(state, config.clone(), seed);
    let mut events = handle.subscribe();

    let mut agent_seeds = ChaCha8Rng::seed_from_u64(seed ^ 0xA1A1);
    for side in Side::ALL {
        let instincts = Instincts::new(agent_seeds.gen());
        let agent = AiAgent::new(side, instincts, agent_seeds.gen());
        let handle = handle.clone();
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(error) = agent.run(handle, config).await {
                tracing::debug!(?side, %error, "trial agent exited with error");
            }
        });
    }

    loop {
        match events.recv().await {
            Ok(event) => {
                if let Event::GameEnd { winner, .. } = &*event.event {
                    return Some(*winner);
                }
            }
            Err(broadcast::error::RecvError::Lagged(_)) => continue,
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

/// Run a batch of self-play trials under the configured wall-clock budget
pub async fn run_trials(config: EngineConfig, trials: usize, seed: u64) -> TrialReport {
    let mut report = TrialReport {
        requested: trials,
        ..TrialReport::default()
    };
    if trials == 0 {
        return report;
    }
    let budget = Duration::from_millis(config.trial_budget_ms(trials as u64));
    tracing::info!(trials, ?budget, "starting self-play batch");

    let mut set: JoinSet<Option<Option<Side>>> = JoinSet::new();
    for i in 0..trials {
        let config = config.clone();
        let trial_seed = seed.wrapping_add(i as u64 * 7919);
        set.spawn(async move { run_one(config, trial_seed).await });
    }

    let drained = tokio::time::timeout(budget, async {
        while let Some(joined) = set.join_next().await {
            match joined {
                Ok(Some(winner)) => {
                    report.completed += 1;
                    match winner {
                        Some(Side::Crimson) => report.crimson_wins += 1,
                        Some(Side::Cobalt) => report.cobalt_wins += 1,
                        None => report.draws += 1,
                    }
                }
                Ok(None) | Err(_) => report.cancelled += 1,
            }
        }
    })
    .await;

    if drained.is_err() {
        // Budget exhausted: cancelled trials contribute nothing
        set.abort_all();
        report.cancelled = report.requested - report.completed;
        tracing::warn!(
            completed = report.completed,
            cancelled = report.cancelled,
            "trial budget exhausted"
        );
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_fleet_meets_budget() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let fleet = random_fleet(&mut rng, 20);
        let catalog = Catalog::global();
        let cost: i32 = fleet.iter().map(|&id| catalog.class(id).point_cost()).sum();
        assert!(cost >= 20);
        // Single-faction fleet
        let faction = catalog.class(fleet[0]).faction;
        assert!(fleet.iter().all(|&id| catalog.class(id).faction == faction));
    }

    #[test]
    fn test_random_battle_reproducible() {
        let a = random_battle(77);
        let b = random_battle(77);
        assert_eq!(a.setup.fleets, b.setup.fleets);
    }

    #[tokio::test]
    async fn test_zero_trials_short_circuits() {
        let report = run_trials(EngineConfig::default(), 0, 1).await;
        assert_eq!(report.requested, 0);
        assert_eq!(report.completed, 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_single_trial_reaches_a_verdict() {
        let mut config = EngineConfig::default();
        config.rejection_wait_ms = 50;
        let report = run_trials(config, 1, 42).await;
        assert_eq!(report.requested, 1);
        assert_eq!(report.completed + report.cancelled, 1);
        if report.completed == 1 {
            assert_eq!(
                report.crimson_wins + report.cobalt_wins + report.draws,
                1
            );
        }
    }
}
