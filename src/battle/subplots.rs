//! Per-player narrative side-objectives
//!
//! Subplots are closed variants keyed by (kind, owning player); the engine
//! never holds two for the same key. They observe the battle through the
//! ordered log, each keeping its own watermark.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::state::{BattleState, LogEntry};
use crate::core::types::{ShipId, Side};

/// How many enemy ships must burn for Arsonist
const ARSONIST_TARGET: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubplotKind {
    Vendetta,
    FirstBlood,
    Bodyguard,
    BoardersAway,
    Arsonist,
}

impl SubplotKind {
    pub const ALL: [SubplotKind; 5] = [
        SubplotKind::Vendetta,
        SubplotKind::FirstBlood,
        SubplotKind::Bodyguard,
        SubplotKind::BoardersAway,
        SubplotKind::Arsonist,
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SubplotOutcome {
    Undecided,
    Won,
    Lost,
}

/// One live subplot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subplot {
    pub kind: SubplotKind,
    pub owner: Side,
    pub outcome: SubplotOutcome,
    /// Bound ship: the mark for Vendetta, the ward for Bodyguard
    pub bound: Option<ShipId>,
    /// Distinct enemy ships set alight (Arsonist progress)
    pub burned: Vec<ShipId>,
    /// Log index consumed so far
    pub seen: usize,
}

impl Subplot {
    pub fn new(kind: SubplotKind, owner: Side) -> Self {
        Self {
            kind,
            owner,
            outcome: SubplotOutcome::Undecided,
            bound: None,
            burned: Vec::new(),
            seen: 0,
        }
    }

    /// Objective text plus success flag (None while undecided)
    pub fn display_objective(&self, state: &BattleState) -> (String, Option<bool>) {
        let success = match self.outcome {
            SubplotOutcome::Undecided => None,
            SubplotOutcome::Won => Some(true),
            SubplotOutcome::Lost => Some(false),
        };
        let text = match self.kind {
            SubplotKind::Vendetta => match self.bound {
                Some(id) => {
                    let name = state
                        .ship(id)
                        .map(|s| s.class().name)
                        .or_else(|| state.wrecks.get(&id).map(|w| {
                            crate::catalog::Catalog::global().class(w.class).name
                        }))
                        .unwrap_or("the enemy flagship");
                    format!("Destroy the enemy {} before it escapes", name)
                }
                None => "Destroy the enemy flagship before it escapes".to_string(),
            },
            SubplotKind::FirstBlood => "Draw first blood".to_string(),
            SubplotKind::Bodyguard => "Keep your flagship alive".to_string(),
            SubplotKind::BoardersAway => "Overrun an enemy ship with a boarding party".to_string(),
            SubplotKind::Arsonist => format!(
                "Set {} enemy ships alight ({} so far)",
                ARSONIST_TARGET,
                self.burned.len()
            ),
        };
        (text, success)
    }

    /// Bind random targets once deployment is complete
    pub fn after_deploy_ships(&mut self, state: &BattleState, rng: &mut impl Rng) {
        match self.kind {
            SubplotKind::Vendetta => {
                self.bound = highest_tier_ship(state, self.owner.opponent(), rng);
            }
            SubplotKind::Bodyguard => {
                self.bound = highest_tier_ship(state, self.owner, rng);
            }
            _ => {}
        }
    }

    /// Consume new log entries and resolve early wins/losses
    pub fn after_state_changed(&mut self, state: &BattleState) {
        let entries = &state.log[self.seen.min(state.log.len())..];
        for entry in entries {
            if self.outcome != SubplotOutcome::Undecided {
                break;
            }
            match (self.kind, entry) {
                (SubplotKind::Vendetta, LogEntry::ShipDestroyed { ship }) => {
                    if Some(*ship) == self.bound {
                        self.outcome = SubplotOutcome::Won;
                    }
                }
                (SubplotKind::Vendetta, LogEntry::ShipEscaped { ship }) => {
                    if Some(*ship) == self.bound {
                        self.outcome = SubplotOutcome::Lost;
                    }
                }
                (SubplotKind::Bodyguard, LogEntry::ShipDestroyed { ship }) => {
                    if Some(*ship) == self.bound {
                        self.outcome = SubplotOutcome::Lost;
                    }
                }
                (SubplotKind::FirstBlood, LogEntry::Attacked { attacker, hull_damage, .. }) => {
                    if *hull_damage > 0 {
                        self.outcome = if state.owner_of(*attacker) == Some(self.owner) {
                            SubplotOutcome::Won
                        } else {
                            SubplotOutcome::Lost
                        };
                    }
                }
                (SubplotKind::BoardersAway, LogEntry::BoardingResolved { attacker, outcome, .. }) => {
                    if outcome.is_critical() && state.owner_of(*attacker) == Some(self.owner) {
                        self.outcome = SubplotOutcome::Won;
                    }
                }
                (SubplotKind::Arsonist, LogEntry::Critical { ship, by, effect }) => {
                    use crate::battle::criticals::CriticalEffect;
                    let lit = matches!(effect, CriticalEffect::FiresStarted { .. });
                    let ours = by
                        .and_then(|b| state.owner_of(b))
                        .map_or(false, |side| side == self.owner);
                    let theirs = state.owner_of(*ship) == Some(self.owner.opponent());
                    if lit && ours && theirs && !self.burned.contains(ship) {
                        self.burned.push(*ship);
                        if self.burned.len() >= ARSONIST_TARGET {
                            self.outcome = SubplotOutcome::Won;
                        }
                    }
                }
                _ => {}
            }
        }
        self.seen = state.log.len();
    }

    /// Final outcome at victory evaluation; Undecided collapses to Lost
    /// except where survival itself is the objective
    pub fn final_outcome(&self, state: &BattleState, _winner: Option<Side>) -> SubplotOutcome {
        match self.outcome {
            SubplotOutcome::Won => SubplotOutcome::Won,
            SubplotOutcome::Lost => SubplotOutcome::Lost,
            SubplotOutcome::Undecided => match self.kind {
                SubplotKind::Bodyguard => {
                    let survived = self.bound.map_or(false, |id| {
                        state.ship(id).is_some()
                            || state.wrecks.get(&id).map_or(false, |w| w.escaped)
                    });
                    if survived {
                        SubplotOutcome::Won
                    } else {
                        SubplotOutcome::Lost
                    }
                }
                _ => SubplotOutcome::Lost,
            },
        }
    }
}

/// Highest-tier ship of a side, random among ties
fn highest_tier_ship(state: &BattleState, side: Side, rng: &mut impl Rng) -> Option<ShipId> {
    let best = state
        .live_ships(side)
        .map(|s| s.class().weight_class)
        .max()?;
    let mut candidates: Vec<ShipId> = state
        .live_ships(side)
        .filter(|s| s.class().weight_class == best)
        .map(|s| s.id)
        .collect();
    candidates.sort();
    candidates.choose(rng).copied()
}

/// Draw each side's subplots at battle start: distinct kinds per player
pub fn create_subplots(size_count: usize, rng: &mut impl Rng) -> Vec<Subplot> {
    let mut subplots = Vec::new();
    for side in Side::ALL {
        let mut kinds = SubplotKind::ALL.to_vec();
        kinds.shuffle(rng);
        for kind in kinds.into_iter().take(size_count) {
            subplots.push(Subplot::new(kind, side));
        }
    }
    subplots
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ships::ShipInstance;
    use crate::battle::state::{BattleSetup, BattleSize, PerSide};
    use crate::catalog::Catalog;
    use crate::core::types::Player;
    use crate::geom::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn state_with_fleets() -> BattleState {
        let catalog = Catalog::global();
        let vigil = catalog.by_name("Vigil").unwrap().id;
        let sovereign = catalog.by_name("Sovereign").unwrap().id;
        let setup = BattleSetup::new(
            BattleSize::Skirmish,
            PerSide::new(vec![vigil], vec![vigil, sovereign]),
        );
        let mut state = BattleState::new(
            setup,
            Player::new("a", Side::Crimson),
            Player::new("b", Side::Cobalt),
        );
        for (side, class) in [
            (Side::Crimson, vigil),
            (Side::Cobalt, vigil),
            (Side::Cobalt, sovereign),
        ] {
            let ship = ShipInstance::new(class, side, Vec2::new(100.0, 100.0), 0.0);
            state.ships.insert(ship.id, ship);
        }
        state
    }

    #[test]
    fn test_vendetta_binds_highest_tier_enemy() {
        let state = state_with_fleets();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut subplot = Subplot::new(SubplotKind::Vendetta, Side::Crimson);
        subplot.after_deploy_ships(&state, &mut rng);
        let bound = subplot.bound.expect("bound a target");
        let target = state.ship(bound).unwrap();
        assert_eq!(target.owner, Side::Cobalt);
        assert_eq!(target.class().name, "Sovereign");
    }

    #[test]
    fn test_vendetta_won_on_destruction() {
        let mut state = state_with_fleets();
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let mut subplot = Subplot::new(SubplotKind::Vendetta, Side::Crimson);
        subplot.after_deploy_ships(&state, &mut rng);
        let target = subplot.bound.unwrap();

        state.wreck_ship(target, false);
        subplot.after_state_changed(&state);
        assert_eq!(subplot.outcome, SubplotOutcome::Won);
    }

    #[test]
    fn test_vendetta_lost_on_escape() {
        let mut state = state_with_fleets();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut subplot = Subplot::new(SubplotKind::Vendetta, Side::Crimson);
        subplot.after_deploy_ships(&state, &mut rng);
        let target = subplot.bound.unwrap();

        state.wreck_ship(target, true);
        subplot.after_state_changed(&state);
        assert_eq!(subplot.outcome, SubplotOutcome::Lost);
        // Final evaluation preserves the loss
        assert_eq!(
            subplot.final_outcome(&state, Some(Side::Crimson)),
            SubplotOutcome::Lost
        );
    }

    #[test]
    fn test_first_blood_goes_to_first_hull_damage() {
        let mut state = state_with_fleets();
        let crimson_ship = state.live_ships(Side::Crimson).next().unwrap().id;
        let cobalt_ship = state.live_ships(Side::Cobalt).next().unwrap().id;

        let mut ours = Subplot::new(SubplotKind::FirstBlood, Side::Crimson);
        let mut theirs = Subplot::new(SubplotKind::FirstBlood, Side::Cobalt);

        // Shield-only damage decides nothing
        state.push_log(LogEntry::Attacked {
            attacker: cobalt_ship,
            target: crimson_ship,
            weapon: crate::catalog::WeaponKind::Cannon,
            shield_damage: 1,
            hull_damage: 0,
        });
        ours.after_state_changed(&state);
        theirs.after_state_changed(&state);
        assert_eq!(ours.outcome, SubplotOutcome::Undecided);

        state.push_log(LogEntry::Attacked {
            attacker: crimson_ship,
            target: cobalt_ship,
            weapon: crate::catalog::WeaponKind::Cannon,
            shield_damage: 0,
            hull_damage: 1,
        });
        ours.after_state_changed(&state);
        theirs.after_state_changed(&state);
        assert_eq!(ours.outcome, SubplotOutcome::Won);
        assert_eq!(theirs.outcome, SubplotOutcome::Lost);
    }

    #[test]
    fn test_bodyguard_final_outcome() {
        let mut state = state_with_fleets();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let mut subplot = Subplot::new(SubplotKind::Bodyguard, Side::Cobalt);
        subplot.after_deploy_ships(&state, &mut rng);
        let ward = subplot.bound.unwrap();

        // Ward alive at the end: won
        assert_eq!(
            subplot.final_outcome(&state, Some(Side::Crimson)),
            SubplotOutcome::Won
        );

        state.wreck_ship(ward, false);
        subplot.after_state_changed(&state);
        assert_eq!(subplot.outcome, SubplotOutcome::Lost);
    }

    #[test]
    fn test_arsonist_counts_distinct_ships() {
        use crate::battle::criticals::CriticalEffect;
        let mut state = state_with_fleets();
        let arsonist_ship = state.live_ships(Side::Crimson).next().unwrap().id;
        let victim = state.live_ships(Side::Cobalt).next().unwrap().id;
        let mut subplot = Subplot::new(SubplotKind::Arsonist, Side::Crimson);

        // The same victim burning twice counts once
        for _ in 0..2 {
            state.push_log(LogEntry::Critical {
                ship: victim,
                by: Some(arsonist_ship),
                effect: CriticalEffect::FiresStarted { count: 1 },
            });
        }
        subplot.after_state_changed(&state);
        assert_eq!(subplot.burned.len(), 1);
        assert_eq!(subplot.outcome, SubplotOutcome::Undecided);
        assert_eq!(
            subplot.final_outcome(&state, None),
            SubplotOutcome::Lost
        );
    }

    #[test]
    fn test_create_subplots_unique_per_player() {
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let subplots = create_subplots(3, &mut rng);
        assert_eq!(subplots.len(), 6);
        for side in Side::ALL {
            let kinds: Vec<SubplotKind> = subplots
                .iter()
                .filter(|s| s.owner == side)
                .map(|s| s.kind)
                .collect();
            let mut deduped = kinds.clone();
            deduped.sort_by_key(|k| *k as u8);
            deduped.dedup();
            assert_eq!(kinds.len(), deduped.len(), "duplicate kind for {:?}", side);
        }
    }
}
