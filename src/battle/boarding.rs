//! Boarding resolution
//!
//! Assault and defense scores are sums of fixed additive modifiers; the only
//! randomness is the two bounded dice each side adds on top. Given the rolled
//! totals the outcome branch is exactly determined.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::ships::{ModuleStatus, ShipInstance};
use crate::catalog::{Faction, WeightClass};

/// The three outcome branches of a boarding action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum BoardingOutcome {
    /// Defender overwhelmed: two cascading critical effects
    CascadingCriticals,
    /// Defender overrun: one critical effect
    SingleCritical,
    /// Boarders thrown back with losses
    Repelled { attacker_losses: i32 },
}

impl BoardingOutcome {
    pub fn is_critical(self) -> bool {
        matches!(
            self,
            BoardingOutcome::CascadingCriticals | BoardingOutcome::SingleCritical
        )
    }
}

/// Scores and rolled totals of one boarding action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardingResolution {
    pub attacker_total: i32,
    pub defender_total: i32,
    pub outcome: BoardingOutcome,
}

fn faction_assault(faction: Faction) -> i32 {
    match faction {
        Faction::Dominion => 1,
        Faction::Celerid => 2, // raider doctrine
        Faction::Veilborn => 0,
        Faction::Coalescence => 0,
    }
}

fn faction_defense(faction: Faction) -> i32 {
    match faction {
        Faction::Dominion => 1,
        Faction::Celerid => 0,
        Faction::Veilborn => 1,
        Faction::Coalescence => 2, // nothing to hold on to
    }
}

fn weight_modifier(class: WeightClass) -> i32 {
    match class {
        WeightClass::Escort => 0,
        WeightClass::Destroyer | WeightClass::Cruiser => 1,
        WeightClass::Battleship | WeightClass::Dreadnought => 2,
    }
}

fn troop_modifier(ship: &ShipInstance) -> i32 {
    let max = ship.class().max_troops();
    if max == 0 {
        return 0;
    }
    let fraction = ship.troops as f32 / max as f32;
    if fraction >= 0.75 {
        2
    } else if fraction >= 0.5 {
        1
    } else if fraction >= 0.25 {
        0
    } else {
        -1
    }
}

fn hull_modifier(ship: &ShipInstance) -> i32 {
    let fraction = ship.hull as f32 / ship.class().max_hull() as f32;
    if fraction >= 0.75 {
        1
    } else if fraction >= 0.25 {
        0
    } else {
        -1
    }
}

fn turret_modifier(status: ModuleStatus) -> i32 {
    match status {
        ModuleStatus::Intact => 1,
        ModuleStatus::Damaged | ModuleStatus::Absent => 0,
        ModuleStatus::Destroyed => -1,
    }
}

/// Shield fraction of the current allocation, 0 when no shield power
fn shield_fraction(ship: &ShipInstance) -> f32 {
    if ship.power.shields == 0 {
        0.0
    } else {
        ship.shield as f32 / ship.power.shields as f32
    }
}

/// Attackers punch through their own shield envelope on the way out
fn shield_assault_modifier(ship: &ShipInstance) -> i32 {
    if shield_fraction(ship) >= 0.5 {
        1
    } else {
        0
    }
}

/// Defenders behind strong shields fight boarders at leisure
fn shield_defense_modifier(ship: &ShipInstance) -> i32 {
    let fraction = shield_fraction(ship);
    if fraction >= 0.75 {
        2
    } else if fraction >= 0.25 {
        1
    } else {
        0
    }
}

fn module_modifier(status: ModuleStatus) -> i32 {
    match status {
        ModuleStatus::Intact => 2,
        ModuleStatus::Damaged => 1,
        ModuleStatus::Destroyed | ModuleStatus::Absent => 0,
    }
}

/// Fixed assault score of the attacking ship
pub fn assault_score(attacker: &ShipInstance) -> i32 {
    let class = attacker.class();
    faction_assault(class.faction)
        + weight_modifier(class.weight_class)
        + troop_modifier(attacker)
        + hull_modifier(attacker)
        + turret_modifier(attacker.modules.turrets)
        + shield_assault_modifier(attacker)
        + module_modifier(attacker.modules.assault)
}

/// Fixed defense score of the defending ship
pub fn defense_score(defender: &ShipInstance) -> i32 {
    let class = defender.class();
    faction_defense(class.faction)
        + weight_modifier(class.weight_class)
        + troop_modifier(defender)
        + hull_modifier(defender)
        + turret_modifier(defender.modules.turrets)
        + shield_defense_modifier(defender)
        + module_modifier(defender.modules.defense)
}

/// Classify the outcome from two rolled totals
pub fn classify(attacker_total: i32, defender_total: i32, rng: &mut impl Rng) -> BoardingOutcome {
    if defender_total * 2 < attacker_total {
        BoardingOutcome::CascadingCriticals
    } else if defender_total <= attacker_total {
        BoardingOutcome::SingleCritical
    } else {
        let cap = (attacker_total / 2).max(1);
        BoardingOutcome::Repelled {
            attacker_losses: rng.gen_range(1..=cap),
        }
    }
}

/// Resolve one boarding action: scores, dice, outcome
pub fn resolve_boarding(
    attacker: &ShipInstance,
    defender: &ShipInstance,
    rng: &mut impl Rng,
) -> BoardingResolution {
    let attacker_total =
        assault_score(attacker) + rng.gen_range(0..=4) + rng.gen_range(0..=4);
    let defender_total =
        defense_score(defender) + rng.gen_range(0..=4) + rng.gen_range(0..=4);
    let outcome = classify(attacker_total, defender_total, rng);
    BoardingResolution {
        attacker_total,
        defender_total,
        outcome,
    }
}
