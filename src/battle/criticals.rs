//! Critical-effect tables
//!
//! A critical roll is the sum of two six-sided dice, so mid-table entries are
//! the common ones and the table ends are rare. Every entry is fully
//! deterministic given the roll; the only randomness is the dice.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::battle::ships::{Module, ModuleStatus, ShipInstance};

/// One resolved critical effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum CriticalEffect {
    /// Every conventional module takes one step of damage
    AllModulesDamaged,
    /// The first `count` still-functional weapons take damage
    WeaponsDamaged { count: u32 },
    /// The first `count` still-functional non-weapon modules take damage
    ModulesDamaged { count: u32 },
    ModuleDamaged { module: Module },
    TroopsKilled { count: i32 },
    FiresStarted { count: u32 },
    /// Direct hull damage bypassing shields
    HullBreach { damage: i32 },
    /// Amorphous hulls shrug some hits off entirely
    Nothing,
}

/// Roll two bounded dice and sum them: 2..=12, triangular
pub fn critical_roll(rng: &mut impl Rng) -> u8 {
    rng.gen_range(1..=6u8) + rng.gen_range(1..=6u8)
}

/// Standard table for ships with conventional subsystems
pub fn standard_table(roll: u8) -> CriticalEffect {
    match roll {
        2 => CriticalEffect::AllModulesDamaged,
        3 => CriticalEffect::WeaponsDamaged { count: 2 },
        4 => CriticalEffect::ModulesDamaged { count: 2 },
        5 => CriticalEffect::ModuleDamaged {
            module: Module::Engines,
        },
        6 => CriticalEffect::ModuleDamaged {
            module: Module::Turrets,
        },
        7 => CriticalEffect::FiresStarted { count: 1 },
        8 => CriticalEffect::TroopsKilled { count: 2 },
        9 => CriticalEffect::ModuleDamaged {
            module: Module::Shields,
        },
        10 => CriticalEffect::ModuleDamaged {
            module: Module::Assault,
        },
        11 => CriticalEffect::ModuleDamaged {
            module: Module::Defense,
        },
        _ => CriticalEffect::HullBreach { damage: 2 },
    }
}

/// Short table for amorphous hulls: no subsystems to wreck, so criticals
/// either tear mass off or start fires in the coalesced body
pub fn amorphous_table(roll: u8) -> CriticalEffect {
    match roll {
        2 | 3 => CriticalEffect::HullBreach { damage: 2 },
        4..=6 => CriticalEffect::HullBreach { damage: 1 },
        7..=9 => CriticalEffect::FiresStarted { count: 1 },
        _ => CriticalEffect::Nothing,
    }
}

/// Roll and apply one critical to a ship; returns the applied effect
///
/// Does not check for resulting destruction; the caller owns the
/// hull/troops-at-zero transition to a wreck.
pub fn apply_critical(ship: &mut ShipInstance, rng: &mut impl Rng) -> CriticalEffect {
    let roll = critical_roll(rng);
    let effect = if ship.class().faction.amorphous() {
        amorphous_table(roll)
    } else {
        standard_table(roll)
    };
    apply_effect(ship, effect);
    effect
}

/// Apply a known effect (used by tests and cascading boarding criticals)
pub fn apply_effect(ship: &mut ShipInstance, effect: CriticalEffect) {
    match effect {
        CriticalEffect::AllModulesDamaged => {
            for module in Module::ALL {
                ship.modules.degrade(module);
            }
        }
        CriticalEffect::WeaponsDamaged { count } => {
            let mut remaining = count;
            for weapon in ship.weapons.iter_mut() {
                if remaining == 0 {
                    break;
                }
                if weapon.status != ModuleStatus::Destroyed {
                    weapon.status = weapon.status.degraded();
                    remaining -= 1;
                }
            }
        }
        CriticalEffect::ModulesDamaged { count } => {
            let mut remaining = count;
            for module in Module::NON_WEAPON {
                if remaining == 0 {
                    break;
                }
                let status = ship.modules.get(module);
                if status.operational() {
                    ship.modules.degrade(module);
                    remaining -= 1;
                }
            }
        }
        CriticalEffect::ModuleDamaged { module } => {
            ship.modules.degrade(module);
        }
        CriticalEffect::TroopsKilled { count } => {
            ship.troops = (ship.troops - count).max(0);
        }
        CriticalEffect::FiresStarted { count } => {
            ship.fires += count;
        }
        CriticalEffect::HullBreach { damage } => {
            ship.hull = (ship.hull - damage).max(0);
        }
        CriticalEffect::Nothing => {}
    }
}
