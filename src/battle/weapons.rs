//! Weapon and damage resolution
//!
//! Pipeline order for every damaging hit: relativistic-armor ignore check
//! first (independent of weapon type, short-circuits everything), then
//! shields unless the ability bypasses them, overflow to hull, and a critical
//! roll once non-zero hull damage lands. Hull or crew reaching zero converts
//! the instance to a wreck.

use rand::Rng;

use crate::battle::constants::{
    BOMBING_CRIT_CAP, BOMBING_CRIT_DIVISOR, BOMBING_SATURATION, LANCE_RESIDUAL_CHARGE,
    MEGA_CANNON_BLAST_RADIUS, MEGA_CANNON_DAMAGE, RELATIVISTIC_ARMOR_CAP,
    RELATIVISTIC_ARMOR_SCALE, TURRET_DEFENSE_DAMAGED, TURRET_DEFENSE_INTACT,
    WING_ATTRITION_RATE,
};
use crate::battle::criticals::{apply_critical, apply_effect, critical_roll};
use crate::battle::ships::{ModuleStatus, ShipInstance};
use crate::battle::state::{BattleState, LogEntry};
use crate::catalog::WeaponKind;
use crate::core::types::ShipId;
use crate::geom::Vec2;

/// Chance of a critical per point of hull damage from conventional weapons
const CRIT_CHANCE_PER_HULL: f32 = 0.15;
const CRIT_CHANCE_CAP: f32 = 0.75;

/// Velocity-dependent chance for relativistic armor to ignore a hit outright
pub fn relativistic_ignore(target: &ShipInstance, rng: &mut impl Rng) -> bool {
    if !target.class().faction.has_relativistic_armor() {
        return false;
    }
    let speed_fraction = target.velocity.length() / target.stats().max_speed;
    let chance = (RELATIVISTIC_ARMOR_SCALE * speed_fraction).min(RELATIVISTIC_ARMOR_CAP);
    chance > 0.0 && rng.gen::<f32>() < chance
}

/// Number of independent hits out of `shots` at probability `p`
fn count_hits(shots: u32, p: f32, rng: &mut impl Rng) -> u32 {
    let p = p.clamp(0.0, 1.0);
    (0..shots).filter(|_| rng.gen::<f32>() < p).count() as u32
}

/// Destroy a ship if its hull or crew is gone
pub fn check_ship_death(state: &mut BattleState, id: ShipId) {
    let dead = match state.ship(id) {
        Some(ship) => {
            ship.hull <= 0 || (ship.class().max_troops() > 0 && ship.troops <= 0)
        }
        None => false,
    };
    if dead {
        state.wreck_ship(id, false);
    }
}

/// Apply damage with the full pipeline: armor ignore, shields, hull, critical
///
/// Returns false when the hit was ignored outright.
fn deliver_damage(
    state: &mut BattleState,
    attacker: ShipId,
    target: ShipId,
    weapon: WeaponKind,
    damage: i32,
    ignore_shields: bool,
    rng: &mut impl Rng,
) -> bool {
    {
        let Some(target_ship) = state.ship(target) else {
            return false;
        };
        if relativistic_ignore(target_ship, rng) {
            state.push_log(LogEntry::DamageIgnored { target });
            return false;
        }
    }
    let impact = state
        .ship_mut(target)
        .expect("target checked above")
        .impact(damage, ignore_shields);
    if impact.shield_damage == 0 && impact.hull_damage == 0 {
        state.push_log(LogEntry::AttackFailed {
            attacker,
            target,
            weapon,
        });
        return true;
    }
    state.push_log(LogEntry::Attacked {
        attacker,
        target,
        weapon,
        shield_damage: impact.shield_damage,
        hull_damage: impact.hull_damage,
    });
    if impact.hull_damage > 0 {
        let chance = (impact.hull_damage as f32 * CRIT_CHANCE_PER_HULL).min(CRIT_CHANCE_CAP);
        if rng.gen::<f32>() < chance {
            if let Some(ship) = state.ship_mut(target) {
                let effect = apply_critical(ship, rng);
                state.push_log(LogEntry::Critical {
                    ship: target,
                    by: Some(attacker),
                    effect,
                });
            }
        }
    }
    check_ship_death(state, target);
    true
}

/// Fire a ship-targeted weapon (everything except the mega-cannon)
///
/// Legality (phase, initiative, pick) has already been validated; this only
/// resolves the outcome. Hangar mounts commit their wing instead of dealing
/// damage.
pub fn fire_at_ship(
    state: &mut BattleState,
    attacker: ShipId,
    index: usize,
    target: ShipId,
    rng: &mut impl Rng,
) {
    let (kind, shots, accuracy, distance, target_radius) = {
        let attacker_ship = state.ship(attacker).expect("attacker exists");
        let target_ship = state.ship(target).expect("target exists");
        let mount = &attacker_ship.class().mounts[index];
        (
            mount.kind,
            attacker_ship.effective_shots(index),
            attacker_ship.class().cannon_accuracy,
            attacker_ship.position.distance(&target_ship.position),
            target_ship.stats().base_hull_radius,
        )
    };

    spend_weapon(state, attacker, index);

    match kind {
        WeaponKind::Cannon => {
            let p = (target_radius / distance.max(1e-3)).sqrt() * accuracy;
            let hits = count_hits(shots, p, rng);
            if hits == 0 {
                state.push_log(LogEntry::AttackFailed {
                    attacker,
                    target,
                    weapon: kind,
                });
            } else {
                deliver_damage(state, attacker, target, kind, hits as i32, false, rng);
            }
        }
        WeaponKind::Lance => {
            let charge = {
                let ship = state.ship_mut(attacker).expect("attacker exists");
                let weapon = &mut ship.weapons[index];
                let charge = weapon.charge;
                weapon.charge = LANCE_RESIDUAL_CHARGE;
                charge
            };
            let p = 1.0 - (-charge).exp();
            let hits = count_hits(shots, p, rng);
            if hits == 0 {
                state.push_log(LogEntry::AttackFailed {
                    attacker,
                    target,
                    weapon: kind,
                });
            } else {
                deliver_damage(state, attacker, target, kind, hits as i32, false, rng);
            }
        }
        WeaponKind::Torpedo => {
            let shielded = state.ship(target).map_or(false, |s| s.shield > 0);
            if shielded {
                if rng.gen::<bool>() {
                    deliver_damage(state, attacker, target, kind, 1, false, rng);
                } else {
                    state.push_log(LogEntry::AttackFailed {
                        attacker,
                        target,
                        weapon: kind,
                    });
                }
            } else {
                deliver_damage(state, attacker, target, kind, 2, false, rng);
            }
        }
        WeaponKind::RevelationGun => {
            // Instant destruction, subject only to the armor ignore check
            let ignored = state
                .ship(target)
                .map_or(true, |t| relativistic_ignore(t, rng));
            if ignored {
                state.push_log(LogEntry::DamageIgnored { target });
            } else {
                let hull = state.ship(target).map_or(0, |t| t.hull);
                state.push_log(LogEntry::Attacked {
                    attacker,
                    target,
                    weapon: kind,
                    shield_damage: 0,
                    hull_damage: hull,
                });
                state.wreck_ship(target, false);
            }
        }
        WeaponKind::EmpAntenna => {
            if let Some(ship) = state.ship_mut(target) {
                ship.weapon_power = rng.gen_range(0..=ship.weapon_power.max(0));
                ship.shield = rng.gen_range(0..=ship.shield.max(0));
            }
            state.push_log(LogEntry::PowerScrambled { ship: target });
        }
        WeaponKind::FighterHangar | WeaponKind::BomberHangar => {
            if let Some(ship) = state.ship_mut(attacker) {
                if let Some(wing) = ship.weapons[index].wing.as_mut() {
                    wing.deployed_against = Some(target);
                }
            }
        }
        WeaponKind::MegaCannon => {
            // Area weapon; routed through fire_area by the caller
            debug_assert!(false, "mega-cannon takes a location pick");
        }
    }
}

/// Fire the mega-cannon at a picked location
///
/// Everything inside the blast radius takes an independent 3-7 damage roll,
/// friend and foe alike. Ships are processed in id order so the outcome does
/// not depend on map iteration.
pub fn fire_area(
    state: &mut BattleState,
    attacker: ShipId,
    index: usize,
    location: Vec2,
    rng: &mut impl Rng,
) {
    spend_weapon(state, attacker, index);
    let mut victims: Vec<ShipId> = state
        .ships
        .values()
        .filter(|s| s.position.distance(&location) <= MEGA_CANNON_BLAST_RADIUS)
        .map(|s| s.id)
        .collect();
    victims.sort();
    for victim in victims {
        let damage = rng.gen_range(MEGA_CANNON_DAMAGE.0..=MEGA_CANNON_DAMAGE.1);
        deliver_damage(
            state,
            attacker,
            victim,
            WeaponKind::MegaCannon,
            damage,
            false,
            rng,
        );
    }
}

fn spend_weapon(state: &mut BattleState, attacker: ShipId, index: usize) {
    if let Some(ship) = state.ship_mut(attacker) {
        let weapon = &mut ship.weapons[index];
        weapon.used = true;
        if let Some(shots) = weapon.shots_left.as_mut() {
            *shots = shots.saturating_sub(1);
        }
        ship.weapon_power = (ship.weapon_power - 1).max(0);
    }
}

/// Strike-craft snapshot for one target ship
#[derive(Debug, Clone, Copy)]
struct BombingTally {
    target: ShipId,
    bombers: f32,
    fighters: f32,
    turrets: f32,
}

impl BombingTally {
    fn differential(&self) -> f32 {
        self.bombers - (self.fighters + self.turrets)
    }
}

/// End-of-attack strike-craft resolution
///
/// All deltas are computed from the pre-resolution snapshot before any are
/// applied, so the result is independent of ship iteration order.
pub fn resolve_strike_craft(state: &mut BattleState, rng: &mut impl Rng) {
    let mut tallies: Vec<BombingTally> = Vec::new();
    let mut target_ids: Vec<ShipId> = state
        .ships
        .values()
        .flat_map(|s| s.weapons.iter())
        .filter_map(|w| w.wing.as_ref().and_then(|wing| wing.deployed_against))
        .collect();
    target_ids.sort();
    target_ids.dedup();

    for target in target_ids {
        let Some(target_ship) = state.ship(target) else {
            continue;
        };
        let mut bombers = 0.0;
        let mut fighters = 0.0;
        for ship in state.ships.values() {
            for (index, weapon) in ship.weapons.iter().enumerate() {
                let Some(wing) = &weapon.wing else { continue };
                if wing.strength <= 0.0 {
                    continue;
                }
                let kind = ship.class().mounts[index].kind;
                match kind {
                    WeaponKind::BomberHangar
                        if wing.deployed_against == Some(target)
                            && ship.owner != target_ship.owner =>
                    {
                        bombers += wing.strength;
                    }
                    WeaponKind::FighterHangar => {
                        // Escorting wings defend their charge; wings at home
                        // defend their own carrier
                        let defending = match wing.deployed_against {
                            Some(ward) => ward == target && ship.owner == target_ship.owner,
                            None => ship.id == target,
                        };
                        if defending {
                            fighters += wing.strength;
                        }
                    }
                    _ => {}
                }
            }
        }
        if bombers <= 0.0 {
            continue;
        }
        let turrets = match target_ship.modules.turrets {
            ModuleStatus::Intact => TURRET_DEFENSE_INTACT,
            ModuleStatus::Damaged => TURRET_DEFENSE_DAMAGED,
            ModuleStatus::Destroyed | ModuleStatus::Absent => 0.0,
        };
        tallies.push(BombingTally {
            target,
            bombers,
            fighters,
            turrets,
        });
    }

    // Wing attrition from the snapshot: bombers and fighters maul each other
    for tally in &tallies {
        let Some(target_owner) = state.ship(tally.target).map(|s| s.owner) else {
            continue;
        };
        let bomber_loss_pool = WING_ATTRITION_RATE * (tally.fighters + tally.turrets);
        let fighter_loss_pool = WING_ATTRITION_RATE * tally.bombers;
        for ship in state.ships.values_mut() {
            let owner = ship.owner;
            let class = ship.class();
            for (index, weapon) in ship.weapons.iter_mut().enumerate() {
                let Some(wing) = weapon.wing.as_mut() else { continue };
                if wing.strength <= 0.0 {
                    continue;
                }
                match class.mounts[index].kind {
                    WeaponKind::BomberHangar
                        if wing.deployed_against == Some(tally.target)
                            && owner != target_owner
                            && tally.bombers > 0.0 =>
                    {
                        let share = wing.strength / tally.bombers;
                        wing.strength = (wing.strength - bomber_loss_pool * share).max(0.0);
                    }
                    WeaponKind::FighterHangar if tally.fighters > 0.0 => {
                        let defending = match wing.deployed_against {
                            Some(ward) => ward == tally.target && owner == target_owner,
                            None => ship.id == tally.target,
                        };
                        if defending {
                            let share = wing.strength / tally.fighters;
                            wing.strength =
                                (wing.strength - fighter_loss_pool * share).max(0.0);
                        }
                    }
                    _ => {}
                }
            }
        }
    }

    // Bombing damage, from the same snapshot
    for tally in &tallies {
        let diff = tally.differential();
        if diff <= 0.0 {
            state.push_log(LogEntry::BombingRun {
                target: tally.target,
                differential: diff,
                damage: 0,
            });
            continue;
        }
        let chance = 1.0 - (-diff / BOMBING_SATURATION).exp();
        let damage = if rng.gen::<f32>() < chance {
            (1 + (diff / 3.0) as i32).min(3)
        } else {
            0
        };
        state.push_log(LogEntry::BombingRun {
            target: tally.target,
            differential: diff,
            damage,
        });
        if damage == 0 {
            continue;
        }
        let ignored = state
            .ship(tally.target)
            .map_or(true, |t| relativistic_ignore(t, rng));
        if ignored {
            state.push_log(LogEntry::DamageIgnored {
                target: tally.target,
            });
            continue;
        }
        let impact = state
            .ship_mut(tally.target)
            .expect("tally targets live ships")
            .impact(damage, false);
        // Strike craft use the differential-derived critical chance, not the
        // standard per-weapon one
        if impact.hull_damage > 0 {
            let crit_chance = (diff / BOMBING_CRIT_DIVISOR).clamp(0.0, BOMBING_CRIT_CAP);
            if rng.gen::<f32>() < crit_chance {
                if let Some(ship) = state.ship_mut(tally.target) {
                    let effect = apply_critical(ship, rng);
                    state.push_log(LogEntry::Critical {
                        ship: tally.target,
                        by: None,
                        effect,
                    });
                }
            }
        }
        check_ship_death(state, tally.target);
    }
}

/// End-of-attack fire resolution, ship by ship
///
/// Each burning ship takes a uniformly random number of hull hits bounded by
/// its current fire count; fires burn inside the shield envelope.
pub fn resolve_fires(state: &mut BattleState, rng: &mut impl Rng) {
    let mut burning: Vec<ShipId> = state
        .ships
        .values()
        .filter(|s| s.fires > 0)
        .map(|s| s.id)
        .collect();
    burning.sort();
    for id in burning {
        let fires = state.ship(id).map_or(0, |s| s.fires);
        let damage = rng.gen_range(1..=fires) as i32;
        if let Some(ship) = state.ship_mut(id) {
            ship.impact(damage, true);
        }
        state.push_log(LogEntry::FireDamage { ship: id, damage });
        check_ship_death(state, id);
    }
}

/// Apply a boarding outcome's criticals to the defender
pub fn apply_boarding_criticals(
    state: &mut BattleState,
    attacker: ShipId,
    target: ShipId,
    count: u32,
    rng: &mut impl Rng,
) {
    for _ in 0..count {
        let Some(ship) = state.ship_mut(target) else {
            return;
        };
        let roll = critical_roll(rng);
        let effect = if ship.class().faction.amorphous() {
            crate::battle::criticals::amorphous_table(roll)
        } else {
            crate::battle::criticals::standard_table(roll)
        };
        apply_effect(ship, effect);
        state.push_log(LogEntry::Critical {
            ship: target,
            by: Some(attacker),
            effect,
        });
        check_ship_death(state, target);
    }
}
