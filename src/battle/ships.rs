//! Ship instances: the mutable combat state of one deployed ship

use serde::{Deserialize, Serialize};

use crate::battle::constants::{BOARDING_MIN_TROOPS, ENGINE_SPEED_FACTOR};
use crate::catalog::{Catalog, ReactorMode, ShipClass, ShipClassId, WeightStats};
use crate::core::types::{ShipId, Side};
use crate::geom::Vec2;

/// Subsystem health lattice
///
/// Transitions only ever move right (Intact -> Damaged -> Destroyed) except
/// through an explicit repair, which moves one step left. Absent modules
/// never change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModuleStatus {
    Intact,
    Damaged,
    Destroyed,
    Absent,
}

impl ModuleStatus {
    /// One step of damage; monotonic, Absent untouched
    pub fn degraded(self) -> ModuleStatus {
        match self {
            ModuleStatus::Intact => ModuleStatus::Damaged,
            ModuleStatus::Damaged | ModuleStatus::Destroyed => ModuleStatus::Destroyed,
            ModuleStatus::Absent => ModuleStatus::Absent,
        }
    }

    /// One step of repair; Absent untouched
    pub fn repaired(self) -> ModuleStatus {
        match self {
            ModuleStatus::Intact | ModuleStatus::Damaged => ModuleStatus::Intact,
            ModuleStatus::Destroyed => ModuleStatus::Damaged,
            ModuleStatus::Absent => ModuleStatus::Absent,
        }
    }

    /// Still contributes (possibly at reduced effect)
    pub fn operational(self) -> bool {
        matches!(self, ModuleStatus::Intact | ModuleStatus::Damaged)
    }
}

/// The named subsystems the critical table can hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Module {
    Engines,
    Turrets,
    Assault,
    Defense,
    Shields,
}

impl Module {
    pub const ALL: [Module; 5] = [
        Module::Engines,
        Module::Turrets,
        Module::Assault,
        Module::Defense,
        Module::Shields,
    ];

    /// The non-weapon modules, in critical-table order
    pub const NON_WEAPON: [Module; 4] =
        [Module::Engines, Module::Assault, Module::Defense, Module::Shields];
}

/// Per-ship module statuses
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModuleBank {
    pub engines: ModuleStatus,
    pub turrets: ModuleStatus,
    pub assault: ModuleStatus,
    pub defense: ModuleStatus,
    pub shields: ModuleStatus,
}

impl ModuleBank {
    pub fn intact() -> Self {
        Self {
            engines: ModuleStatus::Intact,
            turrets: ModuleStatus::Intact,
            assault: ModuleStatus::Intact,
            defense: ModuleStatus::Intact,
            shields: ModuleStatus::Intact,
        }
    }

    /// Amorphous hulls have no conventional subsystems
    pub fn absent() -> Self {
        Self {
            engines: ModuleStatus::Absent,
            turrets: ModuleStatus::Absent,
            assault: ModuleStatus::Absent,
            defense: ModuleStatus::Absent,
            shields: ModuleStatus::Absent,
        }
    }

    pub fn get(&self, module: Module) -> ModuleStatus {
        match module {
            Module::Engines => self.engines,
            Module::Turrets => self.turrets,
            Module::Assault => self.assault,
            Module::Defense => self.defense,
            Module::Shields => self.shields,
        }
    }

    pub fn set(&mut self, module: Module, status: ModuleStatus) {
        let slot = match module {
            Module::Engines => &mut self.engines,
            Module::Turrets => &mut self.turrets,
            Module::Assault => &mut self.assault,
            Module::Defense => &mut self.defense,
            Module::Shields => &mut self.shields,
        };
        *slot = status;
    }

    pub fn degrade(&mut self, module: Module) {
        self.set(module, self.get(module).degraded());
    }
}

/// Power split across subsystems; sum never exceeds reactor output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerAllocation {
    pub weapons: i32,
    pub shields: i32,
    pub engines: i32,
}

impl PowerAllocation {
    pub fn balanced(reactor: i32) -> Self {
        let third = reactor / 3;
        Self {
            weapons: reactor - 2 * third,
            shields: third,
            engines: third,
        }
    }

    pub fn for_mode(mode: ReactorMode, reactor: i32) -> Self {
        let half = reactor / 2;
        let quarter = reactor / 4;
        match mode {
            ReactorMode::Assault => Self {
                weapons: half,
                shields: quarter,
                engines: reactor - half - quarter,
            },
            ReactorMode::Aegis => Self {
                weapons: quarter,
                shields: half,
                engines: reactor - half - quarter,
            },
        }
    }

    pub fn total(&self) -> i32 {
        self.weapons + self.shields + self.engines
    }

    pub fn non_negative(&self) -> bool {
        self.weapons >= 0 && self.shields >= 0 && self.engines >= 0
    }
}

/// A launched strike-craft wing
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WingState {
    pub strength: f32,
    /// Ship the wing is committed against; None = recalled / defending home
    pub deployed_against: Option<ShipId>,
}

/// Mutable state of one mounted weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponState {
    /// Accumulated lance charge
    pub charge: f32,
    /// Remaining firings; None = unlimited
    pub shots_left: Option<u32>,
    /// Wing attached to hangar mounts
    pub wing: Option<WingState>,
    /// Fired or charged this Attack phase
    pub used: bool,
    /// Weapons take critical damage like any other subsystem
    pub status: ModuleStatus,
}

/// Outcome of applying raw damage to a ship
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Impact {
    pub shield_damage: i32,
    pub hull_damage: i32,
    pub destroyed: bool,
}

/// A deployed ship
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipInstance {
    pub id: ShipId,
    pub owner: Side,
    pub class: ShipClassId,

    // Combat attributes
    pub hull: i32,
    pub shield: i32,
    pub troops: i32,
    /// Weapon power pool; each firing or charge costs one
    pub weapon_power: i32,
    pub modules: ModuleBank,
    pub power: PowerAllocation,
    pub weapons: Vec<WeaponState>,
    pub fires: u32,

    // Position
    pub position: Vec2,
    pub facing: f32,
    pub velocity: Vec2,

    // Phase bookkeeping
    /// Acted in the current phase (power set, moved, repaired)
    pub done: bool,
    pub boarding_sent: bool,
    pub pulse_used: bool,
    pub jump_cooldown: u32,
}

impl ShipInstance {
    pub fn new(class_id: ShipClassId, owner: Side, position: Vec2, facing: f32) -> Self {
        let class = Catalog::global().class(class_id);
        let stats = class.weight_class.stats();
        let power = if class.faction.fixed_reactor() {
            PowerAllocation::for_mode(ReactorMode::Aegis, stats.reactor_output)
        } else {
            PowerAllocation::balanced(stats.reactor_output)
        };
        let modules = if class.faction.amorphous() {
            ModuleBank::absent()
        } else {
            ModuleBank::intact()
        };
        let weapons = class
            .mounts
            .iter()
            .map(|mount| WeaponState {
                charge: 0.0,
                shots_left: mount.ammo,
                wing: mount.kind.is_hangar().then(|| WingState {
                    strength: mount.num_shots as f32,
                    deployed_against: None,
                }),
                used: false,
                status: ModuleStatus::Intact,
            })
            .collect();

        Self {
            id: ShipId::new(),
            owner,
            class: class_id,
            hull: class.max_hull(),
            shield: power.shields,
            troops: class.max_troops(),
            weapon_power: power.weapons,
            modules,
            power,
            weapons,
            fires: 0,
            position,
            facing,
            velocity: Vec2::ZERO,
            done: false,
            boarding_sent: false,
            pulse_used: false,
            jump_cooldown: 0,
        }
    }

    pub fn class(&self) -> &'static ShipClass {
        Catalog::global().class(self.class)
    }

    pub fn stats(&self) -> WeightStats {
        self.class().weight_class.stats()
    }

    pub fn alive(&self) -> bool {
        self.hull > 0
    }

    /// Apply raw damage; shields absorb first unless bypassed
    ///
    /// Deterministic: the relativistic-armor ignore roll happens in the
    /// resolution pipeline before this is called.
    pub fn impact(&mut self, damage: i32, ignore_shields: bool) -> Impact {
        let damage = damage.max(0);
        if ignore_shields {
            let hull_damage = damage.min(self.hull);
            self.hull -= hull_damage;
            return Impact {
                shield_damage: 0,
                hull_damage,
                destroyed: self.hull == 0,
            };
        }
        let shield_damage = damage.min(self.shield);
        self.shield -= shield_damage;
        let hull_damage = (damage - shield_damage).min(self.hull);
        self.hull -= hull_damage;
        Impact {
            shield_damage,
            hull_damage,
            destroyed: self.hull == 0,
        }
    }

    /// Movement coefficient for initiative: remaining mobility
    ///
    /// Absent engines (amorphous hulls) move by mass flow and count as full.
    pub fn mobility_coefficient(&self) -> f32 {
        match self.modules.engines {
            ModuleStatus::Intact | ModuleStatus::Absent => 1.0,
            ModuleStatus::Damaged => 0.5,
            ModuleStatus::Destroyed => 0.0,
        }
    }

    /// Distance budget for one Move at current engine power
    pub fn max_move_distance(&self) -> f32 {
        let stats = self.stats();
        let fraction = self.power.engines as f32 / stats.reactor_output as f32;
        stats.max_speed * (fraction * ENGINE_SPEED_FACTOR).min(1.0) * self.mobility_coefficient()
    }

    /// Half-angle of the movement fan; damaged engines turn half as well
    pub fn turn_half_angle(&self) -> f32 {
        let half = self.stats().turn_arc / 2.0;
        if self.modules.engines == ModuleStatus::Damaged {
            half / 2.0
        } else {
            half
        }
    }

    pub fn can_send_boarding(&self) -> bool {
        self.troops >= BOARDING_MIN_TROOPS
            && !self.boarding_sent
            && self.modules.assault.operational()
    }

    pub fn can_disruption_pulse(&self) -> bool {
        self.class().faction.has_disruption_pulse() && !self.pulse_used
    }

    /// A weapon is usable this phase if functional, unfired, stocked, and powered
    pub fn weapon_usable(&self, index: usize) -> bool {
        let state = &self.weapons[index];
        state.status.operational()
            && !state.used
            && state.shots_left.map_or(true, |n| n > 0)
            && self.weapon_power > 0
    }

    /// Shots a weapon actually fires: damaged weapons fire at half rate
    pub fn effective_shots(&self, index: usize) -> u32 {
        let mount = &self.class().mounts[index];
        match self.weapons[index].status {
            ModuleStatus::Intact | ModuleStatus::Absent => mount.num_shots,
            ModuleStatus::Damaged => (mount.num_shots + 1) / 2,
            ModuleStatus::Destroyed => 0,
        }
    }

    /// Shield points the generators can actually hold
    ///
    /// A damaged shields module holds half the allocation, a destroyed one
    /// nothing. Absent modules (amorphous hulls) shield innately at the
    /// full allocation.
    pub fn shield_cap(&self) -> i32 {
        match self.modules.shields {
            ModuleStatus::Intact | ModuleStatus::Absent => self.power.shields,
            ModuleStatus::Damaged => (self.power.shields + 1) / 2,
            ModuleStatus::Destroyed => 0,
        }
    }

    /// End-of-attack replenish: pools return to their allocations
    pub fn replenish(&mut self) {
        self.shield = self.shield_cap();
        self.weapon_power = self.power.weapons;
    }

    /// Re-clamp pools after an allocation change
    pub fn clamp_pools(&mut self) {
        self.shield = self.shield.min(self.shield_cap());
        self.weapon_power = self.weapon_power.min(self.power.weapons);
    }
}
