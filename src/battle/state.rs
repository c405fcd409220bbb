//! Authoritative battle state
//!
//! Mutated only by the session actor in response to actions; everything else
//! sees read-only snapshots.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::battle::boarding::BoardingOutcome;
use crate::battle::constants::{
    DEFAULT_FIELD_HEIGHT, DEFAULT_FIELD_WIDTH, DEPLOY_ZONE_DEPTH,
};
use crate::battle::criticals::CriticalEffect;
use crate::battle::ships::ShipInstance;
use crate::battle::subplots::Subplot;
use crate::catalog::{Catalog, ShipClassId, WeaponKind};
use crate::core::types::{Player, ShipId, Side, Turn};
use crate::geom::{PickBoundary, Vec2};

/// A value held once per side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub crimson: T,
    pub cobalt: T,
}

impl<T> PerSide<T> {
    pub fn new(crimson: T, cobalt: T) -> Self {
        Self { crimson, cobalt }
    }

    pub fn get(&self, side: Side) -> &T {
        match side {
            Side::Crimson => &self.crimson,
            Side::Cobalt => &self.cobalt,
        }
    }

    pub fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Crimson => &mut self.crimson,
            Side::Cobalt => &mut self.cobalt,
        }
    }
}

/// Battle scale; controls subplot count and default fleet budget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BattleSize {
    Skirmish,
    Engagement,
    Armada,
}

impl BattleSize {
    pub fn subplot_count(self) -> usize {
        match self {
            BattleSize::Skirmish => 1,
            BattleSize::Engagement => 2,
            BattleSize::Armada => 3,
        }
    }

    pub fn default_budget(self) -> i32 {
        match self {
            BattleSize::Skirmish => 10,
            BattleSize::Engagement => 20,
            BattleSize::Armada => 40,
        }
    }
}

/// Immutable description the persistence layer seeds a battle with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSetup {
    pub field_width: f32,
    pub field_height: f32,
    pub size: BattleSize,
    pub points_budget: i32,
    /// Deployable ship classes per side
    pub fleets: PerSide<Vec<ShipClassId>>,
}

impl BattleSetup {
    pub fn new(size: BattleSize, fleets: PerSide<Vec<ShipClassId>>) -> Self {
        Self {
            field_width: DEFAULT_FIELD_WIDTH,
            field_height: DEFAULT_FIELD_HEIGHT,
            size,
            points_budget: size.default_budget(),
            fleets,
        }
    }

    /// The whole field as a pick boundary
    pub fn field_bounds(&self) -> PickBoundary {
        PickBoundary::Rect {
            min: Vec2::ZERO,
            max: Vec2::new(self.field_width, self.field_height),
        }
    }

    pub fn contains(&self, p: Vec2) -> bool {
        self.field_bounds().contains(p)
    }

    /// Deploy zone strip along each side's edge
    pub fn deploy_zone(&self, side: Side) -> PickBoundary {
        match side {
            Side::Crimson => PickBoundary::Rect {
                min: Vec2::ZERO,
                max: Vec2::new(DEPLOY_ZONE_DEPTH, self.field_height),
            },
            Side::Cobalt => PickBoundary::Rect {
                min: Vec2::new(self.field_width - DEPLOY_ZONE_DEPTH, 0.0),
                max: Vec2::new(self.field_width, self.field_height),
            },
        }
    }

    /// Facing toward the middle of the field for a freshly deployed ship
    pub fn deploy_facing(&self, side: Side) -> f32 {
        match side {
            Side::Crimson => 0.0,
            Side::Cobalt => std::f32::consts::PI,
        }
    }
}

/// Terminal record of a destroyed or escaped ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wreck {
    pub class: ShipClassId,
    pub owner: Side,
    pub escaped: bool,
}

/// The battle phase cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Deploy,
    Power(Turn),
    Move(Turn),
    Attack(Turn),
    Repair(Turn),
}

impl Phase {
    pub fn turn(self) -> Turn {
        match self {
            Phase::Deploy => 0,
            Phase::Power(t) | Phase::Move(t) | Phase::Attack(t) | Phase::Repair(t) => t,
        }
    }

    /// Move and Attack admit only the initiative holder (non-chat actions)
    pub fn initiative_gated(self) -> bool {
        matches!(self, Phase::Move(_) | Phase::Attack(_))
    }

    pub fn name(self) -> &'static str {
        match self {
            Phase::Deploy => "deploy",
            Phase::Power(_) => "power",
            Phase::Move(_) => "move",
            Phase::Attack(_) => "attack",
            Phase::Repair(_) => "repair",
        }
    }
}

/// One entry of the ordered battle log
///
/// Both the subplot engine and the AI brain consume this by index watermark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum LogEntry {
    Chat {
        side: Side,
        text: String,
    },
    PhaseChanged {
        phase: Phase,
    },
    ShipDeployed {
        ship: ShipId,
        side: Side,
    },
    ShipUndeployed {
        ship: ShipId,
    },
    ShipIdentified {
        ship: ShipId,
        by: Side,
    },
    Attacked {
        attacker: ShipId,
        target: ShipId,
        weapon: WeaponKind,
        shield_damage: i32,
        hull_damage: i32,
    },
    AttackFailed {
        attacker: ShipId,
        target: ShipId,
        weapon: WeaponKind,
    },
    DamageIgnored {
        target: ShipId,
    },
    Critical {
        ship: ShipId,
        /// Attacker attribution; None for fire or self-inflicted effects
        by: Option<ShipId>,
        effect: CriticalEffect,
    },
    BoardingResolved {
        attacker: ShipId,
        target: ShipId,
        outcome: BoardingOutcome,
    },
    BombingRun {
        target: ShipId,
        differential: f32,
        damage: i32,
    },
    FireDamage {
        ship: ShipId,
        damage: i32,
    },
    PowerScrambled {
        ship: ShipId,
    },
    DisruptionPulse {
        ship: ShipId,
    },
    ShipDestroyed {
        ship: ShipId,
    },
    ShipEscaped {
        ship: ShipId,
    },
}

/// The authoritative battle snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleState {
    pub setup: BattleSetup,
    pub players: PerSide<Player>,
    pub phase: Phase,
    /// Controllers done with the current phase
    pub done: Vec<Side>,
    /// Controller currently holding initiative
    pub initiative: Option<Side>,
    pub ships: AHashMap<ShipId, ShipInstance>,
    pub wrecks: AHashMap<ShipId, Wreck>,
    pub log: Vec<LogEntry>,
    pub subplots: Vec<Subplot>,
    /// Classes not yet deployed, per side
    pub undeployed: PerSide<Vec<ShipClassId>>,
    pub budget_remaining: PerSide<i32>,
    /// Enemy ships each side has identified
    pub identified: PerSide<AHashSet<ShipId>>,
}

impl BattleState {
    pub fn new(setup: BattleSetup, crimson: Player, cobalt: Player) -> Self {
        let undeployed = setup.fleets.clone();
        let budget = setup.points_budget;
        Self {
            setup,
            players: PerSide::new(crimson, cobalt),
            phase: Phase::Deploy,
            done: Vec::new(),
            initiative: None,
            ships: AHashMap::new(),
            wrecks: AHashMap::new(),
            log: Vec::new(),
            subplots: Vec::new(),
            undeployed,
            budget_remaining: PerSide::new(budget, budget),
            identified: PerSide::new(AHashSet::new(), AHashSet::new()),
        }
    }

    pub fn ship(&self, id: ShipId) -> Option<&ShipInstance> {
        self.ships.get(&id)
    }

    pub fn ship_mut(&mut self, id: ShipId) -> Option<&mut ShipInstance> {
        self.ships.get_mut(&id)
    }

    /// Owner of a live or wrecked ship
    pub fn owner_of(&self, id: ShipId) -> Option<Side> {
        self.ships
            .get(&id)
            .map(|s| s.owner)
            .or_else(|| self.wrecks.get(&id).map(|w| w.owner))
    }

    pub fn live_ships(&self, side: Side) -> impl Iterator<Item = &ShipInstance> {
        self.ships.values().filter(move |s| s.owner == side)
    }

    pub fn live_count(&self, side: Side) -> usize {
        self.live_ships(side).count()
    }

    pub fn push_log(&mut self, entry: LogEntry) {
        self.log.push(entry);
    }

    pub fn mark_done(&mut self, side: Side) {
        if !self.done.contains(&side) {
            self.done.push(side);
        }
    }

    pub fn all_done(&self) -> bool {
        Side::ALL.iter().all(|s| self.done.contains(s))
    }

    /// Can this side still afford any undeployed ship?
    pub fn can_afford_any(&self, side: Side) -> bool {
        let budget = *self.budget_remaining.get(side);
        self.undeployed
            .get(side)
            .iter()
            .any(|&id| Catalog::global().class(id).point_cost() <= budget)
    }

    /// Convert a live ship to a wreck; exactly once per ship
    pub fn wreck_ship(&mut self, id: ShipId, escaped: bool) {
        if let Some(ship) = self.ships.remove(&id) {
            self.wrecks.insert(
                id,
                Wreck {
                    class: ship.class,
                    owner: ship.owner,
                    escaped,
                },
            );
            self.push_log(if escaped {
                LogEntry::ShipEscaped { ship: id }
            } else {
                LogEntry::ShipDestroyed { ship: id }
            });
        }
    }

    /// Winner if the battle is over: `Some(None)` is mutual destruction
    pub fn victory_scan(&self) -> Option<Option<Side>> {
        let crimson = self.live_count(Side::Crimson);
        let cobalt = self.live_count(Side::Cobalt);
        match (crimson, cobalt) {
            (0, 0) => Some(None),
            (0, _) => Some(Some(Side::Cobalt)),
            (_, 0) => Some(Some(Side::Crimson)),
            _ => None,
        }
    }

    /// Scan for newly identified enemies and log them
    ///
    /// An enemy is identified the first time it comes within sighting range
    /// of any of the observing side's ships.
    pub fn update_identification(&mut self) {
        use crate::battle::constants::IDENTIFY_RANGE;
        let mut newly: Vec<(Side, ShipId)> = Vec::new();
        for observer_side in Side::ALL {
            let known = self.identified.get(observer_side);
            for enemy in self.live_ships(observer_side.opponent()) {
                if known.contains(&enemy.id) {
                    continue;
                }
                let spotted = self
                    .live_ships(observer_side)
                    .any(|own| own.position.distance(&enemy.position) <= IDENTIFY_RANGE);
                if spotted {
                    newly.push((observer_side, enemy.id));
                }
            }
        }
        for (side, ship) in newly {
            self.identified.get_mut(side).insert(ship);
            self.push_log(LogEntry::ShipIdentified { ship, by: side });
        }
    }
}
