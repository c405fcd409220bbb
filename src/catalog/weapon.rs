//! Weapon kinds and mount definitions

use serde::{Deserialize, Serialize};

use crate::geom::FiringArc;

/// Weapon behaviour classes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeaponKind {
    /// Projectile battery: per-shot hit chance falls off with distance
    Cannon,
    /// Beam weapon: must be charged in a prior Attack phase
    Lance,
    /// Single heavy warhead: shield flip or guaranteed two hull
    Torpedo,
    /// Defensive strike-craft wing
    FighterHangar,
    /// Offensive strike-craft wing
    BomberHangar,
    /// Spinal area weapon: blast at a picked location
    MegaCannon,
    /// One shot per battle; destroys whatever it hits
    RevelationGun,
    /// No hull damage; scrambles the target's power pools
    EmpAntenna,
}

impl WeaponKind {
    /// Hangars launch wings rather than firing shots
    pub fn is_hangar(self) -> bool {
        matches!(self, WeaponKind::FighterHangar | WeaponKind::BomberHangar)
    }

    /// Targets a picked location (area effect) instead of a ship
    pub fn is_area(self) -> bool {
        matches!(self, WeaponKind::MegaCannon)
    }
}

/// One weapon mounted on a ship class
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponMount {
    pub kind: WeaponKind,
    /// Shots per firing (cannon/lance), wing strength (hangars)
    pub num_shots: u32,
    pub arcs: Vec<FiringArc>,
    pub range: f32,
    /// Total firings per battle; None = unlimited
    pub ammo: Option<u32>,
}

impl WeaponMount {
    pub fn new(kind: WeaponKind, num_shots: u32, arcs: Vec<FiringArc>, range: f32) -> Self {
        let ammo = match kind {
            WeaponKind::RevelationGun => Some(1),
            WeaponKind::Torpedo => Some(4),
            _ => None,
        };
        Self {
            kind,
            num_shots,
            arcs,
            range,
            ammo,
        }
    }

    /// Shot count used by the attack-phase initiative formula
    pub fn initiative_shots(&self) -> u32 {
        self.num_shots * self.arcs.len() as u32
    }
}
