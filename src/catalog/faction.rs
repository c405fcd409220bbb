//! Factions and their rule packages
//!
//! Faction differences are rule toggles consulted by the resolution and
//! movement code, not subclasses: each toggle is a method here.

use serde::{Deserialize, Serialize};

/// The four spacefaring powers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Faction {
    /// Baseline doctrine: free power distribution, full critical table
    Dominion,
    /// Relativistic raiders: velocity persists between turns and grants a
    /// speed-scaled chance to ignore incoming damage outright
    Celerid,
    /// Drive-cult ships: fixed reactor modes, inertialess jump drives,
    /// disruption pulse emitters
    Veilborn,
    /// Amorphous hulls with no conventional subsystems; they re-form lost
    /// mass instead of repairing modules
    Coalescence,
}

/// Fixed reactor configurations for factions without free power distribution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactorMode {
    /// Weapons-heavy: half the reactor to weapons
    Assault,
    /// Shield-heavy: half the reactor to shields
    Aegis,
}

impl Faction {
    pub const ALL: [Faction; 4] = [
        Faction::Dominion,
        Faction::Celerid,
        Faction::Veilborn,
        Faction::Coalescence,
    ];

    /// Does velocity carry over between Move phases?
    pub fn carries_inertia(self) -> bool {
        matches!(self, Faction::Celerid)
    }

    /// Velocity-scaled chance to ignore damage before shields are consulted
    pub fn has_relativistic_armor(self) -> bool {
        matches!(self, Faction::Celerid)
    }

    /// Jump drive instead of long conventional burns
    pub fn has_inertialess_drive(self) -> bool {
        matches!(self, Faction::Veilborn)
    }

    /// Disruption pulse ability
    pub fn has_disruption_pulse(self) -> bool {
        matches!(self, Faction::Veilborn)
    }

    /// Reactor locked to fixed modes (no free power distribution)
    pub fn fixed_reactor(self) -> bool {
        matches!(self, Faction::Veilborn)
    }

    /// Amorphous hull: no conventional modules, short critical table,
    /// Recoalesce instead of module repair
    pub fn amorphous(self) -> bool {
        matches!(self, Faction::Coalescence)
    }

    pub fn name(self) -> &'static str {
        match self {
            Faction::Dominion => "Dominion",
            Faction::Celerid => "Celerid",
            Faction::Veilborn => "Veilborn",
            Faction::Coalescence => "Coalescence",
        }
    }
}
