//! Per-battle priority memory
//!
//! A strongly-typed map from (concern, ship) to a decoded value with a
//! declared default per concern. Owned exclusively by one agent, mutated only
//! from observed log entries, and never shared across battles.

use ahash::AHashMap;

use crate::core::types::ShipId;

/// What the agent remembers about a ship
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Concern {
    /// How much we want this enemy dead
    Priority,
    /// How much this enemy has hurt us
    Threat,
}

impl Concern {
    pub fn default_value(self) -> f64 {
        match self {
            Concern::Priority => 1.0,
            Concern::Threat => 0.0,
        }
    }

    /// Remembered values stay inside sane bounds
    fn clamp(self, value: f64) -> f64 {
        match self {
            Concern::Priority => value.clamp(0.1, 10.0),
            Concern::Threat => value.clamp(0.0, 10.0),
        }
    }
}

/// One agent's memory for one battle
#[derive(Debug, Clone, Default)]
pub struct Brain {
    values: AHashMap<(Concern, ShipId), f64>,
}

impl Brain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, concern: Concern, ship: ShipId) -> f64 {
        self.values
            .get(&(concern, ship))
            .copied()
            .unwrap_or_else(|| concern.default_value())
    }

    pub fn adjust(&mut self, concern: Concern, ship: ShipId, delta: f64) {
        let current = self.get(concern, ship);
        self.values
            .insert((concern, ship), concern.clamp(current + delta));
    }

    /// Drop everything remembered about a ship (it is gone)
    pub fn forget(&mut self, ship: ShipId) {
        self.values.retain(|(_, s), _| *s != ship);
    }
}
