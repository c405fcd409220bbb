//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for ship instances (live or wrecked)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShipId(pub Uuid);

impl ShipId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ShipId {
    fn default() -> Self {
        Self::new()
    }
}

/// Unique identifier for players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

/// Turn counter within a battle (first full turn is 1)
pub type Turn = u32;

/// The two controllers of a battle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Side {
    Crimson,
    Cobalt,
}

impl Side {
    /// Fixed encounter order; also the initiative tie-break order
    pub const ALL: [Side; 2] = [Side::Crimson, Side::Cobalt];

    pub fn opponent(self) -> Side {
        match self {
            Side::Crimson => Side::Cobalt,
            Side::Cobalt => Side::Crimson,
        }
    }
}

/// A player identity bound to one side of a battle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub side: Side,
}

impl Player {
    pub fn new(name: impl Into<String>, side: Side) -> Self {
        Self {
            id: PlayerId::new(),
            name: name.into(),
            side,
        }
    }
}
