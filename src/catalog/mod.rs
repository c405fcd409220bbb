//! Static catalog: factions, weight classes, weapons, ship classes
//!
//! Everything in this module is immutable reference data, built once and
//! shared freely. Ship instances hold a `ShipClassId` and look the class up;
//! class data is never copied per-instance.

pub mod faction;
pub mod ship_class;
pub mod weapon;
pub mod weight_class;

pub use faction::{Faction, ReactorMode};
pub use ship_class::{Catalog, ShipClass, ShipClassId};
pub use weapon::{WeaponKind, WeaponMount};
pub use weight_class::{WeightClass, WeightStats};

// Firing arcs are geometry vocabulary shared with pick boundaries
pub use crate::geom::FiringArc;
