//! Ship classes and the process-wide catalog
//!
//! The catalog is built once and shared without synchronization; nothing in
//! it is ever mutated after construction.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::catalog::faction::Faction;
use crate::catalog::weapon::{WeaponKind, WeaponMount};
use crate::catalog::weight_class::WeightClass;
use crate::geom::FiringArc;

/// Index into the catalog's class table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShipClassId(pub u16);

/// Static description of one ship class
#[derive(Debug, Clone)]
pub struct ShipClass {
    pub id: ShipClassId,
    pub name: &'static str,
    pub faction: Faction,
    pub weight_class: WeightClass,
    pub mounts: Vec<WeaponMount>,
    /// Multiplier on the distance-based cannon hit chance
    pub cannon_accuracy: f32,
    /// Hull override; None = weight-class default
    pub hull_override: Option<i32>,
    /// Troops override; None = weight-class default (amorphous hulls carry 0)
    pub troops_override: Option<i32>,
}

impl ShipClass {
    pub fn max_hull(&self) -> i32 {
        self.hull_override
            .unwrap_or_else(|| self.weight_class.stats().max_hull)
    }

    pub fn max_troops(&self) -> i32 {
        if self.faction.amorphous() {
            0
        } else {
            self.troops_override
                .unwrap_or_else(|| self.weight_class.stats().max_troops)
        }
    }

    pub fn point_cost(&self) -> i32 {
        self.weight_class.stats().point_cost
    }
}

/// The full ship class table
pub struct Catalog {
    classes: Vec<ShipClass>,
}

impl Catalog {
    /// Process-wide catalog, built on first access
    pub fn global() -> &'static Catalog {
        static CATALOG: OnceLock<Catalog> = OnceLock::new();
        CATALOG.get_or_init(Catalog::build)
    }

    pub fn class(&self, id: ShipClassId) -> &ShipClass {
        &self.classes[id.0 as usize]
    }

    pub fn classes(&self) -> &[ShipClass] {
        &self.classes
    }

    pub fn by_name(&self, name: &str) -> Option<&ShipClass> {
        self.classes.iter().find(|c| c.name == name)
    }

    pub fn classes_for(&self, faction: Faction) -> impl Iterator<Item = &ShipClass> {
        self.classes.iter().filter(move |c| c.faction == faction)
    }

    fn build() -> Catalog {
        use FiringArc::{Aft, Fore, Port, Starboard};
        use WeaponKind::*;

        let broadside = vec![Port, Starboard];
        let all_round = vec![Fore, Aft, Port, Starboard];

        let mut classes = Vec::new();
        let mut push = |name: &'static str,
                        faction: Faction,
                        weight_class: WeightClass,
                        mounts: Vec<WeaponMount>,
                        cannon_accuracy: f32| {
            let id = ShipClassId(classes.len() as u16);
            classes.push(ShipClass {
                id,
                name,
                faction,
                weight_class,
                mounts,
                cannon_accuracy,
                hull_override: None,
                troops_override: None,
            });
        };

        // === DOMINION ===
        push(
            "Vigil",
            Faction::Dominion,
            WeightClass::Escort,
            vec![WeaponMount::new(Cannon, 2, vec![Fore, Port, Starboard], 300.0)],
            0.9,
        );
        push(
            "Bulwark",
            Faction::Dominion,
            WeightClass::Cruiser,
            vec![
                WeaponMount::new(Cannon, 3, broadside.clone(), 300.0),
                WeaponMount::new(Torpedo, 1, vec![Fore], 350.0),
            ],
            0.85,
        );
        push(
            "Sovereign",
            Faction::Dominion,
            WeightClass::Battleship,
            vec![
                WeaponMount::new(Cannon, 4, broadside.clone(), 320.0),
                WeaponMount::new(Lance, 2, vec![Fore], 400.0),
                WeaponMount::new(FighterHangar, 3, all_round.clone(), 450.0),
            ],
            0.85,
        );
        push(
            "Imperator",
            Faction::Dominion,
            WeightClass::Dreadnought,
            vec![
                WeaponMount::new(MegaCannon, 1, vec![Fore], 380.0),
                WeaponMount::new(Cannon, 4, broadside.clone(), 320.0),
                WeaponMount::new(BomberHangar, 3, all_round.clone(), 450.0),
            ],
            0.8,
        );

        // === CELERID ===
        push(
            "Dart",
            Faction::Celerid,
            WeightClass::Escort,
            vec![WeaponMount::new(Cannon, 2, vec![Fore], 280.0)],
            1.0,
        );
        push(
            "Falx",
            Faction::Celerid,
            WeightClass::Destroyer,
            vec![
                WeaponMount::new(Cannon, 2, vec![Fore, Starboard], 280.0),
                WeaponMount::new(Torpedo, 1, vec![Fore], 320.0),
            ],
            0.95,
        );
        push(
            "Scytheblade",
            Faction::Celerid,
            WeightClass::Cruiser,
            vec![
                WeaponMount::new(Lance, 3, vec![Fore], 380.0),
                WeaponMount::new(Cannon, 2, broadside.clone(), 280.0),
            ],
            0.9,
        );

        // === VEILBORN ===
        push(
            "Murmur",
            Faction::Veilborn,
            WeightClass::Escort,
            vec![WeaponMount::new(Cannon, 2, vec![Fore, Aft], 280.0)],
            0.9,
        );
        push(
            "Whisper",
            Faction::Veilborn,
            WeightClass::Destroyer,
            vec![
                WeaponMount::new(EmpAntenna, 1, all_round.clone(), 350.0),
                WeaponMount::new(Cannon, 2, broadside.clone(), 280.0),
            ],
            0.85,
        );
        push(
            "Revelation",
            Faction::Veilborn,
            WeightClass::Battleship,
            vec![
                WeaponMount::new(RevelationGun, 1, vec![Fore], 420.0),
                WeaponMount::new(Lance, 2, broadside.clone(), 380.0),
            ],
            0.8,
        );

        // === COALESCENCE ===
        push(
            "Mote",
            Faction::Coalescence,
            WeightClass::Escort,
            vec![WeaponMount::new(Cannon, 3, all_round.clone(), 260.0)],
            0.9,
        );
        push(
            "Bloom",
            Faction::Coalescence,
            WeightClass::Cruiser,
            vec![
                WeaponMount::new(Cannon, 4, all_round.clone(), 260.0),
                WeaponMount::new(Torpedo, 1, all_round.clone(), 300.0),
            ],
            0.85,
        );
        push(
            "Tide",
            Faction::Coalescence,
            WeightClass::Battleship,
            vec![
                WeaponMount::new(Cannon, 5, all_round.clone(), 280.0),
                WeaponMount::new(Torpedo, 2, all_round, 300.0),
            ],
            0.85,
        );

        Catalog { classes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_ids_match_indices() {
        let catalog = Catalog::global();
        for (i, class) in catalog.classes().iter().enumerate() {
            assert_eq!(class.id.0 as usize, i);
        }
    }

    #[test]
    fn test_every_faction_has_classes() {
        let catalog = Catalog::global();
        for faction in Faction::ALL {
            assert!(
                catalog.classes_for(faction).count() >= 2,
                "{:?} needs at least two classes",
                faction
            );
        }
    }

    #[test]
    fn test_exactly_one_revelation_gun_class() {
        let catalog = Catalog::global();
        let count = catalog
            .classes()
            .iter()
            .filter(|c| {
                c.mounts
                    .iter()
                    .any(|m| m.kind == WeaponKind::RevelationGun)
            })
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_amorphous_classes_carry_no_troops() {
        let catalog = Catalog::global();
        for class in catalog.classes_for(Faction::Coalescence) {
            assert_eq!(class.max_troops(), 0);
        }
    }

    #[test]
    fn test_lookup_by_name() {
        let catalog = Catalog::global();
        let vigil = catalog.by_name("Vigil").expect("Vigil exists");
        assert_eq!(vigil.faction, Faction::Dominion);
        assert_eq!(vigil.weight_class, WeightClass::Escort);
        assert!(catalog.by_name("Nonesuch").is_none());
    }

    #[test]
    fn test_cannon_accuracy_bounded() {
        for class in Catalog::global().classes() {
            assert!(class.cannon_accuracy > 0.0 && class.cannon_accuracy <= 1.0);
        }
    }
}
