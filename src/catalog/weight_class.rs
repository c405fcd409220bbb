//! Weight classes and their stat tables

use serde::{Deserialize, Serialize};

/// Hull weight class, lightest to heaviest
///
/// Ordering matters: subplots and the AI both reason about "tier", which is
/// exactly this ordering.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum WeightClass {
    Escort,
    Destroyer,
    Cruiser,
    Battleship,
    Dreadnought,
}

/// Per-weight-class baseline stats
///
/// Individual ship classes may override hull and troops; everything else is
/// fixed per weight class.
#[derive(Debug, Clone, Copy)]
pub struct WeightStats {
    /// Fleet-point cost, also the initiative weight
    pub point_cost: i32,
    pub max_hull: i32,
    pub max_troops: i32,
    /// Total power available for distribution across subsystems
    pub reactor_output: i32,
    /// Collision/pick exclusion radius, also the cannon accuracy anchor
    pub base_hull_radius: f32,
    /// Maximum distance covered in one Move at full engine power
    pub max_speed: f32,
    /// Full width of the movement fan (radians)
    pub turn_arc: f32,
}

impl WeightClass {
    pub const ALL: [WeightClass; 5] = [
        WeightClass::Escort,
        WeightClass::Destroyer,
        WeightClass::Cruiser,
        WeightClass::Battleship,
        WeightClass::Dreadnought,
    ];

    pub fn stats(self) -> WeightStats {
        match self {
            WeightClass::Escort => WeightStats {
                point_cost: 2,
                max_hull: 4,
                max_troops: 2,
                reactor_output: 6,
                base_hull_radius: 15.0,
                max_speed: 240.0,
                turn_arc: std::f32::consts::PI, // nimble
            },
            WeightClass::Destroyer => WeightStats {
                point_cost: 3,
                max_hull: 6,
                max_troops: 3,
                reactor_output: 8,
                base_hull_radius: 20.0,
                max_speed: 200.0,
                turn_arc: std::f32::consts::PI * 0.75,
            },
            WeightClass::Cruiser => WeightStats {
                point_cost: 5,
                max_hull: 8,
                max_troops: 4,
                reactor_output: 10,
                base_hull_radius: 25.0,
                max_speed: 160.0,
                turn_arc: std::f32::consts::PI * 0.5,
            },
            WeightClass::Battleship => WeightStats {
                point_cost: 8,
                max_hull: 12,
                max_troops: 6,
                reactor_output: 12,
                base_hull_radius: 32.0,
                max_speed: 120.0,
                turn_arc: std::f32::consts::PI * 0.375,
            },
            WeightClass::Dreadnought => WeightStats {
                point_cost: 12,
                max_hull: 16,
                max_troops: 8,
                reactor_output: 15,
                base_hull_radius: 40.0,
                max_speed: 100.0,
                turn_arc: std::f32::consts::PI * 0.25, // ponderous
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_ordering() {
        assert!(WeightClass::Dreadnought > WeightClass::Battleship);
        assert!(WeightClass::Battleship > WeightClass::Cruiser);
        assert!(WeightClass::Cruiser > WeightClass::Destroyer);
        assert!(WeightClass::Destroyer > WeightClass::Escort);
    }

    #[test]
    fn test_heavier_costs_more() {
        let mut prev = 0;
        for class in WeightClass::ALL {
            let cost = class.stats().point_cost;
            assert!(cost > prev);
            prev = cost;
        }
    }

    #[test]
    fn test_heavier_is_slower_and_tougher() {
        for pair in WeightClass::ALL.windows(2) {
            let (lighter, heavier) = (pair[0].stats(), pair[1].stats());
            assert!(heavier.max_speed < lighter.max_speed);
            assert!(heavier.turn_arc <= lighter.turn_arc);
            assert!(heavier.max_hull > lighter.max_hull);
            assert!(heavier.base_hull_radius > lighter.base_hull_radius);
        }
    }
}
