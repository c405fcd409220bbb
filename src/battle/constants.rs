//! Combat balance constants - all tunable values in one place

// Field scale
pub const DEFAULT_FIELD_WIDTH: f32 = 2000.0;
pub const DEFAULT_FIELD_HEIGHT: f32 = 1400.0;
pub const DEPLOY_ZONE_DEPTH: f32 = 300.0;

// Power
/// Maximum change per subsystem in one DistributePower action
pub const POWER_SHIFT_LIMIT: i32 = 2;
/// Engine fraction multiplier: balanced allocation reaches full rated speed
pub const ENGINE_SPEED_FACTOR: f32 = 3.0;

// Weapons
/// Lance charge remaining after firing
pub const LANCE_RESIDUAL_CHARGE: f32 = 0.25;
/// Charge added per ChargeLance action
pub const LANCE_CHARGE_STEP: f32 = 1.0;
/// Blast radius of the mega-cannon around the picked location
pub const MEGA_CANNON_BLAST_RADIUS: f32 = 80.0;
/// Mega-cannon damage range (inclusive)
pub const MEGA_CANNON_DAMAGE: (i32, i32) = (3, 7);
/// Relativistic armor: ignore chance per unit of speed fraction, and its cap
pub const RELATIVISTIC_ARMOR_SCALE: f32 = 0.6;
pub const RELATIVISTIC_ARMOR_CAP: f32 = 0.6;

// Strike craft
/// Bombing differential divisor in the damage-chance saturation curve
pub const BOMBING_SATURATION: f32 = 4.0;
/// Bombing differential divisor for the strike-craft critical chance
pub const BOMBING_CRIT_DIVISOR: f32 = 10.0;
pub const BOMBING_CRIT_CAP: f32 = 0.9;
/// Defending turret contribution to the bombing differential
pub const TURRET_DEFENSE_INTACT: f32 = 2.0;
pub const TURRET_DEFENSE_DAMAGED: f32 = 1.0;
/// Wing attrition per point of opposing wing strength per turn
pub const WING_ATTRITION_RATE: f32 = 0.5;

// Boarding
pub const BOARDING_RANGE: f32 = 150.0;
/// Troops required to send a party (sending costs one)
pub const BOARDING_MIN_TROOPS: i32 = 2;

// Abilities
pub const DISRUPTION_PULSE_RADIUS: f32 = 250.0;
pub const JUMP_RANGE: f32 = 600.0;
/// Turns between inertialess drive jumps
pub const JUMP_COOLDOWN: u32 = 2;
/// Hull restored by one Recoalesce action
pub const RECOALESCE_AMOUNT: i32 = 2;

// Sighting
/// An enemy inside this range of any of your ships becomes identified
pub const IDENTIFY_RANGE: f32 = 500.0;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deploy_zones_fit_in_field() {
        assert!(DEPLOY_ZONE_DEPTH * 2.0 < DEFAULT_FIELD_WIDTH);
    }

    #[test]
    fn test_relativistic_armor_never_certain() {
        assert!(RELATIVISTIC_ARMOR_CAP < 1.0);
    }

    #[test]
    fn test_mega_cannon_damage_ordered() {
        assert!(MEGA_CANNON_DAMAGE.0 <= MEGA_CANNON_DAMAGE.1);
    }

    #[test]
    fn test_boarding_needs_a_spare_troop() {
        assert!(BOARDING_MIN_TROOPS >= 2);
    }
}
