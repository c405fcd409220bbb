//! Target picks and their validation
//!
//! A pick request describes what a controller must choose (a location or a
//! ship) and the boundary the choice must fall inside. The same predicate
//! validates human picks and AI picks; there is no privileged path.

use serde::{Deserialize, Serialize};

use crate::battle::state::BattleState;
use crate::catalog::{Catalog, ShipClassId, WeaponKind};
use crate::core::types::{ShipId, Side};
use crate::geom::{PickBoundary, Vec2};

/// What kind of response a pick request expects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "pick", rename_all = "snake_case")]
pub enum PickType {
    Location {
        /// Ships whose hull radius the location must stay clear of
        exclude: Vec<ShipId>,
        /// Blast-radius preview for the UI; no gameplay effect
        helper_radius: Option<f32>,
        /// Optional reference line origin for the UI
        reference: Option<Vec2>,
    },
    Ship {
        /// Sides a picked ship may belong to
        sides: Vec<Side>,
    },
}

/// A request for one pick
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PickRequest {
    pub pick: PickType,
    pub boundary: PickBoundary,
}

/// A controller's answer to a pick request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "choice", rename_all = "snake_case")]
pub enum PickResponse {
    Location { location: Vec2 },
    Ship { ship: ShipId },
}

/// Validate a response against a request; Err carries the rejection reason
pub fn validate_pick(
    state: &BattleState,
    request: &PickRequest,
    response: &PickResponse,
) -> Result<(), String> {
    match (&request.pick, response) {
        (
            PickType::Location { exclude, .. },
            PickResponse::Location { location },
        ) => {
            if !request.boundary.contains(*location) {
                return Err("location outside boundary".into());
            }
            for id in exclude {
                if let Some(ship) = state.ship(*id) {
                    if ship.position.distance(location) < ship.stats().base_hull_radius {
                        return Err("location overlaps a ship".into());
                    }
                }
            }
            Ok(())
        }
        (PickType::Ship { sides }, PickResponse::Ship { ship }) => {
            let instance = state
                .ship(*ship)
                .ok_or_else(|| "no such ship".to_string())?;
            if !sides.contains(&instance.owner) {
                return Err("ship belongs to the wrong side".into());
            }
            if !request.boundary.contains(instance.position) {
                return Err("ship outside boundary".into());
            }
            Ok(())
        }
        _ => Err("response kind does not match request".into()),
    }
}

/// Pick request for deploying a ship of `class` for `side`
pub fn deploy_request(state: &BattleState, side: Side, class: ShipClassId) -> PickRequest {
    let helper = Catalog::global()
        .class(class)
        .weight_class
        .stats()
        .base_hull_radius;
    PickRequest {
        pick: PickType::Location {
            exclude: state.ships.keys().copied().collect(),
            helper_radius: Some(helper),
            reference: None,
        },
        boundary: state.setup.deploy_zone(side),
    }
}

/// Pick request for a conventional move of `ship`
pub fn move_request(state: &BattleState, ship: ShipId) -> Option<PickRequest> {
    let instance = state.ship(ship)?;
    Some(PickRequest {
        pick: PickType::Location {
            exclude: state
                .ships
                .keys()
                .copied()
                .filter(|id| *id != ship)
                .collect(),
            helper_radius: None,
            reference: Some(instance.position),
        },
        boundary: PickBoundary::Wedge {
            origin: instance.position,
            heading: instance.facing,
            half_angle: instance.turn_half_angle(),
            radius: instance.max_move_distance(),
        },
    })
}

/// Pick request for an inertialess drive jump
pub fn jump_request(state: &BattleState, ship: ShipId) -> Option<PickRequest> {
    use crate::battle::constants::JUMP_RANGE;
    let instance = state.ship(ship)?;
    Some(PickRequest {
        pick: PickType::Location {
            exclude: state
                .ships
                .keys()
                .copied()
                .filter(|id| *id != ship)
                .collect(),
            helper_radius: None,
            reference: Some(instance.position),
        },
        boundary: PickBoundary::Circle {
            center: instance.position,
            radius: JUMP_RANGE,
        },
    })
}

/// Pick request for firing weapon `index` of `ship`
///
/// Area weapons ask for a location inside the firing arcs; everything else
/// asks for an enemy ship inside them.
pub fn weapon_request(state: &BattleState, ship: ShipId, index: usize) -> Option<PickRequest> {
    use crate::battle::constants::MEGA_CANNON_BLAST_RADIUS;
    let instance = state.ship(ship)?;
    let mount = instance.class().mounts.get(index)?;
    let boundary = PickBoundary::FiringArcs {
        origin: instance.position,
        facing: instance.facing,
        hull_radius: instance.stats().base_hull_radius,
        range: mount.range,
        arcs: mount.arcs.clone(),
    };
    let pick = if mount.kind.is_area() {
        PickType::Location {
            exclude: Vec::new(),
            helper_radius: Some(MEGA_CANNON_BLAST_RADIUS),
            reference: Some(instance.position),
        }
    } else if mount.kind == WeaponKind::FighterHangar {
        // Fighters escort friendly hulls
        PickType::Ship {
            sides: vec![instance.owner],
        }
    } else {
        PickType::Ship {
            sides: vec![instance.owner.opponent()],
        }
    };
    Some(PickRequest { pick, boundary })
}
