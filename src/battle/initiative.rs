//! Initiative scoring
//!
//! Initiative is recomputed from scratch after every done declaration and
//! every state-changing action inside the gated phases; nothing is cached.
//! Ties break by the fixed side order (Crimson before Cobalt) so the result
//! never depends on map iteration order.

use crate::battle::state::{BattleState, Phase};
use crate::core::types::Side;

/// Move-phase score: point cost weighted by remaining mobility
pub fn move_score(state: &BattleState, side: Side) -> f32 {
    state
        .live_ships(side)
        .filter(|ship| !ship.done)
        .map(|ship| ship.class().point_cost() as f32 * ship.mobility_coefficient())
        .sum()
}

/// Attack-phase score: point cost weighted by the fraction of shots still usable
///
/// Boarding and disruption-pulse capability each count as one extra shot
/// while available.
pub fn attack_score(state: &BattleState, side: Side) -> f32 {
    state
        .live_ships(side)
        .map(|ship| {
            let class = ship.class();
            let mut total: u32 = 0;
            let mut usable: u32 = 0;
            for (index, mount) in class.mounts.iter().enumerate() {
                total += mount.initiative_shots();
                if ship.weapon_usable(index) {
                    usable += ship.effective_shots(index) * mount.arcs.len() as u32;
                }
            }
            if class.max_troops() > 0 {
                total += 1;
                if ship.can_send_boarding() {
                    usable += 1;
                }
            }
            if class.faction.has_disruption_pulse() {
                total += 1;
                if ship.can_disruption_pulse() {
                    usable += 1;
                }
            }
            if total == 0 {
                0.0
            } else {
                class.point_cost() as f32 * usable as f32 / total as f32
            }
        })
        .sum()
}

/// Recompute who holds initiative for the current phase
///
/// Only Move and Attack are initiative-gated; in every other phase the
/// holder is cleared. A controller qualifies while it has live ships and has
/// not declared done.
pub fn recompute_initiative(state: &mut BattleState) {
    let score = |state: &BattleState, side: Side| match state.phase {
        Phase::Move(_) => move_score(state, side),
        Phase::Attack(_) => attack_score(state, side),
        _ => 0.0,
    };

    if !state.phase.initiative_gated() {
        state.initiative = None;
        return;
    }

    let mut best: Option<(Side, f32)> = None;
    for side in Side::ALL {
        if state.done.contains(&side) || state.live_count(side) == 0 {
            continue;
        }
        let s = score(state, side);
        // Strictly-greater keeps the earlier side on exact ties
        if best.map_or(true, |(_, b)| s > b) {
            best = Some((side, s));
        }
    }
    state.initiative = best.map(|(side, _)| side);
}

/// May this side submit a non-chat, non-done action right now?
pub fn may_act(state: &BattleState, side: Side) -> bool {
    if !state.phase.initiative_gated() {
        return true;
    }
    match state.initiative {
        Some(holder) => holder == side,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::ships::{Module, ShipInstance};
    use crate::battle::state::{BattleSetup, BattleSize, PerSide};
    use crate::catalog::Catalog;
    use crate::core::types::Player;
    use crate::geom::Vec2;

    fn state_with(crimson: &[&str], cobalt: &[&str]) -> BattleState {
        let catalog = Catalog::global();
        let ids = |names: &[&str]| {
            names
                .iter()
                .map(|n| catalog.by_name(n).unwrap().id)
                .collect::<Vec<_>>()
        };
        let setup = BattleSetup::new(
            BattleSize::Skirmish,
            PerSide::new(ids(crimson), ids(cobalt)),
        );
        let mut state = BattleState::new(
            setup,
            Player::new("a", Side::Crimson),
            Player::new("b", Side::Cobalt),
        );
        for (side, names) in [(Side::Crimson, crimson), (Side::Cobalt, cobalt)] {
            for name in names {
                let class = catalog.by_name(name).unwrap();
                let ship = ShipInstance::new(class.id, side, Vec2::new(100.0, 100.0), 0.0);
                state.ships.insert(ship.id, ship);
            }
        }
        state
    }

    #[test]
    fn test_move_score_counts_unacted_ships() {
        let mut state = state_with(&["Vigil", "Bulwark"], &["Vigil"]);
        state.phase = Phase::Move(1);
        // 2 (escort) + 5 (cruiser) vs 2
        assert_eq!(move_score(&state, Side::Crimson), 7.0);
        assert_eq!(move_score(&state, Side::Cobalt), 2.0);

        // Acting removes a ship from the score
        let id = state.live_ships(Side::Crimson).next().unwrap().id;
        state.ship_mut(id).unwrap().done = true;
        assert!(move_score(&state, Side::Crimson) < 7.0);
    }

    #[test]
    fn test_destroyed_engines_zero_the_coefficient() {
        let mut state = state_with(&["Vigil"], &["Vigil"]);
        state.phase = Phase::Move(1);
        let id = state.live_ships(Side::Crimson).next().unwrap().id;
        let ship = state.ship_mut(id).unwrap();
        ship.modules.degrade(Module::Engines);
        ship.modules.degrade(Module::Engines);
        assert_eq!(move_score(&state, Side::Crimson), 0.0);
    }

    #[test]
    fn test_initiative_goes_to_higher_score() {
        let mut state = state_with(&["Vigil"], &["Bulwark"]);
        state.phase = Phase::Move(1);
        recompute_initiative(&mut state);
        assert_eq!(state.initiative, Some(Side::Cobalt));
    }

    #[test]
    fn test_initiative_tie_breaks_to_crimson() {
        let mut state = state_with(&["Vigil"], &["Vigil"]);
        state.phase = Phase::Move(1);
        recompute_initiative(&mut state);
        assert_eq!(state.initiative, Some(Side::Crimson));
    }

    #[test]
    fn test_done_controller_never_holds_initiative() {
        let mut state = state_with(&["Bulwark"], &["Vigil"]);
        state.phase = Phase::Move(1);
        state.mark_done(Side::Crimson);
        recompute_initiative(&mut state);
        assert_eq!(state.initiative, Some(Side::Cobalt));
        state.mark_done(Side::Cobalt);
        recompute_initiative(&mut state);
        assert_eq!(state.initiative, None);
    }

    #[test]
    fn test_initiative_cleared_outside_gated_phases() {
        let mut state = state_with(&["Vigil"], &["Vigil"]);
        state.phase = Phase::Move(1);
        recompute_initiative(&mut state);
        assert!(state.initiative.is_some());
        state.phase = Phase::Repair(1);
        recompute_initiative(&mut state);
        assert!(state.initiative.is_none());
    }

    #[test]
    fn test_attack_score_shrinks_as_weapons_fire() {
        let mut state = state_with(&["Bulwark"], &["Vigil"]);
        state.phase = Phase::Attack(1);
        let fresh = attack_score(&state, Side::Crimson);
        assert!(fresh > 0.0);
        let id = state.live_ships(Side::Crimson).next().unwrap().id;
        state.ship_mut(id).unwrap().weapons[0].used = true;
        let spent = attack_score(&state, Side::Crimson);
        assert!(spent < fresh);
    }

    #[test]
    fn test_may_act_respects_holder() {
        let mut state = state_with(&["Bulwark"], &["Vigil"]);
        state.phase = Phase::Attack(1);
        recompute_initiative(&mut state);
        assert_eq!(state.initiative, Some(Side::Crimson));
        assert!(may_act(&state, Side::Crimson));
        assert!(!may_act(&state, Side::Cobalt));
        // Ungated phases are open to both
        state.phase = Phase::Power(1);
        recompute_initiative(&mut state);
        assert!(may_act(&state, Side::Cobalt));
    }
}
