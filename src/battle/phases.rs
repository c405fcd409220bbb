//! The phase state machine and action application
//!
//! `apply_action` is the single entry point through which the session actor
//! mutates a battle. Every gameplay-rule violation resolves to a rejection
//! with the state untouched; handlers validate completely before mutating.

use rand::Rng;

use crate::battle::boarding::{resolve_boarding, BoardingOutcome};
use crate::battle::constants::{
    BOARDING_RANGE, DISRUPTION_PULSE_RADIUS, JUMP_COOLDOWN, LANCE_CHARGE_STEP,
    RECOALESCE_AMOUNT,
};
use crate::battle::initiative::{may_act, recompute_initiative};
use crate::battle::protocol::{Ability, Action, Event, SubplotReport};
use crate::battle::ships::{ModuleStatus, ShipInstance};
use crate::battle::state::{BattleState, LogEntry, Phase};
use crate::battle::subplots::create_subplots;
use crate::battle::targeting::{
    deploy_request, jump_request, move_request, validate_pick, weapon_request, PickResponse,
};
use crate::battle::weapons::{
    apply_boarding_criticals, check_ship_death, fire_area, fire_at_ship, resolve_fires,
    resolve_strike_craft,
};
use crate::catalog::{Catalog, ShipClassId, WeaponKind};
use crate::core::types::{ShipId, Side};
use crate::geom::Vec2;

/// Result of applying one action
#[derive(Debug, Clone, PartialEq)]
pub enum ActionOutcome {
    /// State mutated; a fresh snapshot should be broadcast
    Applied,
    /// State unchanged; only the submitter hears about it
    Rejected(String),
    /// Terminal: always carries an `Event::GameEnd`
    Ended(Event),
}

/// Seed a fresh battle's subplots; call once before the first action
pub fn open_battle(state: &mut BattleState, rng: &mut impl Rng) {
    state.subplots = create_subplots(state.setup.size.subplot_count(), rng);
}

/// Apply one submitted action to the state
pub fn apply_action(
    state: &mut BattleState,
    side: Side,
    action: &Action,
    rng: &mut impl Rng,
) -> ActionOutcome {
    match action {
        Action::SendChatMessage { text } => {
            state.push_log(LogEntry::Chat {
                side,
                text: text.clone(),
            });
            run_subplot_hooks(state);
            ActionOutcome::Applied
        }
        Action::TimeOut => ActionOutcome::Ended(finalize(
            state,
            None,
            "Battle abandoned: a controller timed out".into(),
        )),
        Action::Disconnect => ActionOutcome::Ended(finalize(
            state,
            Some(side.opponent()),
            format!("{:?} disconnected", side),
        )),
        Action::UseAbility { ability } => {
            // Initiative gating: done declarations stay open to both sides
            if state.phase.initiative_gated()
                && !matches!(ability, Ability::DonePhase { .. })
                && !may_act(state, side)
            {
                return ActionOutcome::Rejected("not holding initiative".into());
            }
            match apply_ability(state, side, ability, rng) {
                Err(message) => ActionOutcome::Rejected(message),
                Ok(()) => post_process(state),
            }
        }
    }
}

/// Identification, subplot hooks, victory scan, initiative recompute
fn post_process(state: &mut BattleState) -> ActionOutcome {
    state.update_identification();
    run_subplot_hooks(state);
    if state.phase != Phase::Deploy {
        if let Some(winner) = state.victory_scan() {
            let message = match winner {
                None => "Mutual destruction: both fleets are gone".to_string(),
                Some(side) => format!("{:?} fleet destroyed", side.opponent()),
            };
            return ActionOutcome::Ended(finalize(state, winner, message));
        }
    }
    recompute_initiative(state);
    ActionOutcome::Applied
}

fn run_subplot_hooks(state: &mut BattleState) {
    let mut subplots = std::mem::take(&mut state.subplots);
    for subplot in &mut subplots {
        subplot.after_state_changed(state);
    }
    state.subplots = subplots;
}

/// Build the terminal event, finalizing every subplot against the winner
pub fn finalize(state: &BattleState, winner: Option<Side>, message: String) -> Event {
    let subplots = state
        .subplots
        .iter()
        .map(|subplot| {
            let outcome = subplot.final_outcome(state, winner);
            let (objective, _) = subplot.display_objective(state);
            SubplotReport {
                kind: subplot.kind,
                owner: subplot.owner,
                outcome,
                objective,
            }
        })
        .collect();
    Event::GameEnd {
        winner,
        message,
        subplots,
    }
}

fn apply_ability(
    state: &mut BattleState,
    side: Side,
    ability: &Ability,
    rng: &mut impl Rng,
) -> Result<(), String> {
    match ability {
        Ability::DeployShip { class, location } => deploy_ship(state, side, *class, *location),
        Ability::UndeployShip { ship } => undeploy_ship(state, side, *ship),
        Ability::DonePhase { phase } => done_phase(state, side, *phase, rng),
        Ability::ConfigurePower { ship, mode } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Power(_)),
                "not the power phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            require(!instance.done, "ship already acted this phase")?;
            require(
                instance.class().faction.fixed_reactor(),
                "this reactor distributes power freely",
            )?;
            let reactor = instance.stats().reactor_output;
            let instance = state.ship_mut(ship).expect("checked");
            instance.power = crate::battle::ships::PowerAllocation::for_mode(*mode, reactor);
            instance.clamp_pools();
            instance.done = true;
            Ok(())
        }
        Ability::DistributePower { ship, allocation } => {
            use crate::battle::constants::POWER_SHIFT_LIMIT;
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Power(_)),
                "not the power phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            require(!instance.done, "ship already acted this phase")?;
            require(
                !instance.class().faction.fixed_reactor(),
                "fixed reactors switch modes instead",
            )?;
            require(allocation.non_negative(), "negative power allocation")?;
            require(
                allocation.total() <= instance.stats().reactor_output,
                "allocation exceeds reactor output",
            )?;
            let current = instance.power;
            let within_limits = (allocation.weapons - current.weapons).abs()
                <= POWER_SHIFT_LIMIT
                && (allocation.shields - current.shields).abs() <= POWER_SHIFT_LIMIT
                && (allocation.engines - current.engines).abs() <= POWER_SHIFT_LIMIT;
            require(within_limits, "power shift too large for one phase")?;
            let instance = state.ship_mut(ship).expect("checked");
            instance.power = *allocation;
            instance.clamp_pools();
            instance.done = true;
            Ok(())
        }
        Ability::MoveShip { ship, destination } => move_ship(state, side, *ship, *destination),
        Ability::UseInertialessDrive { ship, destination } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Move(_)),
                "not the move phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            require(!instance.done, "ship already moved")?;
            require(
                instance.class().faction.has_inertialess_drive(),
                "no inertialess drive fitted",
            )?;
            require(instance.jump_cooldown == 0, "drive still recharging")?;
            require(
                state.setup.contains(*destination),
                "jump must end inside the field",
            )?;
            let request = jump_request(state, ship).expect("ship checked");
            validate_pick(
                state,
                &request,
                &PickResponse::Location {
                    location: *destination,
                },
            )?;
            let instance = state.ship_mut(ship).expect("checked");
            instance.position = *destination;
            instance.velocity = Vec2::ZERO;
            instance.jump_cooldown = JUMP_COOLDOWN;
            instance.done = true;
            Ok(())
        }
        Ability::DisruptionPulse { ship } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Attack(_)),
                "not the attack phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            require(instance.can_disruption_pulse(), "pulse unavailable")?;
            let origin = instance.position;
            let affected: Vec<ShipId> = state
                .live_ships(side.opponent())
                .filter(|s| s.position.distance(&origin) <= DISRUPTION_PULSE_RADIUS)
                .map(|s| s.id)
                .collect();
            for id in affected {
                if let Some(enemy) = state.ship_mut(id) {
                    enemy.shield = (enemy.shield - 1).max(0);
                    for weapon in enemy.weapons.iter_mut() {
                        weapon.charge /= 2.0;
                    }
                }
            }
            state.ship_mut(ship).expect("checked").pulse_used = true;
            state.push_log(LogEntry::DisruptionPulse { ship });
            Ok(())
        }
        Ability::BoardingParty { ship, target } => boarding_party(state, side, *ship, *target, rng),
        Ability::ChargeLance { ship, weapon } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Attack(_)),
                "not the attack phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            let mount = instance
                .class()
                .mounts
                .get(*weapon)
                .ok_or("no such weapon")?;
            require(mount.kind == WeaponKind::Lance, "not a lance")?;
            require(instance.weapon_usable(*weapon), "weapon unavailable")?;
            let instance = state.ship_mut(ship).expect("checked");
            instance.weapons[*weapon].charge += LANCE_CHARGE_STEP;
            instance.weapons[*weapon].used = true;
            instance.weapon_power -= 1;
            Ok(())
        }
        Ability::UseWeapon { ship, weapon, pick } => use_weapon(state, side, *ship, *weapon, pick, rng),
        Ability::RecallStrikeCraft { ship } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Attack(_)),
                "not the attack phase",
            )?;
            let instance = state.ship_mut(ship).expect("checked");
            for weapon in instance.weapons.iter_mut() {
                if let Some(wing) = weapon.wing.as_mut() {
                    wing.deployed_against = None;
                }
            }
            Ok(())
        }
        Ability::RepairShipModule { ship, module } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Repair(_)),
                "not the repair phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            require(!instance.done, "ship already repaired this phase")?;
            let status = instance.modules.get(*module);
            require(
                matches!(status, ModuleStatus::Damaged | ModuleStatus::Destroyed),
                "module needs no repair",
            )?;
            let instance = state.ship_mut(ship).expect("checked");
            instance.modules.set(*module, status.repaired());
            instance.done = true;
            Ok(())
        }
        Ability::ExtinguishFire { ship } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Repair(_)),
                "not the repair phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            require(!instance.done, "ship already repaired this phase")?;
            require(instance.fires > 0, "nothing is burning")?;
            let instance = state.ship_mut(ship).expect("checked");
            instance.fires -= 1;
            instance.done = true;
            Ok(())
        }
        Ability::Recoalesce { ship } => {
            let ship = owned_ship(state, side, *ship)?;
            require(
                matches!(state.phase, Phase::Repair(_)),
                "not the repair phase",
            )?;
            let instance = state.ship(ship).expect("checked");
            require(!instance.done, "ship already repaired this phase")?;
            require(
                instance.class().faction.amorphous(),
                "only amorphous hulls recoalesce",
            )?;
            require(
                instance.hull < instance.class().max_hull(),
                "hull already whole",
            )?;
            let max = instance.class().max_hull();
            let instance = state.ship_mut(ship).expect("checked");
            instance.hull = (instance.hull + RECOALESCE_AMOUNT).min(max);
            instance.done = true;
            Ok(())
        }
    }
}

fn require(condition: bool, message: &str) -> Result<(), String> {
    if condition {
        Ok(())
    } else {
        Err(message.to_string())
    }
}

/// Resolve a ship id that must exist and belong to the acting side
fn owned_ship(state: &BattleState, side: Side, id: ShipId) -> Result<ShipId, String> {
    let ship = state.ship(id).ok_or("no such ship")?;
    if ship.owner != side {
        return Err("not your ship".into());
    }
    Ok(id)
}

fn deploy_ship(
    state: &mut BattleState,
    side: Side,
    class: ShipClassId,
    location: Vec2,
) -> Result<(), String> {
    require(state.phase == Phase::Deploy, "not the deploy phase")?;
    let index = state
        .undeployed
        .get(side)
        .iter()
        .position(|&c| c == class)
        .ok_or("class not in your remaining fleet")?;
    let cost = Catalog::global().class(class).point_cost();
    require(
        cost <= *state.budget_remaining.get(side),
        "cannot afford that ship",
    )?;
    let request = deploy_request(state, side, class);
    validate_pick(state, &request, &PickResponse::Location { location })?;

    state.undeployed.get_mut(side).remove(index);
    *state.budget_remaining.get_mut(side) -= cost;
    let facing = state.setup.deploy_facing(side);
    let ship = ShipInstance::new(class, side, location, facing);
    let id = ship.id;
    state.ships.insert(id, ship);
    state.push_log(LogEntry::ShipDeployed { ship: id, side });
    Ok(())
}

fn undeploy_ship(state: &mut BattleState, side: Side, id: ShipId) -> Result<(), String> {
    require(state.phase == Phase::Deploy, "not the deploy phase")?;
    owned_ship(state, side, id)?;
    let ship = state.ships.remove(&id).expect("checked");
    state.undeployed.get_mut(side).push(ship.class);
    *state.budget_remaining.get_mut(side) += ship.class().point_cost();
    state.push_log(LogEntry::ShipUndeployed { ship: id });
    Ok(())
}

fn done_phase(
    state: &mut BattleState,
    side: Side,
    declared: Phase,
    rng: &mut impl Rng,
) -> Result<(), String> {
    require(declared == state.phase, "done declared for a stale phase")?;
    if state.phase == Phase::Deploy {
        require(
            !state.can_afford_any(side),
            "you can still afford to deploy a ship",
        )?;
    }
    state.mark_done(side);
    if state.all_done() {
        advance_phase(state, rng);
    }
    Ok(())
}

fn move_ship(
    state: &mut BattleState,
    side: Side,
    id: ShipId,
    destination: Vec2,
) -> Result<(), String> {
    let id = owned_ship(state, side, id)?;
    require(matches!(state.phase, Phase::Move(_)), "not the move phase")?;
    let instance = state.ship(id).expect("checked");
    require(!instance.done, "ship already moved")?;
    require(
        instance.mobility_coefficient() > 0.0,
        "engines are destroyed",
    )?;
    let request = move_request(state, id).expect("ship checked");
    let escaping = !state.setup.contains(destination);
    if escaping {
        // Off-field moves only need to be reachable; there is nothing to
        // collide with outside the boundary
        require(
            request.boundary.contains(destination),
            "destination out of reach",
        )?;
        state.wreck_ship(id, true);
        return Ok(());
    }
    validate_pick(state, &request, &PickResponse::Location { location: destination })?;
    let instance = state.ship_mut(id).expect("checked");
    let travel = destination - instance.position;
    if travel.length() > 1e-3 {
        instance.facing = travel.heading();
    }
    instance.velocity = travel;
    instance.position = destination;
    instance.done = true;
    Ok(())
}

fn boarding_party(
    state: &mut BattleState,
    side: Side,
    id: ShipId,
    target: ShipId,
    rng: &mut impl Rng,
) -> Result<(), String> {
    let id = owned_ship(state, side, id)?;
    require(
        matches!(state.phase, Phase::Attack(_)),
        "not the attack phase",
    )?;
    let attacker = state.ship(id).expect("checked");
    require(attacker.can_send_boarding(), "no boarding party available")?;
    let defender = state.ship(target).ok_or("no such target")?;
    require(defender.owner != side, "cannot board your own ship")?;
    require(
        attacker.position.distance(&defender.position) <= BOARDING_RANGE,
        "target out of boarding range",
    )?;

    // Sending always costs the sender one unit of troop strength
    let resolution = resolve_boarding(attacker, defender, rng);
    {
        let attacker = state.ship_mut(id).expect("checked");
        attacker.troops -= 1;
        attacker.boarding_sent = true;
    }
    state.push_log(LogEntry::BoardingResolved {
        attacker: id,
        target,
        outcome: resolution.outcome,
    });
    match resolution.outcome {
        BoardingOutcome::CascadingCriticals => {
            apply_boarding_criticals(state, id, target, 2, rng)
        }
        BoardingOutcome::SingleCritical => apply_boarding_criticals(state, id, target, 1, rng),
        BoardingOutcome::Repelled { attacker_losses } => {
            if let Some(attacker) = state.ship_mut(id) {
                attacker.troops = (attacker.troops - attacker_losses).max(0);
            }
        }
    }
    check_ship_death(state, id);
    check_ship_death(state, target);
    Ok(())
}

fn use_weapon(
    state: &mut BattleState,
    side: Side,
    id: ShipId,
    index: usize,
    pick: &PickResponse,
    rng: &mut impl Rng,
) -> Result<(), String> {
    let id = owned_ship(state, side, id)?;
    require(
        matches!(state.phase, Phase::Attack(_)),
        "not the attack phase",
    )?;
    let instance = state.ship(id).expect("checked");
    let mount = instance
        .class()
        .mounts
        .get(index)
        .ok_or("no such weapon")?;
    require(instance.weapon_usable(index), "weapon unavailable")?;
    let kind = mount.kind;
    let request = weapon_request(state, id, index).expect("ship checked");
    validate_pick(state, &request, pick)?;
    match (kind.is_area(), pick) {
        (true, PickResponse::Location { location }) => {
            fire_area(state, id, index, *location, rng);
        }
        (false, PickResponse::Ship { ship: target }) => {
            fire_at_ship(state, id, index, *target, rng);
        }
        _ => return Err("response kind does not match weapon".into()),
    }
    Ok(())
}

/// Advance past the current phase, applying its leaving side effects
fn advance_phase(state: &mut BattleState, rng: &mut impl Rng) {
    let next = match state.phase {
        Phase::Deploy => {
            let mut subplots = std::mem::take(&mut state.subplots);
            for subplot in &mut subplots {
                subplot.after_deploy_ships(state, rng);
            }
            state.subplots = subplots;
            Phase::Power(1)
        }
        Phase::Power(turn) => Phase::Move(turn),
        Phase::Move(turn) => {
            let ids: Vec<ShipId> = state.ships.keys().copied().collect();
            for id in ids {
                let ship = state.ship_mut(id).expect("listed");
                if !ship.class().faction.carries_inertia() && !ship.done {
                    ship.velocity = Vec2::ZERO;
                }
                ship.jump_cooldown = ship.jump_cooldown.saturating_sub(1);
            }
            Phase::Attack(turn)
        }
        Phase::Attack(turn) => {
            resolve_strike_craft(state, rng);
            resolve_fires(state, rng);
            for ship in state.ships.values_mut() {
                ship.replenish();
                ship.boarding_sent = false;
                ship.pulse_used = false;
                for weapon in ship.weapons.iter_mut() {
                    weapon.used = false;
                    if let Some(wing) = weapon.wing.as_mut() {
                        wing.deployed_against = None;
                    }
                }
            }
            // The repair interlude belongs to the upcoming turn
            Phase::Repair(turn + 1)
        }
        Phase::Repair(turn) => Phase::Power(turn),
    };
    state.phase = next;
    state.done.clear();
    for ship in state.ships.values_mut() {
        ship.done = false;
    }
    state.push_log(LogEntry::PhaseChanged { phase: next });
    recompute_initiative(state);
}
