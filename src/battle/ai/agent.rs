//! The heuristic agent
//!
//! Drives the same action/event protocol as a human session: it submits an
//! action, then waits for either an explicit rejection (bounded) or the next
//! committed snapshot. On rejection it retries a corrected choice or abandons
//! that sub-choice for the turn. An unhandled internal failure broadcasts a
//! farewell chat and disconnects, forfeiting the battle.

use std::sync::Arc;
use std::time::Duration;

use rand::seq::SliceRandom;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand::SeedableRng;
use tokio::sync::broadcast;

use crate::battle::ai::brain::{Brain, Concern};
use crate::battle::ai::instincts::{Instinct, Instincts};
use crate::battle::boarding;
use crate::battle::constants::{BOARDING_RANGE, JUMP_RANGE};
use crate::battle::initiative::may_act;
use crate::battle::protocol::{Ability, Action, Event};
use crate::battle::session::{SessionEvent, SessionHandle};
use crate::battle::ships::{Module, ModuleStatus, PowerAllocation, ShipInstance};
use crate::battle::state::{BattleState, LogEntry, Phase};
use crate::battle::targeting::{
    deploy_request, jump_request, move_request, validate_pick, weapon_request, PickResponse,
};
use crate::catalog::{Catalog, ReactorMode, WeaponKind};
use crate::core::config::EngineConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::{ShipId, Side};
use crate::geom::Vec2;

/// Sub-choices abandoned for the current decision round
#[derive(Debug, Default)]
struct SkipList {
    ships: Vec<ShipId>,
    done_blocked: bool,
    deploy_failures: u32,
}

impl SkipList {
    fn note(&mut self, action: &Action) {
        let Action::UseAbility { ability } = action else {
            return;
        };
        match ability {
            Ability::DonePhase { .. } => self.done_blocked = true,
            Ability::DeployShip { .. } => self.deploy_failures += 1,
            other => {
                if let Some(ship) = ability_ship(other) {
                    self.ships.push(ship);
                }
            }
        }
    }
}

fn ability_ship(ability: &Ability) -> Option<ShipId> {
    match ability {
        Ability::UndeployShip { ship }
        | Ability::ConfigurePower { ship, .. }
        | Ability::DistributePower { ship, .. }
        | Ability::MoveShip { ship, .. }
        | Ability::UseInertialessDrive { ship, .. }
        | Ability::DisruptionPulse { ship }
        | Ability::BoardingParty { ship, .. }
        | Ability::ChargeLance { ship, .. }
        | Ability::UseWeapon { ship, .. }
        | Ability::RecallStrikeCraft { ship }
        | Ability::RepairShipModule { ship, .. }
        | Ability::ExtinguishFire { ship }
        | Ability::Recoalesce { ship } => Some(*ship),
        Ability::DeployShip { .. } | Ability::DonePhase { .. } => None,
    }
}

enum Confirmation {
    /// Committed; carries the fresh snapshot when one arrived in the window
    Accepted(Option<Box<BattleState>>),
    Rejected(String),
    Ended,
}

/// One side's heuristic controller
pub struct AiAgent {
    side: Side,
    instincts: Instincts,
    brain: Brain,
    rng: ChaCha8Rng,
    /// Log watermark for brain updates
    seen: usize,
}

impl AiAgent {
    pub fn new(side: Side, instincts: Instincts, seed: u64) -> Self {
        Self {
            side,
            instincts,
            brain: Brain::new(),
            rng: ChaCha8Rng::seed_from_u64(seed),
            seen: 0,
        }
    }

    /// Join the session and play until the battle ends
    pub async fn run(mut self, handle: SessionHandle, config: EngineConfig) -> Result<()> {
        let mut events = handle.subscribe();
        handle.join(self.side).await?;
        match self.run_inner(&handle, &mut events, &config).await {
            Ok(()) => Ok(()),
            Err(error) => {
                tracing::error!(side = ?self.side, %error, "agent failed; forfeiting");
                let _ = handle
                    .submit(
                        self.side,
                        Action::SendChatMessage {
                            text: "My command systems are failing. The field is yours.".into(),
                        },
                    )
                    .await;
                tokio::time::sleep(Duration::from_millis(config.forfeit_grace_ms)).await;
                let _ = handle.submit(self.side, Action::Disconnect).await;
                Err(error)
            }
        }
    }

    async fn run_inner(
        &mut self,
        handle: &SessionHandle,
        events: &mut broadcast::Receiver<SessionEvent>,
        config: &EngineConfig,
    ) -> Result<()> {
        loop {
            let event = self.recv_for_us(events).await?;
            match &*event {
                Event::GameEnd { .. } => return Ok(()),
                // A rejection outside a submission window is stale
                Event::InvalidAction { .. } => {}
                Event::StateChange { state } => {
                    let mut current = state.clone();
                    self.observe(&current);
                    let mut skip = SkipList::default();
                    loop {
                        let Some(action) = self.decide(&current, &skip) else {
                            break;
                        };
                        match self
                            .submit_and_confirm(handle, events, action.clone(), config)
                            .await?
                        {
                            Confirmation::Accepted(Some(new_state)) => {
                                self.observe(&new_state);
                                current = new_state;
                                skip = SkipList::default();
                            }
                            Confirmation::Accepted(None) => break,
                            Confirmation::Rejected(message) => {
                                tracing::debug!(
                                    side = ?self.side,
                                    %message,
                                    "action rejected; adjusting"
                                );
                                skip.note(&action);
                            }
                            Confirmation::Ended => return Ok(()),
                        }
                    }
                }
            }
        }
    }

    async fn recv_for_us(
        &self,
        events: &mut broadcast::Receiver<SessionEvent>,
    ) -> Result<Arc<Event>> {
        loop {
            match events.recv().await {
                Ok(event) if event.addressed_to(self.side) => return Ok(event.event),
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    tracing::warn!(side = ?self.side, missed, "agent lagged behind events");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    return Err(BattleError::SessionClosed("event stream closed".into()))
                }
            }
        }
    }

    async fn submit_and_confirm(
        &mut self,
        handle: &SessionHandle,
        events: &mut broadcast::Receiver<SessionEvent>,
        action: Action,
        config: &EngineConfig,
    ) -> Result<Confirmation> {
        handle.submit(self.side, action).await?;
        let window = Duration::from_millis(config.rejection_wait_ms);
        loop {
            match tokio::time::timeout(window, self.recv_for_us(events)).await {
                // No rejection inside the window: assume committed; the
                // snapshot will arrive on the main loop
                Err(_) => return Ok(Confirmation::Accepted(None)),
                Ok(event) => match &*event? {
                    Event::InvalidAction { message } => {
                        return Ok(Confirmation::Rejected(message.clone()))
                    }
                    Event::StateChange { state } => {
                        return Ok(Confirmation::Accepted(Some(state.clone())))
                    }
                    Event::GameEnd { .. } => return Ok(Confirmation::Ended),
                },
            }
        }
    }

    /// Update priority memory from log entries observed since last time
    fn observe(&mut self, state: &BattleState) {
        let anger = self.instincts.get(Instinct::Anger);
        let grudge = self.instincts.get(Instinct::Grudge);
        let mut last_attacker: Option<ShipId> = None;
        let start = self.seen.min(state.log.len());
        for entry in &state.log[start..] {
            match entry {
                LogEntry::Attacked {
                    attacker,
                    target,
                    shield_damage,
                    hull_damage,
                    ..
                } => {
                    if state.owner_of(*target) == Some(self.side) {
                        last_attacker = Some(*attacker);
                        self.brain.adjust(Concern::Priority, *attacker, anger);
                        self.brain.adjust(
                            Concern::Threat,
                            *attacker,
                            (*shield_damage + *hull_damage) as f64 * 0.5,
                        );
                    }
                }
                LogEntry::AttackFailed {
                    attacker, target, ..
                } => {
                    if state.owner_of(*attacker) == Some(self.side) {
                        self.brain.adjust(Concern::Priority, *target, -0.1);
                    }
                }
                LogEntry::BoardingResolved {
                    attacker, target, ..
                } => {
                    if state.owner_of(*target) == Some(self.side) {
                        last_attacker = Some(*attacker);
                        self.brain.adjust(Concern::Priority, *attacker, anger);
                    }
                }
                LogEntry::ShipDestroyed { ship } => {
                    match state.owner_of(*ship) {
                        Some(owner) if owner == self.side => {
                            if let Some(killer) = last_attacker {
                                self.brain.adjust(Concern::Priority, killer, grudge);
                            }
                        }
                        _ => self.brain.forget(*ship),
                    }
                }
                _ => {}
            }
        }
        self.seen = state.log.len();
    }

    /// Choose the next action for the current snapshot, or None to go idle
    fn decide(&mut self, state: &BattleState, skip: &SkipList) -> Option<Action> {
        match state.phase {
            Phase::Deploy => self.decide_deploy(state, skip),
            Phase::Power(_) => self.decide_power(state, skip),
            Phase::Move(_) => self.decide_move(state, skip),
            Phase::Attack(_) => self.decide_attack(state, skip),
            Phase::Repair(_) => self.decide_repair(state, skip),
        }
    }

    fn done_action(&self, state: &BattleState, skip: &SkipList) -> Option<Action> {
        if skip.done_blocked || state.done.contains(&self.side) {
            return None;
        }
        Some(Action::UseAbility {
            ability: Ability::DonePhase { phase: state.phase },
        })
    }

    /// Our live ships that have not acted this phase, in a stable order
    fn ready_ships<'a>(
        &self,
        state: &'a BattleState,
        skip: &SkipList,
    ) -> Vec<&'a ShipInstance> {
        let mut ships: Vec<&ShipInstance> = state
            .live_ships(self.side)
            .filter(|s| !s.done && !skip.ships.contains(&s.id))
            .collect();
        ships.sort_by_key(|s| s.id);
        ships
    }

    // === DEPLOY ===

    fn decide_deploy(&mut self, state: &BattleState, skip: &SkipList) -> Option<Action> {
        if state.done.contains(&self.side) {
            return None;
        }
        let budget = *state.budget_remaining.get(self.side);
        let affordable: Vec<_> = state
            .undeployed
            .get(self.side)
            .iter()
            .copied()
            .filter(|&class| Catalog::global().class(class).point_cost() <= budget)
            .collect();
        if affordable.is_empty() || skip.deploy_failures >= 4 {
            return self.done_action(state, skip);
        }

        let weights: Vec<f64> = affordable
            .iter()
            .map(|&class| {
                self.instincts
                    .weight_preference(Catalog::global().class(class).weight_class)
                    .max(0.01)
            })
            .collect();
        let choices: Vec<usize> = (0..affordable.len()).collect();
        let &index = choices
            .choose_weighted(&mut self.rng, |&i| weights[i])
            .ok()?;
        let class = affordable[index];

        let request = deploy_request(state, self.side, class);
        let zone = state.setup.deploy_zone(self.side);
        for _ in 0..10 {
            let location = sample_in(&zone, &mut self.rng)?;
            let response = PickResponse::Location { location };
            if validate_pick(state, &request, &response).is_ok() {
                return Some(Action::UseAbility {
                    ability: Ability::DeployShip { class, location },
                });
            }
        }
        // The zone is crowded; let the engine arbitrate a best-effort spot
        let location = sample_in(&zone, &mut self.rng)?;
        Some(Action::UseAbility {
            ability: Ability::DeployShip { class, location },
        })
    }

    // === POWER ===

    fn decide_power(&mut self, state: &BattleState, skip: &SkipList) -> Option<Action> {
        for ship in self.ready_ships(state, skip) {
            let class = ship.class();
            let reactor = ship.stats().reactor_output;
            if class.faction.fixed_reactor() {
                // Mode by hull deficit: hurt ships hide behind shields
                let mode = if ship.hull * 2 < class.max_hull() {
                    ReactorMode::Aegis
                } else {
                    ReactorMode::Assault
                };
                if ship.power != PowerAllocation::for_mode(mode, reactor) {
                    return Some(Action::UseAbility {
                        ability: Ability::ConfigurePower {
                            ship: ship.id,
                            mode,
                        },
                    });
                }
                continue;
            }
            if let Some(allocation) = rebalance_power(ship) {
                return Some(Action::UseAbility {
                    ability: Ability::DistributePower {
                        ship: ship.id,
                        allocation,
                    },
                });
            }
        }
        self.done_action(state, skip)
    }

    // === MOVE ===

    fn decide_move(&mut self, state: &BattleState, skip: &SkipList) -> Option<Action> {
        if !may_act(state, self.side) {
            return None;
        }
        let identified: Vec<&ShipInstance> = state
            .identified
            .get(self.side)
            .iter()
            .filter_map(|id| state.ship(*id))
            .collect();

        for ship in self.ready_ships(state, skip) {
            if ship.mobility_coefficient() <= 0.0 {
                continue;
            }
            let request = move_request(state, ship.id)?;

            if identified.is_empty() {
                // Nobody sighted yet: press toward the enemy deployment edge
                let toward = enemy_edge_center(state, self.side);
                let destination = request.boundary.closest_point(toward);
                let response = PickResponse::Location {
                    location: destination,
                };
                if destination.distance(&ship.position) > 1.0
                    && validate_pick(state, &request, &response).is_ok()
                {
                    return Some(Action::UseAbility {
                        ability: Ability::MoveShip {
                            ship: ship.id,
                            destination,
                        },
                    });
                }
                continue;
            }

            let mut candidates: Vec<(Action, f64)> = Vec::new();
            let half = ship.turn_half_angle();
            let reach = ship.max_move_distance();
            for turn_fraction in [-1.0f32, -0.5, 0.0, 0.5, 1.0] {
                for speed_fraction in [0.5f32, 1.0] {
                    let heading = ship.facing + half * turn_fraction;
                    let destination =
                        ship.position + Vec2::from_heading(heading) * (reach * speed_fraction);
                    if !state.setup.contains(destination) {
                        continue;
                    }
                    let response = PickResponse::Location {
                        location: destination,
                    };
                    if validate_pick(state, &request, &response).is_err() {
                        continue;
                    }
                    let score = self.position_score(ship, destination, &identified);
                    candidates.push((
                        Action::UseAbility {
                            ability: Ability::MoveShip {
                                ship: ship.id,
                                destination,
                            },
                        },
                        score,
                    ));
                }
            }

            // Drive-jump option for the alternate-mobility faction
            if ship.class().faction.has_inertialess_drive() && ship.jump_cooldown == 0 {
                if let Some(mark) = self.priority_target(&identified) {
                    let toward = (mark.position - ship.position).normalize();
                    let destination = ship.position + toward * (JUMP_RANGE * 0.9);
                    if state.setup.contains(destination) {
                        if let Some(jump) = jump_request(state, ship.id) {
                            let response = PickResponse::Location {
                                location: destination,
                            };
                            if validate_pick(state, &jump, &response).is_ok() {
                                let score =
                                    self.position_score(ship, destination, &identified) * 1.2;
                                candidates.push((
                                    Action::UseAbility {
                                        ability: Ability::UseInertialessDrive {
                                            ship: ship.id,
                                            destination,
                                        },
                                    },
                                    score,
                                ));
                            }
                        }
                    }
                }
            }

            if candidates.is_empty() {
                continue;
            }
            return Some(weighted_pick(candidates, &mut self.rng));
        }
        self.done_action(state, skip)
    }

    /// Opportunity minus vulnerability at a candidate end position
    fn position_score(
        &mut self,
        ship: &ShipInstance,
        position: Vec2,
        enemies: &[&ShipInstance],
    ) -> f64 {
        let opportunism = self.instincts.get(Instinct::Opportunism);
        let caution = self.instincts.get(Instinct::Caution);
        let mut opportunity = 0.0;
        let mut vulnerability = 0.0;
        for enemy in enemies {
            let distance = position.distance(&enemy.position) as f64;
            let closeness = 1.0 / (1.0 + distance / 400.0);
            opportunity += self.brain.get(Concern::Priority, enemy.id) * closeness;
            let menace =
                enemy.class().point_cost() as f64 + self.brain.get(Concern::Threat, enemy.id);
            vulnerability += menace * closeness;
        }
        let fragility = 1.0 - ship.hull as f64 / ship.class().max_hull() as f64;
        opportunism * opportunity - caution * vulnerability * (0.5 + fragility)
    }

    fn priority_target<'a>(
        &mut self,
        enemies: &[&'a ShipInstance],
    ) -> Option<&'a ShipInstance> {
        enemies
            .iter()
            .max_by(|a, b| {
                let pa = self.brain.get(Concern::Priority, a.id);
                let pb = self.brain.get(Concern::Priority, b.id);
                pa.partial_cmp(&pb).unwrap_or(std::cmp::Ordering::Equal)
            })
            .copied()
    }

    // === ATTACK ===

    fn decide_attack(&mut self, state: &BattleState, skip: &SkipList) -> Option<Action> {
        if !may_act(state, self.side) {
            return None;
        }
        let focus = self.instincts.get(Instinct::Focus);
        let prey = self.instincts.get(Instinct::PreyOnWeak);
        let aggression = self.instincts.get(Instinct::Aggression);
        let zeal = self.instincts.get(Instinct::BoardingZeal);

        let mut attacks: Vec<(Action, f64)> = Vec::new();
        let mut boardings: Vec<(Action, f64)> = Vec::new();

        for ship in self.ready_ships(state, skip) {
            let class = ship.class();
            for (index, mount) in class.mounts.iter().enumerate() {
                if !ship.weapon_usable(index) {
                    continue;
                }
                let weapon_state = &ship.weapons[index];
                if mount.kind == WeaponKind::Lance && weapon_state.charge < 1.0 {
                    attacks.push((
                        Action::UseAbility {
                            ability: Ability::ChargeLance {
                                ship: ship.id,
                                weapon: index,
                            },
                        },
                        0.8 * aggression,
                    ));
                    continue;
                }
                let Some(request) = weapon_request(state, ship.id, index) else {
                    continue;
                };
                if mount.kind.is_area() {
                    if let Some((aim, score)) =
                        self.area_aim(state, &request.boundary, focus, prey)
                    {
                        attacks.push((
                            Action::UseAbility {
                                ability: Ability::UseWeapon {
                                    ship: ship.id,
                                    weapon: index,
                                    pick: PickResponse::Location { location: aim },
                                },
                            },
                            score,
                        ));
                    }
                    continue;
                }
                if mount.kind == WeaponKind::FighterHangar {
                    // Wings at home already defend the carrier; escorting is
                    // only worth it for a heavier hull
                    if let Some(ward) = state
                        .live_ships(self.side)
                        .filter(|s| s.id != ship.id)
                        .filter(|s| s.class().point_cost() > class.point_cost())
                        .max_by_key(|s| s.class().point_cost())
                    {
                        let response = PickResponse::Ship { ship: ward.id };
                        if validate_pick(state, &request, &response).is_ok() {
                            attacks.push((
                                Action::UseAbility {
                                    ability: Ability::UseWeapon {
                                        ship: ship.id,
                                        weapon: index,
                                        pick: response,
                                    },
                                },
                                0.4,
                            ));
                        }
                    }
                    continue;
                }
                for enemy in state.live_ships(self.side.opponent()) {
                    let response = PickResponse::Ship { ship: enemy.id };
                    if validate_pick(state, &request, &response).is_err() {
                        continue;
                    }
                    let expected = expected_damage(ship, index, enemy);
                    if expected <= 0.0 {
                        continue;
                    }
                    let priority = self.brain.get(Concern::Priority, enemy.id).powf(focus);
                    let fragility =
                        1.0 - enemy.hull as f64 / enemy.class().max_hull() as f64;
                    let score = expected * priority * (1.0 + prey * fragility);
                    attacks.push((
                        Action::UseAbility {
                            ability: Ability::UseWeapon {
                                ship: ship.id,
                                weapon: index,
                                pick: response,
                            },
                        },
                        score,
                    ));
                }
            }

            if ship.class().faction.has_disruption_pulse() && ship.can_disruption_pulse() {
                let near = state
                    .live_ships(self.side.opponent())
                    .filter(|e| {
                        e.position.distance(&ship.position)
                            <= crate::battle::constants::DISRUPTION_PULSE_RADIUS
                    })
                    .count();
                if near > 0 {
                    attacks.push((
                        Action::UseAbility {
                            ability: Ability::DisruptionPulse { ship: ship.id },
                        },
                        near as f64 * 0.7,
                    ));
                }
            }

            if ship.can_send_boarding() {
                for enemy in state.live_ships(self.side.opponent()) {
                    if ship.position.distance(&enemy.position) > BOARDING_RANGE {
                        continue;
                    }
                    let edge = boarding::assault_score(ship) - boarding::defense_score(enemy);
                    boardings.push((
                        Action::UseAbility {
                            ability: Ability::BoardingParty {
                                ship: ship.id,
                                target: enemy.id,
                            },
                        },
                        (edge as f64 + 3.0).max(0.5),
                    ));
                }
            }
        }

        // Small fixed chance to go for a boarding action instead, and the
        // fallback when no attack is viable
        if !boardings.is_empty() && (attacks.is_empty() || self.rng.gen::<f64>() < zeal) {
            return Some(weighted_pick(boardings, &mut self.rng));
        }
        if attacks.is_empty() {
            return self.done_action(state, skip);
        }
        Some(weighted_pick(attacks, &mut self.rng))
    }

    /// Aim point and score for an area weapon
    ///
    /// The aim is the defender's closest point on the firing boundary,
    /// biased slightly past it toward the target where the boundary allows.
    fn area_aim(
        &mut self,
        state: &BattleState,
        boundary: &crate::geom::PickBoundary,
        focus: f64,
        prey: f64,
    ) -> Option<(Vec2, f64)> {
        use crate::battle::constants::MEGA_CANNON_BLAST_RADIUS;
        let mut best: Option<(Vec2, f64)> = None;
        for enemy in state.live_ships(self.side.opponent()) {
            let anchor = boundary.closest_point(enemy.position);
            let toward = (enemy.position - anchor).normalize();
            let biased = anchor + toward * 4.0;
            let aim = if boundary.contains(biased) { biased } else { anchor };

            let mut score = 0.0;
            for other in state.ships.values() {
                if other.position.distance(&aim) > MEGA_CANNON_BLAST_RADIUS {
                    continue;
                }
                let value = 5.0
                    * self.brain.get(Concern::Priority, other.id).powf(focus)
                    * (1.0 + prey * (1.0 - other.hull as f64 / other.class().max_hull() as f64));
                if other.owner == self.side {
                    score -= value * 1.5;
                } else {
                    score += value;
                }
            }
            if score > best.map_or(0.0, |(_, s)| s) {
                best = Some((aim, score));
            }
        }
        best
    }

    // === REPAIR ===

    fn decide_repair(&mut self, state: &BattleState, skip: &SkipList) -> Option<Action> {
        for ship in self.ready_ships(state, skip) {
            let mut options: Vec<Ability> = Vec::new();
            for module in Module::ALL {
                if matches!(
                    ship.modules.get(module),
                    ModuleStatus::Damaged | ModuleStatus::Destroyed
                ) {
                    options.push(Ability::RepairShipModule {
                        ship: ship.id,
                        module,
                    });
                }
            }
            if ship.fires > 0 {
                options.push(Ability::ExtinguishFire { ship: ship.id });
            }
            if ship.class().faction.amorphous() && ship.hull < ship.class().max_hull() {
                options.push(Ability::Recoalesce { ship: ship.id });
            }
            if let Some(ability) = options.choose(&mut self.rng) {
                return Some(Action::UseAbility {
                    ability: ability.clone(),
                });
            }
        }
        self.done_action(state, skip)
    }
}

/// Shift power between shields and engines toward the ship's current needs
///
/// Hurt ships pull engine power into shields, sized by the shield deficit;
/// whole ships drift back toward an even spread. Returns None when the
/// allocation is already where the heuristic wants it.
fn rebalance_power(ship: &ShipInstance) -> Option<PowerAllocation> {
    use crate::battle::constants::POWER_SHIFT_LIMIT;
    let reactor = ship.stats().reactor_output;
    let current = ship.power;
    let hurt = ship.hull < ship.class().max_hull();
    if hurt {
        let deficit = (reactor / 2 - current.shields).max(0);
        let shift = deficit.min(current.engines).min(POWER_SHIFT_LIMIT);
        if shift > 0 {
            return Some(PowerAllocation {
                weapons: current.weapons,
                shields: current.shields + shift,
                engines: current.engines - shift,
            });
        }
    } else if current.shields > reactor / 3 && current.engines < reactor / 3 {
        return Some(PowerAllocation {
            weapons: current.weapons,
            shields: current.shields - 1,
            engines: current.engines + 1,
        });
    }
    None
}

/// Uniform point inside a rectangular boundary
fn sample_in(boundary: &crate::geom::PickBoundary, rng: &mut ChaCha8Rng) -> Option<Vec2> {
    match boundary {
        crate::geom::PickBoundary::Rect { min, max } => Some(Vec2::new(
            rng.gen_range(min.x..max.x),
            rng.gen_range(min.y..max.y),
        )),
        _ => None,
    }
}

/// Center of the opposing deploy edge: where the enemy must have come from
fn enemy_edge_center(state: &BattleState, side: Side) -> Vec2 {
    let x = match side {
        Side::Crimson => state.setup.field_width,
        Side::Cobalt => 0.0,
    };
    Vec2::new(x, state.setup.field_height / 2.0)
}

/// Expected damage heuristic for one (ship, weapon, target) triple
fn expected_damage(ship: &ShipInstance, index: usize, target: &ShipInstance) -> f64 {
    let mount = &ship.class().mounts[index];
    let shots = ship.effective_shots(index) as f64;
    let distance = ship.position.distance(&target.position).max(1.0) as f64;
    match mount.kind {
        WeaponKind::Cannon => {
            let p = (target.stats().base_hull_radius as f64 / distance)
                .sqrt()
                .min(1.0)
                * ship.class().cannon_accuracy as f64;
            shots * p
        }
        WeaponKind::Lance => {
            let p = 1.0 - (-ship.weapons[index].charge as f64).exp();
            shots * p
        }
        WeaponKind::Torpedo => {
            if target.shield > 0 {
                0.5
            } else {
                2.0
            }
        }
        WeaponKind::RevelationGun => target.class().point_cost() as f64 * 2.0,
        WeaponKind::EmpAntenna => (target.shield + target.weapon_power) as f64 * 0.4,
        WeaponKind::BomberHangar => ship.weapons[index]
            .wing
            .map_or(0.0, |w| w.strength as f64 * 0.6),
        WeaponKind::FighterHangar | WeaponKind::MegaCannon => 0.0,
    }
}

/// Weighted random choice; weights are shifted to be strictly positive
fn weighted_pick(mut candidates: Vec<(Action, f64)>, rng: &mut ChaCha8Rng) -> Action {
    let min = candidates
        .iter()
        .map(|(_, s)| *s)
        .fold(f64::INFINITY, f64::min);
    for (_, score) in candidates.iter_mut() {
        *score = *score - min + 0.1;
    }
    let total: f64 = candidates.iter().map(|(_, s)| s).sum();
    let mut roll = rng.gen::<f64>() * total;
    for (action, score) in &candidates {
        roll -= score;
        if roll <= 0.0 {
            return action.clone();
        }
    }
    candidates
        .last()
        .map(|(action, _)| action.clone())
        .expect("weighted_pick called with candidates")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battle::phases::{apply_action, open_battle, ActionOutcome};
    use crate::battle::state::{BattleSetup, BattleSize, PerSide};
    use crate::core::types::Player;

    fn fresh_agent(side: Side) -> AiAgent {
        AiAgent::new(side, Instincts::new(5), 5)
    }

    fn deploy_state(crimson: &[&str], cobalt: &[&str]) -> BattleState {
        let catalog = Catalog::global();
        let ids = |names: &[&str]| {
            names
                .iter()
                .map(|n| catalog.by_name(n).unwrap().id)
                .collect::<Vec<_>>()
        };
        let mut state = BattleState::new(
            BattleSetup::new(BattleSize::Skirmish, PerSide::new(ids(crimson), ids(cobalt))),
            Player::new("a", Side::Crimson),
            Player::new("b", Side::Cobalt),
        );
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        open_battle(&mut state, &mut rng);
        state
    }

    /// Let both agents drive the deploy phase through the real engine
    fn agents_deploy(state: &mut BattleState) {
        let mut crimson = fresh_agent(Side::Crimson);
        let mut cobalt = fresh_agent(Side::Cobalt);
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut guard = 0;
        while state.phase == Phase::Deploy {
            guard += 1;
            assert!(guard < 200, "deploy never converged");
            for agent in [&mut crimson, &mut cobalt] {
                let skip = SkipList::default();
                if let Some(action) = agent.decide(state, &skip) {
                    let _ = apply_action(state, agent.side, &action, &mut rng);
                }
            }
        }
    }

    #[test]
    fn test_agent_deploys_until_budget_exhausted() {
        let mut state = deploy_state(
            &["Vigil", "Vigil", "Vigil", "Vigil", "Vigil", "Vigil"],
            &["Vigil", "Vigil", "Vigil", "Vigil", "Vigil", "Vigil"],
        );
        agents_deploy(&mut state);
        assert_eq!(state.phase, Phase::Power(1));
        // Budget 10, cost 2 each: five ships per side
        assert_eq!(state.live_count(Side::Crimson), 5);
        assert_eq!(state.live_count(Side::Cobalt), 5);
    }

    #[test]
    fn test_agent_declares_done_when_nothing_affordable() {
        let mut state = deploy_state(&["Vigil"], &["Vigil"]);
        let mut agent = fresh_agent(Side::Crimson);
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let skip = SkipList::default();

        let first = agent.decide(&state, &skip).expect("deploys first");
        assert!(matches!(
            first,
            Action::UseAbility {
                ability: Ability::DeployShip { .. }
            }
        ));
        assert_eq!(
            apply_action(&mut state, Side::Crimson, &first, &mut rng),
            ActionOutcome::Applied
        );

        let second = agent.decide(&state, &skip).expect("then declares done");
        assert!(matches!(
            second,
            Action::UseAbility {
                ability: Ability::DonePhase {
                    phase: Phase::Deploy
                }
            }
        ));
    }

    #[test]
    fn test_agent_waits_without_initiative() {
        let mut state = deploy_state(&["Vigil"], &["Bulwark"]);
        agents_deploy(&mut state);
        let mut rng = ChaCha8Rng::seed_from_u64(6);
        for side in Side::ALL {
            let action = Action::UseAbility {
                ability: Ability::DonePhase {
                    phase: Phase::Power(1),
                },
            };
            apply_action(&mut state, side, &action, &mut rng);
        }
        assert_eq!(state.phase, Phase::Move(1));
        // Cobalt's cruiser holds initiative; crimson must idle
        assert_eq!(state.initiative, Some(Side::Cobalt));
        let mut crimson = fresh_agent(Side::Crimson);
        let skip = SkipList::default();
        assert!(crimson.decide(&state, &skip).is_none());
        // Cobalt acts
        let mut cobalt = fresh_agent(Side::Cobalt);
        assert!(cobalt.decide(&state, &skip).is_some());
    }

    #[test]
    fn test_agent_repairs_damaged_module() {
        let mut state = deploy_state(&["Vigil"], &["Vigil"]);
        agents_deploy(&mut state);
        state.phase = Phase::Repair(2);
        let id = state.live_ships(Side::Crimson).next().unwrap().id;
        state
            .ship_mut(id)
            .unwrap()
            .modules
            .degrade(Module::Engines);
        let mut agent = fresh_agent(Side::Crimson);
        let skip = SkipList::default();
        let action = agent.decide(&state, &skip).expect("repairs something");
        assert!(matches!(
            action,
            Action::UseAbility {
                ability: Ability::RepairShipModule { .. }
            }
        ));
    }

    #[test]
    fn test_agent_attacks_identified_enemy_in_range() {
        let mut state = deploy_state(&["Vigil"], &["Vigil"]);
        agents_deploy(&mut state);
        state.phase = Phase::Attack(1);
        // Drag the fleets into cannon range of each other
        let crimson_id = state.live_ships(Side::Crimson).next().unwrap().id;
        let cobalt_id = state.live_ships(Side::Cobalt).next().unwrap().id;
        state.ship_mut(crimson_id).unwrap().position = Vec2::new(900.0, 700.0);
        state.ship_mut(crimson_id).unwrap().facing = 0.0;
        state.ship_mut(cobalt_id).unwrap().position = Vec2::new(1050.0, 700.0);
        state.update_identification();
        crate::battle::initiative::recompute_initiative(&mut state);

        let mut agent = fresh_agent(Side::Crimson);
        if state.initiative != Some(Side::Crimson) {
            return; // tie-break sanity; crimson wins ties so this won't happen
        }
        let skip = SkipList::default();
        let action = agent.decide(&state, &skip).expect("finds an attack");
        match action {
            Action::UseAbility {
                ability: Ability::UseWeapon { pick, .. },
            } => assert_eq!(pick, PickResponse::Ship { ship: cobalt_id }),
            Action::UseAbility {
                ability: Ability::BoardingParty { target, .. },
            } => assert_eq!(target, cobalt_id),
            other => panic!("expected an attack, got {:?}", other),
        }
    }

    #[test]
    fn test_observe_raises_priority_of_attackers() {
        let mut state = deploy_state(&["Vigil"], &["Vigil"]);
        agents_deploy(&mut state);
        let our_ship = state.live_ships(Side::Crimson).next().unwrap().id;
        let their_ship = state.live_ships(Side::Cobalt).next().unwrap().id;
        let mut agent = fresh_agent(Side::Crimson);
        agent.observe(&state);
        let before = agent.brain.get(Concern::Priority, their_ship);

        state.push_log(LogEntry::Attacked {
            attacker: their_ship,
            target: our_ship,
            weapon: WeaponKind::Cannon,
            shield_damage: 1,
            hull_damage: 1,
        });
        agent.observe(&state);
        assert!(agent.brain.get(Concern::Priority, their_ship) > before);
        assert!(agent.brain.get(Concern::Threat, their_ship) > 0.0);
    }

    #[test]
    fn test_weighted_pick_returns_member() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let candidates = vec![
            (Action::TimeOut, 1.0),
            (Action::Disconnect, 2.0),
        ];
        for _ in 0..50 {
            let pick = weighted_pick(candidates.clone(), &mut rng);
            assert!(candidates.iter().any(|(a, _)| *a == pick));
        }
    }
}
