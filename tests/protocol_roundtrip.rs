//! Lossless serde round-trips for every protocol and state value

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use voidclash::battle::*;
use voidclash::catalog::Catalog;
use voidclash::core::types::{Player, ShipId, Side};
use voidclash::geom::Vec2;

fn busy_state() -> BattleState {
    let catalog = Catalog::global();
    let crimson_fleet = vec![
        catalog.by_name("Sovereign").unwrap().id,
        catalog.by_name("Vigil").unwrap().id,
    ];
    let cobalt_fleet = vec![
        catalog.by_name("Tide").unwrap().id,
        catalog.by_name("Whisper").unwrap().id,
    ];
    let mut state = BattleState::new(
        BattleSetup::new(
            BattleSize::Engagement,
            PerSide::new(crimson_fleet, cobalt_fleet),
        ),
        Player::new("Alice", Side::Crimson),
        Player::new("Bot", Side::Cobalt),
    );
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    open_battle(&mut state, &mut rng);

    // Populate with ships in assorted states
    let sovereign = catalog.by_name("Sovereign").unwrap().id;
    let whisper = catalog.by_name("Whisper").unwrap().id;
    let mut a = ShipInstance::new(sovereign, Side::Crimson, Vec2::new(400.0, 300.0), 0.4);
    a.fires = 2;
    a.modules.degrade(Module::Turrets);
    a.weapons[0].used = true;
    a.velocity = Vec2::new(30.0, -12.0);
    let mut b = ShipInstance::new(whisper, Side::Cobalt, Vec2::new(900.0, 800.0), 2.0);
    b.shield = 1;
    b.jump_cooldown = 2;
    let (a_id, b_id) = (a.id, b.id);
    state.ships.insert(a_id, a);
    state.ships.insert(b_id, b);

    let dead = ShipInstance::new(sovereign, Side::Cobalt, Vec2::new(10.0, 10.0), 0.0);
    let dead_id = dead.id;
    state.ships.insert(dead_id, dead);
    state.wreck_ship(dead_id, false);

    state.phase = Phase::Attack(3);
    state.mark_done(Side::Cobalt);
    state.initiative = Some(Side::Crimson);
    state.push_log(LogEntry::Chat {
        side: Side::Crimson,
        text: "engaging".into(),
    });
    state.push_log(LogEntry::Attacked {
        attacker: a_id,
        target: b_id,
        weapon: voidclash::catalog::WeaponKind::Cannon,
        shield_damage: 1,
        hull_damage: 2,
    });
    state.update_identification();
    state
}

#[test]
fn test_battle_state_round_trip() {
    let state = busy_state();
    let json = serde_json::to_string(&state).expect("state serializes");
    let back: BattleState = serde_json::from_str(&json).expect("state deserializes");
    assert_eq!(state, back);
}

#[test]
fn test_state_round_trip_is_idempotent() {
    let state = busy_state();
    let once = serde_json::to_string(&state).unwrap();
    let back: BattleState = serde_json::from_str(&once).unwrap();
    let twice = serde_json::to_string(&back).unwrap();
    let again: BattleState = serde_json::from_str(&twice).unwrap();
    assert_eq!(back, again);
}

#[test]
fn test_every_ability_round_trips() {
    let ship = ShipId::new();
    let abilities = vec![
        Ability::DeployShip {
            class: Catalog::global().by_name("Vigil").unwrap().id,
            location: Vec2::new(120.0, 340.0),
        },
        Ability::UndeployShip { ship },
        Ability::DonePhase {
            phase: Phase::Repair(4),
        },
        Ability::ConfigurePower {
            ship,
            mode: voidclash::catalog::ReactorMode::Assault,
        },
        Ability::DistributePower {
            ship,
            allocation: PowerAllocation {
                weapons: 3,
                shields: 2,
                engines: 1,
            },
        },
        Ability::MoveShip {
            ship,
            destination: Vec2::new(55.5, 66.25),
        },
        Ability::UseInertialessDrive {
            ship,
            destination: Vec2::new(700.0, 100.0),
        },
        Ability::DisruptionPulse { ship },
        Ability::BoardingParty {
            ship,
            target: ShipId::new(),
        },
        Ability::ChargeLance { ship, weapon: 0 },
        Ability::UseWeapon {
            ship,
            weapon: 2,
            pick: PickResponse::Location {
                location: Vec2::new(10.0, 20.0),
            },
        },
        Ability::RecallStrikeCraft { ship },
        Ability::RepairShipModule {
            ship,
            module: Module::Shields,
        },
        Ability::ExtinguishFire { ship },
        Ability::Recoalesce { ship },
    ];
    for ability in abilities {
        let action = Action::UseAbility {
            ability: ability.clone(),
        };
        let json = serde_json::to_string(&action).unwrap();
        let back: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, back, "{:?}", ability);
    }
}

#[test]
fn test_events_round_trip_including_state_change() {
    let state = busy_state();
    let events = vec![
        Event::StateChange {
            state: Box::new(state),
        },
        Event::InvalidAction {
            message: "wrong phase".into(),
        },
        Event::GameEnd {
            winner: None,
            message: "Mutual destruction".into(),
            subplots: vec![SubplotReport {
                kind: SubplotKind::Arsonist,
                owner: Side::Crimson,
                outcome: SubplotOutcome::Lost,
                objective: "Set 3 enemy ships alight (1 so far)".into(),
            }],
        },
    ];
    for event in events {
        let json = serde_json::to_string(&event).unwrap();
        let back: Event = serde_json::from_str(&json).unwrap();
        assert_eq!(event, back);
    }
}

#[test]
fn test_pick_requests_round_trip() {
    let state = busy_state();
    let ship = *state.ships.keys().next().unwrap();
    let requests = [
        deploy_request(&state, Side::Crimson, Catalog::global().by_name("Vigil").unwrap().id),
        move_request(&state, ship).unwrap(),
        jump_request(&state, ship).unwrap(),
        weapon_request(&state, ship, 0).unwrap(),
    ];
    for request in requests {
        let json = serde_json::to_string(&request).unwrap();
        let back: PickRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(request, back);
    }
}
