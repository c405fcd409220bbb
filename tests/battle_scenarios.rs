//! End-to-end battle scenarios driven through the action engine

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use voidclash::battle::*;
use voidclash::catalog::{Catalog, WeaponKind};
use voidclash::core::types::{Player, Side};
use voidclash::geom::Vec2;

fn setup_battle(crimson: &[&str], cobalt: &[&str]) -> BattleState {
    let catalog = Catalog::global();
    let ids = |names: &[&str]| {
        names
            .iter()
            .map(|n| catalog.by_name(n).unwrap().id)
            .collect::<Vec<_>>()
    };
    BattleState::new(
        BattleSetup::new(BattleSize::Skirmish, PerSide::new(ids(crimson), ids(cobalt))),
        Player::new("attacker", Side::Crimson),
        Player::new("defender", Side::Cobalt),
    )
}

fn place(state: &mut BattleState, side: Side, class_name: &str, position: Vec2) -> voidclash::core::types::ShipId {
    let class = Catalog::global().by_name(class_name).unwrap();
    let ship = ShipInstance::new(class.id, side, position, 0.0);
    let id = ship.id;
    state.ships.insert(id, ship);
    id
}

fn use_weapon(
    state: &mut BattleState,
    side: Side,
    ship: voidclash::core::types::ShipId,
    weapon: usize,
    pick: PickResponse,
    rng: &mut ChaCha8Rng,
) -> ActionOutcome {
    apply_action(
        state,
        side,
        &Action::UseAbility {
            ability: Ability::UseWeapon { ship, weapon, pick },
        },
        rng,
    )
}

/// Scenario 1: a guaranteed-hit cannon volley deals exactly num_shots damage
///
/// The Dart's cannon has accuracy 1.0; at distance equal to the target's
/// base hull radius every shot hits. The Attacked log entry carries the raw
/// cannon damage; critical follow-ups are logged separately.
#[test]
fn scenario_cannon_guaranteed_hit() {
    let mut state = setup_battle(&["Dart"], &["Vigil"]);
    let dart_class = Catalog::global().by_name("Dart").unwrap();
    assert_eq!(dart_class.cannon_accuracy, 1.0);
    let num_shots = dart_class.mounts[0].num_shots as i32;

    let radius = Catalog::global()
        .by_name("Vigil")
        .unwrap()
        .weight_class
        .stats()
        .base_hull_radius;
    let attacker = place(&mut state, Side::Crimson, "Dart", Vec2::new(500.0, 500.0));
    let target = place(
        &mut state,
        Side::Cobalt,
        "Vigil",
        Vec2::new(500.0 + radius, 500.0),
    );
    // Bare hull so the volley lands on hull, not shields
    state.ship_mut(target).unwrap().shield = 0;
    state.phase = Phase::Attack(1);
    recompute_initiative(&mut state);
    assert_eq!(state.initiative, Some(Side::Crimson));

    let mut rng = ChaCha8Rng::seed_from_u64(1234);
    let outcome = use_weapon(
        &mut state,
        Side::Crimson,
        attacker,
        0,
        PickResponse::Ship { ship: target },
        &mut rng,
    );
    assert!(!matches!(outcome, ActionOutcome::Rejected(_)));

    let cannon_damage = state
        .log
        .iter()
        .find_map(|entry| match entry {
            LogEntry::Attacked {
                weapon: WeaponKind::Cannon,
                shield_damage,
                hull_damage,
                ..
            } => Some((*shield_damage, *hull_damage)),
            _ => None,
        })
        .expect("cannon volley logged");
    assert_eq!(cannon_damage, (0, num_shots));
}

/// Scenario 2: a torpedo against a bare hull always deals exactly 2
#[test]
fn scenario_torpedo_unshielded() {
    for seed in 0..20 {
        let mut state = setup_battle(&["Bulwark"], &["Vigil"]);
        let attacker = place(&mut state, Side::Crimson, "Bulwark", Vec2::new(500.0, 500.0));
        let target = place(&mut state, Side::Cobalt, "Vigil", Vec2::new(650.0, 500.0));
        state.ship_mut(target).unwrap().shield = 0;
        state.phase = Phase::Attack(1);
        recompute_initiative(&mut state);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = use_weapon(
            &mut state,
            Side::Crimson,
            attacker,
            1, // the Bulwark's torpedo tube
            PickResponse::Ship { ship: target },
            &mut rng,
        );
        assert!(!matches!(outcome, ActionOutcome::Rejected(_)));

        let torpedo_damage = state
            .log
            .iter()
            .find_map(|entry| match entry {
                LogEntry::Attacked {
                    weapon: WeaponKind::Torpedo,
                    shield_damage,
                    hull_damage,
                    ..
                } => Some((*shield_damage, *hull_damage)),
                _ => None,
            })
            .expect("torpedo hit logged; no coin-flip branch on a bare hull");
        assert_eq!(torpedo_damage, (0, 2), "seed {}", seed);
    }
}

/// Scenario 3: the Revelation Gun destroys regardless of hull and shield
#[test]
fn scenario_revelation_gun_destroys() {
    for seed in 0..20 {
        let mut state = setup_battle(&["Revelation"], &["Imperator"]);
        let attacker = place(
            &mut state,
            Side::Crimson,
            "Revelation",
            Vec2::new(500.0, 500.0),
        );
        let target = place(
            &mut state,
            Side::Cobalt,
            "Imperator",
            Vec2::new(800.0, 500.0),
        );
        state.phase = Phase::Attack(1);
        recompute_initiative(&mut state);

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let outcome = use_weapon(
            &mut state,
            Side::Crimson,
            attacker,
            0,
            PickResponse::Ship { ship: target },
            &mut rng,
        );
        // The battle ends: the defender's only ship is destroyed
        match outcome {
            ActionOutcome::Ended(Event::GameEnd { winner, .. }) => {
                assert_eq!(winner, Some(Side::Crimson), "seed {}", seed);
            }
            other => panic!("expected game end, got {:?} (seed {})", other, seed),
        }
        assert!(state.ship(target).is_none());
        assert!(!state.wrecks[&target].escaped);
    }
}

/// Scenario 3b: the gun's single round is spent even when the battle goes on
#[test]
fn scenario_revelation_gun_one_use() {
    let mut state = setup_battle(&["Revelation"], &["Vigil", "Vigil"]);
    let attacker = place(
        &mut state,
        Side::Crimson,
        "Revelation",
        Vec2::new(500.0, 500.0),
    );
    let first = place(&mut state, Side::Cobalt, "Vigil", Vec2::new(800.0, 500.0));
    let second = place(&mut state, Side::Cobalt, "Vigil", Vec2::new(800.0, 700.0));
    state.phase = Phase::Attack(1);
    recompute_initiative(&mut state);

    let mut rng = ChaCha8Rng::seed_from_u64(9);
    let outcome = use_weapon(
        &mut state,
        Side::Crimson,
        attacker,
        0,
        PickResponse::Ship { ship: first },
        &mut rng,
    );
    assert!(matches!(outcome, ActionOutcome::Applied));
    assert!(state.ship(first).is_none());

    // Second shot this battle is rejected: the magazine is empty
    let outcome = use_weapon(
        &mut state,
        Side::Crimson,
        attacker,
        0,
        PickResponse::Ship { ship: second },
        &mut rng,
    );
    assert!(matches!(outcome, ActionOutcome::Rejected(_)));
}

/// Scenario 4: a Vendetta mark that dies resolves Won; one that escapes, Lost
#[test]
fn scenario_vendetta() {
    // Destruction path
    let mut state = setup_battle(&["Dart"], &["Vigil"]);
    let _attacker = place(&mut state, Side::Crimson, "Dart", Vec2::new(500.0, 500.0));
    let target = place(&mut state, Side::Cobalt, "Vigil", Vec2::new(650.0, 500.0));
    let mut vendetta = Subplot::new(SubplotKind::Vendetta, Side::Crimson);
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    vendetta.after_deploy_ships(&state, &mut rng);
    assert_eq!(vendetta.bound, Some(target));
    state.subplots.push(vendetta);

    state.phase = Phase::Attack(1);
    state.wreck_ship(target, false);
    let mut subplots = std::mem::take(&mut state.subplots);
    for subplot in &mut subplots {
        subplot.after_state_changed(&state);
    }
    state.subplots = subplots;
    let end = finalize(&state, Some(Side::Crimson), "done".into());
    let Event::GameEnd { subplots, .. } = end else {
        panic!("finalize builds a game end");
    };
    let report = subplots
        .iter()
        .find(|r| r.kind == SubplotKind::Vendetta)
        .unwrap();
    assert_eq!(report.outcome, SubplotOutcome::Won);

    // Escape path
    let mut state = setup_battle(&["Dart"], &["Vigil"]);
    place(&mut state, Side::Crimson, "Dart", Vec2::new(500.0, 500.0));
    let runaway = place(&mut state, Side::Cobalt, "Vigil", Vec2::new(650.0, 500.0));
    let mut vendetta = Subplot::new(SubplotKind::Vendetta, Side::Crimson);
    vendetta.after_deploy_ships(&state, &mut rng);
    assert_eq!(vendetta.bound, Some(runaway));
    state.wreck_ship(runaway, true);
    vendetta.after_state_changed(&state);
    assert_eq!(vendetta.outcome, SubplotOutcome::Lost);
    assert_eq!(
        vendetta.final_outcome(&state, Some(Side::Crimson)),
        SubplotOutcome::Lost
    );
}

/// Scenario 5: both fleets dying in the same resolution is a draw
#[test]
fn scenario_mutual_destruction() {
    let mut state = setup_battle(&["Vigil"], &["Vigil"]);
    let crimson = place(&mut state, Side::Crimson, "Vigil", Vec2::new(500.0, 500.0));
    let cobalt = place(&mut state, Side::Cobalt, "Vigil", Vec2::new(900.0, 500.0));
    state.phase = Phase::Attack(1);
    // Both ships one hit from death, both guaranteed at least one fire hit
    for id in [crimson, cobalt] {
        let ship = state.ship_mut(id).unwrap();
        ship.hull = 1;
        ship.fires = 2;
    }
    recompute_initiative(&mut state);

    let mut rng = ChaCha8Rng::seed_from_u64(17);
    let mut last = ActionOutcome::Applied;
    for side in Side::ALL {
        last = apply_action(
            &mut state,
            side,
            &Action::UseAbility {
                ability: Ability::DonePhase {
                    phase: Phase::Attack(1),
                },
            },
            &mut rng,
        );
        if matches!(last, ActionOutcome::Ended(_)) {
            break;
        }
    }
    match last {
        ActionOutcome::Ended(Event::GameEnd { winner, message, .. }) => {
            assert_eq!(winner, None);
            assert!(message.to_lowercase().contains("mutual"));
        }
        other => panic!("expected a draw, got {:?}", other),
    }
    assert!(state.wrecks.contains_key(&crimson));
    assert!(state.wrecks.contains_key(&cobalt));
}

/// The full loop: two seeded agents fight a real battle under the trial
/// runner's wall-clock budget; a stalled battle is cancelled, never hung
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn scenario_ai_self_play_under_budget() {
    let mut config = voidclash::core::config::EngineConfig::default();
    config.rejection_wait_ms = 50;
    let report = voidclash::trials::run_trials(config, 1, 2024).await;
    assert_eq!(report.requested, 1);
    assert_eq!(report.completed + report.cancelled, 1);
    assert_eq!(
        report.crimson_wins + report.cobalt_wins + report.draws,
        report.completed
    );
}
