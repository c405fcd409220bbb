//! Battle engine - turn-based fleet combat behind a message protocol
//!
//! The authoritative state lives behind a single session actor; phases
//! advance by mutual done-declarations, Move and Attack are gated by a
//! recomputed initiative score, and all randomness flows through a seeded
//! generator injected per battle.

pub mod ai;
pub mod boarding;
pub mod constants;
pub mod criticals;
pub mod initiative;
pub mod phases;
pub mod protocol;
pub mod session;
pub mod ships;
pub mod state;
pub mod subplots;
pub mod targeting;
pub mod weapons;

// Re-exports for convenient access
pub use ai::{AiAgent, Brain, Concern, Instinct, Instincts};
pub use boarding::{
    assault_score, defense_score, resolve_boarding, BoardingOutcome, BoardingResolution,
};
pub use constants::*;
pub use criticals::{apply_critical, critical_roll, CriticalEffect};
pub use initiative::{attack_score, may_act, move_score, recompute_initiative};
pub use phases::{apply_action, finalize, open_battle, ActionOutcome};
pub use protocol::{Ability, Action, Event, SubplotReport};
pub use session::{spawn_session, SessionEvent, SessionHandle};
pub use ships::{
    Impact, Module, ModuleBank, ModuleStatus, PowerAllocation, ShipInstance, WeaponState,
    WingState,
};
pub use state::{
    BattleSetup, BattleSize, BattleState, LogEntry, PerSide, Phase, Wreck,
};
pub use subplots::{Subplot, SubplotKind, SubplotOutcome};
pub use targeting::{
    deploy_request, jump_request, move_request, validate_pick, weapon_request, PickRequest,
    PickResponse, PickType,
};
pub use weapons::{fire_area, fire_at_ship, resolve_fires, resolve_strike_craft};
