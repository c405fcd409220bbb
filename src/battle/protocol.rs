//! The action/event protocol
//!
//! These are the logical message shapes both human sessions and the AI agent
//! speak. Transport and wire framing belong to the collaborator layer; the
//! engine only guarantees that these values round-trip losslessly through
//! serde.

use serde::{Deserialize, Serialize};

use crate::battle::ships::{Module, PowerAllocation};
use crate::battle::state::{BattleState, Phase};
use crate::battle::subplots::{SubplotKind, SubplotOutcome};
use crate::battle::targeting::PickResponse;
use crate::catalog::{ReactorMode, ShipClassId};
use crate::core::types::{ShipId, Side};
use crate::geom::Vec2;

/// One ability request inside a `UseAbility` action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "ability", rename_all = "snake_case")]
pub enum Ability {
    DeployShip {
        class: ShipClassId,
        location: Vec2,
    },
    UndeployShip {
        ship: ShipId,
    },
    DonePhase {
        phase: Phase,
    },
    ConfigurePower {
        ship: ShipId,
        mode: ReactorMode,
    },
    DistributePower {
        ship: ShipId,
        allocation: PowerAllocation,
    },
    MoveShip {
        ship: ShipId,
        destination: Vec2,
    },
    UseInertialessDrive {
        ship: ShipId,
        destination: Vec2,
    },
    DisruptionPulse {
        ship: ShipId,
    },
    BoardingParty {
        ship: ShipId,
        target: ShipId,
    },
    ChargeLance {
        ship: ShipId,
        weapon: usize,
    },
    UseWeapon {
        ship: ShipId,
        weapon: usize,
        pick: PickResponse,
    },
    RecallStrikeCraft {
        ship: ShipId,
    },
    RepairShipModule {
        ship: ShipId,
        module: Module,
    },
    ExtinguishFire {
        ship: ShipId,
    },
    Recoalesce {
        ship: ShipId,
    },
}

/// Controller-to-engine request
///
/// `TimeOut` and `Disconnect` are engine-internal; a well-behaved client
/// never sends them, and the session actor synthesizes them itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    SendChatMessage { text: String },
    UseAbility { ability: Ability },
    TimeOut,
    Disconnect,
}

/// One subplot's final report inside a GameEnd
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubplotReport {
    pub kind: SubplotKind,
    pub owner: Side,
    pub outcome: SubplotOutcome,
    pub objective: String,
}

/// Engine-to-controller response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    StateChange {
        state: Box<BattleState>,
    },
    InvalidAction {
        message: String,
    },
    GameEnd {
        winner: Option<Side>,
        message: String,
        subplots: Vec<SubplotReport>,
    },
}
