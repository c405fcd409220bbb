//! The heuristic AI: personality, memory, and phase policies
//!
//! The agent drives the same protocol as a human session. Nothing in here
//! touches BattleState directly; all influence flows through submitted
//! actions, all knowledge through received snapshots and the battle log.

pub mod agent;
pub mod brain;
pub mod instincts;

pub use agent::AiAgent;
pub use brain::{Brain, Concern};
pub use instincts::{Instinct, Instincts};
