//! The session actor: single writer of one battle's state
//!
//! All mutation happens inside one task applying one action at a time;
//! controllers and the AI agent hold only channel handles and read-only
//! snapshots. Rejections are routed to the submitter alone; state changes
//! and the terminal event go to everyone.

use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tokio::sync::{broadcast, mpsc};

use crate::battle::phases::{apply_action, finalize, open_battle, ActionOutcome};
use crate::battle::protocol::{Action, Event};
use crate::battle::state::BattleState;
use crate::core::config::EngineConfig;
use crate::core::error::{BattleError, Result};
use crate::core::types::Side;

/// An event with its addressee; `to: None` means both controllers
#[derive(Debug, Clone)]
pub struct SessionEvent {
    pub to: Option<Side>,
    pub event: Arc<Event>,
}

impl SessionEvent {
    /// Is this event for the given controller?
    pub fn addressed_to(&self, side: Side) -> bool {
        self.to.map_or(true, |t| t == side)
    }
}

#[derive(Debug)]
enum Submission {
    Join { side: Side },
    Act { side: Side, action: Action },
}

/// Cheap cloneable handle to a running session
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<Submission>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionHandle {
    /// Announce a controller; the battle starts once both sides have joined
    pub async fn join(&self, side: Side) -> Result<()> {
        self.tx
            .send(Submission::Join { side })
            .await
            .map_err(|_| BattleError::SessionClosed("join channel closed".into()))
    }

    /// Submit one action; the answer arrives on the event stream
    pub async fn submit(&self, side: Side, action: Action) -> Result<()> {
        self.tx
            .send(Submission::Act { side, action })
            .await
            .map_err(|_| BattleError::SessionClosed("action channel closed".into()))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }
}

/// Spawn the session actor for a prepared battle state
pub fn spawn_session(mut state: BattleState, config: EngineConfig, seed: u64) -> SessionHandle {
    let (tx, mut rx) = mpsc::channel::<Submission>(config.action_queue_depth);
    let (events, _) = broadcast::channel::<SessionEvent>(256);
    let handle = SessionHandle {
        tx,
        events: events.clone(),
    };

    tokio::spawn(async move {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        open_battle(&mut state, &mut rng);

        let send = |to: Option<Side>, event: Event| {
            // A send only fails with no subscribers; that is not an error
            // for the actor, the battle record is still complete
            let _ = events.send(SessionEvent {
                to,
                event: Arc::new(event),
            });
        };

        // Both controllers must join within the connection timeout
        let mut joined = Vec::new();
        let join_deadline = Duration::from_millis(config.join_timeout_ms);
        let joined_both = tokio::time::timeout(join_deadline, async {
            while joined.len() < 2 {
                match rx.recv().await {
                    Some(Submission::Join { side }) => {
                        if !joined.contains(&side) {
                            joined.push(side);
                            tracing::debug!(?side, "controller joined");
                        }
                    }
                    // Pre-join actions are dropped; the submitter will see
                    // the initial state once the battle opens
                    Some(Submission::Act { .. }) => {}
                    None => return false,
                }
            }
            true
        })
        .await
        .unwrap_or(false);

        if !joined_both {
            tracing::warn!("a controller never joined; abandoning battle");
            send(
                None,
                finalize(
                    &state,
                    None,
                    "Battle abandoned: a controller never joined".into(),
                ),
            );
            return;
        }

        send(
            None,
            Event::StateChange {
                state: Box::new(state.clone()),
            },
        );

        while let Some(submission) = rx.recv().await {
            let (side, action) = match submission {
                Submission::Act { side, action } => (side, action),
                Submission::Join { .. } => continue,
            };
            match apply_action(&mut state, side, &action, &mut rng) {
                ActionOutcome::Applied => {
                    send(
                        None,
                        Event::StateChange {
                            state: Box::new(state.clone()),
                        },
                    );
                }
                ActionOutcome::Rejected(message) => {
                    tracing::debug!(?side, %message, "action rejected");
                    send(Some(side), Event::InvalidAction { message });
                }
                ActionOutcome::Ended(event) => {
                    tracing::info!("battle over");
                    send(None, event);
                    return;
                }
            }
        }
        tracing::debug!("all handles dropped; session actor stopping");
    });

    handle
}
