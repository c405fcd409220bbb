//! Voidclash - Entry Point
//!
//! Runs a demo battle between two AI agents, or a batch of self-play trials
//! for personality tuning. Human sessions drive the same engine through the
//! collaborator layer; this binary only exercises the AI path.

use clap::{Parser, Subcommand};

use voidclash::battle::protocol::Event;
use voidclash::battle::session::spawn_session;
use voidclash::battle::state::LogEntry;
use voidclash::battle::{AiAgent, Instincts};
use voidclash::core::config::EngineConfig;
use voidclash::core::error::Result;
use voidclash::core::types::Side;
use voidclash::trials::{random_battle, run_trials};

#[derive(Parser)]
#[command(name = "voidclash", about = "Turn-based space fleet battle engine")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Watch one AI-vs-AI battle
    Demo {
        /// Battle seed; same seed, same battle
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
    /// Run a batch of self-play trials
    Trials {
        #[arg(long, default_value_t = 10)]
        count: usize,
        #[arg(long, default_value_t = 42)]
        seed: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "voidclash=info".into()),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Demo { seed } => run_demo(seed).await,
        Command::Trials { count, seed } => {
            let report = run_trials(EngineConfig::default(), count, seed).await;
            println!(
                "trials: {} requested, {} completed, {} cancelled",
                report.requested, report.completed, report.cancelled
            );
            println!(
                "  crimson {} / cobalt {} / draws {}",
                report.crimson_wins, report.cobalt_wins, report.draws
            );
            Ok(())
        }
    }
}

async fn run_demo(seed: u64) -> Result<()> {
    tracing::info!(seed, "starting demo battle");
    let config = EngineConfig::default();
    let state = random_battle(seed);
    let handle = spawn_session(state, config.clone(), seed);
    let mut events = handle.subscribe();

    for (side, agent_seed) in [(Side::Crimson, seed ^ 0xC1), (Side::Cobalt, seed ^ 0xB2)] {
        let agent = AiAgent::new(side, Instincts::new(agent_seed), agent_seed);
        let handle = handle.clone();
        let config = config.clone();
        tokio::spawn(async move {
            if let Err(error) = agent.run(handle, config).await {
                tracing::warn!(?side, %error, "agent forfeited");
            }
        });
    }

    let mut log_cursor = 0;
    loop {
        let event = match events.recv().await {
            Ok(event) => event,
            Err(_) => break,
        };
        match &*event.event {
            Event::StateChange { state } => {
                for entry in &state.log[log_cursor.min(state.log.len())..] {
                    match entry {
                        LogEntry::Chat { side, text } => println!("[{:?}] {}", side, text),
                        LogEntry::PhaseChanged { phase } => println!("--- {:?} ---", phase),
                        LogEntry::ShipDestroyed { ship } => println!("destroyed: {:?}", ship),
                        _ => {}
                    }
                }
                log_cursor = state.log.len();
            }
            Event::InvalidAction { .. } => {}
            Event::GameEnd {
                winner,
                message,
                subplots,
            } => {
                println!("=== {} ===", message);
                match winner {
                    Some(side) => println!("winner: {:?}", side),
                    None => println!("no winner"),
                }
                for report in subplots {
                    println!(
                        "  [{:?}] {:?} {:?}: {}",
                        report.owner, report.kind, report.outcome, report.objective
                    );
                }
                break;
            }
        }
    }
    Ok(())
}
