use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use spoodblort_engine::combat::{ActionSink, Bout, LiveAction};
use spoodblort_engine::combat::odds::estimate_odds;
use spoodblort_engine::fight::FightId;
use spoodblort_engine::fighter::{Combatant, Fighter, FighterId, Stats};
use spoodblort_server::config::Config;
use spoodblort_server::finalize::Finalizer;
use spoodblort_server::live::LiveCoordinator;
use spoodblort_server::notifier::LogNotifier;
use spoodblort_server::schedule::ScheduleManager;
use spoodblort_server::spectators::SpectatorRegistry;
use spoodblort_server::store::{MemoryStore, Repository};
use spoodblort_server::web::{self, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    if config.demo {
        run_demo();
        return Ok(());
    }

    tracing::info!("Spoodblort -- tournament scheduler and live broadcaster");
    let calendar = config.calendar()?;

    // ── Store ───────────────────────────────────────────────────────────
    let store = Arc::new(MemoryStore::load(&config.data)?);
    if config.seed_demo && store.seed_demo(&calendar) {
        tracing::info!("Demo data seeded");
    }
    let repo: Arc<dyn Repository> = store.clone();

    // ── Services ────────────────────────────────────────────────────────
    let spectators = Arc::new(SpectatorRegistry::new());
    let notifier = Arc::new(LogNotifier);
    let finalizer = Arc::new(Finalizer::new(Arc::clone(&repo), notifier.clone(), calendar));
    let live = Arc::new(LiveCoordinator::new(
        Arc::clone(&repo),
        spectators.clone(),
        finalizer,
        calendar,
        Some(config.fight_logs.clone()),
    ));
    let schedule = ScheduleManager::new(Arc::clone(&repo), Arc::clone(&live), notifier, calendar);

    let app = Arc::new(AppState {
        repo: Arc::clone(&repo),
        spectators,
        live: Arc::clone(&live),
        calendar,
    });
    let bind = config.bind.clone();
    tokio::spawn(async move {
        web::server::start(app, &bind).await;
    });

    // ── Periodic autosave ───────────────────────────────────────────────
    let save_store = Arc::clone(&store);
    let save_path = config.data.clone();
    let autosave = config.autosave_interval();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(autosave);
        interval.tick().await; // first tick is immediate, skip it
        loop {
            interval.tick().await;
            match save_store.save(&save_path) {
                Ok(n) => tracing::info!("Autosave complete: {} fights", n),
                Err(e) => tracing::error!("Autosave failed: {:#}", e),
            }
        }
    });

    // ── Schedule loop with graceful shutdown ────────────────────────────
    let mut interval = tokio::time::interval(config.schedule_interval());
    loop {
        tokio::select! {
            _ = interval.tick() => {
                let now = calendar.now();
                match schedule.ensure_today(now) {
                    Ok(report) if !report.closed => tracing::debug!(
                        "schedule pass: {} generated, {} activated, {} voided, {} started, {} live",
                        report.generated,
                        report.activated.len(),
                        report.voided.len(),
                        report.started,
                        live.live_count()
                    ),
                    Ok(_) => {}
                    Err(e) => tracing::error!("Schedule pass failed: {:#}", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Ctrl+C received, shutting down...");
                break;
            }
        }
    }

    // ── Save on shutdown ────────────────────────────────────────────────
    match store.save(&config.data) {
        Ok(n) => tracing::info!("Shutdown save complete: {} fights written", n),
        Err(e) => tracing::error!("Shutdown save failed: {:#}", e),
    }
    Ok(())
}

/// Prints every action of the demo fight.
struct StdoutSink;

impl ActionSink for StdoutSink {
    fn emit(&mut self, action: LiveAction) {
        for line in action.log_lines() {
            println!("[tick {:>3}] {}", action.tick_number, line);
        }
    }
}

fn run_demo() {
    let mut brute = Fighter::new(FighterId(1), "Gristle McBone", Stats::new(38, 22, 30, 18));
    brute.is_undead = true;
    let tactician = Fighter::new(FighterId(2), "Dr. Elbow", Stats::new(20, 34, 24, 36));
    let one = Combatant::from(&brute);
    let two = Combatant::from(&tactician);

    let odds = estimate_odds(&one, &two, 2_000, 7_000_000);
    tracing::info!(
        "Odds over {} runs: {} {:.1}%, {} {:.1}%, draw {:.1}%",
        odds.samples,
        one.name,
        odds.fighter1 * 100.0,
        two.name,
        odds.fighter2 * 100.0,
        odds.draw * 100.0
    );

    let bout = Bout::new(FightId(42), one, two);
    let start = Instant::now();
    let state = bout.run_with(&mut StdoutSink);
    let winner = match state.winner {
        Some(id) if id == bout.one.id => bout.one.name.as_str(),
        Some(_) => bout.two.name.as_str(),
        None => "nobody",
    };
    tracing::info!(
        "Finished after {} ticks in {:.1?}: {:?}, winner {} ({} - {})",
        state.tick,
        start.elapsed(),
        state.finish,
        winner,
        state.health1,
        state.health2
    );
}
