//! Scripted race: coordinator actions on one side, a handful of polling
//! racer agents on the other, all sharing one in-memory store. Prints the
//! final dashboard and the CSV export to stdout.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use rand::Rng;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use speedmodelling_back::{
    config::AppConfig,
    dao::state_store::{StateStore, memory::MemoryStateStore},
    dto::{
        admin::{DrawingUpload, StartCompetitionRequest},
        public::SubmissionReceipt,
    },
    racer::{
        PollOutcome, RacerAgent,
        clock::{Clock, SystemClock},
        ticker::{IntervalTicker, Ticker},
    },
    services::admin_service,
    state::AppState,
};

const RACERS: [(&str, &str); 4] = [
    ("Alice", "alice@example.com"),
    ("Bob", "bob@example.com"),
    ("Chloe", "chloe@example.com"),
    ("Dmitri", "dmitri@example.com"),
];

/// Poll cadence used by the simulated racers. Much faster than the real
/// default so the whole scenario finishes in a couple of seconds.
const SIM_POLL_PERIOD: Duration = Duration::from_millis(100);

pub fn run() -> anyhow::Result<()> {
    init_tracing();
    let runtime = tokio::runtime::Runtime::new().context("building tokio runtime")?;
    runtime.block_on(simulate())
}

async fn simulate() -> anyhow::Result<()> {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStateStore::new());
    let state = AppState::new(
        AppConfig::default(),
        Arc::clone(&store),
        "race-sim-token".into(),
    );

    admin_service::start_competition(
        &state,
        StartCompetitionRequest {
            material: "aluminum".into(),
            drawing: Some(DrawingUpload {
                file_name: "bracket.pdf".into(),
                media_type: "application/pdf".into(),
                data: "data:application/pdf;base64,c2ltdWxhdGVk".into(),
            }),
        },
    )
    .await?;

    let mut tasks = Vec::new();
    for (name, email) in RACERS {
        let store = Arc::clone(&store);
        tasks.push(tokio::spawn(run_racer(
            store,
            name.to_owned(),
            email.to_owned(),
        )));
    }

    // Give every racer a tick to anchor its clock before the reveal.
    tokio::time::sleep(SIM_POLL_PERIOD * 3).await;
    admin_service::reveal_drawing(&state).await?;

    for task in tasks {
        let (email, receipt) = task.await.context("racer task panicked")??;
        println!(
            "{:>2}. {email} submitted {} ({:.1} g) after {}",
            receipt.rank, receipt.file_name, receipt.mass_grams, receipt.elapsed_display
        );
    }

    admin_service::stop_competition(&state).await?;

    let dashboard = admin_service::dashboard(&state).await?;
    println!("--- dashboard ---");
    println!("{}", serde_json::to_string_pretty(&dashboard)?);

    let export = admin_service::export_results(&state).await?;
    println!("--- {} ---", export.file_name);
    print!("{}", export.content);

    Ok(())
}

/// One racer: poll until the reveal, think for a random spell, submit.
async fn run_racer(
    store: Arc<dyn StateStore>,
    name: String,
    email: String,
) -> anyhow::Result<(String, SubmissionReceipt)> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let policy = AppConfig::default().upload().clone();
    let mut agent = RacerAgent::login(store, clock, policy, &name, &email).await?;

    let (mut ticker, shutdown) = IntervalTicker::new(SIM_POLL_PERIOD);
    loop {
        if !ticker.wait().await {
            anyhow::bail!("ticker shut down before the reveal");
        }
        if agent.poll_once().await? == PollOutcome::DrawingRevealed {
            break;
        }
    }
    shutdown.shutdown();

    let think = Duration::from_millis(rand::rng().random_range(150..600));
    tokio::time::sleep(think).await;

    let mass = rand::rng().random_range(80.0..140.0);
    let file_name = format!("{}.step", email.split('@').next().unwrap_or("model"));
    let receipt = agent.submit(&file_name, 4096, mass).await?;
    Ok((email, receipt))
}

fn init_tracing() {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info".into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
