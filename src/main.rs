use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use surfe_auto_enrich::config::Config;
use surfe_auto_enrich::diff::compute_diff;
use surfe_auto_enrich::enrichment::{submit_and_await, CancelFlag, TokioClock};
use surfe_auto_enrich::loader::load_contacts;
use surfe_auto_enrich::projector::{OutputOptions, OutputProjector};
use surfe_auto_enrich::surfe_client::SurfeClient;

/// Surfe Enrichment.
///
/// The input csv needs these columns: CRM ID, First Name, Last Name, Email,
/// LinkedIn URL. They are mapped to the field names the Surfe API expects.
#[derive(Parser, Debug)]
#[command(name = "surfe-auto-enrich")]
#[command(version)]
struct Cli {
    /// Input csv exported from the CRM
    input: PathBuf,

    /// Output csv (defaults to <input>.out.csv)
    output: Option<PathBuf>,

    /// Only output rows with a difference whose CRM email Surfe confirmed
    #[arg(long)]
    diffs_only: bool,

    /// How frequently to check for the results (seconds)
    #[arg(long, default_value_t = 10)]
    freq: u64,

    /// Only output the standard reconciliation columns
    #[arg(long)]
    clean: bool,

    /// Give up after this many status checks
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    max_polls: Option<u32>,

    /// Give up after this many seconds of waiting
    #[arg(long)]
    max_wait: Option<u64>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.input.with_extension("out.csv"))
    }
}

/// Decides what one Ctrl-C does. The first one while polling raises `cancel`
/// so the loop stops between requests; any later one should exit.
fn interrupt_should_exit(cancel: &CancelFlag) -> bool {
    if cancel.is_cancelled() {
        return true;
    }
    cancel.cancel();
    false
}

fn watch_interrupts(cancel: CancelFlag) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if interrupt_should_exit(&cancel) {
                tracing::warn!("Interrupted, exiting");
                std::process::exit(130);
            }
            tracing::warn!("Interrupt received, stopping after the current request");
        }
    })
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "surfe_auto_enrich=debug"
    } else {
        "surfe_auto_enrich=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env()?;
    if cli.max_polls.is_some() {
        config.max_polls = cli.max_polls;
    }
    if let Some(secs) = cli.max_wait {
        config.max_wait = Some(Duration::from_secs(secs));
    }

    let contacts = load_contacts(&cli.input)?;
    let client = SurfeClient::new(&config)?;
    let policy = config.poll_policy(Duration::from_secs(cli.freq));

    let cancel = CancelFlag::new();
    let _interrupts = watch_interrupts(cancel.clone());

    let enriched = submit_and_await(&client, &contacts, &policy, &TokioClock, &cancel).await?;
    // Polling is over: from here on a Ctrl-C exits straight away.
    cancel.cancel();

    let output = cli.output_path();
    let projector = OutputProjector::new(OutputOptions {
        diffs_only: cli.diffs_only,
        clean: cli.clean,
        ..Default::default()
    });
    // Off the runtime thread so the interrupt watcher can still run.
    tokio::task::spawn_blocking(move || {
        let diffs = compute_diff(&contacts, &enriched);
        projector.write_csv(&output, &diffs)
    })
    .await??;

    Ok(())
}
