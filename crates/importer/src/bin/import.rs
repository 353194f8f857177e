use clap::{Parser, Subcommand};
use importer::{
    ImportOrchestrator, ImportOutcome, ImportState, Site, SwimmerReport, build_source,
    http::ReqwestTransport,
};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storage::{InMemoryStore, PgStore, ResultStore};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "swim-import")]
#[command(about = "Imports swimmer results from swimrankings.net and swimtrack.nl", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// PostgreSQL connection string. Without it results are kept in memory only.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Check whether a site is up
    Probe {
        #[arg(long, default_value = "swimtrack")]
        site: Site,
    },
    /// Store the swimmers listed on a site's listing page
    Discover {
        #[arg(long, default_value = "swimtrack")]
        site: Site,

        #[arg(long)]
        url: Option<String>,
    },
    /// Import results for every stored swimmer
    Roster {
        #[arg(long, default_value = "swimtrack")]
        site: Site,

        /// Run discovery on the default listing page first
        #[arg(long)]
        discover: bool,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,

        /// How many times to resume automatically after a pause
        #[arg(long, default_value_t = 0)]
        resume_attempts: u32,
    },
    /// Import results for one swimmer, e.g. `swimmer Jane van Dijk`
    Swimmer {
        #[arg(long, default_value = "swimtrack")]
        site: Site,

        #[arg(required = true, num_args = 1..)]
        name: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("import={},importer={},storage={}", log_level, log_level, log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let transport = Arc::new(ReqwestTransport::new()?);

    match cli.command {
        Commands::Probe { site } => {
            let source = build_source(site, transport, site.config_from_env()?);
            if source.probe_reachable().await {
                tracing::info!("✓ {} is reachable", source.name());
            } else {
                return Err(format!("{} is not reachable", source.name()).into());
            }
        }
        Commands::Discover { site, url } => {
            let source = build_source(site, transport, site.config_from_env()?);
            let store = open_store(cli.database_url.as_deref()).await?;
            let mut orchestrator = ImportOrchestrator::new(source.as_ref(), store.as_ref());

            let created = orchestrator.discover_swimmers(url.as_deref()).await?;
            tracing::info!("✓ {} new swimmer(s) stored", created);
        }
        Commands::Roster {
            site,
            discover,
            json,
            resume_attempts,
        } => {
            let source = build_source(site, transport, site.config_from_env()?);
            let store = open_store(cli.database_url.as_deref()).await?;
            let mut orchestrator = ImportOrchestrator::new(source.as_ref(), store.as_ref());

            if discover {
                let created = orchestrator.discover_swimmers(None).await?;
                tracing::info!("Discovered {} new swimmer(s)", created);
            }

            let cancel = cancel_on_ctrl_c();
            let outcome = handle_roster(&mut orchestrator, resume_attempts, &cancel).await?;
            report_outcome(&outcome, json)?;

            match outcome.state {
                ImportState::Completed | ImportState::Cancelled => {}
                ImportState::CompletedWithFailures => {
                    let failed = outcome.summary.failed;
                    return Err(format!("{} swimmer(s) failed to import", failed).into());
                }
                state => return Err(format!("Import ended in state {:?}", state).into()),
            }
        }
        Commands::Swimmer { site, name } => {
            let source = build_source(site, transport, site.config_from_env()?);
            let store = open_store(cli.database_url.as_deref()).await?;
            let mut orchestrator = ImportOrchestrator::new(source.as_ref(), store.as_ref());

            let report = orchestrator.import_swimmer_by_name(&name.join(" ")).await?;
            report_swimmer(&report);
        }
    }

    Ok(())
}

async fn open_store(
    database_url: Option<&str>,
) -> Result<Box<dyn ResultStore>, Box<dyn std::error::Error>> {
    match database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new().max_connections(5).connect(url).await?;
            let store = PgStore::new(pool);
            store.migrate().await?;
            Ok(Box::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, results are kept in memory for this run only");
            Ok(Box::new(InMemoryStore::new()))
        }
    }
}

fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Ctrl-C received, stopping after the current swimmer");
            token.cancel();
        }
    });
    cancel
}

async fn handle_roster(
    orchestrator: &mut ImportOrchestrator<'_>,
    resume_attempts: u32,
    cancel: &CancellationToken,
) -> Result<ImportOutcome, Box<dyn std::error::Error>> {
    let log_progress = |p: &importer::ImportProgress| {
        tracing::info!("[{}/{}] {}", p.current, p.total, p.status);
    };

    let mut outcome = orchestrator.import_roster(log_progress, cancel).await?;
    let mut attempts_left = resume_attempts;

    while outcome.state == ImportState::Paused && attempts_left > 0 {
        let Some(checkpoint) = outcome.checkpoint.take() else {
            break;
        };
        attempts_left -= 1;
        tracing::info!(
            "Resuming at swimmer {} ({} automatic resume(s) left)",
            checkpoint.resume_at() + 1,
            attempts_left
        );
        outcome = orchestrator.resume(checkpoint, log_progress, cancel).await?;
    }

    if outcome.state == ImportState::Paused {
        tracing::warn!("Import paused after repeated network failures; rerun later to continue");
    }

    Ok(outcome)
}

fn report_outcome(outcome: &ImportOutcome, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string_pretty(&outcome.summary)?);
        return Ok(());
    }

    let summary = &outcome.summary;
    tracing::info!("Import {:?}", outcome.state);
    tracing::info!("  Retrieved:       {}", summary.retrieved);
    tracing::info!("  New:             {}", summary.new);
    tracing::info!("  Already stored:  {}", summary.existing);
    tracing::info!("  Swimmers OK:     {}", summary.succeeded);
    tracing::info!("  Swimmers failed: {}", summary.failed);
    if summary.estimated_dates > 0 {
        tracing::warn!(
            "  {} result(s) had no readable date and were dated today",
            summary.estimated_dates
        );
    }
    Ok(())
}

fn report_swimmer(report: &SwimmerReport) {
    tracing::info!(
        "✓ {} retrieved, {} new, {} already stored",
        report.counts.retrieved,
        report.counts.new,
        report.counts.existing
    );
    if report.skipped_rows > 0 {
        tracing::debug!("{} row(s) could not be read", report.skipped_rows);
    }
    if report.estimated_dates > 0 {
        tracing::warn!(
            "{} result(s) had no readable date and were dated today",
            report.estimated_dates
        );
    }
}
