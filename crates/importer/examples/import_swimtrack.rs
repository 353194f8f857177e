use importer::{ImportOrchestrator, Site, build_source, http::ReqwestTransport};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use storage::PgStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "postgresql://localhost/swimstats".to_string());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;
    let store = PgStore::new(pool);
    store.migrate().await?;

    let transport = Arc::new(ReqwestTransport::new()?);
    let source = build_source(Site::SwimTrack, transport, Site::SwimTrack.config_from_env()?);
    let mut orchestrator = ImportOrchestrator::new(source.as_ref(), &store);

    let name = std::env::args()
        .skip(1)
        .collect::<Vec<_>>()
        .join(" ");
    let name = if name.is_empty() { "Jane Smith".to_string() } else { name };

    println!("Importing swimmer: {}", name);

    let report = orchestrator.import_swimmer_by_name(&name).await?;

    println!(
        "Import completed: {} retrieved, {} new, {} already stored",
        report.counts.retrieved, report.counts.new, report.counts.existing
    );

    Ok(())
}
