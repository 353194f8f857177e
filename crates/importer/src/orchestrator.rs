use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::time::Duration;
use storage::ResultStore;
use storage::models::{Swimmer, SwimmerName};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::canonical::{DedupEngine, ImportCounts, RawRecord, RecordNormalizer};
use crate::traits::ResultSource;
use crate::{ImporterError, Result};

/// Consecutive network-class failures after which a roster run pauses.
pub const MAX_CONSECUTIVE_NETWORK_FAILURES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportState {
    Idle,
    Probing,
    Running,
    Unreachable,
    Cancelled,
    Paused,
    CompletedWithFailures,
    Completed,
}

/// What one swimmer's import produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SwimmerReport {
    #[serde(flatten)]
    pub counts: ImportCounts,
    pub skipped_rows: usize,
    pub estimated_dates: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub retrieved: usize,
    pub new: usize,
    pub existing: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_rows: usize,
    pub estimated_dates: usize,
}

impl ImportSummary {
    fn record_success(&mut self, report: &SwimmerReport) {
        self.retrieved += report.counts.retrieved;
        self.new += report.counts.new;
        self.existing += report.counts.existing;
        self.skipped_rows += report.skipped_rows;
        self.estimated_dates += report.estimated_dates;
        self.succeeded += 1;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportProgress {
    /// 1-based position of the swimmer just processed.
    pub current: usize,
    pub total: usize,
    pub status: String,
}

/// Where a paused roster run can pick up again.
#[derive(Debug, Clone)]
pub struct ResumeCheckpoint {
    roster: Vec<Swimmer>,
    resume_at: usize,
    summary: ImportSummary,
}

impl ResumeCheckpoint {
    /// Index of the first swimmer of the failure streak.
    pub fn resume_at(&self) -> usize {
        self.resume_at
    }

    pub fn remaining(&self) -> &[Swimmer] {
        &self.roster[self.resume_at..]
    }

    /// Totals for the swimmers before the failure streak.
    pub fn summary(&self) -> &ImportSummary {
        &self.summary
    }
}

#[derive(Debug, Clone)]
pub struct ImportOutcome {
    pub state: ImportState,
    pub summary: ImportSummary,
    /// Set when `state` is `Paused`, or `Unreachable` on resume.
    pub checkpoint: Option<ResumeCheckpoint>,
}

impl ImportOutcome {
    fn finished(state: ImportState, summary: ImportSummary) -> Self {
        Self {
            state,
            summary,
            checkpoint: None,
        }
    }
}

/// Drives imports from one source into one store.
pub struct ImportOrchestrator<'a> {
    source: &'a dyn ResultSource,
    store: &'a dyn ResultStore,
    state: ImportState,
}

impl<'a> ImportOrchestrator<'a> {
    pub fn new(source: &'a dyn ResultSource, store: &'a dyn ResultStore) -> Self {
        Self {
            source,
            store,
            state: ImportState::Idle,
        }
    }

    pub fn state(&self) -> ImportState {
        self.state
    }

    pub async fn probe_reachable(&mut self) -> bool {
        self.state = ImportState::Probing;
        let reachable = self.source.probe_reachable().await;
        if !reachable {
            warn!("{} is not reachable", self.source.name());
            self.state = ImportState::Unreachable;
        }
        reachable
    }

    /// Imports every stored swimmer in roster order.
    pub async fn import_roster(
        &mut self,
        on_progress: impl FnMut(&ImportProgress),
        cancel: &CancellationToken,
    ) -> Result<ImportOutcome> {
        if !self.probe_reachable().await {
            return Ok(ImportOutcome::finished(ImportState::Unreachable, ImportSummary::default()));
        }

        let roster = self.store.list_swimmers().await?;
        info!("Importing {} swimmers from {}", roster.len(), self.source.name());
        self.run(roster, 0, ImportSummary::default(), on_progress, cancel)
            .await
    }

    /// Continues a paused run from the start of its failure streak.
    pub async fn resume(
        &mut self,
        checkpoint: ResumeCheckpoint,
        on_progress: impl FnMut(&ImportProgress),
        cancel: &CancellationToken,
    ) -> Result<ImportOutcome> {
        if !self.probe_reachable().await {
            return Ok(ImportOutcome {
                state: ImportState::Unreachable,
                summary: checkpoint.summary.clone(),
                checkpoint: Some(checkpoint),
            });
        }

        info!(
            "Resuming {} import at swimmer {}/{}",
            self.source.name(),
            checkpoint.resume_at + 1,
            checkpoint.roster.len()
        );
        let ResumeCheckpoint {
            roster,
            resume_at,
            summary,
        } = checkpoint;
        self.run(roster, resume_at, summary, on_progress, cancel).await
    }

    async fn run(
        &mut self,
        roster: Vec<Swimmer>,
        start: usize,
        mut summary: ImportSummary,
        mut on_progress: impl FnMut(&ImportProgress),
        cancel: &CancellationToken,
    ) -> Result<ImportOutcome> {
        self.state = ImportState::Running;
        let total = roster.len();
        let delay = self.source.swimmer_delay();
        let mut normalizer = RecordNormalizer::new(self.store, today());

        let mut streak = 0;
        let mut streak_start = start;
        let mut before_streak = summary.clone();

        for index in start..total {
            if cancel.is_cancelled() {
                info!("Import cancelled before swimmer {}/{}", index + 1, total);
                self.state = ImportState::Cancelled;
                return Ok(ImportOutcome::finished(ImportState::Cancelled, summary));
            }

            let swimmer = &roster[index];
            let name = swimmer.display_name();

            let status = match self.import_stored(&mut normalizer, swimmer).await {
                Ok(report) => {
                    streak = 0;
                    summary.record_success(&report);
                    format!(
                        "{}: {} new, {} existing",
                        name, report.counts.new, report.counts.existing
                    )
                }
                Err(e) if e.is_network() => {
                    if streak == 0 {
                        streak_start = index;
                        before_streak = summary.clone();
                    }
                    streak += 1;
                    summary.failed += 1;
                    warn!("Network failure for {} ({} in a row): {}", name, streak, e);

                    if streak >= MAX_CONSECUTIVE_NETWORK_FAILURES {
                        on_progress(&ImportProgress {
                            current: index + 1,
                            total,
                            status: format!("{}: failed, pausing import", name),
                        });
                        warn!(
                            "Pausing after {} consecutive network failures; resume at swimmer {}",
                            streak,
                            streak_start + 1
                        );
                        self.state = ImportState::Paused;
                        return Ok(ImportOutcome {
                            state: ImportState::Paused,
                            summary: before_streak.clone(),
                            checkpoint: Some(ResumeCheckpoint {
                                roster,
                                resume_at: streak_start,
                                summary: before_streak,
                            }),
                        });
                    }
                    format!("{}: failed ({})", name, e)
                }
                Err(e) => {
                    streak = 0;
                    summary.failed += 1;
                    warn!("Skipping {}: {}", name, e);
                    format!("{}: failed ({})", name, e)
                }
            };

            on_progress(&ImportProgress {
                current: index + 1,
                total,
                status,
            });

            if index + 1 < total && !delay.is_zero() {
                pause_between_swimmers(delay, cancel).await;
            }
        }

        self.state = if summary.failed > 0 {
            ImportState::CompletedWithFailures
        } else {
            ImportState::Completed
        };
        info!(
            "{} import finished: {} new, {} existing, {} failed",
            self.source.name(),
            summary.new,
            summary.existing,
            summary.failed
        );
        Ok(ImportOutcome::finished(self.state, summary))
    }

    async fn import_stored(
        &self,
        normalizer: &mut RecordNormalizer<'a>,
        swimmer: &Swimmer,
    ) -> Result<SwimmerReport> {
        let name = SwimmerName::new(&swimmer.first_name, &swimmer.last_name)?;
        let records = self.source.fetch_records(&name).await?;
        self.persist_records(normalizer, swimmer.swimmer_id, &records).await
    }

    async fn persist_records(
        &self,
        normalizer: &mut RecordNormalizer<'a>,
        swimmer_id: Uuid,
        records: &[RawRecord],
    ) -> Result<SwimmerReport> {
        let batch = normalizer.normalize(swimmer_id, records).await?;
        debug!(
            "{} rows: {} candidates, {} skipped",
            records.len(),
            batch.candidates.len(),
            batch.skipped
        );

        let counts = DedupEngine::new(self.store)
            .persist(swimmer_id, batch.candidates)
            .await?;

        Ok(SwimmerReport {
            counts,
            skipped_rows: batch.skipped,
            estimated_dates: batch.estimated_dates,
        })
    }

    /// Imports one swimmer, creating it in the store if needed.
    pub async fn import_swimmer(&mut self, first: &str, last: &str) -> Result<SwimmerReport> {
        let name = SwimmerName::new(first, last)
            .map_err(|e| ImporterError::InvalidName(e.to_string()))?;
        self.import_named(&name).await
    }

    /// Same as `import_swimmer`, with the name split as "First Last...".
    pub async fn import_swimmer_by_name(&mut self, full_name: &str) -> Result<SwimmerReport> {
        let name = SwimmerName::parse_full(full_name)
            .map_err(|e| ImporterError::InvalidName(e.to_string()))?;
        self.import_named(&name).await
    }

    async fn import_named(&mut self, name: &SwimmerName) -> Result<SwimmerReport> {
        if !self.probe_reachable().await {
            return Err(ImporterError::Unreachable(self.source.name().to_string()));
        }
        self.state = ImportState::Running;

        let result = self.import_fresh(name).await;

        self.state = if result.is_ok() {
            ImportState::Completed
        } else {
            ImportState::CompletedWithFailures
        };
        if let Ok(report) = &result {
            info!(
                "{}: {} retrieved, {} new, {} existing",
                name.full_name(),
                report.counts.retrieved,
                report.counts.new,
                report.counts.existing
            );
        }
        result
    }

    async fn import_fresh(&self, name: &SwimmerName) -> Result<SwimmerReport> {
        // Fetch first so an unknown swimmer never lands in the store.
        let records = self.source.fetch_records(name).await?;
        let swimmer = self.store.find_or_create_swimmer(name).await?;

        let mut normalizer = RecordNormalizer::new(self.store, today());
        self.persist_records(&mut normalizer, swimmer.swimmer_id, &records)
            .await
    }

    /// Stores the swimmers named on a listing page that are not stored yet.
    /// Returns how many were created.
    pub async fn discover_swimmers(&mut self, listing_url: Option<&str>) -> Result<usize> {
        if !self.probe_reachable().await {
            return Err(ImporterError::Unreachable(self.source.name().to_string()));
        }
        self.state = ImportState::Running;

        let url = listing_url.unwrap_or_else(|| self.source.default_listing_url());
        let listings = self.source.list_swimmers(url).await?;

        let mut created = 0;
        for listing in &listings {
            let name = match listing.swimmer_name() {
                Ok(name) => name,
                Err(e) => {
                    debug!("Ignoring listing entry '{}': {}", listing.name, e);
                    continue;
                }
            };
            if self.store.find_swimmer(&name).await?.is_none() {
                self.store.create_swimmer(&name).await?;
                created += 1;
            }
        }

        info!("Discovered {} swimmers, {} new", listings.len(), created);
        self.state = ImportState::Completed;
        Ok(created)
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

async fn pause_between_swimmers(delay: Duration, cancel: &CancellationToken) {
    tokio::select! {
        _ = tokio::time::sleep(delay) => {}
        _ = cancel.cancelled() => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::http::TransportError;
    use crate::sources::SwimTrackSource;
    use crate::testing::ScriptedTransport;
    use std::sync::Arc;
    use storage::InMemoryStore;

    const BASE: &str = "https://www.swimtrack.nl/";
    const LISTING: &str = "https://www.swimtrack.nl/ez-pc/perstijden.php";

    const ROSTER: [(&str, &str); 5] = [
        ("Anna", "Aalders"),
        ("Bob", "Bakker"),
        ("Cor", "Claassen"),
        ("Dirk", "Dekker"),
        ("Eva", "Evers"),
    ];

    fn page_url(n: usize) -> String {
        format!("{}?startnr={}", LISTING, n)
    }

    fn personal_page(times: &[(&str, &str)]) -> String {
        times
            .iter()
            .map(|(slag, time)| {
                format!(
                    r#"<a href="perstijden.php?slag={}" title="Gezwommen op 11-03-2023">{}</a>"#,
                    slag, time
                )
            })
            .collect()
    }

    /// A reachable site listing the first `count` roster swimmers, each with one
    /// distinct result, and a store holding the same swimmers.
    async fn fixture(count: usize) -> (Arc<ScriptedTransport>, InMemoryStore) {
        let transport = Arc::new(ScriptedTransport::new());
        transport.script_head(BASE, vec![Ok(200)]);

        let options: String = ROSTER[..count]
            .iter()
            .enumerate()
            .map(|(i, (first, last))| {
                format!(
                    r#"<option value="perstijden.php?startnr={}">{} {}</option>"#,
                    i + 1,
                    first,
                    last
                )
            })
            .collect();
        transport.page(LISTING, &format!(r#"<select name="zwemmer">{}</select>"#, options));

        let store = InMemoryStore::new();
        for (i, (first, last)) in ROSTER[..count].iter().enumerate() {
            store
                .create_swimmer(&SwimmerName::new(*first, *last).unwrap())
                .await
                .unwrap();
            let time = format!("{}.{:02}", 30 + i, 10 + i);
            transport.page(&page_url(i + 1), &personal_page(&[("vr50", time.as_str())]));
        }

        (transport, store)
    }

    fn source(transport: Arc<ScriptedTransport>) -> SwimTrackSource {
        SwimTrackSource::new(transport, SiteConfig::swimtrack().without_delays())
    }

    #[tokio::test]
    async fn test_roster_survives_transient_failures() {
        let (transport, store) = fixture(3).await;
        transport.page(&page_url(1), &personal_page(&[("vr50", "30.10"), ("ru100", "1:10.00")]));
        transport.script(
            &page_url(2),
            vec![
                Err(TransportError::Timeout),
                Err(TransportError::Status(502)),
                Ok(personal_page(&[("ss50", "38.20")])),
            ],
        );

        let source = source(transport.clone());
        let mut orchestrator = ImportOrchestrator::new(&source, &store);
        let mut progress = Vec::new();
        let outcome = orchestrator
            .import_roster(|p| progress.push(p.clone()), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, ImportState::Completed);
        assert_eq!(outcome.summary.retrieved, 4);
        assert_eq!(outcome.summary.new, 4);
        assert_eq!(outcome.summary.existing, 0);
        assert_eq!(outcome.summary.succeeded, 3);
        assert_eq!(outcome.summary.failed, 0);
        assert_eq!(store.result_count(), 4);

        let indices: Vec<usize> = progress.iter().map(|p| p.current).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        assert!(progress.iter().all(|p| p.total == 3));
        assert_eq!(transport.get_count(&page_url(2)), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_waits_between_swimmers() {
        let (transport, store) = fixture(3).await;
        let config = SiteConfig::swimtrack();
        let delay = config.swimmer_delay;
        let source = SwimTrackSource::new(transport.clone(), config);
        let mut orchestrator = ImportOrchestrator::new(&source, &store);

        let outcome = orchestrator
            .import_roster(|_| {}, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.summary.succeeded, 3);

        let fetched: Vec<_> = (1..=3)
            .map(|n| transport.fetch_times(&page_url(n))[0])
            .collect();
        assert!(fetched[1] - fetched[0] >= delay);
        assert!(fetched[2] - fetched[1] >= delay);
    }

    #[tokio::test]
    async fn test_second_run_finds_only_existing_results() {
        let (transport, store) = fixture(2).await;
        let source = source(transport);
        let mut orchestrator = ImportOrchestrator::new(&source, &store);
        let cancel = CancellationToken::new();

        orchestrator.import_roster(|_| {}, &cancel).await.unwrap();
        let again = orchestrator.import_roster(|_| {}, &cancel).await.unwrap();

        assert_eq!(again.summary.new, 0);
        assert_eq!(again.summary.existing, 2);
        assert_eq!(store.result_count(), 2);
    }

    #[tokio::test]
    async fn test_cancel_after_first_swimmer() {
        let (transport, store) = fixture(5).await;
        let source = source(transport.clone());
        let mut orchestrator = ImportOrchestrator::new(&source, &store);

        let cancel = CancellationToken::new();
        let mut calls = 0;
        let outcome = orchestrator
            .import_roster(
                |p| {
                    calls += 1;
                    if p.current == 1 {
                        cancel.cancel();
                    }
                },
                &cancel,
            )
            .await
            .unwrap();

        assert_eq!(outcome.state, ImportState::Cancelled);
        assert_eq!(orchestrator.state(), ImportState::Cancelled);
        assert_eq!(calls, 1);
        assert_eq!(outcome.summary.succeeded, 1);
        assert_eq!(store.result_count(), 1);
        for n in 2..=5 {
            assert_eq!(transport.get_count(&page_url(n)), 0);
        }
    }

    #[tokio::test]
    async fn test_pauses_after_consecutive_network_failures_and_resumes() {
        let (transport, store) = fixture(5).await;
        for n in 2..=4 {
            transport.script(&page_url(n), vec![Err(TransportError::Status(503))]);
        }

        let source = source(transport.clone());
        let mut orchestrator = ImportOrchestrator::new(&source, &store);
        let cancel = CancellationToken::new();

        let mut progress = Vec::new();
        let paused = orchestrator
            .import_roster(|p| progress.push(p.current), &cancel)
            .await
            .unwrap();

        assert_eq!(paused.state, ImportState::Paused);
        assert_eq!(progress, vec![1, 2, 3, 4]);
        assert_eq!(paused.summary.succeeded, 1);
        assert_eq!(paused.summary.failed, 0);
        assert_eq!(transport.get_count(&page_url(5)), 0);

        let checkpoint = paused.checkpoint.unwrap();
        assert_eq!(checkpoint.resume_at(), 1);
        assert_eq!(checkpoint.remaining().len(), 4);

        for n in 2..=4 {
            transport.page(&page_url(n), &personal_page(&[("vl50", "33.33")]));
        }

        let mut resumed_progress = Vec::new();
        let finished = orchestrator
            .resume(checkpoint, |p| resumed_progress.push(p.current), &cancel)
            .await
            .unwrap();

        assert_eq!(finished.state, ImportState::Completed);
        assert_eq!(resumed_progress, vec![2, 3, 4, 5]);
        assert_eq!(finished.summary.succeeded, 5);
        assert_eq!(finished.summary.new, 5);
        assert_eq!(store.result_count(), 5);
    }

    #[tokio::test]
    async fn test_network_streak_is_reset_by_success() {
        let (transport, store) = fixture(5).await;
        for n in [1, 2, 4, 5] {
            transport.script(&page_url(n), vec![Err(TransportError::Timeout)]);
        }

        let source = source(transport);
        let mut orchestrator = ImportOrchestrator::new(&source, &store);
        let outcome = orchestrator
            .import_roster(|_| {}, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, ImportState::CompletedWithFailures);
        assert_eq!(outcome.summary.failed, 4);
        assert_eq!(outcome.summary.succeeded, 1);
        assert!(outcome.checkpoint.is_none());
    }

    #[tokio::test]
    async fn test_unlisted_swimmers_do_not_pause() {
        let (transport, store) = fixture(1).await;
        for (first, last) in [("Xena", "Xander"), ("Yuri", "Yilmaz"), ("Zoe", "Zwart")] {
            store
                .create_swimmer(&SwimmerName::new(first, last).unwrap())
                .await
                .unwrap();
        }

        let source = source(transport);
        let mut orchestrator = ImportOrchestrator::new(&source, &store);
        let outcome = orchestrator
            .import_roster(|_| {}, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, ImportState::CompletedWithFailures);
        assert_eq!(outcome.summary.succeeded, 1);
        assert_eq!(outcome.summary.failed, 3);
    }

    #[tokio::test]
    async fn test_unreachable_site_writes_nothing() {
        let (transport, store) = fixture(2).await;
        transport.set_resolves(false);

        let source = source(transport.clone());
        let mut orchestrator = ImportOrchestrator::new(&source, &store);
        let outcome = orchestrator
            .import_roster(|_| {}, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome.state, ImportState::Unreachable);
        assert_eq!(transport.total_requests(), 0);
        assert_eq!(store.result_count(), 0);

        let err = orchestrator.import_swimmer("Anna", "Aalders").await.unwrap_err();
        assert!(matches!(err, ImporterError::Unreachable(_)));
    }

    #[tokio::test]
    async fn test_single_swimmer_import() {
        let (transport, _) = fixture(2).await;
        let store = InMemoryStore::new();
        let source = source(transport);
        let mut orchestrator = ImportOrchestrator::new(&source, &store);

        let report = orchestrator.import_swimmer_by_name("Bob Bakker").await.unwrap();
        assert_eq!(report.counts, ImportCounts { retrieved: 1, new: 1, existing: 0 });
        assert_eq!(store.swimmer_count(), 1);

        let again = orchestrator.import_swimmer("Bob", "Bakker").await.unwrap();
        assert_eq!(again.counts.existing, 1);
        assert_eq!(store.swimmer_count(), 1);

        let err = orchestrator.import_swimmer_by_name("Bob").await.unwrap_err();
        assert!(matches!(err, ImporterError::InvalidName(_)));
        let err = orchestrator.import_swimmer("", "Bakker").await.unwrap_err();
        assert!(matches!(err, ImporterError::InvalidName(_)));

        let err = orchestrator.import_swimmer("Nobody", "Known").await.unwrap_err();
        assert!(matches!(err, ImporterError::SwimmerNotFound { .. }));
        assert_eq!(store.swimmer_count(), 1);
    }

    #[tokio::test]
    async fn test_discover_swimmers() {
        let (transport, _) = fixture(3).await;
        let store = InMemoryStore::new();
        let source = source(transport);
        let mut orchestrator = ImportOrchestrator::new(&source, &store);

        assert_eq!(orchestrator.discover_swimmers(None).await.unwrap(), 3);
        assert_eq!(orchestrator.discover_swimmers(Some(LISTING)).await.unwrap(), 0);
        assert_eq!(store.swimmer_count(), 3);
    }
}
