use serde::Serialize;
use std::collections::HashSet;
use storage::ResultStore;
use storage::models::{NewResult, SwimResult};
use uuid::Uuid;

use crate::Result;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportCounts {
    pub retrieved: usize,
    pub new: usize,
    pub existing: usize,
}

impl ImportCounts {
    pub fn add(&mut self, other: ImportCounts) {
        self.retrieved += other.retrieved;
        self.new += other.new;
        self.existing += other.existing;
    }
}

/// Splits candidates into new results and duplicates. A candidate is a
/// duplicate when a stored result, or an earlier candidate, has the same event
/// and the same time to the centisecond.
pub fn partition_new(stored: &[SwimResult], candidates: Vec<NewResult>) -> (Vec<NewResult>, usize) {
    let mut seen: HashSet<(Uuid, i64)> = stored
        .iter()
        .map(|r| (r.event_id, r.time.centiseconds()))
        .collect();

    let mut fresh = Vec::new();
    let mut duplicates = 0;
    for candidate in candidates {
        if seen.insert((candidate.event_id, candidate.time.centiseconds())) {
            fresh.push(candidate);
        } else {
            duplicates += 1;
        }
    }

    (fresh, duplicates)
}

pub struct DedupEngine<'a> {
    store: &'a dyn ResultStore,
}

impl<'a> DedupEngine<'a> {
    pub fn new(store: &'a dyn ResultStore) -> Self {
        Self { store }
    }

    /// Appends the candidates that are not already stored for the swimmer.
    pub async fn persist(
        &self,
        swimmer_id: Uuid,
        candidates: Vec<NewResult>,
    ) -> Result<ImportCounts> {
        let retrieved = candidates.len();
        let stored = self.store.list_results(swimmer_id).await?;
        let (fresh, existing) = partition_new(&stored, candidates);

        if !fresh.is_empty() {
            self.store.append_results(&fresh).await?;
        }

        Ok(ImportCounts {
            retrieved,
            new: fresh.len(),
            existing,
        })
    }
}
