mod memory;
mod postgres;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{Event, EventKey, NewResult, Stroke, SwimResult, Swimmer, SwimmerName};

/// Persistence seam for swimmers, events and results.
///
/// Swimmers are unique by name and events by `EventKey`. Results are only ever
/// appended; nothing in the import path updates or deletes them.
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn find_swimmer(&self, name: &SwimmerName) -> Result<Option<Swimmer>>;

    async fn create_swimmer(&self, name: &SwimmerName) -> Result<Swimmer>;

    /// All swimmers ordered by last name, then first name.
    async fn list_swimmers(&self) -> Result<Vec<Swimmer>>;

    async fn find_event(&self, key: EventKey) -> Result<Option<Event>>;

    async fn create_event(&self, key: EventKey) -> Result<Event>;

    async fn list_results(&self, swimmer_id: Uuid) -> Result<Vec<SwimResult>>;

    async fn append_results(&self, results: &[NewResult]) -> Result<Vec<SwimResult>>;

    /// Results for a swimmer, optionally narrowed to a stroke and distance, oldest first.
    async fn results_for(
        &self,
        swimmer_id: Uuid,
        stroke: Option<Stroke>,
        distance_meters: Option<i32>,
    ) -> Result<Vec<SwimResult>>;

    async fn find_or_create_swimmer(&self, name: &SwimmerName) -> Result<Swimmer> {
        if let Some(existing) = self.find_swimmer(name).await? {
            return Ok(existing);
        }
        self.create_swimmer(name).await
    }

    async fn find_or_create_event(&self, key: EventKey) -> Result<Event> {
        if let Some(existing) = self.find_event(key).await? {
            return Ok(existing);
        }
        self.create_event(key).await
    }

    /// Fastest stored time for one event.
    async fn best_time(&self, swimmer_id: Uuid, event_id: Uuid) -> Result<Option<SwimResult>> {
        let best = self
            .list_results(swimmer_id)
            .await?
            .into_iter()
            .filter(|r| r.event_id == event_id)
            .min_by_key(|r| r.time);
        Ok(best)
    }
}
