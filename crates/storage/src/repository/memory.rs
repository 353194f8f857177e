use async_trait::async_trait;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::ResultStore;
use crate::error::{Result, StorageError};
use crate::models::{Event, EventKey, NewResult, Stroke, SwimResult, Swimmer, SwimmerName};

#[derive(Default)]
struct Inner {
    swimmers: Vec<Swimmer>,
    events: Vec<Event>,
    results: Vec<SwimResult>,
}

/// Process-local store used when no database is configured, and by tests.
#[derive(Default)]
pub struct InMemoryStore {
    inner: Mutex<Inner>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>> {
        self.inner
            .lock()
            .map_err(|_| StorageError::ConstraintViolation("store lock poisoned".to_string()))
    }

    pub fn swimmer_count(&self) -> usize {
        self.lock().map(|inner| inner.swimmers.len()).unwrap_or(0)
    }

    pub fn event_count(&self) -> usize {
        self.lock().map(|inner| inner.events.len()).unwrap_or(0)
    }

    pub fn result_count(&self) -> usize {
        self.lock().map(|inner| inner.results.len()).unwrap_or(0)
    }
}

fn event_for(inner: &Inner, event_id: Uuid) -> Option<&Event> {
    inner.events.iter().find(|e| e.event_id == event_id)
}

#[async_trait]
impl ResultStore for InMemoryStore {
    async fn find_swimmer(&self, name: &SwimmerName) -> Result<Option<Swimmer>> {
        let (first, last) = name.as_database_tuple();
        let inner = self.lock()?;
        Ok(inner
            .swimmers
            .iter()
            .find(|s| s.first_name == first && s.last_name == last)
            .cloned())
    }

    async fn create_swimmer(&self, name: &SwimmerName) -> Result<Swimmer> {
        let (first, last) = name.as_database_tuple();
        let mut inner = self.lock()?;
        if inner
            .swimmers
            .iter()
            .any(|s| s.first_name == first && s.last_name == last)
        {
            return Err(StorageError::ConstraintViolation(format!(
                "swimmer '{}' already exists",
                name.full_name()
            )));
        }

        let swimmer = Swimmer {
            swimmer_id: Uuid::new_v4(),
            first_name: first.to_string(),
            last_name: last.to_string(),
        };
        inner.swimmers.push(swimmer.clone());
        Ok(swimmer)
    }

    async fn list_swimmers(&self) -> Result<Vec<Swimmer>> {
        let mut swimmers = self.lock()?.swimmers.clone();
        swimmers.sort_by(|a, b| {
            a.last_name
                .cmp(&b.last_name)
                .then_with(|| a.first_name.cmp(&b.first_name))
        });
        Ok(swimmers)
    }

    async fn find_event(&self, key: EventKey) -> Result<Option<Event>> {
        let inner = self.lock()?;
        Ok(inner.events.iter().find(|e| e.key() == key).cloned())
    }

    async fn create_event(&self, key: EventKey) -> Result<Event> {
        let mut inner = self.lock()?;
        // Creation is idempotent per key, matching the upsert in PgStore.
        if let Some(existing) = inner.events.iter().find(|e| e.key() == key) {
            return Ok(existing.clone());
        }

        let event = Event {
            event_id: Uuid::new_v4(),
            stroke: key.stroke,
            distance_meters: key.distance_meters,
            course: key.course,
        };
        inner.events.push(event.clone());
        Ok(event)
    }

    async fn list_results(&self, swimmer_id: Uuid) -> Result<Vec<SwimResult>> {
        let inner = self.lock()?;
        Ok(inner
            .results
            .iter()
            .filter(|r| r.swimmer_id == swimmer_id)
            .cloned()
            .collect())
    }

    async fn append_results(&self, results: &[NewResult]) -> Result<Vec<SwimResult>> {
        let mut inner = self.lock()?;
        for result in results {
            if !inner.swimmers.iter().any(|s| s.swimmer_id == result.swimmer_id) {
                return Err(StorageError::ConstraintViolation(format!(
                    "unknown swimmer {}",
                    result.swimmer_id
                )));
            }
            if event_for(&inner, result.event_id).is_none() {
                return Err(StorageError::ConstraintViolation(format!(
                    "unknown event {}",
                    result.event_id
                )));
            }
        }

        let stored: Vec<SwimResult> = results
            .iter()
            .cloned()
            .map(|r| r.into_stored(Uuid::new_v4()))
            .collect();
        inner.results.extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn results_for(
        &self,
        swimmer_id: Uuid,
        stroke: Option<Stroke>,
        distance_meters: Option<i32>,
    ) -> Result<Vec<SwimResult>> {
        let inner = self.lock()?;
        let mut results: Vec<SwimResult> = inner
            .results
            .iter()
            .filter(|r| r.swimmer_id == swimmer_id)
            .filter(|r| match event_for(&inner, r.event_id) {
                Some(event) => {
                    stroke.is_none_or(|s| event.stroke == s)
                        && distance_meters.is_none_or(|d| event.distance_meters == d)
                }
                None => false,
            })
            .cloned()
            .collect();
        results.sort_by_key(|r| r.date);
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, SwimTime};
    use chrono::NaiveDate;

    fn new_result(swimmer: &Swimmer, event: &Event, centis: i64, date: NaiveDate) -> NewResult {
        NewResult {
            swimmer_id: swimmer.swimmer_id,
            event_id: event.event_id,
            time: SwimTime::from_centiseconds(centis).unwrap(),
            date,
            course: event.course,
            location: None,
            date_estimated: false,
        }
    }

    #[tokio::test]
    async fn test_find_or_create_swimmer_is_idempotent() {
        let store = InMemoryStore::new();
        let name = SwimmerName::new("Alice", "Smith").unwrap();

        let first = store.find_or_create_swimmer(&name).await.unwrap();
        let second = store.find_or_create_swimmer(&name).await.unwrap();

        assert_eq!(first.swimmer_id, second.swimmer_id);
        assert_eq!(store.swimmer_count(), 1);
        assert!(store.create_swimmer(&name).await.is_err());
    }

    #[tokio::test]
    async fn test_event_shared_across_swimmers() {
        let store = InMemoryStore::new();
        let key = EventKey::new(Stroke::Freestyle, 50, Course::ShortCourse);

        let a = store.find_or_create_event(key).await.unwrap();
        let b = store.find_or_create_event(key).await.unwrap();
        let other = store
            .find_or_create_event(EventKey::new(Stroke::Freestyle, 50, Course::LongCourse))
            .await
            .unwrap();

        assert_eq!(a.event_id, b.event_id);
        assert_ne!(a.event_id, other.event_id);
        assert_eq!(store.event_count(), 2);
    }

    #[tokio::test]
    async fn test_append_rejects_unknown_references() {
        let store = InMemoryStore::new();
        let swimmer = Swimmer {
            swimmer_id: Uuid::new_v4(),
            first_name: "Ghost".to_string(),
            last_name: "Swimmer".to_string(),
        };
        let event = store
            .create_event(EventKey::new(Stroke::Butterfly, 100, Course::ShortCourse))
            .await
            .unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();

        let err = store
            .append_results(&[new_result(&swimmer, &event, 6100, date)])
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::ConstraintViolation(_)));
        assert_eq!(store.result_count(), 0);
    }

    #[tokio::test]
    async fn test_results_for_filters_and_orders_by_date() {
        let store = InMemoryStore::new();
        let swimmer = store
            .create_swimmer(&SwimmerName::new("Bob", "Jones").unwrap())
            .await
            .unwrap();
        let free = store
            .create_event(EventKey::new(Stroke::Freestyle, 50, Course::ShortCourse))
            .await
            .unwrap();
        let back = store
            .create_event(EventKey::new(Stroke::Backstroke, 100, Course::ShortCourse))
            .await
            .unwrap();

        let d1 = NaiveDate::from_ymd_opt(2024, 1, 10).unwrap();
        let d2 = NaiveDate::from_ymd_opt(2023, 6, 2).unwrap();
        store
            .append_results(&[
                new_result(&swimmer, &free, 2650, d1),
                new_result(&swimmer, &free, 2710, d2),
                new_result(&swimmer, &back, 7020, d1),
            ])
            .await
            .unwrap();

        let free_results = store
            .results_for(swimmer.swimmer_id, Some(Stroke::Freestyle), Some(50))
            .await
            .unwrap();
        assert_eq!(free_results.len(), 2);
        assert_eq!(free_results[0].date, d2);

        let all = store.results_for(swimmer.swimmer_id, None, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let best = store
            .best_time(swimmer.swimmer_id, free.event_id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(best.time.centiseconds(), 2650);
    }

    #[tokio::test]
    async fn test_list_swimmers_sorted_by_last_name() {
        let store = InMemoryStore::new();
        for (first, last) in [("Zoe", "Bakker"), ("Anna", "Visser"), ("Bram", "Bakker")] {
            store
                .create_swimmer(&SwimmerName::new(first, last).unwrap())
                .await
                .unwrap();
        }

        let names: Vec<String> = store
            .list_swimmers()
            .await
            .unwrap()
            .iter()
            .map(|s| s.display_name())
            .collect();
        assert_eq!(names, vec!["Bram Bakker", "Zoe Bakker", "Anna Visser"]);
    }
}
