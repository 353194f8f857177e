use chrono::NaiveDate;
use std::collections::HashMap;
use storage::ResultStore;
use storage::models::{Event, EventKey, NewResult};
use tracing::debug;
use uuid::Uuid;

use super::models::RawRecord;
use crate::Result;
use crate::parsing::{parse_distance, parse_time, resolve_date};
use crate::stroke_mapper::{KeywordStrokeMapper, StrokeMapper};

#[derive(Debug, Default)]
pub struct NormalizedBatch {
    pub candidates: Vec<NewResult>,
    /// Rows dropped for a missing stroke, distance or time.
    pub skipped: usize,
    pub estimated_dates: usize,
}

/// Turns scraped rows into storable results, resolving each row's event.
///
/// Events are looked up before they are created and cached for the lifetime
/// of the normalizer, so one run never asks the store twice for the same key.
pub struct RecordNormalizer<'a> {
    store: &'a dyn ResultStore,
    mapper: KeywordStrokeMapper,
    events: HashMap<EventKey, Event>,
    today: NaiveDate,
}

impl<'a> RecordNormalizer<'a> {
    pub fn new(store: &'a dyn ResultStore, today: NaiveDate) -> Self {
        Self {
            store,
            mapper: KeywordStrokeMapper,
            events: HashMap::new(),
            today,
        }
    }

    pub async fn normalize(
        &mut self,
        swimmer_id: Uuid,
        records: &[RawRecord],
    ) -> Result<NormalizedBatch> {
        let mut batch = NormalizedBatch::default();

        for record in records {
            let stroke = record
                .stroke
                .or_else(|| self.mapper.map_stroke(&record.event_text));
            let distance = parse_distance(&record.event_text);
            let time = parse_time(&record.time_text);

            let (Some(stroke), Some(distance), Some(time)) = (stroke, distance, time) else {
                debug!(
                    "Skipping row '{}' / '{}': unresolved stroke, distance or time",
                    record.event_text, record.time_text
                );
                batch.skipped += 1;
                continue;
            };

            let course = record.course.unwrap_or_default();
            let event = self.event_for(EventKey::new(stroke, distance, course)).await?;

            let (date, date_estimated) = resolve_date(record.date_text.as_deref(), self.today);
            if date_estimated {
                batch.estimated_dates += 1;
            }

            batch.candidates.push(NewResult {
                swimmer_id,
                event_id: event.event_id,
                time,
                date,
                course,
                location: record.location.clone(),
                date_estimated,
            });
        }

        Ok(batch)
    }

    async fn event_for(&mut self, key: EventKey) -> Result<Event> {
        if let Some(event) = self.events.get(&key) {
            return Ok(event.clone());
        }

        let event = self.store.find_or_create_event(key).await?;
        self.events.insert(key, event.clone());
        Ok(event)
    }
}
