use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Course, SwimTime};

/// A stored race result. Results are append-only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwimResult {
    pub result_id: Uuid,
    pub swimmer_id: Uuid,
    pub event_id: Uuid,
    pub time: SwimTime,
    pub date: NaiveDate,
    pub course: Course,
    pub location: Option<String>,
    /// The source page carried no usable date and the import day was substituted.
    pub date_estimated: bool,
}

/// A result that has not been persisted yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewResult {
    pub swimmer_id: Uuid,
    pub event_id: Uuid,
    pub time: SwimTime,
    pub date: NaiveDate,
    pub course: Course,
    pub location: Option<String>,
    pub date_estimated: bool,
}

impl NewResult {
    pub fn into_stored(self, result_id: Uuid) -> SwimResult {
        SwimResult {
            result_id,
            swimmer_id: self.swimmer_id,
            event_id: self.event_id,
            time: self.time,
            date: self.date,
            course: self.course,
            location: self.location,
            date_estimated: self.date_estimated,
        }
    }
}
