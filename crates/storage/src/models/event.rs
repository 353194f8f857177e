use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::StorageError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Stroke {
    Freestyle,
    Backstroke,
    Breaststroke,
    Butterfly,
    IndividualMedley,
}

impl Stroke {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Freestyle => "freestyle",
            Self::Backstroke => "backstroke",
            Self::Breaststroke => "breaststroke",
            Self::Butterfly => "butterfly",
            Self::IndividualMedley => "individual_medley",
        }
    }

    pub fn all() -> &'static [Stroke] {
        &[
            Self::Freestyle,
            Self::Backstroke,
            Self::Breaststroke,
            Self::Butterfly,
            Self::IndividualMedley,
        ]
    }
}

impl FromStr for Stroke {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|stroke| stroke.as_str() == s)
            .ok_or_else(|| StorageError::Decode(format!("unknown stroke '{}'", s)))
    }
}

impl fmt::Display for Stroke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Freestyle => "Freestyle",
            Self::Backstroke => "Backstroke",
            Self::Breaststroke => "Breaststroke",
            Self::Butterfly => "Butterfly",
            Self::IndividualMedley => "Individual Medley",
        };
        f.write_str(label)
    }
}

/// Pool length a result was swum in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Course {
    LongCourse,
    #[default]
    ShortCourse,
}

impl Course {
    pub fn pool_length_meters(&self) -> u8 {
        match self {
            Self::LongCourse => 50,
            Self::ShortCourse => 25,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LongCourse => "long_course",
            Self::ShortCourse => "short_course",
        }
    }

    pub fn abbreviation(&self) -> &'static str {
        match self {
            Self::LongCourse => "LC",
            Self::ShortCourse => "SC",
        }
    }
}

impl FromStr for Course {
    type Err = StorageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "long_course" => Ok(Self::LongCourse),
            "short_course" => Ok(Self::ShortCourse),
            _ => Err(StorageError::Decode(format!("unknown course '{}'", s))),
        }
    }
}

/// Identity of an event. The store keeps at most one `Event` per key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventKey {
    pub stroke: Stroke,
    pub distance_meters: i32,
    pub course: Course,
}

impl EventKey {
    pub fn new(stroke: Stroke, distance_meters: i32, course: Course) -> Self {
        Self {
            stroke,
            distance_meters,
            course,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub event_id: Uuid,
    pub stroke: Stroke,
    pub distance_meters: i32,
    pub course: Course,
}

impl Event {
    pub fn key(&self) -> EventKey {
        EventKey::new(self.stroke, self.distance_meters, self.course)
    }

    pub fn display_name(&self) -> String {
        format!(
            "{}m {} ({})",
            self.distance_meters,
            self.stroke,
            self.course.abbreviation()
        )
    }
}
