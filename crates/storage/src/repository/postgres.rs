use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool, QueryBuilder};
use uuid::Uuid;

use super::ResultStore;
use crate::error::{Result, StorageError};
use crate::models::{
    Course, Event, EventKey, NewResult, Stroke, SwimResult, SwimTime, Swimmer, SwimmerName,
};

#[derive(FromRow)]
struct EventRow {
    event_id: Uuid,
    stroke: String,
    distance_meters: i32,
    course: String,
}

impl TryFrom<EventRow> for Event {
    type Error = StorageError;

    fn try_from(row: EventRow) -> Result<Self> {
        Ok(Event {
            event_id: row.event_id,
            stroke: row.stroke.parse()?,
            distance_meters: row.distance_meters,
            course: row.course.parse()?,
        })
    }
}

#[derive(FromRow)]
struct ResultRow {
    result_id: Uuid,
    swimmer_id: Uuid,
    event_id: Uuid,
    time_seconds: Decimal,
    result_date: NaiveDate,
    course: String,
    location: Option<String>,
    date_estimated: bool,
}

impl TryFrom<ResultRow> for SwimResult {
    type Error = StorageError;

    fn try_from(row: ResultRow) -> Result<Self> {
        let time = SwimTime::from_seconds(row.time_seconds).ok_or_else(|| {
            StorageError::Decode(format!(
                "result {} has non-positive time {}",
                row.result_id, row.time_seconds
            ))
        })?;

        Ok(SwimResult {
            result_id: row.result_id,
            swimmer_id: row.swimmer_id,
            event_id: row.event_id,
            time,
            date: row.result_date,
            course: row.course.parse::<Course>()?,
            location: row.location,
            date_estimated: row.date_estimated,
        })
    }
}

const RESULT_COLUMNS: &str = "r.result_id, r.swimmer_id, r.event_id, r.time_seconds, \
     r.result_date, r.course, r.location, r.date_estimated";

/// PostgreSQL-backed store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the bundled schema migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl ResultStore for PgStore {
    async fn find_swimmer(&self, name: &SwimmerName) -> Result<Option<Swimmer>> {
        let (first, last) = name.as_database_tuple();
        let swimmer = sqlx::query_as::<_, Swimmer>(
            r#"
            SELECT swimmer_id, first_name, last_name
            FROM swimmers
            WHERE first_name = $1 AND last_name = $2
            "#,
        )
        .bind(first)
        .bind(last)
        .fetch_optional(&self.pool)
        .await?;

        Ok(swimmer)
    }

    async fn create_swimmer(&self, name: &SwimmerName) -> Result<Swimmer> {
        let (first, last) = name.as_database_tuple();
        let swimmer = sqlx::query_as::<_, Swimmer>(
            r#"
            INSERT INTO swimmers (swimmer_id, first_name, last_name)
            VALUES ($1, $2, $3)
            RETURNING swimmer_id, first_name, last_name
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(first)
        .bind(last)
        .fetch_one(&self.pool)
        .await
        .map_err(StorageError::from)
        .map_err(|e| {
            if e.is_unique_violation() {
                StorageError::ConstraintViolation(format!(
                    "swimmer '{}' already exists",
                    name.full_name()
                ))
            } else {
                e
            }
        })?;

        Ok(swimmer)
    }

    async fn list_swimmers(&self) -> Result<Vec<Swimmer>> {
        let swimmers = sqlx::query_as::<_, Swimmer>(
            r#"
            SELECT swimmer_id, first_name, last_name
            FROM swimmers
            ORDER BY last_name, first_name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(swimmers)
    }

    async fn find_event(&self, key: EventKey) -> Result<Option<Event>> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            SELECT event_id, stroke, distance_meters, course
            FROM events
            WHERE stroke = $1 AND distance_meters = $2 AND course = $3
            "#,
        )
        .bind(key.stroke.as_str())
        .bind(key.distance_meters)
        .bind(key.course.as_str())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Event::try_from).transpose()
    }

    async fn create_event(&self, key: EventKey) -> Result<Event> {
        let row = sqlx::query_as::<_, EventRow>(
            r#"
            INSERT INTO events (event_id, stroke, distance_meters, course)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (stroke, distance_meters, course)
            DO UPDATE SET stroke = EXCLUDED.stroke
            RETURNING event_id, stroke, distance_meters, course
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(key.stroke.as_str())
        .bind(key.distance_meters)
        .bind(key.course.as_str())
        .fetch_one(&self.pool)
        .await?;

        Event::try_from(row)
    }

    async fn list_results(&self, swimmer_id: Uuid) -> Result<Vec<SwimResult>> {
        let query = format!(
            "SELECT {} FROM results r WHERE r.swimmer_id = $1 ORDER BY r.result_date",
            RESULT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ResultRow>(&query)
            .bind(swimmer_id)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SwimResult::try_from).collect()
    }

    async fn append_results(&self, results: &[NewResult]) -> Result<Vec<SwimResult>> {
        if results.is_empty() {
            return Ok(Vec::new());
        }

        let mut tx = self.pool.begin().await?;
        let mut stored = Vec::with_capacity(results.len());

        for result in results {
            let row = sqlx::query_as::<_, ResultRow>(
                r#"
                INSERT INTO results (
                    result_id, swimmer_id, event_id, time_seconds,
                    result_date, course, location, date_estimated
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
                RETURNING result_id, swimmer_id, event_id, time_seconds,
                          result_date, course, location, date_estimated
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(result.swimmer_id)
            .bind(result.event_id)
            .bind(result.time.seconds())
            .bind(result.date)
            .bind(result.course.as_str())
            .bind(result.location.as_deref())
            .bind(result.date_estimated)
            .fetch_one(&mut *tx)
            .await
            .map_err(StorageError::from)
            .map_err(|e| {
                if e.is_foreign_key_violation() {
                    StorageError::ConstraintViolation(format!(
                        "result references unknown swimmer {} or event {}",
                        result.swimmer_id, result.event_id
                    ))
                } else {
                    e
                }
            })?;

            stored.push(SwimResult::try_from(row)?);
        }

        tx.commit().await?;
        tracing::debug!("Appended {} results", stored.len());
        Ok(stored)
    }

    async fn results_for(
        &self,
        swimmer_id: Uuid,
        stroke: Option<Stroke>,
        distance_meters: Option<i32>,
    ) -> Result<Vec<SwimResult>> {
        let mut qb = QueryBuilder::<sqlx::Postgres>::new(format!(
            "SELECT {} FROM results r JOIN events e ON e.event_id = r.event_id WHERE r.swimmer_id = ",
            RESULT_COLUMNS
        ));
        qb.push_bind(swimmer_id);

        if let Some(stroke) = stroke {
            qb.push(" AND e.stroke = ").push_bind(stroke.as_str());
        }
        if let Some(distance) = distance_meters {
            qb.push(" AND e.distance_meters = ").push_bind(distance);
        }
        qb.push(" ORDER BY r.result_date");

        let rows = qb
            .build_query_as::<ResultRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(SwimResult::try_from).collect()
    }
}
