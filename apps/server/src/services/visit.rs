use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{CheckInRequest, CheckOutRequest, OpenVisit, Visit, VisitDetails, VisitStatus};

pub struct VisitService;

const VISIT_COLUMNS: &str = r#"
    id, visitor_id, flat_id, guard_id, check_in_time, check_out_time,
    expected_duration, purpose, vehicle_number, items_carried, notes, status
"#;

impl VisitService {
    /// Gets a visit by ID
    pub async fn get_by_id(pool: &PgPool, id: i64) -> AppResult<Visit> {
        sqlx::query_as::<_, Visit>(&format!(
            "SELECT {VISIT_COLUMNS} FROM visitor_logs WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Visit {} not found", id)))
    }

    /// Loads a visit with visitor, flat and guard details
    pub async fn get_details(pool: &PgPool, id: i64) -> AppResult<Option<VisitDetails>> {
        let details = sqlx::query_as::<_, VisitDetails>(
            r#"
            SELECT vl.id, vl.visitor_id, vl.flat_id, vl.guard_id,
                   vl.check_in_time, vl.check_out_time, vl.expected_duration,
                   vl.purpose, vl.status,
                   v.full_name AS visitor_name, v.phone AS visitor_phone,
                   f.flat_number, f.owner_name, f.owner_email,
                   g.full_name AS guard_name, g.phone AS guard_phone
            FROM visitor_logs vl
            JOIN visitors v ON vl.visitor_id = v.id
            JOIN flats f ON vl.flat_id = f.id
            JOIN guards g ON vl.guard_id = g.id
            WHERE vl.id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(details)
    }

    /// Open visits that are within `lookahead_minutes` of their expected
    /// duration or past it, as of `now`.
    ///
    /// Elapsed time is whole minutes, truncated. Ordered oldest check-in first.
    pub async fn find_sweep_candidates(
        pool: &PgPool,
        now: DateTime<Utc>,
        lookahead_minutes: i32,
    ) -> AppResult<Vec<OpenVisit>> {
        let visits = sqlx::query_as::<_, OpenVisit>(
            r#"
            SELECT id, flat_id, check_in_time, expected_duration, status,
                   visitor_name, flat_number, elapsed_minutes
            FROM (
                SELECT vl.id, vl.flat_id, vl.check_in_time, vl.expected_duration, vl.status,
                       v.full_name AS visitor_name, f.flat_number,
                       FLOOR(EXTRACT(EPOCH FROM ($1::timestamptz - vl.check_in_time)) / 60)::BIGINT
                           AS elapsed_minutes
                FROM visitor_logs vl
                JOIN visitors v ON vl.visitor_id = v.id
                JOIN flats f ON vl.flat_id = f.id
                WHERE vl.check_out_time IS NULL
                  AND vl.status IN ('inside', 'overstayed')
            ) open_visits
            WHERE elapsed_minutes >= expected_duration - $2
            ORDER BY check_in_time, id
            "#,
        )
        .bind(now)
        .bind(lookahead_minutes)
        .fetch_all(pool)
        .await?;

        Ok(visits)
    }

    /// Moves an open `inside` visit to `overstayed`.
    /// Returns false if the visit was already overstayed or has been checked out.
    pub async fn mark_overstayed(pool: &PgPool, id: i64) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE visitor_logs
            SET status = 'overstayed'
            WHERE id = $1 AND status = 'inside' AND check_out_time IS NULL
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Checks a visitor in. `default_duration` applies when the request
    /// carries no expected duration.
    pub async fn check_in(
        pool: &PgPool,
        input: &CheckInRequest,
        default_duration: i32,
        now: DateTime<Utc>,
    ) -> AppResult<Visit> {
        let expected_duration = input.expected_duration.unwrap_or(default_duration);
        if expected_duration <= 0 {
            return Err(AppError::Validation(
                "expected_duration must be a positive number of minutes".to_string(),
            ));
        }

        let visit = sqlx::query_as::<_, Visit>(&format!(
            r#"
            INSERT INTO visitor_logs (
                visitor_id, flat_id, guard_id, check_in_time, purpose,
                expected_duration, vehicle_number, items_carried, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 'inside')
            RETURNING {VISIT_COLUMNS}
            "#
        ))
        .bind(input.visitor_id)
        .bind(input.flat_id)
        .bind(input.guard_id)
        .bind(now)
        .bind(&input.purpose)
        .bind(expected_duration)
        .bind(&input.vehicle_number)
        .bind(&input.items_carried)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_foreign_key_violation() {
                    return AppError::NotFound(
                        "Visitor, flat or guard does not exist".to_string(),
                    );
                }
            }
            AppError::Database(e)
        })?;

        Ok(visit)
    }

    /// Closes an open visit
    pub async fn check_out(
        pool: &PgPool,
        id: i64,
        input: &CheckOutRequest,
        now: DateTime<Utc>,
    ) -> AppResult<Visit> {
        let status = if input.forced {
            VisitStatus::ForcedExit
        } else {
            VisitStatus::Exited
        };

        let visit = sqlx::query_as::<_, Visit>(&format!(
            r#"
            UPDATE visitor_logs
            SET check_out_time = $2, status = $3::text::varchar, notes = COALESCE($4, notes)
            WHERE id = $1 AND check_out_time IS NULL
            RETURNING {VISIT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .bind(status.to_string())
        .bind(&input.notes)
        .fetch_optional(pool)
        .await?;

        match visit {
            Some(v) => Ok(v),
            None => {
                // Distinguish unknown visits from ones already closed
                let existing = Self::get_by_id(pool, id).await?;
                Err(AppError::Conflict(format!(
                    "Visit {} is already closed ({})",
                    id, existing.status
                )))
            }
        }
    }
}
