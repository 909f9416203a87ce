//! Alert service: deduplicated creation, operator transitions, retention.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::error::{AppError, AppResult};
use crate::models::{Alert, AlertFilter, AlertKind, AlertStatus, NewAlert};

/// Resolved/dismissed alerts older than this are purged by the sweep
pub const ALERT_RETENTION_DAYS: i64 = 30;

const ALERT_COLUMNS: &str = r#"
    id, alert_kind, title, message, severity, status,
    related_visit_id, related_flat_id, related_guard_id, created_by,
    acknowledged_by, acknowledged_at, resolved_at, created_at
"#;

pub struct AlertService;

impl AlertService {
    /// Gets an alert by ID
    pub async fn get_by_id(pool: &PgPool, id: i64) -> AppResult<Alert> {
        sqlx::query_as::<_, Alert>(&format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = $1"))
            .bind(id)
            .fetch_optional(pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Alert {} not found", id)))
    }

    /// Whether an active alert of `kind` exists for the visit
    pub async fn has_active(pool: &PgPool, visit_id: i64, kind: AlertKind) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM alerts
                WHERE related_visit_id = $1
                  AND alert_kind = $2::text::varchar
                  AND status = 'active'
            )
            "#,
        )
        .bind(visit_id)
        .bind(kind.to_string())
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Creates a visit-linked alert unless an active one of the same kind
    /// already exists for that visit.
    ///
    /// The check and the insert are one statement backed by the partial unique
    /// index `alerts_active_visit_kind_idx`, so concurrent callers cannot both
    /// succeed. Returns the new alert, or `None` if one was already active.
    pub async fn create_if_absent(pool: &PgPool, input: &NewAlert) -> AppResult<Option<Alert>> {
        if input.visit_id.is_none() {
            return Self::create(pool, input).await.map(Some);
        }

        let alert = sqlx::query_as::<_, Alert>(&format!(
            r#"
            INSERT INTO alerts (
                alert_kind, title, message, severity,
                related_visit_id, related_flat_id, related_guard_id, created_by
            )
            VALUES ($1::text::varchar, $2, $3, $4::text::varchar, $5, $6, $7, $8)
            ON CONFLICT (related_visit_id, alert_kind) WHERE status = 'active' DO NOTHING
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(input.kind.to_string())
        .bind(&input.title)
        .bind(&input.message)
        .bind(input.severity.to_string())
        .bind(input.visit_id)
        .bind(input.flat_id)
        .bind(input.guard_id)
        .bind(&input.created_by)
        .fetch_optional(pool)
        .await?;

        Ok(alert)
    }

    /// Creates an alert unconditionally
    pub async fn create(pool: &PgPool, input: &NewAlert) -> AppResult<Alert> {
        let alert = sqlx::query_as::<_, Alert>(&format!(
            r#"
            INSERT INTO alerts (
                alert_kind, title, message, severity,
                related_visit_id, related_flat_id, related_guard_id, created_by
            )
            VALUES ($1::text::varchar, $2, $3, $4::text::varchar, $5, $6, $7, $8)
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(input.kind.to_string())
        .bind(&input.title)
        .bind(&input.message)
        .bind(input.severity.to_string())
        .bind(input.visit_id)
        .bind(input.flat_id)
        .bind(input.guard_id)
        .bind(&input.created_by)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.constraint() == Some("alerts_active_visit_kind_idx") {
                    return AppError::Conflict(format!(
                        "An active {} alert already exists for this visit",
                        input.kind
                    ));
                }
                if db_err.is_foreign_key_violation() {
                    return AppError::NotFound("Linked visit, flat or guard not found".to_string());
                }
            }
            AppError::Database(e)
        })?;

        Ok(alert)
    }

    /// Lists alerts, most severe first, then newest first
    pub async fn list(pool: &PgPool, filter: &AlertFilter, limit: i64) -> AppResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM alerts
            WHERE ($1::varchar IS NULL OR status = $1::varchar)
              AND ($2::varchar IS NULL OR severity = $2::varchar)
            ORDER BY
                CASE severity
                    WHEN 'critical' THEN 1
                    WHEN 'high' THEN 2
                    WHEN 'medium' THEN 3
                    WHEN 'low' THEN 4
                END,
                created_at DESC,
                id DESC
            LIMIT $3
            "#
        ))
        .bind(filter.status.map(|s| s.to_string()))
        .bind(filter.severity.map(|s| s.to_string()))
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(alerts)
    }

    /// Lists alerts linked to a visit, oldest first
    pub async fn list_for_visit(pool: &PgPool, visit_id: i64) -> AppResult<Vec<Alert>> {
        let alerts = sqlx::query_as::<_, Alert>(&format!(
            r#"
            SELECT {ALERT_COLUMNS}
            FROM alerts
            WHERE related_visit_id = $1
            ORDER BY created_at, id
            "#
        ))
        .bind(visit_id)
        .fetch_all(pool)
        .await?;

        Ok(alerts)
    }

    /// active -> acknowledged
    pub async fn acknowledge(
        pool: &PgPool,
        id: i64,
        acknowledged_by: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Alert> {
        let alert = sqlx::query_as::<_, Alert>(&format!(
            r#"
            UPDATE alerts
            SET status = 'acknowledged', acknowledged_by = $2, acknowledged_at = $3
            WHERE id = $1 AND status = 'active'
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(acknowledged_by)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Self::transition_result(pool, id, alert, AlertStatus::Acknowledged).await
    }

    /// active | acknowledged -> resolved
    pub async fn resolve(pool: &PgPool, id: i64, now: DateTime<Utc>) -> AppResult<Alert> {
        let alert = sqlx::query_as::<_, Alert>(&format!(
            r#"
            UPDATE alerts
            SET status = 'resolved', resolved_at = $2
            WHERE id = $1 AND status IN ('active', 'acknowledged')
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(now)
        .fetch_optional(pool)
        .await?;

        Self::transition_result(pool, id, alert, AlertStatus::Resolved).await
    }

    /// active | acknowledged -> dismissed
    pub async fn dismiss(pool: &PgPool, id: i64) -> AppResult<Alert> {
        let alert = sqlx::query_as::<_, Alert>(&format!(
            r#"
            UPDATE alerts
            SET status = 'dismissed'
            WHERE id = $1 AND status IN ('active', 'acknowledged')
            RETURNING {ALERT_COLUMNS}
            "#
        ))
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Self::transition_result(pool, id, alert, AlertStatus::Dismissed).await
    }

    /// Maps a conditional update's outcome to NotFound / Conflict
    async fn transition_result(
        pool: &PgPool,
        id: i64,
        updated: Option<Alert>,
        target: AlertStatus,
    ) -> AppResult<Alert> {
        match updated {
            Some(alert) => Ok(alert),
            None => {
                let existing = Self::get_by_id(pool, id).await?;
                Err(AppError::Conflict(format!(
                    "Alert {} cannot move from {} to {}",
                    id, existing.status, target
                )))
            }
        }
    }

    /// Deletes resolved/dismissed alerts created before the retention window.
    /// Returns rows removed.
    pub async fn purge_expired(pool: &PgPool, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::days(ALERT_RETENTION_DAYS);
        let result = sqlx::query(
            "DELETE FROM alerts WHERE status IN ('resolved', 'dismissed') AND created_at < $1",
        )
        .bind(cutoff)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
