use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{AuditEntry, NewAuditEntry};

/// Audit entries older than this are purged by the sweep
pub const AUDIT_RETENTION_DAYS: i64 = 90;

pub struct AuditService;

impl AuditService {
    /// Records an audit entry
    pub async fn record(pool: &PgPool, entry: NewAuditEntry) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO audit_logs (
                actor, action, table_name, record_id, old_values, new_values, ip_address
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(&entry.actor)
        .bind(&entry.action)
        .bind(&entry.table_name)
        .bind(entry.record_id)
        .bind(&entry.old_values)
        .bind(&entry.new_values)
        .bind(entry.ip_address)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Records an audit entry, logging instead of failing.
    /// Audit writes never abort the operation they describe.
    pub async fn record_or_log(pool: &PgPool, entry: NewAuditEntry) {
        let action = entry.action.clone();
        if let Err(e) = Self::record(pool, entry).await {
            log::error!("Failed to record audit entry '{}': {}", action, e);
        }
    }

    /// Whether `action` was recorded for a record at or after `since`
    pub async fn exists_since(
        pool: &PgPool,
        action: &str,
        table_name: &str,
        record_id: i64,
        since: DateTime<Utc>,
    ) -> AppResult<bool> {
        let (exists,): (bool,) = sqlx::query_as(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM audit_logs
                WHERE action = $1 AND table_name = $2 AND record_id = $3
                  AND created_at >= $4
            )
            "#,
        )
        .bind(action)
        .bind(table_name)
        .bind(record_id)
        .bind(since)
        .fetch_one(pool)
        .await?;

        Ok(exists)
    }

    /// Lists the newest entries for an action
    pub async fn list_by_action(
        pool: &PgPool,
        action: &str,
        limit: i64,
    ) -> AppResult<Vec<AuditEntry>> {
        let entries = sqlx::query_as::<_, AuditEntry>(
            r#"
            SELECT id, actor, action, table_name, record_id, old_values, new_values,
                   ip_address, created_at
            FROM audit_logs
            WHERE action = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(action)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(entries)
    }

    /// Deletes entries older than the retention window. Returns rows removed.
    pub async fn purge_expired(pool: &PgPool, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = now - Duration::days(AUDIT_RETENTION_DAYS);
        let result = sqlx::query("DELETE FROM audit_logs WHERE created_at < $1")
            .bind(cutoff)
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}
