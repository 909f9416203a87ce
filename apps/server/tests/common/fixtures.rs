//! Test fixtures and data builders
//!
//! Inserts users, flats, guards, visitors and visits with explicit times so
//! sweeps can be evaluated against a chosen reference time.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;

use tapptrak::models::{AlertKind, AlertStatus, Role, VisitStatus};

pub const VISITOR_NAME: &str = "Ravi Kumar";
pub const OWNER_EMAIL: &str = "owner@example.com";

/// Ids of one flat, guard and visitor
#[derive(Debug, Clone, Copy)]
pub struct Site {
    pub flat_id: i32,
    pub guard_id: i32,
    pub visitor_id: i32,
}

pub async fn insert_user(pool: &PgPool, email: &str, role: Role, is_active: bool) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        "INSERT INTO users (email, full_name, role, is_active) VALUES ($1, $2, $3, $4) RETURNING id",
    )
    .bind(email)
    .bind(format!("User {}", email))
    .bind(role.to_string())
    .bind(is_active)
    .fetch_one(pool)
    .await
    .expect("Failed to insert user");
    id
}

pub async fn insert_flat(pool: &PgPool, flat_number: &str, owner_email: Option<&str>) -> i32 {
    let (id,): (i32,) = sqlx::query_as(
        r#"
        INSERT INTO flats (flat_number, owner_name, owner_email)
        VALUES ($1, 'Meera Shah', $2)
        RETURNING id
        "#,
    )
    .bind(flat_number)
    .bind(owner_email)
    .fetch_one(pool)
    .await
    .expect("Failed to insert flat");
    id
}

pub async fn insert_guard(pool: &PgPool, name: &str) -> i32 {
    let (id,): (i32,) =
        sqlx::query_as("INSERT INTO guards (full_name, phone) VALUES ($1, '555-0199') RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .expect("Failed to insert guard");
    id
}

pub async fn insert_visitor(pool: &PgPool, name: &str) -> i32 {
    let (id,): (i32,) =
        sqlx::query_as("INSERT INTO visitors (full_name, phone) VALUES ($1, '555-0100') RETURNING id")
            .bind(name)
            .fetch_one(pool)
            .await
            .expect("Failed to insert visitor");
    id
}

/// One flat (with owner email), one guard and one visitor
pub async fn seed_site(pool: &PgPool) -> Site {
    Site {
        flat_id: insert_flat(pool, "A-101", Some(OWNER_EMAIL)).await,
        guard_id: insert_guard(pool, "Sunil").await,
        visitor_id: insert_visitor(pool, VISITOR_NAME).await,
    }
}

/// Active admin and security users, plus an inactive admin that must never
/// receive mail
pub async fn seed_staff(pool: &PgPool) {
    insert_user(pool, "admin@example.com", Role::Admin, true).await;
    insert_user(pool, "guard@example.com", Role::Security, true).await;
    insert_user(pool, "former@example.com", Role::Admin, false).await;
}

/// Builds a `visitor_logs` row
pub struct VisitBuilder {
    site: Site,
    check_in_time: DateTime<Utc>,
    expected_duration: i32,
    status: VisitStatus,
    check_out_time: Option<DateTime<Utc>>,
    purpose: Option<String>,
}

impl VisitBuilder {
    /// An open visit checked in `elapsed_minutes` before `now`
    pub fn inside(site: Site, now: DateTime<Utc>, elapsed_minutes: i64) -> Self {
        Self {
            site,
            check_in_time: now - Duration::minutes(elapsed_minutes),
            expected_duration: 60,
            status: VisitStatus::Inside,
            check_out_time: None,
            purpose: Some("Delivery".to_string()),
        }
    }

    pub fn expected(mut self, minutes: i32) -> Self {
        self.expected_duration = minutes;
        self
    }

    pub fn overstayed(mut self) -> Self {
        self.status = VisitStatus::Overstayed;
        self
    }

    pub fn exited_at(mut self, at: DateTime<Utc>) -> Self {
        self.status = VisitStatus::Exited;
        self.check_out_time = Some(at);
        self
    }

    pub async fn insert(self, pool: &PgPool) -> i64 {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO visitor_logs (
                visitor_id, flat_id, guard_id, check_in_time, check_out_time,
                expected_duration, purpose, status
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(self.site.visitor_id)
        .bind(self.site.flat_id)
        .bind(self.site.guard_id)
        .bind(self.check_in_time)
        .bind(self.check_out_time)
        .bind(self.expected_duration)
        .bind(&self.purpose)
        .bind(self.status.to_string())
        .fetch_one(pool)
        .await
        .expect("Failed to insert visit");
        id
    }
}

/// Inserts an alert directly with a chosen status and creation time
pub async fn insert_alert(
    pool: &PgPool,
    visit_id: Option<i64>,
    kind: AlertKind,
    status: AlertStatus,
    created_at: DateTime<Utc>,
) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO alerts (
            alert_kind, title, message, severity, status, related_visit_id, created_by, created_at
        )
        VALUES ($1, $2, 'fixture', 'low', $3, $4, 'test', $5)
        RETURNING id
        "#,
    )
    .bind(kind.to_string())
    .bind(kind.title())
    .bind(status.to_string())
    .bind(visit_id)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .expect("Failed to insert alert");
    id
}

pub async fn insert_audit(pool: &PgPool, action: &str, created_at: DateTime<Utc>) -> i64 {
    let (id,): (i64,) = sqlx::query_as(
        "INSERT INTO audit_logs (action, table_name, created_at) VALUES ($1, 'fixture', $2) RETURNING id",
    )
    .bind(action)
    .bind(created_at)
    .fetch_one(pool)
    .await
    .expect("Failed to insert audit entry");
    id
}

pub async fn visit_status(pool: &PgPool, visit_id: i64) -> String {
    let (status,): (String,) = sqlx::query_as("SELECT status FROM visitor_logs WHERE id = $1")
        .bind(visit_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read visit status");
    status
}

pub async fn count_alerts(pool: &PgPool, visit_id: i64, kind: AlertKind) -> i64 {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT COUNT(*) FROM alerts WHERE related_visit_id = $1 AND alert_kind = $2",
    )
    .bind(visit_id)
    .bind(kind.to_string())
    .fetch_one(pool)
    .await
    .expect("Failed to count alerts");
    count
}

pub async fn set_setting(pool: &PgPool, key: &str, value: &str) {
    sqlx::query("UPDATE system_settings SET setting_value = $2 WHERE setting_key = $1")
        .bind(key)
        .bind(value)
        .execute(pool)
        .await
        .expect("Failed to update setting");
}
