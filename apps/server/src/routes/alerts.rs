//! Alert routes.
//!
//! - GET /api/alerts - List alerts (`status`, `severity`, `limit` filters)
//! - POST /api/alerts/{id}/acknowledge - Acknowledge an active alert
//! - POST /api/alerts/{id}/resolve - Resolve an active or acknowledged alert
//! - POST /api/alerts/{id}/dismiss - Dismiss an active or acknowledged alert

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;

use crate::auth::Principal;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{Alert, AlertFilter, AlertStatus, NewAuditEntry, Severity};
use crate::services::{AlertService, AuditService};

const DEFAULT_LIMIT: i64 = 100;
const MAX_LIMIT: i64 = 500;

#[derive(Debug, Deserialize)]
pub struct ListAlertsQuery {
    pub status: Option<AlertStatus>,
    pub severity: Option<Severity>,
    pub limit: Option<i64>,
}

/// GET /api/alerts
pub async fn list_alerts(
    pool: web::Data<DbPool>,
    _principal: Principal,
    query: web::Query<ListAlertsQuery>,
) -> AppResult<HttpResponse> {
    let query = query.into_inner();
    let filter = AlertFilter {
        status: query.status,
        severity: query.severity,
    };
    let limit = query.limit.unwrap_or(DEFAULT_LIMIT).clamp(1, MAX_LIMIT);

    let alerts = AlertService::list(pool.get_ref(), &filter, limit).await?;
    Ok(HttpResponse::Ok().json(alerts))
}

async fn audit_transition(pool: &DbPool, principal: &Principal, action: &str, alert: &Alert) {
    AuditService::record_or_log(
        pool,
        NewAuditEntry::new(action, "alerts", Some(alert.id))
            .with_actor(principal.actor())
            .with_new_values(json!({ "status": alert.status }))
            .with_ip(principal.ip_address),
    )
    .await;
}

/// POST /api/alerts/{id}/acknowledge
pub async fn acknowledge_alert(
    pool: web::Data<DbPool>,
    principal: Principal,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let alert = AlertService::acknowledge(
        pool.get_ref(),
        path.into_inner(),
        &principal.actor(),
        Utc::now(),
    )
    .await?;
    audit_transition(pool.get_ref(), &principal, "alert_acknowledged", &alert).await;
    Ok(HttpResponse::Ok().json(alert))
}

/// POST /api/alerts/{id}/resolve
pub async fn resolve_alert(
    pool: web::Data<DbPool>,
    principal: Principal,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let alert = AlertService::resolve(pool.get_ref(), path.into_inner(), Utc::now()).await?;
    audit_transition(pool.get_ref(), &principal, "alert_resolved", &alert).await;
    Ok(HttpResponse::Ok().json(alert))
}

/// POST /api/alerts/{id}/dismiss
pub async fn dismiss_alert(
    pool: web::Data<DbPool>,
    principal: Principal,
    path: web::Path<i64>,
) -> AppResult<HttpResponse> {
    let alert = AlertService::dismiss(pool.get_ref(), path.into_inner()).await?;
    audit_transition(pool.get_ref(), &principal, "alert_dismissed", &alert).await;
    Ok(HttpResponse::Ok().json(alert))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/alerts")
            .route("", web::get().to(list_alerts))
            .route("/{id}/acknowledge", web::post().to(acknowledge_alert))
            .route("/{id}/resolve", web::post().to(resolve_alert))
            .route("/{id}/dismiss", web::post().to(dismiss_alert)),
    );
}
