//! Visit routes.
//!
//! - POST /api/visits - Check a visitor in
//! - POST /api/visits/{id}/checkout - Check a visitor out

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;

use crate::auth::Principal;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{CheckInRequest, CheckOutRequest, NewAuditEntry};
use crate::services::{AuditService, NotificationService, SettingsService, VisitService};

/// POST /api/visits
pub async fn check_in(
    pool: web::Data<DbPool>,
    notifications: web::Data<NotificationService>,
    principal: Principal,
    body: web::Json<CheckInRequest>,
) -> AppResult<HttpResponse> {
    let settings = SettingsService::load_monitor_settings(pool.get_ref()).await?;
    let now = Utc::now();

    let visit =
        VisitService::check_in(pool.get_ref(), &body, settings.max_visit_duration, now).await?;

    AuditService::record_or_log(
        pool.get_ref(),
        NewAuditEntry::new("visitor_checkin", "visitor_logs", Some(visit.id))
            .with_actor(principal.actor())
            .with_new_values(json!({
                "visitor_id": visit.visitor_id,
                "flat_id": visit.flat_id,
                "expected_duration": visit.expected_duration,
            }))
            .with_ip(principal.ip_address),
    )
    .await;

    if settings.should_email() {
        if let Err(e) = notifications
            .send_checkin_notification(pool.get_ref(), visit.id, now)
            .await
        {
            log::error!("Check-in notification for visit {} failed: {}", visit.id, e);
        }
    }

    Ok(HttpResponse::Created().json(visit))
}

/// POST /api/visits/{id}/checkout
pub async fn check_out(
    pool: web::Data<DbPool>,
    notifications: web::Data<NotificationService>,
    principal: Principal,
    path: web::Path<i64>,
    body: Option<web::Json<CheckOutRequest>>,
) -> AppResult<HttpResponse> {
    let input = body.map(|b| b.into_inner()).unwrap_or_default();
    let now = Utc::now();

    let visit = VisitService::check_out(pool.get_ref(), path.into_inner(), &input, now).await?;

    AuditService::record_or_log(
        pool.get_ref(),
        NewAuditEntry::new("visitor_checkout", "visitor_logs", Some(visit.id))
            .with_actor(principal.actor())
            .with_new_values(json!({ "status": visit.status }))
            .with_ip(principal.ip_address),
    )
    .await;

    let settings = SettingsService::load_monitor_settings(pool.get_ref()).await?;
    if settings.should_email() {
        if let Err(e) = notifications
            .send_checkout_notification(pool.get_ref(), visit.id, now)
            .await
        {
            log::error!("Check-out notification for visit {} failed: {}", visit.id, e);
        }
    }

    Ok(HttpResponse::Ok().json(visit))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/visits")
            .route("", web::post().to(check_in))
            .route("/{id}/checkout", web::post().to(check_out)),
    );
}
