//! Sweep routes.
//!
//! - POST /api/sweeps - Run an overstay sweep now (admin)
//! - GET /api/sweeps/latest - Report of the last sweep

use actix_web::{web, HttpResponse};

use crate::auth::Principal;
use crate::db::DbPool;
use crate::error::{AppError, AppResult};
use crate::models::NewAuditEntry;
use crate::monitor::{SweepMonitor, SweepOutcome};
use crate::services::AuditService;

/// POST /api/sweeps
pub async fn run_sweep(
    pool: web::Data<DbPool>,
    monitor: web::Data<SweepMonitor>,
    principal: Principal,
) -> AppResult<HttpResponse> {
    principal.require_admin()?;

    AuditService::record_or_log(
        pool.get_ref(),
        NewAuditEntry::new("sweep_triggered", "visitor_logs", None)
            .with_actor(principal.actor())
            .with_ip(principal.ip_address),
    )
    .await;

    let report = monitor.run_now().await;
    if report.outcome == SweepOutcome::Skipped {
        return Err(AppError::Conflict(
            "An overstay sweep is already running".to_string(),
        ));
    }

    Ok(HttpResponse::Ok().json(report))
}

/// GET /api/sweeps/latest
pub async fn latest_sweep(
    monitor: web::Data<SweepMonitor>,
    _principal: Principal,
) -> AppResult<HttpResponse> {
    let report = monitor
        .latest()
        .await
        .ok_or_else(|| AppError::NotFound("No sweep has run yet".to_string()))?;
    Ok(HttpResponse::Ok().json(report))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/sweeps")
            .route("", web::post().to(run_sweep))
            .route("/latest", web::get().to(latest_sweep)),
    );
}
