use actix_web::{http::StatusCode, web, HttpResponse};
use serde::Serialize;

use crate::db::{self, DbPool};
use crate::monitor::{SweepMonitor, SweepOutcome};

#[derive(Serialize)]
pub struct LivenessResponse {
    status: &'static str,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    status: &'static str,
    checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    database: &'static str,
    /// Outcome of the last sweep; informational, never fails readiness
    last_sweep: &'static str,
}

/// GET /health
pub async fn liveness() -> HttpResponse {
    HttpResponse::Ok().json(LivenessResponse { status: "ok" })
}

/// GET /health/ready
///
/// 200 when the database answers, 503 otherwise.
pub async fn readiness(
    pool: web::Data<DbPool>,
    monitor: Option<web::Data<SweepMonitor>>,
) -> HttpResponse {
    let db_healthy = db::health_check(pool.get_ref()).await;

    let last_sweep = match monitor {
        Some(monitor) => match monitor.latest().await.map(|r| r.outcome) {
            None => "pending",
            Some(SweepOutcome::Completed { .. }) => "ok",
            Some(SweepOutcome::Skipped) => "skipped",
            Some(SweepOutcome::Failed { .. }) => "failed",
            Some(SweepOutcome::TimedOut) => "timed_out",
        },
        None => "disabled",
    };

    let (status, http_status) = if db_healthy {
        ("ready", StatusCode::OK)
    } else {
        ("not_ready", StatusCode::SERVICE_UNAVAILABLE)
    };

    HttpResponse::build(http_status).json(ReadinessResponse {
        status,
        checks: ReadinessChecks {
            database: if db_healthy { "ok" } else { "error" },
            last_sweep,
        },
    })
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/health")
            .route("", web::get().to(liveness))
            .route("/ready", web::get().to(readiness)),
    );
}
