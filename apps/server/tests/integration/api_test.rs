//! Integration tests for the HTTP API
//!
//! Exercises bearer-token principals, role checks and the JSON endpoints
//! against a real PostgreSQL database.

use actix_web::{test, web, App};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::common::fixtures::{seed_site, seed_staff, OWNER_EMAIL};
use crate::common::{RecordingMailer, TestDb, VisitBuilder};
use tapptrak::config::{
    Config, DatabaseConfig, MonitorConfig, SecurityConfig, SiteConfig, SmtpConfig,
};
use tapptrak::monitor::{SweepMonitor, Sweeper};
use tapptrak::routes;
use tapptrak::services::{AuditService, NotificationService};

const ADMIN: &str = "Bearer admin-token";
const GUARD: &str = "Bearer guard-token";

fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 5,
            min_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(600),
            max_lifetime: Duration::from_secs(1800),
        },
        site: SiteConfig {
            name: "TappTrak".to_string(),
            url: "http://localhost:8080".to_string(),
        },
        smtp: SmtpConfig {
            host: None,
            port: 587,
            username: None,
            password: None,
            from_address: "TappTrak <noreply@localhost>".to_string(),
        },
        monitor: MonitorConfig::default(),
        security: SecurityConfig {
            admin_token: Some("admin-token".to_string()),
            security_token: Some("guard-token".to_string()),
        },
    }
}

macro_rules! init_app {
    ($db:expr, $mailer:expr) => {{
        let config = test_config();
        let notifications = NotificationService::new($mailer.clone(), "TappTrak");
        let monitor = SweepMonitor::new(Sweeper::new(
            $db.pool.clone(),
            notifications.clone(),
            config.monitor.clone(),
        ));
        test::init_service(
            App::new()
                .app_data(web::Data::new($db.pool.clone()))
                .app_data(web::Data::new(config))
                .app_data(web::Data::new(notifications))
                .app_data(web::Data::new(monitor))
                .configure(routes::configure),
        )
        .await
    }};
}

// =============================================================================
// Authentication
// =============================================================================

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let db = TestDb::new().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::get().uri("/api/alerts").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);

    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"]["type"], "Unauthorized");
}

#[actix_web::test]
async fn test_unknown_token_is_unauthorized() {
    let db = TestDb::new().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::get()
        .uri("/api/alerts")
        .insert_header(("Authorization", "Bearer not-a-token"))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_health_needs_no_token() {
    let db = TestDb::new().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

// =============================================================================
// Sweeps
// =============================================================================

#[actix_web::test]
async fn test_security_cannot_trigger_sweep() {
    let db = TestDb::new().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::post()
        .uri("/api/sweeps")
        .insert_header(("Authorization", GUARD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_admin_sweep_then_latest_report() {
    let db = TestDb::new().await;
    let site = seed_site(&db.pool).await;
    seed_staff(&db.pool).await;
    VisitBuilder::inside(site, Utc::now(), 90)
        .insert(&db.pool)
        .await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::get()
        .uri("/api/sweeps/latest")
        .insert_header(("Authorization", GUARD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);

    let req = test::TestRequest::post()
        .uri("/api/sweeps")
        .insert_header(("Authorization", ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let report: Value = test::read_body_json(resp).await;
    assert_eq!(report["outcome"], "completed");
    assert_eq!(report["summary"]["overstays_processed"], 1);
    assert_eq!(report["summary"]["overstay_alerts_created"], 1);
    assert_eq!(report["summary"]["notifications_sent"], 1);
    assert_eq!(mailer.sent().len(), 2);

    let req = test::TestRequest::get()
        .uri("/api/sweeps/latest")
        .insert_header(("Authorization", GUARD))
        .to_request();
    let latest: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(latest["run_id"], report["run_id"]);

    let triggered = AuditService::list_by_action(&db.pool, "sweep_triggered", 10)
        .await
        .unwrap();
    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].actor.as_deref(), Some("admin"));
}

// =============================================================================
// Visits
// =============================================================================

#[actix_web::test]
async fn test_check_in_and_out_flow() {
    let db = TestDb::new().await;
    let site = seed_site(&db.pool).await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::post()
        .uri("/api/visits")
        .insert_header(("Authorization", GUARD))
        .set_json(json!({
            "visitor_id": site.visitor_id,
            "flat_id": site.flat_id,
            "guard_id": site.guard_id,
            "purpose": "Courier"
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 201);
    let visit: Value = test::read_body_json(resp).await;
    assert_eq!(visit["status"], "inside");
    assert_eq!(visit["expected_duration"], 240);
    let visit_id = visit["id"].as_i64().unwrap();

    assert_eq!(mailer.recipients(), vec![OWNER_EMAIL.to_string()]);

    let req = test::TestRequest::post()
        .uri(&format!("/api/visits/{}/checkout", visit_id))
        .insert_header(("Authorization", GUARD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);
    let closed: Value = test::read_body_json(resp).await;
    assert_eq!(closed["status"], "exited");
    assert_eq!(mailer.sent().len(), 2);

    let req = test::TestRequest::post()
        .uri(&format!("/api/visits/{}/checkout", visit_id))
        .insert_header(("Authorization", GUARD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let checkins = AuditService::list_by_action(&db.pool, "visitor_checkin", 10)
        .await
        .unwrap();
    assert_eq!(checkins.len(), 1);
    assert_eq!(checkins[0].record_id, Some(visit_id));
    assert_eq!(checkins[0].actor.as_deref(), Some("security"));
}

#[actix_web::test]
async fn test_check_in_unknown_visitor_is_404() {
    let db = TestDb::new().await;
    let site = seed_site(&db.pool).await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::post()
        .uri("/api/visits")
        .insert_header(("Authorization", GUARD))
        .set_json(json!({
            "visitor_id": 999,
            "flat_id": site.flat_id,
            "guard_id": site.guard_id,
            "expected_duration": 30
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
    assert!(mailer.sent().is_empty());
}

// =============================================================================
// Alerts
// =============================================================================

#[actix_web::test]
async fn test_alert_listing_and_transitions() {
    let db = TestDb::new().await;
    let site = seed_site(&db.pool).await;
    VisitBuilder::inside(site, Utc::now(), 90)
        .insert(&db.pool)
        .await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::post()
        .uri("/api/sweeps")
        .insert_header(("Authorization", ADMIN))
        .to_request();
    test::call_service(&app, req).await;

    let req = test::TestRequest::get()
        .uri("/api/alerts?status=active&severity=high")
        .insert_header(("Authorization", GUARD))
        .to_request();
    let alerts: Value = test::call_and_read_body_json(&app, req).await;
    let alerts = alerts.as_array().unwrap();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0]["alert_kind"], "overstay");
    let alert_id = alerts[0]["id"].as_i64().unwrap();

    let req = test::TestRequest::post()
        .uri(&format!("/api/alerts/{}/acknowledge", alert_id))
        .insert_header(("Authorization", GUARD))
        .to_request();
    let acked: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(acked["status"], "acknowledged");
    assert_eq!(acked["acknowledged_by"], "security");

    let req = test::TestRequest::post()
        .uri(&format!("/api/alerts/{}/resolve", alert_id))
        .insert_header(("Authorization", ADMIN))
        .to_request();
    let resolved: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(resolved["status"], "resolved");

    let req = test::TestRequest::post()
        .uri(&format!("/api/alerts/{}/dismiss", alert_id))
        .insert_header(("Authorization", ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);

    let req = test::TestRequest::post()
        .uri("/api/alerts/424242/acknowledge")
        .insert_header(("Authorization", ADMIN))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}

#[actix_web::test]
async fn test_alert_list_rejects_unknown_status() {
    let db = TestDb::new().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::get()
        .uri("/api/alerts?status=sleeping")
        .insert_header(("Authorization", GUARD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 400);
}

// =============================================================================
// Settings
// =============================================================================

#[actix_web::test]
async fn test_settings_are_admin_only() {
    let db = TestDb::new().await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::get()
        .uri("/api/settings")
        .insert_header(("Authorization", GUARD))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);

    let req = test::TestRequest::put()
        .uri("/api/settings/max_visit_duration")
        .insert_header(("Authorization", GUARD))
        .set_json(json!({ "value": "10" }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_updated_default_duration_applies_to_check_in() {
    let db = TestDb::new().await;
    let site = seed_site(&db.pool).await;
    let mailer = Arc::new(RecordingMailer::new());
    let app = init_app!(db, mailer);

    let req = test::TestRequest::put()
        .uri("/api/settings/max_visit_duration")
        .insert_header(("Authorization", ADMIN))
        .set_json(json!({ "value": "120" }))
        .to_request();
    let setting: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(setting["setting_value"], "120");

    let req = test::TestRequest::get()
        .uri("/api/settings")
        .insert_header(("Authorization", ADMIN))
        .to_request();
    let settings: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(settings.as_array().unwrap().len(), 4);

    let req = test::TestRequest::post()
        .uri("/api/visits")
        .insert_header(("Authorization", GUARD))
        .set_json(json!({
            "visitor_id": site.visitor_id,
            "flat_id": site.flat_id,
            "guard_id": site.guard_id
        }))
        .to_request();
    let visit: Value = test::call_and_read_body_json(&app, req).await;
    assert_eq!(visit["expected_duration"], 120);

    let updates = AuditService::list_by_action(&db.pool, "setting_updated", 10)
        .await
        .unwrap();
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].old_values.as_ref().unwrap()["value"], "240");
}
