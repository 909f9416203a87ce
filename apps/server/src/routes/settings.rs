//! Settings routes (admin only).
//!
//! - GET /api/settings - List settings
//! - PUT /api/settings/{key} - Create or update a setting

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::Principal;
use crate::db::DbPool;
use crate::error::AppResult;
use crate::models::{NewAuditEntry, UpdateSetting};
use crate::services::{AuditService, SettingsService};

/// GET /api/settings
pub async fn list_settings(
    pool: web::Data<DbPool>,
    principal: Principal,
) -> AppResult<HttpResponse> {
    principal.require_admin()?;
    let settings = SettingsService::list(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(settings))
}

/// PUT /api/settings/{key}
pub async fn update_setting(
    pool: web::Data<DbPool>,
    principal: Principal,
    path: web::Path<String>,
    body: web::Json<UpdateSetting>,
) -> AppResult<HttpResponse> {
    principal.require_admin()?;
    let key = path.into_inner();
    let body = body.into_inner();

    let previous = SettingsService::get(pool.get_ref(), &key).await?;
    let setting =
        SettingsService::set(pool.get_ref(), &key, &body.value, body.description.as_deref())
            .await?;

    let mut entry = NewAuditEntry::new("setting_updated", "system_settings", None)
        .with_actor(principal.actor())
        .with_new_values(json!({ "key": setting.setting_key, "value": setting.setting_value }))
        .with_ip(principal.ip_address);
    entry.old_values = previous.map(|value| json!({ "key": key, "value": value }));
    AuditService::record_or_log(pool.get_ref(), entry).await;

    Ok(HttpResponse::Ok().json(setting))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/settings")
            .route("", web::get().to(list_settings))
            .route("/{key}", web::put().to(update_setting)),
    );
}
