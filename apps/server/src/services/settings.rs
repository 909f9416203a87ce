use sqlx::PgPool;
use std::collections::HashMap;

use crate::error::{AppError, AppResult};
use crate::models::{MonitorSettings, Setting};

pub struct SettingsService;

impl SettingsService {
    /// Gets a raw setting value
    pub async fn get(pool: &PgPool, key: &str) -> AppResult<Option<String>> {
        let value: Option<(String,)> =
            sqlx::query_as("SELECT setting_value FROM system_settings WHERE setting_key = $1")
                .bind(key)
                .fetch_optional(pool)
                .await?;

        Ok(value.map(|(v,)| v))
    }

    /// Gets a raw setting value, falling back to `default` when absent
    pub async fn get_or(pool: &PgPool, key: &str, default: &str) -> AppResult<String> {
        Ok(Self::get(pool, key)
            .await?
            .unwrap_or_else(|| default.to_string()))
    }

    /// Inserts or updates a setting
    pub async fn set(
        pool: &PgPool,
        key: &str,
        value: &str,
        description: Option<&str>,
    ) -> AppResult<Setting> {
        let key = key.trim();
        if key.is_empty() || key.len() > 64 {
            return Err(AppError::Validation(
                "Setting key must be 1-64 characters".to_string(),
            ));
        }

        let setting = sqlx::query_as::<_, Setting>(
            r#"
            INSERT INTO system_settings (setting_key, setting_value, description)
            VALUES ($1, $2, $3)
            ON CONFLICT (setting_key) DO UPDATE
            SET setting_value = EXCLUDED.setting_value,
                description = COALESCE(EXCLUDED.description, system_settings.description),
                updated_at = NOW()
            RETURNING setting_key, setting_value, description, updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(description)
        .fetch_one(pool)
        .await?;

        Ok(setting)
    }

    /// Lists all settings ordered by key
    pub async fn list(pool: &PgPool) -> AppResult<Vec<Setting>> {
        let settings = sqlx::query_as::<_, Setting>(
            r#"
            SELECT setting_key, setting_value, description, updated_at
            FROM system_settings
            ORDER BY setting_key
            "#,
        )
        .fetch_all(pool)
        .await?;

        Ok(settings)
    }

    /// Loads the monitor's settings snapshot in one query
    pub async fn load_monitor_settings(pool: &PgPool) -> AppResult<MonitorSettings> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT setting_key, setting_value FROM system_settings")
                .fetch_all(pool)
                .await?;

        let values: HashMap<String, String> = rows.into_iter().collect();
        Ok(MonitorSettings::from_values(&values))
    }
}
