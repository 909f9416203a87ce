use sqlx::PgPool;

use crate::error::AppResult;
use crate::models::{Role, User};

pub struct UsersService;

impl UsersService {
    /// Active users holding `role`, oldest account first
    pub async fn active_by_role(pool: &PgPool, role: Role) -> AppResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, full_name, phone, role, is_active, created_at
            FROM users
            WHERE role = $1::text::varchar AND is_active = TRUE
            ORDER BY id
            "#,
        )
        .bind(role.to_string())
        .fetch_all(pool)
        .await?;

        Ok(users)
    }

    /// Recipients of overstay alerts: active admins followed by active
    /// security staff
    pub async fn overstay_recipients(pool: &PgPool) -> AppResult<Vec<String>> {
        let mut recipients = Vec::new();
        for role in [Role::Admin, Role::Security] {
            recipients.extend(
                Self::active_by_role(pool, role)
                    .await?
                    .into_iter()
                    .map(|user| user.email),
            );
        }
        Ok(recipients)
    }
}
