use actix_web::{dev::Payload, web, FromRequest, HttpRequest};
use ipnetwork::IpNetwork;
use std::future::{ready, Ready};

use crate::config::{Config, SecurityConfig};
use crate::error::{AppError, AppResult};
use crate::models::Role;

/// Request-scoped caller identity, resolved from a Bearer token.
///
/// Usage in handlers:
/// ```ignore
/// async fn my_handler(principal: Principal) -> AppResult<HttpResponse> {
///     principal.require_admin()?;
///     // ...
/// }
/// ```
#[derive(Debug, Clone)]
pub struct Principal {
    pub role: Role,
    pub ip_address: Option<IpNetwork>,
}

impl Principal {
    /// Fails with 403 unless the caller is an admin
    pub fn require_admin(&self) -> AppResult<()> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::Forbidden("Admin role required".to_string()))
        }
    }

    /// Name recorded as the actor in audit entries and alert transitions
    pub fn actor(&self) -> String {
        self.role.to_string()
    }
}

/// Maps a presented token to the role it was configured for
pub fn resolve_role(security: &SecurityConfig, token: &str) -> Option<Role> {
    if security.admin_token.as_deref() == Some(token) {
        Some(Role::Admin)
    } else if security.security_token.as_deref() == Some(token) {
        Some(Role::Security)
    } else {
        None
    }
}

fn authenticate(req: &HttpRequest) -> AppResult<Principal> {
    let config = req
        .app_data::<web::Data<Config>>()
        .ok_or_else(|| AppError::Internal("Configuration not available".to_string()))?;

    let header = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".to_string()))?;

    let token = header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            AppError::Unauthorized(
                "Invalid Authorization header format, expected 'Bearer <token>'".to_string(),
            )
        })?;

    let role = resolve_role(&config.security, token)
        .ok_or_else(|| AppError::Unauthorized("Invalid Bearer token".to_string()))?;

    Ok(Principal {
        role,
        ip_address: req.peer_addr().map(|addr| IpNetwork::from(addr.ip())),
    })
}

impl FromRequest for Principal {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(authenticate(req))
    }
}
