use crate::auth::jwt::verify_token;
use crate::config::Config;
use crate::error::AppError;
use crate::{model::role::Role, models::TokenType};
use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload, web::Data};
use futures::future::{Ready, ready};
use serde::Serialize;

pub const ACCESS_TOKEN_COOKIE: &str = "access_token";

#[derive(Debug, Clone, Serialize)]
pub struct AuthUser {
    pub user_id: u64,
    pub email: String,
    pub role: Role,

    /// Present only if this user is linked to an employee record
    pub employee_id: Option<u64>,
}

/// Bearer token from the `Authorization` header, falling back to the
/// `access_token` cookie.
pub fn token_from_request(req: &HttpRequest) -> Option<String> {
    let bearer = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string);

    bearer.or_else(|| req.cookie(ACCESS_TOKEN_COOKIE).map(|c| c.value().to_string()))
}

/// Validates an access token and resolves the identity it carries.
pub fn authenticate(token: &str, secret: &str) -> Result<AuthUser, AppError> {
    let claims = verify_token(token, secret)
        .map_err(|e| AppError::unauthorized(format!("Invalid or expired token: {}", e)))?;

    if claims.token_type != TokenType::Access {
        return Err(AppError::unauthorized("Access token required"));
    }

    let role = Role::from_id(claims.role).ok_or_else(|| AppError::unauthorized("Invalid role"))?;

    Ok(AuthUser {
        user_id: claims.user_id,
        email: claims.sub,
        role,
        employee_id: claims.employee_id,
    })
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        // Already resolved by the auth middleware or the portal guard
        if let Some(user) = req.extensions().get::<AuthUser>() {
            return ready(Ok(user.clone()));
        }

        let token = match token_from_request(req) {
            Some(t) => t,
            None => return ready(Err(AppError::unauthorized("Missing token"))),
        };

        let config = match req.app_data::<Data<Config>>() {
            Some(c) => c,
            None => {
                tracing::error!("Config missing from app data");
                return ready(Err(AppError::Internal));
            }
        };

        ready(authenticate(&token, &config.jwt_secret))
    }
}

impl AuthUser {
    pub fn require_admin(&self) -> Result<(), AppError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(AppError::forbidden("Admin only"))
        }
    }

    pub fn require_employee(&self) -> Result<(), AppError> {
        if self.role == Role::Employee {
            Ok(())
        } else {
            Err(AppError::forbidden("Employee only"))
        }
    }

    /// Employee record linked to this account.
    pub fn employee_profile(&self) -> Result<u64, AppError> {
        self.employee_id
            .ok_or_else(|| AppError::forbidden("No employee profile"))
    }

    /// Returns true if the user is an employee
    pub fn is_employee(&self) -> bool {
        self.role == Role::Employee
    }
}
