use crate::auth::auth::{authenticate, token_from_request};
use crate::config::Config;
use crate::error::AppError;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, ResponseError,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    web::Data,
};

/// Rejects API calls without a valid access token (401) and stores the
/// resolved `AuthUser` in the request extensions.
pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let secret = match req.app_data::<Data<Config>>() {
        Some(config) => config.jwt_secret.clone(),
        None => {
            tracing::error!("App config missing");
            return Ok(req.into_response(AppError::Internal.error_response()));
        }
    };

    let token = match token_from_request(req.request()) {
        Some(t) => t,
        None => {
            let resp = AppError::unauthorized("Missing Authorization header").error_response();
            return Ok(req.into_response(resp));
        }
    };

    match authenticate(&token, &secret) {
        Ok(auth_user) => {
            req.extensions_mut().insert(auth_user);
            next.call(req).await
        }
        Err(e) => {
            tracing::debug!(error = %e, path = req.path(), "Rejected API request");
            Ok(req.into_response(e.error_response()))
        }
    }
}
