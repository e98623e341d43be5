//! Role-gated page routing.
//!
//! Every navigation to a page under `/admin` or `/employee` is a pure
//! function of (identity, role, requested route): either the page is served
//! or the caller is sent somewhere else with a 303.

use crate::auth::auth::{authenticate, token_from_request};
use crate::config::Config;
use crate::model::role::Role;
use actix_web::middleware::Next;
use actix_web::{
    Error, HttpMessage, HttpRequest, HttpResponse,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    http::header,
    web::Data,
};

pub const SIGN_IN_ROUTE: &str = "/auth";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Granted,
    Redirect(&'static str),
}

fn under(path: &str, prefix: &str) -> bool {
    path == prefix
        || path
            .strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with('/'))
}

/// Role a page route requires, `None` for unguarded routes.
pub fn required_role(path: &str) -> Option<Role> {
    [Role::Admin, Role::Employee]
        .into_iter()
        .find(|role| under(path, role.home()))
}

pub fn check_access(session: Option<Role>, required: Option<Role>) -> Access {
    match (session, required) {
        (None, _) => Access::Redirect(SIGN_IN_ROUTE),
        (Some(role), Some(needed)) if role != needed => Access::Redirect(role.home()),
        (Some(_), _) => Access::Granted,
    }
}

/// Where `/` sends a visitor.
pub fn landing(session: Option<Role>) -> &'static str {
    session.map_or(SIGN_IN_ROUTE, Role::home)
}

pub fn redirect(target: &str) -> HttpResponse {
    HttpResponse::SeeOther()
        .insert_header((header::LOCATION, target))
        .finish()
}

/// Role of the caller, or `None` when the token is missing, invalid or
/// expired.
pub fn session_role(req: &HttpRequest) -> Option<Role> {
    let config = req.app_data::<Data<Config>>()?;
    let token = token_from_request(req)?;
    authenticate(&token, &config.jwt_secret).ok().map(|u| u.role)
}

/// Middleware for the page scopes.
pub async fn portal_guard(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let user = match (req.app_data::<Data<Config>>(), token_from_request(req.request())) {
        (Some(config), Some(token)) => authenticate(&token, &config.jwt_secret).ok(),
        _ => None,
    };

    let required = required_role(req.path());
    match check_access(user.as_ref().map(|u| u.role), required) {
        Access::Granted => {
            if let Some(user) = user {
                req.extensions_mut().insert(user);
            }
            next.call(req).await
        }
        Access::Redirect(target) => {
            tracing::debug!(path = req.path(), target, "Redirecting page request");
            Ok(req.into_response(redirect(target)))
        }
    }
}
