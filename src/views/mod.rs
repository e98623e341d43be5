//! Page data endpoints. Each page is a single GET behind the portal guard
//! and returns everything the page renders.

use actix_web::{HttpRequest, HttpResponse};

use crate::auth::guard::{landing, redirect, session_role};

pub mod admin;
pub mod employee;

/// `/` sends visitors to their dashboard, or to sign-in.
#[utoipa::path(
    get,
    path = "/",
    responses(
        (status = 303, description = "Redirect to /admin, /employee or /auth")
    ),
    tag = "Views"
)]
pub async fn index(req: HttpRequest) -> HttpResponse {
    redirect(landing(session_role(&req)))
}
