use crate::{auth::auth::AuthUser, error::AppError, store::HrStore};
use actix_web::{HttpResponse, web};

/// List departments
#[utoipa::path(
    get,
    path = "/api/departments",
    responses(
        (status = 200, description = "All departments", body = [Department]),
        (status = 401, description = "Unauthorized")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn list_departments(
    _auth: AuthUser,
    store: web::Data<dyn HrStore>,
) -> Result<HttpResponse, AppError> {
    let departments = store.list_departments().await?;
    Ok(HttpResponse::Ok().json(departments))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{bearer, demo_store, employee_token, request, test_app};
    use actix_web::test;
    use serde_json::Value;

    #[actix_web::test]
    async fn any_signed_in_role_lists_departments() {
        let app = test_app!(demo_store());

        let req = request()
            .uri("/api/departments")
            .insert_header(bearer(&employee_token()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body.as_array().map(Vec::len), Some(4));
    }
}
