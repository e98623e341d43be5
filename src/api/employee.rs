use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::employee::{EmployeePatch, NewEmployee},
    store::HrStore,
};
use actix_web::{HttpResponse, web};
use tracing::{debug, info};

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = NewEmployee,
    responses(
        (status = 201, description = "Employee created successfully", body = Employee),
        (status = 400, description = "Missing or invalid fields", body = Object, example = json!({
            "error": "employee_code, full_name, email and position are required"
        })),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Department not found"),
        (status = 409, description = "Employee code or email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    payload: web::Json<NewEmployee>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let mut new = payload.into_inner();
    if let Some(msg) = new.validation_error() {
        return Err(AppError::bad_request(msg));
    }
    new.email = new.email.trim().to_lowercase();

    let employee = store.create_employee(new).await?;
    info!(
        employee_id = employee.id,
        code = %employee.employee_code,
        "Employee created"
    );

    Ok(HttpResponse::Created().json(employee))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();
    match store.get_employee(employee_id).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(AppError::not_found("Employee not found")),
    }
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{employee_id}",
    params(
        ("employee_id", Path, description = "Employee ID")
    ),
    request_body = EmployeePatch,
    responses(
        (status = 200, description = "Employee updated successfully", body = Employee),
        (status = 400, description = "Nothing to update or invalid field"),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        })),
        (status = 409, description = "Employee code or email already exists")
    ),
    tag = "Employee",
    security(
        ("bearer_auth" = [])
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
    body: web::Json<EmployeePatch>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let employee_id = path.into_inner();
    let mut patch = body.into_inner();

    if patch.is_empty() {
        return Err(AppError::bad_request("No valid fields provided for update"));
    }
    if let Some(msg) = patch.validation_error() {
        return Err(AppError::bad_request(msg));
    }
    patch.email = patch.email.map(|e| e.trim().to_lowercase());

    debug!(employee_id, ?patch, "Updating employee");
    match store.update_employee(employee_id, patch).await? {
        Some(employee) => Ok(HttpResponse::Ok().json(employee)),
        None => Err(AppError::not_found("Employee not found")),
    }
}
