use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::attendance::{AttendanceEntry, AttendanceStatus},
    store::{HrStore, StoreError},
};
use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::info;

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    responses(
        (status = 201, description = "Checked in successfully", body = AttendanceRecord),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "error": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    auth.require_employee()?;
    let employee_id = auth.employee_profile()?;

    let now = config.clock.now();
    let status = AttendanceStatus::on_check_in(now.time(), config.late_after);

    let record = match store.check_in(employee_id, now.date(), now.time(), status).await {
        Ok(record) => record,
        // one record per employee and day
        Err(StoreError::Conflict(_)) => {
            return Err(AppError::bad_request("Already checked in today"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(employee_id, status = %record.status, "Checked in");
    Ok(HttpResponse::Created().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out successfully", body = Object, example = json!({
            "message": "Checked out successfully",
            "status": "present"
        })),
        (status = 400, description = "No active check-in found for today", body = Object, example = json!({
            "error": "No active check-in found for today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    auth.require_employee()?;
    let employee_id = auth.employee_profile()?;

    let no_active = || AppError::bad_request("No active check-in found for today");

    let now = config.clock.now();
    let record = store
        .attendance_for_day(employee_id, now.date())
        .await?
        .filter(|r| r.check_out.is_none())
        .ok_or_else(no_active)?;
    let checked_in = record.check_in.ok_or_else(no_active)?;

    let status = record
        .status
        .on_check_out(checked_in, now.time(), config.half_day());

    if !store.record_check_out(record.id, now.time(), status).await? {
        return Err(no_active());
    }

    info!(employee_id, %status, "Checked out");
    Ok(HttpResponse::Ok().json(json!({
        "message": "Checked out successfully",
        "status": status
    })))
}

/// Mark attendance (admin)
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = AttendanceEntry,
    responses(
        (status = 200, description = "Attendance recorded", body = AttendanceRecord),
        (status = 400, description = "Check-out before check-in"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "Employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn mark_attendance(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    payload: web::Json<AttendanceEntry>,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;

    let entry = payload.into_inner();
    if let (Some(start), Some(end)) = (entry.check_in, entry.check_out) {
        if end < start {
            return Err(AppError::bad_request("check_out cannot be before check_in"));
        }
    }

    let record = store.upsert_attendance(entry).await?;
    info!(
        employee_id = record.employee_id,
        date = %record.date,
        status = %record.status,
        "Attendance marked"
    );
    Ok(HttpResponse::Ok().json(record))
}

#[cfg(test)]
mod tests {
    use crate::test_support::{
        admin_token, bearer, demo_store, employee_token, request, test_app, test_now,
        unlinked_employee_token,
    };
    use actix_web::{http::Method, http::StatusCode, test};
    use serde_json::{Value, json};

    #[actix_web::test]
    async fn second_check_in_is_rejected() {
        let app = test_app!(demo_store());

        let check_in = || {
            request()
                .method(Method::POST)
                .uri("/api/attendance/check-in")
                .insert_header(bearer(&employee_token()))
                .to_request()
        };

        let resp = test::call_service(&app, check_in()).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let record: Value = test::read_body_json(resp).await;
        assert_eq!(record["date"], test_now().date().to_string());
        assert_eq!(record["check_in"], "09:00:00");
        assert_eq!(record["status"], "present");

        let resp = test::call_service(&app, check_in()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Already checked in today");
    }

    #[actix_web::test]
    async fn short_day_checks_out_as_half_day_once() {
        let app = test_app!(demo_store());

        let check_out = || {
            request()
                .method(Method::POST)
                .uri("/api/attendance/check-out")
                .insert_header(bearer(&employee_token()))
                .to_request()
        };

        // nothing to close yet
        let resp = test::call_service(&app, check_out()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = request()
            .method(Method::POST)
            .uri("/api/attendance/check-in")
            .insert_header(bearer(&employee_token()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::CREATED);

        // checked out at the same instant, well under the half-day span
        let body: Value = test::call_and_read_body_json(&app, check_out()).await;
        assert_eq!(body["status"], "half_day");

        let resp = test::call_service(&app, check_out()).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn self_service_needs_an_employee_profile() {
        let app = test_app!(demo_store());

        let req = request()
            .method(Method::POST)
            .uri("/api/attendance/check-in")
            .insert_header(bearer(&unlinked_employee_token()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn admin_marks_and_overwrites_attendance() {
        let app = test_app!(demo_store());

        let mark = |status: &str| {
            request()
                .method(Method::POST)
                .uri("/api/attendance")
                .insert_header(bearer(&admin_token()))
                .set_json(json!({
                    "employee_id": 5,
                    "date": "2026-01-05",
                    "check_in": "10:30:00",
                    "status": status,
                    "notes": "Traffic delay"
                }))
                .to_request()
        };

        let first: Value = test::call_and_read_body_json(&app, mark("late")).await;
        let second: Value = test::call_and_read_body_json(&app, mark("present")).await;
        assert_eq!(first["id"], second["id"]);
        assert_eq!(second["status"], "present");

        let req = request()
            .method(Method::POST)
            .uri("/api/attendance")
            .insert_header(bearer(&admin_token()))
            .set_json(json!({ "employee_id": 999, "date": "2026-01-05", "status": "absent" }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);
    }
}
