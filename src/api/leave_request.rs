use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::leave_request::{LeaveDecision, LeaveStatus, LeaveType, NewLeaveRequest},
    store::HrStore,
};
use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use tracing::info;
use utoipa::ToSchema;

/// Leave submission as typed into the form. Every field arrives as text
/// and is checked before anything is stored.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct LeaveForm {
    #[schema(example = "vacation")]
    pub leave_type: Option<String>,
    #[schema(example = "2026-12-20", format = "date")]
    pub start_date: Option<String>,
    #[schema(example = "2026-12-27", format = "date")]
    pub end_date: Option<String>,
    #[schema(example = "Family vacation for the holidays")]
    pub reason: Option<String>,
}

fn filled(field: &Option<String>) -> Option<&str> {
    field.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn parse_date(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| AppError::bad_request(format!("{} must be a date (YYYY-MM-DD)", field)))
}

impl LeaveForm {
    pub fn validate(&self, employee_id: u64) -> Result<NewLeaveRequest, AppError> {
        let (Some(leave_type), Some(start), Some(end), Some(reason)) = (
            filled(&self.leave_type),
            filled(&self.start_date),
            filled(&self.end_date),
            filled(&self.reason),
        ) else {
            return Err(AppError::bad_request("Please fill all fields"));
        };

        let leave_type: LeaveType = leave_type.to_lowercase().parse().map_err(|_| {
            AppError::bad_request("Invalid leave type. Allowed: sick, vacation, personal, emergency")
        })?;

        let start_date = parse_date(start, "start_date")?;
        let end_date = parse_date(end, "end_date")?;
        if start_date > end_date {
            return Err(AppError::bad_request("start_date cannot be after end_date"));
        }

        Ok(NewLeaveRequest {
            employee_id,
            leave_type,
            start_date,
            end_date,
            reason: reason.to_string(),
        })
    }
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct DecisionForm {
    #[schema(example = "Enjoy your break", nullable = true)]
    pub admin_notes: Option<String>,
}

impl DecisionForm {
    /// An empty body carries no notes. Anything else must be a valid form.
    pub fn from_body(body: &[u8]) -> Result<Self, AppError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body)
            .map_err(|e| AppError::bad_request(format!("Invalid request body: {}", e)))
    }

    fn notes(self) -> Option<String> {
        self.admin_notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
    }
}

/* =========================
Create leave request
========================= */
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = LeaveForm,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Leave request submitted", body = LeaveRequest),
        (status = 400, description = "Missing field, unknown type, bad date or reversed range", body = Object, example = json!({
            "error": "Please fill all fields"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    payload: web::Json<LeaveForm>,
) -> Result<HttpResponse, AppError> {
    auth.require_employee()?;
    let employee_id = auth.employee_profile()?;

    let new = payload.validate(employee_id)?;
    let leave = store.create_leave_request(new).await?;

    info!(leave_id = leave.id, employee_id, "Leave request submitted");
    Ok(HttpResponse::Created().json(leave))
}

async fn decide(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    leave_id: u64,
    decision: LeaveDecision,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    auth.require_admin()?;
    let admin_notes = DecisionForm::from_body(&body)?.notes();

    let processed = || AppError::conflict("Leave request already processed");

    let leave = store
        .get_leave_request(leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    let target = leave.status.decide(decision).map_err(|e| {
        info!(leave_id, reason = %e, "Leave decision refused");
        processed()
    })?;

    // another admin may have decided in between
    if !store
        .decide_leave_request(leave_id, LeaveStatus::Pending, target, admin_notes)
        .await?
    {
        return Err(processed());
    }

    info!(leave_id, status = %target, admin_id = auth.user_id, "Leave decided");
    Ok(HttpResponse::Ok().json(json!({
        "message": format!("Leave {}", target),
        "status": target
    })))
}

/* =========================
Approve leave (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    request_body(content = DecisionForm, description = "Optional note for the employee"),
    responses(
        (status = 200, description = "Leave approved", body = Object, example = json!({
            "message": "Leave approved",
            "status": "approved"
        })),
        (status = 400, description = "Malformed notes body"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed", body = Object, example = json!({
            "error": "Leave request already processed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    decide(auth, store, path.into_inner(), LeaveDecision::Approve, body).await
}

/* =========================
Reject leave (Admin)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    request_body(content = DecisionForm, description = "Optional note for the employee"),
    responses(
        (status = 200, description = "Leave rejected", body = Object, example = json!({
            "message": "Leave rejected",
            "status": "rejected"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request already processed"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    decide(auth, store, path.into_inner(), LeaveDecision::Reject, body).await
}

/* =========================
Get leave by ID
========================= */
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "Leave request ID")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "error": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let leave_id = path.into_inner();

    let leave = store
        .get_leave_request(leave_id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    // Employees only see their own requests
    if auth.is_employee() && auth.employee_id != Some(leave.employee_id) {
        return Err(AppError::forbidden("Not your leave request"));
    }

    Ok(HttpResponse::Ok().json(leave))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::leave_request::LeaveQuery;
    use crate::test_support::{
        admin_token, bearer, demo_store, employee_token, request, test_app,
    };
    use actix_web::{http::Method, http::StatusCode, test};
    use serde_json::Value;

    fn form(leave_type: &str, start: &str, end: &str, reason: &str) -> LeaveForm {
        LeaveForm {
            leave_type: Some(leave_type.into()),
            start_date: Some(start.into()),
            end_date: Some(end.into()),
            reason: Some(reason.into()),
        }
    }

    fn message(err: AppError) -> String {
        err.to_string()
    }

    #[actix_web::test]
    async fn any_blank_field_fails_validation() {
        let complete = form("sick", "2026-03-02", "2026-03-03", "Flu");
        assert!(complete.validate(1).is_ok());

        let blanks = [
            LeaveForm { leave_type: None, ..form("sick", "2026-03-02", "2026-03-03", "Flu") },
            LeaveForm { start_date: Some("  ".into()), ..form("sick", "2026-03-02", "2026-03-03", "Flu") },
            LeaveForm { end_date: None, ..form("sick", "2026-03-02", "2026-03-03", "Flu") },
            LeaveForm { reason: Some(String::new()), ..form("sick", "2026-03-02", "2026-03-03", "Flu") },
            LeaveForm::default(),
        ];
        for blank in blanks {
            assert_eq!(message(blank.validate(1).unwrap_err()), "Please fill all fields");
        }
    }

    #[actix_web::test]
    async fn type_dates_and_range_are_checked() {
        assert!(form("holiday", "2026-03-02", "2026-03-03", "x").validate(1).is_err());
        assert!(form("sick", "03/02/2026", "2026-03-03", "x").validate(1).is_err());
        assert!(form("sick", "2026-03-04", "2026-03-03", "x").validate(1).is_err());

        let new = form("Vacation", "2026-03-02", "2026-03-02", " Trip ").validate(4).unwrap();
        assert_eq!(new.leave_type, LeaveType::Vacation);
        assert_eq!(new.employee_id, 4);
        assert_eq!(new.reason, "Trip");
    }

    #[actix_web::test]
    async fn invalid_submission_stores_nothing() {
        let store = demo_store();
        let app = test_app!(store.clone());
        let before = store.list_leave_requests(LeaveQuery::default()).await.unwrap().len();

        let req = request()
            .method(Method::POST)
            .uri("/api/leave")
            .insert_header(bearer(&employee_token()))
            .set_json(json!({ "leave_type": "sick", "start_date": "2026-03-02", "end_date": "2026-03-03" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"], "Please fill all fields");

        let after = store.list_leave_requests(LeaveQuery::default()).await.unwrap().len();
        assert_eq!(before, after);
    }

    #[actix_web::test]
    async fn submitted_leave_starts_pending() {
        let app = test_app!(demo_store());

        let req = request()
            .method(Method::POST)
            .uri("/api/leave")
            .insert_header(bearer(&employee_token()))
            .set_json(json!({
                "leave_type": "personal",
                "start_date": "2026-03-02",
                "end_date": "2026-03-03",
                "reason": "Moving house"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "pending");
        assert_eq!(body["employee_id"], 1);
    }

    #[actix_web::test]
    async fn approved_leave_is_never_decided_again() {
        let store = demo_store();
        let app = test_app!(store.clone());

        let pending = store
            .list_leave_requests(LeaveQuery {
                status: Some(LeaveStatus::Pending),
                ..Default::default()
            })
            .await
            .unwrap();
        let id = pending[0].id;

        let req = request()
            .method(Method::PUT)
            .uri(&format!("/api/leave/{}/approve", id))
            .insert_header(bearer(&admin_token()))
            .set_json(json!({ "admin_notes": "Enjoy" }))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "approved");

        for action in ["approve", "reject"] {
            let req = request()
                .method(Method::PUT)
                .uri(&format!("/api/leave/{}/{}", id, action))
                .insert_header(bearer(&admin_token()))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CONFLICT);
        }

        let leave = store.get_leave_request(id).await.unwrap().unwrap();
        assert_eq!(leave.status, LeaveStatus::Approved);
        assert_eq!(leave.admin_notes.as_deref(), Some("Enjoy"));
    }

    #[actix_web::test]
    async fn malformed_notes_block_the_decision() {
        let store = demo_store();
        let app = test_app!(store.clone());

        let req = request()
            .method(Method::PUT)
            .uri("/api/leave/3/reject")
            .insert_header(bearer(&admin_token()))
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{\"admin_notes\": ")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().is_some_and(|e| e.starts_with("Invalid request body")));

        let leave = store.get_leave_request(3).await.unwrap().unwrap();
        assert_eq!(leave.status, LeaveStatus::Pending);

        // no body at all is fine
        let req = request()
            .method(Method::PUT)
            .uri("/api/leave/3/reject")
            .insert_header(bearer(&admin_token()))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "rejected");
        let leave = store.get_leave_request(3).await.unwrap().unwrap();
        assert_eq!(leave.admin_notes, None);
    }

    #[actix_web::test]
    async fn unknown_leave_is_404_and_employees_cannot_decide() {
        let app = test_app!(demo_store());

        let req = request()
            .method(Method::PUT)
            .uri("/api/leave/999/reject")
            .insert_header(bearer(&admin_token()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = request()
            .method(Method::PUT)
            .uri("/api/leave/1/approve")
            .insert_header(bearer(&employee_token()))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[actix_web::test]
    async fn employees_only_read_their_own_requests() {
        let store = demo_store();
        let app = test_app!(store.clone());

        let all = store.list_leave_requests(LeaveQuery::default()).await.unwrap();
        let own = all.iter().find(|l| l.employee_id == 1).unwrap().id;
        let other = all.iter().find(|l| l.employee_id != 1).unwrap().id;

        let get = |id: u64| {
            request()
                .uri(&format!("/api/leave/{}", id))
                .insert_header(bearer(&employee_token()))
                .to_request()
        };
        assert_eq!(test::call_service(&app, get(own)).await.status(), StatusCode::OK);
        assert_eq!(test::call_service(&app, get(other)).await.status(), StatusCode::FORBIDDEN);
    }
}
