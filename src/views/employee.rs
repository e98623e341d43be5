use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::{
        attendance::AttendanceRecord,
        employee::Employee,
        leave_request::{LeaveQuery, LeaveStatus},
        payroll::annual_salary,
    },
    store::HrStore,
    views::admin::LeaveLine,
};

pub const DEFAULT_HISTORY: u32 = 10;
pub const MAX_HISTORY: u32 = 90;

/// Employee record linked to the signed-in account.
async fn own_profile(auth: &AuthUser, store: &dyn HrStore) -> Result<Employee, AppError> {
    let employee_id = auth.employee_profile()?;
    store
        .get_employee(employee_id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee profile not found"))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeDashboard {
    pub profile: Employee,
    #[schema(example = 7)]
    pub present_days_this_month: usize,
    #[schema(example = 1)]
    pub pending_leaves: usize,
    /// Approved requests starting this year
    #[schema(example = 0)]
    pub approved_leaves: usize,
    #[schema(example = 75000.0)]
    pub monthly_salary: f64,
}

/// Employee dashboard
#[utoipa::path(
    get,
    path = "/employee",
    responses(
        (status = 200, description = "Profile and counters", body = EmployeeDashboard),
        (status = 303, description = "Not an employee session"),
        (status = 403, description = "No employee profile linked to the account")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn dashboard(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let profile = own_profile(&auth, store.get_ref()).await?;

    let today = config.clock.today();
    let month_start = today.with_day(1).unwrap_or(today);
    let present_days_this_month = store
        .attendance_between(profile.id, month_start, today)
        .await?
        .iter()
        .filter(|r| r.status.counts_as_present())
        .count();

    let leaves = store
        .list_leave_requests(LeaveQuery {
            employee_id: Some(profile.id),
            ..Default::default()
        })
        .await?;
    let pending_leaves = leaves
        .iter()
        .filter(|l| l.status == LeaveStatus::Pending)
        .count();
    let approved_leaves = leaves
        .iter()
        .filter(|l| l.status == LeaveStatus::Approved && l.start_date.year() == today.year())
        .count();

    Ok(HttpResponse::Ok().json(EmployeeDashboard {
        monthly_salary: profile.salary,
        profile,
        present_days_this_month,
        pending_leaves,
        approved_leaves,
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct HistoryLimit {
    /// Number of records, 10 by default, at most 90
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceView {
    /// Today's record, if any
    pub today: Option<AttendanceRecord>,
    pub checked_in: bool,
    pub checked_out: bool,
    /// Newest first
    pub history: Vec<AttendanceRecord>,
}

/// Own attendance
#[utoipa::path(
    get,
    path = "/employee/attendance",
    params(HistoryLimit),
    responses(
        (status = 200, description = "Today's state and recent history", body = AttendanceView),
        (status = 403, description = "No employee profile linked to the account")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn attendance(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
    query: web::Query<HistoryLimit>,
) -> Result<HttpResponse, AppError> {
    let employee_id = auth.employee_profile()?;
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY).clamp(1, MAX_HISTORY);

    let today = store
        .attendance_for_day(employee_id, config.clock.today())
        .await?;
    let history = store.recent_attendance(employee_id, limit).await?;

    Ok(HttpResponse::Ok().json(AttendanceView {
        checked_in: today.as_ref().is_some_and(|r| r.check_in.is_some()),
        checked_out: today.as_ref().is_some_and(|r| r.check_out.is_some()),
        today,
        history,
    }))
}

/// Own leave requests, newest first
#[utoipa::path(
    get,
    path = "/employee/leaves",
    responses(
        (status = 200, description = "Own leave requests", body = [LeaveLine]),
        (status = 403, description = "No employee profile linked to the account")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn leaves(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
) -> Result<HttpResponse, AppError> {
    let profile = own_profile(&auth, store.get_ref()).await?;

    let lines: Vec<LeaveLine> = store
        .list_leave_requests(LeaveQuery {
            employee_id: Some(profile.id),
            ..Default::default()
        })
        .await?
        .into_iter()
        .map(|l| LeaveLine::new(l, profile.full_name.clone()))
        .collect();

    Ok(HttpResponse::Ok().json(lines))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SalaryView {
    #[schema(example = 75000.0)]
    pub monthly_salary: f64,
    #[schema(example = 900000.0)]
    pub annual_salary: f64,
    #[schema(example = "Software Engineer")]
    pub position: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = "2023-01-15", value_type = String, format = "date")]
    pub date_of_joining: NaiveDate,
}

/// Own salary
#[utoipa::path(
    get,
    path = "/employee/salary",
    responses(
        (status = 200, description = "Salary details", body = SalaryView),
        (status = 403, description = "No employee profile linked to the account")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn salary(
    auth: AuthUser,
    store: web::Data<dyn HrStore>,
) -> Result<HttpResponse, AppError> {
    let profile = own_profile(&auth, store.get_ref()).await?;

    let department = match profile.department_id {
        Some(id) => store
            .list_departments()
            .await?
            .into_iter()
            .find(|d| d.id == id)
            .map(|d| d.name),
        None => None,
    };

    Ok(HttpResponse::Ok().json(SalaryView {
        monthly_salary: profile.salary,
        annual_salary: annual_salary(profile.salary),
        position: profile.position,
        department,
        date_of_joining: profile.date_of_joining,
    }))
}
