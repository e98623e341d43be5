use std::collections::HashMap;

use actix_web::{HttpResponse, web};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    config::Config,
    error::AppError,
    model::{
        attendance::{AttendanceRecord, AttendanceStatus},
        employee::Employee,
        leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, LeaveType},
        payroll::PayrollSummary,
    },
    store::HrStore,
};

#[derive(Debug, Serialize, ToSchema)]
pub struct AdminDashboard {
    #[schema(example = 5)]
    pub total_employees: usize,
    #[schema(example = 2)]
    pub present_today: usize,
    #[schema(example = 2)]
    pub pending_leaves: usize,
    #[schema(example = 350000.0)]
    pub monthly_payroll: f64,
}

/// Admin dashboard totals
#[utoipa::path(
    get,
    path = "/admin",
    responses(
        (status = 200, description = "Dashboard totals", body = AdminDashboard),
        (status = 303, description = "Not an admin session")
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn dashboard(
    _auth: AuthUser,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
) -> Result<HttpResponse, AppError> {
    let employees = store.list_employees().await?;
    let present_today = store
        .attendance_on(config.clock.today())
        .await?
        .iter()
        .filter(|r| r.status.counts_as_present())
        .count();
    let pending_leaves = store
        .list_leave_requests(LeaveQuery {
            status: Some(LeaveStatus::Pending),
            ..Default::default()
        })
        .await?
        .len();

    let payroll = PayrollSummary::from_salaries(employees.iter().map(|e| e.salary));

    Ok(HttpResponse::Ok().json(AdminDashboard {
        total_employees: employees.len(),
        present_today,
        pending_leaves,
        monthly_payroll: payroll.total_payroll,
    }))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmployeeSearch {
    /// Matches full name, employee code or position
    pub search: Option<String>,
}

/// Employee directory
#[utoipa::path(
    get,
    path = "/admin/employees",
    params(EmployeeSearch),
    responses(
        (status = 200, description = "Matching employees", body = [Employee])
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn employees(
    _auth: AuthUser,
    store: web::Data<dyn HrStore>,
    query: web::Query<EmployeeSearch>,
) -> Result<HttpResponse, AppError> {
    let term = query.search.as_deref().unwrap_or_default();
    let employees: Vec<Employee> = store
        .list_employees()
        .await?
        .into_iter()
        .filter(|e| e.matches_search(term))
        .collect();

    debug!(term, count = employees.len(), "Employee search");
    Ok(HttpResponse::Ok().json(employees))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AttendanceDay {
    /// Day to show, defaults to today
    #[param(value_type = Option<String>, example = "2026-01-05")]
    pub date: Option<NaiveDate>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct AttendanceLine {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = 3)]
    pub employee_id: u64,
    #[schema(example = "Michael Brown")]
    pub employee_name: String,
    #[schema(example = "EMP003")]
    pub employee_code: String,
    #[schema(example = "Product Manager")]
    pub position: String,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    #[schema(value_type = Option<String>)]
    pub check_in: Option<chrono::NaiveTime>,
    #[schema(value_type = Option<String>)]
    pub check_out: Option<chrono::NaiveTime>,
    pub status: AttendanceStatus,
    pub notes: Option<String>,
}

impl AttendanceLine {
    fn new(record: AttendanceRecord, employee: Option<&Employee>) -> Self {
        let (employee_name, employee_code, position) = match employee {
            Some(e) => (e.full_name.clone(), e.employee_code.clone(), e.position.clone()),
            None => Default::default(),
        };
        Self {
            id: record.id,
            employee_id: record.employee_id,
            employee_name,
            employee_code,
            position,
            date: record.date,
            check_in: record.check_in,
            check_out: record.check_out,
            status: record.status,
            notes: record.notes,
        }
    }
}

fn by_id(employees: Vec<Employee>) -> HashMap<u64, Employee> {
    employees.into_iter().map(|e| (e.id, e)).collect()
}

/// Attendance sheet for one day
#[utoipa::path(
    get,
    path = "/admin/attendance",
    params(AttendanceDay),
    responses(
        (status = 200, description = "Records for the day with employee details", body = [AttendanceLine])
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn attendance(
    _auth: AuthUser,
    store: web::Data<dyn HrStore>,
    config: web::Data<Config>,
    query: web::Query<AttendanceDay>,
) -> Result<HttpResponse, AppError> {
    let date = query.date.unwrap_or_else(|| config.clock.today());
    let employees = by_id(store.list_employees().await?);

    let lines: Vec<AttendanceLine> = store
        .attendance_on(date)
        .await?
        .into_iter()
        .map(|r| {
            let employee = employees.get(&r.employee_id);
            AttendanceLine::new(r, employee)
        })
        .collect();

    Ok(HttpResponse::Ok().json(lines))
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct LeaveFilter {
    /// pending, approved or rejected
    #[param(value_type = Option<String>, example = "pending")]
    pub status: Option<LeaveStatus>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LeaveLine {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "John Smith")]
    pub employee_name: String,
    pub leave_type: LeaveType,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    /// Inclusive day count
    #[schema(example = 8)]
    pub days: i64,
    pub reason: String,
    pub status: LeaveStatus,
    pub admin_notes: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl LeaveLine {
    pub(crate) fn new(leave: LeaveRequest, employee_name: String) -> Self {
        Self {
            days: leave.days(),
            id: leave.id,
            employee_id: leave.employee_id,
            employee_name,
            leave_type: leave.leave_type,
            start_date: leave.start_date,
            end_date: leave.end_date,
            reason: leave.reason,
            status: leave.status,
            admin_notes: leave.admin_notes,
            created_at: leave.created_at,
        }
    }
}

/// Leave requests, newest first
#[utoipa::path(
    get,
    path = "/admin/leaves",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Leave requests with employee names", body = [LeaveLine])
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn leaves(
    _auth: AuthUser,
    store: web::Data<dyn HrStore>,
    query: web::Query<LeaveFilter>,
) -> Result<HttpResponse, AppError> {
    let employees = by_id(store.list_employees().await?);

    let lines: Vec<LeaveLine> = store
        .list_leave_requests(LeaveQuery {
            status: query.status,
            ..Default::default()
        })
        .await?
        .into_iter()
        .map(|l| {
            let name = employees
                .get(&l.employee_id)
                .map(|e| e.full_name.clone())
                .unwrap_or_default();
            LeaveLine::new(l, name)
        })
        .collect();

    Ok(HttpResponse::Ok().json(lines))
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayrollLine {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[schema(example = "John Smith")]
    pub full_name: String,
    #[schema(example = "Software Engineer")]
    pub position: String,
    #[schema(example = "Engineering", nullable = true)]
    pub department: Option<String>,
    #[schema(example = 75000.0)]
    pub salary: f64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PayrollView {
    #[serde(flatten)]
    pub summary: PayrollSummary,
    pub lines: Vec<PayrollLine>,
}

/// Payroll overview
#[utoipa::path(
    get,
    path = "/admin/payroll",
    responses(
        (status = 200, description = "Totals and one line per employee", body = PayrollView)
    ),
    security(("bearer_auth" = [])),
    tag = "Views"
)]
pub async fn payroll(
    _auth: AuthUser,
    store: web::Data<dyn HrStore>,
) -> Result<HttpResponse, AppError> {
    let departments: HashMap<u64, String> = store
        .list_departments()
        .await?
        .into_iter()
        .map(|d| (d.id, d.name))
        .collect();
    let employees = store.list_employees().await?;

    let summary = PayrollSummary::from_salaries(employees.iter().map(|e| e.salary));
    let lines = employees
        .into_iter()
        .map(|e| PayrollLine {
            department: e.department_id.and_then(|id| departments.get(&id).cloned()),
            employee_id: e.id,
            full_name: e.full_name,
            position: e.position,
            salary: e.salary,
        })
        .collect();

    Ok(HttpResponse::Ok().json(PayrollView { summary, lines }))
}
