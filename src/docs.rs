use crate::api::leave_request::{DecisionForm, LeaveForm};
use crate::model::{
    attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus},
    department::Department,
    employee::{Employee, EmployeePatch, NewEmployee},
    leave_request::{LeaveRequest, LeaveStatus, LeaveType},
    payroll::PayrollSummary,
    role::Role,
};
use crate::models::{LoginReqDto, LoginResponse, RegisterReq, TokenPair};
use crate::views::admin::{AdminDashboard, AttendanceLine, LeaveLine, PayrollLine, PayrollView};
use crate::views::employee::{AttendanceView, EmployeeDashboard, SalaryView};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Portal API",
        version = "1.0.0",
        description = r#"
## HR Portal

Backend of a small-company HR portal with two roles.

### 🔹 Admin
- Dashboard totals, employee directory, daily attendance sheet
- Leave approval / rejection
- Payroll overview

### 🔹 Employee
- Check-in / check-out
- Leave requests
- Own attendance history and salary

### 🔐 Security
API endpoints take a **JWT Bearer** access token. Page endpoints under
`/admin` and `/employee` also accept the `access_token` cookie and answer
a wrong or missing session with a **303** redirect instead of an error.

### 📦 Errors
Every error is `{"error": "<message>"}` with the matching status code.
"#,
    ),
    paths(
        crate::auth::handlers::sign_in_page,
        crate::auth::handlers::login,
        crate::auth::handlers::register,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::me,

        crate::api::employee::create_employee,
        crate::api::employee::get_employee,
        crate::api::employee::update_employee,
        crate::api::department::list_departments,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::mark_attendance,

        crate::api::leave_request::create_leave,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,

        crate::views::index,
        crate::views::admin::dashboard,
        crate::views::admin::employees,
        crate::views::admin::attendance,
        crate::views::admin::leaves,
        crate::views::admin::payroll,
        crate::views::employee::dashboard,
        crate::views::employee::attendance,
        crate::views::employee::leaves,
        crate::views::employee::salary
    ),
    components(
        schemas(
            Role,
            RegisterReq,
            LoginReqDto,
            LoginResponse,
            TokenPair,
            Department,
            Employee,
            NewEmployee,
            EmployeePatch,
            AttendanceStatus,
            AttendanceRecord,
            AttendanceEntry,
            LeaveType,
            LeaveStatus,
            LeaveRequest,
            LeaveForm,
            DecisionForm,
            PayrollSummary,
            AdminDashboard,
            AttendanceLine,
            LeaveLine,
            PayrollLine,
            PayrollView,
            EmployeeDashboard,
            AttendanceView,
            SalaryView
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Sign-in, registration and token rotation"),
        (name = "Employee", description = "Employee management APIs"),
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Views", description = "Role-guarded page data"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
