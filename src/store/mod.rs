//! Storage seam. Handlers only talk to [`HrStore`]; the MySQL store backs
//! production and the in-memory store serves the demo data set and tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use derive_more::Display;

use crate::model::{
    attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus},
    department::Department,
    employee::{Employee, EmployeePatch, NewEmployee},
    leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest},
    user::{NewUserAccount, UserAccount},
};

pub mod memory;
pub mod mysql;
mod seed;

pub use memory::MemoryStore;
pub use mysql::MySqlStore;

#[derive(Debug, Display)]
pub enum StoreError {
    #[display(fmt = "{} not found", _0)]
    NotFound(&'static str),
    #[display(fmt = "{}", _0)]
    Conflict(String),
    #[display(fmt = "database error: {}", _0)]
    Database(sqlx::Error),
    #[display(fmt = "corrupt row: {}", _0)]
    Corrupt(String),
    #[display(fmt = "store unavailable: {}", _0)]
    Unavailable(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait HrStore: Send + Sync {
    /* accounts */
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>>;
    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<UserAccount>>;
    async fn email_taken(&self, email: &str) -> StoreResult<bool>;
    async fn create_user(&self, new: NewUserAccount) -> StoreResult<UserAccount>;
    async fn touch_last_sign_in(&self, user_id: u64) -> StoreResult<()>;
    /// Emails of accounts that signed in within the last `days` days.
    async fn recent_sign_in_emails(&self, days: u32) -> StoreResult<Vec<String>>;

    /* refresh tokens */
    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()>;
    /// Revokes an active token. Returns false when it was unknown or already revoked.
    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool>;

    /* departments and employees */
    async fn list_departments(&self) -> StoreResult<Vec<Department>>;
    async fn list_employees(&self) -> StoreResult<Vec<Employee>>;
    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>>;
    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee>;
    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> StoreResult<Option<Employee>>;

    /* attendance */
    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>>;
    async fn attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>>;
    /// Newest first.
    async fn recent_attendance(
        &self,
        employee_id: u64,
        limit: u32,
    ) -> StoreResult<Vec<AttendanceRecord>>;
    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>>;
    /// Fails with `Conflict` when the employee already has a record for `date`.
    async fn check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord>;
    /// Only applies while no check-out is recorded. Returns false otherwise.
    async fn record_check_out(
        &self,
        record_id: u64,
        at: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<bool>;
    async fn upsert_attendance(&self, entry: AttendanceEntry) -> StoreResult<AttendanceRecord>;

    /* leave requests */
    async fn create_leave_request(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest>;
    async fn get_leave_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>>;
    /// Newest first.
    async fn list_leave_requests(&self, query: LeaveQuery) -> StoreResult<Vec<LeaveRequest>>;
    /// Moves the request to `to` only while it is still in `from`.
    async fn decide_leave_request(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
        admin_notes: Option<String>,
    ) -> StoreResult<bool>;
}
