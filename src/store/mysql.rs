use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{HrStore, StoreError, StoreResult};
use crate::model::{
    attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus},
    department::Department,
    employee::{Employee, EmployeePatch, NewEmployee},
    leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest},
    role::Role,
    user::{NewUserAccount, UserAccount},
};
use crate::utils::db_utils::{SqlUpdate, SqlValue, execute_update};

const EMPLOYEE_COLUMNS: &str = "id, employee_code, user_id, full_name, email, phone, position, \
     salary, department_id, date_of_joining, address, emergency_contact";

const ATTENDANCE_COLUMNS: &str = "id, employee_id, date, check_in, check_out, status, notes";

const LEAVE_COLUMNS: &str = "id, employee_id, leave_type, start_date, end_date, reason, status, \
     admin_notes, created_at";

#[derive(FromRow)]
struct UserRow {
    id: u64,
    email: String,
    password: String,
    role_id: u8,
    employee_id: Option<u64>,
    full_name: String,
}

impl TryFrom<UserRow> for UserAccount {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = Role::from_id(row.role_id)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown role id {}", row.role_id)))?;
        Ok(UserAccount {
            id: row.id,
            email: row.email,
            password_hash: row.password,
            role,
            employee_id: row.employee_id,
            full_name: row.full_name,
        })
    }
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    date: NaiveDate,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    status: String,
    notes: Option<String>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AttendanceStatus>()
            .map_err(|_| StoreError::Corrupt(format!("attendance status {:?}", row.status)))?;
        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            date: row.date,
            check_in: row.check_in,
            check_out: row.check_out,
            status,
            notes: row.notes,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    reason: String,
    status: String,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let leave_type = row
            .leave_type
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("leave type {:?}", row.leave_type)))?;
        let status = row
            .status
            .parse()
            .map_err(|_| StoreError::Corrupt(format!("leave status {:?}", row.status)))?;
        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type,
            start_date: row.start_date,
            end_date: row.end_date,
            reason: row.reason,
            status,
            admin_notes: row.admin_notes,
            created_at: row.created_at,
        })
    }
}

fn convert_all<R, T>(rows: Vec<R>) -> StoreResult<Vec<T>>
where
    T: TryFrom<R, Error = StoreError>,
{
    rows.into_iter().map(T::try_from).collect()
}

/// Maps constraint violations onto the store's error vocabulary.
fn constraint_error(err: sqlx::Error, conflict: &str, missing: &'static str) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::Conflict(conflict.to_string());
        }
        if db_err.is_foreign_key_violation() {
            return StoreError::NotFound(missing);
        }
    }
    StoreError::Database(err)
}

/// Store over the hosted MySQL database.
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn employee_by_id(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {} FROM employees WHERE id = ?", EMPLOYEE_COLUMNS);
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn attendance_by_id(&self, id: u64) -> StoreResult<AttendanceRecord> {
        let sql = format!("SELECT {} FROM attendance WHERE id = ?", ATTENDANCE_COLUMNS);
        let row = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(StoreError::NotFound("attendance record"))?;
        row.try_into()
    }

    async fn leave_by_id(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }
}

fn employee_update(patch: EmployeePatch) -> SqlUpdate {
    SqlUpdate::new("employees", "id")
        .set("employee_code", patch.employee_code.map(SqlValue::String))
        .set("user_id", patch.user_id.map(SqlValue::U64))
        .set("full_name", patch.full_name.map(SqlValue::String))
        .set("email", patch.email.map(SqlValue::String))
        .set("phone", patch.phone.map(SqlValue::String))
        .set("position", patch.position.map(SqlValue::String))
        .set("salary", patch.salary.map(SqlValue::F64))
        .set("department_id", patch.department_id.map(SqlValue::U64))
        .set("date_of_joining", patch.date_of_joining.map(SqlValue::Date))
        .set("address", patch.address.map(SqlValue::String))
        .set("emergency_contact", patch.emergency_contact.map(SqlValue::String))
}

#[async_trait]
impl HrStore for MySqlStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.password, u.role_id,
                   COALESCE(u.employee_id, e.id) AS employee_id, u.full_name
            FROM users u
            LEFT JOIN employees e ON e.user_id = u.id
            WHERE u.email = ?
            LIMIT 1
            "#,
        )
        .bind(email.to_lowercase())
        .fetch_optional(&self.pool)
        .await?
        .map(UserAccount::try_from)
        .transpose()
    }

    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<UserAccount>> {
        sqlx::query_as::<_, UserRow>(
            r#"
            SELECT u.id, u.email, u.password, u.role_id,
                   COALESCE(u.employee_id, e.id) AS employee_id, u.full_name
            FROM users u
            LEFT JOIN employees e ON e.user_id = u.id
            WHERE u.id = ?
            LIMIT 1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .map(UserAccount::try_from)
        .transpose()
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        let exists = sqlx::query_scalar::<_, i64>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = ? LIMIT 1)",
        )
        .bind(email.to_lowercase())
        .fetch_one(&self.pool)
        .await?;
        Ok(exists != 0)
    }

    async fn create_user(&self, new: NewUserAccount) -> StoreResult<UserAccount> {
        let email = new.email.to_lowercase();
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password, role_id, employee_id, full_name)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&email)
        .bind(&new.password_hash)
        .bind(new.role.id())
        .bind(new.employee_id)
        .bind(&new.full_name)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Email already registered", "employee"))?;

        Ok(UserAccount {
            id: result.last_insert_id(),
            email,
            password_hash: new.password_hash,
            role: new.role,
            employee_id: new.employee_id,
            full_name: new.full_name,
        })
    }

    async fn touch_last_sign_in(&self, user_id: u64) -> StoreResult<()> {
        sqlx::query("UPDATE users SET last_login_at = NOW() WHERE id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn recent_sign_in_emails(&self, days: u32) -> StoreResult<Vec<String>> {
        let emails = sqlx::query_scalar::<_, String>(
            r#"
            SELECT email
            FROM users
            WHERE last_login_at >= NOW() - INTERVAL ? DAY
            ORDER BY last_login_at DESC
            "#,
        )
        .bind(days)
        .fetch_all(&self.pool)
        .await?;
        Ok(emails)
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Duplicate token id", "user"))?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ?
            AND revoked = FALSE
            "#,
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(sqlx::query_as::<_, Department>(
            "SELECT id, name, description FROM departments ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let sql = format!("SELECT {} FROM employees ORDER BY id", EMPLOYEE_COLUMNS);
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        self.employee_by_id(id).await
    }

    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (employee_code, user_id, full_name, email, phone, position, salary,
             department_id, date_of_joining, address, emergency_contact)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.employee_code)
        .bind(new.user_id)
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.position)
        .bind(new.salary)
        .bind(new.department_id)
        .bind(new.date_of_joining)
        .bind(&new.address)
        .bind(&new.emergency_contact)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            constraint_error(e, "Employee code or email already exists", "department")
        })?;

        self.employee_by_id(result.last_insert_id())
            .await?
            .ok_or(StoreError::NotFound("employee"))
    }

    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> StoreResult<Option<Employee>> {
        let update = employee_update(patch);
        if !update.is_empty() {
            execute_update(&self.pool, update, id).await.map_err(|e| {
                constraint_error(e, "Employee code or email already exists", "department")
            })?;
        }
        // rows_affected is 0 for an unchanged row too, so re-read instead
        self.employee_by_id(id).await
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE date = ? ORDER BY check_in IS NULL, check_in, id",
            ATTENDANCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(date)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? AND date = ?",
            ATTENDANCE_COLUMNS
        );
        sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?
            .map(AttendanceRecord::try_from)
            .transpose()
    }

    async fn recent_attendance(
        &self,
        employee_id: u64,
        limit: u32,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? ORDER BY date DESC LIMIT ?",
            ATTENDANCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? AND date BETWEEN ? AND ? ORDER BY date",
            ATTENDANCE_COLUMNS
        );
        let rows = sqlx::query_as::<_, AttendanceRow>(&sql)
            .bind(employee_id)
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool)
            .await?;
        convert_all(rows)
    }

    async fn check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in, status)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(employee_id)
        .bind(date)
        .bind(at)
        .bind(status.as_ref())
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Already checked in today", "employee"))?;

        self.attendance_by_id(result.last_insert_id()).await
    }

    async fn record_check_out(
        &self,
        record_id: u64,
        at: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET check_out = ?, status = ?
            WHERE id = ?
            AND check_out IS NULL
            "#,
        )
        .bind(at)
        .bind(status.as_ref())
        .bind(record_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_attendance(&self, entry: AttendanceEntry) -> StoreResult<AttendanceRecord> {
        sqlx::query(
            r#"
            INSERT INTO attendance (employee_id, date, check_in, check_out, status, notes)
            VALUES (?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                check_in = VALUES(check_in),
                check_out = VALUES(check_out),
                status = VALUES(status),
                notes = VALUES(notes)
            "#,
        )
        .bind(entry.employee_id)
        .bind(entry.date)
        .bind(entry.check_in)
        .bind(entry.check_out)
        .bind(entry.status.as_ref())
        .bind(&entry.notes)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Attendance already recorded", "employee"))?;

        self.attendance_for_day(entry.employee_id, entry.date)
            .await?
            .ok_or(StoreError::NotFound("attendance record"))
    }

    async fn create_leave_request(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, reason)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type.as_ref())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(&new.reason)
        .execute(&self.pool)
        .await
        .map_err(|e| constraint_error(e, "Duplicate leave request", "employee"))?;

        self.leave_by_id(result.last_insert_id())
            .await?
            .ok_or(StoreError::NotFound("leave request"))
    }

    async fn get_leave_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        self.leave_by_id(id).await
    }

    async fn list_leave_requests(&self, query: LeaveQuery) -> StoreResult<Vec<LeaveRequest>> {
        let mut sql = format!("SELECT {} FROM leave_requests WHERE 1=1", LEAVE_COLUMNS);
        if query.employee_id.is_some() {
            sql.push_str(" AND employee_id = ?");
        }
        if query.status.is_some() {
            sql.push_str(" AND status = ?");
        }
        sql.push_str(" ORDER BY created_at DESC, id DESC");

        let mut q = sqlx::query_as::<_, LeaveRow>(&sql);
        if let Some(employee_id) = query.employee_id {
            q = q.bind(employee_id);
        }
        if let Some(status) = query.status {
            q = q.bind(status.to_string());
        }

        let rows = q.fetch_all(&self.pool).await?;
        convert_all(rows)
    }

    async fn decide_leave_request(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
        admin_notes: Option<String>,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, admin_notes = COALESCE(?, admin_notes)
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(to.as_ref())
        .bind(admin_notes)
        .bind(id)
        .bind(from.as_ref())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
