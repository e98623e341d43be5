use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDate, NaiveTime, Utc};

use super::{HrStore, StoreError, StoreResult, seed};
use crate::model::{
    attendance::{AttendanceEntry, AttendanceRecord, AttendanceStatus},
    department::Department,
    employee::{Employee, EmployeePatch, NewEmployee},
    leave_request::{LeaveQuery, LeaveRequest, LeaveStatus, NewLeaveRequest},
    user::{NewUserAccount, UserAccount},
};

struct RefreshRecord {
    user_id: u64,
    revoked: bool,
}

struct AccountRow {
    account: UserAccount,
    last_sign_in_at: Option<DateTime<Utc>>,
}

#[derive(Default)]
struct Data {
    accounts: Vec<AccountRow>,
    refresh_tokens: HashMap<String, RefreshRecord>,
    departments: Vec<Department>,
    employees: Vec<Employee>,
    attendance: Vec<AttendanceRecord>,
    leaves: Vec<LeaveRequest>,
}

fn next_id<T>(rows: &[T], id: impl Fn(&T) -> u64) -> u64 {
    rows.iter().map(id).max().unwrap_or(0) + 1
}

impl Data {
    fn employee_exists(&self, id: u64) -> bool {
        self.employees.iter().any(|e| e.id == id)
    }

    fn check_employee_unique(&self, code: &str, email: &str, skip_id: Option<u64>) -> StoreResult<()> {
        let clash = self.employees.iter().filter(|e| Some(e.id) != skip_id).find(|e| {
            e.employee_code.eq_ignore_ascii_case(code) || e.email.eq_ignore_ascii_case(email)
        });
        match clash {
            Some(_) => Err(StoreError::Conflict(
                "Employee code or email already exists".into(),
            )),
            None => Ok(()),
        }
    }

    /// Account with `employee_id` filled from the employee side when unset.
    fn linked_account(&self, row: &AccountRow) -> UserAccount {
        let mut account = row.account.clone();
        account.employee_id = account.employee_id.or_else(|| {
            self.employees
                .iter()
                .find(|e| e.user_id == Some(account.id))
                .map(|e| e.id)
        });
        account
    }

    fn check_department(&self, department_id: Option<u64>) -> StoreResult<()> {
        match department_id {
            Some(id) if !self.departments.iter().any(|d| d.id == id) => {
                Err(StoreError::NotFound("department"))
            }
            _ => Ok(()),
        }
    }
}

/// In-process store. `demo()` loads the prototype data set.
pub struct MemoryStore {
    data: RwLock<Data>,
}

impl MemoryStore {
    pub fn empty() -> Self {
        Self {
            data: RwLock::new(Data::default()),
        }
    }

    pub fn demo() -> anyhow::Result<Self> {
        Self::demo_on(Local::now().date_naive())
    }

    /// Demo data set with today's attendance board dated `today`.
    pub fn demo_on(today: NaiveDate) -> anyhow::Result<Self> {
        let accounts = seed::accounts()?
            .into_iter()
            .map(|account| AccountRow {
                account,
                last_sign_in_at: None,
            })
            .collect();

        Ok(Self {
            data: RwLock::new(Data {
                accounts,
                refresh_tokens: HashMap::new(),
                departments: seed::departments(),
                employees: seed::employees(),
                attendance: seed::attendance(today),
                leaves: seed::leave_requests(),
            }),
        })
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Data>> {
        self.data
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Data>> {
        self.data
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl HrStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserAccount>> {
        let data = self.read()?;
        Ok(data
            .accounts
            .iter()
            .find(|row| row.account.email.eq_ignore_ascii_case(email))
            .map(|row| data.linked_account(row)))
    }

    async fn find_user_by_id(&self, id: u64) -> StoreResult<Option<UserAccount>> {
        let data = self.read()?;
        Ok(data
            .accounts
            .iter()
            .find(|row| row.account.id == id)
            .map(|row| data.linked_account(row)))
    }

    async fn email_taken(&self, email: &str) -> StoreResult<bool> {
        Ok(self.find_user_by_email(email).await?.is_some())
    }

    async fn create_user(&self, new: NewUserAccount) -> StoreResult<UserAccount> {
        let mut data = self.write()?;
        if data
            .accounts
            .iter()
            .any(|row| row.account.email.eq_ignore_ascii_case(&new.email))
        {
            return Err(StoreError::Conflict("Email already registered".into()));
        }

        let account = UserAccount {
            id: next_id(&data.accounts, |row| row.account.id),
            email: new.email,
            password_hash: new.password_hash,
            role: new.role,
            employee_id: new.employee_id,
            full_name: new.full_name,
        };
        data.accounts.push(AccountRow {
            account: account.clone(),
            last_sign_in_at: None,
        });
        Ok(account)
    }

    async fn touch_last_sign_in(&self, user_id: u64) -> StoreResult<()> {
        let mut data = self.write()?;
        let row = data
            .accounts
            .iter_mut()
            .find(|row| row.account.id == user_id)
            .ok_or(StoreError::NotFound("user"))?;
        row.last_sign_in_at = Some(Utc::now());
        Ok(())
    }

    async fn recent_sign_in_emails(&self, days: u32) -> StoreResult<Vec<String>> {
        let cutoff = Utc::now() - chrono::Duration::days(i64::from(days));
        let data = self.read()?;
        Ok(data
            .accounts
            .iter()
            .filter(|row| row.last_sign_in_at.is_some_and(|at| at >= cutoff))
            .map(|row| row.account.email.clone())
            .collect())
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        _expires_at: DateTime<Utc>,
    ) -> StoreResult<()> {
        let mut data = self.write()?;
        if data.refresh_tokens.contains_key(jti) {
            return Err(StoreError::Conflict("Duplicate token id".into()));
        }
        data.refresh_tokens.insert(
            jti.to_string(),
            RefreshRecord {
                user_id,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StoreResult<bool> {
        let mut data = self.write()?;
        match data.refresh_tokens.get_mut(jti) {
            Some(record) if !record.revoked => {
                record.revoked = true;
                tracing::debug!(user_id = record.user_id, jti, "Refresh token revoked");
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn list_departments(&self) -> StoreResult<Vec<Department>> {
        Ok(self.read()?.departments.clone())
    }

    async fn list_employees(&self) -> StoreResult<Vec<Employee>> {
        let mut employees = self.read()?.employees.clone();
        employees.sort_by_key(|e| e.id);
        Ok(employees)
    }

    async fn get_employee(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.read()?.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn create_employee(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut data = self.write()?;
        data.check_employee_unique(&new.employee_code, &new.email, None)?;
        data.check_department(new.department_id)?;

        let employee = Employee {
            id: next_id(&data.employees, |e| e.id),
            employee_code: new.employee_code,
            user_id: new.user_id,
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            position: new.position,
            salary: new.salary,
            department_id: new.department_id,
            date_of_joining: new.date_of_joining,
            address: new.address,
            emergency_contact: new.emergency_contact,
        };
        data.employees.push(employee.clone());
        Ok(employee)
    }

    async fn update_employee(&self, id: u64, patch: EmployeePatch) -> StoreResult<Option<Employee>> {
        let mut data = self.write()?;
        let Some(index) = data.employees.iter().position(|e| e.id == id) else {
            return Ok(None);
        };

        let mut updated = data.employees[index].clone();
        patch.apply(&mut updated);
        data.check_employee_unique(&updated.employee_code, &updated.email, Some(id))?;
        data.check_department(updated.department_id)?;

        data.employees[index] = updated.clone();
        Ok(Some(updated))
    }

    async fn attendance_on(&self, date: NaiveDate) -> StoreResult<Vec<AttendanceRecord>> {
        let data = self.read()?;
        Ok(data
            .attendance
            .iter()
            .filter(|r| r.date == date)
            .cloned()
            .collect())
    }

    async fn attendance_for_day(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> StoreResult<Option<AttendanceRecord>> {
        let data = self.read()?;
        Ok(data
            .attendance
            .iter()
            .find(|r| r.employee_id == employee_id && r.date == date)
            .cloned())
    }

    async fn recent_attendance(
        &self,
        employee_id: u64,
        limit: u32,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let data = self.read()?;
        let mut records: Vec<_> = data
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id)
            .cloned()
            .collect();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        records.truncate(limit as usize);
        Ok(records)
    }

    async fn attendance_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> StoreResult<Vec<AttendanceRecord>> {
        let data = self.read()?;
        Ok(data
            .attendance
            .iter()
            .filter(|r| r.employee_id == employee_id && r.date >= from && r.date <= to)
            .cloned()
            .collect())
    }

    async fn check_in(
        &self,
        employee_id: u64,
        date: NaiveDate,
        at: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<AttendanceRecord> {
        let mut data = self.write()?;
        if !data.employee_exists(employee_id) {
            return Err(StoreError::NotFound("employee"));
        }
        if data
            .attendance
            .iter()
            .any(|r| r.employee_id == employee_id && r.date == date)
        {
            return Err(StoreError::Conflict("Already checked in today".into()));
        }

        let record = AttendanceRecord {
            id: next_id(&data.attendance, |r| r.id),
            employee_id,
            date,
            check_in: Some(at),
            check_out: None,
            status,
            notes: None,
        };
        data.attendance.push(record.clone());
        Ok(record)
    }

    async fn record_check_out(
        &self,
        record_id: u64,
        at: NaiveTime,
        status: AttendanceStatus,
    ) -> StoreResult<bool> {
        let mut data = self.write()?;
        match data
            .attendance
            .iter_mut()
            .find(|r| r.id == record_id && r.check_out.is_none())
        {
            Some(record) => {
                record.check_out = Some(at);
                record.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn upsert_attendance(&self, entry: AttendanceEntry) -> StoreResult<AttendanceRecord> {
        let mut data = self.write()?;
        if !data.employee_exists(entry.employee_id) {
            return Err(StoreError::NotFound("employee"));
        }

        let existing = data
            .attendance
            .iter()
            .position(|r| r.employee_id == entry.employee_id && r.date == entry.date);
        let id = match existing {
            Some(index) => data.attendance[index].id,
            None => next_id(&data.attendance, |r| r.id),
        };

        let record = AttendanceRecord {
            id,
            employee_id: entry.employee_id,
            date: entry.date,
            check_in: entry.check_in,
            check_out: entry.check_out,
            status: entry.status,
            notes: entry.notes,
        };
        match existing {
            Some(index) => data.attendance[index] = record.clone(),
            None => data.attendance.push(record.clone()),
        }
        Ok(record)
    }

    async fn create_leave_request(&self, new: NewLeaveRequest) -> StoreResult<LeaveRequest> {
        let mut data = self.write()?;
        if !data.employee_exists(new.employee_id) {
            return Err(StoreError::NotFound("employee"));
        }

        let leave = LeaveRequest {
            id: next_id(&data.leaves, |l| l.id),
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            reason: new.reason,
            status: LeaveStatus::Pending,
            admin_notes: None,
            created_at: Utc::now(),
        };
        data.leaves.push(leave.clone());
        Ok(leave)
    }

    async fn get_leave_request(&self, id: u64) -> StoreResult<Option<LeaveRequest>> {
        Ok(self.read()?.leaves.iter().find(|l| l.id == id).cloned())
    }

    async fn list_leave_requests(&self, query: LeaveQuery) -> StoreResult<Vec<LeaveRequest>> {
        let data = self.read()?;
        let mut leaves: Vec<_> = data
            .leaves
            .iter()
            .filter(|l| query.matches(l))
            .cloned()
            .collect();
        leaves.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(leaves)
    }

    async fn decide_leave_request(
        &self,
        id: u64,
        from: LeaveStatus,
        to: LeaveStatus,
        admin_notes: Option<String>,
    ) -> StoreResult<bool> {
        let mut data = self.write()?;
        match data
            .leaves
            .iter_mut()
            .find(|l| l.id == id && l.status == from)
        {
            Some(leave) => {
                leave.status = to;
                if admin_notes.is_some() {
                    leave.admin_notes = admin_notes;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
