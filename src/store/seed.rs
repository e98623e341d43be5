use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use once_cell::sync::Lazy;

use crate::auth::password::hash_password;
use crate::model::{
    attendance::{AttendanceRecord, AttendanceStatus},
    department::Department,
    employee::Employee,
    leave_request::{LeaveRequest, LeaveStatus, LeaveType},
    role::Role,
    user::UserAccount,
};

pub const DEMO_ADMIN_EMAIL: &str = "admin@company.com";
pub const DEMO_ADMIN_PASSWORD: &str = "admin123";
pub const DEMO_EMPLOYEE_EMAIL: &str = "employee@company.com";
pub const DEMO_EMPLOYEE_PASSWORD: &str = "employee123";

/// Argon2 is slow on purpose; hash the demo passwords once per process.
static DEMO_HASHES: Lazy<Result<(String, String), argon2::password_hash::Error>> =
    Lazy::new(|| {
        Ok((
            hash_password(DEMO_ADMIN_PASSWORD)?,
            hash_password(DEMO_EMPLOYEE_PASSWORD)?,
        ))
    });

pub fn accounts() -> anyhow::Result<Vec<UserAccount>> {
    let (admin_hash, employee_hash) = DEMO_HASHES
        .clone()
        .map_err(|e| anyhow::anyhow!("failed to hash demo passwords: {}", e))?;

    Ok(vec![
        UserAccount {
            id: 1,
            email: DEMO_ADMIN_EMAIL.into(),
            password_hash: admin_hash,
            role: Role::Admin,
            employee_id: None,
            full_name: "Admin User".into(),
        },
        UserAccount {
            id: 2,
            email: DEMO_EMPLOYEE_EMAIL.into(),
            password_hash: employee_hash,
            role: Role::Employee,
            employee_id: Some(1),
            full_name: "John Smith".into(),
        },
    ])
}

pub fn departments() -> Vec<Department> {
    [
        (1, "Engineering", "Software development team"),
        (2, "Design", "Product and UX design"),
        (3, "Marketing", "Marketing and communications"),
        (4, "Human Resources", "HR and recruitment"),
    ]
    .into_iter()
    .map(|(id, name, description)| Department {
        id,
        name: name.into(),
        description: Some(description.into()),
    })
    .collect()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap_or_default()
}

fn time(h: u32, m: u32) -> Option<NaiveTime> {
    NaiveTime::from_hms_opt(h, m, 0)
}

pub fn employees() -> Vec<Employee> {
    let rows = [
        (1, "EMP001", Some(2), "John Smith", "Software Engineer", 75000.0, 1, date(2023, 1, 15), "123 Main St, New York"),
        (2, "EMP002", None, "Sarah Johnson", "Product Designer", 68000.0, 2, date(2023, 3, 20), "456 Oak Ave, Boston"),
        (3, "EMP003", None, "Michael Chen", "Marketing Manager", 82000.0, 3, date(2022, 8, 10), "789 Pine Rd, Chicago"),
        (4, "EMP004", None, "Emily Davis", "HR Specialist", 55000.0, 4, date(2023, 6, 1), "321 Elm St, Seattle"),
        (5, "EMP005", None, "Alex Rivera", "Data Analyst", 70000.0, 1, date(2023, 2, 28), "654 Maple Dr, Austin"),
    ];

    rows.into_iter()
        .map(|(id, code, user_id, name, position, salary, dept, joined, address)| {
            let handle = name.to_lowercase().replace(' ', ".");
            Employee {
                id,
                employee_code: code.into(),
                user_id,
                full_name: name.into(),
                email: format!("{}@company.com", handle),
                phone: Some(format!("+1 555-0{}00", id)),
                position: position.into(),
                salary,
                department_id: Some(dept),
                date_of_joining: joined,
                address: Some(address.into()),
                emergency_contact: Some(format!("+1 555-0{}01", id)),
            }
        })
        .collect()
}

/// Today's board for the other employees plus two weeks of history for the
/// demo employee. Today stays open so the demo employee can check in.
pub fn attendance(today: NaiveDate) -> Vec<AttendanceRecord> {
    let mut records = vec![
        (2, today, time(9, 15), time(17, 45), AttendanceStatus::Present, None),
        (3, today, time(10, 30), None, AttendanceStatus::Late, Some("Traffic delay")),
        (4, today, None, None, AttendanceStatus::Absent, Some("Sick leave")),
    ];

    for days_ago in 1..10 {
        let day = today - chrono::Days::new(days_ago);
        if matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            continue;
        }
        let status = if days_ago == 3 {
            AttendanceStatus::Late
        } else {
            AttendanceStatus::Present
        };
        records.push((1, day, time(9, 0), time(17, 30), status, None));
    }

    records
        .into_iter()
        .enumerate()
        .map(|(i, (employee_id, date, check_in, check_out, status, notes))| AttendanceRecord {
            id: i as u64 + 1,
            employee_id,
            date,
            check_in,
            check_out,
            status,
            notes: notes.map(String::from),
        })
        .collect()
}

pub fn leave_requests() -> Vec<LeaveRequest> {
    let created = |y, m, d, h, min| {
        Utc.with_ymd_and_hms(y, m, d, h, min, 0)
            .single()
            .unwrap_or_default()
    };

    let rows = [
        (1, LeaveType::Vacation, date(2024, 12, 20), date(2024, 12, 27), "Family vacation for the holidays", LeaveStatus::Pending, None, created(2024, 11, 25, 10, 0)),
        (2, LeaveType::Sick, date(2024, 11, 28), date(2024, 11, 29), "Flu symptoms, need rest", LeaveStatus::Approved, Some("Get well soon!"), created(2024, 11, 27, 8, 30)),
        (3, LeaveType::Personal, date(2024, 12, 5), date(2024, 12, 5), "Personal appointment", LeaveStatus::Pending, None, created(2024, 12, 1, 14, 20)),
        (4, LeaveType::Emergency, date(2024, 11, 15), date(2024, 11, 16), "Family emergency", LeaveStatus::Approved, Some("Approved immediately"), created(2024, 11, 15, 7, 0)),
        (5, LeaveType::Vacation, date(2024, 10, 1), date(2024, 10, 5), "Annual leave", LeaveStatus::Rejected, Some("Please reschedule due to project deadline"), created(2024, 9, 20, 11, 0)),
    ];

    rows.into_iter()
        .enumerate()
        .map(
            |(i, (employee_id, leave_type, start_date, end_date, reason, status, notes, created_at))| {
                LeaveRequest {
                    id: i as u64 + 1,
                    employee_id,
                    leave_type,
                    start_date,
                    end_date,
                    reason: reason.into(),
                    status,
                    admin_notes: notes.map(String::from),
                    created_at,
                }
            },
        )
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_employee_has_no_record_today() {
        let today = date(2026, 10, 19);
        let records = attendance(today);
        assert!(!records.iter().any(|r| r.employee_id == 1 && r.date == today));
        assert_eq!(records.iter().filter(|r| r.date == today).count(), 3);
    }

    #[test]
    fn history_skips_weekends() {
        let records = attendance(date(2026, 10, 19));
        assert!(records
            .iter()
            .all(|r| !matches!(r.date.weekday(), Weekday::Sat | Weekday::Sun)));
    }

    #[test]
    fn demo_account_links_to_first_employee() {
        let accounts = accounts().unwrap();
        let employee = accounts.iter().find(|a| a.role == Role::Employee).unwrap();
        assert_eq!(employee.employee_id, Some(1));
        assert_eq!(employees()[0].user_id, Some(employee.id));
    }
}
