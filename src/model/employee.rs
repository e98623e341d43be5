use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "id": 1,
        "employee_code": "EMP001",
        "user_id": 2,
        "full_name": "John Smith",
        "email": "john.smith@company.com",
        "phone": "+1 555-0100",
        "position": "Software Engineer",
        "salary": 75000.0,
        "department_id": 1,
        "date_of_joining": "2023-01-15",
        "address": "123 Main St, New York",
        "emergency_contact": "+1 555-0101"
    })
)]
pub struct Employee {
    #[schema(example = 1)]
    pub id: u64,

    #[schema(example = "EMP001")]
    pub employee_code: String,

    /// Sign-in account linked to this employee, if any
    #[schema(example = 2, nullable = true)]
    pub user_id: Option<u64>,

    #[schema(example = "John Smith")]
    pub full_name: String,

    #[schema(example = "john.smith@company.com")]
    pub email: String,

    #[schema(example = "+1 555-0100", nullable = true)]
    pub phone: Option<String>,

    #[schema(example = "Software Engineer")]
    pub position: String,

    /// Monthly salary
    #[schema(example = 75000.0)]
    pub salary: f64,

    #[schema(example = 1, nullable = true)]
    pub department_id: Option<u64>,

    #[schema(example = "2023-01-15", value_type = String, format = "date")]
    pub date_of_joining: NaiveDate,

    #[schema(example = "123 Main St, New York", nullable = true)]
    pub address: Option<String>,

    #[schema(example = "+1 555-0101", nullable = true)]
    pub emergency_contact: Option<String>,
}

impl Employee {
    /// Case-insensitive match on name, employee code or position.
    /// An empty term matches everyone.
    pub fn matches_search(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        if term.is_empty() {
            return true;
        }

        [&self.full_name, &self.employee_code, &self.position]
            .iter()
            .any(|field| field.to_lowercase().contains(&term))
    }
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewEmployee {
    #[schema(example = "EMP006")]
    pub employee_code: String,
    #[schema(example = 7, nullable = true)]
    pub user_id: Option<u64>,
    #[schema(example = "Jane Roe")]
    pub full_name: String,
    #[schema(example = "jane.roe@company.com", format = "email")]
    pub email: String,
    #[schema(example = "+1 555-0600", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "QA Engineer")]
    pub position: String,
    #[schema(example = 64000.0)]
    pub salary: f64,
    #[schema(example = 1, nullable = true)]
    pub department_id: Option<u64>,
    #[schema(example = "2026-01-05", value_type = String, format = "date")]
    pub date_of_joining: NaiveDate,
    #[schema(nullable = true)]
    pub address: Option<String>,
    #[schema(nullable = true)]
    pub emergency_contact: Option<String>,
}

impl NewEmployee {
    /// Returns the first problem found with the payload, if any.
    pub fn validation_error(&self) -> Option<&'static str> {
        if self.employee_code.trim().is_empty()
            || self.full_name.trim().is_empty()
            || self.email.trim().is_empty()
            || self.position.trim().is_empty()
        {
            return Some("employee_code, full_name, email and position are required");
        }
        if !self.email.contains('@') {
            return Some("email is not valid");
        }
        if !self.salary.is_finite() || self.salary < 0.0 {
            return Some("salary must be a non-negative number");
        }
        None
    }
}

/// Partial update. Absent fields keep their current value.
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct EmployeePatch {
    pub employee_code: Option<String>,
    pub user_id: Option<u64>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub salary: Option<f64>,
    pub department_id: Option<u64>,
    #[schema(value_type = Option<String>, format = "date")]
    pub date_of_joining: Option<NaiveDate>,
    pub address: Option<String>,
    pub emergency_contact: Option<String>,
}

impl EmployeePatch {
    pub fn is_empty(&self) -> bool {
        self.employee_code.is_none()
            && self.user_id.is_none()
            && self.full_name.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.position.is_none()
            && self.salary.is_none()
            && self.department_id.is_none()
            && self.date_of_joining.is_none()
            && self.address.is_none()
            && self.emergency_contact.is_none()
    }

    pub fn validation_error(&self) -> Option<&'static str> {
        let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
        if blank(&self.employee_code) || blank(&self.full_name) || blank(&self.position) {
            return Some("employee_code, full_name and position cannot be blank");
        }
        if self.email.as_deref().is_some_and(|e| !e.contains('@')) {
            return Some("email is not valid");
        }
        if self.salary.is_some_and(|s| !s.is_finite() || s < 0.0) {
            return Some("salary must be a non-negative number");
        }
        None
    }

    /// Applies the patch onto an existing record.
    pub fn apply(self, employee: &mut Employee) {
        if let Some(v) = self.employee_code {
            employee.employee_code = v;
        }
        if let Some(v) = self.user_id {
            employee.user_id = Some(v);
        }
        if let Some(v) = self.full_name {
            employee.full_name = v;
        }
        if let Some(v) = self.email {
            employee.email = v;
        }
        if let Some(v) = self.phone {
            employee.phone = Some(v);
        }
        if let Some(v) = self.position {
            employee.position = v;
        }
        if let Some(v) = self.salary {
            employee.salary = v;
        }
        if let Some(v) = self.department_id {
            employee.department_id = Some(v);
        }
        if let Some(v) = self.date_of_joining {
            employee.date_of_joining = v;
        }
        if let Some(v) = self.address {
            employee.address = Some(v);
        }
        if let Some(v) = self.emergency_contact {
            employee.emergency_contact = Some(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn john() -> Employee {
        Employee {
            id: 1,
            employee_code: "EMP001".into(),
            user_id: None,
            full_name: "John Smith".into(),
            email: "john.smith@company.com".into(),
            phone: None,
            position: "Software Engineer".into(),
            salary: 75000.0,
            department_id: Some(1),
            date_of_joining: NaiveDate::from_ymd_opt(2023, 1, 15).unwrap(),
            address: None,
            emergency_contact: None,
        }
    }

    #[test]
    fn search_matches_name_code_and_position_ignoring_case() {
        let emp = john();
        assert!(emp.matches_search("john"));
        assert!(emp.matches_search("emp001"));
        assert!(emp.matches_search("ENGINEER"));
        assert!(emp.matches_search("   "));
        assert!(!emp.matches_search("designer"));
    }

    #[test]
    fn patch_only_touches_provided_fields() {
        let mut emp = john();
        let patch = EmployeePatch {
            position: Some("Staff Engineer".into()),
            salary: Some(90000.0),
            ..Default::default()
        };
        assert!(!patch.is_empty());
        patch.apply(&mut emp);

        assert_eq!(emp.position, "Staff Engineer");
        assert_eq!(emp.salary, 90000.0);
        assert_eq!(emp.full_name, "John Smith");
        assert_eq!(emp.department_id, Some(1));
    }

    #[test]
    fn patch_rejects_blank_names_and_negative_salary() {
        let blank = EmployeePatch {
            full_name: Some("  ".into()),
            ..Default::default()
        };
        assert!(blank.validation_error().is_some());

        let negative = EmployeePatch {
            salary: Some(-1.0),
            ..Default::default()
        };
        assert!(negative.validation_error().is_some());
        assert!(EmployeePatch::default().is_empty());
    }
}
