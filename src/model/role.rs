use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(
    Debug,
    Copy,
    Clone,
    Eq,
    PartialEq,
    Hash,
    Serialize,
    Deserialize,
    ToSchema,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Admin = 1,
    Employee = 2,
}

/// One sidebar entry of the portal.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct NavItem {
    pub name: &'static str,
    pub href: &'static str,
}

const ADMIN_NAV: &[NavItem] = &[
    NavItem { name: "Dashboard", href: "/admin" },
    NavItem { name: "Employees", href: "/admin/employees" },
    NavItem { name: "Attendance", href: "/admin/attendance" },
    NavItem { name: "Leave Requests", href: "/admin/leaves" },
    NavItem { name: "Payroll", href: "/admin/payroll" },
];

const EMPLOYEE_NAV: &[NavItem] = &[
    NavItem { name: "Dashboard", href: "/employee" },
    NavItem { name: "Attendance", href: "/employee/attendance" },
    NavItem { name: "Leave Requests", href: "/employee/leaves" },
    NavItem { name: "Salary", href: "/employee/salary" },
];

impl Role {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Role::Admin),
            2 => Some(Role::Employee),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        self as u8
    }

    /// Dashboard route a signed-in user of this role lands on.
    pub fn home(self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Employee => "/employee",
        }
    }

    pub fn navigation(self) -> &'static [NavItem] {
        match self {
            Role::Admin => ADMIN_NAV,
            Role::Employee => EMPLOYEE_NAV,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_and_unknown_ids_are_rejected() {
        assert_eq!(Role::from_id(Role::Admin.id()), Some(Role::Admin));
        assert_eq!(Role::from_id(Role::Employee.id()), Some(Role::Employee));
        assert_eq!(Role::from_id(0), None);
        assert_eq!(Role::from_id(3), None);
    }

    #[test]
    fn every_navigation_entry_stays_under_the_role_home() {
        for role in [Role::Admin, Role::Employee] {
            let nav = role.navigation();
            assert_eq!(nav[0].href, role.home());
            assert!(nav.iter().all(|item| item.href.starts_with(role.home())));
        }
    }

    #[test]
    fn parses_lowercase_names() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Employee.to_string(), "employee");
        assert!("hr".parse::<Role>().is_err());
    }
}
