use crate::model::role::Role;

/// A sign-in account. `employee_id` links the account to an employee record.
#[derive(Debug, Clone)]
pub struct UserAccount {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub employee_id: Option<u64>,
    pub full_name: String,
}

#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub employee_id: Option<u64>,
    pub full_name: String,
}
