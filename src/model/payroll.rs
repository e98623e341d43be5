use serde::Serialize;
use utoipa::ToSchema;

pub const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, ToSchema)]
pub struct PayrollSummary {
    #[schema(example = 350000.0)]
    pub total_payroll: f64,
    #[schema(example = 70000.0)]
    pub average_salary: f64,
    #[schema(example = 5)]
    pub employee_count: usize,
}

impl PayrollSummary {
    /// Sum and mean of monthly salaries; the mean of nobody is 0.
    pub fn from_salaries<I>(salaries: I) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let (total_payroll, employee_count) = salaries
            .into_iter()
            .fold((0.0, 0usize), |(sum, n), salary| (sum + salary, n + 1));

        let average_salary = if employee_count == 0 {
            0.0
        } else {
            total_payroll / employee_count as f64
        };

        Self {
            total_payroll,
            average_salary,
            employee_count,
        }
    }
}

pub fn annual_salary(monthly: f64) -> f64 {
    monthly * MONTHS_PER_YEAR
}
