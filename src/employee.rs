// Employee entity - stored fields plus derived salary values
//
// Weekly salary is the only stored amount; the yearly projection and the
// currency strings are computed on demand so they can never drift from it.

use serde::{Deserialize, Serialize};

/// Format a salary amount as currency: leading `$`, exactly two decimals.
pub fn format_currency(value: f64) -> String {
    format!("${:.2}", value)
}

// ============================================================================
// EMPLOYEE ENTITY
// ============================================================================

/// A single employee record.
///
/// `id` is the surrogate key assigned by the backing store; it is `None`
/// for entities that have not been persisted yet (fresh CSV rows, menu
/// input before insert).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    #[serde(default)]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    pub weekly_salary: f64,
}

impl Employee {
    /// Pay periods per year used for the yearly projection.
    pub const WEEKS_PER_YEAR: f64 = 52.0;

    /// Create a new, not-yet-persisted employee.
    pub fn new(first_name: String, last_name: String, weekly_salary: f64) -> Self {
        Employee {
            id: None,
            first_name,
            last_name,
            weekly_salary,
        }
    }

    /// Builder pattern: attach the surrogate key assigned by the store.
    pub fn with_id(mut self, id: i64) -> Self {
        self.id = Some(id);
        self
    }

    /// Yearly salary, always `weekly_salary * 52`.
    pub fn yearly_salary(&self) -> f64 {
        self.weekly_salary * Self::WEEKS_PER_YEAR
    }

    /// Weekly salary formatted as currency.
    pub fn formatted_weekly_salary(&self) -> String {
        format_currency(self.weekly_salary)
    }

    /// Yearly salary formatted as currency.
    pub fn formatted_yearly_salary(&self) -> String {
        format_currency(self.yearly_salary())
    }

    /// Apply a percentage raise to the weekly salary.
    ///
    /// No bounds checking: a negative percentage is a pay cut and is
    /// accepted silently.
    pub fn apply_percentage_raise(&mut self, percentage: f64) {
        self.weekly_salary *= 1.0 + percentage / 100.0;
    }

    /// First and last name in the fixed roster columns (10 and 20 wide).
    pub fn full_name(&self) -> String {
        format!("{:<10} {:<20}", self.first_name, self.last_name)
    }
}

impl std::fmt::Display for Employee {
    /// One fixed-width roster line: first name, last name, weekly salary.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{:<10} {:<20} {:>14}",
            self.first_name,
            self.last_name,
            self.formatted_weekly_salary()
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Employee {
        Employee::new("David".to_string(), "Barnes".to_string(), 835.00)
    }

    #[test]
    fn test_new_employee_has_no_id() {
        let employee = sample();

        assert_eq!(employee.id, None);
        assert_eq!(employee.first_name, "David");
        assert_eq!(employee.last_name, "Barnes");
        assert_eq!(employee.weekly_salary, 835.00);
    }

    #[test]
    fn test_with_id_attaches_surrogate_key() {
        let employee = sample().with_id(7);
        assert_eq!(employee.id, Some(7));
    }

    #[test]
    fn test_yearly_salary_is_weekly_times_52() {
        let employee = sample();
        assert_eq!(employee.yearly_salary(), 835.00 * 52.0);

        let zero = Employee::new("A".to_string(), "B".to_string(), 0.0);
        assert_eq!(zero.yearly_salary(), 0.0);

        let negative = Employee::new("A".to_string(), "B".to_string(), -10.0);
        assert_eq!(negative.yearly_salary(), -520.0);
    }

    #[test]
    fn test_zero_percent_raise_leaves_salary_unchanged() {
        let mut employee = sample();
        employee.apply_percentage_raise(0.0);
        assert_eq!(employee.weekly_salary, 835.00);
    }

    #[test]
    fn test_ten_percent_raise_on_100() {
        let mut employee = Employee::new("Joe".to_string(), "Somebody".to_string(), 100.00);
        employee.apply_percentage_raise(10.0);

        assert!((employee.weekly_salary - 110.00).abs() < 1e-9);
        assert_eq!(employee.formatted_weekly_salary(), "$110.00");
    }

    #[test]
    fn test_negative_raise_is_a_pay_cut() {
        let mut employee = Employee::new("Joe".to_string(), "Somebody".to_string(), 200.00);
        employee.apply_percentage_raise(-50.0);

        assert!((employee.weekly_salary - 100.00).abs() < 1e-9);
    }

    #[test]
    fn test_formatted_salaries_have_two_decimals_and_dollar_sign() {
        let employee = Employee::new("Kathryn".to_string(), "Janeway".to_string(), 184.00);

        assert_eq!(employee.formatted_weekly_salary(), "$184.00");
        assert_eq!(employee.formatted_yearly_salary(), "$9568.00");
    }

    #[test]
    fn test_format_currency_rounds_to_two_places() {
        assert_eq!(format_currency(345.567), "$345.57");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(2453.449), "$2453.45");
    }

    #[test]
    fn test_display_is_fixed_width() {
        let employee = Employee::new("James".to_string(), "Kirk".to_string(), 453.00);
        let line = employee.to_string();

        // 10 + 1 + 20 + 1 + 14 columns
        assert_eq!(line.len(), 46);
        assert!(line.starts_with("James      Kirk"));
        assert!(line.ends_with("$453.00"));
    }

    #[test]
    fn test_full_name_pads_both_columns() {
        let employee = Employee::new("Jean-Luc".to_string(), "Picard".to_string(), 290.00);
        assert_eq!(employee.full_name(), "Jean-Luc   Picard              ");
    }
}
