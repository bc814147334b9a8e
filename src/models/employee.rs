//! Employee reference used by bulk item computation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The slice of employee data the payroll core needs.
///
/// The full employee record lives outside this subsystem; bulk computation
/// only needs an identifier to query the collaborators with and the hire
/// date for pro-ration and new-hire review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmployeeRef {
    /// Unique identifier for the employee within the company.
    pub id: String,
    /// The date the employee was hired.
    pub hire_date: NaiveDate,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_employee_ref() {
        let json = r#"{"id": "emp_001", "hire_date": "2023-04-01"}"#;
        let employee: EmployeeRef = serde_json::from_str(json).unwrap();
        assert_eq!(employee.id, "emp_001");
        assert_eq!(
            employee.hire_date,
            NaiveDate::from_ymd_opt(2023, 4, 1).unwrap()
        );
    }
}
