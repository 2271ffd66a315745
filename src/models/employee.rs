//! Employee model
//!
//! Staff members who receive deliveries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::EmployeeId;

/// A staff member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,

    pub full_name: String,

    /// Unique external identifier (badge or national ID number)
    pub external_id: String,

    #[serde(default)]
    pub department: String,

    /// Only active employees may receive deliveries
    pub active: bool,

    pub created_at: DateTime<Utc>,
}

impl Employee {
    /// Create a new active employee
    pub fn new(full_name: impl Into<String>, external_id: impl Into<String>) -> Self {
        Self {
            id: EmployeeId::new(),
            full_name: full_name.into(),
            external_id: external_id.into(),
            department: String::new(),
            active: true,
            created_at: Utc::now(),
        }
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn activate(&mut self) {
        self.active = true;
    }

    /// Validate the employee
    pub fn validate(&self) -> Result<(), EmployeeValidationError> {
        if self.full_name.trim().is_empty() {
            return Err(EmployeeValidationError::EmptyName);
        }
        if self.full_name.len() > 100 {
            return Err(EmployeeValidationError::NameTooLong(self.full_name.len()));
        }
        if self.external_id.trim().is_empty() {
            return Err(EmployeeValidationError::EmptyExternalId);
        }
        if self.external_id.len() > 20 {
            return Err(EmployeeValidationError::ExternalIdTooLong(
                self.external_id.len(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Employee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.full_name, self.external_id)
    }
}

/// Validation errors for employees
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmployeeValidationError {
    EmptyName,
    NameTooLong(usize),
    EmptyExternalId,
    ExternalIdTooLong(usize),
}

impl fmt::Display for EmployeeValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Employee name cannot be empty"),
            Self::NameTooLong(len) => {
                write!(f, "Employee name too long ({} chars, max 100)", len)
            }
            Self::EmptyExternalId => write!(f, "Employee external ID cannot be empty"),
            Self::ExternalIdTooLong(len) => {
                write!(f, "Employee external ID too long ({} chars, max 20)", len)
            }
        }
    }
}

impl std::error::Error for EmployeeValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_employee_is_active() {
        let employee = Employee::new("Ana Torres", "1002003");
        assert!(employee.active);
        assert!(employee.validate().is_ok());
        assert_eq!(employee.to_string(), "Ana Torres [1002003]");
    }

    #[test]
    fn test_validation() {
        assert_eq!(
            Employee::new("  ", "1").validate(),
            Err(EmployeeValidationError::EmptyName)
        );
        assert_eq!(
            Employee::new("Ana", "").validate(),
            Err(EmployeeValidationError::EmptyExternalId)
        );
    }
}
