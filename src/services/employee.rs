//! Employee service
//!
//! Create, edit and deactivate the staff who receive deliveries.

use tracing::info;

use crate::audit::{AuditEntry, EntityType};
use crate::error::{StockroomError, StockroomResult};
use crate::models::{Employee, EmployeeId};
use crate::storage::{Dataset, Store};

/// Editable employee fields; `None` leaves a field unchanged
#[derive(Debug, Clone, Default)]
pub struct EmployeeUpdate {
    pub full_name: Option<String>,
    pub external_id: Option<String>,
    pub department: Option<String>,
}

pub struct EmployeeService<'a> {
    store: &'a Store,
}

impl<'a> EmployeeService<'a> {
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    pub fn create(
        &self,
        full_name: &str,
        external_id: &str,
        department: &str,
    ) -> StockroomResult<Employee> {
        let mut employee = Employee::new(full_name.trim(), external_id.trim());
        employee.department = department.trim().to_string();
        employee
            .validate()
            .map_err(|e| StockroomError::Validation(e.to_string()))?;

        let created = employee.clone();
        self.store.transaction(|data| {
            ensure_unique_external_id(data, &employee.external_id, None)?;
            data.employees.insert(employee.id, employee);
            Ok(())
        })?;

        info!(employee = %created.full_name, "employee created");
        self.store.log_create(
            EntityType::Employee,
            created.id.to_string(),
            Some(created.full_name.clone()),
            &created,
        );
        Ok(created)
    }

    pub fn update(&self, id: EmployeeId, update: EmployeeUpdate) -> StockroomResult<Employee> {
        let (before, after) = self.store.transaction(|data| {
            let before = data
                .employees
                .get(&id)
                .cloned()
                .ok_or_else(|| StockroomError::employee_not_found(id.to_string()))?;

            let mut after = before.clone();
            if let Some(name) = update.full_name {
                after.full_name = name.trim().to_string();
            }
            if let Some(external_id) = update.external_id {
                after.external_id = external_id.trim().to_string();
            }
            if let Some(department) = update.department {
                after.department = department.trim().to_string();
            }
            after
                .validate()
                .map_err(|e| StockroomError::Validation(e.to_string()))?;
            ensure_unique_external_id(data, &after.external_id, Some(id))?;

            data.employees.insert(id, after.clone());
            Ok((before, after))
        })?;

        self.store.log_update(
            EntityType::Employee,
            id.to_string(),
            Some(after.full_name.clone()),
            &before,
            &after,
        );
        Ok(after)
    }

    /// Soft delete; past deliveries keep referencing the employee
    pub fn deactivate(&self, id: EmployeeId) -> StockroomResult<Employee> {
        let employee = self.store.transaction(|data| {
            let employee = data
                .employees
                .get_mut(&id)
                .ok_or_else(|| StockroomError::employee_not_found(id.to_string()))?;
            employee.deactivate();
            Ok(employee.clone())
        })?;

        info!(employee = %employee.full_name, "employee deactivated");
        self.store.record_audit(&[AuditEntry::deactivate(
            EntityType::Employee,
            id.to_string(),
            Some(employee.full_name.clone()),
        )]);
        Ok(employee)
    }

    pub fn get(&self, id: EmployeeId) -> StockroomResult<Option<Employee>> {
        self.store.read(|data| data.employees.get(&id).cloned())
    }

    /// Find by ID, external ID or full name
    pub fn find(&self, identifier: &str) -> StockroomResult<Option<Employee>> {
        self.store
            .read(|data| data.find_employee(identifier).cloned())
    }

    pub fn require(&self, identifier: &str) -> StockroomResult<Employee> {
        self.find(identifier)?
            .ok_or_else(|| StockroomError::employee_not_found(identifier))
    }

    /// Employees sorted by name
    pub fn list(&self, include_inactive: bool) -> StockroomResult<Vec<Employee>> {
        let mut employees: Vec<Employee> = self.store.read(|data| {
            data.employees
                .values()
                .filter(|e| include_inactive || e.active)
                .cloned()
                .collect()
        })?;
        employees.sort_by_key(|e| e.full_name.to_lowercase());
        Ok(employees)
    }
}

fn ensure_unique_external_id(
    data: &Dataset,
    external_id: &str,
    exclude: Option<EmployeeId>,
) -> StockroomResult<()> {
    let lower = external_id.to_lowercase();
    let taken = data
        .employees
        .values()
        .any(|e| Some(e.id) != exclude && e.external_id.to_lowercase() == lower);
    if taken {
        return Err(StockroomError::Duplicate {
            entity_type: "Employee",
            identifier: external_id.to_string(),
        });
    }
    Ok(())
}
