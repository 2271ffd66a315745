//! Employee CLI commands

use clap::Subcommand;

use crate::display::delivery::format_employee_list;
use crate::error::{StockroomError, StockroomResult};
use crate::services::{EmployeeService, EmployeeUpdate};
use crate::storage::Store;

/// Employee subcommands
#[derive(Subcommand)]
pub enum EmployeeCommands {
    /// Register an employee
    Add {
        /// Full name
        full_name: String,
        /// Badge or payroll number
        external_id: String,
        #[arg(short, long, default_value = "")]
        department: String,
    },
    /// List employees
    List {
        /// Include inactive employees
        #[arg(short, long)]
        all: bool,
    },
    /// Edit an employee
    Update {
        /// Employee name, external ID or ID
        employee: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        external_id: Option<String>,
        #[arg(short, long)]
        department: Option<String>,
    },
    /// Deactivate an employee
    Deactivate {
        /// Employee name, external ID or ID
        employee: String,
    },
}

/// Handle an employee command
pub fn handle_employee_command(store: &Store, cmd: EmployeeCommands) -> StockroomResult<()> {
    let service = EmployeeService::new(store);

    match cmd {
        EmployeeCommands::Add {
            full_name,
            external_id,
            department,
        } => {
            let employee = service.create(&full_name, &external_id, &department)?;
            println!("Added employee: {}", employee);
            println!("  ID: {}", employee.id);
        }

        EmployeeCommands::List { all } => {
            let employees = service.list(all)?;
            print!("{}", format_employee_list(&employees));
        }

        EmployeeCommands::Update {
            employee,
            name,
            external_id,
            department,
        } => {
            if name.is_none() && external_id.is_none() && department.is_none() {
                return Err(StockroomError::Validation(
                    "No changes specified. Use --name, --external-id or --department.".into(),
                ));
            }
            let found = service.require(&employee)?;
            let updated = service.update(
                found.id,
                EmployeeUpdate {
                    full_name: name,
                    external_id,
                    department,
                },
            )?;
            println!("Updated employee: {}", updated);
        }

        EmployeeCommands::Deactivate { employee } => {
            let found = service.require(&employee)?;
            let employee = service.deactivate(found.id)?;
            println!("Deactivated employee: {}", employee);
        }
    }

    Ok(())
}
