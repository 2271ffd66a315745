//! Delivery CLI commands
//!
//! `deliver` issues stock; `delivery` queries the history.

use chrono::{Duration, Utc};
use clap::{Args, Subcommand};

use crate::config::Settings;
use crate::display::delivery::{format_delivery_list, format_delivery_statistics, DeliveryLine};
use crate::error::{StockroomError, StockroomResult};
use crate::services::{AlertEngine, DeliveryFilter, DeliveryService};
use crate::storage::Store;

/// Issue stock to an employee
#[derive(Args)]
pub struct DeliverArgs {
    /// Employee name, external ID or ID
    pub employee: String,
    /// Item name or ID
    pub item: String,
    /// Units to deliver
    pub quantity: u32,
    /// Who handed the stock over
    #[arg(short, long, default_value = "")]
    pub deliverer: String,
    #[arg(short, long, default_value = "")]
    pub note: String,
}

/// Delivery history subcommands
#[derive(Subcommand)]
pub enum DeliveryCommands {
    /// Show past deliveries, newest first
    History {
        /// Only deliveries to this employee
        #[arg(short, long)]
        employee: Option<String>,
        /// Only deliveries of this item
        #[arg(short, long)]
        item: Option<String>,
        /// Only the last N days
        #[arg(short, long)]
        days: Option<i64>,
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
    /// Delivery counts and the most delivered item
    Stats,
}

pub fn handle_deliver(
    store: &Store,
    settings: &Settings,
    args: DeliverArgs,
) -> StockroomResult<()> {
    let (employee, item) = store.read(|data| {
        (
            data.find_employee(&args.employee).cloned(),
            data.find_item(&args.item).cloned(),
        )
    })?;
    let employee =
        employee.ok_or_else(|| StockroomError::employee_not_found(&args.employee))?;
    let item = item.ok_or_else(|| StockroomError::item_not_found(&args.item))?;

    let alerts = AlertEngine::new(store, &settings.alert);
    let delivery = DeliveryService::new(store, &alerts).record_delivery(
        employee.id,
        item.id,
        args.quantity,
        &args.deliverer,
        &args.note,
    )?;

    let remaining = store
        .read(|data| data.items.get(&item.id).map(|i| i.quantity_current))?
        .unwrap_or_default();
    println!(
        "Delivered {} {} of {} to {}",
        delivery.quantity, item.unit, item.name, employee.full_name
    );
    println!("  Remaining: {} {}", remaining, item.unit);
    println!("  ID: {}", delivery.id);

    for alert in alerts.list_active_alerts()? {
        if alert.subject == Some(item.id) {
            println!("  Alert: {}", alert);
        }
    }

    Ok(())
}

pub fn handle_delivery_command(
    store: &Store,
    settings: &Settings,
    cmd: DeliveryCommands,
) -> StockroomResult<()> {
    let alerts = AlertEngine::new(store, &settings.alert);
    let service = DeliveryService::new(store, &alerts);

    match cmd {
        DeliveryCommands::History {
            employee,
            item,
            days,
            limit,
        } => {
            let mut filter = DeliveryFilter::new().limit(limit);
            if let Some(employee) = employee {
                let found = store
                    .read(|data| data.find_employee(&employee).map(|e| e.id))?
                    .ok_or_else(|| StockroomError::employee_not_found(&employee))?;
                filter = filter.employee(found);
            }
            if let Some(item) = item {
                let found = store
                    .read(|data| data.find_item(&item).map(|i| i.id))?
                    .ok_or_else(|| StockroomError::item_not_found(&item))?;
                filter = filter.item(found);
            }
            if let Some(days) = days {
                filter = filter.since(Utc::now() - Duration::days(days));
            }

            let deliveries = service.history(&filter)?;
            let names: Vec<(String, String)> = store.read(|data| {
                deliveries
                    .iter()
                    .map(|d| {
                        let item = data
                            .items
                            .get(&d.item_id)
                            .map(|i| i.name.clone())
                            .unwrap_or_else(|| d.item_id.to_string());
                        let employee = data
                            .employees
                            .get(&d.employee_id)
                            .map(|e| e.full_name.clone())
                            .unwrap_or_else(|| d.employee_id.to_string());
                        (item, employee)
                    })
                    .collect()
            })?;

            let lines: Vec<DeliveryLine<'_>> = deliveries
                .iter()
                .zip(&names)
                .map(|(delivery, (item, employee))| DeliveryLine {
                    delivery,
                    item,
                    employee,
                })
                .collect();
            print!("{}", format_delivery_list(&lines));
        }

        DeliveryCommands::Stats => {
            let stats = service.statistics()?;
            print!("{}", format_delivery_statistics(&stats));
        }
    }

    Ok(())
}
