//! Item CLI commands
//!
//! Implements CLI commands for item maintenance and restocking.

use clap::Subcommand;

use crate::config::Settings;
use crate::display::item::{format_item_details, format_item_list};
use crate::error::{StockroomError, StockroomResult};
use crate::services::{AlertEngine, ItemService, ItemUpdate, NewItem, StockLedger};
use crate::storage::Store;

const NO_CHANGES: &str =
    "No changes specified. Use --name, --category, --min, --max, --unit or --supplier.";

/// Item subcommands
#[derive(Subcommand)]
pub enum ItemCommands {
    /// Add a new item
    Add {
        /// Item name
        name: String,
        /// Category (e.g. Paper, Writing, Desk)
        #[arg(short, long)]
        category: String,
        /// Minimum quantity to keep on hand
        #[arg(long)]
        min: u32,
        /// Maximum quantity to keep on hand
        #[arg(long)]
        max: u32,
        /// Starting quantity
        #[arg(short, long, default_value = "0")]
        quantity: u32,
        /// Unit of measure
        #[arg(short, long, default_value = "unit")]
        unit: String,
        /// Supplier name
        #[arg(short, long, default_value = "")]
        supplier: String,
    },
    /// List items
    List {
        /// Include inactive items
        #[arg(short, long)]
        all: bool,
    },
    /// Show item details
    Show {
        /// Item name or ID
        item: String,
    },
    /// Edit an item
    Update {
        /// Item name or ID
        item: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        category: Option<String>,
        #[arg(long)]
        min: Option<u32>,
        #[arg(long)]
        max: Option<u32>,
        #[arg(short, long)]
        unit: Option<String>,
        #[arg(short, long)]
        supplier: Option<String>,
    },
    /// Receive stock
    Restock {
        /// Item name or ID
        item: String,
        /// Units received
        quantity: u32,
        /// Reason recorded in the audit log
        #[arg(short, long, default_value = "restock")]
        reason: String,
    },
    /// Deactivate an item
    Deactivate {
        /// Item name or ID
        item: String,
    },
    /// Reactivate an item
    Activate {
        /// Item name or ID
        item: String,
    },
    /// Items below their minimum, with suggested order quantities
    Reorder,
}

/// Handle an item command
pub fn handle_item_command(
    store: &Store,
    settings: &Settings,
    cmd: ItemCommands,
) -> StockroomResult<()> {
    let alerts = AlertEngine::new(store, &settings.alert);
    let service = ItemService::new(store, &alerts);

    match cmd {
        ItemCommands::Add {
            name,
            category,
            min,
            max,
            quantity,
            unit,
            supplier,
        } => {
            let item = service.create(NewItem {
                name,
                category,
                quantity,
                minimum: min,
                maximum: max,
                unit,
                supplier,
            })?;

            println!("Created item: {}", item.name);
            println!("  On hand: {} {}", item.quantity_current, item.unit);
            println!("  Range: {} - {}", item.quantity_minimum, item.quantity_maximum);
            println!("  ID: {}", item.id);
        }

        ItemCommands::List { all } => {
            let items = service.list(all)?;
            print!("{}", format_item_list(&items, &settings.alert));
        }

        ItemCommands::Show { item } => {
            let found = service.require(&item)?;
            print!("{}", format_item_details(&found, &settings.alert));
        }

        ItemCommands::Update {
            item,
            name,
            category,
            min,
            max,
            unit,
            supplier,
        } => {
            let found = service.require(&item)?;
            let update = ItemUpdate {
                name,
                category,
                minimum: min,
                maximum: max,
                unit,
                supplier,
            };
            if update.name.is_none()
                && update.category.is_none()
                && update.minimum.is_none()
                && update.maximum.is_none()
                && update.unit.is_none()
                && update.supplier.is_none()
            {
                return Err(StockroomError::Validation(NO_CHANGES.into()));
            }

            let updated = service.update(found.id, update)?;
            println!("Updated item: {}", updated.name);
        }

        ItemCommands::Restock {
            item,
            quantity,
            reason,
        } => {
            let found = service.require(&item)?;
            let change = StockLedger::new(store).restock(found.id, quantity, &reason, &alerts)?;
            println!(
                "Restocked {}: {} -> {} {}",
                change.item.name,
                change.previous_quantity,
                change.new_quantity(),
                change.item.unit
            );
        }

        ItemCommands::Deactivate { item } => {
            let found = service.require(&item)?;
            let item = service.deactivate(found.id)?;
            println!("Deactivated item: {}", item.name);
        }

        ItemCommands::Activate { item } => {
            let found = service.require(&item)?;
            let item = service.activate(found.id)?;
            println!("Activated item: {}", item.name);
        }

        ItemCommands::Reorder => {
            let items = StockLedger::new(store).items_needing_reorder(&settings.alert)?;
            if items.is_empty() {
                println!("All items are at or above their minimum.");
                return Ok(());
            }
            for item in items {
                println!(
                    "  {:<24} {:>6} on hand, order {} {}",
                    item.name,
                    item.quantity_current,
                    item.suggested_order_quantity(),
                    item.unit
                );
            }
        }
    }

    Ok(())
}
