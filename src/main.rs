use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

use stockroom::audit::EntityType;
use stockroom::cli::{
    handle_alert_command, handle_backup_command, handle_config_command, handle_deliver,
    handle_delivery_command, handle_employee_command, handle_item_command, AlertCommands,
    BackupCommands, ConfigCommands, DeliverArgs, DeliveryCommands, EmployeeCommands,
    ItemCommands,
};
use stockroom::config::{paths::StockroomPaths, settings::Settings};
use stockroom::display::format_dashboard;
use stockroom::services::{AlertEngine, StockLedger};
use stockroom::storage::{LockPolicy, Store};

#[derive(Parser)]
#[command(
    name = "stockroom",
    version,
    about = "Office-supply inventory ledger with stock alerts and automatic backups",
    long_about = "Stockroom tracks office supplies, the staff who receive them and every \
                  delivery. It raises alerts when stock runs low or piles up, and keeps \
                  the ledger safe with scheduled, validated backups."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Item management commands
    #[command(subcommand)]
    Item(ItemCommands),

    /// Employee management commands
    #[command(subcommand)]
    Employee(EmployeeCommands),

    /// Deliver stock to an employee
    Deliver(DeliverArgs),

    /// Delivery history and statistics
    #[command(subcommand)]
    Delivery(DeliveryCommands),

    /// Alert commands
    #[command(subcommand)]
    Alert(AlertCommands),

    /// Backup and restore commands
    #[command(subcommand)]
    Backup(BackupCommands),

    /// Show or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Show recent audit log entries
    Audit {
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Only this entity type (item, employee, delivery, alert, backup)
        #[arg(short, long)]
        entity: Option<EntityType>,
    },

    /// Inventory and alert overview
    Summary,

    /// Initialize the data directory and write default settings
    Init,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    stockroom::logging::init();

    let paths = StockroomPaths::new()?;
    let mut settings = Settings::load_or_create(&paths)?;
    let store = Arc::new(Store::open(
        paths.clone(),
        LockPolicy::from(settings.lock.clone()),
    )?);

    match cli.command {
        Some(Commands::Item(cmd)) => handle_item_command(&store, &settings, cmd)?,
        Some(Commands::Employee(cmd)) => handle_employee_command(&store, cmd)?,
        Some(Commands::Deliver(args)) => handle_deliver(&store, &settings, args)?,
        Some(Commands::Delivery(cmd)) => handle_delivery_command(&store, &settings, cmd)?,
        Some(Commands::Alert(cmd)) => handle_alert_command(&store, &settings, cmd)?,
        Some(Commands::Backup(cmd)) => handle_backup_command(&store, &settings, cmd)?,
        Some(Commands::Config(cmd)) => handle_config_command(&paths, &mut settings, cmd)?,
        Some(Commands::Audit { limit, entity }) => {
            let entries = store.audit_logger().read_recent(limit, entity)?;
            if entries.is_empty() {
                println!("No audit entries.");
            }
            for entry in entries {
                println!("{}", entry.format_human_readable());
            }
        }
        Some(Commands::Summary) => {
            let ledger = StockLedger::new(&store);
            let thresholds = &settings.alert;
            let alerts = AlertEngine::new(&store, thresholds).summary()?;
            print!(
                "{}",
                format_dashboard(
                    &ledger.summary(thresholds)?,
                    &alerts,
                    &ledger.items_needing_reorder(thresholds)?,
                    thresholds,
                )
            );
        }
        Some(Commands::Init) => {
            settings.save(&paths)?;
            println!("Initialized Stockroom at: {}", paths.base_dir().display());
            println!("Settings written to: {}", paths.settings_file().display());
            println!();
            println!("Next steps:");
            println!("  stockroom item add \"Printer Paper\" --category Paper --min 10 --max 100");
            println!("  stockroom employee add \"Ana Torres\" 1002003");
        }
        None => {
            println!("Stockroom - office-supply inventory");
            println!();
            println!("Run 'stockroom --help' for usage information.");
        }
    }

    Ok(())
}
