use std::io;

use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use parkbay::config::Config;
use parkbay::console::{render_records, EmployeeConsole, GateConsole};
use parkbay::dates::CalendarDate;
use parkbay::engine::{Engine, InMemoryStore};
use parkbay::model::{EmployeeId, EmployeeRecord, Field, Predicate, Status};

#[derive(Debug, Parser)]
#[command(version, about = "Parking-space reservations for a status-quota car park")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Reserve, open up or view your space
    Employee,
    /// Check arriving cars by registration number
    Gate,
    /// Register an employee
    Add {
        #[arg(long)]
        id: EmployeeId,
        #[arg(long)]
        registration: String,
        /// Disabled, "ED / MD", "Critical Worker / Tenure" or Other
        #[arg(long)]
        status: Status,
        #[arg(long)]
        eco_car: bool,
        #[arg(long, default_value_t = 0)]
        distance: i64,
    },
    /// Remove an employee
    Remove { id: EmployeeId },
    /// List employees
    List {
        #[arg(long)]
        status: Option<Status>,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Show free spaces per quota
    Availability,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // stdout belongs to the console flows; logs go to stderr, quiet unless RUST_LOG says otherwise
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let metrics = parkbay::observability::init(config.metrics);

    std::fs::create_dir_all(&config.data_dir)?;
    let journal = config.journal_path();
    let mut engine = Engine::open(&journal, InMemoryStore::new(), config.tracker()?, config.compact_threshold)?;
    info!("journal: {}", journal.display());
    info!("  free spaces: {}", engine.free_spaces());

    let stdin = io::stdin();
    let stdout = io::stdout();
    match cli.command {
        Command::Employee => {
            EmployeeConsole::new(&mut engine, stdin.lock(), stdout.lock(), CalendarDate::today()).run()?;
        }
        Command::Gate => {
            GateConsole::new(&engine, stdin.lock(), stdout.lock(), CalendarDate::today()).run()?;
        }
        Command::Add {
            id,
            registration,
            status,
            eco_car,
            distance,
        } => {
            engine.insert_record(EmployeeRecord::register(id, registration, status, eco_car, distance))?;
            println!("Added employee {id}.");
        }
        Command::Remove { id } => {
            engine.delete_record(id)?;
            println!("Removed employee {id}.");
        }
        Command::List { status, json } => {
            let predicates: Vec<Predicate> = status
                .map(|s| Predicate::equals(Field::Status, s))
                .into_iter()
                .collect();
            let records = engine.query(&predicates)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&records)?);
            } else {
                render_records(&mut stdout.lock(), &records)?;
            }
        }
        Command::Availability => {
            let availability = engine.availability();
            for (status, free) in availability.snapshot() {
                println!("{:<25} {free}", status.as_str());
            }
            println!("{:<25} {}", "Total free", availability.free_spaces());
            println!("{:<25} {}", "Lot capacity", availability.capacity());
            println!("{:<25} {}", "Emergency spaces", config.emergency_spaces);
        }
    }

    if let Some(handle) = metrics {
        eprintln!("{}", handle.render());
    }
    Ok(())
}
