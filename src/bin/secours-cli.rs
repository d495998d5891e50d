#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use secours::{
    io,
    model::{EmployeeId, Role},
    scheduler::{AssignOptions, ErrorClass, SchedError, Scheduler},
    storage::{EmployeeDirectory, SqliteStore},
    RosterConfig,
};
#[cfg(feature = "logging")]
use tracing_subscriber::{fmt::Subscriber, EnvFilter};

/// CLI de planning des gardes (base SQLite locale)
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    /// Active les logs (feature `logging`)
    #[arg(long, global = true)]
    log: bool,

    /// Base SQLite du planning
    #[arg(long, global = true, default_value = "roster.db")]
    db: String,

    /// Fichier JSON de configuration (capacités, limites)
    #[arg(long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enregistrer un membre du personnel
    AddEmployee {
        #[arg(long)]
        name: String,
        /// medic | technical | administrator
        #[arg(long)]
        role: Role,
    },

    /// Importer le personnel depuis un CSV (`name,role`)
    ImportEmployees {
        #[arg(long)]
        csv: String,
    },

    /// Lister le personnel
    Employees,

    /// Assigner un employé à un créneau
    Assign {
        #[arg(long)]
        employee: i64,
        /// YYYY-MM-DD
        #[arg(long)]
        date: String,
        /// 1 (06-14), 2 (14-22), 3 (22-06)
        #[arg(long)]
        slot: u8,
    },

    /// Annuler une assignation
    Remove {
        #[arg(long)]
        employee: i64,
        #[arg(long)]
        date: String,
        #[arg(long)]
        slot: u8,
    },

    /// Lister les gardes d'un employé, export CSV optionnel
    Shifts {
        #[arg(long)]
        employee: i64,
        #[arg(long, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, requires = "from")]
        to: Option<NaiveDate>,
        #[arg(long)]
        out_csv: Option<String>,
    },

    /// Places restantes par jour, créneau et rôle
    Availability {
        #[arg(long)]
        start: String,
        #[arg(long, default_value_t = 7)]
        days: u32,
        #[arg(long)]
        out_json: Option<String>,
    },

    /// Personnel de garde à un instant donné
    OnCall {
        /// RFC3339 UTC (défaut : maintenant)
        #[arg(long)]
        at: Option<DateTime<Utc>>,
        /// Exclure ceux dont la garde se termine dans moins de N minutes
        #[arg(long, default_value_t = 0)]
        buffer_minutes: i64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    #[cfg(feature = "logging")]
    if cli.log {
        let _ = Subscriber::builder()
            .with_env_filter(EnvFilter::from_default_env())
            .try_init();
    }

    let config = match &cli.config {
        Some(path) => RosterConfig::load(path)?,
        None => RosterConfig::default(),
    };
    let store = SqliteStore::open(&cli.db, config.storage_timeout())
        .with_context(|| format!("opening roster database {}", cli.db))?;
    let scheduler = Scheduler::new(store, AssignOptions::from(&config));

    let code = match cli.cmd {
        Commands::AddEmployee { name, role } => {
            let employee = scheduler.store().register_employee(&name, role)?;
            println!("{} {} ({})", employee.id, employee.name, employee.role);
            0
        }
        Commands::ImportEmployees { csv } => {
            let rows = io::import_employees_csv(csv)?;
            for row in &rows {
                scheduler.store().register_employee(&row.name, row.role)?;
            }
            println!("imported {} employee(s)", rows.len());
            0
        }
        Commands::Employees => {
            for e in scheduler.store().list_employees()? {
                println!("{} | {} | {}", e.id, e.name, e.role);
            }
            0
        }
        Commands::Assign {
            employee,
            date,
            slot,
        } => match scheduler.assign_shift(EmployeeId::new(employee), &date, slot) {
            Ok(receipt) => {
                println!(
                    "assignment {} : {} slot {} → employee {}",
                    receipt.id.get(),
                    receipt.date,
                    receipt.slot,
                    receipt.employee
                );
                0
            }
            Err(err) => rejection_code(err)?,
        },
        Commands::Remove {
            employee,
            date,
            slot,
        } => {
            scheduler.remove_shift(EmployeeId::new(employee), &date, slot)?;
            println!("removed");
            0
        }
        Commands::Shifts {
            employee,
            from,
            to,
            out_csv,
        } => {
            let range = from.zip(to);
            let shifts = scheduler.list_shifts(EmployeeId::new(employee), range)?;
            if let Some(path) = out_csv {
                let employees = scheduler.store().list_employees()?;
                io::export_shifts_csv(path, &shifts, &employees)?;
            }
            for s in &shifts {
                let (start, end) = s.number.window_on(s.date);
                println!(
                    "{} | slot {} | {} → {} | {}",
                    s.date,
                    s.number,
                    start.to_rfc3339(),
                    end.to_rfc3339(),
                    s.role
                );
            }
            0
        }
        Commands::Availability {
            start,
            days,
            out_json,
        } => {
            let grid = scheduler.availability(&start, days)?;
            if let Some(path) = out_json {
                io::export_availability_json(path, &grid)?;
            }
            for day in &grid {
                for slot in &day.slots {
                    let cells: Vec<String> = slot
                        .roles
                        .iter()
                        .map(|r| format!("{}={}", r.role, r.remaining))
                        .collect();
                    println!("{} | slot {} | {}", day.date, slot.slot, cells.join(" "));
                }
            }
            0
        }
        Commands::OnCall { at, buffer_minutes } => {
            let buffer = Duration::try_minutes(buffer_minutes)
                .context("--buffer-minutes out of range")?;
            let on_duty = match at {
                Some(at) => scheduler.on_call(at, buffer)?,
                None => scheduler.on_call_now(buffer)?,
            };
            if on_duty.is_empty() {
                println!("nobody on duty");
            }
            for e in &on_duty {
                println!("{} | {} | {}", e.id, e.name, e.role);
            }
            0
        }
    };

    std::process::exit(code);
}

/// Code 2 = refus métier (créneau plein, doublon, …) ; le reste est une vraie erreur.
fn rejection_code(err: SchedError) -> Result<i32> {
    match err.class() {
        ErrorClass::Rejection => {
            eprintln!("rejected: {err}");
            Ok(2)
        }
        _ => Err(err.into()),
    }
}
