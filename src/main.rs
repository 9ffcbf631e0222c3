use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use money_manager::{
    load_csv, logging, Config, IncomeService, IncomeSourceView, IncomeView, PersonView, Sex,
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "money-manager", version, about = "Personal income tracker")]
struct Cli {
    /// Database file (overrides MONEY_MANAGER_DB and the config file)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// TOML config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Print JSON instead of a table
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the database and schema
    Init,
    /// List incomes (all, or one zero-based page)
    List {
        #[arg(long)]
        page: Option<u32>,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Show one income
    Show { id: i64 },
    /// Record a new income
    Add(IncomeArgs),
    /// Change an existing income
    Update {
        id: i64,
        #[command(flatten)]
        income: IncomeArgs,
    },
    /// Delete an income (reference data is kept)
    Delete { id: i64 },
    /// Audit trail of one income
    History { id: i64 },
    /// List known persons
    Persons,
    /// List known income sources
    Sources,
    /// Import incomes from CSV (Value_In_Cent,Name,Surname,Sex,Source)
    Import { file: PathBuf },
}

#[derive(Args)]
struct IncomeArgs {
    /// Amount in cents (may be negative)
    #[arg(long, allow_hyphen_values = true)]
    value: i64,
    #[arg(long)]
    name: String,
    #[arg(long)]
    surname: Option<String>,
    #[arg(long)]
    sex: Option<Sex>,
    #[arg(long)]
    source: String,
    #[arg(long)]
    description: Option<String>,
}

impl From<IncomeArgs> for IncomeView {
    fn from(args: IncomeArgs) -> Self {
        IncomeView::new(
            args.value,
            PersonView {
                id: None,
                name: Some(args.name),
                surname: args.surname,
                sex: args.sex,
            },
            IncomeSourceView {
                id: None,
                name: Some(args.source),
                description: args.description,
            },
        )
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(logging::env_filter(logging::CLI_LOG_LEVEL))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref(), cli.db.as_deref())
        .context("Failed to load configuration")?;

    let mut service = IncomeService::open(&config)
        .with_context(|| format!("Failed to open database {}", config.database_path.display()))?;

    match cli.command {
        Command::Init => {
            println!("✓ Database ready: {}", config.database_path.display());
        }
        Command::List { page, size } => {
            let incomes = match (page, size) {
                (None, None) => service.list_all_incomes()?,
                (page, size) => service.list_incomes(
                    page.unwrap_or(0),
                    size.unwrap_or(config.default_page_size),
                )?,
            };
            print_incomes(&incomes, cli.json)?;
        }
        Command::Show { id } => match service.find_income(id)? {
            Some(income) => print_incomes(&[income], cli.json)?,
            None => {
                eprintln!("Income {} not found", id);
                std::process::exit(1);
            }
        },
        Command::Add(args) => {
            let saved = service.add_income(args.into())?;
            print_incomes(&[saved], cli.json)?;
        }
        Command::Update { id, income } => {
            let saved = service.update_income(id, income.into())?;
            print_incomes(&[saved], cli.json)?;
        }
        Command::Delete { id } => {
            service.delete_income(id)?;
            println!("✓ Deleted income {}", id);
        }
        Command::History { id } => {
            let events = service.income_history(id)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                for event in events {
                    println!("{}  {:<16} {}", event.timestamp.to_rfc3339(), event.event_type, event.data);
                }
            }
        }
        Command::Persons => {
            let persons = service.list_persons()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&persons)?);
            } else {
                for p in persons {
                    println!("{:>5}  {}", p.id.unwrap_or_default(), person_label(&p));
                }
            }
        }
        Command::Sources => {
            let sources = service.list_income_sources()?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&sources)?);
            } else {
                for s in sources {
                    println!(
                        "{:>5}  {}  {}",
                        s.id.unwrap_or_default(),
                        s.name.unwrap_or_default(),
                        s.description.unwrap_or_default()
                    );
                }
            }
        }
        Command::Import { file } => {
            let rows = load_csv(&file).with_context(|| format!("Failed to read {}", file.display()))?;
            println!("📂 Loaded {} rows from {}", rows.len(), file.display());

            let summary = service.import_incomes(rows);
            println!("✓ Imported: {}", summary.imported);
            println!("✓ Rejected: {}", summary.rejected);
            for error in &summary.errors {
                eprintln!("   {}", error);
            }
        }
    }

    Ok(())
}

fn print_incomes(incomes: &[IncomeView], json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(incomes)?);
        return Ok(());
    }

    for income in incomes {
        println!(
            "{:>5}  {:>14}  {:<30} {}",
            income.id.unwrap_or_default(),
            format_cents(income.income_value_in_cent),
            person_label(&income.person),
            income.income_source.name.as_deref().unwrap_or_default(),
        );
    }
    Ok(())
}

fn person_label(person: &PersonView) -> String {
    let mut label = person.name.clone().unwrap_or_default();
    if let Some(surname) = &person.surname {
        label.push(' ');
        label.push_str(surname);
    }
    if let Some(sex) = person.sex {
        label.push_str(&format!(" ({})", sex.as_str()));
    }
    label
}

/// 500000 -> "5000.00", -5 -> "-0.05"
fn format_cents(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, abs / 100, abs % 100)
}
