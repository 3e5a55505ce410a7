use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::application::{Registration, Services};
use crate::domain::{format_cents, parse_cents, NewOperation, OperationType, UserInfo};
use crate::io::Exporter;

/// Casher - Personal Finance Ledger
#[derive(Parser)]
#[command(name = "casher")]
#[command(about = "Record deposits and withdrawals and browse your history")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "CASHER_DATABASE", default_value = "casher.db")]
    pub database: String,

    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Login and password of the acting user.
#[derive(Args)]
pub struct Credentials {
    /// Login
    #[arg(short, long, env = "CASHER_LOGIN")]
    pub login: String,

    /// Password
    #[arg(short, long, env = "CASHER_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Register a new user
    Register {
        #[command(flatten)]
        credentials: Credentials,

        /// Password again (defaults to --password)
        #[arg(long)]
        confirm: Option<String>,

        /// Display name
        #[arg(short, long)]
        name: String,

        /// Birth date (YYYY-MM-DD)
        #[arg(short, long)]
        birth: String,
    },

    /// Show the current user and balance
    Whoami {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Record a deposit
    Deposit {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// What the money is for
        #[arg(short, long)]
        subject: String,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        message: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Record a withdrawal
    Withdraw {
        /// Amount (e.g., "50.00" or "50")
        amount: String,

        /// What the money is for
        #[arg(short, long)]
        subject: String,

        /// Free-text note
        #[arg(short, long, default_value = "")]
        message: String,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show a page of operations, newest first
    History {
        /// Page number (0 shows everything)
        #[arg(long, default_value = "1")]
        page: u32,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Show the balance computed from all operations
    Balance {
        #[command(flatten)]
        credentials: Credentials,
    },

    /// Remove an operation
    Remove {
        /// Operation ID
        id: i64,

        #[command(flatten)]
        credentials: Credentials,
    },

    /// Export the full history
    Export {
        /// Output format
        #[arg(short, long, value_enum, default_value = "csv")]
        format: ExportFormat,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,

        #[command(flatten)]
        credentials: Credentials,
    },
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Init => "init",
            Commands::Register { .. } => "register",
            Commands::Whoami { .. } => "whoami",
            Commands::Deposit { .. } => "deposit",
            Commands::Withdraw { .. } => "withdraw",
            Commands::History { .. } => "history",
            Commands::Balance { .. } => "balance",
            Commands::Remove { .. } => "remove",
            Commands::Export { .. } => "export",
        }
    }
}

impl Cli {
    /// Default log filter for this invocation (`RUST_LOG` overrides it).
    pub fn log_filter(&self) -> &'static str {
        if self.verbose { "casher=debug" } else { "casher=info" }
    }

    pub async fn run(self) -> Result<()> {
        let span = tracing::info_span!("command", name = self.command.name());

        let services = match self.command {
            Commands::Init => Services::init(&self.database).await?,
            _ => Services::connect(&self.database).await.with_context(|| {
                format!("Cannot open {} (run `casher init` first?)", self.database)
            })?,
        }
        .with_span(span);

        match self.command {
            Commands::Init => {
                println!("Database initialized: {}", self.database);
            }

            Commands::Register {
                credentials,
                confirm,
                name,
                birth,
            } => {
                let birth = parse_date(&birth).context("Invalid birth date")?;
                let confirm_password = confirm.unwrap_or_else(|| credentials.password.clone());
                let user = services
                    .users
                    .register(Registration {
                        login: credentials.login,
                        password: credentials.password,
                        confirm_password,
                        name,
                        birth,
                    })
                    .await?;
                println!("Registered {} (id {})", user.login, user.id);
            }

            Commands::Whoami { credentials } => {
                let info = authenticate(&services, &credentials).await?;
                let today = Local::now().date_naive();
                println!("Login:   {}", info.user.login);
                println!("Name:    {}", info.user.name);
                println!("Age:     {}", info.user.age(today));
                println!("Balance: {}", format_cents(info.balance));
            }

            Commands::Deposit {
                amount,
                subject,
                message,
                credentials,
            } => {
                run_record_command(
                    &services,
                    &credentials,
                    OperationType::Deposit,
                    &amount,
                    subject,
                    message,
                )
                .await?;
            }

            Commands::Withdraw {
                amount,
                subject,
                message,
                credentials,
            } => {
                run_record_command(
                    &services,
                    &credentials,
                    OperationType::Withdraw,
                    &amount,
                    subject,
                    message,
                )
                .await?;
            }

            Commands::History { page, credentials } => {
                let info = authenticate(&services, &credentials).await?;
                run_history_command(&services, &info, page).await?;
            }

            Commands::Balance { credentials } => {
                let info = authenticate(&services, &credentials).await?;
                let totals = services.operations.totals(info.user.id).await?;
                println!("Deposited: {:>12}", format_cents(totals.deposited));
                println!("Withdrawn: {:>12}", format_cents(totals.withdrawn));
                println!("Balance:   {:>12}", format_cents(info.balance));
            }

            Commands::Remove { id, credentials } => {
                let info = authenticate(&services, &credentials).await?;
                if services.operations.remove(info.user.id, id).await? {
                    println!("Removed operation {}", id);
                } else {
                    println!("No operation {} to remove", id);
                }
            }

            Commands::Export {
                format,
                output,
                credentials,
            } => {
                let info = authenticate(&services, &credentials).await?;
                run_export_command(&services, &info, format, output).await?;
            }
        }

        Ok(())
    }
}

async fn authenticate(services: &Services, credentials: &Credentials) -> Result<UserInfo> {
    Ok(services
        .users
        .authenticate(&credentials.login, &credentials.password)
        .await?)
}

async fn run_record_command(
    services: &Services,
    credentials: &Credentials,
    operation_type: OperationType,
    amount: &str,
    subject: String,
    message: String,
) -> Result<()> {
    let amount_cents = parse_cents(amount).context("Invalid amount")?;
    let info = authenticate(services, credentials).await?;

    let operation = services
        .operations
        .create(
            NewOperation::new(info.user.id, operation_type, amount_cents, subject)
                .with_message(message),
        )
        .await?;
    let balance = services.users.balance(info.user.id).await?;

    println!(
        "Recorded {} #{}: {}",
        operation.operation_type,
        operation.id,
        format_cents(operation.amount_cents)
    );
    println!("Balance: {}", format_cents(balance));
    Ok(())
}

async fn run_history_command(services: &Services, info: &UserInfo, page: u32) -> Result<()> {
    let result = services.operations.list(info.user.id, page).await?;

    if result.is_empty() {
        if page > 1 {
            println!("No operations on page {}.", page);
        } else {
            println!("No operations yet.");
        }
        return Ok(());
    }

    println!(
        "{:>6} {:<17} {:<9} {:>12} {:<20} MESSAGE",
        "ID", "DATE", "TYPE", "AMOUNT", "SUBJECT"
    );
    println!("{}", "-".repeat(80));
    for operation in &result.operations {
        let signed = format_cents(operation.signed_amount());
        println!(
            "{:>6} {:<17} {:<9} {:>12} {:<20} {}",
            operation.id,
            operation.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
            operation.operation_type,
            signed,
            truncate(&operation.subject, 20),
            truncate(&operation.message, 30)
        );
    }
    println!();

    if page > 0 {
        let mut nav = vec![format!("Page {}", page)];
        if page > 1 {
            nav.push(format!("previous: --page {}", page - 1));
        }
        if result.has_more {
            nav.push(format!("next: --page {}", page + 1));
        }
        println!("{}", nav.join(" | "));
    }
    println!("Balance: {}", format_cents(info.balance));
    Ok(())
}

async fn run_export_command(
    services: &Services,
    info: &UserInfo,
    format: ExportFormat,
    output: Option<String>,
) -> Result<()> {
    let exporter = Exporter::new(&services.operations);

    let writer: Box<dyn std::io::Write> = match &output {
        Some(path) => Box::new(
            std::fs::File::create(path).with_context(|| format!("Failed to create {}", path))?,
        ),
        None => Box::new(std::io::stdout()),
    };

    let count = match format {
        ExportFormat::Csv => exporter.export_history_csv(info, writer).await?,
        ExportFormat::Json => exporter.export_history_json(info, writer).await?.operations.len(),
    };

    if let Some(path) = output {
        eprintln!("Exported {} operation(s) to {}", count, path);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

fn parse_date(date_str: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Expected YYYY-MM-DD, got '{}'", date_str))
}
