use std::fs::File;
use std::io::{self, Write};

use anyhow::{bail, Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use crate::application::BillingService;
use crate::domain::{format_cents, parse_cents};
use crate::io::Exporter;

/// Factura - Billing Ledger
#[derive(Parser)]
#[command(name = "factura")]
#[command(about = "A local-first billing ledger for services, bills and line items")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "factura.db")]
    pub database: String,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Service catalog commands
    #[command(subcommand)]
    Service(ServiceCommands),

    /// Bill management commands
    #[command(subcommand)]
    Bill(BillCommands),

    /// Bill line commands
    #[command(subcommand)]
    Line(LineCommands),

    /// Billing address commands
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Verify ledger consistency
    Check,

    /// Export data to CSV or JSON
    Export {
        /// What to export: services, bills, lines, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum ServiceCommands {
    /// Add a service to the catalog
    Add {
        /// Short reference code (must be unique, e.g. "WEB01")
        reference: String,

        /// Service name
        name: String,

        /// Unit price (e.g., "19.99" or "20")
        #[arg(short, long)]
        price: String,

        /// Description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// List all catalog services
    List,

    /// Show a single service
    Show {
        /// Service reference code
        reference: String,
    },
}

#[derive(Subcommand)]
pub enum BillCommands {
    /// Create a new bill (the number is assigned automatically)
    Create {
        /// Owner of the bill
        user: String,

        /// Billing date (ISO 8601 format: YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List bills
    List {
        /// Filter by owner
        #[arg(long)]
        user: Option<String>,

        /// Only show unpaid bills
        #[arg(long)]
        unpaid: bool,
    },

    /// Show a bill with its lines
    Show {
        /// Bill number
        number: String,
    },

    /// Mark a bill as paid
    Pay {
        /// Bill number
        number: String,
    },

    /// Mark a bill as unpaid
    Unpay {
        /// Bill number
        number: String,
    },

    /// Delete a bill and its lines
    Delete {
        /// Bill number
        number: String,
    },
}

#[derive(Subcommand)]
pub enum LineCommands {
    /// Add a line to a bill
    Add {
        /// Bill number
        bill: String,

        /// Service reference code
        service: String,

        /// Quantity
        #[arg(short, long, default_value = "1")]
        quantity: i64,

        /// Explicit total, overriding price x quantity (e.g., "15.00")
        #[arg(short, long)]
        total: Option<String>,
    },

    /// Update a line's quantity or total
    Update {
        /// Line ID
        id: String,

        /// New quantity
        #[arg(short, long)]
        quantity: Option<i64>,

        /// New total ("0" clears a manual override and recomputes)
        #[arg(short, long)]
        total: Option<String>,
    },

    /// Remove a line from its bill
    Remove {
        /// Line ID
        id: String,
    },
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Set the billing address for a user
    Set {
        /// User identifier
        user: String,

        /// Billing address
        address: String,
    },

    /// Show the billing address for a user
    Show {
        /// User identifier
        user: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                BillingService::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Service(service_cmd) => {
                let service = BillingService::connect(&self.database).await?;
                run_service_command(&service, service_cmd).await?;
            }

            Commands::Bill(bill_cmd) => {
                let service = BillingService::connect(&self.database).await?;
                run_bill_command(&service, bill_cmd).await?;
            }

            Commands::Line(line_cmd) => {
                let service = BillingService::connect(&self.database).await?;
                run_line_command(&service, line_cmd, self.verbose).await?;
            }

            Commands::Profile(profile_cmd) => {
                let service = BillingService::connect(&self.database).await?;
                run_profile_command(&service, profile_cmd).await?;
            }

            Commands::Check => {
                let service = BillingService::connect(&self.database).await?;
                run_check_command(&service).await?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = BillingService::connect(&self.database).await?;
                run_export_command(&service, &export_type, output.as_deref()).await?;
            }
        }

        Ok(())
    }
}

async fn run_service_command(service: &BillingService, command: ServiceCommands) -> Result<()> {
    match command {
        ServiceCommands::Add {
            reference,
            name,
            price,
            description,
        } => {
            let price_cents =
                parse_cents(&price).context("Invalid price format. Use '19.99' or '20'")?;

            let created = service
                .create_service(reference, name, description, price_cents)
                .await?;

            println!(
                "Created service {}: {} ({})",
                created.reference,
                created.name,
                format_cents(created.price_cents)
            );
        }

        ServiceCommands::List => {
            let services = service.list_services().await?;
            if services.is_empty() {
                println!("No services in the catalog.");
                return Ok(());
            }

            println!("{:<8} {:<32} {:>10}", "REF", "NAME", "PRICE");
            for svc in services {
                println!(
                    "{:<8} {:<32} {:>10}",
                    svc.reference,
                    svc.name,
                    format_cents(svc.price_cents)
                );
            }
        }

        ServiceCommands::Show { reference } => {
            let svc = service.get_service(&reference).await?;
            println!("Reference:   {}", svc.reference);
            println!("Name:        {}", svc.name);
            if !svc.description.is_empty() {
                println!("Description: {}", svc.description);
            }
            println!("Price:       {}", format_cents(svc.price_cents));
            println!("Created:     {}", svc.created_at.format("%Y-%m-%d %H:%M"));
        }
    }

    Ok(())
}

async fn run_bill_command(service: &BillingService, command: BillCommands) -> Result<()> {
    match command {
        BillCommands::Create { user, date } => {
            let billing_date = match date {
                Some(date_str) => parse_date(&date_str)?,
                None => Utc::now().date_naive(),
            };

            let bill = service.create_bill(user, billing_date).await?;
            println!(
                "Created bill {} for {} ({})",
                bill.number.as_deref().unwrap_or("?"),
                bill.user,
                bill.billing_date
            );
        }

        BillCommands::List { user, unpaid } => {
            let bills = service.list_bills(user.as_deref(), unpaid).await?;
            if bills.is_empty() {
                println!("No bills found.");
                return Ok(());
            }

            println!(
                "{:<12} {:<16} {:<12} {:>10}  {}",
                "NUMBER", "USER", "DATE", "AMOUNT", "STATUS"
            );
            for bill in bills {
                println!(
                    "{:<12} {:<16} {:<12} {:>10}  {}",
                    bill.number.as_deref().unwrap_or("?"),
                    bill.user,
                    bill.billing_date.to_string(),
                    format_cents(bill.amount_cents),
                    if bill.is_paid { "paid" } else { "unpaid" }
                );
            }
        }

        BillCommands::Show { number } => {
            let detail = service.get_bill(&number).await?;
            let bill = &detail.bill;

            println!("Bill:    {}", bill.number.as_deref().unwrap_or("?"));
            println!("User:    {}", bill.user);
            println!("Date:    {}", bill.billing_date);
            println!("Status:  {}", if bill.is_paid { "paid" } else { "unpaid" });
            println!("Amount:  {}", format_cents(bill.amount_cents));

            if detail.lines.is_empty() {
                println!("\n(no lines)");
            } else {
                println!(
                    "\n{:<36} {:<8} {:<24} {:>4} {:>10}",
                    "LINE ID", "REF", "SERVICE", "QTY", "TOTAL"
                );
                for line in &detail.lines {
                    println!(
                        "{:<36} {:<8} {:<24} {:>4} {:>10}",
                        line.line.id.to_string(),
                        line.service_reference,
                        line.service_name,
                        line.line.quantity,
                        format_cents(line.line.total_cents)
                    );
                }
            }
        }

        BillCommands::Pay { number } => {
            let bill = service.set_paid(&number, true).await?;
            println!(
                "Marked {} as paid ({})",
                number,
                format_cents(bill.amount_cents)
            );
        }

        BillCommands::Unpay { number } => {
            service.set_paid(&number, false).await?;
            println!("Marked {} as unpaid", number);
        }

        BillCommands::Delete { number } => {
            let bill = service.delete_bill(&number).await?;
            println!(
                "Deleted bill {} ({})",
                number,
                format_cents(bill.amount_cents)
            );
        }
    }

    Ok(())
}

async fn run_line_command(
    service: &BillingService,
    command: LineCommands,
    verbose: bool,
) -> Result<()> {
    match command {
        LineCommands::Add {
            bill,
            service: service_ref,
            quantity,
            total,
        } => {
            let total_cents = total
                .map(|t| parse_cents(&t))
                .transpose()
                .context("Invalid total format. Use '15.00' or '15'")?;

            let result = service
                .add_line(&bill, &service_ref, quantity, total_cents)
                .await?;

            println!(
                "Added {} x {} to {}: line total {} ({})",
                result.line.quantity,
                result.service.reference,
                bill,
                format_cents(result.line.total_cents),
                result.line.id
            );
            report_amount(&result.bill, verbose);
        }

        LineCommands::Update {
            id,
            quantity,
            total,
        } => {
            let line_id =
                Uuid::parse_str(&id).context("Invalid line ID format (expected UUID)")?;
            let total_cents = total
                .map(|t| parse_cents(&t))
                .transpose()
                .context("Invalid total format. Use '15.00' or '15'")?;

            let result = service.update_line(line_id, quantity, total_cents).await?;

            println!(
                "Updated line {}: {} x {} = {}",
                result.line.id,
                result.line.quantity,
                result.service.reference,
                format_cents(result.line.total_cents)
            );
            report_amount(&result.bill, verbose);
        }

        LineCommands::Remove { id } => {
            let line_id =
                Uuid::parse_str(&id).context("Invalid line ID format (expected UUID)")?;

            let bill = service.remove_line(line_id).await?;
            println!("Removed line {}", line_id);
            report_amount(&bill, verbose);
        }
    }

    Ok(())
}

fn report_amount(bill: &crate::domain::Bill, verbose: bool) {
    if verbose {
        eprintln!(
            "[recompute] bill {} amount -> {}",
            bill.number.as_deref().unwrap_or("?"),
            format_cents(bill.amount_cents)
        );
    }
}

async fn run_profile_command(service: &BillingService, command: ProfileCommands) -> Result<()> {
    match command {
        ProfileCommands::Set { user, address } => {
            let profile = service.set_billing_address(user, address).await?;
            println!("Saved billing address for {}", profile.user);
        }

        ProfileCommands::Show { user } => {
            let profile = service.get_profile(&user).await?;
            println!("{}", profile.billing_address);
        }
    }

    Ok(())
}

async fn run_check_command(service: &BillingService) -> Result<()> {
    let report = service.check_integrity().await?;

    println!(
        "Checked {} bill(s), {} line(s)",
        report.bill_count, report.line_count
    );

    if report.is_consistent() {
        println!("Ledger is consistent.");
    } else {
        println!("Found {} issue(s):", report.issues.len());
        for issue in &report.issues {
            println!("  - {}", issue);
        }
    }

    Ok(())
}

async fn run_export_command(
    service: &BillingService,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => Box::new(File::create(path).context("Failed to create output file")?),
        None => Box::new(io::stdout()),
    };

    match export_type {
        "services" => {
            let count = exporter.export_services_csv(writer).await?;
            eprintln!("Exported {} service(s)", count);
        }
        "bills" => {
            let count = exporter.export_bills_csv(writer).await?;
            eprintln!("Exported {} bill(s)", count);
        }
        "lines" => {
            let count = exporter.export_lines_csv(writer).await?;
            eprintln!("Exported {} line(s)", count);
        }
        "full" => {
            let snapshot = exporter.export_full_json(writer).await?;
            eprintln!(
                "Exported {} bill(s), {} line(s), {} service(s)",
                snapshot.bills.len(),
                snapshot.lines.len(),
                snapshot.services.len()
            );
        }
        other => bail!(
            "Unknown export type '{}'. Use: services, bills, lines, full",
            other
        ),
    }

    Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", input))
}
