//! `orderbridge` command-line entry point.
//!
//! ```bash
//! orderbridge sync order.json
//! orderbridge status order.json
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;

use orderbridge_accounting::{
    Account, AccountingClient, HttpAccountingClient, HttpClientConfig, InMemoryAccounting,
};
use orderbridge_commerce::Order;
use orderbridge_infra::{InMemoryLinkStore, LinkStore, PostgresLinkStore};
use orderbridge_sync::{AccountRole, OrderSync, PaymentOutcome, SyncSettings};

/// Sync storefront orders into the accounting service.
#[derive(Parser)]
#[command(name = "orderbridge", about = "Sync storefront orders into the accounting service", long_about = None)]
struct Cli {
    /// Use an in-memory accounting service instead of the remote API.
    #[arg(long, global = true)]
    dry_run: bool,

    /// Postgres URL for the order/invoice link table.
    #[arg(long, env = "DATABASE_URL", global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the contact, invoice and payment for an order.
    Sync {
        /// Order as JSON.
        order: PathBuf,
    },
    /// Report whether an order has already been invoiced.
    Status {
        /// Order as JSON.
        order: PathBuf,
    },
}

type Pipeline = OrderSync<Arc<dyn AccountingClient>, Arc<dyn LinkStore>>;

fn main() -> ExitCode {
    orderbridge_observability::init();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            let message = format!("{err:#}");
            tracing::error!(error = %message, "orderbridge failed");
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let settings = SyncSettings::from_env().context("loading sync settings")?;
    let client = accounting_client(cli.dry_run, &settings)?;
    let links = link_store(cli.database_url.as_deref())?;
    let pipeline: Pipeline = OrderSync::new(client, links, settings).context("invalid sync settings")?;

    match cli.command {
        Command::Sync { order } => sync(&pipeline, &read_order(&order)?),
        Command::Status { order } => status(&pipeline, &read_order(&order)?),
    }
}

fn sync(pipeline: &Pipeline, order: &Order) -> Result<ExitCode> {
    let report = match pipeline.sync_order(order) {
        Ok(report) => report,
        Err(err) => {
            print_json(&json!({
                "order_id": order.id,
                "status": "failed",
                "stage": err.stage().map(|s| s.as_str()),
                "code": err.remote_code(),
                "error": err.to_string(),
            }))?;
            return Ok(ExitCode::FAILURE);
        }
    };

    let payment = match &report.payment {
        PaymentOutcome::Recorded(payment) => json!({ "status": "recorded", "amount": payment.amount }),
        PaymentOutcome::Skipped(reason) => json!({ "status": "skipped", "reason": format!("{reason:?}") }),
        PaymentOutcome::Failed(err) => json!({ "status": "failed", "error": err.to_string() }),
    };
    print_json(&json!({
        "order_id": report.order_id,
        "status": "synced",
        "contact": report.contact.name,
        "invoice_id": report.invoice.id,
        "invoice_number": report.invoice.invoice_number,
        "total": report.invoice.total,
        "payment": payment,
    }))?;
    Ok(ExitCode::SUCCESS)
}

fn status(pipeline: &Pipeline, order: &Order) -> Result<ExitCode> {
    let link = pipeline.invoice_link(order.id)?;
    print_json(&json!({
        "order_id": order.id,
        "invoiced": link.is_some(),
        "invoice_id": link.as_ref().map(|l| l.invoice_id),
        "linked_at": link.as_ref().map(|l| l.created_at),
    }))?;
    Ok(ExitCode::SUCCESS)
}

fn accounting_client(dry_run: bool, settings: &SyncSettings) -> Result<Arc<dyn AccountingClient>> {
    if dry_run {
        tracing::info!("dry run: using in-memory accounting service");
        let receivable = settings.account_code(AccountRole::AccountsReceivable);
        let mut service = InMemoryAccounting::new();
        if !receivable.is_empty() {
            service = service.with_account(Account::new(receivable, "Accounts Receivable"));
        }
        return Ok(Arc::new(service));
    }

    let config = HttpClientConfig::from_env().context("accounting client is not configured")?;
    Ok(Arc::new(HttpAccountingClient::new(config)?))
}

fn link_store(database_url: Option<&str>) -> Result<Arc<dyn LinkStore>> {
    match database_url {
        Some(url) => {
            let store = PostgresLinkStore::connect(url).context("connecting to link store")?;
            Ok(Arc::new(store))
        }
        None => {
            tracing::warn!("DATABASE_URL not set; invoice links will not outlive this process");
            Ok(Arc::new(InMemoryLinkStore::new()))
        }
    }
}

fn read_order(path: &Path) -> Result<Order> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading order from {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing order in {}", path.display()))
}

fn print_json(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
