use anyhow::Result;
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;

use api::ApiClient;
use shared::codec;
use shared::{
    AccountStatus, AccountType, AdminAccount, AdminAccountPatch, DeliveryMethod, EmailAccount,
    EmailAccountPatch, NewAdminAccount, NewEmailAccount, PaymentMethod, Provider,
    ReminderFrequency,
};

// Default server URL
const DEFAULT_SERVER: &str = "http://127.0.0.1:8080";

#[derive(Parser)]
#[command(name = "wam")]
#[command(about = "Workspace admin manager - console for admin accounts and their secondary emails")]
struct Cli {
    /// Server URL (overrides config)
    #[arg(long)]
    server: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage workspace admin accounts
    Admins {
        #[command(subcommand)]
        action: AdminAction,
    },
    /// Manage secondary email accounts
    Emails {
        #[command(subcommand)]
        action: EmailAction,
    },
    /// Import admins and secondary emails from a CSV file
    Import {
        /// CSV file with admin_email/admin_name/secondary_email/provider columns
        file: PathBuf,
    },
    /// Export all admin accounts to a CSV file
    Export {
        /// Output path (defaults to workspace_admins_<date>.csv)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum AdminAction {
    /// List admin accounts, with optional search and facet filters
    List {
        /// Case-insensitive search over admin fields and owned emails
        #[arg(long, default_value = "")]
        search: String,
        /// all, automatic or manual
        #[arg(long, default_value = "all")]
        payment_method: String,
        /// all, google or microsoft
        #[arg(long, default_value = "all")]
        provider: String,
    },
    /// Show one admin account with its email accounts
    Show { id: String },
    /// Create an admin account
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "google")]
        provider: Provider,
        /// May be repeated; each creates a secondary email account
        #[arg(long = "secondary-email")]
        secondary_emails: Vec<String>,
        #[arg(long)]
        billing_date: Option<NaiveDate>,
        #[arg(long)]
        payment_method: Option<PaymentMethod>,
        #[arg(long)]
        billing_amount: Option<f64>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update fields of an admin account; omitted flags stay unchanged
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        provider: Option<Provider>,
        #[arg(long)]
        status: Option<AccountStatus>,
        #[arg(long)]
        billing_date: Option<NaiveDate>,
        #[arg(long)]
        payment_method: Option<PaymentMethod>,
        #[arg(long)]
        billing_amount: Option<f64>,
        #[arg(long)]
        num_secondary_accounts: Option<u32>,
        #[arg(long)]
        enable_reminders: Option<bool>,
        #[arg(long)]
        reminder_frequency: Option<ReminderFrequency>,
        #[arg(long)]
        delivery_method: Option<DeliveryMethod>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an admin account and all of its email accounts
    Delete { id: String },
}

#[derive(Subcommand)]
enum EmailAction {
    /// List email accounts, optionally scoped to one admin
    List {
        #[arg(long)]
        admin_id: Option<String>,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Create an email account under an existing admin
    Create {
        #[arg(long)]
        admin_id: String,
        #[arg(long)]
        email: String,
        #[arg(long, default_value = "google")]
        provider: Provider,
        #[arg(long, default_value = "secondary")]
        account_type: AccountType,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Update fields of an email account; omitted flags stay unchanged
    Update {
        id: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        provider: Option<Provider>,
        #[arg(long)]
        status: Option<AccountStatus>,
        #[arg(long)]
        account_type: Option<AccountType>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete an email account
    Delete { id: String },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Set a configuration value
    Set {
        /// Configuration key (server)
        key: String,
        /// Configuration value
        value: String,
    },
    /// Get a configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Show all configuration
    Show,
    /// Get the config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wam=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    if let Commands::Config { action } = &cli.command {
        return handle_config(action);
    }

    let config = config::Config::load()?;
    let server = cli
        .server
        .or(config.server)
        .unwrap_or_else(|| DEFAULT_SERVER.to_string());
    tracing::debug!("Using server {}", server);
    let client = ApiClient::new(server);

    match cli.command {
        Commands::Admins { action } => handle_admins(&client, action).await,
        Commands::Emails { action } => handle_emails(&client, action).await,
        Commands::Import { file } => handle_import(&client, &file).await,
        Commands::Export { output } => handle_export(&client, output).await,
        Commands::Config { .. } => unreachable!("handled above"),
    }
}

async fn handle_admins(client: &ApiClient, action: AdminAction) -> Result<()> {
    match action {
        AdminAction::List {
            search,
            payment_method,
            provider,
        } => {
            let admins = client.list_admins(&search, &payment_method, &provider).await?;
            if admins.is_empty() {
                println!("No admin accounts found matching your criteria");
            } else {
                print_admins(&admins);
            }
        }
        AdminAction::Show { id } => {
            let detail = client.get_admin(&id).await?;
            print_admins(std::slice::from_ref(&detail.admin));
            if !detail.email_accounts.is_empty() {
                println!();
                print_emails(&detail.email_accounts);
            }
        }
        AdminAction::Create {
            name,
            email,
            provider,
            secondary_emails,
            billing_date,
            payment_method,
            billing_amount,
            notes,
        } => {
            let req = NewAdminAccount {
                name,
                email,
                provider,
                status: AccountStatus::Active,
                billing_date,
                payment_method,
                billing_amount,
                num_secondary_accounts: None,
                enable_reminders: None,
                reminder_frequency: None,
                delivery_method: None,
                notes,
                secondary_emails,
            };
            let admin = client.create_admin(&req).await?;
            println!("Created admin account {} <{}> ({})", admin.name, admin.email, admin.id);
        }
        AdminAction::Update {
            id,
            name,
            email,
            provider,
            status,
            billing_date,
            payment_method,
            billing_amount,
            num_secondary_accounts,
            enable_reminders,
            reminder_frequency,
            delivery_method,
            notes,
        } => {
            let patch = AdminAccountPatch {
                name,
                email,
                provider,
                status,
                billing_date,
                payment_method,
                billing_amount,
                num_secondary_accounts,
                enable_reminders,
                reminder_frequency,
                delivery_method,
                notes,
            };
            let admin = client.update_admin(&id, &patch).await?;
            println!("Updated admin account {} <{}>", admin.name, admin.email);
        }
        AdminAction::Delete { id } => {
            client.delete_admin(&id).await?;
            println!("Deleted admin account {id} and its email accounts");
        }
    }
    Ok(())
}

async fn handle_emails(client: &ApiClient, action: EmailAction) -> Result<()> {
    match action {
        EmailAction::List { admin_id, search } => {
            let emails = client.list_emails(admin_id.as_deref(), &search).await?;
            if emails.is_empty() {
                println!("No email accounts found matching your criteria");
            } else {
                print_emails(&emails);
            }
        }
        EmailAction::Create {
            admin_id,
            email,
            provider,
            account_type,
            notes,
        } => {
            let req = NewEmailAccount {
                admin_id,
                email,
                provider,
                status: AccountStatus::Active,
                account_type,
                notes,
            };
            let account = client.create_email(&req).await?;
            println!("Created email account {} ({})", account.email, account.id);
        }
        EmailAction::Update {
            id,
            email,
            provider,
            status,
            account_type,
            notes,
        } => {
            let patch = EmailAccountPatch {
                email,
                provider,
                status,
                account_type,
                notes,
            };
            let account = client.update_email(&id, &patch).await?;
            println!("Updated email account {}", account.email);
        }
        EmailAction::Delete { id } => {
            client.delete_email(&id).await?;
            println!("Deleted email account {id}");
        }
    }
    Ok(())
}

async fn handle_import(client: &ApiClient, file: &PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(file)?;
    let summary = client.import_csv(text).await?;
    println!(
        "Imported {} admin accounts and {} email accounts ({} rows skipped)",
        summary.admins_created, summary.emails_created, summary.rows_skipped
    );
    Ok(())
}

async fn handle_export(client: &ApiClient, output: Option<PathBuf>) -> Result<()> {
    let csv = client.export_csv().await?;
    let path = output.unwrap_or_else(|| {
        PathBuf::from(codec::export_filename(Local::now().date_naive()))
    });
    std::fs::write(&path, csv)?;
    println!("Exported admin accounts to {}", path.display());
    Ok(())
}

fn handle_config(action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Set { key, value } => {
            let mut config = config::Config::load()?;
            match key.as_str() {
                "server" => config.server = Some(value.clone()),
                _ => anyhow::bail!("Unknown config key: {key}"),
            }
            config.save()?;
            println!("Set {key} = {value}");
        }
        ConfigAction::Get { key } => {
            let config = config::Config::load()?;
            match key.as_str() {
                "server" => println!("{}", config.server.as_deref().unwrap_or(DEFAULT_SERVER)),
                _ => anyhow::bail!("Unknown config key: {key}"),
            }
        }
        ConfigAction::Show => {
            let config = config::Config::load()?;
            println!("server = {}", config.server.as_deref().unwrap_or(DEFAULT_SERVER));
        }
        ConfigAction::Path => {
            println!("{}", config::Config::config_path()?.display());
        }
    }
    Ok(())
}

fn print_admins(admins: &[AdminAccount]) {
    println!(
        "{:<36}  {:<20}  {:<28}  {:<10}  {:<8}  {}",
        "ID", "NAME", "EMAIL", "PROVIDER", "STATUS", "PAYMENT"
    );
    for admin in admins {
        let payment = admin
            .payment_method
            .map(|pm| pm.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<36}  {:<20}  {:<28}  {:<10}  {:<8}  {}",
            admin.id, admin.name, admin.email, admin.provider, admin.status, payment
        );
    }
}

fn print_emails(emails: &[EmailAccount]) {
    println!(
        "{:<36}  {:<28}  {:<10}  {:<8}  {:<9}  {}",
        "ID", "EMAIL", "PROVIDER", "STATUS", "TYPE", "ADMIN"
    );
    for email in emails {
        println!(
            "{:<36}  {:<28}  {:<10}  {:<8}  {:<9}  {}",
            email.id, email.email, email.provider, email.status, email.account_type, email.admin_id
        );
    }
}
