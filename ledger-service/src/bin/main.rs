use ledger_service::{
    EmailSender, HttpEmailSender, LedgerService, LedgerServiceConfig, NotificationConfig,
    SmsSender, TwilioSmsSender,
};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Ledger Service CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Set the log level
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Commands
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Channel {
    Email,
    Sms,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the table and load the fund catalog
    Init {
        /// Database URL
        #[arg(short, long)]
        database_url: Option<String>,

        /// Database pool size
        #[arg(short, long)]
        pool_size: Option<u32>,

        /// Table name
        #[arg(short, long)]
        table: Option<String>,
    },
    /// Compare a client's stored balance with its transaction log
    Audit {
        /// Client ID
        client_id: String,
    },
    /// Send a test notification through one channel
    NotifyTest {
        /// Channel to use
        #[arg(value_enum)]
        channel: Channel,

        /// Email address or phone number
        to: String,

        /// Message body
        #[arg(default_value = "Test notification from the fund ledger")]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Parse command line arguments
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "ledger_service={},common={}",
            cli.log_level, cli.log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match cli.command {
        Commands::Init { database_url, pool_size, table } => {
            let defaults = LedgerServiceConfig::from_env();
            let config = LedgerServiceConfig {
                database_url: database_url.unwrap_or(defaults.database_url),
                db_pool_size: pool_size.unwrap_or(defaults.db_pool_size),
                table_name: table.unwrap_or(defaults.table_name),
                ..defaults
            };

            info!("Initializing table {} with pool size {}", config.table_name, config.db_pool_size);

            let service = LedgerService::with_config(&config).await?;
            let report = service.initialize().await?;

            info!(
                "Initialization finished: table created: {}, funds loaded: {}",
                report.table_created, report.funds_loaded
            );
        }
        Commands::Audit { client_id } => {
            let service = LedgerService::with_config(&LedgerServiceConfig::from_env()).await?;
            let audit = service.audit_balance(&client_id).await?;

            println!("{}", serde_json::to_string_pretty(&audit)?);
            if !audit.consistent {
                error!("Client {} balance does not match its ledger", client_id);
                std::process::exit(3);
            }
        }
        Commands::NotifyTest { channel, to, message } => {
            let config = NotificationConfig::from_env();
            info!("Notifications enabled: {}", config.enabled);

            let status = match channel {
                Channel::Email => {
                    HttpEmailSender::new(config.enabled, config.email)
                        .send_email(&to, "Test notification", &message)
                        .await
                }
                Channel::Sms => {
                    TwilioSmsSender::new(config.enabled, config.sms)
                        .send_sms(&to, &message)
                        .await
                }
            };

            println!("Delivered: {}", status.delivered);
            println!("Info: {}", status.info);
            if !status.delivered {
                std::process::exit(3);
            }
        }
    }

    Ok(())
}
