use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::filter::Directive;

use restock_watcher::plugins::notifiers::EmailNotifier;
use restock_watcher::plugins::{CheckerRegistry, Notifier};
use restock_watcher::{AppConfig, Monitor, StatusStore};

#[derive(Parser, Debug)]
#[command(name = "restock-watcher", version, about = "Email me when a product comes back in stock")]
struct Cli {
    /// Config file (defaults to config/watcher.toml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the status file location
    #[arg(long)]
    status_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check every configured product once (default)
    Run,
    /// Verify the SMTP login, optionally sending a test message
    TestEmail {
        #[arg(long)]
        send: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();

    // Initialize tracing
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "restock_watcher=info".parse::<Directive>() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(path) = cli.status_file {
        config.status.path = path;
    }

    let notifier = EmailNotifier::new(config.email.clone());

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => {
            info!("🚀 Starting product monitor...");
            info!("⏰ Time: {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));

            let checkers = CheckerRegistry::with_default_checkers(&config.scraper)?;
            info!(
                "Policies: {}; alerts via {}",
                checkers.list_policy_types().join(", "),
                notifier.name()
            );
            let monitor = Monitor::new(
                config.products,
                checkers,
                Arc::new(notifier),
                StatusStore::new(config.status.path),
            );

            let summary = monitor.run().await.context("Run aborted")?;
            println!("{}", summary);
            info!("🏁 Monitor completed!");
            Ok(ExitCode::SUCCESS)
        }
        Command::TestEmail { send } => {
            info!("Testing SMTP login to {}:{}", config.email.smtp_host, config.email.smtp_port);
            let mut ok = notifier.test_connection().await;
            if ok && send {
                ok = notifier.send_test_email().await;
            }

            if ok {
                println!("✅ Email configuration works");
                Ok(ExitCode::SUCCESS)
            } else {
                println!("❌ Email configuration failed, see log output");
                Ok(ExitCode::FAILURE)
            }
        }
    }
}
