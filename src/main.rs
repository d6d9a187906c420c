use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use pleiades_accounts::config::Configuration;
use pleiades_accounts::{AccountManager, telemetry};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file.
    #[arg(long, short, default_value = "config.yaml")]
    config: PathBuf,
    /// PostgreSQL connection URL, overrides the configuration file.
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Create a regular account.
    CreateUser {
        #[arg(long, short)]
        email: String,
        /// Without password, the account cannot log in until one is set.
        #[arg(long, env = "ACCOUNT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create a staff account with every permission.
    CreateSuperuser {
        #[arg(long, short)]
        email: String,
        #[arg(long, env = "ACCOUNT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Print an account as JSON.
    Show {
        #[arg(long, short)]
        email: String,
    },
    /// Replace the password of an account.
    SetPassword {
        #[arg(long, short)]
        email: String,
        /// Without password, the current one becomes unusable.
        #[arg(long, env = "ACCOUNT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(err) = telemetry::setup_logging("info") {
        eprintln!("cannot initialize logging: {err}");
    }

    let config = Configuration::default().path(args.config).read();
    let manager =
        match pleiades_accounts::initialize(&config, args.database_url.as_deref()).await {
            Ok(manager) => manager,
            Err(err) => {
                tracing::error!(error = %err, "cannot initialize account manager");
                return ExitCode::FAILURE;
            },
        };

    match run(&manager, args.cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!(error = %err, "command failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(
    manager: &AccountManager,
    cmd: Commands,
) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::CreateUser { email, password } => {
            let account = manager.create_user(&email, password.as_deref()).await?;
            println!("Account {account} has been created.");
        },
        Commands::CreateSuperuser { email, password } => {
            let account = manager.create_superuser(&email, &password).await?;
            println!("Superuser {account} has been created.");
        },
        Commands::Show { email } => match manager.get_by_natural_key(&email).await? {
            Some(account) => println!("{}", serde_json::to_string_pretty(&account)?),
            None => return Err(format!("no account for {email:?}").into()),
        },
        Commands::SetPassword { email, password } => {
            let Some(mut account) = manager.get_by_natural_key(&email).await? else {
                return Err(format!("no account for {email:?}").into());
            };
            manager.set_password(&mut account, password.as_deref()).await?;
            println!("Password of {account} has been changed.");
        },
    }

    Ok(())
}
