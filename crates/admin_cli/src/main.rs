use std::error::Error;

use chrono::{DateTime, Duration, Utc};
use clap::{Args, Parser, Subcommand, ValueEnum};
use engine::{AccountStatus, Engine};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "peerpay_admin")]
#[command(about = "Admin utilities for peerpay (users, accounts, access tokens)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./peerpay.db?mode=rwc")]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    User(User),
    Account(Account),
    Token(Token),
}

#[derive(Args, Debug)]
struct User {
    #[command(subcommand)]
    command: UserCommand,
}

#[derive(Subcommand, Debug)]
enum UserCommand {
    Create {
        #[arg(long)]
        email: String,
    },
    /// Block authentication and incoming transfers for the user.
    Deactivate {
        #[arg(long)]
        email: String,
    },
    Activate {
        #[arg(long)]
        email: String,
    },
}

#[derive(Args, Debug)]
struct Account {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Open {
        #[arg(long)]
        email: String,
        /// Backdate the opening (RFC 3339). The oldest account receives
        /// transfers addressed to the email.
        #[arg(long)]
        opened_at: Option<DateTime<Utc>>,
    },
    Status {
        #[arg(long)]
        account_id: Uuid,
        #[arg(long, value_enum)]
        status: StatusArg,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum StatusArg {
    Open,
    Restricted,
    Closed,
}

impl From<StatusArg> for AccountStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Open => AccountStatus::Open,
            StatusArg::Restricted => AccountStatus::Restricted,
            StatusArg::Closed => AccountStatus::Closed,
        }
    }
}

#[derive(Args, Debug)]
struct Token {
    #[command(subcommand)]
    command: TokenCommand,
}

#[derive(Subcommand, Debug)]
enum TokenCommand {
    Issue {
        #[arg(long)]
        email: String,
        /// Lifetime in hours; the token never expires when omitted.
        #[arg(long)]
        ttl_hours: Option<i64>,
    },
    Revoke {
        #[arg(long)]
        token: String,
    },
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::User(User { command }) => match command {
            UserCommand::Create { email } => {
                let user_id = engine.register_user(&email).await?;
                println!("created user: {email} ({user_id})");
            }
            UserCommand::Deactivate { email } => {
                let user_id = engine.user_id_for_email(&email).await?;
                engine.set_user_active(user_id, false).await?;
                println!("deactivated user: {email}");
            }
            UserCommand::Activate { email } => {
                let user_id = engine.user_id_for_email(&email).await?;
                engine.set_user_active(user_id, true).await?;
                println!("activated user: {email}");
            }
        },
        Command::Account(Account { command }) => match command {
            AccountCommand::Open { email, opened_at } => {
                let user_id = engine.user_id_for_email(&email).await?;
                let account_id = engine.open_account(user_id, opened_at).await?;
                println!("opened account for {email}: {account_id}");
            }
            AccountCommand::Status { account_id, status } => {
                let status = AccountStatus::from(status);
                engine.set_account_status(account_id, status).await?;
                println!("account {account_id} is now {}", status.as_str());
            }
        },
        Command::Token(Token { command }) => match command {
            TokenCommand::Issue { email, ttl_hours } => {
                let ttl = match ttl_hours {
                    None => None,
                    Some(hours) if hours > 0 => Some(
                        Duration::try_hours(hours).ok_or("--ttl-hours is out of range")?,
                    ),
                    Some(_) => {
                        eprintln!("--ttl-hours must be positive");
                        std::process::exit(2);
                    }
                };
                let user_id = engine.user_id_for_email(&email).await?;
                let token = engine.issue_token(user_id, ttl).await?;
                println!("{token}");
            }
            TokenCommand::Revoke { token } => {
                engine.revoke_token(&token).await?;
                println!("revoked token");
            }
        },
    }

    Ok(())
}
