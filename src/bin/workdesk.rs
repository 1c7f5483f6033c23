//! workdesk CLI: manage users and work orders from the shell.
//!
//! Stateless per invocation: the acting user is passed explicitly and
//! every command opens the store, does its work, and exits.

use std::sync::Arc;

use anyhow::{Context, bail};
use chrono::Duration;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use workdesk::clock::Clock;
use workdesk::config::Config;
use workdesk::due;
use workdesk::mailer::ResendMailer;
use workdesk::manager::WorkOrderManager;
use workdesk::model::{CloseReason, NewWorkOrder, Priority, Stage};
use workdesk::registry::{LoginOutcome, UserRegistry};
use workdesk::store::SqliteStore;

#[derive(Parser)]
#[command(name = "workdesk", about = "Track work orders and due-soon reminders")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register a new user
    Register {
        username: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        password: String,
    },
    /// Verify credentials
    Login {
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Create a work order
    Add {
        /// Acting user id
        #[arg(long)]
        user: i64,
        summary: String,
        /// Due time: '2025-10-12 18:00', 'tomorrow 09:00', '+2h', ...
        #[arg(long)]
        due: String,
        #[arg(long)]
        details: Option<String>,
        /// low, medium, or high; inferred from the due time if omitted
        #[arg(long)]
        priority: Option<Priority>,
    },
    /// List open work orders, soonest due first
    List {
        #[arg(long)]
        user: i64,
    },
    /// Move a work order to a new stage
    Stage {
        #[arg(long)]
        user: i64,
        id: i64,
        /// open, in_progress, awaiting_parts, or closed
        stage: Stage,
    },
    /// Close a work order
    Close {
        #[arg(long)]
        user: i64,
        id: i64,
        /// resolved, duplicate, or cancelled
        #[arg(long, default_value = "resolved")]
        reason: CloseReason,
    },
    /// Send due-soon email reminders
    Notify {
        #[arg(long)]
        user: i64,
        /// Recipient address
        #[arg(long)]
        email: String,
        /// Look-ahead window in hours
        #[arg(long, default_value_t = 24)]
        window_hours: i64,
    },
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = Config::from_env().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_level.clone())),
        )
        .init();

    let cli = Cli::parse();

    let store = Arc::new(
        SqliteStore::open(&config.db_path)
            .with_context(|| format!("opening {}", config.db_path.display()))?,
    );
    let clock = Clock::system();
    let registry = UserRegistry::new(store.clone(), clock.clone());
    let mut manager = WorkOrderManager::new(store.clone(), clock.clone());
    if let Some(key) = config.resend_api_key.clone() {
        manager = manager.with_mailer(Arc::new(ResendMailer::new(key, config.resend_from.clone())));
    }

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let id = registry.register(&username, email.as_deref(), &password)?;
            println!("registered user {id}");
        }

        Command::Login { username, password } => {
            match registry.login(&username, &password)? {
                LoginOutcome::Granted(user) => println!("welcome, {}", user.username),
                LoginOutcome::Denied => bail!("invalid username or password"),
            }
        }

        Command::Add {
            user,
            summary,
            due,
            details,
            priority,
        } => {
            let Some(due_at) = due::parse_due(&due, clock.now_utc()) else {
                bail!("unrecognized due time; {}", due::HINT);
            };
            let mut new = NewWorkOrder::new(user, summary, due_at);
            if let Some(d) = details {
                new = new.details(d);
            }
            if let Some(p) = priority {
                new = new.priority(p);
            }
            let id = manager.add(new)?;
            println!("created work order {id}");
        }

        Command::List { user } => {
            for order in manager.list_open(user)? {
                println!(
                    "#{:<4} {:<14} {:<7} due {}  {}",
                    order.id,
                    order.stage.to_string(),
                    order.priority.to_string(),
                    order.due_at.format("%Y-%m-%d %H:%M"),
                    order.summary,
                );
            }
        }

        Command::Stage { user, id, stage } => {
            manager.change_stage(id, user, stage)?;
            println!("work order {id} -> {stage}");
        }

        Command::Close { user, id, reason } => {
            manager.close(id, user, reason)?;
            println!("closed work order {id} ({reason})");
        }

        Command::Notify {
            user,
            email,
            window_hours,
        } => {
            let count =
                manager.send_due_notifications(user, &email, Duration::hours(window_hours))?;
            println!("sent {count} reminder(s)");
        }
    }

    Ok(())
}
