//! Billing platform CLI
//!
//! Terminal front-end for the billing API client:
//! 1. Loads TOML config (API base URL, request timeout, session file)
//! 2. Restores the stored session, if any
//! 3. Dispatches one subcommand through the session facade or the typed
//!    endpoint wrappers
//! 4. If the pipeline force-terminated the session (refresh failed or no
//!    refresh token), prints the sign-in instruction and exits non-zero —
//!    the terminal rendition of the login redirect

mod commands;
mod config;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use billing_client::{ApiClient, SessionManager, SessionStore};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

const USAGE: &str = "usage: billing [--config <path>] <command>

commands:
  login --email <address>                 sign in (password from BILLING_PASSWORD)
  register --email <a> --name <n>         create an account and sign in
          [--phone <p>] [--company <c>]
  logout                                  discard the local session
  whoami                                  show the signed-in user
  plans                                   list available plans
  subscriptions                           list your subscriptions
  invoices                                list your invoices
  usage                                   show your usage summary
";

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so command output stays pipeable
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    // CLI: simple --config flag parsing
    let cli_config_path = args
        .iter()
        .position(|a| a == "--config")
        .and_then(|i| args.get(i + 1))
        .map(|s| s.as_str());

    let config_path = Config::resolve_path(cli_config_path);
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    info!(
        base_url = %config.api.base_url,
        timeout_secs = config.api.timeout_secs,
        store_path = %config.session.store_path.display(),
        "configuration loaded"
    );

    // Strip the --config pair; what remains is the subcommand and its flags
    let command_args: Vec<String> = {
        let mut remaining = Vec::new();
        let mut skip_next = false;
        for arg in &args {
            if skip_next {
                skip_next = false;
                continue;
            }
            if arg == "--config" {
                skip_next = true;
                continue;
            }
            remaining.push(arg.clone());
        }
        remaining
    };

    let Some(command) = command_args.first() else {
        eprint!("{USAGE}");
        std::process::exit(2);
    };
    let rest = &command_args[1..];

    let store = Arc::new(SessionStore::new(config.session.store_path.clone()));
    let client = ApiClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
        store,
    )?;
    let manager = SessionManager::new(&client);
    manager.restore().await;

    let logout_events = manager.logout_events();

    let outcome = match command.as_str() {
        "login" => commands::login(&manager, rest).await,
        "register" => commands::register(&manager, rest).await,
        "logout" => commands::logout(&manager).await,
        "whoami" => commands::whoami(&manager).await,
        "plans" => commands::list_plans(&client).await,
        "subscriptions" => commands::list_subscriptions(&client).await,
        "invoices" => commands::list_invoices(&client).await,
        "usage" => commands::usage_summary(&client).await,
        other => {
            eprintln!("unknown command: {other}");
            eprint!("{USAGE}");
            std::process::exit(2);
        }
    };

    // Forced logout during the command: the session is gone, tell the
    // user how to get back in
    if *logout_events.borrow() {
        eprintln!("Your session has expired. Run `billing login` to sign in again.");
        std::process::exit(1);
    }

    outcome
}
