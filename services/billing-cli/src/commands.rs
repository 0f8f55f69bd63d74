//! Subcommand implementations
//!
//! Each command drives the session facade or a typed endpoint wrapper
//! and prints a terminal-friendly rendering. This layer owns turning
//! `ApiError` into the message a person sees (`user_message()`); the
//! pipeline below it stays structured.

use anyhow::{Context, Result, anyhow, bail};
use billing_client::endpoints::{invoices, plans, subscriptions, usage};
use billing_client::{ApiClient, ApiError, LoginRequest, RegisterRequest, SessionManager};
use common::Secret;

/// Extract the value following a `--flag` argument.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

/// Read the password from BILLING_PASSWORD. Passwords are never accepted
/// as CLI arguments (they would land in shell history and process lists).
fn password_from_env() -> Result<Secret<String>> {
    std::env::var("BILLING_PASSWORD")
        .map(Secret::new)
        .context("set the BILLING_PASSWORD environment variable")
}

fn present(err: ApiError) -> anyhow::Error {
    anyhow!(err.user_message())
}

pub async fn login(manager: &SessionManager, args: &[String]) -> Result<()> {
    let email = flag_value(args, "--email").context("usage: billing login --email <address>")?;
    let password = password_from_env()?;

    let session = manager
        .login(LoginRequest {
            email,
            password: password.expose().clone(),
        })
        .await
        .map_err(present)?;

    println!(
        "Signed in as {} <{}>",
        session.user.full_name, session.user.email
    );
    Ok(())
}

pub async fn register(manager: &SessionManager, args: &[String]) -> Result<()> {
    let email =
        flag_value(args, "--email").context("usage: billing register --email <address> --name <full name>")?;
    let full_name =
        flag_value(args, "--name").context("usage: billing register --email <address> --name <full name>")?;
    let password = password_from_env()?;

    let session = manager
        .register(RegisterRequest {
            email,
            password: password.expose().clone(),
            full_name,
            phone: flag_value(args, "--phone"),
            company: flag_value(args, "--company"),
        })
        .await
        .map_err(present)?;

    println!(
        "Account created, signed in as {} <{}>",
        session.user.full_name, session.user.email
    );
    Ok(())
}

pub async fn logout(manager: &SessionManager) -> Result<()> {
    manager.logout().await;
    println!("Signed out.");
    Ok(())
}

pub async fn whoami(manager: &SessionManager) -> Result<()> {
    match manager.current_user().await {
        Some(user) => {
            println!("{} <{}>", user.full_name, user.email);
            println!("  role: {:?}", user.role);
            println!("  active: {}", user.active);
            println!("  email verified: {}", user.email_verified);
            if let Some(company) = &user.company {
                println!("  company: {company}");
            }
        }
        None => bail!("not signed in — run `billing login`"),
    }
    Ok(())
}

pub async fn list_plans(client: &ApiClient) -> Result<()> {
    let plans = plans::list(client).await.map_err(present)?;
    if plans.is_empty() {
        println!("No plans available.");
        return Ok(());
    }
    for plan in plans {
        let featured = if plan.is_featured { " *" } else { "" };
        println!(
            "{:<12} {:>8.2} {} / {:?}{}",
            plan.name, plan.price, plan.currency, plan.billing_cycle, featured
        );
        if let Some(description) = &plan.description {
            println!("    {description}");
        }
    }
    Ok(())
}

pub async fn list_subscriptions(client: &ApiClient) -> Result<()> {
    let subscriptions = subscriptions::mine(client).await.map_err(present)?;
    if subscriptions.is_empty() {
        println!("No subscriptions.");
        return Ok(());
    }
    for subscription in subscriptions {
        println!(
            "{:<12} {:?} since {} (auto-renew: {})",
            subscription.plan.name,
            subscription.status,
            subscription.start_date,
            subscription.auto_renew
        );
    }
    Ok(())
}

pub async fn list_invoices(client: &ApiClient) -> Result<()> {
    let invoices = invoices::mine(client).await.map_err(present)?;
    if invoices.is_empty() {
        println!("No invoices.");
        return Ok(());
    }
    for invoice in invoices {
        println!(
            "{:<16} {:>10.2} {} {:?} due {}",
            invoice.invoice_number,
            invoice.total_amount,
            invoice.currency,
            invoice.status,
            invoice.due_date
        );
    }
    Ok(())
}

pub async fn usage_summary(client: &ApiClient) -> Result<()> {
    let summary = usage::my_summary(client).await.map_err(present)?;
    if summary.is_empty() {
        println!("No usage recorded.");
        return Ok(());
    }
    let mut metrics: Vec<_> = summary.into_iter().collect();
    metrics.sort_by(|a, b| a.0.cmp(&b.0));
    for (metric, quantity) in metrics {
        println!("{metric:<24} {quantity}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_value_finds_following_argument() {
        let args: Vec<String> = ["--email", "a@b.com", "--name", "Ada Byron"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(flag_value(&args, "--email").as_deref(), Some("a@b.com"));
        assert_eq!(flag_value(&args, "--name").as_deref(), Some("Ada Byron"));
    }

    #[test]
    fn flag_value_missing_flag_is_none() {
        let args: Vec<String> = ["--email", "a@b.com"].iter().map(|s| s.to_string()).collect();
        assert!(flag_value(&args, "--phone").is_none());
    }

    #[test]
    fn flag_value_trailing_flag_without_value_is_none() {
        let args: Vec<String> = ["--email"].iter().map(|s| s.to_string()).collect();
        assert!(flag_value(&args, "--email").is_none());
    }
}
