//! CLI administration tool for custom-domains.
//!
//! Provides commands for managing API tokens, inspecting registered domains,
//! and performing database checks without requiring HTTP API access.
//!
//! # Usage
//!
//! ```bash
//! # Create a new API token acting for owner 42
//! cargo run --bin admin -- token create --owner 42
//!
//! # List all tokens
//! cargo run --bin admin -- token list
//!
//! # Revoke a token
//! cargo run --bin admin -- token revoke "Production API"
//!
//! # List domains, optionally for one owner
//! cargo run --bin admin -- domains list --owner 42
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` (required): PostgreSQL connection string
//! - `TOKEN_SIGNING_SECRET` (required for `token create`): must match the server's

use custom_domains::application::services::auth_service::hash_token;
use custom_domains::domain::repositories::{DomainRepository, TokenRepository};
use custom_domains::infrastructure::persistence::{PgDomainRepository, PgTokenRepository};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use colored::*;
use dialoguer::{Confirm, Input};
use sqlx::PgPool;
use std::sync::Arc;

/// CLI tool for managing custom-domains.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Manage API tokens
    Token {
        #[command(subcommand)]
        action: TokenAction,
    },

    /// Inspect registered domains
    Domains {
        #[command(subcommand)]
        action: DomainAction,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

/// Token management subcommands.
#[derive(Subcommand)]
enum TokenAction {
    /// Create a new API token
    Create {
        /// Owner the token acts for; every API call is scoped to this owner's domains
        #[arg(short, long)]
        owner: i64,

        /// Token name (e.g., "Production API", "Billing Integration")
        #[arg(short, long)]
        name: Option<String>,

        /// Custom token value (optional, auto-generated if not provided)
        #[arg(short, long)]
        token: Option<String>,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// List all tokens
    List,

    /// Revoke a token
    Revoke {
        /// Token name or ID to revoke
        name_or_id: String,
    },
}

/// Domain inspection subcommands.
#[derive(Subcommand)]
enum DomainAction {
    /// List domains with verification and certificate state
    List {
        /// Only show domains of this owner
        #[arg(short, long)]
        owner: Option<i64>,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL must be set")?;

    let pool = PgPool::connect(&database_url)
        .await
        .context("Failed to connect to database")?;

    match cli.command {
        Commands::Token { action } => handle_token_action(action, &pool).await?,
        Commands::Domains { action } => handle_domain_action(action, &pool).await?,
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Dispatches token management commands.
async fn handle_token_action(action: TokenAction, pool: &PgPool) -> Result<()> {
    let repo = Arc::new(PgTokenRepository::new(Arc::new(pool.clone())));

    match action {
        TokenAction::Create {
            owner,
            name,
            token,
            yes,
        } => {
            create_token(repo, owner, name, token, yes).await?;
        }
        TokenAction::List => {
            list_tokens(repo).await?;
        }
        TokenAction::Revoke { name_or_id } => {
            revoke_token(repo, name_or_id).await?;
        }
    }

    Ok(())
}

/// Creates a new API token with interactive prompts.
///
/// Only the HMAC hash is stored; the raw token is displayed once.
async fn create_token(
    repo: Arc<PgTokenRepository>,
    owner_id: i64,
    name: Option<String>,
    token: Option<String>,
    skip_confirm: bool,
) -> Result<()> {
    let signing_secret =
        std::env::var("TOKEN_SIGNING_SECRET").context("TOKEN_SIGNING_SECRET must be set")?;
    if signing_secret.is_empty() {
        anyhow::bail!("TOKEN_SIGNING_SECRET must not be empty");
    }

    println!("{}", "🔑 Create API Token".bright_blue().bold());
    println!();

    let token_name = match name {
        Some(n) => n,
        None => Input::new()
            .with_prompt("Token name")
            .with_initial_text("Production API")
            .interact_text()?,
    };

    let token_value = match token {
        Some(t) => {
            println!("{}", "⚠️  Using provided token value".yellow());
            t
        }
        None => {
            let generated = generate_token();
            println!("{}", "✨ Generated new token".green());
            generated
        }
    };

    println!();
    println!("{}", "Token details:".bright_white().bold());
    println!("  Name:  {}", token_name.cyan());
    println!("  Owner: {}", owner_id.to_string().cyan());
    println!("  Token: {}", token_value.bright_yellow().bold());
    println!();
    println!(
        "{}",
        "⚠️  IMPORTANT: Save this token now! You won't be able to see it again."
            .red()
            .bold()
    );
    println!();

    if !skip_confirm {
        let confirmed = Confirm::new()
            .with_prompt("Create this token?")
            .default(true)
            .interact()?;

        if !confirmed {
            println!("{}", "❌ Cancelled".red());
            return Ok(());
        }
    }

    let token_hash = hash_token(&signing_secret, &token_value);

    repo.create_token(owner_id, &token_name, &token_hash)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to create token: {}", e))?;

    println!();
    println!("{}", "✅ Token created successfully!".green().bold());
    println!();
    println!("{}", "Example:".bright_white());
    println!(
        "  curl -H \"Authorization: Bearer {}\" http://localhost:3000/api/domains",
        token_value.bright_yellow()
    );
    println!();

    Ok(())
}

/// Lists all API tokens with owner and status.
async fn list_tokens(repo: Arc<PgTokenRepository>) -> Result<()> {
    println!("{}", "📋 API Tokens".bright_blue().bold());
    println!();

    let tokens = repo
        .list_tokens()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to list tokens: {}", e))?;

    if tokens.is_empty() {
        println!("{}", "  No tokens found".yellow());
        println!();
        println!(
            "  Create one with: {} admin -- token create --owner <id>",
            "cargo run --bin".bright_cyan()
        );
        return Ok(());
    }

    println!(
        "  {:<4} {:<8} {:<30} {:<18} {:<18} {:<10}",
        "ID".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Name".bright_white().bold(),
        "Created".bright_white().bold(),
        "Last used".bright_white().bold(),
        "Status".bright_white().bold()
    );
    println!("  {}", "─".repeat(92).bright_black());

    for token in &tokens {
        let status = if token.revoked_at.is_some() {
            "REVOKED".red()
        } else {
            "ACTIVE".green()
        };

        println!(
            "  {:<4} {:<8} {:<30} {:<18} {:<18} {}",
            token.id.to_string().bright_black(),
            token.owner_id.to_string(),
            token.name.cyan(),
            format_time(Some(token.created_at)).bright_black(),
            format_time(token.last_used_at).bright_black(),
            status
        );
    }

    println!();
    println!(
        "  Total: {}",
        tokens.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Revokes a token by name or ID with confirmation prompt.
///
/// Numeric input is looked up as an ID, anything else as an exact name.
async fn revoke_token(repo: Arc<PgTokenRepository>, name_or_id: String) -> Result<()> {
    println!("{}", "🔒 Revoke API Token".bright_blue().bold());
    println!();

    let token = match name_or_id.parse::<i64>() {
        Ok(id) => repo
            .find_by_id(id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
        Err(_) => repo
            .find_by_name(&name_or_id)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?,
    };

    let token = token.context("Token not found")?;

    if token.revoked_at.is_some() {
        println!("{}", "⚠️  This token is already revoked".yellow());
        return Ok(());
    }

    println!("  Token: {}", token.name.cyan());
    println!("  ID:    {}", token.id.to_string().bright_black());
    println!("  Owner: {}", token.owner_id.to_string().bright_black());
    println!();

    let confirmed = Confirm::new()
        .with_prompt("Revoke this token?")
        .default(false)
        .interact()?;

    if !confirmed {
        println!("{}", "❌ Cancelled".red());
        return Ok(());
    }

    repo.revoke_token(token.id)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to revoke token: {}", e))?;

    println!();
    println!("{}", "✅ Token revoked successfully!".green().bold());
    println!();

    Ok(())
}

#[derive(sqlx::FromRow)]
struct DomainSummary {
    id: i64,
    owner_id: i64,
    hostname: String,
    is_verified: bool,
    certificate_status: String,
    certificate_expires_at: Option<DateTime<Utc>>,
}

/// Dispatches domain inspection commands.
async fn handle_domain_action(action: DomainAction, pool: &PgPool) -> Result<()> {
    match action {
        DomainAction::List { owner } => list_domains(pool, owner).await,
    }
}

/// Lists domains across owners, or one owner's domains through the repository.
async fn list_domains(pool: &PgPool, owner: Option<i64>) -> Result<()> {
    println!("{}", "🌐 Domains".bright_blue().bold());
    println!();

    let domains: Vec<DomainSummary> = match owner {
        Some(owner_id) => {
            let repo = PgDomainRepository::new(Arc::new(pool.clone()));
            repo.list_for_owner(owner_id)
                .await
                .map_err(|e| anyhow::anyhow!("Failed to list domains: {}", e))?
                .into_iter()
                .map(|d| DomainSummary {
                    id: d.id,
                    owner_id: d.owner_id,
                    hostname: d.hostname,
                    is_verified: d.is_verified,
                    certificate_status: d.certificate_status.to_string(),
                    certificate_expires_at: d.certificate_expires_at,
                })
                .collect()
        }
        None => {
            sqlx::query_as::<_, DomainSummary>(
                "SELECT id, owner_id, hostname, is_verified, certificate_status, certificate_expires_at
                 FROM domains
                 ORDER BY owner_id, hostname",
            )
            .fetch_all(pool)
            .await?
        }
    };

    if domains.is_empty() {
        println!("{}", "  No domains found".yellow());
        println!();
        return Ok(());
    }

    println!(
        "  {:<6} {:<8} {:<40} {:<10} {:<14} {:<18}",
        "ID".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Hostname".bright_white().bold(),
        "Verified".bright_white().bold(),
        "Certificate".bright_white().bold(),
        "Expires".bright_white().bold()
    );
    println!("  {}", "─".repeat(100).bright_black());

    for domain in &domains {
        let verified = if domain.is_verified {
            "yes".green()
        } else {
            "no".yellow()
        };

        let certificate = match domain.certificate_status.as_str() {
            "ACTIVE" => domain.certificate_status.green(),
            "FAILED" | "EXPIRED" => domain.certificate_status.red(),
            _ => domain.certificate_status.normal(),
        };

        println!(
            "  {:<6} {:<8} {:<40} {:<10} {:<14} {}",
            domain.id.to_string().bright_black(),
            domain.owner_id.to_string(),
            domain.hostname.cyan(),
            verified,
            certificate,
            format_time(domain.certificate_expires_at).bright_black()
        );
    }

    println!();
    println!(
        "  Total: {}",
        domains.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let domains_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM domains")
                .fetch_one(pool)
                .await?;

            let verified_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM domains WHERE is_verified")
                    .fetch_one(pool)
                    .await?;

            let tokens_count: i64 =
                sqlx::query_scalar("SELECT COUNT(*) FROM api_tokens WHERE revoked_at IS NULL")
                    .fetch_one(pool)
                    .await?;

            println!("  PostgreSQL:     {}", version.bright_white());
            println!(
                "  Domains:        {}",
                domains_count.to_string().bright_green().bold()
            );
            println!(
                "  Verified:       {}",
                verified_count.to_string().bright_green().bold()
            );
            println!(
                "  Active tokens:  {}",
                tokens_count.to_string().bright_green().bold()
            );
            println!();
        }
    }

    Ok(())
}

fn format_time(at: Option<DateTime<Utc>>) -> String {
    at.map(|t| t.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

/// Generates a cryptographically random token.
///
/// # Format
///
/// - Length: 48 characters
/// - Character set: A-Z, a-z, 0-9
/// - Entropy: ~286 bits
fn generate_token() -> String {
    use rand::Rng;
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
    const TOKEN_LEN: usize = 48;

    let mut rng = rand::rng();

    (0..TOKEN_LEN)
        .map(|_| {
            let idx = rng.random_range(0..CHARSET.len());
            CHARSET[idx] as char
        })
        .collect()
}
