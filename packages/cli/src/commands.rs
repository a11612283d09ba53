// ABOUTME: CLI subcommands for issuing, verifying, and managing tokens
// ABOUTME: Each command renders its result as text (or JSON) for the binary to print

use chrono::{DateTime, Utc};
use clap::Subcommand;
use colored::*;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, ContentArrangement, Table};
use tether_core::TokenRecord;
use tether_tokens::{IssueOptions, OwnerRef, TokenConfig, TokenService};

use crate::error::CliError;

#[derive(Subcommand, Debug, Clone)]
pub enum TokenCommands {
    /// Issue a new token bound to an owner
    Issue {
        #[arg(long)]
        owner_type: String,
        #[arg(long)]
        owner_id: String,
        /// Token length (defaults to TETHER_TOKEN_LENGTH or 64)
        #[arg(long)]
        length: Option<usize>,
        /// Lifetime in minutes, 0 = never expires
        #[arg(long)]
        expires_after_minutes: Option<u32>,
        #[arg(long, help = "Explicit expiry (RFC 3339); wins over the default lifetime")]
        expires_at: Option<String>,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, help = "Print the record as JSON")]
        json: bool,
    },
    /// Verify a token is bound to the owner and not expired
    Verify {
        #[arg(long)]
        owner_type: String,
        #[arg(long)]
        owner_id: String,
        #[arg(long)]
        token: String,
        #[arg(long, help = "Evaluate expiry at this RFC 3339 time instead of now")]
        at: Option<String>,
    },
    /// Check a token exists and is not expired, regardless of owner
    Check {
        #[arg(long)]
        token: String,
        #[arg(long, help = "Evaluate expiry at this RFC 3339 time instead of now")]
        at: Option<String>,
    },
    /// Verify a token and delete it so it cannot be used again
    Consume {
        #[arg(long)]
        owner_type: String,
        #[arg(long)]
        owner_id: String,
        #[arg(long)]
        token: String,
    },
    /// Delete a token by id
    Revoke {
        #[arg(long)]
        id: String,
    },
    /// List tokens bound to an owner, expired ones included
    List {
        #[arg(long)]
        owner_type: String,
        #[arg(long)]
        owner_id: String,
        #[arg(long, help = "Print the records as JSON")]
        json: bool,
    },
    /// Delete tokens whose expiry has passed
    PurgeExpired {
        #[arg(long, help = "Purge relative to this RFC 3339 time instead of now")]
        at: Option<String>,
    },
}

impl TokenCommands {
    pub async fn run(
        &self,
        service: &TokenService,
        defaults: &TokenConfig,
    ) -> Result<String, CliError> {
        match self {
            TokenCommands::Issue {
                owner_type,
                owner_id,
                length,
                expires_after_minutes,
                expires_at,
                name,
                json,
            } => {
                let mut config = defaults.clone();
                if let Some(length) = length {
                    config.token_length = *length;
                }
                if let Some(minutes) = expires_after_minutes {
                    config.expires_after_minutes = *minutes;
                }

                let options = IssueOptions {
                    expires_at: expires_at.as_deref().map(parse_time).transpose()?,
                    name: name.clone(),
                };

                let owner = OwnerRef::new(owner_type.as_str(), owner_id);
                let record = service.issue_with(&owner, &config, &options).await?;

                if *json {
                    return Ok(to_json(&record));
                }
                Ok(format!(
                    "{} Issued token for {}\n  id:      {}\n  token:   {}\n  expires: {}",
                    "✓".green().bold(),
                    owner,
                    record.id,
                    record.value,
                    format_expiry(record.expires_at)
                ))
            }
            TokenCommands::Verify {
                owner_type,
                owner_id,
                token,
                at,
            } => {
                let owner = OwnerRef::new(owner_type.as_str(), owner_id);
                let record = service.verify(&owner, token, resolve_now(at)?).await?;
                Ok(format!(
                    "{} Token {} is valid for {} (expires: {})",
                    "✓".green().bold(),
                    record.id,
                    owner,
                    format_expiry(record.expires_at)
                ))
            }
            TokenCommands::Check { token, at } => {
                let record = service.check(token, resolve_now(at)?).await?;
                Ok(format!(
                    "{} Token {} is valid (owner: {})",
                    "✓".green().bold(),
                    record.id,
                    record.owner()
                ))
            }
            TokenCommands::Consume {
                owner_type,
                owner_id,
                token,
            } => {
                let owner = OwnerRef::new(owner_type.as_str(), owner_id);
                let record = service.consume(&owner, token, Utc::now()).await?;
                Ok(format!(
                    "{} Token {} consumed for {}",
                    "✓".green().bold(),
                    record.id,
                    owner
                ))
            }
            TokenCommands::Revoke { id } => {
                if service.revoke(id).await? {
                    Ok(format!("{} Revoked token {}", "✓".green().bold(), id))
                } else {
                    Ok(format!("{} No token with id {}", "!".yellow().bold(), id))
                }
            }
            TokenCommands::List {
                owner_type,
                owner_id,
                json,
            } => {
                let owner = OwnerRef::new(owner_type.as_str(), owner_id);
                let records = service.tokens_for_owner(&owner).await?;
                if *json {
                    return Ok(to_json(&records));
                }
                Ok(render_table(&owner, &records))
            }
            TokenCommands::PurgeExpired { at } => {
                let removed = service.purge_expired(resolve_now(at)?).await?;
                Ok(format!(
                    "{} Purged {} expired token(s)",
                    "✓".green().bold(),
                    removed
                ))
            }
        }
    }
}

fn render_table(owner: &OwnerRef, records: &[TokenRecord]) -> String {
    if records.is_empty() {
        return format!("No tokens found for {}", owner).yellow().to_string();
    }

    let now = Utc::now();
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["ID", "Name", "Token", "Created", "Expires", "Status"]);

    for record in records {
        let status = match record.expires_at {
            Some(at) if at < now => "Expired",
            _ => "Valid",
        };
        table.add_row(vec![
            record.id.clone(),
            record.name.clone().unwrap_or_else(|| "-".to_string()),
            tether_core::redact_token(&record.value),
            record.created_at.to_rfc3339(),
            format_expiry(record.expires_at),
            status.to_string(),
        ]);
    }

    format!("{}\nTotal: {} tokens", table, records.len())
}

fn format_expiry(expires_at: Option<DateTime<Utc>>) -> String {
    match expires_at {
        Some(at) => at.to_rfc3339(),
        None => "never".to_string(),
    }
}

fn to_json<T: serde::Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
}

fn parse_time(raw: &str) -> Result<DateTime<Utc>, CliError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|_| CliError::InvalidTimestamp(raw.to_string()))
}

fn resolve_now(at: &Option<String>) -> Result<DateTime<Utc>, CliError> {
    match at {
        Some(raw) => parse_time(raw),
        None => Ok(Utc::now()),
    }
}
