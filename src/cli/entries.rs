//! Account management commands: add, list, remove and reorder

use chrono::{DateTime, Local};
use serde::Serialize;
use tabauth_core::error::TabAuthError;
use tabauth_core::store::{add_manual_entry, EntryStore};
use tabauth_core::types::AuthenticatorEntry;

use crate::cli::open_session;
use crate::cli::prompt::prompt_input;

/// Entry as shown to the user, without its secret
#[derive(Debug, Serialize)]
struct EntryView<'a> {
    id: &'a str,
    issuer: &'a str,
    account_name: &'a str,
    sort_order: i64,
    created_at: &'a str,
}

impl<'a> From<&'a AuthenticatorEntry> for EntryView<'a> {
    fn from(entry: &'a AuthenticatorEntry) -> Self {
        Self {
            id: &entry.id,
            issuer: &entry.issuer,
            account_name: &entry.account_name,
            sort_order: entry.sort_order,
            created_at: &entry.created_at,
        }
    }
}

/// Run the add command
///
/// The secret is read from stdin when not given on the command line.
pub fn run_add(issuer: &str, account: &str, secret: Option<String>) -> Result<(), TabAuthError> {
    let mut session = open_session()?;

    let secret = match secret {
        Some(secret) => secret,
        None => prompt_input("Secret key: ")?,
    };

    let entry = add_manual_entry(
        &mut session.store,
        &session.config.user_id,
        issuer,
        account,
        &secret,
        session.config.strict_secrets,
    )?;

    println!("✅ Added {} ({})", entry.issuer, entry.account_name);
    println!("   id: {}", entry.id);
    Ok(())
}

/// Run the list command
pub fn run_list(json: bool) -> Result<(), TabAuthError> {
    let session = open_session()?;
    let entries = session.store.list(&session.config.user_id)?;
    let views: Vec<EntryView> = entries.iter().map(EntryView::from).collect();

    if json {
        let out = serde_json::to_string_pretty(&views).map_err(std::io::Error::from)?;
        println!("{}", out);
        return Ok(());
    }

    if views.is_empty() {
        println!("No accounts stored.");
        return Ok(());
    }

    for view in &views {
        println!(
            "{}  {} ({})  added {}",
            view.id,
            view.issuer,
            view.account_name,
            local_date(view.created_at)
        );
    }
    Ok(())
}

/// Run the remove command
pub fn run_remove(id: &str) -> Result<(), TabAuthError> {
    let mut session = open_session()?;
    session.store.delete(&session.config.user_id, id)?;
    println!("Removed {}", id);
    Ok(())
}

/// Run the reorder command
pub fn run_reorder(ids: &[String]) -> Result<(), TabAuthError> {
    let mut session = open_session()?;
    session.store.reorder(&session.config.user_id, ids)?;
    println!("Reordered {} accounts", ids.len());
    Ok(())
}

/// RFC 3339 timestamp as a local date, or unchanged if it does not parse
fn local_date(timestamp: &str) -> String {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|t| t.with_timezone(&Local).format("%Y-%m-%d").to_string())
        .unwrap_or_else(|_| timestamp.to_string())
}
