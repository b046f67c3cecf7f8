//! Codes command implementation
//!
//! Prints the current code of every stored account, once or continuously.

use std::io::{self, Write};
use std::time::Duration;

use colored::Colorize;
use tabauth_core::auth::ticker::{snapshot, CodeTicker, EntryCode, Tick};
use tabauth_core::auth::totp::{unix_now, CODE_PLACEHOLDER};
use tabauth_core::error::TabAuthError;
use tabauth_core::store::EntryStore;
use tabauth_core::types::AuthenticatorEntry;
use tokio::sync::broadcast::error::RecvError;
use tracing::debug;

use crate::cli::open_session;

/// Run the codes command
pub fn run_codes(watch: bool, filter: Option<&str>) -> Result<(), TabAuthError> {
    let session = open_session()?;
    let entries: Vec<AuthenticatorEntry> = session
        .store
        .list(&session.config.user_id)?
        .into_iter()
        .filter(|entry| filter.map_or(true, |query| entry.matches(query)))
        .collect();

    if entries.is_empty() {
        println!("No accounts found. Add one with `tabauth add` or `tabauth scan`.");
        return Ok(());
    }

    if !watch {
        let tick = Tick {
            unix_seconds: unix_now()?,
        };
        print!("{}", render(&snapshot(&entries, tick)));
        return Ok(());
    }

    watch_codes(
        entries,
        Duration::from_millis(session.config.tick_interval_ms),
    )
}

/// Redraw every tick until interrupted
fn watch_codes(entries: Vec<AuthenticatorEntry>, period: Duration) -> Result<(), TabAuthError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;

    runtime.block_on(async move {
        let ticker = CodeTicker::new();
        let mut ticks = ticker.subscribe();
        let handle = ticker.spawn(period);

        loop {
            match ticks.recv().await {
                Ok(tick) => {
                    // Clear screen, cursor home
                    print!("\x1b[2J\x1b[H{}", render(&snapshot(&entries, tick)));
                    io::stdout().flush()?;
                }
                Err(RecvError::Lagged(skipped)) => debug!("Display skipped {} ticks", skipped),
                Err(RecvError::Closed) => break,
            }
        }

        handle.abort();
        Ok::<(), TabAuthError>(())
    })
}

fn render(codes: &[EntryCode]) -> String {
    let issuer_width = codes.iter().map(|c| c.issuer.chars().count()).max().unwrap_or(0);
    let account_width = codes
        .iter()
        .map(|c| c.account_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for entry in codes {
        let remaining = format!("{:>2}s", entry.code.seconds_remaining);
        let remaining = if entry.code.is_expiring() {
            remaining.red()
        } else {
            remaining.green()
        };
        out.push_str(&format!(
            "{:<iw$}  {:<aw$}  {}  {}\n",
            entry.issuer,
            entry.account_name,
            group_digits(&entry.code.code).bold(),
            remaining,
            iw = issuer_width,
            aw = account_width,
        ));
    }
    out
}

/// "123456" -> "123 456"
fn group_digits(code: &str) -> String {
    if code == CODE_PLACEHOLDER || code.len() % 2 != 0 {
        return code.to_string();
    }
    let (head, tail) = code.split_at(code.len() / 2);
    format!("{} {}", head, tail)
}
