//! Display refresh ticker
//!
//! One interval drives every visible code. Each tick carries the wall-clock
//! second it fired at; subscribers recompute codes from it instead of keeping
//! per-entry timers.

use std::time::Duration;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::auth::totp::{current_code, unix_now, TotpCode, TOTP_STEP_SECONDS};
use crate::types::AuthenticatorEntry;

/// Default refresh period for code displays
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(1);

const CHANNEL_CAPACITY: usize = 16;

/// A single refresh event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tick {
    pub unix_seconds: u64,
}

/// Code for one entry at one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryCode {
    pub entry_id: String,
    pub issuer: String,
    pub account_name: String,
    pub code: TotpCode,
}

/// Broadcasts ticks to every subscribed display
#[derive(Debug)]
pub struct CodeTicker {
    sender: broadcast::Sender<Tick>,
}

impl CodeTicker {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Register a display; subscribe before calling [`CodeTicker::spawn`]
    pub fn subscribe(&self) -> broadcast::Receiver<Tick> {
        self.sender.subscribe()
    }

    /// Start ticking every `period` until the last subscriber goes away
    ///
    /// The first tick fires immediately.
    pub fn spawn(self, period: Duration) -> JoinHandle<()> {
        let sender = self.sender;
        tokio::spawn(async move {
            let mut ticks = interval(period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticks.tick().await;
                let unix_seconds = match unix_now() {
                    Ok(secs) => secs,
                    Err(e) => {
                        warn!("Skipping tick: {}", e);
                        continue;
                    }
                };
                if sender.send(Tick { unix_seconds }).is_err() {
                    debug!("No code displays left, stopping ticker");
                    break;
                }
            }
        })
    }
}

impl Default for CodeTicker {
    fn default() -> Self {
        Self::new()
    }
}

/// Recompute the codes of `entries` for a tick
pub fn snapshot(entries: &[AuthenticatorEntry], tick: Tick) -> Vec<EntryCode> {
    entries
        .iter()
        .map(|entry| EntryCode {
            entry_id: entry.id.clone(),
            issuer: entry.issuer.clone(),
            account_name: entry.account_name.clone(),
            code: current_code(&entry.otp_secret(), TOTP_STEP_SECONDS, tick.unix_seconds),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, secret: &str) -> AuthenticatorEntry {
        AuthenticatorEntry {
            id: id.to_string(),
            user_id: "user".to_string(),
            issuer: "Example".to_string(),
            account_name: "alice".to_string(),
            secret: secret.to_string(),
            sort_order: 0,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_snapshot_recomputes_per_tick() {
        let entries = vec![
            entry("a", "GEZDGNBVGY3TQOJQGEZDGNBVGY3TQOJQ"),
            entry("b", "JBSWY3DPEHPK3PXP"),
        ];
        let codes = snapshot(&entries, Tick { unix_seconds: 59 });
        assert_eq!(codes.len(), 2);
        assert_eq!(codes[0].entry_id, "a");
        assert_eq!(codes[0].code.code, "287082");
        assert_eq!(codes[0].code.seconds_remaining, 1);

        let later = snapshot(&entries, Tick { unix_seconds: 1111111109 });
        assert_eq!(later[0].code.code, "081804");
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_reach_every_subscriber() {
        let ticker = CodeTicker::new();
        let mut first = ticker.subscribe();
        let mut second = ticker.subscribe();
        let handle = ticker.spawn(Duration::from_secs(1));

        for _ in 0..3 {
            assert!(first.recv().await.is_ok());
            assert!(second.recv().await.is_ok());
        }

        drop(first);
        drop(second);
        handle.await.unwrap();
    }
}
