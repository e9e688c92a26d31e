//! Per-command, per-user cooldown bookkeeping
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.0.0: Composite (command, user) keys with entry-locked check-and-record

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serenity::model::id::UserId;
use std::time::{Duration, Instant};

/// Default window applied to every command without an override
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(3000);

/// Composite key for cooldowns: (command name, user id)
type CooldownKey = (String, UserId);

/// Result of a cooldown gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownCheck {
    Allowed,
    Denied { retry_after: Duration },
}

impl CooldownCheck {
    pub fn is_allowed(&self) -> bool {
        matches!(self, CooldownCheck::Allowed)
    }
}

#[derive(Debug, Clone, Copy)]
struct CooldownEntry {
    last_allowed: Instant,
    window: Duration,
}

impl CooldownEntry {
    fn expires_at(&self) -> Instant {
        self.last_allowed + self.window
    }
}

/// Tracks the last successful invocation of each command by each user.
///
/// Check-and-record happens while holding the DashMap entry lock and never
/// awaits, so two concurrent invocations by the same user for the same
/// command cannot both be allowed inside one window.
#[derive(Default)]
pub struct CooldownTracker {
    entries: DashMap<CooldownKey, CooldownEntry>,
}

impl CooldownTracker {
    pub fn new() -> Self {
        CooldownTracker {
            entries: DashMap::new(),
        }
    }

    fn make_key(command: &str, user_id: UserId) -> CooldownKey {
        (command.to_string(), user_id)
    }

    /// Gate an invocation at `now`, recording it when allowed.
    ///
    /// A denied attempt leaves the stored timestamp untouched.
    pub fn check_and_record(
        &self,
        command: &str,
        user_id: UserId,
        now: Instant,
        window: Duration,
    ) -> CooldownCheck {
        let key = Self::make_key(command, user_id);
        let fresh = CooldownEntry {
            last_allowed: now,
            window,
        };

        match self.entries.entry(key) {
            Entry::Occupied(mut occupied) => {
                let expires_at = occupied.get().expires_at();
                if now < expires_at {
                    return CooldownCheck::Denied {
                        retry_after: expires_at - now,
                    };
                }
                occupied.insert(fresh);
            }
            Entry::Vacant(vacant) => {
                vacant.insert(fresh);
            }
        }
        CooldownCheck::Allowed
    }

    /// Remaining wait for a (command, user) pair, if it is still cooling down
    pub fn remaining(&self, command: &str, user_id: UserId, now: Instant) -> Option<Duration> {
        let key = Self::make_key(command, user_id);
        self.entries.get(&key).and_then(|entry| {
            let expires_at = entry.expires_at();
            (now < expires_at).then(|| expires_at - now)
        })
    }

    /// Drop every entry whose window has elapsed at `now`
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self, now: Instant) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| now < entry.expires_at());
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
