//! Guest message quota tracking.
//!
//! Anonymous users get a fixed number of messages. The running count
//! is written to several storage locations at once and read back by
//! taking the largest valid count, so clearing one location doesn't
//! reset the quota. Records are only trusted when they carry the
//! current fingerprint and were written inside the expiry window.
//!
//! Every storage location is client controlled. This is a soft gate
//! for the UI, not an abuse boundary.
use std::time::Duration;

use anyhow::{Error, Result};
use serde::{Deserialize, Serialize};

use super::clock::{BoxedClock, Clock, SystemClock};
use super::fingerprint::FingerprintSource;
use super::storage::{
    APP_STATE_KEY, BoxedStoragePort, COOKIE_KEY, COUNT_KEY, GuestStores, RECENT_ACTIVITY_KEY,
};

pub const DEFAULT_MAX_GUEST_MESSAGES: u32 = 3;
pub const DEFAULT_EXPIRY: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Clone, Debug)]
pub struct QuotaConfig {
    pub max_messages: u32,
    pub expiry: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            max_messages: DEFAULT_MAX_GUEST_MESSAGES,
            expiry: DEFAULT_EXPIRY,
        }
    }
}

/// The persisted quota state. Serialized as `{count, timestamp,
/// fingerprint}` where `timestamp` is epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GuestQuotaRecord {
    pub count: u32,
    pub timestamp: i64,
    pub fingerprint: String,
}

impl GuestQuotaRecord {
    pub fn is_expired(&self, now_ms: i64, expiry: Duration) -> bool {
        // Timestamps come from client storage and can be anything
        now_ms.saturating_sub(self.timestamp) > expiry.as_millis() as i64
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QuotaStatus {
    pub count: u32,
    pub remaining: u32,
    pub max_messages: u32,
    pub can_send: bool,
    pub is_limit_reached: bool,
    pub is_initialized: bool,
}

/// Where a record lives and how its value is encoded.
#[derive(Clone, Copy)]
enum Location {
    LocalCount,
    LocalAppState,
    SessionCount,
    Cookie,
}

impl Location {
    const ALL: [Location; 4] = [
        Location::LocalCount,
        Location::LocalAppState,
        Location::SessionCount,
        Location::Cookie,
    ];

    fn name(&self) -> &'static str {
        match self {
            Location::LocalCount => "local.guestMsgCount",
            Location::LocalAppState => "local._app_state",
            Location::SessionCount => "session.guestMsgCount",
            Location::Cookie => "cookie.gmc",
        }
    }

    fn key(&self) -> &'static str {
        match self {
            Location::LocalCount | Location::SessionCount => COUNT_KEY,
            Location::LocalAppState => APP_STATE_KEY,
            Location::Cookie => COOKIE_KEY,
        }
    }

    fn store<'a>(&self, stores: &'a GuestStores) -> &'a BoxedStoragePort {
        match self {
            Location::LocalCount | Location::LocalAppState => &stores.local,
            Location::SessionCount => &stores.session,
            Location::Cookie => &stores.cookie,
        }
    }

    fn encode(&self, json: String) -> String {
        match self {
            // Cookie values can't hold `,` or `;`
            Location::Cookie => urlencoding::encode(&json).into_owned(),
            _ => json,
        }
    }

    fn decode(&self, raw: &str) -> Result<GuestQuotaRecord, Error> {
        let json = match self {
            Location::Cookie => urlencoding::decode(raw)?.into_owned(),
            _ => raw.to_string(),
        };
        Ok(serde_json::from_str(&json)?)
    }
}

fn swallow(action: &str, result: Result<(), Error>) {
    if let Err(e) = result {
        tracing::warn!("Ignoring guest storage failure during {}: {}", action, e);
    }
}

pub struct GuestQuotaTracker {
    config: QuotaConfig,
    stores: GuestStores,
    fingerprint_source: Box<dyn FingerprintSource + Send + Sync + 'static>,
    clock: BoxedClock,
    count: u32,
    fingerprint: String,
    initialized: bool,
}

impl GuestQuotaTracker {
    pub fn new(
        config: QuotaConfig,
        stores: GuestStores,
        fingerprint_source: impl FingerprintSource + Send + Sync + 'static,
    ) -> Self {
        Self {
            config,
            stores,
            fingerprint_source: Box::new(fingerprint_source),
            clock: Box::new(SystemClock),
            count: 0,
            fingerprint: String::new(),
            initialized: false,
        }
    }

    pub fn with_clock(mut self, clock: impl Clock + Send + Sync + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    /// Load the count from storage. Only the first call does any work,
    /// use `force_reinitialize` to load again.
    pub fn initialize(&mut self) {
        if self.initialized {
            return;
        }

        let fingerprint = self.fingerprint_source.fingerprint();
        let count = self.stored_count(&fingerprint);
        tracing::debug!(
            "Initialized guest quota with count {} for fingerprint {}...",
            count,
            fingerprint.chars().take(20).collect::<String>()
        );

        self.fingerprint = fingerprint;
        self.count = count;
        self.initialized = true;

        let now = self.clock.now_ms().to_string();
        swallow(
            "initialize",
            self.stores.session.set(RECENT_ACTIVITY_KEY, &now),
        );
    }

    /// Count one sent message and return the new count. Once the
    /// maximum is reached the count is returned unchanged and nothing
    /// is written.
    pub fn increment(&mut self) -> u32 {
        self.initialize();

        if self.count >= self.config.max_messages {
            tracing::debug!("Guest message limit reached at {}", self.count);
            return self.count;
        }

        self.count += 1;
        self.write_all(self.count);
        self.count
    }

    pub fn can_send(&self) -> bool {
        self.count < self.config.max_messages
    }

    pub fn reset_on_sign_in(&mut self) {
        tracing::debug!("Resetting guest message count on sign-in");
        self.count = 0;
        self.clear_storage();
    }

    /// Drop in-memory state and load from storage again. Used when a
    /// signed in session goes back to being a guest.
    pub fn force_reinitialize(&mut self) {
        tracing::debug!("Force reinitializing guest quota");
        self.count = 0;
        self.fingerprint.clear();
        self.initialized = false;
        self.initialize();
    }

    /// Set the count back to zero and persist the zero everywhere.
    pub fn reset_count(&mut self) {
        self.initialize();
        self.count = 0;
        self.write_all(0);
    }

    /// Remove every trace of guest state and return to uninitialized.
    pub fn clear_all_storage(&mut self) {
        tracing::debug!("Clearing all guest quota storage");
        self.clear_storage();
        self.count = 0;
        self.fingerprint.clear();
        self.initialized = false;
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn max_messages(&self) -> u32 {
        self.config.max_messages
    }

    pub fn remaining(&self) -> u32 {
        self.config.max_messages.saturating_sub(self.count)
    }

    pub fn is_limit_reached(&self) -> bool {
        !self.can_send()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn status(&self) -> QuotaStatus {
        QuotaStatus {
            count: self.count,
            remaining: self.remaining(),
            max_messages: self.config.max_messages,
            can_send: self.can_send(),
            is_limit_reached: self.is_limit_reached(),
            is_initialized: self.initialized,
        }
    }

    /// Largest count among records that match `fingerprint` and
    /// haven't expired, capped at the maximum.
    fn stored_count(&self, fingerprint: &str) -> u32 {
        let now = self.clock.now_ms();
        Location::ALL
            .iter()
            .filter_map(|location| self.read_record(*location))
            .filter(|(location, record)| {
                let matches = record.fingerprint == fingerprint;
                let expired = record.is_expired(now, self.config.expiry);
                if !matches || expired {
                    tracing::debug!(
                        "Ignoring record from {} (fingerprint match: {}, expired: {})",
                        location.name(),
                        matches,
                        expired
                    );
                }
                matches && !expired
            })
            .map(|(_, record)| record.count)
            .max()
            .unwrap_or(0)
            .min(self.config.max_messages)
    }

    fn read_record(&self, location: Location) -> Option<(Location, GuestQuotaRecord)> {
        let raw = match location.store(&self.stores).get(location.key()) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!("Failed to read {}: {}", location.name(), e);
                return None;
            }
        };
        match location.decode(&raw) {
            Ok(record) => Some((location, record)),
            Err(e) => {
                tracing::warn!("Failed to parse {}: {}", location.name(), e);
                None
            }
        }
    }

    fn write_all(&self, count: u32) {
        let record = GuestQuotaRecord {
            count,
            timestamp: self.clock.now_ms(),
            fingerprint: self.fingerprint.clone(),
        };
        let json = match serde_json::to_string(&record) {
            Ok(json) => json,
            Err(e) => {
                tracing::warn!("Failed to serialize guest quota record: {}", e);
                return;
            }
        };
        for location in Location::ALL {
            let value = location.encode(json.clone());
            swallow(
                location.name(),
                location.store(&self.stores).set(location.key(), &value),
            );
        }
    }

    fn clear_storage(&self) {
        for location in Location::ALL {
            swallow(
                location.name(),
                location.store(&self.stores).remove(location.key()),
            );
        }
        swallow(
            "session._recent_activity",
            self.stores.session.remove(RECENT_ACTIVITY_KEY),
        );
    }
}
