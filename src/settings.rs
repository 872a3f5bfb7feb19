//! Typed analysis settings backed by the persistent store.
//!
//! Values are parsed once when loaded and written back one field at a time.
//! Everything in between works on typed values.

use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::SettingsError;
use crate::store::{StorageKeys, Store};

/// Default target depth before the estimator has measured anything
pub const DEFAULT_MAX_DEPTH: u32 = 18;

/// Default transposition table size hint in MB
pub const DEFAULT_HASH_MB: u32 = 128;

pub const MIN_MAX_DEPTH: u32 = 6;
pub const MAX_MAX_DEPTH: u32 = 98;
pub const MAX_MULTI_PV: u32 = 5;
pub const MIN_HASH_MB: u32 = 16;
pub const MAX_HASH_MB: u32 = 1024;

/// Individually persisted settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SettingKey {
    MaxDepth,
    MultiPv,
    Threads,
    HashSize,
    Infinite,
    Enabled,
}

impl SettingKey {
    /// Unprefixed storage key.
    #[must_use]
    pub const fn storage_key(self) -> &'static str {
        match self {
            SettingKey::MaxDepth => "ceval.max-depth",
            SettingKey::MultiPv => "ceval.multipv",
            SettingKey::Threads => "ceval.threads",
            SettingKey::HashSize => "ceval.hash-size",
            SettingKey::Infinite => "ceval.infinite",
            SettingKey::Enabled => "client-eval-enabled",
        }
    }
}

/// Analysis settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Settings {
    /// Target depth for bounded analysis
    pub max_depth: u32,
    /// Number of candidate lines requested
    pub multi_pv: u32,
    /// Worker thread hint
    pub threads: u32,
    /// Memory hint in MB
    pub hash_size: u32,
    /// Run every analysis until explicitly stopped
    pub infinite: bool,
}

impl Settings {
    /// Defaults for a host with `concurrency` hardware threads.
    #[must_use]
    pub fn defaults(concurrency: usize, multi_pv_default: Option<u32>) -> Self {
        let concurrency = u32::try_from(concurrency.max(1)).unwrap_or(u32::MAX);
        Settings {
            max_depth: DEFAULT_MAX_DEPTH,
            multi_pv: multi_pv_default.unwrap_or(1).clamp(1, MAX_MULTI_PV),
            threads: concurrency.div_ceil(2),
            hash_size: DEFAULT_HASH_MB,
            infinite: false,
        }
    }

    /// Read every setting, falling back to `defaults` for absent, unparseable
    /// or out-of-range values.
    ///
    /// Stored numbers must satisfy the same ranges as [`Settings::apply_option`],
    /// except that the thread count is only required to be positive.
    #[must_use]
    pub fn load(store: &dyn Store, keys: &StorageKeys, defaults: Settings) -> Self {
        let load = |key, default, range| load_u32(store, keys, key, default, range);
        Settings {
            max_depth: load(
                SettingKey::MaxDepth,
                defaults.max_depth,
                (MIN_MAX_DEPTH, MAX_MAX_DEPTH),
            ),
            multi_pv: load(SettingKey::MultiPv, defaults.multi_pv, (1, MAX_MULTI_PV)),
            threads: load(SettingKey::Threads, defaults.threads, (1, u32::MAX)),
            hash_size: load(
                SettingKey::HashSize,
                defaults.hash_size,
                (MIN_HASH_MB, MAX_HASH_MB),
            ),
            infinite: load_bool(store, keys, SettingKey::Infinite, defaults.infinite),
        }
    }

    /// Write one field back to the store.
    pub fn persist(&self, key: SettingKey, store: &dyn Store, keys: &StorageKeys) {
        let value = match key {
            SettingKey::MaxDepth => self.max_depth.to_string(),
            SettingKey::MultiPv => self.multi_pv.to_string(),
            SettingKey::Threads => self.threads.to_string(),
            SettingKey::HashSize => self.hash_size.to_string(),
            SettingKey::Infinite => self.infinite.to_string(),
            SettingKey::Enabled => return,
        };
        store.set(&keys.key(key.storage_key()), &value);
    }

    /// Apply a textual option update.
    ///
    /// Names are case-insensitive. Returns the key that changed so the caller
    /// can persist it.
    pub fn apply_option(
        &mut self,
        name: &str,
        value: Option<&str>,
        max_threads: u32,
    ) -> Result<SettingKey, SettingsError> {
        let normalized = name.trim().to_ascii_lowercase();
        let value = value.map(str::trim).filter(|v| !v.is_empty());
        let require = || {
            value.ok_or_else(|| SettingsError::MissingValue {
                name: normalized.clone(),
            })
        };
        match normalized.as_str() {
            "max depth" | "maxdepth" | "depth" => {
                self.max_depth =
                    parse_ranged(&normalized, require()?, MIN_MAX_DEPTH, MAX_MAX_DEPTH)?;
                Ok(SettingKey::MaxDepth)
            }
            "multipv" => {
                self.multi_pv = parse_ranged(&normalized, require()?, 1, MAX_MULTI_PV)?;
                Ok(SettingKey::MultiPv)
            }
            "threads" => {
                self.threads = parse_ranged(&normalized, require()?, 1, max_threads.max(1))?;
                Ok(SettingKey::Threads)
            }
            "hash" => {
                self.hash_size = parse_ranged(&normalized, require()?, MIN_HASH_MB, MAX_HASH_MB)?;
                Ok(SettingKey::HashSize)
            }
            "infinite" => {
                let raw = require()?;
                self.infinite = parse_bool(raw).ok_or_else(|| SettingsError::InvalidValue {
                    name: normalized.clone(),
                    value: raw.to_string(),
                })?;
                Ok(SettingKey::Infinite)
            }
            _ => Err(SettingsError::UnknownOption {
                name: normalized.clone(),
            }),
        }
    }
}

/// Read the stored enablement flag. Only the literal `"1"` counts as enabled.
#[must_use]
pub fn load_enabled(store: &dyn Store, keys: &StorageKeys) -> bool {
    store.get(&keys.key(SettingKey::Enabled.storage_key())).as_deref() == Some("1")
}

pub fn persist_enabled(enabled: bool, store: &dyn Store, keys: &StorageKeys) {
    let value = if enabled { "1" } else { "0" };
    store.set(&keys.key(SettingKey::Enabled.storage_key()), value);
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn parse_ranged(name: &str, raw: &str, min: u32, max: u32) -> Result<u32, SettingsError> {
    let value = raw
        .parse::<u32>()
        .map_err(|_| SettingsError::InvalidValue {
            name: name.to_string(),
            value: raw.to_string(),
        })?;
    if !(min..=max).contains(&value) {
        return Err(SettingsError::OutOfRange {
            name: name.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(value)
}

fn load_u32(
    store: &dyn Store,
    keys: &StorageKeys,
    key: SettingKey,
    default: u32,
    (min, max): (u32, u32),
) -> u32 {
    let full = keys.key(key.storage_key());
    match store.get(&full) {
        None => default,
        Some(raw) => parse_ranged(&full, raw.trim(), min, max).unwrap_or_else(|e| {
            warn!("ignoring stored setting ({e}), using {default}");
            default
        }),
    }
}

fn load_bool(store: &dyn Store, keys: &StorageKeys, key: SettingKey, default: bool) -> bool {
    let full = keys.key(key.storage_key());
    match store.get(&full) {
        None => default,
        Some(raw) => parse_bool(&raw).unwrap_or_else(|| {
            warn!("ignoring unparseable setting {full}={raw:?}, using {default}");
            default
        }),
    }
}
