//! In-memory TTL cache for provider responses.
//!
//! Coordinates are snapped to a grid of `10^-accuracy` degrees before lookup,
//! so nearby positions share one entry. Entries expire lazily: an expired
//! entry is removed the next time it is looked up.

use parking_lot::Mutex;
use rainman_core::MAX_ACCURACY;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use crate::types::Coordinates;

/// Largest scaled magnitude an f64 still holds as an exact integer (2^53).
const MAX_EXACT_SCALED: u128 = 1 << 53;

/// Cache key: a coordinate pair rounded to `accuracy` decimal places.
///
/// Each axis is stored as an integer count of `10^-accuracy` degrees, which
/// keeps hashing and equality exact. The `Display` projection renders both
/// axes as plain decimals without trailing zeros and concatenates them with
/// no separator, e.g. `(1.2345, 6.789)` at accuracy 2 is `"1.236.79"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    latitude: i64,
    longitude: i64,
    accuracy: u32,
}

impl CacheKey {
    /// Round `coordinates` to `accuracy` decimal places, half away from zero.
    ///
    /// Rounding applies to the exact binary value of each coordinate, so a
    /// literal such as `1.005` (stored as `1.00499999...`) rounds down.
    ///
    /// Returns `None` for non-finite coordinates or values too large to be
    /// represented at the requested accuracy.
    pub fn new(coordinates: Coordinates, accuracy: u32) -> Option<Self> {
        let accuracy = accuracy.min(MAX_ACCURACY);
        Some(Self {
            latitude: scale(coordinates.latitude, accuracy)?,
            longitude: scale(coordinates.longitude, accuracy)?,
            accuracy,
        })
    }

    pub fn accuracy(&self) -> u32 {
        self.accuracy
    }

    /// Rounded latitude in degrees.
    pub fn latitude(&self) -> f64 {
        self.latitude as f64 / factor(self.accuracy)
    }

    /// Rounded longitude in degrees.
    pub fn longitude(&self) -> f64 {
        self.longitude as f64 / factor(self.accuracy)
    }

    /// Rounded latitude rendered as a plain decimal.
    pub fn latitude_str(&self) -> String {
        format_scaled(self.latitude, self.accuracy)
    }

    /// Rounded longitude rendered as a plain decimal.
    pub fn longitude_str(&self) -> String {
        format_scaled(self.longitude, self.accuracy)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.latitude_str(), self.longitude_str())
    }
}

fn factor(accuracy: u32) -> f64 {
    10f64.powi(accuracy as i32)
}

/// Scale `value` by `10^accuracy` and round half away from zero, without an
/// intermediate float multiplication.
fn scale(value: f64, accuracy: u32) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }

    // value == mantissa * 2^exponent, exactly.
    let bits = value.to_bits();
    let biased = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1 << 52) - 1);
    let (mantissa, exponent) = if biased == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1 << 52), biased - 1075)
    };

    // Below 2^93 since accuracy <= 12.
    let numerator = u128::from(mantissa) * u128::from(10u64.pow(accuracy));
    let magnitude = if exponent >= 0 {
        if exponent > 34 {
            return None;
        }
        numerator << exponent
    } else {
        let shift = exponent.unsigned_abs();
        if shift >= 128 {
            0
        } else {
            let quotient = numerator >> shift;
            let remainder = numerator & ((1 << shift) - 1);
            if remainder >= 1 << (shift - 1) {
                quotient + 1
            } else {
                quotient
            }
        }
    };

    if magnitude > MAX_EXACT_SCALED {
        return None;
    }
    let magnitude = i64::try_from(magnitude).ok()?;
    Some(if value.is_sign_negative() {
        -magnitude
    } else {
        magnitude
    })
}

/// Render `units * 10^-accuracy` with no trailing zeros, no trailing decimal
/// point and no negative zero.
fn format_scaled(units: i64, accuracy: u32) -> String {
    let divisor = 10u64.pow(accuracy);
    let magnitude = units.unsigned_abs();
    let whole = magnitude / divisor;
    let fraction = magnitude % divisor;

    let mut out = String::new();
    if units < 0 {
        out.push('-');
    }
    out.push_str(&whole.to_string());

    if fraction != 0 {
        let digits = format!("{:0width$}", fraction, width = accuracy as usize);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// A cached provider response.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub data: Value,
    /// Unix timestamp in milliseconds after which the entry is stale.
    pub expires_at: i64,
}

impl CacheEntry {
    pub fn is_fresh(&self, now_millis: i64) -> bool {
        self.expires_at > now_millis
    }
}

/// Per-client response cache. Unbounded; entries leave only through expiry,
/// [`remove`](Self::remove) or [`clear`](Self::clear).
#[derive(Debug)]
pub struct WeatherCache {
    entries: Mutex<HashMap<CacheKey, CacheEntry>>,
    ttl_millis: i64,
}

impl WeatherCache {
    pub fn new(ttl_millis: i64) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl_millis,
        }
    }

    /// Return the cached data for `key` if it is still fresh at `now_millis`.
    /// A stale entry is removed.
    pub fn get_fresh(&self, key: &CacheKey, now_millis: i64) -> Option<Value> {
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.is_fresh(now_millis) => {
                tracing::debug!(%key, "Weather cache hit");
                Some(entry.data.clone())
            }
            Some(_) => {
                entries.remove(key);
                tracing::debug!(%key, "Weather cache entry expired");
                None
            }
            None => {
                tracing::debug!(%key, "Weather cache miss");
                None
            }
        }
    }

    /// Insert or overwrite the entry for `key`, expiring one TTL after `now_millis`.
    pub fn insert(&self, key: CacheKey, data: Value, now_millis: i64) {
        let entry = CacheEntry {
            data,
            expires_at: now_millis.saturating_add(self.ttl_millis),
        };
        self.entries.lock().insert(key, entry);
    }

    /// Inspect an entry without applying expiry.
    pub fn get(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().get(key).cloned()
    }

    pub fn remove(&self, key: &CacheKey) -> Option<CacheEntry> {
        self.entries.lock().remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }

    /// Drop every entry that is stale at `now_millis`. Returns how many were removed.
    pub fn purge_expired(&self, now_millis: i64) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|_, entry| entry.is_fresh(now_millis));
        before - entries.len()
    }
}
