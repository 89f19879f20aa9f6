use std::{fmt, ops::Deref, str::FromStr, time::Duration};

use uuid::Uuid;

use crate::SmsGuardError;

/// Milliseconds since the Unix epoch.
///
/// All time-dependent operations take their "now" from a [`Clock`](crate::Clock)
/// as a `Timestamp`, which keeps decisions reproducible under test.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Timestamp(u64);

impl Timestamp {
    /// The Unix epoch.
    pub const EPOCH: Timestamp = Timestamp(0);

    /// Build a timestamp from milliseconds since the Unix epoch.
    pub const fn from_millis(ms: u64) -> Self {
        Self(ms)
    }

    /// Milliseconds since the Unix epoch.
    pub const fn as_millis(&self) -> u64 {
        self.0
    }

    /// Time elapsed from `earlier` to `self`, zero if `earlier` is in the future.
    pub fn saturating_duration_since(&self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0))
    }

    /// `self` moved forward by `d`, saturating at the maximum representable value.
    pub fn saturating_add(&self, d: Duration) -> Self {
        let ms = u64::try_from(d.as_millis()).unwrap_or(u64::MAX);
        Self(self.0.saturating_add(ms))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", self.0)
    }
}

/// Opaque account identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AccountId(Uuid);

impl AccountId {
    /// Generate a fresh random account id.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for AccountId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl FromStr for AccountId {
    type Err = SmsGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| SmsGuardError::InvalidAccountId(s.to_string()))
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// A phone number in E.164 shape: an optional leading `+` followed by 1 to 15 digits.
///
/// Numbers are compared by their exact textual form; no normalization beyond
/// trimming surrounding whitespace is done.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "String", into = "String"))]
pub struct PhoneNumber(String);

impl PhoneNumber {
    /// Maximum number of digits allowed by E.164.
    pub const MAX_DIGITS: usize = 15;

    /// Borrow the number as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<&str> for PhoneNumber {
    type Error = SmsGuardError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let trimmed = value.trim();
        let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);

        if digits.is_empty()
            || digits.len() > Self::MAX_DIGITS
            || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(SmsGuardError::InvalidPhoneNumber(value.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }
}

impl TryFrom<String> for PhoneNumber {
    type Error = SmsGuardError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::try_from(value.as_str())
    }
}

impl FromStr for PhoneNumber {
    type Err = SmsGuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::try_from(s)
    }
}

impl From<PhoneNumber> for String {
    fn from(value: PhoneNumber) -> Self {
        value.0
    }
}

impl fmt::Display for PhoneNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Trailing window used by every sliding-window counter, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowSizeMs(u64);

impl Default for WindowSizeMs {
    fn default() -> Self {
        Self(1_000)
    }
}

impl Deref for WindowSizeMs {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u64> for WindowSizeMs {
    type Error = &'static str;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err("Window size must be greater than 0");
        }

        Ok(Self(value))
    }
}

/// Minimum spacing between two granted checks of a number, or of any two
/// numbers in the same account, in milliseconds.
///
/// Zero disables the cooldown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CooldownMs(u64);

impl Default for CooldownMs {
    fn default() -> Self {
        Self(1_000)
    }
}

impl Deref for CooldownMs {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<u64> for CooldownMs {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// Period between two reclamation sweeps, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SweepIntervalMs(u64);

impl Default for SweepIntervalMs {
    fn default() -> Self {
        Self(60 * 60 * 1_000)
    }
}

impl Deref for SweepIntervalMs {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u64> for SweepIntervalMs {
    type Error = &'static str;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err("Sweep interval must be greater than 0");
        }

        Ok(Self(value))
    }
}

/// How long a counter may stay unused before the sweeper evicts it, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetentionMs(u64);

impl Default for RetentionMs {
    fn default() -> Self {
        Self(60 * 60 * 1_000)
    }
}

impl Deref for RetentionMs {
    type Target = u64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TryFrom<u64> for RetentionMs {
    type Error = &'static str;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value == 0 {
            return Err("Retention must be greater than 0");
        }

        Ok(Self(value))
    }
}
