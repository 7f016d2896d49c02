//! Expiration policies, stored markers, and their evaluation.
//!
//! A paste's lifetime is recorded as a one-line *marker* in front of its
//! content. Two textual forms exist on disk:
//!
//! ```text
//! 2026-10-18T09:30:00.123456789Z                    absolute expiry
//! burnAfterReading#2026-10-17T09:30:00.123456789Z   burn marker + creation time
//! ```
//!
//! In memory the marker is the tagged [`Marker`] enum; [`evaluate`] turns it
//! into an [`Outcome`] for a given instant. Nothing here touches the
//! filesystem, and every function takes `now` explicitly.

use std::fmt;

use chrono::{DateTime, Datelike, SecondsFormat, TimeDelta, Utc};

const BURN_PREFIX: &str = "burnAfterReading";

/// How long a burn-after-reading paste survives reads after creation.
///
/// The creation flow redirects straight to the new paste; that first view
/// must not consume it.
pub const BURN_GRACE_SECS: i64 = 10;

/// The expiration choices offered on paste creation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Policy {
    BurnAfterReading,
    OneDay,
    OneMonth,
    /// Approximated as 100 years from creation.
    Never,
}

impl Policy {
    pub const ALL: [Policy; 4] = [Self::BurnAfterReading, Self::OneDay, Self::OneMonth, Self::Never];

    /// Parses the form value (`burnAfterReading`, `1_day`, `1_month`, `never`).
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "burnAfterReading" => Some(Self::BurnAfterReading),
            "1_day"            => Some(Self::OneDay),
            "1_month"          => Some(Self::OneMonth),
            "never"            => Some(Self::Never),
            _                  => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::BurnAfterReading => "burnAfterReading",
            Self::OneDay           => "1_day",
            Self::OneMonth         => "1_month",
            Self::Never            => "never",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::BurnAfterReading => "Burn after reading",
            Self::OneDay           => "1 day",
            Self::OneMonth         => "1 month",
            Self::Never            => "Never",
        }
    }
}

/// The expiration descriptor stored with a paste.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Marker {
    /// Expires at this instant.
    Absolute(DateTime<Utc>),
    /// Burns after reading; carries the creation instant.
    BurnAfterReading(DateTime<Utc>),
    /// Written for an unrecognized policy. Evaluates as expired.
    Unset,
    /// A non-empty marker whose timestamp does not parse.
    Unparseable { burn: bool, raw: String },
}

impl Marker {
    /// Computes the marker to store for `policy` at creation time `now`.
    ///
    /// `None` (an unrecognized policy name) yields [`Marker::Unset`].
    pub fn new(policy: Option<Policy>, now: DateTime<Utc>) -> Self {
        match policy {
            Some(Policy::BurnAfterReading) => Self::BurnAfterReading(now),
            Some(Policy::OneDay)           => Self::Absolute(now + TimeDelta::hours(24)),
            Some(Policy::OneMonth)         => Self::Absolute(now + TimeDelta::days(30)),
            Some(Policy::Never)            => Self::Absolute(now + TimeDelta::days(100 * 365)),
            None                           => Self::Unset,
        }
    }

    /// Parses a stored marker line. Never fails: junk becomes
    /// [`Marker::Unparseable`].
    pub fn parse(line: &str) -> Self {
        if line.is_empty() {
            return Self::Unset;
        }
        if let Some(rest) = line.strip_prefix(BURN_PREFIX) {
            let stamp = rest.strip_prefix('#').unwrap_or(rest);
            return match parse_timestamp(stamp) {
                Some(created) => Self::BurnAfterReading(created),
                None => Self::Unparseable { burn: true, raw: stamp.to_owned() },
            };
        }
        match parse_timestamp(line) {
            Some(expiry) => Self::Absolute(expiry),
            None => Self::Unparseable { burn: false, raw: line.to_owned() },
        }
    }

    pub fn is_burn_after_reading(&self) -> bool {
        matches!(self, Self::BurnAfterReading(_) | Self::Unparseable { burn: true, .. })
    }
}

impl fmt::Display for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute(t) => f.write_str(&format_timestamp(*t)),
            Self::BurnAfterReading(t) => write!(f, "{BURN_PREFIX}#{}", format_timestamp(*t)),
            Self::Unset => Ok(()),
            Self::Unparseable { burn: true, raw } => write!(f, "{BURN_PREFIX}#{raw}"),
            Self::Unparseable { burn: false, raw } => f.write_str(raw),
        }
    }
}

fn format_timestamp(t: DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

/// What a marker means at a given instant.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Outcome {
    /// Still alive; expires at `expiry`, `remaining` from now.
    Fresh { remaining: TimeDelta, expiry: DateTime<Utc> },
    /// Burn-after-reading paste inside its grace window. Keep it.
    BurnPending,
    /// Burn-after-reading paste past its grace window. This read consumes it.
    BurnConsumed,
    /// Past its absolute expiry. Delete and report not found.
    Expired,
}

/// Evaluates `marker` at `now`.
///
/// Unparseable timestamps count as zero elapsed time: a burn marker stays
/// pending and an absolute marker is fresh with nothing remaining.
pub fn evaluate(marker: &Marker, now: DateTime<Utc>) -> Outcome {
    match marker {
        Marker::BurnAfterReading(created) => burn_outcome((now - *created).num_seconds()),
        Marker::Absolute(expiry) if now >= *expiry => Outcome::Expired,
        Marker::Absolute(expiry) => Outcome::Fresh { remaining: *expiry - now, expiry: *expiry },
        Marker::Unset => Outcome::Expired,
        Marker::Unparseable { burn: true, .. } => burn_outcome(0),
        Marker::Unparseable { burn: false, .. } => Outcome::Fresh { remaining: TimeDelta::zero(), expiry: now },
    }
}

fn burn_outcome(elapsed_secs: i64) -> Outcome {
    if elapsed_secs <= BURN_GRACE_SECS {
        Outcome::BurnPending
    } else {
        Outcome::BurnConsumed
    }
}

/// Renders a coarse countdown: `in 42 s`, `in 5 m`, `in 3 h`, `in 2 day(s)`,
/// or `on October 17, 2126` once ten days or more remain.
pub fn humanize(remaining: TimeDelta, expiry: DateTime<Utc>) -> String {
    const MINUTE: i64 = 60;
    const HOUR: i64 = 60 * MINUTE;
    const DAY: i64 = 24 * HOUR;

    let secs = remaining.num_seconds().abs();
    if secs < MINUTE {
        format!("in {secs} s")
    } else if secs < HOUR {
        format!("in {} m", secs / MINUTE)
    } else if secs < DAY {
        format!("in {} h", secs / HOUR)
    } else if secs < 10 * DAY {
        format!("in {} day(s)", secs / DAY)
    } else {
        format!("on {} {}, {}", expiry.format("%B"), expiry.day(), expiry.year())
    }
}
