use std::fmt::{Debug, Display};
use std::ops::{Add, AddAssign};
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// Wall-clock seconds since the Unix epoch, or a span of seconds when used
/// as an interval. Fleet expiry stamps and beacon intervals share this unit.
#[derive(
    Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct TimeS(u64);

impl Display for TimeS {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for TimeS {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let secs = s.parse::<u64>()?;
        Ok(Self(secs))
    }
}

impl From<u64> for TimeS {
    fn from(f: u64) -> Self {
        Self(f)
    }
}

impl TimeS {
    pub const fn new(secs: u64) -> Self {
        Self(secs)
    }

    /// Current wall-clock time. The emulated network only compares stamps
    /// produced by this clock, so sub-second precision is not needed.
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Self(since_epoch.as_secs())
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn as_f64(&self) -> f64 {
        self.0 as f64
    }

    pub fn to_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }
}

impl Add for TimeS {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl AddAssign for TimeS {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
