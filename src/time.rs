// Copyright  (C) 2020, Hove and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Hove (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

pub mod calendar;
pub mod validity_pattern;

pub use calendar::Calendar;
pub use validity_pattern::{ValidityPattern, ValidityPatterns};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

pub const SECONDS_PER_DAY: u32 = 86_400;

const SECONDS_PER_DAY_I64: i64 = SECONDS_PER_DAY as i64;

/// A point in time, counted in seconds from midnight of the first day of the calendar.
///
/// The day index and the seconds of the day are packed in one integer,
/// so the derived ordering is the `(day, seconds_of_day)` lexicographic order.
/// `DateTime::MIN` and `DateTime::INF` stand for "not reached yet" in
/// counter-clockwise and clockwise searches respectively, and compare
/// below/above every finite datetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateTime {
    seconds: i64,
}

impl DateTime {
    pub const MIN: DateTime = DateTime { seconds: i64::MIN };
    pub const INF: DateTime = DateTime { seconds: i64::MAX };

    /// `seconds` may be larger than a day, in which case the extra days are
    /// carried into the day index.
    pub fn set(day: u32, seconds: u32) -> Self {
        Self {
            seconds: i64::from(day) * SECONDS_PER_DAY_I64 + i64::from(seconds),
        }
    }

    /// The worst value for a search going in the given direction.
    pub fn unreached(clockwise: bool) -> Self {
        if clockwise {
            Self::INF
        } else {
            Self::MIN
        }
    }

    pub fn is_finite(&self) -> bool {
        *self != Self::MIN && *self != Self::INF
    }

    /// Day index. Datetimes before the first day of the calendar are clamped on day 0.
    pub fn date(&self) -> u32 {
        debug_assert!(self.is_finite());
        let day = self.seconds.div_euclid(SECONDS_PER_DAY_I64);
        day.clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Seconds elapsed since the start of the day, in `[0, 86400)`.
    pub fn hour(&self) -> u32 {
        debug_assert!(self.is_finite());
        self.seconds.rem_euclid(SECONDS_PER_DAY_I64) as u32
    }

    pub fn total_seconds(&self) -> i64 {
        self.seconds
    }

    /// Moves to the next (`clockwise`) or previous occurrence of the clock
    /// time `seconds_of_day`, staying on the same day when possible.
    ///
    /// The day index changes by at most one.
    pub fn update(&self, seconds_of_day: u32, clockwise: bool) -> DateTime {
        debug_assert!(self.is_finite());
        let new_hour = i64::from(seconds_of_day % SECONDS_PER_DAY);
        let current_hour = i64::from(self.hour());
        let mut day_start = self.seconds - current_hour;
        if clockwise && new_hour < current_hour {
            day_start += SECONDS_PER_DAY_I64;
        }
        if !clockwise && new_hour > current_hour {
            day_start -= SECONDS_PER_DAY_I64;
        }
        DateTime {
            seconds: day_start + new_hour,
        }
    }

    /// Number of seconds from `from` to `to`.
    ///
    /// When `to` is not after `from`, the clock time of `to` is read as its next
    /// occurrence after `from`: 86400 is added once to a negative clock difference.
    pub fn difference(from: DateTime, to: DateTime) -> u32 {
        debug_assert!(from.is_finite() && to.is_finite());
        if to >= from {
            let seconds = to.seconds - from.seconds;
            return seconds.min(i64::from(u32::MAX)) as u32;
        }
        let clock_difference = i64::from(to.hour()) - i64::from(from.hour());
        if clock_difference < 0 {
            (clock_difference + SECONDS_PER_DAY_I64) as u32
        } else {
            clock_difference as u32
        }
    }

    /// The duration from `earlier` to `self`, if `self` is not before `earlier`.
    pub fn duration_since(&self, earlier: &DateTime) -> Option<PositiveDuration> {
        if !self.is_finite() || !earlier.is_finite() || self < earlier {
            return None;
        }
        let seconds = self.seconds - earlier.seconds;
        u32::try_from(seconds)
            .ok()
            .map(|seconds| PositiveDuration { seconds })
    }

    /// `self + duration` when `clockwise`, `self - duration` otherwise.
    pub fn shift(&self, duration: PositiveDuration, clockwise: bool) -> DateTime {
        if clockwise {
            *self + duration
        } else {
            *self - duration
        }
    }

    /// `true` when `self` is strictly better than `other` for a search in the given direction.
    pub fn improves(&self, other: &DateTime, clockwise: bool) -> bool {
        if clockwise {
            self < other
        } else {
            self > other
        }
    }

    /// `true` when `self` does not go past `bound`: not after it when
    /// `clockwise`, not before it otherwise.
    pub fn is_within(&self, bound: &DateTime, clockwise: bool) -> bool {
        if clockwise {
            self <= bound
        } else {
            self >= bound
        }
    }
}

impl std::ops::Add<PositiveDuration> for DateTime {
    type Output = Self;

    fn add(self, rhs: PositiveDuration) -> Self::Output {
        if !self.is_finite() {
            return self;
        }
        DateTime {
            seconds: self.seconds.saturating_add(i64::from(rhs.seconds)),
        }
    }
}

impl std::ops::Sub<PositiveDuration> for DateTime {
    type Output = Self;

    fn sub(self, rhs: PositiveDuration) -> Self::Output {
        if !self.is_finite() {
            return self;
        }
        DateTime {
            seconds: self.seconds.saturating_sub(i64::from(rhs.seconds)),
        }
    }
}

impl Display for DateTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if *self == DateTime::INF {
            return write!(f, "+inf");
        }
        if *self == DateTime::MIN {
            return write!(f, "-inf");
        }
        let hour = self.hour();
        write!(
            f,
            "day {} {:02}:{:02}:{:02}",
            self.seconds.div_euclid(SECONDS_PER_DAY_I64),
            hour / 3600,
            (hour % 3600) / 60,
            hour % 60
        )
    }
}

#[derive(Debug, Eq, PartialEq, Clone, Copy, Ord, PartialOrd, Hash, Default)]
pub struct PositiveDuration {
    pub(crate) seconds: u32,
}

impl PositiveDuration {
    pub fn zero() -> Self {
        Self { seconds: 0 }
    }

    pub const fn from_hms(hours: u32, minutes: u32, seconds: u32) -> PositiveDuration {
        let total_seconds = seconds + 60 * minutes + 60 * 60 * hours;
        PositiveDuration {
            seconds: total_seconds,
        }
    }

    pub const fn from_seconds(seconds: u32) -> PositiveDuration {
        PositiveDuration { seconds }
    }

    pub fn total_seconds(&self) -> u32 {
        self.seconds
    }

    pub fn saturating_sub(&self, rhs: PositiveDuration) -> PositiveDuration {
        PositiveDuration {
            seconds: self.seconds.saturating_sub(rhs.seconds),
        }
    }
}

impl Display for PositiveDuration {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let hours = self.seconds / (60 * 60);
        let minutes_in_secs = self.seconds % (60 * 60);
        let minutes = minutes_in_secs / 60;
        let seconds = minutes_in_secs % 60;
        if hours != 0 {
            write!(f, "{}h{:02}m{:02}s", hours, minutes, seconds)
        } else if minutes != 0 {
            write!(f, "{}m{:02}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

impl std::ops::Add for PositiveDuration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            seconds: self.seconds + rhs.seconds,
        }
    }
}

impl std::ops::Mul<u32> for PositiveDuration {
    type Output = Self;

    fn mul(self, rhs: u32) -> Self::Output {
        PositiveDuration {
            seconds: self.seconds * rhs,
        }
    }
}

impl std::iter::Sum for PositiveDuration {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(PositiveDuration::zero(), |acc, duration| acc + duration)
    }
}

/// Parses `"HH:MM:SS"` (hours may exceed 23) or a plain number of seconds.
impl std::str::FromStr for PositiveDuration {
    type Err = DurationParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let error = || DurationParseError {
            input: s.to_string(),
        };
        let parts: Vec<&str> = s.trim().split(':').collect();
        let seconds = match parts.as_slice() {
            [seconds] => seconds.parse::<u32>().map_err(|_| error())?,
            [hours, minutes, seconds] => {
                let hours = hours.parse::<u32>().map_err(|_| error())?;
                let minutes = minutes.parse::<u32>().map_err(|_| error())?;
                let seconds = seconds.parse::<u32>().map_err(|_| error())?;
                if minutes >= 60 || seconds >= 60 {
                    return Err(error());
                }
                hours
                    .checked_mul(3600)
                    .and_then(|total| total.checked_add(minutes * 60 + seconds))
                    .ok_or_else(error)?
            }
            _ => return Err(error()),
        };
        Ok(PositiveDuration { seconds })
    }
}

#[derive(Debug, Clone)]
pub struct DurationParseError {
    input: String,
}

impl std::error::Error for DurationParseError {}

impl Display for DurationParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Unable to parse `{}` as a duration. Expected format is 01:05:00",
            self.input
        )
    }
}

impl Serialize for PositiveDuration {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let hours = self.seconds / 3600;
        let minutes = (self.seconds % 3600) / 60;
        let seconds = self.seconds % 60;
        serializer.serialize_str(&format!("{:02}:{:02}:{:02}", hours, minutes, seconds))
    }
}

impl<'de> Deserialize<'de> for PositiveDuration {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let string = String::deserialize(deserializer)?;
        string.parse().map_err(serde::de::Error::custom)
    }
}
