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

use super::{DateTime, SECONDS_PER_DAY};
use chrono::{NaiveDate, NaiveDateTime};
use std::convert::TryFrom;

pub const MAX_DAYS_IN_CALENDAR: u16 = u16::MAX / 2;

/// The production period of a timetable.
///
/// Day index 0 of a `DateTime` is `first_date`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Calendar {
    first_date: NaiveDate, //first date which may be allowed
    last_date: NaiveDate,  //last date (included) which may be allowed
    nb_of_days: u16,       // == (last_date - first_date).num_of_days() + 1
}

impl Calendar {
    pub fn new(first_date: NaiveDate, last_date: NaiveDate) -> Self {
        assert!(first_date <= last_date);
        let nb_of_days_i64: i64 = (last_date - first_date).num_days() + 1;
        assert!(
            nb_of_days_i64 < i64::from(MAX_DAYS_IN_CALENDAR),
            "Trying to construct a calendar with {:#} days \
            which is more than the maximum allowed of {:#} days",
            nb_of_days_i64,
            MAX_DAYS_IN_CALENDAR
        );

        // cannot fail : 0 < nb_of_days_i64 < MAX_DAYS_IN_CALENDAR
        let nb_of_days = u16::try_from(nb_of_days_i64).unwrap_or(MAX_DAYS_IN_CALENDAR);

        Self {
            first_date,
            last_date,
            nb_of_days,
        }
    }

    pub fn nb_of_days(&self) -> u16 {
        self.nb_of_days
    }

    pub fn days(&self) -> impl Iterator<Item = u32> {
        0..u32::from(self.nb_of_days)
    }

    pub fn first_date(&self) -> &NaiveDate {
        &self.first_date
    }

    pub fn last_date(&self) -> &NaiveDate {
        &self.last_date
    }

    pub fn contains_date(&self, date: &NaiveDate) -> bool {
        self.first_date <= *date && *date <= self.last_date
    }

    pub fn contains_datetime(&self, datetime: &NaiveDateTime) -> bool {
        self.contains_date(&datetime.date())
    }

    pub fn to_naive_date(&self, day: u32) -> NaiveDate {
        self.first_date + chrono::Duration::days(i64::from(day))
    }

    pub fn date_to_days_since_start(&self, date: &NaiveDate) -> Option<u32> {
        if !self.contains_date(date) {
            return None;
        }
        u32::try_from((*date - self.first_date).num_days()).ok()
    }

    /// `None` when the date of `datetime` is outside of the calendar.
    pub fn from_naive_datetime(&self, datetime: &NaiveDateTime) -> Option<DateTime> {
        let day = self.date_to_days_since_start(&datetime.date())?;
        let seconds = (datetime.time() - chrono::NaiveTime::from_hms(0, 0, 0)).num_seconds();
        let seconds = u32::try_from(seconds).ok()?;
        debug_assert!(seconds < SECONDS_PER_DAY);
        Some(DateTime::set(day, seconds))
    }

    pub fn to_naive_datetime(&self, datetime: &DateTime) -> NaiveDateTime {
        self.first_date.and_hms(0, 0, 0) + chrono::Duration::seconds(datetime.total_seconds())
    }

    pub fn to_string(&self, datetime: &DateTime) -> String {
        if !datetime.is_finite() {
            return datetime.to_string();
        }
        self.to_naive_datetime(datetime)
            .format("%Y%m%dT%H%M%S")
            .to_string()
    }

    pub fn to_pretty_string(&self, datetime: &DateTime) -> String {
        if !datetime.is_finite() {
            return datetime.to_string();
        }
        self.to_naive_datetime(datetime)
            .format("%H:%M:%S %d-%b-%y")
            .to_string()
    }
}
