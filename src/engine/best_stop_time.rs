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

use crate::time::{DateTime, PositiveDuration, SECONDS_PER_DAY};
use crate::timetable::{
    JourneyPatternPointIdx, StopTime, Timetable, VehicleJourney, VehicleJourneyIdx,
    VehicleProperties,
};
use std::collections::HashSet;

/// A trip found by the stop time lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopTimeMatch {
    pub vehicle_journey: VehicleJourneyIdx,
    /// position of the stop time in the vehicle journey
    pub order: usize,
    /// departure (clockwise) or arrival (counter-clockwise) at the stop time
    pub datetime: DateTime,
    /// the times of every stop time of this trip are counted from `base`
    pub base: DateTime,
}

impl StopTimeMatch {
    pub fn stop_time<'a>(&self, timetable: &'a Timetable) -> &'a StopTime {
        &timetable.vehicle_journey(self.vehicle_journey).stop_times[self.order]
    }
}

/// The first trip that can be boarded at `point` no earlier than `datetime`
/// (`clockwise`), or the last trip that can be left at `point` no later than `datetime`.
///
/// `None` means there is no such trip on the day of `datetime` nor on the
/// adjacent day. When `reconstructing_path` is set, the lookup replays a label
/// and only looks on the day of `datetime`.
pub fn best_stop_time(
    timetable: &Timetable,
    point: JourneyPatternPointIdx,
    datetime: DateTime,
    required: &VehicleProperties,
    clockwise: bool,
    reconstructing_path: bool,
) -> Option<StopTimeMatch> {
    if clockwise {
        earliest_stop_time(timetable, point, datetime, required, reconstructing_path)
    } else {
        tardiest_stop_time(timetable, point, datetime, required, reconstructing_path)
    }
}

pub fn earliest_stop_time(
    timetable: &Timetable,
    point: JourneyPatternPointIdx,
    datetime: DateTime,
    required: &VehicleProperties,
    reconstructing_path: bool,
) -> Option<StopTimeMatch> {
    if !datetime.is_finite() {
        return None;
    }
    let date = datetime.date();
    let found = earliest_on(timetable, point, date, datetime.hour(), required);
    let found_today = found.map_or(false, |found| found.datetime.date() == date);
    if found_today || reconstructing_path {
        return found;
    }

    // a trip of the next day may leave before a frequency trip found above
    let next_day = date + 1;
    if next_day > u32::from(timetable.calendar().nb_of_days()) {
        return found;
    }
    found
        .into_iter()
        .chain(earliest_on(timetable, point, next_day, 0, required))
        .min_by_key(|found| found.datetime)
}

pub fn tardiest_stop_time(
    timetable: &Timetable,
    point: JourneyPatternPointIdx,
    datetime: DateTime,
    required: &VehicleProperties,
    reconstructing_path: bool,
) -> Option<StopTimeMatch> {
    if !datetime.is_finite() {
        return None;
    }
    let date = datetime.date();
    let found = tardiest_on(timetable, point, date, datetime.hour(), required);
    let found_today = found.map_or(false, |found| found.datetime.date() == date);
    if found_today || reconstructing_path || date == 0 {
        return found;
    }

    let previous_day = date - 1;
    found
        .into_iter()
        .chain(tardiest_on(
            timetable,
            point,
            previous_day,
            SECONDS_PER_DAY - 1,
            required,
        ))
        .max_by_key(|found| found.datetime)
}

// Scheduled trips are sorted by clock time, the first one matching is the
// earliest. Frequency trips are all looked at.
fn earliest_on(
    timetable: &Timetable,
    point: JourneyPatternPointIdx,
    date: u32,
    hour: u32,
    required: &VehicleProperties,
) -> Option<StopTimeMatch> {
    let jpp = timetable.journey_pattern_point(point);
    let order = jpp.order;
    let (times, vehicle_journeys) = timetable.departures_of(point);
    let first = times.partition_point(|time| *time < hour);
    let scheduled = vehicle_journeys[first..]
        .iter()
        .find_map(|vj_idx| departure_on(timetable, *vj_idx, order, date, hour, required));
    timetable
        .frequency_vehicle_journeys_of(jpp.journey_pattern)
        .iter()
        .filter_map(|vj_idx| departure_on(timetable, *vj_idx, order, date, hour, required))
        .chain(scheduled)
        .min_by_key(|found| found.datetime)
}

fn tardiest_on(
    timetable: &Timetable,
    point: JourneyPatternPointIdx,
    date: u32,
    hour: u32,
    required: &VehicleProperties,
) -> Option<StopTimeMatch> {
    let jpp = timetable.journey_pattern_point(point);
    let order = jpp.order;
    let (times, vehicle_journeys) = timetable.arrivals_of(point);
    let end = times.partition_point(|time| *time <= hour);
    let scheduled = vehicle_journeys[..end]
        .iter()
        .rev()
        .find_map(|vj_idx| arrival_on(timetable, *vj_idx, order, date, hour, required));
    timetable
        .frequency_vehicle_journeys_of(jpp.journey_pattern)
        .iter()
        .filter_map(|vj_idx| arrival_on(timetable, *vj_idx, order, date, hour, required))
        .chain(scheduled)
        .max_by_key(|found| found.datetime)
}

// A departure of `vj_idx` at `order` happening on `date` no earlier than `hour`.
fn departure_on(
    timetable: &Timetable,
    vj_idx: VehicleJourneyIdx,
    order: usize,
    date: u32,
    hour: u32,
    required: &VehicleProperties,
) -> Option<StopTimeMatch> {
    let vj = timetable.vehicle_journey(vj_idx);
    let stop_time = &vj.stop_times[order];
    if !stop_time.pick_up_allowed || !vj.properties.satisfies(required) {
        return None;
    }
    let datetime = match &vj.frequency {
        None => {
            let time = stop_time.departure_time;
            if time % SECONDS_PER_DAY < hour {
                return None;
            }
            let circulation_day = date.checked_sub(time / SECONDS_PER_DAY)?;
            if !timetable.circulates(vj_idx, circulation_day) {
                return None;
            }
            DateTime::set(date, hour).update(time, true)
        }
        Some(_) => frequency_departure(timetable, vj_idx, vj, stop_time, date, hour)?,
    };
    let base = datetime - PositiveDuration::from_seconds(stop_time.departure_time);
    Some(StopTimeMatch {
        vehicle_journey: vj_idx,
        order,
        datetime,
        base,
    })
}

// An arrival of `vj_idx` at `order` happening on `date` no later than `hour`.
fn arrival_on(
    timetable: &Timetable,
    vj_idx: VehicleJourneyIdx,
    order: usize,
    date: u32,
    hour: u32,
    required: &VehicleProperties,
) -> Option<StopTimeMatch> {
    let vj = timetable.vehicle_journey(vj_idx);
    let stop_time = &vj.stop_times[order];
    if !stop_time.drop_off_allowed || !vj.properties.satisfies(required) {
        return None;
    }
    let datetime = match &vj.frequency {
        None => {
            let time = stop_time.arrival_time;
            if time % SECONDS_PER_DAY > hour {
                return None;
            }
            let circulation_day = date.checked_sub(time / SECONDS_PER_DAY)?;
            if !timetable.circulates(vj_idx, circulation_day) {
                return None;
            }
            DateTime::set(date, hour).update(time, false)
        }
        Some(_) => frequency_arrival(timetable, vj_idx, vj, stop_time, date, hour)?,
    };
    let base = datetime - PositiveDuration::from_seconds(stop_time.arrival_time);
    Some(StopTimeMatch {
        vehicle_journey: vj_idx,
        order,
        datetime,
        base,
    })
}

// The trips of a frequency window may have started the day before `date`
// when the window crosses midnight.
fn frequency_departure(
    timetable: &Timetable,
    vj_idx: VehicleJourneyIdx,
    vj: &VehicleJourney,
    stop_time: &StopTime,
    date: u32,
    hour: u32,
) -> Option<DateTime> {
    let frequency = vj.frequency.as_ref()?;
    let max_days_back = (frequency.end_time + stop_time.departure_time) / SECONDS_PER_DAY;
    (0..=max_days_back)
        .filter_map(|days_back| {
            let circulation_day = date.checked_sub(days_back)?;
            if !timetable.circulates(vj_idx, circulation_day) {
                return None;
            }
            let target = hour + days_back * SECONDS_PER_DAY;
            frequency
                .next_instant(stop_time.departure_time, target)
                .map(|instant| DateTime::set(circulation_day, instant))
        })
        .min()
}

fn frequency_arrival(
    timetable: &Timetable,
    vj_idx: VehicleJourneyIdx,
    vj: &VehicleJourney,
    stop_time: &StopTime,
    date: u32,
    hour: u32,
) -> Option<DateTime> {
    let frequency = vj.frequency.as_ref()?;
    let max_days_back = (frequency.end_time + stop_time.arrival_time) / SECONDS_PER_DAY;
    (0..=max_days_back)
        .filter_map(|days_back| {
            let circulation_day = date.checked_sub(days_back)?;
            if !timetable.circulates(vj_idx, circulation_day) {
                return None;
            }
            let target = hour + days_back * SECONDS_PER_DAY;
            frequency
                .previous_instant(stop_time.arrival_time, target)
                .map(|instant| DateTime::set(circulation_day, instant))
        })
        .max()
}

/// Every departure at `point` from `from` (included) until `until` (excluded),
/// sorted by datetime. Trips of frequency vehicle journeys are expanded.
pub fn departures_between(
    timetable: &Timetable,
    point: JourneyPatternPointIdx,
    from: DateTime,
    until: DateTime,
    required: &VehicleProperties,
) -> Vec<StopTimeMatch> {
    let mut result = Vec::new();
    if !from.is_finite() || !until.is_finite() || until <= from {
        return result;
    }
    let jpp = timetable.journey_pattern_point(point);
    let order = jpp.order;

    let (times, vehicle_journeys) = timetable.departures_of(point);
    for date in from.date()..=until.date() {
        let hour = if date == from.date() { from.hour() } else { 0 };
        let first = times.partition_point(|time| *time < hour);
        for vj_idx in &vehicle_journeys[first..] {
            let found = match departure_on(timetable, *vj_idx, order, date, hour, required) {
                Some(found) => found,
                None => continue,
            };
            if found.datetime >= until {
                break;
            }
            result.push(found);
        }
    }

    for vj_idx in timetable.frequency_vehicle_journeys_of(jpp.journey_pattern) {
        let vj = timetable.vehicle_journey(*vj_idx);
        let stop_time = &vj.stop_times[order];
        let frequency = match &vj.frequency {
            Some(frequency) => frequency,
            None => continue,
        };
        if !stop_time.pick_up_allowed || !vj.properties.satisfies(required) {
            continue;
        }
        let max_days_back = (frequency.end_time + stop_time.departure_time) / SECONDS_PER_DAY;
        for day in from.date().saturating_sub(max_days_back)..=until.date() {
            if !timetable.circulates(*vj_idx, day) {
                continue;
            }
            for instant in frequency.instants(stop_time.departure_time) {
                let datetime = DateTime::set(day, instant);
                if datetime >= until {
                    break;
                }
                if datetime < from {
                    continue;
                }
                result.push(StopTimeMatch {
                    vehicle_journey: *vj_idx,
                    order,
                    datetime,
                    base: datetime - PositiveDuration::from_seconds(stop_time.departure_time),
                });
            }
        }
    }

    result.sort_by_key(|found| (found.datetime, found.vehicle_journey));
    result
}

/// Local departure times at `point` of the vehicle journeys associated to `calendar_id`.
///
/// Frequency vehicle journeys are expanded, and only the first vehicle journey
/// of each meta vehicle journey is considered. The result is sorted by time.
pub fn calendar_departures(
    timetable: &Timetable,
    point: JourneyPatternPointIdx,
    calendar_id: &str,
    required: &VehicleProperties,
) -> Vec<(u32, VehicleJourneyIdx)> {
    let jpp = timetable.journey_pattern_point(point);
    let mut seen_meta_vjs = HashSet::new();
    let mut result = Vec::new();
    for vj_idx in timetable.vehicle_journeys_of(jpp.journey_pattern) {
        let vj = timetable.vehicle_journey(*vj_idx);
        if !vj.calendars.iter().any(|calendar| calendar == calendar_id) {
            continue;
        }
        if !seen_meta_vjs.insert(vj.meta_id.as_str()) {
            continue;
        }
        let stop_time = &vj.stop_times[jpp.order];
        if !stop_time.pick_up_allowed || !vj.properties.satisfies(required) {
            continue;
        }
        let to_local = |time: u32| -> u32 {
            let local = i64::from(time) + i64::from(vj.utc_to_local_offset);
            local.rem_euclid(i64::from(SECONDS_PER_DAY)) as u32
        };
        match &vj.frequency {
            Some(frequency) => {
                for instant in frequency.instants(stop_time.departure_time) {
                    result.push((to_local(instant), *vj_idx));
                }
            }
            None => result.push((to_local(stop_time.departure_time), *vj_idx)),
        }
    }
    result.sort();
    result
}
