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

//! Fluent construction of a [`Timetable`](super::Timetable).
//!
//! Stop points are created on the fly the first time a vehicle journey or a
//! connection mentions them.

use super::{
    init, Connection, Frequency, StopPoint, StopPointIdx, StopProperties, Timetable,
    VehicleProperties,
};
use crate::time::{Calendar, PositiveDuration, SECONDS_PER_DAY};
use chrono::NaiveDate;
use std::collections::HashMap;

const DEFAULT_ROUTE_ID: &str = "default_route";
const DEFAULT_LINE_ID: &str = "default_line";
const DEFAULT_NETWORK_ID: &str = "default_network";
const DEFAULT_PHYSICAL_MODE_ID: &str = "default_physical_mode";

pub struct TimetableBuilder {
    pub(super) calendar: Calendar,
    pub(super) stop_points: Vec<StopPoint>,
    pub(super) stop_point_ids: HashMap<String, StopPointIdx>,
    pub(super) connections: Vec<Connection>,
    pub(super) vehicle_journeys: Vec<RawVehicleJourney>,
    pub(super) services: HashMap<String, Vec<NaiveDate>>,
    pub(super) default_transfer_duration: Option<PositiveDuration>,
}

#[derive(Debug, Clone)]
pub(super) struct RawStopTime {
    pub(super) stop_point: StopPointIdx,
    pub(super) arrival_time: u32,
    pub(super) departure_time: u32,
    pub(super) pick_up_allowed: bool,
    pub(super) drop_off_allowed: bool,
}

#[derive(Debug, Clone)]
pub(super) struct RawVehicleJourney {
    pub(super) id: String,
    pub(super) meta_id: String,
    pub(super) route_id: String,
    pub(super) line_id: String,
    pub(super) network_id: String,
    pub(super) physical_mode_id: String,
    pub(super) service_id: Option<String>,
    pub(super) properties: VehicleProperties,
    pub(super) stop_times: Vec<RawStopTime>,
    pub(super) frequency: Option<Frequency>,
    pub(super) block_id: Option<String>,
    pub(super) calendars: Vec<String>,
    pub(super) utc_to_local_offset: i32,
}

/// Stop time flags that can be tuned with [`VehicleJourneyBuilder::st_detailed`].
#[derive(Debug, Clone)]
pub struct StopTimeFlags {
    pub pick_up_allowed: bool,
    pub drop_off_allowed: bool,
}

pub trait IntoTime {
    fn into_time(&self) -> u32;
}

impl IntoTime for &str {
    fn into_time(&self) -> u32 {
        self.parse::<PositiveDuration>()
            .expect("invalid time format")
            .total_seconds()
    }
}

impl IntoTime for u32 {
    fn into_time(&self) -> u32 {
        *self
    }
}

pub trait AsDate {
    fn as_date(&self) -> NaiveDate;
}

impl AsDate for &str {
    fn as_date(&self) -> NaiveDate {
        NaiveDate::parse_from_str(self, "%Y-%m-%d").expect("invalid date format")
    }
}

impl AsDate for NaiveDate {
    fn as_date(&self) -> NaiveDate {
        *self
    }
}

impl TimetableBuilder {
    /// A timetable valid between `first_date` and `last_date`, both included.
    pub fn new(first_date: impl AsDate, last_date: impl AsDate) -> Self {
        Self {
            calendar: Calendar::new(first_date.as_date(), last_date.as_date()),
            stop_points: Vec::new(),
            stop_point_ids: HashMap::new(),
            connections: Vec::new(),
            vehicle_journeys: Vec::new(),
            services: HashMap::new(),
            default_transfer_duration: None,
        }
    }

    pub(super) fn find_or_create_sp(&mut self, id: &str) -> StopPointIdx {
        if let Some(idx) = self.stop_point_ids.get(id) {
            return *idx;
        }
        let idx = StopPointIdx {
            idx: self.stop_points.len(),
        };
        self.stop_points.push(StopPoint {
            id: id.to_string(),
            name: id.to_string(),
            properties: StopProperties::default(),
            journey_pattern_points: Vec::new(),
            outgoing_connections: Vec::new(),
            incoming_connections: Vec::new(),
        });
        self.stop_point_ids.insert(id.to_string(), idx);
        idx
    }

    /// Add a vehicle journey
    ///
    /// ```
    /// # use raptor_journeys::timetable::TimetableBuilder;
    /// let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00")
    ///                .st("B", "11:00:00");
    ///        })
    ///        .build();
    /// assert_eq!(timetable.nb_of_vehicle_journeys(), 1);
    /// ```
    pub fn vj<F>(mut self, id: &str, vj_initer: F) -> Self
    where
        F: FnOnce(VehicleJourneyBuilder),
    {
        let vj_idx = self.push_vj(id, None);
        vj_initer(VehicleJourneyBuilder {
            builder: &mut self,
            vj_idx,
        });
        self
    }

    /// Add a vehicle journey repeated every `headway` between `start_time` and `end_time`.
    ///
    /// Stop times are given relative to the start of each trip.
    /// An `end_time` smaller than `start_time` means the window crosses midnight.
    ///
    /// ```
    /// # use raptor_journeys::timetable::TimetableBuilder;
    /// let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
    ///        .frequency_vj("freq", "08:00:00", "18:00:00", "00:05:00", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "00:00:00")
    ///                .st("B", "00:10:00");
    ///        })
    ///        .build();
    /// let vj = timetable.vehicle_journey_idx("freq").unwrap();
    /// assert!(timetable.vehicle_journey(vj).is_frequency());
    /// ```
    pub fn frequency_vj<F>(
        mut self,
        id: &str,
        start_time: impl IntoTime,
        end_time: impl IntoTime,
        headway: impl IntoTime,
        vj_initer: F,
    ) -> Self
    where
        F: FnOnce(VehicleJourneyBuilder),
    {
        let start_time = start_time.into_time();
        let mut end_time = end_time.into_time();
        if end_time < start_time {
            end_time += SECONDS_PER_DAY;
        }
        let headway = headway.into_time();
        assert!(headway > 0, "the headway of {} must be positive", id);
        let frequency = Frequency {
            start_time,
            end_time,
            headway,
        };
        let vj_idx = self.push_vj(id, Some(frequency));
        vj_initer(VehicleJourneyBuilder {
            builder: &mut self,
            vj_idx,
        });
        self
    }

    fn push_vj(&mut self, id: &str, frequency: Option<Frequency>) -> usize {
        assert!(
            self.vehicle_journeys.iter().all(|vj| vj.id != id),
            "vehicle journey {} already exists",
            id
        );
        self.vehicle_journeys.push(RawVehicleJourney {
            id: id.to_string(),
            meta_id: id.to_string(),
            route_id: DEFAULT_ROUTE_ID.to_string(),
            line_id: DEFAULT_LINE_ID.to_string(),
            network_id: DEFAULT_NETWORK_ID.to_string(),
            physical_mode_id: DEFAULT_PHYSICAL_MODE_ID.to_string(),
            service_id: None,
            properties: VehicleProperties::default(),
            stop_times: Vec::new(),
            frequency,
            block_id: None,
            calendars: Vec::new(),
            utc_to_local_offset: 0,
        });
        self.vehicle_journeys.len() - 1
    }

    /// Add a walking connection from `from` to `to`
    ///
    /// ```
    /// # use raptor_journeys::timetable::TimetableBuilder;
    /// let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
    ///        .connection("A", "B", "00:02:00")
    ///        .build();
    /// let a = timetable.stop_point_idx("A").unwrap();
    /// let b = timetable.stop_point_idx("B").unwrap();
    /// assert!(timetable.find_connection(a, b).is_some());
    /// assert!(timetable.find_connection(b, a).is_none());
    /// ```
    pub fn connection(mut self, from: &str, to: &str, duration: impl IntoTime) -> Self {
        let duration = PositiveDuration::from_seconds(duration.into_time());
        let from = self.find_or_create_sp(from);
        let to = self.find_or_create_sp(to);
        self.connections.push(Connection {
            from,
            to,
            duration,
            display_duration: duration,
        });
        self
    }

    pub fn stop_point<F>(mut self, id: &str, sp_muter: F) -> Self
    where
        F: FnOnce(&mut StopPoint),
    {
        let idx = self.find_or_create_sp(id);
        sp_muter(&mut self.stop_points[idx.idx]);
        self
    }

    /// Declare the dates of a service, referenced by [`VehicleJourneyBuilder::calendar`].
    ///
    /// A vehicle journey without service circulates every day of the timetable.
    pub fn calendar(mut self, id: &str, dates: &[impl AsDate]) -> Self {
        let dates = dates.iter().map(|date| date.as_date()).collect();
        self.services.insert(id.to_string(), dates);
        self
    }

    /// Every stop point without a connection to itself receives one with this duration.
    pub fn default_transfer_duration(mut self, duration: PositiveDuration) -> Self {
        self.default_transfer_duration = Some(duration);
        self
    }

    pub fn build(self) -> Timetable {
        init::build_timetable(self)
    }
}

pub struct VehicleJourneyBuilder<'a> {
    builder: &'a mut TimetableBuilder,
    vj_idx: usize,
}

impl<'a> VehicleJourneyBuilder<'a> {
    fn vj(&mut self) -> &mut RawVehicleJourney {
        &mut self.builder.vehicle_journeys[self.vj_idx]
    }

    /// add a StopTime to the vehicle journey, arriving and leaving at the same time
    pub fn st(self, name: &str, time: impl IntoTime) -> Self {
        let time = time.into_time();
        self.st_detailed(name, time, time, |_| {})
    }

    /// ```
    /// # use raptor_journeys::timetable::TimetableBuilder;
    /// let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
    ///        .vj("toto", |vj_builder| {
    ///            vj_builder
    ///                .st("A", "10:00:00")
    ///                .st_detailed("B", "10:30:00", "10:32:00", |flags| {
    ///                    flags.pick_up_allowed = false;
    ///                });
    ///        })
    ///        .build();
    /// # let _ = timetable;
    /// ```
    pub fn st_detailed<F>(
        mut self,
        name: &str,
        arrival: impl IntoTime,
        departure: impl IntoTime,
        flags_muter: F,
    ) -> Self
    where
        F: FnOnce(&mut StopTimeFlags),
    {
        let stop_point = self.builder.find_or_create_sp(name);
        let mut flags = StopTimeFlags {
            pick_up_allowed: true,
            drop_off_allowed: true,
        };
        flags_muter(&mut flags);
        let stop_time = RawStopTime {
            stop_point,
            arrival_time: arrival.into_time(),
            departure_time: departure.into_time(),
            pick_up_allowed: flags.pick_up_allowed,
            drop_off_allowed: flags.drop_off_allowed,
        };
        self.vj().stop_times.push(stop_time);
        self
    }

    pub fn route(mut self, id: &str) -> Self {
        self.vj().route_id = id.to_string();
        self
    }

    pub fn line(mut self, id: &str) -> Self {
        self.vj().line_id = id.to_string();
        self
    }

    pub fn network(mut self, id: &str) -> Self {
        self.vj().network_id = id.to_string();
        self
    }

    pub fn physical_mode(mut self, id: &str) -> Self {
        self.vj().physical_mode_id = id.to_string();
        self
    }

    /// Set the service of the vj, declared with [`TimetableBuilder::calendar`]
    pub fn calendar(mut self, id: &str) -> Self {
        self.vj().service_id = Some(id.to_string());
        self
    }

    /// Associate a calendar, used by the calendar departures lookup
    pub fn associated_calendar(mut self, id: &str) -> Self {
        self.vj().calendars.push(id.to_string());
        self
    }

    pub fn meta_id(mut self, id: &str) -> Self {
        self.vj().meta_id = id.to_string();
        self
    }

    /// Vehicle journeys sharing a block id, one arriving before the other
    /// departs, are operated by the same vehicle.
    pub fn block_id(mut self, block_id: &str) -> Self {
        self.vj().block_id = Some(block_id.to_string());
        self
    }

    pub fn properties(mut self, properties: VehicleProperties) -> Self {
        self.vj().properties = properties;
        self
    }

    pub fn utc_to_local_offset(mut self, offset: i32) -> Self {
        self.vj().utc_to_local_offset = offset;
        self
    }
}
