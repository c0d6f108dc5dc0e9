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

pub mod builder;
mod init;

pub use builder::TimetableBuilder;

use crate::time::{
    validity_pattern::ValidityPatternIdx, Calendar, DateTime, PositiveDuration, ValidityPattern,
    ValidityPatterns,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

macro_rules! index_type {
    ($name:ident) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name {
            pub(crate) idx: usize,
        }

        impl $name {
            pub fn idx(&self) -> usize {
                self.idx
            }
        }
    };
}

index_type!(StopPointIdx);
index_type!(ConnectionIdx);
index_type!(JourneyPatternIdx);
index_type!(JourneyPatternPointIdx);
index_type!(VehicleJourneyIdx);

/// Properties a vehicle may offer. A request lists the ones it needs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VehicleProperties {
    pub wheelchair_accessible: bool,
    pub bike_accepted: bool,
    pub air_conditioned: bool,
    pub visual_announcement: bool,
    pub audible_announcement: bool,
}

impl VehicleProperties {
    /// `true` if every property set in `required` is also set in `self`.
    pub fn satisfies(&self, required: &VehicleProperties) -> bool {
        (!required.wheelchair_accessible || self.wheelchair_accessible)
            && (!required.bike_accepted || self.bike_accepted)
            && (!required.air_conditioned || self.air_conditioned)
            && (!required.visual_announcement || self.visual_announcement)
            && (!required.audible_announcement || self.audible_announcement)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StopProperties {
    pub wheelchair_boarding: bool,
    pub elevator: bool,
    pub escalator: bool,
    pub visual_announcement: bool,
    pub audible_announcement: bool,
}

impl StopProperties {
    pub fn satisfies(&self, required: &StopProperties) -> bool {
        (!required.wheelchair_boarding || self.wheelchair_boarding)
            && (!required.elevator || self.elevator)
            && (!required.escalator || self.escalator)
            && (!required.visual_announcement || self.visual_announcement)
            && (!required.audible_announcement || self.audible_announcement)
    }
}

/// What a request needs from the stops it goes through and the vehicles it boards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Accessibility {
    pub stop: StopProperties,
    pub vehicle: VehicleProperties,
}

#[derive(Debug, Clone)]
pub struct StopPoint {
    pub id: String,
    pub name: String,
    pub properties: StopProperties,
    pub(crate) journey_pattern_points: Vec<JourneyPatternPointIdx>,
    pub(crate) outgoing_connections: Vec<ConnectionIdx>,
    pub(crate) incoming_connections: Vec<ConnectionIdx>,
}

/// A walking transfer between two stop points.
///
/// A connection from a stop point to itself gives the minimum duration
/// needed to change vehicle at this stop point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from: StopPointIdx,
    pub to: StopPointIdx,
    pub duration: PositiveDuration,
    pub display_duration: PositiveDuration,
}

#[derive(Debug, Clone)]
pub struct JourneyPattern {
    pub id: String,
    pub route_id: String,
    pub line_id: String,
    pub network_id: String,
    pub physical_mode_id: String,
    pub(crate) points: Vec<JourneyPatternPointIdx>,
    /// sorted by departure time at the first point
    pub(crate) vehicle_journeys: Vec<VehicleJourneyIdx>,
    /// the frequency ones among `vehicle_journeys`
    pub(crate) frequency_vehicle_journeys: Vec<VehicleJourneyIdx>,
}

#[derive(Debug, Clone)]
pub struct JourneyPatternPoint {
    pub journey_pattern: JourneyPatternIdx,
    pub stop_point: StopPointIdx,
    pub order: usize,
}

/// Times are seconds since the start of the circulation day, and may exceed 24h.
/// For a frequency vehicle journey they are offsets from the start of each trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTime {
    pub arrival_time: u32,
    pub departure_time: u32,
    pub stop_point: StopPointIdx,
    pub journey_pattern_point: JourneyPatternPointIdx,
    pub pick_up_allowed: bool,
    pub drop_off_allowed: bool,
}

impl StopTime {
    /// `true` if a ride going in the search direction may end at this stop time.
    pub fn valid_end(&self, clockwise: bool) -> bool {
        if clockwise {
            self.drop_off_allowed
        } else {
            self.pick_up_allowed
        }
    }
}

/// A trip repeated every `headway` seconds, the first departure happening at
/// `start_time` and the last one no later than `end_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub start_time: u32,
    /// never smaller than `start_time`, a window crossing midnight ends after 24h
    pub end_time: u32,
    pub headway: u32,
}

impl Frequency {
    /// Earliest instant not before `target` at which a trip of the window
    /// passes at a stop `offset` seconds after its start.
    pub fn next_instant(&self, offset: u32, target: u32) -> Option<u32> {
        let lower = self.start_time + offset;
        let upper = self.end_time + offset;
        if target > upper {
            return None;
        }
        if target <= lower {
            return Some(lower);
        }
        let nb_of_headways = (target - lower + self.headway - 1) / self.headway;
        let instant = lower + nb_of_headways * self.headway;
        if instant > upper {
            None
        } else {
            Some(instant)
        }
    }

    /// Latest instant not after `target` at which a trip of the window
    /// passes at a stop `offset` seconds after its start.
    pub fn previous_instant(&self, offset: u32, target: u32) -> Option<u32> {
        let lower = self.start_time + offset;
        let upper = self.end_time + offset;
        if target < lower {
            return None;
        }
        let target = target.min(upper);
        Some(lower + ((target - lower) / self.headway) * self.headway)
    }

    /// All the instants at which a trip of the window passes at a stop `offset`
    /// seconds after its start.
    pub fn instants(&self, offset: u32) -> impl Iterator<Item = u32> {
        let lower = self.start_time + offset;
        let upper = self.end_time + offset;
        let headway = self.headway.max(1);
        (0..)
            .map(move |nb_of_headways: u32| lower + nb_of_headways * headway)
            .take_while(move |instant| *instant <= upper)
    }
}

#[derive(Debug, Clone)]
pub struct VehicleJourney {
    pub id: String,
    /// vehicle journeys sharing a meta id are variants of the same trip
    pub meta_id: String,
    pub journey_pattern: JourneyPatternIdx,
    pub validity_pattern: ValidityPatternIdx,
    pub properties: VehicleProperties,
    pub stop_times: Vec<StopTime>,
    pub frequency: Option<Frequency>,
    pub block_id: Option<String>,
    pub prev_vj: Option<VehicleJourneyIdx>,
    pub next_vj: Option<VehicleJourneyIdx>,
    pub calendars: Vec<String>,
    pub utc_to_local_offset: i32,
}

impl VehicleJourney {
    pub fn is_frequency(&self) -> bool {
        self.frequency.is_some()
    }

    pub fn first_stop_time(&self) -> Option<&StopTime> {
        self.stop_times.first()
    }

    pub fn last_stop_time(&self) -> Option<&StopTime> {
        self.stop_times.last()
    }
}

/// Flat sorted arrays used by the stop time lookup.
///
/// For a journey pattern with `n` scheduled vehicle journeys, the entries of the point at
/// `order` are `first_stop_time[jp] + order * n .. first_stop_time[jp] + (order + 1) * n`.
/// Entries are sorted by their clock time, in `[0, 86400)`.
#[derive(Debug, Clone, Default)]
pub(crate) struct RaptorIndex {
    pub(crate) departure_times: Vec<u32>,
    pub(crate) departure_vehicle_journeys: Vec<VehicleJourneyIdx>,
    pub(crate) arrival_times: Vec<u32>,
    pub(crate) arrival_vehicle_journeys: Vec<VehicleJourneyIdx>,
    pub(crate) first_stop_time: Vec<usize>,
    pub(crate) nb_trips: Vec<usize>,
}

/// The immutable public transit data a search runs on.
///
/// It is never mutated once built, and can be shared between threads running
/// concurrent searches.
#[derive(Debug, Clone)]
pub struct Timetable {
    pub(crate) calendar: Calendar,
    pub(crate) validity_patterns: ValidityPatterns,
    pub(crate) stop_points: Vec<StopPoint>,
    pub(crate) connections: Vec<Connection>,
    pub(crate) journey_patterns: Vec<JourneyPattern>,
    pub(crate) journey_pattern_points: Vec<JourneyPatternPoint>,
    pub(crate) vehicle_journeys: Vec<VehicleJourney>,
    pub(crate) raptor_index: RaptorIndex,

    pub(crate) stop_point_ids: HashMap<String, StopPointIdx>,
    pub(crate) vehicle_journey_ids: HashMap<String, VehicleJourneyIdx>,
}

impl Timetable {
    pub fn calendar(&self) -> &Calendar {
        &self.calendar
    }

    pub fn nb_of_stop_points(&self) -> usize {
        self.stop_points.len()
    }

    pub fn nb_of_journey_patterns(&self) -> usize {
        self.journey_patterns.len()
    }

    pub fn nb_of_vehicle_journeys(&self) -> usize {
        self.vehicle_journeys.len()
    }

    pub fn stop_point_idx(&self, id: &str) -> Option<StopPointIdx> {
        self.stop_point_ids.get(id).copied()
    }

    pub fn vehicle_journey_idx(&self, id: &str) -> Option<VehicleJourneyIdx> {
        self.vehicle_journey_ids.get(id).copied()
    }

    pub fn stop_point(&self, idx: StopPointIdx) -> &StopPoint {
        &self.stop_points[idx.idx]
    }

    pub fn stop_points(&self) -> impl Iterator<Item = StopPointIdx> {
        (0..self.stop_points.len()).map(|idx| StopPointIdx { idx })
    }

    pub fn connection(&self, idx: ConnectionIdx) -> &Connection {
        &self.connections[idx.idx]
    }

    pub fn journey_pattern(&self, idx: JourneyPatternIdx) -> &JourneyPattern {
        &self.journey_patterns[idx.idx]
    }

    pub fn journey_patterns(&self) -> impl Iterator<Item = JourneyPatternIdx> {
        (0..self.journey_patterns.len()).map(|idx| JourneyPatternIdx { idx })
    }

    pub fn journey_pattern_point(&self, idx: JourneyPatternPointIdx) -> &JourneyPatternPoint {
        &self.journey_pattern_points[idx.idx]
    }

    pub fn vehicle_journey(&self, idx: VehicleJourneyIdx) -> &VehicleJourney {
        &self.vehicle_journeys[idx.idx]
    }

    pub fn vehicle_journeys_of(
        &self,
        journey_pattern: JourneyPatternIdx,
    ) -> &[VehicleJourneyIdx] {
        &self.journey_patterns[journey_pattern.idx].vehicle_journeys
    }

    pub(crate) fn frequency_vehicle_journeys_of(
        &self,
        journey_pattern: JourneyPatternIdx,
    ) -> &[VehicleJourneyIdx] {
        &self.journey_patterns[journey_pattern.idx].frequency_vehicle_journeys
    }

    pub fn validity_pattern(&self, idx: ValidityPatternIdx) -> &ValidityPattern {
        self.validity_patterns.get(idx)
    }

    /// `true` if `vehicle_journey` circulates on `day`.
    pub fn circulates(&self, vehicle_journey: VehicleJourneyIdx, day: u32) -> bool {
        let vj = &self.vehicle_journeys[vehicle_journey.idx];
        self.validity_patterns.is_valid(vj.validity_pattern, day)
    }

    /// Journey pattern points at this stop point.
    pub fn journey_pattern_points_of(&self, stop_point: StopPointIdx) -> &[JourneyPatternPointIdx] {
        &self.stop_points[stop_point.idx].journey_pattern_points
    }

    /// Connections going out of `stop_point` (`clockwise`) or coming into it.
    pub fn connections_of(
        &self,
        stop_point: StopPointIdx,
        clockwise: bool,
    ) -> impl Iterator<Item = &Connection> + '_ {
        let stop_point = &self.stop_points[stop_point.idx];
        let connections = if clockwise {
            &stop_point.outgoing_connections
        } else {
            &stop_point.incoming_connections
        };
        connections.iter().map(move |idx| &self.connections[idx.idx])
    }

    /// The connection going from `from` to `to`, if any.
    pub fn find_connection(&self, from: StopPointIdx, to: StopPointIdx) -> Option<&Connection> {
        self.connections_of(from, true)
            .find(|connection| connection.to == to)
    }

    /// The minimum duration to change vehicle at `stop_point`.
    pub fn change_duration(&self, stop_point: StopPointIdx) -> PositiveDuration {
        self.find_connection(stop_point, stop_point)
            .map(|connection| connection.duration)
            .unwrap_or_else(PositiveDuration::zero)
    }

    /// The next point of the journey pattern in the search direction.
    pub fn next_point(
        &self,
        point: JourneyPatternPointIdx,
        clockwise: bool,
    ) -> Option<JourneyPatternPointIdx> {
        let jpp = &self.journey_pattern_points[point.idx];
        let points = &self.journey_patterns[jpp.journey_pattern.idx].points;
        if clockwise {
            points.get(jpp.order + 1).copied()
        } else if jpp.order > 0 {
            points.get(jpp.order - 1).copied()
        } else {
            None
        }
    }

    pub(crate) fn departures_of(
        &self,
        point: JourneyPatternPointIdx,
    ) -> (&[u32], &[VehicleJourneyIdx]) {
        let range = self.index_range(point);
        (
            &self.raptor_index.departure_times[range.clone()],
            &self.raptor_index.departure_vehicle_journeys[range],
        )
    }

    pub(crate) fn arrivals_of(&self, point: JourneyPatternPointIdx) -> (&[u32], &[VehicleJourneyIdx]) {
        let range = self.index_range(point);
        (
            &self.raptor_index.arrival_times[range.clone()],
            &self.raptor_index.arrival_vehicle_journeys[range],
        )
    }

    fn index_range(&self, point: JourneyPatternPointIdx) -> std::ops::Range<usize> {
        let jpp = &self.journey_pattern_points[point.idx];
        let jp = jpp.journey_pattern.idx;
        let nb_trips = self.raptor_index.nb_trips[jp];
        let start = self.raptor_index.first_stop_time[jp] + jpp.order * nb_trips;
        start..start + nb_trips
    }

    /// The absolute datetime at which the trip whose times are counted from
    /// `base` passes at the stop time.
    pub fn stop_time_datetime(base: DateTime, stop_time: &StopTime, arrival: bool) -> DateTime {
        let time = if arrival {
            stop_time.arrival_time
        } else {
            stop_time.departure_time
        };
        base + PositiveDuration::from_seconds(time)
    }
}
