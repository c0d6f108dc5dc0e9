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

use crate::timetable::{JourneyPattern, JourneyPatternIdx, StopPointIdx, Timetable};
use tracing::warn;

pub const PREFIX_ID_LINE: &str = "line:";
pub const PREFIX_ID_ROUTE: &str = "route:";
pub const PREFIX_ID_NETWORK: &str = "network:";
pub const PREFIX_ID_PHYSICAL_MODE: &str = "physical_mode:";
pub const PREFIX_ID_JOURNEY_PATTERN: &str = "journey_pattern:";
pub const PREFIX_ID_STOP_POINT: &str = "stop_point:";

pub enum StopFilter<'a> {
    StopPoint(&'a str),
}

pub enum VehicleFilter<'a> {
    Line(&'a str),
    Route(&'a str),
    Network(&'a str),
    PhysicalMode(&'a str),
    JourneyPattern(&'a str),
}

impl<'a> VehicleFilter<'a> {
    pub fn applies_on(&self, journey_pattern: &JourneyPattern) -> bool {
        match self {
            VehicleFilter::Line(line_id) => journey_pattern.line_id == *line_id,
            VehicleFilter::Route(route_id) => journey_pattern.route_id == *route_id,
            VehicleFilter::Network(network_id) => journey_pattern.network_id == *network_id,
            VehicleFilter::PhysicalMode(physical_mode_id) => {
                journey_pattern.physical_mode_id == *physical_mode_id
            }
            VehicleFilter::JourneyPattern(journey_pattern_id) => {
                journey_pattern.id == *journey_pattern_id
            }
        }
    }
}

impl<'a> StopFilter<'a> {
    pub fn applies_on(&self, idx: StopPointIdx, timetable: &Timetable) -> bool {
        match self {
            StopFilter::StopPoint(stop_point_id) => {
                *stop_point_id == timetable.stop_point(idx).id
            }
        }
    }
}

enum Filter<'a> {
    Stop(StopFilter<'a>),
    Vehicle(VehicleFilter<'a>),
}

/// Restrictions on the journey patterns a search may use and the stop points it may go through.
pub struct Filters<'a> {
    allowed_vehicles: Vec<VehicleFilter<'a>>,
    forbidden_vehicles: Vec<VehicleFilter<'a>>,
    allowed_stops: Vec<StopFilter<'a>>,
    forbidden_stops: Vec<StopFilter<'a>>,
}

impl<'a> Filters<'a> {
    pub fn is_journey_pattern_valid(&self, journey_pattern: &JourneyPattern) -> bool {
        // if *one* forbidden filter applies, then the journey pattern is invalid
        if self
            .forbidden_vehicles
            .iter()
            .any(|filter| filter.applies_on(journey_pattern))
        {
            return false;
        }
        // if there is no allowed_filter, then the journey pattern is valid
        if self.allowed_vehicles.is_empty() {
            return true;
        }
        // otherwise *one* allowed filter must apply
        self.allowed_vehicles
            .iter()
            .any(|filter| filter.applies_on(journey_pattern))
    }

    pub fn is_stop_point_valid(&self, idx: StopPointIdx, timetable: &Timetable) -> bool {
        if self
            .forbidden_stops
            .iter()
            .any(|filter| filter.applies_on(idx, timetable))
        {
            return false;
        }
        if self.allowed_stops.is_empty() {
            return true;
        }
        self.allowed_stops
            .iter()
            .any(|filter| filter.applies_on(idx, timetable))
    }

    /// `None` when no filter could be parsed.
    pub fn new<T>(
        timetable: &Timetable,
        forbidden_uri: &'a [T],
        allowed_uri: &'a [T],
    ) -> Option<Filters<'a>>
    where
        T: AsRef<str>,
    {
        let mut result = Filters {
            allowed_vehicles: Vec::new(),
            forbidden_vehicles: Vec::new(),
            allowed_stops: Vec::new(),
            forbidden_stops: Vec::new(),
        };
        for filter_str in allowed_uri {
            match parse_filter(timetable, filter_str.as_ref(), "allowed_id[]") {
                Ok(Filter::Stop(stop_filter)) => result.allowed_stops.push(stop_filter),
                Ok(Filter::Vehicle(vehicle_filter)) => result.allowed_vehicles.push(vehicle_filter),
                Err(()) => (),
            }
        }
        for filter_str in forbidden_uri {
            match parse_filter(timetable, filter_str.as_ref(), "forbidden_id[]") {
                Ok(Filter::Stop(stop_filter)) => result.forbidden_stops.push(stop_filter),
                Ok(Filter::Vehicle(vehicle_filter)) => {
                    result.forbidden_vehicles.push(vehicle_filter)
                }
                Err(()) => (),
            }
        }

        let has_no_filter = result.allowed_stops.is_empty()
            && result.allowed_vehicles.is_empty()
            && result.forbidden_stops.is_empty()
            && result.forbidden_vehicles.is_empty();

        if has_no_filter {
            None
        } else {
            Some(result)
        }
    }
}

/// Filters resolved against a timetable, one flag per journey pattern and per stop point.
#[derive(Debug, Clone, Default)]
pub struct FilterMemory {
    allowed_journey_patterns: Vec<bool>,
    allowed_stop_points: Vec<bool>,
}

impl FilterMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&mut self, timetable: &Timetable, filters: Option<&Filters<'_>>) {
        self.allowed_journey_patterns.clear();
        self.allowed_journey_patterns.extend(
            timetable
                .journey_patterns()
                .map(|jp| filters.map_or(true, |f| f.is_journey_pattern_valid(timetable.journey_pattern(jp)))),
        );
        self.allowed_stop_points.clear();
        self.allowed_stop_points.extend(
            timetable
                .stop_points()
                .map(|sp| filters.map_or(true, |f| f.is_stop_point_valid(sp, timetable))),
        );
    }

    pub fn is_journey_pattern_allowed(&self, idx: JourneyPatternIdx) -> bool {
        self.allowed_journey_patterns
            .get(idx.idx())
            .copied()
            .unwrap_or(true)
    }

    pub fn is_stop_point_allowed(&self, idx: StopPointIdx) -> bool {
        self.allowed_stop_points
            .get(idx.idx())
            .copied()
            .unwrap_or(true)
    }
}

fn parse_filter<'a>(
    timetable: &Timetable,
    filter_str: &'a str,
    filter_provenance: &str,
) -> Result<Filter<'a>, ()> {
    let journey_patterns = || {
        timetable
            .journey_patterns()
            .map(move |jp| timetable.journey_pattern(jp))
    };

    let vehicle_filters: [(&str, &str, fn(&'a str) -> VehicleFilter<'a>, fn(&JourneyPattern, &str) -> bool); 5] = [
        (PREFIX_ID_LINE, "line", VehicleFilter::Line, |jp, id| jp.line_id == id),
        (PREFIX_ID_ROUTE, "route", VehicleFilter::Route, |jp, id| jp.route_id == id),
        (PREFIX_ID_NETWORK, "network", VehicleFilter::Network, |jp, id| {
            jp.network_id == id
        }),
        (
            PREFIX_ID_PHYSICAL_MODE,
            "physical_mode",
            VehicleFilter::PhysicalMode,
            |jp, id| jp.physical_mode_id == id,
        ),
        (
            PREFIX_ID_JOURNEY_PATTERN,
            "journey_pattern",
            VehicleFilter::JourneyPattern,
            |jp, id| jp.id == id,
        ),
    ];

    for (prefix, object_name, make_filter, matches) in vehicle_filters.iter() {
        if let Some(id) = filter_str.strip_prefix(prefix) {
            if journey_patterns().any(|jp| matches(jp, id)) {
                return Ok(Filter::Vehicle(make_filter(id)));
            } else {
                warn!(
                    "Unknown {} id {} in {} filter {}. I'll ignore it.",
                    object_name, id, filter_provenance, filter_str
                );
                return Err(());
            }
        }
    }

    if let Some(stop_point_id) = filter_str.strip_prefix(PREFIX_ID_STOP_POINT) {
        if timetable.stop_point_idx(stop_point_id).is_some() {
            let filter = Filter::Stop(StopFilter::StopPoint(stop_point_id));
            return Ok(filter);
        } else {
            warn!(
                "Unknown stop_point id {} in {} filter {}. I'll ignore it.",
                stop_point_id, filter_provenance, filter_str
            );
            return Err(());
        }
    }

    warn!(
        "Invalid {} filter : {}. I'll ignore it.",
        filter_provenance, filter_str
    );
    Err(())
}
