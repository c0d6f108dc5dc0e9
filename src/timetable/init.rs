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

use super::{
    builder::{RawVehicleJourney, TimetableBuilder},
    Connection, ConnectionIdx, JourneyPattern, JourneyPatternIdx, JourneyPatternPoint,
    JourneyPatternPointIdx, RaptorIndex, StopPointIdx, StopTime, Timetable, VehicleJourney,
    VehicleJourneyIdx,
};
use crate::time::{ValidityPattern, ValidityPatterns, SECONDS_PER_DAY};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct JourneyPatternKey {
    route_id: String,
    physical_mode_id: String,
    stop_points: Vec<StopPointIdx>,
}

pub(super) fn build_timetable(builder: TimetableBuilder) -> Timetable {
    let TimetableBuilder {
        calendar,
        mut stop_points,
        stop_point_ids,
        mut connections,
        vehicle_journeys: raw_vehicle_journeys,
        services,
        default_transfer_duration,
    } = builder;

    let nb_of_days = u32::from(calendar.nb_of_days());
    let mut validity_patterns = ValidityPatterns::new(nb_of_days);

    let mut journey_patterns: Vec<JourneyPattern> = Vec::new();
    let mut journey_pattern_points: Vec<JourneyPatternPoint> = Vec::new();
    let mut journey_pattern_ids: HashMap<JourneyPatternKey, JourneyPatternIdx> = HashMap::new();
    let mut vehicle_journeys: Vec<VehicleJourney> = Vec::new();
    let mut vehicle_journey_ids = HashMap::new();

    for raw_vj in raw_vehicle_journeys {
        if raw_vj.stop_times.is_empty() {
            warn!(
                "Vehicle journey {} has no stop time. I'll ignore it.",
                raw_vj.id
            );
            continue;
        }
        let validity_pattern = match &raw_vj.service_id {
            Some(service_id) => match services.get(service_id) {
                Some(dates) => validity_patterns.get_or_insert(dates.iter(), &calendar),
                None => {
                    warn!(
                        "Unknown calendar {} for vehicle journey {}. I'll consider it never circulates.",
                        service_id, raw_vj.id
                    );
                    validity_patterns.get_or_insert_pattern(ValidityPattern::new(nb_of_days))
                }
            },
            None => {
                let mut pattern = ValidityPattern::new(nb_of_days);
                for day in calendar.days() {
                    pattern.add(day);
                }
                validity_patterns.get_or_insert_pattern(pattern)
            }
        };

        let key = JourneyPatternKey {
            route_id: raw_vj.route_id.clone(),
            physical_mode_id: raw_vj.physical_mode_id.clone(),
            stop_points: raw_vj.stop_times.iter().map(|st| st.stop_point).collect(),
        };
        let journey_pattern = *journey_pattern_ids.entry(key).or_insert_with_key(|key| {
            let jp_idx = JourneyPatternIdx {
                idx: journey_patterns.len(),
            };
            let mut points = Vec::with_capacity(key.stop_points.len());
            for (order, stop_point) in key.stop_points.iter().enumerate() {
                let jpp_idx = JourneyPatternPointIdx {
                    idx: journey_pattern_points.len(),
                };
                journey_pattern_points.push(JourneyPatternPoint {
                    journey_pattern: jp_idx,
                    stop_point: *stop_point,
                    order,
                });
                stop_points[stop_point.idx].journey_pattern_points.push(jpp_idx);
                points.push(jpp_idx);
            }
            journey_patterns.push(JourneyPattern {
                id: format!("{}:{}", raw_vj.route_id, jp_idx.idx),
                route_id: raw_vj.route_id.clone(),
                line_id: raw_vj.line_id.clone(),
                network_id: raw_vj.network_id.clone(),
                physical_mode_id: raw_vj.physical_mode_id.clone(),
                points,
                vehicle_journeys: Vec::new(),
                frequency_vehicle_journeys: Vec::new(),
            });
            jp_idx
        });

        let vj_idx = VehicleJourneyIdx {
            idx: vehicle_journeys.len(),
        };
        let jp = &mut journey_patterns[journey_pattern.idx];
        jp.vehicle_journeys.push(vj_idx);
        if raw_vj.frequency.is_some() {
            jp.frequency_vehicle_journeys.push(vj_idx);
        }
        vehicle_journey_ids.insert(raw_vj.id.clone(), vj_idx);
        let points = &journey_patterns[journey_pattern.idx].points;
        vehicle_journeys.push(make_vehicle_journey(
            raw_vj,
            journey_pattern,
            points,
            validity_pattern,
        ));
    }

    for journey_pattern in journey_patterns.iter_mut() {
        journey_pattern
            .vehicle_journeys
            .sort_by_key(|vj_idx| first_departure(&vehicle_journeys[vj_idx.idx]));
    }

    link_blocks(&mut vehicle_journeys, &validity_patterns);

    if let Some(duration) = default_transfer_duration {
        for stop_point in 0..stop_points.len() {
            let stop_point = StopPointIdx { idx: stop_point };
            let has_self_connection = connections
                .iter()
                .any(|connection| connection.from == stop_point && connection.to == stop_point);
            if !has_self_connection {
                connections.push(Connection {
                    from: stop_point,
                    to: stop_point,
                    duration,
                    display_duration: duration,
                });
            }
        }
    }
    for (idx, connection) in connections.iter().enumerate() {
        let connection_idx = ConnectionIdx { idx };
        stop_points[connection.from.idx]
            .outgoing_connections
            .push(connection_idx);
        stop_points[connection.to.idx]
            .incoming_connections
            .push(connection_idx);
    }

    let raptor_index = build_raptor_index(&journey_patterns, &vehicle_journeys);

    debug!(
        "Timetable built with {} stop points, {} journey patterns, {} vehicle journeys, {} connections",
        stop_points.len(),
        journey_patterns.len(),
        vehicle_journeys.len(),
        connections.len()
    );

    Timetable {
        calendar,
        validity_patterns,
        stop_points,
        connections,
        journey_patterns,
        journey_pattern_points,
        vehicle_journeys,
        raptor_index,
        stop_point_ids,
        vehicle_journey_ids,
    }
}

fn make_vehicle_journey(
    raw_vj: RawVehicleJourney,
    journey_pattern: JourneyPatternIdx,
    points: &[JourneyPatternPointIdx],
    validity_pattern: crate::time::validity_pattern::ValidityPatternIdx,
) -> VehicleJourney {
    let stop_times = raw_vj
        .stop_times
        .iter()
        .zip(points.iter())
        .map(|(raw_st, jpp)| StopTime {
            arrival_time: raw_st.arrival_time,
            departure_time: raw_st.departure_time,
            stop_point: raw_st.stop_point,
            journey_pattern_point: *jpp,
            pick_up_allowed: raw_st.pick_up_allowed,
            drop_off_allowed: raw_st.drop_off_allowed,
        })
        .collect();
    VehicleJourney {
        id: raw_vj.id,
        meta_id: raw_vj.meta_id,
        journey_pattern,
        validity_pattern,
        properties: raw_vj.properties,
        stop_times,
        frequency: raw_vj.frequency,
        block_id: raw_vj.block_id,
        prev_vj: None,
        next_vj: None,
        calendars: raw_vj.calendars,
        utc_to_local_offset: raw_vj.utc_to_local_offset,
    }
}

fn first_departure(vj: &VehicleJourney) -> u32 {
    let departure = vj
        .first_stop_time()
        .map(|st| st.departure_time)
        .unwrap_or(0);
    match &vj.frequency {
        Some(frequency) => frequency.start_time + departure,
        None => departure,
    }
}

fn last_arrival(vj: &VehicleJourney) -> u32 {
    vj.last_stop_time().map(|st| st.arrival_time).unwrap_or(0)
}

// Vehicle journeys of a block are chained in the order of their departures,
// as long as the vehicle is free when the next one leaves.
fn link_blocks(vehicle_journeys: &mut [VehicleJourney], validity_patterns: &ValidityPatterns) {
    let mut blocks: BTreeMap<String, Vec<VehicleJourneyIdx>> = BTreeMap::new();
    for (idx, vj) in vehicle_journeys.iter().enumerate() {
        if let (Some(block_id), None) = (&vj.block_id, &vj.frequency) {
            blocks
                .entry(block_id.clone())
                .or_default()
                .push(VehicleJourneyIdx { idx });
        }
    }
    for (block_id, mut block) in blocks {
        block.sort_by_key(|vj_idx| first_departure(&vehicle_journeys[vj_idx.idx]));
        for pair in block.windows(2) {
            let (prev, next) = (pair[0], pair[1]);
            let prev_vj = &vehicle_journeys[prev.idx];
            let next_vj = &vehicle_journeys[next.idx];
            if last_arrival(prev_vj) > first_departure(next_vj) {
                warn!(
                    "Vehicle journey {} of block {} arrives after {} departs. I'll not chain them.",
                    prev_vj.id, block_id, next_vj.id
                );
                continue;
            }
            let prev_pattern = validity_patterns.get(prev_vj.validity_pattern);
            let next_pattern = validity_patterns.get(next_vj.validity_pattern);
            let share_a_day = prev_pattern.days().any(|day| next_pattern.check(day));
            if !share_a_day {
                continue;
            }
            vehicle_journeys[prev.idx].next_vj = Some(next);
            vehicle_journeys[next.idx].prev_vj = Some(prev);
        }
    }
}

// Only the scheduled vehicle journeys are indexed, sorted by the clock time
// of their stop times. Frequency ones are looked up by `frequency_vehicle_journeys`.
fn build_raptor_index(
    journey_patterns: &[JourneyPattern],
    vehicle_journeys: &[VehicleJourney],
) -> RaptorIndex {
    let mut index = RaptorIndex::default();
    for journey_pattern in journey_patterns {
        let scheduled: Vec<&VehicleJourneyIdx> = journey_pattern
            .vehicle_journeys
            .iter()
            .filter(|vj_idx| !vehicle_journeys[vj_idx.idx].is_frequency())
            .collect();
        index.first_stop_time.push(index.departure_times.len());
        index.nb_trips.push(scheduled.len());
        for order in 0..journey_pattern.points.len() {
            let mut departures: Vec<(u32, VehicleJourneyIdx)> = scheduled
                .iter()
                .map(|vj_idx| {
                    let stop_time = &vehicle_journeys[vj_idx.idx].stop_times[order];
                    (stop_time.departure_time % SECONDS_PER_DAY, **vj_idx)
                })
                .collect();
            departures.sort();
            let mut arrivals: Vec<(u32, VehicleJourneyIdx)> = scheduled
                .iter()
                .map(|vj_idx| {
                    let stop_time = &vehicle_journeys[vj_idx.idx].stop_times[order];
                    (stop_time.arrival_time % SECONDS_PER_DAY, **vj_idx)
                })
                .collect();
            arrivals.sort();
            for (time, vj_idx) in departures {
                index.departure_times.push(time);
                index.departure_vehicle_journeys.push(vj_idx);
            }
            for (time, vj_idx) in arrivals {
                index.arrival_times.push(time);
                index.arrival_vehicle_journeys.push(vj_idx);
            }
        }
    }
    index
}
