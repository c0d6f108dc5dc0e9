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

//! Backward replay of the labels of a search.
//!
//! The replay starts at a labelled stop point and follows the labels back to
//! the stop point the search started from. What it finds is reported to a
//! [`PathVisitor`], so the same replay builds full itineraries and cheap summaries.
//!
//! Stop points are reported in replay order, which is the reverse of the travel
//! order for a clockwise search. Datetimes are always chronological: a
//! `departure` is never after the matching `arrival`.

use super::best_stop_time::best_stop_time;
use super::labels::Boarding;
use super::raptor::{Raptor, SearchStart};
use super::RaptorError;
use crate::time::{DateTime, PositiveDuration};
use crate::timetable::{Connection, StopPointIdx, Timetable, VehicleJourneyIdx};

pub trait PathVisitor {
    /// A ride on `vehicle_journey` begins.
    fn init_ride(&mut self, vehicle_journey: VehicleJourneyIdx);

    /// The current ride goes through the stop time at `order`.
    fn extend_ride(
        &mut self,
        vehicle_journey: VehicleJourneyIdx,
        order: usize,
        stop_point: StopPointIdx,
        arrival: DateTime,
        departure: DateTime,
    );

    fn finish_ride(&mut self);

    /// The vehicle goes on as another vehicle journey between two stop points.
    fn stay_in(
        &mut self,
        first: StopPointIdx,
        second: StopPointIdx,
        departure: DateTime,
        arrival: DateTime,
    );

    /// A walk between two stop points, possibly the same one when changing vehicle there.
    fn walk(
        &mut self,
        first: StopPointIdx,
        second: StopPointIdx,
        departure: DateTime,
        arrival: DateTime,
        connection: Option<&Connection>,
    );

    /// The replay reached the stop point where the search started.
    fn final_step(&mut self, _origin: StopPointIdx) {}
}

/// Replays the label of `stop_point` at `round` until the departure label.
pub fn read_path<V: PathVisitor>(
    timetable: &Timetable,
    raptor: &Raptor,
    stop_point: StopPointIdx,
    round: usize,
    visitor: &mut V,
) -> Result<(), RaptorError> {
    let clockwise = raptor.clockwise();
    let required = raptor.accessibility().vehicle;
    let labels = raptor.labels();

    let mut round = round;
    let mut stop_point = stop_point;
    let mut label = *labels.get(round, stop_point)?;

    loop {
        match label.boarding {
            Boarding::Departure => {
                visitor.final_step(stop_point);
                return Ok(());
            }
            Boarding::Transfer { from } => {
                let connection = if clockwise {
                    timetable.find_connection(from, stop_point)
                } else {
                    timetable.find_connection(stop_point, from)
                };
                let (departure, arrival) = match connection {
                    Some(connection) if clockwise => {
                        (label.datetime - connection.display_duration, label.datetime)
                    }
                    Some(connection) => {
                        (label.datetime, label.datetime + connection.display_duration)
                    }
                    None => {
                        let other = labels.get_ride(round, from)?.datetime;
                        if clockwise {
                            (other, label.datetime)
                        } else {
                            (label.datetime, other)
                        }
                    }
                };
                visitor.walk(stop_point, from, departure, arrival, connection);
                stop_point = from;
                label = *labels.get_ride(round, stop_point)?;
            }
            Boarding::VehicleJourney {
                boarding,
                alighting,
            }
            | Boarding::StayIn {
                boarding,
                alighting,
            } => {
                let found = best_stop_time(
                    timetable,
                    alighting,
                    label.datetime,
                    &required,
                    !clockwise,
                    true,
                )
                .ok_or(RaptorError::MissingStopTime { round, stop_point })?;

                let mut vj_idx = found.vehicle_journey;
                let mut order = found.order;
                let base = found.base;
                let mut nb_of_splices = 0;
                visitor.init_ride(vj_idx);
                loop {
                    let vj = timetable.vehicle_journey(vj_idx);
                    let stop_time = &vj.stop_times[order];
                    visitor.extend_ride(
                        vj_idx,
                        order,
                        stop_time.stop_point,
                        Timetable::stop_time_datetime(base, stop_time, true),
                        Timetable::stop_time_datetime(base, stop_time, false),
                    );
                    if stop_time.journey_pattern_point == boarding {
                        break;
                    }
                    if clockwise && order > 0 {
                        order -= 1;
                        continue;
                    }
                    if !clockwise && order + 1 < vj.stop_times.len() {
                        order += 1;
                        continue;
                    }

                    // the boarding point is on a vehicle journey chained to this one
                    let unresolved = RaptorError::UnresolvedBoarding {
                        round,
                        stop_point,
                        vehicle_journey: vj_idx,
                    };
                    let linked_idx = if clockwise { vj.prev_vj } else { vj.next_vj };
                    let linked_idx = match linked_idx {
                        Some(idx) if nb_of_splices < timetable.nb_of_vehicle_journeys() => idx,
                        _ => return Err(unresolved),
                    };
                    let linked = timetable.vehicle_journey(linked_idx);
                    let linked_stop_time = if clockwise {
                        linked.last_stop_time()
                    } else {
                        linked.first_stop_time()
                    };
                    let linked_stop_time = match linked_stop_time {
                        Some(stop_time) => stop_time,
                        None => return Err(unresolved),
                    };
                    visitor.finish_ride();
                    if clockwise {
                        visitor.stay_in(
                            stop_time.stop_point,
                            linked_stop_time.stop_point,
                            Timetable::stop_time_datetime(base, linked_stop_time, true),
                            Timetable::stop_time_datetime(base, stop_time, false),
                        );
                    } else {
                        visitor.stay_in(
                            stop_time.stop_point,
                            linked_stop_time.stop_point,
                            Timetable::stop_time_datetime(base, stop_time, true),
                            Timetable::stop_time_datetime(base, linked_stop_time, false),
                        );
                    }
                    visitor.init_ride(linked_idx);
                    vj_idx = linked_idx;
                    order = if clockwise {
                        linked.stop_times.len() - 1
                    } else {
                        0
                    };
                    nb_of_splices += 1;
                }
                visitor.finish_ride();

                if round == 0 {
                    return Err(RaptorError::UnresolvedBoarding {
                        round,
                        stop_point,
                        vehicle_journey: vj_idx,
                    });
                }
                round -= 1;
                stop_point = timetable.journey_pattern_point(boarding).stop_point;
                label = *labels.get(round, stop_point)?;

                if label.boarding.is_ride() {
                    // vehicle change at the same stop point
                    let change = timetable.change_duration(stop_point);
                    let (departure, arrival) = if clockwise {
                        (label.datetime, label.datetime + change)
                    } else {
                        (label.datetime - change, label.datetime)
                    };
                    let connection = timetable.find_connection(stop_point, stop_point);
                    visitor.walk(stop_point, stop_point, departure, arrival, connection);
                }
            }
        }
    }
}

/// What a replay tells about a path without building it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSummary {
    pub nb_of_rides: usize,
    pub nb_of_stay_ins: usize,
    /// walking between two distinct stop points
    pub transfer_walking: PositiveDuration,
    pub origin: Option<StopPointIdx>,
    pub earliest_departure: DateTime,
    pub latest_arrival: DateTime,
}

impl Default for PathSummary {
    fn default() -> Self {
        Self {
            nb_of_rides: 0,
            nb_of_stay_ins: 0,
            transfer_walking: PositiveDuration::zero(),
            origin: None,
            earliest_departure: DateTime::INF,
            latest_arrival: DateTime::MIN,
        }
    }
}

impl PathSummary {
    /// Vehicles actually boarded, chained vehicle journeys count once.
    pub fn nb_of_vehicles(&self) -> usize {
        self.nb_of_rides - self.nb_of_stay_ins
    }

    /// The datetime of the path on the side of the search origin.
    pub fn origin_datetime(&self, clockwise: bool) -> DateTime {
        if clockwise {
            self.earliest_departure
        } else {
            self.latest_arrival
        }
    }

    fn see(&mut self, departure: DateTime, arrival: DateTime) {
        self.earliest_departure = self.earliest_departure.min(departure);
        self.latest_arrival = self.latest_arrival.max(arrival);
    }
}

impl PathVisitor for PathSummary {
    fn init_ride(&mut self, _vehicle_journey: VehicleJourneyIdx) {
        self.nb_of_rides += 1;
    }

    fn extend_ride(
        &mut self,
        _vehicle_journey: VehicleJourneyIdx,
        _order: usize,
        _stop_point: StopPointIdx,
        arrival: DateTime,
        departure: DateTime,
    ) {
        self.see(departure, arrival);
    }

    fn finish_ride(&mut self) {}

    fn stay_in(
        &mut self,
        _first: StopPointIdx,
        _second: StopPointIdx,
        departure: DateTime,
        arrival: DateTime,
    ) {
        self.nb_of_stay_ins += 1;
        self.see(departure, arrival);
    }

    fn walk(
        &mut self,
        first: StopPointIdx,
        second: StopPointIdx,
        departure: DateTime,
        arrival: DateTime,
        connection: Option<&Connection>,
    ) {
        self.see(departure, arrival);
        if first != second {
            if let Some(connection) = connection {
                self.transfer_walking = self.transfer_walking + connection.duration;
            }
        }
    }

    fn final_step(&mut self, origin: StopPointIdx) {
        self.origin = Some(origin);
    }
}

/// Replays the label of `stop_point` at `round` into a [`PathSummary`].
pub fn summarize(
    timetable: &Timetable,
    raptor: &Raptor,
    stop_point: StopPointIdx,
    round: usize,
) -> Result<PathSummary, RaptorError> {
    let mut summary = PathSummary::default();
    read_path(timetable, raptor, stop_point, round, &mut summary)?;
    Ok(summary)
}

/// Access duration of `stop_point` among the starts of a search.
pub fn access_duration(starts: &[SearchStart], stop_point: StopPointIdx) -> PositiveDuration {
    starts
        .iter()
        .find(|start| start.stop_point == stop_point)
        .map(|start| start.access_duration)
        .unwrap_or_else(PositiveDuration::zero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::raptor::SearchParams;
    use crate::timetable::{Accessibility, TimetableBuilder};

    #[derive(Default)]
    struct Recorder {
        events: Vec<String>,
    }

    impl PathVisitor for Recorder {
        fn init_ride(&mut self, vehicle_journey: VehicleJourneyIdx) {
            self.events.push(format!("init {}", vehicle_journey.idx()));
        }
        fn extend_ride(
            &mut self,
            _vehicle_journey: VehicleJourneyIdx,
            order: usize,
            _stop_point: StopPointIdx,
            _arrival: DateTime,
            _departure: DateTime,
        ) {
            self.events.push(format!("extend {}", order));
        }
        fn finish_ride(&mut self) {
            self.events.push("finish".to_string());
        }
        fn stay_in(
            &mut self,
            _first: StopPointIdx,
            _second: StopPointIdx,
            _departure: DateTime,
            _arrival: DateTime,
        ) {
            self.events.push("stay_in".to_string());
        }
        fn walk(
            &mut self,
            first: StopPointIdx,
            second: StopPointIdx,
            _departure: DateTime,
            _arrival: DateTime,
            _connection: Option<&Connection>,
        ) {
            self.events.push(format!("walk {} {}", first.idx(), second.idx()));
        }
        fn final_step(&mut self, origin: StopPointIdx) {
            self.events.push(format!("origin {}", origin.idx()));
        }
    }

    fn search(timetable: &Timetable, from: &str, clockwise: bool, seconds: u32) -> Raptor {
        let mut raptor = Raptor::new();
        let starts = [SearchStart {
            stop_point: timetable.stop_point_idx(from).unwrap(),
            access_duration: PositiveDuration::zero(),
        }];
        let params = SearchParams {
            datetime: DateTime::set(0, seconds),
            clockwise,
            accessibility: Accessibility::default(),
            max_nb_of_rounds: 5,
            bound: DateTime::unreached(clockwise),
        };
        raptor.compute(timetable, &starts, &params, None);
        raptor
    }

    #[test]
    fn replay_of_a_ride_then_a_walk() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("toto", |vj| {
                vj.st("A", "08:00:00").st("B", "08:15:00").st("C", "08:30:00");
            })
            .connection("C", "D", "00:05:00")
            .build();
        let raptor = search(&timetable, "A", true, 7 * 3600);
        let stop = |id: &str| timetable.stop_point_idx(id).unwrap();

        let mut recorder = Recorder::default();
        read_path(&timetable, &raptor, stop("D"), 1, &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                format!("walk {} {}", stop("D").idx(), stop("C").idx()),
                "init 0".to_string(),
                "extend 2".to_string(),
                "extend 1".to_string(),
                "extend 0".to_string(),
                "finish".to_string(),
                format!("origin {}", stop("A").idx()),
            ]
        );

        let summary = summarize(&timetable, &raptor, stop("D"), 1).unwrap();
        assert_eq!(summary.nb_of_rides, 1);
        assert_eq!(summary.transfer_walking, PositiveDuration::from_hms(0, 5, 0));
        assert_eq!(summary.origin, Some(stop("A")));
        assert_eq!(summary.origin_datetime(true), DateTime::set(0, 8 * 3600));
    }

    #[test]
    fn replayed_walk_starts_from_the_ride() {
        // the walk from U improves S after the walk from S to T was made
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("toS", |vj| {
                vj.st("A", "08:00:00").st("S", "08:30:00");
            })
            .vj("toU", |vj| {
                vj.st("A", "08:00:00").st("U", "08:20:00");
            })
            .connection("U", "S", "00:05:00")
            .connection("S", "T", "00:05:00")
            .build();
        let raptor = search(&timetable, "A", true, 7 * 3600);
        let stop = |id: &str| timetable.stop_point_idx(id).unwrap();
        let to_s = timetable.vehicle_journey_idx("toS").unwrap();

        let mut recorder = Recorder::default();
        read_path(&timetable, &raptor, stop("T"), 1, &mut recorder).unwrap();
        assert_eq!(
            recorder.events,
            vec![
                format!("walk {} {}", stop("T").idx(), stop("S").idx()),
                format!("init {}", to_s.idx()),
                "extend 1".to_string(),
                "extend 0".to_string(),
                "finish".to_string(),
                format!("origin {}", stop("A").idx()),
            ]
        );
    }

    #[test]
    fn replay_splices_chained_vehicle_journeys() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("first", |vj| {
                vj.block_id("block").st("A", "08:00:00").st("X", "08:20:00");
            })
            .vj("second", |vj| {
                vj.block_id("block").st("X", "08:25:00").st("Z", "08:45:00");
            })
            .build();
        let stop = |id: &str| timetable.stop_point_idx(id).unwrap();

        let raptor = search(&timetable, "A", true, 7 * 3600);
        let summary = summarize(&timetable, &raptor, stop("Z"), 1).unwrap();
        assert_eq!(summary.nb_of_rides, 2);
        assert_eq!(summary.nb_of_stay_ins, 1);
        assert_eq!(summary.nb_of_vehicles(), 1);

        let raptor = search(&timetable, "Z", false, 9 * 3600);
        let summary = summarize(&timetable, &raptor, stop("A"), 1).unwrap();
        assert_eq!(summary.nb_of_stay_ins, 1);
        assert_eq!(summary.origin, Some(stop("Z")));
        assert_eq!(summary.origin_datetime(false), DateTime::set(0, 8 * 3600 + 45 * 60));
    }

    #[test]
    fn uninitialized_label_is_an_error() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("toto", |vj| {
                vj.st("A", "08:00:00").st("B", "08:15:00");
            })
            .build();
        let raptor = search(&timetable, "A", true, 7 * 3600);
        let b = timetable.stop_point_idx("B").unwrap();
        assert!(matches!(
            summarize(&timetable, &raptor, b, 3),
            Err(RaptorError::UninitializedLabel { .. })
        ));
    }
}
