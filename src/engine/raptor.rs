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

use super::best_stop_time::best_stop_time;
use super::labels::{Boarding, Label, LabelTable};
use crate::filters::{FilterMemory, Filters};
use crate::time::{DateTime, PositiveDuration};
use crate::timetable::{
    Accessibility, JourneyPatternIdx, JourneyPatternPointIdx, StopPointIdx, Timetable,
    VehicleJourneyIdx,
};
use tracing::{debug, trace};

/// Where and when a search starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchStart {
    pub stop_point: StopPointIdx,
    /// walking time between the requested place and the stop point
    pub access_duration: PositiveDuration,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub datetime: DateTime,
    pub clockwise: bool,
    pub accessibility: Accessibility,
    /// maximum number of vehicle boardings
    pub max_nb_of_rounds: usize,
    /// labels going past this datetime are dropped: later arrivals when
    /// `clockwise`, earlier departures otherwise
    pub bound: DateTime,
}

/// Round based search over a `Timetable`.
///
/// A `Raptor` owns the scratch memory of a search and can be reused for
/// successive searches, possibly on different timetables.
/// The labels of the last search stay readable until the next one starts.
#[derive(Debug, Clone)]
pub struct Raptor {
    labels: LabelTable,
    // best datetime reached at each stop point, whatever the round
    best: Vec<DateTime>,

    marked: Vec<bool>,
    marked_stops: Vec<StopPointIdx>,
    new_marked_stops: Vec<StopPointIdx>,

    valid_journey_patterns: Vec<bool>,
    filter_memory: FilterMemory,

    params: SearchParams,
}

impl Default for Raptor {
    fn default() -> Self {
        Self::new()
    }
}

impl Raptor {
    pub fn new() -> Self {
        Self {
            labels: LabelTable::new(),
            best: Vec::new(),
            marked: Vec::new(),
            marked_stops: Vec::new(),
            new_marked_stops: Vec::new(),
            valid_journey_patterns: Vec::new(),
            filter_memory: FilterMemory::new(),
            params: SearchParams {
                datetime: DateTime::INF,
                clockwise: true,
                accessibility: Accessibility::default(),
                max_nb_of_rounds: 0,
                bound: DateTime::INF,
            },
        }
    }

    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    pub fn params(&self) -> &SearchParams {
        &self.params
    }

    pub fn clockwise(&self) -> bool {
        self.params.clockwise
    }

    pub fn accessibility(&self) -> &Accessibility {
        &self.params.accessibility
    }

    pub fn nb_of_rounds(&self) -> usize {
        self.labels.nb_of_rounds()
    }

    /// Best datetime reached at `stop_point` in any round.
    pub fn best(&self, stop_point: StopPointIdx) -> DateTime {
        self.best
            .get(stop_point.idx())
            .copied()
            .unwrap_or_else(|| DateTime::unreached(self.params.clockwise))
    }

    /// First round reaching the best datetime of `stop_point`.
    pub fn best_round(&self, stop_point: StopPointIdx) -> Option<usize> {
        let best = self.best(stop_point);
        if !best.is_finite() {
            return None;
        }
        (0..self.nb_of_rounds()).find(|round| {
            self.labels
                .try_get(*round, stop_point)
                .map_or(false, |label| label.datetime == best)
        })
    }

    /// Runs a full search from `starts`.
    ///
    /// Rounds are computed until `params.max_nb_of_rounds` boardings have been
    /// done, or until a round leaves every label unchanged.
    pub fn compute(
        &mut self,
        timetable: &Timetable,
        starts: &[SearchStart],
        params: &SearchParams,
        filters: Option<&Filters<'_>>,
    ) {
        self.init(timetable, starts, params, filters);

        while !self.marked_stops.is_empty() && self.nb_of_rounds() <= params.max_nb_of_rounds {
            self.next_round(timetable);
        }
        debug!(
            "Search done with {} rounds, {} stop points reached.",
            self.nb_of_rounds(),
            self.best.iter().filter(|dt| dt.is_finite()).count()
        );
    }

    /// Clears the memory of the previous search and fills round 0.
    pub fn init(
        &mut self,
        timetable: &Timetable,
        starts: &[SearchStart],
        params: &SearchParams,
        filters: Option<&Filters<'_>>,
    ) {
        self.params = *params;
        let nb_of_stop_points = timetable.nb_of_stop_points();
        let clockwise = params.clockwise;

        self.labels.clear(nb_of_stop_points);
        self.best.clear();
        self.best
            .resize(nb_of_stop_points, DateTime::unreached(clockwise));
        self.marked.clear();
        self.marked.resize(nb_of_stop_points, false);
        self.marked_stops.clear();
        self.new_marked_stops.clear();

        self.filter_memory.fill(timetable, filters);
        self.fill_valid_journey_patterns(timetable);

        self.labels.push_round();
        for start in starts {
            let label = Label {
                datetime: params.datetime.shift(start.access_duration, clockwise),
                boarding: Boarding::Departure,
            };
            self.update_label(timetable, 0, start.stop_point, label);
        }
        self.transfers(timetable, 0);
        self.swap_marked();
    }

    /// Computes one more round: rides from the stop points improved during the
    /// previous round, then transfers from the stop points improved by those rides.
    ///
    /// Returns `false` when no label was improved.
    pub fn next_round(&mut self, timetable: &Timetable) -> bool {
        self.labels.push_round();
        let round = self.nb_of_rounds() - 1;

        let marked_stops = std::mem::take(&mut self.marked_stops);
        for stop_point in &marked_stops {
            self.ride_from(timetable, round, *stop_point);
        }
        self.marked_stops = marked_stops;
        self.marked_stops.clear();

        self.transfers(timetable, round);
        self.swap_marked();
        trace!(
            "Round {} improved {} stop points.",
            round,
            self.marked_stops.len()
        );
        !self.marked_stops.is_empty()
    }

    fn swap_marked(&mut self) {
        std::mem::swap(&mut self.marked_stops, &mut self.new_marked_stops);
        self.new_marked_stops.clear();
        for stop_point in &self.marked_stops {
            self.marked[stop_point.idx()] = false;
        }
    }

    fn fill_valid_journey_patterns(&mut self, timetable: &Timetable) {
        let date = self.params.datetime.date();
        let filter_memory = &self.filter_memory;
        self.valid_journey_patterns.clear();
        self.valid_journey_patterns
            .extend(timetable.journey_patterns().map(|jp| {
                filter_memory.is_journey_pattern_allowed(jp)
                    && timetable.vehicle_journeys_of(jp).iter().any(|vj| {
                        let vj = timetable.vehicle_journey(*vj);
                        timetable.validity_pattern(vj.validity_pattern).check2(date)
                    })
            }));
    }

    pub fn is_journey_pattern_valid(&self, journey_pattern: JourneyPatternIdx) -> bool {
        self.valid_journey_patterns
            .get(journey_pattern.idx())
            .copied()
            .unwrap_or(false)
    }

    pub fn is_stop_point_allowed(&self, timetable: &Timetable, stop_point: StopPointIdx) -> bool {
        self.filter_memory.is_stop_point_allowed(stop_point)
            && timetable
                .stop_point(stop_point)
                .properties
                .satisfies(&self.params.accessibility.stop)
    }

    // Sets the label if it strictly improves the one of the round and stays
    // within the bound. The stop point is marked when the label improves its
    // best datetime.
    fn update_label(
        &mut self,
        timetable: &Timetable,
        round: usize,
        stop_point: StopPointIdx,
        label: Label,
    ) -> bool {
        let clockwise = self.params.clockwise;
        if !label.datetime.is_within(&self.params.bound, clockwise)
            || !self.is_stop_point_allowed(timetable, stop_point)
        {
            return false;
        }
        if let Some(current) = self.labels.try_get(round, stop_point) {
            if !label.datetime.improves(&current.datetime, clockwise) {
                return false;
            }
        }
        self.labels.set(round, stop_point, label);
        let best = &mut self.best[stop_point.idx()];
        if label.datetime.improves(best, clockwise) {
            *best = label.datetime;
            if !self.marked[stop_point.idx()] {
                self.marked[stop_point.idx()] = true;
                self.new_marked_stops.push(stop_point);
            }
        }
        true
    }

    fn ride_from(&mut self, timetable: &Timetable, round: usize, stop_point: StopPointIdx) {
        let clockwise = self.params.clockwise;
        let label = match self.labels.try_get(round - 1, stop_point) {
            Some(label) => *label,
            None => return,
        };
        let ready = if label.boarding.is_ride() {
            label
                .datetime
                .shift(timetable.change_duration(stop_point), clockwise)
        } else {
            label.datetime
        };

        for point in timetable.journey_pattern_points_of(stop_point) {
            let jpp = timetable.journey_pattern_point(*point);
            if !self.is_journey_pattern_valid(jpp.journey_pattern) {
                continue;
            }
            if timetable.next_point(*point, clockwise).is_none() {
                continue;
            }
            let found = best_stop_time(
                timetable,
                *point,
                ready,
                &self.params.accessibility.vehicle,
                clockwise,
                false,
            );
            if let Some(found) = found {
                self.ride(timetable, round, *point, found.vehicle_journey, found.order, found.base);
            }
        }
    }

    // Labels every stop downstream of `order` along the vehicle journey and the
    // vehicle journeys chained to it.
    fn ride(
        &mut self,
        timetable: &Timetable,
        round: usize,
        boarding: JourneyPatternPointIdx,
        vehicle_journey: VehicleJourneyIdx,
        order: usize,
        base: DateTime,
    ) {
        let clockwise = self.params.clockwise;
        let vj = timetable.vehicle_journey(vehicle_journey);
        let downstream: Box<dyn Iterator<Item = usize>> = if clockwise {
            Box::new(order + 1..vj.stop_times.len())
        } else {
            Box::new((0..order).rev())
        };
        for position in downstream {
            let stop_time = &vj.stop_times[position];
            if !stop_time.valid_end(clockwise) {
                continue;
            }
            let datetime = Timetable::stop_time_datetime(base, stop_time, clockwise);
            let label = Label {
                datetime,
                boarding: Boarding::VehicleJourney {
                    boarding,
                    alighting: stop_time.journey_pattern_point,
                },
            };
            self.update_label(timetable, round, stop_time.stop_point, label);
        }

        if vj.is_frequency() {
            return;
        }
        let mut current = vj;
        // a block may not loop, but the data is not trusted on this
        let mut nb_of_chained = 0;
        while nb_of_chained < timetable.nb_of_vehicle_journeys() {
            let linked = if clockwise {
                current.next_vj
            } else {
                current.prev_vj
            };
            let linked_idx = match linked {
                Some(idx) => idx,
                None => break,
            };
            let linked = timetable.vehicle_journey(linked_idx);
            if linked.is_frequency()
                || !timetable.circulates(linked_idx, base.date())
                || !linked
                    .properties
                    .satisfies(&self.params.accessibility.vehicle)
            {
                break;
            }
            let positions: Box<dyn Iterator<Item = usize>> = if clockwise {
                Box::new(0..linked.stop_times.len())
            } else {
                Box::new((0..linked.stop_times.len()).rev())
            };
            for position in positions {
                let stop_time = &linked.stop_times[position];
                if !stop_time.valid_end(clockwise) {
                    continue;
                }
                let datetime = Timetable::stop_time_datetime(base, stop_time, clockwise);
                let label = Label {
                    datetime,
                    boarding: Boarding::StayIn {
                        boarding,
                        alighting: stop_time.journey_pattern_point,
                    },
                };
                self.update_label(timetable, round, stop_time.stop_point, label);
            }
            current = linked;
            nb_of_chained += 1;
        }
    }

    // Walks the connections of the stop points reached by a vehicle (or seeded)
    // during `round`. Walks start from the ride label, which a walk arriving
    // earlier at the same stop point leaves in place.
    fn transfers(&mut self, timetable: &Timetable, round: usize) {
        let clockwise = self.params.clockwise;
        let sources: Vec<(StopPointIdx, DateTime)> = self
            .new_marked_stops
            .iter()
            .filter_map(|stop_point| {
                let label = self.labels.try_get_ride(round, *stop_point)?;
                Some((*stop_point, label.datetime))
            })
            .collect();

        for (stop_point, datetime) in sources {
            for connection in timetable.connections_of(stop_point, clockwise) {
                let target = if clockwise {
                    connection.to
                } else {
                    connection.from
                };
                if target == stop_point {
                    continue;
                }
                let label = Label {
                    datetime: datetime.shift(connection.duration, clockwise),
                    boarding: Boarding::Transfer { from: stop_point },
                };
                self.update_label(timetable, round, target, label);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::labels::BoardingKind;
    use crate::timetable::TimetableBuilder;

    fn start(timetable: &Timetable, id: &str) -> SearchStart {
        SearchStart {
            stop_point: timetable.stop_point_idx(id).unwrap(),
            access_duration: PositiveDuration::zero(),
        }
    }

    fn params(datetime: DateTime, clockwise: bool) -> SearchParams {
        SearchParams {
            datetime,
            clockwise,
            accessibility: Accessibility::default(),
            max_nb_of_rounds: 10,
            bound: DateTime::unreached(clockwise),
        }
    }

    fn network() -> Timetable {
        TimetableBuilder::new("2020-01-01", "2020-01-02")
            .vj("toto", |vj| {
                vj.st("A", "08:00:00").st("B", "08:15:00").st("C", "08:30:00");
            })
            .vj("tata", |vj| {
                vj.st("D", "08:40:00").st("E", "09:00:00");
            })
            .connection("C", "D", "00:05:00")
            .build()
    }

    #[test]
    fn labels_along_a_line_and_a_transfer() {
        let timetable = network();
        let mut raptor = Raptor::new();
        let starts = [start(&timetable, "A")];
        raptor.compute(&timetable, &starts, &params(DateTime::set(0, 7 * 3600), true), None);

        let stop = |id: &str| timetable.stop_point_idx(id).unwrap();
        let c = raptor.labels().get(1, stop("C")).unwrap();
        assert_eq!(c.datetime, DateTime::set(0, 8 * 3600 + 30 * 60));
        assert_eq!(c.boarding.kind(), BoardingKind::VehicleJourney);

        let d = raptor.labels().get(1, stop("D")).unwrap();
        assert_eq!(d.datetime, DateTime::set(0, 8 * 3600 + 35 * 60));
        assert_eq!(d.boarding, Boarding::Transfer { from: stop("C") });

        let e = raptor.labels().get(2, stop("E")).unwrap();
        assert_eq!(e.datetime, DateTime::set(0, 9 * 3600));
        assert!(raptor.labels().get(1, stop("E")).is_err());
        assert_eq!(raptor.best(stop("E")), DateTime::set(0, 9 * 3600));
    }

    #[test]
    fn counter_clockwise_labels_are_latest_departures() {
        let timetable = network();
        let mut raptor = Raptor::new();
        let starts = [start(&timetable, "E")];
        raptor.compute(&timetable, &starts, &params(DateTime::set(0, 10 * 3600), false), None);

        let stop = |id: &str| timetable.stop_point_idx(id).unwrap();
        let a = raptor.labels().get(2, stop("A")).unwrap();
        assert_eq!(a.datetime, DateTime::set(0, 8 * 3600));
        let c = raptor.labels().get(1, stop("C")).unwrap();
        assert_eq!(c.datetime, DateTime::set(0, 8 * 3600 + 35 * 60));
        assert_eq!(c.boarding, Boarding::Transfer { from: stop("D") });
    }

    #[test]
    fn extra_round_after_fixed_point_changes_nothing() {
        let timetable = network();
        let mut raptor = Raptor::new();
        let starts = [start(&timetable, "A")];
        raptor.compute(&timetable, &starts, &params(DateTime::set(0, 7 * 3600), true), None);
        let nb_of_rounds = raptor.nb_of_rounds();
        let before: Vec<Vec<Option<Label>>> = (0..nb_of_rounds)
            .map(|round| raptor.labels().round(round).to_vec())
            .collect();

        assert!(!raptor.next_round(&timetable));
        for (round, labels) in before.iter().enumerate() {
            assert_eq!(raptor.labels().round(round), labels.as_slice());
        }
        assert!(raptor.labels().round(nb_of_rounds).iter().all(Option::is_none));
    }

    #[test]
    fn rounds_are_bounded() {
        let timetable = network();
        let mut raptor = Raptor::new();
        let starts = [start(&timetable, "A")];
        let mut params = params(DateTime::set(0, 7 * 3600), true);
        params.max_nb_of_rounds = 1;
        raptor.compute(&timetable, &starts, &params, None);
        assert_eq!(raptor.nb_of_rounds(), 2);
        let e = timetable.stop_point_idx("E").unwrap();
        assert!(!raptor.best(e).is_finite());
    }

    #[test]
    fn chained_vehicle_journeys_are_labelled_as_stay_in() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("first", |vj| {
                vj.block_id("block").st("A", "08:00:00").st("X", "08:20:00");
            })
            .vj("second", |vj| {
                vj.block_id("block").st("X", "08:20:00").st("Z", "08:45:00");
            })
            .build();
        let mut raptor = Raptor::new();
        let starts = [start(&timetable, "A")];
        raptor.compute(&timetable, &starts, &params(DateTime::set(0, 7 * 3600), true), None);
        let z = timetable.stop_point_idx("Z").unwrap();
        let label = raptor.labels().get(1, z).unwrap();
        assert_eq!(label.boarding.kind(), BoardingKind::StayIn);
        assert_eq!(label.datetime, DateTime::set(0, 8 * 3600 + 45 * 60));
    }

    #[test]
    fn walk_from_a_stop_point_later_reached_by_another_walk() {
        // S is first reached by toS at 08:30, then by walking from U at 08:25.
        // The walk to T still starts from the ride to S.
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
        let mut raptor = Raptor::new();
        let starts = [start(&timetable, "A")];
        raptor.compute(&timetable, &starts, &params(DateTime::set(0, 7 * 3600), true), None);

        let stop = |id: &str| timetable.stop_point_idx(id).unwrap();
        let s = raptor.labels().get(1, stop("S")).unwrap();
        assert_eq!(s.boarding, Boarding::Transfer { from: stop("U") });
        assert_eq!(s.datetime, DateTime::set(0, 8 * 3600 + 25 * 60));
        let ride = raptor.labels().get_ride(1, stop("S")).unwrap();
        assert_eq!(ride.boarding.kind(), BoardingKind::VehicleJourney);
        assert_eq!(ride.datetime, DateTime::set(0, 8 * 3600 + 30 * 60));

        let t = raptor.labels().get(1, stop("T")).unwrap();
        assert_eq!(t.boarding, Boarding::Transfer { from: stop("S") });
        assert_eq!(t.datetime, DateTime::set(0, 8 * 3600 + 35 * 60));
    }

    #[test]
    fn labels_past_the_bound_are_dropped() {
        let timetable = network();
        let mut raptor = Raptor::new();
        let starts = [start(&timetable, "A")];
        let mut params = params(DateTime::set(0, 7 * 3600), true);
        params.bound = DateTime::set(0, 8 * 3600 + 30 * 60);
        raptor.compute(&timetable, &starts, &params, None);

        let stop = |id: &str| timetable.stop_point_idx(id).unwrap();
        assert_eq!(raptor.best(stop("C")), DateTime::set(0, 8 * 3600 + 30 * 60));
        assert_eq!(raptor.best_round(stop("C")), Some(1));
        assert_eq!(raptor.best_round(stop("A")), Some(0));
        assert!(!raptor.best(stop("D")).is_finite());
        assert_eq!(raptor.best_round(stop("E")), None);
    }
}
