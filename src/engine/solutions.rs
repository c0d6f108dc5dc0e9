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
use super::labels::{Boarding, BoardingKind, Label};
use super::path_reader::{access_duration, summarize, PathSummary};
use super::raptor::{Raptor, SearchStart};
use super::RaptorError;
use crate::time::{DateTime, PositiveDuration};
use crate::timetable::{JourneyPatternIdx, StopPointIdx, Timetable};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use tracing::debug;

/// A labelled destination selected as the end of a journey.
///
/// `arrival` is the datetime of the label: an arrival for a clockwise search,
/// a departure otherwise. `total_arrival` adds the walk to the requested place.
#[derive(Debug, Clone, Copy)]
pub struct Solution {
    pub stop_point: StopPointIdx,
    pub round: usize,
    pub arrival: DateTime,
    pub total_arrival: DateTime,
    /// the latest departure (clockwise) or the earliest arrival on the side of
    /// the search origin that still gives this solution
    pub upper_bound: DateTime,
    pub walking_time: PositiveDuration,
    /// time lost per second of walking saved, for walking alternatives
    pub ratio: f32,
    /// journey pattern of the last ride
    pub journey_pattern: JourneyPatternIdx,
}

impl Ord for Solution {
    fn cmp(&self, other: &Self) -> Ordering {
        self.arrival
            .cmp(&other.arrival)
            .then(self.round.cmp(&other.round))
            .then(self.stop_point.cmp(&other.stop_point))
            .then(self.upper_bound.cmp(&other.upper_bound))
            .then(self.walking_time.cmp(&other.walking_time))
            .then(self.ratio.total_cmp(&other.ratio))
    }
}

impl PartialOrd for Solution {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Solution {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Solution {}

/// The best destination of each round, kept when it improves on every previous round.
///
/// Among destinations reaching the same datetime in a round, the one boarding
/// the fewest vehicles wins, then the first one in `destinations`.
/// Destinations reached past the bound of the search, walk included, are left out.
/// Solutions are ordered by increasing round.
pub fn get_pareto_front(
    timetable: &Timetable,
    raptor: &Raptor,
    departures: &[SearchStart],
    destinations: &[SearchStart],
) -> Result<Vec<Solution>, RaptorError> {
    let clockwise = raptor.clockwise();
    let bound = raptor.params().bound;
    let labels = raptor.labels();
    let mut result = Vec::new();
    let mut best_total = DateTime::unreached(clockwise);

    for round in 1..raptor.nb_of_rounds() {
        let mut round_best: Option<(Solution, PathSummary)> = None;
        for destination in destinations {
            let label = match labels.try_get(round, destination.stop_point) {
                Some(label) if is_arrival(label) => *label,
                _ => continue,
            };
            let total = label.datetime.shift(destination.access_duration, clockwise);
            if !total.improves(&best_total, clockwise) || !total.is_within(&bound, clockwise) {
                continue;
            }
            let replace = match &round_best {
                None => true,
                Some((current, current_summary)) => {
                    if total.improves(&current.total_arrival, clockwise) {
                        true
                    } else if total == current.total_arrival {
                        let summary = summarize(timetable, raptor, destination.stop_point, round)?;
                        summary.nb_of_vehicles() < current_summary.nb_of_vehicles()
                    } else {
                        false
                    }
                }
            };
            if replace {
                round_best = Some(make_solution(
                    timetable,
                    raptor,
                    departures,
                    destination,
                    round,
                    &label,
                )?);
            }
        }
        if let Some((solution, _)) = round_best {
            debug!(
                "Round {} reaches stop point {} at {}.",
                round,
                timetable.stop_point(solution.stop_point).id,
                solution.total_arrival
            );
            best_total = solution.total_arrival;
            result.push(solution);
        }
    }
    Ok(result)
}

/// Destinations reached with less walking than `best`, for an acceptable loss of time.
///
/// A candidate is kept when the time it loses on `best`, divided by the walking
/// time it saves, is below `max_walking_ratio`. Only the best candidate of each
/// journey pattern is kept, and at most `max_alternatives` candidates overall,
/// ordered by ratio.
pub fn get_walking_solutions(
    timetable: &Timetable,
    raptor: &Raptor,
    departures: &[SearchStart],
    destinations: &[SearchStart],
    best: &Solution,
    max_walking_ratio: f32,
    max_alternatives: usize,
) -> Result<Vec<Solution>, RaptorError> {
    let clockwise = raptor.clockwise();
    let bound = raptor.params().bound;
    let labels = raptor.labels();
    let mut by_journey_pattern: BTreeMap<JourneyPatternIdx, Solution> = BTreeMap::new();

    for round in 1..raptor.nb_of_rounds() {
        for destination in destinations {
            let label = match labels.try_get(round, destination.stop_point) {
                Some(label) if is_arrival(label) => *label,
                _ => continue,
            };
            let (mut candidate, _) =
                make_solution(timetable, raptor, departures, destination, round, &label)?;
            if candidate.walking_time >= best.walking_time
                || !candidate.total_arrival.is_within(&bound, clockwise)
            {
                continue;
            }
            let saved = best
                .walking_time
                .saturating_sub(candidate.walking_time)
                .total_seconds();
            if saved == 0 {
                continue;
            }
            let lost = if clockwise {
                candidate.total_arrival.duration_since(&best.total_arrival)
            } else {
                best.total_arrival.duration_since(&candidate.total_arrival)
            }
            .map(|duration| duration.total_seconds())
            .unwrap_or(0);
            candidate.ratio = lost as f32 / saved as f32;
            if candidate.ratio >= max_walking_ratio {
                continue;
            }
            let better = by_journey_pattern
                .get(&candidate.journey_pattern)
                .map_or(true, |current| candidate.ratio < current.ratio);
            if better {
                by_journey_pattern.insert(candidate.journey_pattern, candidate);
            }
        }
    }

    let mut result: Vec<Solution> = by_journey_pattern.into_iter().map(|(_, s)| s).collect();
    result.sort_by(|lhs, rhs| lhs.ratio.total_cmp(&rhs.ratio));
    result.truncate(max_alternatives);
    debug!("{} walking alternatives kept.", result.len());
    Ok(result)
}

// Labels a journey can end with: reached by a vehicle, or by walking from it.
fn is_arrival(label: &Label) -> bool {
    label.boarding.is_ride() || label.boarding.kind() == BoardingKind::Transfer
}

fn make_solution(
    timetable: &Timetable,
    raptor: &Raptor,
    departures: &[SearchStart],
    destination: &SearchStart,
    round: usize,
    label: &Label,
) -> Result<(Solution, PathSummary), RaptorError> {
    let clockwise = raptor.clockwise();
    let stop_point = destination.stop_point;
    let missing = RaptorError::MissingStopTime { round, stop_point };
    let (arrival, alighting) = match label.boarding {
        Boarding::VehicleJourney { alighting, .. } | Boarding::StayIn { alighting, .. } => {
            let found = best_stop_time(
                timetable,
                alighting,
                label.datetime,
                &raptor.accessibility().vehicle,
                !clockwise,
                true,
            )
            .ok_or_else(|| missing.clone())?;
            (found.datetime, alighting)
        }
        // the walk starts where the last ride ends
        Boarding::Transfer { from } => match raptor.labels().get_ride(round, from)?.boarding {
            Boarding::VehicleJourney { alighting, .. } | Boarding::StayIn { alighting, .. } => {
                (label.datetime, alighting)
            }
            _ => return Err(missing),
        },
        Boarding::Departure => return Err(missing),
    };

    let summary = summarize(timetable, raptor, stop_point, round)?;
    let origin = summary
        .origin
        .ok_or(RaptorError::UninitializedLabel { round: 0, stop_point })?;
    let access = access_duration(departures, origin);
    let solution = Solution {
        stop_point,
        round,
        arrival,
        total_arrival: arrival.shift(destination.access_duration, clockwise),
        upper_bound: summary.origin_datetime(clockwise).shift(access, !clockwise),
        walking_time: access + summary.transfer_walking + destination.access_duration,
        ratio: 0.,
        journey_pattern: timetable.journey_pattern_point(alighting).journey_pattern,
    };
    Ok((solution, summary))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::raptor::SearchParams;
    use crate::timetable::{Accessibility, TimetableBuilder};

    fn start(timetable: &Timetable, id: &str, walking: &str) -> SearchStart {
        SearchStart {
            stop_point: timetable.stop_point_idx(id).unwrap(),
            access_duration: walking.parse().unwrap(),
        }
    }

    fn run(timetable: &Timetable, starts: &[SearchStart], seconds: u32, clockwise: bool) -> Raptor {
        let mut raptor = Raptor::new();
        let params = SearchParams {
            datetime: DateTime::set(0, seconds),
            clockwise,
            accessibility: Accessibility::default(),
            max_nb_of_rounds: 10,
            bound: DateTime::unreached(clockwise),
        };
        raptor.compute(timetable, starts, &params, None);
        raptor
    }

    // a slow direct line, and a faster one with a change
    fn network() -> Timetable {
        TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("slow", |vj| {
                vj.st("A", "08:00:00").st("C", "10:00:00");
            })
            .vj("fast_1", |vj| {
                vj.st("A", "08:05:00").st("B", "08:30:00");
            })
            .vj("fast_2", |vj| {
                vj.st("B", "08:35:00").st("C", "09:00:00");
            })
            .build()
    }

    #[test]
    fn pareto_front_improves_with_rounds() {
        let timetable = network();
        let departures = [start(&timetable, "A", "00:00:00")];
        let destinations = [start(&timetable, "C", "00:02:00")];
        let raptor = run(&timetable, &departures, 7 * 3600, true);
        let front = get_pareto_front(&timetable, &raptor, &departures, &destinations).unwrap();

        assert_eq!(front.len(), 2);
        assert_eq!(front[0].round, 1);
        assert_eq!(front[0].arrival, DateTime::set(0, 10 * 3600));
        assert_eq!(front[0].total_arrival, DateTime::set(0, 10 * 3600 + 120));
        assert_eq!(front[0].upper_bound, DateTime::set(0, 8 * 3600));
        assert_eq!(front[1].round, 2);
        assert_eq!(front[1].arrival, DateTime::set(0, 9 * 3600));
        assert_eq!(front[1].upper_bound, DateTime::set(0, 8 * 3600 + 5 * 60));
        for pair in front.windows(2) {
            assert!(pair[1].total_arrival < pair[0].total_arrival);
        }
    }

    #[test]
    fn arrivals_past_the_bound_are_left_out() {
        let timetable = network();
        let departures = [start(&timetable, "A", "00:00:00")];
        let destinations = [start(&timetable, "C", "00:02:00")];
        let mut raptor = Raptor::new();
        let params = SearchParams {
            datetime: DateTime::set(0, 7 * 3600),
            clockwise: true,
            accessibility: Accessibility::default(),
            max_nb_of_rounds: 10,
            bound: DateTime::set(0, 9 * 3600 + 60),
        };
        raptor.compute(&timetable, &departures, &params, None);
        // C is reached at 09:00, but the walk from C ends at 09:02
        let front = get_pareto_front(&timetable, &raptor, &departures, &destinations).unwrap();
        assert!(front.is_empty());

        let mut params = params;
        params.bound = DateTime::set(0, 9 * 3600 + 120);
        raptor.compute(&timetable, &departures, &params, None);
        let front = get_pareto_front(&timetable, &raptor, &departures, &destinations).unwrap();
        assert_eq!(front.len(), 1);
        assert_eq!(front[0].round, 2);
    }

    #[test]
    fn counter_clockwise_pareto_front() {
        let timetable = network();
        let departures = [start(&timetable, "C", "00:00:00")];
        let destinations = [start(&timetable, "A", "00:00:00")];
        let raptor = run(&timetable, &departures, 11 * 3600, false);
        let front = get_pareto_front(&timetable, &raptor, &departures, &destinations).unwrap();
        assert_eq!(front.len(), 2);
        assert_eq!(front[0].arrival, DateTime::set(0, 8 * 3600));
        assert_eq!(front[1].arrival, DateTime::set(0, 8 * 3600 + 5 * 60));
        assert_eq!(front[1].upper_bound, DateTime::set(0, 9 * 3600));
        for pair in front.windows(2) {
            assert!(pair[1].total_arrival > pair[0].total_arrival);
        }
    }

    #[test]
    fn walking_alternatives_walk_less() {
        // D is reached sooner but is far from the requested place,
        // E, F and G are closer and reached later
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("1", |vj| {
                vj.route("r1").st("A", "08:00:00").st("D", "08:10:00");
            })
            .vj("2", |vj| {
                vj.route("r2").st("A", "08:00:00").st("E", "08:15:00");
            })
            .vj("3", |vj| {
                vj.route("r3").st("A", "08:00:00").st("F", "08:18:00");
            })
            .vj("4", |vj| {
                vj.route("r4").st("A", "08:00:00").st("G", "08:16:00");
            })
            .vj("5", |vj| {
                vj.route("r5").st("A", "08:00:00").st("H", "08:40:00");
            })
            .build();
        let departures = [start(&timetable, "A", "00:00:00")];
        let destinations = [
            start(&timetable, "D", "00:10:00"),
            start(&timetable, "E", "00:04:00"),
            start(&timetable, "F", "00:01:00"),
            start(&timetable, "G", "00:02:00"),
            start(&timetable, "H", "00:00:00"),
        ];
        let raptor = run(&timetable, &departures, 7 * 3600, true);
        let front = get_pareto_front(&timetable, &raptor, &departures, &destinations).unwrap();
        assert_eq!(front.len(), 1);
        let best = front[0];
        // 08:18 at G, D gives 08:20
        assert_eq!(best.stop_point, timetable.stop_point_idx("G").unwrap());

        let alternatives = get_walking_solutions(
            &timetable,
            &raptor,
            &departures,
            &destinations,
            &best,
            2.0,
            2,
        )
        .unwrap();
        // F: loses 1 minute for 1 minute saved, H loses 22 minutes for 2 minutes saved
        assert_eq!(alternatives.len(), 1);
        assert_eq!(alternatives[0].stop_point, timetable.stop_point_idx("F").unwrap());
        assert!((alternatives[0].ratio - 1.0).abs() < f32::EPSILON);
        for alternative in &alternatives {
            assert!(alternative.walking_time < best.walking_time);
        }

        let many = get_walking_solutions(
            &timetable,
            &raptor,
            &departures,
            &destinations,
            &best,
            100.0,
            2,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert!(many[0].ratio <= many[1].ratio);
    }

    #[test]
    fn journey_ending_with_a_walk() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("1", |vj| {
                vj.st("A", "08:00:00").st("B", "08:20:00");
            })
            .connection("B", "C", "00:05:00")
            .build();
        let departures = [start(&timetable, "A", "00:00:00")];
        let destinations = [start(&timetable, "C", "00:00:00")];
        let raptor = run(&timetable, &departures, 7 * 3600, true);
        let front = get_pareto_front(&timetable, &raptor, &departures, &destinations).unwrap();

        assert_eq!(front.len(), 1);
        assert_eq!(front[0].round, 1);
        assert_eq!(front[0].arrival, DateTime::set(0, 8 * 3600 + 25 * 60));
        assert_eq!(front[0].walking_time, PositiveDuration::from_hms(0, 5, 0));
        let b = timetable.stop_point_idx("B").unwrap();
        let ride = timetable.journey_pattern_points_of(b)[0];
        assert_eq!(
            front[0].journey_pattern,
            timetable.journey_pattern_point(ride).journey_pattern
        );
    }
}
