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

use crate::engine::raptor::{Raptor, SearchParams, SearchStart};
use crate::engine::solutions::{get_pareto_front, get_walking_solutions, Solution};
use crate::engine::RaptorError;
use crate::filters::Filters;
use crate::response::Path;
use crate::time::{DateTime, PositiveDuration};
use crate::timetable::{Accessibility, Timetable};
use chrono::NaiveDateTime;
use std::collections::HashSet;
use std::fmt;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MAX_NB_OF_ROUNDS: usize = 10;
pub const DEFAULT_MAX_WALKING_RATIO: f32 = 2.0;
pub const DEFAULT_MAX_WALKING_ALTERNATIVES: usize = 2;

/// Bounds of a journey search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JourneyParams {
    /// maximum number of vehicles boarded in a journey
    pub max_nb_of_rounds: usize,
    /// seconds a walking alternative may lose per second of walking it saves
    pub max_walking_ratio: f32,
    pub max_walking_alternatives: usize,
}

impl Default for JourneyParams {
    fn default() -> Self {
        Self {
            max_nb_of_rounds: DEFAULT_MAX_NB_OF_ROUNDS,
            max_walking_ratio: DEFAULT_MAX_WALKING_RATIO,
            max_walking_alternatives: DEFAULT_MAX_WALKING_ALTERNATIVES,
        }
    }
}

/// A journey request.
///
/// Origins and destinations are stop point ids with the walking duration between
/// the requested place and the stop point.
/// With `clockwise`, journeys leave the origins after each datetime, otherwise
/// they reach the destinations before each datetime.
/// A `bound` drops the journeys arriving after it (`clockwise`) or leaving
/// before it.
#[derive(Debug, Clone)]
pub struct RequestInput {
    pub origins: Vec<(String, PositiveDuration)>,
    pub destinations: Vec<(String, PositiveDuration)>,
    pub datetimes: Vec<NaiveDateTime>,
    pub clockwise: bool,
    pub bound: Option<NaiveDateTime>,
    pub accessibility: Accessibility,
    pub forbidden_ids: Vec<String>,
    pub allowed_ids: Vec<String>,
    pub params: JourneyParams,
}

impl RequestInput {
    pub fn new<'a>(
        origins: impl IntoIterator<Item = (&'a str, PositiveDuration)>,
        destinations: impl IntoIterator<Item = (&'a str, PositiveDuration)>,
        datetime: NaiveDateTime,
        clockwise: bool,
    ) -> Self {
        Self {
            origins: origins
                .into_iter()
                .map(|(id, duration)| (id.to_string(), duration))
                .collect(),
            destinations: destinations
                .into_iter()
                .map(|(id, duration)| (id.to_string(), duration))
                .collect(),
            datetimes: vec![datetime],
            clockwise,
            bound: None,
            accessibility: Accessibility::default(),
            forbidden_ids: Vec::new(),
            allowed_ids: Vec::new(),
            params: JourneyParams::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BadRequest {
    DepartureDatetime,
    NoValidDepartureStop,
    NoValidArrivalStop,
    ReversedBounds,
    NoRound,
    Accessibility,
}

impl fmt::Display for BadRequest {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BadRequest::DepartureDatetime => write!(
                f,
                "The requested datetime is out of the validity period of the data."
            ),
            BadRequest::NoValidDepartureStop => {
                write!(f, "No valid departure stop among the provided ones.")
            }
            BadRequest::NoValidArrivalStop => {
                write!(f, "No valid arrival stop among the provided ones.")
            }
            BadRequest::ReversedBounds => {
                write!(f, "The requested datetime bounds are in the wrong order.")
            }
            BadRequest::NoRound => write!(f, "The maximum number of rounds must be positive."),
            BadRequest::Accessibility => write!(
                f,
                "No stop point among the provided ones satisfies the requested accessibility."
            ),
        }
    }
}

impl std::error::Error for BadRequest {}

#[derive(Debug)]
pub enum RequestError {
    BadRequest(BadRequest),
    Raptor(RaptorError),
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RequestError::BadRequest(err) => write!(f, "Bad request : {}", err),
            RequestError::Raptor(err) => write!(f, "Journey search failed : {}", err),
        }
    }
}

impl std::error::Error for RequestError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RequestError::BadRequest(err) => Some(err),
            RequestError::Raptor(err) => Some(err),
        }
    }
}

impl From<BadRequest> for RequestError {
    fn from(err: BadRequest) -> Self {
        RequestError::BadRequest(err)
    }
}

impl From<RaptorError> for RequestError {
    fn from(err: RaptorError) -> Self {
        RequestError::Raptor(err)
    }
}

/// Computes the journeys of `request` with a fresh [`Raptor`].
pub fn make_journeys(
    timetable: &Timetable,
    request: &RequestInput,
) -> Result<Vec<Path>, RequestError> {
    let mut raptor = Raptor::new();
    raptor.make_journeys(timetable, request)
}

impl Raptor {
    /// Computes the journeys of `request`.
    ///
    /// One search is done for each requested datetime. The paths of all searches
    /// are returned, without duplicates, sorted by arrival (clockwise) or by
    /// departure (counter-clockwise). No journey found is not an error.
    pub fn make_journeys(
        &mut self,
        timetable: &Timetable,
        request: &RequestInput,
    ) -> Result<Vec<Path>, RequestError> {
        let clockwise = request.clockwise;
        if request.params.max_nb_of_rounds == 0 {
            return Err(BadRequest::NoRound.into());
        }
        let datetimes = parse_datetimes(timetable, &request.datetimes)?;
        let bound = parse_bound(timetable, request.bound.as_ref(), &datetimes, clockwise)?;

        let filters = Filters::new(timetable, &request.forbidden_ids, &request.allowed_ids);
        let origins = make_origins(
            timetable,
            &request.origins,
            &request.accessibility,
            filters.as_ref(),
        )?;
        let destinations = make_stops(
            timetable,
            &request.destinations,
            &request.accessibility,
            filters.as_ref(),
            "arrival",
        )?;
        let (starts, targets) = if clockwise {
            (origins, destinations)
        } else {
            (destinations, origins)
        };

        info!(
            "Journey request with {} departure and {} arrival stop points at {} datetimes, {}.",
            request.origins.len(),
            request.destinations.len(),
            datetimes.len(),
            if clockwise {
                "departing after"
            } else {
                "arriving before"
            }
        );

        let mut reverse = Raptor::new();
        let mut paths: Vec<Path> = Vec::new();
        for datetime in datetimes {
            let params = SearchParams {
                datetime,
                clockwise,
                accessibility: request.accessibility,
                max_nb_of_rounds: request.params.max_nb_of_rounds,
                bound: bound.unwrap_or_else(|| DateTime::unreached(clockwise)),
            };
            self.compute(timetable, &starts, &params, filters.as_ref());
            let new_paths = self
                .collect_paths(
                    timetable,
                    &mut reverse,
                    &starts,
                    &targets,
                    &request.params,
                    filters.as_ref(),
                )
                .map_err(|err| {
                    error!("{}", err);
                    err
                })?;
            for path in new_paths {
                if !paths.iter().any(|known| known.items == path.items) {
                    paths.push(path);
                }
            }
        }

        if clockwise {
            paths.sort_by_key(|path| path.arrival());
        } else {
            paths.sort_by_key(|path| path.departure());
        }
        debug!("{} journeys found.", paths.len());
        Ok(paths)
    }

    fn collect_paths(
        &self,
        timetable: &Timetable,
        reverse: &mut Raptor,
        starts: &[SearchStart],
        targets: &[SearchStart],
        params: &JourneyParams,
        filters: Option<&Filters<'_>>,
    ) -> Result<Vec<Path>, RaptorError> {
        let mut solutions = get_pareto_front(timetable, self, starts, targets)?;
        if let Some(best) = solutions.last().copied() {
            let alternatives = get_walking_solutions(
                timetable,
                self,
                starts,
                targets,
                &best,
                params.max_walking_ratio,
                params.max_walking_alternatives,
            )?;
            solutions.extend(alternatives);
        }
        let mut seen = HashSet::new();
        solutions.retain(|solution| seen.insert((solution.stop_point, solution.round)));

        solutions
            .iter()
            .map(|solution| {
                let tightened = self.tighten(timetable, reverse, starts, solution, filters);
                match tightened {
                    Some(path) => Ok(path),
                    None => {
                        Path::from_labels(timetable, self, solution.stop_point, solution.round)
                    }
                }
            })
            .collect()
    }

    // Searches back from the end of `solution` to the starts, with no more
    // rounds than the solution, so that the path leaves the starts as late
    // (clockwise) or reaches them as early as possible.
    fn tighten(
        &self,
        timetable: &Timetable,
        reverse: &mut Raptor,
        starts: &[SearchStart],
        solution: &Solution,
        filters: Option<&Filters<'_>>,
    ) -> Option<Path> {
        let params = self.params();
        let reverse_params = SearchParams {
            datetime: solution.arrival,
            clockwise: !params.clockwise,
            accessibility: params.accessibility,
            max_nb_of_rounds: solution.round,
            bound: params.datetime,
        };
        let seed = [SearchStart {
            stop_point: solution.stop_point,
            access_duration: PositiveDuration::zero(),
        }];
        reverse.compute(timetable, &seed, &reverse_params, filters);
        let path = get_pareto_front(timetable, reverse, &seed, starts)
            .and_then(|front| match front.last() {
                Some(best) => {
                    Path::from_labels(timetable, reverse, best.stop_point, best.round).map(Some)
                }
                None => Ok(None),
            });
        match path {
            Ok(Some(mut path)) => {
                path.request_datetime = params.datetime;
                Some(path)
            }
            Ok(None) => {
                debug!(
                    "No journey back from stop point {}, I keep the first one found.",
                    timetable.stop_point(solution.stop_point).id
                );
                None
            }
            Err(err) => {
                warn!(
                    "Journey back from stop point {} failed : {}. I keep the first one found.",
                    timetable.stop_point(solution.stop_point).id,
                    err
                );
                None
            }
        }
    }
}

pub(crate) fn parse_datetimes(
    timetable: &Timetable,
    datetimes: &[NaiveDateTime],
) -> Result<Vec<DateTime>, BadRequest> {
    if datetimes.is_empty() {
        warn!("No datetime given in the request.");
        return Err(BadRequest::DepartureDatetime);
    }
    let calendar = timetable.calendar();
    datetimes
        .iter()
        .map(|datetime| {
            calendar.from_naive_datetime(datetime).ok_or_else(|| {
                warn!(
                    "The requested datetime {} is out of bound of the allowed dates. \
                    Allowed dates are between {} and {}.",
                    datetime,
                    calendar.first_date(),
                    calendar.last_date(),
                );
                BadRequest::DepartureDatetime
            })
        })
        .collect()
}

// A bound out of the calendar is ignored. A bound before a datetime
// (clockwise) or after it is an error.
fn parse_bound(
    timetable: &Timetable,
    bound: Option<&NaiveDateTime>,
    datetimes: &[DateTime],
    clockwise: bool,
) -> Result<Option<DateTime>, BadRequest> {
    let bound = match bound {
        Some(bound) => bound,
        None => return Ok(None),
    };
    let calendar = timetable.calendar();
    let parsed = match calendar.from_naive_datetime(bound) {
        Some(parsed) => parsed,
        None => {
            warn!(
                "The requested bound {} is out of the allowed dates. I ignore it.",
                bound
            );
            return Ok(None);
        }
    };
    if datetimes
        .iter()
        .any(|datetime| !parsed.is_within(datetime, !clockwise))
    {
        warn!(
            "The requested bound {} does not come {} every requested datetime.",
            bound,
            if clockwise { "after" } else { "before" }
        );
        return Err(BadRequest::ReversedBounds);
    }
    Ok(Some(parsed))
}

pub(crate) fn make_origins(
    timetable: &Timetable,
    stops: &[(String, PositiveDuration)],
    accessibility: &Accessibility,
    filters: Option<&Filters<'_>>,
) -> Result<Vec<SearchStart>, BadRequest> {
    make_stops(timetable, stops, accessibility, filters, "departure").map_err(|err| match err {
        BadRequest::NoValidArrivalStop => BadRequest::NoValidDepartureStop,
        other => other,
    })
}

fn make_stops(
    timetable: &Timetable,
    stops: &[(String, PositiveDuration)],
    accessibility: &Accessibility,
    filters: Option<&Filters<'_>>,
    kind: &str,
) -> Result<Vec<SearchStart>, BadRequest> {
    let is_allowed = |stop_point| {
        filters.map_or(true, |filters| filters.is_stop_point_valid(stop_point, timetable))
    };
    let mut nb_of_known = 0;
    let result: Vec<SearchStart> = stops
        .iter()
        .enumerate()
        .filter_map(|(idx, (stop_point_id, duration))| {
            let stop_point = timetable.stop_point_idx(stop_point_id).or_else(|| {
                warn!(
                    "The {}th {} stop point {} is not found in the timetable. I ignore it.",
                    idx, kind, stop_point_id
                );
                None
            })?;
            if !is_allowed(stop_point) {
                warn!(
                    "The {}th {} stop point {} is forbidden. I ignore it.",
                    idx, kind, stop_point_id
                );
                return None;
            }
            nb_of_known += 1;
            let properties = &timetable.stop_point(stop_point).properties;
            if !properties.satisfies(&accessibility.stop) {
                warn!(
                    "The {}th {} stop point {} does not satisfy the requested accessibility. I ignore it.",
                    idx, kind, stop_point_id
                );
                return None;
            }
            Some(SearchStart {
                stop_point,
                access_duration: *duration,
            })
        })
        .collect();

    if !result.is_empty() {
        Ok(result)
    } else if nb_of_known > 0 {
        Err(BadRequest::Accessibility)
    } else {
        Err(BadRequest::NoValidArrivalStop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::response::ItemType;
    use crate::timetable::{StopProperties, TimetableBuilder};

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").unwrap()
    }

    fn timetable() -> Timetable {
        TimetableBuilder::new("2020-01-01", "2020-01-02")
            .vj("toto", |vj| {
                vj.st("A", "08:00:00").st("B", "08:15:00").st("C", "08:30:00");
            })
            .stop_point("C", |sp| {
                sp.properties.wheelchair_boarding = true;
            })
            .build()
    }

    fn zero() -> PositiveDuration {
        PositiveDuration::zero()
    }

    #[test]
    fn bad_requests() {
        let timetable = timetable();
        let mut request = RequestInput::new(
            vec![("A", zero())],
            vec![("C", zero())],
            datetime("20200301T070000"),
            true,
        );
        assert!(matches!(
            make_journeys(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::DepartureDatetime))
        ));

        request.datetimes = vec![datetime("20200101T070000")];
        request.origins = vec![("unknown".to_string(), zero())];
        assert!(matches!(
            make_journeys(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::NoValidDepartureStop))
        ));

        request.origins = vec![("A".to_string(), zero())];
        request.destinations = vec![];
        assert!(matches!(
            make_journeys(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::NoValidArrivalStop))
        ));

        request.destinations = vec![("C".to_string(), zero())];
        request.accessibility.stop = StopProperties {
            wheelchair_boarding: true,
            ..Default::default()
        };
        assert!(matches!(
            make_journeys(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::Accessibility))
        ));

        request.accessibility = Accessibility::default();
        request.params.max_nb_of_rounds = 0;
        assert!(matches!(
            make_journeys(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::NoRound))
        ));
    }

    #[test]
    fn journeys_leave_as_late_as_possible() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-01")
            .vj("early", |vj| {
                vj.st("A", "08:00:00").st("B", "08:10:00");
            })
            .vj("late", |vj| {
                vj.st("A", "08:30:00").st("B", "08:40:00");
            })
            .vj("next", |vj| {
                vj.st("B", "09:00:00").st("C", "09:20:00");
            })
            .build();
        let request = RequestInput::new(
            vec![("A", zero())],
            vec![("C", zero())],
            datetime("20200101T070000"),
            true,
        );
        let paths = make_journeys(&timetable, &request).unwrap();
        assert_eq!(paths.len(), 1);
        let path = &paths[0];
        let late = timetable.vehicle_journey_idx("late").unwrap();
        assert_eq!(path.items[0].vehicle_journey, Some(late));
        assert_eq!(path.departure(), Some(DateTime::set(0, 8 * 3600 + 30 * 60)));
        assert_eq!(path.arrival(), Some(DateTime::set(0, 9 * 3600 + 20 * 60)));
        assert_eq!(path.duration, PositiveDuration::from_hms(0, 50, 0));
        assert_eq!(path.request_datetime, DateTime::set(0, 7 * 3600));

        // arriving before 09:30, the same trips are taken
        let request = RequestInput::new(
            vec![("A", zero())],
            vec![("C", zero())],
            datetime("20200101T093000"),
            false,
        );
        let paths = make_journeys(&timetable, &request).unwrap();
        assert_eq!(paths.len(), 1);
        assert_eq!(paths[0].items[0].vehicle_journey, Some(late));
        assert_eq!(paths[0].arrival(), Some(DateTime::set(0, 9 * 3600 + 20 * 60)));
    }

    #[test]
    fn journeys_are_bounded() {
        let timetable = timetable();
        let mut request = RequestInput::new(
            vec![("A", zero())],
            vec![("C", zero())],
            datetime("20200101T070000"),
            true,
        );
        request.bound = Some(datetime("20200101T082000"));
        assert!(make_journeys(&timetable, &request).unwrap().is_empty());

        request.bound = Some(datetime("20200101T083000"));
        assert_eq!(make_journeys(&timetable, &request).unwrap().len(), 1);

        // out of the calendar, the bound is ignored
        request.bound = Some(datetime("20210101T000000"));
        assert_eq!(make_journeys(&timetable, &request).unwrap().len(), 1);

        request.bound = Some(datetime("20200101T060000"));
        assert!(matches!(
            make_journeys(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::ReversedBounds))
        ));

        request.clockwise = false;
        request.datetimes = vec![datetime("20200101T090000")];
        request.bound = Some(datetime("20200101T081000"));
        assert!(make_journeys(&timetable, &request).unwrap().is_empty());
        request.bound = Some(datetime("20200101T080000"));
        assert_eq!(make_journeys(&timetable, &request).unwrap().len(), 1);
    }

    #[test]
    fn several_datetimes_give_distinct_paths() {
        let timetable = timetable();
        let mut request = RequestInput::new(
            vec![("A", zero())],
            vec![("C", zero())],
            datetime("20200101T070000"),
            true,
        );
        request.datetimes = vec![
            datetime("20200101T070000"),
            datetime("20200101T073000"),
            datetime("20200101T090000"),
        ];
        let paths = make_journeys(&timetable, &request).unwrap();
        // the two first datetimes give the same journey, the last one the next day's
        assert_eq!(paths.len(), 2);
        assert!(paths[0].arrival() < paths[1].arrival());
        assert_eq!(paths[0].nb_of_items(ItemType::PublicTransport), 1);
        assert_eq!(paths[1].departure(), Some(DateTime::set(1, 8 * 3600)));
    }
}
