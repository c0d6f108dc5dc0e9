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

//! Best datetimes at every stop point reachable within a duration.

use crate::engine::raptor::{Raptor, SearchParams};
use crate::filters::Filters;
use crate::request::{
    make_origins, parse_datetimes, BadRequest, RequestError, DEFAULT_MAX_NB_OF_ROUNDS,
};
use crate::time::{DateTime, PositiveDuration};
use crate::timetable::{Accessibility, StopPointIdx, Timetable};
use chrono::NaiveDateTime;
use tracing::{debug, info};

/// With `clockwise`, stop points are reached from the origins leaving after
/// `datetime`, otherwise they reach the origins before `datetime`.
#[derive(Debug, Clone)]
pub struct IsochroneInput {
    pub origins: Vec<(String, PositiveDuration)>,
    pub datetime: NaiveDateTime,
    pub max_duration: PositiveDuration,
    pub clockwise: bool,
    pub accessibility: Accessibility,
    pub forbidden_ids: Vec<String>,
    pub allowed_ids: Vec<String>,
    pub max_nb_of_rounds: usize,
}

impl IsochroneInput {
    pub fn new<'a>(
        origins: impl IntoIterator<Item = (&'a str, PositiveDuration)>,
        datetime: NaiveDateTime,
        max_duration: PositiveDuration,
        clockwise: bool,
    ) -> Self {
        Self {
            origins: origins
                .into_iter()
                .map(|(id, duration)| (id.to_string(), duration))
                .collect(),
            datetime,
            max_duration,
            clockwise,
            accessibility: Accessibility::default(),
            forbidden_ids: Vec::new(),
            allowed_ids: Vec::new(),
            max_nb_of_rounds: DEFAULT_MAX_NB_OF_ROUNDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IsochroneStop {
    pub stop_point: StopPointIdx,
    /// best arrival (clockwise) or departure
    pub datetime: DateTime,
    /// between the requested datetime and `datetime`
    pub duration: PositiveDuration,
    /// fewest vehicle boardings giving `datetime`
    pub round: usize,
}

/// Computes the isochrone of `request` with a fresh [`Raptor`].
pub fn isochrone(
    timetable: &Timetable,
    request: &IsochroneInput,
) -> Result<Vec<IsochroneStop>, RequestError> {
    let mut raptor = Raptor::new();
    raptor.isochrone(timetable, request)
}

impl Raptor {
    /// Every stop point reached within `max_duration` of the requested datetime,
    /// origins included, sorted by duration.
    pub fn isochrone(
        &mut self,
        timetable: &Timetable,
        request: &IsochroneInput,
    ) -> Result<Vec<IsochroneStop>, RequestError> {
        let clockwise = request.clockwise;
        if request.max_nb_of_rounds == 0 {
            return Err(BadRequest::NoRound.into());
        }
        let datetime = parse_datetimes(timetable, std::slice::from_ref(&request.datetime))?
            .into_iter()
            .next()
            .ok_or(BadRequest::DepartureDatetime)?;
        let filters = Filters::new(timetable, &request.forbidden_ids, &request.allowed_ids);
        let origins = make_origins(
            timetable,
            &request.origins,
            &request.accessibility,
            filters.as_ref(),
        )?;
        info!(
            "Isochrone request from {} stop points within {}.",
            origins.len(),
            request.max_duration
        );

        let params = SearchParams {
            datetime,
            clockwise,
            accessibility: request.accessibility,
            max_nb_of_rounds: request.max_nb_of_rounds,
            bound: datetime.shift(request.max_duration, clockwise),
        };
        self.compute(timetable, &origins, &params, filters.as_ref());

        let mut result: Vec<IsochroneStop> = timetable
            .stop_points()
            .filter_map(|stop_point| {
                let best = self.best(stop_point);
                let round = self.best_round(stop_point)?;
                let duration = if clockwise {
                    best.duration_since(&datetime)
                } else {
                    datetime.duration_since(&best)
                }?;
                Some(IsochroneStop {
                    stop_point,
                    datetime: best,
                    duration,
                    round,
                })
            })
            .collect();
        result.sort_by_key(|stop| (stop.duration, stop.stop_point));
        debug!("{} stop points in the isochrone.", result.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::TimetableBuilder;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").unwrap()
    }

    fn timetable() -> Timetable {
        TimetableBuilder::new("2020-01-01", "2020-01-01")
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
    fn stop_points_within_the_duration() {
        let timetable = timetable();
        let request = IsochroneInput::new(
            vec![("A", PositiveDuration::zero())],
            datetime("20200101T074500"),
            PositiveDuration::from_hms(0, 50, 0),
            true,
        );
        let stops = isochrone(&timetable, &request).unwrap();
        let reached: Vec<(&str, u32, usize)> = stops
            .iter()
            .map(|stop| {
                (
                    timetable.stop_point(stop.stop_point).id.as_str(),
                    stop.duration.total_seconds(),
                    stop.round,
                )
            })
            .collect();
        // E is reached at 09:00, after 08:35
        assert_eq!(
            reached,
            vec![("A", 0, 0), ("B", 30 * 60, 1), ("C", 45 * 60, 1), ("D", 50 * 60, 1)]
        );
        assert_eq!(stops[3].datetime, DateTime::set(0, 8 * 3600 + 35 * 60));
    }

    #[test]
    fn counter_clockwise_isochrone() {
        let timetable = timetable();
        let request = IsochroneInput::new(
            vec![("E", PositiveDuration::zero())],
            datetime("20200101T090000"),
            PositiveDuration::from_hms(1, 0, 0),
            false,
        );
        let stops = isochrone(&timetable, &request).unwrap();
        let ids: Vec<&str> = stops
            .iter()
            .map(|stop| timetable.stop_point(stop.stop_point).id.as_str())
            .collect();
        assert_eq!(ids, vec!["E", "D", "C", "B", "A"]);
        let a = stops[4];
        assert_eq!(a.datetime, DateTime::set(0, 8 * 3600));
        assert_eq!(a.round, 2);
    }

    #[test]
    fn bad_isochrone_requests() {
        let timetable = timetable();
        let mut request = IsochroneInput::new(
            vec![("unknown", PositiveDuration::zero())],
            datetime("20200101T074500"),
            PositiveDuration::from_hms(1, 0, 0),
            true,
        );
        assert!(matches!(
            isochrone(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::NoValidDepartureStop))
        ));
        request.origins = vec![("A".to_string(), PositiveDuration::zero())];
        request.datetime = datetime("20210101T074500");
        assert!(matches!(
            isochrone(&timetable, &request),
            Err(RequestError::BadRequest(BadRequest::DepartureDatetime))
        ));
    }
}
