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

use crate::engine::best_stop_time::departures_between;
use crate::filters::Filters;
use crate::request::BadRequest;
use crate::timetable::{Accessibility, StopPointIdx, Timetable, VehicleJourneyIdx};
use chrono::{NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

pub struct NextDeparturesRequest<'a> {
    pub stop_points: Vec<StopPointIdx>,
    pub filters: Option<Filters<'a>>,
    pub from_datetime: NaiveDateTime,
    pub until_datetime: NaiveDateTime,
    pub max_response: usize,
    pub accessibility: Accessibility,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextDeparture {
    pub stop_point: StopPointIdx,
    pub vehicle_journey: VehicleJourneyIdx,
    pub boarding_time: NaiveDateTime,
    /// the date the times of the vehicle journey are counted from
    pub vehicle_date: NaiveDate,
    /// position of the stop time in the vehicle journey
    pub order: usize,
}

/// Resolves stop point ids, with or without the `stop_point:` prefix.
/// Unknown ids are ignored.
pub fn stop_points_of_request<T>(timetable: &Timetable, ids: &[T]) -> Vec<StopPointIdx>
where
    T: AsRef<str>,
{
    ids.iter()
        .filter_map(|id| {
            let id = id.as_ref();
            let stop_point_id = id
                .strip_prefix(crate::filters::PREFIX_ID_STOP_POINT)
                .unwrap_or(id);
            let idx = timetable.stop_point_idx(stop_point_id);
            if idx.is_none() {
                warn!(
                    "Unknown stop point {} in next departures request. I'll ignore it.",
                    id
                );
            }
            idx
        })
        .collect()
}

/// The `max_response` first departures from the requested stop points
/// between `from_datetime` (included) and `until_datetime` (excluded),
/// sorted by boarding time.
pub fn next_departures(
    timetable: &Timetable,
    request: &NextDeparturesRequest<'_>,
) -> Result<Vec<NextDeparture>, BadRequest> {
    if request.until_datetime < request.from_datetime {
        warn!(
            "The requested until_datetime {} is before the from_datetime {}.",
            request.until_datetime, request.from_datetime
        );
        return Err(BadRequest::ReversedBounds);
    }
    let calendar = timetable.calendar();
    let to_datetime = |datetime: &NaiveDateTime, name: &str| {
        calendar.from_naive_datetime(datetime).ok_or_else(|| {
            warn!(
                "The requested {} {} is out of bound of the allowed dates. \
                Allowed dates are between {} and {}.",
                name,
                datetime,
                calendar.first_date(),
                calendar.last_date(),
            );
            BadRequest::DepartureDatetime
        })
    };
    let from_datetime = to_datetime(&request.from_datetime, "from_datetime")?;
    let until_datetime = to_datetime(&request.until_datetime, "until_datetime")?;

    let mut response = Vec::new();
    for stop_point in &request.stop_points {
        let stop_point = *stop_point;
        if !timetable
            .stop_point(stop_point)
            .properties
            .satisfies(&request.accessibility.stop)
        {
            continue;
        }
        if let Some(filters) = &request.filters {
            if !filters.is_stop_point_valid(stop_point, timetable) {
                continue;
            }
        }
        for point in timetable.journey_pattern_points_of(stop_point) {
            let point = *point;
            // nothing to board towards at the end of a journey pattern
            if timetable.next_point(point, true).is_none() {
                continue;
            }
            let journey_pattern = timetable.journey_pattern_point(point).journey_pattern;
            if let Some(filters) = &request.filters {
                if !filters.is_journey_pattern_valid(timetable.journey_pattern(journey_pattern)) {
                    continue;
                }
            }
            let departures = departures_between(
                timetable,
                point,
                from_datetime,
                until_datetime,
                &request.accessibility.vehicle,
            );
            response.extend(
                departures
                    .into_iter()
                    .take(request.max_response)
                    .map(|found| NextDeparture {
                        stop_point,
                        vehicle_journey: found.vehicle_journey,
                        boarding_time: calendar.to_naive_datetime(&found.datetime),
                        vehicle_date: calendar.to_naive_date(found.base.date()),
                        order: found.order,
                    }),
            );
        }
    }

    response.sort_by(|lhs, rhs| lhs.boarding_time.cmp(&rhs.boarding_time));
    response.truncate(request.max_response);
    debug!("{} next departures found.", response.len());
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timetable::TimetableBuilder;

    fn datetime(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").unwrap()
    }

    fn request(timetable: &Timetable, from: &str, until: &str) -> NextDeparturesRequest<'static> {
        NextDeparturesRequest {
            stop_points: stop_points_of_request(timetable, &["stop_point:A", "B", "unknown"]),
            filters: None,
            from_datetime: datetime(from),
            until_datetime: datetime(until),
            max_response: 10,
            accessibility: Accessibility::default(),
        }
    }

    #[test]
    fn departures_in_a_time_window() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-02")
            .vj("first", |vj| {
                vj.st("A", "08:00:00").st("B", "08:10:00").st("C", "08:20:00");
            })
            .vj("second", |vj| {
                vj.st("A", "09:00:00").st("B", "09:10:00").st("C", "09:20:00");
            })
            .build();

        let request = request(&timetable, "20200101T080500", "20200101T091000");
        assert_eq!(request.stop_points.len(), 2);
        let departures = next_departures(&timetable, &request).unwrap();
        let times: Vec<_> = departures
            .iter()
            .map(|departure| departure.boarding_time)
            .collect();
        assert_eq!(
            times,
            vec![
                datetime("20200101T081000"),
                datetime("20200101T090000"),
            ]
        );
        let second = timetable.vehicle_journey_idx("second").unwrap();
        assert_eq!(departures[1].vehicle_journey, second);
        assert_eq!(departures[1].order, 0);

        let mut limited = request;
        limited.max_response = 1;
        assert_eq!(next_departures(&timetable, &limited).unwrap().len(), 1);
    }

    #[test]
    fn vehicle_journeys_leaving_at_the_same_time() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-02")
            .vj("first", |vj| {
                vj.st("A", "10:00:00").st("B", "10:10:00").st("C", "10:20:00");
            })
            .vj("second", |vj| {
                vj.st("A", "10:00:00").st("B", "10:15:00").st("C", "10:30:00");
            })
            .build();
        let mut request = request(&timetable, "20200101T090000", "20200101T120000");
        request.stop_points = stop_points_of_request(&timetable, &["A"]);
        let departures = next_departures(&timetable, &request).unwrap();
        assert_eq!(departures.len(), 2);
        for departure in &departures {
            assert_eq!(departure.boarding_time, datetime("20200101T100000"));
        }
        assert_ne!(departures[0].vehicle_journey, departures[1].vehicle_journey);
    }

    #[test]
    fn reversed_bounds() {
        let timetable = TimetableBuilder::new("2020-01-01", "2020-01-02")
            .vj("first", |vj| {
                vj.st("A", "08:00:00").st("B", "08:10:00");
            })
            .build();
        let request = request(&timetable, "20200101T090000", "20200101T080000");
        assert_eq!(
            next_departures(&timetable, &request),
            Err(BadRequest::ReversedBounds)
        );
        let request = request_out_of_calendar(&timetable);
        assert_eq!(
            next_departures(&timetable, &request),
            Err(BadRequest::DepartureDatetime)
        );
    }

    fn request_out_of_calendar(timetable: &Timetable) -> NextDeparturesRequest<'static> {
        request(timetable, "20190101T090000", "20200101T080000")
    }
}
