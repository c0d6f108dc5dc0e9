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

use std::time::SystemTime;

use raptor_journeys::schedule::{self, NextDeparture, NextDeparturesRequest};
use raptor_journeys::tracing::{debug, info, trace};
use raptor_journeys::{
    filters::Filters, Accessibility, IsochroneInput, IsochroneStop, Path, PositiveDuration, Raptor,
    RequestError, RequestInput, Timetable,
};

use crate::config::RequestParams;
use crate::datetime::parse_datetime;

/// Answers journey requests, reusing the memory of the search from one
/// request to the next.
///
/// A `Solver` is meant to live in a single thread, while the `Timetable` is
/// shared between solvers.
#[derive(Debug, Default)]
pub struct Solver {
    engine: Raptor,
}

impl Solver {
    pub fn new() -> Self {
        Self {
            engine: Raptor::new(),
        }
    }

    pub fn solve_request(
        &mut self,
        timetable: &Timetable,
        request_input: &RequestInput,
    ) -> Result<Vec<Path>, RequestError> {
        debug!("Start computing journeys");
        let request_timer = SystemTime::now();
        let paths = self.engine.make_journeys(timetable, request_input)?;
        info!(
            "Journeys computed in {} ms with {} rounds",
            request_timer
                .elapsed()
                .map(|elapsed| elapsed.as_millis())
                .unwrap_or_default(),
            self.engine.nb_of_rounds()
        );
        info!("Nb of journeys found : {}", paths.len());
        for path in &paths {
            if let Ok(text) = path.print(timetable) {
                trace!("{}", text);
            }
        }
        Ok(paths)
    }

    /// Journeys between stop point ids reached without walking, with datetimes
    /// formatted as `20190628T163215`.
    pub fn solve(
        &mut self,
        timetable: &Timetable,
        origins: &[&str],
        destinations: &[&str],
        datetime: &str,
        clockwise: bool,
        params: &RequestParams,
    ) -> Result<Vec<Path>, anyhow::Error> {
        let datetime = parse_datetime(datetime)?;
        let request = RequestInput {
            origins: with_zero(origins),
            destinations: with_zero(destinations),
            datetimes: vec![datetime],
            clockwise,
            bound: None,
            accessibility: Accessibility::default(),
            forbidden_ids: Vec::new(),
            allowed_ids: Vec::new(),
            params: params.into(),
        };
        Ok(self.solve_request(timetable, &request)?)
    }

    /// Stop points reached from the stop point ids `origins` within
    /// `max_duration`, formatted as `01:30:00`.
    pub fn isochrone(
        &mut self,
        timetable: &Timetable,
        origins: &[&str],
        datetime: &str,
        max_duration: &str,
        clockwise: bool,
        params: &RequestParams,
    ) -> Result<Vec<IsochroneStop>, anyhow::Error> {
        let request = IsochroneInput {
            origins: with_zero(origins),
            datetime: parse_datetime(datetime)?,
            max_duration: max_duration.parse()?,
            clockwise,
            accessibility: Accessibility::default(),
            forbidden_ids: Vec::new(),
            allowed_ids: Vec::new(),
            max_nb_of_rounds: params.max_nb_of_rounds,
        };
        let request_timer = SystemTime::now();
        let stops = self.engine.isochrone(timetable, &request)?;
        info!(
            "Isochrone computed in {} ms with {} stop points reached",
            request_timer
                .elapsed()
                .map(|elapsed| elapsed.as_millis())
                .unwrap_or_default(),
            stops.len()
        );
        Ok(stops)
    }
}

fn with_zero(ids: &[&str]) -> Vec<(String, PositiveDuration)> {
    ids.iter()
        .map(|id| (id.to_string(), PositiveDuration::zero()))
        .collect()
}

/// Departure board at `stop_point_ids` between `from` and `until`, both
/// formatted as `20190628T163215`.
pub fn next_departures<T>(
    timetable: &Timetable,
    stop_point_ids: &[T],
    from: &str,
    until: &str,
    max_response: usize,
    forbidden_ids: &[T],
) -> Result<Vec<NextDeparture>, anyhow::Error>
where
    T: AsRef<str>,
{
    let no_allowed_ids: [T; 0] = [];
    let request = NextDeparturesRequest {
        stop_points: schedule::stop_points_of_request(timetable, stop_point_ids),
        filters: Filters::new(timetable, forbidden_ids, &no_allowed_ids),
        from_datetime: parse_datetime(from)?,
        until_datetime: parse_datetime(until)?,
        max_response,
        accessibility: Accessibility::default(),
    };
    Ok(schedule::next_departures(timetable, &request)?)
}
