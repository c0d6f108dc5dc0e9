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

#![allow(dead_code)]

use anyhow::Error;
use launch::config::RequestParams;
use launch::datetime::parse_datetime;
use launch::raptor_journeys::{
    Accessibility, DateTime, ItemType, Path, PathItem, PositiveDuration, RequestInput, Timetable,
};
use launch::solver::Solver;

pub struct Config<'a> {
    pub datetime: &'a str,
    pub origins: Vec<(&'a str, PositiveDuration)>,
    pub destinations: Vec<(&'a str, PositiveDuration)>,
    pub clockwise: bool,
    pub bound: Option<&'a str>,
    pub accessibility: Accessibility,
    pub forbidden_ids: Vec<&'a str>,
    pub allowed_ids: Vec<&'a str>,
    pub request_params: RequestParams,
}

impl<'a> Config<'a> {
    pub fn new(datetime: &'a str, origin: &'a str, destination: &'a str) -> Self {
        Self {
            datetime,
            origins: vec![(origin, PositiveDuration::zero())],
            destinations: vec![(destination, PositiveDuration::zero())],
            clockwise: true,
            bound: None,
            accessibility: Accessibility::default(),
            forbidden_ids: Vec::new(),
            allowed_ids: Vec::new(),
            request_params: RequestParams::default(),
        }
    }

    pub fn request_input(&self) -> Result<RequestInput, Error> {
        let to_owned = |stops: &[(&str, PositiveDuration)]| {
            stops
                .iter()
                .map(|(id, duration)| (id.to_string(), *duration))
                .collect()
        };
        Ok(RequestInput {
            origins: to_owned(&self.origins),
            destinations: to_owned(&self.destinations),
            datetimes: vec![parse_datetime(self.datetime)?],
            clockwise: self.clockwise,
            bound: self.bound.map(parse_datetime).transpose()?,
            accessibility: self.accessibility,
            forbidden_ids: self.forbidden_ids.iter().map(|id| id.to_string()).collect(),
            allowed_ids: self.allowed_ids.iter().map(|id| id.to_string()).collect(),
            params: (&self.request_params).into(),
        })
    }
}

pub fn solve(timetable: &Timetable, config: &Config) -> Result<Vec<Path>, Error> {
    let mut solver = Solver::new();
    let paths = solver.solve_request(timetable, &config.request_input()?)?;
    Ok(paths)
}

pub fn datetime(timetable: &Timetable, string_datetime: &str) -> Result<DateTime, Error> {
    let naive = parse_datetime(string_datetime)?;
    timetable
        .calendar()
        .from_naive_datetime(&naive)
        .ok_or_else(|| anyhow::anyhow!("{} is out of the calendar", string_datetime))
}

pub fn stop_names<'a>(timetable: &'a Timetable, item: &PathItem) -> Vec<&'a str> {
    item.stop_points
        .iter()
        .map(|idx| timetable.stop_point(*idx).id.as_str())
        .collect()
}

pub fn vehicle_journey_id<'a>(timetable: &'a Timetable, item: &PathItem) -> Option<&'a str> {
    item.vehicle_journey
        .map(|idx| timetable.vehicle_journey(idx).id.as_str())
}

pub fn item_types(path: &Path) -> Vec<ItemType> {
    path.items.iter().map(|item| item.item_type).collect()
}
