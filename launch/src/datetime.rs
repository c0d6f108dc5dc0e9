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

use raptor_journeys::NaiveDateTime;

pub const DATETIME_FORMAT: &str = "%Y%m%dT%H%M%S";

pub fn parse_datetime(string_datetime: &str) -> Result<NaiveDateTime, BadDateTime> {
    NaiveDateTime::parse_from_str(string_datetime, DATETIME_FORMAT).map_err(|_| BadDateTime {
        string_datetime: string_datetime.to_string(),
    })
}

#[derive(Debug)]
pub struct BadDateTime {
    string_datetime: String,
}

impl std::error::Error for BadDateTime {}

impl std::fmt::Display for BadDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            f,
            "Unable to parse {} as a datetime. Expected format is 20190628T163215",
            self.string_datetime
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse() {
        let datetime = parse_datetime("20200101T083000").unwrap();
        assert_eq!(datetime.to_string(), "2020-01-01 08:30:00");
        let err = parse_datetime("2020-01-01 08:30").unwrap_err();
        assert!(err.to_string().contains("2020-01-01 08:30"));
    }
}
