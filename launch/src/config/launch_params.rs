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

use super::RequestParams;
use anyhow::Context;
use raptor_journeys::{PositiveDuration, TimetableBuilder};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LaunchParams {
    /// the transfer duration between a stop point and itself
    #[serde(default = "default_transfer_duration")]
    pub default_transfer_duration: PositiveDuration,

    #[serde(default)]
    pub request_params: RequestParams,
}

pub const DEFAULT_TRANSFER_DURATION: &str = "00:01:00";

pub fn default_transfer_duration() -> PositiveDuration {
    use std::str::FromStr;
    PositiveDuration::from_str(DEFAULT_TRANSFER_DURATION).unwrap()
}

impl Default for LaunchParams {
    fn default() -> Self {
        Self {
            default_transfer_duration: default_transfer_duration(),
            request_params: RequestParams::default(),
        }
    }
}

impl LaunchParams {
    pub fn from_json(json: &str) -> Result<Self, anyhow::Error> {
        serde_json::from_str(json).context("Could not parse launch parameters")
    }

    /// Gives every stop point of the timetable a self connection lasting
    /// `default_transfer_duration`, unless it already has one.
    pub fn apply(&self, builder: TimetableBuilder) -> TimetableBuilder {
        builder.default_transfer_duration(self.default_transfer_duration)
    }
}
