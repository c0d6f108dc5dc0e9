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

use raptor_journeys::JourneyParams;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RequestParams {
    /// maximum number of vehicles boarded in a journey
    #[serde(default = "default_max_nb_of_rounds")]
    pub max_nb_of_rounds: usize,

    /// a journey walking less than the fastest one is kept when the time it
    /// loses is at most max_walking_ratio times the walking time it saves
    #[serde(default = "default_max_walking_ratio")]
    pub max_walking_ratio: f32,

    /// maximum number of such journeys
    #[serde(default = "default_max_walking_alternatives")]
    pub max_walking_alternatives: usize,
}

pub const DEFAULT_MAX_NB_OF_ROUNDS: &str = "10";
pub const DEFAULT_MAX_WALKING_RATIO: &str = "2.0";
pub const DEFAULT_MAX_WALKING_ALTERNATIVES: &str = "2";

pub fn default_max_nb_of_rounds() -> usize {
    usize::from_str(DEFAULT_MAX_NB_OF_ROUNDS).unwrap()
}

pub fn default_max_walking_ratio() -> f32 {
    f32::from_str(DEFAULT_MAX_WALKING_RATIO).unwrap()
}

pub fn default_max_walking_alternatives() -> usize {
    usize::from_str(DEFAULT_MAX_WALKING_ALTERNATIVES).unwrap()
}

impl Default for RequestParams {
    fn default() -> Self {
        Self {
            max_nb_of_rounds: default_max_nb_of_rounds(),
            max_walking_ratio: default_max_walking_ratio(),
            max_walking_alternatives: default_max_walking_alternatives(),
        }
    }
}

impl std::fmt::Display for RequestParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "--max_nb_of_rounds {} --max_walking_ratio {} --max_walking_alternatives {}",
            self.max_nb_of_rounds, self.max_walking_ratio, self.max_walking_alternatives
        )
    }
}

impl From<&RequestParams> for JourneyParams {
    fn from(params: &RequestParams) -> Self {
        JourneyParams {
            max_nb_of_rounds: params.max_nb_of_rounds,
            max_walking_ratio: params.max_walking_ratio,
            max_walking_alternatives: params.max_walking_alternatives,
        }
    }
}
