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

pub mod launch_params;
pub mod request_params;

use std::fmt::{Debug, Display};

pub use launch_params::LaunchParams;
use raptor_journeys::tracing::warn;
pub use request_params::RequestParams;

pub const ENV_MAX_NB_OF_ROUNDS: &str = "RAPTOR_MAX_NB_OF_ROUNDS";
pub const ENV_MAX_WALKING_RATIO: &str = "RAPTOR_MAX_WALKING_RATIO";

// - var not set -> use default value
// - var set but non-unicode -> warn and use default value
// - var set but not parsable -> warn and use default value
pub fn parse_env_var<T, Parser, ParseErr>(var_name: &str, default_value: T, parser: Parser) -> T
where
    Parser: Fn(&str) -> Result<T, ParseErr>,
    ParseErr: Display,
    T: Debug,
{
    match std::env::var(var_name) {
        Ok(s) => match parser(&s) {
            Ok(val) => val,
            Err(err) => {
                warn!(
                    "Could not parse env var {} : {}. I'll use the default value '{:?}' instead",
                    var_name, err, default_value
                );
                default_value
            }
        },
        Err(std::env::VarError::NotPresent) => default_value,
        Err(std::env::VarError::NotUnicode(err)) => {
            warn!(
                "Badly formed env var {} : {:?}. I'll use the default value {:?} instead",
                var_name, err, default_value
            );
            default_value
        }
    }
}

// for infaillible parser
pub fn read_env_var<T, Parser>(var_name: &str, default_value: T, parser: Parser) -> T
where
    Parser: Fn(&str) -> T,
    T: Debug,
{
    parse_env_var(var_name, default_value, |s| -> Result<T, &'static str> {
        Ok(parser(s))
    })
}

impl RequestParams {
    /// `self`, with the fields set in the environment overridden.
    pub fn with_env_overrides(self) -> Self {
        let max_nb_of_rounds =
            parse_env_var(ENV_MAX_NB_OF_ROUNDS, self.max_nb_of_rounds, |s| {
                s.parse::<usize>()
            });
        let max_walking_ratio =
            parse_env_var(ENV_MAX_WALKING_RATIO, self.max_walking_ratio, |s| {
                s.parse::<f32>()
            });
        Self {
            max_nb_of_rounds,
            max_walking_ratio,
            ..self
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // a single test touches the environment, tests run in parallel
    #[test]
    fn env_overrides() {
        std::env::set_var(ENV_MAX_NB_OF_ROUNDS, "4");
        std::env::set_var(ENV_MAX_WALKING_RATIO, "not a number");
        let params = RequestParams::default().with_env_overrides();
        std::env::remove_var(ENV_MAX_NB_OF_ROUNDS);
        std::env::remove_var(ENV_MAX_WALKING_RATIO);

        assert_eq!(params.max_nb_of_rounds, 4);
        assert_eq!(params.max_walking_ratio, 2.0);

        let name = read_env_var("RAPTOR_UNSET_TEST_VARIABLE", "default".to_string(), |s| {
            s.to_string()
        });
        assert_eq!(name, "default");
    }
}
