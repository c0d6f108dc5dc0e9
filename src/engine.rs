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

pub mod best_stop_time;
pub mod labels;
pub mod path_reader;
pub mod raptor;
pub mod solutions;

use crate::timetable::{StopPointIdx, VehicleJourneyIdx};
use std::fmt;

/// Broken label bookkeeping found while reading the result of a search.
///
/// These never come from the data or the request: the query is aborted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RaptorError {
    UninitializedLabel {
        round: usize,
        stop_point: StopPointIdx,
    },
    UnresolvedBoarding {
        round: usize,
        stop_point: StopPointIdx,
        vehicle_journey: VehicleJourneyIdx,
    },
    MissingStopTime {
        round: usize,
        stop_point: StopPointIdx,
    },
}

impl fmt::Display for RaptorError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RaptorError::UninitializedLabel { round, stop_point } => write!(
                f,
                "The label of stop point {:?} at round {} is read before being set.",
                stop_point, round
            ),
            RaptorError::UnresolvedBoarding {
                round,
                stop_point,
                vehicle_journey,
            } => write!(
                f,
                "Cannot reach the boarding point of the label of stop point {:?} at round {} \
                 along vehicle journey {:?} and its chained vehicle journeys.",
                stop_point, round, vehicle_journey
            ),
            RaptorError::MissingStopTime { round, stop_point } => write!(
                f,
                "No stop time matches the label of stop point {:?} at round {}.",
                stop_point, round
            ),
        }
    }
}

impl std::error::Error for RaptorError {}
