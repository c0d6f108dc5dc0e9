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

use super::RaptorError;
use crate::time::DateTime;
use crate::timetable::{JourneyPatternPointIdx, StopPointIdx};

/// How a label was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boarding {
    /// seeded from an origin
    Departure,
    /// riding a vehicle journey from `boarding` to `alighting`
    VehicleJourney {
        boarding: JourneyPatternPointIdx,
        alighting: JourneyPatternPointIdx,
    },
    /// riding a vehicle journey chained to the one boarded at `boarding`
    StayIn {
        boarding: JourneyPatternPointIdx,
        alighting: JourneyPatternPointIdx,
    },
    /// walking a connection whose other end is `from`
    Transfer { from: StopPointIdx },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardingKind {
    Departure,
    VehicleJourney,
    Transfer,
    StayIn,
}

impl Boarding {
    pub fn kind(&self) -> BoardingKind {
        match self {
            Boarding::Departure => BoardingKind::Departure,
            Boarding::VehicleJourney { .. } => BoardingKind::VehicleJourney,
            Boarding::StayIn { .. } => BoardingKind::StayIn,
            Boarding::Transfer { .. } => BoardingKind::Transfer,
        }
    }

    /// `true` when the label was reached on board a vehicle.
    pub fn is_ride(&self) -> bool {
        matches!(
            self,
            Boarding::VehicleJourney { .. } | Boarding::StayIn { .. }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Label {
    pub datetime: DateTime,
    pub boarding: Boarding,
}

/// Labels of every stop point for every round.
///
/// Round `r` holds the best datetimes reachable with at most `r` vehicle boardings.
/// Beside the best label of each stop point, a round keeps the best label
/// reached without walking (a ride, or the seed of round 0), where walks start from.
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    nb_of_stop_points: usize,
    labels: Vec<Option<Label>>,
    rides: Vec<Option<Label>>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops every round and sizes the table for `nb_of_stop_points`, keeping
    /// the allocation around.
    pub fn clear(&mut self, nb_of_stop_points: usize) {
        self.labels.clear();
        self.rides.clear();
        self.nb_of_stop_points = nb_of_stop_points;
    }

    pub fn nb_of_rounds(&self) -> usize {
        if self.nb_of_stop_points == 0 {
            0
        } else {
            self.labels.len() / self.nb_of_stop_points
        }
    }

    /// Appends a round with every label uninitialized.
    pub fn push_round(&mut self) {
        let new_len = self.labels.len() + self.nb_of_stop_points;
        self.labels.resize(new_len, None);
        self.rides.resize(new_len, None);
    }

    pub fn get(&self, round: usize, stop_point: StopPointIdx) -> Result<&Label, RaptorError> {
        self.try_get(round, stop_point)
            .ok_or(RaptorError::UninitializedLabel { round, stop_point })
    }

    pub fn try_get(&self, round: usize, stop_point: StopPointIdx) -> Option<&Label> {
        if round >= self.nb_of_rounds() {
            return None;
        }
        self.labels[self.position(round, stop_point)].as_ref()
    }

    pub fn is_initialized(&self, round: usize, stop_point: StopPointIdx) -> bool {
        self.try_get(round, stop_point).is_some()
    }

    pub(crate) fn set(&mut self, round: usize, stop_point: StopPointIdx, label: Label) {
        debug_assert!(round < self.nb_of_rounds());
        let position = self.position(round, stop_point);
        self.labels[position] = Some(label);
        if label.boarding.kind() != BoardingKind::Transfer {
            self.rides[position] = Some(label);
        }
    }

    /// The label `stop_point` was reached with at `round` before any walk.
    pub fn get_ride(&self, round: usize, stop_point: StopPointIdx) -> Result<&Label, RaptorError> {
        self.try_get_ride(round, stop_point)
            .ok_or(RaptorError::UninitializedLabel { round, stop_point })
    }

    pub fn try_get_ride(&self, round: usize, stop_point: StopPointIdx) -> Option<&Label> {
        if round >= self.nb_of_rounds() {
            return None;
        }
        self.rides[self.position(round, stop_point)].as_ref()
    }

    /// The round's labels, indexed by stop point.
    pub fn round(&self, round: usize) -> &[Option<Label>] {
        let start = round * self.nb_of_stop_points;
        &self.labels[start..start + self.nb_of_stop_points]
    }

    fn position(&self, round: usize, stop_point: StopPointIdx) -> usize {
        round * self.nb_of_stop_points + stop_point.idx
    }
}
