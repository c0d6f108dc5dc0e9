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

use crate::engine::path_reader::{read_path, PathVisitor};
use crate::engine::raptor::Raptor;
use crate::engine::RaptorError;
use crate::time::{DateTime, PositiveDuration};
use crate::timetable::{Connection, StopPointIdx, Timetable, VehicleJourneyIdx};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemType {
    PublicTransport,
    Walking,
    StayIn,
    Waiting,
    Boarding,
    Alighting,
}

/// A section of an itinerary.
///
/// `stop_points`, `arrivals`, `departures` and `stop_times` are in travel order.
/// Only public transport items have `arrivals`, `departures` and `stop_times`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathItem {
    pub item_type: ItemType,
    pub stop_points: Vec<StopPointIdx>,
    pub arrivals: Vec<DateTime>,
    pub departures: Vec<DateTime>,
    /// vehicle journey and position of each stop time
    pub stop_times: Vec<(VehicleJourneyIdx, usize)>,
    pub vehicle_journey: Option<VehicleJourneyIdx>,
    pub connection: Option<Connection>,
    pub departure: DateTime,
    pub arrival: DateTime,
}

impl PathItem {
    pub fn new(item_type: ItemType, departure: DateTime, arrival: DateTime) -> Self {
        Self {
            item_type,
            stop_points: Vec::new(),
            arrivals: Vec::new(),
            departures: Vec::new(),
            stop_times: Vec::new(),
            vehicle_journey: None,
            connection: None,
            departure,
            arrival,
        }
    }

    pub fn duration(&self) -> PositiveDuration {
        self.arrival
            .duration_since(&self.departure)
            .unwrap_or_else(PositiveDuration::zero)
    }

    pub fn first_stop_point(&self) -> Option<StopPointIdx> {
        self.stop_points.first().copied()
    }

    pub fn last_stop_point(&self) -> Option<StopPointIdx> {
        self.stop_points.last().copied()
    }

    /// A walk from a stop point to itself, used to change vehicle there.
    pub fn is_degenerate_walk(&self) -> bool {
        self.item_type == ItemType::Walking && self.first_stop_point() == self.last_stop_point()
    }

    fn reverse(&mut self) {
        self.stop_points.reverse();
        self.arrivals.reverse();
        self.departures.reverse();
        self.stop_times.reverse();
    }
}

/// An itinerary, from the origin to the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    pub items: Vec<PathItem>,
    pub duration: PositiveDuration,
    pub nb_changes: usize,
    pub request_datetime: DateTime,
}

impl Path {
    /// Replays the labels of `stop_point` at `round` into an itinerary.
    pub fn from_labels(
        timetable: &Timetable,
        raptor: &Raptor,
        stop_point: StopPointIdx,
        round: usize,
    ) -> Result<Path, RaptorError> {
        let mut builder = PathBuilder::default();
        read_path(timetable, raptor, stop_point, round, &mut builder)?;
        let mut path = builder.into_path(raptor.clockwise(), raptor.params().datetime);
        path.patch_datetimes(timetable);
        Ok(path)
    }

    pub fn departure(&self) -> Option<DateTime> {
        self.items.first().map(|item| item.departure)
    }

    pub fn arrival(&self) -> Option<DateTime> {
        self.items.last().map(|item| item.arrival)
    }

    pub fn nb_of_items(&self, item_type: ItemType) -> usize {
        self.items
            .iter()
            .filter(|item| item.item_type == item_type)
            .count()
    }

    /// Makes the items follow each other in time.
    ///
    /// Walks and stay ins start when the previous item ends. A waiting item is
    /// inserted before each ride, unless the ride goes on with the vehicle of
    /// the previous one, in which case a stay in replaces the change.
    /// Walks from a stop point to itself are then removed.
    pub fn patch_datetimes(&mut self, timetable: &Timetable) {
        let nb_of_items = self.items.len();
        self.nb_changes = if nb_of_items > 2 {
            self.items[1..nb_of_items - 1]
                .iter()
                .filter(|item| item.item_type == ItemType::Walking)
                .count()
        } else {
            0
        };

        let items = std::mem::take(&mut self.items);
        let mut patched: Vec<PathItem> = Vec::with_capacity(items.len() * 2);
        for mut item in items {
            let previous = match patched.last() {
                Some(previous) => previous,
                None => {
                    patched.push(item);
                    continue;
                }
            };
            match item.item_type {
                ItemType::Walking | ItemType::StayIn => {
                    let duration = item.duration();
                    item.departure = previous.arrival;
                    item.arrival = item.departure + duration;
                }
                ItemType::PublicTransport if previous.item_type != ItemType::StayIn => {
                    if let Some(stay_in) = Self::stay_in_before(timetable, &mut patched, &item) {
                        patched.push(stay_in);
                        self.nb_changes = self.nb_changes.saturating_sub(1);
                    } else if let Some(previous) = patched.last() {
                        let mut waiting =
                            PathItem::new(ItemType::Waiting, previous.arrival, item.departure);
                        waiting.stop_points.extend(previous.last_stop_point());
                        patched.push(waiting);
                    }
                }
                _ => (),
            }
            patched.push(item);
        }

        let nb_of_items = patched.len();
        let mut pulled_departure = None;
        for (position, mut item) in patched.into_iter().enumerate() {
            if let Some(departure) = pulled_departure.take() {
                item.departure = departure;
            }
            if item.is_degenerate_walk() && position + 1 < nb_of_items {
                pulled_departure = Some(item.departure);
                continue;
            }
            self.items.push(item);
        }

        self.duration = match (self.departure(), self.arrival()) {
            (Some(departure), Some(arrival)) => arrival
                .duration_since(&departure)
                .unwrap_or_else(PositiveDuration::zero),
            _ => PositiveDuration::zero(),
        };
    }

    // When `ride` goes on with the vehicle of the last ride of `patched`,
    // possibly after a walk to the same stop point, removes that walk and
    // returns the stay in joining the two rides.
    fn stay_in_before(
        timetable: &Timetable,
        patched: &mut Vec<PathItem>,
        ride: &PathItem,
    ) -> Option<PathItem> {
        let walk_between = patched.last()?.is_degenerate_walk();
        let previous_ride = if walk_between {
            patched.len().checked_sub(2).map(|position| &patched[position])?
        } else {
            patched.last()?
        };
        if previous_ride.item_type != ItemType::PublicTransport {
            return None;
        }
        let previous_vj = timetable.vehicle_journey(previous_ride.vehicle_journey?);
        if previous_vj.next_vj != ride.vehicle_journey
            || previous_ride.last_stop_point() != ride.first_stop_point()
        {
            return None;
        }
        let mut stay_in = PathItem::new(ItemType::StayIn, previous_ride.arrival, ride.departure);
        stay_in.stop_points.extend(previous_ride.last_stop_point());
        stay_in.stop_points.extend(ride.first_stop_point());
        if walk_between {
            patched.pop();
        }
        Some(stay_in)
    }

    pub fn print(&self, timetable: &Timetable) -> Result<String, std::fmt::Error> {
        let mut result = String::new();
        self.write(timetable, &mut result)?;
        Ok(result)
    }

    pub fn write<Writer: std::fmt::Write>(
        &self,
        timetable: &Timetable,
        writer: &mut Writer,
    ) -> Result<(), std::fmt::Error> {
        let calendar = timetable.calendar();
        let write_date = |datetime: Option<DateTime>| {
            datetime
                .map(|datetime| calendar.to_pretty_string(&datetime))
                .unwrap_or_default()
        };
        writeln!(writer, "*** New journey ***")?;
        writeln!(writer, "Departure : {}", write_date(self.departure()))?;
        writeln!(writer, "Arrival : {}", write_date(self.arrival()))?;
        writeln!(writer, "Duration : {}", self.duration)?;
        writeln!(writer, "Nb of changes : {}", self.nb_changes)?;

        for item in &self.items {
            let stop_name = |stop_point: Option<StopPointIdx>| {
                stop_point
                    .map(|idx| timetable.stop_point(idx).name.as_str())
                    .unwrap_or("?")
            };
            let from = stop_name(item.first_stop_point());
            let to = stop_name(item.last_stop_point());
            let departure = calendar.to_pretty_string(&item.departure);
            let arrival = calendar.to_pretty_string(&item.arrival);
            match item.item_type {
                ItemType::PublicTransport => {
                    let vj = item
                        .vehicle_journey
                        .map(|idx| timetable.vehicle_journey(idx).id.as_str())
                        .unwrap_or("?");
                    writeln!(
                        writer,
                        "Vehicle journey {} from {} at {} to {} at {}",
                        vj, from, departure, to, arrival
                    )?;
                }
                ItemType::Waiting => {
                    writeln!(writer, "Waiting at {} during {}", from, item.duration())?
                }
                ItemType::StayIn => writeln!(writer, "Stay in at {} until {}", to, arrival)?,
                other => writeln!(
                    writer,
                    "{:?} from {} at {} to {} at {}",
                    other, from, departure, to, arrival
                )?,
            }
        }
        Ok(())
    }
}

/// Builds the items of a [`Path`] from a label replay.
#[derive(Debug, Default)]
pub struct PathBuilder {
    items: Vec<PathItem>,
    current_ride: Option<PathItem>,
}

impl PathBuilder {
    /// The replayed items in travel order, datetimes not patched yet.
    pub fn into_path(mut self, clockwise: bool, request_datetime: DateTime) -> Path {
        if let Some(ride) = self.current_ride.take() {
            self.items.push(ride);
        }
        if clockwise {
            self.items.reverse();
            for item in self.items.iter_mut() {
                item.reverse();
            }
        }
        for item in self.items.iter_mut() {
            if item.item_type == ItemType::PublicTransport {
                if let Some(departure) = item.departures.first() {
                    item.departure = *departure;
                }
                if let Some(arrival) = item.arrivals.last() {
                    item.arrival = *arrival;
                }
            }
        }
        Path {
            items: self.items,
            duration: PositiveDuration::zero(),
            nb_changes: 0,
            request_datetime,
        }
    }
}

impl PathVisitor for PathBuilder {
    fn init_ride(&mut self, vehicle_journey: VehicleJourneyIdx) {
        let mut ride = PathItem::new(ItemType::PublicTransport, DateTime::INF, DateTime::MIN);
        ride.vehicle_journey = Some(vehicle_journey);
        self.current_ride = Some(ride);
    }

    fn extend_ride(
        &mut self,
        vehicle_journey: VehicleJourneyIdx,
        order: usize,
        stop_point: StopPointIdx,
        arrival: DateTime,
        departure: DateTime,
    ) {
        if let Some(ride) = self.current_ride.as_mut() {
            ride.stop_points.push(stop_point);
            ride.arrivals.push(arrival);
            ride.departures.push(departure);
            ride.stop_times.push((vehicle_journey, order));
        }
    }

    fn finish_ride(&mut self) {
        if let Some(ride) = self.current_ride.take() {
            self.items.push(ride);
        }
    }

    fn stay_in(
        &mut self,
        first: StopPointIdx,
        second: StopPointIdx,
        departure: DateTime,
        arrival: DateTime,
    ) {
        let mut item = PathItem::new(ItemType::StayIn, departure, arrival);
        item.stop_points.push(first);
        item.stop_points.push(second);
        self.items.push(item);
    }

    fn walk(
        &mut self,
        first: StopPointIdx,
        second: StopPointIdx,
        departure: DateTime,
        arrival: DateTime,
        connection: Option<&Connection>,
    ) {
        let mut item = PathItem::new(ItemType::Walking, departure, arrival);
        item.stop_points.push(first);
        item.stop_points.push(second);
        item.connection = connection.cloned();
        self.items.push(item);
    }
}
