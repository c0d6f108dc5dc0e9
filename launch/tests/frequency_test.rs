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

mod utils;

use anyhow::Error;
use launch::raptor_journeys::{ItemType, TimetableBuilder, Timetable};
use utils::{datetime, item_types, solve, vehicle_journey_id, Config};

fn frequency_timetable() -> Timetable {
    TimetableBuilder::new("2020-01-01", "2020-01-02")
        .frequency_vj("freq", "08:00:00", "18:00:00", "00:10:00", |vj_builder| {
            vj_builder.st("A", "00:00:00").st("B", "00:10:00");
        })
        .build()
}

#[test]
fn board_on_a_headway() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = frequency_timetable();

    let config = Config::new("20200101T090000", "A", "B");
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 1);
    let path = &paths[0];
    assert_eq!(item_types(path), vec![ItemType::PublicTransport]);
    assert_eq!(path.departure(), Some(datetime(&timetable, "20200101T090000")?));
    assert_eq!(path.arrival(), Some(datetime(&timetable, "20200101T091000")?));

    Ok(())
}

#[test]
fn wait_for_the_next_headway() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = frequency_timetable();

    let config = Config::new("20200101T090100", "A", "B");
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 1);
    assert_eq!(
        paths[0].departure(),
        Some(datetime(&timetable, "20200101T091000")?)
    );
    assert_eq!(
        paths[0].arrival(),
        Some(datetime(&timetable, "20200101T092000")?)
    );

    Ok(())
}

#[test]
fn after_the_window_take_the_first_trip_of_the_next_day() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = frequency_timetable();

    let config = Config::new("20200101T180100", "A", "B");
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 1);
    assert_eq!(
        paths[0].departure(),
        Some(datetime(&timetable, "20200102T080000")?)
    );

    Ok(())
}

#[test]
fn arrive_before_on_a_headway() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = frequency_timetable();

    let mut config = Config::new("20200101T091500", "A", "B");
    config.clockwise = false;
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 1);
    assert_eq!(
        paths[0].departure(),
        Some(datetime(&timetable, "20200101T090000")?)
    );
    assert_eq!(
        paths[0].arrival(),
        Some(datetime(&timetable, "20200101T091000")?)
    );

    Ok(())
}

fn headways_and_a_scheduled_trip() -> Timetable {
    TimetableBuilder::new("2020-01-01", "2020-01-01")
        .frequency_vj("freq", "08:00:00", "10:00:00", "00:10:00", |vj_builder| {
            vj_builder.st("A", "00:00:00").st("B", "00:10:00");
        })
        .vj("scheduled", |vj_builder| {
            vj_builder.st("A", "09:05:00").st("B", "09:15:00");
        })
        .build()
}

#[test]
fn headways_before_a_scheduled_trip() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = headways_and_a_scheduled_trip();

    let config = Config::new("20200101T080500", "A", "B");
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 1);
    assert_eq!(vehicle_journey_id(&timetable, &paths[0].items[0]), Some("freq"));
    assert_eq!(
        paths[0].departure(),
        Some(datetime(&timetable, "20200101T081000")?)
    );
    assert_eq!(
        paths[0].arrival(),
        Some(datetime(&timetable, "20200101T082000")?)
    );

    Ok(())
}

#[test]
fn scheduled_trip_between_headways() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = headways_and_a_scheduled_trip();

    let config = Config::new("20200101T090100", "A", "B");
    let paths = solve(&timetable, &config)?;
    assert_eq!(paths.len(), 1);
    assert_eq!(
        vehicle_journey_id(&timetable, &paths[0].items[0]),
        Some("scheduled")
    );
    assert_eq!(
        paths[0].arrival(),
        Some(datetime(&timetable, "20200101T091500")?)
    );

    let mut config = Config::new("20200101T091700", "A", "B");
    config.clockwise = false;
    let paths = solve(&timetable, &config)?;
    assert_eq!(paths.len(), 1);
    assert_eq!(
        vehicle_journey_id(&timetable, &paths[0].items[0]),
        Some("scheduled")
    );
    assert_eq!(
        paths[0].departure(),
        Some(datetime(&timetable, "20200101T090500")?)
    );

    Ok(())
}
