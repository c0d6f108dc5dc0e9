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
use launch::config::LaunchParams;
use launch::raptor_journeys::{ItemType, PositiveDuration, Timetable, TimetableBuilder};
use utils::{datetime, solve, vehicle_journey_id, Config};

fn fast_with_change_or_slow_direct(builder: TimetableBuilder) -> Timetable {
    builder
        .vj("slow", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("D", "10:00:00");
        })
        .vj("fast1", |vj_builder| {
            vj_builder.st("A", "08:05:00").st("B", "08:20:00");
        })
        .vj("fast2", |vj_builder| {
            vj_builder.st("B", "08:20:00").st("D", "09:00:00");
        })
        .vj("fast2_later", |vj_builder| {
            vj_builder.st("B", "08:40:00").st("D", "09:20:00");
        })
        .build()
}

#[test]
fn more_vehicles_must_arrive_earlier() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable =
        fast_with_change_or_slow_direct(TimetableBuilder::new("2020-01-01", "2020-01-02"));

    let config = Config::new("20200101T075500", "A", "D");
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 2);
    let fast = &paths[0];
    let slow = &paths[1];
    assert_eq!(fast.arrival(), Some(datetime(&timetable, "20200101T090000")?));
    assert_eq!(fast.nb_of_items(ItemType::PublicTransport), 2);
    assert_eq!(fast.nb_changes, 1);
    assert_eq!(slow.arrival(), Some(datetime(&timetable, "20200101T100000")?));
    assert_eq!(slow.nb_of_items(ItemType::PublicTransport), 1);
    assert_eq!(slow.nb_changes, 0);

    Ok(())
}

#[test]
fn one_round_gives_the_direct_journey_only() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable =
        fast_with_change_or_slow_direct(TimetableBuilder::new("2020-01-01", "2020-01-02"));

    let mut config = Config::new("20200101T075500", "A", "D");
    config.request_params.max_nb_of_rounds = 1;
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 1);
    assert_eq!(vehicle_journey_id(&timetable, &paths[0].items[0]), Some("slow"));

    Ok(())
}

#[test]
fn change_takes_the_default_transfer_duration() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let launch_params = LaunchParams::default();
    let timetable = fast_with_change_or_slow_direct(
        launch_params.apply(TimetableBuilder::new("2020-01-01", "2020-01-02")),
    );
    let b = timetable.stop_point_idx("B").unwrap();
    assert_eq!(
        timetable.change_duration(b),
        PositiveDuration::from_hms(0, 1, 0)
    );

    let config = Config::new("20200101T075500", "A", "D");
    let paths = solve(&timetable, &config)?;

    assert_eq!(paths.len(), 2);
    let fast = &paths[0];
    assert_eq!(fast.arrival(), Some(datetime(&timetable, "20200101T092000")?));
    assert_eq!(
        vehicle_journey_id(&timetable, &fast.items[2]),
        Some("fast2_later")
    );
    assert_eq!(fast.nb_of_items(ItemType::Walking), 0);
    assert_eq!(fast.items[1].item_type, ItemType::Waiting);
    assert_eq!(fast.items[1].departure, datetime(&timetable, "20200101T082000")?);

    Ok(())
}

fn walking_timetable() -> Timetable {
    TimetableBuilder::new("2020-01-01", "2020-01-02")
        .vj("far", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("D1", "08:05:00");
        })
        .vj("near", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("D2", "08:17:00");
        })
        .vj("nearer", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("D3", "08:19:00");
        })
        .vj("at_door", |vj_builder| {
            vj_builder.st("A", "08:00:00").st("D4", "08:30:00");
        })
        .build()
}

fn walking_config() -> Config<'static> {
    let mut config = Config::new("20200101T075500", "A", "D1");
    config.destinations = vec![
        ("D1", PositiveDuration::from_hms(0, 10, 0)),
        ("D2", PositiveDuration::from_hms(0, 2, 0)),
        ("D3", PositiveDuration::from_hms(0, 1, 0)),
        ("D4", PositiveDuration::zero()),
    ];
    config
}

#[test]
fn walking_alternatives() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = walking_timetable();

    let paths = solve(&timetable, &walking_config())?;

    // the fastest journey and at most two alternatives walking less
    assert_eq!(paths.len(), 3);
    let ids: Vec<_> = paths
        .iter()
        .map(|path| vehicle_journey_id(&timetable, &path.items[0]))
        .collect();
    assert_eq!(ids, vec![Some("far"), Some("near"), Some("nearer")]);

    Ok(())
}

#[test]
fn walking_alternatives_are_bounded() -> Result<(), Error> {
    let _log_guard = launch::logger::init_test_logger();
    let timetable = walking_timetable();

    let mut config = walking_config();
    config.request_params.max_walking_alternatives = 1;
    let paths = solve(&timetable, &config)?;
    assert_eq!(paths.len(), 2);
    assert_eq!(vehicle_journey_id(&timetable, &paths[1].items[0]), Some("near"));

    let mut config = walking_config();
    config.request_params.max_walking_ratio = 0.1;
    let paths = solve(&timetable, &config)?;
    assert_eq!(paths.len(), 1);
    assert_eq!(vehicle_journey_id(&timetable, &paths[0].items[0]), Some("far"));

    Ok(())
}
