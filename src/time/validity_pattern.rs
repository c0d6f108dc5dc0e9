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

use super::Calendar;
use chrono::NaiveDate;

/// One bit per day of the calendar, telling whether a vehicle journey circulates that day.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidityPattern {
    bits: Vec<u64>,
    nb_of_days: u32,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ValidityPatternIdx {
    pub(crate) idx: usize,
}

impl ValidityPattern {
    pub fn new(nb_of_days: u32) -> Self {
        let nb_of_words = (nb_of_days as usize + 63) / 64;
        Self {
            bits: vec![0; nb_of_words],
            nb_of_days,
        }
    }

    pub fn add(&mut self, day: u32) {
        if day < self.nb_of_days {
            self.bits[(day / 64) as usize] |= 1u64 << (day % 64);
        }
    }

    /// Days outside of the calendar are never valid.
    pub fn check(&self, day: u32) -> bool {
        if day >= self.nb_of_days {
            return false;
        }
        self.bits[(day / 64) as usize] & (1u64 << (day % 64)) != 0
    }

    /// Valid on the day before, the day of, or the day after `day`.
    pub fn check2(&self, day: u32) -> bool {
        (day > 0 && self.check(day - 1)) || self.check(day) || self.check(day + 1)
    }

    pub fn days(&self) -> impl Iterator<Item = u32> + '_ {
        (0..self.nb_of_days).filter(move |day| self.check(*day))
    }

    pub fn is_empty(&self) -> bool {
        self.bits.iter().all(|word| *word == 0)
    }
}

/// Deduplicated storage of validity patterns.
#[derive(Debug, Clone)]
pub struct ValidityPatterns {
    patterns: Vec<ValidityPattern>,
    nb_of_days: u32,
}

impl ValidityPatterns {
    pub fn new(nb_of_days: u32) -> Self {
        Self {
            patterns: Vec::new(),
            nb_of_days,
        }
    }

    pub fn get(&self, idx: ValidityPatternIdx) -> &ValidityPattern {
        &self.patterns[idx.idx]
    }

    pub fn is_valid(&self, idx: ValidityPatternIdx, day: u32) -> bool {
        self.patterns[idx.idx].check(day)
    }

    pub fn get_or_insert<'a, Dates>(&mut self, dates: Dates, calendar: &Calendar) -> ValidityPatternIdx
    where
        Dates: Iterator<Item = &'a NaiveDate>,
    {
        let mut pattern = ValidityPattern::new(self.nb_of_days);
        for date in dates {
            if let Some(day) = calendar.date_to_days_since_start(date) {
                pattern.add(day);
            }
        }
        self.get_or_insert_pattern(pattern)
    }

    pub fn get_or_insert_pattern(&mut self, pattern: ValidityPattern) -> ValidityPatternIdx {
        let existing = self
            .patterns
            .iter()
            .position(|candidate| *candidate == pattern);
        let idx = match existing {
            Some(idx) => idx,
            None => {
                self.patterns.push(pattern);
                self.patterns.len() - 1
            }
        };
        ValidityPatternIdx { idx }
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_and_check2() {
        let mut pattern = ValidityPattern::new(100);
        pattern.add(3);
        pattern.add(70);
        assert!(pattern.check(3));
        assert!(pattern.check(70));
        assert!(!pattern.check(4));
        assert!(!pattern.check(250));
        assert!(pattern.check2(4));
        assert!(pattern.check2(2));
        assert!(!pattern.check2(5));
        assert_eq!(pattern.days().collect::<Vec<_>>(), vec![3, 70]);
    }

    #[test]
    fn patterns_are_deduplicated() {
        let first = NaiveDate::from_ymd(2020, 1, 1);
        let calendar = Calendar::new(first, NaiveDate::from_ymd(2020, 1, 31));
        let mut patterns = ValidityPatterns::new(u32::from(calendar.nb_of_days()));
        let dates = [NaiveDate::from_ymd(2020, 1, 2), NaiveDate::from_ymd(2020, 1, 5)];
        let a = patterns.get_or_insert(dates.iter(), &calendar);
        let b = patterns.get_or_insert(dates.iter().rev(), &calendar);
        let c = patterns.get_or_insert(dates[..1].iter(), &calendar);
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(patterns.len(), 2);
        assert!(patterns.is_valid(a, 4));
    }
}
