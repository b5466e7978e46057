mod handlers;

use actix_web::{web, Scope};
use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use pocket_repo::analytics_repo::Window;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use thiserror::Error;

pub fn analytics_service() -> Scope {
    web::scope("/analytics").service(handlers::get_analytics)
}

#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    #[default]
    Month,
    Year,
}

#[derive(Error, Debug, PartialEq)]
#[error("Invalid period: {0}")]
pub struct ParsePeriodError(pub String);

impl FromStr for Period {
    type Err = ParsePeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Period::Day),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            _ => Err(ParsePeriodError(s.to_owned())),
        }
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        })
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

/// First day of the month following `date`'s month
fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = match date.month() {
        12 => (date.year() + 1, 1),
        m => (date.year(), m + 1),
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(NaiveDate::MAX)
}

impl Period {
    /// Half-open window covering the period that contains `now`. `Week` is the trailing seven
    /// days rather than a calendar week.
    pub fn window(&self, now: NaiveDateTime) -> Window {
        let today = now.date();
        match self {
            Period::Day => Window::new(
                midnight(today),
                midnight(today.succ_opt().unwrap_or(NaiveDate::MAX)),
            ),
            Period::Week => Window::new(now - Duration::days(7), now),
            Period::Month => {
                let first = today.with_day(1).unwrap_or(today);
                Window::new(midnight(first), midnight(next_month(first)))
            }
            Period::Year => {
                let first = NaiveDate::from_ymd_opt(today.year(), 1, 1).unwrap_or(today);
                let next = NaiveDate::from_ymd_opt(today.year() + 1, 1, 1).unwrap_or(NaiveDate::MAX);
                Window::new(midnight(first), midnight(next))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Period;
    use chrono::{NaiveDate, NaiveDateTime};
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[rstest]
    #[case(Period::Day, at(2024, 2, 29, 0), at(2024, 3, 1, 0))]
    #[case(Period::Week, at(2024, 2, 22, 15), at(2024, 2, 29, 15))]
    #[case(Period::Month, at(2024, 2, 1, 0), at(2024, 3, 1, 0))]
    #[case(Period::Year, at(2024, 1, 1, 0), at(2025, 1, 1, 0))]
    fn windows(
        #[case] period: Period,
        #[case] from: NaiveDateTime,
        #[case] until: NaiveDateTime,
    ) {
        let window = period.window(at(2024, 2, 29, 15));
        assert_eq!(window.from, from);
        assert_eq!(window.until, until);
    }

    #[test]
    fn december_rolls_over() {
        let window = Period::Month.window(at(2023, 12, 31, 23));
        assert_eq!(window.from, at(2023, 12, 1, 0));
        assert_eq!(window.until, at(2024, 1, 1, 0));
    }

    #[test]
    fn parse_periods() {
        assert_eq!("week".parse::<Period>(), Ok(Period::Week));
        assert!("fortnight".parse::<Period>().is_err());
        assert_eq!(Period::default(), Period::Month);
        assert_eq!(Period::Year.to_string(), "year");
    }
}
