use std::collections::HashMap;

use chrono::{Datelike, NaiveDate};
use log::debug;

use crate::config::{CalendarCell, DateRoster, RosterErrors};
use crate::dates::parse_month_day_label;

/// Weekday names, starting on Sunday.
pub const WEEKDAY_HEADERS: [&str; 7] = ["일", "월", "화", "수", "목", "금", "토"];

/// The contiguous range of days covered by the campaign (both ends included).
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct CampaignWindow {
    start: NaiveDate,
    end: NaiveDate,
}

impl CampaignWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<CampaignWindow, RosterErrors> {
        if end < start {
            return Err(RosterErrors::InvalidCampaignWindow { start, end });
        }
        Ok(CampaignWindow { start, end })
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn dates(&self) -> Vec<NaiveDate> {
        self.start
            .iter_days()
            .take_while(|d| *d <= self.end)
            .collect()
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// The (year, month) pairs touched by the window, in order.
    pub fn months(&self) -> Vec<(i32, u32)> {
        let last = (self.end.year(), self.end.month());
        let (mut year, mut month) = (self.start.year(), self.start.month());
        let mut res: Vec<(i32, u32)> = vec![(year, month)];
        while (year, month) < last {
            if month == 12 {
                year += 1;
                month = 1;
            } else {
                month += 1;
            }
            res.push((year, month));
        }
        res
    }

    /// The date for this month and day, if the month is one of the campaign months
    /// and the day exists in that month.
    ///
    /// The date itself may fall outside the window.
    pub fn resolve(&self, month: u32, day: u32) -> Option<NaiveDate> {
        let (year, _) = self.months().into_iter().find(|(_, m)| *m == month)?;
        NaiveDate::from_ymd_opt(year, month, day)
    }

    /// Maps a label such as `4월 22일` to `2025-04-22`.
    pub fn date_key(&self, label: &str) -> Option<String> {
        let (month, day) = parse_month_day_label(label)?;
        self.resolve(month, day)
            .map(|d| d.format("%Y-%m-%d").to_string())
    }
}

impl Default for CampaignWindow {
    /// 21 April 2025 to 18 May 2025.
    fn default() -> Self {
        CampaignWindow {
            start: NaiveDate::from_ymd_opt(2025, 4, 21).expect("valid default campaign start"),
            end: NaiveDate::from_ymd_opt(2025, 5, 18).expect("valid default campaign end"),
        }
    }
}

/// The canonical label of a date: `4월 22일`.
pub fn date_label(date: NaiveDate) -> String {
    format!("{}월 {}일", date.month(), date.day())
}

/// Lays out the campaign on a calendar with weeks starting on Sunday.
///
/// The result starts with the 7 weekday headers. Each following row of 7 cells is
/// one week; the days before the start of the campaign on the first week and after
/// its end on the last week are empty cells.
pub fn build_calendar(window: &CampaignWindow, rosters: &[DateRoster]) -> Vec<CalendarCell> {
    let counts: HashMap<NaiveDate, u64> = rosters
        .iter()
        .map(|r| (r.date, r.participants.len() as u64))
        .collect();

    let mut cells: Vec<CalendarCell> = WEEKDAY_HEADERS
        .iter()
        .map(|s| CalendarCell::Header(s.to_string()))
        .collect();

    let leading = window.start.weekday().num_days_from_sunday() as usize;
    for _ in 0..leading {
        cells.push(CalendarCell::Empty);
    }
    for date in window.dates() {
        cells.push(CalendarCell::Day {
            label: date_label(date),
            date,
            count: counts.get(&date).cloned().unwrap_or(0),
        });
    }
    while cells.len() % 7 != 0 {
        cells.push(CalendarCell::Empty);
    }
    debug!(
        "build_calendar: {} cells, {} leading empty cells",
        cells.len(),
        leading
    );
    cells
}
