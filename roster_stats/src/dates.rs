use std::collections::HashSet;
use std::sync::LazyLock;

use chrono::{Datelike, Duration, NaiveDate};
use log::{debug, warn};
use regex::Regex;

use crate::calendar::{date_label, CampaignWindow};
use crate::config::{Cell, CellAddress, ColumnLayout, DateColumn};
use crate::grid::Grid;

static ANNOTATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\([^)]*\)\s*").expect("valid annotation regex"));
static WEEKDAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*[월화수목금토일]요일.*").expect("valid weekday regex"));
static MONTH_DAY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{1,2})\s*월\s*(\d{1,2})\s*일").expect("valid month-day regex"));
static COMPACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{3,4}$").expect("valid compact date regex"));

/// Finds the columns of the header row that hold a day of the campaign.
///
/// The columns are returned from left to right. A header that cannot be read as a
/// date is skipped. When two columns carry the same day, only the leftmost one is kept.
pub fn locate_date_columns(
    grid: &Grid,
    layout: &ColumnLayout,
    window: &CampaignWindow,
) -> Vec<DateColumn> {
    let mut res: Vec<DateColumn> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    for column in layout.first_date_column..grid.width() {
        let cell = grid.get(CellAddress::new(layout.header_row, column));
        let date = match cell.and_then(|c| parse_header_date(c, window)) {
            Some(d) => d,
            None => {
                debug!(
                    "locate_date_columns: column {} not a date: {:?}",
                    column, cell
                );
                continue;
            }
        };
        let label = date_label(date);
        if !window.contains(date) {
            debug!(
                "locate_date_columns: column {} is {}, outside of the campaign window",
                column, label
            );
        }
        if !seen.insert(label.clone()) {
            warn!(
                "locate_date_columns: column {} repeats the date {}, ignoring it",
                column, label
            );
            continue;
        }
        res.push(DateColumn {
            column,
            label,
            date,
        });
    }
    debug!(
        "locate_date_columns: found {:?}",
        res.iter()
            .map(|dc| format!("{}: {}", dc.column, dc.label))
            .collect::<Vec<String>>()
    );
    res
}

/// Reads a header cell as a day of one of the campaign months.
pub fn parse_header_date(cell: &Cell, window: &CampaignWindow) -> Option<NaiveDate> {
    match cell {
        Cell::Number(n) => decode_serial(*n, window).or_else(|| {
            if n.fract() == 0.0 && *n >= 0.0 {
                parse_compact(&format!("{}", *n as i64), window)
            } else {
                None
            }
        }),
        Cell::String(s) => parse_header_text(s, window),
        Cell::Empty => None,
    }
}

fn parse_header_text(raw: &str, window: &CampaignWindow) -> Option<NaiveDate> {
    let s = strip_annotations(raw);
    if s.contains('/') {
        parse_separated(&s, '/', window)
    } else if s.contains('-') {
        parse_separated(&s, '-', window)
    } else if s.contains('월') && s.contains('일') {
        let (month, day) = parse_month_day_label(&s)?;
        window.resolve(month, day)
    } else if COMPACT_RE.is_match(&s) {
        parse_compact(&s, window)
    } else {
        None
    }
}

/// Removes the parenthesized notes and the weekday name:
/// `5월 1일 목요일 (근로자의 날)` becomes `5월 1일`.
pub fn strip_annotations(raw: &str) -> String {
    let s = ANNOTATION_RE.replace(raw, " ");
    let s = WEEKDAY_RE.replace(&s, "");
    s.trim().to_string()
}

/// Reads the month and the day out of a `4월 22일` label.
pub fn parse_month_day_label(label: &str) -> Option<(u32, u32)> {
    let caps = MONTH_DAY_RE.captures(label.trim())?;
    let month = caps.get(1)?.as_str().parse::<u32>().ok()?;
    let day = caps.get(2)?.as_str().parse::<u32>().ok()?;
    Some((month, day))
}

// Spreadsheet serial numbers count the days since 1899-12-30.
fn decode_serial(serial: f64, window: &CampaignWindow) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 || serial > 2_958_465.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    let date = epoch.checked_add_signed(Duration::days(serial.floor() as i64))?;
    window.resolve(date.month(), date.day())
}

fn parse_separated(s: &str, sep: char, window: &CampaignWindow) -> Option<NaiveDate> {
    let mut parts = s.split(sep).map(|p| p.trim().parse::<u32>());
    let month = parts.next()?.ok()?;
    let day = parts.next()?.ok()?;
    window.resolve(month, day)
}

// "421" is April 21st, "0421" too; "1105" is November 5th.
fn parse_compact(s: &str, window: &CampaignWindow) -> Option<NaiveDate> {
    let (m, d) = match s.len() {
        3 => s.split_at(1),
        4 => s.split_at(2),
        _ => return None,
    };
    window.resolve(m.parse::<u32>().ok()?, d.parse::<u32>().ok()?)
}
