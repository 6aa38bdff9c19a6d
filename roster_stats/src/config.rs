// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

use chrono::NaiveDate;

use crate::calendar::CampaignWindow;

/// The content of one cell of the source grid.
///
/// Workbook readers map their own cell types onto this one: booleans become
/// the strings `TRUE` and `FALSE`, date cells become their serial number.
#[derive(PartialEq, Debug, Clone)]
pub enum Cell {
    Empty,
    String(String),
    Number(f64),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::String(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

/// A (row, column) position in the grid. Both indexes start at 0.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub struct CellAddress {
    pub row: usize,
    pub column: usize,
}

impl CellAddress {
    pub fn new(row: usize, column: usize) -> CellAddress {
        CellAddress { row, column }
    }
}

// ******** Output data structures *********

/// A header column that was recognized as one day of the campaign.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct DateColumn {
    pub column: usize,
    /// Normalized label, for example `4월 22일`.
    pub label: String,
    pub date: NaiveDate,
}

/// Everything that makes two rows of the roster the same person.
///
/// The name is the raw name found in the source, before any cosmetic cleanup.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct IdentityKey {
    pub name: String,
    pub gender: String,
    pub affiliation: String,
    pub birth_year: Option<i32>,
}

/// One participant, after all the rows describing the same person have been merged.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ParticipantRecord {
    pub identity: IdentityKey,
    /// The name without the honorific suffix.
    pub name: String,
    pub age: Option<i32>,
    pub marital_status: Option<String>,
    /// The attended dates, in the order of the source columns. Never empty.
    pub attended_dates: Vec<String>,
    /// The attended date found in the leftmost source column.
    pub first_date: String,
}

impl ParticipantRecord {
    pub fn gender(&self) -> &str {
        &self.identity.gender
    }

    pub fn affiliation(&self) -> &str {
        &self.identity.affiliation
    }

    pub fn birth_year(&self) -> Option<i32> {
        self.identity.birth_year
    }

    pub fn attendance_count(&self) -> usize {
        self.attended_dates.len()
    }
}

/// A labeled count, shared by all the grouped statistics.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct AggregateBucket {
    pub label: String,
    pub count: u64,
    pub rank: Option<u32>,
}

impl AggregateBucket {
    pub fn new(label: &str, count: u64) -> AggregateBucket {
        AggregateBucket {
            label: label.to_string(),
            count,
            rank: None,
        }
    }
}

/// One cell of the attendance calendar.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CalendarCell {
    /// A weekday name, on the first row of the calendar.
    Header(String),
    /// A position of the grid that is not part of the campaign.
    Empty,
    Day {
        label: String,
        date: NaiveDate,
        count: u64,
    },
}

/// The participants who attended one day of the campaign.
#[derive(PartialEq, Debug, Clone)]
pub struct DateRoster<'a> {
    pub label: String,
    pub date: NaiveDate,
    pub participants: Vec<&'a ParticipantRecord>,
}

/// The busiest day(s) of the campaign.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct MaxAttendance {
    pub dates: Vec<String>,
    pub count: u64,
}

/// All the statistics computed over a list of participants.
#[derive(PartialEq, Debug, Clone)]
pub struct RosterSummary<'a> {
    pub total_participants: u64,
    /// Sum over all the days of the number of participants on that day.
    pub total_attendance: u64,
    pub average_age: String,
    pub genders: Vec<AggregateBucket>,
    pub ages: Vec<AggregateBucket>,
    pub marital_statuses: Vec<AggregateBucket>,
    pub attendance_counts: Vec<AggregateBucket>,
    /// Positional ranks.
    pub affiliations: Vec<AggregateBucket>,
    /// Same entries as `affiliations`, with tie-aware ranks.
    pub affiliations_shared_rank: Vec<AggregateBucket>,
    pub regions: Vec<AggregateBucket>,
    pub rosters: Vec<DateRoster<'a>>,
    pub calendar: Vec<CalendarCell>,
    pub max_attendance: MaxAttendance,
}

/// Errors in the settings that prevent the pipeline from running.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RosterErrors {
    InvalidCampaignWindow { start: NaiveDate, end: NaiveDate },
}

impl Error for RosterErrors {}

impl Display for RosterErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterErrors::InvalidCampaignWindow { start, end } => write!(
                f,
                "The campaign window ends ({}) before it starts ({})",
                end, start
            ),
        }
    }
}

// ********* Configuration **********

/// Where the fields of a participant are found in the grid. All indexes start at 0.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnLayout {
    pub header_row: usize,
    pub name: usize,
    pub gender: usize,
    pub affiliation: usize,
    pub birth_year: usize,
    pub marital_status: usize,
    /// The date columns are searched from this column to the end of the header.
    pub first_date_column: usize,
}

impl ColumnLayout {
    /// Name in C, gender in D, affiliation in E, birth year in F, marital status in H,
    /// dates from K onwards.
    pub const DEFAULT_LAYOUT: ColumnLayout = ColumnLayout {
        header_row: 0,
        name: 2,
        gender: 3,
        affiliation: 4,
        birth_year: 5,
        marital_status: 7,
        first_date_column: 10,
    };
}

impl Default for ColumnLayout {
    fn default() -> Self {
        ColumnLayout::DEFAULT_LAYOUT
    }
}

pub const DEFAULT_ATTENDANCE_MARKERS: [&str; 5] = ["O", "TRUE", "Y", "YES", "1"];

pub const DEFAULT_HONORIFIC_SUFFIXES: [&str; 2] = ["자매", "형제"];

pub const DEFAULT_REGIONS: [&str; 14] = [
    "경기", "충북", "경남", "전북", "인천", "부산", "울산", "대전", "강원", "서울", "경북", "전남",
    "충남", "제주",
];

/// How the rows are read and the statistics computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RosterRules {
    /// Upper-case values that mark a date as attended.
    pub attendance_markers: Vec<String>,
    /// Suffixes removed from the end of the display names, in this order.
    pub honorific_suffixes: Vec<String>,
    /// Ages are computed as `reference_year - birth_year`.
    pub reference_year: i32,
    pub top_affiliations: usize,
    pub max_attendance_count: usize,
    pub regions: Vec<String>,
}

impl Default for RosterRules {
    fn default() -> Self {
        RosterRules {
            attendance_markers: DEFAULT_ATTENDANCE_MARKERS
                .iter()
                .map(|s| s.to_string())
                .collect(),
            honorific_suffixes: DEFAULT_HONORIFIC_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            reference_year: 2025,
            top_affiliations: 21,
            max_attendance_count: 7,
            regions: DEFAULT_REGIONS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// All the settings of one run.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RosterSettings {
    pub layout: ColumnLayout,
    pub window: CampaignWindow,
    pub rules: RosterRules,
}
