mod calendar;
mod config;
mod dates;
mod grid;
mod stats;

pub mod builder;
pub mod manual;

use log::{debug, info};

use std::collections::{BTreeMap, HashMap};

pub use crate::calendar::*;
pub use crate::config::*;
pub use crate::dates::{locate_date_columns, parse_header_date, parse_month_day_label};
pub use crate::grid::*;
pub use crate::stats::*;

// **** Private structures ****

// A participant while the rows are being read.
#[derive(Debug, Clone)]
struct PendingRecord {
    identity: IdentityKey,
    name: String,
    age: Option<i32>,
    marital_status: Option<String>,
    // Keyed by the source column, so that the first entry is the first date.
    attended: BTreeMap<usize, String>,
}

impl PendingRecord {
    fn finish(self) -> Option<ParticipantRecord> {
        let first_date = self.attended.values().next()?.clone();
        Some(ParticipantRecord {
            identity: self.identity,
            name: self.name,
            age: self.age,
            marital_status: self.marital_status,
            attended_dates: self.attended.into_values().collect(),
            first_date,
        })
    }
}

/// Reads the roster and returns one record per participant.
///
/// The date columns are found in the header row first. Then every row with a name
/// is read; rows with the same name, gender, affiliation and birth year are merged.
/// Participants without any attended date are dropped.
///
/// Arguments:
/// * `grid` the worksheet, header row included
/// * `settings` where the fields are, which campaign, and how to read the cells
pub fn extract_participants(grid: &Grid, settings: &RosterSettings) -> Vec<ParticipantRecord> {
    let schema = locate_date_columns(grid, &settings.layout, &settings.window);
    info!(
        "Found {:?} date columns in a grid of {:?} rows",
        schema.len(),
        grid.height()
    );
    extract_with_schema(grid, &schema, settings)
}

/// Same as `extract_participants`, with date columns that are already known.
pub fn extract_with_schema(
    grid: &Grid,
    schema: &[DateColumn],
    settings: &RosterSettings,
) -> Vec<ParticipantRecord> {
    let layout = &settings.layout;
    let rules = &settings.rules;

    let mut arena: Vec<PendingRecord> = Vec::new();
    let mut index: HashMap<IdentityKey, usize> = HashMap::new();

    for row in (layout.header_row + 1)..grid.height() {
        let at = |column: usize| CellAddress::new(row, column);

        let raw_name = grid.get_string(at(layout.name));
        if raw_name.is_empty() {
            debug!("extract_with_schema: row {:?} has no name, skipping", row);
            continue;
        }

        let birth_year = read_birth_year(grid.get_number(at(layout.birth_year)));
        let identity = IdentityKey {
            name: raw_name,
            gender: grid.get_string(at(layout.gender)),
            affiliation: grid.get_string(at(layout.affiliation)),
            birth_year,
        };

        let attended: Vec<&DateColumn> = schema
            .iter()
            .filter(|dc| is_marked(grid.get(at(dc.column)), &rules.attendance_markers))
            .collect();
        debug!(
            "extract_with_schema: row {:?} {:?} attended {:?}",
            row,
            identity,
            attended.iter().map(|dc| &dc.label).collect::<Vec<_>>()
        );

        if let Some(idx) = index.get(&identity) {
            let existing = &mut arena[*idx];
            for dc in attended {
                existing.attended.insert(dc.column, dc.label.clone());
            }
        } else {
            let marital_status = Some(grid.get_string(at(layout.marital_status)))
                .filter(|s| !s.is_empty());
            let pending = PendingRecord {
                name: display_name(&identity.name, &rules.honorific_suffixes),
                age: birth_year.map(|y| rules.reference_year - y),
                marital_status,
                attended: attended
                    .into_iter()
                    .map(|dc| (dc.column, dc.label.clone()))
                    .collect(),
                identity: identity.clone(),
            };
            index.insert(identity, arena.len());
            arena.push(pending);
        }
    }

    let num_identities = arena.len();
    let res: Vec<ParticipantRecord> = arena.into_iter().filter_map(|p| p.finish()).collect();
    info!(
        "Extracted {:?} participants ({:?} without any attended date dropped)",
        res.len(),
        num_identities - res.len()
    );
    res
}

/// Computes all the statistics of the campaign.
pub fn summarize<'a>(records: &'a [ParticipantRecord], settings: &RosterSettings) -> RosterSummary<'a> {
    let rules = &settings.rules;
    let rosters = participants_by_date(records, &settings.window);
    let calendar = build_calendar(&settings.window, &rosters);
    let max_attendance = max_attendance_dates(&rosters);
    let affiliations = affiliation_ranking(records, rules.top_affiliations);
    let affiliations_shared_rank = shared_ranks(&affiliations);
    RosterSummary {
        total_participants: dedup_by_identity(records).len() as u64,
        total_attendance: rosters.iter().map(|r| r.participants.len() as u64).sum(),
        average_age: average_age(records),
        genders: gender_counts(records),
        ages: age_brackets(records),
        marital_statuses: marital_status_counts(records),
        attendance_counts: attendance_histogram(records, rules.max_attendance_count),
        affiliations,
        affiliations_shared_rank,
        regions: region_rollup(records, &rules.regions),
        rosters,
        calendar,
        max_attendance,
    }
}

/// Removes the honorific suffixes from a name: `홍길동형제` becomes `홍길동`.
pub fn display_name(raw: &str, suffixes: &[String]) -> String {
    let mut name = raw.trim();
    for suffix in suffixes.iter() {
        if let Some(stripped) = name.strip_suffix(suffix.as_str()) {
            name = stripped;
        }
    }
    let name = name.trim();
    if name.is_empty() {
        raw.trim().to_string()
    } else {
        name.to_string()
    }
}

/// The text of a cell as compared with the attendance markers.
fn marker_text(cell: &Cell) -> String {
    match cell {
        Cell::String(s) => s.trim().to_uppercase(),
        Cell::Number(n) => grid::number_to_string(*n),
        Cell::Empty => "".to_string(),
    }
}

fn is_marked(cell: Option<&Cell>, markers: &[String]) -> bool {
    match cell {
        Some(c) => {
            let t = marker_text(c);
            markers.iter().any(|m| *m == t)
        }
        None => false,
    }
}

// Zero or unreadable years count as unknown.
fn read_birth_year(n: Option<f64>) -> Option<i32> {
    match n {
        Some(x) if x.is_finite() && x >= 1.0 && x < 10000.0 => Some(x.trunc() as i32),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::builder::GridBuilder;
    use super::*;

    // Columns A to J, then the given date headers from K.
    fn header(dates: &[&str]) -> Vec<String> {
        let mut h: Vec<String> = ["번호", "구분", "이름", "성별", "회중", "출생연도", "연락처", "결혼", "비고", "메모"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        h.extend(dates.iter().map(|s| s.to_string()));
        h
    }

    fn row(name: &str, gender: &str, cong: &str, year: &str, marriage: &str, marks: &[&str]) -> Vec<String> {
        let mut r: Vec<String> = vec!["", "", name, gender, cong, year, "", marriage, "", ""]
            .iter()
            .map(|s| s.to_string())
            .collect();
        r.extend(marks.iter().map(|s| s.to_string()));
        r
    }

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn grid(dates: &[&str], rows: Vec<Vec<String>>) -> Grid {
        let mut b = GridBuilder::new().row(&header(dates));
        for r in rows.iter() {
            b = b.row(r);
        }
        b.build()
    }

    #[test]
    fn duplicate_rows_are_merged() {
        init_logger();
        let g = grid(
            &["4월 22일 화요일", "4월 29일 화요일"],
            vec![
                row("홍길동", "형제", "서울지회", "1990", "기혼", &["O", "O"]),
                row("홍길동", "형제", "서울지회", "1990", "기혼", &["O", ""]),
            ],
        );
        let res = extract_participants(&g, &RosterSettings::default());
        assert_eq!(res.len(), 1);
        let p = &res[0];
        assert_eq!(p.attended_dates, vec!["4월 22일", "4월 29일"]);
        assert_eq!(p.attendance_count(), 2);
        assert_eq!(p.first_date, "4월 22일");
        assert_eq!(p.age, Some(35));
        assert_eq!(p.birth_year(), Some(1990));
        assert_eq!(p.marital_status, Some("기혼".to_string()));
    }

    #[test]
    fn dates_from_later_rows_are_added() {
        let g = grid(
            &["4/21", "4/22", "4/23"],
            vec![
                row("김영희", "자매", "경기평택지산", "1985", "", &["", "", "o"]),
                row("김영희", "자매", "경기평택지산", "1985", "", &["y", "", ""]),
            ],
        );
        let res = extract_participants(&g, &RosterSettings::default());
        assert_eq!(res.len(), 1);
        assert_eq!(res[0].attended_dates, vec!["4월 21일", "4월 23일"]);
        assert_eq!(res[0].first_date, "4월 21일");
        assert_eq!(res[0].marital_status, None);
    }

    #[test]
    fn first_date_follows_column_order() {
        // "4월 10일" sorts before "4월 9일" as a string.
        let settings = RosterSettings {
            window: CampaignWindow::new(
                chrono::NaiveDate::from_ymd_opt(2025, 4, 7).unwrap(),
                chrono::NaiveDate::from_ymd_opt(2025, 4, 13).unwrap(),
            )
            .unwrap(),
            ..RosterSettings::default()
        };
        let g = grid(
            &["4월 9일", "4월 10일"],
            vec![
                row("a", "형제", "x", "1990", "", &["", "O"]),
                row("a", "형제", "x", "1990", "", &["O", ""]),
            ],
        );
        let res = extract_participants(&g, &settings);
        assert_eq!(res[0].first_date, "4월 9일");
        assert_eq!(res[0].attended_dates, vec!["4월 9일", "4월 10일"]);
    }

    #[test]
    fn different_identities_stay_apart() {
        let g = grid(
            &["4/21"],
            vec![
                row("홍길동", "형제", "서울지회", "1990", "", &["O"]),
                row("홍길동", "형제", "서울지회", "1991", "", &["O"]),
                row("홍길동", "형제", "부산", "1990", "", &["O"]),
                row("홍길동형제", "형제", "서울지회", "1990", "", &["O"]),
            ],
        );
        let res = extract_participants(&g, &RosterSettings::default());
        assert_eq!(res.len(), 4);
        // Identity uses the raw name, the display name has the suffix removed.
        assert_eq!(res[3].name, "홍길동");
        assert_eq!(res[3].identity.name, "홍길동형제");
    }

    #[test]
    fn markers() {
        let g = grid(
            &["4/21", "4/22", "4/23", "4/24", "4/25", "4/26", "4/27"],
            vec![row("a", "형제", "x", "", "", &["x", "", " yes ", "TRUE", "1", "0", "N"])],
        );
        let res = extract_participants(&g, &RosterSettings::default());
        assert_eq!(res[0].attended_dates, vec!["4월 23일", "4월 24일", "4월 25일"]);
        assert_eq!(res[0].age, None);
        assert_eq!(res[0].birth_year(), None);
    }

    #[test]
    fn numeric_and_boolean_cells() {
        let mut h: Vec<Cell> = header(&[]).into_iter().map(Cell::String).collect();
        h.push(Cell::Number(45768.0));
        h.push(Cell::Number(45769.0));
        let mut r: Vec<Cell> = row("a", "자매", "x", "", "", &[])
            .into_iter()
            .map(Cell::String)
            .collect();
        r[5] = Cell::Number(2000.0);
        r.push(Cell::Number(1.0));
        r.push(Cell::String("TRUE".to_string()));
        let g = Grid::new(vec![h, r]);
        let res = extract_participants(&g, &RosterSettings::default());
        assert_eq!(res[0].attended_dates, vec!["4월 21일", "4월 22일"]);
        assert_eq!(res[0].age, Some(25));
    }

    #[test]
    fn incomplete_rows_are_skipped() {
        let g = grid(
            &["4/21"],
            vec![
                row("", "형제", "x", "1990", "", &["O"]),
                row("   ", "형제", "x", "1990", "", &["O"]),
                row("b", "형제", "x", "1990", "", &[""]),
                vec!["only".to_string()],
            ],
        );
        let res = extract_participants(&g, &RosterSettings::default());
        assert!(res.is_empty());
    }

    #[test]
    fn extraction_is_idempotent() {
        let g = grid(
            &["4/21", "4/22"],
            vec![
                row("a", "형제", "x", "1990", "", &["O", ""]),
                row("b", "자매", "y", "1970", "미혼", &["", "O"]),
                row("a", "형제", "x", "1990", "", &["", "O"]),
            ],
        );
        let settings = RosterSettings::default();
        assert_eq!(
            extract_participants(&g, &settings),
            extract_participants(&g, &settings)
        );
    }

    #[test]
    fn display_names() {
        let suffixes: Vec<String> = DEFAULT_HONORIFIC_SUFFIXES.iter().map(|s| s.to_string()).collect();
        assert_eq!(display_name("홍길동 형제", &suffixes), "홍길동");
        assert_eq!(display_name("김영희자매", &suffixes), "김영희");
        assert_eq!(display_name("박철수", &suffixes), "박철수");
        assert_eq!(display_name("형제", &suffixes), "형제");
    }

    #[test]
    fn full_summary() {
        init_logger();
        let g = grid(
            &["4/21", "4/22"],
            vec![
                row("a", "형제", "서울성수", "1990", "기혼", &["O", "O"]),
                row("b", "자매", "서울성수", "1960", "미혼", &["O", ""]),
                row("c", "자매", "경기평택지산", "", "", &["", "O"]),
            ],
        );
        let settings = RosterSettings::default();
        let records = extract_participants(&g, &settings);
        let s = summarize(&records, &settings);
        assert_eq!(s.total_participants, 3);
        assert_eq!(s.total_attendance, 4);
        assert_eq!(s.average_age, "50.0");
        assert_eq!(s.genders[1], AggregateBucket::new("자매", 2));
        assert_eq!(s.affiliations[0].label, "서울성수");
        assert_eq!(s.affiliations[0].rank, Some(1));
        assert_eq!(s.regions[0], AggregateBucket::new("서울", 2));
        assert_eq!(s.max_attendance.count, 2);
        assert_eq!(s.max_attendance.dates, vec!["4월 21일", "4월 22일"]);
        assert_eq!(s.calendar.len(), 42);
        match &s.calendar[9] {
            CalendarCell::Day { label, count, .. } => {
                assert_eq!(label, "4월 22일");
                assert_eq!(*count, 2);
            }
            x => panic!("unexpected cell {:?}", x),
        }
    }
}
