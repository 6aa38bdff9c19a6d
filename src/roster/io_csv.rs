// Primitives for reading and writing CSV files.

use std::collections::HashMap;

use csv::{ReaderBuilder, StringRecord, Terminator, WriterBuilder};
use log::{debug, warn};
use snafu::ResultExt;

use roster_stats::builder::GridBuilder;
use roster_stats::{
    date_label, parse_header_date, Cell, Grid, IdentityKey, ParticipantRecord, RosterSettings,
};

use crate::roster::*;

pub const EXPORT_HEADER: [&str; 8] = [
    "날짜",
    "회중",
    "이름",
    "성별",
    "나이",
    "출생연도",
    "결혼",
    "참여일자",
];

/// Reads a CSV file with the same layout as the worksheet. All cells are text.
pub fn read_csv_grid(path: &str) -> RosterResult<Grid> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let mut builder = GridBuilder::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let line = line_r.context(CsvLineParseSnafu { lineno: idx + 1 })?;
        let cells: Vec<&str> = line.iter().collect();
        builder.add_row(&cells);
    }
    debug!("read_csv_grid: {} rows in {}", builder.num_rows(), path);
    Ok(builder.build())
}

// Entries may be written `4월 22일`, `4/22` or `4-22`. They all become `4월 22일`.
fn canonical_label(entry: &str, settings: &RosterSettings) -> Option<String> {
    parse_header_date(&Cell::String(entry.to_string()), &settings.window).map(date_label)
}

fn field<'a>(line: &'a StringRecord, columns: &HashMap<&str, usize>, name: &str) -> &'a str {
    columns
        .get(name)
        .and_then(|idx| line.get(*idx))
        .unwrap_or("")
        .trim()
}

/// Reads back a file written by `export_to_string`.
pub fn read_export(path: &str, settings: &RosterSettings) -> RosterResult<Vec<ParticipantRecord>> {
    let mut rdr = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .context(CsvOpenSnafu { path })?;
    let headers = rdr.headers().context(CsvLineParseSnafu { lineno: 1_usize })?.clone();
    let columns: HashMap<&str, usize> = headers
        .iter()
        .enumerate()
        .map(|(idx, h)| (h.trim_start_matches('\u{feff}').trim(), idx))
        .collect();
    for name in ["이름", "참여일자"] {
        if !columns.contains_key(name) {
            whatever!("The column {} is missing in the export {}", name, path)
        }
    }

    let mut res: Vec<ParticipantRecord> = Vec::new();
    for (idx, line_r) in rdr.records().enumerate() {
        let lineno = idx + 2;
        let line = line_r.context(CsvLineParseSnafu { lineno })?;
        let name = field(&line, &columns, "이름");
        if name.is_empty() {
            debug!("read_export: line {} has no name, skipping", lineno);
            continue;
        }
        let mut attended_dates: Vec<String> = Vec::new();
        for entry in field(&line, &columns, "참여일자")
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            match canonical_label(entry, settings) {
                Some(label) if !attended_dates.contains(&label) => attended_dates.push(label),
                Some(_) => debug!("read_export: line {}: {:?} repeated", lineno, entry),
                None => warn!(
                    "read_export: line {}: {:?} is not a date of the campaign, ignored",
                    lineno, entry
                ),
            }
        }
        if attended_dates.is_empty() {
            debug!("read_export: line {} has no attended date, skipping", lineno);
            continue;
        }
        let first_date = canonical_label(field(&line, &columns, "날짜"), settings)
            .unwrap_or_else(|| attended_dates[0].clone());
        let marital_status = field(&line, &columns, "결혼");
        res.push(ParticipantRecord {
            identity: IdentityKey {
                name: name.to_string(),
                gender: field(&line, &columns, "성별").to_string(),
                affiliation: field(&line, &columns, "회중").to_string(),
                birth_year: field(&line, &columns, "출생연도").parse::<i32>().ok(),
            },
            name: name.to_string(),
            age: field(&line, &columns, "나이").parse::<i32>().ok(),
            marital_status: Some(marital_status.to_string()).filter(|s| !s.is_empty()),
            attended_dates,
            first_date,
        });
    }
    Ok(res)
}

fn export_line(p: &ParticipantRecord) -> Vec<String> {
    vec![
        p.first_date.clone(),
        p.affiliation().to_string(),
        p.name.clone(),
        p.gender().to_string(),
        p.age.map(|a| a.to_string()).unwrap_or_default(),
        p.birth_year().map(|y| y.to_string()).unwrap_or_default(),
        p.marital_status.clone().unwrap_or_default(),
        p.attended_dates.join(","),
    ]
}

/// One line per participant, in the order of the records.
pub fn export_to_string(participants: &[ParticipantRecord]) -> RosterResult<String> {
    let mut buf: Vec<u8> = Vec::new();
    {
        let mut wtr = WriterBuilder::new()
            .terminator(Terminator::Any(b'\n'))
            .from_writer(&mut buf);
        wtr.write_record(&EXPORT_HEADER).context(CsvWriteSnafu {})?;
        for p in participants.iter() {
            wtr.write_record(export_line(p)).context(CsvWriteSnafu {})?;
        }
        wtr.flush()
            .context(WritingOutputSnafu { path: "export" })?;
    }
    Ok(String::from_utf8_lossy(&buf).to_string())
}
