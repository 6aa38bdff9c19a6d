pub mod config_reader;
mod io_common;
mod io_csv;
mod io_xlsx;
mod schedule;

use log::{debug, info, warn};

use roster_stats::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::roster::config_reader::*;
use crate::roster::io_common::{resolve_path, simplify_file_name, write_output};
use crate::roster::schedule::{read_schedule, schedule_entry, ScheduleData};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum RosterError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook {path} does not have any worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("The workbook {path} does not have a worksheet named {worksheet_name}"))]
    MissingWorksheet {
        path: String,
        worksheet_name: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of a CSV file"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error writing a CSV line"))]
    CsvWrite { source: csv::Error },
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error processing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot understand the column or row index {value}"))]
    ParsingColumnIndex { value: String },
    #[snafu(display("Provider not implemented: {provider}"))]
    UnknownProvider { provider: String },
    #[snafu(display("Invalid campaign settings"))]
    InvalidSettings { source: RosterErrors },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("No roster file given, use --input or the source section of the configuration"))]
    MissingInput {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RosterResult<T> = Result<T, RosterError>;

fn buckets_to_json(buckets: &[AggregateBucket]) -> Vec<JSValue> {
    buckets
        .iter()
        .map(|b| match b.rank {
            Some(rank) => json!({"name": b.label, "value": b.count, "rank": rank}),
            None => json!({"name": b.label, "value": b.count}),
        })
        .collect()
}

fn calendar_to_json(
    cells: &[CalendarCell],
    window: &CampaignWindow,
    schedule: Option<&ScheduleData>,
) -> Vec<JSValue> {
    cells
        .iter()
        .map(|c| match c {
            CalendarCell::Header(text) => json!({"isHeader": true, "text": text}),
            CalendarCell::Empty => json!({"isEmpty": true}),
            CalendarCell::Day { label, date, count } => {
                let mut js = json!({
                    "name": label,
                    "value": count,
                    "isEmpty": false,
                    "originalDate": label,
                });
                if let Some(key) = window.date_key(label) {
                    js["dateKey"] = json!(key);
                }
                if let Some(entry) = schedule.and_then(|s| schedule_entry(s, *date)) {
                    js["schedule"] = entry.clone();
                }
                js
            }
        })
        .collect()
}

fn build_summary_js(
    config: &RosterConfig,
    settings: &RosterSettings,
    summary: &RosterSummary,
    schedule: Option<&ScheduleData>,
) -> JSValue {
    let c = OutputConfig {
        campaign_name: config.output_settings.campaign_name.clone(),
        start_date: settings.window.start().to_string(),
        end_date: settings.window.end().to_string(),
        reference_year: settings.rules.reference_year,
    };
    let dates: Vec<JSValue> = summary
        .rosters
        .iter()
        .map(|r| {
            let names: Vec<&str> = r.participants.iter().map(|p| p.name.as_str()).collect();
            json!({"date": r.label, "count": names.len(), "participants": names})
        })
        .collect();
    json!({
        "config": c,
        "results": {
            "totalParticipants": summary.total_participants,
            "totalAttendance": summary.total_attendance,
            "averageAge": summary.average_age,
            "gender": buckets_to_json(&summary.genders),
            "age": buckets_to_json(&summary.ages),
            "marriage": buckets_to_json(&summary.marital_statuses),
            "participation": buckets_to_json(&summary.attendance_counts),
            "congregation": buckets_to_json(&summary.affiliations),
            "congregationSharedRank": buckets_to_json(&summary.affiliations_shared_rank),
            "region": buckets_to_json(&summary.regions),
            "calendar": calendar_to_json(&summary.calendar, &settings.window, schedule),
            "maxAttendance": {
                "dates": summary.max_attendance.dates,
                "count": summary.max_attendance.count,
            },
            "dates": dates,
        }
    })
}

fn read_participants(
    path: &str,
    source: &FileSource,
    settings: &RosterSettings,
) -> RosterResult<Vec<ParticipantRecord>> {
    let provider = source.provider(path);
    info!(
        "Attempting to read roster file {:?} with provider {:?}",
        path, provider
    );
    match provider.as_str() {
        "xlsx" => {
            let grid = io_xlsx::read_excel_grid(path, source.excel_worksheet_name.as_deref())?;
            Ok(extract_participants(&grid, settings))
        }
        "csv" => {
            let grid = io_csv::read_csv_grid(path)?;
            Ok(extract_participants(&grid, settings))
        }
        "export" => io_csv::read_export(path, settings),
        x => UnknownProviderSnafu { provider: x }.fail(),
    }
}

// Line endings and trailing blank lines do not count as differences.
fn normalize_text(s: &str) -> String {
    s.replace("\r\n", "\n").trim_end().to_string()
}

fn check_reference(reference_path: &str, export: &str) -> RosterResult<()> {
    let reference = fs::read_to_string(reference_path).context(OpeningFileSnafu {
        path: reference_path,
    })?;
    let reference = normalize_text(&reference);
    let produced = normalize_text(export);
    if reference != produced {
        warn!("Found differences with the reference file {}", reference_path);
        print_diff(reference.as_str(), produced.as_str(), "\n");
        whatever!("Difference detected between the produced export and the reference export")
    }
    info!("The export matches the reference {}", reference_path);
    Ok(())
}

/// Runs the whole pipeline: reads the configuration and the roster, writes the export
/// and the summary, and compares with the reference if one was given.
///
/// Paths in the configuration file are relative to the directory of that file. Paths
/// given on the command line are used as they are.
pub fn run_roster(args: &Args) -> RosterResult<()> {
    let (config, root): (RosterConfig, PathBuf) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (config, root)
        }
        None => (RosterConfig::default(), PathBuf::new()),
    };
    let config = config.with_args(args);
    info!("config: {:?}", config);

    let settings = config.settings()?;
    debug!("settings: {:?}", settings);

    let from_config = |p: &String| resolve_path(&root, p);

    let input_path = args
        .input
        .clone()
        .or_else(|| config.source.file_path.as_ref().map(from_config))
        .context(MissingInputSnafu {})?;

    let participants = read_participants(&input_path, &config.source, &settings)?;
    info!(
        "Read {} participants from {}",
        participants.len(),
        simplify_file_name(&input_path)
    );

    let export = io_csv::export_to_string(&participants)?;
    let out_path = args
        .out
        .clone()
        .or_else(|| config.export_path().as_ref().map(from_config))
        .unwrap_or_else(|| "stdout".to_string());
    write_output(&out_path, &export)?;

    let summary_path = args
        .summary
        .clone()
        .or_else(|| config.summary_path().as_ref().map(from_config));
    if let Some(summary_path) = summary_path {
        let schedule_path = args.schedule.clone().or_else(|| {
            config
                .output_settings
                .schedule_file
                .as_ref()
                .map(from_config)
        });
        let schedule: Option<ScheduleData> = match schedule_path {
            Some(p) => Some(read_schedule(&p)?),
            None => None,
        };
        let summary = summarize(&participants, &settings);
        let summary_js = build_summary_js(&config, &settings, &summary, schedule.as_ref());
        let pretty = serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})?;
        write_output(&summary_path, &pretty)?;
    }

    // The reference export, if provided for comparison
    if let Some(reference_path) = &args.reference {
        check_reference(reference_path, &export)?;
    }

    Ok(())
}

#[cfg(test)]
fn test_dir() -> String {
    format!("{}/tests/roster_data", env!("CARGO_MANIFEST_DIR"))
}

#[cfg(test)]
fn test_args(test_name: &str) -> Args {
    let dir = format!("{}/{}", test_dir(), test_name);
    Args {
        config: Some(format!("{}/{}_config.json", dir, test_name)),
        reference: Some(format!("{}/{}_expected.csv", dir, test_name)),
        out: None,
        summary: None,
        input: None,
        input_type: None,
        excel_worksheet_name: None,
        schedule: None,
        reference_year: None,
        verbose: false,
    }
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let _ = env_logger::builder().is_test(true).try_init();
    info!("Running test {}", test_name);
    let res = run_roster(&test_args(test_name));
    if let Err(e) = res {
        panic!("test {} failed: {}", test_name, e);
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn basic() {
        test_wrapper("basic");
    }

    #[test]
    fn from_export() {
        test_wrapper("from_export");
    }

    #[test]
    fn loose_export() {
        test_wrapper("loose_export");
    }

    #[test]
    fn header_notations() {
        test_wrapper("header_notations");
    }

    #[test]
    fn mismatching_reference_fails() {
        let mut args = test_args("basic");
        args.reference = Some(format!("{}/header_notations/header_notations_expected.csv", test_dir()));
        assert!(run_roster(&args).is_err());
    }

    #[test]
    fn unknown_provider_fails() {
        let mut args = test_args("basic");
        args.input_type = Some("ods".to_string());
        assert!(matches!(
            run_roster(&args),
            Err(RosterError::UnknownProvider { .. })
        ));
    }

    #[test]
    fn missing_file_fails() {
        let mut args = test_args("basic");
        args.input = Some("does_not_exist.csv".to_string());
        assert!(matches!(
            run_roster(&args),
            Err(RosterError::CsvOpen { .. })
        ));
    }

    #[test]
    fn summary_of_basic() {
        let dir = format!("{}/basic", test_dir());
        let config = read_config(&format!("{}/basic_config.json", dir)).unwrap();
        let settings = config.settings().unwrap();
        let grid = io_csv::read_csv_grid(&format!("{}/basic.csv", dir)).unwrap();
        let participants = extract_participants(&grid, &settings);
        let schedule = read_schedule(&format!("{}/basic_schedule.json", dir)).unwrap();
        let summary = summarize(&participants, &settings);
        let js = build_summary_js(&config, &settings, &summary, Some(&schedule));

        assert_eq!(js["config"]["campaignName"], json!("서울성수 특별 활동"));
        assert_eq!(js["config"]["startDate"], json!("2025-04-21"));
        let res = &js["results"];
        assert_eq!(res["totalParticipants"], json!(3));
        assert_eq!(res["totalAttendance"], json!(7));
        assert_eq!(res["averageAge"], json!("50.0"));
        assert_eq!(res["gender"][0], json!({"name": "형제", "value": 1}));
        assert_eq!(res["gender"][1], json!({"name": "자매", "value": 2}));
        assert_eq!(res["region"][0], json!({"name": "서울", "value": 2}));
        assert_eq!(
            res["congregation"][0],
            json!({"name": "서울성수", "value": 2, "rank": 1})
        );
        assert_eq!(
            res["maxAttendance"],
            json!({"dates": ["4월 22일", "4월 23일", "5월 1일"], "count": 2})
        );
        assert_eq!(res["calendar"][0], json!({"isHeader": true, "text": "일"}));
        assert_eq!(res["calendar"][7], json!({"isEmpty": true}));
        assert_eq!(res["calendar"][8]["name"], json!("4월 21일"));
        assert_eq!(res["calendar"][8]["value"], json!(1));
        assert_eq!(res["calendar"][9]["dateKey"], json!("2025-04-22"));
        assert_eq!(
            res["calendar"][9]["schedule"]["morning"]["meetingTime"],
            json!("오전 9시 45분")
        );
        assert!(res["calendar"][8].get("schedule").is_none());
        assert_eq!(res["dates"][0]["participants"], json!(["홍길동"]));
    }
}
