// The schedule of each day of the campaign, attached to the calendar of the summary.
//
// The file is a JSON object keyed by the ISO date (`2025-04-22`). The content of each
// entry is copied as it is.

use std::fs;

use chrono::NaiveDate;
use log::{debug, warn};
use serde_json::{Map, Value as JSValue};
use snafu::ResultExt;

use crate::roster::{OpeningFileSnafu, ParsingJsonSnafu, RosterResult};

pub type ScheduleData = Map<String, JSValue>;

pub fn read_schedule(path: &str) -> RosterResult<ScheduleData> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let data: ScheduleData = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_schedule: {} entries from {}", data.len(), path);
    for key in data.keys() {
        if NaiveDate::parse_from_str(key, "%Y-%m-%d").is_err() {
            warn!("The schedule entry {:?} is not a date and will never be used", key);
        }
    }
    Ok(data)
}

pub fn schedule_entry(data: &ScheduleData, date: NaiveDate) -> Option<&JSValue> {
    data.get(&date.format("%Y-%m-%d").to_string())
}
