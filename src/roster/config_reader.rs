use crate::args::Args;
use crate::roster::*;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "campaignName", default)]
    pub campaign_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "exportFile")]
    pub export_file: Option<String>,
    #[serde(rename = "summaryFile")]
    pub summary_file: Option<String>,
    #[serde(rename = "scheduleFile")]
    pub schedule_file: Option<String>,
}

/// The `config` section of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    #[serde(rename = "campaignName")]
    pub campaign_name: String,
    #[serde(rename = "startDate")]
    pub start_date: String,
    #[serde(rename = "endDate")]
    pub end_date: String,
    #[serde(rename = "referenceYear")]
    pub reference_year: i32,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    #[serde(rename = "headerRowIndex")]
    pub header_row_index: Option<JSValue>,
    #[serde(rename = "nameColumnIndex")]
    pub name_column_index: Option<JSValue>,
    #[serde(rename = "genderColumnIndex")]
    pub gender_column_index: Option<JSValue>,
    #[serde(rename = "congregationColumnIndex")]
    pub congregation_column_index: Option<JSValue>,
    #[serde(rename = "birthYearColumnIndex")]
    pub birth_year_column_index: Option<JSValue>,
    #[serde(rename = "marriageColumnIndex")]
    pub marriage_column_index: Option<JSValue>,
    #[serde(rename = "firstDateColumnIndex")]
    pub first_date_column_index: Option<JSValue>,
}

impl FileSource {
    /// The provider to use for this file. Without an explicit provider, `.csv` files
    /// are read as CSV and everything else as a workbook.
    pub fn provider(&self, path: &str) -> String {
        if let Some(p) = &self.provider {
            return p.clone();
        }
        let is_csv = Path::new(path)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        let provider = if is_csv { "csv" } else { "xlsx" };
        provider.to_string()
    }

    pub fn layout(&self) -> RosterResult<ColumnLayout> {
        let d = ColumnLayout::DEFAULT_LAYOUT;
        Ok(ColumnLayout {
            header_row: read_js_index(&self.header_row_index)?.unwrap_or(d.header_row),
            name: read_js_index(&self.name_column_index)?.unwrap_or(d.name),
            gender: read_js_index(&self.gender_column_index)?.unwrap_or(d.gender),
            affiliation: read_js_index(&self.congregation_column_index)?.unwrap_or(d.affiliation),
            birth_year: read_js_index(&self.birth_year_column_index)?.unwrap_or(d.birth_year),
            marital_status: read_js_index(&self.marriage_column_index)?
                .unwrap_or(d.marital_status),
            first_date_column: read_js_index(&self.first_date_column_index)?
                .unwrap_or(d.first_date_column),
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct CampaignSettings {
    #[serde(rename = "startDate")]
    pub start_date: Option<NaiveDate>,
    #[serde(rename = "endDate")]
    pub end_date: Option<NaiveDate>,
    #[serde(rename = "referenceYear")]
    pub reference_year: Option<i32>,
}

impl CampaignSettings {
    pub fn window(&self) -> RosterResult<CampaignWindow> {
        match (self.start_date, self.end_date) {
            (Some(start), Some(end)) => {
                CampaignWindow::new(start, end).context(InvalidSettingsSnafu {})
            }
            (None, None) => Ok(CampaignWindow::default()),
            _ => whatever!("the campaign needs both a startDate and an endDate"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct Rules {
    #[serde(rename = "attendanceMarkers")]
    pub attendance_markers: Option<Vec<String>>,
    #[serde(rename = "honorificSuffixes")]
    pub honorific_suffixes: Option<Vec<String>>,
    #[serde(rename = "topCongregations")]
    pub top_congregations: Option<usize>,
    #[serde(rename = "maxParticipationDays")]
    pub max_participation_days: Option<usize>,
    pub regions: Option<Vec<String>>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct RosterConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(default)]
    pub source: FileSource,
    #[serde(default)]
    pub campaign: CampaignSettings,
    #[serde(default)]
    pub rules: Rules,
}

impl RosterConfig {
    /// Applies the options of the command line that are not file paths.
    pub fn with_args(mut self, args: &Args) -> RosterConfig {
        if let Some(p) = &args.input_type {
            self.source.provider = Some(p.clone());
        }
        if let Some(w) = &args.excel_worksheet_name {
            self.source.excel_worksheet_name = Some(w.clone());
        }
        if let Some(y) = args.reference_year {
            self.campaign.reference_year = Some(y);
        }
        self
    }

    pub fn settings(&self) -> RosterResult<RosterSettings> {
        let mut rules = RosterRules::default();
        if let Some(y) = self.campaign.reference_year {
            rules.reference_year = y;
        }
        if let Some(m) = &self.rules.attendance_markers {
            rules.attendance_markers = m.iter().map(|s| s.trim().to_uppercase()).collect();
        }
        if let Some(s) = &self.rules.honorific_suffixes {
            rules.honorific_suffixes = s.clone();
        }
        if let Some(n) = self.rules.top_congregations {
            rules.top_affiliations = n;
        }
        if let Some(n) = self.rules.max_participation_days {
            rules.max_attendance_count = n;
        }
        if let Some(r) = &self.rules.regions {
            rules.regions = r.clone();
        }
        Ok(RosterSettings {
            layout: self.source.layout()?,
            window: self.campaign.window()?,
            rules,
        })
    }

    fn output_path(&self, file: &Option<String>) -> Option<String> {
        let file = file.as_ref()?;
        if file == "stdout" {
            return Some(file.clone());
        }
        match &self.output_settings.output_directory {
            Some(dir) => Some(Path::new(dir).join(file).to_string_lossy().to_string()),
            None => Some(file.clone()),
        }
    }

    pub fn export_path(&self) -> Option<String> {
        self.output_path(&self.output_settings.export_file)
    }

    pub fn summary_path(&self) -> Option<String> {
        self.output_path(&self.output_settings.summary_file)
    }
}

pub fn read_config(path: &str) -> RosterResult<RosterConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: RosterConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

// Numbers start at 1, as in the spreadsheet world. Letters are spreadsheet columns.
fn read_js_index(x: &Option<JSValue>) -> RosterResult<Option<usize>> {
    let index = match x {
        None | Some(JSValue::Null) => return Ok(None),
        Some(JSValue::Number(n)) => n.as_u64().map(|n| n as usize),
        Some(JSValue::String(s)) if s.chars().all(|c| c.is_ascii_alphabetic()) => {
            column_index_from_letters(s).map(|i| i + 1)
        }
        Some(JSValue::String(s)) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    match index {
        Some(i) if i > 0 => Ok(Some(i - 1)),
        _ => ParsingColumnIndexSnafu {
            value: format!("{:?}", x),
        }
        .fail(),
    }
}
