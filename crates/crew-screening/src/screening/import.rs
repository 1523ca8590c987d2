use super::domain::ContractRecord;
use chrono::{DateTime, NaiveDate};
use serde::Deserialize;
use std::fmt;
use std::io::Read;
use std::path::Path;
use tracing::warn;

#[derive(Debug)]
pub enum ContractImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl fmt::Display for ContractImportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractImportError::Io(err) => write!(f, "failed to read contract export: {}", err),
            ContractImportError::Csv(err) => write!(f, "failed to parse contract export: {}", err),
        }
    }
}

impl std::error::Error for ContractImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ContractImportError::Io(err) => Some(err),
            ContractImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ContractImportError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<csv::Error> for ContractImportError {
    fn from(value: csv::Error) -> Self {
        Self::Csv(value)
    }
}

#[derive(Debug, Deserialize)]
struct ContractRow {
    #[serde(alias = "Vessel Type")]
    vessel_type: String,
    #[serde(alias = "Rank")]
    rank_code: String,
    #[serde(alias = "Company")]
    company_name: String,
    #[serde(alias = "Sign On", deserialize_with = "empty_string_as_none", default)]
    start_date: Option<String>,
    #[serde(alias = "Sign Off", deserialize_with = "empty_string_as_none", default)]
    end_date: Option<String>,
}

impl ContractRow {
    fn into_record(self, line: usize) -> Option<ContractRecord> {
        let Some(start_date) = self.start_date.as_deref().and_then(parse_date) else {
            warn!(
                line,
                raw = self.start_date.as_deref().unwrap_or(""),
                "skipping contract row without a usable start date"
            );
            return None;
        };

        let end_date = match self.end_date.as_deref() {
            Some(raw) => {
                let parsed = parse_date(raw);
                if parsed.is_none() {
                    warn!(line, raw, "unparseable end date; treating contract as ongoing");
                }
                parsed
            }
            None => None,
        };

        Some(ContractRecord {
            vessel_type: self.vessel_type,
            rank_code: self.rank_code,
            company_name: self.company_name,
            start_date,
            end_date,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(dt.date_naive());
    }

    ["%Y-%m-%d", "%d.%m.%Y", "%d/%m/%Y"]
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
}

/// Reads a crewing-system contract export into [`ContractRecord`]s.
///
/// Rows without a parseable start date are dropped with a warning. An end date that is
/// blank or unparseable leaves the contract open-ended.
pub struct ContractHistoryImporter;

impl ContractHistoryImporter {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Vec<ContractRecord>, ContractImportError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Vec<ContractRecord>, ContractImportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut contracts = Vec::new();
        for (index, record) in csv_reader.deserialize::<ContractRow>().enumerate() {
            let row = record?;
            // Header is line 1.
            if let Some(contract) = row.into_record(index + 2) {
                contracts.push(contract);
            }
        }

        Ok(contracts)
    }
}
