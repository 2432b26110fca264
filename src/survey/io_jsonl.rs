// Response sheets stored as one JSON object per line.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};
use survey_flow::{ResponseRecord, ResponseSink, SinkError, SurveyRules};

use crate::survey::io_common::{needs_line_break, ExpertLabels, StoredRow};
use crate::survey::*;

/// One line of the sheet. Every field is optional when reading, so that a
/// damaged line is reported by the audit instead of stopping it.
#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct StoredResponse {
    pub subject: Option<u64>,
    pub expert: Option<String>,
    #[serde(default)]
    pub rankings: Vec<Option<u32>>,
    #[serde(default)]
    pub ratings: Vec<Option<u32>>,
}

impl StoredResponse {
    fn from_record(record: &ResponseRecord, labels: &ExpertLabels) -> StoredResponse {
        StoredResponse {
            subject: Some(record.subject_id),
            expert: Some(labels.format(record.is_expert)),
            rankings: record.rankings.iter().map(|r| Some(*r)).collect(),
            ratings: record.ratings.iter().map(|r| Some(*r)).collect(),
        }
    }

    fn to_row(&self, lineno: usize, rules: &SurveyRules, labels: &ExpertLabels) -> StoredRow {
        let expert_raw = self.expert.clone().unwrap_or_default();
        let padded = |values: &[Option<u32>], len: u32| -> Vec<Option<u32>> {
            (0..len as usize)
                .map(|i| values.get(i).cloned().flatten())
                .collect()
        };
        StoredRow {
            lineno,
            subject_id: self.subject,
            expert: labels.parse(&expert_raw),
            expert_raw,
            rankings: padded(&self.rankings, rules.num_ranked_items),
            ratings: padded(&self.ratings, rules.num_ratings),
        }
    }
}

#[derive(Debug, Clone)]
pub struct JsonLinesSheet {
    path: String,
    labels: ExpertLabels,
}

impl JsonLinesSheet {
    pub fn new(path: String, labels: ExpertLabels) -> JsonLinesSheet {
        JsonLinesSheet { path, labels }
    }

    fn count_lines(&self) -> SurveyResult<usize> {
        if !Path::new(&self.path).exists() {
            return Ok(0);
        }
        let contents = fs::read_to_string(&self.path).context(OpeningSheetSnafu {
            path: self.path.clone(),
        })?;
        Ok(contents.lines().filter(|l| !l.trim().is_empty()).count())
    }

    fn append_record(&self, record: &ResponseRecord) -> SurveyResult<()> {
        let line = serde_json::to_string(&StoredResponse::from_record(record, &self.labels))
            .context(ParsingJsonSnafu {})?;
        let path_ctx = || OpeningSheetSnafu {
            path: self.path.clone(),
        };
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)
            .context(path_ctx())?;
        if needs_line_break(&mut file).context(path_ctx())? {
            debug!("append_record: closing the last line of {}", self.path);
            file.write_all(b"\n").context(path_ctx())?;
        }
        writeln!(file, "{}", line).context(path_ctx())?;
        debug!("append_record: {} -> {}", line, self.path);
        Ok(())
    }
}

impl ResponseSink for JsonLinesSheet {
    fn record_count(&mut self) -> Result<usize, SinkError> {
        Ok(self.count_lines()?)
    }

    fn append(&mut self, record: ResponseRecord) -> Result<(), SinkError> {
        Ok(self.append_record(&record)?)
    }
}

pub fn read_jsonl_sheet(
    path: &str,
    rules: &SurveyRules,
    labels: &ExpertLabels,
) -> SurveyResult<Vec<StoredRow>> {
    let contents = fs::read_to_string(path).context(OpeningSheetSnafu { path })?;
    let mut res = Vec::new();
    for (idx, line) in contents.lines().enumerate() {
        let lineno = idx + 1;
        if line.trim().is_empty() {
            continue;
        }
        let stored: StoredResponse =
            serde_json::from_str(line).context(ParsingJsonLineSnafu { lineno })?;
        res.push(stored.to_row(lineno, rules, labels));
    }
    debug!("read_jsonl_sheet: {} rows in {}", res.len(), path);
    Ok(res)
}
