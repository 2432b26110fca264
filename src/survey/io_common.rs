// Row layout shared by all the sheet providers.

use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};

use survey_flow::{ResponseRecord, SurveyRules};

/// How the expert answer is written in the sheet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExpertLabels {
    pub expert: String,
    pub non_expert: String,
}

impl ExpertLabels {
    pub fn format(&self, is_expert: bool) -> String {
        if is_expert {
            self.expert.clone()
        } else {
            self.non_expert.clone()
        }
    }

    /// Accepts the configured labels, ignoring case and surrounding spaces.
    pub fn parse(&self, s: &str) -> Option<bool> {
        let s = s.trim().to_lowercase();
        if s == self.expert.to_lowercase() {
            Some(true)
        } else if s == self.non_expert.to_lowercase() {
            Some(false)
        } else {
            None
        }
    }
}

pub fn header_row(rules: &SurveyRules) -> Vec<String> {
    let mut res = vec!["subject".to_string(), "expert".to_string()];
    res.extend((1..=rules.num_ranked_items).map(|i| format!("rank_{}", i)));
    res.extend((1..=rules.num_ratings).map(|i| format!("rating_{}", i)));
    res
}

pub fn record_row(record: &ResponseRecord, labels: &ExpertLabels) -> Vec<String> {
    let mut res = vec![record.subject_id.to_string(), labels.format(record.is_expert)];
    res.extend(record.rankings.iter().map(|r| r.to_string()));
    res.extend(record.ratings.iter().map(|r| r.to_string()));
    res
}

/// An empty cell is an unset value. Anything that is not a number is unset
/// too, the audit reports it.
pub fn parse_cell(s: &str) -> Option<u32> {
    s.trim().parse::<u32>().ok()
}

/// A row read back from a sheet. Nothing is checked yet.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct StoredRow {
    /// 1-based line in the file, header included.
    pub lineno: usize,
    pub subject_id: Option<u64>,
    pub expert: Option<bool>,
    pub expert_raw: String,
    pub rankings: Vec<Option<u32>>,
    pub ratings: Vec<Option<u32>>,
}

/// Builds a row from its cells, in the order of `header_row`. Missing cells
/// are unset, extra cells are dropped.
pub fn parse_row(
    lineno: usize,
    cells: &[String],
    rules: &SurveyRules,
    labels: &ExpertLabels,
) -> StoredRow {
    let cell = |idx: usize| cells.get(idx).map(|s| s.as_str()).unwrap_or("");
    let num_ranked = rules.num_ranked_items as usize;
    let num_ratings = rules.num_ratings as usize;
    StoredRow {
        lineno,
        subject_id: cell(0).trim().parse::<u64>().ok(),
        expert: labels.parse(cell(1)),
        expert_raw: cell(1).to_string(),
        rankings: (0..num_ranked).map(|i| parse_cell(cell(2 + i))).collect(),
        ratings: (0..num_ratings)
            .map(|i| parse_cell(cell(2 + num_ranked + i)))
            .collect(),
    }
}

pub fn is_blank(cells: &[String]) -> bool {
    cells.iter().all(|c| c.trim().is_empty())
}

/// True when the file has content and its last byte is not a line break.
/// A row appended to such a file would continue its last line.
pub fn needs_line_break(file: &mut File) -> io::Result<bool> {
    if file.metadata()?.len() == 0 {
        return Ok(false);
    }
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] != b'\n')
}
