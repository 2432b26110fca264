// Primitives for reading and appending CSV response sheets.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use survey_flow::{ResponseRecord, ResponseSink, SinkError, SurveyRules};

use crate::survey::io_common::{
    header_row, is_blank, needs_line_break, parse_row, record_row, ExpertLabels, StoredRow,
};
use crate::survey::*;

/// A CSV file with a header row and one row per response.
///
/// The file is created on the first append. It is opened again for each
/// operation, so that rows added by other sessions in the meantime are
/// counted.
#[derive(Debug, Clone)]
pub struct CsvSheet {
    path: String,
    rules: SurveyRules,
    labels: ExpertLabels,
}

impl CsvSheet {
    pub fn new(path: String, rules: &SurveyRules, labels: ExpertLabels) -> CsvSheet {
        CsvSheet {
            path,
            rules: rules.clone(),
            labels,
        }
    }

    fn count_rows(&self) -> SurveyResult<usize> {
        if !Path::new(&self.path).exists() {
            return Ok(0);
        }
        let rows = read_csv_rows(&self.path)?;
        // The header is not a response.
        Ok(rows.len().saturating_sub(1))
    }

    fn append_record(&self, record: &ResponseRecord) -> SurveyResult<()> {
        let path_ctx = || OpeningSheetSnafu {
            path: self.path.clone(),
        };
        let mut file = OpenOptions::new()
            .read(true)
            .create(true)
            .append(true)
            .open(&self.path)
            .context(path_ctx())?;
        let is_new = file.metadata().context(path_ctx())?.len() == 0;
        // The sheet may have been edited by hand or exported without a final
        // line break.
        if needs_line_break(&mut file).context(path_ctx())? {
            debug!("append_record: closing the last line of {}", self.path);
            file.write_all(b"\n").context(path_ctx())?;
        }
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(file);
        if is_new {
            wtr.write_record(header_row(&self.rules))
                .context(CsvSheetSnafu {
                    path: self.path.clone(),
                })?;
        }
        wtr.write_record(record_row(record, &self.labels))
            .context(CsvSheetSnafu {
                path: self.path.clone(),
            })?;
        wtr.flush().context(path_ctx())?;
        debug!("append_record: {:?} -> {}", record, self.path);
        Ok(())
    }
}

impl ResponseSink for CsvSheet {
    fn record_count(&mut self) -> Result<usize, SinkError> {
        Ok(self.count_rows()?)
    }

    fn append(&mut self, record: ResponseRecord) -> Result<(), SinkError> {
        Ok(self.append_record(&record)?)
    }
}

/// All the non-blank rows of the file, header included, with their 1-based
/// line numbers.
fn read_csv_rows(path: &str) -> SurveyResult<Vec<(usize, Vec<String>)>> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .context(CsvSheetSnafu { path })?;
    let mut res = Vec::new();
    for (idx, line_r) in rdr.into_records().enumerate() {
        let lineno = idx + 1;
        let line = line_r.context(CsvSheetSnafu { path })?;
        let cells: Vec<String> = line.iter().map(|s| s.to_string()).collect();
        if is_blank(&cells) {
            debug!("read_csv_rows: skipping blank line {}", lineno);
            continue;
        }
        res.push((lineno, cells));
    }
    Ok(res)
}

pub fn read_csv_sheet(
    path: &str,
    rules: &SurveyRules,
    labels: &ExpertLabels,
) -> SurveyResult<Vec<StoredRow>> {
    let rows = read_csv_rows(path)?;
    let res: Vec<StoredRow> = rows
        .iter()
        .skip(1)
        .map(|(lineno, cells)| parse_row(*lineno, cells, rules, labels))
        .collect();
    debug!("read_csv_sheet: {} rows in {}", res.len(), path);
    Ok(res)
}
