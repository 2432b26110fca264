// Reading response sheets downloaded as Excel files.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use survey_flow::SurveyRules;

use crate::survey::io_common::{is_blank, parse_row, ExpertLabels, StoredRow};
use crate::survey::*;

pub fn read_excel_sheet(
    path: &str,
    worksheet_name_o: Option<String>,
    rules: &SurveyRules,
    labels: &ExpertLabels,
) -> SurveyResult<Vec<StoredRow>> {
    let wrange = get_range(path, worksheet_name_o)?;

    let header = wrange.rows().next().context(EmptyExcelSnafu {})?;
    debug!("read_excel_sheet: header: {:?}", header);

    let mut res: Vec<StoredRow> = Vec::new();
    // The header is on line 1.
    for (idx, row) in wrange.rows().enumerate().skip(1) {
        let lineno = idx + 1;
        let cells = row
            .iter()
            .map(|cell| read_cell(cell, lineno))
            .collect::<SurveyResult<Vec<String>>>()?;
        if is_blank(&cells) {
            continue;
        }
        debug!("read_excel_sheet: lineno: {:?} row: {:?}", lineno, &cells);
        res.push(parse_row(lineno, &cells, rules, labels));
    }
    Ok(res)
}

fn get_range(
    path: &str,
    worksheet_name_o: Option<String>,
) -> SurveyResult<calamine::Range<DataType>> {
    debug!(
        "read_excel_sheet: path: {:?} worksheet: {:?}",
        path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it. Otherwise the first one.
    let wrange = match worksheet_name_o {
        Some(worksheet_name) => workbook
            .worksheet_range(&worksheet_name)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?,
        None => workbook
            .worksheet_range_at(0)
            .context(EmptyExcelSnafu {})?
            .context(OpeningExcelSnafu { path })?,
    };
    Ok(wrange)
}

/// Spreadsheets store every number as a float.
fn read_cell(cell: &DataType, lineno: usize) -> SurveyResult<String> {
    match cell {
        DataType::String(s) => Ok(s.clone()),
        DataType::Int(i) => Ok(i.to_string()),
        DataType::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Ok(format!("{}", *f as u64)),
        DataType::Bool(b) => Ok(b.to_string()),
        DataType::Empty => Ok("".to_string()),
        _ => Err(SurveyError::ExcelWrongCellType {
            lineno,
            content: format!("{:?}", cell),
        }),
    }
}
