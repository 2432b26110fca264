// Consistency checks on the rows already stored in a response sheet.

use std::collections::HashSet;

use serde::Serialize;
use survey_flow::{validate_rankings, validate_ratings, RankingCheck, RatingCheck, SurveyRules};

use crate::survey::io_common::StoredRow;

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct RowProblem {
    pub line: usize,
    pub subject: Option<u64>,
    pub problem: String,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct AuditReport {
    pub rows: usize,
    #[serde(rename = "validRows")]
    pub valid_rows: usize,
    pub problems: Vec<RowProblem>,
    /// The subject id the next completed session will get.
    #[serde(rename = "nextSubjectId")]
    pub next_subject_id: u64,
}

/// Checks each row as the session would have checked it, and the subject
/// ids against the position of the rows.
///
/// Subject ids are derived from a count, so sessions finishing at the same
/// time end up with the same id. These rows are reported here.
pub fn audit_rows(rows: &[StoredRow], rules: &SurveyRules) -> AuditReport {
    let mut problems: Vec<RowProblem> = Vec::new();
    let mut seen_ids: HashSet<u64> = HashSet::new();
    let mut valid_rows = 0;

    for (idx, row) in rows.iter().enumerate() {
        let row_problems = check_row(idx, row, rules, &mut seen_ids);
        if row_problems.is_empty() {
            valid_rows += 1;
        }
        problems.extend(row_problems.into_iter().map(|problem| RowProblem {
            line: row.lineno,
            subject: row.subject_id,
            problem,
        }));
    }

    AuditReport {
        rows: rows.len(),
        valid_rows,
        problems,
        next_subject_id: rows.len() as u64 + 1,
    }
}

fn check_row(
    idx: usize,
    row: &StoredRow,
    rules: &SurveyRules,
    seen_ids: &mut HashSet<u64>,
) -> Vec<String> {
    let mut res = Vec::new();
    match row.subject_id {
        None => res.push("missing subject id".to_string()),
        Some(id) => {
            if !seen_ids.insert(id) {
                res.push(format!("subject id {} is used more than once", id));
            }
            let expected = idx as u64 + 1;
            if id != expected {
                res.push(format!(
                    "subject id {} does not match its position (expected {})",
                    id, expected
                ));
            }
        }
    }

    if row.expert.is_none() {
        res.push(format!("unknown expert answer {:?}", row.expert_raw));
    }

    match validate_rankings(&row.rankings) {
        RankingCheck::Ready => {}
        RankingCheck::Incomplete { unranked } => res.push(format!(
            "no rank for items {:?}",
            unranked.iter().map(|i| i + 1).collect::<Vec<usize>>()
        )),
        RankingCheck::Duplicated { values } => {
            res.push(format!("ranks {:?} are used more than once", values))
        }
        RankingCheck::OutOfRange { values } => res.push(format!(
            "ranks {:?} are not between 1 and {}",
            values, rules.num_ranked_items
        )),
    }

    match validate_ratings(&row.ratings) {
        RatingCheck::Ready => {
            let outside: Vec<u32> = row
                .ratings
                .iter()
                .flatten()
                .filter(|r| **r < rules.rating_min || **r > rules.rating_max)
                .cloned()
                .collect();
            if !outside.is_empty() {
                res.push(format!(
                    "ratings {:?} are not between {} and {}",
                    outside, rules.rating_min, rules.rating_max
                ));
            }
        }
        RatingCheck::Incomplete { unrated } => res.push(format!(
            "no rating for parameters {:?}",
            unrated.iter().map(|i| i + 1).collect::<Vec<usize>>()
        )),
    }
    res
}
