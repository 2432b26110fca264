/*!

# Quick start

This example runs one respondent through the whole survey with the default
rules (12 ranked items, 3 ratings from 1 to 10) and an in-memory sink.

A sink only needs to count the responses already stored and to append a new
one. The subject id of the new response is derived from that count.

```
use survey_flow::*;

#[derive(Default)]
struct Sheet {
    rows: Vec<ResponseRecord>,
}

impl ResponseSink for Sheet {
    fn record_count(&mut self) -> Result<usize, SinkError> {
        Ok(self.rows.len())
    }

    fn append(&mut self, record: ResponseRecord) -> Result<(), SinkError> {
        self.rows.push(record);
        Ok(())
    }
}

let mut sheet = Sheet::default();
let mut session = Session::new(&SurveyRules::DEFAULT_RULES)?;

// Intro page: the expert question must be answered.
record_expert_flag(&mut session, true)?;
advance(&mut session)?;

// Ranking page: a duplicated rank blocks the advance.
let ranks = [5, 3, 1, 9, 2, 6, 4, 7, 12, 8, 10, 11];
for (idx, rank) in ranks.iter().enumerate() {
    update_ranking(&mut session, idx, Some(*rank))?;
}
update_ranking(&mut session, 0, Some(3))?;
assert_eq!(
    validate_rankings(session.rankings()),
    RankingCheck::Duplicated { values: vec![3] }
);
assert!(advance(&mut session).is_err());
assert_eq!(session.page(), Page::Ranking);

update_ranking(&mut session, 0, Some(5))?;
assert_eq!(advance(&mut session)?, Page::Ratings);

// Ratings page, then the terminal page.
for (idx, rating) in [7, 10, 3].iter().enumerate() {
    update_rating(&mut session, idx, *rating)?;
}
let outcome = finish(&mut session, &mut sheet)?;
assert_eq!(outcome, Some(CommitOutcome::Saved { subject_id: 1 }));

// Rendering the terminal page again does not store a second row.
assert_eq!(finish(&mut session, &mut sheet)?, None);
assert_eq!(sheet.rows.len(), 1);

# Ok::<(), FlowErrors>(())
```

The `suture_survey` program wraps this flow with a terminal front end and
spreadsheet-compatible sinks. See the [manual](../manual/index.html).

*/
