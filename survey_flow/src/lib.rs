/*!
Page flow and validation for a single-respondent survey.

A respondent goes through four pages: an intro page with the expert question,
a forced ranking of the items (each rank from 1 to N used exactly once), a set
of importance ratings, and a terminal page. Each page must validate before the
session moves forward, and reaching the terminal page hands exactly one
[`ResponseRecord`] to a [`ResponseSink`].

The session is a plain value owned by the caller and passed to every
operation. See the [`quick_start`] module for a complete example, and the
[`manual`] for the format of the stored responses.
*/

mod config;
pub mod manual;
pub mod quick_start;

use log::{debug, info, warn};

use std::collections::BTreeMap;

pub use crate::config::*;

/// Records the answer to the expert question.
///
/// Any answer is accepted. It may be changed until the respondent leaves the
/// intro page.
pub fn record_expert_flag(session: &mut Session, value: bool) -> Result<(), FlowErrors> {
    check_page(session, Page::Intro)?;
    debug!("record_expert_flag: {:?}", value);
    session.expert = Some(value);
    Ok(())
}

/// Sets the rank of one item, or clears it with `None`.
///
/// Uniqueness across the items is not checked here, see [`validate_rankings`].
pub fn update_ranking(
    session: &mut Session,
    index: usize,
    value: Option<u32>,
) -> Result<(), FlowErrors> {
    check_page(session, Page::Ranking)?;
    let len = session.rankings.len();
    if index >= len {
        return Err(FlowErrors::SlotOutOfBounds { index, len });
    }
    if let Some(v) = value {
        let max = session.rules.num_ranked_items;
        if v < 1 || v > max {
            return Err(FlowErrors::RankOutOfRange { value: v, max });
        }
    }
    debug!("update_ranking: slot {} -> {:?}", index, value);
    session.rankings[index] = value;
    Ok(())
}

/// Checks that the ranks form a permutation of 1..=N, N being the number of
/// slots.
///
/// Missing ranks are reported before duplicated ones, and duplicated ones
/// before values outside the range.
pub fn validate_rankings(rankings: &[Option<u32>]) -> RankingCheck {
    let unranked: Vec<usize> = rankings
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| if r.is_none() { Some(idx) } else { None })
        .collect();
    if !unranked.is_empty() {
        return RankingCheck::Incomplete { unranked };
    }

    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for r in rankings.iter().flatten() {
        *counts.entry(*r).or_insert(0) += 1;
    }

    let values: Vec<u32> = counts
        .iter()
        .filter(|(_, count)| **count > 1)
        .map(|(v, _)| *v)
        .collect();
    if !values.is_empty() {
        return RankingCheck::Duplicated { values };
    }

    let max = rankings.len() as u32;
    let values: Vec<u32> = counts
        .keys()
        .filter(|v| **v < 1 || **v > max)
        .cloned()
        .collect();
    if !values.is_empty() {
        return RankingCheck::OutOfRange { values };
    }
    RankingCheck::Ready
}

/// Sets the rating of one parameter. The value must be on the scale of the
/// survey.
pub fn update_rating(session: &mut Session, index: usize, value: u32) -> Result<(), FlowErrors> {
    check_page(session, Page::Ratings)?;
    let len = session.ratings.len();
    if index >= len {
        return Err(FlowErrors::SlotOutOfBounds { index, len });
    }
    let (min, max) = (session.rules.rating_min, session.rules.rating_max);
    if value < min || value > max {
        return Err(FlowErrors::RatingOutOfRange { value, min, max });
    }
    debug!("update_rating: slot {} -> {}", index, value);
    session.ratings[index] = Some(value);
    Ok(())
}

/// The ratings are ready when every parameter has one. The range is enforced
/// by [`update_rating`].
pub fn validate_ratings(ratings: &[Option<u32>]) -> RatingCheck {
    let unrated: Vec<usize> = ratings
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| if r.is_none() { Some(idx) } else { None })
        .collect();
    if unrated.is_empty() {
        RatingCheck::Ready
    } else {
        RatingCheck::Incomplete { unrated }
    }
}

/// Moves the session to the next page, if the current one validates.
///
/// When the advance is refused, the session is left unchanged. Advancing from
/// the ratings page finishes the session but does not commit it; use
/// [`finish`] to do both.
pub fn advance(session: &mut Session) -> Result<Page, FlowErrors> {
    let next = match session.state {
        FlowState::Intro => {
            if session.expert.is_none() {
                return Err(FlowErrors::MissingExpertFlag);
            }
            FlowState::Ranking
        }
        FlowState::Ranking => {
            let check = validate_rankings(&session.rankings);
            if !check.is_ready() {
                debug!("advance: rankings not ready: {:?}", check);
                return Err(FlowErrors::RankingsNotReady(check));
            }
            FlowState::Ratings
        }
        FlowState::Ratings => {
            let check = validate_ratings(&session.ratings);
            if !check.is_ready() {
                debug!("advance: ratings not ready: {:?}", check);
                return Err(FlowErrors::RatingsNotReady(check));
            }
            FlowState::Finished(CommitState::Pending)
        }
        FlowState::Finished(_) => {
            return Err(FlowErrors::WrongPage {
                expected: Page::Ratings,
                actual: Page::Done,
            });
        }
    };
    info!("Page {:?} -> {:?}", session.page(), next.page());
    session.state = next;
    Ok(session.page())
}

/// Finishes the survey and commits the response.
///
/// Calling it again on a finished session has no effect: the sink is only
/// ever called once. Returns the outcome of the commit when this call
/// performed it.
pub fn finish<S: ResponseSink + ?Sized>(
    session: &mut Session,
    sink: &mut S,
) -> Result<Option<CommitOutcome>, FlowErrors> {
    if session.is_finished() {
        debug!("finish: session already finished");
    } else {
        check_page(session, Page::Ratings)?;
        advance(session)?;
    }
    commit_once(session, sink)
}

/// Builds the response record and appends it to the sink, the first time the
/// session reaches the terminal page.
///
/// The session is marked as committed whatever the result of the sink: a
/// failed write is reported in the returned outcome but never retried.
/// Returns `None` when the commit already happened.
pub fn commit_once<S: ResponseSink + ?Sized>(
    session: &mut Session,
    sink: &mut S,
) -> Result<Option<CommitOutcome>, FlowErrors> {
    match &session.state {
        FlowState::Finished(CommitState::Pending) => {}
        FlowState::Finished(CommitState::Committed(outcome)) => {
            debug!("commit_once: already committed: {:?}", outcome);
            return Ok(None);
        }
        _ => {
            return Err(FlowErrors::WrongPage {
                expected: Page::Done,
                actual: session.page(),
            });
        }
    }

    let outcome = match sink.record_count() {
        Ok(count) => {
            let subject_id = count as u64 + 1;
            let record = build_record(session, subject_id)?;
            debug!("commit_once: record: {:?}", record);
            match sink.append(record) {
                Ok(()) => CommitOutcome::Saved { subject_id },
                Err(e) => CommitOutcome::Failed {
                    subject_id: Some(subject_id),
                    message: e.to_string(),
                },
            }
        }
        Err(e) => CommitOutcome::Failed {
            subject_id: None,
            message: e.to_string(),
        },
    };

    match &outcome {
        CommitOutcome::Saved { subject_id } => {
            info!("Saved the response of subject {}", subject_id)
        }
        CommitOutcome::Failed {
            subject_id,
            message,
        } => warn!(
            "Could not save the response (subject {:?}): {}",
            subject_id, message
        ),
    }
    session.state = FlowState::Finished(CommitState::Committed(outcome.clone()));
    Ok(Some(outcome))
}

fn build_record(session: &Session, subject_id: u64) -> Result<ResponseRecord, FlowErrors> {
    let is_expert = session.expert.ok_or(FlowErrors::MissingExpertFlag)?;
    let rankings: Vec<u32> = match session.rankings.iter().cloned().collect::<Option<Vec<u32>>>() {
        Some(r) => r,
        None => {
            return Err(FlowErrors::RankingsNotReady(validate_rankings(
                &session.rankings,
            )))
        }
    };
    let ratings: Vec<u32> = match session.ratings.iter().cloned().collect::<Option<Vec<u32>>>() {
        Some(r) => r,
        None => {
            return Err(FlowErrors::RatingsNotReady(validate_ratings(
                &session.ratings,
            )))
        }
    };
    Ok(ResponseRecord {
        subject_id,
        is_expert,
        rankings,
        ratings,
    })
}

fn check_page(session: &Session, expected: Page) -> Result<(), FlowErrors> {
    let actual = session.page();
    if actual == expected {
        Ok(())
    } else {
        Err(FlowErrors::WrongPage { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: [u32; 12] = [5, 3, 1, 9, 2, 6, 4, 7, 12, 8, 10, 11];

    /// Keeps the records in memory, and can be told to fail.
    #[derive(Default)]
    struct MemorySink {
        records: Vec<ResponseRecord>,
        prior: usize,
        appends: usize,
        fail_append: bool,
        fail_count: bool,
    }

    impl ResponseSink for MemorySink {
        fn record_count(&mut self) -> Result<usize, SinkError> {
            if self.fail_count {
                return Err("sheet unreachable".into());
            }
            Ok(self.prior + self.records.len())
        }

        fn append(&mut self, record: ResponseRecord) -> Result<(), SinkError> {
            self.appends += 1;
            if self.fail_append {
                return Err("quota exceeded".into());
            }
            self.records.push(record);
            Ok(())
        }
    }

    fn init() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn filled(values: &[u32]) -> Vec<Option<u32>> {
        values.iter().map(|v| Some(*v)).collect()
    }

    fn session_on_ranking() -> Session {
        let mut s = Session::new(&SurveyRules::DEFAULT_RULES).unwrap();
        record_expert_flag(&mut s, true).unwrap();
        advance(&mut s).unwrap();
        s
    }

    fn session_on_ratings() -> Session {
        let mut s = session_on_ranking();
        for (idx, v) in VALID.iter().enumerate() {
            update_ranking(&mut s, idx, Some(*v)).unwrap();
        }
        advance(&mut s).unwrap();
        s
    }

    fn finished_session() -> Session {
        let mut s = session_on_ratings();
        for (idx, v) in [7, 10, 3].iter().enumerate() {
            update_rating(&mut s, idx, *v).unwrap();
        }
        s
    }

    #[test]
    fn new_session_is_empty() {
        let s = Session::new(&SurveyRules::DEFAULT_RULES).unwrap();
        assert_eq!(s.page(), Page::Intro);
        assert_eq!(s.expert(), None);
        assert_eq!(s.rankings(), &[None::<u32>; 12]);
        assert_eq!(s.ratings(), &[None::<u32>; 3]);
        assert!(!s.is_finished());
        assert!(!s.is_committed());
    }

    #[test]
    fn invalid_rules() {
        let rules = SurveyRules {
            rating_min: 5,
            rating_max: 2,
            ..SurveyRules::DEFAULT_RULES
        };
        assert!(matches!(
            Session::new(&rules),
            Err(FlowErrors::InvalidRules(_))
        ));
        let rules = SurveyRules {
            num_ranked_items: 0,
            ..SurveyRules::DEFAULT_RULES
        };
        assert!(Session::new(&rules).is_err());
    }

    #[test]
    fn intro_requires_expert_flag() {
        init();
        let mut s = Session::new(&SurveyRules::DEFAULT_RULES).unwrap();
        assert_eq!(advance(&mut s), Err(FlowErrors::MissingExpertFlag));
        assert_eq!(s.page(), Page::Intro);
        record_expert_flag(&mut s, false).unwrap();
        assert_eq!(advance(&mut s), Ok(Page::Ranking));
        assert_eq!(s.expert(), Some(false));
    }

    #[test]
    fn valid_permutation_is_ready() {
        assert_eq!(validate_rankings(&filled(&VALID)), RankingCheck::Ready);
        let identity: Vec<u32> = (1..=12).collect();
        assert!(validate_rankings(&filled(&identity)).is_ready());
    }

    #[test]
    fn duplicate_and_gap_not_ready() {
        let r = filled(&[1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        assert_eq!(
            validate_rankings(&r),
            RankingCheck::Duplicated { values: vec![1] }
        );
    }

    #[test]
    fn every_single_slot_corruption_not_ready() {
        // Any change of one slot of a valid permutation creates a repeat
        // (or a gap, or an out of range value).
        for idx in 0..12 {
            for v in 0..=14 {
                if v == VALID[idx] {
                    continue;
                }
                let mut r = filled(&VALID);
                r[idx] = Some(v);
                assert!(!validate_rankings(&r).is_ready(), "{:?}", r);
            }
            let mut r = filled(&VALID);
            r[idx] = None;
            assert_eq!(
                validate_rankings(&r),
                RankingCheck::Incomplete { unranked: vec![idx] }
            );
        }
    }

    #[test]
    fn all_constant_rankings_not_ready() {
        for v in 1..=12 {
            let r = vec![Some(v); 12];
            assert_eq!(
                validate_rankings(&r),
                RankingCheck::Duplicated { values: vec![v] }
            );
        }
    }

    #[test]
    fn incomplete_reported_before_duplicates() {
        let mut r = filled(&[1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11]);
        r[4] = None;
        r[7] = None;
        assert_eq!(
            validate_rankings(&r),
            RankingCheck::Incomplete {
                unranked: vec![4, 7]
            }
        );
        assert_eq!(
            validate_rankings(&[None; 12]),
            RankingCheck::Incomplete {
                unranked: (0..12).collect()
            }
        );
    }

    #[test]
    fn out_of_range_distinct_values() {
        let r = filled(&[1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 13]);
        assert_eq!(
            validate_rankings(&r),
            RankingCheck::OutOfRange { values: vec![13] }
        );
        let r = filled(&[0, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
        assert_eq!(
            validate_rankings(&r),
            RankingCheck::OutOfRange { values: vec![0] }
        );
    }

    #[test]
    fn update_ranking_bounds() {
        let mut s = session_on_ranking();
        assert_eq!(
            update_ranking(&mut s, 12, Some(1)),
            Err(FlowErrors::SlotOutOfBounds { index: 12, len: 12 })
        );
        assert_eq!(
            update_ranking(&mut s, 0, Some(13)),
            Err(FlowErrors::RankOutOfRange { value: 13, max: 12 })
        );
        assert_eq!(
            update_ranking(&mut s, 0, Some(0)),
            Err(FlowErrors::RankOutOfRange { value: 0, max: 12 })
        );
        update_ranking(&mut s, 0, Some(4)).unwrap();
        update_ranking(&mut s, 1, Some(4)).unwrap();
        assert_eq!(s.rankings()[1], Some(4));
        update_ranking(&mut s, 1, None).unwrap();
        assert_eq!(s.rankings()[1], None);
    }

    #[test]
    fn advance_from_ranking_with_valid_permutation() {
        let mut s = session_on_ranking();
        for (idx, v) in VALID.iter().enumerate() {
            update_ranking(&mut s, idx, Some(*v)).unwrap();
        }
        assert!(validate_rankings(s.rankings()).is_ready());
        assert_eq!(advance(&mut s), Ok(Page::Ratings));
        assert_eq!(s.page(), Page::Ratings);
    }

    #[test]
    fn advance_from_ranking_with_duplicate_has_no_effect() {
        let mut s = session_on_ranking();
        for (idx, v) in [1, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11].iter().enumerate() {
            update_ranking(&mut s, idx, Some(*v)).unwrap();
        }
        let before = s.clone();
        assert_eq!(
            advance(&mut s),
            Err(FlowErrors::RankingsNotReady(RankingCheck::Duplicated {
                values: vec![1]
            }))
        );
        assert_eq!(s, before);
        assert_eq!(s.page(), Page::Ranking);
    }

    #[test]
    fn advance_from_ranking_follows_latest_rankings() {
        let mut s = session_on_ranking();
        for (idx, v) in VALID.iter().enumerate() {
            update_ranking(&mut s, idx, Some(*v)).unwrap();
        }
        // Was ready, then broken again before confirming.
        update_ranking(&mut s, 3, Some(5)).unwrap();
        assert!(advance(&mut s).is_err());
        update_ranking(&mut s, 3, Some(9)).unwrap();
        assert_eq!(advance(&mut s), Ok(Page::Ratings));
    }

    #[test]
    fn edits_refused_on_other_pages() {
        let mut s = session_on_ratings();
        assert_eq!(
            update_ranking(&mut s, 0, Some(1)),
            Err(FlowErrors::WrongPage {
                expected: Page::Ranking,
                actual: Page::Ratings
            })
        );
        assert!(record_expert_flag(&mut s, false).is_err());
        let mut s = session_on_ranking();
        assert!(update_rating(&mut s, 0, 5).is_err());
    }

    #[test]
    fn ratings_range_and_completeness() {
        let mut s = session_on_ratings();
        assert_eq!(
            update_rating(&mut s, 0, 11),
            Err(FlowErrors::RatingOutOfRange {
                value: 11,
                min: 1,
                max: 10
            })
        );
        assert!(update_rating(&mut s, 0, 0).is_err());
        assert!(update_rating(&mut s, 3, 5).is_err());
        update_rating(&mut s, 1, 10).unwrap();
        assert_eq!(
            validate_ratings(s.ratings()),
            RatingCheck::Incomplete {
                unrated: vec![0, 2]
            }
        );
        let mut sink = MemorySink::default();
        assert!(matches!(
            finish(&mut s, &mut sink),
            Err(FlowErrors::RatingsNotReady(_))
        ));
        assert_eq!(sink.appends, 0);
        assert_eq!(s.page(), Page::Ratings);
    }

    #[test]
    fn finish_commits_once() {
        init();
        let mut s = finished_session();
        assert!(validate_ratings(s.ratings()).is_ready());
        let mut sink = MemorySink::default();
        let outcome = finish(&mut s, &mut sink).unwrap();
        assert_eq!(outcome, Some(CommitOutcome::Saved { subject_id: 1 }));
        assert_eq!(s.page(), Page::Done);
        assert!(s.is_committed());
        assert_eq!(sink.appends, 1);
        assert_eq!(
            sink.records[0],
            ResponseRecord {
                subject_id: 1,
                is_expert: true,
                rankings: VALID.to_vec(),
                ratings: vec![7, 10, 3],
            }
        );

        // Rendering the terminal page again.
        assert_eq!(finish(&mut s, &mut sink), Ok(None));
        assert_eq!(commit_once(&mut s, &mut sink), Ok(None));
        assert_eq!(sink.appends, 1);
        assert_eq!(
            s.commit_outcome(),
            Some(&CommitOutcome::Saved { subject_id: 1 })
        );
    }

    #[test]
    fn commit_once_twice_appends_once() {
        let mut s = finished_session();
        advance(&mut s).unwrap();
        assert!(s.is_finished());
        assert!(!s.is_committed());
        let mut sink = MemorySink::default();
        assert!(commit_once(&mut s, &mut sink).unwrap().is_some());
        assert!(commit_once(&mut s, &mut sink).unwrap().is_none());
        assert_eq!(sink.appends, 1);
    }

    #[test]
    fn commit_before_done_refused() {
        let mut s = session_on_ratings();
        let mut sink = MemorySink::default();
        assert_eq!(
            commit_once(&mut s, &mut sink),
            Err(FlowErrors::WrongPage {
                expected: Page::Done,
                actual: Page::Ratings
            })
        );
        assert_eq!(sink.appends, 0);
        assert!(!s.is_committed());
    }

    #[test]
    fn subject_id_follows_prior_records() {
        let mut sink = MemorySink {
            prior: 41,
            ..MemorySink::default()
        };
        let mut s = finished_session();
        let outcome = finish(&mut s, &mut sink).unwrap();
        assert_eq!(outcome, Some(CommitOutcome::Saved { subject_id: 42 }));
        assert_eq!(sink.records[0].subject_id, 42);

        // The next session sees the new record.
        let mut s2 = finished_session();
        finish(&mut s2, &mut sink).unwrap();
        assert_eq!(sink.records[1].subject_id, 43);
    }

    #[test]
    fn failed_append_is_not_retried() {
        init();
        let mut sink = MemorySink {
            fail_append: true,
            ..MemorySink::default()
        };
        let mut s = finished_session();
        let outcome = finish(&mut s, &mut sink).unwrap();
        assert_eq!(
            outcome,
            Some(CommitOutcome::Failed {
                subject_id: Some(1),
                message: "quota exceeded".to_string()
            })
        );
        assert!(s.is_committed());
        assert_eq!(finish(&mut s, &mut sink), Ok(None));
        assert_eq!(sink.appends, 1);
    }

    #[test]
    fn failed_count_skips_append() {
        let mut sink = MemorySink {
            fail_count: true,
            ..MemorySink::default()
        };
        let mut s = finished_session();
        let outcome = finish(&mut s, &mut sink).unwrap().unwrap();
        assert!(!outcome.is_saved());
        assert_eq!(sink.appends, 0);
        assert!(s.is_committed());
        assert_eq!(s.commit_outcome().map(|o| o.is_saved()), Some(false));
    }

    #[test]
    fn smaller_survey() {
        let rules = SurveyRules {
            num_ranked_items: 3,
            num_ratings: 1,
            rating_min: 0,
            rating_max: 4,
        };
        let mut s = Session::new(&rules).unwrap();
        record_expert_flag(&mut s, false).unwrap();
        advance(&mut s).unwrap();
        assert!(update_ranking(&mut s, 0, Some(4)).is_err());
        update_ranking(&mut s, 0, Some(2)).unwrap();
        update_ranking(&mut s, 1, Some(3)).unwrap();
        update_ranking(&mut s, 2, Some(1)).unwrap();
        advance(&mut s).unwrap();
        update_rating(&mut s, 0, 0).unwrap();
        let mut sink = MemorySink::default();
        finish(&mut s, &mut sink).unwrap();
        assert_eq!(sink.records[0].rankings, vec![2, 3, 1]);
        assert_eq!(sink.records[0].ratings, vec![0]);
    }
}
