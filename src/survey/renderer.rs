// What is shown on each page, independently of how it is drawn.

use survey_flow::*;

use crate::survey::config_reader::*;
use crate::survey::SurveyResult;

/// The content of the current page.
#[derive(Debug, Clone)]
pub enum PageView<'a> {
    Intro {
        settings: &'a IntroSettings,
        expert: Option<bool>,
    },
    Ranking {
        settings: &'a RankingSettings,
        rankings: &'a [Option<u32>],
        check: RankingCheck,
    },
    Ratings {
        settings: &'a RatingSettings,
        ratings: &'a [Option<u32>],
        check: RatingCheck,
        scale: (u32, u32),
    },
    Closing {
        settings: &'a ClosingSettings,
        outcome: Option<&'a CommitOutcome>,
    },
}

/// One input of the respondent. Slot indexes are 0-based.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum UserAction {
    SetExpert(bool),
    SetRanking { index: usize, value: Option<u32> },
    SetRating { index: usize, value: u32 },
    /// Next page, or submit on the ratings page.
    Confirm,
    Quit,
}

/// Draws the pages and collects the actions of the respondent.
pub trait FormRenderer {
    fn render(&mut self, view: &PageView) -> SurveyResult<()>;

    /// Blocks until the respondent does something on the given page.
    fn read_action(&mut self, view: &PageView) -> SurveyResult<UserAction>;

    /// The last action was refused. The message is meant for the respondent.
    fn reject(&mut self, message: &str) -> SurveyResult<()>;
}

pub fn page_view<'a>(config: &'a SurveyConfig, session: &'a Session) -> PageView<'a> {
    match session.page() {
        Page::Intro => PageView::Intro {
            settings: &config.intro,
            expert: session.expert(),
        },
        Page::Ranking => PageView::Ranking {
            settings: &config.ranking,
            rankings: session.rankings(),
            check: validate_rankings(session.rankings()),
        },
        Page::Ratings => PageView::Ratings {
            settings: &config.ratings,
            ratings: session.ratings(),
            check: validate_ratings(session.ratings()),
            scale: (session.rules().rating_min, session.rules().rating_max),
        },
        Page::Done => PageView::Closing {
            settings: &config.closing,
            outcome: session.commit_outcome(),
        },
    }
}

/// Turns a refused operation into a message for the respondent.
pub fn guidance(config: &SurveyConfig, err: &FlowErrors) -> String {
    match err {
        FlowErrors::RankingsNotReady(RankingCheck::Incomplete { .. }) => {
            config.ranking.incomplete_message()
        }
        FlowErrors::RankingsNotReady(RankingCheck::Duplicated { .. })
        | FlowErrors::RankingsNotReady(RankingCheck::OutOfRange { .. }) => {
            config.ranking.duplicate_message()
        }
        FlowErrors::RatingsNotReady(_) => config.ratings.incomplete_message(),
        FlowErrors::MissingExpertFlag => {
            format!("Please answer first: {}", config.intro.expert_question)
        }
        FlowErrors::RankOutOfRange { max, .. } => {
            format!("Ranks go from 1 to {}.", max)
        }
        FlowErrors::RatingOutOfRange { min, max, .. } => {
            format!("Ratings go from {} to {}.", min, max)
        }
        FlowErrors::SlotOutOfBounds { len, .. } => {
            format!("Choose a number between 1 and {}.", len)
        }
        e => e.to_string(),
    }
}

/// One line per item: its label and its current rank, if any.
pub fn rankings_summary(settings: &RankingSettings, rankings: &[Option<u32>]) -> Vec<String> {
    let unranked = settings.unranked_label();
    settings
        .items
        .iter()
        .zip(rankings.iter())
        .map(|(item, rank)| match rank {
            Some(r) => format!("{}: {}", item.label, r),
            None => format!("{}: {}", item.label, unranked),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn views_follow_the_session() {
        let config = SurveyConfig::default();
        let mut session = Session::new(&SurveyRules::DEFAULT_RULES).unwrap();
        assert!(matches!(
            page_view(&config, &session),
            PageView::Intro { expert: None, .. }
        ));
        record_expert_flag(&mut session, false).unwrap();
        advance(&mut session).unwrap();
        match page_view(&config, &session) {
            PageView::Ranking {
                rankings, check, ..
            } => {
                assert_eq!(rankings.len(), 12);
                assert!(matches!(check, RankingCheck::Incomplete { .. }));
            }
            v => panic!("unexpected view {:?}", v),
        }
    }

    #[test]
    fn summary_lines() {
        let config = SurveyConfig::default();
        let mut rankings = vec![None; 12];
        rankings[1] = Some(4);
        let lines = rankings_summary(&config.ranking, &rankings);
        assert_eq!(lines.len(), 12);
        assert_eq!(lines[0], "Suture 1: Not yet ranked");
        assert_eq!(lines[1], "Suture 2: 4");
    }

    #[test]
    fn out_of_range_guidance() {
        let config = SurveyConfig::default();
        assert_eq!(
            guidance(&config, &FlowErrors::RankOutOfRange { value: 13, max: 12 }),
            "Ranks go from 1 to 12."
        );
        assert_eq!(
            guidance(
                &config,
                &FlowErrors::WrongPage {
                    expected: Page::Ratings,
                    actual: Page::Ranking
                }
            ),
            FlowErrors::WrongPage {
                expected: Page::Ratings,
                actual: Page::Ranking
            }
            .to_string()
        );
    }
}
