// ********* Session data structures ***********

use std::error::Error;
use std::fmt::Display;

/// The pages of the survey, in the order in which they are presented.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Page {
    /// Consent text and the expert question.
    Intro,
    /// Forced ranking of the items.
    Ranking,
    /// Importance ratings of the parameters.
    Ratings,
    /// Terminal page. Nothing can be changed anymore.
    Done,
}

/// What happened when the completed response was handed to the sink.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CommitOutcome {
    Saved {
        subject_id: u64,
    },
    /// The sink refused the response. The subject id is missing when the
    /// existing records could not even be counted.
    Failed {
        subject_id: Option<u64>,
        message: String,
    },
}

impl CommitOutcome {
    pub fn is_saved(&self) -> bool {
        matches!(self, CommitOutcome::Saved { .. })
    }
}

/// Commit status of a finished session.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum CommitState {
    Pending,
    Committed(CommitOutcome),
}

/// Position of a session in the page flow.
///
/// The commit status is only carried by the terminal state: a session cannot
/// be saved before it is finished.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FlowState {
    Intro,
    Ranking,
    Ratings,
    Finished(CommitState),
}

impl FlowState {
    pub fn page(&self) -> Page {
        match self {
            FlowState::Intro => Page::Intro,
            FlowState::Ranking => Page::Ranking,
            FlowState::Ratings => Page::Ratings,
            FlowState::Finished(_) => Page::Done,
        }
    }
}

/// The answers of one respondent, and where they are in the survey.
///
/// A session is created empty at the start and only mutated through the
/// operations of this crate.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Session {
    pub(crate) rules: SurveyRules,
    pub(crate) state: FlowState,
    pub(crate) expert: Option<bool>,
    pub(crate) rankings: Vec<Option<u32>>,
    pub(crate) ratings: Vec<Option<u32>>,
}

impl Session {
    /// Starts an empty session on the intro page.
    pub fn new(rules: &SurveyRules) -> Result<Session, FlowErrors> {
        rules.check()?;
        Ok(Session {
            rules: rules.clone(),
            state: FlowState::Intro,
            expert: None,
            rankings: vec![None; rules.num_ranked_items as usize],
            ratings: vec![None; rules.num_ratings as usize],
        })
    }

    pub fn rules(&self) -> &SurveyRules {
        &self.rules
    }

    pub fn state(&self) -> &FlowState {
        &self.state
    }

    pub fn page(&self) -> Page {
        self.state.page()
    }

    pub fn expert(&self) -> Option<bool> {
        self.expert
    }

    pub fn rankings(&self) -> &[Option<u32>] {
        &self.rankings
    }

    pub fn ratings(&self) -> &[Option<u32>] {
        &self.ratings
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.state, FlowState::Finished(_))
    }

    /// True once the commit has been attempted, whatever its outcome. See
    /// [`CommitOutcome::is_saved`] for whether the sink accepted it.
    pub fn is_committed(&self) -> bool {
        matches!(self.state, FlowState::Finished(CommitState::Committed(_)))
    }

    /// The outcome of the commit, once it has been attempted.
    pub fn commit_outcome(&self) -> Option<&CommitOutcome> {
        match &self.state {
            FlowState::Finished(CommitState::Committed(outcome)) => Some(outcome),
            _ => None,
        }
    }
}

/// One completed response, as handed over to the sink.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ResponseRecord {
    /// Count of the records already stored, plus one.
    pub subject_id: u64,
    pub is_expert: bool,
    pub rankings: Vec<u32>,
    pub ratings: Vec<u32>,
}

// ******** Validation results *********

/// Readiness of the ranking page.
///
/// The not-ready states are distinct so that the renderer can explain what
/// is wrong.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RankingCheck {
    Ready,
    /// Some slots have no rank yet (0-based slot indexes).
    Incomplete { unranked: Vec<usize> },
    /// All slots are filled but some ranks are used more than once.
    Duplicated { values: Vec<u32> },
    /// All slots are filled with distinct ranks, but some are outside 1..=N.
    OutOfRange { values: Vec<u32> },
}

impl RankingCheck {
    pub fn is_ready(&self) -> bool {
        *self == RankingCheck::Ready
    }
}

/// Readiness of the ratings page.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RatingCheck {
    Ready,
    Incomplete { unrated: Vec<usize> },
}

impl RatingCheck {
    pub fn is_ready(&self) -> bool {
        *self == RatingCheck::Ready
    }
}

/// Operations refused by the page flow.
///
/// None of them is fatal: the session is left untouched and the respondent
/// can correct the input.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum FlowErrors {
    WrongPage { expected: Page, actual: Page },
    SlotOutOfBounds { index: usize, len: usize },
    RankOutOfRange { value: u32, max: u32 },
    RatingOutOfRange { value: u32, min: u32, max: u32 },
    MissingExpertFlag,
    RankingsNotReady(RankingCheck),
    RatingsNotReady(RatingCheck),
    InvalidRules(String),
}

impl Error for FlowErrors {}

impl Display for FlowErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FlowErrors::WrongPage { expected, actual } => write!(
                f,
                "operation only allowed on page {:?}, the session is on page {:?}",
                expected, actual
            ),
            FlowErrors::SlotOutOfBounds { index, len } => {
                write!(f, "slot {} does not exist (there are {} slots)", index, len)
            }
            FlowErrors::RankOutOfRange { value, max } => {
                write!(f, "rank {} is not between 1 and {}", value, max)
            }
            FlowErrors::RatingOutOfRange { value, min, max } => {
                write!(f, "rating {} is not between {} and {}", value, min, max)
            }
            FlowErrors::MissingExpertFlag => write!(f, "the expert question has no answer"),
            FlowErrors::RankingsNotReady(check) => write!(f, "rankings not ready: {:?}", check),
            FlowErrors::RatingsNotReady(check) => write!(f, "ratings not ready: {:?}", check),
            FlowErrors::InvalidRules(msg) => write!(f, "invalid survey rules: {}", msg),
        }
    }
}

// ********* Configuration **********

/// Shape of the survey: how many items are ranked, how many parameters are
/// rated and on which scale.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveyRules {
    /// The ranks go from 1 to this number, each used exactly once.
    pub num_ranked_items: u32,
    pub num_ratings: u32,
    pub rating_min: u32,
    pub rating_max: u32,
}

impl SurveyRules {
    /// 12 ranked images, 3 ratings from 1 to 10.
    pub const DEFAULT_RULES: SurveyRules = SurveyRules {
        num_ranked_items: 12,
        num_ratings: 3,
        rating_min: 1,
        rating_max: 10,
    };

    pub fn check(&self) -> Result<(), FlowErrors> {
        if self.num_ranked_items == 0 {
            return Err(FlowErrors::InvalidRules(
                "at least one item must be ranked".to_string(),
            ));
        }
        if self.num_ratings == 0 {
            return Err(FlowErrors::InvalidRules(
                "at least one parameter must be rated".to_string(),
            ));
        }
        if self.rating_min > self.rating_max {
            return Err(FlowErrors::InvalidRules(format!(
                "rating scale {}..{} is empty",
                self.rating_min, self.rating_max
            )));
        }
        Ok(())
    }
}

/// Any failure reported by a sink. Sinks usually wrap their own I/O errors.
pub type SinkError = Box<dyn Error>;

/// The durable store that receives one record per completed session.
pub trait ResponseSink {
    /// Number of responses already stored. The next subject id is derived
    /// from it.
    fn record_count(&mut self) -> Result<usize, SinkError>;

    /// Stores the record. On success the record is counted by the next call
    /// to `record_count`.
    fn append(&mut self, record: ResponseRecord) -> Result<(), SinkError>;
}
