// Sessions driven by a file of answers instead of the terminal.

use std::collections::VecDeque;
use std::fs;

use serde::{Deserialize, Serialize};

use crate::survey::renderer::*;
use crate::survey::*;

/// The answers of one respondent.
///
/// ```json
/// { "expert": true, "rankings": [5, 3, 1, 9, 2, 6, 4, 7, 12, 8, 10, 11], "ratings": [7, 10, 3] }
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScriptedAnswers {
    pub expert: bool,
    pub rankings: Vec<Option<u32>>,
    pub ratings: Vec<u32>,
}

/// Replays the answers page by page, as a respondent filling the form from
/// top to bottom would.
///
/// When the answers run out, the respondent leaves.
pub struct ScriptedRenderer {
    actions: VecDeque<UserAction>,
    rejected: Vec<String>,
}

impl ScriptedRenderer {
    pub fn new(answers: &ScriptedAnswers) -> ScriptedRenderer {
        let mut actions = VecDeque::new();
        actions.push_back(UserAction::SetExpert(answers.expert));
        actions.push_back(UserAction::Confirm);
        for (index, value) in answers.rankings.iter().enumerate() {
            actions.push_back(UserAction::SetRanking {
                index,
                value: *value,
            });
        }
        actions.push_back(UserAction::Confirm);
        for (index, value) in answers.ratings.iter().enumerate() {
            actions.push_back(UserAction::SetRating {
                index,
                value: *value,
            });
        }
        actions.push_back(UserAction::Confirm);
        ScriptedRenderer {
            actions,
            rejected: Vec::new(),
        }
    }

    pub fn from_path(path: &str) -> SurveyResult<ScriptedRenderer> {
        let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
        let answers: ScriptedAnswers =
            serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
        debug!("from_path: {:?}", answers);
        Ok(ScriptedRenderer::new(&answers))
    }

    /// The messages of the refused actions, in order.
    pub fn rejected(&self) -> &[String] {
        &self.rejected
    }
}

impl FormRenderer for ScriptedRenderer {
    fn render(&mut self, view: &PageView) -> SurveyResult<()> {
        if let PageView::Closing { outcome, .. } = view {
            info!("Scripted session finished: {:?}", outcome);
        }
        Ok(())
    }

    fn read_action(&mut self, _view: &PageView) -> SurveyResult<UserAction> {
        Ok(self.actions.pop_front().unwrap_or(UserAction::Quit))
    }

    fn reject(&mut self, message: &str) -> SurveyResult<()> {
        warn!("Scripted answer refused: {}", message);
        self.rejected.push(message.to_string());
        Ok(())
    }
}
