use crate::survey::io_common::ExpertLabels;
use crate::survey::*;

use serde::{Deserialize, Serialize};
use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct IntroSettings {
    pub heading: String,
    pub subheading: Option<String>,
    pub title: String,
    pub description: String,
    #[serde(rename = "expertQuestion")]
    pub expert_question: String,
    #[serde(rename = "expertYesLabel")]
    pub expert_yes_label: Option<String>,
    #[serde(rename = "expertNoLabel")]
    pub expert_no_label: Option<String>,
}

impl IntroSettings {
    pub fn yes_label(&self) -> String {
        self.expert_yes_label
            .clone()
            .unwrap_or_else(|| "Yes".to_string())
    }

    pub fn no_label(&self) -> String {
        self.expert_no_label
            .clone()
            .unwrap_or_else(|| "No".to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankedItem {
    pub label: String,
    pub image: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RankingSettings {
    pub title: String,
    pub prompt: Option<String>,
    pub items: Vec<RankedItem>,
    #[serde(rename = "unrankedLabel")]
    pub unranked_label: Option<String>,
    #[serde(rename = "incompleteMessage")]
    pub incomplete_message: Option<String>,
    #[serde(rename = "duplicateMessage")]
    pub duplicate_message: Option<String>,
}

impl RankingSettings {
    pub fn unranked_label(&self) -> String {
        self.unranked_label
            .clone()
            .unwrap_or_else(|| "Not yet ranked".to_string())
    }

    pub fn incomplete_message(&self) -> String {
        self.incomplete_message
            .clone()
            .unwrap_or_else(|| "Rank all the items before continuing.".to_string())
    }

    pub fn duplicate_message(&self) -> String {
        self.duplicate_message.clone().unwrap_or_else(|| {
            format!(
                "Each number from 1 to {} must be used exactly once!",
                self.items.len()
            )
        })
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RatedParameter {
    pub title: String,
    pub description: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RatingSettings {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "scaleMin")]
    pub scale_min: Option<u32>,
    #[serde(rename = "scaleMax")]
    pub scale_max: Option<u32>,
    pub parameters: Vec<RatedParameter>,
    #[serde(rename = "incompleteMessage")]
    pub incomplete_message: Option<String>,
}

impl RatingSettings {
    pub fn incomplete_message(&self) -> String {
        self.incomplete_message
            .clone()
            .unwrap_or_else(|| "Rate every parameter before sending.".to_string())
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ClosingSettings {
    pub title: String,
    #[serde(rename = "savedMessage")]
    pub saved_message: Option<String>,
    #[serde(rename = "failedMessage")]
    pub failed_message: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SheetSettings {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    /// Value written in the expert column. Defaults to the label of the answer.
    #[serde(rename = "expertValue")]
    pub expert_value: Option<String>,
    #[serde(rename = "nonExpertValue")]
    pub non_expert_value: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "surveyName")]
    pub survey_name: String,
    pub intro: IntroSettings,
    pub ranking: RankingSettings,
    pub ratings: RatingSettings,
    pub closing: ClosingSettings,
    #[serde(rename = "responseSheet")]
    pub response_sheet: SheetSettings,
}

impl Default for SurveyConfig {
    /// The suture complexity survey: 12 suture images, 3 parameters.
    fn default() -> Self {
        let items = (1..=12)
            .map(|i| RankedItem {
                label: format!("Suture {}", i),
                image: Some(format!("sutura_{}.jpg", i)),
            })
            .collect();
        let parameters = vec![
            RatedParameter {
                title: "Suture execution time".to_string(),
                description: Some("Total duration of the suturing procedure".to_string()),
            },
            RatedParameter {
                title: "Accuracy of the needle insertion point".to_string(),
                description: Some(
                    "Precision of the needle entry and exit points with respect to the ideal suture line"
                        .to_string(),
                ),
            },
            RatedParameter {
                title: "Errors, i.e. points where the needle did not pierce the skin".to_string(),
                description: Some(
                    "Penetration errors: number of incomplete attempts or stitches not performed correctly"
                        .to_string(),
                ),
            },
        ];
        SurveyConfig {
            survey_name: "Suture complexity".to_string(),
            intro: IntroSettings {
                heading: "How do surgeons learn?".to_string(),
                subheading: Some(
                    "Toward personalized robotic-assisted laparoscopy training based on high-density EEG"
                        .to_string(),
                ),
                title: "Suture complexity classification".to_string(),
                description: "This research project studies the brain activity of surgeons during \
                    robotic-assisted laparoscopy training, and how it reflects their level of expertise. \
                    You will be asked to rank 12 suture images by complexity, from 1 (simplest) to 12 \
                    (most complex), and then to rate how important three parameters are when evaluating \
                    a suture. The survey takes a few minutes and is anonymous."
                    .to_string(),
                expert_question: "Are you an expert surgeon with experience in robotic surgery?"
                    .to_string(),
                expert_yes_label: None,
                expert_no_label: None,
            },
            ranking: RankingSettings {
                title: "Suture complexity classification".to_string(),
                prompt: Some(
                    "Rank the complexity of each suture, from 1 (simplest) to 12 (most complex)."
                        .to_string(),
                ),
                items,
                unranked_label: None,
                incomplete_message: Some(
                    "Rank all the sutures before continuing.".to_string(),
                ),
                duplicate_message: None,
            },
            ratings: RatingSettings {
                title: "Evaluation of the parameters of a suture".to_string(),
                description: Some(
                    "How important is each of the following parameters when evaluating a suture? \
                    1 means not important at all, 10 means very important."
                        .to_string(),
                ),
                scale_min: Some(1),
                scale_max: Some(10),
                parameters,
                incomplete_message: None,
            },
            closing: ClosingSettings {
                title: "Thank you for completing the survey!".to_string(),
                saved_message: Some("Your answers have been saved.".to_string()),
                failed_message: Some(
                    "Your answers could not be saved. Please tell the study team.".to_string(),
                ),
            },
            response_sheet: SheetSettings {
                provider: "csv".to_string(),
                file_path: "responses.csv".to_string(),
                expert_value: None,
                non_expert_value: None,
            },
        }
    }
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Values written in the expert column of the sheet.
pub fn expert_labels(config: &SurveyConfig) -> ExpertLabels {
    ExpertLabels {
        expert: config
            .response_sheet
            .expert_value
            .clone()
            .unwrap_or_else(|| config.intro.yes_label()),
        non_expert: config
            .response_sheet
            .non_expert_value
            .clone()
            .unwrap_or_else(|| config.intro.no_label()),
    }
}

/// Derives the shape of the survey from its description.
pub fn validate_config(config: &SurveyConfig) -> SurveyResult<SurveyRules> {
    if config.ranking.items.is_empty() {
        whatever!("The ranking page has no items to rank");
    }
    if config.ratings.parameters.is_empty() {
        whatever!("The ratings page has no parameters to rate");
    }
    let labels = expert_labels(config);
    if labels.expert == labels.non_expert {
        whatever!(
            "The expert and non-expert answers are both written as {:?}",
            labels.expert
        );
    }
    let defaults = SurveyRules::DEFAULT_RULES;
    let rules = SurveyRules {
        num_ranked_items: config.ranking.items.len() as u32,
        num_ratings: config.ratings.parameters.len() as u32,
        rating_min: config.ratings.scale_min.unwrap_or(defaults.rating_min),
        rating_max: config.ratings.scale_max.unwrap_or(defaults.rating_max),
    };
    rules.check().context(FlowSnafu {})?;
    Ok(rules)
}
