// Line-oriented rendering of the survey on a terminal.

use std::io::{BufRead, Write};

use crate::survey::renderer::*;
use crate::survey::*;

const RANKING_HELP: &str = "Type '<image> <rank>' (for example '3 12'), '<image> -' to clear a rank, 'next' to continue or 'quit'.";
const RATINGS_HELP: &str =
    "Type '<parameter> <rating>' (for example '2 7'), 'submit' to send your answers or 'quit'.";

pub struct TerminalRenderer<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> TerminalRenderer<R, W> {
    pub fn new(input: R, output: W) -> TerminalRenderer<R, W> {
        TerminalRenderer { input, output }
    }

    fn line(&mut self, s: &str) -> SurveyResult<()> {
        writeln!(self.output, "{}", s).context(TerminalSnafu {})
    }
}

impl<R: BufRead, W: Write> FormRenderer for TerminalRenderer<R, W> {
    fn render(&mut self, view: &PageView) -> SurveyResult<()> {
        self.line("")?;
        match view {
            PageView::Intro { settings, expert } => {
                self.line(&format!("=== {} ===", settings.heading))?;
                if let Some(sub) = &settings.subheading {
                    self.line(sub)?;
                }
                self.line("")?;
                self.line(&format!("## {}", settings.title))?;
                self.line(&settings.description)?;
                self.line("")?;
                let current = match expert {
                    Some(true) => settings.yes_label(),
                    Some(false) => settings.no_label(),
                    None => "-".to_string(),
                };
                self.line(&format!(
                    "{} [{}/{}] (current answer: {})",
                    settings.expert_question,
                    settings.yes_label(),
                    settings.no_label(),
                    current
                ))?;
                self.line("Answer the question, then type 'next' to continue.")?;
            }
            PageView::Ranking {
                settings,
                rankings,
                check,
            } => {
                self.line(&format!("## {}", settings.title))?;
                if let Some(prompt) = &settings.prompt {
                    self.line(prompt)?;
                }
                for (idx, item) in settings.items.iter().enumerate() {
                    match &item.image {
                        Some(image) => self.line(&format!("  {:>2}. {} ({})", idx + 1, item.label, image))?,
                        None => self.line(&format!("  {:>2}. {}", idx + 1, item.label))?,
                    }
                }
                self.line("")?;
                self.line("Current rankings:")?;
                for l in rankings_summary(settings, rankings) {
                    self.line(&format!("  {}", l))?;
                }
                match check {
                    RankingCheck::Ready => {}
                    RankingCheck::Incomplete { .. } => {
                        self.line(&settings.incomplete_message())?
                    }
                    RankingCheck::Duplicated { .. } | RankingCheck::OutOfRange { .. } => {
                        self.line(&settings.duplicate_message())?
                    }
                }
                self.line(RANKING_HELP)?;
            }
            PageView::Ratings {
                settings,
                ratings,
                check,
                scale,
            } => {
                self.line(&format!("## {}", settings.title))?;
                if let Some(desc) = &settings.description {
                    self.line(desc)?;
                }
                for (idx, (param, rating)) in
                    settings.parameters.iter().zip(ratings.iter()).enumerate()
                {
                    let current = rating.map(|r| r.to_string()).unwrap_or_else(|| "-".to_string());
                    self.line(&format!(
                        "  {}. {} [{}..{}]: {}",
                        idx + 1,
                        param.title,
                        scale.0,
                        scale.1,
                        current
                    ))?;
                    if let Some(desc) = &param.description {
                        self.line(&format!("     {}", desc))?;
                    }
                }
                if !check.is_ready() {
                    self.line(&settings.incomplete_message())?;
                }
                self.line(RATINGS_HELP)?;
            }
            PageView::Closing { settings, outcome } => {
                self.line(&format!("## {}", settings.title))?;
                match outcome {
                    Some(CommitOutcome::Saved { subject_id }) => {
                        if let Some(msg) = &settings.saved_message {
                            self.line(msg)?;
                        }
                        self.line(&format!("Subject number: {}", subject_id))?;
                    }
                    Some(CommitOutcome::Failed { message, .. }) => {
                        if let Some(msg) = &settings.failed_message {
                            self.line(msg)?;
                        }
                        self.line(&format!("Error: {}", message))?;
                    }
                    None => {}
                }
            }
        }
        self.output.flush().context(TerminalSnafu {})
    }

    fn read_action(&mut self, view: &PageView) -> SurveyResult<UserAction> {
        loop {
            write!(self.output, "> ").context(TerminalSnafu {})?;
            self.output.flush().context(TerminalSnafu {})?;
            let mut buf = String::new();
            let n = self.input.read_line(&mut buf).context(TerminalSnafu {})?;
            if n == 0 {
                debug!("read_action: end of input");
                return Ok(UserAction::Quit);
            }
            match parse_command(view, &buf) {
                Ok(action) => return Ok(action),
                Err(msg) => self.line(&msg)?,
            }
        }
    }

    fn reject(&mut self, message: &str) -> SurveyResult<()> {
        self.line(&format!("!! {}", message))
    }
}

/// Reads one command typed on the given page. Numbers typed by the
/// respondent are 1-based.
pub fn parse_command(view: &PageView, line: &str) -> Result<UserAction, String> {
    let cmd = line.trim();
    let lower = cmd.to_lowercase();
    match lower.as_str() {
        "next" | "submit" => return Ok(UserAction::Confirm),
        "quit" | "exit" => return Ok(UserAction::Quit),
        _ => {}
    }
    match view {
        PageView::Intro { settings, .. } => {
            if lower == "y" || lower == "yes" || lower == settings.yes_label().to_lowercase() {
                Ok(UserAction::SetExpert(true))
            } else if lower == "n" || lower == "no" || lower == settings.no_label().to_lowercase()
            {
                Ok(UserAction::SetExpert(false))
            } else {
                Err(format!(
                    "Answer {} or {}.",
                    settings.yes_label(),
                    settings.no_label()
                ))
            }
        }
        PageView::Ranking { .. } => {
            let (index, value) = parse_pair(cmd).ok_or_else(|| RANKING_HELP.to_string())?;
            let value = match value {
                "-" => None,
                v => Some(v.parse::<u32>().map_err(|_| RANKING_HELP.to_string())?),
            };
            Ok(UserAction::SetRanking { index, value })
        }
        PageView::Ratings { .. } => {
            let (index, value) = parse_pair(cmd).ok_or_else(|| RATINGS_HELP.to_string())?;
            let value = value.parse::<u32>().map_err(|_| RATINGS_HELP.to_string())?;
            Ok(UserAction::SetRating { index, value })
        }
        PageView::Closing { .. } => Ok(UserAction::Quit),
    }
}

// "<slot> <value>" with a 1-based slot.
fn parse_pair(cmd: &str) -> Option<(usize, &str)> {
    let mut parts = cmd.split_whitespace();
    let slot = parts.next()?.parse::<usize>().ok()?;
    let value = parts.next()?;
    if parts.next().is_some() || slot == 0 {
        return None;
    }
    Some((slot - 1, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session_on(page: Page) -> Session {
        let mut session = Session::new(&SurveyRules::DEFAULT_RULES).unwrap();
        if page == Page::Intro {
            return session;
        }
        record_expert_flag(&mut session, true).unwrap();
        advance(&mut session).unwrap();
        if page == Page::Ranking {
            return session;
        }
        for (i, r) in [5, 3, 1, 9, 2, 6, 4, 7, 12, 8, 10, 11].iter().enumerate() {
            update_ranking(&mut session, i, Some(*r)).unwrap();
        }
        advance(&mut session).unwrap();
        session
    }

    #[test]
    fn intro_commands() {
        let mut config = SurveyConfig::default();
        config.intro.expert_yes_label = Some("Sì".to_string());
        let session = session_on(Page::Intro);
        let view = page_view(&config, &session);
        assert_eq!(parse_command(&view, "sì\n"), Ok(UserAction::SetExpert(true)));
        assert_eq!(parse_command(&view, "N"), Ok(UserAction::SetExpert(false)));
        assert_eq!(parse_command(&view, " next "), Ok(UserAction::Confirm));
        assert!(parse_command(&view, "3 4").is_err());
    }

    #[test]
    fn ranking_commands() {
        let config = SurveyConfig::default();
        let session = session_on(Page::Ranking);
        let view = page_view(&config, &session);
        assert_eq!(
            parse_command(&view, "3 12"),
            Ok(UserAction::SetRanking {
                index: 2,
                value: Some(12)
            })
        );
        assert_eq!(
            parse_command(&view, "1 -"),
            Ok(UserAction::SetRanking {
                index: 0,
                value: None
            })
        );
        assert!(parse_command(&view, "0 4").is_err());
        assert!(parse_command(&view, "2 four").is_err());
        assert!(parse_command(&view, "2 4 5").is_err());
    }

    #[test]
    fn ratings_commands() {
        let config = SurveyConfig::default();
        let session = session_on(Page::Ratings);
        let view = page_view(&config, &session);
        assert_eq!(
            parse_command(&view, "2 7"),
            Ok(UserAction::SetRating { index: 1, value: 7 })
        );
        assert_eq!(parse_command(&view, "submit"), Ok(UserAction::Confirm));
        assert_eq!(parse_command(&view, "quit"), Ok(UserAction::Quit));
    }

    #[test]
    fn full_terminal_session() {
        let mut input = String::from("maybe\nyes\nnext\n");
        for (i, r) in [5, 3, 1, 9, 2, 6, 4, 7, 12, 8, 10, 11].iter().enumerate() {
            input.push_str(&format!("{} {}\n", i + 1, r));
        }
        input.push_str("next\n1 7\n2 10\n3 3\nsubmit\n");
        let mut output: Vec<u8> = Vec::new();
        let config = SurveyConfig::default();
        let mut session = Session::new(&SurveyRules::DEFAULT_RULES).unwrap();
        let mut sheet = MemorySheet::default();
        {
            let mut renderer = TerminalRenderer::new(input.as_bytes(), &mut output);
            let outcome = run_survey(&config, &mut session, &mut renderer, &mut sheet).unwrap();
            assert_eq!(outcome, Some(CommitOutcome::Saved { subject_id: 1 }));
        }
        assert_eq!(sheet.records.len(), 1);
        assert_eq!(sheet.records[0].ratings, vec![7, 10, 3]);
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("Answer Yes or No."));
        assert!(text.contains("Suture 12: Not yet ranked"));
        assert!(text.contains("Subject number: 1"));
    }

    #[test]
    fn end_of_input_leaves_the_survey() {
        let mut output: Vec<u8> = Vec::new();
        let config = SurveyConfig::default();
        let mut session = Session::new(&SurveyRules::DEFAULT_RULES).unwrap();
        let mut sheet = MemorySheet::default();
        let mut renderer = TerminalRenderer::new("yes\n".as_bytes(), &mut output);
        let outcome = run_survey(&config, &mut session, &mut renderer, &mut sheet).unwrap();
        assert_eq!(outcome, None);
        assert_eq!(session.expert(), Some(true));
        assert!(sheet.records.is_empty());
    }

    #[derive(Default)]
    struct MemorySheet {
        records: Vec<ResponseRecord>,
    }

    impl ResponseSink for MemorySheet {
        fn record_count(&mut self) -> Result<usize, SinkError> {
            Ok(self.records.len())
        }

        fn append(&mut self, record: ResponseRecord) -> Result<(), SinkError> {
            self.records.push(record);
            Ok(())
        }
    }
}
