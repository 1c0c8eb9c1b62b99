// BirthWindow - app/script.rs
//
// Non-interactive session input. A TOML script carries everything a user
// would enter step by step: the Mars sign, the birth window, each hour-lord
// transition, and the answers to every question. Replaying a script drives
// a `Session` through exactly the commands an interactive front end would.
//
// Answer tables are keyed the way the questions are presented:
//   [answers.ascendant]  Leo = "Yes"
//   [answers.hour_lord]  "06:00" = "No"        (slot start time)
//   [answers.pair]       "5/3" = "Not Sure"    (Saturn house / Chiron house)
// `[answers] default` answers any question the tables leave out.

use crate::app::session::{Session, Step};
use crate::core::model::{Answer, FinalEndpoint, HourLord, House, Sign, SlotSeed, TimeOfDay};
use crate::util::constants;
use crate::util::error::{BirthWindowError, ScriptError, SessionError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

// =============================================================================
// Script document
// =============================================================================

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SessionScript {
    pub mars: Sign,
    pub window: WindowScript,
    #[serde(default, rename = "transition")]
    pub transitions: Vec<TransitionScript>,
    #[serde(default)]
    pub answers: AnswerScript,
}

/// `[window]`: the declared range, its first slot, and the window-end values.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowScript {
    #[serde(default = "default_window_start")]
    pub start: TimeOfDay,
    #[serde(default = "default_window_end")]
    pub end: TimeOfDay,
    pub first: SlotSeed,
    pub endpoint: FinalEndpoint,
}

fn default_window_start() -> TimeOfDay {
    let (hour, minute) = constants::DEFAULT_WINDOW_START;
    TimeOfDay::new(hour, minute).unwrap_or_default()
}

fn default_window_end() -> TimeOfDay {
    let (hour, minute) = constants::DEFAULT_WINDOW_END;
    TimeOfDay::new(hour, minute).unwrap_or_default()
}

/// One `[[transition]]` entry.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionScript {
    pub time: TimeOfDay,
    pub hour_lord: HourLord,
    pub ascendant: Sign,
    pub saturn_house: House,
    pub chiron_house: House,
}

impl TransitionScript {
    pub fn seed(&self) -> SlotSeed {
        SlotSeed {
            hour_lord: self.hour_lord,
            ascendant: self.ascendant,
            saturn_house: self.saturn_house,
            chiron_house: self.chiron_house,
        }
    }
}

/// `[answers]`. Values are answer words ("Yes", "No", "Maybe", "Not Sure").
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnswerScript {
    pub default: Option<String>,
    pub ascendant: BTreeMap<String, String>,
    pub hour_lord: BTreeMap<String, String>,
    pub pair: BTreeMap<String, String>,
}

/// A question as it was put to the session, with the answer given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnsweredQuestion {
    pub step: Step,
    pub subject: String,
    pub texts: Vec<String>,
    pub answer: Answer,
}

// =============================================================================
// Loading
// =============================================================================

pub fn load_script(path: &Path) -> Result<SessionScript, ScriptError> {
    let content = std::fs::read_to_string(path).map_err(|e| ScriptError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    parse_script(&content, path)
}

/// `source_path` is used for error messages only.
pub fn parse_script(content: &str, source_path: &Path) -> Result<SessionScript, ScriptError> {
    toml::from_str(content).map_err(|e| ScriptError::TomlParse {
        path: source_path.to_path_buf(),
        source: e,
    })
}

// =============================================================================
// Replay
// =============================================================================

/// Drive `session` from its first step through to results.
///
/// Explicit answers are applied first, and any key naming a question the
/// session does not ask is an error. The default answer then fills the gaps.
/// Returns every question asked, in the order asked.
pub fn replay(
    script: &SessionScript,
    session: &mut Session,
) -> Result<Vec<AnsweredQuestion>, BirthWindowError> {
    let default = script
        .answers
        .default
        .as_deref()
        .map(|value| parse_answer("answers", "default", value))
        .transpose()?;
    let mut transcript = Vec::new();

    session.select_mars(script.mars)?;
    let window = &script.window;
    session.confirm_range(window.start, window.end, window.first, window.endpoint)?;
    for transition in &script.transitions {
        session.append_transition(transition.time, transition.seed())?;
    }
    session.finish_timeline()?;
    tracing::info!(
        slots = script.transitions.len() + 1,
        "Timeline entered from script"
    );

    replay_ascendants(&script.answers, default, session, &mut transcript)?;
    replay_hour_lords(&script.answers, default, session, &mut transcript)?;
    replay_pairs(&script.answers, default, session, &mut transcript)?;

    tracing::info!(answered = transcript.len(), "Script replay complete");
    Ok(transcript)
}

fn replay_ascendants(
    answers: &AnswerScript,
    default: Option<Answer>,
    session: &mut Session,
    transcript: &mut Vec<AnsweredQuestion>,
) -> Result<(), BirthWindowError> {
    const SECTION: &str = "answers.ascendant";
    for (key, value) in &answers.ascendant {
        let sign: Sign = key.parse().map_err(|reason| ScriptError::InvalidKey {
            section: SECTION,
            key: key.clone(),
            reason,
        })?;
        session.answer_ascendant(sign, parse_answer(SECTION, key, value)?)?;
    }
    if let Some(answer) = default {
        for question in session.ascendant_questions()? {
            if question.answer.is_none() {
                session.answer_ascendant(question.ascendant, answer)?;
            }
        }
    }

    for question in session.ascendant_questions()? {
        if let Some(answer) = question.answer {
            transcript.push(AnsweredQuestion {
                step: Step::AscendantQuestions,
                subject: question.ascendant.to_string(),
                texts: vec![question.text],
                answer,
            });
        }
    }
    session.submit_ascendant_answers()?;
    Ok(())
}

fn replay_hour_lords(
    answers: &AnswerScript,
    default: Option<Answer>,
    session: &mut Session,
    transcript: &mut Vec<AnsweredQuestion>,
) -> Result<(), BirthWindowError> {
    const SECTION: &str = "answers.hour_lord";
    let questions = session.hour_lord_questions()?;
    for (key, value) in &answers.hour_lord {
        let start: TimeOfDay = key.parse().map_err(|reason| ScriptError::InvalidKey {
            section: SECTION,
            key: key.clone(),
            reason,
        })?;
        let slot = questions
            .iter()
            .find(|q| q.slot_start == start)
            .map(|q| q.key.slot)
            .ok_or_else(|| SessionError::UnknownQuestion {
                step: Step::HourLordQuestions.label(),
                key: key.clone(),
            })?;
        session.answer_hour_lord(slot, parse_answer(SECTION, key, value)?)?;
    }
    if let Some(answer) = default {
        for question in &questions {
            if !session.answers().hour_lord.contains_key(&question.key) {
                session.answer_hour_lord(question.key.slot, answer)?;
            }
        }
    }

    for question in session.hour_lord_questions()? {
        if let Some(answer) = question.answer {
            transcript.push(AnsweredQuestion {
                step: Step::HourLordQuestions,
                subject: format!(
                    "{} {} / {}",
                    question.slot_start, question.hour_lord, question.key.ascendant
                ),
                texts: vec![question.text],
                answer,
            });
        }
    }
    session.submit_hour_lord_answers()?;
    Ok(())
}

fn replay_pairs(
    answers: &AnswerScript,
    default: Option<Answer>,
    session: &mut Session,
    transcript: &mut Vec<AnsweredQuestion>,
) -> Result<(), BirthWindowError> {
    const SECTION: &str = "answers.pair";
    for (key, value) in &answers.pair {
        let (saturn, chiron) = parse_pair_key(key)?;
        session.answer_pair(saturn, chiron, parse_answer(SECTION, key, value)?)?;
    }
    if let Some(answer) = default {
        for question in session.pair_questions()? {
            if question.answer.is_none() {
                session.answer_pair(question.saturn, question.chiron, answer)?;
            }
        }
    }

    for question in session.pair_questions()? {
        if let Some(answer) = question.answer {
            transcript.push(AnsweredQuestion {
                step: Step::HouseQuestions,
                subject: format!("Saturn {} / Chiron {}", question.saturn, question.chiron),
                texts: vec![question.saturn_text, question.chiron_text],
                answer,
            });
        }
    }
    session.submit_pair_answers()?;
    Ok(())
}

fn parse_answer(section: &'static str, key: &str, value: &str) -> Result<Answer, ScriptError> {
    value.parse().map_err(|reason| ScriptError::InvalidKey {
        section,
        key: key.to_string(),
        reason,
    })
}

/// Parse a `"<saturn>/<chiron>"` pair key.
fn parse_pair_key(key: &str) -> Result<(House, House), ScriptError> {
    let invalid = |reason: String| ScriptError::InvalidKey {
        section: "answers.pair",
        key: key.to_string(),
        reason,
    };
    let (saturn, chiron) = key
        .split_once('/')
        .ok_or_else(|| invalid("expected \"<saturn house>/<chiron house>\"".to_string()))?;
    Ok((
        saturn.parse().map_err(invalid)?,
        chiron.parse().map_err(invalid)?,
    ))
}
