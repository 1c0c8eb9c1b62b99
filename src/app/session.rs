// BirthWindow - app/session.rs
//
// The step-by-step questionnaire session. Owns the timeline and the recorded
// answers, and threads every user decision through the core passes.
//
// Design principles:
// - One command is one atomic state transition. Every command validates
//   first and mutates last, so a rejected command leaves the session as it was.
// - Elimination passes run on a working copy of the timeline that replaces
//   the live one only on success. The pre-pass copy is kept so that stepping
//   back restores the timeline the user was answering against.
// - Reference data is shared read-only; coverage for the chosen Mars sign is
//   checked up front so no question step can hit a missing text later.

use crate::core::answers::{count_missing, AnswerBook, HousePairKey, SlotQuestionKey};
use crate::core::elimination;
use crate::core::export::{slot_rows, SlotRow};
use crate::core::model::{Answer, FinalEndpoint, HourLord, House, Sign, SlotSeed, TimeOfDay};
use crate::core::reference::ReferenceData;
use crate::core::results::{aggregate, ResultSet};
use crate::core::timeline::Timeline;
use crate::util::error::SessionError;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

// =============================================================================
// Steps
// =============================================================================

/// Questionnaire steps, in the order the user walks them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Step {
    MarsSelection,
    RangeSetup,
    HourLordEntry,
    AscendantQuestions,
    HourLordQuestions,
    HouseQuestions,
    Results,
}

impl Step {
    pub fn label(&self) -> &'static str {
        match self {
            Step::MarsSelection => "mars selection",
            Step::RangeSetup => "range setup",
            Step::HourLordEntry => "hour lord entry",
            Step::AscendantQuestions => "ascendant questions",
            Step::HourLordQuestions => "hour lord questions",
            Step::HouseQuestions => "house questions",
            Step::Results => "results",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Question views
// =============================================================================

/// A Mars x Ascendant question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AscendantQuestion {
    pub ascendant: Sign,
    pub text: String,
    pub answer: Option<Answer>,
}

/// An Hour lord x Ascendant question for one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HourLordQuestion {
    pub key: SlotQuestionKey,
    pub hour_lord: HourLord,
    pub slot_start: TimeOfDay,
    pub text: String,
    pub answer: Option<Answer>,
}

/// A combined Saturn-Chiron question for every live slot sharing the pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairQuestion {
    pub saturn: House,
    pub chiron: House,
    pub saturn_text: String,
    pub chiron_text: String,
    /// Timeline indices of the slots this answer decides.
    pub slots: Vec<usize>,
    pub answer: Option<Answer>,
}

// =============================================================================
// Session
// =============================================================================

/// A single user's questionnaire session.
#[derive(Debug, Clone)]
pub struct Session {
    reference: Arc<ReferenceData>,
    step: Step,
    mars: Option<Sign>,
    timeline: Option<Timeline>,
    answers: AnswerBook,
    before_ascendant_pass: Option<Timeline>,
    before_pair_pass: Option<Timeline>,
}

impl Session {
    pub fn new(reference: Arc<ReferenceData>) -> Self {
        Self {
            reference,
            step: Step::MarsSelection,
            mars: None,
            timeline: None,
            answers: AnswerBook::new(),
            before_ascendant_pass: None,
            before_pair_pass: None,
        }
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn mars(&self) -> Option<Sign> {
        self.mars
    }

    pub fn timeline(&self) -> Option<&Timeline> {
        self.timeline.as_ref()
    }

    pub fn answers(&self) -> &AnswerBook {
        &self.answers
    }

    /// Flat export rows for every slot. Empty before the range is confirmed.
    pub fn export_rows(&self) -> Vec<SlotRow> {
        self.timeline.as_ref().map(slot_rows).unwrap_or_default()
    }

    // -------------------------------------------------------------------------
    // Setup
    // -------------------------------------------------------------------------

    /// Record the Mars sign. Fails if the reference data cannot serve every
    /// question reachable with it.
    pub fn select_mars(&mut self, mars: Sign) -> Result<(), SessionError> {
        self.expect_step(Step::MarsSelection)?;
        self.reference.check_coverage(mars)?;
        self.mars = Some(mars);
        self.advance(Step::RangeSetup);
        Ok(())
    }

    /// Declare the birth window, the first slot, and the window-end values.
    pub fn confirm_range(
        &mut self,
        window_start: TimeOfDay,
        window_end: TimeOfDay,
        first: SlotSeed,
        endpoint: FinalEndpoint,
    ) -> Result<(), SessionError> {
        self.expect_step(Step::RangeSetup)?;
        let mut timeline = Timeline::new(window_start, window_end)?;
        timeline.append_first_slot(window_start, first)?;
        timeline.set_endpoint(endpoint);
        self.timeline = Some(timeline);
        self.advance(Step::HourLordEntry);
        Ok(())
    }

    pub fn append_transition(&mut self, time: TimeOfDay, seed: SlotSeed) -> Result<(), SessionError> {
        self.expect_step(Step::HourLordEntry)?;
        self.timeline_mut()?.append_transition(time, seed)?;
        Ok(())
    }

    pub fn undo_last(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::HourLordEntry)?;
        self.timeline_mut()?.undo_last()?;
        Ok(())
    }

    /// Close the timeline at the window end and move on to questions.
    pub fn finish_timeline(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::HourLordEntry)?;
        self.timeline_mut()?.finalize()?;
        self.advance(Step::AscendantQuestions);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Ascendant questions
    // -------------------------------------------------------------------------

    /// One question per distinct ascendant across live slots, sorted by name.
    pub fn ascendant_questions(&self) -> Result<Vec<AscendantQuestion>, SessionError> {
        self.expect_step(Step::AscendantQuestions)?;
        let mars = self.mars_sign()?;
        elimination::ascendant_candidates(self.timeline_ref()?)
            .into_iter()
            .map(|ascendant| -> Result<AscendantQuestion, SessionError> {
                Ok(AscendantQuestion {
                    ascendant,
                    text: self.reference.mars_ascendant(mars, ascendant)?.to_string(),
                    answer: self.answers.ascendant.get(&ascendant).copied(),
                })
            })
            .collect()
    }

    pub fn answer_ascendant(&mut self, ascendant: Sign, answer: Answer) -> Result<(), SessionError> {
        self.expect_step(Step::AscendantQuestions)?;
        if !elimination::ascendant_candidates(self.timeline_ref()?).contains(&ascendant) {
            return Err(SessionError::UnknownQuestion {
                step: Step::AscendantQuestions.label(),
                key: ascendant.to_string(),
            });
        }
        tracing::debug!(ascendant = %ascendant, answer = %answer, "Ascendant answered");
        self.answers.ascendant.insert(ascendant, answer);
        Ok(())
    }

    /// Gate on completeness, then drop every ascendant answered No.
    pub fn submit_ascendant_answers(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::AscendantQuestions)?;
        self.ensure_complete()?;

        let mut working = self.timeline_ref()?.clone();
        elimination::apply_ascendant_answers(&mut working, &self.answers)?;
        self.before_ascendant_pass = self.timeline.replace(working);
        self.advance(Step::HourLordQuestions);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Hour lord x ascendant questions
    // -------------------------------------------------------------------------

    /// One question per live slot with ascendants left, in slot order.
    pub fn hour_lord_questions(&self) -> Result<Vec<HourLordQuestion>, SessionError> {
        self.expect_step(Step::HourLordQuestions)?;
        let timeline = self.timeline_ref()?;
        elimination::hour_lord_targets(timeline)
            .into_iter()
            .map(|target| -> Result<HourLordQuestion, SessionError> {
                let text = self
                    .reference
                    .hour_lord_ascendant(target.hour_lord, target.key.ascendant)?;
                Ok(HourLordQuestion {
                    key: target.key,
                    hour_lord: target.hour_lord,
                    slot_start: timeline.slots()[target.key.slot].start_time,
                    text: text.to_string(),
                    answer: self.answers.hour_lord.get(&target.key).copied(),
                })
            })
            .collect()
    }

    /// Answer the question posed for the slot at `slot` (timeline index).
    pub fn answer_hour_lord(&mut self, slot: usize, answer: Answer) -> Result<(), SessionError> {
        self.expect_step(Step::HourLordQuestions)?;
        let key = elimination::hour_lord_targets(self.timeline_ref()?)
            .into_iter()
            .map(|target| target.key)
            .find(|key| key.slot == slot)
            .ok_or_else(|| SessionError::UnknownQuestion {
                step: Step::HourLordQuestions.label(),
                key: format!("slot {slot}"),
            })?;
        tracing::debug!(slot, ascendant = %key.ascendant, answer = %answer, "Hour lord answered");
        self.answers.hour_lord.insert(key, answer);
        Ok(())
    }

    /// Gate on completeness. These answers never change the timeline.
    pub fn submit_hour_lord_answers(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::HourLordQuestions)?;
        self.ensure_complete()?;
        self.advance(Step::HouseQuestions);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Saturn-Chiron questions
    // -------------------------------------------------------------------------

    /// One question per distinct starting pair, in order of first appearance.
    pub fn pair_questions(&self) -> Result<Vec<PairQuestion>, SessionError> {
        self.expect_step(Step::HouseQuestions)?;
        elimination::pair_groups(self.timeline_ref()?)
            .into_iter()
            .map(|group| -> Result<PairQuestion, SessionError> {
                let (saturn, chiron) = group.pair;
                Ok(PairQuestion {
                    saturn,
                    chiron,
                    saturn_text: self.reference.saturn_house(saturn)?.to_string(),
                    chiron_text: self.reference.chiron_house(chiron)?.to_string(),
                    slots: group.slots,
                    answer: self.answers.pair.get(&group.pair).copied(),
                })
            })
            .collect()
    }

    pub fn answer_pair(&mut self, saturn: House, chiron: House, answer: Answer) -> Result<(), SessionError> {
        self.expect_step(Step::HouseQuestions)?;
        let pair = (saturn, chiron);
        if !elimination::pair_groups(self.timeline_ref()?)
            .iter()
            .any(|group| group.pair == pair)
        {
            return Err(SessionError::UnknownQuestion {
                step: Step::HouseQuestions.label(),
                key: format!("{saturn}/{chiron}"),
            });
        }
        tracing::debug!(saturn = %saturn, chiron = %chiron, answer = %answer, "Pair answered");
        self.answers.pair.insert(pair, answer);
        Ok(())
    }

    /// Gate on completeness, then kill every slot whose pair was answered No.
    pub fn submit_pair_answers(&mut self) -> Result<(), SessionError> {
        self.expect_step(Step::HouseQuestions)?;
        self.ensure_complete()?;

        let mut working = self.timeline_ref()?.clone();
        elimination::apply_pair_answers(&mut working, &self.answers.pair)?;
        self.before_pair_pass = self.timeline.replace(working);
        self.advance(Step::Results);
        Ok(())
    }

    // -------------------------------------------------------------------------
    // Results and navigation
    // -------------------------------------------------------------------------

    /// Questions of the current question step that have no answer yet.
    ///
    /// Only the three question steps ask anything; any other step is an
    /// `InvalidState`.
    pub fn missing_answers(&self) -> Result<usize, SessionError> {
        match self.step {
            Step::AscendantQuestions => {
                let required = elimination::ascendant_candidates(self.timeline_ref()?);
                Ok(count_missing(&required, &self.answers.ascendant))
            }
            Step::HourLordQuestions => {
                let required: Vec<SlotQuestionKey> =
                    elimination::hour_lord_targets(self.timeline_ref()?)
                        .into_iter()
                        .map(|target| target.key)
                        .collect();
                Ok(count_missing(&required, &self.answers.hour_lord))
            }
            Step::HouseQuestions => {
                let required: Vec<HousePairKey> = elimination::pair_groups(self.timeline_ref()?)
                    .into_iter()
                    .map(|group| group.pair)
                    .collect();
                Ok(count_missing(&required, &self.answers.pair))
            }
            _ => Err(SessionError::InvalidState {
                reason: "the current step asks no questions",
            }),
        }
    }

    pub fn results(&self) -> Result<ResultSet, SessionError> {
        self.expect_step(Step::Results)?;
        Ok(aggregate(self.timeline_ref()?, &self.answers))
    }

    /// Step back once.
    ///
    /// Leaving a question step backwards discards that step's answers. Leaving
    /// a step that followed an elimination pass restores the timeline as it
    /// was before the pass.
    pub fn back(&mut self) -> Result<Step, SessionError> {
        let target = match self.step {
            Step::MarsSelection => {
                return Err(SessionError::InvalidState {
                    reason: "already at the first step",
                })
            }
            Step::RangeSetup => {
                self.mars = None;
                Step::MarsSelection
            }
            Step::HourLordEntry => {
                self.timeline = None;
                Step::RangeSetup
            }
            Step::AscendantQuestions => {
                self.timeline_mut()?.reopen()?;
                self.answers.ascendant.clear();
                Step::HourLordEntry
            }
            Step::HourLordQuestions => {
                let restored = self.before_ascendant_pass.take().ok_or(SessionError::InvalidState {
                    reason: "no timeline recorded before the ascendant pass",
                })?;
                self.timeline = Some(restored);
                self.answers.hour_lord.clear();
                Step::AscendantQuestions
            }
            Step::HouseQuestions => {
                self.answers.pair.clear();
                Step::HourLordQuestions
            }
            Step::Results => {
                let restored = self.before_pair_pass.take().ok_or(SessionError::InvalidState {
                    reason: "no timeline recorded before the pair pass",
                })?;
                self.timeline = Some(restored);
                Step::HouseQuestions
            }
        };
        tracing::info!(from = %self.step, to = %target, "Stepped back");
        self.step = target;
        Ok(target)
    }

    fn advance(&mut self, next: Step) {
        tracing::info!(from = %self.step, to = %next, "Step complete");
        self.step = next;
    }

    fn expect_step(&self, expected: Step) -> Result<(), SessionError> {
        if self.step == expected {
            Ok(())
        } else {
            Err(SessionError::WrongStep {
                expected: expected.label(),
                actual: self.step.label(),
            })
        }
    }

    fn ensure_complete(&self) -> Result<(), SessionError> {
        let missing = self.missing_answers()?;
        if missing > 0 {
            tracing::debug!(step = %self.step, missing, "Answers incomplete");
            return Err(SessionError::IncompleteAnswers {
                step: self.step.label(),
                missing,
            });
        }
        Ok(())
    }

    fn mars_sign(&self) -> Result<Sign, SessionError> {
        self.mars.ok_or(SessionError::InvalidState {
            reason: "no Mars sign selected",
        })
    }

    fn timeline_ref(&self) -> Result<&Timeline, SessionError> {
        self.timeline.as_ref().ok_or(SessionError::InvalidState {
            reason: "no birth window has been set up",
        })
    }

    fn timeline_mut(&mut self) -> Result<&mut Timeline, SessionError> {
        self.timeline.as_mut().ok_or(SessionError::InvalidState {
            reason: "no birth window has been set up",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::reference::full_reference;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn h(n: u8) -> House {
        House::new(n).unwrap()
    }

    fn seed(hour_lord: HourLord, ascendant: Sign, sat: u8, chi: u8) -> SlotSeed {
        SlotSeed {
            hour_lord,
            ascendant,
            saturn_house: h(sat),
            chiron_house: h(chi),
        }
    }

    fn endpoint() -> FinalEndpoint {
        FinalEndpoint {
            ascendant: Sign::Scorpio,
            saturn_house: h(3),
            chiron_house: h(1),
        }
    }

    /// Session at the ascendant step with slots
    /// 00:00 Saturn/Leo(5,3), 06:00 Jupiter/Virgo(5,3), 12:00 Mars/Libra(4,2).
    fn session_at_ascendants() -> Session {
        let mut session = Session::new(Arc::new(full_reference()));
        session.select_mars(Sign::Aries).unwrap();
        session
            .confirm_range(t(0, 0), t(23, 59), seed(HourLord::Saturn, Sign::Leo, 5, 3), endpoint())
            .unwrap();
        session
            .append_transition(t(6, 0), seed(HourLord::Jupiter, Sign::Virgo, 5, 3))
            .unwrap();
        session
            .append_transition(t(12, 0), seed(HourLord::Mars, Sign::Libra, 4, 2))
            .unwrap();
        session.finish_timeline().unwrap();
        session
    }

    #[test]
    fn test_missing_reference_blocks_mars_selection() {
        let mut reference = ReferenceData::default();
        reference.insert_mars_ascendant(Sign::Aries, Sign::Leo, "only one");
        let mut session = Session::new(Arc::new(reference));

        let result = session.select_mars(Sign::Aries);
        assert!(matches!(result, Err(SessionError::Reference(_))));
        assert_eq!(session.step(), Step::MarsSelection);
        assert_eq!(session.mars(), None);
    }

    #[test]
    fn test_command_in_wrong_step_is_rejected() {
        let mut session = Session::new(Arc::new(full_reference()));
        let result = session.append_transition(t(6, 0), seed(HourLord::Sun, Sign::Leo, 1, 1));
        assert!(matches!(
            result,
            Err(SessionError::WrongStep {
                expected: "hour lord entry",
                actual: "mars selection",
            })
        ));
    }

    #[test]
    fn test_rejected_transition_leaves_session_unchanged() {
        let mut session = Session::new(Arc::new(full_reference()));
        session.select_mars(Sign::Aries).unwrap();
        session
            .confirm_range(t(0, 0), t(23, 59), seed(HourLord::Saturn, Sign::Leo, 5, 3), endpoint())
            .unwrap();
        session
            .append_transition(t(8, 0), seed(HourLord::Jupiter, Sign::Virgo, 5, 3))
            .unwrap();
        let before = session.timeline().cloned();

        let result = session.append_transition(t(5, 0), seed(HourLord::Mars, Sign::Libra, 4, 2));
        assert!(matches!(result, Err(SessionError::Timeline(_))));
        assert_eq!(session.timeline().cloned(), before);
        assert_eq!(session.step(), Step::HourLordEntry);
    }

    #[test]
    fn test_ascendant_questions_gate_and_eliminate() {
        let mut session = session_at_ascendants();
        let questions = session.ascendant_questions().unwrap();
        let asked: Vec<Sign> = questions.iter().map(|q| q.ascendant).collect();
        assert_eq!(asked, vec![Sign::Leo, Sign::Libra, Sign::Virgo]);
        assert_eq!(questions[0].text, "Aries Mars, Leo rising");

        session.answer_ascendant(Sign::Virgo, Answer::No).unwrap();
        let result = session.submit_ascendant_answers();
        assert!(matches!(
            result,
            Err(SessionError::IncompleteAnswers { missing: 2, .. })
        ));
        assert_eq!(session.step(), Step::AscendantQuestions);

        assert!(matches!(
            session.answer_ascendant(Sign::Pisces, Answer::Yes),
            Err(SessionError::UnknownQuestion { .. })
        ));

        session.answer_ascendant(Sign::Leo, Answer::Yes).unwrap();
        session.answer_ascendant(Sign::Libra, Answer::Maybe).unwrap();
        session.submit_ascendant_answers().unwrap();
        assert_eq!(session.step(), Step::HourLordQuestions);

        let slots = session.timeline().unwrap().slots();
        assert_eq!(slots[0].ascendant_range.joined(), "Leo");
        assert_eq!(slots[1].ascendant_range.joined(), "Libra");
    }

    #[test]
    fn test_hour_lord_questions_do_not_mutate() {
        let mut session = session_at_ascendants();
        for sign in [Sign::Leo, Sign::Libra] {
            session.answer_ascendant(sign, Answer::Yes).unwrap();
        }
        session.answer_ascendant(Sign::Virgo, Answer::No).unwrap();
        session.submit_ascendant_answers().unwrap();

        let questions = session.hour_lord_questions().unwrap();
        assert_eq!(questions.len(), 3);
        assert_eq!(questions[1].hour_lord, HourLord::Jupiter);
        assert_eq!(questions[1].key.ascendant, Sign::Libra);
        assert_eq!(questions[1].slot_start, t(6, 0));
        assert_eq!(questions[1].text, "Jupiter hour, Libra rising");

        let before = session.timeline().cloned();
        for q in &questions {
            session.answer_hour_lord(q.key.slot, Answer::No).unwrap();
        }
        assert!(matches!(
            session.answer_hour_lord(7, Answer::Yes),
            Err(SessionError::UnknownQuestion { .. })
        ));
        session.submit_hour_lord_answers().unwrap();
        assert_eq!(session.timeline().cloned(), before);
        assert_eq!(session.step(), Step::HouseQuestions);
    }

    #[test]
    fn test_no_hour_lord_questions_advances_immediately() {
        let mut session = session_at_ascendants();
        for sign in [Sign::Leo, Sign::Libra, Sign::Virgo] {
            session.answer_ascendant(sign, Answer::No).unwrap();
        }
        session.submit_ascendant_answers().unwrap();

        assert!(session.hour_lord_questions().unwrap().is_empty());
        assert_eq!(session.missing_answers().unwrap(), 0);
        session.submit_hour_lord_answers().unwrap();
        assert_eq!(session.step(), Step::HouseQuestions);

        // Emptied slots stay alive and are still asked about their pair.
        let pairs = session.pair_questions().unwrap();
        let groups: Vec<((House, House), Vec<usize>)> = pairs
            .iter()
            .map(|q| ((q.saturn, q.chiron), q.slots.clone()))
            .collect();
        assert_eq!(
            groups,
            vec![((h(5), h(3)), vec![0, 1]), ((h(4), h(2)), vec![2])]
        );
        assert!(session
            .timeline()
            .unwrap()
            .slots()
            .iter()
            .all(|s| s.alive && s.ascendant_range.is_empty()));
    }

    #[test]
    fn test_missing_answers_tracks_each_question_step() {
        let mut session = Session::new(Arc::new(full_reference()));
        assert!(matches!(
            session.missing_answers(),
            Err(SessionError::InvalidState { .. })
        ));

        let mut session = session_at_ascendants();
        assert_eq!(session.missing_answers().unwrap(), 3);
        session.answer_ascendant(Sign::Virgo, Answer::No).unwrap();
        assert_eq!(session.missing_answers().unwrap(), 2);
        session.answer_ascendant(Sign::Leo, Answer::Yes).unwrap();
        session.answer_ascendant(Sign::Libra, Answer::Yes).unwrap();
        assert_eq!(session.missing_answers().unwrap(), 0);
        session.submit_ascendant_answers().unwrap();

        // One question per slot: Leo, Libra, Libra.
        assert_eq!(session.missing_answers().unwrap(), 3);
        session.answer_hour_lord(1, Answer::Maybe).unwrap();
        assert_eq!(session.missing_answers().unwrap(), 2);
        session.answer_hour_lord(0, Answer::Yes).unwrap();
        session.answer_hour_lord(2, Answer::No).unwrap();
        assert_eq!(session.missing_answers().unwrap(), 0);
        session.submit_hour_lord_answers().unwrap();

        assert_eq!(session.missing_answers().unwrap(), 2);
        session.answer_pair(h(4), h(2), Answer::Yes).unwrap();
        assert_eq!(session.missing_answers().unwrap(), 1);
        assert!(matches!(
            session.submit_pair_answers(),
            Err(SessionError::IncompleteAnswers {
                step: "house questions",
                missing: 1,
            })
        ));
        session.answer_pair(h(5), h(3), Answer::Maybe).unwrap();
        assert_eq!(session.missing_answers().unwrap(), 0);
        session.submit_pair_answers().unwrap();

        assert!(matches!(
            session.missing_answers(),
            Err(SessionError::InvalidState { .. })
        ));
    }

    #[test]
    fn test_full_walk_to_results() {
        let mut session = session_at_ascendants();
        for sign in [Sign::Leo, Sign::Libra, Sign::Virgo] {
            session.answer_ascendant(sign, Answer::Yes).unwrap();
        }
        session.submit_ascendant_answers().unwrap();
        for q in session.hour_lord_questions().unwrap() {
            session.answer_hour_lord(q.key.slot, Answer::Maybe).unwrap();
        }
        session.submit_hour_lord_answers().unwrap();

        let pairs = session.pair_questions().unwrap();
        assert_eq!(pairs.len(), 2);
        assert_eq!((pairs[0].saturn, pairs[0].chiron), (h(5), h(3)));
        assert_eq!(pairs[0].slots, vec![0, 1]);
        assert_eq!(pairs[0].saturn_text, "Saturn in house 5");
        assert_eq!(pairs[0].chiron_text, "Chiron in house 3");

        session.answer_pair(h(5), h(3), Answer::No).unwrap();
        assert!(matches!(
            session.submit_pair_answers(),
            Err(SessionError::IncompleteAnswers { missing: 1, .. })
        ));
        session.answer_pair(h(4), h(2), Answer::Yes).unwrap();
        session.submit_pair_answers().unwrap();

        let results = session.results().unwrap();
        assert_eq!(results.surviving.len(), 1);
        assert_eq!(results.surviving[0].start_time, "12:00");
        assert_eq!(results.likely_hour_lords, vec![HourLord::Mars]);
        assert_eq!(results.likely_ascendants, vec![Sign::Libra]);
        assert_eq!(results.final_pairs.len(), 1);

        // Export still lists dead slots.
        let rows = session.export_rows();
        assert_eq!(rows.len(), 3);
        assert!(!rows[0].alive);
    }

    #[test]
    fn test_back_restores_pre_pass_timeline() {
        let mut session = session_at_ascendants();
        let before_pass = session.timeline().cloned();
        for sign in [Sign::Leo, Sign::Libra] {
            session.answer_ascendant(sign, Answer::Yes).unwrap();
        }
        session.answer_ascendant(Sign::Virgo, Answer::No).unwrap();
        session.submit_ascendant_answers().unwrap();
        session.answer_hour_lord(0, Answer::Yes).unwrap();

        assert_eq!(session.back().unwrap(), Step::AscendantQuestions);
        assert_eq!(session.timeline().cloned(), before_pass);
        assert!(session.answers().hour_lord.is_empty());
        // Ascendant answers are kept for revision.
        assert_eq!(session.answers().ascendant.len(), 3);

        assert_eq!(session.back().unwrap(), Step::HourLordEntry);
        assert!(session.answers().ascendant.is_empty());
        assert!(!session.timeline().unwrap().is_closed());
        session.undo_last().unwrap();
        assert_eq!(session.timeline().unwrap().len(), 2);
    }

    #[test]
    fn test_back_from_results_revives_killed_slots() {
        let mut session = session_at_ascendants();
        for sign in [Sign::Leo, Sign::Libra, Sign::Virgo] {
            session.answer_ascendant(sign, Answer::Yes).unwrap();
        }
        session.submit_ascendant_answers().unwrap();
        for q in session.hour_lord_questions().unwrap() {
            session.answer_hour_lord(q.key.slot, Answer::Yes).unwrap();
        }
        session.submit_hour_lord_answers().unwrap();
        session.answer_pair(h(5), h(3), Answer::No).unwrap();
        session.answer_pair(h(4), h(2), Answer::No).unwrap();
        session.submit_pair_answers().unwrap();
        assert!(session.results().unwrap().is_empty());

        assert_eq!(session.back().unwrap(), Step::HouseQuestions);
        assert!(session.timeline().unwrap().slots().iter().all(|s| s.alive));
        assert_eq!(session.answers().pair.len(), 2);

        session.answer_pair(h(4), h(2), Answer::Yes).unwrap();
        session.submit_pair_answers().unwrap();
        assert_eq!(session.results().unwrap().surviving.len(), 1);
    }

    #[test]
    fn test_back_at_first_step_is_invalid() {
        let mut session = Session::new(Arc::new(full_reference()));
        assert!(matches!(
            session.back(),
            Err(SessionError::InvalidState { .. })
        ));
    }
}
