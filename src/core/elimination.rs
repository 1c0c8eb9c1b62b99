// BirthWindow - core/elimination.rs
//
// The three answer-driven passes over a finalised timeline:
//   1. Ascendant pass: a No removes that sign from every live slot's range.
//   2. Hour lord x ascendant pass: selection only, never mutates.
//   3. Saturn-Chiron pair pass: a No kills every live slot starting on that pair.
// Core layer: pure logic, no I/O.
//
// The pair pass is the only place a slot's `alive` flag is ever cleared.

use crate::core::answers::{AnswerBook, HousePairKey, SlotQuestionKey};
use crate::core::model::{Answer, HourLord, Sign};
use crate::core::timeline::Timeline;
use crate::util::error::TimelineError;
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// Ascendant pass
// =============================================================================

/// Distinct ascendants across live slots, sorted by name.
pub fn ascendant_candidates(timeline: &Timeline) -> Vec<Sign> {
    let distinct: BTreeSet<Sign> = timeline
        .slots()
        .iter()
        .filter(|slot| slot.alive)
        .flat_map(|slot| slot.ascendant_range.iter())
        .collect();
    let mut signs: Vec<Sign> = distinct.into_iter().collect();
    signs.sort_by_key(|sign| sign.label());
    signs
}

/// Remove every ascendant answered No from every live slot.
///
/// Set difference, so re-running with the same answers changes nothing.
/// Slots whose range becomes empty stay in place and stay alive.
/// Returns the number of (slot, sign) removals made.
pub fn apply_ascendant_answers(
    timeline: &mut Timeline,
    answers: &AnswerBook,
) -> Result<usize, TimelineError> {
    timeline.ensure_closed()?;

    let rejected: Vec<Sign> = answers.rejected_ascendants().collect();

    let mut removed = 0;
    for slot in timeline.slots_mut().iter_mut().filter(|s| s.alive) {
        for &sign in &rejected {
            if slot.ascendant_range.remove(sign) {
                removed += 1;
            }
        }
    }

    tracing::info!(
        rejected = rejected.len(),
        removed,
        "Ascendant elimination applied"
    );
    Ok(removed)
}

// =============================================================================
// Hour lord x ascendant selection
// =============================================================================

/// One hour lord x ascendant question target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HourLordTarget {
    pub key: SlotQuestionKey,
    pub hour_lord: HourLord,
}

/// One target per live slot with a non-empty ascendant range, in slot order,
/// using the first remaining ascendant of that slot.
pub fn hour_lord_targets(timeline: &Timeline) -> Vec<HourLordTarget> {
    timeline
        .slots()
        .iter()
        .enumerate()
        .filter(|(_, slot)| slot.alive)
        .filter_map(|(index, slot)| {
            slot.ascendant_range.first().map(|ascendant| HourLordTarget {
                key: SlotQuestionKey {
                    slot: index,
                    ascendant,
                },
                hour_lord: slot.hour_lord,
            })
        })
        .collect()
}

// =============================================================================
// Saturn-Chiron pair pass
// =============================================================================

/// Live slots sharing one starting (Saturn, Chiron) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PairGroup {
    pub pair: HousePairKey,
    pub slots: Vec<usize>,
}

/// Live slots grouped by their starting pair, in order of first appearance.
pub fn pair_groups(timeline: &Timeline) -> Vec<PairGroup> {
    let mut groups: Vec<PairGroup> = Vec::new();
    for (index, slot) in timeline.slots().iter().enumerate() {
        if !slot.alive {
            continue;
        }
        let pair = slot.start_pair();
        match groups.iter_mut().find(|g| g.pair == pair) {
            Some(group) => group.slots.push(index),
            None => groups.push(PairGroup {
                pair,
                slots: vec![index],
            }),
        }
    }
    groups
}

/// Kill every live slot whose starting pair was answered No.
/// Returns the number of slots killed.
pub fn apply_pair_answers(
    timeline: &mut Timeline,
    answers: &BTreeMap<HousePairKey, Answer>,
) -> Result<usize, TimelineError> {
    timeline.ensure_closed()?;

    let mut killed = 0;
    for slot in timeline.slots_mut().iter_mut().filter(|s| s.alive) {
        if matches!(answers.get(&slot.start_pair()), Some(Answer::No)) {
            slot.alive = false;
            killed += 1;
            tracing::debug!(
                start = %slot.start_time,
                saturn = %slot.saturn_start,
                chiron = %slot.chiron_start,
                "Slot eliminated"
            );
        }
    }

    tracing::info!(killed, "Saturn-Chiron elimination applied");
    Ok(killed)
}
