// BirthWindow - core/results.rs
//
// Derived view over a fully-answered session: surviving slots, likely
// ascendants and hour lords, and the Saturn-Chiron combinations still in play.
// Core layer: pure logic, recomputed on demand, never stored.

use crate::core::answers::{AnswerBook, HousePairKey};
use crate::core::export::{slot_rows, SlotRow};
use crate::core::model::{HourLord, House, Sign};
use crate::core::timeline::Timeline;
use serde::Serialize;
use std::collections::BTreeSet;

/// A surviving Saturn-Chiron house combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HousePair {
    pub saturn: House,
    pub chiron: House,
}

/// Final aggregated output of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultSet {
    /// Slots still alive, in timeline order.
    pub surviving: Vec<SlotRow>,
    /// Union of surviving ascendant ranges, sorted by name.
    pub likely_ascendants: Vec<Sign>,
    /// Union of surviving hour lords, sorted by name.
    pub likely_hour_lords: Vec<HourLord>,
    /// Retained pairs found in surviving ranges, sorted numerically.
    pub final_pairs: Vec<HousePair>,
}

impl ResultSet {
    pub fn is_empty(&self) -> bool {
        self.surviving.is_empty()
    }
}

/// Aggregate the surviving state of `timeline` against recorded answers.
///
/// `final_pairs` walks the cross product of each surviving slot's current
/// Saturn and Chiron ranges and keeps a pair only if it was answered Yes or
/// Maybe. Pairs never asked, or answered No, are left out.
pub fn aggregate(timeline: &Timeline, answers: &AnswerBook) -> ResultSet {
    let surviving: Vec<SlotRow> = slot_rows(timeline)
        .into_iter()
        .filter(|row| row.alive)
        .collect();

    let live = || timeline.slots().iter().filter(|slot| slot.alive);

    let mut likely_ascendants: Vec<Sign> = live()
        .flat_map(|slot| slot.ascendant_range.iter())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    likely_ascendants.sort_by_key(|sign| sign.label());

    let mut likely_hour_lords: Vec<HourLord> = live()
        .map(|slot| slot.hour_lord)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    likely_hour_lords.sort_by_key(|lord| lord.label());

    let retained: BTreeSet<HousePairKey> = answers.retained_pairs().collect();
    // House orders numerically, so the BTreeSet yields (saturn, chiron) ascending.
    let pairs: BTreeSet<HousePairKey> = live()
        .flat_map(|slot| {
            slot.saturn_range.iter().flat_map(move |saturn| {
                slot.chiron_range.iter().map(move |chiron| (saturn, chiron))
            })
        })
        .filter(|pair| retained.contains(pair))
        .collect();
    let final_pairs = pairs
        .into_iter()
        .map(|(saturn, chiron)| HousePair { saturn, chiron })
        .collect();

    let results = ResultSet {
        surviving,
        likely_ascendants,
        likely_hour_lords,
        final_pairs,
    };

    tracing::info!(
        surviving = results.surviving.len(),
        ascendants = results.likely_ascendants.len(),
        hour_lords = results.likely_hour_lords.len(),
        pairs = results.final_pairs.len(),
        "Results aggregated"
    );
    results
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::elimination::apply_pair_answers;
    use crate::core::model::{Answer, SlotSeed, TimeOfDay};

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

    #[test]
    fn test_same_pair_answered_no_leaves_nothing() {
        let mut tl = Timeline::new(t(0, 0), t(12, 0)).unwrap();
        tl.append_first_slot(t(0, 0), seed(HourLord::Saturn, Sign::Leo, 5, 3))
            .unwrap();
        tl.append_transition(t(6, 0), seed(HourLord::Jupiter, Sign::Leo, 5, 3))
            .unwrap();
        tl.finalize().unwrap();

        let mut answers = AnswerBook::new();
        answers.pair.insert((h(5), h(3)), Answer::No);
        apply_pair_answers(&mut tl, &answers.pair).unwrap();

        let results = aggregate(&tl, &answers);
        assert!(results.is_empty());
        assert!(results.likely_ascendants.is_empty());
        assert!(results.likely_hour_lords.is_empty());
        assert!(results.final_pairs.is_empty());
    }

    #[test]
    fn test_traits_sorted_by_name_and_pairs_numerically() {
        let mut tl = Timeline::new(t(0, 0), t(23, 59)).unwrap();
        tl.append_first_slot(t(0, 0), seed(HourLord::Venus, Sign::Virgo, 10, 3))
            .unwrap();
        // Slot 0 grows to Saturn {10, 2}, Chiron {3, 12}, ASC {Virgo, Aries}.
        tl.append_transition(t(8, 0), seed(HourLord::Mars, Sign::Aries, 2, 12))
            .unwrap();
        tl.finalize().unwrap();

        let mut answers = AnswerBook::new();
        answers.pair.insert((h(10), h(3)), Answer::Yes);
        answers.pair.insert((h(2), h(12)), Answer::Maybe);
        answers.pair.insert((h(2), h(3)), Answer::Yes);
        apply_pair_answers(&mut tl, &answers.pair).unwrap();

        let results = aggregate(&tl, &answers);
        assert_eq!(results.surviving.len(), 2);
        assert_eq!(results.likely_ascendants, vec![Sign::Aries, Sign::Virgo]);
        assert_eq!(results.likely_hour_lords, vec![HourLord::Mars, HourLord::Venus]);
        assert_eq!(
            results.final_pairs,
            vec![
                HousePair { saturn: h(2), chiron: h(3) },
                HousePair { saturn: h(2), chiron: h(12) },
                HousePair { saturn: h(10), chiron: h(3) },
            ]
        );
    }

    #[test]
    fn test_final_pairs_exclude_no_and_unasked() {
        let mut tl = Timeline::new(t(0, 0), t(23, 59)).unwrap();
        tl.append_first_slot(t(0, 0), seed(HourLord::Sun, Sign::Leo, 5, 3))
            .unwrap();
        // Slot 0 grows to Saturn {5, 6}; (6, 3) is in its cross product.
        tl.append_transition(t(6, 0), seed(HourLord::Moon, Sign::Leo, 6, 3))
            .unwrap();
        tl.append_transition(t(9, 0), seed(HourLord::Mars, Sign::Leo, 7, 3))
            .unwrap();
        tl.finalize().unwrap();

        let mut answers = AnswerBook::new();
        answers.pair.insert((h(5), h(3)), Answer::Yes);
        answers.pair.insert((h(6), h(3)), Answer::No);
        answers.pair.insert((h(7), h(3)), Answer::Maybe);
        apply_pair_answers(&mut tl, &answers.pair).unwrap();

        let results = aggregate(&tl, &answers);
        let pairs: Vec<(u8, u8)> = results
            .final_pairs
            .iter()
            .map(|p| (p.saturn.number(), p.chiron.number()))
            .collect();
        assert_eq!(pairs, vec![(5, 3), (7, 3)]);
        assert!(!pairs.contains(&(6, 3)));
    }
}
