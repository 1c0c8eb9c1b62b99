// BirthWindow - core/answers.rs
//
// Recorded answers for the three question namespaces.
// Core layer: plain data, no I/O.

use crate::core::model::{Answer, House, Sign};
use std::collections::BTreeMap;

/// Address of an hour lord x ascendant question: the slot it was posed for
/// (by timeline index) and the ascendant shown with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotQuestionKey {
    pub slot: usize,
    pub ascendant: Sign,
}

/// A (Saturn house, Chiron house) combination.
pub type HousePairKey = (House, House);

/// All answers recorded during a session, one map per namespace.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnswerBook {
    /// One answer per distinct ascendant.
    pub ascendant: BTreeMap<Sign, Answer>,
    /// One answer per live slot with a non-empty ascendant range.
    pub hour_lord: BTreeMap<SlotQuestionKey, Answer>,
    /// One answer per distinct starting (Saturn, Chiron) pair.
    pub pair: BTreeMap<HousePairKey, Answer>,
}

impl AnswerBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ascendants answered No.
    pub fn rejected_ascendants(&self) -> impl Iterator<Item = Sign> + '_ {
        self.ascendant
            .iter()
            .filter(|(_, answer)| !answer.retains())
            .map(|(sign, _)| *sign)
    }

    /// Pairs answered Yes or Maybe.
    pub fn retained_pairs(&self) -> impl Iterator<Item = HousePairKey> + '_ {
        self.pair
            .iter()
            .filter(|(_, answer)| answer.retains())
            .map(|(pair, _)| *pair)
    }
}

/// Number of `required` keys with no entry in `recorded`.
pub fn count_missing<'a, K, V>(
    required: impl IntoIterator<Item = &'a K>,
    recorded: &BTreeMap<K, V>,
) -> usize
where
    K: Ord + 'a,
{
    required
        .into_iter()
        .filter(|key| !recorded.contains_key(key))
        .count()
}
