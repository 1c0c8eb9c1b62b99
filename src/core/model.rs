// BirthWindow - core/model.rs
//
// Core data model types. Pure data definitions with no I/O and no platform
// dependencies. These types are the shared vocabulary across all layers.

use crate::util::constants;
use chrono::{NaiveTime, Timelike};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Time of day
// =============================================================================

/// A minute-resolution wall-clock time (00:00 - 23:59). Totally ordered.
/// Defaults to midnight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Build from hour (0-23) and minute (0-59). `None` when out of range.
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn hour(&self) -> u32 {
        self.0.hour()
    }

    pub fn minute(&self) -> u32 {
        self.0.minute()
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(constants::TIME_FORMAT))
    }
}

impl FromStr for TimeOfDay {
    type Err = String;

    /// Parses `HH:MM` (a single-digit hour such as `6:05` is accepted).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), constants::TIME_FORMAT)
            .map(Self)
            .map_err(|e| format!("'{s}' is not a valid HH:MM time: {e}"))
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Zodiac sign
// =============================================================================

/// Zodiac signs in cyclic order, starting from Aries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Sign {
    Aries,
    Taurus,
    Gemini,
    Cancer,
    Leo,
    Virgo,
    Libra,
    Scorpio,
    Sagittarius,
    Capricorn,
    Aquarius,
    Pisces,
}

impl Sign {
    /// Returns all variants in zodiac order.
    pub fn all() -> &'static [Sign] {
        &[
            Sign::Aries,
            Sign::Taurus,
            Sign::Gemini,
            Sign::Cancer,
            Sign::Leo,
            Sign::Virgo,
            Sign::Libra,
            Sign::Scorpio,
            Sign::Sagittarius,
            Sign::Capricorn,
            Sign::Aquarius,
            Sign::Pisces,
        ]
    }

    /// Human-readable label for display.
    pub fn label(&self) -> &'static str {
        match self {
            Sign::Aries => "Aries",
            Sign::Taurus => "Taurus",
            Sign::Gemini => "Gemini",
            Sign::Cancer => "Cancer",
            Sign::Leo => "Leo",
            Sign::Virgo => "Virgo",
            Sign::Libra => "Libra",
            Sign::Scorpio => "Scorpio",
            Sign::Sagittarius => "Sagittarius",
            Sign::Capricorn => "Capricorn",
            Sign::Aquarius => "Aquarius",
            Sign::Pisces => "Pisces",
        }
    }

    /// Inclusive run of signs from `self` forward to `end`, wrapping past
    /// Pisces at most once. `self.span_to(self)` is a single sign.
    pub fn span_to(self, end: Sign) -> Vec<Sign> {
        cyclic_span(Sign::all(), self, end)
    }
}

impl fmt::Display for Sign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Sign {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Sign::all()
            .iter()
            .copied()
            .find(|sign| sign.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("'{s}' is not a zodiac sign"))
    }
}

// Script values may spell signs and hour lords in any case.
impl<'de> Deserialize<'de> for Sign {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// Hour lord
// =============================================================================

/// Planetary ruler of a sub-interval of the day, in traditional hour order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum HourLord {
    Saturn,
    Jupiter,
    Mars,
    Sun,
    Venus,
    Mercury,
    Moon,
}

impl HourLord {
    /// Returns all variants in hour-ruler sequence.
    pub fn all() -> &'static [HourLord] {
        &[
            HourLord::Saturn,
            HourLord::Jupiter,
            HourLord::Mars,
            HourLord::Sun,
            HourLord::Venus,
            HourLord::Mercury,
            HourLord::Moon,
        ]
    }

    pub fn label(&self) -> &'static str {
        match self {
            HourLord::Saturn => "Saturn",
            HourLord::Jupiter => "Jupiter",
            HourLord::Mars => "Mars",
            HourLord::Sun => "Sun",
            HourLord::Venus => "Venus",
            HourLord::Mercury => "Mercury",
            HourLord::Moon => "Moon",
        }
    }
}

impl fmt::Display for HourLord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for HourLord {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        HourLord::all()
            .iter()
            .copied()
            .find(|lord| lord.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("'{s}' is not an hour lord"))
    }
}

impl<'de> Deserialize<'de> for HourLord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// House
// =============================================================================

/// One of the twelve chart houses (1-12).
///
/// Houses rise through the day in descending order, so the cycle used for
/// spans is 1, 12, 11, ..., 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct House(u8);

impl House {
    /// `None` unless `number` is in 1..=12.
    pub fn new(number: u8) -> Option<Self> {
        (1..=constants::HOUSE_COUNT)
            .contains(&number)
            .then_some(Self(number))
    }

    pub fn number(&self) -> u8 {
        self.0
    }

    /// All houses in numeric order.
    pub fn all() -> impl Iterator<Item = House> {
        (1..=constants::HOUSE_COUNT).map(House)
    }

    /// Inclusive run of houses from `self` to `end` along the rising cycle
    /// (1, 12, 11, ..., 2), wrapping at most once.
    pub fn span_to(self, end: House) -> Vec<House> {
        let cycle: Vec<House> = std::iter::once(1)
            .chain((2..=constants::HOUSE_COUNT).rev())
            .map(House)
            .collect();
        cyclic_span(&cycle, self, end)
    }
}

impl TryFrom<u8> for House {
    type Error = String;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        House::new(number).ok_or_else(|| format!("house {number} is outside 1-12"))
    }
}

impl From<House> for u8 {
    fn from(house: House) -> u8 {
        house.0
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for House {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("'{s}' is not a house number"))?;
        House::try_from(number)
    }
}

/// Walk `cycle` from `start` forward to `end` (inclusive), wrapping once.
fn cyclic_span<T: Copy + PartialEq>(cycle: &[T], start: T, end: T) -> Vec<T> {
    let Some(start_idx) = cycle.iter().position(|v| *v == start) else {
        return Vec::new();
    };
    let mut span = Vec::with_capacity(cycle.len());
    for offset in 0..cycle.len() {
        let value = cycle[(start_idx + offset) % cycle.len()];
        span.push(value);
        if value == end {
            break;
        }
    }
    span
}

// =============================================================================
// Answer
// =============================================================================

/// A user's response to a single question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Answer {
    Yes,
    No,
    Maybe,
}

impl Answer {
    pub fn label(&self) -> &'static str {
        match self {
            Answer::Yes => "Yes",
            Answer::No => "No",
            Answer::Maybe => "Maybe",
        }
    }

    /// Yes and Maybe both keep a candidate in play.
    pub fn retains(&self) -> bool {
        !matches!(self, Answer::No)
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "yes" | "y" => Ok(Answer::Yes),
            "no" | "n" => Ok(Answer::No),
            "maybe" | "not sure" | "unsure" => Ok(Answer::Maybe),
            _ => Err(format!("'{s}' is not an answer (Yes, No, Maybe)")),
        }
    }
}

// =============================================================================
// Range set
// =============================================================================

/// An insertion-ordered set of attribute values.
///
/// "First" is the earliest-inserted value still present, which keeps the
/// hour-lord question selection reproducible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RangeSet<T>(Vec<T>);

impl<T: Copy + PartialEq> RangeSet<T> {
    pub fn singleton(value: T) -> Self {
        Self(vec![value])
    }

    /// Append `value` unless already present. Returns true if it was added.
    pub fn insert(&mut self, value: T) -> bool {
        if self.0.contains(&value) {
            return false;
        }
        self.0.push(value);
        true
    }

    /// Remove `value` if present. Returns true if it was removed.
    pub fn remove(&mut self, value: T) -> bool {
        match self.0.iter().position(|v| *v == value) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, value: T) -> bool {
        self.0.contains(&value)
    }

    pub fn first(&self) -> Option<T> {
        self.0.first().copied()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = T> + '_ {
        self.0.iter().copied()
    }
}

impl<T: fmt::Display> RangeSet<T> {
    /// Values in insertion order joined with ", ".
    pub fn joined(&self) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(constants::RANGE_JOIN_SEPARATOR)
    }
}

// =============================================================================
// Slot
// =============================================================================

/// The three attribute values recorded at an hour-lord transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SlotSeed {
    pub hour_lord: HourLord,
    pub ascendant: Sign,
    pub saturn_house: House,
    pub chiron_house: House,
}

/// User-declared ascendant / Saturn / Chiron values at the window end.
/// Display-only: never consumed by elimination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FinalEndpoint {
    pub ascendant: Sign,
    pub saturn_house: House,
    pub chiron_house: House,
}

/// A contiguous time sub-interval with one hour lord and evolving ranges.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Slot {
    pub start_time: TimeOfDay,

    /// `None` while the slot is open.
    pub end_time: Option<TimeOfDay>,

    pub hour_lord: HourLord,

    /// Values recorded when the slot was created. Pair grouping uses these,
    /// never the grown ranges.
    pub ascendant_start: Sign,
    pub saturn_start: House,
    pub chiron_start: House,

    pub ascendant_range: RangeSet<Sign>,
    pub saturn_range: RangeSet<House>,
    pub chiron_range: RangeSet<House>,

    /// Once false, excluded from every downstream view. Never reset.
    pub alive: bool,
}

impl Slot {
    /// A fresh open slot with singleton ranges.
    pub fn new(start_time: TimeOfDay, seed: SlotSeed) -> Self {
        Self {
            start_time,
            end_time: None,
            hour_lord: seed.hour_lord,
            ascendant_start: seed.ascendant,
            saturn_start: seed.saturn_house,
            chiron_start: seed.chiron_house,
            ascendant_range: RangeSet::singleton(seed.ascendant),
            saturn_range: RangeSet::singleton(seed.saturn_house),
            chiron_range: RangeSet::singleton(seed.chiron_house),
            alive: true,
        }
    }

    /// The (Saturn, Chiron) pair the slot started with.
    pub fn start_pair(&self) -> (House, House) {
        (self.saturn_start, self.chiron_start)
    }
}

/// Reported end of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotEnd {
    At(TimeOfDay),
    Unknown,
}

impl fmt::Display for SlotEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SlotEnd::At(t) => write!(f, "{t}"),
            SlotEnd::Unknown => f.write_str(constants::UNKNOWN_END_MARKER),
        }
    }
}
