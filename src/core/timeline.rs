// BirthWindow - core/timeline.rs
//
// Ordered sequence of contiguous hour-lord slots inside a declared birth
// window. Supports append, undo, and end-time finalisation.
// Core layer: pure logic, no I/O.
//
// Shape invariants:
// - Only the last slot may be open (end_time == None).
// - slot[i].end_time == slot[i + 1].start_time.
// - Start times strictly increase and stay inside the window.
// - Every rejected command leaves the timeline unchanged.

use crate::core::model::{FinalEndpoint, House, Sign, Slot, SlotEnd, SlotSeed, TimeOfDay};
use crate::util::error::TimelineError;

/// Values a transition appended to its predecessor's ranges, so that undo can
/// take exactly those back out again.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Growth {
    ascendant: Option<Sign>,
    saturn: Option<House>,
    chiron: Option<House>,
}

/// Cyclic spans from the last slot's starting values to the final endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSpan {
    pub ascendants: Vec<Sign>,
    pub saturn_houses: Vec<House>,
    pub chiron_houses: Vec<House>,
}

/// The slot timeline for one session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timeline {
    window_start: TimeOfDay,
    window_end: TimeOfDay,
    slots: Vec<Slot>,
    /// Parallel to `slots`; entry `i` is what creating slot `i` added to slot `i - 1`.
    growth: Vec<Growth>,
    endpoint: Option<FinalEndpoint>,
    closed: bool,
}

impl Timeline {
    /// Create an empty timeline for the window `start..end`.
    ///
    /// Fails with `OutOfOrder` unless `end` is strictly after `start`.
    pub fn new(window_start: TimeOfDay, window_end: TimeOfDay) -> Result<Self, TimelineError> {
        if window_end <= window_start {
            return Err(TimelineError::OutOfOrder {
                time: format!("window end {window_end}"),
                previous: window_start.to_string(),
            });
        }
        Ok(Self {
            window_start,
            window_end,
            slots: Vec::new(),
            growth: Vec::new(),
            endpoint: None,
            closed: false,
        })
    }

    pub fn window_start(&self) -> TimeOfDay {
        self.window_start
    }

    pub fn window_end(&self) -> TimeOfDay {
        self.window_end
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Mutable access for the elimination passes.
    pub(crate) fn slots_mut(&mut self) -> &mut [Slot] {
        &mut self.slots
    }

    pub fn last(&self) -> Option<&Slot> {
        self.slots.last()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// True once `finalize` has run and no `reopen` has followed.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub fn endpoint(&self) -> Option<&FinalEndpoint> {
        self.endpoint.as_ref()
    }

    /// Record the user-declared values at the window end.
    pub fn set_endpoint(&mut self, endpoint: FinalEndpoint) {
        self.endpoint = Some(endpoint);
    }

    /// Create the first slot. Fails if the timeline already has one.
    pub fn append_first_slot(
        &mut self,
        start: TimeOfDay,
        seed: SlotSeed,
    ) -> Result<(), TimelineError> {
        if !self.slots.is_empty() {
            return Err(TimelineError::InvalidState {
                reason: "the first slot has already been added",
            });
        }
        if start < self.window_start {
            return Err(TimelineError::OutOfOrder {
                time: start.to_string(),
                previous: format!("window start {}", self.window_start),
            });
        }
        self.ensure_before_window_end(start)?;

        self.slots.push(Slot::new(start, seed));
        self.growth.push(Growth::default());

        tracing::debug!(
            start = %start,
            hour_lord = %seed.hour_lord,
            ascendant = %seed.ascendant,
            "First slot added"
        );
        Ok(())
    }

    /// Close the current last slot at `time` and open a new one there.
    ///
    /// The transition's attribute values are also appended (if new) to the
    /// ranges of the slot being closed.
    pub fn append_transition(
        &mut self,
        time: TimeOfDay,
        seed: SlotSeed,
    ) -> Result<(), TimelineError> {
        self.ensure_open()?;
        let last_start = match self.slots.last() {
            Some(last) => last.start_time,
            None => {
                return Err(TimelineError::InvalidState {
                    reason: "a transition needs a first slot to follow",
                })
            }
        };
        if time <= last_start {
            return Err(TimelineError::OutOfOrder {
                time: time.to_string(),
                previous: last_start.to_string(),
            });
        }
        self.ensure_before_window_end(time)?;

        let mut growth = Growth::default();
        if let Some(last) = self.slots.last_mut() {
            last.end_time = Some(time);
            if last.ascendant_range.insert(seed.ascendant) {
                growth.ascendant = Some(seed.ascendant);
            }
            if last.saturn_range.insert(seed.saturn_house) {
                growth.saturn = Some(seed.saturn_house);
            }
            if last.chiron_range.insert(seed.chiron_house) {
                growth.chiron = Some(seed.chiron_house);
            }
        }

        self.slots.push(Slot::new(time, seed));
        self.growth.push(growth);

        tracing::debug!(
            time = %time,
            hour_lord = %seed.hour_lord,
            slots = self.slots.len(),
            "Transition appended"
        );
        Ok(())
    }

    /// Remove the most recent transition, reopening its predecessor.
    ///
    /// Exact inverse of `append_transition`. When a single slot remains its
    /// end is restored to the window end.
    pub fn undo_last(&mut self) -> Result<(), TimelineError> {
        self.ensure_open()?;
        if self.slots.len() <= 1 {
            return Err(TimelineError::InvalidState {
                reason: "cannot undo below one slot",
            });
        }

        let removed = self.slots.pop();
        let growth = self.growth.pop().unwrap_or_default();
        let only_one_left = self.slots.len() == 1;
        let window_end = self.window_end;

        if let Some(last) = self.slots.last_mut() {
            if let Some(sign) = growth.ascendant {
                last.ascendant_range.remove(sign);
            }
            if let Some(house) = growth.saturn {
                last.saturn_range.remove(house);
            }
            if let Some(house) = growth.chiron {
                last.chiron_range.remove(house);
            }
            last.end_time = only_one_left.then_some(window_end);
        }

        tracing::debug!(
            removed_start = ?removed.map(|s| s.start_time.to_string()),
            slots = self.slots.len(),
            "Last transition undone"
        );
        Ok(())
    }

    /// Close the timeline: the last slot ends at the window end.
    ///
    /// Required exactly once before elimination reads the timeline.
    pub fn finalize(&mut self) -> Result<(), TimelineError> {
        self.ensure_open()?;
        let window_end = self.window_end;
        let last = self.slots.last_mut().ok_or(TimelineError::InvalidState {
            reason: "cannot finalise an empty timeline",
        })?;
        last.end_time = Some(window_end);
        self.closed = true;

        tracing::info!(
            slots = self.slots.len(),
            window_end = %window_end,
            "Timeline finalised"
        );
        Ok(())
    }

    /// Undo `finalize` so entries can be edited again.
    pub fn reopen(&mut self) -> Result<(), TimelineError> {
        if !self.closed {
            return Err(TimelineError::InvalidState {
                reason: "timeline is not finalised",
            });
        }
        let single = self.slots.len() == 1;
        if let Some(last) = self.slots.last_mut() {
            if !single {
                last.end_time = None;
            }
        }
        self.closed = false;
        tracing::debug!("Timeline reopened");
        Ok(())
    }

    /// Reported end of the slot at `index`, or `None` if out of bounds.
    pub fn slot_end(&self, index: usize) -> Option<SlotEnd> {
        let slot = self.slots.get(index)?;
        let is_last = index + 1 == self.slots.len();
        Some(display_end(slot, is_last, self.window_end))
    }

    /// Cyclic spans from the last slot's starting values to the endpoint.
    /// `None` until both a slot and an endpoint exist.
    pub fn endpoint_span(&self) -> Option<EndpointSpan> {
        let last = self.slots.last()?;
        let endpoint = self.endpoint?;
        Some(EndpointSpan {
            ascendants: last.ascendant_start.span_to(endpoint.ascendant),
            saturn_houses: last.saturn_start.span_to(endpoint.saturn_house),
            chiron_houses: last.chiron_start.span_to(endpoint.chiron_house),
        })
    }

    pub(crate) fn ensure_closed(&self) -> Result<(), TimelineError> {
        if self.closed {
            Ok(())
        } else {
            Err(TimelineError::InvalidState {
                reason: "timeline must be finalised first",
            })
        }
    }

    fn ensure_open(&self) -> Result<(), TimelineError> {
        if self.closed {
            Err(TimelineError::InvalidState {
                reason: "timeline is already finalised",
            })
        } else {
            Ok(())
        }
    }

    fn ensure_before_window_end(&self, time: TimeOfDay) -> Result<(), TimelineError> {
        if time >= self.window_end {
            return Err(TimelineError::PastWindowEnd {
                time: time.to_string(),
                window_end: self.window_end.to_string(),
            });
        }
        Ok(())
    }
}

/// End time to show for `slot`.
///
/// A finalised end wins; otherwise the last slot reports the window end and
/// any other slot reports `Unknown` rather than a guessed time.
pub fn display_end(slot: &Slot, is_last: bool, window_end: TimeOfDay) -> SlotEnd {
    match slot.end_time {
        Some(end) => SlotEnd::At(end),
        None if is_last => SlotEnd::At(window_end),
        None => SlotEnd::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::HourLord;

    fn t(hour: u32, minute: u32) -> TimeOfDay {
        TimeOfDay::new(hour, minute).unwrap()
    }

    fn seed(hour_lord: HourLord, ascendant: Sign, sat: u8, chi: u8) -> SlotSeed {
        SlotSeed {
            hour_lord,
            ascendant,
            saturn_house: House::new(sat).unwrap(),
            chiron_house: House::new(chi).unwrap(),
        }
    }

    fn timeline_with_first() -> Timeline {
        let mut tl = Timeline::new(t(0, 0), t(23, 59)).unwrap();
        tl.append_first_slot(t(0, 0), seed(HourLord::Saturn, Sign::Aries, 5, 3))
            .unwrap();
        tl
    }

    #[test]
    fn test_window_must_be_ordered() {
        let result = Timeline::new(t(8, 0), t(8, 0));
        assert!(matches!(result, Err(TimelineError::OutOfOrder { .. })));
    }

    #[test]
    fn test_first_slot_twice_is_invalid_state() {
        let mut tl = timeline_with_first();
        let before = tl.clone();
        let result = tl.append_first_slot(t(1, 0), seed(HourLord::Sun, Sign::Leo, 1, 1));
        assert!(matches!(result, Err(TimelineError::InvalidState { .. })));
        assert_eq!(tl, before);
    }

    #[test]
    fn test_transition_closes_previous_and_opens_new() {
        let mut tl = timeline_with_first();
        tl.append_transition(t(6, 0), seed(HourLord::Jupiter, Sign::Taurus, 4, 3))
            .unwrap();

        let slots = tl.slots();
        assert_eq!(slots[0].end_time, Some(t(6, 0)));
        assert_eq!(slots[1].start_time, t(6, 0));
        assert_eq!(slots[1].end_time, None);
        assert!(slots[1].alive);
        assert_eq!(slots[0].ascendant_range.joined(), "Aries, Taurus");
        assert_eq!(slots[0].saturn_range.joined(), "5, 4");
        // Chiron 3 was already present.
        assert_eq!(slots[0].chiron_range.joined(), "3");
        assert_eq!(slots[1].ascendant_range.joined(), "Taurus");
    }

    #[test]
    fn test_repeated_ascendant_is_not_duplicated() {
        let mut tl = timeline_with_first();
        tl.append_transition(t(10, 0), seed(HourLord::Mars, Sign::Aries, 5, 3))
            .unwrap();
        assert_eq!(tl.slots()[0].ascendant_range.iter().collect::<Vec<_>>(), vec![Sign::Aries]);
    }

    #[test]
    fn test_transition_before_last_start_is_out_of_order() {
        let mut tl = Timeline::new(t(0, 0), t(23, 59)).unwrap();
        tl.append_first_slot(t(8, 0), seed(HourLord::Saturn, Sign::Aries, 5, 3))
            .unwrap();
        let before = tl.clone();

        let result = tl.append_transition(t(5, 0), seed(HourLord::Sun, Sign::Leo, 1, 1));
        assert_eq!(
            result,
            Err(TimelineError::OutOfOrder {
                time: "05:00".to_string(),
                previous: "08:00".to_string(),
            })
        );
        let equal = tl.append_transition(t(8, 0), seed(HourLord::Sun, Sign::Leo, 1, 1));
        assert!(matches!(equal, Err(TimelineError::OutOfOrder { .. })));
        assert_eq!(tl, before);
    }

    #[test]
    fn test_transition_at_window_end_is_rejected() {
        let mut tl = timeline_with_first();
        let result = tl.append_transition(t(23, 59), seed(HourLord::Sun, Sign::Leo, 1, 1));
        assert_eq!(
            result,
            Err(TimelineError::PastWindowEnd {
                time: "23:59".to_string(),
                window_end: "23:59".to_string(),
            })
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "23:59 must be before the window end 23:59"
        );
        assert_eq!(tl.len(), 1);
    }

    #[test]
    fn test_undo_single_slot_is_invalid_state() {
        let mut tl = timeline_with_first();
        let before = tl.clone();
        assert!(matches!(
            tl.undo_last(),
            Err(TimelineError::InvalidState { .. })
        ));
        assert_eq!(tl, before);
    }

    #[test]
    fn test_undo_then_reappend_restores_state() {
        let mut tl = timeline_with_first();
        tl.append_transition(t(4, 0), seed(HourLord::Jupiter, Sign::Taurus, 4, 2))
            .unwrap();
        let transition = seed(HourLord::Mars, Sign::Gemini, 3, 2);
        tl.append_transition(t(9, 30), transition).unwrap();
        let after_append = tl.clone();

        tl.undo_last().unwrap();
        assert_eq!(tl.len(), 2);
        assert_eq!(tl.slots()[1].end_time, None);
        assert_eq!(tl.slots()[1].ascendant_range.joined(), "Taurus");

        tl.append_transition(t(9, 30), transition).unwrap();
        assert_eq!(tl, after_append);
    }

    #[test]
    fn test_undo_to_single_slot_restores_window_end() {
        let mut tl = timeline_with_first();
        tl.append_transition(t(6, 0), seed(HourLord::Jupiter, Sign::Taurus, 4, 3))
            .unwrap();
        tl.undo_last().unwrap();
        assert_eq!(tl.slots()[0].end_time, Some(t(23, 59)));
        assert_eq!(tl.slots()[0].ascendant_range.joined(), "Aries");
    }

    #[test]
    fn test_finalize_closes_timeline() {
        let mut tl = timeline_with_first();
        tl.append_transition(t(6, 0), seed(HourLord::Jupiter, Sign::Taurus, 4, 3))
            .unwrap();
        tl.finalize().unwrap();

        assert!(tl.is_closed());
        assert_eq!(tl.last().unwrap().end_time, Some(t(23, 59)));
        assert!(matches!(tl.finalize(), Err(TimelineError::InvalidState { .. })));
        assert!(matches!(
            tl.append_transition(t(7, 0), seed(HourLord::Sun, Sign::Leo, 1, 1)),
            Err(TimelineError::InvalidState { .. })
        ));

        tl.reopen().unwrap();
        assert!(!tl.is_closed());
        assert_eq!(tl.last().unwrap().end_time, None);
    }

    #[test]
    fn test_display_end_never_guesses() {
        let mut tl = timeline_with_first();
        assert_eq!(tl.slot_end(0), Some(SlotEnd::At(t(23, 59))));

        tl.append_transition(t(6, 0), seed(HourLord::Jupiter, Sign::Taurus, 4, 3))
            .unwrap();
        assert_eq!(tl.slot_end(0), Some(SlotEnd::At(t(6, 0))));
        assert_eq!(tl.slot_end(1), Some(SlotEnd::At(t(23, 59))));
        assert_eq!(tl.slot_end(2), None);

        let open = Slot::new(t(1, 0), seed(HourLord::Sun, Sign::Leo, 1, 1));
        assert_eq!(display_end(&open, false, t(23, 59)), SlotEnd::Unknown);
    }

    #[test]
    fn test_endpoint_span_runs_from_last_slot() {
        let mut tl = timeline_with_first();
        assert!(tl.endpoint_span().is_none());
        tl.set_endpoint(FinalEndpoint {
            ascendant: Sign::Gemini,
            saturn_house: House::new(4).unwrap(),
            chiron_house: House::new(3).unwrap(),
        });

        let span = tl.endpoint_span().unwrap();
        assert_eq!(span.ascendants, vec![Sign::Aries, Sign::Taurus, Sign::Gemini]);
        assert_eq!(
            span.saturn_houses,
            vec![House::new(5).unwrap(), House::new(4).unwrap()]
        );
        assert_eq!(span.chiron_houses, vec![House::new(3).unwrap()]);
    }
}
