use chrono::NaiveDate;
use std::collections::HashMap;
use types::{Placement, Slot, SlotId};

/// Chronological index over the distinct slot start dates.
///
/// Slots sharing a start date collapse into one position; every slot id
/// resolves to the position of its date.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    dates: Vec<NaiveDate>,
    representative: Vec<SlotId>,
    by_date: HashMap<NaiveDate, usize>,
    by_slot: HashMap<SlotId, usize>,
}

impl Timeline {
    pub fn build(slots: &[Slot]) -> Self {
        let mut dates: Vec<NaiveDate> = slots.iter().map(|s| s.start_date).collect();
        dates.sort_unstable();
        dates.dedup();

        let by_date: HashMap<NaiveDate, usize> =
            dates.iter().enumerate().map(|(i, d)| (*d, i)).collect();

        let mut rep: Vec<Option<&SlotId>> = vec![None; dates.len()];
        let mut by_slot = HashMap::with_capacity(slots.len());
        for s in slots {
            let Some(&i) = by_date.get(&s.start_date) else {
                continue;
            };
            by_slot.insert(s.id.clone(), i);
            if rep[i].map_or(true, |r| &s.id < r) {
                rep[i] = Some(&s.id);
            }
        }
        let representative = rep.into_iter().flatten().cloned().collect();

        Self {
            dates,
            representative,
            by_date,
            by_slot,
        }
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn date(&self, index: usize) -> Option<NaiveDate> {
        self.dates.get(index).copied()
    }

    /// Slot id written into new placements for this position.
    pub fn slot_id(&self, index: usize) -> Option<&SlotId> {
        self.representative.get(index)
    }

    pub fn index_of_date(&self, date: NaiveDate) -> Option<usize> {
        self.by_date.get(&date).copied()
    }

    pub fn index_of_slot(&self, slot: &SlotId) -> Option<usize> {
        self.by_slot.get(slot).copied()
    }

    pub fn first_on_or_after(&self, date: NaiveDate) -> Option<usize> {
        let i = self.dates.partition_point(|d| *d < date);
        (i < self.dates.len()).then_some(i)
    }

    /// Dates covered by a run of `span` slots from `start`, if it fits.
    pub fn dates(&self, start: usize, span: usize) -> Option<&[NaiveDate]> {
        let end = start.checked_add(span)?;
        self.dates.get(start..end)
    }

    /// Sorted timeline positions a placement covers.
    ///
    /// `None` when the placement lists no slot or any slot is unknown; such
    /// placements stay out of occupancy bookkeeping.
    pub fn covered(&self, placement: &Placement) -> Option<Vec<usize>> {
        if placement.slot_ids.is_empty() {
            return None;
        }
        let mut out = Vec::with_capacity(placement.slot_ids.len());
        for s in &placement.slot_ids {
            out.push(self.index_of_slot(s)?);
        }
        out.sort_unstable();
        out.dedup();
        Some(out)
    }

    pub fn start_of(&self, placement: &Placement) -> Option<usize> {
        self.covered(placement).and_then(|c| c.first().copied())
    }
}
