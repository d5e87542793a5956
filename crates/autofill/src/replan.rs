use sched_core::Timeline;
use std::collections::HashSet;
use tracing::debug;
use types::{CohortId, CourseId, DayRecord, Placement, PlacementId, SlotId};

#[derive(Debug, Default)]
pub(crate) struct Retraction {
    /// Placements the cohort left that other cohorts still share.
    pub released: Vec<PlacementId>,
    /// Placements removed because no cohort remained.
    pub deleted: Vec<PlacementId>,
    pub purged_days: usize,
}

/// Pulls the cohort out of every unpinned placement starting at or after `from`.
///
/// Placements whose slots cannot be resolved are left alone. Day records of
/// (course, slot) pairs no surviving placement lists any more are dropped.
pub(crate) fn retract_future(
    placements: &mut Vec<Placement>,
    day_records: &mut Vec<DayRecord>,
    cohort: &CohortId,
    from: usize,
    timeline: &Timeline,
    pinned: &[PlacementId],
) -> Retraction {
    let mut out = Retraction::default();
    let mut touched: HashSet<(CourseId, SlotId)> = HashSet::new();

    for p in placements.iter_mut() {
        if !p.has_cohort(cohort) || pinned.contains(&p.id) {
            continue;
        }
        match timeline.start_of(p) {
            Some(start) if start >= from => {}
            _ => continue,
        }
        p.cohort_ids.retain(|k| k != cohort);
        for s in &p.slot_ids {
            touched.insert((p.course_id.clone(), s.clone()));
        }
        debug!(placement = %p.id, course = %p.course_id, left = p.cohort_ids.len(), "retracted cohort");
        if p.cohort_ids.is_empty() {
            out.deleted.push(p.id.clone());
        } else {
            out.released.push(p.id.clone());
        }
    }

    let deleted: HashSet<&PlacementId> = out.deleted.iter().collect();
    placements.retain(|p| !deleted.contains(&p.id));

    let listed: HashSet<(&CourseId, &SlotId)> = placements
        .iter()
        .flat_map(|p| p.slot_ids.iter().map(move |s| (&p.course_id, s)))
        .collect();
    let before = day_records.len();
    day_records.retain(|r| {
        listed.contains(&(&r.course_id, &r.slot_id))
            || !touched.contains(&(r.course_id.clone(), r.slot_id.clone()))
    });
    out.purged_days = before - day_records.len();
    out
}
