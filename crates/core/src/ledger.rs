use crate::config::Caps;
use crate::timeline::Timeline;
use std::collections::{BTreeSet, HashMap};
use types::{CohortId, CourseId, Placement};

/// Combined headcount per course and slot across every cohort.
///
/// `by_slot` holds the load on each covered position, `by_start` the load
/// of runs starting at a position (the co-location signal). `runs` keeps
/// every run's `(start, span)` so offset starts of spanning courses can be
/// refused.
#[derive(Clone, Debug)]
pub struct CapacityLedger {
    caps: Caps,
    by_slot: HashMap<usize, HashMap<CourseId, u32>>,
    by_start: HashMap<usize, HashMap<CourseId, u32>>,
    runs: HashMap<CourseId, BTreeSet<(usize, usize)>>,
}

impl CapacityLedger {
    pub fn new(caps: Caps) -> Self {
        Self {
            caps,
            by_slot: HashMap::new(),
            by_start: HashMap::new(),
            runs: HashMap::new(),
        }
    }

    pub fn caps(&self) -> Caps {
        self.caps
    }

    /// Adds every resolvable placement with the summed size of its cohorts.
    pub fn seed<'p>(
        &mut self,
        placements: impl IntoIterator<Item = &'p Placement>,
        timeline: &Timeline,
        sizes: &HashMap<&CohortId, u32>,
    ) {
        for p in placements {
            let Some(covered) = timeline.covered(p) else {
                continue;
            };
            let headcount: u32 = p
                .cohort_ids
                .iter()
                .map(|c| sizes.get(c).copied().unwrap_or(0))
                .sum();
            self.add(&p.course_id, &covered, headcount);
        }
    }

    fn add(&mut self, course: &CourseId, covered: &[usize], headcount: u32) {
        let Some(&start) = covered.first() else {
            return;
        };
        for &i in covered {
            *self
                .by_slot
                .entry(i)
                .or_default()
                .entry(course.clone())
                .or_default() += headcount;
        }
        *self
            .by_start
            .entry(start)
            .or_default()
            .entry(course.clone())
            .or_default() += headcount;
        self.runs
            .entry(course.clone())
            .or_default()
            .insert((start, covered.len()));
    }

    pub fn load(&self, course: &CourseId, index: usize) -> u32 {
        self.by_slot
            .get(&index)
            .and_then(|m| m.get(course))
            .copied()
            .unwrap_or(0)
    }

    pub fn starting(&self, course: &CourseId, index: usize) -> u32 {
        self.by_start
            .get(&index)
            .and_then(|m| m.get(course))
            .copied()
            .unwrap_or(0)
    }

    /// Highest headcount over the covered positions once `size` more students join.
    pub fn projected_max(&self, course: &CourseId, span: usize, start: usize, size: u32) -> u32 {
        (start..start + span)
            .map(|i| self.load(course, i).saturating_add(size))
            .max()
            .unwrap_or(size)
    }

    pub fn fits_hard_cap(&self, course: &CourseId, span: usize, start: usize, size: u32) -> bool {
        self.projected_max(course, span, start, size) <= self.caps.hard
    }

    pub fn fits_preferred_cap(
        &self,
        course: &CourseId,
        span: usize,
        start: usize,
        size: u32,
    ) -> bool {
        self.projected_max(course, span, start, size) <= self.caps.preferred
    }

    /// Seats left under the hard cap after placing `size` students.
    pub fn headroom(&self, course: &CourseId, span: usize, start: usize, size: u32) -> u32 {
        self.caps
            .hard
            .saturating_sub(self.projected_max(course, span, start, size))
    }

    pub fn commit(&mut self, course: &CourseId, span: usize, start: usize, size: u32) {
        let covered: Vec<usize> = (start..start + span).collect();
        self.add(course, &covered, size);
    }

    /// True when `index` is an inner slot of a run of `course` that started earlier.
    pub fn is_inside_run(&self, course: &CourseId, index: usize) -> bool {
        self.runs.get(course).map_or(false, |runs| {
            runs.iter()
                .any(|&(s, span)| s < index && index < s + span)
        })
    }

    /// True when a run `[start, start + span)` overlaps a differently-started run.
    pub fn skews(&self, course: &CourseId, start: usize, span: usize) -> bool {
        let end = start + span;
        self.runs.get(course).map_or(false, |runs| {
            runs.iter()
                .any(|&(s, sp)| s != start && s < end && start < s + sp)
        })
    }

    pub fn runs(&self, course: &CourseId) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.runs.get(course).into_iter().flatten().copied()
    }
}
