use sched_core::config::Caps;
use sched_core::{CapacityLedger, PrereqGraph, RuleChain, TeacherAvailability, Timeline};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};
use types::{
    Cohort, CohortId, Course, CourseId, Instance, Placement, PlacementId, RuleId, SlotId,
    TeacherId,
};

/// A placement assumed to be committed while looking one slot ahead.
pub(crate) struct Assumed<'c> {
    pub course: &'c CourseId,
    pub start: usize,
    pub span: usize,
}

impl Assumed<'_> {
    fn covers(&self, index: usize) -> bool {
        self.start <= index && index < self.start + self.span
    }
}

/// Courses of the cohort's curriculum it has no resolvable placement for, by id.
pub(crate) fn outstanding(
    instance: &Instance,
    placements: &[Placement],
    timeline: &Timeline,
    cohort: &Cohort,
) -> Vec<CourseId> {
    let placed: HashSet<&CourseId> = placements
        .iter()
        .filter(|p| p.has_cohort(&cohort.id) && timeline.covered(p).is_some())
        .map(|p| &p.course_id)
        .collect();
    let mut out: Vec<CourseId> = instance
        .courses
        .iter()
        .filter(|c| cohort.takes(&c.id) && !placed.contains(&c.id))
        .map(|c| c.id.clone())
        .collect();
    out.sort();
    out
}

/// Forward-fill state for one cohort over one snapshot.
pub(crate) struct Fill<'a, T: TeacherAvailability + ?Sized> {
    pub(crate) timeline: &'a Timeline,
    pub(crate) chain: &'a RuleChain,
    pub(crate) teachers: &'a T,
    pub(crate) courses: HashMap<&'a CourseId, &'a Course>,
    pub(crate) cohort: &'a Cohort,
    pub(crate) size: u32,
    pub(crate) ledger: CapacityLedger,
    pub(crate) prereqs: PrereqGraph<'a>,
    pub(crate) occupied: BTreeSet<usize>,
    pub(crate) remaining: Vec<CourseId>,
    /// Later cohorts by ascending size, for the future-join estimate.
    pub(crate) joiners: Vec<&'a Cohort>,
    pub(crate) taken: HashSet<(&'a CohortId, &'a CourseId)>,
    /// Teachers already on runs of a course starting at a position.
    crew: HashMap<(CourseId, usize), BTreeSet<TeacherId>>,
    /// Placement ids a new placement must not reuse.
    ids: HashSet<PlacementId>,
}

impl<'a, T: TeacherAvailability + ?Sized> Fill<'a, T> {
    pub(crate) fn new(
        instance: &'a Instance,
        placements: &'a [Placement],
        timeline: &'a Timeline,
        chain: &'a RuleChain,
        teachers: &'a T,
        cohort: &'a Cohort,
        caps: Caps,
    ) -> Self {
        let sizes: HashMap<&CohortId, u32> = instance
            .cohorts
            .iter()
            .map(|k| (&k.id, k.planned_size))
            .collect();

        let mut ledger = CapacityLedger::new(caps);
        ledger.seed(placements, timeline, &sizes);

        let mut prereqs = PrereqGraph::new(&instance.courses);
        let mut occupied = BTreeSet::new();
        let mut crew: HashMap<(CourseId, usize), BTreeSet<TeacherId>> = HashMap::new();
        let mut taken = HashSet::new();
        for p in placements {
            for k in &p.cohort_ids {
                taken.insert((k, &p.course_id));
            }
            let Some(covered) = timeline.covered(p) else {
                continue;
            };
            if let (Some(&first), Some(&last)) = (covered.first(), covered.last()) {
                crew.entry((p.course_id.clone(), first))
                    .or_default()
                    .extend(p.teacher_ids.iter().cloned());
                if p.has_cohort(&cohort.id) {
                    prereqs.complete(&p.course_id, last);
                    occupied.extend(covered.iter().copied());
                }
            }
        }

        let mut joiners: Vec<&Cohort> = instance
            .cohorts
            .iter()
            .filter(|k| k.id.natural_cmp(&cohort.id) == Ordering::Greater)
            .collect();
        joiners.sort_by(|a, b| (a.planned_size, &a.id).cmp(&(b.planned_size, &b.id)));

        Self {
            timeline,
            chain,
            teachers,
            courses: instance.courses.iter().map(|c| (&c.id, c)).collect(),
            cohort,
            size: cohort.planned_size,
            ledger,
            prereqs,
            occupied,
            remaining: outstanding(instance, placements, timeline, cohort),
            joiners,
            taken,
            crew,
            ids: placements.iter().map(|p| p.id.clone()).collect(),
        }
    }

    /// Keeps ids of placements removed before the fill from being handed out again.
    pub(crate) fn reserve(&mut self, ids: impl IntoIterator<Item = PlacementId>) {
        self.ids.extend(ids);
    }

    /// `{cohort}:{course}:{slot}`, suffixed `#2`, `#3`, ... while that id is taken.
    fn fresh_id(&mut self, course: &CourseId, slot: &SlotId) -> PlacementId {
        let base = format!("{}:{}:{}", self.cohort.id, course, slot);
        let mut id = PlacementId(base.clone());
        let mut n = 2;
        while self.ids.contains(&id) {
            id = PlacementId(format!("{base}#{n}"));
            n += 1;
        }
        self.ids.insert(id.clone());
        id
    }

    pub(crate) fn remaining(&self) -> &[CourseId] {
        &self.remaining
    }

    /// Free positions of the cohort from `from` on.
    pub(crate) fn gaps(&self, from: usize) -> usize {
        (from..self.timeline.len())
            .filter(|i| !self.occupied.contains(i))
            .count()
    }

    pub(crate) fn course(&self, id: &CourseId) -> Option<&'a Course> {
        self.courses.get(id).copied()
    }

    pub(crate) fn available_teachers(
        &self,
        course: &CourseId,
        start: usize,
        span: usize,
    ) -> BTreeSet<TeacherId> {
        match self.timeline.dates(start, span) {
            Some(dates) => self.teachers.available_for_span(course, dates),
            None => BTreeSet::new(),
        }
    }

    /// Hard checks for starting `course` at `start`.
    pub(crate) fn eligible(&self, course: &Course, start: usize, assumed: Option<&Assumed<'_>>) -> bool {
        let id = &course.id;
        let span = course.span();
        let end = start + span;
        if end > self.timeline.len() {
            return false;
        }
        if self.ledger.is_inside_run(id, start) || self.ledger.skews(id, start, span) {
            return false;
        }
        if (start..end)
            .any(|i| self.occupied.contains(&i) || assumed.map_or(false, |a| a.covers(i)))
        {
            return false;
        }
        let done = assumed.map(|a| (a.course, a.start + a.span - 1));
        if !self.prereqs.is_satisfied_with(id, start, done) {
            return false;
        }
        if self.chain.is_hard(RuleId::RequireAvailableCompatibleTeachers)
            && self.available_teachers(id, start, span).is_empty()
        {
            return false;
        }
        if !self.ledger.fits_hard_cap(id, span, start, self.size) {
            return false;
        }
        if self.chain.is_hard(RuleId::AvoidOverPreferred)
            && !self.ledger.fits_preferred_cap(id, span, start, self.size)
        {
            return false;
        }
        true
    }

    fn candidates_at(&self, start: usize) -> Vec<CourseId> {
        self.remaining
            .iter()
            .filter(|c| {
                self.course(c)
                    .map_or(false, |course| self.eligible(course, start, None))
            })
            .cloned()
            .collect()
    }

    fn commit(&mut self, course_id: &CourseId, start: usize) -> Option<Placement> {
        let course = self.course(course_id)?;
        let span = course.span();
        let slot_ids: Vec<SlotId> = (start..start + span)
            .map(|i| self.timeline.slot_id(i).cloned())
            .collect::<Option<_>>()?;

        self.ledger.commit(&course.id, span, start, self.size);
        self.prereqs.complete(&course.id, start + span - 1);
        self.occupied.extend(start..start + span);
        self.remaining.retain(|c| c != course_id);

        let teacher_ids: Vec<TeacherId> = self
            .crew
            .get(&(course.id.clone(), start))
            .map(|t| t.iter().cloned().collect())
            .unwrap_or_default();
        let id = self.fresh_id(&course.id, &slot_ids[0]);
        debug!(
            cohort = %self.cohort.id,
            course = %course.id,
            start,
            span,
            teachers = teacher_ids.len(),
            "placed course"
        );

        Some(Placement {
            id,
            course_id: course.id.clone(),
            slot_ids,
            cohort_ids: vec![self.cohort.id.clone()],
            teacher_ids,
        })
    }

    /// Walks the timeline from `from`, committing the best eligible course at each free position.
    pub(crate) fn run(&mut self, from: usize) -> Vec<Placement> {
        let mut added = Vec::new();
        for index in from..self.timeline.len() {
            if self.remaining.is_empty() {
                break;
            }
            if self.occupied.contains(&index) {
                continue;
            }
            let candidates = self.candidates_at(index);
            trace!(index, ?candidates, "eligible courses");
            let Some(best) = self.chain.select_best(&*self, &candidates, index).cloned() else {
                debug!(cohort = %self.cohort.id, index, "no eligible course, leaving gap");
                continue;
            };
            if let Some(p) = self.commit(&best, index) {
                added.push(p);
            }
        }
        added
    }
}
