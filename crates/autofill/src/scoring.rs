use crate::engine::{Assumed, Fill};
use sched_core::rules::COLOCATION_WEIGHT;
use sched_core::{CandidateScorer, TeacherAvailability};
use types::{Course, CourseId, RuleId};

impl<'a, T: TeacherAvailability + ?Sized> Fill<'a, T> {
    /// Students already starting this course here dominate; the projected
    /// headcount breaks ties.
    fn colocation(&self, course: &CourseId, span: usize, start: usize) -> i64 {
        let primary = self.ledger.starting(course, start) as i64 * COLOCATION_WEIGHT;
        let projected = self.ledger.projected_max(course, span, start, self.size) as i64;
        let secondary = if self
            .chain
            .outranks(RuleId::AvoidOverPreferred, RuleId::EconomyColocationPacking)
        {
            let preferred = self.ledger.caps().preferred as i64;
            -(projected - preferred).abs()
        } else {
            projected
        };
        primary + secondary
    }

    /// Seats later cohorts could still take in this run, smallest cohorts first.
    fn future_join(&self, course: &CourseId, span: usize, start: usize) -> i64 {
        let Some(date) = self.timeline.date(start) else {
            return 0;
        };
        let mut left = self.ledger.headroom(course, span, start, self.size);
        let mut joined = 0i64;
        for k in &self.joiners {
            if k.start_date > date || !k.takes(course) || self.taken.contains(&(&k.id, course)) {
                continue;
            }
            if k.planned_size > left {
                break;
            }
            left -= k.planned_size;
            joined += k.planned_size as i64;
        }
        joined
    }

    /// Other courses still able to start right after this one.
    fn followers(&self, course: &Course, start: usize) -> i64 {
        let span = course.span();
        let next = start + span;
        if next >= self.timeline.len() {
            return 0;
        }
        let assumed = Assumed {
            course: &course.id,
            start,
            span,
        };
        self.remaining
            .iter()
            .filter(|c| **c != course.id)
            .filter_map(|c| self.course(c))
            .filter(|other| self.eligible(other, next, Some(&assumed)))
            .count() as i64
    }

    fn overage(&self, course: &CourseId, span: usize, start: usize) -> i64 {
        let projected = self.ledger.projected_max(course, span, start, self.size);
        projected.saturating_sub(self.ledger.caps().preferred) as i64
    }
}

impl<'a, T: TeacherAvailability + ?Sized> CandidateScorer for Fill<'a, T> {
    fn score(&self, rule: RuleId, course: &CourseId, start: usize) -> i64 {
        let Some(c) = self.course(course) else {
            return 0;
        };
        let span = c.span();
        match rule {
            RuleId::RequireAvailableCompatibleTeachers => {
                self.available_teachers(course, start, span).len() as i64
            }
            RuleId::EconomyColocationPacking => self.colocation(course, span, start),
            RuleId::FutureJoinCapacity => self.future_join(course, span, start),
            RuleId::AvoidEmptySlots => self.followers(c, start),
            RuleId::AvoidOverPreferred => self.overage(course, span, start),
            RuleId::DontMovePlacedCourses | RuleId::Unsupported => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Days, NaiveDate};
    use sched_core::config::Caps;
    use sched_core::{RuleChain, TeacherRoster, Timeline};
    use types::{Cohort, Instance, Placement, PlacementId, RuleConfig, RuleKind, Slot};

    fn instance(rules: Vec<RuleConfig>) -> Instance {
        let first = NaiveDate::from_ymd_opt(2025, 1, 6).unwrap();
        let course = |id: &str| Course {
            id: id.into(),
            credits: 5,
            prerequisites: vec![],
        };
        let cohort = |id: &str, size| Cohort {
            id: id.into(),
            start_date: first,
            planned_size: size,
            courses: vec![],
        };
        Instance {
            courses: vec![course("X"), course("Y")],
            slots: (0..2u64)
                .map(|i| Slot {
                    id: format!("s{i}").as_str().into(),
                    start_date: first + Days::new(7 * i),
                })
                .collect(),
            cohorts: vec![cohort("k1", 40), cohort("k2", 30)],
            rules,
            ..Default::default()
        }
    }

    fn soft(id: RuleId) -> RuleConfig {
        RuleConfig {
            id,
            enabled: true,
            kind: RuleKind::Soft,
        }
    }

    /// Economy scores of X (k2 already starts there) and Y at position 0 for k1.
    fn economy(rules: Vec<RuleConfig>) -> (i64, i64) {
        let inst = instance(rules);
        let placements = vec![Placement {
            id: PlacementId("p".into()),
            course_id: "X".into(),
            slot_ids: vec!["s0".into()],
            cohort_ids: vec!["k2".into()],
            teacher_ids: vec![],
        }];
        let timeline = Timeline::build(&inst.slots);
        let chain = RuleChain::from_config(&inst.rules);
        let roster = TeacherRoster::new(&[]);
        let fill = Fill::new(
            &inst,
            &placements,
            &timeline,
            &chain,
            &roster,
            &inst.cohorts[0],
            Caps::default(),
        );
        let rule = RuleId::EconomyColocationPacking;
        (
            fill.score(rule, &"X".into(), 0),
            fill.score(rule, &"Y".into(), 0),
        )
    }

    #[test]
    fn colocation_tie_break_tracks_projected_headcount() {
        let (x, y) = economy(vec![
            soft(RuleId::EconomyColocationPacking),
            soft(RuleId::AvoidOverPreferred),
        ]);
        assert_eq!(x, 30 * COLOCATION_WEIGHT + 70);
        assert_eq!(y, 40);
    }

    #[test]
    fn colocation_tie_break_aims_at_preferred_cap_when_it_ranks_higher() {
        let (x, y) = economy(vec![
            soft(RuleId::AvoidOverPreferred),
            soft(RuleId::EconomyColocationPacking),
        ]);
        assert_eq!(x, 30 * COLOCATION_WEIGHT - 30);
        assert_eq!(y, -60);
    }
}
