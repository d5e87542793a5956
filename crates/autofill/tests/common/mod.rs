#![allow(dead_code)]

use chrono::{Days, NaiveDate};
use types::{
    AutofillEnvelope, AutofillResult, Cohort, Course, CourseId, Instance, Placement, PlacementId,
    RuleConfig, RuleId, RuleKind, SchedulingParams, Slot, SlotId, Teacher,
};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn week(i: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 6).unwrap() + Days::new(7 * i as u64)
}

pub fn slot_id(i: usize) -> SlotId {
    SlotId(format!("w{i:02}"))
}

pub fn slots(n: usize) -> Vec<Slot> {
    (0..n)
        .map(|i| Slot {
            id: slot_id(i),
            start_date: week(i),
        })
        .collect()
}

pub fn course(id: &str, credits: u32, prereqs: &[&str]) -> Course {
    Course {
        id: id.into(),
        credits,
        prerequisites: prereqs.iter().map(|p| CourseId::from(*p)).collect(),
    }
}

pub fn cohort(id: &str, start_week: usize, size: u32, courses: &[&str]) -> Cohort {
    Cohort {
        id: id.into(),
        start_date: week(start_week),
        planned_size: size,
        courses: courses.iter().map(|c| CourseId::from(*c)).collect(),
    }
}

pub fn teacher(id: &str, courses: &[&str]) -> Teacher {
    Teacher {
        id: id.into(),
        compatible_courses: courses.iter().map(|c| CourseId::from(*c)).collect(),
        unavailable: vec![],
    }
}

pub fn rule(id: RuleId, kind: RuleKind) -> RuleConfig {
    RuleConfig {
        id,
        enabled: true,
        kind,
    }
}

/// Every scoring rule soft, placed courses kept.
pub fn open_rules() -> Vec<RuleConfig> {
    vec![
        rule(RuleId::DontMovePlacedCourses, RuleKind::Hard),
        rule(RuleId::RequireAvailableCompatibleTeachers, RuleKind::Soft),
        rule(RuleId::EconomyColocationPacking, RuleKind::Soft),
        rule(RuleId::FutureJoinCapacity, RuleKind::Soft),
        rule(RuleId::AvoidEmptySlots, RuleKind::Soft),
        rule(RuleId::AvoidOverPreferred, RuleKind::Soft),
    ]
}

pub fn placement(id: &str, course: &str, indices: &[usize], cohorts: &[&str]) -> Placement {
    Placement {
        id: PlacementId(id.into()),
        course_id: course.into(),
        slot_ids: indices.iter().map(|i| slot_id(*i)).collect(),
        cohort_ids: cohorts.iter().map(|c| (*c).into()).collect(),
        teacher_ids: vec![],
    }
}

pub fn instance(
    n_slots: usize,
    courses: Vec<Course>,
    cohorts: Vec<Cohort>,
    rules: Vec<RuleConfig>,
) -> Instance {
    Instance {
        courses,
        slots: slots(n_slots),
        cohorts,
        teachers: vec![],
        params: SchedulingParams::default(),
        rules,
    }
}

pub fn envelope(instance: Instance, placements: Vec<Placement>, cohort: &str) -> AutofillEnvelope {
    AutofillEnvelope {
        instance,
        placements,
        day_records: vec![],
        cohort_id: cohort.into(),
        pinned: vec![],
        cap_override: None,
        plan_from: None,
    }
}

fn index_of(slot: &SlotId) -> usize {
    slot.0.trim_start_matches('w').parse().unwrap()
}

/// Covered indices of the cohort's placement of `course`, if any.
pub fn placed_at(result: &AutofillResult, cohort: &str, course: &str) -> Option<Vec<usize>> {
    result
        .placements
        .iter()
        .find(|p| p.course_id.0 == course && p.cohort_ids.iter().any(|k| k.0 == cohort))
        .map(|p| p.slot_ids.iter().map(index_of).collect())
}
