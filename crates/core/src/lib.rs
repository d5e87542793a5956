pub mod config;
pub mod ledger;
pub mod prereq;
pub mod rules;
pub mod teachers;
pub mod timeline;

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub use config::Caps;
pub use ledger::CapacityLedger;
pub use prereq::PrereqGraph;
pub use rules::{CandidateScorer, RuleChain};
pub use teachers::{TeacherAvailability, TeacherRoster};
pub use timeline::Timeline;
pub use types::{
    AutofillEnvelope, AutofillResult, Cohort, Course, CourseId, Instance, Placement, Slot, Teacher,
};

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("invalid snapshot: {0}")]
    Msg(String),
}

/// Rejects snapshots the engine must not be handed.
///
/// An empty slot list is accepted; the engine simply has nothing to fill.
pub fn validate(env: &AutofillEnvelope) -> Result<(), ValidationError> {
    let inst = &env.instance;
    let mut errors: Vec<String> = Vec::new();

    fn chk_unique<I: ToString>(name: &str, ids: impl Iterator<Item = I>, errors: &mut Vec<String>) {
        let mut seen = HashSet::new();
        for id in ids {
            let s = id.to_string();
            if !seen.insert(s.clone()) {
                errors.push(format!("duplicate {name} id: {s}"));
            }
        }
    }
    chk_unique("course", inst.courses.iter().map(|x| &x.id), &mut errors);
    chk_unique("slot", inst.slots.iter().map(|x| &x.id), &mut errors);
    chk_unique("cohort", inst.cohorts.iter().map(|x| &x.id), &mut errors);
    chk_unique("teacher", inst.teachers.iter().map(|x| &x.id), &mut errors);
    chk_unique("placement", env.placements.iter().map(|x| &x.id), &mut errors);

    let courses: HashSet<_> = inst.courses.iter().map(|c| &c.id).collect();
    let slots: HashSet<_> = inst.slots.iter().map(|s| &s.id).collect();
    let cohorts: HashSet<_> = inst.cohorts.iter().map(|c| &c.id).collect();

    if !cohorts.contains(&env.cohort_id) {
        errors.push(format!("target cohort {} does not exist", env.cohort_id));
    }

    for c in &inst.courses {
        for p in &c.prerequisites {
            if !courses.contains(p) {
                errors.push(format!("course {} references missing prerequisite {}", c.id, p));
            }
        }
    }
    if let Some(cycle_at) = find_prerequisite_cycle(&inst.courses) {
        errors.push(format!("prerequisites form a cycle through course {cycle_at}"));
    }

    for k in &inst.cohorts {
        for c in &k.courses {
            if !courses.contains(c) {
                errors.push(format!("cohort {} references missing course {}", k.id, c));
            }
        }
    }

    for t in &inst.teachers {
        for c in &t.compatible_courses {
            if !courses.contains(c) {
                errors.push(format!("teacher {} references missing course {}", t.id, c));
            }
        }
    }

    for p in &env.placements {
        if !courses.contains(&p.course_id) {
            errors.push(format!("placement {} references missing course {}", p.id, p.course_id));
        }
        if p.slot_ids.is_empty() {
            errors.push(format!("placement {} covers no slot", p.id));
        }
        for s in &p.slot_ids {
            if !slots.contains(s) {
                errors.push(format!("placement {} references missing slot {}", p.id, s));
            }
        }
        if p.cohort_ids.is_empty() {
            errors.push(format!("placement {} has no cohort", p.id));
        }
        for k in &p.cohort_ids {
            if !cohorts.contains(k) {
                errors.push(format!("placement {} references missing cohort {}", p.id, k));
            }
        }
    }

    let placement_ids: HashSet<_> = env.placements.iter().map(|p| &p.id).collect();
    for id in &env.pinned {
        if !placement_ids.contains(id) {
            errors.push(format!("pinned placement {id} does not exist"));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::Msg(errors.join("; ")))
    }
}

fn find_prerequisite_cycle(courses: &[Course]) -> Option<CourseId> {
    #[derive(Clone, Copy, PartialEq)]
    enum Mark {
        Open,
        Done,
    }

    fn visit<'a>(
        id: &'a CourseId,
        edges: &HashMap<&'a CourseId, &'a [CourseId]>,
        marks: &mut HashMap<&'a CourseId, Mark>,
    ) -> Option<CourseId> {
        match marks.get(id) {
            Some(Mark::Done) => return None,
            Some(Mark::Open) => return Some(id.clone()),
            None => {}
        }
        marks.insert(id, Mark::Open);
        for p in edges.get(id).copied().unwrap_or(&[]) {
            if let Some(c) = visit(p, edges, marks) {
                return Some(c);
            }
        }
        marks.insert(id, Mark::Done);
        None
    }

    let edges: HashMap<&CourseId, &[CourseId]> = courses
        .iter()
        .map(|c| (&c.id, c.prerequisites.as_slice()))
        .collect();
    let mut marks = HashMap::new();
    let mut ids: Vec<&CourseId> = edges.keys().copied().collect();
    ids.sort();
    ids.into_iter().find_map(|id| visit(id, &edges, &mut marks))
}

/// Asynchronous entry point for anything that can auto-fill a cohort.
#[async_trait]
pub trait Planner: Send + Sync + 'static {
    async fn plan(&self, env: AutofillEnvelope) -> anyhow::Result<AutofillResult>;
}
