//! Greedy forward-fill of a cohort's unplaced courses into the timeline.
//!
//! One pass, no backtracking: at every free slot position the best eligible
//! course under the active rule chain is committed, or the position is left
//! empty when nothing is eligible. Given the same snapshot the result is
//! always the same.

mod engine;
mod error;
mod replan;
mod scoring;

use async_trait::async_trait;
use engine::{outstanding, Fill};
use replan::{retract_future, Retraction};
use sched_core::config::resolve_caps;
use sched_core::{Planner, RuleChain, TeacherAvailability, TeacherRoster, Timeline};
use tracing::info;
use types::{AutofillEnvelope, AutofillResult, AutofillStatus, PlacementId, RuleId};

pub use error::AutofillError;

/// Auto-fills using the teacher records carried in the snapshot.
pub fn run(env: &AutofillEnvelope) -> Result<AutofillResult, AutofillError> {
    let roster = TeacherRoster::new(&env.instance.teachers);
    run_with(env, &roster)
}

/// Auto-fills with an externally supplied availability oracle.
pub fn run_with<T: TeacherAvailability + ?Sized>(
    env: &AutofillEnvelope,
    teachers: &T,
) -> Result<AutofillResult, AutofillError> {
    let inst = &env.instance;
    let cohort = inst
        .cohort(&env.cohort_id)
        .ok_or_else(|| AutofillError::UnknownCohort(env.cohort_id.clone()))?;
    let caps = resolve_caps(&inst.params, env.cap_override.as_ref());
    let chain = RuleChain::from_config(&inst.rules);
    let timeline = Timeline::build(&inst.slots);

    let mut placements = env.placements.clone();
    let mut day_records = env.day_records.clone();

    let plan_date = env
        .plan_from
        .map_or(cohort.start_date, |d| d.max(cohort.start_date));
    let Some(from) = timeline.first_on_or_after(plan_date) else {
        info!(cohort = %cohort.id, slots = timeline.len(), "no slot left to plan into");
        let unplaced = outstanding(inst, &placements, &timeline, cohort);
        return Ok(AutofillResult {
            status: AutofillStatus::NothingToSchedule,
            placements,
            day_records,
            added: vec![],
            released: vec![],
            deleted: vec![],
            unplaced,
            stats: serde_json::json!({ "method": "forward-fill", "timeline": timeline.len() }),
        });
    };

    info!(
        cohort = %cohort.id,
        from,
        slots = timeline.len(),
        rules = chain.rules().len(),
        hard_cap = caps.hard,
        preferred_cap = caps.preferred,
        "auto-fill started"
    );

    let replanning = !chain.is_hard(RuleId::DontMovePlacedCourses)
        && placements.iter().any(|p| p.has_cohort(&cohort.id));
    let retraction = if replanning {
        retract_future(
            &mut placements,
            &mut day_records,
            &cohort.id,
            from,
            &timeline,
            &env.pinned,
        )
    } else {
        Retraction::default()
    };

    let (added, unplaced, gaps) = {
        let mut fill = Fill::new(inst, &placements, &timeline, &chain, teachers, cohort, caps);
        fill.reserve(retraction.deleted.iter().cloned());
        let added = fill.run(from);
        (added, fill.remaining().to_vec(), fill.gaps(from))
    };

    let added_ids: Vec<PlacementId> = added.iter().map(|p| p.id.clone()).collect();
    placements.extend(added);

    let status = if unplaced.is_empty() {
        AutofillStatus::Complete
    } else {
        AutofillStatus::Partial
    };
    info!(
        cohort = %cohort.id,
        added = added_ids.len(),
        released = retraction.released.len(),
        deleted = retraction.deleted.len(),
        unplaced = unplaced.len(),
        gaps,
        "auto-fill finished"
    );

    Ok(AutofillResult {
        status,
        stats: serde_json::json!({
            "method": "forward-fill",
            "timeline": timeline.len(),
            "planningStart": from,
            "replanned": replanning,
            "added": added_ids.len(),
            "released": retraction.released.len(),
            "deleted": retraction.deleted.len(),
            "purgedDayRecords": retraction.purged_days,
            "gaps": gaps,
        }),
        placements,
        day_records,
        added: added_ids,
        released: retraction.released,
        deleted: retraction.deleted,
        unplaced,
    })
}

/// [`Planner`] that validates the snapshot, then runs the forward fill.
#[derive(Clone, Copy, Debug, Default)]
pub struct ForwardFill;

impl ForwardFill {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Planner for ForwardFill {
    async fn plan(&self, env: AutofillEnvelope) -> anyhow::Result<AutofillResult> {
        sched_core::validate(&env)?;
        Ok(run(&env)?)
    }
}
