mod common;

use autofill::run;
use common::*;
use proptest::prelude::*;
use sched_core::Timeline;
use std::collections::HashMap;
use types::{Course, Instance, Placement, RuleConfig, RuleId, RuleKind};

const HARD_CAP: i64 = 100;

fn curriculum() -> impl Strategy<Value = Vec<Course>> {
    prop::collection::vec((prop::sample::select(vec![5u32, 10, 15]), any::<u8>()), 2..7).prop_map(
        |specs| {
            specs
                .into_iter()
                .enumerate()
                .map(|(i, (credits, mask))| Course {
                    id: format!("c{i}").as_str().into(),
                    credits,
                    // Only earlier courses can be prerequisites, so the graph stays acyclic.
                    prerequisites: (0..i)
                        .filter(|j| mask & (1 << (j % 8)) != 0 && (i - j) <= 2)
                        .map(|j| format!("c{j}").as_str().into())
                        .collect(),
                })
                .collect()
        },
    )
}

fn rule_config() -> impl Strategy<Value = Vec<RuleConfig>> {
    let ids = vec![
        RuleId::EconomyColocationPacking,
        RuleId::FutureJoinCapacity,
        RuleId::AvoidEmptySlots,
        RuleId::AvoidOverPreferred,
    ];
    prop::collection::vec(any::<bool>(), ids.len()).prop_map(move |hard| {
        let mut rules: Vec<RuleConfig> = ids
            .iter()
            .zip(hard)
            .map(|(id, h)| rule(*id, if h { RuleKind::Hard } else { RuleKind::Soft }))
            .collect();
        rules.push(rule(RuleId::DontMovePlacedCourses, RuleKind::Hard));
        rules
    })
}

fn build(
    courses: Vec<Course>,
    sizes: Vec<(u32, usize)>,
    n_slots: usize,
    rules: Vec<RuleConfig>,
) -> Instance {
    let cohorts = sizes
        .into_iter()
        .enumerate()
        .map(|(i, (size, start))| cohort(&format!("k{i}"), start, size, &[]))
        .collect();
    let mut inst = instance(n_slots, courses, cohorts, rules);
    inst.params.max_students_hard = HARD_CAP;
    inst
}

/// Fills every cohort in id order, feeding each result into the next run.
fn fill_all(inst: &Instance) -> Vec<Placement> {
    let mut placements = Vec::new();
    for k in &inst.cohorts {
        let env = envelope(inst.clone(), placements, &k.id.0);
        placements = run(&env).unwrap().placements;
    }
    placements
}

proptest! {
    #[test]
    fn committed_schedules_respect_hard_invariants(
        courses in curriculum(),
        sizes in prop::collection::vec((10u32..70, 0usize..3), 1..4),
        n_slots in 3usize..10,
        rules in rule_config(),
    ) {
        let inst = build(courses, sizes, n_slots, rules);
        let placements = fill_all(&inst);
        let timeline = Timeline::build(&inst.slots);
        let size: HashMap<_, _> = inst.cohorts.iter().map(|k| (&k.id, k.planned_size)).collect();

        let mut load: HashMap<(&str, usize), u32> = HashMap::new();
        for p in &placements {
            let covered = timeline.covered(p).unwrap();
            let course = inst.course(&p.course_id).unwrap();
            prop_assert_eq!(covered.len(), course.span());
            let head: u32 = p.cohort_ids.iter().map(|k| size[k]).sum();
            for i in &covered {
                *load.entry((p.course_id.0.as_str(), *i)).or_default() += head;
            }
        }
        for (key, total) in &load {
            prop_assert!(*total as i64 <= HARD_CAP, "{:?} carries {}", key, total);
        }

        for a in &placements {
            for b in &placements {
                if a.id == b.id || a.course_id != b.course_id {
                    continue;
                }
                let ra = timeline.covered(a).unwrap();
                let rb = timeline.covered(b).unwrap();
                let overlap = ra.iter().any(|i| rb.contains(i));
                prop_assert!(ra[0] == rb[0] || !overlap, "skewed runs {} and {}", a.id, b.id);
            }
        }

        for k in &inst.cohorts {
            let own: Vec<&Placement> = placements.iter().filter(|p| p.has_cohort(&k.id)).collect();
            let mut seen = std::collections::HashSet::new();
            for p in &own {
                for i in timeline.covered(p).unwrap() {
                    prop_assert!(seen.insert(i), "cohort {} double-booked at {}", k.id, i);
                    prop_assert!(timeline.date(i).unwrap() >= k.start_date);
                }
            }
            for p in &own {
                let start = timeline.start_of(p).unwrap();
                for pre in &inst.course(&p.course_id).unwrap().prerequisites {
                    let done = own
                        .iter()
                        .find(|q| &q.course_id == pre)
                        .and_then(|q| timeline.covered(q))
                        .and_then(|c| c.last().copied());
                    prop_assert!(
                        matches!(done, Some(end) if end < start),
                        "{} placed before prerequisite {} in cohort {}", p.course_id, pre, k.id
                    );
                }
            }
        }
    }

    #[test]
    fn runs_are_replayable(
        courses in curriculum(),
        sizes in prop::collection::vec((10u32..70, 0usize..3), 1..4),
        n_slots in 3usize..10,
        rules in rule_config(),
    ) {
        let inst = build(courses, sizes, n_slots, rules);
        prop_assert_eq!(fill_all(&inst), fill_all(&inst));
    }

    #[test]
    fn rerun_with_nothing_new_is_a_no_op(
        courses in curriculum(),
        sizes in prop::collection::vec((10u32..70, 0usize..3), 1..4),
        n_slots in 3usize..10,
        rules in rule_config(),
    ) {
        let inst = build(courses, sizes, n_slots, rules);
        let placements = fill_all(&inst);
        for k in &inst.cohorts {
            let res = run(&envelope(inst.clone(), placements.clone(), &k.id.0)).unwrap();
            // Courses left unplaced stay unplaceable, so nothing is added.
            prop_assert!(res.added.is_empty());
            prop_assert_eq!(&res.placements, &placements);
        }
    }
}
