//! Rule registry: which rules are active, in which priority, and how two
//! candidates are ranked against each other.
//!
//! Hard rules always outrank soft rules, whatever order the configuration
//! lists them in. Within each kind the configured order is kept.

use std::cmp::Ordering;
use types::{CourseId, RuleConfig, RuleId, RuleKind};

/// Weight of the co-location signal in `economyColocationPacking`.
pub const COLOCATION_WEIGHT: i64 = 1_000_000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Maximize,
    Minimize,
}

/// Legacy ordering used when no rule configuration is supplied.
pub const LEGACY_ORDER: [RuleId; 6] = [
    RuleId::RequireAvailableCompatibleTeachers,
    RuleId::EconomyColocationPacking,
    RuleId::FutureJoinCapacity,
    RuleId::AvoidEmptySlots,
    RuleId::AvoidOverPreferred,
    RuleId::DontMovePlacedCourses,
];

pub fn direction(rule: RuleId) -> Option<Direction> {
    match rule {
        RuleId::RequireAvailableCompatibleTeachers
        | RuleId::EconomyColocationPacking
        | RuleId::FutureJoinCapacity
        | RuleId::AvoidEmptySlots => Some(Direction::Maximize),
        RuleId::AvoidOverPreferred => Some(Direction::Minimize),
        RuleId::DontMovePlacedCourses | RuleId::Unsupported => None,
    }
}

pub fn is_supported(rule: RuleId) -> bool {
    rule != RuleId::Unsupported
}

pub fn default_rules() -> Vec<RuleConfig> {
    LEGACY_ORDER
        .iter()
        .map(|&id| RuleConfig {
            id,
            enabled: true,
            kind: match id {
                RuleId::RequireAvailableCompatibleTeachers | RuleId::DontMovePlacedCourses => {
                    RuleKind::Hard
                }
                _ => RuleKind::Soft,
            },
        })
        .collect()
}

/// Per-rule score of placing `course` starting at timeline position `start`.
pub trait CandidateScorer {
    fn score(&self, rule: RuleId, course: &CourseId, start: usize) -> i64;
}

/// Enabled rules in effective priority order.
#[derive(Clone, Debug, Default)]
pub struct RuleChain {
    rules: Vec<(RuleId, RuleKind)>,
}

impl RuleChain {
    pub fn from_config(config: &[RuleConfig]) -> Self {
        let defaults;
        let config = if config.is_empty() {
            defaults = default_rules();
            defaults.as_slice()
        } else {
            config
        };

        let mut seen: Vec<RuleId> = Vec::new();
        let mut hard = Vec::new();
        let mut soft = Vec::new();
        for r in config {
            if !r.enabled || !is_supported(r.id) || seen.contains(&r.id) {
                continue;
            }
            seen.push(r.id);
            match r.kind {
                RuleKind::Hard => hard.push((r.id, r.kind)),
                RuleKind::Soft => soft.push((r.id, r.kind)),
            }
        }
        hard.extend(soft);
        Self { rules: hard }
    }

    pub fn rules(&self) -> &[(RuleId, RuleKind)] {
        &self.rules
    }

    pub fn is_enabled(&self, rule: RuleId) -> bool {
        self.rank(rule).is_some()
    }

    pub fn is_hard(&self, rule: RuleId) -> bool {
        self.rules
            .iter()
            .any(|&(id, kind)| id == rule && kind == RuleKind::Hard)
    }

    pub fn rank(&self, rule: RuleId) -> Option<usize> {
        self.rules.iter().position(|&(id, _)| id == rule)
    }

    /// True when `a` is active and comes before `b` (or `b` is inactive).
    pub fn outranks(&self, a: RuleId, b: RuleId) -> bool {
        match (self.rank(a), self.rank(b)) {
            (Some(ra), Some(rb)) => ra < rb,
            (Some(_), None) => true,
            _ => false,
        }
    }

    fn scoring(&self) -> impl Iterator<Item = (RuleId, Direction)> + '_ {
        self.rules
            .iter()
            .filter_map(|&(id, _)| direction(id).map(|d| (id, d)))
    }

    /// Orders two candidates at the same start; `Less` means `a` is preferred.
    pub fn compare<S: CandidateScorer + ?Sized>(
        &self,
        scorer: &S,
        a: &CourseId,
        b: &CourseId,
        start: usize,
    ) -> Ordering {
        for (rule, dir) in self.scoring() {
            let sa = scorer.score(rule, a, start);
            let sb = scorer.score(rule, b, start);
            let ord = match dir {
                Direction::Maximize => sb.cmp(&sa),
                Direction::Minimize => sa.cmp(&sb),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        a.cmp(b)
    }

    /// Top-ranked candidate, scoring each candidate once per rule.
    pub fn select_best<'c, S: CandidateScorer + ?Sized>(
        &self,
        scorer: &S,
        candidates: &'c [CourseId],
        start: usize,
    ) -> Option<&'c CourseId> {
        let rules: Vec<(RuleId, Direction)> = self.scoring().collect();
        candidates
            .iter()
            .map(|c| {
                let key: Vec<i64> = rules
                    .iter()
                    .map(|&(rule, dir)| {
                        let s = scorer.score(rule, c, start);
                        match dir {
                            Direction::Maximize => s.saturating_neg(),
                            Direction::Minimize => s,
                        }
                    })
                    .collect();
                (key, c)
            })
            .min()
            .map(|(_, c)| c)
    }
}
