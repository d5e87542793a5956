use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use utoipa::ToSchema;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(
            Clone,
            Debug,
            Serialize,
            Deserialize,
            ToSchema,
            JsonSchema,
            Eq,
            PartialEq,
            Ord,
            PartialOrd,
            Hash,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}
id_newtype!(CourseId);
id_newtype!(SlotId);
id_newtype!(CohortId);
id_newtype!(TeacherId);
id_newtype!(PlacementId);

impl CohortId {
    /// Reading order of cohort ids: digit runs compare by value, so `k9`
    /// comes before `k10`. Decides which cohorts count as later intakes.
    /// Plain `Ord` stays lexicographic and is only used for tie-breaks.
    pub fn natural_cmp(&self, other: &Self) -> Ordering {
        let mut a = chunks(&self.0);
        let mut b = chunks(&other.0);
        loop {
            let ord = match (a.next(), b.next()) {
                (None, None) => return self.0.cmp(&other.0),
                (None, Some(_)) => return Ordering::Less,
                (Some(_), None) => return Ordering::Greater,
                (Some(x), Some(y)) => chunk_cmp(x, y),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
    }
}

/// Splits into alternating runs of ASCII digits and everything else.
fn chunks(s: &str) -> impl Iterator<Item = &str> + '_ {
    let mut rest = s;
    std::iter::from_fn(move || {
        let digit = rest.chars().next()?.is_ascii_digit();
        let end = rest
            .find(|c: char| c.is_ascii_digit() != digit)
            .unwrap_or(rest.len());
        let (head, tail) = rest.split_at(end);
        rest = tail;
        Some(head)
    })
}

fn chunk_cmp(x: &str, y: &str) -> Ordering {
    let numeric = |s: &str| s.starts_with(|c: char| c.is_ascii_digit());
    if numeric(x) && numeric(y) {
        let (x, y) = (x.trim_start_matches('0'), y.trim_start_matches('0'));
        x.len().cmp(&y.len()).then_with(|| x.cmp(y))
    } else {
        x.cmp(y)
    }
}

/// Credit weight from which a course runs over two consecutive slots.
pub const SPANNING_CREDITS: u32 = 15;

pub const DEFAULT_MAX_STUDENTS_HARD: u32 = 130;
pub const DEFAULT_MAX_STUDENTS_PREFERRED: u32 = 100;

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,
    pub credits: u32,
    #[serde(default)]
    pub prerequisites: Vec<CourseId>,
}

impl Course {
    /// Number of consecutive slots a run of this course occupies.
    pub fn span(&self) -> usize {
        if self.credits >= SPANNING_CREDITS {
            2
        } else {
            1
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Slot {
    pub id: SlotId,
    pub start_date: NaiveDate,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cohort {
    pub id: CohortId,
    pub start_date: NaiveDate,
    pub planned_size: u32,
    /// Curriculum of the cohort. Empty means every course of the instance.
    #[serde(default)]
    pub courses: Vec<CourseId>,
}

impl Cohort {
    pub fn takes(&self, course: &CourseId) -> bool {
        self.courses.is_empty() || self.courses.contains(course)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: TeacherId,
    #[serde(default)]
    pub compatible_courses: Vec<CourseId>,
    #[serde(default)]
    pub unavailable: Vec<NaiveDate>,
}

/// A course run: one course over one or more slots, shared by the listed cohorts.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub id: PlacementId,
    pub course_id: CourseId,
    pub slot_ids: Vec<SlotId>,
    pub cohort_ids: Vec<CohortId>,
    #[serde(default)]
    pub teacher_ids: Vec<TeacherId>,
}

impl Placement {
    pub fn has_cohort(&self, cohort: &CohortId) -> bool {
        self.cohort_ids.contains(cohort)
    }
}

/// Day-level bookkeeping attached to a (course, slot) pair.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DayRecord {
    pub course_id: CourseId,
    pub slot_id: SlotId,
    pub date: NaiveDate,
    #[serde(default)]
    pub teacher_id: Option<TeacherId>,
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
)]
#[serde(rename_all = "camelCase")]
pub enum RuleId {
    RequireAvailableCompatibleTeachers,
    EconomyColocationPacking,
    FutureJoinCapacity,
    AvoidEmptySlots,
    AvoidOverPreferred,
    DontMovePlacedCourses,
    #[serde(other)]
    Unsupported,
}

impl RuleId {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleId::RequireAvailableCompatibleTeachers => "requireAvailableCompatibleTeachers",
            RuleId::EconomyColocationPacking => "economyColocationPacking",
            RuleId::FutureJoinCapacity => "futureJoinCapacity",
            RuleId::AvoidEmptySlots => "avoidEmptySlots",
            RuleId::AvoidOverPreferred => "avoidOverPreferred",
            RuleId::DontMovePlacedCourses => "dontMovePlacedCourses",
            RuleId::Unsupported => "unsupported",
        }
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq, Hash,
)]
#[serde(rename_all = "lowercase")]
pub enum RuleKind {
    Hard,
    Soft,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RuleConfig {
    pub id: RuleId,
    pub enabled: bool,
    pub kind: RuleKind,
}

/// Raw capacity settings as configured; non-positive values fall back to defaults.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct SchedulingParams {
    pub max_students_hard: i64,
    pub max_students_preferred: i64,
}

impl Default for SchedulingParams {
    fn default() -> Self {
        Self {
            max_students_hard: DEFAULT_MAX_STUDENTS_HARD as i64,
            max_students_preferred: DEFAULT_MAX_STUDENTS_PREFERRED as i64,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct CapOverride {
    #[serde(default)]
    pub max_students_hard: Option<u32>,
    #[serde(default)]
    pub max_students_preferred: Option<u32>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    pub courses: Vec<Course>,
    pub slots: Vec<Slot>,
    pub cohorts: Vec<Cohort>,
    #[serde(default)]
    pub teachers: Vec<Teacher>,
    #[serde(default)]
    pub params: SchedulingParams,
    #[serde(default)]
    pub rules: Vec<RuleConfig>,
}

impl Instance {
    pub fn course(&self, id: &CourseId) -> Option<&Course> {
        self.courses.iter().find(|c| &c.id == id)
    }

    pub fn cohort(&self, id: &CohortId) -> Option<&Cohort> {
        self.cohorts.iter().find(|c| &c.id == id)
    }
}

/// Read-only snapshot handed to the auto-fill engine for one cohort.
#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutofillEnvelope {
    pub instance: Instance,
    #[serde(default)]
    pub placements: Vec<Placement>,
    #[serde(default)]
    pub day_records: Vec<DayRecord>,
    pub cohort_id: CohortId,
    /// Placements the replanning pass must leave alone.
    #[serde(default)]
    pub pinned: Vec<PlacementId>,
    #[serde(default)]
    pub cap_override: Option<CapOverride>,
    /// Date of the current slot; nothing before it is planned or retracted.
    #[serde(default)]
    pub plan_from: Option<NaiveDate>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, ToSchema, JsonSchema, Eq, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum AutofillStatus {
    Complete,
    Partial,
    NothingToSchedule,
}

#[derive(Clone, Debug, Serialize, Deserialize, ToSchema, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AutofillResult {
    pub status: AutofillStatus,
    pub placements: Vec<Placement>,
    pub day_records: Vec<DayRecord>,
    pub added: Vec<PlacementId>,
    pub released: Vec<PlacementId>,
    pub deleted: Vec<PlacementId>,
    pub unplaced: Vec<CourseId>,
    pub stats: serde_json::Value,
}
