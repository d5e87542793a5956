use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap, HashSet};
use types::{CourseId, Teacher, TeacherId};

/// Which teachers can run a course on a given date.
pub trait TeacherAvailability {
    /// Teachers compatible with `course` and not marked unavailable on `date`.
    fn available_compatible(&self, course: &CourseId, date: NaiveDate) -> BTreeSet<TeacherId>;

    /// Teachers free for every date of a span.
    fn available_for_span(&self, course: &CourseId, dates: &[NaiveDate]) -> BTreeSet<TeacherId> {
        let mut iter = dates.iter();
        let Some(first) = iter.next() else {
            return BTreeSet::new();
        };
        let mut acc = self.available_compatible(course, *first);
        for d in iter {
            if acc.is_empty() {
                break;
            }
            let next = self.available_compatible(course, *d);
            acc.retain(|t| next.contains(t));
        }
        acc
    }
}

/// Availability backed by the instance's teacher records.
#[derive(Clone, Debug, Default)]
pub struct TeacherRoster {
    compatible: HashMap<CourseId, Vec<TeacherId>>,
    unavailable: HashMap<TeacherId, HashSet<NaiveDate>>,
}

impl TeacherRoster {
    pub fn new(teachers: &[Teacher]) -> Self {
        let mut compatible: HashMap<CourseId, Vec<TeacherId>> = HashMap::new();
        let mut unavailable = HashMap::new();
        for t in teachers {
            for c in &t.compatible_courses {
                compatible.entry(c.clone()).or_default().push(t.id.clone());
            }
            unavailable.insert(t.id.clone(), t.unavailable.iter().copied().collect());
        }
        Self {
            compatible,
            unavailable,
        }
    }
}

impl TeacherAvailability for TeacherRoster {
    fn available_compatible(&self, course: &CourseId, date: NaiveDate) -> BTreeSet<TeacherId> {
        self.compatible
            .get(course)
            .into_iter()
            .flatten()
            .filter(|t| {
                self.unavailable
                    .get(*t)
                    .map_or(true, |days| !days.contains(&date))
            })
            .cloned()
            .collect()
    }
}
