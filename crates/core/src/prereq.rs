use std::collections::HashMap;
use types::{Course, CourseId};

/// Direct prerequisites plus the completion index of courses one cohort has taken.
#[derive(Clone, Debug)]
pub struct PrereqGraph<'a> {
    direct: HashMap<&'a CourseId, &'a [CourseId]>,
    completed: HashMap<CourseId, usize>,
}

impl<'a> PrereqGraph<'a> {
    pub fn new(courses: &'a [Course]) -> Self {
        Self {
            direct: courses
                .iter()
                .map(|c| (&c.id, c.prerequisites.as_slice()))
                .collect(),
            completed: HashMap::new(),
        }
    }

    pub fn prerequisites(&self, course: &CourseId) -> &'a [CourseId] {
        self.direct.get(course).copied().unwrap_or(&[])
    }

    /// Records `course` as finished at `last_index`; keeps the latest completion.
    pub fn complete(&mut self, course: &CourseId, last_index: usize) {
        self.completed
            .entry(course.clone())
            .and_modify(|i| *i = (*i).max(last_index))
            .or_insert(last_index);
    }

    pub fn completed_by(&self, course: &CourseId) -> Option<usize> {
        self.completed.get(course).copied()
    }

    pub fn is_satisfied(&self, course: &CourseId, start: usize) -> bool {
        self.is_satisfied_with(course, start, None)
    }

    /// Same as [`is_satisfied`](Self::is_satisfied) with one assumed extra completion.
    pub fn is_satisfied_with(
        &self,
        course: &CourseId,
        start: usize,
        assumed: Option<(&CourseId, usize)>,
    ) -> bool {
        self.prerequisites(course).iter().all(|p| {
            let done = match assumed {
                Some((c, last)) if c == p => Some(last),
                _ => self.completed_by(p),
            };
            matches!(done, Some(i) if i < start)
        })
    }
}
