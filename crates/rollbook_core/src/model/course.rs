//! Course record and its flat snapshot form.
//!
//! # Invariants
//! - `instructor_id` is a weak back-reference: a course never owns its
//!   instructor, and at most one instructor is linked at a time.
//! - The enrolled-student set is mutated only through the roster.

use crate::model::person::{require_id, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A course, its optional instructor link and its enrolled students.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Course {
    pub(crate) course_id: String,
    pub(crate) course_name: String,
    pub(crate) instructor_id: Option<String>,
    pub(crate) enrolled_students: BTreeSet<String>,
}

impl Course {
    /// Builds an unassigned course with no enrollments.
    pub fn new(
        course_id: impl Into<String>,
        course_name: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let course_id = course_id.into();
        require_id("course_id", &course_id)?;
        let mut course = Self {
            course_id,
            course_name: String::new(),
            instructor_id: None,
            enrolled_students: BTreeSet::new(),
        };
        course.set_course_name(course_name)?;
        Ok(course)
    }

    pub fn course_id(&self) -> &str {
        &self.course_id
    }

    pub fn course_name(&self) -> &str {
        &self.course_name
    }

    /// Replaces the display name; rejects empty values without applying them.
    pub fn set_course_name(&mut self, name: impl Into<String>) -> Result<(), ValidationError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyCourseName);
        }
        self.course_name = name;
        Ok(())
    }

    /// Id of the assigned instructor, if any.
    pub fn instructor_id(&self) -> Option<&str> {
        self.instructor_id.as_deref()
    }

    /// Ids of enrolled students, ordered.
    pub fn enrolled_students(&self) -> &BTreeSet<String> {
        &self.enrolled_students
    }

    /// Flat key-value form carrying student ids and the nullable
    /// instructor id.
    pub fn snapshot(&self) -> CourseSnapshot {
        CourseSnapshot {
            course_id: self.course_id.clone(),
            course_name: self.course_name.clone(),
            instructor_id: self.instructor_id.clone(),
            enrolled_students: self.enrolled_students.iter().cloned().collect(),
        }
    }
}

/// Wire form of a [`Course`] used by the snapshot document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseSnapshot {
    pub course_id: String,
    pub course_name: String,
    pub instructor_id: Option<String>,
    #[serde(default)]
    pub enrolled_students: Vec<String>,
}

impl CourseSnapshot {
    /// Rebuilds the course without its edges; the instructor link and the
    /// enrollment list are replayed by the caller once both endpoints exist.
    pub fn restore(&self) -> Result<Course, ValidationError> {
        Course::new(self.course_id.clone(), self.course_name.clone())
    }
}
