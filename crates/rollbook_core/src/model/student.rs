//! Student record and its flat snapshot form.

use crate::model::person::{require_id, PersonProfile, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A student plus the ids of courses they are registered in.
///
/// The course-id set is mutated only through [`crate::model::roster::Roster`]
/// so both sides of every registration edge stay in step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Student {
    pub(crate) student_id: String,
    pub(crate) profile: PersonProfile,
    pub(crate) registered_courses: BTreeSet<String>,
}

impl Student {
    /// Builds a student with no registrations. Rejects an empty id.
    pub fn new(
        student_id: impl Into<String>,
        profile: PersonProfile,
    ) -> Result<Self, ValidationError> {
        let student_id = student_id.into();
        require_id("student_id", &student_id)?;
        Ok(Self {
            student_id,
            profile,
            registered_courses: BTreeSet::new(),
        })
    }

    pub fn student_id(&self) -> &str {
        &self.student_id
    }

    pub fn profile(&self) -> &PersonProfile {
        &self.profile
    }

    /// Mutable profile access; all writes still go through the profile's
    /// validating setters.
    pub fn profile_mut(&mut self) -> &mut PersonProfile {
        &mut self.profile
    }

    /// Ids of courses this student is registered in, ordered.
    pub fn registered_courses(&self) -> &BTreeSet<String> {
        &self.registered_courses
    }

    /// Flat key-value form carrying course ids instead of references.
    pub fn snapshot(&self) -> StudentSnapshot {
        StudentSnapshot {
            student_id: self.student_id.clone(),
            name: self.profile.name().to_string(),
            age: self.profile.age(),
            email: self.profile.email().to_string(),
            registered_courses: self.registered_courses.iter().cloned().collect(),
        }
    }
}

/// Wire form of a [`Student`] used by the snapshot document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentSnapshot {
    pub student_id: String,
    pub name: String,
    pub age: i64,
    pub email: String,
    #[serde(default)]
    pub registered_courses: Vec<String>,
}

impl StudentSnapshot {
    /// Rebuilds the student record, re-validating every field.
    ///
    /// The `registered_courses` ids are left for the caller to relink:
    /// courses must exist before edges can be re-established.
    pub fn restore(&self) -> Result<Student, ValidationError> {
        let profile = PersonProfile::new(self.name.clone(), self.age, self.email.clone())?;
        Student::new(self.student_id.clone(), profile)
    }
}
