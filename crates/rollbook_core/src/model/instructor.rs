//! Instructor record and its flat snapshot form.

use crate::model::person::{require_id, PersonProfile, ValidationError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// An instructor plus the ids of courses assigned to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instructor {
    pub(crate) instructor_id: String,
    pub(crate) profile: PersonProfile,
    pub(crate) assigned_courses: BTreeSet<String>,
}

impl Instructor {
    /// Builds an instructor with no assignments. Rejects an empty id.
    pub fn new(
        instructor_id: impl Into<String>,
        profile: PersonProfile,
    ) -> Result<Self, ValidationError> {
        let instructor_id = instructor_id.into();
        require_id("instructor_id", &instructor_id)?;
        Ok(Self {
            instructor_id,
            profile,
            assigned_courses: BTreeSet::new(),
        })
    }

    pub fn instructor_id(&self) -> &str {
        &self.instructor_id
    }

    pub fn profile(&self) -> &PersonProfile {
        &self.profile
    }

    pub fn profile_mut(&mut self) -> &mut PersonProfile {
        &mut self.profile
    }

    /// Ids of courses assigned to this instructor, ordered.
    pub fn assigned_courses(&self) -> &BTreeSet<String> {
        &self.assigned_courses
    }

    /// Flat key-value form carrying course ids instead of references.
    pub fn snapshot(&self) -> InstructorSnapshot {
        InstructorSnapshot {
            instructor_id: self.instructor_id.clone(),
            name: self.profile.name().to_string(),
            age: self.profile.age(),
            email: self.profile.email().to_string(),
            assigned_courses: self.assigned_courses.iter().cloned().collect(),
        }
    }
}

/// Wire form of an [`Instructor`] used by the snapshot document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstructorSnapshot {
    pub instructor_id: String,
    pub name: String,
    pub age: i64,
    pub email: String,
    #[serde(default)]
    pub assigned_courses: Vec<String>,
}

impl InstructorSnapshot {
    /// Rebuilds the instructor record, re-validating every field.
    /// Course assignment relinking is the caller's job.
    pub fn restore(&self) -> Result<Instructor, ValidationError> {
        let profile = PersonProfile::new(self.name.clone(), self.age, self.email.clone())?;
        Instructor::new(self.instructor_id.clone(), profile)
    }
}
