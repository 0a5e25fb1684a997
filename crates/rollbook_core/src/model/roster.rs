//! In-memory mirror of all records and their relationship graph.
//!
//! # Responsibility
//! - Own every resident student, instructor and course, keyed by id.
//! - Provide the single mutator path for registration and assignment
//!   edges so both sides change together or not at all.
//!
//! # Invariants
//! - If a student's course set contains course C, then C's student set
//!   contains that student, and vice versa, after every mutation.
//! - A course links at most one instructor; the link and the instructor's
//!   assigned set agree after every mutation.
//! - Ids are unique per collection; duplicate inserts fail without
//!   touching existing state.

use crate::model::course::Course;
use crate::model::instructor::Instructor;
use crate::model::student::Student;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Which record collection an id belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Student,
    Instructor,
    Course,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Instructor => write!(f, "instructor"),
            Self::Course => write!(f, "course"),
        }
    }
}

/// Graph-level failure: key collisions and missing endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RosterError {
    DuplicateId { kind: EntityKind, id: String },
    NotFound { kind: EntityKind, id: String },
}

impl RosterError {
    pub(crate) fn duplicate(kind: EntityKind, id: &str) -> Self {
        Self::DuplicateId {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn not_found(kind: EntityKind, id: &str) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

impl Display for RosterError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DuplicateId { kind, id } => write!(f, "duplicate {kind} id: `{id}`"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: `{id}`"),
        }
    }
}

impl Error for RosterError {}

/// One row of a roster-wide substring search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RosterMatch<'a> {
    pub kind: EntityKind,
    pub id: &'a str,
    pub name: &'a str,
}

/// The in-memory mirror kept synchronized with durable storage.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: BTreeMap<String, Student>,
    instructors: BTreeMap<String, Instructor>,
    courses: BTreeMap<String, Course>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_student(&mut self, student: Student) -> Result<(), RosterError> {
        if self.students.contains_key(&student.student_id) {
            return Err(RosterError::duplicate(
                EntityKind::Student,
                &student.student_id,
            ));
        }
        self.students.insert(student.student_id.clone(), student);
        Ok(())
    }

    pub fn insert_instructor(&mut self, instructor: Instructor) -> Result<(), RosterError> {
        if self.instructors.contains_key(&instructor.instructor_id) {
            return Err(RosterError::duplicate(
                EntityKind::Instructor,
                &instructor.instructor_id,
            ));
        }
        self.instructors
            .insert(instructor.instructor_id.clone(), instructor);
        Ok(())
    }

    pub fn insert_course(&mut self, course: Course) -> Result<(), RosterError> {
        if self.courses.contains_key(&course.course_id) {
            return Err(RosterError::duplicate(EntityKind::Course, &course.course_id));
        }
        self.courses.insert(course.course_id.clone(), course);
        Ok(())
    }

    pub fn student(&self, id: &str) -> Option<&Student> {
        self.students.get(id)
    }

    pub fn instructor(&self, id: &str) -> Option<&Instructor> {
        self.instructors.get(id)
    }

    pub fn course(&self, id: &str) -> Option<&Course> {
        self.courses.get(id)
    }

    /// Students ordered by id, for display iteration.
    pub fn students(&self) -> impl Iterator<Item = &Student> {
        self.students.values()
    }

    /// Instructors ordered by id, for display iteration.
    pub fn instructors(&self) -> impl Iterator<Item = &Instructor> {
        self.instructors.values()
    }

    /// Courses ordered by id, for display iteration.
    pub fn courses(&self) -> impl Iterator<Item = &Course> {
        self.courses.values()
    }

    pub(crate) fn student_mut(&mut self, id: &str) -> Option<&mut Student> {
        self.students.get_mut(id)
    }

    pub(crate) fn instructor_mut(&mut self, id: &str) -> Option<&mut Instructor> {
        self.instructors.get_mut(id)
    }

    pub(crate) fn course_mut(&mut self, id: &str) -> Option<&mut Course> {
        self.courses.get_mut(id)
    }

    /// Adds the registration edge on both sides. No-op when the student is
    /// already registered; fails when either endpoint is absent.
    pub fn register(&mut self, student_id: &str, course_id: &str) -> Result<(), RosterError> {
        let Some(student) = self.students.get_mut(student_id) else {
            return Err(RosterError::not_found(EntityKind::Student, student_id));
        };
        let Some(course) = self.courses.get_mut(course_id) else {
            return Err(RosterError::not_found(EntityKind::Course, course_id));
        };
        student.registered_courses.insert(course_id.to_string());
        course.enrolled_students.insert(student_id.to_string());
        Ok(())
    }

    /// Removes the registration edge on both sides. No-op when the student
    /// is not registered; fails when either endpoint is absent.
    pub fn unregister(&mut self, student_id: &str, course_id: &str) -> Result<(), RosterError> {
        let Some(student) = self.students.get_mut(student_id) else {
            return Err(RosterError::not_found(EntityKind::Student, student_id));
        };
        let Some(course) = self.courses.get_mut(course_id) else {
            return Err(RosterError::not_found(EntityKind::Course, course_id));
        };
        student.registered_courses.remove(course_id);
        course.enrolled_students.remove(student_id);
        Ok(())
    }

    /// Links the instructor to the course, replacing any previous
    /// instructor without erroring. Both sides of the old and new edge are
    /// kept in step.
    pub fn assign(&mut self, instructor_id: &str, course_id: &str) -> Result<(), RosterError> {
        if !self.instructors.contains_key(instructor_id) {
            return Err(RosterError::not_found(EntityKind::Instructor, instructor_id));
        }
        let Some(course) = self.courses.get_mut(course_id) else {
            return Err(RosterError::not_found(EntityKind::Course, course_id));
        };

        let previous = course.instructor_id.replace(instructor_id.to_string());
        if let Some(previous_id) = previous {
            if previous_id != instructor_id {
                if let Some(previous_instructor) = self.instructors.get_mut(&previous_id) {
                    previous_instructor.assigned_courses.remove(course_id);
                }
            }
        }
        if let Some(instructor) = self.instructors.get_mut(instructor_id) {
            instructor.assigned_courses.insert(course_id.to_string());
        }
        Ok(())
    }

    /// Clears the instructor link. No-op when the course is assigned to a
    /// different instructor or to none.
    pub fn unassign(&mut self, instructor_id: &str, course_id: &str) -> Result<(), RosterError> {
        if !self.instructors.contains_key(instructor_id) {
            return Err(RosterError::not_found(EntityKind::Instructor, instructor_id));
        }
        let Some(course) = self.courses.get_mut(course_id) else {
            return Err(RosterError::not_found(EntityKind::Course, course_id));
        };
        if course.instructor_id.as_deref() != Some(instructor_id) {
            return Ok(());
        }
        course.instructor_id = None;
        if let Some(instructor) = self.instructors.get_mut(instructor_id) {
            instructor.assigned_courses.remove(course_id);
        }
        Ok(())
    }

    /// Removes a student and their enrollment edges. Returns `None` when
    /// the id is absent.
    pub fn remove_student(&mut self, student_id: &str) -> Option<Student> {
        let student = self.students.remove(student_id)?;
        for course_id in &student.registered_courses {
            if let Some(course) = self.courses.get_mut(course_id) {
                course.enrolled_students.remove(student_id);
            }
        }
        Some(student)
    }

    /// Removes an instructor, clearing the back-reference on every course
    /// they were assigned to. The courses themselves survive.
    pub fn remove_instructor(&mut self, instructor_id: &str) -> Option<Instructor> {
        let instructor = self.instructors.remove(instructor_id)?;
        for course_id in &instructor.assigned_courses {
            if let Some(course) = self.courses.get_mut(course_id) {
                course.instructor_id = None;
            }
        }
        Some(instructor)
    }

    /// Removes a course, unregistering every enrolled student and
    /// detaching the assigned instructor.
    pub fn remove_course(&mut self, course_id: &str) -> Option<Course> {
        let course = self.courses.remove(course_id)?;
        for student_id in &course.enrolled_students {
            if let Some(student) = self.students.get_mut(student_id) {
                student.registered_courses.remove(course_id);
            }
        }
        if let Some(instructor_id) = &course.instructor_id {
            if let Some(instructor) = self.instructors.get_mut(instructor_id) {
                instructor.assigned_courses.remove(course_id);
            }
        }
        Some(course)
    }

    /// Case-insensitive substring search over ids and names across all
    /// three collections. An empty term matches everything.
    pub fn find(&self, term: &str) -> Vec<RosterMatch<'_>> {
        let needle = term.trim().to_lowercase();
        let hit = |id: &str, name: &str| {
            needle.is_empty()
                || id.to_lowercase().contains(&needle)
                || name.to_lowercase().contains(&needle)
        };

        let mut matches = Vec::new();
        for student in self.students.values() {
            if hit(&student.student_id, student.profile.name()) {
                matches.push(RosterMatch {
                    kind: EntityKind::Student,
                    id: &student.student_id,
                    name: student.profile.name(),
                });
            }
        }
        for instructor in self.instructors.values() {
            if hit(&instructor.instructor_id, instructor.profile.name()) {
                matches.push(RosterMatch {
                    kind: EntityKind::Instructor,
                    id: &instructor.instructor_id,
                    name: instructor.profile.name(),
                });
            }
        }
        for course in self.courses.values() {
            if hit(&course.course_id, &course.course_name) {
                matches.push(RosterMatch {
                    kind: EntityKind::Course,
                    id: &course.course_id,
                    name: &course.course_name,
                });
            }
        }
        matches
    }
}
