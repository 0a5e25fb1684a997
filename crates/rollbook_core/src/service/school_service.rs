//! School records use-case service.
//!
//! # Responsibility
//! - Own the live connection and the in-memory mirror, and keep the two
//!   logically consistent across every operation.
//! - Provide the add/update/delete, registration/assignment, snapshot and
//!   backup entry points consumed by presentation layers.
//!
//! # Invariants
//! - Every write goes to storage first, inside a scoped transaction where
//!   more than one statement is involved; the mirror changes only after
//!   the write succeeded.
//! - Storage failures surface as `Err`, never as panics.

use crate::db::{open_db, open_db_in_memory, DbError};
use crate::model::course::{Course, CourseSnapshot};
use crate::model::instructor::{Instructor, InstructorSnapshot};
use crate::model::person::{PersonProfile, ValidationError};
use crate::model::roster::{EntityKind, Roster, RosterError};
use crate::model::student::{Student, StudentSnapshot};
use crate::repo::roster_repo::{RepoError, RosterRepository, SqliteRosterRepository};
use log::{error, info};
use rusqlite::backup::Backup;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::Path;
use std::time::Duration;

const BACKUP_PAGES_PER_STEP: std::os::raw::c_int = 128;
const BACKUP_PAUSE: Duration = Duration::from_millis(10);

/// Service-boundary error for school record use-cases.
#[derive(Debug)]
pub enum ServiceError {
    Validation(ValidationError),
    Roster(RosterError),
    Repo(RepoError),
    Io(std::io::Error),
    Json(serde_json::Error),
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Roster(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Json(err) => write!(f, "snapshot document error: {err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Roster(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::Json(err) => Some(err),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RosterError> for ServiceError {
    fn from(value: RosterError) -> Self {
        Self::Roster(value)
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<DbError> for ServiceError {
    fn from(value: DbError) -> Self {
        Self::Repo(RepoError::Db(value))
    }
}

impl From<rusqlite::Error> for ServiceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Repo(RepoError::Db(DbError::Sqlite(value)))
    }
}

impl From<std::io::Error> for ServiceError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

/// Full-store export document: three ordered lists of flat records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotDocument {
    pub students: Vec<StudentSnapshot>,
    pub instructors: Vec<InstructorSnapshot>,
    pub courses: Vec<CourseSnapshot>,
}

/// Counts reported by a snapshot import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SnapshotStats {
    pub students: usize,
    pub instructors: usize,
    pub courses: usize,
    pub registrations: usize,
}

/// Use-case facade owning the live store connection and the mirror.
pub struct SchoolService {
    conn: Connection,
    roster: Roster,
}

impl SchoolService {
    /// Opens (or creates) the records store at `path` and loads the mirror.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ServiceError> {
        let conn = open_db(path)?;
        Self::with_connection(conn)
    }

    /// Opens an in-memory store; used by tests and throwaway sessions.
    pub fn open_in_memory() -> Result<Self, ServiceError> {
        let conn = open_db_in_memory()?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, ServiceError> {
        let roster = SqliteRosterRepository::new(&conn).load_roster()?;
        Ok(Self { conn, roster })
    }

    /// Read-only view of the mirror, for display iteration.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    /// Inserts a student row, then mirrors it. A key collision is rejected
    /// with no state change on either side.
    pub fn add_student(&mut self, student: Student) -> Result<(), ServiceError> {
        SqliteRosterRepository::new(&self.conn).insert_student(&student)?;
        info!(
            "event=add_student module=service status=ok student_id={}",
            student.student_id()
        );
        self.roster.insert_student(student)?;
        Ok(())
    }

    pub fn add_instructor(&mut self, instructor: Instructor) -> Result<(), ServiceError> {
        SqliteRosterRepository::new(&self.conn).insert_instructor(&instructor)?;
        info!(
            "event=add_instructor module=service status=ok instructor_id={}",
            instructor.instructor_id()
        );
        self.roster.insert_instructor(instructor)?;
        Ok(())
    }

    pub fn add_course(&mut self, course: Course) -> Result<(), ServiceError> {
        SqliteRosterRepository::new(&self.conn).insert_course(&course)?;
        info!(
            "event=add_course module=service status=ok course_id={}",
            course.course_id()
        );
        self.roster.insert_course(course)?;
        Ok(())
    }

    /// Replaces a student's profile in storage, then in the mirror.
    pub fn update_student(
        &mut self,
        student_id: &str,
        profile: PersonProfile,
    ) -> Result<(), ServiceError> {
        let Some(current) = self.roster.student(student_id) else {
            return Err(RosterError::not_found(EntityKind::Student, student_id).into());
        };
        let mut updated = current.clone();
        updated.profile = profile;
        SqliteRosterRepository::new(&self.conn).update_student(&updated)?;
        if let Some(student) = self.roster.student_mut(student_id) {
            *student = updated;
        }
        info!("event=update_student module=service status=ok student_id={student_id}");
        Ok(())
    }

    pub fn update_instructor(
        &mut self,
        instructor_id: &str,
        profile: PersonProfile,
    ) -> Result<(), ServiceError> {
        let Some(current) = self.roster.instructor(instructor_id) else {
            return Err(RosterError::not_found(EntityKind::Instructor, instructor_id).into());
        };
        let mut updated = current.clone();
        updated.profile = profile;
        SqliteRosterRepository::new(&self.conn).update_instructor(&updated)?;
        if let Some(instructor) = self.roster.instructor_mut(instructor_id) {
            *instructor = updated;
        }
        info!("event=update_instructor module=service status=ok instructor_id={instructor_id}");
        Ok(())
    }

    /// Renames a course in storage, then in the mirror.
    pub fn rename_course(
        &mut self,
        course_id: &str,
        course_name: &str,
    ) -> Result<(), ServiceError> {
        let Some(current) = self.roster.course(course_id) else {
            return Err(RosterError::not_found(EntityKind::Course, course_id).into());
        };
        let mut updated = current.clone();
        updated.set_course_name(course_name)?;
        SqliteRosterRepository::new(&self.conn).update_course(&updated)?;
        if let Some(course) = self.roster.course_mut(course_id) {
            *course = updated;
        }
        info!("event=rename_course module=service status=ok course_id={course_id}");
        Ok(())
    }

    /// Deletes a student; cascades remove their registration rows and the
    /// mirror drops their enrollment edges. An absent id is a no-op.
    pub fn delete_student(&mut self, student_id: &str) -> Result<bool, ServiceError> {
        let existed = SqliteRosterRepository::new(&self.conn).delete_student(student_id)?;
        let removed = self.roster.remove_student(student_id).is_some();
        let status = if existed || removed { "ok" } else { "noop" };
        info!("event=delete_student module=service status={status} student_id={student_id}");
        Ok(existed || removed)
    }

    /// Deletes an instructor; the courses they taught survive with their
    /// instructor link cleared in both storage and mirror.
    pub fn delete_instructor(&mut self, instructor_id: &str) -> Result<bool, ServiceError> {
        let existed = SqliteRosterRepository::new(&self.conn).delete_instructor(instructor_id)?;
        let removed = self.roster.remove_instructor(instructor_id).is_some();
        let status = if existed || removed { "ok" } else { "noop" };
        info!(
            "event=delete_instructor module=service status={status} instructor_id={instructor_id}"
        );
        Ok(existed || removed)
    }

    /// Deletes a course; cascades remove its registration rows and the
    /// mirror unregisters every enrolled student.
    pub fn delete_course(&mut self, course_id: &str) -> Result<bool, ServiceError> {
        let existed = SqliteRosterRepository::new(&self.conn).delete_course(course_id)?;
        let removed = self.roster.remove_course(course_id).is_some();
        let status = if existed || removed { "ok" } else { "noop" };
        info!("event=delete_course module=service status={status} course_id={course_id}");
        Ok(existed || removed)
    }

    /// Registers a student in a course: one registration row plus the
    /// symmetric mirror edges. Registering twice is a no-op.
    pub fn register(&mut self, student_id: &str, course_id: &str) -> Result<(), ServiceError> {
        self.require_student(student_id)?;
        self.require_course(course_id)?;
        SqliteRosterRepository::new(&self.conn).insert_registration(student_id, course_id)?;
        self.roster.register(student_id, course_id)?;
        info!(
            "event=register module=service status=ok student_id={student_id} course_id={course_id}"
        );
        Ok(())
    }

    /// Removes a registration on both sides. Unregistering an absent edge
    /// is a no-op.
    pub fn unregister(&mut self, student_id: &str, course_id: &str) -> Result<(), ServiceError> {
        self.require_student(student_id)?;
        self.require_course(course_id)?;
        SqliteRosterRepository::new(&self.conn).delete_registration(student_id, course_id)?;
        self.roster.unregister(student_id, course_id)?;
        info!(
            "event=unregister module=service status=ok student_id={student_id} course_id={course_id}"
        );
        Ok(())
    }

    /// Assigns an instructor to a course, replacing any previous one.
    pub fn assign(&mut self, instructor_id: &str, course_id: &str) -> Result<(), ServiceError> {
        self.require_instructor(instructor_id)?;
        self.require_course(course_id)?;
        SqliteRosterRepository::new(&self.conn)
            .set_course_instructor(course_id, Some(instructor_id))?;
        self.roster.assign(instructor_id, course_id)?;
        info!(
            "event=assign module=service status=ok instructor_id={instructor_id} course_id={course_id}"
        );
        Ok(())
    }

    /// Clears the course's instructor link if it points at `instructor_id`;
    /// otherwise a no-op.
    pub fn unassign(&mut self, instructor_id: &str, course_id: &str) -> Result<(), ServiceError> {
        self.require_instructor(instructor_id)?;
        let Some(course) = self.roster.course(course_id) else {
            return Err(RosterError::not_found(EntityKind::Course, course_id).into());
        };
        if course.instructor_id() != Some(instructor_id) {
            return Ok(());
        }
        SqliteRosterRepository::new(&self.conn).set_course_instructor(course_id, None)?;
        self.roster.unassign(instructor_id, course_id)?;
        info!(
            "event=unassign module=service status=ok instructor_id={instructor_id} course_id={course_id}"
        );
        Ok(())
    }

    /// Writes the full mirror to a JSON snapshot document at `path`.
    pub fn export_snapshot(&self, path: impl AsRef<Path>) -> Result<(), ServiceError> {
        let path = path.as_ref();
        match self.export_snapshot_inner(path) {
            Ok(document) => {
                info!(
                    "event=snapshot_export module=service status=ok students={} instructors={} courses={}",
                    document.students.len(),
                    document.instructors.len(),
                    document.courses.len()
                );
                Ok(())
            }
            Err(err) => {
                error!("event=snapshot_export module=service status=error error={err}");
                Err(err)
            }
        }
    }

    fn export_snapshot_inner(&self, path: &Path) -> Result<SnapshotDocument, ServiceError> {
        let document = SnapshotDocument {
            students: self.roster.students().map(Student::snapshot).collect(),
            instructors: self.roster.instructors().map(Instructor::snapshot).collect(),
            courses: self.roster.courses().map(Course::snapshot).collect(),
        };
        let text = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, text)?;
        Ok(document)
    }

    /// Reads a snapshot document and merges it into the store: instructors
    /// first, then students, then courses with their instructor relink,
    /// then the registration replay. The whole replay runs in one
    /// transaction; on failure neither the store nor the mirror changes.
    pub fn import_snapshot(&mut self, path: impl AsRef<Path>) -> Result<SnapshotStats, ServiceError> {
        let path = path.as_ref();
        match self.import_snapshot_inner(path) {
            Ok(stats) => {
                info!(
                    "event=snapshot_import module=service status=ok students={} instructors={} courses={} registrations={}",
                    stats.students, stats.instructors, stats.courses, stats.registrations
                );
                Ok(stats)
            }
            Err(err) => {
                error!("event=snapshot_import module=service status=error error={err}");
                Err(err)
            }
        }
    }

    fn import_snapshot_inner(&mut self, path: &Path) -> Result<SnapshotStats, ServiceError> {
        let text = std::fs::read_to_string(path)?;
        let document: SnapshotDocument = serde_json::from_str(&text)?;

        // Validate every record before the first write.
        let instructors = document
            .instructors
            .iter()
            .map(InstructorSnapshot::restore)
            .collect::<Result<Vec<_>, _>>()?;
        let students = document
            .students
            .iter()
            .map(StudentSnapshot::restore)
            .collect::<Result<Vec<_>, _>>()?;
        let courses = document
            .courses
            .iter()
            .map(CourseSnapshot::restore)
            .collect::<Result<Vec<_>, _>>()?;

        // Edge ids must resolve against the document or the resident
        // mirror; anything else is skipped instead of failing the import.
        let known_instructors: BTreeSet<String> = document
            .instructors
            .iter()
            .map(|snapshot| snapshot.instructor_id.clone())
            .chain(self.roster.instructors().map(|i| i.instructor_id().to_string()))
            .collect();
        let known_students: BTreeSet<String> = document
            .students
            .iter()
            .map(|snapshot| snapshot.student_id.clone())
            .chain(self.roster.students().map(|s| s.student_id().to_string()))
            .collect();

        let mut stats = SnapshotStats {
            students: students.len(),
            instructors: instructors.len(),
            courses: courses.len(),
            registrations: 0,
        };

        let tx = self.conn.unchecked_transaction()?;
        {
            let repo = SqliteRosterRepository::new(&tx);
            for instructor in &instructors {
                repo.upsert_instructor(instructor)?;
            }
            for student in &students {
                repo.upsert_student(student)?;
            }
            for (course, source) in courses.iter().zip(&document.courses) {
                repo.upsert_course(course)?;
                if let Some(instructor_id) = source.instructor_id.as_deref() {
                    if known_instructors.contains(instructor_id) {
                        repo.set_course_instructor(course.course_id(), Some(instructor_id))?;
                    }
                }
                for student_id in &source.enrolled_students {
                    if known_students.contains(student_id) {
                        repo.insert_registration(student_id, course.course_id())?;
                        stats.registrations += 1;
                    }
                }
            }
        }
        tx.commit()?;

        self.roster = SqliteRosterRepository::new(&self.conn).load_roster()?;
        Ok(stats)
    }

    /// Copies the live store to `path` using the engine's online backup,
    /// page for page.
    pub fn backup(&self, path: impl AsRef<Path>) -> Result<(), ServiceError> {
        let path = path.as_ref();
        match self.backup_inner(path) {
            Ok(()) => {
                info!("event=db_backup module=service status=ok");
                Ok(())
            }
            Err(err) => {
                error!("event=db_backup module=service status=error error={err}");
                Err(err)
            }
        }
    }

    fn backup_inner(&self, path: &Path) -> Result<(), ServiceError> {
        let mut target = Connection::open(path)?;
        let backup = Backup::new(&self.conn, &mut target)?;
        backup.run_to_completion(BACKUP_PAGES_PER_STEP, BACKUP_PAUSE, None)?;
        Ok(())
    }

    fn require_student(&self, student_id: &str) -> Result<(), ServiceError> {
        if self.roster.student(student_id).is_none() {
            return Err(RosterError::not_found(EntityKind::Student, student_id).into());
        }
        Ok(())
    }

    fn require_instructor(&self, instructor_id: &str) -> Result<(), ServiceError> {
        if self.roster.instructor(instructor_id).is_none() {
            return Err(RosterError::not_found(EntityKind::Instructor, instructor_id).into());
        }
        Ok(())
    }

    fn require_course(&self, course_id: &str) -> Result<(), ServiceError> {
        if self.roster.course(course_id).is_none() {
            return Err(RosterError::not_found(EntityKind::Course, course_id).into());
        }
        Ok(())
    }
}
