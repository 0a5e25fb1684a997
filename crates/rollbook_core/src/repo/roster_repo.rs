//! Records repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide row-level persistence for students, instructors, courses and
//!   registration edges.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - Write paths receive already-validated records; read paths reject
//!   invalid persisted state instead of masking it.
//! - Key collisions surface as `DuplicateId`, not as raw engine errors.

use crate::db::DbError;
use crate::model::course::Course;
use crate::model::instructor::Instructor;
use crate::model::person::PersonProfile;
use crate::model::roster::{EntityKind, Roster};
use crate::model::student::Student;
use rusqlite::{params, Connection, ErrorCode, Row};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence-layer error for record storage and query operations.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    DuplicateId { kind: EntityKind, id: String },
    NotFound { kind: EntityKind, id: String },
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::DuplicateId { kind, id } => write!(f, "duplicate {kind} id: `{id}`"),
            Self::NotFound { kind, id } => write!(f, "{kind} not found: `{id}`"),
            Self::InvalidData(message) => write!(f, "invalid persisted record: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Repository interface over the four relations of the records store.
pub trait RosterRepository {
    fn insert_student(&self, student: &Student) -> RepoResult<()>;
    fn update_student(&self, student: &Student) -> RepoResult<()>;
    fn upsert_student(&self, student: &Student) -> RepoResult<()>;
    /// Deletes the row; registrations go with it via cascade. Returns
    /// whether a row existed.
    fn delete_student(&self, student_id: &str) -> RepoResult<bool>;

    fn insert_instructor(&self, instructor: &Instructor) -> RepoResult<()>;
    fn update_instructor(&self, instructor: &Instructor) -> RepoResult<()>;
    fn upsert_instructor(&self, instructor: &Instructor) -> RepoResult<()>;
    /// Deletes the row and clears `courses.instructor_id` for every course
    /// that referenced it, in one transaction. Returns whether a row
    /// existed.
    fn delete_instructor(&self, instructor_id: &str) -> RepoResult<bool>;

    fn insert_course(&self, course: &Course) -> RepoResult<()>;
    fn update_course(&self, course: &Course) -> RepoResult<()>;
    fn upsert_course(&self, course: &Course) -> RepoResult<()>;
    /// Deletes the row; registrations go with it via cascade. Returns
    /// whether a row existed.
    fn delete_course(&self, course_id: &str) -> RepoResult<bool>;

    /// Adds a registration edge; already-present edges are ignored.
    fn insert_registration(&self, student_id: &str, course_id: &str) -> RepoResult<()>;
    fn delete_registration(&self, student_id: &str, course_id: &str) -> RepoResult<bool>;
    /// Points a course at an instructor id, or at none.
    fn set_course_instructor(
        &self,
        course_id: &str,
        instructor_id: Option<&str>,
    ) -> RepoResult<()>;

    /// Rebuilds the full in-memory mirror from the store.
    fn load_roster(&self) -> RepoResult<Roster>;
}

/// SQLite-backed records repository over a migrated connection.
pub struct SqliteRosterRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRosterRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl RosterRepository for SqliteRosterRepository<'_> {
    fn insert_student(&self, student: &Student) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO students (student_id, name, age, email)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    student.student_id(),
                    student.profile().name(),
                    student.profile().age(),
                    student.profile().email(),
                ],
            )
            .map_err(|err| key_collision(EntityKind::Student, student.student_id(), err))?;
        Ok(())
    }

    fn update_student(&self, student: &Student) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE students SET name = ?2, age = ?3, email = ?4 WHERE student_id = ?1;",
            params![
                student.student_id(),
                student.profile().name(),
                student.profile().age(),
                student.profile().email(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Student, student.student_id()));
        }
        Ok(())
    }

    fn upsert_student(&self, student: &Student) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO students (student_id, name, age, email)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (student_id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                email = excluded.email;",
            params![
                student.student_id(),
                student.profile().name(),
                student.profile().age(),
                student.profile().email(),
            ],
        )?;
        Ok(())
    }

    fn delete_student(&self, student_id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM students WHERE student_id = ?1;",
            [student_id],
        )?;
        Ok(changed > 0)
    }

    fn insert_instructor(&self, instructor: &Instructor) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO instructors (instructor_id, name, age, email)
                 VALUES (?1, ?2, ?3, ?4);",
                params![
                    instructor.instructor_id(),
                    instructor.profile().name(),
                    instructor.profile().age(),
                    instructor.profile().email(),
                ],
            )
            .map_err(|err| key_collision(EntityKind::Instructor, instructor.instructor_id(), err))?;
        Ok(())
    }

    fn update_instructor(&self, instructor: &Instructor) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE instructors SET name = ?2, age = ?3, email = ?4 WHERE instructor_id = ?1;",
            params![
                instructor.instructor_id(),
                instructor.profile().name(),
                instructor.profile().age(),
                instructor.profile().email(),
            ],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Instructor, instructor.instructor_id()));
        }
        Ok(())
    }

    fn upsert_instructor(&self, instructor: &Instructor) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO instructors (instructor_id, name, age, email)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (instructor_id) DO UPDATE SET
                name = excluded.name,
                age = excluded.age,
                email = excluded.email;",
            params![
                instructor.instructor_id(),
                instructor.profile().name(),
                instructor.profile().age(),
                instructor.profile().email(),
            ],
        )?;
        Ok(())
    }

    fn delete_instructor(&self, instructor_id: &str) -> RepoResult<bool> {
        // Clear course links explicitly; the FK's SET NULL only fires for
        // rows inserted with foreign keys enforced.
        let tx = self.conn.unchecked_transaction()?;
        tx.execute(
            "UPDATE courses SET instructor_id = NULL WHERE instructor_id = ?1;",
            [instructor_id],
        )?;
        let changed = tx.execute(
            "DELETE FROM instructors WHERE instructor_id = ?1;",
            [instructor_id],
        )?;
        tx.commit()?;
        Ok(changed > 0)
    }

    fn insert_course(&self, course: &Course) -> RepoResult<()> {
        self.conn
            .execute(
                "INSERT INTO courses (course_id, course_name, instructor_id)
                 VALUES (?1, ?2, ?3);",
                params![
                    course.course_id(),
                    course.course_name(),
                    course.instructor_id(),
                ],
            )
            .map_err(|err| key_collision(EntityKind::Course, course.course_id(), err))?;
        Ok(())
    }

    fn update_course(&self, course: &Course) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE courses SET course_name = ?2 WHERE course_id = ?1;",
            params![course.course_id(), course.course_name()],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Course, course.course_id()));
        }
        Ok(())
    }

    fn upsert_course(&self, course: &Course) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO courses (course_id, course_name, instructor_id)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (course_id) DO UPDATE SET
                course_name = excluded.course_name,
                instructor_id = excluded.instructor_id;",
            params![
                course.course_id(),
                course.course_name(),
                course.instructor_id(),
            ],
        )?;
        Ok(())
    }

    fn delete_course(&self, course_id: &str) -> RepoResult<bool> {
        let changed = self
            .conn
            .execute("DELETE FROM courses WHERE course_id = ?1;", [course_id])?;
        Ok(changed > 0)
    }

    fn insert_registration(&self, student_id: &str, course_id: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO registrations (student_id, course_id)
             VALUES (?1, ?2);",
            params![student_id, course_id],
        )?;
        Ok(())
    }

    fn delete_registration(&self, student_id: &str, course_id: &str) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM registrations WHERE student_id = ?1 AND course_id = ?2;",
            params![student_id, course_id],
        )?;
        Ok(changed > 0)
    }

    fn set_course_instructor(
        &self,
        course_id: &str,
        instructor_id: Option<&str>,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE courses SET instructor_id = ?2 WHERE course_id = ?1;",
            params![course_id, instructor_id],
        )?;
        if changed == 0 {
            return Err(not_found(EntityKind::Course, course_id));
        }
        Ok(())
    }

    fn load_roster(&self) -> RepoResult<Roster> {
        let mut roster = Roster::new();

        let mut stmt = self
            .conn
            .prepare("SELECT student_id, name, age, email FROM students ORDER BY student_id;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let student = parse_student_row(row)?;
            roster
                .insert_student(student)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        }

        let mut stmt = self.conn.prepare(
            "SELECT instructor_id, name, age, email FROM instructors ORDER BY instructor_id;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let instructor = parse_instructor_row(row)?;
            roster
                .insert_instructor(instructor)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        }

        // Instructors are resident before courses so assignment edges can
        // be relinked as course rows stream in.
        let mut stmt = self.conn.prepare(
            "SELECT course_id, course_name, instructor_id FROM courses ORDER BY course_id;",
        )?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let (course, instructor_id) = parse_course_row(row)?;
            let course_id = course.course_id().to_string();
            roster
                .insert_course(course)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
            if let Some(instructor_id) = instructor_id {
                roster
                    .assign(&instructor_id, &course_id)
                    .map_err(|err| RepoError::InvalidData(err.to_string()))?;
            }
        }

        let mut stmt = self
            .conn
            .prepare("SELECT student_id, course_id FROM registrations;")?;
        let mut rows = stmt.query([])?;
        while let Some(row) = rows.next()? {
            let student_id: String = row.get("student_id")?;
            let course_id: String = row.get("course_id")?;
            roster
                .register(&student_id, &course_id)
                .map_err(|err| RepoError::InvalidData(err.to_string()))?;
        }

        Ok(roster)
    }
}

fn parse_student_row(row: &Row<'_>) -> RepoResult<Student> {
    let student_id: String = row.get("student_id")?;
    let profile = parse_profile(row, "students", &student_id)?;
    Student::new(student_id, profile).map_err(|err| RepoError::InvalidData(err.to_string()))
}

fn parse_instructor_row(row: &Row<'_>) -> RepoResult<Instructor> {
    let instructor_id: String = row.get("instructor_id")?;
    let profile = parse_profile(row, "instructors", &instructor_id)?;
    Instructor::new(instructor_id, profile).map_err(|err| RepoError::InvalidData(err.to_string()))
}

fn parse_course_row(row: &Row<'_>) -> RepoResult<(Course, Option<String>)> {
    let course_id: String = row.get("course_id")?;
    let course_name: String = row.get("course_name")?;
    let instructor_id: Option<String> = row.get("instructor_id")?;
    let course = Course::new(course_id, course_name)
        .map_err(|err| RepoError::InvalidData(format!("courses row: {err}")))?;
    Ok((course, instructor_id))
}

fn parse_profile(row: &Row<'_>, table: &str, id: &str) -> RepoResult<PersonProfile> {
    let name: String = row.get("name")?;
    let age: i64 = row.get("age")?;
    let email: String = row.get("email")?;
    PersonProfile::new(name, age, email)
        .map_err(|err| RepoError::InvalidData(format!("{table} row `{id}`: {err}")))
}

fn key_collision(kind: EntityKind, id: &str, err: rusqlite::Error) -> RepoError {
    match err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::ConstraintViolation =>
        {
            RepoError::DuplicateId {
                kind,
                id: id.to_string(),
            }
        }
        other => RepoError::Db(DbError::Sqlite(other)),
    }
}

fn not_found(kind: EntityKind, id: &str) -> RepoError {
    RepoError::NotFound {
        kind,
        id: id.to_string(),
    }
}
