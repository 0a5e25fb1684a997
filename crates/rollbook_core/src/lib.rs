//! Core domain logic for Rollbook, a desktop school-records manager.
//! This crate is the single source of truth for record invariants;
//! GUI front-ends call into it and only render what it returns.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging};
pub use model::course::{Course, CourseSnapshot};
pub use model::instructor::{Instructor, InstructorSnapshot};
pub use model::person::{is_valid_email, PersonProfile, ValidationError};
pub use model::roster::{EntityKind, Roster, RosterError, RosterMatch};
pub use model::student::{Student, StudentSnapshot};
pub use repo::roster_repo::{RepoError, RepoResult, RosterRepository, SqliteRosterRepository};
pub use service::school_service::{SchoolService, ServiceError, SnapshotDocument, SnapshotStats};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
