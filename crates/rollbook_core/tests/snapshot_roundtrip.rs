use rollbook_core::{
    Course, Instructor, PersonProfile, SchoolService, ServiceError, Student,
};
use rusqlite::Connection;
use serde_json::Value;

fn student(id: &str, name: &str, age: i64) -> Student {
    let profile = PersonProfile::new(name, age, "s@example.com").unwrap();
    Student::new(id, profile).unwrap()
}

fn instructor(id: &str, name: &str) -> Instructor {
    let profile = PersonProfile::new(name, 45, "i@example.com").unwrap();
    Instructor::new(id, profile).unwrap()
}

fn course(id: &str, name: &str) -> Course {
    Course::new(id, name).unwrap()
}

#[test]
fn export_then_import_reproduces_the_graph() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("school.json");

    let mut source = SchoolService::open_in_memory().unwrap();
    source.add_student(student("S1", "Ann", 20)).unwrap();
    source.add_instructor(instructor("I1", "Grace")).unwrap();
    source.add_course(course("C1", "Algebra")).unwrap();
    source.register("S1", "C1").unwrap();
    source.assign("I1", "C1").unwrap();
    source.export_snapshot(&snapshot_path).unwrap();

    let mut target = SchoolService::open_in_memory().unwrap();
    let stats = target.import_snapshot(&snapshot_path).unwrap();
    assert_eq!(stats.students, 1);
    assert_eq!(stats.instructors, 1);
    assert_eq!(stats.courses, 1);
    assert_eq!(stats.registrations, 1);

    let roster = target.roster();
    let registered: Vec<_> = roster
        .student("S1")
        .unwrap()
        .registered_courses()
        .iter()
        .cloned()
        .collect();
    assert_eq!(registered, vec!["C1".to_string()]);

    let enrolled: Vec<_> = roster
        .course("C1")
        .unwrap()
        .enrolled_students()
        .iter()
        .cloned()
        .collect();
    assert_eq!(enrolled, vec!["S1".to_string()]);

    assert_eq!(roster.course("C1").unwrap().instructor_id(), Some("I1"));
    assert!(roster.instructor("I1").unwrap().assigned_courses().contains("C1"));
}

#[test]
fn snapshot_document_has_expected_shape() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("school.json");

    let mut service = SchoolService::open_in_memory().unwrap();
    service.add_student(student("S2", "Bea", 22)).unwrap();
    service.add_student(student("S1", "Ann", 20)).unwrap();
    service.add_course(course("C1", "Algebra")).unwrap();
    service.register("S1", "C1").unwrap();
    service.export_snapshot(&snapshot_path).unwrap();

    let text = std::fs::read_to_string(&snapshot_path).unwrap();
    let document: Value = serde_json::from_str(&text).unwrap();

    let students = document["students"].as_array().unwrap();
    assert_eq!(students.len(), 2);
    // Lists are ordered by id regardless of insertion order.
    assert_eq!(students[0]["student_id"], "S1");
    assert_eq!(students[1]["student_id"], "S2");

    assert!(document["instructors"].as_array().unwrap().is_empty());

    let courses = document["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert!(courses[0]["instructor_id"].is_null());
    assert_eq!(courses[0]["enrolled_students"][0], "S1");
}

#[test]
fn import_skips_edges_pointing_at_unknown_ids() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("school.json");
    std::fs::write(
        &snapshot_path,
        r#"{
            "students": [],
            "instructors": [],
            "courses": [
                {
                    "course_id": "C1",
                    "course_name": "Algebra",
                    "instructor_id": "nobody",
                    "enrolled_students": ["ghost"]
                }
            ]
        }"#,
    )
    .unwrap();

    let mut service = SchoolService::open_in_memory().unwrap();
    let stats = service.import_snapshot(&snapshot_path).unwrap();
    assert_eq!(stats.courses, 1);
    assert_eq!(stats.registrations, 0);

    let course = service.roster().course("C1").unwrap();
    assert_eq!(course.instructor_id(), None);
    assert!(course.enrolled_students().is_empty());
}

#[test]
fn import_upserts_already_resident_records() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("school.json");

    let mut source = SchoolService::open_in_memory().unwrap();
    source.add_student(student("S1", "Ann Updated", 21)).unwrap();
    source.export_snapshot(&snapshot_path).unwrap();

    let mut target = SchoolService::open_in_memory().unwrap();
    target.add_student(student("S1", "Ann", 20)).unwrap();
    target.import_snapshot(&snapshot_path).unwrap();

    assert_eq!(target.roster().students().count(), 1);
    let profile = target.roster().student("S1").unwrap().profile().clone();
    assert_eq!(profile.name(), "Ann Updated");
    assert_eq!(profile.age(), 21);
}

#[test]
fn import_of_invalid_document_leaves_state_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("school.json");
    std::fs::write(
        &snapshot_path,
        r#"{
            "students": [
                {"student_id": "S9", "name": "Bad", "age": -5, "email": "b@c.com"}
            ],
            "instructors": [],
            "courses": []
        }"#,
    )
    .unwrap();

    let mut service = SchoolService::open_in_memory().unwrap();
    service.add_student(student("S1", "Ann", 20)).unwrap();

    let err = service.import_snapshot(&snapshot_path).unwrap_err();
    assert!(matches!(err, ServiceError::Validation(_)));

    assert_eq!(service.roster().students().count(), 1);
    assert!(service.roster().student("S9").is_none());
}

#[test]
fn import_of_malformed_json_reports_document_error() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot_path = dir.path().join("school.json");
    std::fs::write(&snapshot_path, "{ not json").unwrap();

    let mut service = SchoolService::open_in_memory().unwrap();
    let err = service.import_snapshot(&snapshot_path).unwrap_err();
    assert!(matches!(err, ServiceError::Json(_)));
}

#[test]
fn backup_copies_every_row_of_the_live_store() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("school.db");
    let backup_path = dir.path().join("school-backup.db");

    let mut service = SchoolService::open(&db_path).unwrap();
    service.add_instructor(instructor("I1", "Grace")).unwrap();
    service.add_student(student("S1", "Ann", 20)).unwrap();
    service.add_course(course("C1", "Algebra")).unwrap();
    service.register("S1", "C1").unwrap();
    service.assign("I1", "C1").unwrap();

    service.backup(&backup_path).unwrap();
    drop(service);

    let conn = Connection::open(&backup_path).unwrap();
    let students: i64 = conn
        .query_row("SELECT COUNT(*) FROM students;", [], |row| row.get(0))
        .unwrap();
    let registrations: i64 = conn
        .query_row("SELECT COUNT(*) FROM registrations;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(students, 1);
    assert_eq!(registrations, 1);

    let (name, age): (String, i64) = conn
        .query_row(
            "SELECT name, age FROM students WHERE student_id = 'S1';",
            [],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .unwrap();
    assert_eq!(name, "Ann");
    assert_eq!(age, 20);

    let linked: Option<String> = conn
        .query_row(
            "SELECT instructor_id FROM courses WHERE course_id = 'C1';",
            [],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(linked.as_deref(), Some("I1"));
}
