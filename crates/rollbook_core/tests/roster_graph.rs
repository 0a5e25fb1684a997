use rollbook_core::{
    Course, EntityKind, Instructor, PersonProfile, Roster, RosterError, Student,
};

fn student(id: &str, name: &str) -> Student {
    let profile = PersonProfile::new(name, 20, "s@example.com").unwrap();
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
fn register_links_both_sides() {
    let mut roster = Roster::new();
    roster.insert_student(student("S1", "Ann")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();

    roster.register("S1", "C1").unwrap();

    assert!(roster.student("S1").unwrap().registered_courses().contains("C1"));
    assert!(roster.course("C1").unwrap().enrolled_students().contains("S1"));
}

#[test]
fn register_then_unregister_restores_pre_call_state() {
    let mut roster = Roster::new();
    roster.insert_student(student("S1", "Ann")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();

    roster.register("S1", "C1").unwrap();
    roster.unregister("S1", "C1").unwrap();

    assert!(roster.student("S1").unwrap().registered_courses().is_empty());
    assert!(roster.course("C1").unwrap().enrolled_students().is_empty());
}

#[test]
fn repeated_register_is_deduplicated() {
    let mut roster = Roster::new();
    roster.insert_student(student("S1", "Ann")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();

    roster.register("S1", "C1").unwrap();
    roster.register("S1", "C1").unwrap();

    assert_eq!(roster.student("S1").unwrap().registered_courses().len(), 1);
    assert_eq!(roster.course("C1").unwrap().enrolled_students().len(), 1);
}

#[test]
fn register_with_missing_endpoint_fails() {
    let mut roster = Roster::new();
    roster.insert_student(student("S1", "Ann")).unwrap();

    let err = roster.register("S1", "C1").unwrap_err();
    assert_eq!(
        err,
        RosterError::NotFound {
            kind: EntityKind::Course,
            id: "C1".to_string(),
        }
    );

    let err = roster.register("ghost", "C1").unwrap_err();
    assert_eq!(
        err,
        RosterError::NotFound {
            kind: EntityKind::Student,
            id: "ghost".to_string(),
        }
    );
}

#[test]
fn assign_links_exactly_one_instructor() {
    let mut roster = Roster::new();
    roster.insert_instructor(instructor("I1", "Grace")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();

    roster.assign("I1", "C1").unwrap();
    assert!(roster.instructor("I1").unwrap().assigned_courses().contains("C1"));
    assert_eq!(roster.course("C1").unwrap().instructor_id(), Some("I1"));

    roster.unassign("I1", "C1").unwrap();
    assert!(roster.instructor("I1").unwrap().assigned_courses().is_empty());
    assert_eq!(roster.course("C1").unwrap().instructor_id(), None);
}

#[test]
fn assign_replaces_previous_instructor_without_erroring() {
    let mut roster = Roster::new();
    roster.insert_instructor(instructor("I1", "Grace")).unwrap();
    roster.insert_instructor(instructor("I2", "Alan")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();

    roster.assign("I1", "C1").unwrap();
    roster.assign("I2", "C1").unwrap();

    assert_eq!(roster.course("C1").unwrap().instructor_id(), Some("I2"));
    assert!(roster.instructor("I1").unwrap().assigned_courses().is_empty());
    assert!(roster.instructor("I2").unwrap().assigned_courses().contains("C1"));
}

#[test]
fn unassign_of_unrelated_instructor_is_a_noop() {
    let mut roster = Roster::new();
    roster.insert_instructor(instructor("I1", "Grace")).unwrap();
    roster.insert_instructor(instructor("I2", "Alan")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();
    roster.assign("I1", "C1").unwrap();

    roster.unassign("I2", "C1").unwrap();

    assert_eq!(roster.course("C1").unwrap().instructor_id(), Some("I1"));
    assert!(roster.instructor("I1").unwrap().assigned_courses().contains("C1"));
}

#[test]
fn duplicate_insert_fails_without_mutating_state() {
    let mut roster = Roster::new();
    roster.insert_course(course("C1", "Algebra")).unwrap();

    let err = roster.insert_course(course("C1", "Biology")).unwrap_err();
    assert_eq!(
        err,
        RosterError::DuplicateId {
            kind: EntityKind::Course,
            id: "C1".to_string(),
        }
    );
    assert_eq!(roster.courses().count(), 1);
    assert_eq!(roster.course("C1").unwrap().course_name(), "Algebra");
}

#[test]
fn remove_instructor_clears_course_links_but_keeps_courses() {
    let mut roster = Roster::new();
    roster.insert_instructor(instructor("I1", "Grace")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();
    roster.insert_course(course("C2", "Biology")).unwrap();
    roster.assign("I1", "C1").unwrap();
    roster.assign("I1", "C2").unwrap();

    let removed = roster.remove_instructor("I1").unwrap();
    assert_eq!(removed.instructor_id(), "I1");

    assert_eq!(roster.course("C1").unwrap().instructor_id(), None);
    assert_eq!(roster.course("C2").unwrap().instructor_id(), None);
    assert_eq!(roster.courses().count(), 2);
}

#[test]
fn remove_course_unregisters_students_and_detaches_instructor() {
    let mut roster = Roster::new();
    roster.insert_student(student("S1", "Ann")).unwrap();
    roster.insert_instructor(instructor("I1", "Grace")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();
    roster.register("S1", "C1").unwrap();
    roster.assign("I1", "C1").unwrap();

    roster.remove_course("C1").unwrap();

    assert!(roster.student("S1").unwrap().registered_courses().is_empty());
    assert!(roster.instructor("I1").unwrap().assigned_courses().is_empty());
    assert!(roster.course("C1").is_none());
}

#[test]
fn remove_student_clears_enrollment_edges() {
    let mut roster = Roster::new();
    roster.insert_student(student("S1", "Ann")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();
    roster.register("S1", "C1").unwrap();

    roster.remove_student("S1").unwrap();

    assert!(roster.course("C1").unwrap().enrolled_students().is_empty());
    assert!(roster.remove_student("S1").is_none());
}

#[test]
fn find_matches_ids_and_names_case_insensitively() {
    let mut roster = Roster::new();
    roster.insert_student(student("S1", "Ann Droid")).unwrap();
    roster.insert_instructor(instructor("I1", "Grace")).unwrap();
    roster.insert_course(course("C1", "Algebra")).unwrap();

    let hits = roster.find("ann");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].kind, EntityKind::Student);
    assert_eq!(hits[0].id, "S1");

    let hits = roster.find("c1");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].kind, EntityKind::Course);

    assert_eq!(roster.find("").len(), 3);
    assert!(roster.find("zebra").is_empty());
}
