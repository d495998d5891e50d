#![forbid(unsafe_code)]
use chrono::NaiveDate;
use secours::{
    io::{import_employees_csv, write_shifts_csv, NewEmployee},
    Assignment, AssignmentId, Employee, EmployeeId, Role, SlotId, SlotNumber,
};
use std::fs;
use tempfile::tempdir;

fn employee(id: i64, name: &str, role: Role) -> Employee {
    Employee {
        id: EmployeeId::new(id),
        name: name.to_string(),
        role,
    }
}

#[test]
fn shifts_csv_lists_windows_and_names() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
    let assignments = vec![
        Assignment {
            id: AssignmentId::new(1),
            employee: EmployeeId::new(7),
            slot: SlotId::new(1),
            date,
            number: SlotNumber::new(1).unwrap(),
            role: Role::Medic,
        },
        Assignment {
            id: AssignmentId::new(2),
            employee: EmployeeId::new(8),
            slot: SlotId::new(2),
            date,
            number: SlotNumber::new(3).unwrap(),
            role: Role::Technical,
        },
    ];
    let employees = vec![
        employee(7, "Anna", Role::Medic),
        employee(8, "Luc", Role::Technical),
    ];

    let mut buf = Vec::new();
    write_shifts_csv(&mut buf, &assignments, &employees).unwrap();
    let text = String::from_utf8(buf).unwrap();

    insta::assert_snapshot!(text.trim_end(), @r"
    assignment_id,date,slot,start,end,employee_id,employee_name,role
    1,2025-03-10,1,2025-03-10T06:00:00+00:00,2025-03-10T14:00:00+00:00,7,Anna,medic
    2,2025-03-10,3,2025-03-10T22:00:00+00:00,2025-03-11T06:00:00+00:00,8,Luc,technical
    ");
}

#[test]
fn import_employees_parses_roles() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("staff.csv");
    fs::write(&path, "name,role\nAnna,Medic\nLuc, technical\nZoé,admin\n").unwrap();

    let rows = import_employees_csv(&path).unwrap();
    assert_eq!(
        rows,
        vec![
            NewEmployee { name: "Anna".into(), role: Role::Medic },
            NewEmployee { name: "Luc".into(), role: Role::Technical },
            NewEmployee { name: "Zoé".into(), role: Role::Administrator },
        ]
    );
}

#[test]
fn import_rejects_unknown_role() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("staff.csv");
    fs::write(&path, "name,role\nAnna,pilot\n").unwrap();
    assert!(import_employees_csv(&path).is_err());
}
