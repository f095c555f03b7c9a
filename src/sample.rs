use crate::data::{Class, Day, Faculty, Slot, Subject, TimetableRequest};

fn faculty(id: &str, name: &str, max_hours_per_day: i32, max_consecutive_hours: i32) -> Faculty {
    Faculty {
        id: id.to_string(),
        name: name.to_string(),
        max_hours_per_day,
        max_consecutive_hours,
    }
}

fn subject(id: &str, name: &str, faculty_id: &str, weekly_hours: i32) -> Subject {
    Subject {
        id: id.to_string(),
        name: name.to_string(),
        faculty_id: faculty_id.to_string(),
        weekly_hours,
    }
}

/// A small two-class department, handy as a starting point for clients.
pub fn sample_request() -> TimetableRequest {
    TimetableRequest {
        faculty: vec![
            faculty("f1", "Dr. Alan Turing", 4, 2),
            faculty("f2", "Dr. Grace Hopper", 3, 2),
            faculty("f3", "Dr. Ada Lovelace", 4, 2),
        ],
        classes: vec![
            Class {
                id: "c1".to_string(),
                name: "CS101".to_string(),
                subjects: vec![
                    subject("s1", "Algorithms", "f1", 4),
                    subject("s2", "Compilers", "f2", 3),
                    subject("s3", "Data Structures", "f1", 3),
                ],
                unavailable_slots: vec![Slot::new(Day::Wednesday, 3)],
            },
            Class {
                id: "c2".to_string(),
                name: "CS202".to_string(),
                subjects: vec![
                    subject("s4", "Operating Systems", "f2", 3),
                    subject("s5", "Discrete Maths", "f3", 4),
                    subject("s6", "Intro to AI", "f1", 3),
                ],
                unavailable_slots: vec![],
            },
        ],
        node_limit: None,
    }
}
