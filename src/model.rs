//! Validated, index-based snapshot of a generation request.
//!
//! The search engine never looks at the wire types directly. Every faculty,
//! class and subject gets a dense index, and all references are resolved
//! once, up front, so the hot loop only does array lookups.

use crate::data::{DAYS_PER_WEEK, PERIODS_PER_DAY, TimetableRequest};
use crate::error::ValidationErrors;
use itertools::Itertools;
use serde::Serialize;
use std::collections::HashMap;

pub type FacultyIndex = usize;
pub type ClassIndex = usize;
pub type SubjectIndex = usize;

/// A validation error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub kind: ValidationErrorKind,
    pub message: String,
}

/// Categories of validation errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ValidationErrorKind {
    /// No faculty or no classes were supplied.
    EmptyRoster,
    /// Two faculty members, classes or subjects share an ID.
    DuplicateId,
    /// Two classes share a name; the timetable is keyed by class name.
    DuplicateClassName,
    /// A class has no subjects.
    EmptyClass,
    /// A subject references a faculty member that doesn't exist.
    MissingFaculty,
    /// An hour bound or weekly hour count is zero or negative.
    NonPositiveHours,
    /// maxConsecutiveHours is larger than maxHoursPerDay.
    ConsecutiveExceedsDaily,
    /// An unavailable slot names a period outside 1..=5.
    InvalidSlot,
}

impl ValidationError {
    fn new(kind: ValidationErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FacultyRecord {
    pub name: String,
    pub max_per_day: u32,
    pub max_consecutive: u32,
}

impl FacultyRecord {
    /// The most periods this faculty member can teach in one day once the
    /// consecutive limit forces breaks into a five period day.
    pub fn effective_daily_capacity(&self) -> u32 {
        let periods = PERIODS_PER_DAY as u32;
        let with_breaks = periods - periods / (self.max_consecutive + 1);
        self.max_per_day.min(with_breaks)
    }
}

#[derive(Debug, Clone)]
pub struct SubjectRecord {
    pub name: String,
    pub class: ClassIndex,
    pub faculty: FacultyIndex,
    pub weekly_hours: u32,
}

#[derive(Debug, Clone)]
pub struct ClassRecord {
    pub name: String,
    pub subjects: Vec<SubjectIndex>,
    pub blocked: [[bool; PERIODS_PER_DAY]; DAYS_PER_WEEK],
}

impl ClassRecord {
    pub fn is_blocked(&self, day: usize, period: usize) -> bool {
        self.blocked[day][period]
    }

    pub fn open_slot_count(&self) -> u32 {
        self.blocked.iter().flatten().filter(|b| !**b).count() as u32
    }
}

/// The immutable input to one search run.
#[derive(Debug, Clone)]
pub struct Problem {
    pub faculties: Vec<FacultyRecord>,
    pub classes: Vec<ClassRecord>,
    /// All subjects in request order; the index doubles as the insertion-order tie-break.
    pub subjects: Vec<SubjectRecord>,
    pub faculty_subjects: Vec<Vec<SubjectIndex>>,
}

impl Problem {
    /// Validates `request` and resolves it into index form.
    ///
    /// All detected issues are returned together, not just the first one.
    pub fn build(request: &TimetableRequest) -> Result<Self, ValidationErrors> {
        let mut errors = Vec::new();

        if request.faculty.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyRoster,
                "No faculty members configured",
            ));
        }
        if request.classes.is_empty() {
            errors.push(ValidationError::new(
                ValidationErrorKind::EmptyRoster,
                "No classes configured",
            ));
        }

        for id in request.faculty.iter().map(|f| f.id.as_str()).duplicates() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate faculty ID: {id}"),
            ));
        }
        for id in request.classes.iter().map(|c| c.id.as_str()).duplicates() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate class ID: {id}"),
            ));
        }
        for name in request.classes.iter().map(|c| c.name.as_str()).duplicates() {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateClassName,
                format!("Duplicate class name: {name}"),
            ));
        }
        for id in request
            .classes
            .iter()
            .flat_map(|c| c.subjects.iter().map(|s| s.id.as_str()))
            .duplicates()
        {
            errors.push(ValidationError::new(
                ValidationErrorKind::DuplicateId,
                format!("Duplicate subject ID: {id}"),
            ));
        }

        let mut faculties = Vec::with_capacity(request.faculty.len());
        for faculty in &request.faculty {
            if faculty.max_hours_per_day <= 0 || faculty.max_consecutive_hours <= 0 {
                errors.push(ValidationError::new(
                    ValidationErrorKind::NonPositiveHours,
                    format!(
                        "Faculty '{}' must allow at least one hour per day and one consecutive hour",
                        faculty.name
                    ),
                ));
                continue;
            }
            if faculty.max_consecutive_hours > faculty.max_hours_per_day {
                errors.push(ValidationError::new(
                    ValidationErrorKind::ConsecutiveExceedsDaily,
                    format!(
                        "Faculty '{}' allows {} consecutive hours but only {} per day",
                        faculty.name, faculty.max_consecutive_hours, faculty.max_hours_per_day
                    ),
                ));
                continue;
            }
            faculties.push(FacultyRecord {
                name: faculty.name.clone(),
                max_per_day: faculty.max_hours_per_day as u32,
                max_consecutive: faculty.max_consecutive_hours as u32,
            });
        }

        // Resolved against the raw request so a faculty member with bad bounds
        // is still "known" and does not also produce a dangling reference error.
        let faculty_lookup: HashMap<&str, FacultyIndex> = request
            .faculty
            .iter()
            .enumerate()
            .map(|(index, f)| (f.id.as_str(), index))
            .collect();

        let mut classes = Vec::with_capacity(request.classes.len());
        let mut subjects = Vec::new();
        for (class_index, class) in request.classes.iter().enumerate() {
            if class.subjects.is_empty() {
                errors.push(ValidationError::new(
                    ValidationErrorKind::EmptyClass,
                    format!("Class '{}' has no subjects", class.name),
                ));
            }

            let mut blocked = [[false; PERIODS_PER_DAY]; DAYS_PER_WEEK];
            for slot in &class.unavailable_slots {
                if !slot.is_valid() {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::InvalidSlot,
                        format!(
                            "Class '{}' marks {} unavailable, but periods run from 1 to {}",
                            class.name, slot, PERIODS_PER_DAY
                        ),
                    ));
                    continue;
                }
                blocked[slot.day.index()][usize::from(slot.period) - 1] = true;
            }

            let mut class_subjects = Vec::with_capacity(class.subjects.len());
            for subject in &class.subjects {
                if subject.weekly_hours <= 0 {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::NonPositiveHours,
                        format!(
                            "Subject '{}' in class '{}' needs a positive number of weekly hours",
                            subject.name, class.name
                        ),
                    ));
                    continue;
                }
                let Some(&faculty) = faculty_lookup.get(subject.faculty_id.as_str()) else {
                    errors.push(ValidationError::new(
                        ValidationErrorKind::MissingFaculty,
                        format!(
                            "Subject '{}' in class '{}' references unknown faculty '{}'",
                            subject.name, class.name, subject.faculty_id
                        ),
                    ));
                    continue;
                };
                class_subjects.push(subjects.len());
                subjects.push(SubjectRecord {
                    name: subject.name.clone(),
                    class: class_index,
                    faculty,
                    weekly_hours: subject.weekly_hours as u32,
                });
            }

            classes.push(ClassRecord {
                name: class.name.clone(),
                subjects: class_subjects,
                blocked,
            });
        }

        if !errors.is_empty() {
            return Err(ValidationErrors(errors));
        }

        let mut faculty_subjects = vec![Vec::new(); faculties.len()];
        for (faculty, owned) in subjects
            .iter()
            .enumerate()
            .map(|(index, s)| (s.faculty, index))
            .into_group_map()
        {
            faculty_subjects[faculty] = owned;
        }

        Ok(Self {
            faculties,
            classes,
            subjects,
            faculty_subjects,
        })
    }

    pub fn faculty_of(&self, subject: SubjectIndex) -> &FacultyRecord {
        &self.faculties[self.subjects[subject].faculty]
    }

    /// Total periods a class needs per week, saturating at `u32::MAX`.
    pub fn class_demand(&self, class: ClassIndex) -> u32 {
        self.total_hours(&self.classes[class].subjects)
    }

    /// Total periods a faculty member teaches per week across all classes,
    /// saturating at `u32::MAX`.
    pub fn faculty_demand(&self, faculty: FacultyIndex) -> u32 {
        self.total_hours(&self.faculty_subjects[faculty])
    }

    fn total_hours(&self, subjects: &[SubjectIndex]) -> u32 {
        subjects
            .iter()
            .fold(0, |total: u32, &s| total.saturating_add(self.subjects[s].weekly_hours))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Class, Day, Faculty, Slot, Subject};

    fn faculty(id: &str, per_day: i32, consecutive: i32) -> Faculty {
        Faculty {
            id: id.to_string(),
            name: format!("Dr. {id}"),
            max_hours_per_day: per_day,
            max_consecutive_hours: consecutive,
        }
    }

    fn subject(id: &str, faculty_id: &str, hours: i32) -> Subject {
        Subject {
            id: id.to_string(),
            name: format!("Subject {id}"),
            faculty_id: faculty_id.to_string(),
            weekly_hours: hours,
        }
    }

    fn class(id: &str, subjects: Vec<Subject>) -> Class {
        Class {
            id: id.to_string(),
            name: format!("Class {id}"),
            subjects,
            unavailable_slots: vec![],
        }
    }

    fn request(faculty: Vec<Faculty>, classes: Vec<Class>) -> TimetableRequest {
        TimetableRequest {
            faculty,
            classes,
            node_limit: None,
        }
    }

    fn kinds(request: &TimetableRequest) -> Vec<ValidationErrorKind> {
        Problem::build(request)
            .unwrap_err()
            .0
            .into_iter()
            .map(|e| e.kind)
            .collect()
    }

    #[test]
    fn test_valid_request_resolves_indices() {
        let mut c1 = class("c1", vec![subject("s1", "f2", 3), subject("s2", "f1", 2)]);
        c1.unavailable_slots = vec![Slot::new(Day::Wednesday, 3)];
        let c2 = class("c2", vec![subject("s3", "f2", 4)]);
        let problem =
            Problem::build(&request(vec![faculty("f1", 4, 2), faculty("f2", 3, 2)], vec![c1, c2]))
                .unwrap();

        assert_eq!(problem.subjects.len(), 3);
        assert_eq!(problem.subjects[0].faculty, 1);
        assert_eq!(problem.subjects[2].class, 1);
        assert_eq!(problem.faculty_subjects[1], vec![0, 2]);
        assert_eq!(problem.class_demand(0), 5);
        assert_eq!(problem.faculty_demand(1), 7);
        assert!(problem.classes[0].is_blocked(2, 2));
        assert_eq!(problem.classes[0].open_slot_count(), 24);
        assert_eq!(problem.classes[1].open_slot_count(), 25);
    }

    #[test]
    fn test_demand_saturates_instead_of_wrapping() {
        let problem = Problem::build(&request(
            vec![faculty("f1", 4, 2)],
            vec![class(
                "c1",
                vec![
                    subject("s1", "f1", i32::MAX),
                    subject("s2", "f1", i32::MAX),
                    subject("s3", "f1", 3),
                ],
            )],
        ))
        .unwrap();
        assert_eq!(problem.class_demand(0), u32::MAX);
        assert_eq!(problem.faculty_demand(0), u32::MAX);
    }

    #[test]
    fn test_dangling_faculty_reference() {
        let r = request(vec![faculty("f1", 4, 2)], vec![class("c1", vec![subject("s1", "nope", 2)])]);
        assert_eq!(kinds(&r), vec![ValidationErrorKind::MissingFaculty]);
    }

    #[test]
    fn test_empty_class() {
        let r = request(vec![faculty("f1", 4, 2)], vec![class("c1", vec![])]);
        assert_eq!(kinds(&r), vec![ValidationErrorKind::EmptyClass]);
    }

    #[test]
    fn test_non_positive_hours() {
        let r = request(
            vec![faculty("f1", 4, 2), faculty("f2", 0, 0)],
            vec![class("c1", vec![subject("s1", "f1", 0), subject("s2", "f1", -3)])],
        );
        let found = kinds(&r);
        assert_eq!(found.len(), 3);
        assert!(found.iter().all(|k| *k == ValidationErrorKind::NonPositiveHours));
    }

    #[test]
    fn test_consecutive_exceeds_daily() {
        let r = request(vec![faculty("f1", 2, 3)], vec![class("c1", vec![subject("s1", "f1", 2)])]);
        assert_eq!(kinds(&r), vec![ValidationErrorKind::ConsecutiveExceedsDaily]);
    }

    #[test]
    fn test_duplicates_and_empty_roster() {
        let r = request(
            vec![faculty("f1", 4, 2), faculty("f1", 4, 2)],
            vec![
                class("c1", vec![subject("s1", "f1", 2)]),
                class("c1", vec![subject("s1", "f1", 2)]),
            ],
        );
        let found = kinds(&r);
        assert_eq!(
            found.iter().filter(|k| **k == ValidationErrorKind::DuplicateId).count(),
            3
        );
        assert!(found.contains(&ValidationErrorKind::DuplicateClassName));

        let empty = request(vec![], vec![]);
        assert_eq!(
            kinds(&empty),
            vec![ValidationErrorKind::EmptyRoster, ValidationErrorKind::EmptyRoster]
        );
    }

    #[test]
    fn test_invalid_unavailable_period() {
        let mut c1 = class("c1", vec![subject("s1", "f1", 2)]);
        c1.unavailable_slots = vec![Slot::new(Day::Monday, 6)];
        let r = request(vec![faculty("f1", 4, 2)], vec![c1]);
        assert_eq!(kinds(&r), vec![ValidationErrorKind::InvalidSlot]);
    }

    #[test]
    fn test_effective_daily_capacity() {
        let cap = |per_day, consecutive| {
            FacultyRecord {
                name: String::new(),
                max_per_day: per_day,
                max_consecutive: consecutive,
            }
            .effective_daily_capacity()
        };
        assert_eq!(cap(5, 5), 5);
        assert_eq!(cap(5, 1), 3);
        assert_eq!(cap(5, 2), 4);
        assert_eq!(cap(4, 4), 4);
        assert_eq!(cap(2, 1), 2);
    }
}
