//! Hard constraint predicates.
//!
//! [`placement_violation`] is the incremental check used while searching;
//! [`violated_constraints`] re-derives everything from a flat list of
//! placements and is used to audit a finished timetable independently of the
//! counters the search maintains.

use crate::data::{DAYS_PER_WEEK, PERIODS_PER_DAY};
use crate::grid::{Cell, PartialTimetable, Placement};
use crate::model::{Problem, SubjectIndex};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstraintKind {
    /// The class already has a lesson in that slot.
    ClassSlotConflict,
    /// The faculty member already teaches another class in that slot.
    FacultySlotConflict,
    /// The faculty member would exceed maxHoursPerDay.
    DailyLoad,
    /// The faculty member would exceed maxConsecutiveHours.
    ConsecutiveLoad,
    /// The slot is one of the class's unavailable slots.
    Blackout,
    /// The subject is not one of the class's subjects.
    ForeignSubject,
    /// The subject would be taught more than weeklyHours.
    QuotaExceeded,
    /// A complete timetable teaches the subject fewer than weeklyHours.
    QuotaUnmet,
}

impl fmt::Display for ConstraintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConstraintKind::ClassSlotConflict => "class slot conflict",
            ConstraintKind::FacultySlotConflict => "faculty slot conflict",
            ConstraintKind::DailyLoad => "daily load",
            ConstraintKind::ConsecutiveLoad => "consecutive load",
            ConstraintKind::Blackout => "blackout",
            ConstraintKind::ForeignSubject => "foreign subject",
            ConstraintKind::QuotaExceeded => "quota exceeded",
            ConstraintKind::QuotaUnmet => "quota unmet",
        };
        f.write_str(label)
    }
}

/// Length of the longest run of `true` values.
pub fn longest_run(busy: impl IntoIterator<Item = bool>) -> u32 {
    let mut longest = 0;
    let mut current = 0;
    for occupied in busy {
        if occupied {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// The first hard constraint that placing `subject` in `cell` would break.
pub fn placement_violation(
    problem: &Problem,
    partial: &PartialTimetable,
    cell: Cell,
    subject: SubjectIndex,
) -> Option<ConstraintKind> {
    let record = &problem.subjects[subject];
    let faculty = problem.faculty_of(subject);

    if partial.subject_at(cell).is_some() {
        return Some(ConstraintKind::ClassSlotConflict);
    }
    if problem.classes[cell.class].is_blocked(cell.day, cell.period) {
        return Some(ConstraintKind::Blackout);
    }
    if record.class != cell.class {
        return Some(ConstraintKind::ForeignSubject);
    }
    if partial.remaining(subject) == 0 {
        return Some(ConstraintKind::QuotaExceeded);
    }
    if partial
        .faculty_class_at(record.faculty, cell.day, cell.period)
        .is_some()
    {
        return Some(ConstraintKind::FacultySlotConflict);
    }
    if partial.faculty_load(record.faculty, cell.day) + 1 > faculty.max_per_day {
        return Some(ConstraintKind::DailyLoad);
    }
    let run = longest_run((0..PERIODS_PER_DAY).map(|period| {
        period == cell.period
            || partial
                .faculty_class_at(record.faculty, cell.day, period)
                .is_some()
    }));
    if run > faculty.max_consecutive {
        return Some(ConstraintKind::ConsecutiveLoad);
    }
    None
}

pub fn can_place(
    problem: &Problem,
    partial: &PartialTimetable,
    cell: Cell,
    subject: SubjectIndex,
) -> bool {
    placement_violation(problem, partial, cell, subject).is_none()
}

/// Audits a set of placements against every hard constraint.
///
/// With `complete` set, subjects taught fewer than their weekly hours are
/// reported as [`ConstraintKind::QuotaUnmet`].
pub fn violated_constraints(
    problem: &Problem,
    placements: &[Placement],
    complete: bool,
) -> BTreeSet<ConstraintKind> {
    let mut violations = BTreeSet::new();
    let mut class_slots: HashMap<Cell, u32> = HashMap::new();
    let mut faculty_slots: HashMap<(usize, usize, usize), u32> = HashMap::new();
    let mut subject_totals = vec![0u32; problem.subjects.len()];

    for placement in placements {
        let cell = placement.cell;
        let record = &problem.subjects[placement.subject];

        *class_slots.entry(cell).or_default() += 1;
        *faculty_slots
            .entry((record.faculty, cell.day, cell.period))
            .or_default() += 1;
        subject_totals[placement.subject] += 1;

        if problem.classes[cell.class].is_blocked(cell.day, cell.period) {
            violations.insert(ConstraintKind::Blackout);
        }
        if record.class != cell.class {
            violations.insert(ConstraintKind::ForeignSubject);
        }
    }

    if class_slots.values().any(|&count| count > 1) {
        violations.insert(ConstraintKind::ClassSlotConflict);
    }
    if faculty_slots.values().any(|&count| count > 1) {
        violations.insert(ConstraintKind::FacultySlotConflict);
    }

    for (faculty_index, faculty) in problem.faculties.iter().enumerate() {
        for day in 0..DAYS_PER_WEEK {
            let busy = |period: usize| faculty_slots.contains_key(&(faculty_index, day, period));
            let load = (0..PERIODS_PER_DAY).filter(|&p| busy(p)).count() as u32;
            if load > faculty.max_per_day {
                violations.insert(ConstraintKind::DailyLoad);
            }
            if longest_run((0..PERIODS_PER_DAY).map(busy)) > faculty.max_consecutive {
                violations.insert(ConstraintKind::ConsecutiveLoad);
            }
        }
    }

    for (subject, record) in problem.subjects.iter().enumerate() {
        let total = subject_totals[subject];
        if total > record.weekly_hours {
            violations.insert(ConstraintKind::QuotaExceeded);
        } else if complete && total < record.weekly_hours {
            violations.insert(ConstraintKind::QuotaUnmet);
        }
    }

    violations
}
