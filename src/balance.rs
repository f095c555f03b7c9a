//! Soft preference for spreading each subject across the week.
//!
//! Nothing here ever rules a placement out. The search uses these signals
//! only to break ties between otherwise equally preferable subjects, and
//! [`evaluate`] reports how well a finished timetable did.

use crate::data::{DAYS_PER_WEEK, Day, UnmetSoftConstraint};
use crate::grid::PartialTimetable;
use crate::model::{Problem, SubjectIndex};

/// Periods per day a subject would get if spread perfectly evenly, rounded up.
pub fn fair_share(weekly_hours: u32) -> u32 {
    weekly_hours.div_ceil(DAYS_PER_WEEK as u32)
}

/// Most periods of one subject on a single day before it counts as clustered.
pub fn soft_day_cap(weekly_hours: u32) -> u32 {
    fair_share(weekly_hours) + 1
}

/// Whether one more period of `subject` on `day` would exceed its soft cap.
pub fn exceeds_soft_cap(
    problem: &Problem,
    partial: &PartialTimetable,
    subject: SubjectIndex,
    day: usize,
) -> bool {
    partial.subject_day_count(subject, day) + 1 > soft_day_cap(problem.subjects[subject].weekly_hours)
}

/// How far `subject` already is above (positive) or below (negative) its
/// fair share on `day`. Lower is preferred.
pub fn day_excess(
    problem: &Problem,
    partial: &PartialTimetable,
    subject: SubjectIndex,
    day: usize,
) -> i64 {
    i64::from(partial.subject_day_count(subject, day))
        - i64::from(fair_share(problem.subjects[subject].weekly_hours))
}

/// Scores a timetable: +1 for every subject whose busiest day stays within
/// its soft cap, -1 and an unmet constraint for every subject that doesn't.
pub fn evaluate(problem: &Problem, partial: &PartialTimetable) -> (i32, Vec<UnmetSoftConstraint>) {
    let mut score = 0;
    let mut unmet = Vec::new();

    for (subject, record) in problem.subjects.iter().enumerate() {
        let cap = soft_day_cap(record.weekly_hours);
        let busiest = Day::ALL
            .iter()
            .map(|&day| (day, partial.subject_day_count(subject, day.index())))
            .max_by_key(|&(day, count)| (count, std::cmp::Reverse(day)));

        match busiest {
            Some((day, count)) if count > cap => {
                score -= 1;
                unmet.push(UnmetSoftConstraint {
                    constraint_type: "Even Distribution".to_string(),
                    description: format!(
                        "{} ({}) has {} periods on {}, more than the preferred {}.",
                        record.name, problem.classes[record.class].name, count, day, cap
                    ),
                });
            }
            _ => score += 1,
        }
    }

    (score, unmet)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Class, Faculty, Subject, TimetableRequest};
    use crate::grid::Cell;

    fn problem(weekly_hours: i32) -> Problem {
        let request = TimetableRequest {
            faculty: vec![Faculty {
                id: "f1".to_string(),
                name: "Dr. Lovelace".to_string(),
                max_hours_per_day: 5,
                max_consecutive_hours: 5,
            }],
            classes: vec![Class {
                id: "c1".to_string(),
                name: "CS202".to_string(),
                subjects: vec![Subject {
                    id: "s1".to_string(),
                    name: "Discrete Maths".to_string(),
                    faculty_id: "f1".to_string(),
                    weekly_hours,
                }],
                unavailable_slots: vec![],
            }],
            node_limit: None,
        };
        Problem::build(&request).unwrap()
    }

    #[test]
    fn test_fair_share_and_cap() {
        assert_eq!(fair_share(1), 1);
        assert_eq!(fair_share(5), 1);
        assert_eq!(fair_share(6), 2);
        assert_eq!(soft_day_cap(4), 2);
        assert_eq!(soft_day_cap(25), 6);
    }

    #[test]
    fn test_soft_cap_and_excess_track_the_day() {
        let problem = problem(4);
        let mut partial = PartialTimetable::new(&problem);
        assert_eq!(day_excess(&problem, &partial, 0, 0), -1);
        partial.place(&problem, Cell::new(0, 0, 0), 0);
        assert!(!exceeds_soft_cap(&problem, &partial, 0, 0));
        partial.place(&problem, Cell::new(0, 0, 1), 0);
        assert!(exceeds_soft_cap(&problem, &partial, 0, 0));
        assert!(!exceeds_soft_cap(&problem, &partial, 0, 1));
        assert_eq!(day_excess(&problem, &partial, 0, 0), 1);
    }

    #[test]
    fn test_evaluate_reports_clustered_subjects() {
        let problem = problem(4);
        let mut partial = PartialTimetable::new(&problem);
        for period in 0..3 {
            partial.place(&problem, Cell::new(0, 0, period), 0);
        }
        partial.place(&problem, Cell::new(0, 1, 0), 0);

        let (score, unmet) = evaluate(&problem, &partial);
        assert_eq!(score, -1);
        assert_eq!(unmet.len(), 1);
        assert_eq!(unmet[0].constraint_type, "Even Distribution");
        assert!(unmet[0].description.contains("Monday"));

        let mut spread = PartialTimetable::new(&problem);
        for day in 0..4 {
            spread.place(&problem, Cell::new(0, day, 0), 0);
        }
        let (score, unmet) = evaluate(&problem, &spread);
        assert_eq!(score, 1);
        assert!(unmet.is_empty());
    }
}
