use crate::balance;
use crate::data::{
    ClassDay, Day, FailureKind, Lesson, SearchFailure, SearchStatistics, SolvedTimetable,
    Timetable, TimetableDay, TimetableResponse,
};
use crate::grid::{Cell, PartialTimetable};
use crate::model::Problem;

/// Builds the external response for a solved search.
pub fn solved(
    problem: &Problem,
    partial: &PartialTimetable,
    statistics: SearchStatistics,
) -> TimetableResponse {
    let (score, unmet_soft_constraints) = balance::evaluate(problem, partial);
    TimetableResponse::Solved(SolvedTimetable {
        timetable: timetable(problem, partial),
        score,
        unmet_soft_constraints,
        statistics,
    })
}

/// Builds the external response for a search that ended without a timetable.
pub fn failed(kind: FailureKind, statistics: SearchStatistics) -> TimetableResponse {
    let message = match kind {
        FailureKind::Infeasible => "A valid timetable could not be generated with the given \
             constraints. Please check for conflicts."
            .to_string(),
        FailureKind::SearchBudgetExceeded => format!(
            "The search stopped after {} node expansions without finding a timetable or \
             proving that none exists. Retry with a larger node limit or relaxed constraints.",
            statistics.nodes_expanded
        ),
        FailureKind::Cancelled => {
            "The search was cancelled before a timetable was found.".to_string()
        }
    };
    TimetableResponse::Failed(SearchFailure {
        kind,
        message,
        statistics,
    })
}

fn timetable(problem: &Problem, partial: &PartialTimetable) -> Timetable {
    let days = Day::ALL
        .iter()
        .map(|&day| TimetableDay {
            day,
            classes: problem
                .classes
                .iter()
                .enumerate()
                .map(|(class, record)| ClassDay {
                    class_name: record.name.clone(),
                    periods: std::array::from_fn(|period| {
                        partial
                            .subject_at(Cell::new(class, day.index(), period))
                            .map(|subject| Lesson {
                                subject: problem.subjects[subject].name.clone(),
                                faculty: problem.faculty_of(subject).name.clone(),
                            })
                    }),
                })
                .collect(),
        })
        .collect();
    Timetable { days }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::sample_request;

    #[test]
    fn test_grid_covers_every_cell() {
        let problem = Problem::build(&sample_request()).unwrap();
        let mut partial = PartialTimetable::new(&problem);
        partial.place(&problem, Cell::new(1, 4, 4), 4);

        let TimetableResponse::Solved(solved) =
            solved(&problem, &partial, SearchStatistics::default())
        else {
            panic!("expected a solved response");
        };
        let json = serde_json::to_value(&solved.timetable).unwrap();

        for day in Day::ALL {
            for class in ["CS101", "CS202"] {
                for period in 1..=5 {
                    let cell = &json[day.name()][class][format!("Period {period}")];
                    if day == Day::Friday && class == "CS202" && period == 5 {
                        assert_eq!(cell["subject"], "Discrete Maths");
                        assert_eq!(cell["faculty"], "Dr. Ada Lovelace");
                    } else {
                        assert!(cell.is_null(), "{day} {class} period {period}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_failures_never_carry_a_grid() {
        let response = failed(FailureKind::Infeasible, SearchStatistics::default());
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["status"], "failed");
        assert_eq!(value["kind"], "infeasible");
        assert!(value.get("timetable").is_none());
        assert!(value["message"].as_str().unwrap().contains("could not be generated"));

        let statistics = SearchStatistics {
            nodes_expanded: 42,
            ..SearchStatistics::default()
        };
        let TimetableResponse::Failed(failure) =
            failed(FailureKind::SearchBudgetExceeded, statistics)
        else {
            panic!("expected a failure");
        };
        assert!(failure.message.contains("42 node expansions"));
    }
}
