use crate::balance;
use crate::constraints::{can_place, violated_constraints};
use crate::data::{
    DAYS_PER_WEEK, FailureKind, PERIODS_PER_DAY, SearchStatistics, TimetableRequest,
    TimetableResponse,
};
use crate::error::GenerateError;
use crate::format;
use crate::grid::{Cell, PartialTimetable};
use crate::model::{Problem, SubjectIndex};
use log::{debug, error, info, trace};
use std::cmp::Reverse;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

pub const DEFAULT_NODE_LIMIT: u64 = 200_000;

/// Solves the timetabling problem with a deterministic backtracking search.
///
/// `default_node_limit` applies unless the request carries its own
/// `nodeLimit`. Setting `cancel` from another thread stops the search at the
/// next node expansion.
pub fn solve(
    input: &TimetableRequest,
    default_node_limit: u64,
    cancel: &AtomicBool,
) -> Result<TimetableResponse, GenerateError> {
    let problem = Problem::build(input)?;
    let node_limit = input.node_limit.unwrap_or(default_node_limit);
    let report = search(&problem, node_limit, cancel)?;

    let response = match report.outcome {
        SearchOutcome::Solved(partial) => format::solved(&problem, &partial, report.statistics),
        SearchOutcome::Exhausted => format::failed(FailureKind::Infeasible, report.statistics),
        SearchOutcome::BudgetExceeded => {
            format::failed(FailureKind::SearchBudgetExceeded, report.statistics)
        }
        SearchOutcome::Cancelled => format::failed(FailureKind::Cancelled, report.statistics),
    };
    Ok(response)
}

/// How a search run ended.
#[derive(Debug)]
pub enum SearchOutcome {
    Solved(PartialTimetable),
    /// Every branch was explored; no timetable exists.
    Exhausted,
    BudgetExceeded,
    Cancelled,
}

#[derive(Debug)]
pub struct SearchReport {
    pub outcome: SearchOutcome,
    pub statistics: SearchStatistics,
}

/// Runs the search over an already validated problem.
///
/// A solved timetable is audited against every hard constraint before it is
/// returned; a failed audit is an [`GenerateError::InternalFault`].
pub fn search(
    problem: &Problem,
    node_limit: u64,
    cancel: &AtomicBool,
) -> Result<SearchReport, GenerateError> {
    let start_time = Instant::now();
    info!(
        "Searching for a timetable with {} classes, {} subjects and {} faculty members (node limit {})...",
        problem.classes.len(),
        problem.subjects.len(),
        problem.faculties.len(),
        node_limit
    );

    let (outcome, mut statistics) = match infeasible_by_construction(problem) {
        Some(reason) => {
            info!("Infeasible before search: {reason}");
            (SearchOutcome::Exhausted, SearchStatistics::default())
        }
        None => Search::new(problem, node_limit, cancel).run(),
    };
    let duration = start_time.elapsed();
    statistics.elapsed_ms = duration.as_millis() as u64;

    if let SearchOutcome::Solved(partial) = &outcome {
        let violations = violated_constraints(problem, &partial.placements(), true);
        if !violations.is_empty() {
            error!("Solved timetable failed its audit: {violations:?}");
            return Err(GenerateError::InternalFault {
                violations: violations.into_iter().collect(),
            });
        }
    }

    let label = match &outcome {
        SearchOutcome::Solved(_) => "solved",
        SearchOutcome::Exhausted => "infeasible",
        SearchOutcome::BudgetExceeded => "node budget exceeded",
        SearchOutcome::Cancelled => "cancelled",
    };
    info!(
        "Search finished in {:.2?}: {} ({} nodes, {} backtracks, {} prunings, max depth {})",
        duration,
        label,
        statistics.nodes_expanded,
        statistics.backtracks,
        statistics.prunings,
        statistics.max_depth
    );

    Ok(SearchReport {
        outcome,
        statistics,
    })
}

/// Capacity checks that prove infeasibility without searching.
fn infeasible_by_construction(problem: &Problem) -> Option<String> {
    for (class, record) in problem.classes.iter().enumerate() {
        let demand = problem.class_demand(class);
        let open = record.open_slot_count();
        if demand > open {
            return Some(format!(
                "class '{}' needs {} periods but has only {} available slots",
                record.name, demand, open
            ));
        }
    }
    for (faculty, record) in problem.faculties.iter().enumerate() {
        let demand = problem.faculty_demand(faculty);
        let capacity = record.effective_daily_capacity() * DAYS_PER_WEEK as u32;
        if demand > capacity {
            return Some(format!(
                "'{}' must teach {} periods but can teach at most {} per week",
                record.name, demand, capacity
            ));
        }
    }
    None
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Teach(SubjectIndex),
    Empty,
}

/// A decision point: the cell being filled and the values still to try.
#[derive(Debug)]
struct Frame {
    cell: Cell,
    choices: Vec<Choice>,
    next: usize,
    applied: bool,
}

enum Selection {
    Complete,
    DeadEnd,
    Branch(Cell, Vec<Choice>),
}

// (options, day, period, largest class demand first, class)
type CellKey = (usize, usize, usize, Reverse<u32>, usize);

struct Search<'a> {
    problem: &'a Problem,
    state: PartialTimetable,
    stack: Vec<Frame>,
    statistics: SearchStatistics,
    node_limit: u64,
    cancel: &'a AtomicBool,
}

impl<'a> Search<'a> {
    fn new(problem: &'a Problem, node_limit: u64, cancel: &'a AtomicBool) -> Self {
        Self {
            problem,
            state: PartialTimetable::new(problem),
            stack: Vec::new(),
            statistics: SearchStatistics::default(),
            node_limit,
            cancel,
        }
    }

    fn run(mut self) -> (SearchOutcome, SearchStatistics) {
        loop {
            if self.cancel.load(Ordering::Relaxed) {
                debug!("Cancellation requested at depth {}", self.stack.len());
                return (SearchOutcome::Cancelled, self.statistics);
            }

            match self.select() {
                Selection::Complete => return (SearchOutcome::Solved(self.state), self.statistics),
                Selection::DeadEnd => trace!("Dead end at depth {}", self.stack.len()),
                Selection::Branch(cell, choices) => {
                    if self.statistics.nodes_expanded >= self.node_limit {
                        return (SearchOutcome::BudgetExceeded, self.statistics);
                    }
                    self.statistics.nodes_expanded += 1;
                    self.stack.push(Frame {
                        cell,
                        choices,
                        next: 0,
                        applied: false,
                    });
                    self.statistics.max_depth =
                        self.statistics.max_depth.max(self.stack.len() as u64);
                }
            }

            if !self.advance() {
                return (SearchOutcome::Exhausted, self.statistics);
            }
        }
    }

    /// Applies the next untried value of the innermost decision, undoing the
    /// previous value first and unwinding exhausted decisions. Returns `false`
    /// once the search has unwound past the first decision.
    fn advance(&mut self) -> bool {
        while let Some(frame) = self.stack.last_mut() {
            if frame.applied {
                trace!("Backtracking out of {:?}", frame.cell);
                self.state.undo(self.problem, frame.cell);
                frame.applied = false;
                self.statistics.backtracks += 1;
            }

            if let Some(&choice) = frame.choices.get(frame.next) {
                frame.next += 1;
                match choice {
                    Choice::Teach(subject) => {
                        debug_assert!(can_place(self.problem, &self.state, frame.cell, subject));
                        self.state.place(self.problem, frame.cell, subject);
                    }
                    Choice::Empty => self.state.leave_empty(frame.cell),
                }
                frame.applied = true;
                return true;
            }

            self.stack.pop();
        }
        false
    }

    /// Picks the most constrained undecided cell, or reports that the current
    /// partial timetable cannot be completed.
    fn select(&mut self) -> Selection {
        if self.state.is_complete() {
            return Selection::Complete;
        }

        let problem = self.problem;
        let state = &self.state;
        let mut subject_room = vec![0u32; problem.subjects.len()];
        let mut faculty_open = vec![[[false; PERIODS_PER_DAY]; DAYS_PER_WEEK]; problem.faculties.len()];
        let mut best: Option<(CellKey, Cell)> = None;

        for (class, record) in problem.classes.iter().enumerate() {
            // A class with nothing left to place keeps its undecided cells empty.
            if state.class_remaining(class) == 0 {
                continue;
            }
            for day in 0..DAYS_PER_WEEK {
                for period in 0..PERIODS_PER_DAY {
                    let cell = Cell::new(class, day, period);
                    if record.is_blocked(day, period) || state.is_decided(cell) {
                        continue;
                    }

                    let mut options = usize::from(state.can_leave_empty(class));
                    for &subject in &record.subjects {
                        if can_place(problem, state, cell, subject) {
                            options += 1;
                            subject_room[subject] += 1;
                            faculty_open[problem.subjects[subject].faculty][day][period] = true;
                        }
                    }

                    if options == 0 {
                        self.statistics.prunings += 1;
                        return Selection::DeadEnd;
                    }

                    let key = (options, day, period, Reverse(state.class_remaining(class)), class);
                    if best.as_ref().is_none_or(|(best_key, _)| key < *best_key) {
                        best = Some((key, cell));
                    }
                }
            }
        }

        // Remaining demand must fit in the cells still open to each subject.
        for (subject, &room) in subject_room.iter().enumerate() {
            if state.remaining(subject) > room {
                trace!(
                    "'{}' needs {} more periods but only {} cells remain",
                    problem.subjects[subject].name,
                    state.remaining(subject),
                    room
                );
                self.statistics.prunings += 1;
                return Selection::DeadEnd;
            }
        }

        // ...and each faculty member's demand must fit in what is left of their days.
        for (faculty, record) in problem.faculties.iter().enumerate() {
            let demand: u32 = problem.faculty_subjects[faculty]
                .iter()
                .map(|&s| state.remaining(s))
                .sum();
            if demand == 0 {
                continue;
            }
            let capacity: u32 = (0..DAYS_PER_WEEK)
                .map(|day| {
                    let headroom = record
                        .effective_daily_capacity()
                        .saturating_sub(state.faculty_load(faculty, day));
                    let open = faculty_open[faculty][day].iter().filter(|o| **o).count() as u32;
                    headroom.min(open)
                })
                .sum();
            if demand > capacity {
                trace!(
                    "'{}' needs {} more periods but has room for {}",
                    record.name, demand, capacity
                );
                self.statistics.prunings += 1;
                return Selection::DeadEnd;
            }
        }

        match best {
            Some((_, cell)) => Selection::Branch(cell, self.order_choices(cell)),
            None => Selection::DeadEnd,
        }
    }

    /// Legal values for `cell`, best first.
    ///
    /// Subjects are ordered by least faculty slack that day, then largest
    /// remaining weekly demand. The distribution balancer only breaks ties
    /// after that: staying within the soft daily cap, then lowest load
    /// relative to fair share, then request order. Leaving the cell empty is
    /// always tried last.
    fn order_choices(&self, cell: Cell) -> Vec<Choice> {
        let problem = self.problem;
        let state = &self.state;

        let mut subjects: Vec<SubjectIndex> = problem.classes[cell.class]
            .subjects
            .iter()
            .copied()
            .filter(|&s| can_place(problem, state, cell, s))
            .collect();
        subjects.sort_by_key(|&s| {
            let faculty = problem.subjects[s].faculty;
            let slack = problem.faculties[faculty]
                .max_per_day
                .saturating_sub(state.faculty_load(faculty, cell.day));
            (
                slack,
                Reverse(state.remaining(s)),
                balance::exceeds_soft_cap(problem, state, s, cell.day),
                balance::day_excess(problem, state, s, cell.day),
                s,
            )
        });

        let mut choices: Vec<Choice> = subjects.into_iter().map(Choice::Teach).collect();
        if state.can_leave_empty(cell.class) {
            choices.push(Choice::Empty);
        }
        choices
    }
}
