use crate::data::{DAYS_PER_WEEK, PERIODS_PER_DAY};
use crate::model::{ClassIndex, FacultyIndex, Problem, SubjectIndex};

/// A (class, day, period) coordinate, zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub class: ClassIndex,
    pub day: usize,
    pub period: usize,
}

impl Cell {
    pub fn new(class: ClassIndex, day: usize, period: usize) -> Self {
        Self { class, day, period }
    }
}

/// A subject committed to a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Placement {
    pub cell: Cell,
    pub subject: SubjectIndex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entry {
    Open,
    Teach(SubjectIndex),
    Empty,
}

type Week<T> = [[T; PERIODS_PER_DAY]; DAYS_PER_WEEK];

/// The timetable under construction.
///
/// Keeps the per-class grid together with the counters the constraint
/// checks need (faculty occupancy and daily load, per-subject totals), so a
/// placement can be tested and undone in constant time.
#[derive(Debug, Clone)]
pub struct PartialTimetable {
    entries: Vec<Week<Entry>>,
    faculty_busy: Vec<Week<Option<ClassIndex>>>,
    faculty_day_load: Vec<[u32; DAYS_PER_WEEK]>,
    subject_remaining: Vec<u32>,
    subject_day_count: Vec<[u32; DAYS_PER_WEEK]>,
    class_remaining: Vec<u32>,
    class_undecided: Vec<u32>,
    remaining_total: u32,
}

impl PartialTimetable {
    pub fn new(problem: &Problem) -> Self {
        let subject_remaining: Vec<u32> = problem.subjects.iter().map(|s| s.weekly_hours).collect();
        let class_remaining: Vec<u32> = (0..problem.classes.len())
            .map(|c| problem.class_demand(c))
            .collect();
        Self {
            entries: vec![[[Entry::Open; PERIODS_PER_DAY]; DAYS_PER_WEEK]; problem.classes.len()],
            faculty_busy: vec![[[None; PERIODS_PER_DAY]; DAYS_PER_WEEK]; problem.faculties.len()],
            faculty_day_load: vec![[0; DAYS_PER_WEEK]; problem.faculties.len()],
            subject_remaining,
            subject_day_count: vec![[0; DAYS_PER_WEEK]; problem.subjects.len()],
            remaining_total: class_remaining.iter().sum(),
            class_remaining,
            class_undecided: problem.classes.iter().map(|c| c.open_slot_count()).collect(),
        }
    }

    pub fn subject_at(&self, cell: Cell) -> Option<SubjectIndex> {
        match self.entries[cell.class][cell.day][cell.period] {
            Entry::Teach(subject) => Some(subject),
            _ => None,
        }
    }

    /// Whether the search has already made a choice (a subject or empty) for `cell`.
    pub fn is_decided(&self, cell: Cell) -> bool {
        self.entries[cell.class][cell.day][cell.period] != Entry::Open
    }

    /// The class this faculty member teaches at (day, period), if any.
    pub fn faculty_class_at(&self, faculty: FacultyIndex, day: usize, period: usize) -> Option<ClassIndex> {
        self.faculty_busy[faculty][day][period]
    }

    pub fn faculty_load(&self, faculty: FacultyIndex, day: usize) -> u32 {
        self.faculty_day_load[faculty][day]
    }

    /// Periods a subject still needs.
    pub fn remaining(&self, subject: SubjectIndex) -> u32 {
        self.subject_remaining[subject]
    }

    pub fn subject_day_count(&self, subject: SubjectIndex, day: usize) -> u32 {
        self.subject_day_count[subject][day]
    }

    pub fn class_remaining(&self, class: ClassIndex) -> u32 {
        self.class_remaining[class]
    }

    /// Whether `class` can afford to leave another open cell empty.
    pub fn can_leave_empty(&self, class: ClassIndex) -> bool {
        self.class_undecided[class] > self.class_remaining[class]
    }

    pub fn is_complete(&self) -> bool {
        self.remaining_total == 0
    }

    pub fn place(&mut self, problem: &Problem, cell: Cell, subject: SubjectIndex) {
        let faculty = problem.subjects[subject].faculty;
        self.entries[cell.class][cell.day][cell.period] = Entry::Teach(subject);
        self.faculty_busy[faculty][cell.day][cell.period] = Some(cell.class);
        self.faculty_day_load[faculty][cell.day] += 1;
        self.subject_remaining[subject] -= 1;
        self.subject_day_count[subject][cell.day] += 1;
        self.class_remaining[cell.class] -= 1;
        self.class_undecided[cell.class] -= 1;
        self.remaining_total -= 1;
    }

    pub fn leave_empty(&mut self, cell: Cell) {
        self.entries[cell.class][cell.day][cell.period] = Entry::Empty;
        self.class_undecided[cell.class] -= 1;
    }

    /// Reverts whatever decision was made for `cell`.
    pub fn undo(&mut self, problem: &Problem, cell: Cell) {
        match self.entries[cell.class][cell.day][cell.period] {
            Entry::Open => return,
            Entry::Empty => {}
            Entry::Teach(subject) => {
                let faculty = problem.subjects[subject].faculty;
                self.faculty_busy[faculty][cell.day][cell.period] = None;
                self.faculty_day_load[faculty][cell.day] -= 1;
                self.subject_remaining[subject] += 1;
                self.subject_day_count[subject][cell.day] -= 1;
                self.class_remaining[cell.class] += 1;
                self.remaining_total += 1;
            }
        }
        self.entries[cell.class][cell.day][cell.period] = Entry::Open;
        self.class_undecided[cell.class] += 1;
    }

    /// Every committed placement, in class, day, period order.
    pub fn placements(&self) -> Vec<Placement> {
        let mut placements = Vec::new();
        for (class, week) in self.entries.iter().enumerate() {
            for (day, periods) in week.iter().enumerate() {
                for (period, entry) in periods.iter().enumerate() {
                    if let Entry::Teach(subject) = *entry {
                        placements.push(Placement {
                            cell: Cell::new(class, day, period),
                            subject,
                        });
                    }
                }
            }
        }
        placements
    }
}
