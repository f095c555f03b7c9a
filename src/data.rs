use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

// Type aliases for clarity
pub type FacultyId = String;
pub type ClassId = String;
pub type SubjectId = String;
pub type Period = u8;

pub const DAYS_PER_WEEK: usize = 5;
pub const PERIODS_PER_DAY: usize = 5;

/// A teaching day of the week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl Day {
    pub const ALL: [Day; DAYS_PER_WEEK] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
    ];

    /// Zero-based position in the week.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
        }
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A (day, period) coordinate in the weekly grid. Periods are numbered 1 through 5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Slot {
    pub day: Day,
    pub period: Period,
}

impl Slot {
    pub fn new(day: Day, period: Period) -> Self {
        Self { day, period }
    }

    pub fn is_valid(&self) -> bool {
        (1..=PERIODS_PER_DAY as Period).contains(&self.period)
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} period {}", self.day, self.period)
    }
}

/// A faculty member with their daily teaching limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Faculty {
    pub id: FacultyId,
    pub name: String,
    pub max_hours_per_day: i32,
    pub max_consecutive_hours: i32,
}

/// A subject taught to one class by one faculty member.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: SubjectId,
    pub name: String,
    pub faculty_id: FacultyId,
    pub weekly_hours: i32,
}

/// A class with its subjects and the slots it cannot be scheduled in.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: ClassId,
    pub name: String,
    pub subjects: Vec<Subject>,
    #[serde(default)]
    pub unavailable_slots: Vec<Slot>,
}

/// The complete input for one timetable generation run.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TimetableRequest {
    pub faculty: Vec<Faculty>,
    pub classes: Vec<Class>,
    /// Overrides the server's node expansion budget for this run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_limit: Option<u64>,
}

/// What a class is taught in one period.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Lesson {
    pub subject: String,
    pub faculty: String,
}

/// A single committed (class, slot) -> (subject, faculty) binding.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub class_name: String,
    pub slot: Slot,
    pub subject: String,
    pub faculty: String,
}

/// One class's periods on one day. `None` marks an empty or blocked period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassDay {
    pub class_name: String,
    pub periods: [Option<Lesson>; PERIODS_PER_DAY],
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimetableDay {
    pub day: Day,
    pub classes: Vec<ClassDay>,
}

/// The finished weekly grid, indexed day -> class -> period.
///
/// Serialises as `{ "Monday": { "CS101": { "Period 1": { "subject", "faculty" } | null } } }`
/// with days, classes and periods kept in grid order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timetable {
    pub days: Vec<TimetableDay>,
}

impl Timetable {
    #[cfg(test)]
    pub fn lesson(&self, day: Day, class_name: &str, period: Period) -> Option<&Lesson> {
        let index = usize::from(period).checked_sub(1)?;
        self.days
            .iter()
            .find(|d| d.day == day)?
            .classes
            .iter()
            .find(|c| c.class_name == class_name)?
            .periods
            .get(index)?
            .as_ref()
    }

    /// Flattens the grid into its assignments, in day, class, period order.
    pub fn assignments(&self) -> Vec<Assignment> {
        let mut assignments = Vec::new();
        for day in &self.days {
            for class in &day.classes {
                for (index, lesson) in class.periods.iter().enumerate() {
                    if let Some(lesson) = lesson {
                        assignments.push(Assignment {
                            class_name: class.class_name.clone(),
                            slot: Slot::new(day.day, index as Period + 1),
                            subject: lesson.subject.clone(),
                            faculty: lesson.faculty.clone(),
                        });
                    }
                }
            }
        }
        assignments
    }
}

impl Serialize for Timetable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.days.len()))?;
        for day in &self.days {
            map.serialize_entry(day.day.name(), &ClassesByName(&day.classes))?;
        }
        map.end()
    }
}

struct ClassesByName<'a>(&'a [ClassDay]);

impl Serialize for ClassesByName<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for class in self.0 {
            map.serialize_entry(&class.class_name, &PeriodsByLabel(&class.periods))?;
        }
        map.end()
    }
}

struct PeriodsByLabel<'a>(&'a [Option<Lesson>; PERIODS_PER_DAY]);

impl Serialize for PeriodsByLabel<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PERIODS_PER_DAY))?;
        for (index, lesson) in self.0.iter().enumerate() {
            map.serialize_entry(&format!("Period {}", index + 1), lesson)?;
        }
        map.end()
    }
}

/// Describes a soft constraint that was not met in the final timetable.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UnmetSoftConstraint {
    pub constraint_type: String,
    pub description: String,
}

impl fmt::Display for UnmetSoftConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.constraint_type, self.description)
    }
}

/// Counters collected during one search run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchStatistics {
    pub nodes_expanded: u64,
    pub backtracks: u64,
    pub prunings: u64,
    pub max_depth: u64,
    pub elapsed_ms: u64,
}

/// Why a run ended without a timetable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Infeasible,
    SearchBudgetExceeded,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FailureKind::Infeasible => "infeasible",
            FailureKind::SearchBudgetExceeded => "search budget exceeded",
            FailureKind::Cancelled => "cancelled",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SolvedTimetable {
    pub timetable: Timetable,
    pub score: i32,
    pub unmet_soft_constraints: Vec<UnmetSoftConstraint>,
    pub statistics: SearchStatistics,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchFailure {
    pub kind: FailureKind,
    pub message: String,
    pub statistics: SearchStatistics,
}

/// The final output of the solver.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum TimetableResponse {
    Solved(SolvedTimetable),
    Failed(SearchFailure),
}
