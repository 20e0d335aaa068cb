use serde::{Deserialize, Serialize};

use crate::conflict::{check_conflicts, Conflict};

/// A named time period, applicable uniformly across all days.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: String,
    pub end: String,
}

impl TimeSlot {
    /// The display label used in table headers and exports, e.g. "7:30-8:30".
    pub fn label(&self) -> String {
        format!("{}-{}", self.start, self.end)
    }
}

/// One cell of the timetable. Empty strings mean "unassigned".
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub subject: String,
    pub teacher: String,
}

/// Which half of an assignment a mutation targets.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellField {
    Subject,
    Teacher,
}

/// Operator-configured shape of the timetable: class names, day names and
/// period labels, each in display order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    pub class_names: Vec<String>,
    pub days: Vec<String>,
    pub time_slots: Vec<TimeSlot>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            class_names: vec!["Nursery".to_string(), "KG".to_string()],
            days: [
                "Sunday",
                "Monday",
                "Tuesday",
                "Wednesday",
                "Thursday",
            ]
            .iter()
            .map(|d| d.to_string())
            .collect(),
            time_slots: vec![
                TimeSlot {
                    start: "7:30".to_string(),
                    end: "8:30".to_string(),
                },
                TimeSlot {
                    start: "8:30".to_string(),
                    end: "9:40".to_string(),
                },
            ],
        }
    }
}

/// The full grid of assignments, stored flat with explicit dimensions.
///
/// Cells are indexed by `(class * days + day) * slots + slot`, so every
/// combination of class, day and slot always has a cell. The dimensions
/// mirror the lengths of the owning [`ScheduleConfig`]; resizing the
/// configuration reshapes the grid to keep that true.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub classes: usize,
    pub days: usize,
    pub slots: usize,
    pub cells: Vec<Assignment>,
}

impl Schedule {
    /// Builds a fresh grid for the given configuration with every cell
    /// unassigned. Replaces any previous grid wholesale.
    pub fn create(config: &ScheduleConfig) -> Self {
        let classes = config.class_names.len();
        let days = config.days.len();
        let slots = config.time_slots.len();

        Schedule {
            classes,
            days,
            slots,
            cells: vec![Assignment::default(); classes * days * slots],
        }
    }

    pub fn index(&self, class: usize, day: usize, slot: usize) -> usize {
        (class * self.days + day) * self.slots + slot
    }

    pub fn cell(&self, class: usize, day: usize, slot: usize) -> &Assignment {
        &self.cells[self.index(class, day, slot)]
    }

    /// Applies a single-field edit through the candidate/validate/commit
    /// cycle: the edit lands on a working copy, the whole copy is scanned for
    /// teacher double-booking, and the copy replaces `self` only when the
    /// scan comes back clean. On a conflict the committed grid is left
    /// exactly as it was and the conflict is returned to the caller.
    ///
    /// Indexes must be in range for the current dimensions.
    pub fn set_cell(
        &mut self,
        config: &ScheduleConfig,
        class: usize,
        day: usize,
        slot: usize,
        field: CellField,
        value: &str,
    ) -> Result<(), Conflict> {
        let mut candidate = self.clone();
        let index = candidate.index(class, day, slot);
        match field {
            CellField::Subject => candidate.cells[index].subject = value.to_string(),
            CellField::Teacher => candidate.cells[index].teacher = value.to_string(),
        }

        if let Some(conflict) = check_conflicts(&candidate, config) {
            return Err(conflict);
        }

        *self = candidate;
        Ok(())
    }

    /// Rebuilds the grid to the configuration's current dimensions, keeping
    /// whatever cells survive in both shapes. Cells dropped by a shrink are
    /// discarded; cells added by a grow start unassigned.
    pub fn reshape(&mut self, config: &ScheduleConfig) {
        let mut next = Schedule::create(config);

        for class in 0..self.classes.min(next.classes) {
            for day in 0..self.days.min(next.days) {
                for slot in 0..self.slots.min(next.slots) {
                    let to = (class * next.days + day) * next.slots + slot;
                    next.cells[to] = self.cells[self.index(class, day, slot)].clone();
                }
            }
        }

        *self = next;
    }
}

/// Grows or shrinks the class list to `new_count`, padding with positional
/// names ("Class 3", "Class 4", ...) and reshaping the grid if one exists.
/// Counts below 1 are clamped to 1.
pub fn resize_classes(
    config: &mut ScheduleConfig,
    schedule: &mut Option<Schedule>,
    new_count: usize,
) {
    let new_count = new_count.max(1);

    while config.class_names.len() < new_count {
        config
            .class_names
            .push(format!("Class {}", config.class_names.len() + 1));
    }
    config.class_names.truncate(new_count);

    if let Some(schedule) = schedule {
        schedule.reshape(config);
    }
}

/// Grows or shrinks the period list to `new_count`, padding with empty
/// start/end labels and reshaping the grid if one exists. Counts below 1 are
/// clamped to 1.
pub fn resize_slots(
    config: &mut ScheduleConfig,
    schedule: &mut Option<Schedule>,
    new_count: usize,
) {
    let new_count = new_count.max(1);

    while config.time_slots.len() < new_count {
        config.time_slots.push(TimeSlot::default());
    }
    config.time_slots.truncate(new_count);

    if let Some(schedule) = schedule {
        schedule.reshape(config);
    }
}

/// Renames a class. The grid is keyed by position, so no cells move.
/// Out-of-range indexes are ignored.
pub fn set_class_name(config: &mut ScheduleConfig, index: usize, name: &str) {
    if let Some(slot) = config.class_names.get_mut(index) {
        *slot = name.to_string();
    }
}

/// Relabels a period's start/end. Out-of-range indexes are ignored.
pub fn set_slot(config: &mut ScheduleConfig, index: usize, start: &str, end: &str) {
    if let Some(slot) = config.time_slots.get_mut(index) {
        slot.start = start.to_string();
        slot.end = end.to_string();
    }
}
