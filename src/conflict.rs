use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use crate::schedule::{Schedule, ScheduleConfig};

/// A committed mutation was rejected: two classes would assign the same
/// teacher to the same day and period.
#[derive(Clone, Debug, PartialEq, Serialize, Error)]
#[error("Conflict on {day}, {start}-{end}: Teacher \"{teacher}\" is assigned to multiple classes.")]
pub struct Conflict {
    pub day: String,
    pub start: String,
    pub end: String,
    pub teacher: String,
}

/// Scans the whole grid for teacher double-booking.
///
/// The scan runs day-major, then slot, then class, all in configured order,
/// and stops at the first collision, so the reported conflict is
/// deterministic. Teacher identity is the exact string after trimming
/// leading/trailing whitespace; empty and whitespace-only values are exempt.
pub fn check_conflicts(schedule: &Schedule, config: &ScheduleConfig) -> Option<Conflict> {
    for (day_index, day) in config.days.iter().enumerate() {
        for (slot_index, slot) in config.time_slots.iter().enumerate() {
            let mut seen_teachers = HashSet::new();
            for class_index in 0..config.class_names.len() {
                let teacher = schedule.cell(class_index, day_index, slot_index).teacher.trim();
                if teacher.is_empty() {
                    continue;
                }
                if !seen_teachers.insert(teacher) {
                    return Some(Conflict {
                        day: day.clone(),
                        start: slot.start.clone(),
                        end: slot.end.clone(),
                        teacher: teacher.to_string(),
                    });
                }
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::TimeSlot;

    fn config(classes: &[&str], days: &[&str], slots: &[(&str, &str)]) -> ScheduleConfig {
        ScheduleConfig {
            class_names: classes.iter().map(|c| c.to_string()).collect(),
            days: days.iter().map(|d| d.to_string()).collect(),
            time_slots: slots
                .iter()
                .map(|(start, end)| TimeSlot {
                    start: start.to_string(),
                    end: end.to_string(),
                })
                .collect(),
        }
    }

    fn assign(schedule: &mut Schedule, class: usize, day: usize, slot: usize, teacher: &str) {
        let index = schedule.index(class, day, slot);
        schedule.cells[index].teacher = teacher.to_string();
    }

    #[test]
    fn clean_grid_reports_nothing() {
        let config = config(
            &["A", "B"],
            &["Sunday", "Monday"],
            &[("7:30", "8:30"), ("8:30", "9:40")],
        );
        let mut schedule = Schedule::create(&config);
        assign(&mut schedule, 0, 0, 0, "Khan");
        assign(&mut schedule, 1, 0, 1, "Khan");
        assign(&mut schedule, 1, 0, 0, "Rahim");

        assert_eq!(check_conflicts(&schedule, &config), None);
    }

    #[test]
    fn double_booking_is_reported_with_day_slot_and_teacher() {
        let config = config(&["A", "B"], &["Mon"], &[("9", "10")]);
        let mut schedule = Schedule::create(&config);
        assign(&mut schedule, 0, 0, 0, "X");
        assign(&mut schedule, 1, 0, 0, "X");

        let conflict = check_conflicts(&schedule, &config).unwrap();
        assert_eq!(conflict.day, "Mon");
        assert_eq!(conflict.start, "9");
        assert_eq!(conflict.end, "10");
        assert_eq!(conflict.teacher, "X");
        assert_eq!(
            conflict.to_string(),
            "Conflict on Mon, 9-10: Teacher \"X\" is assigned to multiple classes."
        );
    }

    #[test]
    fn first_conflict_in_scan_order_wins() {
        let config = config(
            &["A", "B"],
            &["Sunday", "Monday"],
            &[("7:30", "8:30"), ("8:30", "9:40")],
        );
        let mut schedule = Schedule::create(&config);
        // Later in scan order: Monday, first slot.
        assign(&mut schedule, 0, 1, 0, "Late");
        assign(&mut schedule, 1, 1, 0, "Late");
        // Earlier in scan order: Sunday, second slot.
        assign(&mut schedule, 0, 0, 1, "Early");
        assign(&mut schedule, 1, 0, 1, "Early");

        let conflict = check_conflicts(&schedule, &config).unwrap();
        assert_eq!(conflict.day, "Sunday");
        assert_eq!(conflict.teacher, "Early");
    }

    #[test]
    fn whitespace_padding_does_not_hide_a_collision() {
        let config = config(&["A", "B"], &["Mon"], &[("9", "10")]);
        let mut schedule = Schedule::create(&config);
        assign(&mut schedule, 0, 0, 0, "  X");
        assign(&mut schedule, 1, 0, 0, "X  ");

        let conflict = check_conflicts(&schedule, &config).unwrap();
        assert_eq!(conflict.teacher, "X");
    }

    #[test]
    fn empty_and_whitespace_teachers_are_exempt() {
        let config = config(&["A", "B", "C"], &["Mon"], &[("9", "10")]);
        let mut schedule = Schedule::create(&config);
        assign(&mut schedule, 0, 0, 0, "");
        assign(&mut schedule, 1, 0, 0, "   ");
        assign(&mut schedule, 2, 0, 0, " ");

        assert_eq!(check_conflicts(&schedule, &config), None);
    }

    #[test]
    fn comparison_is_case_sensitive() {
        let config = config(&["A", "B"], &["Mon"], &[("9", "10")]);
        let mut schedule = Schedule::create(&config);
        assign(&mut schedule, 0, 0, 0, "khan");
        assign(&mut schedule, 1, 0, 0, "Khan");

        assert_eq!(check_conflicts(&schedule, &config), None);
    }
}
