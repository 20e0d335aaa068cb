use std::collections::BTreeMap;

use crate::schedule::{Schedule, ScheduleConfig};

/// Per-teacher, per-day count of assigned periods, for the load summary
/// table.
///
/// A teacher appears only if assigned somewhere in the grid (after
/// trimming), and a day appears under a teacher only with a non-zero count;
/// rendering zeroes for the missing days is the display layer's job. The
/// outer map iterates teachers in lexicographic order, which is the order
/// the summary table shows them in.
pub fn teacher_day_counts(
    schedule: &Schedule,
    config: &ScheduleConfig,
) -> BTreeMap<String, BTreeMap<String, u32>> {
    let mut counts: BTreeMap<String, BTreeMap<String, u32>> = BTreeMap::new();

    for class_index in 0..config.class_names.len() {
        for (day_index, day) in config.days.iter().enumerate() {
            for slot_index in 0..config.time_slots.len() {
                let teacher = schedule.cell(class_index, day_index, slot_index).teacher.trim();
                if teacher.is_empty() {
                    continue;
                }
                *counts
                    .entry(teacher.to_string())
                    .or_default()
                    .entry(day.clone())
                    .or_insert(0) += 1;
            }
        }
    }

    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schedule::{CellField, TimeSlot};

    fn nursery_kg_config() -> ScheduleConfig {
        ScheduleConfig {
            class_names: vec!["Nursery".to_string(), "KG".to_string()],
            days: vec!["Sunday".to_string(), "Monday".to_string()],
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

    #[test]
    fn empty_grid_yields_no_teachers() {
        let config = nursery_kg_config();
        let schedule = Schedule::create(&config);
        assert!(teacher_day_counts(&schedule, &config).is_empty());
    }

    #[test]
    fn same_day_different_slots_counts_twice() {
        let config = nursery_kg_config();
        let mut schedule = Schedule::create(&config);
        // Not a conflict: same day but different periods.
        schedule
            .set_cell(&config, 0, 0, 0, CellField::Teacher, "Ms. Khan")
            .unwrap();
        schedule
            .set_cell(&config, 1, 0, 1, CellField::Teacher, "Ms. Khan")
            .unwrap();

        let counts = teacher_day_counts(&schedule, &config);
        assert_eq!(counts["Ms. Khan"]["Sunday"], 2);
        assert!(!counts["Ms. Khan"].contains_key("Monday"));
    }

    #[test]
    fn padded_names_collapse_onto_the_trimmed_teacher() {
        let config = nursery_kg_config();
        let mut schedule = Schedule::create(&config);
        schedule
            .set_cell(&config, 0, 0, 0, CellField::Teacher, " Rahim ")
            .unwrap();
        schedule
            .set_cell(&config, 0, 1, 0, CellField::Teacher, "Rahim")
            .unwrap();

        let counts = teacher_day_counts(&schedule, &config);
        assert_eq!(counts.len(), 1);
        assert_eq!(counts["Rahim"]["Sunday"], 1);
        assert_eq!(counts["Rahim"]["Monday"], 1);
    }

    #[test]
    fn teachers_iterate_in_lexicographic_order() {
        let config = nursery_kg_config();
        let mut schedule = Schedule::create(&config);
        schedule
            .set_cell(&config, 0, 0, 0, CellField::Teacher, "Zahra")
            .unwrap();
        schedule
            .set_cell(&config, 1, 0, 0, CellField::Teacher, "Amin")
            .unwrap();

        let counts = teacher_day_counts(&schedule, &config);
        let names: Vec<&String> = counts.keys().collect();
        assert_eq!(names, vec!["Amin", "Zahra"]);
    }
}
